//! Tag-driven line reader for flat files.
//!
//! Each physical line is classified by the tag in its leading columns.
//! Consecutive lines with the same tag are merged into one [`Block`] using the
//! concatenation policy of that tag. Skip tags separate blocks and are never
//! merged. The reader holds at most one block's lines at a time.

use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::core::message::{codes, MessageSink};
use crate::core::types::Origin;
use crate::parsing::ParseError;

/// How continuation lines of one tag are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcatPolicy {
    /// Join with a single space, collapsing internal whitespace runs
    #[default]
    Space,
    /// Join byte for byte
    NoSpace,
}

/// Tag configuration for one flat-file dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDialect {
    pub name: String,
    /// Width of the leading slice the tag is read from
    pub tag_width: usize,
    /// Line prefix that ends a record
    pub terminator: String,
    /// Tag of sequence data lines (the blank tag in EMBL)
    pub sequence_tag: String,
    pub valid_tags: BTreeSet<String>,
    pub skip_tags: BTreeSet<String>,
    /// Tags using [`ConcatPolicy::NoSpace`]; everything else uses `Space`
    #[serde(default)]
    pub policies: BTreeMap<String, ConcatPolicy>,
}

impl TagDialect {
    /// The EMBL flat-file dialect
    #[must_use]
    pub fn embl() -> Self {
        let valid = [
            "ID", "AC", "PR", "DT", "DE", "KW", "OS", "OC", "OG", "RN", "RC", "RP", "RX", "RG",
            "RA", "RT", "RL", "DR", "CC", "AH", "AS", "FH", "FT", "CO", "SQ", "XX", "",
        ];
        let mut policies = BTreeMap::new();
        policies.insert("CO".to_string(), ConcatPolicy::NoSpace);
        policies.insert(String::new(), ConcatPolicy::NoSpace);

        Self {
            name: "embl".to_string(),
            tag_width: 2,
            terminator: "//".to_string(),
            sequence_tag: String::new(),
            valid_tags: valid.iter().map(|t| (*t).to_string()).collect(),
            skip_tags: ["XX", "FH"].iter().map(|t| (*t).to_string()).collect(),
            policies,
        }
    }

    #[must_use]
    pub fn policy(&self, tag: &str) -> ConcatPolicy {
        self.policies.get(tag).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_valid(&self, tag: &str) -> bool {
        self.valid_tags.contains(tag)
    }

    #[must_use]
    pub fn is_skip(&self, tag: &str) -> bool {
        self.skip_tags.contains(tag)
    }

    fn classify<'l>(&self, line: &'l str) -> LineClass<'l> {
        if line.trim().is_empty() {
            return LineClass::Blank;
        }
        if line.starts_with(&self.terminator) {
            return LineClass::Terminator;
        }
        let width = line.chars().count();
        if width < self.tag_width {
            return LineClass::Malformed;
        }

        let tag_end = byte_offset(line, self.tag_width);
        let tag = line[..tag_end].trim();
        let raw = &line[tag_end..];
        let payload = if tag == self.sequence_tag {
            line.trim()
        } else {
            raw.trim()
        };
        LineClass::Tagged { tag, payload, raw }
    }
}

impl Default for TagDialect {
    fn default() -> Self {
        Self::embl()
    }
}

/// Byte offset of the `chars`-th character, clamped to the line length
fn byte_offset(line: &str, chars: usize) -> usize {
    line.char_indices()
        .nth(chars)
        .map_or(line.len(), |(offset, _)| offset)
}

enum LineClass<'l> {
    Blank,
    Terminator,
    Malformed,
    Tagged {
        tag: &'l str,
        payload: &'l str,
        raw: &'l str,
    },
}

/// One physical line inside a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLine {
    pub line: usize,
    /// Text after the tag columns, untrimmed
    pub raw: String,
}

impl BlockLine {
    #[must_use]
    pub fn payload(&self) -> &str {
        self.raw.trim()
    }
}

/// Consecutive same-tag lines merged under the tag's policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub tag: String,
    pub text: String,
    pub origin: Origin,
    /// Constituent lines, for readers that need line structure (feature
    /// table). Empty for [`ConcatPolicy::NoSpace`] blocks, whose text is the
    /// whole payload.
    pub lines: Vec<BlockLine>,
}

impl Block {
    fn new(tag: &str, payload: &str, raw: &str, origin: Origin, policy: ConcatPolicy) -> Self {
        let line = origin.line.unwrap_or(0);
        let mut block = Self {
            tag: tag.to_string(),
            text: String::new(),
            origin,
            lines: Vec::new(),
        };
        block.push(line, payload, raw, policy);
        block
    }

    /// Origin of the `index`-th constituent line
    #[must_use]
    pub fn line_origin(&self, index: usize) -> Origin {
        match self.lines.get(index) {
            Some(line) => self.origin.at_line(line.line),
            None => self.origin.clone(),
        }
    }

    fn push(&mut self, line: usize, payload: &str, raw: &str, policy: ConcatPolicy) {
        match policy {
            ConcatPolicy::Space => {
                for word in payload.split_whitespace() {
                    if !self.text.is_empty() {
                        self.text.push(' ');
                    }
                    self.text.push_str(word);
                }
            }
            ConcatPolicy::NoSpace => {
                self.text.push_str(payload);
                return;
            }
        }
        self.lines.push(BlockLine {
            line,
            raw: raw.to_string(),
        });
    }
}

/// What the reader produced next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    Block(Block),
    /// Terminator line reached
    EndOfRecord { line: usize },
}

/// Streaming tag reader over any buffered input
pub struct LineReader<'d, R> {
    reader: R,
    dialect: &'d TagDialect,
    source: String,
    line_no: usize,
    current: Option<Block>,
    pending_end: Option<usize>,
    buffer: Vec<u8>,
}

impl<'d, R: BufRead> LineReader<'d, R> {
    pub fn new(reader: R, dialect: &'d TagDialect, source: impl Into<String>) -> Self {
        Self {
            reader,
            dialect,
            source: source.into(),
            line_no: 0,
            current: None,
            pending_end: None,
            buffer: Vec::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_no
    }

    fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        let text = String::from_utf8_lossy(&self.buffer);
        Ok(Some(text.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Produce the next block or record boundary, `None` at end of stream.
    ///
    /// Unknown tags and malformed lines are recorded in `sink` and skipped.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the underlying reader fails.
    pub fn next_event(
        &mut self,
        sink: &mut dyn MessageSink,
    ) -> Result<Option<ReaderEvent>, ParseError> {
        if let Some(line) = self.pending_end.take() {
            return Ok(Some(ReaderEvent::EndOfRecord { line }));
        }

        loop {
            let Some(line) = self.next_line()? else {
                return Ok(self.current.take().map(ReaderEvent::Block));
            };
            let origin = Origin::new(self.source.clone(), self.line_no);

            match self.dialect.classify(&line) {
                LineClass::Blank => {}
                LineClass::Terminator => {
                    if let Some(block) = self.current.take() {
                        self.pending_end = Some(self.line_no);
                        return Ok(Some(ReaderEvent::Block(block)));
                    }
                    return Ok(Some(ReaderEvent::EndOfRecord { line: self.line_no }));
                }
                LineClass::Malformed => {
                    sink.error(
                        codes::FLATFILE_MALFORMED_LINE,
                        format!("Line too short to carry a tag: '{line}'"),
                        origin,
                    );
                }
                LineClass::Tagged { tag, payload, raw } => {
                    if self.dialect.is_skip(tag) {
                        if let Some(block) = self.current.take() {
                            return Ok(Some(ReaderEvent::Block(block)));
                        }
                        continue;
                    }
                    if !self.dialect.is_valid(tag) {
                        sink.error(
                            codes::FLATFILE_UNKNOWN_TAG,
                            format!("Unknown line tag '{tag}'"),
                            origin,
                        );
                        continue;
                    }

                    let policy = self.dialect.policy(tag);
                    let line_no = self.line_no;
                    if let Some(block) = self.current.as_mut().filter(|b| b.tag == tag) {
                        block.push(line_no, payload, raw, policy);
                        continue;
                    }
                    let next = Block::new(tag, payload, raw, origin, policy);
                    if let Some(previous) = self.current.replace(next) {
                        return Ok(Some(ReaderEvent::Block(previous)));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::ValidationReport;

    fn events(text: &str) -> (Vec<ReaderEvent>, ValidationReport) {
        let dialect = TagDialect::embl();
        let mut reader = LineReader::new(text.as_bytes(), &dialect, "test.embl");
        let mut report = ValidationReport::new();
        let mut out = Vec::new();
        while let Some(event) = reader.next_event(&mut report).unwrap() {
            out.push(event);
        }
        (out, report)
    }

    fn block(event: &ReaderEvent) -> &Block {
        match event {
            ReaderEvent::Block(block) => block,
            ReaderEvent::EndOfRecord { .. } => panic!("expected block, got {event:?}"),
        }
    }

    #[test]
    fn test_space_concatenation() {
        let (out, report) = events("DE   Homo sapiens   chromosome\nDE   1, complete.\n");
        assert!(report.is_empty());
        assert_eq!(out.len(), 1);
        let de = block(&out[0]);
        assert_eq!(de.tag, "DE");
        assert_eq!(de.text, "Homo sapiens chromosome 1, complete.");
        assert_eq!(de.lines.len(), 2);
        assert_eq!(de.origin, Origin::new("test.embl", 1));
    }

    #[test]
    fn test_no_space_concatenation() {
        let (out, _) = events("CO   join(A1.1:1..10,\nCO   gap(5))\n");
        assert_eq!(block(&out[0]).text, "join(A1.1:1..10,gap(5))");
    }

    #[test]
    fn test_skip_tag_separates_blocks() {
        let (out, _) = events("CC   first\nXX\nCC   second\n");
        assert_eq!(out.len(), 2);
        assert_eq!(block(&out[0]).text, "first");
        assert_eq!(block(&out[1]).text, "second");
    }

    #[test]
    fn test_terminator_flushes_block() {
        let (out, _) = events("ID   X; SV 1;\n//\nID   Y;\n//\n");
        assert_eq!(out.len(), 4);
        assert_eq!(block(&out[0]).text, "X; SV 1;");
        assert_eq!(out[1], ReaderEvent::EndOfRecord { line: 2 });
        assert_eq!(block(&out[2]).text, "Y;");
        assert_eq!(out[3], ReaderEvent::EndOfRecord { line: 4 });
    }

    #[test]
    fn test_sequence_lines_use_blank_tag() {
        let (out, _) = events("SQ   Sequence 8 BP;\n     acgt acgt         8\n//\n");
        let sq = block(&out[1]);
        assert_eq!(sq.tag, "");
        assert_eq!(sq.text, "acgt acgt         8");
    }

    #[test]
    fn test_only_space_blocks_keep_their_lines() {
        let (out, _) = events(
            "FT   source          1..8\nFT                   /mol_type=\"genomic DNA\"\n\
             SQ   Sequence 8 BP;\n     acgt                 4\n     acgt                 8\n//\n",
        );
        let ft = block(&out[0]);
        assert_eq!(ft.lines.len(), 2);
        assert_eq!(ft.line_origin(1), Origin::new("test.embl", 2));

        let sequence = block(&out[2]);
        assert_eq!(sequence.tag, "");
        assert!(sequence.lines.is_empty());
        assert_eq!(sequence.text, "acgt                 4acgt                 8");
        assert_eq!(sequence.line_origin(0), Origin::new("test.embl", 4));
    }

    #[test]
    fn test_unknown_and_malformed_lines_do_not_abort() {
        let (out, report) = events("QQ   nope\nX\nDE   kept\n");
        assert_eq!(out.len(), 1);
        assert_eq!(block(&out[0]).text, "kept");
        assert_eq!(report.count_code(codes::FLATFILE_UNKNOWN_TAG), 1);
        assert_eq!(report.count_code(codes::FLATFILE_MALFORMED_LINE), 1);
        let unknown = report
            .messages_with_code(codes::FLATFILE_UNKNOWN_TAG)
            .next()
            .unwrap();
        assert_eq!(unknown.origin, Origin::new("test.embl", 1));
    }

    #[test]
    fn test_custom_dialect() {
        let mut dialect = TagDialect::embl();
        dialect.valid_tags.remove("KW");
        let mut reader = LineReader::new("KW   a; b.\n".as_bytes(), &dialect, "x");
        let mut report = ValidationReport::new();
        assert!(reader.next_event(&mut report).unwrap().is_none());
        assert_eq!(report.count_code(codes::FLATFILE_UNKNOWN_TAG), 1);
    }

    #[test]
    fn test_dialect_round_trips_through_json() {
        let dialect = TagDialect::embl();
        let json = serde_json::to_string(&dialect).unwrap();
        let back: TagDialect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dialect);
    }
}
