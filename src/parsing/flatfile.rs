//! Flat-file record reader.
//!
//! Drives a [`LineReader`] and dispatches every block to its [`BlockReader`],
//! producing one [`Record`] per terminator.

use std::io::BufRead;

use tracing::debug;

use crate::core::message::{codes, MessageSink};
use crate::core::record::Record;
use crate::core::types::Origin;
use crate::parsing::blocks::{BlockReader, RecordBuilder};
use crate::parsing::lines::{LineReader, ReaderEvent, TagDialect};
use crate::parsing::ParseError;

pub struct FlatFileReader<'d, R> {
    lines: LineReader<'d, R>,
    dialect: &'d TagDialect,
}

impl<'d, R: BufRead> FlatFileReader<'d, R> {
    pub fn new(reader: R, dialect: &'d TagDialect, source: impl Into<String>) -> Self {
        Self {
            lines: LineReader::new(reader, dialect, source),
            dialect,
        }
    }

    /// Read the next record, `None` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if reading fails. Format problems are recorded
    /// in `sink` instead.
    pub fn next_record(
        &mut self,
        sink: &mut dyn MessageSink,
    ) -> Result<Option<Record>, ParseError> {
        let mut builder: Option<RecordBuilder> = None;
        loop {
            match self.lines.next_event(sink)? {
                None => {
                    let Some(builder) = builder else {
                        return Ok(None);
                    };
                    sink.error(
                        codes::FLATFILE_MISSING_TERMINATOR,
                        format!(
                            "Record starting at {} is not terminated by '{}'",
                            builder.record.origin, self.dialect.terminator
                        ),
                        Origin::new(self.lines.source(), self.lines.line_number()),
                    );
                    return Ok(Some(finish(builder, sink)));
                }
                Some(ReaderEvent::EndOfRecord { .. }) => {
                    // Consecutive terminators carry no record
                    if let Some(builder) = builder.take() {
                        return Ok(Some(finish(builder, sink)));
                    }
                }
                Some(ReaderEvent::Block(block)) => {
                    let builder = builder.get_or_insert_with(|| RecordBuilder {
                        record: Record::new(block.origin.clone()),
                        sequence_header_length: None,
                    });
                    if let Some(reader) = BlockReader::for_tag(&block.tag, self.dialect) {
                        reader.read(&block, builder, sink);
                    }
                }
            }
        }
    }

    /// Read every remaining record
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if reading fails.
    pub fn read_all(&mut self, sink: &mut dyn MessageSink) -> Result<Vec<Record>, ParseError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record(sink)? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Cross-block checks once all blocks of a record are known
fn finish(builder: RecordBuilder, sink: &mut dyn MessageSink) -> Record {
    let RecordBuilder {
        record,
        sequence_header_length,
    } = builder;

    let actual = if let Some(last) = record.agp_rows.last() {
        u64::try_from(last.object_end).ok()
    } else if record.sequence.is_empty() {
        None
    } else {
        Some(record.sequence.len())
    };

    if let Some(actual) = actual {
        let declared = [
            ("ID line", record.sequence.declared_length),
            ("SQ header", sequence_header_length.filter(|_| record.agp_rows.is_empty())),
        ];
        for (place, length) in declared {
            if let Some(length) = length.filter(|&l| l != actual) {
                sink.error(
                    codes::FLATFILE_SEQUENCE_LENGTH,
                    format!("{place} declares {length} bases but the record has {actual}"),
                    record.origin.clone(),
                );
            }
        }
    }

    debug!(
        object = record.object_name().unwrap_or("<unnamed>"),
        bases = record.sequence.len(),
        rows = record.agp_rows.len(),
        "Read flat-file record"
    );
    record
}
