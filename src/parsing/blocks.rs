//! Per-tag block readers.
//!
//! Each [`BlockReader`] variant owns the pattern and the extraction logic for
//! one tag. A reader never fails the record: a block that does not match its
//! pattern is reported to the sink and the record keeps whatever was decoded.

use crate::core::message::{codes, MessageSink};
use crate::core::record::{
    AssemblySpan, Feature, Qualifier, Record, Reference, Topology, XRef,
};
use crate::parsing::contig::parse_contig_join;
use crate::parsing::lines::{Block, TagDialect};
use crate::parsing::reference::parse_reference_location;
use crate::utils::validation::{is_valid_accession, is_valid_md5, parse_flatfile_date};

/// Placeholder used in submissions for values assigned later
pub const PLACEHOLDER: &str = "XXX";

/// A record under construction plus reader-local state
#[derive(Debug, Default)]
pub struct RecordBuilder {
    pub record: Record,
    /// Length from the `SQ` header line
    pub sequence_header_length: Option<u64>,
}

/// Handler for one tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReader {
    Id,
    Ac,
    Pr,
    Dt,
    De,
    Kw,
    Os,
    Oc,
    Og,
    Rn,
    Rc,
    Rp,
    Rx,
    Rg,
    Ra,
    Rt,
    Rl,
    Dr,
    Cc,
    Ah,
    As,
    Ft,
    Co,
    Sq,
    SequenceData,
}

impl BlockReader {
    /// Reader for a tag, `None` for tags the dialect accepts but nothing decodes
    pub fn for_tag(tag: &str, dialect: &TagDialect) -> Option<Self> {
        if tag == dialect.sequence_tag {
            return Some(Self::SequenceData);
        }
        let reader = match tag {
            "ID" => Self::Id,
            "AC" => Self::Ac,
            "PR" => Self::Pr,
            "DT" => Self::Dt,
            "DE" => Self::De,
            "KW" => Self::Kw,
            "OS" => Self::Os,
            "OC" => Self::Oc,
            "OG" => Self::Og,
            "RN" => Self::Rn,
            "RC" => Self::Rc,
            "RP" => Self::Rp,
            "RX" => Self::Rx,
            "RG" => Self::Rg,
            "RA" => Self::Ra,
            "RT" => Self::Rt,
            "RL" => Self::Rl,
            "DR" => Self::Dr,
            "CC" => Self::Cc,
            "AH" => Self::Ah,
            "AS" => Self::As,
            "FT" => Self::Ft,
            "CO" => Self::Co,
            "SQ" => Self::Sq,
            _ => return None,
        };
        Some(reader)
    }

    pub fn read(self, block: &Block, builder: &mut RecordBuilder, sink: &mut dyn MessageSink) {
        let text = block.text.trim();
        match self {
            Self::Id => read_id(block, &mut builder.record, sink),
            Self::Ac => read_ac(block, &mut builder.record, sink),
            Self::Pr => read_pr(block, &mut builder.record, sink),
            Self::Dt => read_dt(block, &mut builder.record, sink),
            Self::De => builder.record.description = Some(text.to_string()),
            Self::Kw => builder.record.keywords = split_terms(text),
            Self::Os => builder.record.organism = Some(text.to_string()),
            Self::Oc => builder.record.lineage.extend(split_terms(text)),
            Self::Og => builder.record.organelle = Some(text.to_string()),
            Self::Rn => read_rn(block, &mut builder.record, sink),
            Self::Rc | Self::Rp | Self::Rx | Self::Rg | Self::Ra | Self::Rt | Self::Rl => {
                let Some(reference) = builder.record.references.last_mut() else {
                    sink.error(
                        codes::FLATFILE_ORPHAN_REFERENCE_LINE,
                        format!("{} line without a preceding RN line", block.tag),
                        block.origin.clone(),
                    );
                    return;
                };
                read_reference_part(self, block, reference, sink);
            }
            Self::Dr => builder.record.xrefs.extend(read_xrefs(block, sink)),
            Self::Cc => {
                let comment = builder.record.comment.get_or_insert_with(String::new);
                if !comment.is_empty() {
                    comment.push('\n');
                }
                comment.push_str(text);
            }
            Self::Ah => read_ah(block, sink),
            Self::As => read_as(block, &mut builder.record, sink),
            Self::Ft => read_ft(block, &mut builder.record, sink),
            Self::Co => read_co(block, &mut builder.record, sink),
            Self::Sq => read_sq(block, builder, sink),
            Self::SequenceData => builder.record.sequence.bases.extend(
                block
                    .text
                    .bytes()
                    .filter(u8::is_ascii_alphabetic)
                    .map(|b| b.to_ascii_lowercase()),
            ),
        }
    }
}

fn invalid(block: &Block, sink: &mut dyn MessageSink, expected: &str) {
    sink.error(
        codes::FLATFILE_INVALID_BLOCK,
        format!("Invalid {} line, expected {expected}: '{}'", block.tag, block.text),
        block.origin.clone(),
    );
}

/// `a; b; c.` into terms
fn split_terms(text: &str) -> Vec<String> {
    text.trim_end_matches('.')
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn read_id(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    let Some(caps) = regex!(
        r"(?i)^([^;\s]+);\s*(?:SV\s+(\d+)|XXX);\s*(linear|circular|XXX);\s*([^;]+);\s*([^;]+);\s*([^;]+);\s*(\d+)\s+BP\.?$"
    )
    .captures(block.text.trim()) else {
        invalid(
            block,
            sink,
            "'accession; SV n; topology; molecule; class; division; n BP.'",
        );
        return;
    };

    let accession = &caps[1];
    if !accession.eq_ignore_ascii_case(PLACEHOLDER) {
        record.id_accession = Some(accession.to_string());
        record.primary_accession.get_or_insert_with(|| accession.to_string());
    }
    record.version = caps.get(2).and_then(|m| m.as_str().parse().ok());
    if let Some(topology) = Topology::parse(&caps[3]) {
        record.sequence.topology = topology;
    }
    let known = |s: &str| {
        let s = s.trim();
        (!s.eq_ignore_ascii_case(PLACEHOLDER)).then(|| s.to_string())
    };
    record.sequence.molecule_type = known(&caps[4]);
    record.data_class = known(&caps[5]);
    record.division = known(&caps[6]);
    record.sequence.declared_length = caps[7].parse().ok();
}

fn read_ac(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    let text = block.text.trim();
    if let Some(rest) = text.strip_prefix('*') {
        let id = rest.trim();
        if id.is_empty() || id.contains(char::is_whitespace) {
            invalid(block, sink, "'* submitter_id'");
        } else {
            record.submitter_id = Some(id.to_string());
        }
        return;
    }

    let accessions = split_terms(text);
    if accessions.is_empty() || !accessions.iter().all(|a| is_valid_accession(a)) {
        invalid(block, sink, "';'-separated accessions");
        return;
    }

    let primary = &accessions[0];
    if let Some(declared) = &record.id_accession {
        if !declared.eq_ignore_ascii_case(primary) {
            sink.error(
                codes::FLATFILE_ACCESSION_MISMATCH,
                format!("Primary accession '{primary}' does not match ID line accession '{declared}'"),
                block.origin.clone(),
            );
        }
    }
    record.primary_accession = Some(primary.clone());
    record
        .secondary_accessions
        .extend(accessions.into_iter().skip(1));
}

fn read_pr(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    let projects: Vec<String> = regex!(r"(?i)project:\s*([A-Z]+\d+)")
        .captures_iter(&block.text)
        .map(|caps| caps[1].to_string())
        .collect();
    if projects.is_empty() {
        invalid(block, sink, "'Project:PRJxxxx;'");
        return;
    }
    record.projects.extend(projects);
}

fn read_dt(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    let mut dates = Vec::new();
    for caps in regex!(r"(\d{1,2}-[A-Za-z]{3}-\d{4})\s*(?:\(([^)]*)\))?").captures_iter(&block.text) {
        match parse_flatfile_date(&caps[1]) {
            Some(date) => dates.push(date),
            None => sink.error(
                codes::FLATFILE_INVALID_DATE,
                format!("Invalid date '{}'", &caps[1]),
                block.origin.clone(),
            ),
        }
    }
    let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
        if !regex!(r"\d{1,2}-[A-Za-z]{3}-\d{4}").is_match(&block.text) {
            invalid(block, sink, "'DD-MON-YYYY (Rel. n, Created)'");
        }
        return;
    };
    if first > last {
        sink.error(
            codes::FLATFILE_INVALID_DATE,
            format!("Creation date {first} is after last update {last}"),
            block.origin.clone(),
        );
    }
    record.first_public = Some(first);
    record.last_updated = Some(last);
}

fn read_rn(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    let number = match regex!(r"^\[(\d+)\]$").captures(block.text.trim()) {
        Some(caps) => caps[1].parse().unwrap_or(0),
        None => {
            invalid(block, sink, "'[n]'");
            0
        }
    };
    record.references.push(Reference {
        number,
        ..Reference::default()
    });
}

fn read_reference_part(
    reader: BlockReader,
    block: &Block,
    reference: &mut Reference,
    sink: &mut dyn MessageSink,
) {
    let text = block.text.trim();
    match reader {
        BlockReader::Rc => reference.comment = Some(text.to_string()),
        BlockReader::Rp => {
            for range in text.split(',') {
                let parsed = regex!(r"^\s*(\d+)-(\d+)\s*$")
                    .captures(range)
                    .and_then(|caps| Some((caps[1].parse().ok()?, caps[2].parse().ok()?)))
                    .filter(|(begin, end): &(u64, u64)| begin <= end);
                match parsed {
                    Some(span) => reference.positions.push(span),
                    None => invalid(block, sink, "'begin-end' ranges with begin <= end"),
                }
            }
        }
        BlockReader::Rx => reference.xrefs.extend(read_xrefs(block, sink)),
        BlockReader::Rg => reference.group = Some(text.to_string()),
        BlockReader::Ra => {
            reference.authors = text
                .trim_end_matches(';')
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        BlockReader::Rt => {
            let title = text.trim_end_matches(';').trim().trim_matches('"').trim();
            reference.title = (!title.is_empty()).then(|| title.to_string());
        }
        BlockReader::Rl => match parse_reference_location(text) {
            Ok(location) => reference.location = Some(location),
            Err(problem) => sink.error(
                codes::FLATFILE_REFERENCE_LOCATION,
                problem,
                block.origin.clone(),
            ),
        },
        _ => {}
    }
}

fn read_xrefs(block: &Block, sink: &mut dyn MessageSink) -> Vec<XRef> {
    let xrefs: Vec<XRef> = regex!(r"([A-Za-z][\w-]*);\s*([^;]+?)(?:;\s*([^;]+?))?\.(?:\s+|$)")
        .captures_iter(&block.text)
        .map(|caps| XRef {
            database: caps[1].to_string(),
            primary: caps[2].trim().to_string(),
            secondary: caps.get(3).map(|m| m.as_str().trim().to_string()),
        })
        .collect();
    if xrefs.is_empty() {
        invalid(block, sink, "'DATABASE; PRIMARY; [SECONDARY].'");
    }
    for xref in &xrefs {
        if xref.database.eq_ignore_ascii_case("MD5") && !is_valid_md5(&xref.primary) {
            sink.error(
                codes::FLATFILE_INVALID_BLOCK,
                format!("Invalid MD5 cross reference '{}'", xref.primary),
                block.origin.clone(),
            );
        }
    }
    xrefs
}

/// `AH` only names the columns of the `AS` lines that follow
fn read_ah(block: &Block, sink: &mut dyn MessageSink) {
    let header = regex!(r"(?i)^LOCAL_SPAN\s+PRIMARY_IDENTIFIER\s+PRIMARY_SPAN\s+COMP$");
    if !header.is_match(block.text.trim()) {
        sink.error(
            codes::FLATFILE_INVALID_BLOCK,
            format!("Invalid AH header: '{}'", block.text.trim()),
            block.origin.clone(),
        );
    }
}

fn read_as(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    for (index, line) in block.lines.iter().enumerate() {
        let Some(caps) = regex!(
            r"(?i)^(\d+)-(\d+)\s+(\S+)\s+(?:(\d+)-(\d+)|not_available)(?:\s+(c))?$"
        )
        .captures(line.payload()) else {
            sink.error(
                codes::FLATFILE_INVALID_BLOCK,
                format!("Invalid AS line: '{}'", line.payload()),
                block.line_origin(index),
            );
            continue;
        };
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
        let (Some(local_begin), Some(local_end)) = (number(1), number(2)) else {
            continue;
        };
        record.assembly.push(AssemblySpan {
            local_begin,
            local_end,
            primary_identifier: caps[3].to_string(),
            primary_span: number(4).zip(number(5)),
            complement: caps.get(6).is_some(),
        });
    }
}

fn read_ft(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    // Feature keys start in column 6; after the 2-character tag that is offset 3
    const KEY_OFFSET: usize = 3;

    let first_new = record.features.len();
    for (index, line) in block.lines.iter().enumerate() {
        let payload = line.payload();
        let starts_feature = line
            .raw
            .chars()
            .nth(KEY_OFFSET)
            .is_some_and(|c| !c.is_whitespace())
            && line.raw.chars().take(KEY_OFFSET).all(char::is_whitespace);

        if starts_feature {
            let mut parts = payload.splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default().to_string();
            let location = parts.next().unwrap_or_default().trim().to_string();
            record.features.push(Feature {
                key,
                location,
                qualifiers: Vec::new(),
            });
            continue;
        }

        let Some(feature) = record.features.last_mut() else {
            sink.error(
                codes::FLATFILE_INVALID_BLOCK,
                format!("Feature table continuation without a feature key: '{payload}'"),
                block.line_origin(index),
            );
            continue;
        };

        if let Some(qualifier) = payload.strip_prefix('/') {
            let (name, value) = match qualifier.split_once('=') {
                Some((name, value)) => (name.trim().to_string(), Some(value.to_string())),
                None => (qualifier.trim().to_string(), None),
            };
            feature.qualifiers.push(Qualifier { name, value });
        } else if let Some(qualifier) = feature.qualifiers.last_mut() {
            let value = qualifier.value.get_or_insert_with(String::new);
            if qualifier.name != "translation" && !value.is_empty() {
                value.push(' ');
            }
            value.push_str(payload);
        } else {
            feature.location.push_str(payload);
        }
    }

    for feature in record.features.iter_mut().skip(first_new) {
        for qualifier in &mut feature.qualifiers {
            if let Some(value) = qualifier.value.as_mut() {
                let unquoted = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .map(|v| v.replace("\"\"", "\""));
                if let Some(unquoted) = unquoted {
                    *value = unquoted;
                }
            }
        }
    }
}

fn read_co(block: &Block, record: &mut Record, sink: &mut dyn MessageSink) {
    let Some(object) = record.object_name().map(String::from) else {
        sink.error(
            codes::FLATFILE_INVALID_CONTIG,
            "CO line in a record without accession or submitter id".to_string(),
            block.origin.clone(),
        );
        return;
    };
    match parse_contig_join(&object, &block.text) {
        Ok(rows) => {
            let line = block.origin.line.unwrap_or(0);
            record.agp_rows = rows
                .into_iter()
                .map(|mut row| {
                    row.line = line;
                    row
                })
                .collect();
        }
        Err(problem) => sink.error(codes::FLATFILE_INVALID_CONTIG, problem, block.origin.clone()),
    }
}

fn read_sq(block: &Block, builder: &mut RecordBuilder, sink: &mut dyn MessageSink) {
    match regex!(r"(?i)^sequence\s+(\d+)\s+BP;").captures(block.text.trim()) {
        Some(caps) => builder.sequence_header_length = caps[1].parse().ok(),
        None => invalid(block, sink, "'Sequence n BP; ...'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::ValidationReport;
    use crate::core::record::ReferenceLocation;
    use crate::core::types::Origin;
    use crate::parsing::lines::{BlockLine, ConcatPolicy};

    fn block(tag: &str, lines: &[&str]) -> Block {
        let dialect = TagDialect::embl();
        let space = dialect.policy(tag) == ConcatPolicy::Space;
        let mut text = String::new();
        for line in lines {
            if space {
                for word in line.split_whitespace() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(word);
                }
            } else {
                text.push_str(line.trim());
            }
        }
        Block {
            tag: tag.to_string(),
            text,
            origin: Origin::new("t.embl", 1),
            lines: lines
                .iter()
                .enumerate()
                .map(|(i, l)| BlockLine {
                    line: i + 1,
                    raw: format!("   {l}"),
                })
                .collect(),
        }
    }

    fn read(tag: &str, lines: &[&str], builder: &mut RecordBuilder) -> ValidationReport {
        let mut report = ValidationReport::new();
        let reader = BlockReader::for_tag(tag, &TagDialect::embl()).unwrap();
        reader.read(&block(tag, lines), builder, &mut report);
        report
    }

    #[test]
    fn test_id_line() {
        let mut builder = RecordBuilder::default();
        let report = read(
            "ID",
            &["X56734; SV 1; linear; mRNA; STD; PLN; 1859 BP."],
            &mut builder,
        );
        assert!(report.is_empty());
        let record = &builder.record;
        assert_eq!(record.primary_accession.as_deref(), Some("X56734"));
        assert_eq!(record.version, Some(1));
        assert_eq!(record.sequence.molecule_type.as_deref(), Some("mRNA"));
        assert_eq!(record.division.as_deref(), Some("PLN"));
        assert_eq!(record.sequence.declared_length, Some(1859));
    }

    #[test]
    fn test_id_line_with_placeholders() {
        let mut builder = RecordBuilder::default();
        let report = read(
            "ID",
            &["XXX; XXX; circular; genomic DNA; XXX; XXX; 16 BP."],
            &mut builder,
        );
        assert!(report.is_empty());
        assert!(builder.record.primary_accession.is_none());
        assert_eq!(builder.record.sequence.topology, Topology::Circular);
        assert!(builder.record.data_class.is_none());
    }

    #[test]
    fn test_invalid_id_line() {
        let mut builder = RecordBuilder::default();
        let report = read("ID", &["garbage"], &mut builder);
        assert_eq!(report.count_code(codes::FLATFILE_INVALID_BLOCK), 1);
    }

    #[test]
    fn test_accession_mismatch() {
        let mut builder = RecordBuilder::default();
        read("ID", &["X56734; SV 1; linear; mRNA; STD; PLN; 1859 BP."], &mut builder);
        let report = read("AC", &["Y00001; S46826;"], &mut builder);
        assert_eq!(report.count_code(codes::FLATFILE_ACCESSION_MISMATCH), 1);
        assert_eq!(builder.record.secondary_accessions, vec!["S46826"]);
    }

    #[test]
    fn test_submitter_id() {
        let mut builder = RecordBuilder::default();
        let report = read("AC", &["* _contig_1"], &mut builder);
        assert!(report.is_empty());
        assert_eq!(builder.record.submitter_id.as_deref(), Some("_contig_1"));
    }

    #[test]
    fn test_dates() {
        let mut builder = RecordBuilder::default();
        let report = read(
            "DT",
            &[
                "12-SEP-1991 (Rel. 29, Created)",
                "15-OCT-2001 (Rel. 69, Last updated, Version 5)",
            ],
            &mut builder,
        );
        assert!(report.is_empty());
        assert_eq!(builder.record.first_public.unwrap().to_string(), "1991-09-12");
        assert_eq!(builder.record.last_updated.unwrap().to_string(), "2001-10-15");

        let report = read("DT", &["31-FEB-1991 (Rel. 29, Created)"], &mut builder);
        assert_eq!(report.count_code(codes::FLATFILE_INVALID_DATE), 1);

        let report = read(
            "DT",
            &["15-OCT-2001 (Rel. 1, Created)", "12-SEP-1991 (Rel. 2, Last updated, Version 2)"],
            &mut builder,
        );
        assert_eq!(report.count_code(codes::FLATFILE_INVALID_DATE), 1);
    }

    #[test]
    fn test_reference_blocks() {
        let mut builder = RecordBuilder::default();
        let orphan = read("RA", &["Nobody A.;"], &mut builder);
        assert_eq!(orphan.count_code(codes::FLATFILE_ORPHAN_REFERENCE_LINE), 1);

        read("RN", &["[1]"], &mut builder);
        read("RP", &["1-1859"], &mut builder);
        read("RX", &["DOI; 10.1007/BF00039495.", "PUBMED; 1907511."], &mut builder);
        read("RA", &["Oxtoby E., Dunn M.A., Pancoro A.,", "Hughes M.A.;"], &mut builder);
        read("RT", &["\"Nucleotide and derived amino acid sequence\";"], &mut builder);
        read("RL", &["Plant Mol. Biol. 17(2):209-219(1991)."], &mut builder);

        let reference = &builder.record.references[0];
        assert_eq!(reference.number, 1);
        assert_eq!(reference.positions, vec![(1, 1859)]);
        assert_eq!(reference.xrefs.len(), 2);
        assert_eq!(reference.xrefs[0].primary, "10.1007/BF00039495");
        assert_eq!(reference.xrefs[1].database, "PUBMED");
        assert_eq!(reference.authors.len(), 4);
        assert_eq!(
            reference.title.as_deref(),
            Some("Nucleotide and derived amino acid sequence")
        );
        assert!(matches!(
            reference.location,
            Some(ReferenceLocation::Journal { year: 1991, .. })
        ));
    }

    #[test]
    fn test_unrecognised_reference_location_is_one_error() {
        let mut builder = RecordBuilder::default();
        read("RN", &["[1]"], &mut builder);
        let report = read("RL", &["no idea what", "this is"], &mut builder);
        assert_eq!(report.len(), 1);
        assert_eq!(report.count_code(codes::FLATFILE_REFERENCE_LOCATION), 1);
    }

    #[test]
    fn test_database_xrefs() {
        let mut builder = RecordBuilder::default();
        let report = read(
            "DR",
            &["MD5; 1e51ca3a5450c43524b9185c236cc5cc.", "ENA-CON; AL358912; XYZ."],
            &mut builder,
        );
        assert!(report.is_empty());
        assert_eq!(builder.record.xrefs.len(), 2);
        assert_eq!(builder.record.xrefs[1].secondary.as_deref(), Some("XYZ"));

        let report = read("DR", &["MD5; nothex."], &mut builder);
        assert_eq!(report.count_code(codes::FLATFILE_INVALID_BLOCK), 1);
    }

    #[test]
    fn test_feature_table() {
        let mut builder = RecordBuilder::default();
        let report = read(
            "FT",
            &[
                "source          1..1859",
                "                /organism=\"Trifolium repens\"",
                "                /mol_type=\"mRNA\"",
                "CDS             join(14..200,",
                "                300..1522)",
                "                /note=\"a long note that",
                "                continues\"",
                "                /pseudo",
            ],
            &mut builder,
        );
        assert!(report.is_empty());
        let features = &builder.record.features;
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].key, "source");
        assert_eq!(features[0].qualifier("organism"), Some("Trifolium repens"));
        assert_eq!(features[1].location, "join(14..200,300..1522)");
        assert_eq!(
            features[1].qualifier("note"),
            Some("a long note that continues")
        );
        assert_eq!(features[1].qualifiers[1].name, "pseudo");
        assert!(features[1].qualifiers[1].value.is_none());
    }

    #[test]
    fn test_contig_block_builds_rows() {
        let mut builder = RecordBuilder::default();
        read("AC", &["* scaffold_1"], &mut builder);
        let report = read("CO", &["join(ctg1:1..10,", "gap(5),ctg2:1..4)"], &mut builder);
        assert!(report.is_empty());
        let rows = &builder.record.agp_rows;
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.object == "scaffold_1"));
        assert_eq!(rows[2].object_end, 19);
    }

    #[test]
    fn test_sequence_data() {
        let mut builder = RecordBuilder::default();
        read("SQ", &["Sequence 12 BP; 3 A; 3 C; 3 G; 3 T; 0 other;"], &mut builder);
        assert_eq!(builder.sequence_header_length, Some(12));

        let mut report = ValidationReport::new();
        let data = Block {
            tag: String::new(),
            text: "ACGTacgt 8acgt 12".to_string(),
            origin: Origin::default(),
            lines: Vec::new(),
        };
        BlockReader::SequenceData.read(&data, &mut builder, &mut report);
        assert_eq!(builder.record.sequence.bases, b"acgtacgtacgt".to_vec());
    }

    #[test]
    fn test_keywords_and_lineage() {
        let mut builder = RecordBuilder::default();
        read("KW", &["beta-glucosidase; cyanogenesis."], &mut builder);
        read("OC", &["Eukaryota; Viridiplantae;", "Streptophyta."], &mut builder);
        assert_eq!(builder.record.keywords, vec!["beta-glucosidase", "cyanogenesis"]);
        assert_eq!(builder.record.lineage.len(), 3);
    }

    #[test]
    fn test_assembly_header() {
        let mut builder = RecordBuilder::default();
        let report = read(
            "AH",
            &["LOCAL_SPAN     PRIMARY_IDENTIFIER     PRIMARY_SPAN     COMP"],
            &mut builder,
        );
        assert!(report.is_empty(), "{:?}", report.messages);
        assert!(builder.record.assembly.is_empty());

        let report = read("AH", &["LOCAL_SPAN PRIMARY_SPAN"], &mut builder);
        assert_eq!(report.count_code(codes::FLATFILE_INVALID_BLOCK), 1);
    }
}
