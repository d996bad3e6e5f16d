//! Chromosome and unlocalized list files.
//!
//! Chromosome list rows are `object  chromosome_name  type[-topology]  [location]`,
//! unlocalized list rows are `object  chromosome_name`. Columns are tab
//! separated; whitespace separation is accepted when no tab is present.

use std::collections::BTreeSet;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::core::message::{codes, MessageSink};
use crate::core::record::Topology;
use crate::core::types::Origin;
use crate::parsing::ParseError;
use crate::utils::validation::normalize_id;

/// Replicon type column of a chromosome list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromosomeType {
    Chromosome,
    Plasmid,
    LinkageGroup,
    Monopartite,
    Segmented,
    Multipartite,
}

impl ChromosomeType {
    /// Parse `chromosome`, `plasmid-circular`, `linkage group`, ...
    pub fn parse(s: &str) -> Option<(Self, Option<Topology>)> {
        let s = s.trim().to_lowercase();
        let (kind, topology) = match s.rsplit_once('-') {
            Some((kind, suffix)) => match Topology::parse(suffix) {
                Some(topology) => (kind.to_string(), Some(topology)),
                None => (s.clone(), None),
            },
            None => (s.clone(), None),
        };
        let kind = match kind.replace([' ', '-'], "_").as_str() {
            "chromosome" => Self::Chromosome,
            "plasmid" => Self::Plasmid,
            "linkage_group" => Self::LinkageGroup,
            "monopartite" => Self::Monopartite,
            "segmented" => Self::Segmented,
            "multipartite" => Self::Multipartite,
            _ => return None,
        };
        Some((kind, topology))
    }
}

/// Cellular location column of a chromosome list
pub const CHROMOSOME_LOCATIONS: &[&str] = &[
    "macronuclear",
    "nucleomorph",
    "mitochondrion",
    "kinetoplast",
    "chloroplast",
    "chromoplast",
    "plastid",
    "virion",
    "phage",
    "proviral",
    "prophage",
    "viroid",
    "cyanelle",
    "apicoplast",
    "leucoplast",
    "proplastid",
    "hydrogenosome",
    "chromatophore",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromosomeEntry {
    pub object: String,
    pub chromosome_name: String,
    pub chromosome_type: ChromosomeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlocalizedEntry {
    pub object: String,
    pub chromosome_name: String,
    pub line: usize,
}

fn columns(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Yield `(line_no, columns)` for every non-comment, non-blank line
fn for_each_row<R, F>(reader: R, mut visit: F) -> Result<(), ParseError>
where
    R: BufRead,
    F: FnMut(usize, &[&str]),
{
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        visit(index + 1, &columns(&line));
    }
    Ok(())
}

/// Parse a chromosome list. Invalid rows are reported and skipped.
///
/// # Errors
///
/// Returns `ParseError::Io` if reading fails.
pub fn parse_chromosome_list<R: BufRead>(
    reader: R,
    source: &str,
    sink: &mut dyn MessageSink,
) -> Result<Vec<ChromosomeEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut objects = BTreeSet::new();
    let mut names = BTreeSet::new();

    for_each_row(reader, |line, columns| {
        let origin = Origin::new(source, line);
        let mut invalid = |message: String| sink.error(codes::LIST_INVALID_ROW, message, origin.clone());

        if !(3..=4).contains(&columns.len()) || columns.iter().any(|c| c.is_empty()) {
            invalid(format!(
                "Expected 3 or 4 chromosome list columns, found {}",
                columns.len()
            ));
            return;
        }
        let Some((chromosome_type, topology)) = ChromosomeType::parse(columns[2]) else {
            invalid(format!("Invalid chromosome type '{}'", columns[2]));
            return;
        };
        let location = columns.get(3).map(|l| l.to_lowercase());
        if let Some(location) = &location {
            if !CHROMOSOME_LOCATIONS.contains(&location.as_str()) {
                invalid(format!("Invalid chromosome location '{location}'"));
                return;
            }
        }
        if !objects.insert(normalize_id(columns[0])) {
            invalid(format!("Object '{}' is listed more than once", columns[0]));
            return;
        }
        if !names.insert(normalize_id(columns[1])) {
            invalid(format!("Chromosome name '{}' is used more than once", columns[1]));
            return;
        }

        entries.push(ChromosomeEntry {
            object: columns[0].to_string(),
            chromosome_name: columns[1].to_string(),
            chromosome_type,
            topology,
            location,
            line,
        });
    })?;

    Ok(entries)
}

/// Parse an unlocalized list. Invalid rows are reported and skipped.
///
/// # Errors
///
/// Returns `ParseError::Io` if reading fails.
pub fn parse_unlocalized_list<R: BufRead>(
    reader: R,
    source: &str,
    sink: &mut dyn MessageSink,
) -> Result<Vec<UnlocalizedEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut objects = BTreeSet::new();

    for_each_row(reader, |line, columns| {
        let origin = Origin::new(source, line);
        if columns.len() != 2 || columns.iter().any(|c| c.is_empty()) {
            sink.error(
                codes::LIST_INVALID_ROW,
                format!("Expected 2 unlocalized list columns, found {}", columns.len()),
                origin,
            );
            return;
        }
        if !objects.insert(normalize_id(columns[0])) {
            sink.error(
                codes::LIST_INVALID_ROW,
                format!("Object '{}' is listed more than once", columns[0]),
                origin,
            );
            return;
        }
        entries.push(UnlocalizedEntry {
            object: columns[0].to_string(),
            chromosome_name: columns[1].to_string(),
            line,
        });
    })?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::ValidationReport;

    #[test]
    fn test_chromosome_type_parse() {
        assert_eq!(
            ChromosomeType::parse("Chromosome"),
            Some((ChromosomeType::Chromosome, None))
        );
        assert_eq!(
            ChromosomeType::parse("plasmid-circular"),
            Some((ChromosomeType::Plasmid, Some(Topology::Circular)))
        );
        assert_eq!(
            ChromosomeType::parse("linkage group"),
            Some((ChromosomeType::LinkageGroup, None))
        );
        assert_eq!(ChromosomeType::parse("blob"), None);
    }

    #[test]
    fn test_parse_chromosome_list() {
        let text = "# object\tname\ttype\tlocation\nchr1_obj\t1\tchromosome\nmt_obj\tMT\tchromosome-circular\tmitochondrion\n\nbad\trow\n";
        let mut report = ValidationReport::new();
        let entries = parse_chromosome_list(text.as_bytes(), "chrom.txt", &mut report).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].object, "chr1_obj");
        assert_eq!(entries[1].location.as_deref(), Some("mitochondrion"));
        assert_eq!(entries[1].topology, Some(Topology::Circular));
        assert_eq!(report.count_code(codes::LIST_INVALID_ROW), 1);
        assert_eq!(report.messages[0].origin, Origin::new("chrom.txt", 5));
    }

    #[test]
    fn test_duplicate_chromosome_list_entries() {
        let text = "a\t1\tchromosome\nA\t2\tchromosome\nb\t1\tchromosome\nc\t3\tchromosome\tspaceship\n";
        let mut report = ValidationReport::new();
        let entries = parse_chromosome_list(text.as_bytes(), "chrom.txt", &mut report).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(report.count_code(codes::LIST_INVALID_ROW), 3);
    }

    #[test]
    fn test_parse_unlocalized_list() {
        let text = "scaf_7\t1\nscaf_8 1\nscaf_7\t2\ntoo\tmany\tcolumns\n";
        let mut report = ValidationReport::new();
        let entries = parse_unlocalized_list(text.as_bytes(), "unloc.txt", &mut report).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].object, "scaf_8");
        assert_eq!(report.count_code(codes::LIST_INVALID_ROW), 2);
    }
}
