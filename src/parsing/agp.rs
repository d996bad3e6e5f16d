//! AGP row parsing and row-order validation.
//!
//! [`AgpParser`] turns lines into [`AgpRow`]s, reporting structurally broken
//! lines as `agp_invalid_row` and dropping them. [`AgpValidator`] checks each
//! surviving row against the rows seen before it for the same object and
//! records every violation it finds.

use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;

use tracing::debug;

use crate::catalog::lookup::ComponentLengthLookup;
use crate::core::agp::{
    AgpPart, AgpRow, ComponentPart, ComponentType, GapPart, GapType, LinkageEvidence,
    Orientation, MAX_COORDINATE,
};
use crate::core::message::{codes, MessageSink};
use crate::core::types::Origin;
use crate::parsing::ParseError;
use crate::utils::validation::normalize_id;

/// Columns before the type-specific tail
const LEADING_COLUMNS: usize = 5;
/// Gap rows may omit the linkage column
const MIN_COLUMNS: usize = 8;
const MAX_COLUMNS: usize = 9;

/// Line parser for one AGP source
#[derive(Debug, Clone)]
pub struct AgpParser {
    source: String,
}

impl AgpParser {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    fn columns(line: &str) -> Vec<&str> {
        let mut columns: Vec<&str> = if line.contains('\t') {
            line.split('\t').map(str::trim).collect()
        } else {
            line.split_whitespace().collect()
        };
        while columns.last().is_some_and(|c| c.is_empty()) {
            columns.pop();
        }
        columns
    }

    /// Parse one line. Comments yield `None` silently; broken rows yield
    /// `None` after recording exactly one `agp_invalid_row` error.
    pub fn parse_line(
        &self,
        line: &str,
        line_no: usize,
        sink: &mut dyn MessageSink,
    ) -> Option<AgpRow> {
        if line.trim_start().starts_with('#') {
            return None;
        }
        let origin = Origin::new(self.source.clone(), line_no);
        match self.parse_columns(&Self::columns(line), line_no) {
            Ok(row) => Some(row),
            Err(problem) => {
                sink.error(codes::AGP_INVALID_ROW, problem, origin);
                None
            }
        }
    }

    fn parse_columns(&self, columns: &[&str], line_no: usize) -> Result<AgpRow, String> {
        if columns.is_empty() {
            return Err("Empty AGP row".to_string());
        }
        if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&columns.len()) {
            return Err(format!(
                "Expected {MIN_COLUMNS} or {MAX_COLUMNS} columns, found {}",
                columns.len()
            ));
        }
        if let Some(index) = columns.iter().position(|c| c.is_empty()) {
            return Err(format!("Column {} is empty", index + 1));
        }

        let number = |index: usize, name: &str| -> Result<i64, String> {
            let value = columns[index]
                .parse::<i64>()
                .map_err(|_| format!("Invalid {name} '{}'", columns[index]))?;
            if !(-MAX_COORDINATE..=MAX_COORDINATE).contains(&value) {
                return Err(format!("The {name} {value} is out of range"));
            }
            Ok(value)
        };

        let component_type = columns[4].to_string();
        let is_gap = ComponentType::parse(&component_type).is_some_and(ComponentType::is_gap);
        let tail = &columns[LEADING_COLUMNS..];

        let part = if is_gap {
            let (linkage, evidence) = match tail {
                [_, _, linkage, evidence] => (Some((*linkage).to_string()), *evidence),
                [_, _, evidence] => (None, *evidence),
                _ => return Err("Gap row is missing columns".to_string()),
            };
            AgpPart::Gap(GapPart {
                gap_length: number(5, "gap length")?,
                gap_type: Some(tail[1].to_string()),
                linkage,
                linkage_evidence: evidence
                    .split(';')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(String::from)
                    .collect(),
            })
        } else {
            AgpPart::Component(ComponentPart {
                component_id: tail[0].to_string(),
                component_begin: number(6, "component begin")?,
                component_end: number(7, "component end")?,
                orientation: tail.get(3).map(|o| (*o).to_string()),
            })
        };

        Ok(AgpRow {
            object: columns[0].to_string(),
            object_begin: number(1, "object begin")?,
            object_end: number(2, "object end")?,
            part_number: number(3, "part number")?,
            component_type,
            part,
            line: line_no,
            sequence: None,
        })
    }

    /// Parse an in-memory AGP text
    pub fn parse_text(&self, text: &str, sink: &mut dyn MessageSink) -> Vec<AgpRow> {
        text.lines()
            .enumerate()
            .filter_map(|(index, line)| self.parse_line(line, index + 1, sink))
            .collect()
    }

    /// Parse every row from a reader
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if reading fails.
    pub fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<AgpRow>, ParseError> {
        let mut rows = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            if let Some(row) = self.parse_line(&line?, index + 1, sink) {
                rows.push(row);
            }
        }
        debug!(source = %self.source, rows = rows.len(), "Parsed AGP rows");
        Ok(rows)
    }
}

#[derive(Debug, Clone, Copy)]
struct ObjectState {
    last_part: i64,
    last_end: i64,
}

/// Row-order validator, reusable across the AGP files of one submission so
/// that an object continued in a later file is checked against its earlier rows
#[derive(Debug, Default)]
pub struct AgpValidator {
    objects: HashMap<String, ObjectState>,
    source: Option<String>,
    file_objects: BTreeSet<String>,
}

impl AgpValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute subsequent messages to `source`
    pub fn begin_file(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
        self.file_objects.clear();
    }

    /// Close the current file, returning the number of objects it touched
    pub fn finish_file(&mut self) -> usize {
        let touched = self.file_objects.len();
        debug!(
            source = self.source.as_deref().unwrap_or("<unknown>"),
            objects = touched,
            "Validated AGP file"
        );
        self.source = None;
        self.file_objects.clear();
        touched
    }

    /// Number of distinct objects validated so far
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn origin(&self, row: &AgpRow) -> Origin {
        Origin {
            file: self.source.clone(),
            line: (row.line > 0).then_some(row.line),
        }
    }

    /// Check one row, returning the number of errors recorded for it
    pub fn validate(
        &mut self,
        row: &AgpRow,
        lengths: &dyn ComponentLengthLookup,
        sink: &mut dyn MessageSink,
    ) -> usize {
        let origin = self.origin(row);
        let mut errors = 0usize;
        let mut error = |code: &str, message: String| {
            sink.error(code, message, origin.clone());
            errors += 1;
        };

        let key = normalize_id(&row.object);
        let previous = self.objects.get(&key).copied();
        self.file_objects.insert(key.clone());

        let expected_part = previous.map_or(1, |p| p.last_part.saturating_add(1));
        if row.part_number != expected_part {
            error(
                codes::AGP_PART_NUMBER,
                format!(
                    "Part number {} of object '{}' should be {expected_part}",
                    row.part_number, row.object
                ),
            );
        }

        if row.object_begin < 1 {
            error(
                codes::AGP_OBJECT_BEGIN,
                format!("Object begin {} must be at least 1", row.object_begin),
            );
        }
        if row.object_end < 1 {
            error(
                codes::AGP_OBJECT_END,
                format!("Object end {} must be at least 1", row.object_end),
            );
        }
        if row.object_end < row.object_begin {
            error(
                codes::AGP_OBJECT_RANGE,
                format!(
                    "Object end {} is before object begin {}",
                    row.object_end, row.object_begin
                ),
            );
        }

        if let Some(previous) = previous {
            if row.object_begin != previous.last_end.saturating_add(1) {
                error(
                    codes::AGP_CONTIGUITY,
                    format!(
                        "Object begin {} does not follow previous end {} of object '{}'",
                        row.object_begin, previous.last_end, row.object
                    ),
                );
            }
        }

        self.objects.insert(
            key,
            ObjectState {
                last_part: row.part_number,
                last_end: row.object_end,
            },
        );

        if ComponentType::parse(&row.component_type).is_none() {
            error(
                codes::AGP_COMPONENT_TYPE,
                format!("Invalid component type '{}'", row.component_type),
            );
        }

        match &row.part {
            AgpPart::Gap(gap) => {
                match gap.gap_type.as_deref() {
                    None => error(codes::AGP_GAP_TYPE, "Missing gap type".to_string()),
                    Some(t) if GapType::parse(t).is_none() => {
                        error(codes::AGP_GAP_TYPE, format!("Invalid gap type '{t}'"));
                    }
                    Some(_) => {}
                }

                let linkage = match gap.linkage.as_deref() {
                    None => None,
                    Some(l) if l.eq_ignore_ascii_case("yes") => Some(true),
                    Some(l) if l.eq_ignore_ascii_case("no") => Some(false),
                    Some(l) => {
                        error(codes::AGP_LINKAGE, format!("Invalid linkage '{l}', expected yes or no"));
                        None
                    }
                };

                let evidence: Vec<Option<LinkageEvidence>> = gap
                    .linkage_evidence
                    .iter()
                    .map(|e| LinkageEvidence::parse(e))
                    .collect();
                let invalid: Vec<&str> = gap
                    .linkage_evidence
                    .iter()
                    .zip(&evidence)
                    .filter(|(_, parsed)| parsed.is_none())
                    .map(|(raw, _)| raw.as_str())
                    .collect();
                if evidence.is_empty() {
                    error(codes::AGP_LINKAGE_EVIDENCE, "Missing linkage evidence".to_string());
                } else if !invalid.is_empty() {
                    error(
                        codes::AGP_LINKAGE_EVIDENCE,
                        format!("Invalid linkage evidence '{}'", invalid.join(";")),
                    );
                } else {
                    let has_na = evidence.contains(&Some(LinkageEvidence::Na));
                    match linkage {
                        Some(false) if !(has_na && evidence.len() == 1) => error(
                            codes::AGP_LINKAGE_EVIDENCE,
                            "Unlinked gaps require linkage evidence 'na'".to_string(),
                        ),
                        Some(true) if has_na => error(
                            codes::AGP_LINKAGE_EVIDENCE,
                            "Linked gaps cannot have linkage evidence 'na'".to_string(),
                        ),
                        _ => {}
                    }
                }

                let span = row.object_span();
                if gap.gap_length != span {
                    error(
                        codes::AGP_GAP_LENGTH,
                        format!(
                            "Gap length {} does not match object interval length {span}",
                            gap.gap_length
                        ),
                    );
                }
            }
            AgpPart::Component(component) => {
                match component.orientation.as_deref() {
                    None => error(codes::AGP_ORIENTATION, "Missing orientation".to_string()),
                    Some(o) if Orientation::parse(o).is_none() => {
                        error(codes::AGP_ORIENTATION, format!("Invalid orientation '{o}'"));
                    }
                    Some(_) => {}
                }

                if component.component_begin > component.component_end {
                    error(
                        codes::AGP_COMPONENT_RANGE,
                        format!(
                            "Component begin {} is after component end {}",
                            component.component_begin, component.component_end
                        ),
                    );
                } else if row.contributed_length() != row.object_span() {
                    error(
                        codes::AGP_COMPONENT_SPAN,
                        format!(
                            "Component span {} of '{}' does not match object interval length {}",
                            row.contributed_length(),
                            component.component_id,
                            row.object_span()
                        ),
                    );
                }

                if let Some(length) = lengths.component_length(&component.component_id) {
                    let length = i64::try_from(length).unwrap_or(i64::MAX);
                    if component.component_begin < 1 || component.component_end > length {
                        error(
                            codes::AGP_COMPONENT_RANGE,
                            format!(
                                "Component range {}..{} is outside '{}' of length {length}",
                                component.component_begin,
                                component.component_end,
                                component.component_id
                            ),
                        );
                    }
                }
            }
        }

        errors
    }
}
