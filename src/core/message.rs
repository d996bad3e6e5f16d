//! Origin-aware validation messages and the sinks that collect them.
//!
//! Everything that can be pinned to one line, row or object is recorded as a
//! [`ValidationMessage`] and processing continues. Only submission-wide
//! failures are returned as errors.

use serde::{Deserialize, Serialize};

use crate::core::types::{Origin, Severity};

/// Message codes shared by the readers and validators
pub mod codes {
    pub const FLATFILE_UNKNOWN_TAG: &str = "flatfile_unknown_tag";
    pub const FLATFILE_MALFORMED_LINE: &str = "flatfile_malformed_line";
    pub const FLATFILE_INVALID_BLOCK: &str = "flatfile_invalid_block";
    pub const FLATFILE_ACCESSION_MISMATCH: &str = "flatfile_accession_mismatch";
    pub const FLATFILE_INVALID_DATE: &str = "flatfile_invalid_date";
    pub const FLATFILE_REFERENCE_LOCATION: &str = "flatfile_reference_location";
    pub const FLATFILE_ORPHAN_REFERENCE_LINE: &str = "flatfile_orphan_reference_line";
    pub const FLATFILE_SEQUENCE_LENGTH: &str = "flatfile_sequence_length";
    pub const FLATFILE_MISSING_TERMINATOR: &str = "flatfile_missing_terminator";
    pub const FLATFILE_INVALID_CONTIG: &str = "flatfile_invalid_contig";

    pub const AGP_INVALID_ROW: &str = "agp_invalid_row";
    pub const AGP_PART_NUMBER: &str = "agp_part_number";
    pub const AGP_OBJECT_BEGIN: &str = "agp_object_begin";
    pub const AGP_OBJECT_END: &str = "agp_object_end";
    pub const AGP_OBJECT_RANGE: &str = "agp_object_range";
    pub const AGP_CONTIGUITY: &str = "agp_contiguity";
    pub const AGP_COMPONENT_TYPE: &str = "agp_component_type";
    pub const AGP_GAP_TYPE: &str = "agp_gap_type";
    pub const AGP_LINKAGE: &str = "agp_linkage";
    pub const AGP_LINKAGE_EVIDENCE: &str = "agp_linkage_evidence";
    pub const AGP_GAP_LENGTH: &str = "agp_gap_length";
    pub const AGP_ORIENTATION: &str = "agp_orientation";
    pub const AGP_COMPONENT_SPAN: &str = "agp_component_span";
    pub const AGP_COMPONENT_RANGE: &str = "agp_component_range";

    pub const LIST_INVALID_ROW: &str = "list_invalid_row";
}

/// A single recorded problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub origin: Origin,
}

impl ValidationMessage {
    pub fn error(code: &str, message: impl Into<String>, origin: Origin) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
            origin,
        }
    }

    pub fn warning(code: &str, message: impl Into<String>, origin: Origin) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            origin,
        }
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.code, self.origin, self.message
        )
    }
}

/// Destination for validation messages
pub trait MessageSink {
    fn record(&mut self, message: ValidationMessage);

    fn error(&mut self, code: &str, message: String, origin: Origin) {
        self.record(ValidationMessage::error(code, message, origin));
    }
}

impl MessageSink for Vec<ValidationMessage> {
    fn record(&mut self, message: ValidationMessage) {
        self.push(message);
    }
}

/// Accumulated messages for one validation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub messages: Vec<ValidationMessage>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn messages_with_code<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a ValidationMessage> + 'a {
        self.messages.iter().filter(move |m| m.code == code)
    }

    pub fn count_code(&self, code: &str) -> usize {
        self.messages_with_code(code).count()
    }

    /// Append every message from another report
    pub fn extend(&mut self, other: ValidationReport) {
        self.messages.extend(other.messages);
    }
}

impl MessageSink for ValidationReport {
    fn record(&mut self, message: ValidationMessage) {
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = ValidationReport::new();
        report.error(codes::AGP_GAP_LENGTH, "bad".to_string(), Origin::new("x", 1));
        report.record(ValidationMessage::warning(
            codes::AGP_GAP_TYPE,
            "meh",
            Origin::default(),
        ));

        assert_eq!(report.len(), 2);
        assert_eq!(report.error_count(), 1);
        assert!(report.has_errors());
        assert_eq!(report.count_code(codes::AGP_GAP_LENGTH), 1);
        assert_eq!(report.count_code(codes::AGP_PART_NUMBER), 0);
    }

    #[test]
    fn test_message_display() {
        let msg = ValidationMessage::error(codes::AGP_INVALID_ROW, "empty row", Origin::new("a.agp", 7));
        assert_eq!(msg.to_string(), "ERROR [agp_invalid_row] a.agp:7: empty row");
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<ValidationMessage> = Vec::new();
        sink.error(codes::LIST_INVALID_ROW, "x".to_string(), Origin::default());
        assert_eq!(sink.len(), 1);
    }
}
