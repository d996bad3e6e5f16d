//! AGP placement rows and their controlled vocabularies.
//!
//! Rows keep the raw vocabulary strings exactly as written so that a row with
//! an out-of-vocabulary value can still be reported on and placed. The typed
//! enums are obtained on demand through their `parse` functions.

use serde::{Deserialize, Serialize};

/// Component type code (column 5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    /// Active finishing
    A,
    /// Draft HTG
    D,
    /// Finished HTG
    F,
    /// Whole genome finishing
    G,
    /// Other sequence
    O,
    /// Pre draft
    P,
    /// WGS contig
    W,
    /// Gap of specified length
    N,
    /// Gap of unknown length
    U,
}

impl ComponentType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "D" => Some(Self::D),
            "F" => Some(Self::F),
            "G" => Some(Self::G),
            "O" => Some(Self::O),
            "P" => Some(Self::P),
            "W" => Some(Self::W),
            "N" => Some(Self::N),
            "U" => Some(Self::U),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_gap(self) -> bool {
        matches!(self, Self::N | Self::U)
    }
}

/// Gap type (column 7 of a gap row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    Scaffold,
    Contig,
    Centromere,
    ShortArm,
    Heterochromatin,
    Telomere,
    Repeat,
}

impl GapType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scaffold" => Some(Self::Scaffold),
            "contig" => Some(Self::Contig),
            "centromere" => Some(Self::Centromere),
            "short_arm" => Some(Self::ShortArm),
            "heterochromatin" => Some(Self::Heterochromatin),
            "telomere" => Some(Self::Telomere),
            "repeat" => Some(Self::Repeat),
            _ => None,
        }
    }
}

/// Linkage evidence (column 9 of a gap row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageEvidence {
    Na,
    PairedEnds,
    AlignGenus,
    AlignXgenus,
    AlignTrnscpt,
    WithinClone,
    CloneContig,
    Map,
    Strobe,
    Unspecified,
}

impl LinkageEvidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "na" => Some(Self::Na),
            "paired-ends" => Some(Self::PairedEnds),
            "align_genus" => Some(Self::AlignGenus),
            "align_xgenus" => Some(Self::AlignXgenus),
            "align_trnscpt" => Some(Self::AlignTrnscpt),
            "within_clone" => Some(Self::WithinClone),
            "clone_contig" => Some(Self::CloneContig),
            "map" => Some(Self::Map),
            "strobe" => Some(Self::Strobe),
            "unspecified" => Some(Self::Unspecified),
            _ => None,
        }
    }
}

/// Component orientation (column 9 of a component row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Plus,
    Minus,
    Unknown,
    Irrelevant,
}

impl Orientation {
    /// Accepts `+ - plus minus ? 0 unknown na irrelevant`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "+" | "plus" => Some(Self::Plus),
            "-" | "minus" => Some(Self::Minus),
            "?" | "0" | "unknown" => Some(Self::Unknown),
            "na" | "irrelevant" => Some(Self::Irrelevant),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(self, Self::Minus)
    }
}

/// Fields of a gap row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapPart {
    pub gap_length: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_type: Option<String>,
    /// `yes`/`no` linkage column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkage: Option<String>,
    /// One or more evidence values (`;`-separated in the file)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linkage_evidence: Vec<String>,
}

/// Fields of a component (non-gap) row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPart {
    pub component_id: String,
    pub component_begin: i64,
    pub component_end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

/// Either the gap fields or the component fields of a row, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgpPart {
    Gap(GapPart),
    Component(ComponentPart),
}

/// Largest coordinate or length accepted from a file
pub const MAX_COORDINATE: i64 = 1 << 40;

/// Stable identity of a row: owning object and part number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub object: String,
    pub part_number: i64,
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.object, self.part_number)
    }
}

/// One AGP line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgpRow {
    pub object: String,
    pub object_begin: i64,
    pub object_end: i64,
    pub part_number: i64,
    /// Raw component type code as written
    pub component_type: String,
    pub part: AgpPart,
    /// 1-based line in the AGP file, or 0 for rows derived from a flat file
    #[serde(default)]
    pub line: usize,
    /// Bytes placed by this row, attached once the component is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<u8>>,
}

impl AgpRow {
    #[must_use]
    pub fn key(&self) -> RowKey {
        RowKey {
            object: self.object.clone(),
            part_number: self.part_number,
        }
    }

    /// A row is a gap when its type code is `N` or `U`
    #[must_use]
    pub fn is_gap(&self) -> bool {
        matches!(self.part, AgpPart::Gap(_))
    }

    #[must_use]
    pub fn gap(&self) -> Option<&GapPart> {
        match &self.part {
            AgpPart::Gap(gap) => Some(gap),
            AgpPart::Component(_) => None,
        }
    }

    #[must_use]
    pub fn component(&self) -> Option<&ComponentPart> {
        match &self.part {
            AgpPart::Component(component) => Some(component),
            AgpPart::Gap(_) => None,
        }
    }

    #[must_use]
    pub fn component_id(&self) -> Option<&str> {
        self.component().map(|c| c.component_id.as_str())
    }

    /// Length of the object interval covered by this row
    #[must_use]
    pub fn object_span(&self) -> i64 {
        self.object_end.saturating_sub(self.object_begin).saturating_add(1)
    }

    /// Number of bases this row contributes: the gap length or the component span
    #[must_use]
    pub fn contributed_length(&self) -> i64 {
        match &self.part {
            AgpPart::Gap(gap) => gap.gap_length,
            AgpPart::Component(c) => c
                .component_end
                .saturating_sub(c.component_begin)
                .saturating_add(1),
        }
    }

    #[must_use]
    pub fn orientation(&self) -> Option<Orientation> {
        self.component()
            .and_then(|c| c.orientation.as_deref())
            .and_then(Orientation::parse)
    }

    /// Whether a gap row or a resolved component row
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.is_gap() || self.sequence.is_some()
    }

    /// Render the row back to a tab-separated AGP line
    #[must_use]
    pub fn to_agp_line(&self) -> String {
        let tail = match &self.part {
            // The linkage column is omitted when it was not given
            AgpPart::Gap(gap) => match gap.linkage.as_deref() {
                Some(linkage) => format!(
                    "{}\t{}\t{linkage}\t{}",
                    gap.gap_length,
                    gap.gap_type.as_deref().unwrap_or(""),
                    gap.linkage_evidence.join(";")
                ),
                None => format!(
                    "{}\t{}\t{}",
                    gap.gap_length,
                    gap.gap_type.as_deref().unwrap_or(""),
                    gap.linkage_evidence.join(";")
                ),
            },
            AgpPart::Component(c) => format!(
                "{}\t{}\t{}\t{}",
                c.component_id,
                c.component_begin,
                c.component_end,
                c.orientation.as_deref().unwrap_or("")
            ),
        };
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.object,
            self.object_begin,
            self.object_end,
            self.part_number,
            self.component_type,
            tail
        )
    }
}
