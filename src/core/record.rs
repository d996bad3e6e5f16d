use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::agp::AgpRow;
use crate::core::types::Origin;

/// Sequence topology from the ID line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    Linear,
    Circular,
}

impl Topology {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "circular" => Some(Self::Circular),
            _ => None,
        }
    }
}

/// Sequence carried by a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<u8>,
    /// Length declared on the ID line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_length: Option<u64>,
    #[serde(default)]
    pub topology: Topology,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecule_type: Option<String>,
}

impl Sequence {
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bases.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// A database cross reference (`DR` / `RX`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XRef {
    pub database: String,
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

/// Publication a reference points at, decoded from the `RL` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceLocation {
    Unpublished,
    Thesis {
        institute: String,
        year: i32,
    },
    Submission {
        date: NaiveDate,
        submitter: String,
    },
    Patent {
        office: String,
        number: String,
        patent_type: String,
        sequence_number: u32,
        date: NaiveDate,
        applicants: Vec<String>,
    },
    Book {
        editors: Vec<String>,
        title: String,
        first_page: String,
        last_page: String,
        publisher: String,
        year: i32,
    },
    Journal {
        journal: String,
        volume: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue: Option<String>,
        first_page: String,
        last_page: String,
        year: i32,
    },
    ElectronicResource {
        text: String,
    },
}

/// One `RN` reference with its sub-blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<(u64, u64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xrefs: Vec<XRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ReferenceLocation>,
}

/// One `/name=value` feature qualifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A feature table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub key: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

impl Feature {
    /// First value of a qualifier
    #[must_use]
    pub fn qualifier(&self, name: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|q| q.name == name)
            .and_then(|q| q.value.as_deref())
    }
}

/// A TPA assembly (`AS`) line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblySpan {
    pub local_begin: u64,
    pub local_end: u64,
    pub primary_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_span: Option<(u64, u64)>,
    pub complement: bool,
}

/// A flat-file entry under construction or finished
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Origin of the first line of the record
    #[serde(default)]
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_accession: Option<String>,
    /// Accession declared on the ID line, kept for cross checking with `AC`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_accession: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_accessions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_public: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lineage: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organelle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xrefs: Vec<XRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assembly: Vec<AssemblySpan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub sequence: Sequence,
    /// Placement rows when the record describes an assembly object (`CO` lines)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agp_rows: Vec<AgpRow>,
}

impl Record {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// Name used to identify the record as an assembly object: the submitter
    /// identifier when present, otherwise the primary accession
    #[must_use]
    pub fn object_name(&self) -> Option<&str> {
        self.submitter_id
            .as_deref()
            .or(self.primary_accession.as_deref())
    }

    #[must_use]
    pub fn is_assembly_object(&self) -> bool {
        !self.agp_rows.is_empty()
    }
}
