use serde::{Deserialize, Serialize};

/// Provenance of a diagnostic: the file and 1-based line it came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Origin {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
        }
    }

    /// Origin pointing at a whole file rather than one line
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: None,
        }
    }

    /// Same file, different line
    #[must_use]
    pub fn at_line(&self, line: usize) -> Self {
        Self {
            file: self.file.clone(),
            line: Some(line),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line}"),
            (Some(file), None) => write!(f, "{file}"),
            (None, Some(line)) => write!(f, "line {line}"),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

/// Severity of a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Assembly level of an object. The discriminants are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyLevel {
    Contig = 0,
    Scaffold = 1,
    Chromosome = 2,
}

impl std::fmt::Display for AssemblyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contig => write!(f, "contig"),
            Self::Scaffold => write!(f, "scaffold"),
            Self::Chromosome => write!(f, "chromosome"),
        }
    }
}

/// Assembly type declared for a submission
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum AssemblyType {
    #[default]
    CloneOrIsolate,
    PrimaryMetagenome,
    BinnedMetagenome,
    MetagenomeAssembledGenome,
    EnvironmentalSingleCellAmplifiedGenome,
    Covid19Outbreak,
    ClinicalIsolateAssembly,
}

impl AssemblyType {
    /// Parse an assembly type as written in a submission manifest
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "clone or isolate" | "clone-or-isolate" => Some(Self::CloneOrIsolate),
            "primary metagenome" | "primary-metagenome" => Some(Self::PrimaryMetagenome),
            "binned metagenome" | "binned-metagenome" => Some(Self::BinnedMetagenome),
            "metagenome-assembled genome (mag)" | "metagenome-assembled-genome" | "mag" => {
                Some(Self::MetagenomeAssembledGenome)
            }
            "environmental single-cell amplified genome (sag)"
            | "environmental-single-cell-amplified-genome"
            | "sag" => Some(Self::EnvironmentalSingleCellAmplifiedGenome),
            "covid-19 outbreak" | "covid-19-outbreak" | "covid19-outbreak" => {
                Some(Self::Covid19Outbreak)
            }
            "clinical isolate assembly" | "clinical-isolate-assembly" => {
                Some(Self::ClinicalIsolateAssembly)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for AssemblyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CloneOrIsolate => write!(f, "clone or isolate"),
            Self::PrimaryMetagenome => write!(f, "primary metagenome"),
            Self::BinnedMetagenome => write!(f, "binned metagenome"),
            Self::MetagenomeAssembledGenome => write!(f, "Metagenome-Assembled Genome (MAG)"),
            Self::EnvironmentalSingleCellAmplifiedGenome => {
                write!(f, "Environmental Single-Cell Amplified Genome (SAG)")
            }
            Self::Covid19Outbreak => write!(f, "COVID-19 outbreak"),
            Self::ClinicalIsolateAssembly => write!(f, "clinical isolate assembly"),
        }
    }
}

/// Kind of file in a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    ChromosomeList,
    UnlocalizedList,
    Agp,
    Fasta,
    FlatFile,
}

impl FileType {
    /// Processing rank within one submission pass (lower first). Files
    /// defining component sequences come before the AGP files placing them.
    #[must_use]
    pub fn processing_rank(self) -> u8 {
        match self {
            Self::ChromosomeList => 0,
            Self::UnlocalizedList => 1,
            Self::Fasta => 2,
            Self::FlatFile => 3,
            Self::Agp => 4,
        }
    }
}
