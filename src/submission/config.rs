use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::AssemblyType;
use crate::parsing::lines::TagDialect;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Genome size ceiling for COVID-19 outbreak submissions (bases)
pub const COVID_19_MAX_GENOME_SIZE: u64 = 32_000;

fn default_ceilings() -> BTreeMap<AssemblyType, u64> {
    [(AssemblyType::Covid19Outbreak, COVID_19_MAX_GENOME_SIZE)]
        .into_iter()
        .collect()
}

/// Settings for one submission pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Flat-file tag configuration
    pub dialect: TagDialect,
    /// Base written for every position of a gap row
    pub filler: char,
    pub assembly_type: AssemblyType,
    /// Maximum total genome size per assembly type
    pub genome_size_ceilings: BTreeMap<AssemblyType, u64>,
    /// Database file for the placement index; in memory when absent
    pub index_path: Option<PathBuf>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            dialect: TagDialect::embl(),
            filler: 'N',
            assembly_type: AssemblyType::default(),
            genome_size_ceilings: default_ceilings(),
            index_path: None,
        }
    }
}

impl SubmissionConfig {
    /// Load a config from a JSON file; omitted fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON cannot be parsed or is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.filler.is_ascii_alphabetic() {
            return Err(ConfigError::Invalid(format!(
                "Filler base '{}' must be an ASCII letter",
                self.filler
            )));
        }
        if self.dialect.tag_width == 0 {
            return Err(ConfigError::Invalid("Dialect tag width must be positive".to_string()));
        }
        if self.dialect.terminator.is_empty() {
            return Err(ConfigError::Invalid("Dialect terminator must not be empty".to_string()));
        }
        Ok(())
    }

    /// Filler as a byte; `validate` guarantees it is ASCII
    #[must_use]
    pub fn filler_byte(&self) -> u8 {
        u8::try_from(self.filler).unwrap_or(b'N')
    }

    /// Ceiling for the configured assembly type
    #[must_use]
    pub fn genome_size_ceiling(&self) -> Option<u64> {
        self.genome_size_ceilings.get(&self.assembly_type).copied()
    }
}
