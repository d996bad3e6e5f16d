//! One submission pass over a set of files.
//!
//! Files are processed in a fixed order: chromosome and unlocalized lists,
//! then the FASTA and flat files that supply component sequences, then AGP
//! files. Objects are assembled once every file is read. Problems local to one line or row are collected in a
//! [`ValidationReport`](crate::core::message::ValidationReport); the
//! conditions below abort the whole pass instead:
//!
//! - a name defined more than once anywhere in the submission
//! - a placed component whose sequence never arrives
//! - a genome larger than the ceiling of the assembly type

pub mod config;
pub mod pipeline;
pub mod state;

use thiserror::Error;

use crate::assembly::engine::AssemblyError;
use crate::catalog::store::StoreError;
use crate::core::types::AssemblyType;
use crate::parsing::ParseError;
use state::DuplicateName;

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Duplicate object names in submission: {}", format_duplicates(.duplicates))]
    DuplicateNames { duplicates: Vec<DuplicateName> },

    #[error("Genome size {size} exceeds the {ceiling} bp ceiling for {assembly_type} assemblies")]
    GenomeSizeExceeded {
        size: u64,
        ceiling: u64,
        assembly_type: AssemblyType,
    },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

fn format_duplicates(duplicates: &[DuplicateName]) -> String {
    duplicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
