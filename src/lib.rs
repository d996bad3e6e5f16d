//! # agp-assembler
//!
//! A library for validating genome assembly submissions and building their
//! object sequences from AGP placements.
//!
//! An assembly submission describes scaffolds and chromosomes as ordered
//! placements of smaller components (contigs, or scaffolds one level down)
//! separated by gaps. `agp-assembler` reads the files of such a submission,
//! reports every problem with the file and line it came from, and can
//! reconstruct each object's full sequence, level by level.
//!
//! ## Features
//!
//! - **AGP validation**: Part numbering, coordinate contiguity, gap and component vocabularies
//! - **EMBL flat files**: Tag-driven line reader and per-tag block readers, including `CO` joins
//! - **Persistent placement index**: SQLite-backed, committed after each unit of work
//! - **Hierarchical assembly**: Assembled objects feed the rows that place them
//! - **Submission checks**: Duplicate names, unresolved components, genome size ceilings
//!
//! ## Example
//!
//! ```rust
//! use agp_assembler::catalog::lookup::NoLengthLookup;
//! use agp_assembler::core::message::ValidationReport;
//! use agp_assembler::parsing::agp::{AgpParser, AgpValidator};
//!
//! let text = "scaf1\t1\t330\t1\tW\tctg1\t1\t330\t+\n\
//!             scaf1\t331\t354\t2\tN\t24\tscaffold\tyes\tpaired-ends\n";
//!
//! let mut report = ValidationReport::new();
//! let rows = AgpParser::new("scaffolds.agp").parse_text(text, &mut report);
//!
//! let mut validator = AgpValidator::new();
//! for row in &rows {
//!     validator.validate(row, &NoLengthLookup, &mut report);
//! }
//! assert!(report.is_empty());
//! assert_eq!(rows.last().map(|r| r.object_end), Some(354));
//! ```
//!
//! ## Modules
//!
//! - [`assembly`]: Level-agnostic assembler over the placement index
//! - [`catalog`]: Persistent placement index and component lookups
//! - [`core`]: Core data types for AGP rows, flat-file records and diagnostics
//! - [`parsing`]: Readers for AGP, FASTA, EMBL flat files and list files
//! - [`submission`]: Cross-file state and the submission pipeline
//! - [`cli`]: Command-line interface implementation

pub mod assembly;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod parsing;
pub mod submission;
pub mod utils;

// Re-export commonly used types for convenience
pub use assembly::engine::{AssemblyError, Assembler};
pub use catalog::store::{AssemblySequenceInfo, PlacementIndex};
pub use core::agp::AgpRow;
pub use core::message::{MessageSink, ValidationReport};
pub use core::types::*;
pub use submission::pipeline::{Submission, SubmissionOptions, SubmissionOutcome};
pub use submission::SubmissionError;
