//! Core data types for assembly submissions.
//!
//! - [`AgpRow`](agp::AgpRow): one AGP placement or gap row
//! - [`Record`](record::Record): a flat-file entry
//! - [`ValidationMessage`](message::ValidationMessage) and [`MessageSink`](message::MessageSink):
//!   origin-aware diagnostics
//! - [`Origin`], [`AssemblyLevel`], [`AssemblyType`]: shared metadata types
//!
//! ## Assembly levels
//!
//! | Level | Value | Built from |
//! |-------|-------|------------|
//! | contig | 0 | FASTA or flat-file sequence |
//! | scaffold | 1 | contigs and gaps |
//! | chromosome | 2 | scaffolds, contigs and gaps |
//!
//! [`Origin`]: types::Origin
//! [`AssemblyLevel`]: types::AssemblyLevel
//! [`AssemblyType`]: types::AssemblyType

pub mod agp;
pub mod message;
pub mod record;
pub mod types;
