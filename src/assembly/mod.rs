//! Hierarchical sequence assembly.
//!
//! The [`engine::Assembler`] turns AGP rows plus component sequences into
//! per-object sequences. It does not know about contigs, scaffolds or
//! chromosomes as such: an assembled object is simply registered as a new
//! component, and any row placing it resolves in turn. Nothing is assembled
//! until the caller seals the index, so an object's rows may come from
//! several files.
//!
//! ```text
//! ctg1 ─┐
//!       ├─ attach ─> scaffold_1 ─┐
//! ctg2 ─┘                        ├─ attach ─> chr1
//! ctg3 ──────────────────────────┘
//! ```

pub mod engine;
