//! Component placement index and the lookups built on it.
//!
//! The [`store::PlacementIndex`] persists every AGP row of a submission, the
//! placement lists that map a component to the rows using it, the resolved
//! component sequences and the registered
//! [`AssemblySequenceInfo`](store::AssemblySequenceInfo) records. It is opened
//! once per submission and committed after each unit of work, so assembly can
//! resume as successive files arrive.
//!
//! ## Example
//!
//! ```rust,no_run
//! use agp_assembler::catalog::lookup::ComponentLengthLookup;
//! use agp_assembler::catalog::store::PlacementIndex;
//! use std::path::Path;
//!
//! let index = PlacementIndex::open(Path::new("submission.db")).unwrap();
//! index.begin().unwrap();
//! index.put_component("ctg1", b"ACGTACGT").unwrap();
//! index.commit().unwrap();
//! assert_eq!(index.component_length("CTG1"), Some(8));
//! index.close().unwrap();
//! ```

pub mod lookup;
pub mod store;
