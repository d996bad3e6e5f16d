//! Readers for the files of an assembly submission.
//!
//! This module provides parsers for:
//!
//! - **Flat files**: tag-structured records ([`lines`] groups lines into blocks,
//!   [`blocks`] decodes each block, [`flatfile`] assembles records)
//! - **AGP files**: placement rows with row-order validation ([`agp`])
//! - **FASTA files**: component sequences ([`fasta`])
//! - **Chromosome and unlocalized lists**: object classification ([`lists`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use agp_assembler::core::message::ValidationReport;
//! use agp_assembler::parsing::agp::{AgpParser, AgpValidator};
//! use agp_assembler::catalog::lookup::NoLengthLookup;
//!
//! let text = "SCAFF1\t1\t330\t1\tW\tCTG1\t1\t330\t+\n";
//! let mut report = ValidationReport::new();
//! let mut validator = AgpValidator::new();
//! for row in AgpParser::new("scaffolds.agp").parse_text(text, &mut report) {
//!     validator.validate(&row, &NoLengthLookup, &mut report);
//! }
//! assert!(report.is_empty());
//! ```
//!
//! ## Supported flat-file tags (EMBL dialect)
//!
//! | Tag | Content | Concatenation |
//! |-----|---------|---------------|
//! | ID  | Identification line | space |
//! | AC  | Accessions or submitter id | space |
//! | DT  | Dates | space |
//! | RN..RL | Reference blocks | space |
//! | FT  | Feature table | per line |
//! | CO  | Contig join | no space |
//! | (blank) | Sequence data | no space |

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

/// Compile a literal pattern once
macro_rules! regex {
    ($pattern:expr) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).expect("literal pattern compiles"))
    }};
}

pub mod agp;
pub mod blocks;
pub mod contig;
pub mod fasta;
pub mod flatfile;
pub mod lines;
pub mod lists;
pub mod reference;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a text input, transparently decompressing gzip/bgzip files
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Display name used in origins for a path
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped(Path::new("a.fa.gz")));
        assert!(is_gzipped(Path::new("a.AGP.BGZ")));
        assert!(!is_gzipped(Path::new("a.agp")));
    }

    #[test]
    fn test_open_gzipped_input() {
        let mut temp = NamedTempFile::with_suffix(".embl.gz").unwrap();
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"ID   X;\n//\n").unwrap();
        temp.write_all(&encoder.finish().unwrap()).unwrap();
        temp.flush().unwrap();

        let mut text = String::new();
        open_input(temp.path()).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "ID   X;\n//\n");
    }

    #[test]
    fn test_source_name() {
        assert_eq!(source_name(Path::new("/tmp/x/chr.agp")), "chr.agp");
    }
}
