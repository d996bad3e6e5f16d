//! FASTA component sequences using noodles.
//!
//! Component FASTA files are streamed one record at a time so that the whole
//! submission never has to sit in memory. Gzip/bgzip inputs are decompressed
//! transparently (see [`open_input`](super::open_input)).
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna`, `.fsa` (uncompressed)
//! - any of the above with `.gz` or `.bgz` appended

use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::Path;

use noodles::fasta;

use crate::parsing::ParseError;

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    let stripped = path_str
        .strip_suffix(".gz")
        .or_else(|| path_str.strip_suffix(".bgz"))
        .unwrap_or(&path_str);

    matches!(
        Path::new(stripped)
            .extension()
            .and_then(OsStr::to_str),
        Some("fa" | "fasta" | "fna" | "fsa")
    )
}

/// One FASTA record: the first word of the definition line and its bases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaComponent {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// Visit every record of a FASTA stream in file order, returning the number
/// of records visited.
///
/// # Errors
///
/// Returns `ParseError::Noodles` if a record is malformed, or whatever error
/// `visit` returns.
pub fn for_each_component<R, E, F>(reader: R, mut visit: F) -> Result<usize, E>
where
    R: BufRead,
    E: From<ParseError>,
    F: FnMut(FastaComponent) -> Result<(), E>,
{
    let mut fasta_reader = fasta::io::Reader::new(reader);
    let mut count = 0;

    for result in fasta_reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        let sequence = record.sequence().as_ref().to_vec();
        visit(FastaComponent { name, sequence })?;
        count += 1;
    }

    Ok(count)
}

/// Collect every record of a FASTA stream
///
/// # Errors
///
/// Returns `ParseError::Noodles` if a record is malformed.
pub fn read_components<R: BufRead>(reader: R) -> Result<Vec<FastaComponent>, ParseError> {
    let mut components = Vec::new();
    for_each_component(reader, |component| {
        components.push(component);
        Ok::<(), ParseError>(())
    })?;
    Ok(components)
}

/// Write one sequence as a FASTA record
///
/// # Errors
///
/// Returns `ParseError::Io` if writing fails.
pub fn write_sequence<W: Write>(writer: W, name: &str, bases: &[u8]) -> Result<(), ParseError> {
    let mut fasta_writer = fasta::io::Writer::new(writer);
    let definition = fasta::record::Definition::new(name, None);
    let sequence = fasta::record::Sequence::from(bases.to_vec());
    fasta_writer.write_record(&fasta::Record::new(definition, sequence))?;
    Ok(())
}
