//! Centralized validation and helper functions.

use chrono::NaiveDate;

/// Validate that a string is a valid MD5 checksum (32 hex characters).
///
/// # Examples
///
/// ```
/// use agp_assembler::utils::validation::is_valid_md5;
///
/// assert!(is_valid_md5("6aef897c3d6ff0c78aff06ac189178dd"));
/// assert!(!is_valid_md5("not-an-md5"));
/// assert!(!is_valid_md5("6aef897c3d6ff0c78aff06ac189178d")); // 31 chars
/// ```
#[must_use]
pub fn is_valid_md5(s: &str) -> bool {
    s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compute the MD5 of a sequence over its uppercase bases (standard convention)
#[must_use]
pub fn sequence_md5(bases: &[u8]) -> String {
    let uppercase: Vec<u8> = bases.iter().map(u8::to_ascii_uppercase).collect();
    format!("{:x}", md5::compute(&uppercase))
}

/// Normalize an object or component identifier for use as an index key.
///
/// Identifiers are matched case-insensitively across files.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// Check an accession, optionally versioned (`X56734`, `AL358912.1`, `_contig_1`)
#[must_use]
pub fn is_valid_accession(s: &str) -> bool {
    let (base, version) = match s.split_once('.') {
        Some((base, version)) => (base, Some(version)),
        None => (s, None),
    };
    !base.is_empty()
        && base
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && version.map_or(true, |v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))
}

/// Parse a flat-file date of the form `DD-MON-YYYY` (e.g. `12-SEP-1991`).
///
/// Returns `None` when the text is not a valid calendar date.
#[must_use]
pub fn parse_flatfile_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d-%b-%Y").ok()
}

/// Reverse complement a nucleotide sequence, preserving case and IUPAC codes
#[must_use]
pub fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases.iter().rev().map(|&b| complement(b)).collect()
}

fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'a' => b't',
        b't' | b'u' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'r' => b'y',
        b'y' => b'r',
        b'k' => b'm',
        b'm' => b'k',
        b'b' => b'v',
        b'v' => b'b',
        b'd' => b'h',
        b'h' => b'd',
        other => other,
    }
}
