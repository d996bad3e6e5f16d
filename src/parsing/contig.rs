//! Conversion of `CO` contig joins into AGP rows.
//!
//! A CON record describes its sequence as
//! `join(AL358912.1:1..39187,gap(unk100),complement(AL357075.1:1..35720))`.
//! Every segment becomes one row of the record's object; object coordinates
//! are laid out consecutively from 1.

use crate::core::agp::{AgpPart, AgpRow, ComponentPart, GapPart, MAX_COORDINATE};

/// Gap length assumed for `gap(unk)` without a length
pub const DEFAULT_UNKNOWN_GAP_LENGTH: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Component {
        id: String,
        begin: i64,
        end: i64,
        reverse: bool,
    },
    Gap {
        length: i64,
        unknown: bool,
    },
}

/// Split on commas outside parentheses
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_segment(text: &str) -> Result<Segment, String> {
    let text = text.trim();
    if let Some(caps) = regex!(r"(?i)^gap\((unk)?(\d*)\)$").captures(text) {
        let unknown = caps.get(1).is_some();
        let length = match caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
            Some(digits) => digits
                .parse()
                .map_err(|_| format!("Invalid gap length in '{text}'"))?,
            None if unknown => DEFAULT_UNKNOWN_GAP_LENGTH,
            None => return Err(format!("Gap without length: '{text}'")),
        };
        if !(1..=MAX_COORDINATE).contains(&length) {
            return Err(format!("Gap length out of range: '{text}'"));
        }
        return Ok(Segment::Gap { length, unknown });
    }

    let (inner, reverse) = match regex!(r"(?i)^complement\((.+)\)$").captures(text) {
        Some(caps) => (caps.get(1).map_or("", |m| m.as_str()), true),
        None => (text, false),
    };
    let caps = regex!(r"^([A-Za-z0-9_]+(?:\.\d+)?):<?(\d+)\.\.>?(\d+)$")
        .captures(inner.trim())
        .ok_or_else(|| format!("Invalid contig segment '{text}'"))?;
    let begin: i64 = caps[2]
        .parse()
        .map_err(|_| format!("Invalid begin in '{text}'"))?;
    let end: i64 = caps[3]
        .parse()
        .map_err(|_| format!("Invalid end in '{text}'"))?;
    if begin < 1 || end < begin || end > MAX_COORDINATE {
        return Err(format!("Invalid component range in '{text}'"));
    }
    Ok(Segment::Component {
        id: caps[1].to_string(),
        begin,
        end,
        reverse,
    })
}

/// Build the AGP rows for `object` from the text of a `CO` block.
///
/// # Errors
///
/// Returns a description of the first malformed segment.
pub fn parse_contig_join(object: &str, text: &str) -> Result<Vec<AgpRow>, String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let body = match regex!(r"(?i)^join\((.*)\)$").captures(&compact) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).to_string(),
        None => compact.clone(),
    };
    if body.is_empty() {
        return Err("Empty contig join".to_string());
    }

    let mut rows = Vec::new();
    let mut position = 1i64;
    for (index, segment) in split_top_level(&body).into_iter().enumerate() {
        let segment = parse_segment(segment)?;
        let part_number = i64::try_from(index + 1).map_err(|_| "Too many segments".to_string())?;
        let (length, component_type, part) = match segment {
            Segment::Gap { length, unknown } => (
                length,
                if unknown { "U" } else { "N" },
                AgpPart::Gap(GapPart {
                    gap_length: length,
                    gap_type: Some("scaffold".to_string()),
                    linkage: Some("yes".to_string()),
                    linkage_evidence: vec!["unspecified".to_string()],
                }),
            ),
            Segment::Component {
                id,
                begin,
                end,
                reverse,
            } => (
                end - begin + 1,
                "W",
                AgpPart::Component(ComponentPart {
                    component_id: id,
                    component_begin: begin,
                    component_end: end,
                    orientation: Some(String::from(if reverse { "-" } else { "+" })),
                }),
            ),
        };
        let next = position
            .checked_add(length)
            .ok_or_else(|| "Contig join is too long".to_string())?;
        rows.push(AgpRow {
            object: object.to_string(),
            object_begin: position,
            object_end: next - 1,
            part_number,
            component_type: component_type.to_string(),
            part,
            line: 0,
            sequence: None,
        });
        position = next;
    }
    Ok(rows)
}
