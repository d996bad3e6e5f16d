//! Reference location (`RL`) decoding.
//!
//! An `RL` block may describe one of several publication kinds. Each kind has
//! its own matcher; they are tried in [`LocationMatcher::PRIORITY`] order and
//! the first one that recognises the text wins.

use chrono::Datelike;

use crate::core::record::ReferenceLocation;
use crate::utils::validation::parse_flatfile_date;

/// Outcome of trying one matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The text has a different shape
    NoMatch,
    /// Recognised and decoded
    Matched(ReferenceLocation),
    /// Recognised but a value is invalid (e.g. a date that is not on the calendar)
    Invalid(String),
}

/// One candidate reference-location format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationMatcher {
    Unpublished,
    Thesis,
    Submitted,
    Patent,
    Book,
    Journal,
    ElectronicResource,
}

impl LocationMatcher {
    pub const PRIORITY: [Self; 7] = [
        Self::Unpublished,
        Self::Thesis,
        Self::Submitted,
        Self::Patent,
        Self::Book,
        Self::Journal,
        Self::ElectronicResource,
    ];

    pub fn try_match(self, text: &str) -> MatchOutcome {
        let text = text.trim();
        match self {
            Self::Unpublished => {
                if regex!(r"(?i)^unpublished\.?$").is_match(text) {
                    MatchOutcome::Matched(ReferenceLocation::Unpublished)
                } else {
                    MatchOutcome::NoMatch
                }
            }
            Self::Thesis => {
                let Some(caps) = regex!(r"(?i)^thesis\s*\((\d{4})\)\s*,?\s*(.+?)\.?$").captures(text)
                else {
                    return MatchOutcome::NoMatch;
                };
                match caps[1].parse() {
                    Ok(year) => MatchOutcome::Matched(ReferenceLocation::Thesis {
                        institute: caps[2].trim().to_string(),
                        year,
                    }),
                    Err(_) => MatchOutcome::Invalid(format!("Invalid thesis year '{}'", &caps[1])),
                }
            }
            Self::Submitted => {
                let Some(caps) = regex!(
                    r"(?i)^submitted\s*\((\d{1,2}-[a-z]{3}-\d{4})\)\s*to the (?:insdc|embl/genbank/ddbj databases)\.?\s*(.*?)\.?$"
                )
                .captures(text) else {
                    return MatchOutcome::NoMatch;
                };
                match parse_flatfile_date(&caps[1]) {
                    Some(date) => MatchOutcome::Matched(ReferenceLocation::Submission {
                        date,
                        submitter: caps[2].trim().to_string(),
                    }),
                    None => MatchOutcome::Invalid(format!("Invalid submission date '{}'", &caps[1])),
                }
            }
            Self::Patent => {
                let Some(caps) = regex!(
                    r"(?i)^patent number\s+([a-z]{2})(\w+)-(\w+)/(\d+),\s*(\d{1,2}-[a-z]{3}-\d{4})\.?\s*(.*?)\.?$"
                )
                .captures(text) else {
                    return MatchOutcome::NoMatch;
                };
                let Some(date) = parse_flatfile_date(&caps[5]) else {
                    return MatchOutcome::Invalid(format!("Invalid patent date '{}'", &caps[5]));
                };
                let Ok(sequence_number) = caps[4].parse() else {
                    return MatchOutcome::Invalid(format!(
                        "Invalid patent sequence number '{}'",
                        &caps[4]
                    ));
                };
                MatchOutcome::Matched(ReferenceLocation::Patent {
                    office: caps[1].to_uppercase(),
                    number: caps[2].to_string(),
                    patent_type: caps[3].to_string(),
                    sequence_number,
                    date,
                    applicants: split_list(&caps[6], ';'),
                })
            }
            Self::Book => {
                let Some(caps) = regex!(
                    r"(?i)^\(in\)\s*(.*?)\s*\(eds?\.?\);?\s*(.+?):(\w+)-(\w+);\s*(.+?)\s*\((\d{4})\)\.?$"
                )
                .captures(text) else {
                    return MatchOutcome::NoMatch;
                };
                match caps[6].parse() {
                    Ok(year) => MatchOutcome::Matched(ReferenceLocation::Book {
                        editors: split_list(&caps[1], ','),
                        title: caps[2].trim().to_string(),
                        first_page: caps[3].to_string(),
                        last_page: caps[4].to_string(),
                        publisher: caps[5].trim().to_string(),
                        year,
                    }),
                    Err(_) => MatchOutcome::Invalid(format!("Invalid book year '{}'", &caps[6])),
                }
            }
            Self::Journal => {
                let Some(caps) =
                    regex!(r"^(.+?)\s+(\w+)(?:\(([^)]*)\))?:(\w+)-(\w+)\((\d{4})\)\.?$").captures(text)
                else {
                    return MatchOutcome::NoMatch;
                };
                let Ok(year) = caps[6].parse::<i32>() else {
                    return MatchOutcome::Invalid(format!("Invalid journal year '{}'", &caps[6]));
                };
                if year > chrono::Utc::now().year() + 1 {
                    return MatchOutcome::Invalid(format!("Journal year {year} is in the future"));
                }
                MatchOutcome::Matched(ReferenceLocation::Journal {
                    journal: caps[1].trim().to_string(),
                    volume: caps[2].to_string(),
                    issue: caps.get(3).map(|m| m.as_str().to_string()),
                    first_page: caps[4].to_string(),
                    last_page: caps[5].to_string(),
                    year,
                })
            }
            Self::ElectronicResource => match regex!(r"(?i)^\(er\)\s*(.+)$").captures(text) {
                Some(caps) => MatchOutcome::Matched(ReferenceLocation::ElectronicResource {
                    text: caps[1].trim().to_string(),
                }),
                None => MatchOutcome::NoMatch,
            },
        }
    }
}

fn split_list(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(|s| s.trim().trim_end_matches('.').trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Decode a reference location by trying every matcher in priority order.
///
/// # Errors
///
/// Returns a description of the problem when no matcher recognises the text,
/// or when the first recognising matcher finds an invalid value.
pub fn parse_reference_location(text: &str) -> Result<ReferenceLocation, String> {
    for matcher in LocationMatcher::PRIORITY {
        match matcher.try_match(text) {
            MatchOutcome::NoMatch => continue,
            MatchOutcome::Matched(location) => return Ok(location),
            MatchOutcome::Invalid(problem) => return Err(problem),
        }
    }
    Err(format!("Unrecognised reference location '{}'", text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_unpublished() {
        assert_eq!(
            parse_reference_location("Unpublished."),
            Ok(ReferenceLocation::Unpublished)
        );
    }

    #[test]
    fn test_submission() {
        let location = parse_reference_location(
            "Submitted (19-NOV-1990) to the INSDC. Bremen University, Germany.",
        )
        .unwrap();
        assert_eq!(
            location,
            ReferenceLocation::Submission {
                date: NaiveDate::from_ymd_opt(1990, 11, 19).unwrap(),
                submitter: "Bremen University, Germany".to_string(),
            }
        );
    }

    #[test]
    fn test_submission_with_bad_date() {
        let err = parse_reference_location("Submitted (31-FEB-1990) to the INSDC. Somewhere.")
            .unwrap_err();
        assert!(err.contains("31-FEB-1990"));
    }

    #[test]
    fn test_journal() {
        let location = parse_reference_location("Plant Mol. Biol. 17(2):209-219(1991).").unwrap();
        match location {
            ReferenceLocation::Journal {
                journal,
                volume,
                issue,
                first_page,
                last_page,
                year,
            } => {
                assert_eq!(journal, "Plant Mol. Biol.");
                assert_eq!(volume, "17");
                assert_eq!(issue.as_deref(), Some("2"));
                assert_eq!(first_page, "209");
                assert_eq!(last_page, "219");
                assert_eq!(year, 1991);
            }
            other => panic!("expected journal, got {other:?}"),
        }
    }

    #[test]
    fn test_thesis_and_patent() {
        assert!(matches!(
            parse_reference_location("Thesis (1999), University of Cambridge, UK."),
            Ok(ReferenceLocation::Thesis { year: 1999, .. })
        ));

        let patent =
            parse_reference_location("Patent number EP0238993-A/3, 30-SEP-1987. BAYER AG; Foo Inc.")
                .unwrap();
        match patent {
            ReferenceLocation::Patent {
                office,
                sequence_number,
                applicants,
                ..
            } => {
                assert_eq!(office, "EP");
                assert_eq!(sequence_number, 3);
                assert_eq!(applicants, vec!["BAYER AG", "Foo Inc"]);
            }
            other => panic!("expected patent, got {other:?}"),
        }
    }

    #[test]
    fn test_book_wins_over_journal() {
        let location = parse_reference_location(
            "(in) Magnuson V.L., Ally D.S. (eds.); Genome Mapping:123-145; Academic Press, London (1995).",
        )
        .unwrap();
        match location {
            ReferenceLocation::Book { editors, year, .. } => {
                assert_eq!(editors, vec!["Magnuson V.L", "Ally D.S"]);
                assert_eq!(year, 1995);
            }
            other => panic!("expected book, got {other:?}"),
        }
    }

    #[test]
    fn test_electronic_resource() {
        assert!(matches!(
            parse_reference_location("(er) Proc. Vth Int. Symp. Biol."),
            Ok(ReferenceLocation::ElectronicResource { .. })
        ));
    }

    #[test]
    fn test_unrecognised() {
        assert!(parse_reference_location("Something else entirely").is_err());
    }
}
