//! Registries shared by every file of one submission.
//!
//! A [`SubmissionState`] is created per submission and passed by reference to
//! each stage, so independent submissions never share state. Every set is
//! written during the single parse pass and only read afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::core::message::{codes, MessageSink};
use crate::core::types::{AssemblyLevel, AssemblyType, Origin};
use crate::parsing::lists::{ChromosomeEntry, UnlocalizedEntry};
use crate::submission::SubmissionError;
use crate::utils::validation::normalize_id;

/// A name defined a second time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateName {
    pub name: String,
    pub first: Origin,
    pub again: Origin,
}

impl std::fmt::Display for DuplicateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' ({} and {})", self.name, self.first, self.again)
    }
}

#[derive(Debug, Default)]
pub struct SubmissionState {
    names: HashMap<String, Origin>,
    duplicates: Vec<DuplicateName>,
    chromosomes: BTreeMap<String, ChromosomeEntry>,
    chromosome_names: BTreeSet<String>,
    unlocalized: BTreeMap<String, UnlocalizedEntry>,
    agp_objects: BTreeSet<String>,
    agp_components: BTreeSet<String>,
    /// Last object end per AGP object
    agp_lengths: BTreeMap<String, u64>,
    /// Length of every sequence record
    sequence_lengths: BTreeMap<String, u64>,
    genome_size: u64,
}

impl SubmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a defined name, returning `false` and remembering the clash when
    /// the name was already defined anywhere in the submission
    pub fn register_name(&mut self, name: &str, origin: Origin) -> bool {
        let key = normalize_id(name);
        if let Some(first) = self.names.get(&key) {
            debug!(name, "Duplicate object name");
            self.duplicates.push(DuplicateName {
                name: name.to_string(),
                first: first.clone(),
                again: origin,
            });
            return false;
        }
        self.names.insert(key, origin);
        true
    }

    pub fn duplicates(&self) -> &[DuplicateName] {
        &self.duplicates
    }

    /// # Errors
    ///
    /// Returns one `SubmissionError::DuplicateNames` listing every duplicate.
    pub fn check_duplicates(&self) -> Result<(), SubmissionError> {
        if self.duplicates.is_empty() {
            return Ok(());
        }
        Err(SubmissionError::DuplicateNames {
            duplicates: self.duplicates.clone(),
        })
    }

    pub fn add_chromosomes(&mut self, entries: Vec<ChromosomeEntry>) {
        for entry in entries {
            self.chromosome_names.insert(normalize_id(&entry.chromosome_name));
            self.chromosomes.insert(normalize_id(&entry.object), entry);
        }
    }

    pub fn add_unlocalized(&mut self, entries: Vec<UnlocalizedEntry>) {
        for entry in entries {
            self.unlocalized.insert(normalize_id(&entry.object), entry);
        }
    }

    #[must_use]
    pub fn has_chromosome_list(&self) -> bool {
        !self.chromosomes.is_empty()
    }

    /// Report unlocalized entries naming a chromosome absent from the chromosome list
    pub fn check_lists(&self, source: &str, sink: &mut dyn MessageSink) {
        for entry in self.unlocalized.values() {
            if !self.chromosome_names.contains(&normalize_id(&entry.chromosome_name)) {
                sink.error(
                    codes::LIST_INVALID_ROW,
                    format!(
                        "Unlocalized object '{}' names chromosome '{}' which is not in the chromosome list",
                        entry.object, entry.chromosome_name
                    ),
                    Origin::new(source, entry.line),
                );
            }
        }
    }

    /// Note an AGP object row, returning `true` the first time the object is seen
    pub fn record_agp_row(&mut self, object: &str, object_end: i64) -> bool {
        let key = normalize_id(object);
        let end = u64::try_from(object_end).unwrap_or(0);
        let length = self.agp_lengths.entry(key.clone()).or_insert(0);
        *length = (*length).max(end);
        self.agp_objects.insert(key)
    }

    pub fn record_agp_component(&mut self, component: &str) {
        self.agp_components.insert(normalize_id(component));
    }

    /// Level fixed by the chromosome or unlocalized list, if either mentions `name`
    #[must_use]
    pub fn listed_level(&self, name: &str) -> Option<AssemblyLevel> {
        let key = normalize_id(name);
        if self.chromosomes.contains_key(&key) {
            Some(AssemblyLevel::Chromosome)
        } else if self.unlocalized.contains_key(&key) {
            Some(AssemblyLevel::Scaffold)
        } else {
            None
        }
    }

    /// Assembly level of an object from the lists and the AGP references
    #[must_use]
    pub fn level_of(&self, name: &str) -> AssemblyLevel {
        let key = normalize_id(name);
        if let Some(level) = self.listed_level(&key) {
            level
        } else if self.agp_objects.contains(&key) {
            AssemblyLevel::Scaffold
        } else if self.agp_components.contains(&key) {
            AssemblyLevel::Contig
        } else if self.has_chromosome_list() {
            // Unplaced sequence of a chromosome-level submission
            AssemblyLevel::Scaffold
        } else {
            AssemblyLevel::Contig
        }
    }

    /// Sequences that are in neither list and not placed by any AGP row
    #[must_use]
    pub fn unplaced(&self) -> Vec<String> {
        self.sequence_lengths
            .keys()
            .chain(&self.agp_objects)
            .filter(|k| {
                !self.chromosomes.contains_key(*k)
                    && !self.unlocalized.contains_key(*k)
                    && !self.agp_components.contains(*k)
            })
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sequence records that no AGP row places and that are AGP objects of
    /// no file
    #[must_use]
    pub fn loose_sequences(&self) -> Vec<String> {
        self.sequence_lengths
            .keys()
            .filter(|k| !self.agp_components.contains(*k) && !self.agp_objects.contains(*k))
            .cloned()
            .collect()
    }

    pub fn add_sequence(&mut self, name: &str, length: u64) {
        self.sequence_lengths.insert(normalize_id(name), length);
    }

    /// Total the genome once every file is read: each top-level AGP object
    /// plus each sequence no AGP row places.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::GenomeSizeExceeded` if the total passes `ceiling`.
    pub fn tally_genome_size(
        &mut self,
        ceiling: Option<(AssemblyType, u64)>,
    ) -> Result<u64, SubmissionError> {
        let objects = self
            .agp_lengths
            .iter()
            .filter(|(k, _)| !self.agp_components.contains(*k))
            .map(|(_, &length)| length);
        let loose = self
            .sequence_lengths
            .iter()
            .filter(|(k, _)| !self.agp_components.contains(*k) && !self.agp_objects.contains(*k))
            .map(|(_, &length)| length);
        self.genome_size = objects.chain(loose).fold(0, u64::saturating_add);
        debug!(genome_size = self.genome_size, "Counted genome size");

        match ceiling {
            Some((assembly_type, ceiling)) if self.genome_size > ceiling => {
                Err(SubmissionError::GenomeSizeExceeded {
                    size: self.genome_size,
                    ceiling,
                    assembly_type,
                })
            }
            _ => Ok(self.genome_size),
        }
    }

    #[must_use]
    pub fn genome_size(&self) -> u64 {
        self.genome_size
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::lists::ChromosomeType;

    fn chromosome(object: &str, name: &str) -> ChromosomeEntry {
        ChromosomeEntry {
            object: object.to_string(),
            chromosome_name: name.to_string(),
            chromosome_type: ChromosomeType::Chromosome,
            topology: None,
            location: None,
            line: 1,
        }
    }

    #[test]
    fn test_duplicates_are_collected() {
        let mut state = SubmissionState::new();
        assert!(state.register_name("ctg1", Origin::new("a.fa", 1)));
        assert!(!state.register_name("CTG1", Origin::new("b.fa", 3)));
        assert!(!state.register_name("ctg1", Origin::new("c.fa", 5)));
        assert!(state.register_name("ctg2", Origin::new("a.fa", 9)));

        match state.check_duplicates() {
            Err(SubmissionError::DuplicateNames { duplicates }) => {
                assert_eq!(duplicates.len(), 2);
                assert_eq!(duplicates[0].first, Origin::new("a.fa", 1));
                assert_eq!(duplicates[1].again, Origin::new("c.fa", 5));
            }
            other => panic!("expected duplicate names, got {other:?}"),
        }
    }

    #[test]
    fn test_levels() {
        let mut state = SubmissionState::new();
        state.record_agp_row("scaf1", 100);
        state.record_agp_component("ctg1");
        assert_eq!(state.level_of("SCAF1"), AssemblyLevel::Scaffold);
        assert_eq!(state.level_of("ctg1"), AssemblyLevel::Contig);
        assert_eq!(state.level_of("loose"), AssemblyLevel::Contig);

        state.add_chromosomes(vec![chromosome("chr1_obj", "1")]);
        state.add_unlocalized(vec![UnlocalizedEntry {
            object: "unloc".to_string(),
            chromosome_name: "1".to_string(),
            line: 1,
        }]);
        assert_eq!(state.level_of("chr1_obj"), AssemblyLevel::Chromosome);
        assert_eq!(state.level_of("unloc"), AssemblyLevel::Scaffold);
        assert_eq!(state.level_of("loose"), AssemblyLevel::Scaffold);
    }

    #[test]
    fn test_unplaced_and_lists() {
        let mut state = SubmissionState::new();
        state.add_chromosomes(vec![chromosome("chr1_obj", "1")]);
        state.add_unlocalized(vec![UnlocalizedEntry {
            object: "unloc".to_string(),
            chromosome_name: "2".to_string(),
            line: 4,
        }]);
        state.record_agp_component("ctg1");
        for name in ["chr1_obj", "unloc", "ctg1", "extra"] {
            state.add_sequence(name, 10);
        }
        assert_eq!(state.unplaced(), vec!["EXTRA"]);
        assert_eq!(state.loose_sequences(), vec!["CHR1_OBJ", "EXTRA", "UNLOC"]);

        let mut report = crate::core::message::ValidationReport::new();
        state.check_lists("unloc.txt", &mut report);
        assert_eq!(report.count_code(codes::LIST_INVALID_ROW), 1);
        assert_eq!(report.messages[0].origin, Origin::new("unloc.txt", 4));
    }

    #[test]
    fn test_genome_size_counts_placement_known_at_the_end() {
        let mut state = SubmissionState::new();
        let ceiling = Some((AssemblyType::Covid19Outbreak, 200));
        // Sequences arrive before the AGP rows that place them
        state.add_sequence("ctg", 60);
        state.add_sequence("other", 40);
        state.record_agp_row("scaf", 30);
        state.record_agp_row("scaf", 64);
        state.record_agp_component("ctg");

        assert_eq!(state.tally_genome_size(ceiling).unwrap(), 104);
        assert_eq!(state.genome_size(), 104);
    }

    #[test]
    fn test_genome_size_ceiling() {
        let mut state = SubmissionState::new();
        state.add_sequence("virus", 101);
        assert!(matches!(
            state.tally_genome_size(Some((AssemblyType::Covid19Outbreak, 100))),
            Err(SubmissionError::GenomeSizeExceeded { size: 101, ceiling: 100, .. })
        ));
        assert_eq!(state.tally_genome_size(None).unwrap(), 101);
    }
}
