//! Collaborator contracts consumed by the validator and the assembler.

use std::collections::HashMap;

use crate::utils::validation::normalize_id;

/// Known sequence length of a component, used to bound-check AGP rows
pub trait ComponentLengthLookup {
    /// `None` when the length is unknown
    fn component_length(&self, component_id: &str) -> Option<u64>;
}

/// Lookup used when no length source is available; range checks are skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLengthLookup;

impl ComponentLengthLookup for NoLengthLookup {
    fn component_length(&self, _component_id: &str) -> Option<u64> {
        None
    }
}

impl ComponentLengthLookup for HashMap<String, u64> {
    fn component_length(&self, component_id: &str) -> Option<u64> {
        self.get(component_id)
            .or_else(|| self.get(&normalize_id(component_id)))
            .copied()
    }
}

/// Source of resolved component sequences
pub trait ComponentSequenceSource {
    fn component_sequence(&self, component_id: &str) -> Option<&[u8]>;
}

/// In-memory sequences keyed by normalized component id
#[derive(Debug, Clone, Default)]
pub struct InMemorySequences {
    sequences: HashMap<String, Vec<u8>>,
}

impl InMemorySequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component_id: &str, sequence: impl Into<Vec<u8>>) {
        self.sequences
            .insert(normalize_id(component_id), sequence.into());
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl ComponentSequenceSource for InMemorySequences {
    fn component_sequence(&self, component_id: &str) -> Option<&[u8]> {
        self.sequences
            .get(&normalize_id(component_id))
            .map(Vec::as_slice)
    }
}

impl ComponentLengthLookup for InMemorySequences {
    fn component_length(&self, component_id: &str) -> Option<u64> {
        self.component_sequence(component_id)
            .map(|s| s.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_map_lookup_normalizes() {
        let lengths: HashMap<String, u64> = [("CTG1".to_string(), 10)].into_iter().collect();
        assert_eq!(lengths.component_length("ctg1"), Some(10));
        assert_eq!(lengths.component_length("CTG1"), Some(10));
        assert_eq!(lengths.component_length("ctg2"), None);
        assert_eq!(NoLengthLookup.component_length("ctg1"), None);
    }

    #[test]
    fn test_in_memory_sequences() {
        let mut sequences = InMemorySequences::new();
        sequences.insert("ctg1", b"ACGT".to_vec());
        assert_eq!(sequences.component_sequence("CTG1"), Some(&b"ACGT"[..]));
        assert_eq!(sequences.component_length("Ctg1"), Some(4));
        assert_eq!(sequences.len(), 1);
    }
}
