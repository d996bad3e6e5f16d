//! Persistent component placement index.
//!
//! Rows are kept in an arena keyed by (object, part number). The placement
//! table maps each component to the keys of the rows that place it, so a row
//! placed in several parents' views is never duplicated. Every key is a
//! case-normalized identifier.
//!
//! The index lives in one SQLite database per submission. Callers group
//! writes into units of work with [`PlacementIndex::begin`] and
//! [`PlacementIndex::commit`].

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::lookup::ComponentLengthLookup;
use crate::core::agp::{AgpRow, RowKey};
use crate::core::types::AssemblyLevel;
use crate::utils::validation::normalize_id;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to encode index value: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Failed to encode row: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registered facts about an assembled or component sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblySequenceInfo {
    pub name: String,
    pub length: u64,
    pub level: AssemblyLevel,
    pub md5: String,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS rows (
    object TEXT NOT NULL,
    part_number INTEGER NOT NULL,
    data TEXT NOT NULL,
    sequence BLOB,
    resolved INTEGER NOT NULL,
    PRIMARY KEY (object, part_number)
);
CREATE TABLE IF NOT EXISTS placements (
    component TEXT PRIMARY KEY,
    data BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS components (
    component TEXT PRIMARY KEY,
    sequence BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS sequence_info (
    object TEXT PRIMARY KEY,
    data BLOB NOT NULL
);
";

pub struct PlacementIndex {
    connection: Connection,
}

impl PlacementIndex {
    /// Open or create the index at `path`, keeping anything already stored
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let connection = Connection::open(path)?;
        debug!(path = %path.display(), "Opened placement index");
        Self::with_connection(connection)
    }

    /// Open a throwaway index held in memory
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` if SQLite cannot be initialised.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self, StoreError> {
        connection.execute_batch(SCHEMA)?;
        Ok(Self { connection })
    }

    /// Start a unit of work; a no-op when one is already open
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn begin(&self) -> Result<(), StoreError> {
        if self.connection.is_autocommit() {
            self.connection.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Commit the open unit of work, if any
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn commit(&self) -> Result<(), StoreError> {
        if !self.connection.is_autocommit() {
            self.connection.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Discard the open unit of work, if any
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn rollback(&self) -> Result<(), StoreError> {
        if !self.connection.is_autocommit() {
            self.connection.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// Commit outstanding work and close the database
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` if the final commit or the close fails.
    pub fn close(self) -> Result<(), StoreError> {
        self.commit()?;
        self.connection.close().map_err(|(_, e)| e)?;
        debug!("Closed placement index");
        Ok(())
    }

    /// Arena key of a row
    #[must_use]
    pub fn row_key(row: &AgpRow) -> RowKey {
        RowKey {
            object: normalize_id(&row.object),
            part_number: row.part_number,
        }
    }

    /// Insert or replace a row in the arena
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on database or encoding failure.
    pub fn put_row(&self, row: &AgpRow) -> Result<(), StoreError> {
        let key = Self::row_key(row);
        let mut stored = row.clone();
        let resolved = row.is_resolved();
        let sequence = stored.sequence.take();
        self.connection.execute(
            "INSERT OR REPLACE INTO rows (object, part_number, data, sequence, resolved) VALUES (?1, ?2, ?3, ?4, ?5)",
            (&key.object, key.part_number, serde_json::to_string(&stored)?, sequence, resolved),
        )?;
        Ok(())
    }

    /// Whether any row of an object is stored
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn contains_object(&self, object: &str) -> Result<bool, StoreError> {
        let found = self
            .connection
            .query_row(
                "SELECT 1 FROM rows WHERE object = ?1 LIMIT 1",
                (normalize_id(object),),
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Number of component rows of an object still waiting for their sequence
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn unresolved_rows(&self, object: &str) -> Result<usize, StoreError> {
        let count: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM rows WHERE object = ?1 AND resolved = 0",
            (normalize_id(object),),
            |r| r.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    /// Drop every row of an object, returning how many were removed.
    /// Placement lists may still name the removed keys.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn remove_object(&self, object: &str) -> Result<usize, StoreError> {
        let removed = self
            .connection
            .execute("DELETE FROM rows WHERE object = ?1", (normalize_id(object),))?;
        Ok(removed)
    }

    /// Whether the arena already holds a row with this key
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn contains_row(&self, key: &RowKey) -> Result<bool, StoreError> {
        let found = self
            .connection
            .query_row(
                "SELECT 1 FROM rows WHERE object = ?1 AND part_number = ?2",
                (&key.object, key.part_number),
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn decode_row(data: &str, sequence: Option<Vec<u8>>) -> Result<AgpRow, StoreError> {
        let mut row: AgpRow = serde_json::from_str(data)?;
        row.sequence = sequence;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `StoreError` on database or decoding failure.
    pub fn row(&self, key: &RowKey) -> Result<Option<AgpRow>, StoreError> {
        let stored: Option<(String, Option<Vec<u8>>)> = self
            .connection
            .query_row(
                "SELECT data, sequence FROM rows WHERE object = ?1 AND part_number = ?2",
                (&key.object, key.part_number),
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        stored
            .map(|(data, sequence)| Self::decode_row(&data, sequence))
            .transpose()
    }

    /// All rows of an object in ascending part-number order
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on database or decoding failure.
    pub fn object_rows(&self, object: &str) -> Result<Vec<AgpRow>, StoreError> {
        let mut statement = self.connection.prepare_cached(
            "SELECT data, sequence FROM rows WHERE object = ?1 ORDER BY part_number",
        )?;
        let stored = statement
            .query_map((normalize_id(object),), |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, Option<Vec<u8>>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        stored
            .into_iter()
            .map(|(data, sequence)| Self::decode_row(&data, sequence))
            .collect()
    }

    /// Normalized names of every object with at least one row
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn object_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT DISTINCT object FROM rows ORDER BY object")?;
        let keys = statement
            .query_map((), |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Keys of every row placing `component`
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on database or decoding failure.
    pub fn placements(&self, component: &str) -> Result<Vec<RowKey>, StoreError> {
        let data: Option<Vec<u8>> = self
            .connection
            .query_row(
                "SELECT data FROM placements WHERE component = ?1",
                (normalize_id(component),),
                |r| r.get(0),
            )
            .optional()?;
        match data {
            Some(data) => Ok(bincode::deserialize(&data)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append a row key to a component's placement list
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on database or encoding failure.
    pub fn add_placement(&self, component: &str, key: &RowKey) -> Result<(), StoreError> {
        let mut keys = self.placements(component)?;
        if keys.contains(key) {
            return Ok(());
        }
        keys.push(key.clone());
        self.connection.execute(
            "INSERT OR REPLACE INTO placements (component, data) VALUES (?1, ?2)",
            (normalize_id(component), bincode::serialize(&keys)?),
        )?;
        Ok(())
    }

    /// Normalized names of every component with at least one placement
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn placed_components(&self) -> Result<Vec<String>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT component FROM placements ORDER BY component")?;
        let components = statement
            .query_map((), |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(components)
    }

    /// Store a resolved component sequence
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn put_component(&self, component: &str, sequence: &[u8]) -> Result<(), StoreError> {
        self.connection.execute(
            "INSERT OR REPLACE INTO components (component, sequence) VALUES (?1, ?2)",
            (normalize_id(component), sequence),
        )?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn component(&self, component: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let sequence = self
            .connection
            .query_row(
                "SELECT sequence FROM components WHERE component = ?1",
                (normalize_id(component),),
                |r| r.get(0),
            )
            .optional()?;
        Ok(sequence)
    }

    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` on database failure.
    pub fn stored_length(&self, component: &str) -> Result<Option<u64>, StoreError> {
        let length: Option<i64> = self
            .connection
            .query_row(
                "SELECT length(sequence) FROM components WHERE component = ?1",
                (normalize_id(component),),
                |r| r.get(0),
            )
            .optional()?;
        Ok(length.and_then(|l| u64::try_from(l).ok()))
    }

    /// # Errors
    ///
    /// Returns `StoreError` on database or encoding failure.
    pub fn put_sequence_info(&self, info: &AssemblySequenceInfo) -> Result<(), StoreError> {
        self.connection.execute(
            "INSERT OR REPLACE INTO sequence_info (object, data) VALUES (?1, ?2)",
            (normalize_id(&info.name), bincode::serialize(info)?),
        )?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StoreError` on database or decoding failure.
    pub fn sequence_info(&self, object: &str) -> Result<Option<AssemblySequenceInfo>, StoreError> {
        let data: Option<Vec<u8>> = self
            .connection
            .query_row(
                "SELECT data FROM sequence_info WHERE object = ?1",
                (normalize_id(object),),
                |r| r.get(0),
            )
            .optional()?;
        Ok(data.map(|d| bincode::deserialize(&d)).transpose()?)
    }

    /// Every registered sequence record, ordered by name
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on database or decoding failure.
    pub fn all_sequence_info(&self) -> Result<Vec<AssemblySequenceInfo>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT data FROM sequence_info ORDER BY object")?;
        let blobs = statement
            .query_map((), |r| r.get::<_, Vec<u8>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(blobs
            .iter()
            .map(|d| bincode::deserialize(d))
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl ComponentLengthLookup for PlacementIndex {
    fn component_length(&self, component_id: &str) -> Option<u64> {
        self.stored_length(component_id).ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agp::{AgpPart, ComponentPart};
    use tempfile::TempDir;

    fn row(object: &str, part_number: i64, component: &str) -> AgpRow {
        AgpRow {
            object: object.to_string(),
            object_begin: 1,
            object_end: 4,
            part_number,
            component_type: "W".to_string(),
            part: AgpPart::Component(ComponentPart {
                component_id: component.to_string(),
                component_begin: 1,
                component_end: 4,
                orientation: Some("+".to_string()),
            }),
            line: 1,
            sequence: None,
        }
    }

    #[test]
    fn test_rows_and_placements() {
        let index = PlacementIndex::open_in_memory().unwrap();
        let first = row("Scaff1", 1, "ctg1");
        let second = row("scaff2", 1, "CTG1");
        for r in [&first, &second] {
            index.put_row(r).unwrap();
            index
                .add_placement(r.component_id().unwrap(), &PlacementIndex::row_key(r))
                .unwrap();
        }
        index
            .add_placement("ctg1", &PlacementIndex::row_key(&first))
            .unwrap();

        let keys = index.placements("Ctg1").unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].object, "SCAFF1");
        assert_eq!(index.placed_components().unwrap(), vec!["CTG1"]);
        assert_eq!(index.object_keys().unwrap(), vec!["SCAFF1", "SCAFF2"]);
        assert_eq!(index.row(&keys[1]).unwrap().unwrap(), second);
    }

    #[test]
    fn test_row_sequence_is_kept() {
        let index = PlacementIndex::open_in_memory().unwrap();
        let mut r = row("s", 2, "c");
        index.put_row(&r).unwrap();
        r.sequence = Some(b"ACGT".to_vec());
        index.put_row(&r).unwrap();

        let rows = index.object_rows("S").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sequence.as_deref(), Some(&b"ACGT"[..]));
        assert!(index.contains_row(&PlacementIndex::row_key(&r)).unwrap());
    }

    #[test]
    fn test_unresolved_rows_and_removal() {
        let index = PlacementIndex::open_in_memory().unwrap();
        let mut first = row("s", 1, "c1");
        index.put_row(&first).unwrap();
        index.put_row(&row("s", 2, "c2")).unwrap();
        let mut gap = row("s", 3, "c3");
        gap.part = AgpPart::Gap(crate::core::agp::GapPart {
            gap_length: 4,
            gap_type: Some("scaffold".to_string()),
            linkage: Some("yes".to_string()),
            linkage_evidence: vec!["paired-ends".to_string()],
        });
        index.put_row(&gap).unwrap();
        assert_eq!(index.unresolved_rows("S").unwrap(), 2);
        assert!(index.contains_object("S").unwrap());

        first.sequence = Some(b"ACGT".to_vec());
        index.put_row(&first).unwrap();
        assert_eq!(index.unresolved_rows("s").unwrap(), 1);

        assert_eq!(index.remove_object("S").unwrap(), 3);
        assert!(index.object_rows("s").unwrap().is_empty());
        assert_eq!(index.unresolved_rows("s").unwrap(), 0);
        assert!(!index.contains_object("s").unwrap());
    }

    #[test]
    fn test_components_and_lengths() {
        let index = PlacementIndex::open_in_memory().unwrap();
        assert_eq!(index.component_length("ctg1"), None);
        index.put_component("ctg1", b"ACGTACGT").unwrap();
        assert_eq!(index.component_length("CTG1"), Some(8));
        assert_eq!(index.component("Ctg1").unwrap().as_deref(), Some(&b"ACGTACGT"[..]));
    }

    #[test]
    fn test_index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("index.db");

        let index = PlacementIndex::open(&path).unwrap();
        index.begin().unwrap();
        index.put_row(&row("s", 1, "c")).unwrap();
        index
            .put_sequence_info(&AssemblySequenceInfo {
                name: "s".to_string(),
                length: 4,
                level: AssemblyLevel::Scaffold,
                md5: "f1f8f4bf413b16ad135722aa4591043e".to_string(),
            })
            .unwrap();
        index.commit().unwrap();
        index.close().unwrap();

        let index = PlacementIndex::open(&path).unwrap();
        assert_eq!(index.object_rows("s").unwrap().len(), 1);
        let info = index.sequence_info("S").unwrap().unwrap();
        assert_eq!(info.level, AssemblyLevel::Scaffold);
        assert_eq!(index.all_sequence_info().unwrap().len(), 1);
    }

    #[test]
    fn test_rollback_discards_unit_of_work() {
        let index = PlacementIndex::open_in_memory().unwrap();
        index.begin().unwrap();
        index.put_component("c", b"AC").unwrap();
        index.rollback().unwrap();
        assert!(index.component("c").unwrap().is_none());
    }
}
