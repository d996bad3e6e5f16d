use std::collections::{BTreeSet, HashMap, VecDeque};
use std::io::Write;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::lookup::ComponentSequenceSource;
use crate::catalog::store::{AssemblySequenceInfo, PlacementIndex, StoreError};
use crate::core::agp::{AgpPart, AgpRow, RowKey};
use crate::core::types::AssemblyLevel;
use crate::parsing::fasta::write_sequence;
use crate::parsing::ParseError;
use crate::utils::validation::{normalize_id, reverse_complement, sequence_md5};

/// Default base used to fill gap rows
pub const DEFAULT_FILLER: u8 = b'N';

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Missing sequence for component '{component}' placed in object '{object}'")]
    MissingComponent { component: String, object: String },

    #[error("Component '{component}' was resolved without a sequence")]
    NullPayload { component: String },

    #[error(
        "Component range {begin}..{end} of '{component}' placed in '{object}' is outside its length {length}"
    )]
    ComponentRange {
        component: String,
        object: String,
        begin: i64,
        end: i64,
        length: usize,
    },

    #[error("Assembled length {actual} of object '{object}' does not match its last object end {expected}")]
    LengthMismatch {
        object: String,
        expected: i64,
        actual: usize,
    },

    #[error("Object '{object}' is defined more than once")]
    ObjectRedefined { object: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A component row whose range does not fit the sequence that arrived for
/// its component. The row stays unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRejection {
    pub row: RowKey,
    pub line: usize,
    pub object: String,
    pub component: String,
    pub begin: i64,
    pub end: i64,
    pub length: usize,
}

impl std::fmt::Display for RangeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Component range {}..{} of '{}' placed in '{}' is outside its length {}",
            self.begin, self.end, self.component, self.object, self.length
        )
    }
}

/// Level-agnostic assembler over a [`PlacementIndex`].
///
/// Rows and component sequences may arrive in either order. Whenever a
/// component resolves, every row placing it receives its sub-sequence.
/// Objects are only assembled once [`Assembler::seal`] declares that no
/// more rows will arrive, so one object may be split over several AGP
/// files. After sealing, an object whose rows are all resolved is
/// assembled and registered as a component itself, which resolves the
/// rows placing it one level up.
pub struct Assembler {
    index: PlacementIndex,
    filler: u8,
    /// Level assigned by the caller, keyed by normalized object name
    levels: HashMap<String, AssemblyLevel>,
    sealed: bool,
    rejections: Vec<RangeRejection>,
}

impl Assembler {
    pub fn new(index: PlacementIndex) -> Self {
        Self {
            index,
            filler: DEFAULT_FILLER,
            levels: HashMap::new(),
            sealed: false,
            rejections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filler(mut self, filler: u8) -> Self {
        self.filler = filler;
        self
    }

    /// Fix the level recorded for an object instead of deriving it from
    /// its components. A record already registered under this name is
    /// rewritten.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::Store` on database failure.
    pub fn set_level(&mut self, object: &str, level: AssemblyLevel) -> Result<(), AssemblyError> {
        let key = normalize_id(object);
        if let Some(mut info) = self.index.sequence_info(&key)? {
            if info.level != level {
                info.level = level;
                self.index.put_sequence_info(&info)?;
            }
        }
        self.levels.insert(key, level);
        Ok(())
    }

    pub fn index(&self) -> &PlacementIndex {
        &self.index
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Rows left unresolved because their range fell outside their component,
    /// in the order they were found. Draining clears the list.
    pub fn take_rejections(&mut self) -> Vec<RangeRejection> {
        std::mem::take(&mut self.rejections)
    }

    /// Commit and close the underlying index
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::Store` if the index cannot be closed cleanly.
    pub fn close(self) -> Result<(), AssemblyError> {
        self.index.close()?;
        Ok(())
    }

    /// Run `work` as one unit of work, rolled back if it fails
    fn unit<T>(
        &mut self,
        work: impl FnOnce(&mut Self) -> Result<T, AssemblyError>,
    ) -> Result<T, AssemblyError> {
        let rejected = self.rejections.len();
        self.index.begin()?;
        match work(self) {
            Ok(value) => {
                self.index.commit()?;
                Ok(value)
            }
            Err(e) => {
                self.index.rollback()?;
                self.rejections.truncate(rejected);
                Err(e)
            }
        }
    }

    /// Add rows to the index. Rows whose component is already known are
    /// resolved at once. Before [`Assembler::seal`] no object is assembled;
    /// afterwards any object that becomes complete is.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::ObjectRedefined` if a row is added to an object
    /// that is already assembled, or any error raised while assembling.
    pub fn ingest_rows(
        &mut self,
        rows: &[AgpRow],
    ) -> Result<Vec<AssemblySequenceInfo>, AssemblyError> {
        self.unit(|this| {
            let mut touched = BTreeSet::new();
            for row in rows {
                let key = PlacementIndex::row_key(row);
                if this.index.sequence_info(&key.object)?.is_some() {
                    return Err(AssemblyError::ObjectRedefined {
                        object: row.object.clone(),
                    });
                }
                let mut row = row.clone();
                if let Some(component) = row.component_id().map(String::from) {
                    this.index.add_placement(&component, &key)?;
                    if let Some(sequence) = this.index.component(&component)? {
                        this.resolve(&mut row, &sequence);
                    }
                }
                this.index.put_row(&row)?;
                touched.insert(key.object);
            }

            let mut ready = VecDeque::new();
            if this.sealed {
                for object in touched {
                    if let Some(info) = this.try_assemble(&object)? {
                        ready.push_back(info);
                    }
                }
            }
            debug!(rows = rows.len(), assembled = ready.len(), "Ingested AGP rows");
            this.propagate(ready)
        })
    }

    /// Drop every row of an object that will never be assembled
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::ObjectRedefined` if the object is already
    /// assembled, or `AssemblyError::Store` on database failure.
    pub fn discard_object(&mut self, object: &str) -> Result<usize, AssemblyError> {
        if self.index.sequence_info(object)?.is_some() {
            return Err(AssemblyError::ObjectRedefined {
                object: object.to_string(),
            });
        }
        let removed = self.unit(|this| Ok(this.index.remove_object(object)?))?;
        debug!(object, rows = removed, "Discarded object rows");
        Ok(removed)
    }

    /// Declare that every row has arrived: assemble each complete object and
    /// propagate the results upward.
    ///
    /// # Errors
    ///
    /// Returns any error raised while assembling.
    pub fn seal(&mut self) -> Result<Vec<AssemblySequenceInfo>, AssemblyError> {
        self.sealed = true;
        let assembled = self.unit(|this| {
            let mut ready = VecDeque::new();
            for object in this.index.object_keys()? {
                if let Some(info) = this.try_assemble(&object)? {
                    ready.push_back(info);
                }
            }
            this.propagate(ready)
        })?;
        debug!(assembled = assembled.len(), "Sealed placement index");
        Ok(assembled)
    }

    /// Register the sequence of a component and propagate it upward.
    ///
    /// A `None` payload is fatal when the component is placed by some row,
    /// and ignored otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::NullPayload`, `AssemblyError::ObjectRedefined`
    /// if the name is an AGP object, or any error raised while assembling.
    pub fn add_component(
        &mut self,
        component: &str,
        sequence: Option<&[u8]>,
    ) -> Result<Vec<AssemblySequenceInfo>, AssemblyError> {
        let Some(sequence) = sequence else {
            if self.index.placements(component)?.is_empty() {
                return Ok(Vec::new());
            }
            return Err(AssemblyError::NullPayload {
                component: component.to_string(),
            });
        };

        self.unit(|this| {
            let key = normalize_id(component);
            if this.index.contains_object(&key)? || this.index.component(&key)?.is_some() {
                return Err(AssemblyError::ObjectRedefined {
                    object: component.to_string(),
                });
            }
            this.index.put_component(&key, sequence)?;
            this.index.put_sequence_info(&AssemblySequenceInfo {
                name: component.to_string(),
                length: sequence.len() as u64,
                level: this
                    .levels
                    .get(&key)
                    .copied()
                    .unwrap_or(AssemblyLevel::Contig),
                md5: sequence_md5(sequence),
            })?;

            let assembled = this.attach(&key, sequence)?;
            this.propagate(assembled.into())
        })
    }

    /// Add every placed but unresolved component `source` can supply
    ///
    /// # Errors
    ///
    /// Returns any error raised while assembling.
    pub fn resolve_from(
        &mut self,
        source: &dyn ComponentSequenceSource,
    ) -> Result<Vec<AssemblySequenceInfo>, AssemblyError> {
        let mut assembled = Vec::new();
        for component in self.index.placed_components()? {
            if self.index.component(&component)?.is_some() {
                continue;
            }
            if let Some(sequence) = source.component_sequence(&component) {
                assembled.extend(self.add_component(&component, Some(sequence))?);
            }
        }
        Ok(assembled)
    }

    /// Resolve every row placing `component`, returning the objects that became complete
    fn attach(
        &mut self,
        component: &str,
        sequence: &[u8],
    ) -> Result<Vec<AssemblySequenceInfo>, AssemblyError> {
        let mut touched = BTreeSet::new();
        for key in self.index.placements(component)? {
            let Some(mut row) = self.index.row(&key)? else {
                continue;
            };
            if row.sequence.is_some() || !self.resolve(&mut row, sequence) {
                continue;
            }
            self.index.put_row(&row)?;
            touched.insert(key.object);
        }

        let mut assembled = Vec::new();
        if self.sealed {
            for object in touched {
                if let Some(info) = self.try_assemble(&object)? {
                    assembled.push(info);
                }
            }
        }
        Ok(assembled)
    }

    /// Feed freshly assembled objects back in as components until nothing changes
    fn propagate(
        &mut self,
        mut queue: VecDeque<AssemblySequenceInfo>,
    ) -> Result<Vec<AssemblySequenceInfo>, AssemblyError> {
        let mut done = Vec::new();
        while let Some(info) = queue.pop_front() {
            let key = normalize_id(&info.name);
            if let Some(sequence) = self.index.component(&key)? {
                queue.extend(self.attach(&key, &sequence)?);
            }
            done.push(info);
        }
        Ok(done)
    }

    /// Give a component row its bytes, or record why it cannot have them
    fn resolve(&mut self, row: &mut AgpRow, sequence: &[u8]) -> bool {
        if let Some(bytes) = extract(row, sequence) {
            row.sequence = Some(bytes);
            return true;
        }
        if let AgpPart::Component(component) = &row.part {
            let rejection = RangeRejection {
                row: PlacementIndex::row_key(row),
                line: row.line,
                object: row.object.clone(),
                component: component.component_id.clone(),
                begin: component.component_begin,
                end: component.component_end,
                length: sequence.len(),
            };
            warn!(%rejection, "Component row left unresolved");
            self.rejections.push(rejection);
        }
        false
    }

    /// Assemble an object if all of its rows are resolved and it is not
    /// assembled yet
    fn try_assemble(
        &mut self,
        object: &str,
    ) -> Result<Option<AssemblySequenceInfo>, AssemblyError> {
        if self.index.sequence_info(object)?.is_some() || self.index.unresolved_rows(object)? > 0 {
            return Ok(None);
        }
        let rows = self.index.object_rows(object)?;
        let Some(last) = rows.last() else {
            return Ok(None);
        };

        let name = last.object.clone();
        let expected = last.object_end;
        let mut sequence = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
        let mut component_level = AssemblyLevel::Contig;
        for row in &rows {
            match &row.part {
                AgpPart::Gap(gap) => {
                    let length = usize::try_from(gap.gap_length).unwrap_or(0);
                    sequence.resize(sequence.len() + length, self.filler);
                }
                AgpPart::Component(component) => {
                    if let Some(info) = self.index.sequence_info(&component.component_id)? {
                        component_level = component_level.max(info.level);
                    }
                    sequence.extend_from_slice(row.sequence.as_deref().unwrap_or_default());
                }
            }
        }

        if i64::try_from(sequence.len()).ok() != Some(expected) {
            return Err(AssemblyError::LengthMismatch {
                object: name,
                expected,
                actual: sequence.len(),
            });
        }

        let level = self.levels.get(object).copied().unwrap_or(match component_level {
            AssemblyLevel::Contig => AssemblyLevel::Scaffold,
            _ => AssemblyLevel::Chromosome,
        });
        let info = AssemblySequenceInfo {
            name,
            length: sequence.len() as u64,
            level,
            md5: sequence_md5(&sequence),
        };
        self.index.put_component(object, &sequence)?;
        self.index.put_sequence_info(&info)?;
        info!(object = %info.name, length = info.length, level = %info.level, "Assembled object");
        Ok(Some(info))
    }

    /// Assembled bytes of an object or stored component
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::Store` on database failure.
    pub fn sequence(&self, name: &str) -> Result<Option<Vec<u8>>, AssemblyError> {
        Ok(self.index.component(name)?)
    }

    /// Seal if not done yet, then check that every object was assembled,
    /// returning every registered sequence record.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::MissingComponent` naming the first unresolved
    /// component and the object waiting for it, or
    /// `AssemblyError::ComponentRange` when that component arrived but is too
    /// short for the row.
    pub fn finish(&mut self) -> Result<Vec<AssemblySequenceInfo>, AssemblyError> {
        if !self.sealed {
            self.seal()?;
        }
        for object in self.index.object_keys()? {
            if self.index.sequence_info(&object)?.is_some() {
                continue;
            }
            let rows = self.index.object_rows(&object)?;
            let Some(row) = rows.iter().find(|r| !r.is_resolved()) else {
                continue;
            };
            let Some(component) = row.component() else {
                continue;
            };
            return Err(match self.index.stored_length(&component.component_id)? {
                Some(length) => AssemblyError::ComponentRange {
                    component: component.component_id.clone(),
                    object: row.object.clone(),
                    begin: component.component_begin,
                    end: component.component_end,
                    length: usize::try_from(length).unwrap_or(usize::MAX),
                },
                None => AssemblyError::MissingComponent {
                    component: component.component_id.clone(),
                    object: row.object.clone(),
                },
            });
        }
        Ok(self.index.all_sequence_info()?)
    }

    /// Write every AGP object's assembled sequence as FASTA, in name order,
    /// returning the number of records written
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::Parse` if writing fails.
    pub fn write_fasta<W: Write>(&self, mut writer: W) -> Result<usize, AssemblyError> {
        let mut written = 0;
        for object in self.index.object_keys()? {
            let (Some(info), Some(sequence)) = (
                self.index.sequence_info(&object)?,
                self.index.component(&object)?,
            ) else {
                continue;
            };
            write_sequence(&mut writer, &info.name, &sequence)?;
            written += 1;
        }
        Ok(written)
    }
}

/// Bytes a component row places: its 1-based inclusive range, reverse
/// complemented for minus orientation. `None` when the range does not fit.
fn extract(row: &AgpRow, sequence: &[u8]) -> Option<Vec<u8>> {
    let AgpPart::Component(component) = &row.part else {
        return Some(Vec::new());
    };
    let begin = usize::try_from(component.component_begin.checked_sub(1)?).ok()?;
    let end = usize::try_from(component.component_end).ok()?;
    let slice = sequence.get(begin..end)?;

    Some(match row.orientation() {
        Some(orientation) if orientation.is_reverse() => reverse_complement(slice),
        _ => slice.to_vec(),
    })
}
