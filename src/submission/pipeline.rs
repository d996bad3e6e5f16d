use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assembly::engine::Assembler;
use crate::catalog::lookup::ComponentLengthLookup;
use crate::catalog::store::{AssemblySequenceInfo, PlacementIndex};
use crate::core::agp::AgpRow;
use crate::core::message::{codes, MessageSink, ValidationReport};
use crate::core::record::Record;
use crate::core::types::{AssemblyType, FileType, Origin};
use crate::parsing::agp::{AgpParser, AgpValidator};
use crate::parsing::fasta::{for_each_component, FastaComponent};
use crate::parsing::flatfile::FlatFileReader;
use crate::parsing::lists::{parse_chromosome_list, parse_unlocalized_list};
use crate::parsing::{open_input, source_name, ParseError};
use crate::submission::config::SubmissionConfig;
use crate::submission::state::SubmissionState;
use crate::submission::SubmissionError;
use crate::utils::validation::normalize_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFile {
    pub path: PathBuf,
    pub file_type: FileType,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionOptions {
    /// Build object sequences, not only validate
    pub assemble: bool,
    /// Write every assembled object here as FASTA
    pub fasta_output: Option<PathBuf>,
}

/// Result of a pass that did not hit a fatal error
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub assembly_type: AssemblyType,
    pub files: usize,
    pub objects: usize,
    pub genome_size: u64,
    pub report: ValidationReport,
    /// Registered sequences, empty unless assembling
    pub sequences: Vec<AssemblySequenceInfo>,
    pub unplaced: Vec<String>,
    /// `false` when validation errors left some objects unassembled
    pub complete: bool,
    pub fasta_records: usize,
}

/// The files of one submission and the settings to process them with
#[derive(Debug, Clone, Default)]
pub struct Submission {
    config: SubmissionConfig,
    files: Vec<SubmissionFile>,
}

impl Submission {
    pub fn new(config: SubmissionConfig) -> Self {
        Self {
            config,
            files: Vec::new(),
        }
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SubmissionConfig {
        &mut self.config
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, file_type: FileType) {
        self.files.push(SubmissionFile {
            path: path.into(),
            file_type,
        });
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, file_type: FileType) -> Self {
        self.add_file(path, file_type);
        self
    }

    pub fn files(&self) -> &[SubmissionFile] {
        &self.files
    }

    /// Process every file once, in processing order.
    ///
    /// The placement index is always closed before returning, also when the
    /// pass fails.
    ///
    /// # Errors
    ///
    /// Returns a `SubmissionError` for input that cannot be read or for any
    /// submission-wide failure: duplicate names, unresolved components or a
    /// genome over the size ceiling.
    pub fn run(&self, options: &SubmissionOptions) -> Result<SubmissionOutcome, SubmissionError> {
        self.config.validate()?;

        let mut files = self.files.clone();
        files.sort_by_key(|f| f.file_type.processing_rank());

        let assembler = if options.assemble {
            let index = match &self.config.index_path {
                Some(path) => PlacementIndex::open(path)?,
                None => PlacementIndex::open_in_memory()?,
            };
            Some(Assembler::new(index).with_filler(self.config.filler_byte()))
        } else {
            None
        };

        let mut pass = Pass::new(&self.config, assembler);
        let result = pass.process(&files, options);
        let assembler = pass.assembler.take();

        match result {
            Ok(outcome) => {
                if let Some(assembler) = assembler {
                    assembler.close()?;
                }
                info!(
                    files = outcome.files,
                    objects = outcome.objects,
                    errors = outcome.report.error_count(),
                    "Submission processed"
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Some(assembler) = assembler {
                    if let Err(close_error) = assembler.close() {
                        warn!(error = %close_error, "Failed to close placement index");
                    }
                }
                Err(e)
            }
        }
    }
}

/// Mutable context of one running pass
struct Pass<'c> {
    config: &'c SubmissionConfig,
    state: SubmissionState,
    report: ValidationReport,
    validator: AgpValidator,
    assembler: Option<Assembler>,
    /// Component lengths for range checks when no index is open
    lengths: HashMap<String, u64>,
    /// Objects with row errors, kept out of the index
    rejected: BTreeSet<String>,
    /// Objects with rows handed to the assembler in this pass
    ingested: BTreeSet<String>,
    /// Per object, the first part number each AGP source contributed
    row_sources: HashMap<String, Vec<(i64, String)>>,
}

impl<'c> Pass<'c> {
    fn new(config: &'c SubmissionConfig, assembler: Option<Assembler>) -> Self {
        Self {
            config,
            state: SubmissionState::new(),
            report: ValidationReport::new(),
            validator: AgpValidator::new(),
            assembler,
            lengths: HashMap::new(),
            rejected: BTreeSet::new(),
            ingested: BTreeSet::new(),
            row_sources: HashMap::new(),
        }
    }

    fn ceiling(&self) -> Option<(AssemblyType, u64)> {
        self.config
            .genome_size_ceiling()
            .map(|ceiling| (self.config.assembly_type, ceiling))
    }

    fn process(
        &mut self,
        files: &[SubmissionFile],
        options: &SubmissionOptions,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        for file in files {
            debug!(path = %file.path.display(), file_type = ?file.file_type, "Processing file");
            match file.file_type {
                FileType::ChromosomeList => self.read_chromosome_list(&file.path)?,
                FileType::UnlocalizedList => self.read_unlocalized_list(&file.path)?,
                FileType::Agp => self.read_agp(&file.path)?,
                FileType::Fasta => self.read_fasta(&file.path)?,
                FileType::FlatFile => self.read_flatfile(&file.path)?,
            }
        }
        self.state.check_duplicates()?;
        let ceiling = self.ceiling();
        self.state.tally_genome_size(ceiling)?;
        self.seal()?;

        let complete = !self.report.has_errors();
        let mut sequences = Vec::new();
        let mut fasta_records = 0;
        if let Some(assembler) = self.assembler.as_mut() {
            sequences = if complete {
                assembler.finish()?
            } else {
                debug!("Skipping missing component check after validation errors");
                assembler.index().all_sequence_info()?
            };
            if let Some(path) = &options.fasta_output {
                let mut writer = BufWriter::new(File::create(path).map_err(ParseError::from)?);
                fasta_records = assembler.write_fasta(&mut writer)?;
                writer.flush().map_err(ParseError::from)?;
                info!(path = %path.display(), records = fasta_records, "Wrote assembled sequences");
            }
        }

        Ok(SubmissionOutcome {
            assembly_type: self.config.assembly_type,
            files: files.len(),
            objects: self.state.object_count(),
            genome_size: self.state.genome_size(),
            report: std::mem::take(&mut self.report),
            sequences,
            unplaced: self.state.unplaced(),
            complete,
            fasta_records,
        })
    }

    /// Every file is read: drop the rejected objects, assemble the rest and
    /// fix the level of sequences no AGP row places
    fn seal(&mut self) -> Result<(), SubmissionError> {
        let Some(assembler) = self.assembler.as_mut() else {
            return Ok(());
        };
        for object in self.rejected.intersection(&self.ingested) {
            assembler.discard_object(object)?;
        }
        let assembled = assembler.seal()?;
        for name in self.state.loose_sequences() {
            assembler.set_level(&name, self.state.level_of(&name))?;
        }
        debug!(assembled = assembled.len(), "Assembled submission objects");
        self.record_rejections();
        Ok(())
    }

    /// Report component rows the assembler could not resolve
    fn record_rejections(&mut self) {
        let Some(assembler) = self.assembler.as_mut() else {
            return;
        };
        for rejection in assembler.take_rejections() {
            let file = self
                .row_sources
                .get(&rejection.row.object)
                .and_then(|sources| {
                    sources
                        .iter()
                        .rev()
                        .find(|(first, _)| *first <= rejection.row.part_number)
                })
                .map(|(_, source)| source.clone());
            let origin = Origin {
                file,
                line: Some(rejection.line),
            };
            self.report
                .error(codes::AGP_COMPONENT_RANGE, rejection.to_string(), origin);
        }
    }

    fn read_chromosome_list(&mut self, path: &Path) -> Result<(), SubmissionError> {
        let source = source_name(path);
        let entries = parse_chromosome_list(open_input(path)?, &source, &mut self.report)?;
        debug!(source = %source, entries = entries.len(), "Read chromosome list");
        self.state.add_chromosomes(entries);
        Ok(())
    }

    fn read_unlocalized_list(&mut self, path: &Path) -> Result<(), SubmissionError> {
        let source = source_name(path);
        let entries = parse_unlocalized_list(open_input(path)?, &source, &mut self.report)?;
        debug!(source = %source, entries = entries.len(), "Read unlocalized list");
        self.state.add_unlocalized(entries);
        self.state.check_lists(&source, &mut self.report);
        Ok(())
    }

    fn read_agp(&mut self, path: &Path) -> Result<(), SubmissionError> {
        let source = source_name(path);
        let rows = AgpParser::new(source.as_str()).parse_reader(open_input(path)?, &mut self.report)?;
        self.add_rows(&source, rows)
    }

    /// Validate rows of one file, record them and hand the valid objects to the assembler
    fn add_rows(&mut self, source: &str, rows: Vec<AgpRow>) -> Result<(), SubmissionError> {
        self.validator.begin_file(source);
        for row in &rows {
            let lengths: &dyn ComponentLengthLookup = match &self.assembler {
                Some(assembler) => assembler.index(),
                None => &self.lengths,
            };
            if self.validator.validate(row, lengths, &mut self.report) > 0 {
                self.rejected.insert(normalize_id(&row.object));
            }
            if self.state.record_agp_row(&row.object, row.object_end)
                && !self.state.register_name(&row.object, Origin::new(source, row.line))
            {
                self.rejected.insert(normalize_id(&row.object));
            }
            if let Some(component) = row.component_id() {
                self.state.record_agp_component(component);
            }
        }
        self.validator.finish_file();

        let Some(assembler) = self.assembler.as_mut() else {
            return Ok(());
        };
        let accepted: Vec<AgpRow> = rows
            .into_iter()
            .filter(|row| !self.rejected.contains(&normalize_id(&row.object)))
            .collect();
        for row in &accepted {
            let key = normalize_id(&row.object);
            let sources = self.row_sources.entry(key.clone()).or_default();
            if sources.last().map_or(true, |(_, last)| last != source) {
                sources.push((row.part_number, source.to_string()));
            }
            if let Some(level) = self.state.listed_level(&row.object) {
                assembler.set_level(&row.object, level)?;
            }
            self.ingested.insert(key);
        }
        assembler.ingest_rows(&accepted)?;
        debug!(source, rows = accepted.len(), "Ingested AGP rows");
        self.record_rejections();
        Ok(())
    }

    /// Register one component sequence and pass it to the assembler
    fn add_sequence(
        &mut self,
        name: &str,
        origin: Origin,
        bases: &[u8],
    ) -> Result<(), SubmissionError> {
        if !self.state.register_name(name, origin) {
            return Ok(());
        }
        let length = bases.len() as u64;
        self.state.add_sequence(name, length);

        let Some(assembler) = self.assembler.as_mut() else {
            self.lengths.insert(normalize_id(name), length);
            return Ok(());
        };
        // Placement is only known once the AGP files are read
        if let Some(level) = self.state.listed_level(name) {
            assembler.set_level(name, level)?;
        }
        let payload = (!bases.is_empty()).then_some(bases);
        assembler.add_component(name, payload)?;
        self.record_rejections();
        Ok(())
    }

    fn read_fasta(&mut self, path: &Path) -> Result<(), SubmissionError> {
        let source = source_name(path);
        let count = for_each_component(open_input(path)?, |component: FastaComponent| {
            self.add_sequence(&component.name, Origin::file(source.as_str()), &component.sequence)
        })?;
        debug!(source = %source, records = count, "Read FASTA file");
        Ok(())
    }

    fn read_flatfile(&mut self, path: &Path) -> Result<(), SubmissionError> {
        let source = source_name(path);
        let dialect = self.config.dialect.clone();
        let mut reader = FlatFileReader::new(open_input(path)?, &dialect, source.as_str());
        let mut records = 0usize;
        while let Some(record) = reader.next_record(&mut self.report)? {
            records += 1;
            self.add_record(&source, record)?;
        }
        debug!(source = %source, records, "Read flat file");
        Ok(())
    }

    fn add_record(&mut self, source: &str, record: Record) -> Result<(), SubmissionError> {
        let Some(name) = record.object_name().map(String::from) else {
            self.report.error(
                codes::FLATFILE_INVALID_BLOCK,
                "Record has neither a submitter identifier nor an accession".to_string(),
                record.origin.clone(),
            );
            return Ok(());
        };

        if record.is_assembly_object() {
            return self.add_rows(source, record.agp_rows);
        }

        self.add_sequence(&name, record.origin.clone(), &record.sequence.bases)
    }
}
