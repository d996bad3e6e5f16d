//! Command-line interface for agp-assembler.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **validate**: Parse and validate the files of a submission
//! - **assemble**: Validate, then build every object sequence from its AGP rows
//!
//! ## Usage
//!
//! ```text
//! # Validate an AGP file against its contigs
//! agp-assembler validate --agp scaffolds.agp --fasta contigs.fa
//!
//! # Chromosome-level submission, JSON report
//! agp-assembler validate --agp chr.agp --chromosome-list chromosomes.txt --format json
//!
//! # Assemble and write the objects as FASTA
//! agp-assembler assemble --agp scaffolds.agp --fasta contigs.fa -o assembled.fa
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::core::types::{AssemblyType, FileType};
use crate::parsing::fasta::is_fasta_file;
use crate::submission::config::SubmissionConfig;
use crate::submission::pipeline::{Submission, SubmissionOutcome};

pub mod assemble;
pub mod validate;

#[derive(Parser)]
#[command(name = "agp-assembler")]
#[command(version)]
#[command(about = "Validate AGP files and assemble object sequences from their components")]
#[command(
    long_about = "agp-assembler checks a genome assembly submission: chromosome and unlocalized lists, AGP files, and the FASTA or EMBL flat files carrying component sequences.\n\nIt reports every row-level problem with its file and line, and can build each scaffold and chromosome sequence by placing its components level by level."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and validate a submission
    Validate(validate::ValidateArgs),

    /// Validate a submission and assemble its objects
    Assemble(assemble::AssembleArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Input files and settings shared by every subcommand
#[derive(Args, Debug)]
pub struct SubmissionArgs {
    /// Input files, typed by extension (.agp, FASTA, .embl/.dat flat files)
    pub inputs: Vec<PathBuf>,

    /// AGP file (repeatable)
    #[arg(long = "agp", value_name = "PATH")]
    pub agp: Vec<PathBuf>,

    /// FASTA file of component sequences (repeatable, may be gzipped)
    #[arg(long = "fasta", value_name = "PATH")]
    pub fasta: Vec<PathBuf>,

    /// EMBL flat file (repeatable, may be gzipped)
    #[arg(long = "flatfile", value_name = "PATH")]
    pub flatfile: Vec<PathBuf>,

    /// Chromosome list
    #[arg(long, value_name = "PATH")]
    pub chromosome_list: Option<PathBuf>,

    /// Unlocalized sequence list
    #[arg(long, value_name = "PATH")]
    pub unlocalized_list: Option<PathBuf>,

    /// JSON config file (dialect, filler base, genome size ceilings)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Assembly type, overriding the config
    #[arg(long, value_parser = parse_assembly_type)]
    pub assembly_type: Option<AssemblyType>,
}

/// Guess a file type from its extension, looking through .gz/.bgz
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn detect_file_type(path: &Path) -> Option<FileType> {
    if is_fasta_file(path) {
        return Some(FileType::Fasta);
    }
    let name = path.to_string_lossy().to_lowercase();
    let name = name
        .strip_suffix(".gz")
        .or_else(|| name.strip_suffix(".bgz"))
        .unwrap_or(&name);
    if name.ends_with(".agp") {
        Some(FileType::Agp)
    } else if name.ends_with(".embl") || name.ends_with(".dat") || name.ends_with(".ff") {
        Some(FileType::FlatFile)
    } else {
        None
    }
}

fn parse_assembly_type(s: &str) -> Result<AssemblyType, String> {
    AssemblyType::parse(s).ok_or_else(|| format!("Unknown assembly type: {s}"))
}

impl SubmissionArgs {
    /// Load the config and collect the files into a submission
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or no input file was given.
    pub fn to_submission(&self) -> anyhow::Result<Submission> {
        let mut config = match &self.config {
            Some(path) => SubmissionConfig::load(path)?,
            None => SubmissionConfig::default(),
        };
        if let Some(assembly_type) = self.assembly_type {
            config.assembly_type = assembly_type;
        }
        self.collect_files(Submission::new(config))
    }

    fn collect_files(&self, mut submission: Submission) -> anyhow::Result<Submission> {
        if let Some(path) = &self.chromosome_list {
            submission.add_file(path, FileType::ChromosomeList);
        }
        if let Some(path) = &self.unlocalized_list {
            submission.add_file(path, FileType::UnlocalizedList);
        }
        for path in &self.inputs {
            let file_type = detect_file_type(path).ok_or_else(|| {
                anyhow::anyhow!(
                    "Cannot tell the type of '{}'; use --agp, --fasta or --flatfile",
                    path.display()
                )
            })?;
            submission.add_file(path, file_type);
        }
        for path in &self.agp {
            submission.add_file(path, FileType::Agp);
        }
        for path in &self.fasta {
            submission.add_file(path, FileType::Fasta);
        }
        for path in &self.flatfile {
            submission.add_file(path, FileType::FlatFile);
        }
        if submission.files().is_empty() {
            anyhow::bail!("No input files given; use --agp, --fasta or --flatfile");
        }
        Ok(submission)
    }
}

/// Print a finished pass: the full outcome as JSON, otherwise one line per message
pub(crate) fn print_outcome(outcome: &SubmissionOutcome, format: OutputFormat) -> anyhow::Result<()> {
    let report = &outcome.report;
    match format {
        OutputFormat::Text => {
            for message in &report.messages {
                println!(
                    "{}\t{}\t{}: {}",
                    message.severity, message.origin, message.code, message.message
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        OutputFormat::Tsv => {
            println!("severity\tfile\tline\tcode\tmessage");
            for message in &report.messages {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    message.severity,
                    message.origin.file.as_deref().unwrap_or(""),
                    message.origin.line.map(|l| l.to_string()).unwrap_or_default(),
                    message.code,
                    message.message
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_file_type() {
        assert_eq!(detect_file_type(Path::new("ctgs.fa.gz")), Some(FileType::Fasta));
        assert_eq!(detect_file_type(Path::new("chr.AGP")), Some(FileType::Agp));
        assert_eq!(detect_file_type(Path::new("entries.embl.gz")), Some(FileType::FlatFile));
        assert_eq!(detect_file_type(Path::new("chromosomes.txt")), None);
    }
}
