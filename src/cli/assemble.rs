use std::path::PathBuf;

use clap::Args;

use crate::cli::{print_outcome, OutputFormat, SubmissionArgs};
use crate::submission::pipeline::SubmissionOptions;

#[derive(Args)]
pub struct AssembleArgs {
    #[command(flatten)]
    pub submission: SubmissionArgs,

    /// Write the assembled objects to this FASTA file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Placement index database, kept after the run (in memory by default)
    #[arg(long, value_name = "PATH")]
    pub index: Option<PathBuf>,
}

/// Execute assemble subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, validation fails, or any
/// object cannot be assembled.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AssembleArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut submission = args.submission.to_submission()?;
    if let Some(index) = &args.index {
        submission.config_mut().index_path = Some(index.clone());
    }

    let options = SubmissionOptions {
        assemble: true,
        fasta_output: args.output.clone(),
    };
    let outcome = submission.run(&options)?;
    print_outcome(&outcome, format)?;

    let errors = outcome.report.error_count();
    if errors > 0 {
        anyhow::bail!("Assembly stopped after {errors} validation errors");
    }

    if verbose {
        for info in &outcome.sequences {
            eprintln!("{}\t{}\t{}\t{}", info.name, info.level, info.length, info.md5);
        }
    }
    match &args.output {
        Some(path) => eprintln!(
            "Assembled {} objects into {}",
            outcome.fasta_records,
            path.display()
        ),
        None => eprintln!("Assembled {} sequences", outcome.sequences.len()),
    }
    Ok(())
}
