use clap::Args;

use crate::cli::{print_outcome, OutputFormat, SubmissionArgs};
use crate::submission::pipeline::SubmissionOptions;

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub submission: SubmissionArgs,
}

/// Execute validate subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, a submission-wide check fails,
/// or the report contains errors.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ValidateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let submission = args.submission.to_submission()?;
    if verbose {
        eprintln!(
            "Validating {} files as a {} submission",
            submission.files().len(),
            submission.config().assembly_type
        );
    }

    let outcome = submission.run(&SubmissionOptions::default())?;
    print_outcome(&outcome, format)?;

    let errors = outcome.report.error_count();
    if verbose || errors > 0 {
        eprintln!(
            "{} objects, {} bp, {errors} errors",
            outcome.objects, outcome.genome_size
        );
    }
    if errors > 0 {
        anyhow::bail!("Validation failed with {errors} errors");
    }
    Ok(())
}
