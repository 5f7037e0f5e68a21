//! Application orchestration.
//!
//! `run_app` wires the parsed CLI to the detection pipeline: it loads
//! records, builds the rule set, runs the detector, and writes results in
//! the requested format. Each subcommand maps to one `run_*` function so
//! `main` stays a thin shell around error reporting.

use std::io::Write;

use anyhow::Context;
use yansi::Paint;

use crate::cli::{Cli, Commands, DetectArgs, OutputFormat, RunArgs, ServeArgs};
use crate::config::JobsConfig;
use crate::detect::{Detection, DetectionSummary, DuplicateDetector, MasterRule, MatchingRule};
use crate::error::ExitCode;
use crate::loader;
use crate::logging::init_logging;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::web;

/// Run the application with parsed CLI arguments.
///
/// Returns the exit code the process should terminate with; `Err` means
/// the run failed outright and maps to [`ExitCode::GeneralError`].
///
/// # Errors
///
/// Any load, rule, detection, or output failure, with context attached.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    if cli.no_color {
        yansi::disable();
    }

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Run(args) => run_jobs(&args),
        Commands::Serve(args) => run_serve(&args),
    }
}

/// Detect duplicates in a single input file.
fn run_detect(args: &DetectArgs) -> anyhow::Result<ExitCode> {
    let records = loader::load_path(&args.input)?;

    let matching = MatchingRule::new(args.match_fields.iter().cloned())?;
    let master = MasterRule::new(args.master_field.clone(), args.strategy)?;
    let detector = DuplicateDetector::new(matching, master);

    let (detections, summary) = detector.detect_with_summary(records)?;
    let exit_code = exit_code_for(&detections);
    write_output(&detections, &summary, args.output, args.pretty, exit_code)?;
    Ok(exit_code)
}

/// Run every job from a config file, in declaration order.
///
/// The exit code reflects the run as a whole: success if any job found
/// duplicates, no-duplicates only when none did.
fn run_jobs(args: &RunArgs) -> anyhow::Result<ExitCode> {
    let config = JobsConfig::load(&args.config)?;

    let mut any_duplicates = false;
    for (index, job) in config.jobs.iter().enumerate() {
        let name = job.display_name();
        log::info!("job {}/{}: {name}", index + 1, config.jobs.len());

        let records = loader::load_path(&job.input)
            .with_context(|| format!("job '{name}'"))?;
        let matching = job.matching_rule()?;
        let master = job.master_rule(&config.defaults)?;
        let detector = DuplicateDetector::new(matching, master);

        let (detections, summary) = detector
            .detect_with_summary(records)
            .with_context(|| format!("job '{name}'"))?;

        let format = job.output(&config.defaults);
        if format == OutputFormat::Text {
            println!("{} {name}", "Job:".bold());
        }
        any_duplicates |= !detections.is_empty();
        write_output(
            &detections,
            &summary,
            format,
            false,
            exit_code_for(&detections),
        )?;
    }

    Ok(if any_duplicates {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    })
}

/// Start the upload web UI and block until shutdown.
fn run_serve(args: &ServeArgs) -> anyhow::Result<ExitCode> {
    web::serve(args.bind)?;
    Ok(ExitCode::Success)
}

/// Map a result set to the process exit code.
fn exit_code_for(detections: &[Detection]) -> ExitCode {
    if detections.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}

/// Write detections to stdout in the requested format.
fn write_output(
    detections: &[Detection],
    summary: &DetectionSummary,
    format: OutputFormat,
    pretty: bool,
    exit_code: ExitCode,
) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Text => TextOutput::new(detections)
            .with_summary(summary)
            .write_to(&mut handle)?,
        OutputFormat::Json => {
            JsonOutput::new(detections, summary, exit_code).write_to(&mut handle, pretty)?;
        }
        OutputFormat::Csv => CsvOutput::new(detections).write_to(&mut handle)?,
    }
    handle.flush()?;
    Ok(())
}
