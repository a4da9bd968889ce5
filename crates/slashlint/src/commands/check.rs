//! Check command — validate slash command files.
//!
//! Discovers markdown documents under a directory, validates each against
//! the rule catalogue on parallel workers, and prints a per-file breakdown
//! plus a run summary. The exit status is non-zero only when at least one
//! document is invalid; warnings alone never fail the run.

use anyhow::bail;
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use rayon::prelude::*;
use tracing::{debug, instrument};

use slashlint_core::Config;
use slashlint_core::lint::{self, Classification, FileReport};
use slashlint_core::report::RunSummary;
use slashlint_core::rules::{self, Context, Diagnostic, Severity};

use super::{discover_documents, read_input_file};

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory containing slash command files.
    #[arg(default_value = "commands")]
    pub dir: Utf8PathBuf,
}

/// Validate every discovered document and summarize the run.
#[instrument(name = "cmd_check", skip_all, fields(dir = %args.dir))]
pub fn cmd_check(
    args: CheckArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(dir = %args.dir, "executing check command");

    let files = discover_documents(&args.dir, &config.exclude_globs())?;
    if files.is_empty() {
        if !global_json {
            println!("{} no slash command files under {}", "SKIP:".dimmed(), args.dir);
        }
        return Ok(());
    }

    let rules = rules::catalogue();
    let ctx = Context::new(config);

    let progress = if global_json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64).with_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .expect("valid progress template"),
        )
    };

    // Fan out across files; the reduce is the single fan-in point and is
    // commutative, so worker scheduling never changes the summary.
    let summary = files
        .par_iter()
        .map(|path| {
            let report = validate_file(path, &rules, &ctx, max_input_bytes);
            progress.inc(1);
            report
        })
        .fold(RunSummary::default, |mut acc, report| {
            acc.add(report);
            acc
        })
        .reduce(RunSummary::default, |mut acc, other| {
            acc.merge(other);
            acc
        });
    progress.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if summary.has_failures() {
        bail!("{} of {} files invalid", summary.invalid, summary.total());
    }
    Ok(())
}

/// Validate one file, folding read failures into a generic failure report
/// so one bad file never aborts the rest of the run.
fn validate_file(
    path: &Utf8PathBuf,
    rules: &[rules::Rule],
    ctx: &Context,
    max_input_bytes: Option<usize>,
) -> FileReport {
    match read_input_file(path, max_input_bytes) {
        Ok(content) => lint::validate(path.as_str(), &content, rules, ctx),
        Err(e) => FileReport {
            file: path.to_string(),
            classification: Classification::Invalid,
            diagnostics: vec![Diagnostic::error("io", format!("{e:#}"))],
        },
    }
}

fn print_diagnostics(report: &FileReport) {
    for diag in &report.diagnostics {
        let label = match diag.severity {
            Severity::Error => "ERROR:".red().to_string(),
            Severity::Warning => "WARNING:".yellow().to_string(),
            _ => "INFO:".cyan().to_string(),
        };
        println!("    {label} {}", diag.message);
    }
}

fn print_summary(summary: &RunSummary) {
    let invalid: Vec<&FileReport> = summary
        .reports
        .iter()
        .filter(|r| r.classification == Classification::Invalid)
        .collect();
    let with_warnings: Vec<&FileReport> = summary
        .reports
        .iter()
        .filter(|r| r.classification == Classification::ValidWithWarnings)
        .collect();
    let fully_valid: Vec<&FileReport> = summary
        .reports
        .iter()
        .filter(|r| r.classification == Classification::FullyValid)
        .collect();

    if !invalid.is_empty() {
        println!("{}", "invalid files:".red().bold());
        for report in &invalid {
            println!("  {}", report.file.bold());
            print_diagnostics(report);
        }
        println!();
    }

    if !with_warnings.is_empty() {
        println!("{}", "valid with warnings:".yellow().bold());
        for report in &with_warnings {
            println!("  {}", report.file.bold());
            print_diagnostics(report);
        }
        println!();
    }

    if !fully_valid.is_empty() {
        println!("{} ({})", "fully valid:".green().bold(), fully_valid.len());
        for report in &fully_valid {
            println!("  {}", report.file);
            print_diagnostics(report);
        }
        println!();
    }

    println!(
        "{} {} checked, {} valid, {} with warnings, {} invalid",
        "summary:".bold(),
        summary.total(),
        summary.fully_valid,
        summary.valid_with_warnings,
        summary.invalid,
    );
}
