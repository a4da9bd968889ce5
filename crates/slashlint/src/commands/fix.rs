//! Fix command — auto-repair fixable violations.
//!
//! Runs the fixer over every discovered document. Files with no applicable
//! fixes are left completely untouched; rewritten files go through a
//! temp-file-and-rename so a concurrent reader never observes a partial
//! write. `--dry-run` computes and reports the identical fix list without
//! writing anything.

use std::io::Write;

use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use slashlint_core::Config;
use slashlint_core::fix::fix_text;
use slashlint_core::report::FixSummary;
use slashlint_core::rules;

use super::{discover_documents, read_input_file};

/// Arguments for the `fix` subcommand.
#[derive(Args, Debug)]
pub struct FixArgs {
    /// Directory containing slash command files.
    #[arg(default_value = "commands")]
    pub dir: Utf8PathBuf,

    /// Report what would be fixed without writing changes.
    #[arg(long)]
    pub dry_run: bool,
}

/// Fix every discovered document and summarize what changed.
#[instrument(name = "cmd_fix", skip_all, fields(dir = %args.dir, dry_run = args.dry_run))]
pub fn cmd_fix(
    args: FixArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(dir = %args.dir, dry_run = args.dry_run, "executing fix command");

    let files = discover_documents(&args.dir, &config.exclude_globs())?;
    if files.is_empty() {
        if !global_json {
            println!("{} no slash command files under {}", "SKIP:".dimmed(), args.dir);
        }
        return Ok(());
    }

    let rules = rules::catalogue();
    let dry_run = args.dry_run;

    let summary = files
        .par_iter()
        .map(|path| fix_file(path, &rules, max_input_bytes, dry_run))
        .fold(FixSummary::default, |mut acc, entry| {
            acc.merge(entry);
            acc
        })
        .reduce(FixSummary::default, |mut acc, other| {
            acc.merge(other);
            acc
        });

    if global_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary, dry_run);
    Ok(())
}

/// Fix one file, returning a single-entry summary for the fan-in fold.
///
/// Read and write failures are folded into failure entries so one bad file
/// never aborts the rest of the run.
fn fix_file(
    path: &Utf8PathBuf,
    rules: &[rules::Rule],
    max_input_bytes: Option<usize>,
    dry_run: bool,
) -> FixSummary {
    let mut summary = FixSummary::default();

    let content = match read_input_file(path, max_input_bytes) {
        Ok(content) => content,
        Err(e) => {
            summary.add_failed(path.as_str(), format!("{e:#}"));
            return summary;
        }
    };

    match fix_text(path.as_str(), &content, rules) {
        Ok(outcome) if outcome.changed() => {
            if !dry_run
                && let Err(e) = write_atomic(path, &outcome.text)
            {
                summary.add_failed(path.as_str(), format!("{e:#}"));
                return summary;
            }
            summary.add_fixed(path.as_str(), outcome.records);
        }
        // Empty fix list: no write needed.
        Ok(_) => summary.add_clean(),
        Err(e) => summary.add_failed(path.as_str(), format!("could not parse frontmatter: {e}")),
    }
    summary
}

/// Replace `path` atomically: write a sibling temp file, then rename it
/// into place.
fn write_atomic(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or(Utf8Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir.as_std_path())
        .with_context(|| format!("failed to create temp file in {dir}"))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("failed to write {path}"))?;
    tmp.persist(path.as_std_path())
        .with_context(|| format!("failed to replace {path}"))?;
    Ok(())
}

fn print_summary(summary: &FixSummary, dry_run: bool) {
    for entry in &summary.entries {
        println!("{}", entry.file.bold());
        match &entry.error {
            Some(error) => println!("    {} {error}", "FAILED:".red()),
            None => {
                for record in &entry.records {
                    let marker = if dry_run {
                        "[dry-run]".dimmed().to_string()
                    } else {
                        "fixed:".green().to_string()
                    };
                    println!("    {marker} {}", record.description);
                }
            }
        }
    }
    if !summary.entries.is_empty() {
        println!();
    }

    println!(
        "{} {} checked, {} fixed, {} failed",
        "summary:".bold(),
        summary.checked,
        summary.fixed,
        summary.failed,
    );
    if dry_run && summary.fixed > 0 {
        println!("run without --dry-run to apply these fixes");
    }
}
