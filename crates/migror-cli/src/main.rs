//! migror CLI - rule-driven Oracle to PostgreSQL source-tree converter
//!
//! Reads a JSON rule configuration, walks the project tree, detects every
//! rule occurrence, and (in apply mode) rewrites files in place with a
//! backup of each original. Dry-run is the default: the same detection and
//! conversion simulation runs, the same reports are produced, nothing is
//! written to the tree.

mod backup;
mod output;
mod process;
mod report;
mod scan;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use migror_core::Ledger;
use migror_rules::{compile, RuleConfig};

use output::{OutputFormat, Reporter};
use process::{Processed, ProcessOptions};
use report::{write_html_report, write_json_report};
use scan::{collect_files, run_scan};

#[derive(Parser)]
#[command(name = "migror")]
#[command(version)]
#[command(about = "Rule-driven Oracle to PostgreSQL source-tree converter")]
struct Cli {
    /// Path to the JSON rule configuration
    #[arg(long, short = 'c')]
    config: PathBuf,

    /// Project root to scan (overrides RootDirectory from the configuration)
    #[arg(long, short = 'b')]
    base: Option<PathBuf>,

    /// Apply changes to the tree (default is dry-run / analysis only)
    #[arg(long)]
    apply: bool,

    /// Do not write backup copies before overwriting files
    #[arg(long)]
    no_backup: bool,

    /// Output format: text, json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: String,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path of the JSON report file (overrides the configuration)
    #[arg(long, value_name = "PATH")]
    report_json: Option<PathBuf>,

    /// Path of the HTML report file (overrides the configuration)
    #[arg(long, value_name = "PATH")]
    report_html: Option<PathBuf>,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::from_str(&cli.format).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json",
                cli.format
            )
        })?
    };

    let config = RuleConfig::load(&cli.config)?;
    let rules = compile(&config)?;

    let search_files = config
        .scan
        .search_files
        .iter()
        .map(|p| {
            glob::Pattern::new(p).with_context(|| format!("invalid search pattern `{p}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    // --apply forces a real run; otherwise the configuration decides.
    let dry_run = config.global.default_dry_run && !cli.apply;

    let root = cli
        .base
        .unwrap_or_else(|| PathBuf::from(&config.scan.root_directory));
    anyhow::ensure!(
        root.is_dir(),
        "base directory does not exist or is not a directory: {}",
        root.display()
    );

    let opts = ProcessOptions {
        search_files,
        backup_suffix: config.global.backup_extension.clone(),
        write_backups: !cli.no_backup,
        dry_run,
    };

    if cli.verbose && output_format == OutputFormat::Text {
        println!(
            "{}: {}",
            "Mode".bold(),
            if dry_run { "dry-run" } else { "apply" }
        );
        println!("{}: {}", "Root".bold(), root.display());
        println!();
    }

    let deadline = config
        .global
        .deadline_secs
        .map(|secs| (Instant::now(), Duration::from_secs(secs)));

    let files = collect_files(
        &root,
        &config.scan.excluded_directories,
        &config.scan.excluded_files,
    );
    let results = run_scan(&files, &rules, &opts, deadline);

    let mut ledger = Ledger::new(dry_run);
    let mut reporter = Reporter::new(output_format, cli.verbose);

    for (path, result) in results {
        match result {
            Processed::Ineligible => reporter.report_ineligible(&path),
            Processed::Skipped(reason) => reporter.report_skipped(&path, &reason),
            Processed::DeadlineExceeded => reporter.report_past_deadline(&path),
            Processed::Done(outcome) => {
                reporter.report_outcome(&path, &outcome);
                ledger.absorb(outcome.occurrences, outcome.changes, Some(outcome.audit));
            }
        }
    }

    let json_path = cli
        .report_json
        .unwrap_or_else(|| PathBuf::from(&config.global.report_json));
    let html_path = cli
        .report_html
        .unwrap_or_else(|| PathBuf::from(&config.global.report_html));
    write_json_report(&json_path, &ledger)?;
    write_html_report(&html_path, &ledger)?;

    let summary = reporter.summary();
    let exit_code = if summary.warnings > 0 {
        ExitCode::from(1)
    } else if dry_run && summary.changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(&ledger);

    Ok(exit_code)
}
