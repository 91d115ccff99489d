//! Terminal output for migror
//!
//! Text (colored) or JSON on stdout; the JSON form is the full ledger, the
//! same document the report writer persists.

use colored::*;
use std::path::Path;

use migror_core::{Ledger, Severity};

use crate::process::FileOutcome;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Run-level counters, driving the final summary and the exit code
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub files_scanned: usize,
    pub files_eligible: usize,
    pub files_skipped: usize,
    pub files_past_deadline: usize,
    pub occurrences: usize,
    pub changes: usize,
    pub files_changed: usize,
    pub warnings: usize,
}

/// Accumulates per-file results and prints them as they arrive
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    summary: Summary,
}

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Blocker => "BLOCKER",
        Severity::Major => "MAJOR",
        Severity::Minor => "MINOR",
        Severity::Info => "INFO",
    }
}

fn colored_severity(severity: Severity) -> ColoredString {
    let label = severity_label(severity);
    match severity {
        Severity::Blocker => label.red().bold(),
        Severity::Major => label.yellow(),
        Severity::Minor => label.normal(),
        Severity::Info => label.blue(),
    }
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            summary: Summary::default(),
        }
    }

    /// A file no search pattern claimed
    pub fn report_ineligible(&mut self, path: &Path) {
        self.summary.files_scanned += 1;
        if self.verbose && self.format == OutputFormat::Text {
            println!("{}: not eligible", path.display());
        }
    }

    /// A file skipped because its content could not be decoded
    pub fn report_skipped(&mut self, path: &Path, reason: &str) {
        self.summary.files_scanned += 1;
        self.summary.files_skipped += 1;
        self.summary.warnings += 1;
        if self.format == OutputFormat::Text {
            eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), reason);
        }
    }

    /// A file the run deadline cut off
    pub fn report_past_deadline(&mut self, _path: &Path) {
        self.summary.files_scanned += 1;
        self.summary.files_past_deadline += 1;
    }

    /// A processed file's occurrences and changes
    pub fn report_outcome(&mut self, path: &Path, outcome: &FileOutcome) {
        self.summary.files_scanned += 1;
        self.summary.files_eligible += 1;
        self.summary.occurrences += outcome.occurrences.len();
        self.summary.changes += outcome.changes.len();
        if outcome.audit.changed {
            self.summary.files_changed += 1;
        }
        if let Some(warning) = &outcome.warning {
            self.summary.warnings += 1;
            if self.format == OutputFormat::Text {
                eprintln!("{}: {}", "Warning".yellow(), warning);
            }
        }

        if self.format != OutputFormat::Text || outcome.occurrences.is_empty() {
            return;
        }

        println!("{}", path.display().to_string().bold());
        for occ in &outcome.occurrences {
            println!(
                "  {}:{} [{}] {} - {}",
                occ.line,
                occ.column,
                colored_severity(occ.severity),
                occ.rule_id.green(),
                occ.description
            );
            if self.verbose && occ.new_line != occ.original_line {
                println!("  {}", format!("- {}", occ.original_line.trim_end()).red());
                println!("  {}", format!("+ {}", occ.new_line.trim_end()).green());
            }
        }
        println!();
    }

    /// Print the final summary (text) or the whole ledger (json)
    pub fn finish(self, ledger: &Ledger) {
        match self.format {
            OutputFormat::Text => {
                println!("{}", "Summary".bold().underline());
                println!("  Files scanned: {}", self.summary.files_scanned);
                println!("  Files eligible: {}", self.summary.files_eligible);
                println!("  Occurrences: {}", self.summary.occurrences);
                println!("  Changes: {}", self.summary.changes);
                println!("  Files changed: {}", self.summary.files_changed);
                if self.summary.files_skipped > 0 {
                    println!("  Files skipped: {}", self.summary.files_skipped);
                }
                if self.summary.files_past_deadline > 0 {
                    println!(
                        "  {} file(s) not reached before the deadline",
                        self.summary.files_past_deadline
                    );
                }
                if self.summary.warnings > 0 {
                    println!("  Warnings: {}", self.summary.warnings);
                }
                if ledger.dry_run && self.summary.changes > 0 {
                    println!();
                    println!("{}", "Dry-run: re-run with --apply to persist changes".yellow());
                }
            }
            OutputFormat::Json => match serde_json::to_string_pretty(ledger) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("{}: cannot serialize ledger: {e}", "Error".red()),
            },
        }
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}
