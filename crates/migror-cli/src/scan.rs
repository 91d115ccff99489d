//! Directory walking and run orchestration
//!
//! Files are independent of each other, so processing is parallel at file
//! granularity; results are sorted by path before they reach the ledger so
//! every run reports in the same order.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use migror_rules::CompiledRules;

use crate::process::{process_file, Processed, ProcessOptions};

/// Collect the candidate files under `root`, pruning excluded directories
/// and skipping excluded file names. The list comes back sorted.
pub fn collect_files(
    root: &Path,
    excluded_dirs: &[String],
    excluded_files: &[String],
) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !excluded_dirs.iter().any(|d| d == name.as_ref())
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            !excluded_files.iter().any(|f| f == name.as_ref())
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Process every collected file, in parallel, honoring an optional overall
/// deadline; files reached after the deadline are not processed.
pub fn run_scan(
    files: &[PathBuf],
    rules: &CompiledRules,
    opts: &ProcessOptions,
    deadline: Option<(Instant, std::time::Duration)>,
) -> Vec<(PathBuf, Processed)> {
    let mut results: Vec<(PathBuf, Processed)> = files
        .par_iter()
        .map(|path| {
            let result = match deadline {
                Some((started, budget)) if started.elapsed() >= budget => {
                    Processed::DeadlineExceeded
                }
                _ => process_file(path, rules, opts),
            };
            (path.clone(), result)
        })
        .collect();

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}
