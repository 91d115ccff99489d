//! Per-file processing: rule selection, detection, rewriting, persistence
//!
//! Detection and both rewriters run unconditionally, dry-run included, so
//! that reported occurrences, changes, and simulated hashes are
//! byte-identical between a dry-run and an apply run. Only the final
//! backup-and-overwrite step is gated.

use std::fs;
use std::path::Path;

use migror_core::{
    apply_conversions, content_hash, detect_in_content, is_descriptor, is_structural_rule,
    rewrite_descriptor, Change, FileAudit, Occurrence, Rule,
};
use migror_rules::CompiledRules;

use crate::backup::write_backup;

/// Knobs shared by every file of a run
pub struct ProcessOptions {
    /// Glob patterns gating eligibility; a file matching none of them
    /// produces no occurrence, change, or audit at all
    pub search_files: Vec<glob::Pattern>,
    pub backup_suffix: String,
    pub write_backups: bool,
    pub dry_run: bool,
}

/// Everything one processed file contributes to the ledger
pub struct FileOutcome {
    pub occurrences: Vec<Occurrence>,
    pub changes: Vec<Change>,
    pub audit: FileAudit,
    /// Persistence failure surfaced to the operator; when set, the audit
    /// reports `changed = false`
    pub warning: Option<String>,
}

/// Result of visiting one file
pub enum Processed {
    /// No search pattern matched: not this run's business
    Ineligible,
    /// Content could not be decoded as text; the file is skipped and the
    /// run continues
    Skipped(String),
    /// Deadline ran out before this file was reached
    DeadlineExceeded,
    Done(Box<FileOutcome>),
}

/// Process one file against the compiled rule set
pub fn process_file(path: &Path, rules: &CompiledRules, opts: &ProcessOptions) -> Processed {
    let file_label = path.display().to_string();
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Processed::Ineligible,
    };

    if !matches_search_pattern(&file_label, file_name, &opts.search_files) {
        return Processed::Ineligible;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return Processed::Skipped(format!("cannot decode as text: {e}")),
    };
    let before_hash = content_hash(&content);

    let rules_to_apply = rules.rules_for(file_name);
    let mut occurrences = detect_in_content(&content, &rules_to_apply, &file_label);

    // Structural pass first (descriptor files only), then the generic pass
    // over the remaining rules. Structural rules are withheld from the
    // generic pass so the tree-aware targeting cannot be undone by a blind
    // global substitution.
    let mut changes: Vec<Change> = Vec::new();
    let new_content;
    if is_descriptor(file_name) {
        let (rewritten, structural_changes) =
            rewrite_descriptor(&content, &file_label, &mut occurrences, &rules_to_apply);
        changes.extend(structural_changes);

        let generic_rules: Vec<Rule> = rules_to_apply
            .iter()
            .filter(|r| !is_structural_rule(r))
            .cloned()
            .collect();
        let (converted, generic_changes) =
            apply_conversions(&rewritten, &generic_rules, &file_label, &mut occurrences);
        changes.extend(generic_changes);
        new_content = converted;
    } else {
        let (converted, generic_changes) =
            apply_conversions(&content, &rules_to_apply, &file_label, &mut occurrences);
        changes.extend(generic_changes);
        new_content = converted;
    }

    let changed = new_content != content;
    let after_hash = if changed {
        content_hash(&new_content)
    } else {
        before_hash.clone()
    };

    let mut audit = FileAudit {
        file: file_label.clone(),
        before_hash: before_hash.clone(),
        after_hash,
        changed,
    };

    let mut warning = None;
    if !opts.dry_run && changed {
        if let Err(e) = persist(path, &content, &new_content, opts) {
            // The file on disk is (treated as) untouched; the audit must
            // not claim otherwise.
            warning = Some(format!("{file_label}: {e}"));
            audit.changed = false;
            audit.after_hash = before_hash;
        }
    }

    Processed::Done(Box::new(FileOutcome {
        occurrences,
        changes,
        audit,
        warning,
    }))
}

fn persist(
    path: &Path,
    original: &str,
    converted: &str,
    opts: &ProcessOptions,
) -> anyhow::Result<()> {
    use anyhow::Context;

    if opts.write_backups {
        write_backup(path, original, &opts.backup_suffix)
            .with_context(|| "failed to write backup".to_string())?;
    }
    fs::write(path, converted).with_context(|| "failed to overwrite file".to_string())?;
    Ok(())
}

/// Pattern gating: a pattern matches on the bare file name or, for
/// multi-component patterns, on the trailing path components, so `*.sql`
/// and `src/main/*.sql` both work wherever the tree is rooted
fn matches_search_pattern(path: &str, file_name: &str, patterns: &[glob::Pattern]) -> bool {
    patterns.iter().any(|p| {
        if p.matches(file_name) {
            return true;
        }
        let components = p.as_str().split('/').count();
        p.matches(trailing_components(path, components))
    })
}

/// The last `n` '/'-separated components of `path` (the whole path when it
/// has fewer)
fn trailing_components(path: &str, n: usize) -> &str {
    let mut separators = path.rmatch_indices('/').map(|(i, _)| i);
    match separators.nth(n.saturating_sub(1)) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}
