//! The audit/change ledger: everything a run reports
//!
//! Occurrences are created by the detector, mutated in place by exactly one
//! rewriter pass, and read-only afterwards. Changes and audits are never
//! mutated after creation.

use serde::Serialize;

use crate::rule::{Domain, Severity};

/// One detected pattern match in one file.
///
/// `id` is assigned at detection time (0-based within the file) and rebased
/// to a run-unique value when the file's results enter the ledger, so the
/// serialized identifier is a real handle even when two occurrences share
/// identical line text.
#[derive(Debug, Clone, Serialize)]
pub struct Occurrence {
    pub id: usize,
    pub file: String,
    pub rule_id: String,
    pub severity: Severity,
    pub description: String,
    pub domain: Domain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 1-based line of the match start
    pub line: usize,
    /// 1-based column of the match start
    pub column: usize,
    /// The entire source line containing the match
    pub original_line: String,
    /// The same line after conversion simulation; equals `original_line`
    /// until a rewriter has processed the file
    pub new_line: String,
    pub context_before: String,
    pub context_after: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Rule-level summary of a substitution actually applied to a file
#[derive(Debug, Clone, Serialize)]
pub struct Change {
    pub file: String,
    pub rule_id: String,
    pub severity: Severity,
    pub description: String,
    pub domain: Domain,
    /// Count of new-value occurrences in the converted content (number of
    /// removals for delete-on-match rules)
    pub occurrences: usize,
    pub old_value: String,
    pub new_value: String,
}

/// Per-file before/after content hash and changed flag; exactly one per
/// processed file
#[derive(Debug, Clone, Serialize)]
pub struct FileAudit {
    pub file: String,
    pub before_hash: String,
    pub after_hash: String,
    pub changed: bool,
}

/// Accumulated record of a whole run, handed to the report renderer
#[derive(Debug, Default, Serialize)]
pub struct Ledger {
    pub dry_run: bool,
    pub occurrences: Vec<Occurrence>,
    pub changes: Vec<Change>,
    pub audit: Vec<FileAudit>,
}

impl Ledger {
    pub fn new(dry_run: bool) -> Ledger {
        Ledger {
            dry_run,
            ..Default::default()
        }
    }

    /// Append one file's results, rebasing the per-file occurrence ids so
    /// they stay unique across the whole run
    pub fn absorb(
        &mut self,
        occurrences: Vec<Occurrence>,
        changes: Vec<Change>,
        audit: Option<FileAudit>,
    ) {
        let base = self.occurrences.len();
        self.occurrences.extend(occurrences.into_iter().map(|mut occ| {
            occ.id += base;
            occ
        }));
        self.changes.extend(changes);
        if let Some(audit) = audit {
            self.audit.push(audit);
        }
    }
}
