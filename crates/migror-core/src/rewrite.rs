//! Generic text rewriter: global old -> new substitution plus per-occurrence
//! back-fill of the converted line and its diff

use similar::TextDiff;

use crate::ledger::{Change, Occurrence};
use crate::rule::Rule;

/// Unified diff between two line snippets (no file header)
pub fn unified_line_diff(old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .to_string()
        .trim_end()
        .to_string()
}

/// Apply every enabled conversion to `content`.
///
/// A rule whose old value is absent from the current content is skipped with
/// no Change. Otherwise the substitution is global, every occurrence owned by
/// the rule re-derives its `new_line` from its own original line, and one
/// Change records the count of new-value occurrences in the converted content
/// (the number of removals for delete-on-match rules).
///
/// Applying the same rule set to already-converted content is a no-op: no
/// old values remain, so no further Changes are emitted.
pub fn apply_conversions(
    content: &str,
    rules: &[Rule],
    file: &str,
    occurrences: &mut [Occurrence],
) -> (String, Vec<Change>) {
    let mut new_content = content.to_string();
    let mut changes = Vec::new();

    for rule in rules {
        let Some(conv) = rule.conversion() else {
            continue;
        };
        let (old, new) = (conv.old.as_str(), conv.new.as_str());

        if !new_content.contains(old) {
            continue;
        }

        let removed = new_content.matches(old).count();
        new_content = new_content.replace(old, new);

        for occ in occurrences.iter_mut().filter(|o| o.rule_id == rule.id) {
            // The occurrence line may not carry the old value even though
            // the file does (match text can differ per occurrence), so the
            // line-level result is re-derived, never assumed.
            if occ.original_line.contains(old) {
                occ.new_line = occ.original_line.replace(old, new);
                occ.diff = Some(unified_line_diff(&occ.original_line, &occ.new_line));
            }
        }

        let count = if new.is_empty() {
            removed
        } else {
            new_content.matches(new).count()
        };

        changes.push(Change {
            file: file.to_string(),
            rule_id: rule.id.clone(),
            severity: rule.severity,
            description: rule.description.clone(),
            domain: rule.domain,
            occurrences: count,
            old_value: old.to_string(),
            new_value: new.to_string(),
        });
    }

    (new_content, changes)
}
