//! Pattern detection over whole-file content

use crate::ledger::Occurrence;
use crate::position::line_col;
use crate::rule::Rule;

/// Find every non-overlapping match of every rule in `content`.
///
/// Matching runs over the full content, not line by line, so dot-all and
/// multi-line patterns work. Output order is (rule order, match order within
/// rule) and is stable; reports depend on that. Content is never mutated
/// here: every occurrence starts with `new_line == original_line` and no
/// diff, to be filled in by a rewriter pass.
pub fn detect_in_content(content: &str, rules: &[Rule], file: &str) -> Vec<Occurrence> {
    let lines: Vec<&str> = content.lines().collect();
    let mut occurrences = Vec::new();

    for rule in rules {
        for m in rule.pattern.find_iter(content) {
            let (line, column, _) = line_col(content, m.start());

            // The occurrence records the entire source line, not just the
            // matched substring.
            let original_line = lines.get(line - 1).copied().unwrap_or("").to_string();
            let context_before = if line >= 2 {
                lines.get(line - 2).copied().unwrap_or("")
            } else {
                ""
            };
            let context_after = lines.get(line).copied().unwrap_or("");

            occurrences.push(Occurrence {
                id: occurrences.len(),
                file: file.to_string(),
                rule_id: rule.id.clone(),
                severity: rule.severity,
                description: rule.description.clone(),
                domain: rule.domain,
                category: rule.category.clone(),
                line,
                column,
                new_line: original_line.clone(),
                original_line,
                context_before: context_before.to_string(),
                context_after: context_after.to_string(),
                diff: None,
            });
        }
    }

    occurrences
}
