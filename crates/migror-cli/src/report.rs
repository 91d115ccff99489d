//! Report files written at the end of a run, dry-run included
//!
//! The JSON report is the serialized ledger; the HTML report renders the
//! occurrence, change, and audit tables with occurrences sorted by
//! (severity, file, line).

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use migror_core::{Domain, Ledger, Occurrence};

use crate::output::severity_label;

fn domain_label(domain: Domain) -> &'static str {
    match domain {
        Domain::File => "FILE",
        Domain::Sql => "SQL",
        Domain::Plsql => "PLSQL",
        Domain::Java => "JAVA",
    }
}

/// Write the ledger as pretty-printed JSON
pub fn write_json_report(path: &Path, ledger: &Ledger) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Write the HTML report
pub fn write_html_report(path: &Path, ledger: &Ledger) -> Result<()> {
    fs::write(path, render_html(ledger))
        .with_context(|| format!("failed to write {}", path.display()))
}

fn sorted_occurrences(ledger: &Ledger) -> Vec<&Occurrence> {
    let mut occurrences: Vec<&Occurrence> = ledger.occurrences.iter().collect();
    occurrences.sort_by(|a, b| {
        (a.severity, &a.file, a.line).cmp(&(b.severity, &b.file, b.line))
    });
    occurrences
}

fn render_html(ledger: &Ledger) -> String {
    let mut html = String::new();

    html.push_str(
        "<!DOCTYPE html><html><head><meta charset='utf-8'>\
         <title>Migration Report</title>\
         <style>\
         body { font-family: Arial, sans-serif; font-size: 14px; }\
         table { border-collapse: collapse; width: 100%; margin-bottom: 20px; }\
         th, td { border: 1px solid #ccc; padding: 4px 8px; vertical-align: top; }\
         th { background: #f0f0f0; }\
         pre { margin: 0; white-space: pre-wrap; }\
         .BLOCKER { background-color: #ffcccc; }\
         .MAJOR { background-color: #ffe0b3; }\
         .MINOR { background-color: #ffffcc; }\
         .INFO { background-color: #e6f7ff; }\
         </style></head><body>",
    );

    html.push_str("<h1>Migration report</h1>");
    let mode = if ledger.dry_run {
        "DRY-RUN (analysis only, nothing was written)"
    } else {
        "APPLY (changes were persisted)"
    };
    let _ = write!(html, "<p>Mode: {mode}</p>");

    let _ = write!(
        html,
        "<h2>Summary</h2><ul>\
         <li>Occurrences detected: {}</li>\
         <li>Changes: {}</li>\
         <li>Files audited: {}</li>\
         </ul>",
        ledger.occurrences.len(),
        ledger.changes.len(),
        ledger.audit.len()
    );

    html.push_str(
        "<h2>Occurrences</h2><table>\
         <tr><th>Severity</th><th>Rule</th><th>File</th><th>Line</th>\
         <th>Original</th><th>Converted</th><th>Context</th><th>Diff</th></tr>",
    );
    for occ in sorted_occurrences(ledger) {
        let severity = severity_label(occ.severity);
        let diff = occ
            .diff
            .as_deref()
            .map(|d| format!("<pre>{}</pre>", escape(d)))
            .unwrap_or_default();
        let _ = write!(
            html,
            "<tr class='{severity}'><td>{severity}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><pre>{}</pre></td><td><pre>{}</pre></td>\
             <td><pre>{}\n&gt;&gt;&gt; {}\n{}</pre></td><td>{diff}</td></tr>",
            escape(&occ.rule_id),
            escape(&occ.file),
            occ.line,
            escape(&occ.original_line),
            escape(&occ.new_line),
            escape(&occ.context_before),
            escape(&occ.original_line),
            escape(&occ.context_after),
        );
    }
    html.push_str("</table>");

    html.push_str(
        "<h2>Changes</h2><table>\
         <tr><th>Severity</th><th>Rule</th><th>File</th><th>Domain</th>\
         <th>Occurrences</th><th>Old</th><th>New</th></tr>",
    );
    for change in &ledger.changes {
        let severity = severity_label(change.severity);
        let _ = write!(
            html,
            "<tr class='{severity}'><td>{severity}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td><pre>{}</pre></td><td><pre>{}</pre></td></tr>",
            escape(&change.rule_id),
            escape(&change.file),
            domain_label(change.domain),
            change.occurrences,
            escape(&change.old_value),
            escape(&change.new_value),
        );
    }
    html.push_str("</table>");

    html.push_str(
        "<h2>File audit</h2><table>\
         <tr><th>File</th><th>Changed</th><th>Hash before</th><th>Hash after</th></tr>",
    );
    for audit in &ledger.audit {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td><code>{}</code></td><td><code>{}</code></td></tr>",
            escape(&audit.file),
            if audit.changed { "yes" } else { "no" },
            audit.before_hash,
            audit.after_hash,
        );
    }
    html.push_str("</table></body></html>");

    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use migror_core::{Domain, FileAudit, Severity};
    use tempfile::TempDir;

    fn occurrence(file: &str, line: usize, severity: Severity) -> Occurrence {
        Occurrence {
            id: 0,
            file: file.to_string(),
            rule_id: "r".to_string(),
            severity,
            description: String::new(),
            domain: Domain::Sql,
            category: None,
            line,
            column: 1,
            original_line: "SELECT <x>".to_string(),
            new_line: "SELECT <x>".to_string(),
            context_before: String::new(),
            context_after: String::new(),
            diff: None,
        }
    }

    #[test]
    fn occurrences_sort_by_severity_then_file_then_line() {
        let mut ledger = Ledger::new(true);
        ledger.occurrences = vec![
            occurrence("b.sql", 1, Severity::Info),
            occurrence("a.sql", 9, Severity::Blocker),
            occurrence("a.sql", 2, Severity::Blocker),
        ];

        let sorted = sorted_occurrences(&ledger);
        let keys: Vec<(Severity, &str, usize)> = sorted
            .iter()
            .map(|o| (o.severity, o.file.as_str(), o.line))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Severity::Blocker, "a.sql", 2),
                (Severity::Blocker, "a.sql", 9),
                (Severity::Info, "b.sql", 1),
            ]
        );
    }

    #[test]
    fn html_escapes_markup() {
        assert_eq!(escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn reports_are_written() {
        let temp = TempDir::new().unwrap();
        let mut ledger = Ledger::new(false);
        ledger.occurrences.push(occurrence("a.sql", 1, Severity::Major));
        ledger.audit.push(FileAudit {
            file: "a.sql".to_string(),
            before_hash: "0011".to_string(),
            after_hash: "2233".to_string(),
            changed: true,
        });

        let json_path = temp.path().join("report.json");
        let html_path = temp.path().join("report.html");
        write_json_report(&json_path, &ledger).unwrap();
        write_html_report(&html_path, &ledger).unwrap();

        let json = fs::read_to_string(&json_path).unwrap();
        assert!(json.contains("\"dry_run\": false"));
        assert!(json.contains("\"a.sql\""));

        let html = fs::read_to_string(&html_path).unwrap();
        assert!(html.contains("APPLY"));
        assert!(html.contains("SELECT &lt;x&gt;"));
        assert!(html.contains("<code>0011</code>"));
    }
}
