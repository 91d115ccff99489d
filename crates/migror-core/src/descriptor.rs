//! Structural rewriter for Maven-style dependency descriptors
//!
//! Blind text substitution is unsafe in a descriptor: several dependencies
//! may share an old artifact-id or version string, and a version must only
//! change inside the dependency block whose artifact was itself targeted.
//! This module edits the parsed tree instead and re-serializes it.

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::ledger::{Change, Occurrence};
use crate::rewrite::unified_line_diff;
use crate::rule::Rule;

/// Conventional build-descriptor file name
pub const DESCRIPTOR_FILE: &str = "pom.xml";

const ARTIFACT_RULE_PREFIX: &str = "pom_artifactid";
const VERSION_RULE_PREFIX: &str = "pom_version";

/// Whether a file name is recognized as a dependency descriptor
pub fn is_descriptor(file_name: &str) -> bool {
    file_name == DESCRIPTOR_FILE
}

fn is_artifact_rule(rule: &Rule) -> bool {
    rule.id.to_ascii_lowercase().starts_with(ARTIFACT_RULE_PREFIX)
}

fn is_version_rule(rule: &Rule) -> bool {
    rule.id.to_ascii_lowercase().starts_with(VERSION_RULE_PREFIX)
}

/// Whether a rule belongs to the structural path. The file processor keeps
/// these away from the generic rewriter on descriptor files, where a blind
/// global substitution would defeat the tree-aware targeting.
pub fn is_structural_rule(rule: &Rule) -> bool {
    is_artifact_rule(rule) || is_version_rule(rule)
}

/// Rewrite dependency blocks in a descriptor according to `rules`.
///
/// Parse failure never fails the run: the content comes back unmodified with
/// no Changes, and generic-rule processing for the same file proceeds
/// independently. Element lookups go by local name, so documents carrying
/// the default POM namespace resolve the same as plain ones. Re-serialized
/// output is indent-normalized.
pub fn rewrite_descriptor(
    content: &str,
    file: &str,
    occurrences: &mut [Occurrence],
    rules: &[Rule],
) -> (String, Vec<Change>) {
    let mut root = match Element::parse(content.as_bytes()) {
        Ok(root) => root,
        Err(_) => return (content.to_string(), Vec::new()),
    };

    let mut changes = Vec::new();
    walk(&mut root, file, rules, occurrences, &mut changes);

    if changes.is_empty() {
        return (content.to_string(), changes);
    }

    let mut out = Vec::new();
    let config = EmitterConfig::new().perform_indent(true);
    match root.write_with_config(&mut out, config) {
        Ok(()) => match String::from_utf8(out) {
            Ok(text) => (text, changes),
            Err(_) => (content.to_string(), Vec::new()),
        },
        Err(_) => (content.to_string(), Vec::new()),
    }
}

fn walk(
    elem: &mut Element,
    file: &str,
    rules: &[Rule],
    occurrences: &mut [Occurrence],
    changes: &mut Vec<Change>,
) {
    if elem.name == "dependency" {
        rewrite_dependency(elem, file, rules, occurrences, changes);
    }
    for child in elem.children.iter_mut() {
        if let XMLNode::Element(e) = child {
            walk(e, file, rules, occurrences, changes);
        }
    }
}

fn rewrite_dependency(
    dep: &mut Element,
    file: &str,
    rules: &[Rule],
    occurrences: &mut [Occurrence],
    changes: &mut Vec<Change>,
) {
    let artifact_text = child_text(dep, "artifactId");
    let version_text = child_text(dep, "version");

    // Was this dependency's artifact itself targeted? Decided against the
    // pre-edit artifact text; version rules hinge on it.
    let artifact_targeted = rules.iter().any(|r| {
        is_artifact_rule(r) && r.conversion().is_some_and(|c| c.old == artifact_text)
    });

    // Line of the artifact occurrence claimed for this dependency. Version
    // back-fill anchors on it, so when several dependencies share the old
    // version text the claim lands inside the dependency actually edited.
    let mut anchor: Option<usize> = None;

    for rule in rules.iter().filter(|r| is_artifact_rule(r)) {
        let Some(conv) = rule.conversion() else {
            continue;
        };
        if conv.old != artifact_text {
            continue;
        }
        if let Some(aid) = dep.get_mut_child("artifactId") {
            let claimed = apply_element_edit(aid, rule, file, None, occurrences, changes);
            anchor = anchor.or(claimed);
        }
    }

    for rule in rules.iter().filter(|r| is_version_rule(r)) {
        let Some(conv) = rule.conversion() else {
            continue;
        };
        // A version never changes in a dependency whose artifact was not
        // itself targeted, even when the old version string matches.
        if !artifact_targeted || conv.old != version_text {
            continue;
        }
        if let Some(ver) = dep.get_mut_child("version") {
            apply_element_edit(ver, rule, file, anchor, occurrences, changes);
        }
    }
}

fn apply_element_edit(
    elem: &mut Element,
    rule: &Rule,
    file: &str,
    anchor: Option<usize>,
    occurrences: &mut [Occurrence],
    changes: &mut Vec<Change>,
) -> Option<usize> {
    let conv = match rule.conversion() {
        Some(conv) => conv,
        None => return None,
    };

    set_text(elem, &conv.new);
    let after = serialize_element(elem);

    // Back-fill the occurrence this edit accounts for: same rule, line
    // carrying the old value, not yet claimed by an earlier edit. One edit
    // claims one occurrence even when several lines are textually equal;
    // with an anchor, the claim goes to the candidate nearest that line.
    let mut claimed_line = None;
    if let Some(occ) = claim_occurrence(occurrences, &rule.id, &conv.old, anchor) {
        occ.new_line = after.clone();
        occ.diff = Some(unified_line_diff(occ.original_line.trim(), &after));
        claimed_line = Some(occ.line);
    }

    changes.push(Change {
        file: file.to_string(),
        rule_id: rule.id.clone(),
        severity: rule.severity,
        description: rule.description.clone(),
        domain: rule.domain,
        occurrences: 1,
        old_value: conv.old.clone(),
        new_value: conv.new.clone(),
    });

    claimed_line
}

fn claim_occurrence<'a>(
    occurrences: &'a mut [Occurrence],
    rule_id: &str,
    old: &str,
    anchor: Option<usize>,
) -> Option<&'a mut Occurrence> {
    let mut candidates = occurrences
        .iter_mut()
        .filter(|o| o.rule_id == rule_id && o.diff.is_none() && o.original_line.contains(old));
    match anchor {
        Some(line) => candidates.min_by_key(|o| o.line.abs_diff(line)),
        None => candidates.next(),
    }
}

fn child_text(elem: &Element, name: &str) -> String {
    elem.get_child(name)
        .and_then(|c| c.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

fn set_text(elem: &mut Element, text: &str) {
    elem.children.retain(|c| !matches!(c, XMLNode::Text(_)));
    elem.children.push(XMLNode::Text(text.to_string()));
}

fn serialize_element(elem: &Element) -> String {
    let mut buf = Vec::new();
    let config = EmitterConfig::new().write_document_declaration(false);
    if elem.write_with_config(&mut buf, config).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_in_content;
    use crate::rule::{Conversion, Domain, PatternFlags, Severity};

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <dependencies>
    <dependency>
      <groupId>com.oracle.database.jdbc</groupId>
      <artifactId>ojdbc11</artifactId>
      <version>21.1</version>
    </dependency>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>unrelated</artifactId>
      <version>21.1</version>
    </dependency>
  </dependencies>
</project>
"#;

    fn pom_rule(id: &str, pattern: &str, old: &str, new: &str) -> Rule {
        Rule::compile(
            id,
            Domain::File,
            Severity::Blocker,
            "descriptor rule",
            pattern,
            PatternFlags::default(),
            Some(Conversion {
                old: old.to_string(),
                new: new.to_string(),
            }),
            None,
        )
        .unwrap()
    }

    #[test]
    fn rewrites_artifact_and_version_leaving_group_untouched() {
        let rules = [
            pom_rule("pom_artifactid_ojdbc", "ojdbc11", "ojdbc11", "postgresql"),
            pom_rule("pom_version_ojdbc", "21\\.1", "21.1", "42.7.3"),
        ];
        let mut occ = detect_in_content(POM, &rules, "pom.xml");

        let (new_content, changes) = rewrite_descriptor(POM, "pom.xml", &mut occ, &rules);

        assert!(new_content.contains("<artifactId>postgresql</artifactId>"));
        assert!(new_content.contains("<version>42.7.3</version>"));
        assert!(new_content.contains("<groupId>com.oracle.database.jdbc</groupId>"));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn version_never_changes_when_artifact_not_targeted() {
        // Both dependencies share the old version string; only the one whose
        // artifact matched a rule may have it rewritten.
        let rules = [
            pom_rule("pom_artifactid_ojdbc", "ojdbc11", "ojdbc11", "postgresql"),
            pom_rule("pom_version_ojdbc", "21\\.1", "21.1", "42.7.3"),
        ];
        let mut occ = detect_in_content(POM, &rules, "pom.xml");

        let (new_content, _) = rewrite_descriptor(POM, "pom.xml", &mut occ, &rules);

        assert!(new_content.contains("<artifactId>unrelated</artifactId>"));
        // The untargeted dependency keeps 21.1; the targeted one got 42.7.3.
        assert!(new_content.contains("<version>21.1</version>"));
        assert!(new_content.contains("<version>42.7.3</version>"));
    }

    #[test]
    fn version_backfill_follows_the_edited_dependency() {
        // The untargeted dependency sharing the old version string comes
        // first in the document. Its occurrence must stay untouched; the
        // conversion belongs to the occurrence inside the edited dependency.
        const SHARED_FIRST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <dependencies>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>unrelated</artifactId>
      <version>21.1</version>
    </dependency>
    <dependency>
      <groupId>com.oracle.database.jdbc</groupId>
      <artifactId>ojdbc11</artifactId>
      <version>21.1</version>
    </dependency>
  </dependencies>
</project>
"#;

        let rules = [
            pom_rule("pom_artifactid_ojdbc", "ojdbc11", "ojdbc11", "postgresql"),
            pom_rule("pom_version_ojdbc", "21\\.1", "21.1", "42.7.3"),
        ];
        let mut occ = detect_in_content(SHARED_FIRST, &rules, "pom.xml");

        rewrite_descriptor(SHARED_FIRST, "pom.xml", &mut occ, &rules);

        let versions: Vec<&Occurrence> = occ
            .iter()
            .filter(|o| o.rule_id == "pom_version_ojdbc")
            .collect();
        assert_eq!(versions.len(), 2);
        assert!(versions[0].line < versions[1].line);

        // First (untargeted dependency) untouched.
        assert!(versions[0].diff.is_none());
        assert_eq!(versions[0].new_line, versions[0].original_line);
        // Second (edited dependency) carries the conversion.
        assert!(versions[1].new_line.contains("42.7.3"));
        assert!(versions[1].diff.is_some());
    }

    #[test]
    fn occurrences_get_post_edit_element_and_diff() {
        let rules = [pom_rule(
            "pom_artifactid_ojdbc",
            "ojdbc11",
            "ojdbc11",
            "postgresql",
        )];
        let mut occ = detect_in_content(POM, &rules, "pom.xml");
        assert_eq!(occ.len(), 1);

        rewrite_descriptor(POM, "pom.xml", &mut occ, &rules);

        assert!(occ[0].new_line.contains("postgresql"));
        assert!(occ[0].diff.as_deref().unwrap().contains("+"));
    }

    #[test]
    fn malformed_descriptor_is_left_untouched() {
        let content = "<project><dependency><artifactId>ojdbc11";
        let rules = [pom_rule("pom_artifactid_ojdbc", "ojdbc11", "ojdbc11", "pg")];
        let mut occ = vec![];

        let (new_content, changes) = rewrite_descriptor(content, "pom.xml", &mut occ, &rules);
        assert_eq!(new_content, content);
        assert!(changes.is_empty());
    }

    #[test]
    fn descriptor_recognition() {
        assert!(is_descriptor("pom.xml"));
        assert!(!is_descriptor("pom.xml.bak"));
        assert!(!is_descriptor("build.gradle"));
    }
}
