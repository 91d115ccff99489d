//! Compiles raw rule definitions into the per-domain rule sets
//!
//! Compilation is total and side-effect-free, and fails the whole run on the
//! first invalid pattern (a malformed rule must never silently disable the
//! rest of its collection).

use std::collections::BTreeMap;

use migror_core::{Conversion, Domain, PatternFlags, Rule, Severity};

use crate::schema::{RawRule, RuleConfig};
use crate::ConfigError;

/// Every compiled rule of a run, grouped the way file selection needs them
#[derive(Debug, Default)]
pub struct CompiledRules {
    /// Keyed by exact file name or by bare extension
    pub file_specific: BTreeMap<String, Vec<Rule>>,
    pub sql: Vec<Rule>,
    pub plsql: Vec<Rule>,
    pub java: Vec<Rule>,
}

/// Compile all four collections of a configuration document
pub fn compile(config: &RuleConfig) -> Result<CompiledRules, ConfigError> {
    let mut compiled = CompiledRules::default();

    for (key, raw_rules) in &config.file_specific_rules {
        let rules = raw_rules
            .iter()
            .map(|r| compile_rule(r, Domain::File))
            .collect::<Result<Vec<_>, _>>()?;
        compiled.file_specific.insert(key.clone(), rules);
    }

    for raw in &config.sql_rules {
        compiled.sql.push(compile_rule(raw, Domain::Sql)?);
    }
    for raw in &config.plsql_rules {
        compiled.plsql.push(compile_rule(raw, Domain::Plsql)?);
    }
    for raw in &config.java_type_rules {
        compiled.java.push(compile_rule(raw, Domain::Java)?);
    }

    Ok(compiled)
}

fn compile_rule(raw: &RawRule, domain: Domain) -> Result<Rule, ConfigError> {
    // SQL and PL/SQL fragments regularly span lines; those domains match
    // dot-all unless the rule says otherwise.
    let dot_all_default = matches!(domain, Domain::Sql | Domain::Plsql);

    let flags = PatternFlags {
        case_insensitive: raw.detect.case_insensitive.unwrap_or(false),
        multi_line: raw.detect.multi_line.unwrap_or(false),
        dot_all: raw.detect.dot_all.unwrap_or(dot_all_default),
    };

    let conversion = if raw.convert.enabled {
        Some(Conversion {
            old: raw.convert.old.clone().unwrap_or_default(),
            new: raw.convert.new.clone().unwrap_or_default(),
        })
    } else {
        None
    };

    let severity = raw
        .severity
        .as_deref()
        .map(Severity::parse)
        .unwrap_or(Severity::Info);

    Rule::compile(
        raw.id.clone(),
        domain,
        severity,
        raw.description.clone(),
        &raw.detect.regexp,
        flags,
        conversion,
        raw.category.clone(),
    )
    .map_err(ConfigError::from)
}

impl CompiledRules {
    /// The ordered rule set applicable to a file, by the documented
    /// precedence: exact-name rules, then extension-keyed rules, then domain
    /// rules inferred from the suffix. Earlier rules detect and rewrite
    /// first, which is how overlapping rules resolve.
    ///
    /// Rules are cheap to clone (the compiled regex is shared internally).
    pub fn rules_for(&self, file_name: &str) -> Vec<Rule> {
        let mut rules: Vec<Rule> = Vec::new();

        if let Some(by_name) = self.file_specific.get(file_name) {
            rules.extend(by_name.iter().cloned());
        }

        if let Some((stem, ext)) = file_name.rsplit_once('.') {
            if !stem.is_empty() {
                if let Some(by_ext) = self.file_specific.get(ext) {
                    rules.extend(by_ext.iter().cloned());
                }
            }
        }

        if file_name.ends_with(".java") {
            rules.extend(self.java.iter().cloned());
        } else if file_name.ends_with(".sql") {
            rules.extend(self.sql.iter().cloned());
            rules.extend(self.plsql.iter().cloned());
        }

        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> RuleConfig {
        RuleConfig::parse(json).unwrap()
    }

    #[test]
    fn compiles_all_collections() {
        let compiled = compile(&config(
            r#"{
  "FileSpecificRules": {
    "pom.xml": [{ "ID": "pom_artifactid_x", "Detect": { "Regexp": "x" } }],
    "properties": [{ "ID": "props_url", "Detect": { "Regexp": "jdbc:oracle" } }]
  },
  "SQLRules": [{ "ID": "s1", "Detect": { "Regexp": "SYSDATE" } }],
  "PLSQLRules": [{ "ID": "p1", "Detect": { "Regexp": "NVL" } }],
  "JavaTypeRules": [{ "ID": "j1", "Detect": { "Regexp": "OracleTypes" } }]
}"#,
        ))
        .unwrap();

        assert_eq!(compiled.file_specific.len(), 2);
        assert_eq!(compiled.sql.len(), 1);
        assert_eq!(compiled.plsql.len(), 1);
        assert_eq!(compiled.java.len(), 1);
        assert_eq!(compiled.sql[0].domain, Domain::Sql);
        assert_eq!(compiled.sql[0].severity, Severity::Info);
    }

    #[test]
    fn invalid_pattern_fails_the_run_naming_the_rule() {
        let err = compile(&config(
            r#"{ "SQLRules": [{ "ID": "broken_rule", "Detect": { "Regexp": "(" } }] }"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("broken_rule"));
    }

    #[test]
    fn sql_rules_default_to_dot_all() {
        let compiled = compile(&config(
            r#"{
  "SQLRules": [{ "ID": "block", "Detect": { "Regexp": "BEGIN.*END" } }],
  "JavaTypeRules": [{ "ID": "jblock", "Detect": { "Regexp": "BEGIN.*END" } }]
}"#,
        ))
        .unwrap();

        assert!(compiled.sql[0].pattern.is_match("BEGIN\nEND"));
        assert!(!compiled.java[0].pattern.is_match("BEGIN\nEND"));
    }

    #[test]
    fn selection_precedence_name_then_extension_then_domain() {
        let compiled = compile(&config(
            r#"{
  "FileSpecificRules": {
    "schema.sql": [{ "ID": "by_name", "Detect": { "Regexp": "x" } }],
    "sql": [{ "ID": "by_ext", "Detect": { "Regexp": "x" } }]
  },
  "SQLRules": [{ "ID": "by_domain_sql", "Detect": { "Regexp": "x" } }],
  "PLSQLRules": [{ "ID": "by_domain_plsql", "Detect": { "Regexp": "x" } }]
}"#,
        ))
        .unwrap();

        let rules = compiled.rules_for("schema.sql");
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["by_name", "by_ext", "by_domain_sql", "by_domain_plsql"]);

        let rules = compiled.rules_for("other.sql");
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["by_ext", "by_domain_sql", "by_domain_plsql"]);
    }

    #[test]
    fn unrelated_files_select_nothing() {
        let compiled = compile(&config(
            r#"{ "SQLRules": [{ "ID": "s", "Detect": { "Regexp": "x" } }] }"#,
        ))
        .unwrap();
        assert!(compiled.rules_for("readme.md").is_empty());
        assert!(compiled.rules_for("Main.java").is_empty());
    }

    #[test]
    fn java_files_select_java_rules() {
        let compiled = compile(&config(
            r#"{
  "JavaTypeRules": [{ "ID": "j", "Detect": { "Regexp": "OracleTypes" } }],
  "SQLRules": [{ "ID": "s", "Detect": { "Regexp": "x" } }]
}"#,
        ))
        .unwrap();
        let rules = compiled.rules_for("Dao.java");
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["j"]);
    }
}
