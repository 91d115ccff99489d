//! Schema of the JSON rule configuration document
//!
//! Four named rule collections plus scan and global options. Missing or
//! malformed optional fields degrade to their stated defaults; pattern
//! strings are the one thing whose invalidity is fatal (checked by the
//! compiler, not here).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

/// The whole configuration document
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    #[serde(rename = "FileSpecificRules")]
    pub file_specific_rules: BTreeMap<String, Vec<RawRule>>,

    #[serde(rename = "SQLRules")]
    pub sql_rules: Vec<RawRule>,

    #[serde(rename = "PLSQLRules")]
    pub plsql_rules: Vec<RawRule>,

    #[serde(rename = "JavaTypeRules")]
    pub java_type_rules: Vec<RawRule>,

    #[serde(rename = "ScanOptions")]
    pub scan: ScanOptions,

    #[serde(rename = "GlobalOptions")]
    pub global: GlobalOptions,
}

/// One raw rule definition, prior to pattern compilation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRule {
    #[serde(rename = "ID")]
    pub id: String,

    /// Severity label; anything unrecognized or absent becomes INFO
    #[serde(rename = "Severity")]
    pub severity: Option<String>,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Detect")]
    pub detect: Detect,

    #[serde(rename = "Convert")]
    pub convert: Convert,

    #[serde(rename = "Category")]
    pub category: Option<String>,
}

/// Detection sub-object: the pattern and its flags.
///
/// Flags left unset fall back to the domain default (SQL and PL/SQL rules
/// match dot-all by default).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Detect {
    #[serde(rename = "Regexp")]
    pub regexp: String,

    #[serde(rename = "CaseInsensitive")]
    pub case_insensitive: Option<bool>,

    #[serde(rename = "MultiLine")]
    pub multi_line: Option<bool>,

    #[serde(rename = "DotAll")]
    pub dot_all: Option<bool>,
}

/// Conversion sub-object
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Convert {
    #[serde(rename = "Enabled")]
    pub enabled: bool,

    #[serde(rename = "Old")]
    pub old: Option<String>,

    #[serde(rename = "New")]
    pub new: Option<String>,
}

/// Directory-walk options
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    #[serde(rename = "RootDirectory")]
    pub root_directory: String,

    #[serde(rename = "ExcludedDirectories")]
    pub excluded_directories: Vec<String>,

    #[serde(rename = "ExcludedFiles")]
    pub excluded_files: Vec<String>,

    /// Glob patterns gating file eligibility (e.g. `*.java`, `pom.xml`)
    #[serde(rename = "SearchFiles")]
    pub search_files: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            root_directory: ".".to_string(),
            excluded_directories: Vec::new(),
            excluded_files: Vec::new(),
            search_files: Vec::new(),
        }
    }
}

/// Run-level options
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobalOptions {
    #[serde(rename = "DefaultBackupExtension")]
    pub backup_extension: String,

    #[serde(rename = "DefaultDryRun")]
    pub default_dry_run: bool,

    #[serde(rename = "ReportJson")]
    pub report_json: String,

    #[serde(rename = "ReportHtml")]
    pub report_html: String,

    /// Overall run deadline in seconds; files not reached in time are
    /// skipped with a warning
    #[serde(rename = "DeadlineSecs")]
    pub deadline_secs: Option<u64>,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        GlobalOptions {
            backup_extension: ".bak".to_string(),
            default_dry_run: true,
            report_json: "migration_report.json".to_string(),
            report_html: "migration_report.html".to_string(),
            deadline_secs: None,
        }
    }
}

impl RuleConfig {
    /// Load and parse the configuration document
    pub fn load(path: &Path) -> Result<RuleConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        RuleConfig::parse(&contents)
    }

    /// Parse a configuration document from a JSON string
    pub fn parse(contents: &str) -> Result<RuleConfig, ConfigError> {
        serde_json::from_str(contents).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let config = RuleConfig::parse(
            r#"{
  "FileSpecificRules": {
    "pom.xml": [
      {
        "ID": "pom_artifactid_ojdbc",
        "Severity": "BLOCKER",
        "Description": "Oracle JDBC driver",
        "Detect": { "Regexp": "ojdbc11" },
        "Convert": { "Enabled": true, "Old": "ojdbc11", "New": "postgresql" }
      }
    ]
  },
  "SQLRules": [
    {
      "ID": "ora_number_bool",
      "Severity": "MAJOR",
      "Description": "NUMBER(1) flag columns",
      "Detect": { "Regexp": "NUMBER\\(1\\)" },
      "Convert": { "Enabled": true, "Old": "NUMBER(1)", "New": "BOOLEAN" },
      "Category": "types"
    }
  ],
  "ScanOptions": {
    "RootDirectory": "./src",
    "ExcludedDirectories": ["target", ".git"],
    "ExcludedFiles": ["generated.sql"],
    "SearchFiles": ["*.sql", "*.java", "pom.xml"]
  },
  "GlobalOptions": {
    "DefaultBackupExtension": ".orig",
    "DefaultDryRun": false
  }
}"#,
        )
        .unwrap();

        assert_eq!(config.file_specific_rules["pom.xml"].len(), 1);
        assert_eq!(config.sql_rules[0].id, "ora_number_bool");
        assert_eq!(config.sql_rules[0].category.as_deref(), Some("types"));
        assert!(config.plsql_rules.is_empty());
        assert_eq!(config.scan.root_directory, "./src");
        assert_eq!(config.scan.search_files.len(), 3);
        assert_eq!(config.global.backup_extension, ".orig");
        assert!(!config.global.default_dry_run);
        // Unset options keep their defaults.
        assert_eq!(config.global.report_json, "migration_report.json");
        assert!(config.global.deadline_secs.is_none());
    }

    #[test]
    fn missing_fields_degrade_to_defaults() {
        let config = RuleConfig::parse(
            r#"{
  "SQLRules": [
    { "ID": "detect_only", "Detect": { "Regexp": "SYSDATE" } }
  ]
}"#,
        )
        .unwrap();

        let rule = &config.sql_rules[0];
        assert!(rule.severity.is_none());
        assert_eq!(rule.description, "");
        assert!(!rule.convert.enabled);
        assert!(rule.convert.old.is_none());
        assert_eq!(config.global.backup_extension, ".bak");
        assert!(config.global.default_dry_run);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(RuleConfig::parse("{ not json").is_err());
    }
}
