//! Rule model: one detection pattern plus its optional conversion

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while building a rule
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("rule `{id}`: invalid detection pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule `{id}`: conversion enabled but old value is empty")]
    EmptyOldValue { id: String },
}

/// Severity of a detected occurrence.
///
/// Declaration order is the fixed total order: sorting ascending puts
/// blockers first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Blocker,
    Major,
    Minor,
    Info,
}

impl Severity {
    /// Parse a severity label; anything unrecognized degrades to `Info`
    pub fn parse(s: &str) -> Severity {
        match s.to_ascii_uppercase().as_str() {
            "BLOCKER" => Severity::Blocker,
            "MAJOR" => Severity::Major,
            "MINOR" => Severity::Minor,
            _ => Severity::Info,
        }
    }
}

/// Rule domain tag, driving per-file rule selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Domain {
    File,
    Sql,
    Plsql,
    Java,
}

/// Conversion half of a rule: global old -> new substitution.
///
/// `new` may be empty (delete-on-match); `old` never is.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub old: String,
    pub new: String,
}

/// Regex flags configured per rule
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_all: bool,
}

/// A compiled detection rule. Built once per run, never mutated, shared
/// read-only across all files.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub severity: Severity,
    pub description: String,
    pub pattern: Regex,
    pub conversion: Option<Conversion>,
    pub category: Option<String>,
    pub domain: Domain,
}

impl Rule {
    /// Compile a rule, failing fast on an invalid pattern or an enabled
    /// conversion with an empty old value.
    #[allow(clippy::too_many_arguments)]
    pub fn compile(
        id: impl Into<String>,
        domain: Domain,
        severity: Severity,
        description: impl Into<String>,
        pattern: &str,
        flags: PatternFlags,
        conversion: Option<Conversion>,
        category: Option<String>,
    ) -> Result<Rule, RuleError> {
        let id = id.into();

        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(flags.case_insensitive)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_all)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                id: id.clone(),
                source,
            })?;

        if let Some(conv) = &conversion {
            if conv.old.is_empty() {
                return Err(RuleError::EmptyOldValue { id });
            }
        }

        Ok(Rule {
            id,
            severity,
            description: description.into(),
            pattern,
            conversion,
            category,
            domain,
        })
    }

    /// Conversion for this rule, if enabled
    pub fn conversion(&self) -> Option<&Conversion> {
        self.conversion.as_ref()
    }
}
