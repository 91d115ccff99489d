//! migror-rules: declarative rule configuration
//!
//! Parses the JSON rule document (four rule collections plus scan/global
//! options) and compiles it into the per-domain `migror_core::Rule` sets a
//! run shares read-only across all files.

pub mod compiler;
pub mod schema;

use thiserror::Error;

pub use compiler::{compile, CompiledRules};
pub use schema::{GlobalOptions, RawRule, RuleConfig, ScanOptions};

/// Errors raised while loading or compiling the rule configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Rule(#[from] migror_core::RuleError),
}
