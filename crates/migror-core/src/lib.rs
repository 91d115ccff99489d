//! migror-core: rule-driven detection and conversion engine
//!
//! The pipeline per file: select applicable rules, detect every pattern
//! occurrence with positional context, run the structural rewriter (for
//! dependency descriptors) and the generic rewriter to produce converted
//! content, and emit the occurrence/change/audit records the reporting
//! layer consumes. Dry-run and apply report byte-identical results; only
//! persistence differs.

pub mod descriptor;
pub mod detect;
pub mod hash;
pub mod ledger;
pub mod position;
pub mod rewrite;
pub mod rule;

pub use descriptor::{is_descriptor, is_structural_rule, rewrite_descriptor, DESCRIPTOR_FILE};
pub use detect::detect_in_content;
pub use hash::content_hash;
pub use ledger::{Change, FileAudit, Ledger, Occurrence};
pub use position::line_col;
pub use rewrite::{apply_conversions, unified_line_diff};
pub use rule::{Conversion, Domain, PatternFlags, Rule, RuleError, Severity};
