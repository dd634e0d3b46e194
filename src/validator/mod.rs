//! Validator component (spec §4.3): a capability trait over business
//! rules, plus the concrete rule-engine implementation in `rules`.

pub mod rules;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audit::AuditWriter;
use crate::error::CoreResult;
use crate::value::{Row, Value};

pub use rules::RuleEngineValidator;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Default for ValidationSeverity {
    fn default() -> Self {
        ValidationSeverity::Error
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Required,
    Unique,
    GreaterThan,
    LessThan,
    Between,
    Equals,
    NotContains,
    Regex,
    #[serde(alias = "ref_in")]
    AllowedValues,
    Readonly,
}

impl RuleType {
    pub const fn as_str(self) -> &'static str {
        match self {
            RuleType::Required => "required",
            RuleType::Unique => "unique",
            RuleType::GreaterThan => "greater_than",
            RuleType::LessThan => "less_than",
            RuleType::Between => "between",
            RuleType::Equals => "equals",
            RuleType::NotContains => "not_contains",
            RuleType::Regex => "regex",
            RuleType::AllowedValues => "allowed_values",
            RuleType::Readonly => "readonly",
        }
    }
}

/// A single business rule. Mirrors the flat dict shape rules are defined
/// in at rest (spec §4.3); not every field is meaningful for every
/// `RuleType`. `severity` is left unset (`None`) unless the caller pins
/// one explicitly — each `RuleType` otherwise falls back to its own
/// default via `effective_severity` (`business_rules_service.py` defaults
/// every rule type to `"error"` except `allowed_values`/`ref_in`, which
/// defaults to `"warning"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    pub rule_type: Option<RuleType>,
    pub column: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub severity: Option<ValidationSeverity>,
    pub value: Option<Value>,
    pub value2: Option<Value>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    #[serde(default)]
    pub values: Vec<Value>,
    pub pattern: Option<String>,
}

impl Rule {
    /// Whether this rule applies to `column`, via either the singular
    /// `column` field or the `columns` list (spec §4.3 `_get_column_rules`).
    pub fn applies_to(&self, column: &str) -> bool {
        self.column.as_deref() == Some(column) || self.columns.iter().any(|c| c == column)
    }

    /// The severity this rule fires at: the explicit `severity` if set,
    /// else the per-rule-type default (`AllowedValues` -> `Warning`,
    /// everything else -> `Error`).
    pub fn effective_severity(&self) -> ValidationSeverity {
        self.severity.unwrap_or(match self.rule_type {
            Some(RuleType::AllowedValues) => ValidationSeverity::Warning,
            _ => ValidationSeverity::Error,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellValidationError {
    pub column: String,
    pub row_index: Option<usize>,
    pub row_id: Option<String>,
    pub severity: ValidationSeverity,
    pub rule_type: String,
    pub message: String,
    pub expected_value: Option<String>,
    pub actual_value: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellValidationResult {
    pub valid: bool,
    pub errors: Vec<CellValidationError>,
    pub column: String,
    pub value: Value,
    pub row_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub errors: u32,
    pub warnings: u32,
    pub rules_violated: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchValidationResult {
    pub valid: bool,
    pub error_count: u32,
    pub warning_count: u32,
    pub errors: Vec<CellValidationError>,
    pub summary: BTreeMap<String, ColumnSummary>,
}

/// Capability seam for rule-based validation (spec §4.3). Cell-level
/// checks drive live-edit feedback; row-level checks drive append and
/// change-request validation runs.
pub trait Validator: Send + Sync {
    fn validate_cell(&self, column: &str, value: &Value, rules: &[Rule], row_id: Option<&str>) -> CellValidationResult;

    fn validate_rows(&self, rows: &[Row], rules: &[Rule]) -> BatchValidationResult;
}

/// The `summary.json` artifact for a validation run (spec §4.9): counts
/// only, no per-error detail — that lives in `full.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRunSummary {
    pub run_id: String,
    pub valid: bool,
    pub error_count: u32,
    pub warning_count: u32,
    pub row_count: usize,
}

impl ValidationRunSummary {
    fn from_result(run_id: &str, row_count: usize, result: &BatchValidationResult) -> Self {
        Self {
            run_id: run_id.to_string(),
            valid: result.valid,
            error_count: result.error_count,
            warning_count: result.warning_count,
            row_count,
        }
    }
}

/// Runs row-batch validation and persists the two validation-run audit
/// artifacts (spec §4.9: `audit/validation_runs/<run_id>/{summary,full}.json`).
/// Shared by every validation call site so a run is recorded exactly once,
/// regardless of which component triggered it.
pub async fn run_and_record(
    validator: &dyn Validator,
    audit: &AuditWriter,
    validation_runs_dir: &Path,
    run_id: &str,
    rows: &[Row],
    rules: &[Rule],
) -> CoreResult<BatchValidationResult> {
    let result = validator.validate_rows(rows, rules);
    let run_dir = validation_runs_dir.join(run_id);
    let summary = ValidationRunSummary::from_result(run_id, rows.len(), &result);
    audit.write_once(&run_dir, "summary", &summary).await?;
    audit.write_once(&run_dir, "full", &result).await?;
    Ok(result)
}
