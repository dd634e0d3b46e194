//! `RuleEngineValidator`: a hand-rolled rule evaluator, grounded on the
//! manual fallback path of the original business-rules service (no crate
//! in this exercise's corpus wraps an expectation-suite engine, so the
//! "fallback" path is promoted to the only path).

use std::collections::BTreeMap;

use regex::Regex;
use tracing::warn;

use crate::value::Value;
use crate::validator::{
    BatchValidationResult, CellValidationError, CellValidationResult, ColumnSummary, Rule,
    RuleType, ValidationSeverity, Validator,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngineValidator;

impl RuleEngineValidator {
    pub fn new() -> Self {
        Self
    }

    fn column_rules<'a>(&self, column: &str, rules: &'a [Rule]) -> Vec<&'a Rule> {
        rules.iter().filter(|rule| rule.applies_to(column)).collect()
    }

    /// Evaluates one rule against one value, grounded on
    /// `_validate_single_value` (spec §4.3).
    fn validate_single_value(
        &self,
        column: &str,
        value: &Value,
        rule: &Rule,
        row_index: Option<usize>,
        row_id: Option<&str>,
    ) -> Option<CellValidationError> {
        let Some(rule_type) = rule.rule_type else {
            return None;
        };
        let severity = rule.effective_severity();
        let is_empty = matches!(value, Value::Null) || matches!(value, Value::Text(s) if s.trim().is_empty());

        if rule_type == RuleType::Required {
            if is_empty {
                return Some(self.error(
                    column,
                    row_index,
                    row_id,
                    severity,
                    rule_type,
                    format!("'{column}' is required"),
                    None,
                    Some(value.clone()),
                ));
            }
            return None;
        }

        // Non-required rules don't fire on empty values.
        if is_empty {
            return None;
        }

        match rule_type {
            RuleType::GreaterThan => {
                let threshold = rule.value.as_ref()?.as_f64()?;
                let actual = match value.as_f64() {
                    Some(v) => v,
                    None => {
                        return Some(self.error(
                            column, row_index, row_id, severity, rule_type,
                            format!("'{column}' must be a valid number"), None, Some(value.clone()),
                        ))
                    }
                };
                if actual <= threshold {
                    return Some(self.error(
                        column, row_index, row_id, severity, rule_type,
                        format!("'{column}' must be greater than {threshold}"),
                        Some(format!("> {threshold}")), Some(value.clone()),
                    ));
                }
                None
            }
            RuleType::LessThan => {
                let threshold = rule.value.as_ref()?.as_f64()?;
                let actual = match value.as_f64() {
                    Some(v) => v,
                    None => {
                        return Some(self.error(
                            column, row_index, row_id, severity, rule_type,
                            format!("'{column}' must be a valid number"), None, Some(value.clone()),
                        ))
                    }
                };
                if actual >= threshold {
                    return Some(self.error(
                        column, row_index, row_id, severity, rule_type,
                        format!("'{column}' must be less than {threshold}"),
                        Some(format!("< {threshold}")), Some(value.clone()),
                    ));
                }
                None
            }
            RuleType::Between => {
                let min_val = rule.min.as_ref().or(rule.value.as_ref()).and_then(Value::as_f64);
                let max_val = rule.max.as_ref().or(rule.value2.as_ref()).and_then(Value::as_f64);
                let actual = match value.as_f64() {
                    Some(v) => v,
                    None => {
                        return Some(self.error(
                            column, row_index, row_id, severity, rule_type,
                            format!("'{column}' must be a valid number"), None, Some(value.clone()),
                        ))
                    }
                };
                if let Some(min_val) = min_val {
                    if actual < min_val {
                        return Some(self.error(
                            column, row_index, row_id, severity, rule_type,
                            format!("'{column}' must be at least {min_val}"),
                            Some(format!(">= {min_val}")), Some(value.clone()),
                        ));
                    }
                }
                if let Some(max_val) = max_val {
                    if actual > max_val {
                        return Some(self.error(
                            column, row_index, row_id, severity, rule_type,
                            format!("'{column}' must be at most {max_val}"),
                            Some(format!("<= {max_val}")), Some(value.clone()),
                        ));
                    }
                }
                None
            }
            RuleType::Equals => {
                let expected = rule.value.as_ref()?;
                if !value.null_equal(expected) {
                    return Some(self.error(
                        column, row_index, row_id, severity, rule_type,
                        format!("'{column}' must equal {}", expected.to_canonical_string()),
                        Some(expected.to_canonical_string()), Some(value.clone()),
                    ));
                }
                None
            }
            RuleType::NotContains => {
                let forbidden: Vec<String> = if !rule.values.is_empty() {
                    rule.values.iter().map(Value::to_canonical_string).collect()
                } else if let Some(single) = &rule.value {
                    vec![single.to_canonical_string()]
                } else {
                    Vec::new()
                };
                let haystack = value.to_canonical_string().to_lowercase();
                for forbidden_value in forbidden {
                    if !forbidden_value.is_empty() && haystack.contains(&forbidden_value.to_lowercase()) {
                        return Some(self.error(
                            column, row_index, row_id, severity, rule_type,
                            format!("'{column}' must not contain '{forbidden_value}'"),
                            Some(format!("not contain '{forbidden_value}'")), Some(value.clone()),
                        ));
                    }
                }
                None
            }
            RuleType::Regex => {
                let pattern = rule.pattern.as_deref()?;
                let anchored = format!("^(?:{pattern})$");
                match Regex::new(&anchored) {
                    Ok(re) => {
                        if !re.is_match(&value.to_canonical_string()) {
                            return Some(self.error(
                                column, row_index, row_id, severity, rule_type,
                                format!("'{column}' does not match required pattern"),
                                Some(format!("pattern: {pattern}")), Some(value.clone()),
                            ));
                        }
                        None
                    }
                    Err(err) => {
                        warn!(column, pattern, %err, "invalid regex rule, skipping");
                        None
                    }
                }
            }
            RuleType::AllowedValues => {
                if rule.values.is_empty() {
                    return None;
                }
                if !rule.values.iter().any(|allowed| allowed.null_equal(value)) {
                    let shown: Vec<String> = rule.values.iter().take(5).map(Value::to_canonical_string).collect();
                    let suffix = if rule.values.len() > 5 { "..." } else { "" };
                    return Some(self.error(
                        column, row_index, row_id, severity, rule_type,
                        format!("'{column}' must be one of: {}{}", shown.join(", "), suffix),
                        Some(format!("one of {} allowed values", rule.values.len())), Some(value.clone()),
                    ));
                }
                None
            }
            RuleType::Unique | RuleType::Readonly | RuleType::Required => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn error(
        &self,
        column: &str,
        row_index: Option<usize>,
        row_id: Option<&str>,
        severity: ValidationSeverity,
        rule_type: RuleType,
        message: String,
        expected_value: Option<String>,
        actual_value: Option<Value>,
    ) -> CellValidationError {
        CellValidationError {
            column: column.to_string(),
            row_index,
            row_id: row_id.map(str::to_string),
            severity,
            rule_type: rule_type.as_str().to_string(),
            message,
            expected_value,
            actual_value,
        }
    }

    /// `unique` rules can't be decided from a single cell; they only fire
    /// during row-batch validation, once duplicates across the batch are
    /// visible (spec §4.3).
    fn uniqueness_errors(&self, rows: &[crate::value::Row], rules: &[Rule]) -> Vec<CellValidationError> {
        let mut errors = Vec::new();
        for rule in rules.iter().filter(|r| r.rule_type == Some(RuleType::Unique)) {
            let Some(column) = &rule.column else { continue };
            let mut seen: BTreeMap<String, usize> = BTreeMap::new();
            for (idx, row) in rows.iter().enumerate() {
                let value = row.get(column).cloned().unwrap_or(Value::Null);
                if value.is_null() {
                    continue;
                }
                let key = value.to_canonical_string();
                if let Some(_first_idx) = seen.get(&key) {
                    errors.push(self.error(
                        column,
                        Some(idx),
                        None,
                        rule.effective_severity(),
                        RuleType::Unique,
                        format!("'{column}' must have unique values"),
                        None,
                        Some(value),
                    ));
                } else {
                    seen.insert(key, idx);
                }
            }
        }
        errors
    }
}

impl Validator for RuleEngineValidator {
    fn validate_cell(&self, column: &str, value: &Value, rules: &[Rule], row_id: Option<&str>) -> CellValidationResult {
        let applicable = self.column_rules(column, rules);
        let errors: Vec<CellValidationError> = applicable
            .into_iter()
            .filter_map(|rule| self.validate_single_value(column, value, rule, None, row_id))
            .collect();
        CellValidationResult {
            valid: errors.is_empty(),
            errors,
            column: column.to_string(),
            value: value.clone(),
            row_id: row_id.map(str::to_string),
        }
    }

    fn validate_rows(&self, rows: &[crate::value::Row], rules: &[Rule]) -> BatchValidationResult {
        let mut errors = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            for (column, value) in row {
                if column.starts_with('_') {
                    continue;
                }
                for rule in self.column_rules(column, rules) {
                    if let Some(error) = self.validate_single_value(column, value, rule, Some(idx), None) {
                        errors.push(error);
                    }
                }
            }
        }
        errors.extend(self.uniqueness_errors(rows, rules));

        let error_count = errors
            .iter()
            .filter(|e| matches!(e.severity, ValidationSeverity::Error | ValidationSeverity::Fatal))
            .count() as u32;
        let warning_count = errors.iter().filter(|e| e.severity == ValidationSeverity::Warning).count() as u32;

        let mut summary: BTreeMap<String, ColumnSummary> = BTreeMap::new();
        for error in &errors {
            let entry = summary.entry(error.column.clone()).or_default();
            match error.severity {
                ValidationSeverity::Error | ValidationSeverity::Fatal => entry.errors += 1,
                ValidationSeverity::Warning => entry.warnings += 1,
                ValidationSeverity::Info => {}
            }
            if !entry.rules_violated.contains(&error.rule_type) {
                entry.rules_violated.push(error.rule_type.clone());
            }
        }

        BatchValidationResult {
            valid: error_count == 0,
            error_count,
            warning_count,
            errors,
            summary,
        }
    }
}
