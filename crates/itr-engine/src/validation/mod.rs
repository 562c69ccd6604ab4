//! Declarative validation of return records: range, cross-field and derived-value
//! checks, each producing a per-record result with a rendered message.

mod builtin;
mod record;
mod rules;

#[cfg(test)]
mod tests;

pub use builtin::{builtin_validation_rule_sets, core_rule_set, CORE_RULE_SET_ID};
pub use record::{numeric_record, FieldValue, Record, RecordSet};
pub use rules::{
    Check, Comparison, Expression, Operand, Severity, ValidationRule, ValidationRuleSet,
};

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Failed,
    Warning,
    Skipped,
}

impl ValidationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Warning => "warning",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub rule_id: String,
    pub scope: String,
    /// Position of the record within its scope; absent when the scope had none.
    pub record_index: Option<usize>,
    pub severity: Severity,
    pub status: ValidationStatus,
    pub message: String,
    pub affected_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rule_set_id: String,
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    /// A return with any failed error-severity rule must not be submitted.
    pub fn blocks_submission(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.status == ValidationStatus::Failed)
    }

    pub fn counts(&self) -> BTreeMap<ValidationStatus, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn with_status(&self, status: ValidationStatus) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(move |result| result.status == status)
    }
}

/// Applies every rule of `rule_set` to every record in its scope.
///
/// Results come back in rule order, then record order. A rule whose scope has no
/// records, or whose fields are missing from a record, is reported as skipped.
pub fn validate_records(rule_set: &ValidationRuleSet, records: &RecordSet) -> ValidationReport {
    let mut results = Vec::new();

    for rule in &rule_set.rules {
        let affected_fields = rule.check.fields();
        let scoped = records.records(&rule.scope);

        if scoped.is_empty() {
            results.push(ValidationResult {
                rule_id: rule.id.clone(),
                scope: rule.scope.clone(),
                record_index: None,
                severity: rule.severity,
                status: ValidationStatus::Skipped,
                message: format!("no {} records supplied", rule.scope),
                affected_fields: affected_fields.clone(),
            });
            continue;
        }

        for (index, record) in scoped.iter().enumerate() {
            let (status, message) = match evaluate(&rule.check, record) {
                Outcome::Pass => (ValidationStatus::Passed, String::new()),
                Outcome::Fail(values) => {
                    let status = match rule.severity {
                        Severity::Error => ValidationStatus::Failed,
                        Severity::Warning | Severity::Info => ValidationStatus::Warning,
                    };
                    (status, render(&rule.message, &rule.scope, &values))
                }
                Outcome::Missing(fields) => (
                    ValidationStatus::Skipped,
                    format!("missing or non-numeric field(s): {}", fields.join(", ")),
                ),
            };
            results.push(ValidationResult {
                rule_id: rule.id.clone(),
                scope: rule.scope.clone(),
                record_index: Some(index),
                severity: rule.severity,
                status,
                message,
                affected_fields: affected_fields.clone(),
            });
        }
    }

    ValidationReport {
        rule_set_id: rule_set.id.clone(),
        results,
    }
}

enum Outcome {
    Pass,
    Fail(Placeholders),
    Missing(Vec<String>),
}

#[derive(Default)]
struct Placeholders {
    field: String,
    actual: Option<Decimal>,
    expected: String,
    min: Option<Decimal>,
    max: Option<Decimal>,
    left: Option<Decimal>,
    right: Option<Decimal>,
}

fn evaluate(check: &Check, record: &Record) -> Outcome {
    let missing: Vec<String> = check
        .fields()
        .into_iter()
        .filter(|field| record.get(field).and_then(FieldValue::as_number).is_none())
        .collect();
    if !missing.is_empty() {
        return Outcome::Missing(missing);
    }

    match check {
        Check::Range { field, min, max } => {
            let Some(actual) = record.get(field).and_then(FieldValue::as_number) else {
                return Outcome::Missing(vec![field.clone()]);
            };
            let below = min.is_some_and(|min| actual < min);
            let above = max.is_some_and(|max| actual > max);
            if !below && !above {
                return Outcome::Pass;
            }
            let expected = match (min, max) {
                (Some(min), Some(max)) => format!("between {min} and {max}"),
                (Some(min), None) => format!("at least {min}"),
                (None, Some(max)) => format!("at most {max}"),
                (None, None) => String::new(),
            };
            Outcome::Fail(Placeholders {
                field: field.clone(),
                actual: Some(actual),
                expected,
                min: *min,
                max: *max,
                ..Placeholders::default()
            })
        }
        Check::CrossField {
            left,
            comparison,
            right,
        } => {
            let (Some(lhs), Some(rhs)) = (left.evaluate(record), right.evaluate(record)) else {
                return Outcome::Missing(check.fields());
            };
            if comparison.holds(lhs, rhs) {
                return Outcome::Pass;
            }
            Outcome::Fail(Placeholders {
                field: left.fields().next().unwrap_or_default().to_string(),
                actual: Some(lhs),
                expected: format!("{comparison} {}", rhs.normalize()),
                left: Some(lhs),
                right: Some(rhs),
                ..Placeholders::default()
            })
        }
        Check::DerivedValue {
            field,
            expression,
            tolerance,
        } => {
            let (Some(actual), Some(expected)) = (
                record.get(field).and_then(FieldValue::as_number),
                expression.evaluate(record),
            ) else {
                return Outcome::Missing(check.fields());
            };
            if (actual - expected).abs() <= *tolerance {
                return Outcome::Pass;
            }
            Outcome::Fail(Placeholders {
                field: field.clone(),
                actual: Some(actual),
                expected: expected.normalize().to_string(),
                left: Some(actual),
                right: Some(expected),
                ..Placeholders::default()
            })
        }
    }
}

fn render(template: &str, scope: &str, values: &Placeholders) -> String {
    let amount = |value: Option<Decimal>| {
        value.map_or_else(String::new, |value| value.normalize().to_string())
    };
    [
        ("{field}", values.field.clone()),
        ("{actual}", amount(values.actual)),
        ("{expected}", values.expected.clone()),
        ("{min}", amount(values.min)),
        ("{max}", amount(values.max)),
        ("{left}", amount(values.left)),
        ("{right}", amount(values.right)),
        ("{scope}", scope.to_string()),
    ]
    .iter()
    .fold(template.to_string(), |message, (placeholder, value)| {
        message.replace(placeholder, value)
    })
}
