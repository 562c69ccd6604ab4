use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::record::Record;
use crate::rules::{AssessmentYear, RuleTableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparison {
    pub fn holds(self, left: Decimal, right: Decimal) -> bool {
        match self {
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            Comparison::Ge => left >= right,
            Comparison::Gt => left > right,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Ge => ">=",
            Comparison::Gt => ">",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A value read from the record under validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Field(String),
    Constant(Decimal),
    Scaled { field: String, factor: Decimal },
}

impl Operand {
    pub fn field(name: &str) -> Self {
        Operand::Field(name.to_string())
    }

    fn field_name(&self) -> Option<&str> {
        match self {
            Operand::Field(name) | Operand::Scaled { field: name, .. } => Some(name),
            Operand::Constant(_) => None,
        }
    }

    fn resolve(&self, record: &Record) -> Option<Decimal> {
        match self {
            Operand::Constant(value) => Some(*value),
            Operand::Field(name) => record.get(name)?.as_number(),
            Operand::Scaled { field, factor } => Some(record.get(field)?.as_number()? * *factor),
        }
    }
}

/// `sum(add) - sum(subtract)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(default)]
    pub add: Vec<Operand>,
    #[serde(default)]
    pub subtract: Vec<Operand>,
}

impl Expression {
    pub fn of(operand: Operand) -> Self {
        Self {
            add: vec![operand],
            subtract: Vec::new(),
        }
    }

    pub fn difference(add: Vec<Operand>, subtract: Vec<Operand>) -> Self {
        Self { add, subtract }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.add
            .iter()
            .chain(&self.subtract)
            .filter_map(Operand::field_name)
    }

    /// `None` when any referenced field is absent or not numeric.
    pub fn evaluate(&self, record: &Record) -> Option<Decimal> {
        let mut total = Decimal::ZERO;
        for operand in &self.add {
            total += operand.resolve(record)?;
        }
        for operand in &self.subtract {
            total -= operand.resolve(record)?;
        }
        Some(total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    /// `min <= field <= max`, either bound optional.
    Range {
        field: String,
        #[serde(default)]
        min: Option<Decimal>,
        #[serde(default)]
        max: Option<Decimal>,
    },
    CrossField {
        left: Expression,
        comparison: Comparison,
        right: Expression,
    },
    /// `field` must equal `expression` within `tolerance`.
    DerivedValue {
        field: String,
        expression: Expression,
        #[serde(default)]
        tolerance: Decimal,
    },
}

impl Check {
    /// Fields the check reads, in first-reference order.
    pub fn fields(&self) -> Vec<String> {
        let names: Vec<&str> = match self {
            Check::Range { field, .. } => vec![field.as_str()],
            Check::CrossField { left, right, .. } => left.fields().chain(right.fields()).collect(),
            Check::DerivedValue {
                field, expression, ..
            } => std::iter::once(field.as_str())
                .chain(expression.fields())
                .collect(),
        };

        let mut seen = BTreeSet::new();
        names
            .into_iter()
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }
}

/// A declarative check applied to every record of one scope.
///
/// `message` is a template; `{field}`, `{actual}`, `{expected}`, `{min}`, `{max}`,
/// `{left}`, `{right}` and `{scope}` are substituted when the rule fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub id: String,
    pub scope: String,
    pub severity: Severity,
    pub check: Check,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRuleSet {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_year: Option<AssessmentYear>,
    pub rules: Vec<ValidationRule>,
}

impl ValidationRuleSet {
    pub fn validate(&self) -> Result<(), RuleTableError> {
        let invalid = |message: String| {
            Err(RuleTableError::ValidationRules(format!(
                "{}: {message}",
                self.id
            )))
        };

        if self.id.trim().is_empty() {
            return invalid("rule set id is empty".to_string());
        }
        let mut ids = BTreeSet::new();
        for rule in &self.rules {
            if !ids.insert(rule.id.as_str()) {
                return invalid(format!("duplicate rule id '{}'", rule.id));
            }
            if rule.scope.trim().is_empty() {
                return invalid(format!("rule '{}' has no scope", rule.id));
            }
            match &rule.check {
                Check::Range {
                    min: Some(min),
                    max: Some(max),
                    ..
                } if min > max => {
                    return invalid(format!("rule '{}' has min {min} above max {max}", rule.id));
                }
                Check::DerivedValue { tolerance, .. } if tolerance.is_sign_negative() => {
                    return invalid(format!("rule '{}' has a negative tolerance", rule.id));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
