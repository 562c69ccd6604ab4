use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::profile::{AmountAttribute, CountAttribute, FlagAttribute, ProfileAttributes};
use crate::rules::RuleTableError;

/// Return forms available to individual taxpayers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormId {
    #[serde(rename = "ITR-1")]
    Itr1,
    #[serde(rename = "ITR-2")]
    Itr2,
    #[serde(rename = "ITR-3")]
    Itr3,
    #[serde(rename = "ITR-4")]
    Itr4,
}

impl FormId {
    pub const fn label(self) -> &'static str {
        match self {
            FormId::Itr1 => "ITR-1",
            FormId::Itr2 => "ITR-2",
            FormId::Itr3 => "ITR-3",
            FormId::Itr4 => "ITR-4",
        }
    }

    /// Higher is more comprehensive. Breaks confidence ties toward the form
    /// that can report everything the lesser one can.
    pub const fn complexity(self) -> u8 {
        match self {
            FormId::Itr1 => 1,
            FormId::Itr4 => 2,
            FormId::Itr2 => 3,
            FormId::Itr3 => 4,
        }
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a known return form")]
pub struct FormIdParseError(pub String);

impl FromStr for FormId {
    type Err = FormIdParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match compact.as_str() {
            "ITR1" => Ok(FormId::Itr1),
            "ITR2" => Ok(FormId::Itr2),
            "ITR3" => Ok(FormId::Itr3),
            "ITR4" => Ok(FormId::Itr4),
            _ => Err(FormIdParseError(value.to_string())),
        }
    }
}

/// Declarative predicate over [`ProfileAttributes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Flag {
        flag: FlagAttribute,
    },
    AmountAbove {
        attribute: AmountAttribute,
        threshold: Decimal,
    },
    AmountAtMost {
        attribute: AmountAttribute,
        threshold: Decimal,
    },
    CountAbove {
        attribute: CountAttribute,
        threshold: u32,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
}

impl Condition {
    pub fn flag(flag: FlagAttribute) -> Self {
        Condition::Flag { flag }
    }

    pub fn above(attribute: AmountAttribute, threshold: Decimal) -> Self {
        Condition::AmountAbove {
            attribute,
            threshold,
        }
    }

    pub fn at_most(attribute: AmountAttribute, threshold: Decimal) -> Self {
        Condition::AmountAtMost {
            attribute,
            threshold,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All { conditions }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any { conditions }
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not {
            condition: Box::new(condition),
        }
    }

    pub fn evaluate(&self, profile: &ProfileAttributes) -> bool {
        match self {
            Condition::Flag { flag } => profile.flag(*flag),
            Condition::AmountAbove {
                attribute,
                threshold,
            } => profile.amount(*attribute) > *threshold,
            Condition::AmountAtMost {
                attribute,
                threshold,
            } => profile.amount(*attribute) <= *threshold,
            Condition::CountAbove {
                attribute,
                threshold,
            } => profile.count(*attribute) > *threshold,
            Condition::All { conditions } => conditions.iter().all(|c| c.evaluate(profile)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.evaluate(profile)),
            Condition::Not { condition } => !condition.evaluate(profile),
        }
    }
}

/// Confidence boost applied when a rule fires on an unmistakable signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongSignal {
    pub condition: Condition,
    pub boost: Decimal,
}

/// One row of the form decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRule {
    pub id: String,
    pub priority: u16,
    pub description: String,
    pub condition: Condition,
    pub form: FormId,
    #[serde(default)]
    pub alternative_form: Option<FormId>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub requires_ca_review: bool,
    pub estimated_minutes: u32,
    pub base_confidence: Decimal,
    #[serde(default)]
    pub strong_signal: Option<StrongSignal>,
    /// Fires only when no other rule in the table does.
    #[serde(default)]
    pub fallback: bool,
}

/// Ordered set of form rules. Every rule is evaluated; order only affects
/// how triggered rules are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FormRule>", into = "Vec<FormRule>")]
pub struct DecisionTable {
    rules: Vec<FormRule>,
}

impl DecisionTable {
    pub fn new(mut rules: Vec<FormRule>) -> Result<Self, RuleTableError> {
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

        let mut seen = BTreeSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleTableError::FormRules(format!(
                    "duplicate rule id '{}'",
                    rule.id
                )));
            }
            let in_range = |value: Decimal| value >= Decimal::ZERO && value <= Decimal::ONE;
            if !in_range(rule.base_confidence) {
                return Err(RuleTableError::FormRules(format!(
                    "rule '{}' has base confidence {} outside [0, 1]",
                    rule.id, rule.base_confidence
                )));
            }
            if let Some(signal) = &rule.strong_signal {
                if !in_range(signal.boost) {
                    return Err(RuleTableError::FormRules(format!(
                        "rule '{}' has a strong-signal boost outside [0, 1]",
                        rule.id
                    )));
                }
            }
        }
        if rules.iter().filter(|rule| rule.fallback).count() > 1 {
            return Err(RuleTableError::FormRules(
                "at most one fallback rule is allowed".to_string(),
            ));
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[FormRule] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&FormRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Rules whose conditions hold for `profile`, in priority order.
    pub fn triggered<'a>(&'a self, profile: &ProfileAttributes) -> Vec<&'a FormRule> {
        let mut fired: Vec<&FormRule> = self
            .rules
            .iter()
            .filter(|rule| !rule.fallback && rule.condition.evaluate(profile))
            .collect();

        if fired.is_empty() {
            fired.extend(
                self.rules
                    .iter()
                    .filter(|rule| rule.fallback && rule.condition.evaluate(profile)),
            );
        }
        fired.sort_by_key(|rule| rule.priority);
        fired
    }
}

impl TryFrom<Vec<FormRule>> for DecisionTable {
    type Error = RuleTableError;

    fn try_from(rules: Vec<FormRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<DecisionTable> for Vec<FormRule> {
    fn from(table: DecisionTable) -> Self {
        table.rules
    }
}

/// Schedules a form asks for and the effort they take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub form: FormId,
    pub name: String,
    pub required_fields: BTreeSet<String>,
    pub base_minutes: u32,
    #[serde(default)]
    pub requires_ca_review: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormCatalog {
    pub forms: BTreeMap<FormId, FormDefinition>,
    /// Minutes to complete each schedule; unknown fields use `default_field_minutes`.
    pub field_minutes: BTreeMap<String, u32>,
    pub default_field_minutes: u32,
}

impl FormCatalog {
    pub fn form(&self, form: FormId) -> Option<&FormDefinition> {
        self.forms.get(&form)
    }

    pub fn minutes_for(&self, field: &str) -> u32 {
        self.field_minutes
            .get(field)
            .copied()
            .unwrap_or(self.default_field_minutes)
    }

    pub(crate) fn validate(&self) -> Result<(), RuleTableError> {
        for (form, definition) in &self.forms {
            if *form != definition.form {
                return Err(RuleTableError::FormRules(format!(
                    "form catalog entry {form} describes {}",
                    definition.form
                )));
            }
        }
        Ok(())
    }
}
