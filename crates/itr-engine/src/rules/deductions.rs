use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AgeCategory, RuleTableError};
use crate::computation::IncomeCategory;

/// Income figure a proportional cap is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBase {
    GrossTotal,
    Category(IncomeCategory),
}

/// Statutory ceiling for a deduction section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionCap {
    Fixed { amount: Decimal },
    ByAge { general: Decimal, senior: Decimal },
    ShareOfIncome { base: IncomeBase, rate: Decimal },
    Unlimited,
}

/// Restricts a section to one side of the senior-citizen line (80TTA vs 80TTB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeRestriction {
    SeniorOnly,
    NonSeniorOnly,
}

impl AgeRestriction {
    pub const fn admits(self, age: AgeCategory) -> bool {
        match self {
            Self::SeniorOnly => age.is_senior(),
            Self::NonSeniorOnly => !age.is_senior(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRule {
    pub code: String,
    pub description: String,
    pub cap: SectionCap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_restriction: Option<AgeRestriction>,
}

/// Aggregate ceiling shared by several sections, e.g. 80C + 80CCC + 80CCD(1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedLimit {
    pub name: String,
    pub sections: BTreeSet<String>,
    pub cap: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionTable {
    pub sections: Vec<SectionRule>,
    #[serde(default)]
    pub combined_limits: Vec<CombinedLimit>,
}

impl DeductionTable {
    pub fn section(&self, code: &str) -> Option<&SectionRule> {
        let wanted = normalize_section_code(code);
        self.sections
            .iter()
            .find(|rule| normalize_section_code(&rule.code) == wanted)
    }

    pub fn limits_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a CombinedLimit> + 'a {
        let wanted = normalize_section_code(code);
        self.combined_limits.iter().filter(move |limit| {
            limit
                .sections
                .iter()
                .any(|section| normalize_section_code(section) == wanted)
        })
    }

    pub(crate) fn validate(&self) -> Result<(), RuleTableError> {
        let mut seen = BTreeSet::new();
        for rule in &self.sections {
            let code = normalize_section_code(&rule.code);
            if !seen.insert(code) {
                return Err(RuleTableError::Deduction(format!(
                    "section {} configured twice",
                    rule.code
                )));
            }

            let negative = match &rule.cap {
                SectionCap::Fixed { amount } => amount.is_sign_negative(),
                SectionCap::ByAge { general, senior } => {
                    general.is_sign_negative() || senior.is_sign_negative()
                }
                SectionCap::ShareOfIncome { rate, .. } => {
                    rate.is_sign_negative() || *rate > Decimal::ONE
                }
                SectionCap::Unlimited => false,
            };
            if negative {
                return Err(RuleTableError::Deduction(format!(
                    "section {} has an invalid cap",
                    rule.code
                )));
            }
        }

        for limit in &self.combined_limits {
            if limit.cap.is_sign_negative() {
                return Err(RuleTableError::Deduction(format!(
                    "combined limit {} is negative",
                    limit.name
                )));
            }
            if let Some(unknown) = limit
                .sections
                .iter()
                .find(|section| !seen.contains(&normalize_section_code(section)))
            {
                return Err(RuleTableError::Deduction(format!(
                    "combined limit {} references unknown section {unknown}",
                    limit.name
                )));
            }
        }

        Ok(())
    }
}

/// Canonical form used for section lookups: `80ccd(1b)` and `80CCD1B` compare equal.
pub fn normalize_section_code(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
