use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::income::IncomeBreakdown;
use crate::error::EngineError;
use crate::rules::{
    normalize_section_code, AgeCategory, DeductionTable, IncomeBase, RegimeRules, SectionCap,
    SectionRule,
};

/// Amount claimed by the taxpayer under one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionClaim {
    pub section: String,
    pub claimed: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DeductionClaim {
    pub fn new(section: impl Into<String>, claimed: Decimal) -> Self {
        Self {
            section: section.into(),
            claimed,
            description: None,
        }
    }
}

/// Why a claim was allowed at less than the amount claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimLimit {
    SectionCap,
    CombinedLimit { name: String },
    NotPermittedUnderRegime,
    AgeRestricted,
}

/// Allocation of a single claim, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub section: String,
    pub claimed: Decimal,
    pub section_cap: Option<Decimal>,
    pub eligible: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limited_by: Option<ClaimLimit>,
}

/// Non-blocking observations attached to a resolved deduction set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeductionWarning {
    ExceedsIncomeShare {
        total_eligible: Decimal,
        gross_total_income: Decimal,
        ratio: Decimal,
    },
}

impl DeductionWarning {
    pub fn message(&self) -> String {
        match self {
            DeductionWarning::ExceedsIncomeShare {
                total_eligible,
                gross_total_income,
                ratio,
            } => format!(
                "eligible deductions {total_eligible} exceed {}% of gross income {gross_total_income}",
                (ratio * dec!(100)).normalize()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSummary {
    pub lines: Vec<DeductionLine>,
    pub total_claimed: Decimal,
    pub total_eligible: Decimal,
    pub warnings: Vec<DeductionWarning>,
}

/// Share of gross income above which a large deduction total is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionPolicy {
    pub warning_ratio: Decimal,
}

impl Default for DeductionPolicy {
    fn default() -> Self {
        Self {
            warning_ratio: dec!(0.30),
        }
    }
}

/// Allocates claims against section caps and combined limits, in input order.
pub fn resolve(
    claims: &[DeductionClaim],
    income: &IncomeBreakdown,
    age: AgeCategory,
    table: &DeductionTable,
    regime: &RegimeRules,
    policy: &DeductionPolicy,
) -> Result<DeductionSummary, EngineError> {
    let mut matched = Vec::with_capacity(claims.len());
    for (index, claim) in claims.iter().enumerate() {
        let rule = table
            .section(&claim.section)
            .ok_or_else(|| EngineError::UnknownSection {
                code: claim.section.clone(),
            })?;
        if claim.claimed.is_sign_negative() && !claim.claimed.is_zero() {
            return Err(EngineError::negative(format!(
                "deductions[{index}].claimed ({})",
                rule.code
            )));
        }
        matched.push((claim, rule));
    }

    let mut used_by_section: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut used_by_limit: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut lines = Vec::with_capacity(matched.len());

    for (claim, rule) in matched {
        let section_cap = section_cap(rule, age, income);
        let (eligible, limited_by) = if !regime.permits(&rule.code) {
            (Decimal::ZERO, Some(ClaimLimit::NotPermittedUnderRegime))
        } else if rule
            .age_restriction
            .map_or(false, |restriction| !restriction.admits(age))
        {
            (Decimal::ZERO, Some(ClaimLimit::AgeRestricted))
        } else {
            let key = normalize_section_code(&rule.code);
            let mut eligible = claim.claimed;
            let mut limited_by = None;

            if let Some(cap) = section_cap {
                let used = used_by_section.get(&key).copied().unwrap_or_default();
                let remaining = (cap - used).max(Decimal::ZERO);
                if remaining < eligible {
                    eligible = remaining;
                    limited_by = Some(ClaimLimit::SectionCap);
                }
            }

            for limit in table.limits_for(&rule.code) {
                let used = used_by_limit
                    .get(limit.name.as_str())
                    .copied()
                    .unwrap_or_default();
                let remaining = (limit.cap - used).max(Decimal::ZERO);
                if remaining < eligible {
                    eligible = remaining;
                    limited_by = Some(ClaimLimit::CombinedLimit {
                        name: limit.name.clone(),
                    });
                }
            }

            *used_by_section.entry(key).or_insert(Decimal::ZERO) += eligible;
            for limit in table.limits_for(&rule.code) {
                *used_by_limit
                    .entry(limit.name.as_str())
                    .or_insert(Decimal::ZERO) += eligible;
            }
            (eligible, limited_by)
        };

        lines.push(DeductionLine {
            section: rule.code.clone(),
            claimed: claim.claimed,
            section_cap,
            eligible,
            limited_by,
        });
    }

    let total_claimed: Decimal = lines.iter().map(|line| line.claimed).sum();
    let total_eligible: Decimal = lines.iter().map(|line| line.eligible).sum();

    let mut warnings = Vec::new();
    let threshold = income.gross_total_income * policy.warning_ratio;
    if total_eligible > threshold {
        warnings.push(DeductionWarning::ExceedsIncomeShare {
            total_eligible,
            gross_total_income: income.gross_total_income,
            ratio: policy.warning_ratio,
        });
    }

    Ok(DeductionSummary {
        lines,
        total_claimed,
        total_eligible,
        warnings,
    })
}

/// Resolved ceiling for a section; `None` means unlimited.
pub fn section_cap(
    rule: &SectionRule,
    age: AgeCategory,
    income: &IncomeBreakdown,
) -> Option<Decimal> {
    match &rule.cap {
        SectionCap::Fixed { amount } => Some(*amount),
        SectionCap::ByAge { general, senior } => Some(if age.is_senior() {
            *senior
        } else {
            *general
        }),
        SectionCap::ShareOfIncome { base, rate } => {
            let base_amount = match base {
                IncomeBase::GrossTotal => income.gross_total_income,
                IncomeBase::Category(category) => income.amount(*category),
            };
            Some(base_amount * rate)
        }
        SectionCap::Unlimited => None,
    }
}
