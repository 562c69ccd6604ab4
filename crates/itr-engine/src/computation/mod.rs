//! Liability computation: income aggregation, deduction resolution, slab tax,
//! rebate/surcharge/cess and the regime comparison built on top of them.
//!
//! Every function here is pure. Amounts stay exact `Decimal`s until the final
//! liability, which is rounded once, half-up, to a whole currency unit.

mod adjustments;
mod deductions;
mod income;
mod regime;
mod slab;

#[cfg(test)]
mod tests;

pub use adjustments::{apply_adjustments, Adjustments};
pub use deductions::{
    resolve, section_cap, ClaimLimit, DeductionClaim, DeductionLine, DeductionPolicy,
    DeductionSummary, DeductionWarning,
};
pub use income::{aggregate, IncomeBreakdown, IncomeCategory, IncomeProfile};
pub use regime::{compare_regimes, compute_regime};
pub use slab::{compute_slab_tax, SlabComputation, SlabLine};

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::rules::{AgeCategory, AssessmentYear, Regime};

/// Input to a liability computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationRequest {
    pub income: IncomeProfile,
    #[serde(default)]
    pub deductions: Vec<DeductionClaim>,
    pub age_category: AgeCategory,
    #[serde(default)]
    pub taxes_already_paid: Decimal,
    /// Falls back to the engine's default year when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_year: Option<AssessmentYear>,
    /// Regime the taxpayer has already opted for; breaks ties in the comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_regime: Option<Regime>,
}

/// Line-by-line liability under one regime.
///
/// `total_tax_liability` equals `max(0, tax_before_cess - rebate) + surcharge + cess`
/// rounded half-up to a whole unit; the components are exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    pub regime: Regime,
    pub assessment_year: AssessmentYear,
    pub age_category: AgeCategory,
    pub income: BTreeMap<IncomeCategory, Decimal>,
    pub gross_total_income: Decimal,
    pub standard_deduction: Decimal,
    pub deductions: DeductionSummary,
    pub total_deductions: Decimal,
    pub taxable_income: Decimal,
    pub per_slab_breakdown: Vec<SlabLine>,
    pub tax_before_cess: Decimal,
    pub rebate: Decimal,
    pub rebate_marginal_relief: Decimal,
    pub surcharge_rate: Decimal,
    pub surcharge: Decimal,
    pub surcharge_marginal_relief: Decimal,
    pub cess: Decimal,
    pub total_tax_liability: Decimal,
    pub taxes_already_paid: Decimal,
    /// Positive: refund owed to the taxpayer. Negative: tax still due.
    pub refund_or_due: Decimal,
}

impl TaxComputationResult {
    pub fn post_rebate_tax(&self) -> Decimal {
        (self.tax_before_cess - self.rebate).max(Decimal::ZERO)
    }

    pub fn is_refund(&self) -> bool {
        self.refund_or_due > Decimal::ZERO
    }
}

/// Both regimes computed on identical declarations, plus the recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeComparison {
    pub assessment_year: AssessmentYear,
    pub old: TaxComputationResult,
    pub new: TaxComputationResult,
    pub recommended_regime: Regime,
    pub savings: Decimal,
}

impl RegimeComparison {
    pub fn result(&self, regime: Regime) -> &TaxComputationResult {
        match regime {
            Regime::Old => &self.old,
            Regime::New => &self.new,
        }
    }

    pub fn recommended(&self) -> &TaxComputationResult {
        self.result(self.recommended_regime)
    }
}

/// Half-up rounding to whole currency units; liabilities are never negative here.
pub fn round_to_unit(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
