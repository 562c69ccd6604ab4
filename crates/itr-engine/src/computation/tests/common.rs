use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::computation::{
    aggregate, DeductionClaim, DeductionPolicy, IncomeBreakdown, IncomeCategory, IncomeProfile,
    TaxComputationRequest,
};
use crate::rules::{rule_set_2024_25, AgeCategory, AssessmentYear, TaxRuleSet};

pub(super) fn rule_set() -> TaxRuleSet {
    rule_set_2024_25()
}

pub(super) fn policy() -> DeductionPolicy {
    DeductionPolicy::default()
}

pub(super) fn salary_income(amount: Decimal) -> IncomeBreakdown {
    aggregate(&IncomeProfile::new().with(IncomeCategory::Salary, amount)).expect("valid income")
}

pub(super) fn salaried_request(
    salary: Decimal,
    deductions: Vec<DeductionClaim>,
) -> TaxComputationRequest {
    TaxComputationRequest {
        income: IncomeProfile::new().with(IncomeCategory::Salary, salary),
        deductions,
        age_category: AgeCategory::General,
        taxes_already_paid: Decimal::ZERO,
        assessment_year: Some(AssessmentYear::new(2024)),
        selected_regime: None,
    }
}

/// Gross salary of 15 lakh with 2.5 lakh of chapter VI-A claims; the standard
/// deduction brings old-regime deductions to 3 lakh.
pub(super) fn fifteen_lakh_request() -> TaxComputationRequest {
    salaried_request(
        dec!(1500000),
        vec![
            DeductionClaim::new("80C", dec!(150000)),
            DeductionClaim::new("80D", dec!(25000)),
            DeductionClaim::new("80CCD(1B)", dec!(50000)),
            DeductionClaim::new("24(b)", dec!(25000)),
        ],
    )
}
