use rust_decimal::Decimal;

use super::adjustments::apply_adjustments;
use super::deductions::{resolve, DeductionPolicy};
use super::income::{aggregate, IncomeBreakdown, IncomeCategory};
use super::slab::compute_slab_tax;
use super::{round_to_unit, RegimeComparison, TaxComputationRequest, TaxComputationResult};
use crate::error::EngineError;
use crate::rules::{Regime, TaxRuleSet};

/// Runs both regimes on the same declared figures and recommends the cheaper one.
pub fn compare_regimes(
    request: &TaxComputationRequest,
    rule_set: &TaxRuleSet,
    policy: &DeductionPolicy,
) -> Result<RegimeComparison, EngineError> {
    let income = validated_income(request)?;
    let old = compute_with_income(request, &income, rule_set, Regime::Old, policy)?;
    let new = compute_with_income(request, &income, rule_set, Regime::New, policy)?;

    let recommended_regime = if old.total_tax_liability < new.total_tax_liability {
        Regime::Old
    } else if new.total_tax_liability < old.total_tax_liability {
        Regime::New
    } else {
        request.selected_regime.unwrap_or(Regime::New)
    };
    let savings = (old.total_tax_liability - new.total_tax_liability).abs();

    Ok(RegimeComparison {
        assessment_year: rule_set.assessment_year,
        old,
        new,
        recommended_regime,
        savings,
    })
}

/// Computes liability under a single regime.
pub fn compute_regime(
    request: &TaxComputationRequest,
    rule_set: &TaxRuleSet,
    regime: Regime,
    policy: &DeductionPolicy,
) -> Result<TaxComputationResult, EngineError> {
    let income = validated_income(request)?;
    compute_with_income(request, &income, rule_set, regime, policy)
}

fn validated_income(request: &TaxComputationRequest) -> Result<IncomeBreakdown, EngineError> {
    if request.taxes_already_paid.is_sign_negative() && !request.taxes_already_paid.is_zero() {
        return Err(EngineError::negative("taxes_already_paid"));
    }
    aggregate(&request.income)
}

fn compute_with_income(
    request: &TaxComputationRequest,
    income: &IncomeBreakdown,
    rule_set: &TaxRuleSet,
    regime: Regime,
    policy: &DeductionPolicy,
) -> Result<TaxComputationResult, EngineError> {
    let rules = rule_set.regime(regime);
    let age = request.age_category;

    let deductions = resolve(
        &request.deductions,
        income,
        age,
        &rule_set.deductions,
        rules,
        policy,
    )?;
    let standard_deduction = income
        .amount(IncomeCategory::Salary)
        .min(rules.standard_deduction);
    let total_deductions = standard_deduction + deductions.total_eligible;
    let taxable_income = (income.gross_total_income - total_deductions).max(Decimal::ZERO);

    let slabs = rules.slabs.for_age(age);
    let slab_tax = compute_slab_tax(taxable_income, slabs);
    let adjustments = apply_adjustments(
        slab_tax.tax,
        taxable_income,
        rules,
        slabs,
        rule_set.cess_rate,
    );

    let total_tax_liability = round_to_unit(adjustments.total);
    let refund_or_due = request.taxes_already_paid - total_tax_liability;

    Ok(TaxComputationResult {
        regime,
        assessment_year: rule_set.assessment_year,
        age_category: age,
        income: income.by_category.clone(),
        gross_total_income: income.gross_total_income,
        standard_deduction,
        deductions,
        total_deductions,
        taxable_income,
        per_slab_breakdown: slab_tax.lines,
        tax_before_cess: slab_tax.tax,
        rebate: adjustments.rebate,
        rebate_marginal_relief: adjustments.rebate_marginal_relief,
        surcharge_rate: adjustments.surcharge_rate,
        surcharge: adjustments.surcharge,
        surcharge_marginal_relief: adjustments.surcharge_marginal_relief,
        cess: adjustments.cess,
        total_tax_liability,
        taxes_already_paid: request.taxes_already_paid,
        refund_or_due,
    })
}
