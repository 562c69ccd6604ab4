use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::slab::compute_slab_tax;
use crate::rules::{RebateRule, RegimeRules, SlabTable};

/// Statutory adjustments layered on slab tax, in the order they are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustments {
    /// Total rebate, including any marginal relief granted above the threshold.
    pub rebate: Decimal,
    pub rebate_marginal_relief: Decimal,
    pub post_rebate_tax: Decimal,
    pub surcharge_rate: Decimal,
    /// Surcharge after marginal relief.
    pub surcharge: Decimal,
    pub surcharge_marginal_relief: Decimal,
    pub cess: Decimal,
    /// Unrounded `post_rebate_tax + surcharge + cess`.
    pub total: Decimal,
}

/// Rebate, then surcharge, then cess. The order is fixed: surcharge is levied on
/// post-rebate tax and cess on tax plus surcharge.
pub fn apply_adjustments(
    tax_before_cess: Decimal,
    taxable_income: Decimal,
    rules: &RegimeRules,
    slabs: &SlabTable,
    cess_rate: Decimal,
) -> Adjustments {
    let (rebate, rebate_marginal_relief) =
        rebate_for(tax_before_cess, taxable_income, &rules.rebate);
    let post_rebate_tax = (tax_before_cess - rebate).max(Decimal::ZERO);

    let (surcharge_rate, surcharge, surcharge_marginal_relief) =
        match rules.surcharge_band(taxable_income) {
            None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            Some(band) => {
                let full = post_rebate_tax * band.rate;
                let threshold = band.above;
                let rate_below = rules
                    .surcharge_band(threshold)
                    .map_or(Decimal::ZERO, |below| below.rate);
                let tax_at_threshold = post_rebate_tax_at(threshold, rules, slabs);

                // Tax plus surcharge may not exceed the liability at the threshold
                // by more than the income earned above it.
                let ceiling = tax_at_threshold * (Decimal::ONE + rate_below)
                    + (taxable_income - threshold);
                let excess = (post_rebate_tax + full - ceiling).max(Decimal::ZERO);
                let relief = excess.min(full);
                (band.rate, full - relief, relief)
            }
        };

    let cess = (post_rebate_tax + surcharge) * cess_rate;
    let total = post_rebate_tax + surcharge + cess;

    Adjustments {
        rebate,
        rebate_marginal_relief,
        post_rebate_tax,
        surcharge_rate,
        surcharge,
        surcharge_marginal_relief,
        cess,
        total,
    }
}

/// Returns `(rebate, marginal relief included in it)`.
fn rebate_for(tax: Decimal, taxable_income: Decimal, rule: &RebateRule) -> (Decimal, Decimal) {
    if taxable_income <= rule.threshold {
        return (tax.min(rule.cap), Decimal::ZERO);
    }

    if rule.marginal_relief && !rule.cap.is_zero() {
        let excess_income = taxable_income - rule.threshold;
        let relief = (tax - excess_income).max(Decimal::ZERO);
        return (relief, relief);
    }

    (Decimal::ZERO, Decimal::ZERO)
}

fn post_rebate_tax_at(taxable_income: Decimal, rules: &RegimeRules, slabs: &SlabTable) -> Decimal {
    let tax = compute_slab_tax(taxable_income, slabs).tax;
    let (rebate, _) = rebate_for(tax, taxable_income, &rules.rebate);
    (tax - rebate).max(Decimal::ZERO)
}
