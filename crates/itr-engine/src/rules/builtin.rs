//! Statutory tables shipped with the engine (Income-tax Act, 1961 as amended by the
//! Finance Acts for each year). Overrides loaded from disk replace these per year.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::deductions::{
    AgeRestriction, CombinedLimit, DeductionTable, IncomeBase, SectionCap, SectionRule,
};
use super::{
    AgeSlabs, AssessmentYear, RebateRule, RegimeRules, SlabTable, SurchargeBand, TaxRuleSet,
    TaxSlab,
};
use crate::computation::IncomeCategory;

const CESS_RATE: Decimal = dec!(0.04);

pub fn builtin_rule_sets() -> Vec<TaxRuleSet> {
    vec![rule_set_2024_25(), rule_set_2025_26(), rule_set_2026_27()]
}

pub fn rule_set_2024_25() -> TaxRuleSet {
    TaxRuleSet {
        assessment_year: AssessmentYear::new(2024),
        cess_rate: CESS_RATE,
        old: old_regime(),
        new: new_regime(
            slabs(&[
                (dec!(0), dec!(0)),
                (dec!(300000), dec!(0.05)),
                (dec!(600000), dec!(0.10)),
                (dec!(900000), dec!(0.15)),
                (dec!(1200000), dec!(0.20)),
                (dec!(1500000), dec!(0.30)),
            ]),
            rebate(dec!(700000), dec!(25000)),
            dec!(50000),
        ),
        deductions: deduction_table(),
    }
}

pub fn rule_set_2025_26() -> TaxRuleSet {
    TaxRuleSet {
        assessment_year: AssessmentYear::new(2025),
        cess_rate: CESS_RATE,
        old: old_regime(),
        new: new_regime(
            slabs(&[
                (dec!(0), dec!(0)),
                (dec!(300000), dec!(0.05)),
                (dec!(700000), dec!(0.10)),
                (dec!(1000000), dec!(0.15)),
                (dec!(1200000), dec!(0.20)),
                (dec!(1500000), dec!(0.30)),
            ]),
            rebate(dec!(700000), dec!(25000)),
            dec!(75000),
        ),
        deductions: deduction_table(),
    }
}

pub fn rule_set_2026_27() -> TaxRuleSet {
    TaxRuleSet {
        assessment_year: AssessmentYear::new(2026),
        cess_rate: CESS_RATE,
        old: old_regime(),
        new: new_regime(
            slabs(&[
                (dec!(0), dec!(0)),
                (dec!(400000), dec!(0.05)),
                (dec!(800000), dec!(0.10)),
                (dec!(1200000), dec!(0.15)),
                (dec!(1600000), dec!(0.20)),
                (dec!(2000000), dec!(0.25)),
                (dec!(2400000), dec!(0.30)),
            ]),
            rebate(dec!(1200000), dec!(60000)),
            dec!(75000),
        ),
        deductions: deduction_table(),
    }
}

/// Builds a contiguous table from `(lower bound, rate)` pairs; the last slab is unbounded.
fn slabs(bounds: &[(Decimal, Decimal)]) -> SlabTable {
    let table = bounds
        .iter()
        .enumerate()
        .map(|(index, (from, rate))| {
            let to = bounds.get(index + 1).map(|(next_from, _)| *next_from);
            TaxSlab::new(*from, to, *rate)
        })
        .collect();
    SlabTable::new(table)
}

fn rebate(threshold: Decimal, cap: Decimal) -> RebateRule {
    RebateRule {
        threshold,
        cap,
        marginal_relief: true,
    }
}

fn old_regime() -> RegimeRules {
    RegimeRules {
        slabs: AgeSlabs {
            general: slabs(&[
                (dec!(0), dec!(0)),
                (dec!(250000), dec!(0.05)),
                (dec!(500000), dec!(0.20)),
                (dec!(1000000), dec!(0.30)),
            ]),
            senior: Some(slabs(&[
                (dec!(0), dec!(0)),
                (dec!(300000), dec!(0.05)),
                (dec!(500000), dec!(0.20)),
                (dec!(1000000), dec!(0.30)),
            ])),
            super_senior: Some(slabs(&[
                (dec!(0), dec!(0)),
                (dec!(500000), dec!(0.20)),
                (dec!(1000000), dec!(0.30)),
            ])),
        },
        rebate: rebate(dec!(500000), dec!(12500)),
        standard_deduction: dec!(50000),
        surcharge: surcharge_bands(&[
            (dec!(5000000), dec!(0.10)),
            (dec!(10000000), dec!(0.15)),
            (dec!(20000000), dec!(0.25)),
            (dec!(50000000), dec!(0.37)),
        ]),
        permitted_sections: None,
    }
}

/// The new regime caps surcharge at 25% and permits only employer-side contributions.
fn new_regime(table: SlabTable, rebate: RebateRule, standard_deduction: Decimal) -> RegimeRules {
    let permitted: BTreeSet<String> = ["80CCD(2)", "80CCH"]
        .into_iter()
        .map(str::to_string)
        .collect();

    RegimeRules {
        slabs: AgeSlabs::uniform(table),
        rebate,
        standard_deduction,
        surcharge: surcharge_bands(&[
            (dec!(5000000), dec!(0.10)),
            (dec!(10000000), dec!(0.15)),
            (dec!(20000000), dec!(0.25)),
        ]),
        permitted_sections: Some(permitted),
    }
}

fn surcharge_bands(bands: &[(Decimal, Decimal)]) -> Vec<SurchargeBand> {
    bands
        .iter()
        .enumerate()
        .map(|(index, (above, rate))| SurchargeBand {
            above: *above,
            up_to: bands.get(index + 1).map(|(next, _)| *next),
            rate: *rate,
        })
        .collect()
}

fn section(code: &str, description: &str, cap: SectionCap) -> SectionRule {
    SectionRule {
        code: code.to_string(),
        description: description.to_string(),
        cap,
        age_restriction: None,
    }
}

fn fixed(amount: Decimal) -> SectionCap {
    SectionCap::Fixed { amount }
}

fn deduction_table() -> DeductionTable {
    let salary_share = |rate| SectionCap::ShareOfIncome {
        base: IncomeBase::Category(IncomeCategory::Salary),
        rate,
    };

    let mut savings_interest = section(
        "80TTA",
        "Interest on savings accounts",
        fixed(dec!(10000)),
    );
    savings_interest.age_restriction = Some(AgeRestriction::NonSeniorOnly);
    let mut senior_interest = section(
        "80TTB",
        "Interest on deposits (senior citizens)",
        fixed(dec!(50000)),
    );
    senior_interest.age_restriction = Some(AgeRestriction::SeniorOnly);

    DeductionTable {
        sections: vec![
            section(
                "80C",
                "Life insurance, PPF, ELSS and other specified savings",
                fixed(dec!(150000)),
            ),
            section("80CCC", "Contribution to pension funds", fixed(dec!(150000))),
            section("80CCD(1)", "Employee contribution to NPS", salary_share(dec!(0.10))),
            section("80CCD(1B)", "Additional contribution to NPS", fixed(dec!(50000))),
            section("80CCD(2)", "Employer contribution to NPS", salary_share(dec!(0.10))),
            section("80CCH", "Contribution to Agnipath scheme", SectionCap::Unlimited),
            section(
                "80D",
                "Health insurance premium",
                SectionCap::ByAge {
                    general: dec!(25000),
                    senior: dec!(50000),
                },
            ),
            section(
                "80DD",
                "Maintenance of a dependant with disability",
                fixed(dec!(75000)),
            ),
            section(
                "80DDB",
                "Treatment of specified diseases",
                SectionCap::ByAge {
                    general: dec!(40000),
                    senior: dec!(100000),
                },
            ),
            section("80E", "Interest on education loan", SectionCap::Unlimited),
            section(
                "80EEA",
                "Interest on loan for affordable housing",
                fixed(dec!(150000)),
            ),
            section(
                "80G",
                "Donations to approved funds and charities",
                SectionCap::ShareOfIncome {
                    base: IncomeBase::GrossTotal,
                    rate: dec!(0.10),
                },
            ),
            section("80GG", "Rent paid without house rent allowance", fixed(dec!(60000))),
            savings_interest,
            senior_interest,
            section("80U", "Taxpayer with disability", fixed(dec!(75000))),
            section(
                "24(b)",
                "Interest on loan for self-occupied property",
                fixed(dec!(200000)),
            ),
        ],
        combined_limits: vec![CombinedLimit {
            name: "80C + 80CCC + 80CCD(1)".to_string(),
            sections: ["80C", "80CCC", "80CCD(1)"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            cap: dec!(150000),
        }],
    }
}
