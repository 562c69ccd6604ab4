use rust_decimal_macros::dec;

use crate::validation::{core_rule_set, numeric_record, RecordSet, ValidationRuleSet};

pub(super) fn rule_set() -> ValidationRuleSet {
    core_rule_set()
}

/// A return whose figures are internally consistent.
pub(super) fn consistent_records() -> RecordSet {
    RecordSet::new()
        .with(
            "salary",
            numeric_record([
                ("gross_salary", dec!(1200000)),
                ("standard_deduction", dec!(50000)),
                ("professional_tax", dec!(2500)),
                ("net_salary", dec!(1147500)),
            ]),
        )
        .with(
            "deductions",
            numeric_record([("section_80c", dec!(150000)), ("section_80d", dec!(25000))]),
        )
        .with(
            "summary",
            numeric_record([
                ("gross_total_income", dec!(1147500)),
                ("total_deductions", dec!(175000)),
                ("taxable_income", dec!(972500)),
                ("tds_claimed", dec!(90000)),
            ]),
        )
}
