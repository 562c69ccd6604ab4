use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::rules::{
    Check, Comparison, Expression, Operand, Severity, ValidationRule, ValidationRuleSet,
};

pub const CORE_RULE_SET_ID: &str = "itr-core";

fn rule(id: &str, scope: &str, severity: Severity, check: Check, message: &str) -> ValidationRule {
    ValidationRule {
        id: id.to_string(),
        scope: scope.to_string(),
        severity,
        check,
        message: message.to_string(),
    }
}

fn range(field: &str, min: Option<Decimal>, max: Option<Decimal>) -> Check {
    Check::Range {
        field: field.to_string(),
        min,
        max,
    }
}

fn field(name: &str) -> Operand {
    Operand::field(name)
}

/// Consistency checks for an individual return, shared across assessment years.
pub fn core_rule_set() -> ValidationRuleSet {
    let rules = vec![
        rule(
            "salary.gross_non_negative",
            "salary",
            Severity::Error,
            range("gross_salary", Some(Decimal::ZERO), None),
            "gross salary must not be negative (found {actual})",
        ),
        rule(
            "salary.standard_deduction_cap",
            "salary",
            Severity::Error,
            range("standard_deduction", Some(Decimal::ZERO), Some(dec!(75000))),
            "standard deduction of {actual} is outside the allowed {expected}",
        ),
        rule(
            "salary.professional_tax_cap",
            "salary",
            Severity::Error,
            range("professional_tax", Some(Decimal::ZERO), Some(dec!(2500))),
            "professional tax of {actual} exceeds the statutory {max}",
        ),
        rule(
            "salary.net_salary",
            "salary",
            Severity::Error,
            Check::DerivedValue {
                field: "net_salary".to_string(),
                expression: Expression::difference(
                    vec![field("gross_salary")],
                    vec![field("standard_deduction"), field("professional_tax")],
                ),
                tolerance: Decimal::ONE,
            },
            "net salary {actual} does not match gross less deductions ({expected})",
        ),
        rule(
            "house_property.net_annual_value",
            "house_property",
            Severity::Error,
            Check::DerivedValue {
                field: "net_annual_value".to_string(),
                expression: Expression::difference(
                    vec![field("gross_annual_value")],
                    vec![field("municipal_taxes")],
                ),
                tolerance: Decimal::ONE,
            },
            "net annual value {actual} should be {expected}",
        ),
        rule(
            "house_property.self_occupied_interest_cap",
            "house_property",
            Severity::Warning,
            range("interest_on_loan", Some(Decimal::ZERO), Some(dec!(200000))),
            "interest on housing loan {actual} exceeds the self-occupied limit of {max}",
        ),
        rule(
            "deductions.section_80c_cap",
            "deductions",
            Severity::Error,
            range("section_80c", Some(Decimal::ZERO), Some(dec!(150000))),
            "section 80C claim {actual} exceeds {max}",
        ),
        rule(
            "deductions.section_80d_cap",
            "deductions",
            Severity::Warning,
            range("section_80d", Some(Decimal::ZERO), Some(dec!(100000))),
            "section 80D claim {actual} exceeds the highest family limit of {max}",
        ),
        rule(
            "capital_gains.gain_computation",
            "capital_gains",
            Severity::Error,
            Check::DerivedValue {
                field: "gain".to_string(),
                expression: Expression::difference(
                    vec![field("sale_consideration")],
                    vec![field("cost_of_acquisition"), field("transfer_expenses")],
                ),
                tolerance: Decimal::ONE,
            },
            "capital gain {actual} does not match sale less cost and expenses ({expected})",
        ),
        rule(
            "business.gross_profit_within_turnover",
            "business",
            Severity::Error,
            Check::CrossField {
                left: Expression::of(field("gross_profit")),
                comparison: Comparison::Le,
                right: Expression::of(field("turnover")),
            },
            "gross profit {left} cannot exceed turnover {right}",
        ),
        rule(
            "business.presumptive_turnover_limit",
            "business",
            Severity::Info,
            range("turnover", None, Some(dec!(20000000))),
            "turnover {actual} is above {max}; presumptive taxation may not apply",
        ),
        rule(
            "summary.deductions_within_income",
            "summary",
            Severity::Error,
            Check::CrossField {
                left: Expression::of(field("total_deductions")),
                comparison: Comparison::Le,
                right: Expression::of(field("gross_total_income")),
            },
            "total deductions {left} exceed gross total income {right}",
        ),
        rule(
            "summary.deduction_share",
            "summary",
            Severity::Warning,
            Check::CrossField {
                left: Expression::of(field("total_deductions")),
                comparison: Comparison::Le,
                right: Expression::of(Operand::Scaled {
                    field: "gross_total_income".to_string(),
                    factor: dec!(0.3),
                }),
            },
            "total deductions {left} are more than 30% of gross total income; expected {expected}",
        ),
        rule(
            "summary.taxable_income",
            "summary",
            Severity::Error,
            Check::DerivedValue {
                field: "taxable_income".to_string(),
                expression: Expression::difference(
                    vec![field("gross_total_income")],
                    vec![field("total_deductions")],
                ),
                tolerance: Decimal::ONE,
            },
            "taxable income {actual} should be {expected}",
        ),
        rule(
            "summary.tds_within_income",
            "summary",
            Severity::Warning,
            Check::CrossField {
                left: Expression::of(field("tds_claimed")),
                comparison: Comparison::Le,
                right: Expression::of(field("gross_total_income")),
            },
            "TDS claimed {left} exceeds gross total income {right}",
        ),
    ];

    ValidationRuleSet {
        id: CORE_RULE_SET_ID.to_string(),
        description: "arithmetic and statutory-limit checks for individual returns".to_string(),
        assessment_year: None,
        rules,
    }
}

pub fn builtin_validation_rule_sets() -> Vec<ValidationRuleSet> {
    vec![core_rule_set()]
}
