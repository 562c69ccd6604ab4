use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::profile::{AmountAttribute as Amount, CountAttribute, FlagAttribute as Flag};
use super::table::{
    Condition, DecisionTable, FormCatalog, FormDefinition, FormId, FormRule, StrongSignal,
};
use crate::rules::RuleTableError;

const FIFTY_LAKH: Decimal = dec!(5_000_000);

struct RuleDraft {
    id: &'static str,
    priority: u16,
    description: &'static str,
    condition: Condition,
    form: FormId,
    alternative_form: Option<FormId>,
    required_fields: &'static [&'static str],
    requires_ca_review: bool,
    estimated_minutes: u32,
    base_confidence: Decimal,
}

impl RuleDraft {
    fn build(self) -> FormRule {
        FormRule {
            id: self.id.to_string(),
            priority: self.priority,
            description: self.description.to_string(),
            condition: self.condition,
            form: self.form,
            alternative_form: self.alternative_form,
            required_fields: self.required_fields.iter().map(|f| f.to_string()).collect(),
            requires_ca_review: self.requires_ca_review,
            estimated_minutes: self.estimated_minutes,
            base_confidence: self.base_confidence,
            strong_signal: None,
            fallback: false,
        }
    }
}

fn with_signal(mut rule: FormRule, condition: Condition, boost: Decimal) -> FormRule {
    rule.strong_signal = Some(StrongSignal { condition, boost });
    rule
}

fn has_business() -> Condition {
    Condition::above(Amount::BusinessIncome, Decimal::ZERO)
}

fn has_capital_gains() -> Condition {
    Condition::any(vec![
        Condition::above(Amount::CapitalGains, Decimal::ZERO),
        // Long-term gains under 112A up to 1.25 lakh may still be reported on ITR-1/ITR-4.
        Condition::above(Amount::Ltcg112a, dec!(125_000)),
    ])
}

fn non_resident() -> Condition {
    Condition::any(vec![
        Condition::flag(Flag::NonResident),
        Condition::flag(Flag::NotOrdinarilyResident),
    ])
}

/// Signals that rule a taxpayer out of ITR-4 even with presumptive income.
fn presumptive_complications() -> Condition {
    Condition::any(vec![
        has_capital_gains(),
        non_resident(),
        Condition::flag(Flag::Director),
        Condition::flag(Flag::UnlistedEquity),
        Condition::flag(Flag::ForeignAssets),
        Condition::flag(Flag::ForeignIncome),
        Condition::flag(Flag::BroughtForwardLosses),
        Condition::flag(Flag::DeferredEsopTax),
        Condition::flag(Flag::VirtualDigitalAssets),
        Condition::above(Amount::TotalIncome, FIFTY_LAKH),
        Condition::above(Amount::AgriculturalIncome, dec!(5_000)),
        Condition::CountAbove {
            attribute: CountAttribute::HouseProperties,
            threshold: 1,
        },
    ])
}

/// The decision table shipped with the engine.
pub fn builtin_form_rules() -> Result<DecisionTable, RuleTableError> {
    let rules = vec![
        RuleDraft {
            id: "business_with_capital_gains",
            priority: 10,
            description: "business or professional income together with capital gains",
            condition: Condition::all(vec![has_business(), has_capital_gains()]),
            form: FormId::Itr3,
            alternative_form: None,
            required_fields: &["schedule_bp", "schedule_cg", "balance_sheet", "profit_and_loss"],
            requires_ca_review: true,
            estimated_minutes: 150,
            base_confidence: dec!(0.95),
        }
        .build(),
        with_signal(
            RuleDraft {
                id: "regular_business_income",
                priority: 20,
                description: "income from business or profession computed on books",
                condition: has_business(),
                form: FormId::Itr3,
                alternative_form: None,
                required_fields: &["schedule_bp", "balance_sheet", "profit_and_loss"],
                requires_ca_review: true,
                estimated_minutes: 120,
                base_confidence: dec!(0.9),
            }
            .build(),
            Condition::above(Amount::BusinessTurnover, dec!(10_000_000)),
            dec!(0.05),
        ),
        RuleDraft {
            id: "partner_in_firm",
            priority: 30,
            description: "partner in a firm",
            condition: Condition::flag(Flag::PartnerInFirm),
            form: FormId::Itr3,
            alternative_form: None,
            required_fields: &["partner_firm_details", "schedule_bp"],
            requires_ca_review: true,
            estimated_minutes: 90,
            base_confidence: dec!(0.9),
        }
        .build(),
        RuleDraft {
            id: "presumptive_with_complications",
            priority: 40,
            description: "presumptive income alongside items ITR-4 cannot report",
            condition: Condition::all(vec![
                Condition::above(Amount::PresumptiveIncome, Decimal::ZERO),
                presumptive_complications(),
            ]),
            form: FormId::Itr3,
            alternative_form: None,
            required_fields: &["schedule_bp", "schedule_44ad"],
            requires_ca_review: true,
            estimated_minutes: 100,
            base_confidence: dec!(0.9),
        }
        .build(),
        RuleDraft {
            id: "presumptive_business",
            priority: 50,
            description: "presumptive business or professional income (44AD/44ADA/44AE)",
            condition: Condition::all(vec![
                Condition::above(Amount::PresumptiveIncome, Decimal::ZERO),
                Condition::negate(has_business()),
                Condition::negate(presumptive_complications()),
            ]),
            form: FormId::Itr4,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["schedule_44ad", "gst_turnover"],
            requires_ca_review: false,
            estimated_minutes: 40,
            base_confidence: dec!(0.85),
        }
        .build(),
        RuleDraft {
            id: "non_resident",
            priority: 60,
            description: "non-resident or not ordinarily resident",
            condition: non_resident(),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["residential_status_details"],
            requires_ca_review: false,
            estimated_minutes: 60,
            base_confidence: dec!(0.9),
        }
        .build(),
        RuleDraft {
            id: "company_director",
            priority: 70,
            description: "director in a company",
            condition: Condition::flag(Flag::Director),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["director_details"],
            requires_ca_review: false,
            estimated_minutes: 60,
            base_confidence: dec!(0.9),
        }
        .build(),
        RuleDraft {
            id: "unlisted_equity",
            priority: 80,
            description: "holds unlisted equity shares",
            condition: Condition::flag(Flag::UnlistedEquity),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["unlisted_shares"],
            requires_ca_review: false,
            estimated_minutes: 60,
            base_confidence: dec!(0.9),
        }
        .build(),
        RuleDraft {
            id: "foreign_assets_or_income",
            priority: 90,
            description: "foreign assets or foreign-source income",
            condition: Condition::any(vec![
                Condition::flag(Flag::ForeignAssets),
                Condition::flag(Flag::ForeignIncome),
            ]),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["schedule_fa", "schedule_fsi", "schedule_tr"],
            requires_ca_review: true,
            estimated_minutes: 90,
            base_confidence: dec!(0.9),
        }
        .build(),
        with_signal(
            RuleDraft {
                id: "capital_gains",
                priority: 100,
                description: "capital gains beyond the ITR-1 allowance",
                condition: has_capital_gains(),
                form: FormId::Itr2,
                alternative_form: Some(FormId::Itr3),
                required_fields: &["schedule_cg"],
                requires_ca_review: false,
                estimated_minutes: 75,
                base_confidence: dec!(0.9),
            }
            .build(),
            Condition::above(Amount::CapitalGains, dec!(1_000_000)),
            dec!(0.05),
        ),
        RuleDraft {
            id: "multiple_house_properties",
            priority: 110,
            description: "more than one house property",
            condition: Condition::CountAbove {
                attribute: CountAttribute::HouseProperties,
                threshold: 1,
            },
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["schedule_hp"],
            requires_ca_review: false,
            estimated_minutes: 45,
            base_confidence: dec!(0.85),
        }
        .build(),
        RuleDraft {
            id: "high_total_income",
            priority: 120,
            description: "total income above 50 lakh",
            condition: Condition::above(Amount::TotalIncome, FIFTY_LAKH),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["schedule_al"],
            requires_ca_review: false,
            estimated_minutes: 60,
            base_confidence: dec!(0.85),
        }
        .build(),
        RuleDraft {
            id: "agricultural_income",
            priority: 130,
            description: "agricultural income above 5,000",
            condition: Condition::above(Amount::AgriculturalIncome, dec!(5_000)),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["schedule_ei"],
            requires_ca_review: false,
            estimated_minutes: 45,
            base_confidence: dec!(0.85),
        }
        .build(),
        RuleDraft {
            id: "virtual_digital_assets",
            priority: 140,
            description: "income from virtual digital assets",
            condition: Condition::flag(Flag::VirtualDigitalAssets),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["schedule_vda"],
            requires_ca_review: false,
            estimated_minutes: 60,
            base_confidence: dec!(0.9),
        }
        .build(),
        RuleDraft {
            id: "brought_forward_losses",
            priority: 150,
            description: "losses brought forward or to be carried forward",
            condition: Condition::flag(Flag::BroughtForwardLosses),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["schedule_cfl"],
            requires_ca_review: false,
            estimated_minutes: 45,
            base_confidence: dec!(0.8),
        }
        .build(),
        RuleDraft {
            id: "deferred_esop_tax",
            priority: 160,
            description: "tax on ESOPs deferred under an eligible start-up",
            condition: Condition::flag(Flag::DeferredEsopTax),
            form: FormId::Itr2,
            alternative_form: Some(FormId::Itr3),
            required_fields: &["esop_details"],
            requires_ca_review: false,
            estimated_minutes: 45,
            base_confidence: dec!(0.8),
        }
        .build(),
        FormRule {
            fallback: true,
            ..RuleDraft {
                id: "simple_resident_individual",
                priority: 1000,
                description: "resident with salary, one house property and other sources",
                condition: Condition::all(vec![
                    Condition::negate(non_resident()),
                    Condition::at_most(Amount::TotalIncome, FIFTY_LAKH),
                ]),
                form: FormId::Itr1,
                alternative_form: Some(FormId::Itr2),
                required_fields: &["schedule_salary"],
                requires_ca_review: false,
                estimated_minutes: 30,
                base_confidence: dec!(0.95),
            }
            .build()
        },
    ];

    DecisionTable::new(rules)
}

fn form(
    form: FormId,
    name: &str,
    fields: &[&str],
    base_minutes: u32,
    requires_ca_review: bool,
) -> (FormId, FormDefinition) {
    let definition = FormDefinition {
        form,
        name: name.to_string(),
        required_fields: fields.iter().map(|f| f.to_string()).collect(),
        base_minutes,
        requires_ca_review,
    };
    (form, definition)
}

const CORE_FIELDS: [&str; 5] = [
    "schedule_salary",
    "schedule_hp",
    "schedule_os",
    "schedule_via",
    "tax_payments",
];

pub fn builtin_form_catalog() -> FormCatalog {
    let with_core = |extra: &[&'static str]| -> Vec<&'static str> {
        CORE_FIELDS.iter().chain(extra.iter()).copied().collect()
    };
    let itr2_extra = [
        "schedule_cg",
        "schedule_fa",
        "schedule_fsi",
        "schedule_tr",
        "schedule_al",
        "schedule_cfl",
        "schedule_ei",
        "schedule_vda",
    ];
    let itr3_extra: Vec<&str> = itr2_extra
        .iter()
        .copied()
        .chain(["schedule_bp", "balance_sheet", "profit_and_loss"])
        .collect();

    let forms = BTreeMap::from([
        form(FormId::Itr1, "Sahaj", &with_core(&[]), 30, false),
        form(FormId::Itr2, "ITR-2", &with_core(&itr2_extra), 60, false),
        form(FormId::Itr3, "ITR-3", &with_core(&itr3_extra), 120, true),
        form(
            FormId::Itr4,
            "Sugam",
            &with_core(&["schedule_44ad", "gst_turnover"]),
            40,
            false,
        ),
    ]);

    let field_minutes = [
        ("schedule_salary", 10),
        ("schedule_hp", 10),
        ("schedule_os", 5),
        ("schedule_via", 10),
        ("tax_payments", 5),
        ("schedule_44ad", 15),
        ("gst_turnover", 5),
        ("schedule_cg", 30),
        ("schedule_fa", 25),
        ("schedule_fsi", 20),
        ("schedule_tr", 15),
        ("schedule_al", 20),
        ("schedule_cfl", 15),
        ("schedule_ei", 5),
        ("schedule_vda", 20),
        ("schedule_bp", 30),
        ("balance_sheet", 45),
        ("profit_and_loss", 40),
    ]
    .into_iter()
    .map(|(field, minutes)| (field.to_string(), minutes))
    .collect();

    FormCatalog {
        forms,
        field_minutes,
        default_field_minutes: 5,
    }
}
