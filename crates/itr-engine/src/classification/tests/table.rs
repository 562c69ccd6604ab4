use rust_decimal_macros::dec;

use super::common::*;
use crate::classification::{
    AmountAttribute, Condition, DecisionTable, FlagAttribute, FormClassifier, FormId, FormRule,
    ProfileAttributes, ScoringPolicy,
};
use crate::rules::RuleTableError;

fn rule(id: &str, form: FormId) -> FormRule {
    FormRule {
        id: id.to_string(),
        priority: 10,
        description: id.to_string(),
        condition: Condition::flag(FlagAttribute::Director),
        form,
        alternative_form: None,
        required_fields: Vec::new(),
        requires_ca_review: false,
        estimated_minutes: 30,
        base_confidence: dec!(0.9),
        strong_signal: None,
        fallback: false,
    }
}

#[test]
fn conditions_treat_absent_fields_as_not_present() {
    let empty = ProfileAttributes::default();

    assert!(!Condition::flag(FlagAttribute::Director).evaluate(&empty));
    assert!(!Condition::above(AmountAttribute::SalaryIncome, dec!(0)).evaluate(&empty));
    assert!(Condition::at_most(AmountAttribute::TotalIncome, dec!(0)).evaluate(&empty));
    assert!(Condition::negate(Condition::flag(FlagAttribute::NonResident)).evaluate(&empty));
}

#[test]
fn composite_conditions_combine() {
    let profile = business_with_gains_profile();
    let business = Condition::above(AmountAttribute::BusinessIncome, dec!(0));
    let director = Condition::flag(FlagAttribute::Director);

    assert!(Condition::any(vec![business.clone(), director.clone()]).evaluate(&profile));
    assert!(!Condition::all(vec![business.clone(), director]).evaluate(&profile));
    assert!(Condition::all(vec![]).evaluate(&profile));
    assert!(!Condition::any(vec![]).evaluate(&profile));
}

#[test]
fn conditions_load_from_json() {
    let json = r#"{
        "kind": "all",
        "conditions": [
            {"kind": "amount_above", "attribute": "capital_gains", "threshold": "0"},
            {"kind": "not", "condition": {"kind": "flag", "flag": "non_resident"}}
        ]
    }"#;

    let condition: Condition = serde_json::from_str(json).expect("condition parses");

    assert!(condition.evaluate(&business_with_gains_profile()));
    assert!(!condition.evaluate(&salaried_profile()));
}

#[test]
fn rules_are_ordered_by_priority() {
    let mut late = rule("late", FormId::Itr2);
    late.priority = 50;
    let early = rule("early", FormId::Itr3);

    let table = DecisionTable::new(vec![late, early]).expect("valid table");
    let ids: Vec<&str> = table.rules().iter().map(|r| r.id.as_str()).collect();

    assert_eq!(ids, vec!["early", "late"]);
}

#[test]
fn duplicate_rule_ids_are_rejected() {
    let err = DecisionTable::new(vec![rule("same", FormId::Itr2), rule("same", FormId::Itr3)])
        .expect_err("duplicate ids");

    assert!(matches!(err, RuleTableError::FormRules(message) if message.contains("same")));
}

#[test]
fn confidence_outside_unit_interval_is_rejected() {
    let mut bad = rule("bad", FormId::Itr2);
    bad.base_confidence = dec!(1.2);

    assert!(DecisionTable::new(vec![bad]).is_err());
}

#[test]
fn only_one_fallback_rule_is_allowed() {
    let mut first = rule("first", FormId::Itr1);
    first.fallback = true;
    let mut second = rule("second", FormId::Itr1);
    second.fallback = true;

    assert!(DecisionTable::new(vec![first, second]).is_err());
}

#[test]
fn classifier_rejects_rules_for_forms_it_cannot_describe() {
    let mut forms = classifier().forms;
    forms.forms.remove(&FormId::Itr4);
    let table = DecisionTable::new(vec![rule("itr4", FormId::Itr4)]).expect("valid table");

    let err = FormClassifier::new(table, forms, ScoringPolicy::default()).expect_err("no ITR-4");

    assert!(err.to_string().contains("ITR-4"));
}

#[test]
fn confidence_is_clamped_to_one() {
    let mut generous = rule("generous", FormId::Itr2);
    generous.base_confidence = dec!(1);
    generous.strong_signal = Some(crate::classification::StrongSignal {
        condition: Condition::flag(FlagAttribute::Director),
        boost: dec!(0.2),
    });
    let table = DecisionTable::new(vec![generous]).expect("valid table");
    let classifier =
        FormClassifier::new(table, classifier().forms, ScoringPolicy::default()).expect("valid");
    let profile = ProfileAttributes {
        is_director: Some(true),
        ..ProfileAttributes::default()
    };

    assert_eq!(classifier.classify(&profile, None).confidence, dec!(1));
}

#[test]
fn form_ids_parse_loosely_and_serialize_canonically() {
    assert_eq!("ITR-3".parse::<FormId>().expect("parses"), FormId::Itr3);
    assert_eq!("itr4".parse::<FormId>().expect("parses"), FormId::Itr4);
    assert_eq!("ITR 1".parse::<FormId>().expect("parses"), FormId::Itr1);
    assert!("ITR-7".parse::<FormId>().is_err());

    assert_eq!(serde_json::to_string(&FormId::Itr2).expect("serializes"), "\"ITR-2\"");
}

#[test]
fn builtin_classifier_survives_a_json_reload() {
    let original = classifier();

    let json = serde_json::to_string(&original).expect("serializes");
    let reloaded: FormClassifier = serde_json::from_str(&json).expect("parses");

    assert_eq!(reloaded, original);
}
