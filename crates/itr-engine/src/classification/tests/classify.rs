use std::collections::BTreeSet;

use rust_decimal_macros::dec;

use super::common::*;
use crate::classification::{
    Condition, DecisionTable, FlagAttribute, FormClassifier, FormId, FormRule, ProfileAttributes,
    ResidentialStatus, ScoringPolicy,
};

fn triggered_ids(profile: &ProfileAttributes) -> Vec<String> {
    classifier()
        .classify(profile, None)
        .triggered_rules
        .into_iter()
        .map(|rule| rule.rule_id)
        .collect()
}

#[test]
fn simple_salaried_profile_gets_itr1() {
    let result = classifier().classify(&salaried_profile(), None);

    assert_eq!(result.recommended_form, FormId::Itr1);
    assert_eq!(result.triggered_rules.len(), 1);
    assert!(result.triggered_rules[0].fallback);
    assert_eq!(result.confidence, dec!(0.65));
    assert!(!result.low_confidence);
    assert!(!result.requires_ca_review);
    assert_eq!(result.estimated_minutes, 30);
    assert_eq!(
        result.all_eligible_forms,
        BTreeSet::from([FormId::Itr1, FormId::Itr2])
    );
    assert_eq!(result.alternatives, vec![FormId::Itr2]);
}

#[test]
fn supplying_required_fields_restores_full_confidence() {
    let profile = ProfileAttributes {
        supplied_fields: supplied(&["schedule_salary"]),
        ..salaried_profile()
    };

    let result = classifier().classify(&profile, None);

    assert_eq!(result.confidence, dec!(0.95));
    assert!(result.triggered_rules[0].missing_fields.is_empty());
}

#[test]
fn business_with_capital_gains_gets_itr3() {
    let result = classifier().classify(&business_with_gains_profile(), None);

    assert_eq!(result.recommended_form, FormId::Itr3);
    assert_eq!(result.confidence, dec!(0.65));
    assert!(!result.low_confidence);
    assert!(result.requires_ca_review);
    assert_eq!(result.estimated_minutes, 150);
    assert!(result.all_eligible_forms.len() >= 2);
    assert!(result.all_eligible_forms.contains(&FormId::Itr2));
    assert!(result.all_eligible_forms.contains(&FormId::Itr3));
    assert_eq!(result.covering_forms, BTreeSet::from([FormId::Itr3]));
    assert!(result.alternatives.is_empty());

    let ids: Vec<&str> = result.triggered_rules.iter().map(|r| r.rule_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["business_with_capital_gains", "regular_business_income", "capital_gains"]
    );
}

#[test]
fn missing_fields_reduce_confidence_proportionally() {
    let profile = ProfileAttributes {
        supplied_fields: supplied(&["schedule_bp", "balance_sheet"]),
        ..business_with_gains_profile()
    };

    let result = classifier().classify(&profile, None);
    let top = &result.triggered_rules[0];

    assert_eq!(top.rule_id, "business_with_capital_gains");
    assert_eq!(top.confidence, dec!(0.8));
    assert_eq!(top.missing_fields, vec!["schedule_cg", "profit_and_loss"]);
    assert_eq!(result.triggered_rules[1].confidence, dec!(0.8));
    assert_eq!(result.triggered_rules[2].confidence, dec!(0.6));
    assert!(result.reasoning.contains("missing: schedule_cg, profit_and_loss"));
    assert!(!result.low_confidence);
}

#[test]
fn strong_signal_boosts_confidence() {
    let profile = ProfileAttributes {
        business_income: Some(dec!(1000000)),
        business_turnover: Some(dec!(20000000)),
        supplied_fields: supplied(&["schedule_bp", "balance_sheet", "profit_and_loss"]),
        ..ProfileAttributes::default()
    };

    let result = classifier().classify(&profile, None);

    assert_eq!(result.recommended_form, FormId::Itr3);
    assert_eq!(result.confidence, dec!(0.95));
}

#[test]
fn tie_between_forms_prefers_the_more_comprehensive_one() {
    let profile = ProfileAttributes {
        salary_income: Some(dec!(1200000)),
        is_director: Some(true),
        is_partner_in_firm: Some(true),
        ..ProfileAttributes::default()
    };

    let result = classifier().classify(&profile, None);

    assert_eq!(result.recommended_form, FormId::Itr3);
    assert_eq!(result.confidence, dec!(0.6));
    assert!(result.low_confidence);
    assert!(result.reasoning.contains("low confidence"));
    assert!(result.all_eligible_forms.contains(&FormId::Itr2));
    assert!(result.alternatives.is_empty());
}

#[test]
fn supplied_capital_gains_schedule_keeps_business_income_on_itr3() {
    let profile = ProfileAttributes {
        business_income: Some(dec!(600000)),
        capital_gains: Some(dec!(150000)),
        total_income: Some(dec!(750000)),
        supplied_fields: supplied(&["schedule_cg"]),
        ..ProfileAttributes::default()
    };

    let result = classifier().classify(&profile, None);

    let capital_gains = result
        .triggered_rules
        .iter()
        .find(|rule| rule.rule_id == "capital_gains")
        .expect("capital gains rule fires");
    assert_eq!(capital_gains.confidence, dec!(0.9));
    assert_eq!(result.recommended_form, FormId::Itr3);
    assert_eq!(result.confidence, dec!(0.725));
    assert!(!result.low_confidence);
    assert!(result.all_eligible_forms.contains(&FormId::Itr2));
    assert_eq!(result.covering_forms, BTreeSet::from([FormId::Itr3]));
    assert!(result.reasoning.starts_with("ITR-3 recommended"));
}

#[test]
fn director_details_do_not_pull_a_partner_onto_itr2() {
    let profile = ProfileAttributes {
        salary_income: Some(dec!(1200000)),
        is_director: Some(true),
        is_partner_in_firm: Some(true),
        supplied_fields: supplied(&["director_details"]),
        ..ProfileAttributes::default()
    };

    let result = classifier().classify(&profile, None);

    assert_eq!(result.recommended_form, FormId::Itr3);
    assert_eq!(result.confidence, dec!(0.6));
    assert!(!result.low_confidence);
    assert!(result
        .triggered_rules
        .iter()
        .all(|rule| rule.covered_by(FormId::Itr3)));
}

#[test]
fn rules_no_single_form_can_cover_are_flagged() {
    let rule = |id: &str, flag, form, base_confidence| FormRule {
        id: id.to_string(),
        priority: 1,
        description: id.to_string(),
        condition: Condition::flag(flag),
        form,
        alternative_form: None,
        required_fields: Vec::new(),
        requires_ca_review: false,
        estimated_minutes: 30,
        base_confidence,
        strong_signal: None,
        fallback: false,
    };
    let rules = DecisionTable::new(vec![
        rule("director", FlagAttribute::Director, FormId::Itr2, dec!(0.9)),
        rule("partner", FlagAttribute::PartnerInFirm, FormId::Itr4, dec!(0.8)),
    ])
    .expect("valid table");
    let classifier = FormClassifier::new(rules, classifier().forms, ScoringPolicy::default())
        .expect("valid classifier");
    let profile = ProfileAttributes {
        is_director: Some(true),
        is_partner_in_firm: Some(true),
        ..ProfileAttributes::default()
    };

    let result = classifier.classify(&profile, None);

    assert!(result.covering_forms.is_empty());
    assert_eq!(result.recommended_form, FormId::Itr2);
    assert!(result.low_confidence);
    assert!(result
        .reasoning
        .contains("ITR-2 cannot report every triggered rule (partner)"));
}

#[test]
fn presumptive_income_alone_gets_itr4() {
    let profile = ProfileAttributes {
        presumptive_income: Some(dec!(600000)),
        business_turnover: Some(dec!(5000000)),
        total_income: Some(dec!(600000)),
        ..ProfileAttributes::default()
    };

    let result = classifier().classify(&profile, None);

    assert_eq!(result.recommended_form, FormId::Itr4);
    assert!(!result.low_confidence);
    assert_eq!(
        result.all_eligible_forms,
        BTreeSet::from([FormId::Itr3, FormId::Itr4])
    );
}

#[test]
fn presumptive_income_with_capital_gains_moves_off_itr4() {
    let profile = ProfileAttributes {
        presumptive_income: Some(dec!(600000)),
        capital_gains: Some(dec!(100000)),
        ..ProfileAttributes::default()
    };

    let ids = triggered_ids(&profile);
    let result = classifier().classify(&profile, None);

    assert!(!ids.contains(&"presumptive_business".to_string()));
    assert!(ids.contains(&"presumptive_with_complications".to_string()));
    assert_eq!(result.recommended_form, FormId::Itr3);
}

#[test]
fn small_section_112a_gains_stay_on_itr1() {
    let mut profile = salaried_profile();
    profile.ltcg_112a = Some(dec!(100000));
    assert_eq!(classifier().classify(&profile, None).recommended_form, FormId::Itr1);

    profile.ltcg_112a = Some(dec!(200000));
    assert_eq!(classifier().classify(&profile, None).recommended_form, FormId::Itr2);
}

#[test]
fn complicating_signals_each_exclude_itr1() {
    let base = salaried_profile();
    let cases = [
        ProfileAttributes {
            residential_status: Some(ResidentialStatus::NonResident),
            ..base.clone()
        },
        ProfileAttributes {
            residential_status: Some(ResidentialStatus::NotOrdinarilyResident),
            ..base.clone()
        },
        ProfileAttributes {
            house_property_count: Some(2),
            ..base.clone()
        },
        ProfileAttributes {
            total_income: Some(dec!(5000001)),
            ..base.clone()
        },
        ProfileAttributes {
            agricultural_income: Some(dec!(5001)),
            ..base.clone()
        },
        ProfileAttributes {
            has_foreign_assets: Some(true),
            ..base.clone()
        },
        ProfileAttributes {
            holds_unlisted_equity: Some(true),
            ..base.clone()
        },
        ProfileAttributes {
            has_virtual_digital_assets: Some(true),
            ..base.clone()
        },
    ];

    for profile in cases {
        let result = classifier().classify(&profile, None);
        assert_eq!(result.recommended_form, FormId::Itr2, "{profile:?}");
        assert!(result.triggered_rules.iter().all(|rule| !rule.fallback));
    }
}

#[test]
fn agricultural_income_at_the_limit_stays_on_itr1() {
    let profile = ProfileAttributes {
        agricultural_income: Some(dec!(5000)),
        ..salaried_profile()
    };

    assert_eq!(classifier().classify(&profile, None).recommended_form, FormId::Itr1);
}

#[test]
fn unknown_profile_fields_are_ignored() {
    let json = r#"{
        "salary_income": "800000",
        "house_property_count": 1,
        "favourite_colour": "teal"
    }"#;

    let profile: ProfileAttributes = serde_json::from_str(json).expect("profile parses");

    assert_eq!(classifier().classify(&profile, None).recommended_form, FormId::Itr1);
}

#[test]
fn classification_is_deterministic() {
    let profile = business_with_gains_profile();

    let first = classifier().classify(&profile, Some(FormId::Itr1));
    let second = classifier().classify(&profile, Some(FormId::Itr1));

    assert_eq!(first, second);
}

#[test]
fn profile_matching_no_rule_gets_the_most_comprehensive_form() {
    let rules = DecisionTable::new(vec![FormRule {
        id: "director_only".to_string(),
        priority: 1,
        description: "director".to_string(),
        condition: Condition::flag(FlagAttribute::Director),
        form: FormId::Itr2,
        alternative_form: None,
        required_fields: Vec::new(),
        requires_ca_review: false,
        estimated_minutes: 60,
        base_confidence: dec!(0.9),
        strong_signal: None,
        fallback: false,
    }])
    .expect("valid table");
    let classifier = FormClassifier::new(rules, classifier().forms, ScoringPolicy::default())
        .expect("valid classifier");

    let result = classifier.classify(&salaried_profile(), None);

    assert_eq!(result.recommended_form, FormId::Itr3);
    assert!(result.low_confidence);
    assert!(result.triggered_rules.is_empty());
    assert_eq!(result.confidence, dec!(0));
}
