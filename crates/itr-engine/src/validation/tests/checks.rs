use rust_decimal_macros::dec;

use crate::rules::RuleTableError;
use crate::validation::{
    numeric_record, validate_records, Check, Comparison, Expression, Operand, RecordSet,
    Severity, ValidationRule, ValidationRuleSet, ValidationStatus,
};

fn single_rule_set(check: Check, severity: Severity, message: &str) -> ValidationRuleSet {
    ValidationRuleSet {
        id: "custom".to_string(),
        description: String::new(),
        assessment_year: None,
        rules: vec![ValidationRule {
            id: "only".to_string(),
            scope: "row".to_string(),
            severity,
            check,
            message: message.to_string(),
        }],
    }
}

#[test]
fn range_check_renders_bounds() {
    let rule_set = single_rule_set(
        Check::Range {
            field: "age".to_string(),
            min: Some(dec!(18)),
            max: Some(dec!(120)),
        },
        Severity::Error,
        "{field} in {scope} is {actual}; expected {expected} (min {min}, max {max})",
    );
    let records = RecordSet::new().with("row", numeric_record([("age", dec!(150))]));

    let report = validate_records(&rule_set, &records);

    assert_eq!(report.results[0].status, ValidationStatus::Failed);
    assert_eq!(
        report.results[0].message,
        "age in row is 150; expected between 18 and 120 (min 18, max 120)"
    );
}

#[test]
fn cross_field_check_compares_expressions() {
    let rule_set = single_rule_set(
        Check::CrossField {
            left: Expression::difference(
                vec![Operand::field("a"), Operand::field("b")],
                vec![Operand::Constant(dec!(5))],
            ),
            comparison: Comparison::Gt,
            right: Expression::of(Operand::Scaled {
                field: "c".to_string(),
                factor: dec!(2),
            }),
        },
        Severity::Warning,
        "{left} vs {right}",
    );
    let passing = RecordSet::new().with(
        "row",
        numeric_record([("a", dec!(10)), ("b", dec!(10)), ("c", dec!(7))]),
    );
    let failing = RecordSet::new().with(
        "row",
        numeric_record([("a", dec!(10)), ("b", dec!(5)), ("c", dec!(7))]),
    );

    let passed = validate_records(&rule_set, &passing);
    let warned = validate_records(&rule_set, &failing);

    assert_eq!(passed.results[0].status, ValidationStatus::Passed);
    assert_eq!(passed.results[0].message, "");
    assert_eq!(warned.results[0].status, ValidationStatus::Warning);
    assert_eq!(warned.results[0].message, "10 vs 14");
    assert_eq!(warned.results[0].affected_fields, vec!["a", "b", "c"]);
}

#[test]
fn comparisons_cover_every_operator() {
    let (one, two) = (dec!(1), dec!(2));

    assert!(Comparison::Lt.holds(one, two));
    assert!(Comparison::Le.holds(two, two));
    assert!(Comparison::Eq.holds(one, one));
    assert!(Comparison::Ne.holds(one, two));
    assert!(Comparison::Ge.holds(two, one));
    assert!(Comparison::Gt.holds(two, one));
    assert!(!Comparison::Gt.holds(one, one));
}

#[test]
fn rule_sets_load_from_tagged_json() {
    let json = r#"{
        "id": "json-rules",
        "assessment_year": "2025-26",
        "rules": [
            {
                "id": "tds",
                "scope": "summary",
                "severity": "error",
                "message": "{left} > {right}",
                "check": {
                    "type": "cross_field",
                    "left": {"add": [{"field": "tds"}]},
                    "comparison": "le",
                    "right": {"add": [{"field": "income"}], "subtract": [{"constant": "0"}]}
                }
            },
            {
                "id": "net",
                "scope": "summary",
                "severity": "info",
                "message": "net {actual} != {expected}",
                "check": {
                    "type": "derived_value",
                    "field": "net",
                    "expression": {
                        "add": [{"field": "income"}],
                        "subtract": [{"scaled": {"field": "tds", "factor": "1"}}]
                    }
                }
            }
        ]
    }"#;

    let rule_set: ValidationRuleSet = serde_json::from_str(json).expect("rule set parses");
    rule_set.validate().expect("rule set is valid");
    let records = RecordSet::new().with(
        "summary",
        numeric_record([("tds", dec!(500)), ("income", dec!(400)), ("net", dec!(0))]),
    );

    let report = validate_records(&rule_set, &records);

    assert_eq!(report.rule_set_id, "json-rules");
    assert_eq!(report.results[0].status, ValidationStatus::Failed);
    assert_eq!(report.results[0].message, "500 > 400");
    assert_eq!(report.results[1].status, ValidationStatus::Warning);
    assert_eq!(report.results[1].message, "net 0 != -100");
}

#[test]
fn records_accept_numbers_flags_and_text() {
    let json = r#"{
        "row": [{"amount": 1250.50, "as_text": "900", "pan": "ABCDE1234F", "ok": true}]
    }"#;

    let records: RecordSet = serde_json::from_str(json).expect("records parse");
    let row = &records.records("row")[0];

    assert_eq!(row["amount"].as_number(), Some(dec!(1250.50)));
    assert_eq!(row["as_text"].as_number(), Some(dec!(900)));
    assert_eq!(row["pan"].as_number(), None);
    assert_eq!(row["ok"].as_number(), None);
}

#[test]
fn invalid_rule_sets_are_rejected() {
    let inverted = single_rule_set(
        Check::Range {
            field: "x".to_string(),
            min: Some(dec!(10)),
            max: Some(dec!(1)),
        },
        Severity::Error,
        "",
    );
    assert!(matches!(inverted.validate(), Err(RuleTableError::ValidationRules(_))));

    let negative_tolerance = single_rule_set(
        Check::DerivedValue {
            field: "x".to_string(),
            expression: Expression::of(Operand::field("y")),
            tolerance: dec!(-1),
        },
        Severity::Error,
        "",
    );
    assert!(negative_tolerance.validate().is_err());

    let mut duplicated = negative_tolerance.clone();
    duplicated.rules[0].check = Check::Range {
        field: "x".to_string(),
        min: None,
        max: None,
    };
    duplicated.rules.push(duplicated.rules[0].clone());
    let err = duplicated.validate().expect_err("duplicate ids");
    assert!(err.to_string().contains("duplicate rule id 'only'"));
}
