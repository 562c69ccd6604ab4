use std::collections::BTreeSet;

use rust_decimal_macros::dec;

use crate::classification::{FormClassifier, ProfileAttributes};

pub(super) fn classifier() -> FormClassifier {
    FormClassifier::builtin().expect("built-in decision table is valid")
}

/// Resident salaried taxpayer with bank interest and a single house.
pub(super) fn salaried_profile() -> ProfileAttributes {
    ProfileAttributes {
        salary_income: Some(dec!(800000)),
        interest_income: Some(dec!(40000)),
        house_property_count: Some(1),
        total_income: Some(dec!(840000)),
        ..ProfileAttributes::default()
    }
}

/// Books-of-account business income alongside capital gains.
pub(super) fn business_with_gains_profile() -> ProfileAttributes {
    ProfileAttributes {
        business_income: Some(dec!(500000)),
        capital_gains: Some(dec!(200000)),
        total_income: Some(dec!(700000)),
        ..ProfileAttributes::default()
    }
}

pub(super) fn supplied(fields: &[&str]) -> BTreeSet<String> {
    fields.iter().map(|field| field.to_string()).collect()
}
