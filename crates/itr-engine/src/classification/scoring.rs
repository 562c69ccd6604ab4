use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::profile::ProfileAttributes;
use super::table::FormRule;

/// Tunables for confidence scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Confidence lost when every required field is missing; scaled by the missing share.
    pub missing_field_penalty: Decimal,
    /// Recommendations scoring below this are flagged as low confidence.
    pub low_confidence_floor: Decimal,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            missing_field_penalty: dec!(0.3),
            low_confidence_floor: dec!(0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleScore {
    pub confidence: Decimal,
    pub missing_fields: Vec<String>,
    pub strong_signal: bool,
}

/// `base - penalty * missing/required + boost`, clamped to `[0, 1]` and kept to
/// four decimal places so equal inputs always tie.
pub fn score_rule(
    rule: &FormRule,
    profile: &ProfileAttributes,
    policy: &ScoringPolicy,
) -> RuleScore {
    let missing_fields: Vec<String> = rule
        .required_fields
        .iter()
        .filter(|field| !profile.has_supplied(field))
        .cloned()
        .collect();

    let mut confidence = rule.base_confidence;
    if !rule.required_fields.is_empty() {
        let missing_share = Decimal::from(missing_fields.len() as u64)
            / Decimal::from(rule.required_fields.len() as u64);
        confidence -= policy.missing_field_penalty * missing_share;
    }

    let strong_signal = rule
        .strong_signal
        .as_ref()
        .is_some_and(|signal| signal.condition.evaluate(profile));
    if let Some(signal) = rule.strong_signal.as_ref().filter(|_| strong_signal) {
        confidence += signal.boost;
    }

    RuleScore {
        confidence: confidence.clamp(Decimal::ZERO, Decimal::ONE).round_dp(4),
        missing_fields,
        strong_signal,
    }
}
