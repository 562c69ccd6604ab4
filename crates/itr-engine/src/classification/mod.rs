//! Return-form classification: a declarative decision table evaluated against a
//! taxpayer profile, confidence scoring and the cost of switching forms.

mod builtin;
mod profile;
mod scoring;
mod switch;
mod table;

#[cfg(test)]
mod tests;

pub use builtin::{builtin_form_catalog, builtin_form_rules};
pub use profile::{
    AmountAttribute, CountAttribute, FlagAttribute, ProfileAttributes, ResidentialStatus,
};
pub use scoring::{score_rule, RuleScore, ScoringPolicy};
pub use switch::{switch_impact, SwitchImpact};
pub use table::{
    Condition, DecisionTable, FormCatalog, FormDefinition, FormId, FormIdParseError, FormRule,
    StrongSignal,
};

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::RuleTableError;

/// A rule that fired, with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub rule_id: String,
    pub form: FormId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_form: Option<FormId>,
    pub description: String,
    pub confidence: Decimal,
    pub missing_fields: Vec<String>,
    pub requires_ca_review: bool,
    pub estimated_minutes: u32,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub recommended_form: FormId,
    pub confidence: Decimal,
    pub low_confidence: bool,
    pub reasoning: String,
    /// In decision-table priority order.
    pub triggered_rules: Vec<TriggeredRule>,
    /// Every form a triggered rule points to, as its form or its alternative.
    pub all_eligible_forms: BTreeSet<FormId>,
    /// Eligible forms that can report every triggered rule. The recommendation is
    /// always one of these.
    pub covering_forms: BTreeSet<FormId>,
    /// Covering forms other than the recommendation, best first.
    pub alternatives: Vec<FormId>,
    pub requires_ca_review: bool,
    pub estimated_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_impact: Option<SwitchImpact>,
}

/// Decision table plus the form catalog it recommends from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormClassifier {
    pub rules: DecisionTable,
    pub forms: FormCatalog,
    #[serde(default)]
    pub scoring: ScoringPolicy,
}

impl FormClassifier {
    pub fn new(
        rules: DecisionTable,
        forms: FormCatalog,
        scoring: ScoringPolicy,
    ) -> Result<Self, RuleTableError> {
        let classifier = Self {
            rules,
            forms,
            scoring,
        };
        classifier.validate()?;
        Ok(classifier)
    }

    pub fn builtin() -> Result<Self, RuleTableError> {
        Self::new(
            builtin_form_rules()?,
            builtin_form_catalog(),
            ScoringPolicy::default(),
        )
    }

    pub(crate) fn validate(&self) -> Result<(), RuleTableError> {
        self.forms.validate()?;
        for rule in self.rules.rules() {
            let forms = std::iter::once(rule.form).chain(rule.alternative_form);
            for form in forms {
                if self.forms.form(form).is_none() {
                    return Err(RuleTableError::FormRules(format!(
                        "rule '{}' refers to {form}, which the form catalog does not describe",
                        rule.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Recommends a form for `profile`. Never fails: a profile that triggers no
    /// rule gets the most comprehensive form, flagged as low confidence.
    pub fn classify(
        &self,
        profile: &ProfileAttributes,
        current_form: Option<FormId>,
    ) -> ClassificationResult {
        let triggered: Vec<TriggeredRule> = self
            .rules
            .triggered(profile)
            .into_iter()
            .map(|rule| {
                let score = score_rule(rule, profile, &self.scoring);
                TriggeredRule {
                    rule_id: rule.id.clone(),
                    form: rule.form,
                    alternative_form: rule.alternative_form,
                    description: rule.description.clone(),
                    confidence: score.confidence,
                    missing_fields: score.missing_fields,
                    requires_ca_review: rule.requires_ca_review,
                    estimated_minutes: rule.estimated_minutes,
                    fallback: rule.fallback,
                }
            })
            .collect();

        if triggered.is_empty() {
            return self.unmatched(current_form);
        }

        let mut all_eligible_forms = BTreeSet::new();
        for entry in &triggered {
            all_eligible_forms.insert(entry.form);
            all_eligible_forms.extend(entry.alternative_form);
        }
        let covering_forms: BTreeSet<FormId> = all_eligible_forms
            .iter()
            .copied()
            .filter(|form| triggered.iter().all(|entry| entry.covered_by(*form)))
            .collect();
        let candidates = if covering_forms.is_empty() {
            &all_eligible_forms
        } else {
            &covering_forms
        };

        let mut ranked: Vec<FormStanding> = candidates
            .iter()
            .filter_map(|form| FormStanding::for_form(*form, &triggered))
            .collect();
        ranked.sort_by(|a, b| {
            b.primary
                .cmp(&a.primary)
                .then_with(|| b.best.confidence.cmp(&a.best.confidence))
                .then_with(|| b.form.complexity().cmp(&a.form.complexity()))
        });

        let Some(standing) = ranked.first() else {
            return self.unmatched(current_form);
        };
        let recommended_form = standing.form;
        let top = standing.best;

        let tied_with_other_form = triggered.iter().any(|other| {
            !other.fallback && other.confidence == top.confidence && other.form != recommended_form
        });
        let low_confidence = covering_forms.is_empty()
            || tied_with_other_form
            || top.confidence < self.scoring.low_confidence_floor;

        let alternatives: Vec<FormId> = ranked
            .iter()
            .skip(1)
            .map(|standing| standing.form)
            .collect();

        let for_form: Vec<&TriggeredRule> = triggered
            .iter()
            .filter(|entry| entry.form == recommended_form)
            .collect();
        let definition = self.forms.form(recommended_form);
        let requires_ca_review = for_form.iter().any(|entry| entry.requires_ca_review)
            || definition.is_some_and(|definition| definition.requires_ca_review);
        let estimated_minutes = for_form
            .iter()
            .map(|entry| entry.estimated_minutes)
            .max()
            .or_else(|| definition.map(|definition| definition.base_minutes))
            .unwrap_or(top.estimated_minutes);

        let reasoning = reasoning(recommended_form, top, &triggered, low_confidence);
        let switch_impact = current_form
            .and_then(|current| switch_impact(&self.forms, current, recommended_form));

        ClassificationResult {
            recommended_form,
            confidence: top.confidence,
            low_confidence,
            reasoning,
            triggered_rules: triggered.clone(),
            all_eligible_forms,
            covering_forms,
            alternatives,
            requires_ca_review,
            estimated_minutes,
            switch_impact,
        }
    }

    fn unmatched(&self, current_form: Option<FormId>) -> ClassificationResult {
        let recommended_form = FormId::Itr3;
        let definition = self.forms.form(recommended_form);
        ClassificationResult {
            recommended_form,
            confidence: Decimal::ZERO,
            low_confidence: true,
            reasoning: format!(
                "no classification rule matched this profile; {recommended_form} can report \
                 every income type an individual may have"
            ),
            triggered_rules: Vec::new(),
            all_eligible_forms: BTreeSet::from([recommended_form]),
            covering_forms: BTreeSet::from([recommended_form]),
            alternatives: Vec::new(),
            requires_ca_review: definition.is_some_and(|d| d.requires_ca_review),
            estimated_minutes: definition.map_or(0, |d| d.base_minutes),
            switch_impact: current_form
                .and_then(|current| switch_impact(&self.forms, current, recommended_form)),
        }
    }
}

impl TriggeredRule {
    /// Whether `form` can report what this rule detected.
    pub fn covered_by(&self, form: FormId) -> bool {
        self.form == form || self.alternative_form == Some(form)
    }
}

/// How well one candidate form is supported by the triggered rules.
struct FormStanding<'a> {
    form: FormId,
    /// Some triggered rule names this form as its primary target.
    primary: bool,
    best: &'a TriggeredRule,
}

impl<'a> FormStanding<'a> {
    fn for_form(form: FormId, triggered: &'a [TriggeredRule]) -> Option<Self> {
        let best_of = |rules: Vec<&'a TriggeredRule>| {
            rules.into_iter().reduce(|best, entry| {
                if entry.confidence > best.confidence {
                    entry
                } else {
                    best
                }
            })
        };

        let primary = triggered.iter().filter(|entry| entry.form == form).collect();
        if let Some(best) = best_of(primary) {
            return Some(Self {
                form,
                primary: true,
                best,
            });
        }
        let secondary = triggered
            .iter()
            .filter(|entry| entry.alternative_form == Some(form))
            .collect();
        best_of(secondary).map(|best| Self {
            form,
            primary: false,
            best,
        })
    }
}

fn reasoning(
    form: FormId,
    top: &TriggeredRule,
    triggered: &[TriggeredRule],
    low_confidence: bool,
) -> String {
    let mut text = format!(
        "{form} recommended: {} (rule '{}', confidence {})",
        top.description, top.rule_id, top.confidence
    );

    let others: Vec<String> = triggered
        .iter()
        .filter(|entry| entry.rule_id != top.rule_id)
        .map(|entry| format!("{} -> {}", entry.rule_id, entry.form))
        .collect();
    if !others.is_empty() {
        text.push_str("; also triggered: ");
        text.push_str(&others.join(", "));
    }
    let uncovering: Vec<String> = triggered
        .iter()
        .filter(|entry| !entry.covered_by(form))
        .map(|entry| entry.rule_id.clone())
        .collect();
    if !uncovering.is_empty() {
        text.push_str(&format!(
            "; {form} cannot report every triggered rule ({})",
            uncovering.join(", ")
        ));
    }
    if !top.missing_fields.is_empty() {
        text.push_str("; missing: ");
        text.push_str(&top.missing_fields.join(", "));
    }
    if low_confidence {
        text.push_str("; low confidence, review the recommendation before filing");
    }
    text
}
