use std::sync::Arc;

use crate::catalog::{RuleCatalog, RuleRegistry};
use crate::classification::{ClassificationResult, FormId, ProfileAttributes};
use crate::computation::{
    compare_regimes, compute_regime, DeductionPolicy, RegimeComparison, TaxComputationRequest,
    TaxComputationResult,
};
use crate::config::AppConfig;
use crate::error::EngineError;
use crate::rules::{AssessmentYear, Regime, TaxRuleSet};
use crate::validation::{validate_records, RecordSet, ValidationReport};

/// Knobs that shape computations without being part of the statutory tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub deduction_policy: DeductionPolicy,
    /// Used for requests that do not name an assessment year.
    pub default_assessment_year: AssessmentYear,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            deduction_policy: DeductionPolicy::default(),
            default_assessment_year: AssessmentYear::new(2026),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            deduction_policy: DeductionPolicy {
                warning_ratio: config.computation.deduction_warning_ratio,
            },
            default_assessment_year: config.rules.default_assessment_year,
        }
    }
}

/// The three request/response contracts, each evaluated against a single
/// catalog snapshot.
#[derive(Debug, Clone)]
pub struct TaxEngine {
    registry: Arc<RuleRegistry>,
    settings: EngineSettings,
}

impl TaxEngine {
    pub fn new(registry: Arc<RuleRegistry>, settings: EngineSettings) -> Self {
        Self { registry, settings }
    }

    pub fn with_catalog(catalog: RuleCatalog) -> Self {
        Self::new(
            Arc::new(RuleRegistry::new(catalog)),
            EngineSettings::default(),
        )
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Computes both regimes and recommends the cheaper one.
    pub fn compute_tax(
        &self,
        request: &TaxComputationRequest,
    ) -> Result<RegimeComparison, EngineError> {
        let catalog = self.registry.snapshot();
        let rule_set = self.rule_set_for(&catalog, request)?;
        compare_regimes(request, rule_set, &self.settings.deduction_policy)
    }

    pub fn compute_for_regime(
        &self,
        request: &TaxComputationRequest,
        regime: Regime,
    ) -> Result<TaxComputationResult, EngineError> {
        let catalog = self.registry.snapshot();
        let rule_set = self.rule_set_for(&catalog, request)?;
        compute_regime(request, rule_set, regime, &self.settings.deduction_policy)
    }

    pub fn classify_form(
        &self,
        profile: &ProfileAttributes,
        current_form: Option<FormId>,
    ) -> ClassificationResult {
        self.registry
            .snapshot()
            .classifier()
            .classify(profile, current_form)
    }

    pub fn validate(
        &self,
        records: &RecordSet,
        rule_set_id: &str,
    ) -> Result<ValidationReport, EngineError> {
        let catalog = self.registry.snapshot();
        let rule_set = catalog.validation_rules(rule_set_id)?;
        Ok(validate_records(rule_set, records))
    }

    fn rule_set_for<'a>(
        &self,
        catalog: &'a RuleCatalog,
        request: &TaxComputationRequest,
    ) -> Result<&'a TaxRuleSet, EngineError> {
        let year = request
            .assessment_year
            .unwrap_or(self.settings.default_assessment_year);
        catalog.tax_rules(year)
    }
}
