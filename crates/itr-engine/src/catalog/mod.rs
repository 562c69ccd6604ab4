//! Versioned rule configuration: tax tables per assessment year, the form
//! classifier and named validation rule sets, plus the registry that swaps them.

mod registry;

pub use registry::RuleRegistry;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::classification::FormClassifier;
use crate::error::EngineError;
use crate::rules::{builtin_rule_sets, AssessmentYear, RuleTableError, TaxRuleSet};
use crate::validation::{builtin_validation_rule_sets, ValidationRuleSet};

const TAX_RULES_PREFIX: &str = "tax-rules-";
const VALIDATION_PREFIX: &str = "validation-";
const FORMS_FILE: &str = "itr-forms.json";

/// Failures while loading rule files from disk.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed rule file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("rule file {path} violates an invariant: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: RuleTableError,
    },
}

/// One consistent set of rules. Immutable once built; replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCatalog {
    tax_rules: BTreeMap<AssessmentYear, TaxRuleSet>,
    classifier: FormClassifier,
    validation: BTreeMap<String, ValidationRuleSet>,
}

impl RuleCatalog {
    /// Every table shipped with the engine.
    pub fn builtin() -> Result<Self, RuleTableError> {
        let mut catalog = Self {
            tax_rules: BTreeMap::new(),
            classifier: FormClassifier::builtin()?,
            validation: BTreeMap::new(),
        };
        for rule_set in builtin_rule_sets() {
            catalog.insert_tax_rules(rule_set)?;
        }
        for rule_set in builtin_validation_rule_sets() {
            catalog.insert_validation_rules(rule_set)?;
        }
        Ok(catalog)
    }

    /// Built-in tables overlaid with the rule files found in `dir`.
    ///
    /// Recognised files: `tax-rules-*.json`, `validation-*.json` and `itr-forms.json`.
    /// Anything else is ignored. Files are applied in name order.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin().map_err(|source| CatalogError::Invalid {
            path: dir.to_path_buf(),
            source,
        })?;

        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            files.push(entry.path());
        }
        files.sort();

        for path in files {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }

            let invalid = |source| CatalogError::Invalid {
                path: path.clone(),
                source,
            };
            if name.starts_with(TAX_RULES_PREFIX) {
                let rule_set: TaxRuleSet = read_json(&path)?;
                catalog.insert_tax_rules(rule_set).map_err(invalid)?;
            } else if name.starts_with(VALIDATION_PREFIX) {
                let rule_set: ValidationRuleSet = read_json(&path)?;
                catalog.insert_validation_rules(rule_set).map_err(invalid)?;
            } else if name == FORMS_FILE {
                let classifier: FormClassifier = read_json(&path)?;
                catalog.replace_classifier(classifier).map_err(invalid)?;
            }
        }

        Ok(catalog)
    }

    pub fn insert_tax_rules(&mut self, rule_set: TaxRuleSet) -> Result<(), RuleTableError> {
        rule_set.validate()?;
        self.tax_rules.insert(rule_set.assessment_year, rule_set);
        Ok(())
    }

    pub fn insert_validation_rules(
        &mut self,
        rule_set: ValidationRuleSet,
    ) -> Result<(), RuleTableError> {
        rule_set.validate()?;
        self.validation.insert(rule_set.id.clone(), rule_set);
        Ok(())
    }

    pub fn replace_classifier(&mut self, classifier: FormClassifier) -> Result<(), RuleTableError> {
        classifier.validate()?;
        self.classifier = classifier;
        Ok(())
    }

    pub fn tax_rules(&self, year: AssessmentYear) -> Result<&TaxRuleSet, EngineError> {
        self.tax_rules
            .get(&year)
            .ok_or_else(|| EngineError::UnknownRuleSet {
                id: format!("AY {year}"),
            })
    }

    pub fn validation_rules(&self, id: &str) -> Result<&ValidationRuleSet, EngineError> {
        self.validation
            .get(id)
            .ok_or_else(|| EngineError::UnknownRuleSet { id: id.to_string() })
    }

    pub fn classifier(&self) -> &FormClassifier {
        &self.classifier
    }

    pub fn assessment_years(&self) -> impl Iterator<Item = AssessmentYear> + '_ {
        self.tax_rules.keys().copied()
    }

    pub fn validation_rule_set_ids(&self) -> impl Iterator<Item = &str> {
        self.validation.keys().map(String::as_str)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}
