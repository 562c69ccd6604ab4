use chrono::NaiveDate;
use itr_engine::config::AppConfig;
use itr_engine::error::AppError;
use itr_engine::{telemetry, CatalogError, EngineSettings, RuleCatalog, RuleRegistry, TaxEngine};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Loads configuration, installs logging and builds the engine over the
/// configured rule catalog.
pub(crate) fn bootstrap(rules_dir: Option<PathBuf>) -> Result<TaxEngine, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let rules_dir = rules_dir.or_else(|| config.rules.rules_dir.clone());
    let catalog = match &rules_dir {
        Some(dir) => RuleCatalog::load_dir(dir)?,
        None => RuleCatalog::builtin().map_err(|source| CatalogError::Invalid {
            path: PathBuf::from("<built-in>"),
            source,
        })?,
    };
    info!(
        environment = ?config.environment,
        rules_dir = ?rules_dir,
        default_assessment_year = %config.rules.default_assessment_year,
        "engine ready"
    );

    Ok(TaxEngine::new(
        Arc::new(RuleRegistry::new(catalog)),
        EngineSettings::from_config(&config),
    ))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
