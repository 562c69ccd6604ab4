use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::rules::{AssessmentYear, AssessmentYearParseError};

/// Distinguishes runtime behavior for different deployment stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for anything embedding the engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub rules: RulesConfig,
    pub computation: ComputationConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("ITR_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let rules_dir = env::var("ITR_RULES_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let year = env::var("ITR_DEFAULT_ASSESSMENT_YEAR")
            .unwrap_or_else(|_| DEFAULT_ASSESSMENT_YEAR.to_string());
        let default_assessment_year = AssessmentYear::from_str(&year)
            .map_err(|source| ConfigError::InvalidAssessmentYear { source })?;

        let ratio = env::var("ITR_DEDUCTION_WARNING_RATIO")
            .unwrap_or_else(|_| DEFAULT_WARNING_RATIO.to_string());
        let deduction_warning_ratio = Decimal::from_str(ratio.trim())
            .ok()
            .filter(|value| *value >= Decimal::ZERO && *value <= Decimal::ONE)
            .ok_or(ConfigError::InvalidWarningRatio { value: ratio })?;

        let log_level = env::var("ITR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            rules: RulesConfig {
                rules_dir,
                default_assessment_year,
            },
            computation: ComputationConfig {
                deduction_warning_ratio,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

const DEFAULT_ASSESSMENT_YEAR: &str = "2026-27";
const DEFAULT_WARNING_RATIO: Decimal = dec!(0.30);

/// Where rule tables come from.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    /// Directory of JSON overrides; built-in tables are used when unset.
    pub rules_dir: Option<PathBuf>,
    pub default_assessment_year: AssessmentYear,
}

#[derive(Debug, Clone)]
pub struct ComputationConfig {
    pub deduction_warning_ratio: Decimal,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidAssessmentYear { source: AssessmentYearParseError },
    InvalidWarningRatio { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAssessmentYear { source } => {
                write!(f, "ITR_DEFAULT_ASSESSMENT_YEAR is invalid: {source}")
            }
            ConfigError::InvalidWarningRatio { value } => write!(
                f,
                "ITR_DEDUCTION_WARNING_RATIO must be a decimal between 0 and 1 (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidAssessmentYear { source } => Some(source),
            ConfigError::InvalidWarningRatio { .. } => None,
        }
    }
}
