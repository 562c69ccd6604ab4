//! Income-tax determination for individual taxpayers: liability under the old and
//! new regimes with a recommendation, return-form classification and declarative
//! validation of filing records.

pub mod catalog;
pub mod classification;
pub mod computation;
pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod telemetry;
pub mod validation;

pub use catalog::{CatalogError, RuleCatalog, RuleRegistry};
pub use engine::{EngineSettings, TaxEngine};
pub use error::{AppError, EngineError};
