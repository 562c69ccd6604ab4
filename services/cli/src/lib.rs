mod cli;
mod commands;
mod infra;

use itr_engine::error::AppError;

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Validation found failed error-severity rules.
    SubmissionBlocked,
}

pub fn run() -> Result<Outcome, AppError> {
    cli::run()
}
