use crate::commands::{run_classify, run_compute, run_rules, run_validate};
use crate::commands::{ClassifyArgs, ComputeArgs, ValidateArgs};
use crate::infra::bootstrap;
use crate::Outcome;
use clap::{Parser, Subcommand, ValueEnum};
use itr_engine::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "itr",
    about = "Compute income tax under both regimes, pick a return form and validate filings",
    version
)]
struct Cli {
    /// Directory of rule overrides (takes precedence over ITR_RULES_DIR)
    #[arg(long, global = true)]
    rules_dir: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute liability under both regimes (or one) and recommend the cheaper
    Compute(ComputeArgs),
    /// Recommend a return form for a taxpayer profile
    Classify(ClassifyArgs),
    /// Run a validation rule set over filing records
    Validate(ValidateArgs),
    /// List the loaded assessment years, validation rule sets and forms
    Rules,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Json,
    Text,
}

pub(crate) fn run() -> Result<Outcome, AppError> {
    let cli = Cli::parse();
    let engine = bootstrap(cli.rules_dir)?;

    match cli.command {
        Command::Compute(args) => run_compute(&engine, args, cli.format),
        Command::Classify(args) => run_classify(&engine, args, cli.format),
        Command::Validate(args) => run_validate(&engine, args, cli.format),
        Command::Rules => run_rules(&engine, cli.format),
    }
}
