use crate::cli::OutputFormat;
use crate::infra::{parse_date, print_json, read_json};
use crate::Outcome;
use chrono::NaiveDate;
use clap::Args;
use itr_engine::classification::{ClassificationResult, FormId, ProfileAttributes};
use itr_engine::computation::{RegimeComparison, TaxComputationRequest, TaxComputationResult};
use itr_engine::error::AppError;
use itr_engine::rules::{AgeCategory, Regime};
use itr_engine::validation::{RecordSet, ValidationReport, ValidationStatus, CORE_RULE_SET_ID};
use itr_engine::TaxEngine;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ComputeArgs {
    /// JSON file holding the computation request
    #[arg(long)]
    request: PathBuf,
    /// Compute only this regime (old or new) instead of comparing both
    #[arg(long)]
    regime: Option<Regime>,
    /// Derive the age category from a birth date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date_of_birth: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// JSON file holding the taxpayer profile
    #[arg(long)]
    profile: PathBuf,
    /// Form filed last time; adds the cost of switching away from it
    #[arg(long)]
    current_form: Option<FormId>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// JSON file holding records grouped by scope
    #[arg(long)]
    records: PathBuf,
    /// Validation rule set to apply
    #[arg(long, default_value = CORE_RULE_SET_ID)]
    rule_set: String,
}

pub(crate) fn run_compute(
    engine: &TaxEngine,
    args: ComputeArgs,
    format: OutputFormat,
) -> Result<Outcome, AppError> {
    let mut request: TaxComputationRequest = read_json(&args.request)?;
    if let Some(date_of_birth) = args.date_of_birth {
        let year = request
            .assessment_year
            .unwrap_or(engine.settings().default_assessment_year);
        request.age_category = AgeCategory::from_birth_date(date_of_birth, year);
    }
    info!(
        request = %args.request.display(),
        age_category = request.age_category.label(),
        regime = ?args.regime,
        "computing liability"
    );

    match args.regime {
        Some(regime) => {
            let result = engine.compute_for_regime(&request, regime)?;
            emit(format, &result, || render_result(&result))?;
        }
        None => {
            let comparison = engine.compute_tax(&request)?;
            emit(format, &comparison, || render_comparison(&comparison))?;
        }
    }
    Ok(Outcome::Completed)
}

pub(crate) fn run_classify(
    engine: &TaxEngine,
    args: ClassifyArgs,
    format: OutputFormat,
) -> Result<Outcome, AppError> {
    let profile: ProfileAttributes = read_json(&args.profile)?;
    info!(profile = %args.profile.display(), current_form = ?args.current_form, "classifying");

    let result = engine.classify_form(&profile, args.current_form);
    emit(format, &result, || render_classification(&result))?;
    Ok(Outcome::Completed)
}

pub(crate) fn run_validate(
    engine: &TaxEngine,
    args: ValidateArgs,
    format: OutputFormat,
) -> Result<Outcome, AppError> {
    let records: RecordSet = read_json(&args.records)?;
    info!(records = %args.records.display(), rule_set = %args.rule_set, "validating");

    let report = engine.validate(&records, &args.rule_set)?;
    emit(format, &report, || render_report(&report))?;
    if report.blocks_submission() {
        Ok(Outcome::SubmissionBlocked)
    } else {
        Ok(Outcome::Completed)
    }
}

#[derive(Serialize)]
struct LoadedRules {
    assessment_years: Vec<String>,
    validation_rule_sets: Vec<String>,
    forms: Vec<FormSummary>,
}

#[derive(Serialize)]
struct FormSummary {
    form: FormId,
    name: String,
    base_minutes: u32,
    requires_ca_review: bool,
}

pub(crate) fn run_rules(engine: &TaxEngine, format: OutputFormat) -> Result<Outcome, AppError> {
    let catalog = engine.registry().snapshot();
    let loaded = LoadedRules {
        assessment_years: catalog.assessment_years().map(|y| y.to_string()).collect(),
        validation_rule_sets: catalog
            .validation_rule_set_ids()
            .map(str::to_string)
            .collect(),
        forms: catalog
            .classifier()
            .forms
            .forms
            .values()
            .map(|definition| FormSummary {
                form: definition.form,
                name: definition.name.clone(),
                base_minutes: definition.base_minutes,
                requires_ca_review: definition.requires_ca_review,
            })
            .collect(),
    };

    emit(format, &loaded, || {
        let mut lines = vec![
            format!("Assessment years: {}", loaded.assessment_years.join(", ")),
            format!(
                "Validation rule sets: {}",
                loaded.validation_rule_sets.join(", ")
            ),
            "Forms:".to_string(),
        ];
        for form in &loaded.forms {
            let review = if form.requires_ca_review { ", CA review" } else { "" };
            lines.push(format!(
                "  {} {} ({} min{review})",
                form.form, form.name, form.base_minutes
            ));
        }
        lines.join("\n")
    })?;
    Ok(Outcome::Completed)
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl FnOnce() -> String,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Text => {
            println!("{}", render());
            Ok(())
        }
    }
}

fn render_comparison(comparison: &RegimeComparison) -> String {
    let mut lines = vec![format!("Assessment year {}", comparison.assessment_year)];
    for regime in Regime::ordered() {
        let result = comparison.result(regime);
        lines.push(format!(
            "  {:<4} taxable {:>12}  liability {:>10}",
            regime.label(),
            result.taxable_income.normalize(),
            result.total_tax_liability
        ));
    }
    lines.push(format!(
        "Recommended: {} regime (saves {})",
        comparison.recommended_regime, comparison.savings
    ));
    lines.join("\n")
}

fn render_result(result: &TaxComputationResult) -> String {
    let mut lines = vec![
        format!(
            "{} regime, AY {} ({})",
            result.regime,
            result.assessment_year,
            result.age_category.label()
        ),
        format!("Gross total income: {}", result.gross_total_income.normalize()),
        format!("Standard deduction: {}", result.standard_deduction.normalize()),
        format!(
            "Chapter VI-A deductions: {}",
            result.deductions.total_eligible.normalize()
        ),
        format!("Taxable income: {}", result.taxable_income.normalize()),
    ];
    for slab in &result.per_slab_breakdown {
        let upper = slab
            .to
            .map(|to| to.normalize().to_string())
            .unwrap_or_else(|| "above".to_string());
        lines.push(format!(
            "  {} - {} @ {}: {}",
            slab.from.normalize(),
            upper,
            slab.rate.normalize(),
            slab.tax.normalize()
        ));
    }
    lines.push(format!("Rebate: {}", result.rebate.normalize()));
    lines.push(format!("Surcharge: {}", result.surcharge.normalize()));
    lines.push(format!("Cess: {}", result.cess.normalize()));
    lines.push(format!("Total liability: {}", result.total_tax_liability));
    let settlement = if result.is_refund() { "Refund" } else { "Payable" };
    lines.push(format!("{settlement}: {}", result.refund_or_due.abs()));
    for warning in &result.deductions.warnings {
        lines.push(format!("warning: {}", warning.message()));
    }
    lines.join("\n")
}

fn render_classification(result: &ClassificationResult) -> String {
    let mut lines = vec![
        format!(
            "Recommended form: {} (confidence {})",
            result.recommended_form,
            result.confidence.normalize()
        ),
        result.reasoning.clone(),
    ];
    if !result.alternatives.is_empty() {
        let alternatives: Vec<String> = result.alternatives.iter().map(FormId::to_string).collect();
        lines.push(format!("Alternatives: {}", alternatives.join(", ")));
    }
    if result.requires_ca_review {
        lines.push("CA review required".to_string());
    }
    lines.push(format!("Estimated effort: {} min", result.estimated_minutes));
    if let Some(impact) = &result.switch_impact {
        lines.push(format!(
            "Switching {} -> {}: net {} min",
            impact.from, impact.to, impact.net_minutes
        ));
    }
    lines.join("\n")
}

fn render_report(report: &ValidationReport) -> String {
    let mut lines = vec![format!("Rule set {}", report.rule_set_id)];
    for result in &report.results {
        if result.status == ValidationStatus::Passed {
            continue;
        }
        let position = result
            .record_index
            .map(|index| format!("{}[{index}]", result.scope))
            .unwrap_or_else(|| result.scope.clone());
        lines.push(format!(
            "  {:<7} {:<7} {position} {}: {}",
            result.status.label(),
            result.severity.label(),
            result.rule_id,
            result.message
        ));
    }
    let counts: Vec<String> = report
        .counts()
        .iter()
        .map(|(status, count)| format!("{} {count}", status.label()))
        .collect();
    lines.push(format!("Summary: {}", counts.join(", ")));
    if report.blocks_submission() {
        lines.push("Submission blocked by failed error rules".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use itr_engine::RuleCatalog;

    #[test]
    fn result_text_lists_vi_a_deductions_apart_from_the_standard_deduction() {
        let engine =
            TaxEngine::with_catalog(RuleCatalog::builtin().expect("built-in tables are valid"));
        let request: TaxComputationRequest = serde_json::from_str(
            r#"{
                "income": {"salary": "1000000"},
                "deductions": [{"section": "80C", "claimed": "150000"}],
                "age_category": "general",
                "taxes_already_paid": "0",
                "assessment_year": "2025-26"
            }"#,
        )
        .expect("request parses");
        let result = engine
            .compute_for_regime(&request, Regime::Old)
            .expect("computation succeeds");

        let text = render_result(&result);

        assert!(text.contains("Standard deduction: 50000"), "{text}");
        assert!(text.contains("Chapter VI-A deductions: 150000\n"), "{text}");
    }
}
