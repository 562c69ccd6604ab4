use serde::{Deserialize, Serialize};

use super::table::{FormCatalog, FormId};

/// What changes when a taxpayer moves from the form they were using to the
/// recommended one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchImpact {
    pub from: FormId,
    pub to: FormId,
    pub added_fields: Vec<String>,
    pub removed_fields: Vec<String>,
    pub additional_minutes: u32,
    pub saved_minutes: u32,
    /// `additional_minutes - saved_minutes` plus the difference in base effort.
    pub net_minutes: i64,
    pub ca_review_newly_required: bool,
}

pub fn switch_impact(catalog: &FormCatalog, from: FormId, to: FormId) -> Option<SwitchImpact> {
    if from == to {
        return None;
    }
    let current = catalog.form(from)?;
    let target = catalog.form(to)?;

    let added_fields: Vec<String> = target
        .required_fields
        .difference(&current.required_fields)
        .cloned()
        .collect();
    let removed_fields: Vec<String> = current
        .required_fields
        .difference(&target.required_fields)
        .cloned()
        .collect();

    let additional_minutes: u32 = added_fields.iter().map(|f| catalog.minutes_for(f)).sum();
    let saved_minutes: u32 = removed_fields.iter().map(|f| catalog.minutes_for(f)).sum();
    let net_minutes = i64::from(additional_minutes) - i64::from(saved_minutes)
        + i64::from(target.base_minutes)
        - i64::from(current.base_minutes);

    Some(SwitchImpact {
        from,
        to,
        added_fields,
        removed_fields,
        additional_minutes,
        saved_minutes,
        net_minutes,
        ca_review_newly_required: target.requires_ca_review && !current.requires_ca_review,
    })
}
