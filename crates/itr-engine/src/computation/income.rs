use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Heads of income recognised by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeCategory {
    Salary,
    HouseProperty,
    BusinessProfession,
    CapitalGains,
    OtherSources,
}

impl IncomeCategory {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Salary,
            Self::HouseProperty,
            Self::BusinessProfession,
            Self::CapitalGains,
            Self::OtherSources,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Salary => "salary",
            Self::HouseProperty => "house_property",
            Self::BusinessProfession => "business_profession",
            Self::CapitalGains => "capital_gains",
            Self::OtherSources => "other_sources",
        }
    }
}

/// Declared amounts per head of income. Absent heads count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncomeProfile {
    amounts: BTreeMap<IncomeCategory, Decimal>,
}

impl IncomeProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: IncomeCategory, amount: Decimal) -> Self {
        self.set(category, amount);
        self
    }

    /// Replaces the declared amount; repeated declarations do not accumulate.
    pub fn set(&mut self, category: IncomeCategory, amount: Decimal) {
        self.amounts.insert(category, amount);
    }

    pub fn amount(&self, category: IncomeCategory) -> Decimal {
        self.amounts.get(&category).copied().unwrap_or_default()
    }
}

/// Aggregated income: every head (zero-filled) plus the gross total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub by_category: BTreeMap<IncomeCategory, Decimal>,
    pub gross_total_income: Decimal,
}

impl IncomeBreakdown {
    pub fn amount(&self, category: IncomeCategory) -> Decimal {
        self.by_category.get(&category).copied().unwrap_or_default()
    }
}

pub fn aggregate(profile: &IncomeProfile) -> Result<IncomeBreakdown, EngineError> {
    let mut by_category = BTreeMap::new();
    let mut gross_total_income = Decimal::ZERO;

    for category in IncomeCategory::ordered() {
        let amount = profile.amount(category);
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(EngineError::negative(format!("income.{}", category.label())));
        }
        gross_total_income += amount;
        by_category.insert(category, amount);
    }

    Ok(IncomeBreakdown {
        by_category,
        gross_total_income,
    })
}
