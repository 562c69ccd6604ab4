use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidentialStatus {
    #[default]
    Resident,
    NotOrdinarilyResident,
    NonResident,
}

/// Shape of a taxpayer's filing, as far as form selection is concerned.
///
/// Every field is optional. A field that is absent is "not present" for rule
/// evaluation: amounts read as zero and flags as false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAttributes {
    pub residential_status: Option<ResidentialStatus>,
    pub salary_income: Option<Decimal>,
    pub pension_income: Option<Decimal>,
    pub house_property_count: Option<u32>,
    pub business_income: Option<Decimal>,
    pub business_turnover: Option<Decimal>,
    pub presumptive_income: Option<Decimal>,
    /// Capital gains other than section 112A long-term gains.
    pub capital_gains: Option<Decimal>,
    pub ltcg_112a: Option<Decimal>,
    pub interest_income: Option<Decimal>,
    pub dividend_income: Option<Decimal>,
    pub agricultural_income: Option<Decimal>,
    pub total_income: Option<Decimal>,
    pub is_director: Option<bool>,
    pub holds_unlisted_equity: Option<bool>,
    pub is_partner_in_firm: Option<bool>,
    pub has_foreign_assets: Option<bool>,
    pub has_foreign_income: Option<bool>,
    pub has_brought_forward_losses: Option<bool>,
    pub has_deferred_esop_tax: Option<bool>,
    pub has_virtual_digital_assets: Option<bool>,
    /// Schedules and supporting fields the taxpayer has already provided.
    pub supplied_fields: BTreeSet<String>,
}

/// Numeric attributes a rule condition can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountAttribute {
    SalaryIncome,
    PensionIncome,
    BusinessIncome,
    BusinessTurnover,
    PresumptiveIncome,
    CapitalGains,
    Ltcg112a,
    InterestIncome,
    DividendIncome,
    AgriculturalIncome,
    TotalIncome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountAttribute {
    HouseProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagAttribute {
    NonResident,
    NotOrdinarilyResident,
    Director,
    UnlistedEquity,
    PartnerInFirm,
    ForeignAssets,
    ForeignIncome,
    BroughtForwardLosses,
    DeferredEsopTax,
    VirtualDigitalAssets,
}

impl ProfileAttributes {
    pub fn amount(&self, attribute: AmountAttribute) -> Decimal {
        let value = match attribute {
            AmountAttribute::SalaryIncome => self.salary_income,
            AmountAttribute::PensionIncome => self.pension_income,
            AmountAttribute::BusinessIncome => self.business_income,
            AmountAttribute::BusinessTurnover => self.business_turnover,
            AmountAttribute::PresumptiveIncome => self.presumptive_income,
            AmountAttribute::CapitalGains => self.capital_gains,
            AmountAttribute::Ltcg112a => self.ltcg_112a,
            AmountAttribute::InterestIncome => self.interest_income,
            AmountAttribute::DividendIncome => self.dividend_income,
            AmountAttribute::AgriculturalIncome => self.agricultural_income,
            AmountAttribute::TotalIncome => self.total_income,
        };
        value.unwrap_or_default()
    }

    pub fn count(&self, attribute: CountAttribute) -> u32 {
        match attribute {
            CountAttribute::HouseProperties => self.house_property_count.unwrap_or_default(),
        }
    }

    pub fn flag(&self, attribute: FlagAttribute) -> bool {
        let status = self.residential_status.unwrap_or_default();
        match attribute {
            FlagAttribute::NonResident => status == ResidentialStatus::NonResident,
            FlagAttribute::NotOrdinarilyResident => {
                status == ResidentialStatus::NotOrdinarilyResident
            }
            FlagAttribute::Director => self.is_director.unwrap_or_default(),
            FlagAttribute::UnlistedEquity => self.holds_unlisted_equity.unwrap_or_default(),
            FlagAttribute::PartnerInFirm => self.is_partner_in_firm.unwrap_or_default(),
            FlagAttribute::ForeignAssets => self.has_foreign_assets.unwrap_or_default(),
            FlagAttribute::ForeignIncome => self.has_foreign_income.unwrap_or_default(),
            FlagAttribute::BroughtForwardLosses => {
                self.has_brought_forward_losses.unwrap_or_default()
            }
            FlagAttribute::DeferredEsopTax => self.has_deferred_esop_tax.unwrap_or_default(),
            FlagAttribute::VirtualDigitalAssets => {
                self.has_virtual_digital_assets.unwrap_or_default()
            }
        }
    }

    pub fn has_supplied(&self, field: &str) -> bool {
        self.supplied_fields.contains(field)
    }
}
