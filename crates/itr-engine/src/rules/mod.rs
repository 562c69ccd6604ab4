//! Versioned statutory tables: slabs per regime and age, rebate, surcharge, cess and
//! deduction caps. Everything here is plain data; the calculators in
//! [`crate::computation`] interpret it.

mod builtin;
mod deductions;

pub use builtin::{builtin_rule_sets, rule_set_2024_25, rule_set_2025_26, rule_set_2026_27};
pub use deductions::{
    normalize_section_code, AgeRestriction, CombinedLimit, DeductionTable, IncomeBase, SectionCap,
    SectionRule,
};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Year in which income of the preceding financial year is assessed, e.g. `2025-26`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssessmentYear {
    start: u16,
}

impl AssessmentYear {
    pub const fn new(start: u16) -> Self {
        Self { start }
    }

    pub const fn start_year(self) -> u16 {
        self.start
    }

    /// First day of the assessment year. Age is measured here, which also covers
    /// the rule that a person born on 1 April attains the age on the previous day.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::from(self.start), 4, 1)
    }
}

impl fmt::Display for AssessmentYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start, (self.start + 1) % 100)
    }
}

/// Raised when an assessment year label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not an assessment year (expected YYYY-YY)")]
pub struct AssessmentYearParseError(pub String);

impl FromStr for AssessmentYear {
    type Err = AssessmentYearParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AssessmentYearParseError(raw.to_string());
        let (start, end) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let start: u16 = start.parse().map_err(|_| invalid())?;
        let end: u16 = end.parse().map_err(|_| invalid())?;
        if !(1900..=9998).contains(&start) {
            return Err(invalid());
        }

        let expected_end = start + 1;
        let consecutive = match end {
            0..=99 => end == expected_end % 100,
            _ => end == expected_end,
        };
        if !consecutive {
            return Err(invalid());
        }

        Ok(Self { start })
    }
}

impl TryFrom<String> for AssessmentYear {
    type Error = AssessmentYearParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssessmentYear> for String {
    fn from(value: AssessmentYear) -> Self {
        value.to_string()
    }
}

/// Taxpayer age bracket used to pick an old-regime slab table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeCategory {
    General,
    Senior,
    SuperSenior,
}

impl AgeCategory {
    pub const SENIOR_AGE: u32 = 60;
    pub const SUPER_SENIOR_AGE: u32 = 80;

    pub const fn from_age(age: u32) -> Self {
        if age >= Self::SUPER_SENIOR_AGE {
            Self::SuperSenior
        } else if age >= Self::SENIOR_AGE {
            Self::Senior
        } else {
            Self::General
        }
    }

    pub fn from_birth_date(date_of_birth: NaiveDate, year: AssessmentYear) -> Self {
        let Some(reference) = year.first_day() else {
            return Self::General;
        };
        if date_of_birth >= reference {
            return Self::General;
        }

        let mut age = reference.year() - date_of_birth.year();
        if (reference.month(), reference.day()) < (date_of_birth.month(), date_of_birth.day()) {
            age -= 1;
        }
        Self::from_age(u32::try_from(age).unwrap_or(0))
    }

    pub const fn is_senior(self) -> bool {
        !matches!(self, Self::General)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Senior => "senior",
            Self::SuperSenior => "super_senior",
        }
    }
}

/// The two alternative computation schemes a taxpayer may elect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Old,
    New,
}

impl Regime {
    pub const fn ordered() -> [Self; 2] {
        [Self::Old, Self::New]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Regime {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "old" => Ok(Self::Old),
            "new" | "115bac" => Ok(Self::New),
            other => Err(format!("unknown regime '{other}' (expected old or new)")),
        }
    }
}

/// One income band taxed at a fixed marginal rate. `to` is inclusive; `None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub from: Decimal,
    pub to: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxSlab {
    pub fn new(from: Decimal, to: Option<Decimal>, rate: Decimal) -> Self {
        Self { from, to, rate }
    }
}

/// Ascending, contiguous slabs ending in an unbounded slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlabTable(Vec<TaxSlab>);

impl SlabTable {
    pub fn new(slabs: Vec<TaxSlab>) -> Self {
        Self(slabs)
    }

    pub fn slabs(&self) -> &[TaxSlab] {
        &self.0
    }

    pub fn validate(&self, context: &str) -> Result<(), RuleTableError> {
        let slabs = &self.0;
        let first = slabs.first().ok_or_else(|| RuleTableError::EmptySlabTable {
            context: context.to_string(),
        })?;
        if !first.from.is_zero() {
            return Err(RuleTableError::FirstSlabNotZero {
                context: context.to_string(),
            });
        }

        for (index, slab) in slabs.iter().enumerate() {
            check_rate(context, slab.rate)?;
            let is_last = index + 1 == slabs.len();
            match (slab.to, is_last) {
                (None, true) => {}
                (None, false) | (Some(_), true) => {
                    return Err(RuleTableError::UnboundedSlabPosition {
                        context: context.to_string(),
                        index,
                    })
                }
                (Some(to), false) => {
                    let next = &slabs[index + 1];
                    if to <= slab.from || next.from != to {
                        return Err(RuleTableError::SlabGap {
                            context: context.to_string(),
                            index,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Slab tables keyed by age category; senior tables fall back to `general` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeSlabs {
    pub general: SlabTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senior: Option<SlabTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_senior: Option<SlabTable>,
}

impl AgeSlabs {
    pub fn uniform(table: SlabTable) -> Self {
        Self {
            general: table,
            senior: None,
            super_senior: None,
        }
    }

    pub fn for_age(&self, age: AgeCategory) -> &SlabTable {
        match age {
            AgeCategory::General => &self.general,
            AgeCategory::Senior => self.senior.as_ref().unwrap_or(&self.general),
            AgeCategory::SuperSenior => self
                .super_senior
                .as_ref()
                .or(self.senior.as_ref())
                .unwrap_or(&self.general),
        }
    }
}

/// Section 87A-style rebate: available only when taxable income is within `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebateRule {
    pub threshold: Decimal,
    pub cap: Decimal,
    /// Caps tax just above the threshold at the income in excess of it.
    #[serde(default)]
    pub marginal_relief: bool,
}

/// Surcharge applicable when taxable income is above `above` and within `up_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeBand {
    pub above: Decimal,
    pub up_to: Option<Decimal>,
    pub rate: Decimal,
}

impl SurchargeBand {
    pub fn covers(&self, taxable_income: Decimal) -> bool {
        taxable_income > self.above && self.up_to.map_or(true, |ceiling| taxable_income <= ceiling)
    }
}

/// Everything needed to compute liability under one regime for one assessment year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeRules {
    pub slabs: AgeSlabs,
    pub rebate: RebateRule,
    #[serde(default)]
    pub standard_deduction: Decimal,
    #[serde(default)]
    pub surcharge: Vec<SurchargeBand>,
    /// Sections still deductible under this regime; `None` permits every configured section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permitted_sections: Option<BTreeSet<String>>,
}

impl RegimeRules {
    pub fn permits(&self, section: &str) -> bool {
        let wanted = normalize_section_code(section);
        self.permitted_sections.as_ref().map_or(true, |sections| {
            sections
                .iter()
                .any(|permitted| normalize_section_code(permitted) == wanted)
        })
    }

    pub fn surcharge_band(&self, taxable_income: Decimal) -> Option<&SurchargeBand> {
        self.surcharge.iter().find(|band| band.covers(taxable_income))
    }

    fn validate(&self, regime: Regime) -> Result<(), RuleTableError> {
        let ages = [
            (AgeCategory::General, Some(&self.slabs.general)),
            (AgeCategory::Senior, self.slabs.senior.as_ref()),
            (AgeCategory::SuperSenior, self.slabs.super_senior.as_ref()),
        ];
        for (age, table) in ages {
            if let Some(table) = table {
                table.validate(&format!("{regime} regime, {} slabs", age.label()))?;
            }
        }

        let context = format!("{regime} regime");
        check_non_negative(&context, "rebate threshold", self.rebate.threshold)?;
        check_non_negative(&context, "rebate cap", self.rebate.cap)?;
        check_non_negative(&context, "standard deduction", self.standard_deduction)?;

        let mut previous: Option<&SurchargeBand> = None;
        for (index, band) in self.surcharge.iter().enumerate() {
            check_rate(&context, band.rate)?;
            let ordered = match previous {
                None => true,
                Some(prev) => prev.up_to == Some(band.above) && band.rate >= prev.rate,
            };
            let bounded_correctly = match band.up_to {
                Some(ceiling) => ceiling > band.above && index + 1 < self.surcharge.len(),
                None => index + 1 == self.surcharge.len(),
            };
            if !ordered || !bounded_correctly {
                return Err(RuleTableError::SurchargeOrder { context, index });
            }
            previous = Some(band);
        }

        Ok(())
    }
}

/// Complete, immutable rule table for one assessment year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRuleSet {
    pub assessment_year: AssessmentYear,
    pub cess_rate: Decimal,
    pub old: RegimeRules,
    pub new: RegimeRules,
    pub deductions: DeductionTable,
}

impl TaxRuleSet {
    pub fn regime(&self, regime: Regime) -> &RegimeRules {
        match regime {
            Regime::Old => &self.old,
            Regime::New => &self.new,
        }
    }

    pub fn validate(&self) -> Result<(), RuleTableError> {
        check_rate(&format!("AY {} cess", self.assessment_year), self.cess_rate)?;
        self.old.validate(Regime::Old)?;
        self.new.validate(Regime::New)?;
        self.deductions.validate()
    }
}

/// Invariant violations detected while loading a rule table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleTableError {
    #[error("{context}: slab table is empty")]
    EmptySlabTable { context: String },
    #[error("{context}: first slab must start at zero")]
    FirstSlabNotZero { context: String },
    #[error("{context}: slab {index} is not contiguous with its successor")]
    SlabGap { context: String, index: usize },
    #[error("{context}: only the final slab (not slab {index}) may be unbounded")]
    UnboundedSlabPosition { context: String, index: usize },
    #[error("{context}: rate {rate} outside [0, 1]")]
    RateOutOfRange { context: String, rate: Decimal },
    #[error("{context}: {field} must not be negative")]
    NegativeAmount { context: String, field: String },
    #[error("{context}: surcharge band {index} is out of order")]
    SurchargeOrder { context: String, index: usize },
    #[error("deduction table: {0}")]
    Deduction(String),
    #[error("form decision table: {0}")]
    FormRules(String),
    #[error("validation rule set: {0}")]
    ValidationRules(String),
}

fn check_rate(context: &str, rate: Decimal) -> Result<(), RuleTableError> {
    if rate.is_sign_negative() || rate > Decimal::ONE {
        return Err(RuleTableError::RateOutOfRange {
            context: context.to_string(),
            rate,
        });
    }
    Ok(())
}

fn check_non_negative(context: &str, field: &str, amount: Decimal) -> Result<(), RuleTableError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RuleTableError::NegativeAmount {
            context: context.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_and_formats_assessment_years() {
        let year: AssessmentYear = "2025-26".parse().expect("valid year");
        assert_eq!(year.start_year(), 2025);
        assert_eq!(year.to_string(), "2025-26");
        assert_eq!("2099-2100".parse::<AssessmentYear>(), Ok(AssessmentYear::new(2099)));
        assert!("2025-27".parse::<AssessmentYear>().is_err());
        assert!("2025".parse::<AssessmentYear>().is_err());
    }

    #[test]
    fn age_category_is_measured_on_first_day_of_assessment_year() {
        let year = AssessmentYear::new(2025);
        let born_first_april = NaiveDate::from_ymd_opt(1965, 4, 1).expect("valid");
        let born_second_april = NaiveDate::from_ymd_opt(1965, 4, 2).expect("valid");
        let born_1944 = NaiveDate::from_ymd_opt(1944, 6, 30).expect("valid");

        assert_eq!(
            AgeCategory::from_birth_date(born_first_april, year),
            AgeCategory::Senior
        );
        assert_eq!(
            AgeCategory::from_birth_date(born_second_april, year),
            AgeCategory::General
        );
        assert_eq!(
            AgeCategory::from_birth_date(born_1944, year),
            AgeCategory::SuperSenior
        );
    }

    #[test]
    fn rejects_gapped_slab_tables() {
        let table = SlabTable::new(vec![
            TaxSlab::new(dec!(0), Some(dec!(300000)), dec!(0)),
            TaxSlab::new(dec!(300001), None, dec!(0.05)),
        ]);
        assert!(matches!(
            table.validate("test"),
            Err(RuleTableError::SlabGap { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_bounded_final_slab() {
        let table = SlabTable::new(vec![TaxSlab::new(dec!(0), Some(dec!(300000)), dec!(0))]);
        assert!(matches!(
            table.validate("test"),
            Err(RuleTableError::UnboundedSlabPosition { index: 0, .. })
        ));
    }

    #[test]
    fn builtin_tables_satisfy_invariants() {
        for rule_set in builtin_rule_sets() {
            rule_set
                .validate()
                .unwrap_or_else(|err| panic!("AY {}: {err}", rule_set.assessment_year));
        }
    }

    #[test]
    fn senior_tables_fall_back_to_general() {
        let rules = rule_set_2025_26();
        let new_general = rules.new.slabs.for_age(AgeCategory::General);
        assert_eq!(rules.new.slabs.for_age(AgeCategory::SuperSenior), new_general);
        assert_ne!(
            rules.old.slabs.for_age(AgeCategory::Senior),
            rules.old.slabs.for_age(AgeCategory::General)
        );
    }
}
