use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde::de::{Deserializer, Error};
use validator::{Validate, ValidationError};

use crate::core::GenericResult;
use crate::types::Decimal;

use super::brackets::BracketTable;
use super::errors::{TaxError, TaxResult};

const BUILTIN_TABLES: &str = include_str!("tables.yaml");

/// Immutable rate and deduction tables of a single tax year.
#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TaxYearTables {
    #[serde(skip)]
    pub year: i32,

    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub local_surtax_rate: Decimal,

    /// Comprehensive income tax schedule
    #[serde(deserialize_with = "deserialize_brackets")]
    pub income_tax: BracketTable,

    #[validate(nested)]
    pub capital_gains: CapitalGainsTables,
    #[validate(nested)]
    pub stock: StockTables,
    #[validate(nested)]
    pub gift: GiftTables,
    #[validate(nested)]
    pub inheritance: InheritanceTables,
    #[validate(nested)]
    pub payroll: PayrollTables,
    #[validate(nested)]
    pub withholding: WithholdingTables,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct CapitalGainsTables {
    #[validate(custom(function = "validate_amount"))]
    pub basic_deduction: Decimal,
    /// Single residence sale price up to which the transfer is exempt
    #[validate(custom(function = "validate_positive_amount"))]
    pub exemption_ceiling: Decimal,
    #[validate(range(min = 1))]
    pub exemption_min_holding_years: u32,

    #[validate(nested)]
    pub short_holding: ShortHoldingRates,
    #[validate(nested)]
    pub multiple_homes_surcharge: MultipleHomesSurcharge,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub non_business_land_surcharge: Decimal,
    #[validate(nested)]
    pub long_term_holding: LongTermHoldingTables,
}

/// Short holding rates indexed by full years of holding. A transfer held longer than a list covers
/// isn't a short holding one.
#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ShortHoldingRates {
    #[serde(deserialize_with = "deserialize_percents")]
    #[validate(length(min = 1), custom(function = "validate_rates"))]
    pub housing: Vec<Decimal>,
    #[serde(deserialize_with = "deserialize_percents")]
    #[validate(length(min = 1), custom(function = "validate_rates"))]
    pub other: Vec<Decimal>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MultipleHomesSurcharge {
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub two_homes: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub three_or_more_homes: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LongTermHoldingTables {
    pub min_holding_years: u32,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub general_rate: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub general_limit: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub residence_holding_rate: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub residence_holding_limit: Decimal,
    pub min_residence_years: u32,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub residence_rate: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub residence_limit: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StockTables {
    #[validate(custom(function = "validate_amount"))]
    pub basic_deduction: Decimal,
    #[validate(nested)]
    pub large_shareholder: LargeShareholderThresholds,
    #[serde(deserialize_with = "deserialize_brackets")]
    pub large_shareholder_brackets: BracketTable,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub small_shareholder_rate: Decimal,
    /// Rate discount for small shareholders of small and medium-sized enterprises
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub sme_discount: Decimal,
    /// Large shareholders of non-SME companies holding the shares for less than this number of full
    /// years are taxed at the short holding rate
    pub short_holding_years: u32,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub short_holding_rate: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LargeShareholderThresholds {
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub kospi_ratio: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub kosdaq_ratio: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub konex_ratio: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub unlisted_ratio: Decimal,
    #[validate(custom(function = "validate_positive_amount"))]
    pub holding_value: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GiftTables {
    #[serde(deserialize_with = "deserialize_brackets")]
    pub brackets: BracketTable,
    #[validate(nested)]
    pub allowances: GiftAllowances,
    #[validate(custom(function = "validate_amount"))]
    pub marriage_or_birth_allowance: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub minimum_taxable_base: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub filing_credit: Decimal,
    #[validate(nested)]
    pub generation_skipping: GenerationSkippingSurcharge,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GiftAllowances {
    #[validate(custom(function = "validate_amount"))]
    pub spouse: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub lineal_ascendant: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub lineal_ascendant_to_minor: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub lineal_descendant: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub other_relative: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GenerationSkippingSurcharge {
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub surcharge: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub minor_surcharge: Decimal,
    /// Taxable value above which the minor surcharge applies
    #[validate(custom(function = "validate_amount"))]
    pub minor_threshold: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct InheritanceTables {
    #[serde(deserialize_with = "deserialize_brackets")]
    pub brackets: BracketTable,

    #[validate(custom(function = "validate_amount"))]
    pub basic_deduction: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub lump_sum_deduction: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub child_deduction: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub minor_deduction_per_year: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub elderly_deduction: Decimal,

    #[validate(nested)]
    pub spouse: SpouseDeduction,
    #[validate(nested)]
    pub funeral: FuneralDeduction,
    #[validate(nested)]
    pub financial_assets: FinancialAssetsDeduction,

    #[validate(length(min = 1), nested, custom(function = "validate_business_succession"))]
    pub business_succession: Vec<BusinessSuccessionTier>,

    #[validate(custom(function = "validate_amount"))]
    pub minimum_taxable_base: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub filing_credit: Decimal,
    #[validate(nested)]
    pub generation_skipping: GenerationSkippingSurcharge,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SpouseDeduction {
    #[validate(custom(function = "validate_amount"))]
    pub min: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub max: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FuneralDeduction {
    #[validate(custom(function = "validate_amount"))]
    pub min: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub max: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub enshrinement_max: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FinancialAssetsDeduction {
    /// Net financial assets up to this amount are deducted completely
    #[validate(custom(function = "validate_amount"))]
    pub full_limit: Decimal,
    /// Net financial assets up to this amount get the fixed deduction
    #[validate(custom(function = "validate_amount"))]
    pub fixed_limit: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub fixed_amount: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub rate: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub max: Decimal,
}

#[derive(Deserialize, Serialize, Validate, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BusinessSuccessionTier {
    #[validate(range(min = 1))]
    pub min_years: u32,
    #[validate(custom(function = "validate_amount"))]
    pub limit: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PayrollTables {
    #[serde(deserialize_with = "deserialize_brackets")]
    pub earned_income_deduction: BracketTable,
    #[validate(custom(function = "validate_amount"))]
    pub earned_income_deduction_limit: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub personal_deduction: Decimal,

    #[serde(deserialize_with = "deserialize_brackets")]
    pub earned_income_credit: BracketTable,
    #[validate(length(min = 1), nested)]
    pub earned_income_credit_limits: Vec<CreditLimitTier>,

    #[validate(nested)]
    pub child_credit: ChildCredit,
    #[validate(nested)]
    pub rent_credit: RentCredit,
    #[validate(custom(function = "validate_amount"))]
    pub standard_credit: Decimal,
}

/// Earned income credit limit for salaries up to `salary_limit`:
/// `max(base - (salary - previous salary_limit) * reduction_rate, floor)`.
#[derive(Deserialize, Serialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreditLimitTier {
    pub salary_limit: Option<Decimal>,
    #[validate(custom(function = "validate_amount"))]
    pub base: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub reduction_rate: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub floor: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ChildCredit {
    #[validate(custom(function = "validate_amount"))]
    pub first: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub second: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub additional: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RentCredit {
    #[validate(custom(function = "validate_amount"))]
    pub max_rent: Decimal,
    #[validate(length(min = 1), nested)]
    pub rates: Vec<RentCreditRate>,
}

#[derive(Deserialize, Serialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RentCreditRate {
    #[validate(custom(function = "validate_positive_amount"))]
    pub salary_limit: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub rate: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct WithholdingTables {
    #[validate(nested)]
    pub rates: WithholdingRates,
    #[validate(custom(function = "validate_amount"))]
    pub basic_deduction: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub deemed_expense_rate: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub daily_wage_deduction: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub daily_wage_credit: Decimal,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct WithholdingRates {
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub other: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub interest: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub dividend: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub business: Decimal,
    #[serde(deserialize_with = "deserialize_percent")]
    #[validate(custom(function = "validate_rate"))]
    pub daily_wage: Decimal,
}

/// Per-year table sets. The registry is an explicit value: callers construct it once and pass it to
/// the engine, nothing is kept in global state.
#[derive(Debug, Clone, Default)]
pub struct TaxTableRegistry {
    years: BTreeMap<i32, TaxYearTables>,
}

impl TaxTableRegistry {
    pub fn builtin() -> TaxResult<TaxTableRegistry> {
        TaxTableRegistry::parse(BUILTIN_TABLES)
    }

    /// Loads the built-in tables with the years from the specified file added on top of them.
    pub fn load(path: &Path) -> GenericResult<TaxTableRegistry> {
        let data = fs::read_to_string(path).map_err(|e| format!(
            "Unable to read {path:?}: {e}"))?;

        let extra = TaxTableRegistry::parse(&data).map_err(|e| format!(
            "Error while reading {path:?}: {e}"))?;

        let mut registry = TaxTableRegistry::builtin()?;
        registry.extend(extra);

        Ok(registry)
    }

    pub fn parse(data: &str) -> TaxResult<TaxTableRegistry> {
        let value: serde_yaml::Value = serde_yaml::from_str(data).map_err(|e| TaxError::configuration(
            e.to_string()))?;

        let value = yaml_merge_keys::merge_keys_serde(value).map_err(|e| TaxError::configuration(format!(
            "Unable to resolve YAML merge keys: {e}")))?;

        let mut years: BTreeMap<i32, TaxYearTables> = serde_yaml::from_value(value).map_err(|e| {
            TaxError::configuration(e.to_string())
        })?;

        for (&year, tables) in years.iter_mut() {
            tables.year = year;
            tables.validate().map_err(|e| TaxError::configuration(format!(
                "{year} tax year: {e}")))?;
        }

        debug!("Loaded tax tables for {} tax years.", years.len());
        Ok(TaxTableRegistry {years})
    }

    pub fn extend(&mut self, other: TaxTableRegistry) {
        self.years.extend(other.years);
    }

    pub fn get(&self, year: i32) -> TaxResult<&TaxYearTables> {
        self.years.get(&year).ok_or_else(|| TaxError::configuration(format!(
            "There are no tax tables for {year} tax year")))
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn latest(&self) -> Option<i32> {
        self.years.keys().next_back().copied()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BracketSpec {
    limit: Option<Decimal>,
    rate: Decimal,
}

fn deserialize_brackets<'de, D>(deserializer: D) -> Result<BracketTable, D::Error>
    where D: Deserializer<'de>
{
    let specs: Vec<BracketSpec> = Deserialize::deserialize(deserializer)?;
    let specs: Vec<(Option<Decimal>, Decimal)> = specs.into_iter()
        .map(|spec| (spec.limit, spec.rate / dec!(100)))
        .collect();

    BracketTable::new(&specs).map_err(D::Error::custom)
}

fn deserialize_percent<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where D: Deserializer<'de>
{
    let percent: Decimal = Deserialize::deserialize(deserializer)?;
    Ok(percent / dec!(100))
}

fn deserialize_percents<'de, D>(deserializer: D) -> Result<Vec<Decimal>, D::Error>
    where D: Deserializer<'de>
{
    let percents: Vec<Decimal> = Deserialize::deserialize(deserializer)?;
    Ok(percents.into_iter().map(|percent| percent / dec!(100)).collect())
}

fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() || value.is_sign_negative() {
        return Err(ValidationError::new("non_positive_amount"));
    }
    Ok(())
}

fn validate_rate(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || *value > dec!(1) {
        return Err(ValidationError::new("invalid_rate"));
    }
    Ok(())
}

fn validate_rates(rates: &[Decimal]) -> Result<(), ValidationError> {
    for rate in rates {
        validate_rate(rate)?;
    }
    Ok(())
}

fn validate_business_succession(tiers: &[BusinessSuccessionTier]) -> Result<(), ValidationError> {
    if !tiers.windows(2).all(|pair| pair[0].min_years < pair[1].min_years) {
        return Err(ValidationError::new("unsorted_business_succession_tiers"));
    }
    Ok(())
}
