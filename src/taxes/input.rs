use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::types::{Date, Decimal};
use crate::util;

use super::errors::{TaxError, TaxResult};
use super::shareholder::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TaxCategory {
    Transfer,
    Gift,
    Inheritance,
    Payroll,
    OtherIncome,
}

/// Already parsed calculation request. The variant selects the calculator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum CalculationInput {
    Transfer(TransferInput),
    Gift(GiftInput),
    Inheritance(InheritanceInput),
    Payroll(PayrollInput),
    OtherIncome(OtherIncomeInput),
}

impl CalculationInput {
    pub fn from_json(data: &str) -> TaxResult<CalculationInput> {
        serde_json::from_str(data).map_err(|e| TaxError::invalid_input("input", e.to_string()))
    }

    pub fn from_yaml(data: &str) -> TaxResult<CalculationInput> {
        serde_yaml::from_str(data).map_err(|e| TaxError::invalid_input("input", e.to_string()))
    }

    pub fn category(&self) -> TaxCategory {
        match self {
            CalculationInput::Transfer(_) => TaxCategory::Transfer,
            CalculationInput::Gift(_) => TaxCategory::Gift,
            CalculationInput::Inheritance(_) => TaxCategory::Inheritance,
            CalculationInput::Payroll(_) => TaxCategory::Payroll,
            CalculationInput::OtherIncome(_) => TaxCategory::OtherIncome,
        }
    }

    pub fn validate(&self) -> TaxResult<()> {
        match self {
            CalculationInput::Transfer(input) => input.validate(),
            CalculationInput::Gift(input) => input.validate(),
            CalculationInput::Inheritance(input) => input.validate(),
            CalculationInput::Payroll(input) => input.validate(),
            CalculationInput::OtherIncome(input) => input.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransferInput {
    pub price: Decimal,
    pub acquisition_cost: Decimal,
    #[serde(default)]
    pub expenses: Decimal,
    pub acquisition_date: Date,
    pub transfer_date: Date,
    pub asset: TransferAsset,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransferAsset {
    RealEstate(RealEstateAsset),
    Stock(StockAsset),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RealEstateAsset {
    pub kind: RealEstateKind,
    /// Number of homes owned by the household including the transferred one
    #[serde(default = "default_homes_owned")]
    pub homes_owned: u32,
    #[serde(default)]
    pub single_residence: bool,
    #[serde(default)]
    pub residence_years: u32,
    #[serde(default)]
    pub regulated_zone: bool,
    #[serde(default)]
    pub non_business_land: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StockAsset {
    pub listing: Listing,
    pub ownership_ratio: Decimal,
    #[serde(default)]
    pub family_ratio: Decimal,
    /// Market value of all shares of the issuer held at the end of the previous year
    pub holding_value: Decimal,
    #[serde(default)]
    pub sme: bool,
    #[serde(default)]
    pub on_market: bool,
}

fn default_homes_owned() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RealEstateKind {
    Housing,
    Land,
    Other,
}

impl TransferInput {
    pub fn holding_years(&self) -> u32 {
        util::full_years_between(self.acquisition_date, self.transfer_date)
    }

    fn validate(&self) -> TaxResult<()> {
        check_amount("price", self.price)?;
        check_amount("acquisition cost", self.acquisition_cost)?;
        check_amount("expenses", self.expenses)?;

        if self.acquisition_date > self.transfer_date {
            return Err(TaxError::invalid_input("transfer date", format!(
                "{} is before the acquisition date ({})",
                util::format_date(self.transfer_date), util::format_date(self.acquisition_date))));
        }

        match self.asset {
            TransferAsset::RealEstate(ref asset) => {
                if asset.single_residence && asset.kind != RealEstateKind::Housing {
                    return Err(TaxError::invalid_input("single residence", format!(
                        "the flag is not applicable to {} transfers", asset.kind)));
                }
                if asset.single_residence && asset.homes_owned > 1 {
                    return Err(TaxError::invalid_input("homes owned", format!(
                        "single residence transfer with {} homes owned", asset.homes_owned)));
                }
                if asset.non_business_land && asset.kind != RealEstateKind::Land {
                    return Err(TaxError::invalid_input("non-business land", format!(
                        "the flag is not applicable to {} transfers", asset.kind)));
                }
            },
            TransferAsset::Stock(ref asset) => {
                check_ratio("ownership ratio", asset.ownership_ratio)?;
                check_ratio("family ratio", asset.family_ratio)?;
                check_amount("holding value", asset.holding_value)?;
            },
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Relationship {
    Spouse,
    LinealAscendant,
    LinealDescendant,
    OtherRelative,
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GiftInput {
    pub value: Decimal,
    pub relationship: Relationship,
    /// Gifts from the same donor (and their spouse) during the previous 10 years
    #[serde(default)]
    pub prior_gifts: Decimal,
    /// Gift tax already paid for the prior gifts
    #[serde(default)]
    pub prior_gift_tax: Decimal,
    /// Debt of the donor assumed by the recipient
    #[serde(default)]
    pub assumed_debt: Decimal,
    #[serde(default)]
    pub recipient_minor: bool,
    #[serde(default)]
    pub marriage_or_birth: bool,
    #[serde(default)]
    pub generation_skipping: bool,
    #[serde(default)]
    pub timely_filing: bool,
    #[serde(default)]
    pub non_taxable_purpose: bool,
}

impl GiftInput {
    fn validate(&self) -> TaxResult<()> {
        check_amount("gift value", self.value)?;
        check_amount("prior gifts", self.prior_gifts)?;
        check_amount("prior gift tax", self.prior_gift_tax)?;
        check_amount("assumed debt", self.assumed_debt)?;

        if self.marriage_or_birth && self.relationship != Relationship::LinealAscendant {
            return Err(TaxError::invalid_input("marriage or birth gift", format!(
                "only gifts from a lineal ascendant qualify, got {}", self.relationship)));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InheritanceInput {
    pub estate_value: Decimal,
    /// Gifts made by the deceased to the heirs during the previous 10 years
    #[serde(default)]
    pub prior_gifts: Decimal,
    #[serde(default)]
    pub debts: Decimal,
    #[serde(default)]
    pub funeral_expenses: Decimal,
    #[serde(default)]
    pub enshrinement_expenses: Decimal,
    #[serde(default)]
    pub financial_assets: Decimal,
    #[serde(default)]
    pub financial_debts: Decimal,

    /// Actual inheritance share of the surviving spouse
    #[serde(default)]
    pub spouse: Option<Decimal>,
    #[serde(default)]
    pub children: u32,
    /// Sum of years left until adulthood over all minor heirs
    #[serde(default)]
    pub minor_years: u32,
    #[serde(default)]
    pub elderly: u32,

    #[serde(default)]
    pub business: Option<BusinessSuccession>,

    #[serde(default)]
    pub generation_skipping: bool,
    #[serde(default)]
    pub heir_minor: bool,
    #[serde(default)]
    pub timely_filing: bool,
    #[serde(default)]
    pub death_in_service: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessSuccession {
    pub asset_value: Decimal,
    pub years_operated: u32,
}

impl InheritanceInput {
    fn validate(&self) -> TaxResult<()> {
        check_amount("estate value", self.estate_value)?;
        check_amount("prior gifts", self.prior_gifts)?;
        check_amount("debts", self.debts)?;
        check_amount("funeral expenses", self.funeral_expenses)?;
        check_amount("enshrinement expenses", self.enshrinement_expenses)?;
        check_amount("financial assets", self.financial_assets)?;
        check_amount("financial debts", self.financial_debts)?;

        if let Some(share) = self.spouse {
            check_amount("spouse share", share)?;
        }

        if let Some(business) = self.business.as_ref() {
            check_amount("business asset value", business.asset_value)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PayrollInput {
    pub annual_salary: Decimal,
    #[serde(default)]
    pub non_taxable: Decimal,
    #[serde(default)]
    pub dependents: u32,
    #[serde(default)]
    pub spouse: bool,
    /// Children eligible for the child tax credit
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub social_insurance: Decimal,
    #[serde(default)]
    pub monthly_rent: Decimal,
    #[serde(default)]
    pub standard_credit: bool,
}

impl PayrollInput {
    fn validate(&self) -> TaxResult<()> {
        check_amount("annual salary", self.annual_salary)?;
        check_amount("non-taxable allowances", self.non_taxable)?;
        check_amount("social insurance", self.social_insurance)?;
        check_amount("monthly rent", self.monthly_rent)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum IncomeKind {
    Other,
    Interest,
    Dividend,
    Business,
    DailyWage,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OtherIncomeInput {
    pub kind: IncomeKind,
    pub amount: Decimal,
    #[serde(default)]
    pub basic_deduction: bool,
    #[serde(default)]
    pub deemed_expenses: bool,
    #[serde(default)]
    pub working_days: u32,
}

impl OtherIncomeInput {
    fn validate(&self) -> TaxResult<()> {
        check_amount("amount", self.amount)?;

        if (self.basic_deduction || self.deemed_expenses) && self.kind != IncomeKind::Other {
            return Err(TaxError::invalid_input("deductions", format!(
                "basic deduction and deemed expenses are applicable only to other income, got {}",
                self.kind)));
        }

        if self.kind == IncomeKind::DailyWage && self.working_days == 0 && !self.amount.is_zero() {
            return Err(TaxError::invalid_input("working days", "daily wages require the number of working days"));
        }

        Ok(())
    }
}

/// Upper bound for any monetary amount (100 trillion won). It keeps every intermediate value of the
/// calculations, including the products of two amounts, within `Decimal` range.
pub const MAX_AMOUNT: Decimal = dec!(100_000_000_000_000);

fn check_amount(field: &'static str, value: Decimal) -> TaxResult<()> {
    if !util::validate_decimal(value, util::DecimalRestrictions::PositiveOrZero) {
        return Err(TaxError::invalid_input(field, format!("{value} is negative")));
    }
    if value > MAX_AMOUNT {
        return Err(TaxError::invalid_input(field, format!("{value} exceeds the maximum of {MAX_AMOUNT}")));
    }
    Ok(())
}

fn check_ratio(field: &'static str, value: Decimal) -> TaxResult<()> {
    if value.is_sign_negative() && !value.is_zero() || value > dec!(1) {
        return Err(TaxError::invalid_input(field, format!("{value} is not a fraction between 0 and 1")));
    }
    Ok(())
}
