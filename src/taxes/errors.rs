use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::Decimal;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaxError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    #[error("Invalid tax configuration: {0}")]
    Configuration(String),
}

impl TaxError {
    pub fn invalid_input<R: Into<String>>(field: &'static str, reason: R) -> TaxError {
        TaxError::InvalidInput {field, reason: reason.into()}
    }

    pub fn configuration<R: Into<String>>(reason: R) -> TaxError {
        TaxError::Configuration(reason.into())
    }
}

pub type TaxResult<T> = Result<T, TaxError>;

/// Non-fatal findings: the input is well-formed, but some value had to be clamped to its nearest
/// valid bound to continue the calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    DeductionsExceedBase {
        base: Decimal,
        deductions: Decimal,
    },
    NegativeGain {
        gain: Decimal,
    },
    RatioExceedsWhole {
        ratio: Decimal,
    },
    CreditsExceedTax {
        tax: Decimal,
        credits: Decimal,
    },
    AssumedDebtExceedsValue {
        value: Decimal,
        debt: Decimal,
    },
    NonTaxableExceedsSalary {
        salary: Decimal,
        non_taxable: Decimal,
    },
    BusinessSuccessionIneligible {
        years_operated: u32,
        required: u32,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::DeductionsExceedBase {base, deductions} => write!(f,
                "Deductions ({deductions}) exceed the taxable base ({base}), the base is clamped to zero"),
            Warning::NegativeGain {gain} => write!(f,
                "The transfer results in a loss ({gain}), the gain is clamped to zero"),
            Warning::RatioExceedsWhole {ratio} => write!(f,
                "Ownership ratios sum up to {}% which exceeds 100%, clamped to 100%", ratio * dec!(100)),
            Warning::CreditsExceedTax {tax, credits} => write!(f,
                "Tax credits ({credits}) exceed the calculated tax ({tax}), only {tax} is credited"),
            Warning::AssumedDebtExceedsValue {value, debt} => write!(f,
                "Assumed debt ({debt}) exceeds the gift value ({value}), the value is clamped to zero"),
            Warning::NonTaxableExceedsSalary {salary, non_taxable} => write!(f,
                "Non-taxable allowances ({non_taxable}) exceed the salary ({salary}), clamped to the salary"),
            Warning::BusinessSuccessionIneligible {years_operated, required} => write!(f,
                "The business has been operated for {years_operated} years, at least {required} years are \
                 required for the business succession deduction"),
        }
    }
}
