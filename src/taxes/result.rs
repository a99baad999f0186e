use serde::Serialize;

use crate::types::Decimal;
use crate::util;

use super::deductions::{DeductionSet, Residual};
use super::errors::Warning;
use super::input::TaxCategory;
use super::treatment::Treatment;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownStep {
    pub label: &'static str,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub category: TaxCategory,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<Treatment>,

    pub taxable_base: Decimal,
    pub national_tax: Decimal,
    pub local_surtax: Decimal,
    pub total_tax: Decimal,
    pub net_proceeds: Decimal,

    pub applied_rate: Decimal,
    pub effective_rate: Decimal,

    pub deductions: DeductionSet,
    pub breakdown: Vec<BreakdownStep>,
    pub warnings: Vec<Warning>,
}

/// Accumulates the audit trail of a calculation while a calculator walks through its pipeline.
pub struct ResultBuilder {
    category: TaxCategory,
    year: i32,
    treatment: Option<Treatment>,
    breakdown: Vec<BreakdownStep>,
    warnings: Vec<Warning>,
}

/// Final figures of a calculation. Everything else is derived by the builder.
pub struct Totals {
    pub gross: Decimal,
    pub taxable_base: Decimal,
    pub national_tax: Decimal,
    pub local_surtax_rate: Decimal,
    pub applied_rate: Decimal,
    /// Amount the total tax is subtracted from to get the net proceeds
    pub proceeds: Decimal,
}

impl ResultBuilder {
    pub fn new(category: TaxCategory, year: i32) -> ResultBuilder {
        ResultBuilder {
            category, year,
            treatment: None,
            breakdown: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn treatment(&mut self, treatment: Treatment) {
        self.treatment = Some(treatment);
        self.step_with("Treatment", dec!(0), treatment.to_string());
    }

    pub fn step(&mut self, label: &'static str, amount: Decimal) {
        self.breakdown.push(BreakdownStep {label, amount, description: None});
    }

    pub fn step_with<D: Into<String>>(&mut self, label: &'static str, amount: Decimal, description: D) {
        self.breakdown.push(BreakdownStep {label, amount, description: Some(description.into())});
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Applies the deductions to the base recording every deduction and a possible clamping.
    pub fn deduct(&mut self, deductions: &DeductionSet, base: Decimal) -> Decimal {
        for deduction in deductions.iter() {
            self.step(deduction.name, -deduction.amount);
        }

        let Residual {base, warning} = deductions.apply(base);
        if let Some(warning) = warning {
            self.warn(warning);
        }

        base
    }

    /// Subtracts credits from the tax. Credits never turn the tax negative.
    pub fn credit(&mut self, tax: Decimal, credits: &[(&'static str, Decimal)]) -> Decimal {
        let mut total = dec!(0);

        for &(label, amount) in credits {
            let amount = util::round_to(amount, 0);
            if !amount.is_zero() {
                self.step(label, -amount);
                total += amount;
            }
        }

        if total > tax {
            self.warn(Warning::CreditsExceedTax {tax, credits: total});
            return dec!(0);
        }

        tax - total
    }

    pub fn build(mut self, deductions: DeductionSet, totals: Totals) -> CalculationResult {
        let national_tax = util::round_to(totals.national_tax, 0);
        let local_surtax = util::round_to(national_tax * totals.local_surtax_rate, 0);
        let total_tax = national_tax + local_surtax;

        self.step("National tax", national_tax);
        if !totals.local_surtax_rate.is_zero() {
            self.step("Local income tax", local_surtax);
        }
        self.step("Total tax", total_tax);

        let effective_rate = if totals.gross.is_zero() {
            dec!(0)
        } else {
            util::round_to(total_tax / totals.gross, 4)
        };

        CalculationResult {
            category: self.category,
            year: self.year,
            treatment: self.treatment,

            taxable_base: util::round_to(totals.taxable_base, 0),
            national_tax,
            local_surtax,
            total_tax,
            net_proceeds: totals.proceeds - total_tax,

            applied_rate: totals.applied_rate,
            effective_rate,

            deductions,
            breakdown: self.breakdown,
            warnings: self.warnings,
        }
    }
}
