//! Per-category tax calculators.
//!
//! Every calculator walks the same pipeline: base computation, deduction resolution, progressive tax
//! with the treatment's rate adjustment and finally credits and local income tax.

pub mod gift;
pub mod inheritance;
pub mod other_income;
pub mod payroll;
pub mod real_estate;
pub mod stock;

use crate::types::Decimal;

use super::brackets::{BracketTable, RateAdjustment};
use super::errors::TaxResult;

/// Calculates tax by the adjusted schedule returning the tax and the applied marginal rate.
fn progressive_tax(schedule: &BracketTable, adjustment: RateAdjustment, base: Decimal) -> TaxResult<(Decimal, Decimal)> {
    let schedule = schedule.adjusted(adjustment)?;

    let tax = schedule.tax(base);
    let rate = if base.is_zero() {
        dec!(0)
    } else {
        schedule.marginal_rate(base)
    };

    Ok((tax, rate))
}

#[cfg(test)]
fn tables(year: i32) -> super::tables::TaxYearTables {
    super::tables::TaxTableRegistry::builtin().unwrap().get(year).unwrap().clone()
}
