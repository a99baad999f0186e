use log::debug;

use crate::taxes::brackets::{BracketTable, RateAdjustment};
use crate::taxes::deductions::DeductionSet;
use crate::taxes::errors::{TaxResult, Warning};
use crate::taxes::input::{StockAsset, TaxCategory, TransferInput};
use crate::taxes::result::{CalculationResult, ResultBuilder, Totals};
use crate::taxes::shareholder::{self, LargeShareholderReason, ShareholderClass};
use crate::taxes::tables::TaxYearTables;
use crate::taxes::treatment::{ExemptReason, HeavyReason, Treatment};

/// Calculates stock transfer tax.
pub fn calculate(tables: &TaxYearTables, input: &TransferInput, asset: &StockAsset) -> TaxResult<CalculationResult> {
    let rules = &tables.stock;
    let mut result = ResultBuilder::new(TaxCategory::Transfer, tables.year);

    let mut family_ratio = asset.family_ratio;
    let ratio = asset.ownership_ratio + asset.family_ratio;
    if ratio > dec!(1) {
        result.warn(Warning::RatioExceedsWhole {ratio});
        family_ratio = dec!(1) - asset.ownership_ratio;
    }

    let class = shareholder::classify_shareholder(
        asset.ownership_ratio, family_ratio, asset.holding_value, asset.listing, &rules.large_shareholder);
    result.step_with("Shareholder", dec!(0), describe(&class));

    result.step("Transfer price", input.price);
    result.step("Acquisition cost", -input.acquisition_cost);
    if !input.expenses.is_zero() {
        result.step("Expenses", -input.expenses);
    }

    let mut gain = input.price - input.acquisition_cost - input.expenses;
    if gain.is_sign_negative() && !gain.is_zero() {
        result.warn(Warning::NegativeGain {gain});
        gain = dec!(0);
    }
    result.step("Capital gain", gain);

    let holding_years = input.holding_years();
    let treatment = if !class.is_large && asset.listing.is_listed() && asset.on_market {
        Treatment::Exempt(ExemptReason::SmallShareholderOnMarket)
    } else if class.is_large && !asset.sme && holding_years < rules.short_holding_years {
        Treatment::Heavy(HeavyReason::ShortHolding)
    } else {
        Treatment::Standard
    };
    debug!("Stock transfer: {} shareholder, {treatment} treatment.", if class.is_large { "large" } else { "small" });
    result.treatment(treatment);

    let mut totals = Totals {
        gross: input.price,
        taxable_base: dec!(0),
        national_tax: dec!(0),
        local_surtax_rate: tables.local_surtax_rate,
        applied_rate: dec!(0),
        proceeds: input.price - input.expenses,
    };

    if treatment.is_exempt() {
        return Ok(result.build(DeductionSet::new(), totals));
    }

    let (schedule, adjustment) = if class.is_large {
        let adjustment = match treatment {
            Treatment::Heavy(_) => RateAdjustment::Flat(rules.short_holding_rate),
            _ => RateAdjustment::None,
        };
        (rules.large_shareholder_brackets.clone(), adjustment)
    } else {
        let adjustment = if asset.sme {
            RateAdjustment::Scale(dec!(1) - rules.sme_discount)
        } else {
            RateAdjustment::None
        };
        (BracketTable::flat(rules.small_shareholder_rate)?, adjustment)
    };

    let mut deductions = DeductionSet::new();
    deductions.add("Basic deduction", rules.basic_deduction);

    let base = result.deduct(&deductions, gain);
    let (tax, rate) = super::progressive_tax(&schedule, adjustment, base)?;

    totals.taxable_base = base;
    totals.national_tax = tax;
    totals.applied_rate = rate;

    Ok(result.build(deductions, totals))
}

fn describe(class: &ShareholderClass) -> String {
    if !class.is_large {
        return "small".to_owned();
    }

    let reasons: Vec<String> = class.reasons.iter().map(|reason| match reason {
        LargeShareholderReason::OwnershipRatio {ratio, threshold} => format!(
            "ownership ratio {}% ≥ {}%", (ratio * dec!(100)).normalize(), (threshold * dec!(100)).normalize()),
        LargeShareholderReason::HoldingValue {value, threshold} => format!(
            "holding value {value} ≥ {threshold}"),
    }).collect();

    format!("large ({})", reasons.join(", "))
}
