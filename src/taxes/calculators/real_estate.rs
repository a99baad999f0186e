use std::cmp;

use log::{debug, trace};

use crate::types::Decimal;
use crate::util;

use crate::taxes::brackets::RateAdjustment;
use crate::taxes::deductions::DeductionSet;
use crate::taxes::errors::{TaxResult, Warning};
use crate::taxes::input::{RealEstateAsset, RealEstateKind, TaxCategory, TransferInput};
use crate::taxes::result::{CalculationResult, ResultBuilder, Totals};
use crate::taxes::tables::{CapitalGainsTables, TaxYearTables};
use crate::taxes::treatment::{ExemptReason, HeavyReason, Treatment};

/// Calculates capital gains tax on real estate transfer.
pub fn calculate(tables: &TaxYearTables, input: &TransferInput, asset: &RealEstateAsset) -> TaxResult<CalculationResult> {
    let rules = &tables.capital_gains;
    let mut result = ResultBuilder::new(TaxCategory::Transfer, tables.year);

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
    let (treatment, adjustment) = classify(rules, input, asset, holding_years);
    debug!("Real estate transfer: {} years of holding, {treatment} treatment.", holding_years);
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

    // A single residence which qualifies for the exemption apart from its price is taxed only for the
    // part of the gain which corresponds to the excess of the price over the ceiling.
    let taxable_gain = if qualifies_for_exemption(rules, asset, holding_years) && input.price > rules.exemption_ceiling {
        let taxable_gain = gain * (input.price - rules.exemption_ceiling) / input.price;
        result.step_with("Taxable gain", util::round_to(taxable_gain, 0), format!(
            "The part above {} exemption ceiling", rules.exemption_ceiling));
        taxable_gain
    } else {
        gain
    };

    let mut deductions = DeductionSet::new();

    if matches!(treatment, Treatment::Standard) {
        let rate = long_term_holding_rate(rules, asset, holding_years);
        trace!("Long-term holding deduction rate: {rate}.");
        deductions.add("Long-term holding deduction", taxable_gain * rate);
    }
    deductions.add("Basic deduction", rules.basic_deduction);

    let base = result.deduct(&deductions, taxable_gain);
    let (tax, rate) = super::progressive_tax(&tables.income_tax, adjustment, base)?;

    totals.taxable_base = base;
    totals.national_tax = tax;
    totals.applied_rate = rate;

    Ok(result.build(deductions, totals))
}

fn classify(
    rules: &CapitalGainsTables, input: &TransferInput, asset: &RealEstateAsset, holding_years: u32,
) -> (Treatment, RateAdjustment) {
    if qualifies_for_exemption(rules, asset, holding_years) && input.price <= rules.exemption_ceiling {
        return (Treatment::Exempt(ExemptReason::SingleResidence), RateAdjustment::None);
    }

    let short_holding_rate = short_holding_rate(rules, asset, holding_years);
    let mut reasons = Vec::new();

    if short_holding_rate.is_some() {
        reasons.push(HeavyReason::ShortHolding);
    }
    if asset.kind == RealEstateKind::Housing && asset.homes_owned >= 2 && asset.regulated_zone {
        reasons.push(HeavyReason::MultipleHomes);
    }
    if asset.kind == RealEstateKind::Land && asset.non_business_land {
        reasons.push(HeavyReason::NonBusinessLand);
    }

    let treatment = Treatment::heavy_of(&reasons).unwrap_or(Treatment::Standard);

    let adjustment = match treatment {
        Treatment::Heavy(HeavyReason::ShortHolding) => match short_holding_rate {
            Some(rate) => RateAdjustment::Flat(rate),
            None => RateAdjustment::None,
        },
        Treatment::Heavy(HeavyReason::MultipleHomes) => RateAdjustment::Surcharge(match asset.homes_owned {
            2 => rules.multiple_homes_surcharge.two_homes,
            _ => rules.multiple_homes_surcharge.three_or_more_homes,
        }),
        Treatment::Heavy(HeavyReason::NonBusinessLand) => RateAdjustment::Surcharge(rules.non_business_land_surcharge),
        _ => RateAdjustment::None,
    };

    (treatment, adjustment)
}

fn is_single_residence(asset: &RealEstateAsset) -> bool {
    asset.kind == RealEstateKind::Housing && asset.single_residence
}

fn qualifies_for_exemption(rules: &CapitalGainsTables, asset: &RealEstateAsset, holding_years: u32) -> bool {
    is_single_residence(asset) && holding_years >= rules.exemption_min_holding_years
}

fn short_holding_rate(rules: &CapitalGainsTables, asset: &RealEstateAsset, holding_years: u32) -> Option<Decimal> {
    let rates = match asset.kind {
        RealEstateKind::Housing => &rules.short_holding.housing,
        RealEstateKind::Land | RealEstateKind::Other => &rules.short_holding.other,
    };
    usize::try_from(holding_years).ok().and_then(|years| rates.get(years)).copied()
}

fn long_term_holding_rate(rules: &CapitalGainsTables, asset: &RealEstateAsset, holding_years: u32) -> Decimal {
    let rules = &rules.long_term_holding;
    if holding_years < rules.min_holding_years {
        return dec!(0);
    }

    let holding_years = Decimal::from(holding_years);

    if !is_single_residence(asset) {
        return cmp::min(holding_years * rules.general_rate, rules.general_limit);
    }

    let holding_rate = cmp::min(holding_years * rules.residence_holding_rate, rules.residence_holding_limit);
    let residence_rate = if asset.residence_years >= rules.min_residence_years {
        cmp::min(Decimal::from(asset.residence_years) * rules.residence_rate, rules.residence_limit)
    } else {
        dec!(0)
    };

    holding_rate + residence_rate
}
