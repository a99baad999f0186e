use std::cmp;

use log::debug;

use crate::types::Decimal;
use crate::util;

use crate::taxes::brackets::RateAdjustment;
use crate::taxes::deductions::DeductionSet;
use crate::taxes::errors::{TaxResult, Warning};
use crate::taxes::input::{GiftInput, Relationship, TaxCategory};
use crate::taxes::result::{CalculationResult, ResultBuilder, Totals};
use crate::taxes::tables::{GenerationSkippingSurcharge, GiftTables, TaxYearTables};
use crate::taxes::treatment::{ExemptReason, HeavyReason, Treatment};

pub fn calculate(tables: &TaxYearTables, input: &GiftInput) -> TaxResult<CalculationResult> {
    let rules = &tables.gift;
    let mut result = ResultBuilder::new(TaxCategory::Gift, tables.year);

    result.step("Gift value", input.value);

    let mut value = input.value;
    if !input.assumed_debt.is_zero() {
        result.step("Assumed debt", -input.assumed_debt);

        if input.assumed_debt > input.value {
            result.warn(Warning::AssumedDebtExceedsValue {value: input.value, debt: input.assumed_debt});
            value = dec!(0);
        } else {
            value -= input.assumed_debt;
        }
    }

    if !input.prior_gifts.is_zero() {
        result.step("Prior gifts", input.prior_gifts);
    }
    let gross = value + input.prior_gifts;
    result.step("Gross taxable value", gross);

    let treatment = if input.non_taxable_purpose {
        Treatment::Exempt(ExemptReason::NonTaxablePurpose)
    } else if input.generation_skipping {
        Treatment::Heavy(HeavyReason::GenerationSkipping)
    } else {
        Treatment::Standard
    };
    debug!("Gift from {}: {treatment} treatment.", input.relationship);
    result.treatment(treatment);

    let mut totals = Totals {
        gross: input.value,
        taxable_base: dec!(0),
        national_tax: dec!(0),
        local_surtax_rate: dec!(0),
        applied_rate: dec!(0),
        proceeds: input.value,
    };

    if treatment.is_exempt() {
        return Ok(result.build(DeductionSet::new(), totals));
    }

    let mut deductions = DeductionSet::new();
    deductions.add("Relationship allowance", relationship_allowance(rules, input));
    if input.marriage_or_birth {
        deductions.add("Marriage or birth allowance", rules.marriage_or_birth_allowance);
    }

    let base = result.deduct(&deductions, gross);
    totals.taxable_base = base;

    if base < rules.minimum_taxable_base {
        result.step_with("Minimum taxable base", rules.minimum_taxable_base, "The base is below the minimum, no tax is due");
        return Ok(result.build(deductions, totals));
    }

    let adjustment = generation_skipping_adjustment(
        treatment, &rules.generation_skipping, input.recipient_minor, gross);
    let (tax, rate) = super::progressive_tax(&rules.brackets, adjustment, base)?;
    result.step("Calculated tax", util::round_to(tax, 0));

    let prior_tax_credit = cmp::min(input.prior_gift_tax, tax);
    let filing_credit = if input.timely_filing {
        (tax - prior_tax_credit) * rules.filing_credit
    } else {
        dec!(0)
    };

    totals.national_tax = result.credit(tax, &[
        ("Prior gift tax credit", prior_tax_credit),
        ("Filing credit", filing_credit),
    ]);
    totals.applied_rate = rate;

    Ok(result.build(deductions, totals))
}

fn relationship_allowance(rules: &GiftTables, input: &GiftInput) -> Decimal {
    let allowances = &rules.allowances;
    match input.relationship {
        Relationship::Spouse => allowances.spouse,
        Relationship::LinealAscendant if input.recipient_minor => allowances.lineal_ascendant_to_minor,
        Relationship::LinealAscendant => allowances.lineal_ascendant,
        Relationship::LinealDescendant => allowances.lineal_descendant,
        Relationship::OtherRelative => allowances.other_relative,
        Relationship::Other => dec!(0),
    }
}

/// Generation skipping transfers are taxed with a surcharge over the calculated tax which is the same
/// as scaling of every tier rate.
pub(super) fn generation_skipping_adjustment(
    treatment: Treatment, rules: &GenerationSkippingSurcharge, minor: bool, gross: Decimal,
) -> RateAdjustment {
    if treatment != Treatment::Heavy(HeavyReason::GenerationSkipping) {
        return RateAdjustment::None;
    }

    let surcharge = if minor && gross > rules.minor_threshold {
        rules.minor_surcharge
    } else {
        rules.surcharge
    };

    RateAdjustment::Scale(dec!(1) + surcharge)
}
