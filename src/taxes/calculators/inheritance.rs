use std::cmp;

use log::{debug, trace};

use crate::types::Decimal;
use crate::util;

use crate::taxes::deductions::{self, DeductionSet};
use crate::taxes::errors::{TaxResult, Warning};
use crate::taxes::input::{BusinessSuccession, InheritanceInput, TaxCategory};
use crate::taxes::result::{CalculationResult, ResultBuilder, Totals};
use crate::taxes::tables::{InheritanceTables, TaxYearTables};
use crate::taxes::treatment::{ExemptReason, HeavyReason, Treatment};

use super::gift::generation_skipping_adjustment;

pub fn calculate(tables: &TaxYearTables, input: &InheritanceInput) -> TaxResult<CalculationResult> {
    let rules = &tables.inheritance;
    let mut result = ResultBuilder::new(TaxCategory::Inheritance, tables.year);

    result.step("Estate value", input.estate_value);
    if !input.prior_gifts.is_zero() {
        result.step("Prior gifts", input.prior_gifts);
    }

    let treatment = if input.death_in_service {
        Treatment::Exempt(ExemptReason::DeathInService)
    } else if input.generation_skipping {
        Treatment::Heavy(HeavyReason::GenerationSkipping)
    } else {
        Treatment::Standard
    };
    debug!("Inheritance: {treatment} treatment.");
    result.treatment(treatment);

    let mut totals = Totals {
        gross: input.estate_value,
        taxable_base: dec!(0),
        national_tax: dec!(0),
        local_surtax_rate: dec!(0),
        applied_rate: dec!(0),
        proceeds: input.estate_value,
    };

    if treatment.is_exempt() {
        return Ok(result.build(DeductionSet::new(), totals));
    }

    let mut deductions = DeductionSet::new();

    // Liabilities of the estate
    deductions.add("Debts", input.debts);
    deductions.add("Funeral expenses", cmp::min(
        cmp::max(input.funeral_expenses, rules.funeral.min), rules.funeral.max));
    deductions.add("Enshrinement expenses", cmp::min(input.enshrinement_expenses, rules.funeral.enshrinement_max));

    let gross = deductions::clamp(input.estate_value + input.prior_gifts - deductions.total());

    let personal = rules.basic_deduction
        + Decimal::from(input.children) * rules.child_deduction
        + Decimal::from(input.minor_years) * rules.minor_deduction_per_year
        + Decimal::from(input.elderly) * rules.elderly_deduction;
    trace!("Basic and personal deductions: {personal}, lump-sum deduction: {}.", rules.lump_sum_deduction);

    if personal > rules.lump_sum_deduction {
        deductions.add("Basic and personal deductions", personal);
    } else {
        deductions.add("Lump-sum deduction", rules.lump_sum_deduction);
    }

    if let Some(share) = input.spouse {
        deductions.add("Spouse deduction", cmp::max(rules.spouse.min, cmp::min(share, rules.spouse.max)));
    }

    deductions.add("Financial assets deduction", financial_assets_deduction(
        rules, input.financial_assets, input.financial_debts));

    if let Some(business) = input.business.as_ref() {
        match business_succession_deduction(rules, business) {
            Some(deduction) => deductions.add("Business succession deduction", deduction),
            None => result.warn(Warning::BusinessSuccessionIneligible {
                years_operated: business.years_operated,
                required: rules.business_succession.first().map(|tier| tier.min_years).unwrap_or_default(),
            }),
        }
    }

    let base = result.deduct(&deductions, input.estate_value + input.prior_gifts);
    totals.taxable_base = base;

    if base < rules.minimum_taxable_base {
        result.step_with("Minimum taxable base", rules.minimum_taxable_base, "The base is below the minimum, no tax is due");
        return Ok(result.build(deductions, totals));
    }

    let adjustment = generation_skipping_adjustment(
        treatment, &rules.generation_skipping, input.heir_minor, gross);
    let (tax, rate) = super::progressive_tax(&rules.brackets, adjustment, base)?;
    result.step("Calculated tax", util::round_to(tax, 0));

    let filing_credit = if input.timely_filing {
        tax * rules.filing_credit
    } else {
        dec!(0)
    };

    totals.national_tax = result.credit(tax, &[("Filing credit", filing_credit)]);
    totals.applied_rate = rate;

    Ok(result.build(deductions, totals))
}

fn financial_assets_deduction(rules: &InheritanceTables, assets: Decimal, debts: Decimal) -> Decimal {
    let rules = &rules.financial_assets;
    let net = deductions::clamp(assets - debts);

    if net <= rules.full_limit {
        net
    } else if net <= rules.fixed_limit {
        rules.fixed_amount
    } else {
        cmp::min(net * rules.rate, rules.max)
    }
}

/// Returns `None` if the business has been operated for too short period to be eligible.
fn business_succession_deduction(rules: &InheritanceTables, business: &BusinessSuccession) -> Option<Decimal> {
    let tier = rules.business_succession.iter()
        .rev()
        .find(|tier| business.years_operated >= tier.min_years)?;

    Some(cmp::min(tier.limit, business.asset_value))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use pretty_assertions::assert_eq;
    use super::*;

    fn inheritance(estate_value: Decimal) -> InheritanceInput {
        InheritanceInput {
            estate_value,
            prior_gifts: dec!(0),
            debts: dec!(0),
            funeral_expenses: dec!(0),
            enshrinement_expenses: dec!(0),
            financial_assets: dec!(0),
            financial_debts: dec!(0),
            spouse: None,
            children: 0,
            minor_years: 0,
            elderly: 0,
            business: None,
            generation_skipping: false,
            heir_minor: false,
            timely_filing: false,
            death_in_service: false,
        }
    }

    fn calc(input: &InheritanceInput) -> CalculationResult {
        calculate(&super::super::tables(2024), input).unwrap()
    }

    #[test]
    fn lump_sum_deduction() {
        let input = InheritanceInput {
            debts: dec!(100_000_000),
            funeral_expenses: dec!(3_000_000),
            children: 2,
            timely_filing: true,
            ..inheritance(dec!(1_500_000_000))
        };
        let result = calc(&input);

        assert_eq!(result.deductions.get("Funeral expenses"), Some(dec!(5_000_000)));
        assert_eq!(result.deductions.get("Lump-sum deduction"), Some(dec!(500_000_000)));
        assert_eq!(result.deductions.get("Basic and personal deductions"), None);

        // 10M + 80M + 395M * 30% - 3% filing credit
        assert_eq!(result.taxable_base, dec!(895_000_000));
        assert_eq!(result.national_tax, dec!(202_245_000));
        assert_eq!(result.local_surtax, dec!(0));
        assert_eq!(result.applied_rate, dec!(0.3));
    }

    #[test]
    fn personal_deductions() {
        let input = InheritanceInput {
            children: 3,
            minor_years: 15,
            elderly: 1,
            ..inheritance(dec!(1_000_000_000))
        };
        let result = calc(&input);

        // 200M + 3 * 50M + 15 * 10M + 50M
        assert_eq!(result.deductions.get("Basic and personal deductions"), Some(dec!(550_000_000)));
        assert_eq!(result.deductions.get("Lump-sum deduction"), None);
    }

    #[test]
    fn spouse_and_financial_assets() {
        let input = InheritanceInput {
            funeral_expenses: dec!(12_000_000),
            enshrinement_expenses: dec!(7_000_000),
            financial_assets: dec!(300_000_000),
            spouse: Some(dec!(2_000_000_000)),
            children: 1,
            ..inheritance(dec!(5_000_000_000))
        };
        let result = calc(&input);

        assert_eq!(result.deductions.get("Funeral expenses"), Some(dec!(10_000_000)));
        assert_eq!(result.deductions.get("Enshrinement expenses"), Some(dec!(5_000_000)));
        assert_eq!(result.deductions.get("Spouse deduction"), Some(dec!(2_000_000_000)));
        assert_eq!(result.deductions.get("Financial assets deduction"), Some(dec!(60_000_000)));

        // 10M + 80M + 150M + 1.425B * 40%
        assert_eq!(result.taxable_base, dec!(2_425_000_000));
        assert_eq!(result.national_tax, dec!(810_000_000));
        assert_eq!(result.applied_rate, dec!(0.4));
    }

    #[rstest(share, expected,
        case(dec!(0),              dec!(500_000_000)),
        case(dec!(700_000_000),    dec!(700_000_000)),
        case(dec!(10_000_000_000), dec!(3_000_000_000)),
    )]
    fn spouse_deduction(share: Decimal, expected: Decimal) {
        let result = calc(&InheritanceInput {spouse: Some(share), ..inheritance(dec!(20_000_000_000))});
        assert_eq!(result.deductions.get("Spouse deduction"), Some(expected));
    }

    #[rstest(assets, debts, expected,
        case(dec!(10_000_000),    dec!(0),           dec!(10_000_000)),
        case(dec!(20_000_000),    dec!(0),           dec!(20_000_000)),
        case(dec!(50_000_000),    dec!(0),           dec!(20_000_000)),
        case(dec!(100_000_000),   dec!(0),           dec!(20_000_000)),
        case(dec!(150_000_000),   dec!(0),           dec!(30_000_000)),
        case(dec!(2_000_000_000), dec!(0),           dec!(200_000_000)),
        case(dec!(150_000_000),   dec!(140_000_000), dec!(10_000_000)),
        case(dec!(10_000_000),    dec!(20_000_000),  dec!(0)),
    )]
    fn financial_assets(assets: Decimal, debts: Decimal, expected: Decimal) {
        let tables = super::super::tables(2024);
        assert_eq!(financial_assets_deduction(&tables.inheritance, assets, debts), expected);
    }

    #[rstest(years_operated, asset_value, expected,
        case( 9, dec!(100_000_000_000), None),
        case(10, dec!(100_000_000_000), Some(dec!(30_000_000_000))),
        case(25, dec!(100_000_000_000), Some(dec!(40_000_000_000))),
        case(35, dec!(100_000_000_000), Some(dec!(60_000_000_000))),
        case(35, dec!(10_000_000_000),  Some(dec!(10_000_000_000))),
    )]
    fn business_succession(years_operated: u32, asset_value: Decimal, expected: Option<Decimal>) {
        let tables = super::super::tables(2024);
        let business = BusinessSuccession {asset_value, years_operated};
        assert_eq!(business_succession_deduction(&tables.inheritance, &business), expected);
    }

    #[test]
    fn ineligible_business_succession() {
        let input = InheritanceInput {
            business: Some(BusinessSuccession {asset_value: dec!(1_000_000_000), years_operated: 5}),
            ..inheritance(dec!(10_000_000_000))
        };
        let result = calc(&input);

        assert_eq!(result.deductions.get("Business succession deduction"), None);
        assert_eq!(result.warnings, vec![Warning::BusinessSuccessionIneligible {years_operated: 5, required: 10}]);
    }

    #[test]
    fn generation_skipping() {
        let input = InheritanceInput {generation_skipping: true, ..inheritance(dec!(1_505_000_000))};
        let result = calc(&input);

        // (10M + 80M + 150M) * 130%
        assert_eq!(result.treatment, Some(Treatment::Heavy(HeavyReason::GenerationSkipping)));
        assert_eq!(result.taxable_base, dec!(1_000_000_000));
        assert_eq!(result.national_tax, dec!(312_000_000));
        assert_eq!(result.applied_rate, dec!(0.39));
    }

    #[test]
    fn exempt_and_empty() {
        let input = InheritanceInput {death_in_service: true, ..inheritance(dec!(10_000_000_000))};
        let result = calc(&input);
        assert_eq!(result.treatment, Some(Treatment::Exempt(ExemptReason::DeathInService)));
        assert_eq!(result.total_tax, dec!(0));

        let result = calc(&inheritance(dec!(0)));
        assert_eq!(result.total_tax, dec!(0));
        assert!(result.warnings.is_empty());
    }
}
