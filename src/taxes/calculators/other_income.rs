use log::debug;

use crate::taxes::brackets::{BracketTable, RateAdjustment};
use crate::taxes::deductions::DeductionSet;
use crate::taxes::errors::TaxResult;
use crate::taxes::input::{IncomeKind, OtherIncomeInput, TaxCategory};
use crate::taxes::result::{CalculationResult, ResultBuilder, Totals};
use crate::taxes::tables::TaxYearTables;
use crate::types::Decimal;
use crate::util;

/// Calculates tax withheld at source from a single payment.
pub fn calculate(tables: &TaxYearTables, input: &OtherIncomeInput) -> TaxResult<CalculationResult> {
    let rules = &tables.withholding;
    let mut result = ResultBuilder::new(TaxCategory::OtherIncome, tables.year);

    result.step_with("Income", input.amount, input.kind.to_string());

    let mut deductions = DeductionSet::new();

    let rate = match input.kind {
        IncomeKind::Other => {
            if input.deemed_expenses {
                deductions.add("Deemed expenses", input.amount * rules.deemed_expense_rate);
            }
            if input.basic_deduction {
                deductions.add("Basic deduction", rules.basic_deduction);
            }
            rules.rates.other
        },
        IncomeKind::Interest => rules.rates.interest,
        IncomeKind::Dividend => rules.rates.dividend,
        IncomeKind::Business => rules.rates.business,
        IncomeKind::DailyWage => {
            deductions.add("Daily deduction", Decimal::from(input.working_days) * rules.daily_wage_deduction);
            rules.rates.daily_wage
        },
    };
    debug!("Withholding from {} income at {rate} rate.", input.kind);

    let base = result.deduct(&deductions, input.amount);
    let (tax, applied_rate) = super::progressive_tax(&BracketTable::flat(rate)?, RateAdjustment::None, base)?;

    let national_tax = if input.kind == IncomeKind::DailyWage {
        let tax = util::round_to(tax, 0);
        result.step("Calculated tax", tax);
        result.credit(tax, &[("Daily wage credit", tax * rules.daily_wage_credit)])
    } else {
        tax
    };

    Ok(result.build(deductions, Totals {
        gross: input.amount,
        taxable_base: base,
        national_tax,
        local_surtax_rate: tables.local_surtax_rate,
        applied_rate,
        proceeds: input.amount,
    }))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use pretty_assertions::assert_eq;
    use super::*;

    fn income(kind: IncomeKind, amount: Decimal) -> OtherIncomeInput {
        OtherIncomeInput {
            kind, amount,
            basic_deduction: false,
            deemed_expenses: false,
            working_days: 0,
        }
    }

    fn calc(input: &OtherIncomeInput) -> CalculationResult {
        calculate(&super::super::tables(2024), input).unwrap()
    }

    #[test]
    fn lecture_fee() {
        let input = OtherIncomeInput {basic_deduction: true, ..income(IncomeKind::Other, dec!(10_000_000))};
        let result = calc(&input);

        assert_eq!(result.taxable_base, dec!(9_700_000));
        assert_eq!(result.national_tax, dec!(1_940_000));
        assert_eq!(result.local_surtax, dec!(194_000));
        assert_eq!(result.total_tax, dec!(9_700_000) * dec!(0.22));
        assert_eq!(result.net_proceeds, dec!(7_866_000));
    }

    #[test]
    fn deemed_expenses() {
        let input = OtherIncomeInput {
            basic_deduction: true,
            deemed_expenses: true,
            ..income(IncomeKind::Other, dec!(10_000_000))
        };
        let result = calc(&input);

        assert_eq!(result.deductions.get("Deemed expenses"), Some(dec!(6_000_000)));
        assert_eq!(result.taxable_base, dec!(3_700_000));
        assert_eq!(result.national_tax, dec!(740_000));
    }

    #[rstest(kind, amount, expected_national, expected_local,
        case(IncomeKind::Other,    dec!(1_000_000), dec!(200_000), dec!(20_000)),
        case(IncomeKind::Interest, dec!(1_000_000), dec!(140_000), dec!(14_000)),
        case(IncomeKind::Dividend, dec!(1_000_000), dec!(140_000), dec!(14_000)),
        case(IncomeKind::Business, dec!(3_300_000), dec!(99_000),  dec!(9_900)),
        case(IncomeKind::Business, dec!(0),         dec!(0),       dec!(0)),
    )]
    fn rates(kind: IncomeKind, amount: Decimal, expected_national: Decimal, expected_local: Decimal) {
        let result = calc(&income(kind, amount));
        assert_eq!(result.national_tax, expected_national);
        assert_eq!(result.local_surtax, expected_local);
    }

    #[test]
    fn daily_wage() {
        let input = OtherIncomeInput {working_days: 10, ..income(IncomeKind::DailyWage, dec!(2_000_000))};
        let result = calc(&input);

        // 6% of 500,000 with 55% credit
        assert_eq!(result.taxable_base, dec!(500_000));
        assert_eq!(result.national_tax, dec!(13_500));
        assert_eq!(result.local_surtax, dec!(1_350));
        assert_eq!(result.applied_rate, dec!(0.06));

        // Under the daily deduction
        let input = OtherIncomeInput {working_days: 10, ..income(IncomeKind::DailyWage, dec!(1_500_000))};
        let result = calc(&input);
        assert_eq!(result.total_tax, dec!(0));
        assert!(result.warnings.is_empty());
    }
}
