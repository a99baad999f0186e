use rstest::rstest;
use rust_decimal_macros::dec;
use strum::IntoEnumIterator;

use ktax::report::Schedule;
use ktax::taxes::{self, CalculationInput, TaxEngine, TaxTableRegistry, Warning};
use ktax::taxes::Listing;
use ktax::taxes::input::{
    GiftInput, IncomeKind, InheritanceInput, MAX_AMOUNT, OtherIncomeInput, PayrollInput, RealEstateAsset,
    RealEstateKind, Relationship, StockAsset, TransferAsset, TransferInput};
use ktax::types::Decimal;
use ktax::util;

fn payroll_input(annual_salary: Decimal) -> PayrollInput {
    PayrollInput {
        annual_salary,
        non_taxable: dec!(0),
        dependents: 0,
        spouse: false,
        children: 0,
        social_insurance: dec!(0),
        monthly_rent: dec!(0),
        standard_credit: false,
    }
}

fn payroll(annual_salary: Decimal) -> CalculationInput {
    CalculationInput::Payroll(payroll_input(annual_salary))
}

fn inheritance(estate_value: Decimal, spouse: Option<Decimal>) -> CalculationInput {
    CalculationInput::Inheritance(InheritanceInput {
        estate_value,
        prior_gifts: dec!(0),
        debts: dec!(0),
        funeral_expenses: dec!(0),
        enshrinement_expenses: dec!(0),
        financial_assets: dec!(0),
        financial_debts: dec!(0),
        spouse,
        children: 2,
        minor_years: 0,
        elderly: 0,
        business: None,
        generation_skipping: false,
        heir_minor: false,
        timely_filing: true,
        death_in_service: false,
    })
}

fn gift(value: Decimal) -> CalculationInput {
    CalculationInput::Gift(GiftInput {
        value,
        relationship: Relationship::OtherRelative,
        prior_gifts: dec!(0),
        prior_gift_tax: dec!(0),
        assumed_debt: dec!(0),
        recipient_minor: false,
        marriage_or_birth: false,
        generation_skipping: false,
        timely_filing: false,
        non_taxable_purpose: false,
    })
}

#[test]
fn schedules_are_continuous() {
    let registry = TaxTableRegistry::builtin().unwrap();

    for year in registry.years() {
        let tables = registry.get(year).unwrap();

        for schedule in Schedule::iter() {
            let brackets = schedule.table(tables);

            for (tier, next) in brackets.tiers().iter().zip(brackets.tiers().iter().skip(1)) {
                let bound = tier.upper_bound.unwrap();
                assert_eq!(brackets.tax(bound), next.cumulative_base_tax,
                           "{schedule} schedule of {year} tax year is discontinuous at {bound}");
                assert_eq!(brackets.marginal_rate(bound), tier.rate);
                assert_eq!(brackets.marginal_rate(bound + dec!(1)), next.rate);
            }
        }
    }
}

#[test]
fn schedules_are_monotonic() {
    let registry = TaxTableRegistry::builtin().unwrap();

    for year in registry.years() {
        let tables = registry.get(year).unwrap();

        for schedule in Schedule::iter() {
            let brackets = schedule.table(tables);
            let mut previous = dec!(0);

            for step in 0..=200 {
                let base = Decimal::from(step) * dec!(25_000_000);
                let tax = brackets.tax(base);
                assert!(tax >= previous, "{schedule} schedule of {year} tax year is not monotonic at {base}");
                previous = tax;
            }
        }
    }
}

#[rstest(input_of, step,
    case(payroll, dec!(5_000_000)),
    case(gift, dec!(50_000_000)),
)]
fn tax_grows_with_income(input_of: fn(Decimal) -> CalculationInput, step: Decimal) {
    let registry = TaxTableRegistry::builtin().unwrap();
    let engine = TaxEngine::new(&registry, 2024).unwrap();
    let mut previous = dec!(0);

    for index in 0..=40 {
        let result = engine.calculate(&input_of(Decimal::from(index) * step)).unwrap();
        assert!(result.total_tax >= previous);
        assert!(result.net_proceeds >= dec!(0));
        previous = result.total_tax;
    }
}

fn assert_monotonic(inputs: impl IntoIterator<Item = (Decimal, CalculationInput)>) {
    let registry = TaxTableRegistry::builtin().unwrap();
    let engine = TaxEngine::new(&registry, 2024).unwrap();
    let mut previous: Option<(Decimal, Decimal)> = None;

    for (amount, input) in inputs {
        let result = engine.calculate(&input).unwrap();
        assert!(result.net_proceeds >= dec!(0), "Negative net proceeds for {amount}");

        if let Some((previous_amount, previous_tax)) = previous {
            assert!(result.total_tax >= previous_tax,
                    "Tax drops from {previous_tax} to {} when {previous_amount} grows to {amount}",
                    result.total_tax);
        }
        previous = Some((amount, result.total_tax));
    }
}

fn prices_around_ceiling() -> Vec<Decimal> {
    let mut prices: Vec<Decimal> = (0..=40).map(|index| dec!(800_000_000) + Decimal::from(index) * dec!(20_000_000)).collect();
    prices.extend([dec!(1_199_999_999), dec!(1_200_000_001), dec!(1_200_000_002)]);
    prices.sort();
    prices
}

#[rstest(acquisition_date,
    case("2015-03-01"),
    case("2023-07-01"),
    case("2022-07-01"),
)]
fn single_residence_tax_grows_with_price(acquisition_date: &str) {
    assert_monotonic(prices_around_ceiling().into_iter().map(|price| {
        (price, CalculationInput::Transfer(TransferInput {
            price,
            acquisition_cost: dec!(800_000_000),
            expenses: dec!(0),
            acquisition_date: acquisition_date.parse().unwrap(),
            transfer_date: "2024-06-01".parse().unwrap(),
            asset: TransferAsset::RealEstate(RealEstateAsset {
                kind: RealEstateKind::Housing,
                homes_owned: 1,
                single_residence: true,
                residence_years: 0,
                regulated_zone: false,
                non_business_land: false,
            }),
        }))
    }));
}

#[rstest(ownership_ratio, on_market,
    case(dec!(0.05), false),
    case(dec!(0.001), false),
    case(dec!(0.001), true),
)]
fn stock_tax_grows_with_price(ownership_ratio: Decimal, on_market: bool) {
    assert_monotonic((0..=40).map(|index| {
        let price = Decimal::from(index) * dec!(50_000_000);
        (price, CalculationInput::Transfer(TransferInput {
            price,
            acquisition_cost: dec!(100_000_000),
            expenses: dec!(0),
            acquisition_date: "2020-01-01".parse().unwrap(),
            transfer_date: "2024-06-01".parse().unwrap(),
            asset: TransferAsset::Stock(StockAsset {
                listing: Listing::Kospi,
                ownership_ratio,
                family_ratio: dec!(0),
                holding_value: dec!(1_000_000_000),
                sme: false,
                on_market,
            }),
        }))
    }));
}

#[rstest(spouse,
    case(None),
    case(Some(dec!(1_000_000_000))),
)]
fn inheritance_tax_grows_with_estate(spouse: Option<Decimal>) {
    assert_monotonic((0..=40).map(|index| {
        let estate_value = Decimal::from(index) * dec!(250_000_000);
        (estate_value, inheritance(estate_value, spouse))
    }));
}

#[rstest(kind, working_days,
    case(IncomeKind::Other, 0),
    case(IncomeKind::Interest, 0),
    case(IncomeKind::Dividend, 0),
    case(IncomeKind::Business, 0),
    case(IncomeKind::DailyWage, 20),
)]
fn withholding_grows_with_income(kind: IncomeKind, working_days: u32) {
    assert_monotonic((0..=40).map(|index| {
        let amount = Decimal::from(index) * dec!(250_000);
        (amount, CalculationInput::OtherIncome(OtherIncomeInput {
            kind, amount,
            basic_deduction: false,
            deemed_expenses: false,
            working_days,
        }))
    }));
}

#[test]
fn maximum_amounts() {
    let registry = TaxTableRegistry::builtin().unwrap();

    let payroll = PayrollInput {
        dependents: u32::MAX,
        children: u32::MAX,
        monthly_rent: MAX_AMOUNT,
        ..payroll_input(MAX_AMOUNT)
    };

    let mut inheritance = match inheritance(MAX_AMOUNT, Some(MAX_AMOUNT)) {
        CalculationInput::Inheritance(input) => input,
        _ => unreachable!(),
    };
    inheritance.prior_gifts = MAX_AMOUNT;
    inheritance.financial_assets = MAX_AMOUNT;
    inheritance.children = u32::MAX;
    inheritance.minor_years = u32::MAX;
    inheritance.elderly = u32::MAX;

    for input in [
        CalculationInput::Payroll(payroll),
        CalculationInput::Inheritance(inheritance),
        gift(MAX_AMOUNT),
        CalculationInput::Transfer(TransferInput {
            price: MAX_AMOUNT,
            acquisition_cost: dec!(0),
            expenses: dec!(0),
            acquisition_date: "2015-03-01".parse().unwrap(),
            transfer_date: "2024-06-01".parse().unwrap(),
            asset: TransferAsset::RealEstate(RealEstateAsset {
                kind: RealEstateKind::Housing,
                homes_owned: 1,
                single_residence: true,
                residence_years: u32::MAX,
                regulated_zone: false,
                non_business_land: false,
            }),
        }),
        CalculationInput::OtherIncome(OtherIncomeInput {
            kind: IncomeKind::DailyWage,
            amount: MAX_AMOUNT,
            basic_deduction: false,
            deemed_expenses: false,
            working_days: u32::MAX,
        }),
    ] {
        let result = taxes::calculate(&registry, 2024, &input).unwrap();
        assert!(result.total_tax >= dec!(0));
    }

    assert!(taxes::calculate(&registry, 2024, &gift(MAX_AMOUNT + dec!(1))).is_err());
}

#[rstest(amount,
    case(dec!(1_000_000)),
    case(dec!(50_000_000)),
    case(dec!(123_456_789)),
    case(dec!(1_500_000_000)),
)]
fn local_surtax_ratio(amount: Decimal) {
    let registry = TaxTableRegistry::builtin().unwrap();

    for input in [
        payroll(amount),
        CalculationInput::OtherIncome(OtherIncomeInput {
            kind: IncomeKind::Interest,
            amount,
            basic_deduction: false,
            deemed_expenses: false,
            working_days: 0,
        }),
    ] {
        let result = taxes::calculate(&registry, 2024, &input).unwrap();
        assert_eq!(result.local_surtax, util::round_to(result.national_tax * dec!(0.1), 0));
        assert_eq!(result.total_tax, result.national_tax + result.local_surtax);
    }
}

#[test]
fn deductions_are_clamped() {
    let registry = TaxTableRegistry::builtin().unwrap();
    let result = taxes::calculate(&registry, 2024, &gift(dec!(5_000_000))).unwrap();

    assert_eq!(result.taxable_base, dec!(0));
    assert_eq!(result.total_tax, dec!(0));
    assert_eq!(result.warnings, vec![Warning::DeductionsExceedBase {
        base: dec!(5_000_000),
        deductions: dec!(10_000_000),
    }]);
}

#[test]
fn zero_input() {
    let registry = TaxTableRegistry::builtin().unwrap();

    for input in [payroll(dec!(0)), gift(dec!(0))] {
        let result = taxes::calculate(&registry, 2024, &input).unwrap();
        assert_eq!(result.total_tax, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
        assert!(result.warnings.is_empty());
    }
}

#[test]
fn idempotence() {
    let registry = TaxTableRegistry::builtin().unwrap();
    let input = gift(dec!(777_777_777));

    let first = taxes::calculate(&registry, 2024, &input).unwrap();
    let second = taxes::calculate(&registry, 2024, &input).unwrap();
    assert_eq!(first, second);
}
