use std::str::FromStr;

use chrono::Datelike;
use rust_decimal::RoundingStrategy;

use crate::core::GenericResult;
use crate::types::{Date, Decimal};

pub enum DecimalRestrictions {
    No,
    NonZero,
    PositiveOrZero,
    StrictlyPositive,
}

pub fn parse_decimal(string: &str, restrictions: DecimalRestrictions) -> GenericResult<Decimal> {
    let value = Decimal::from_str(&string.replace(['_', ','], "")).map_err(|_| format!(
        "Invalid decimal value: {string:?}"))?;

    if !validate_decimal(value, restrictions) {
        return Err!("The value doesn't comply to the specified restrictions: {}", value);
    }

    Ok(value)
}

pub fn validate_decimal(value: Decimal, restrictions: DecimalRestrictions) -> bool {
    match restrictions {
        DecimalRestrictions::No => true,
        DecimalRestrictions::NonZero => !value.is_zero(),
        DecimalRestrictions::PositiveOrZero => value.is_zero() || value.is_sign_positive(),
        DecimalRestrictions::StrictlyPositive => !value.is_zero() && value.is_sign_positive(),
    }
}

pub fn round_to(value: Decimal, points: u32) -> Decimal {
    value.round_dp_with_strategy(points, RoundingStrategy::MidpointAwayFromZero).normalize()
}

pub fn format_date(date: Date) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Number of full years elapsed between the dates (anniversary based).
pub fn full_years_between(start: Date, end: Date) -> u32 {
    if end <= start {
        return 0;
    }

    let mut years = end.year() - start.year();
    if (end.month(), end.day()) < (start.month(), start.day()) {
        years -= 1;
    }

    years.max(0) as u32
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use super::*;

    #[rstest(value, expected,
        case("1.4",  "1"),
        case("1.5",  "2"),
        case("2.5",  "3"),
        case("-2.5", "-3"),
        case("100",  "100"),
    )]
    fn rounding(value: &str, expected: &str) {
        assert_eq!(round_to(value.parse().unwrap(), 0), expected.parse::<Decimal>().unwrap());
    }

    #[rstest(start, end, expected,
        case(date!(2020, 3, 15), date!(2020, 3, 15), 0),
        case(date!(2020, 3, 15), date!(2021, 3, 14), 0),
        case(date!(2020, 3, 15), date!(2021, 3, 15), 1),
        case(date!(2020, 2, 29), date!(2022, 2, 28), 1),
        case(date!(2020, 2, 29), date!(2022, 3, 1),  2),
        case(date!(2014, 1, 1),  date!(2024, 6, 30), 10),
        case(date!(2024, 1, 1),  date!(2020, 1, 1),  0),
    )]
    fn years_between(start: Date, end: Date, expected: u32) {
        assert_eq!(full_years_between(start, end), expected);
    }

    #[test]
    fn decimal_parsing() {
        assert_eq!(parse_decimal("10_000_000", DecimalRestrictions::StrictlyPositive).unwrap(), dec!(10_000_000));
        assert_eq!(parse_decimal("1,200,000", DecimalRestrictions::No).unwrap(), dec!(1_200_000));
        assert!(parse_decimal("-1", DecimalRestrictions::PositiveOrZero).is_err());
        assert!(parse_decimal("0", DecimalRestrictions::NonZero).is_err());
        assert!(parse_decimal("abc", DecimalRestrictions::No).is_err());
    }
}
