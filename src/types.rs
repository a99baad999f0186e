pub use chrono::NaiveDate as Date;
pub use rust_decimal::Decimal as Decimal;

#[cfg(test)]
macro_rules! date {
    ($year:expr, $month:expr, $day:expr) => (::chrono::NaiveDate::from_ymd_opt($year, $month, $day).unwrap())
}
