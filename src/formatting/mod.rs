use num_traits::ToPrimitive;
use separator::Separatable;

use crate::types::Decimal;
use crate::util;

pub mod table;

/// Formats a won amount with thousands separators.
pub fn format_won(amount: Decimal) -> String {
    let amount = util::round_to(amount, 0);
    match amount.to_i64() {
        Some(amount) => amount.separated_string(),
        None => amount.to_string(),
    }
}

pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", util::round_to(rate * dec!(100), 2))
}
