use serde::Serialize;

use crate::types::Decimal;
use crate::util;

use super::errors::Warning;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deduction {
    pub name: &'static str,
    pub amount: Decimal,
}

/// Resolved deductions of a single calculation in the order they have been applied.
///
/// This is the only place where a base is reduced by deductions, so clamping of the residual to zero
/// (and reporting of it) happens here for every calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeductionSet {
    items: Vec<Deduction>,
}

pub struct Residual {
    pub base: Decimal,
    pub warning: Option<Warning>,
}

impl DeductionSet {
    pub fn new() -> DeductionSet {
        DeductionSet::default()
    }

    /// Adds a deduction. Zero deductions are dropped to keep the breakdown readable.
    pub fn add(&mut self, name: &'static str, amount: Decimal) {
        let amount = util::round_to(clamp(amount), 0);
        if !amount.is_zero() {
            self.items.push(Deduction {name, amount});
        }
    }

    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.items.iter().find(|item| item.name == name).map(|item| item.amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Deduction> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.amount).sum()
    }

    /// Applies the deductions to the base. The residual never goes below zero. Nothing is reported for
    /// a zero base: there is nothing to clamp in this case.
    pub fn apply(&self, base: Decimal) -> Residual {
        let base = clamp(base);
        let total = self.total();

        if base.is_zero() {
            return Residual {base, warning: None};
        } else if total > base {
            return Residual {
                base: dec!(0),
                warning: Some(Warning::DeductionsExceedBase {base, deductions: total}),
            };
        }

        Residual {base: base - total, warning: None}
    }
}

pub fn clamp(value: Decimal) -> Decimal {
    std::cmp::max(value, dec!(0))
}
