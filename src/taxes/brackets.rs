use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::types::Decimal;

use super::errors::{TaxError, TaxResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBracket {
    /// Inclusive upper bound of the tier (`None` for the last, unbounded tier)
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    /// Exact tax payable at the previous tier's upper bound
    pub cumulative_base_tax: Decimal,
}

/// Progressive rate schedule.
///
/// Tiers are sorted by their upper bound and cover the whole `[0, ∞)` range without gaps, so tax
/// for any base is calculated from a single tier: `cumulative_base_tax + (base - lower_bound) * rate`.
/// A base which is exactly at a tier's upper bound belongs to that (lower) tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketTable {
    tiers: Vec<TaxBracket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RateAdjustment {
    None,
    /// Replaces the whole schedule with a single rate
    Flat(Decimal),
    /// Adds the specified rate to every tier
    Surcharge(Decimal),
    /// Multiplies every tier rate
    Scale(Decimal),
}

impl BracketTable {
    pub fn new(spec: &[(Option<Decimal>, Decimal)]) -> TaxResult<BracketTable> {
        if spec.is_empty() {
            return Err(TaxError::configuration("Got an empty bracket table"));
        }

        let mut tiers = Vec::with_capacity(spec.len());
        let mut lower_bound = dec!(0);
        let mut cumulative_base_tax = dec!(0);

        for (index, &(upper_bound, rate)) in spec.iter().enumerate() {
            let last = index == spec.len() - 1;

            if rate.is_sign_negative() || rate > dec!(1) {
                return Err(TaxError::configuration(format!("Invalid tax rate: {rate}")));
            }

            match upper_bound {
                Some(_) if last => return Err(TaxError::configuration(
                    "The last tier of a bracket table must be unbounded")),
                None if !last => return Err(TaxError::configuration(
                    "Only the last tier of a bracket table may be unbounded")),
                Some(upper_bound) if upper_bound <= lower_bound => return Err(TaxError::configuration(format!(
                    "Bracket table tiers must be sorted by their upper bound: {upper_bound} after {lower_bound}"))),
                _ => {},
            }

            tiers.push(TaxBracket {upper_bound, rate, cumulative_base_tax});

            if let Some(upper_bound) = upper_bound {
                cumulative_base_tax += (upper_bound - lower_bound) * rate;
                lower_bound = upper_bound;
            }
        }

        Ok(BracketTable {tiers})
    }

    pub fn flat(rate: Decimal) -> TaxResult<BracketTable> {
        BracketTable::new(&[(None, rate)])
    }

    pub fn tiers(&self) -> &[TaxBracket] {
        &self.tiers
    }

    /// Returns a schedule with the rates altered by the adjustment. Cumulative taxes are recalculated,
    /// so the resulting schedule is continuous as well.
    pub fn adjusted(&self, adjustment: RateAdjustment) -> TaxResult<BracketTable> {
        let spec: Vec<(Option<Decimal>, Decimal)> = match adjustment {
            RateAdjustment::None => return Ok(self.clone()),
            RateAdjustment::Flat(rate) => return BracketTable::flat(rate),
            RateAdjustment::Surcharge(surcharge) => self.tiers.iter()
                .map(|tier| (tier.upper_bound, tier.rate + surcharge))
                .collect(),
            RateAdjustment::Scale(multiplier) => self.tiers.iter()
                .map(|tier| (tier.upper_bound, tier.rate * multiplier))
                .collect(),
        };
        BracketTable::new(&spec)
    }

    pub fn tax(&self, base: Decimal) -> Decimal {
        evaluate_bracket(base, self)
    }

    pub fn marginal_rate(&self, base: Decimal) -> Decimal {
        self.tiers[self.tier_index(base)].rate
    }

    fn lower_bound(&self, index: usize) -> Decimal {
        match index {
            0 => dec!(0),
            _ => self.tiers[index - 1].upper_bound.unwrap_or_default(),
        }
    }

    fn tier_index(&self, base: Decimal) -> usize {
        // The last tier is unbounded, so the search always ends up inside the table
        self.tiers.partition_point(|tier| match tier.upper_bound {
            Some(upper_bound) => upper_bound < base,
            None => false,
        })
    }
}

impl fmt::Display for BracketTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tiers.iter().enumerate().map(|(index, tier)| {
            let rate = (tier.rate * dec!(100)).normalize();
            match tier.upper_bound {
                Some(upper_bound) => format!("≤{upper_bound}: {rate}%"),
                None => format!(">{}: {rate}%", self.lower_bound(index)),
            }
        }).join(", "))
    }
}

/// Calculates exact (unrounded) tax for the specified base. The base must be already validated to be
/// non-negative.
pub fn evaluate_bracket(base: Decimal, table: &BracketTable) -> Decimal {
    debug_assert!(!base.is_sign_negative() || base.is_zero());
    if base <= dec!(0) {
        return dec!(0);
    }

    let index = table.tier_index(base);
    let tier = &table.tiers[index];

    tier.cumulative_base_tax + (base - table.lower_bound(index)) * tier.rate
}
