use std::fmt;

use serde::Serialize;

/// Mutually exclusive tax treatment of a transaction. It's decided once from the input before any tax
/// is calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "treatment", content = "reason", rename_all = "kebab-case")]
pub enum Treatment {
    Exempt(ExemptReason),
    Standard,
    Heavy(HeavyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExemptReason {
    SingleResidence,
    SmallShareholderOnMarket,
    NonTaxablePurpose,
    DeathInService,
}

/// Disqualifying conditions in the order of their priority: when several of them apply, the first one
/// defines the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeavyReason {
    ShortHolding,
    MultipleHomes,
    NonBusinessLand,
    GenerationSkipping,
}

impl Treatment {
    /// Selects the heavy treatment with the highest priority among the found disqualifying conditions.
    pub fn heavy_of(reasons: &[HeavyReason]) -> Option<Treatment> {
        reasons.iter().min().map(|&reason| Treatment::Heavy(reason))
    }

    pub fn is_exempt(self) -> bool {
        matches!(self, Treatment::Exempt(_))
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Treatment::Exempt(reason) => write!(f, "exempt ({})", match reason {
                ExemptReason::SingleResidence => "single residence",
                ExemptReason::SmallShareholderOnMarket => "small shareholder on-market trade",
                ExemptReason::NonTaxablePurpose => "non-taxable purpose",
                ExemptReason::DeathInService => "death in service",
            }),
            Treatment::Standard => write!(f, "standard"),
            Treatment::Heavy(reason) => write!(f, "heavy ({})", match reason {
                HeavyReason::ShortHolding => "short holding period",
                HeavyReason::MultipleHomes => "multiple homes in a regulated zone",
                HeavyReason::NonBusinessLand => "non-business land",
                HeavyReason::GenerationSkipping => "generation skipping",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavy_priority() {
        assert_eq!(Treatment::heavy_of(&[]), None);
        assert_eq!(
            Treatment::heavy_of(&[HeavyReason::MultipleHomes, HeavyReason::ShortHolding]),
            Some(Treatment::Heavy(HeavyReason::ShortHolding)));
        assert_eq!(
            Treatment::heavy_of(&[HeavyReason::NonBusinessLand, HeavyReason::MultipleHomes]),
            Some(Treatment::Heavy(HeavyReason::MultipleHomes)));
    }

    #[test]
    fn formatting() {
        assert_eq!(Treatment::Standard.to_string(), "standard");
        assert_eq!(Treatment::Heavy(HeavyReason::ShortHolding).to_string(), "heavy (short holding period)");
        assert!(Treatment::Exempt(ExemptReason::SingleResidence).is_exempt());
    }
}
