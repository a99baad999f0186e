use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::types::Decimal;

use super::tables::LargeShareholderThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Listing {
    Kospi,
    Kosdaq,
    Konex,
    Unlisted,
}

impl Listing {
    pub fn is_listed(self) -> bool {
        !matches!(self, Listing::Unlisted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareholderClass {
    pub is_large: bool,
    pub reasons: Vec<LargeShareholderReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "test", rename_all = "kebab-case")]
pub enum LargeShareholderReason {
    OwnershipRatio {
        ratio: Decimal,
        threshold: Decimal,
    },
    HoldingValue {
        value: Decimal,
        threshold: Decimal,
    },
}

/// Large shareholder status is an OR of two independent tests: the combined ownership ratio of the
/// shareholder and their family, and the market value of the holding. A low ratio holding is still
/// a large one if it's valuable enough.
pub fn classify_shareholder(
    ownership_ratio: Decimal, family_ratio: Decimal, holding_value: Decimal, listing: Listing,
    thresholds: &LargeShareholderThresholds,
) -> ShareholderClass {
    let ratio = ownership_ratio + family_ratio;
    let ratio_threshold = match listing {
        Listing::Kospi => thresholds.kospi_ratio,
        Listing::Kosdaq => thresholds.kosdaq_ratio,
        Listing::Konex => thresholds.konex_ratio,
        Listing::Unlisted => thresholds.unlisted_ratio,
    };

    let mut reasons = Vec::new();

    if ratio >= ratio_threshold {
        reasons.push(LargeShareholderReason::OwnershipRatio {ratio, threshold: ratio_threshold});
    }

    if holding_value >= thresholds.holding_value {
        reasons.push(LargeShareholderReason::HoldingValue {
            value: holding_value,
            threshold: thresholds.holding_value,
        });
    }

    ShareholderClass {
        is_large: !reasons.is_empty(),
        reasons,
    }
}
