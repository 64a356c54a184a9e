//! Pure classification from fill counters.

use std::fmt;

use serde::{Deserialize, Serialize};
use specbrain_core::config::AvailabilityThresholds;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityClass {
    Expected,
    #[default]
    Sometimes,
    Rare,
}

impl AvailabilityClass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Sometimes => "sometimes",
            Self::Rare => "rare",
        }
    }

    /// How hard to search before declaring a field undisclosed.
    pub fn undisclosed_effort(&self) -> UndisclosedEffort {
        match self {
            Self::Expected => UndisclosedEffort {
                min_negative_sources: 5,
                min_search_rounds: 4,
            },
            Self::Sometimes => UndisclosedEffort {
                min_negative_sources: 3,
                min_search_rounds: 3,
            },
            Self::Rare => UndisclosedEffort {
                min_negative_sources: 2,
                min_search_rounds: 1,
            },
        }
    }
}

impl fmt::Display for AvailabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Negative signals tolerated before a field may be marked `not_publicly_disclosed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndisclosedEffort {
    /// Sources checked without finding a value.
    pub min_negative_sources: u32,
    pub min_search_rounds: u32,
}

impl UndisclosedEffort {
    pub fn should_mark_undisclosed(&self, negative_sources: u32, search_rounds: u32) -> bool {
        negative_sources >= self.min_negative_sources && search_rounds >= self.min_search_rounds
    }
}

/// Fill rate of a field over validated runs; 0 when never seen.
pub fn filled_rate(validated_seen: u64, validated_filled: u64) -> f64 {
    if validated_seen == 0 {
        return 0.0;
    }
    (validated_filled.min(validated_seen) as f64) / (validated_seen as f64)
}

/// Classify one field. `undisclosed_unknowns` counts unknown results whose
/// reason was `not_publicly_disclosed`.
pub fn classify(
    validated_seen: u64,
    validated_filled: u64,
    undisclosed_unknowns: u64,
    thresholds: &AvailabilityThresholds,
) -> AvailabilityClass {
    let rate = filled_rate(validated_seen, validated_filled);
    if validated_seen >= thresholds.min_validated_seen {
        if rate >= thresholds.expected_rate {
            return AvailabilityClass::Expected;
        }
        if rate < thresholds.rare_rate {
            return AvailabilityClass::Rare;
        }
    }
    let unknowns = validated_seen.saturating_sub(validated_filled);
    if validated_seen >= thresholds.rare_override_min_seen
        && unknowns > 0
        && rate < thresholds.rare_rate.max(0.5)
    {
        let share = undisclosed_unknowns.min(unknowns) as f64 / unknowns as f64;
        if share >= thresholds.rare_override_not_publicly_disclosed_ratio {
            return AvailabilityClass::Rare;
        }
    }
    AvailabilityClass::Sometimes
}
