//! Field availability thresholds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resolved thresholds used to classify a field's availability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityThresholds {
    pub min_validated_seen: u64,
    pub expected_rate: f64,
    pub rare_rate: f64,
    pub rare_override_min_seen: u64,
    pub rare_override_not_publicly_disclosed_ratio: f64,
}

impl Default for AvailabilityThresholds {
    fn default() -> Self {
        Self {
            min_validated_seen: 50,
            expected_rate: 0.85,
            rare_rate: 0.25,
            rare_override_min_seen: 20,
            rare_override_not_publicly_disclosed_ratio: 0.65,
        }
    }
}

/// Optional overrides for one category.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AvailabilityOverride {
    pub min_validated_seen: Option<u64>,
    pub expected_rate: Option<f64>,
    pub rare_rate: Option<f64>,
    pub rare_override_min_seen: Option<u64>,
    pub rare_override_not_publicly_disclosed_ratio: Option<f64>,
}

impl AvailabilityOverride {
    fn apply(&self, mut base: AvailabilityThresholds) -> AvailabilityThresholds {
        if let Some(v) = self.min_validated_seen {
            base.min_validated_seen = v;
        }
        if let Some(v) = self.expected_rate {
            base.expected_rate = v;
        }
        if let Some(v) = self.rare_rate {
            base.rare_rate = v;
        }
        if let Some(v) = self.rare_override_min_seen {
            base.rare_override_min_seen = v;
        }
        if let Some(v) = self.rare_override_not_publicly_disclosed_ratio {
            base.rare_override_not_publicly_disclosed_ratio = v;
        }
        base
    }
}

/// Availability classifier configuration: global knobs plus per-category overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AvailabilityConfig {
    /// Default: 50.
    pub min_validated_seen: Option<u64>,
    /// Default: 0.85.
    pub expected_rate: Option<f64>,
    /// Default: 0.25.
    pub rare_rate: Option<f64>,
    /// Default: 20.
    pub rare_override_min_seen: Option<u64>,
    /// Default: 0.65.
    pub rare_override_not_publicly_disclosed_ratio: Option<f64>,
    /// Per-category threshold overrides, keyed by category name.
    pub categories: BTreeMap<String, AvailabilityOverride>,
}

impl AvailabilityConfig {
    /// The global knobs as an override layer.
    pub fn global(&self) -> AvailabilityOverride {
        AvailabilityOverride {
            min_validated_seen: self.min_validated_seen,
            expected_rate: self.expected_rate,
            rare_rate: self.rare_rate,
            rare_override_min_seen: self.rare_override_min_seen,
            rare_override_not_publicly_disclosed_ratio: self
                .rare_override_not_publicly_disclosed_ratio,
        }
    }

    /// Thresholds for a category: compiled defaults, then global, then category overrides.
    pub fn thresholds_for(&self, category: &str) -> AvailabilityThresholds {
        let base = self.global().apply(AvailabilityThresholds::default());
        match self.categories.get(category) {
            Some(overrides) => overrides.apply(base),
            None => base,
        }
    }
}
