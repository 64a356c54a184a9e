//! Learner tuning: gate, promotion, hypothesis queue, map caps and memory decay.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Learning gate thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum confidence for a fact to be learned. Default: 0.85.
    pub confidence_threshold: Option<f64>,
    /// Minimum evidence references. Default: 2.
    pub min_refs: Option<u32>,
    /// Highest (least authoritative) tier that still counts as authoritative. Default: 2.
    pub max_authoritative_tier: Option<u8>,
}

impl GateConfig {
    pub fn effective_confidence_threshold(&self) -> f64 {
        self.confidence_threshold.unwrap_or(0.85)
    }

    pub fn effective_min_refs(&self) -> u32 {
        self.min_refs.unwrap_or(2)
    }

    pub fn effective_max_authoritative_tier(&self) -> u8 {
        self.max_authoritative_tier.unwrap_or(2)
    }
}

/// Source promotion criteria.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromotionConfig {
    /// Enable auto-promotion. Default: true.
    pub enabled: Option<bool>,
    /// Minimum observed attempts. Default: 5.
    pub min_attempts: Option<u64>,
    /// Minimum identity match rate. Default: 0.80.
    pub min_identity_match_rate: Option<f64>,
    /// Maximum major anchor conflict rate. Default: 0.05.
    pub max_major_conflict_rate: Option<f64>,
    /// Minimum field yield rate. Default: 0.30.
    pub min_field_yield_rate: Option<f64>,
}

impl PromotionConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_min_attempts(&self) -> u64 {
        self.min_attempts.unwrap_or(5)
    }

    pub fn effective_min_identity_match_rate(&self) -> f64 {
        self.min_identity_match_rate.unwrap_or(0.80)
    }

    pub fn effective_max_major_conflict_rate(&self) -> f64 {
        self.max_major_conflict_rate.unwrap_or(0.05)
    }

    pub fn effective_min_field_yield_rate(&self) -> f64 {
        self.min_field_yield_rate.unwrap_or(0.30)
    }
}

/// Hypothesis queue limits.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HypothesisConfig {
    /// Maximum queue entries. Default: 20.
    pub max_items: Option<usize>,
    /// Maximum suggestions per field. Default: 5.
    pub per_field_limit: Option<usize>,
}

impl HypothesisConfig {
    pub fn effective_max_items(&self) -> usize {
        self.max_items.unwrap_or(20)
    }

    pub fn effective_per_field_limit(&self) -> usize {
        self.per_field_limit.unwrap_or(5)
    }
}

/// Size caps for the frequency maps kept in brain artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CapsConfig {
    pub max_allowed_values: Option<usize>,
    pub max_lexicon_synonyms: Option<usize>,
    pub max_lexicon_units: Option<usize>,
    pub max_query_rows: Option<usize>,
    pub max_query_view: Option<usize>,
    pub max_top_domains: Option<usize>,
    pub max_promotion_log: Option<usize>,
}

impl CapsConfig {
    pub fn effective_max_allowed_values(&self) -> usize {
        self.max_allowed_values
            .unwrap_or(constants::MAX_ALLOWED_VALUES)
    }

    pub fn effective_max_lexicon_synonyms(&self) -> usize {
        self.max_lexicon_synonyms
            .unwrap_or(constants::MAX_LEXICON_SYNONYMS)
    }

    pub fn effective_max_lexicon_units(&self) -> usize {
        self.max_lexicon_units.unwrap_or(constants::MAX_LEXICON_UNITS)
    }

    pub fn effective_max_query_rows(&self) -> usize {
        self.max_query_rows.unwrap_or(constants::MAX_QUERY_ROWS)
    }

    pub fn effective_max_query_view(&self) -> usize {
        self.max_query_view.unwrap_or(constants::MAX_QUERY_VIEW)
    }

    pub fn effective_max_top_domains(&self) -> usize {
        self.max_top_domains.unwrap_or(constants::MAX_TOP_DOMAINS)
    }

    pub fn effective_max_promotion_log(&self) -> usize {
        self.max_promotion_log.unwrap_or(constants::MAX_PROMOTION_LOG)
    }
}

/// Age window of one memory table. `expire_days = None` means rows never expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayWindow {
    pub decay_days: u32,
    pub expire_days: Option<u32>,
}

impl DecayWindow {
    pub const fn new(decay_days: u32, expire_days: Option<u32>) -> Self {
        Self {
            decay_days,
            expire_days,
        }
    }
}

/// Per-table decay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DecayConfig {
    /// Component lexicon window. Default: decay 90, expire 180.
    pub component_lexicon: Option<DecayWindow>,
    /// Field anchor window. Default: decay 60, expire 180.
    pub field_anchors: Option<DecayWindow>,
    /// URL memory window. Default: decay 120, no expiry.
    pub url_memory: Option<DecayWindow>,
    /// Domain-field yield window. Default: decay 90, no expiry.
    pub domain_field_yield: Option<DecayWindow>,
}

impl DecayConfig {
    pub fn effective_component_lexicon(&self) -> DecayWindow {
        self.component_lexicon
            .unwrap_or(DecayWindow::new(90, Some(180)))
    }

    pub fn effective_field_anchors(&self) -> DecayWindow {
        self.field_anchors.unwrap_or(DecayWindow::new(60, Some(180)))
    }

    pub fn effective_url_memory(&self) -> DecayWindow {
        self.url_memory.unwrap_or(DecayWindow::new(120, None))
    }

    pub fn effective_domain_field_yield(&self) -> DecayWindow {
        self.domain_field_yield.unwrap_or(DecayWindow::new(90, None))
    }
}
