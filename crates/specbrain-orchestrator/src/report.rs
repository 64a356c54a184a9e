//! Read-only category summary for observability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use specbrain_learning::availability::{availability_summary, AvailabilitySummary};
use specbrain_learning::field_yield::{top_yield_domains, TopYieldDomain};
use specbrain_learning::promotion::PromotionEntry;
use specbrain_learning::queries::QueryView;
use specbrain_learning::stats::BrainStats;

use crate::brain::CategoryBrain;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrainReport {
    pub category: String,
    pub stats: BrainStats,
    pub top_yield_domains: Vec<TopYieldDomain>,
    pub availability: AvailabilitySummary,
    pub queries_by_field: BTreeMap<String, Vec<QueryView>>,
    pub recent_promotions: Vec<PromotionEntry>,
    /// Components currently running on a fallback.
    pub degraded_components: Vec<String>,
}

impl BrainReport {
    pub fn build(brain: &CategoryBrain, limit: usize, degraded_components: Vec<String>) -> Self {
        Self {
            category: brain.category.clone(),
            stats: brain.stats.clone(),
            top_yield_domains: top_yield_domains(&brain.field_yield, limit),
            availability: availability_summary(&brain.availability, limit),
            queries_by_field: brain
                .queries
                .by_field
                .iter()
                .map(|(field, views)| (field.clone(), views.iter().take(limit).cloned().collect()))
                .collect(),
            recent_promotions: brain.promotions.recent(limit).into_iter().cloned().collect(),
            degraded_components,
        }
    }
}
