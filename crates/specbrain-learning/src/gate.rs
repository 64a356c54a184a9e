//! Learning gate: whether a field value may update long-lived memory.
//!
//! Checks run in a fixed order and the first failing check names the
//! rejection. The gate is pure.

use std::fmt;

use serde::{Deserialize, Serialize};
use specbrain_core::config::GateConfig;
use specbrain_core::types::FieldProvenance;

const ACCEPTED: &str = "accepted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    Accepted,
    ConfidenceBelowThreshold,
    InsufficientRefs,
    FieldNotAccepted,
    NoAuthoritativeTier,
    ComponentNotAccepted,
}

impl GateReason {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::ConfidenceBelowThreshold => "confidence_below_threshold",
            Self::InsufficientRefs => "insufficient_refs",
            Self::FieldNotAccepted => "field_not_accepted",
            Self::NoAuthoritativeTier => "no_authoritative_tier",
            Self::ComponentNotAccepted => "component_not_accepted",
        }
    }
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateInput {
    pub field: String,
    pub confidence: f64,
    pub refs_found: u32,
    /// Per-field override of the configured minimum.
    pub min_refs: Option<u32>,
    pub field_status: String,
    pub tier_history: Vec<u8>,
    pub component_ref: Option<String>,
    pub component_review_status: Option<String>,
}

impl GateInput {
    /// Gate input for one provenance entry. Distinct evidence URLs count as refs.
    pub fn from_provenance(field: &str, provenance: &FieldProvenance) -> Self {
        let mut urls: Vec<&str> = provenance
            .evidence
            .iter()
            .map(|e| e.url.trim())
            .filter(|u| !u.is_empty())
            .collect();
        urls.sort_unstable();
        urls.dedup();
        Self {
            field: field.to_string(),
            confidence: provenance.confidence,
            refs_found: u32::try_from(urls.len()).unwrap_or(u32::MAX),
            min_refs: None,
            field_status: provenance.status.clone(),
            tier_history: provenance.tier_history(),
            component_ref: provenance.component_ref.clone(),
            component_review_status: provenance.component_review_status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub field: String,
    pub accepted: bool,
    pub reason: GateReason,
}

pub fn evaluate_learning_gate(input: &GateInput, config: &GateConfig) -> GateDecision {
    let reason = rejection(input, config).unwrap_or(GateReason::Accepted);
    GateDecision {
        field: input.field.clone(),
        accepted: reason == GateReason::Accepted,
        reason,
    }
}

fn rejection(input: &GateInput, config: &GateConfig) -> Option<GateReason> {
    if input.confidence.is_nan() || input.confidence < config.effective_confidence_threshold() {
        return Some(GateReason::ConfidenceBelowThreshold);
    }
    let min_refs = input.min_refs.unwrap_or_else(|| config.effective_min_refs());
    if input.refs_found < min_refs {
        return Some(GateReason::InsufficientRefs);
    }
    if !is_accepted(&input.field_status) {
        return Some(GateReason::FieldNotAccepted);
    }
    let max_tier = config.effective_max_authoritative_tier();
    if !input.tier_history.iter().any(|t| *t >= 1 && *t <= max_tier) {
        return Some(GateReason::NoAuthoritativeTier);
    }
    let has_component = input
        .component_ref
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    if has_component {
        let review = input.component_review_status.as_deref().unwrap_or_default();
        if !is_accepted(review) {
            return Some(GateReason::ComponentNotAccepted);
        }
    }
    None
}

fn is_accepted(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case(ACCEPTED)
}
