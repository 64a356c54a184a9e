//! Store fallbacks: which component degraded, to what, and whether it recovered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PRIMARY_ARTIFACT_STORE: &str = "artifact_store.primary";
pub const MEMORY_STORE: &str = "memory_store";

/// Component name of one undecodable JSON artifact document.
pub fn artifact_document(kind: &str) -> String {
    format!("artifact.{kind}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationEvent {
    pub component: String,
    pub failure: String,
    pub fallback_used: String,
    pub timestamp: DateTime<Utc>,
}

impl DegradationEvent {
    pub fn new(component: &str, failure: impl Into<String>, fallback_used: &str) -> Self {
        Self {
            component: component.to_string(),
            failure: failure.into(),
            fallback_used: fallback_used.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Active,
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDegradation {
    pub event: DegradationEvent,
    pub recovery_status: RecoveryStatus,
    pub recovered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct DegradationTracker {
    events: Vec<TrackedDegradation>,
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fallback. A component already degraded with no recovery since
    /// is not recorded twice.
    pub fn record(&mut self, event: DegradationEvent) {
        tracing::warn!(
            component = %event.component,
            failure = %event.failure,
            fallback = %event.fallback_used,
            "degraded to fallback"
        );
        if self.is_degraded(&event.component) {
            return;
        }
        self.events.push(TrackedDegradation {
            event,
            recovery_status: RecoveryStatus::Active,
            recovered_at: None,
        });
    }

    /// Mark the latest active degradation of a component as recovered.
    pub fn mark_recovered(&mut self, component: &str) {
        let now = Utc::now();
        if let Some(tracked) = self
            .events
            .iter_mut()
            .rev()
            .find(|t| t.event.component == component && t.recovery_status == RecoveryStatus::Active)
        {
            tracked.recovery_status = RecoveryStatus::Recovered;
            tracked.recovered_at = Some(now);
            tracing::info!(component, "recovered from degradation");
        }
    }

    pub fn is_degraded(&self, component: &str) -> bool {
        self.events
            .iter()
            .any(|t| t.event.component == component && t.recovery_status == RecoveryStatus::Active)
    }

    pub fn events(&self) -> &[TrackedDegradation] {
        &self.events
    }

    pub fn active_degradations(&self) -> Vec<&TrackedDegradation> {
        self.events
            .iter()
            .filter(|t| t.recovery_status == RecoveryStatus::Active)
            .collect()
    }
}
