//! Historical per-domain helpfulness, produced by the pipeline's planner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::artifact::{impl_brain_artifact, ArtifactMeta};

/// Field -> helpfulness score.
pub type FieldHelpfulness = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainIntel {
    pub planner_score: f64,
    pub per_field_helpfulness: FieldHelpfulness,
    /// Normalized brand -> field -> helpfulness.
    pub per_brand: BTreeMap<String, FieldHelpfulness>,
    /// URL path -> field -> helpfulness.
    pub per_path: BTreeMap<String, FieldHelpfulness>,
}

impl DomainIntel {
    /// Helpfulness of this domain for `field`, scoped to `brand` when the
    /// domain has a brand-specific entry.
    pub fn helpfulness(&self, field: &str, brand: &str) -> f64 {
        let scoped = self
            .per_brand
            .get(brand)
            .filter(|_| !brand.is_empty())
            .and_then(|fields| fields.get(field));
        finite(scoped.or_else(|| self.per_field_helpfulness.get(field)).copied())
    }

    pub fn planner_score(&self) -> f64 {
        finite(Some(self.planner_score))
    }
}

fn finite(v: Option<f64>) -> f64 {
    v.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Root domain -> intel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceIntel {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub domains: BTreeMap<String, DomainIntel>,
}

impl_brain_artifact!(SourceIntel, "source_intel");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_scope_overrides_domain_default() {
        let intel = DomainIntel {
            planner_score: 0.5,
            per_field_helpfulness: BTreeMap::from([("dpi".to_string(), 0.2)]),
            per_brand: BTreeMap::from([(
                "razer".to_string(),
                BTreeMap::from([("dpi".to_string(), 0.9)]),
            )]),
            per_path: BTreeMap::new(),
        };
        assert_eq!(intel.helpfulness("dpi", "razer"), 0.9);
        assert_eq!(intel.helpfulness("dpi", "logitech"), 0.2);
        assert_eq!(intel.helpfulness("dpi", ""), 0.2);
        assert_eq!(intel.helpfulness("weight", "razer"), 0.0);
    }
}
