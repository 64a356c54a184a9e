//! Field constraints: numeric ranges, allowed values and cross-field co-occurrence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use specbrain_core::types::RunOutcome;
use specbrain_core::values;

use crate::artifact::{impl_brain_artifact, truncate_counts, ArtifactMeta};

/// Co-occurrence pairs tracked by default: (source field, numeric target field, bucket width).
pub const DEFAULT_CO_OCCURRENCE: &[(&str, &str, f64)] = &[("connection", "battery_hours", 20.0)];

const MIN_HINT_OBSERVATIONS: u64 = 5;
const MAX_HINT_SHARE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl NumericSummary {
    fn first(v: f64) -> Self {
        Self {
            count: 1,
            min: v,
            max: v,
            avg: v,
        }
    }

    fn observe(&mut self, v: f64) {
        self.count += 1;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.avg += (v - self.avg) / self.count as f64;
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConstraintRow {
    pub count: u64,
    pub numeric: Option<NumericSummary>,
    pub allowed_values: BTreeMap<String, u64>,
}

/// Source value -> target bucket label -> count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoOccurrenceTable {
    pub source_field: String,
    pub target_field: String,
    pub bucket_width: f64,
    pub buckets: BTreeMap<String, BTreeMap<String, u64>>,
}

impl CoOccurrenceTable {
    fn new(source_field: &str, target_field: &str, bucket_width: f64) -> Self {
        Self {
            source_field: source_field.to_string(),
            target_field: target_field.to_string(),
            bucket_width,
            buckets: BTreeMap::new(),
        }
    }

    pub fn bucket_label(&self, v: f64) -> String {
        bucket_label(v, self.bucket_width)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionHint {
    pub source_field: String,
    pub source_value: String,
    pub target_field: String,
    pub bucket: String,
    pub bucket_count: u64,
    pub total: u64,
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConstraints {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub fields: BTreeMap<String, FieldConstraintRow>,
    /// Keyed `source->target`.
    pub co_occurrence: BTreeMap<String, CoOccurrenceTable>,
}

impl_brain_artifact!(FieldConstraints, "constraints");

fn pair_key(source: &str, target: &str) -> String {
    format!("{source}->{target}")
}

/// `[lo, lo + width)` label of a value, e.g. 45 with width 20 -> `40-60`.
pub fn bucket_label(v: f64, width: f64) -> String {
    let width = if width.is_finite() && width > 0.0 { width } else { 1.0 };
    let lo = (v / width).floor() * width;
    format!("{}-{}", lo, lo + width)
}

fn numeric_value(value: &Value) -> Option<f64> {
    values::safe_f64(value).filter(|_| !value.is_boolean())
}

/// Fold a validated run into the constraints. Unvalidated runs are ignored.
pub fn update_constraints(mut artifact: FieldConstraints, run: &RunOutcome, max_allowed_values: usize) -> FieldConstraints {
    if !run.summary.validated {
        return artifact;
    }
    for (field, value) in run.filled_fields() {
        let row = artifact.fields.entry(field.clone()).or_default();
        row.count += 1;
        match numeric_value(value) {
            Some(v) => match row.numeric.as_mut() {
                Some(summary) => summary.observe(v),
                None => row.numeric = Some(NumericSummary::first(v)),
            },
            None => {
                let token = values::normalize_token(&values::value_text(value));
                if !token.is_empty() {
                    *row.allowed_values.entry(token).or_default() += 1;
                    truncate_counts(&mut row.allowed_values, max_allowed_values);
                }
            }
        }
    }

    for (source, target, width) in DEFAULT_CO_OCCURRENCE {
        let source_value = run
            .normalized
            .get(*source)
            .filter(|v| values::is_known_value(v))
            .map(|v| values::normalize_token(&values::value_text(v)));
        let target_value = run.normalized.get(*target).and_then(numeric_value);
        let (Some(source_value), Some(target_value)) = (source_value, target_value) else {
            continue;
        };
        let table = artifact
            .co_occurrence
            .entry(pair_key(source, target))
            .or_insert_with(|| CoOccurrenceTable::new(source, target, *width));
        let label = table.bucket_label(target_value);
        *table.buckets.entry(source_value).or_default().entry(label).or_default() += 1;
    }
    artifact
}

/// Distribution of target buckets observed with a source value.
pub fn co_occurrence_lookup<'a>(
    artifact: &'a FieldConstraints,
    source_field: &str,
    source_value: &str,
    target_field: &str,
) -> Option<&'a BTreeMap<String, u64>> {
    artifact
        .co_occurrence
        .get(&pair_key(source_field, target_field))
        .and_then(|t| t.buckets.get(&values::normalize_token(source_value)))
}

/// A hint when the target value lands in a bucket seen in under 5% of at
/// least 5 prior observations for the source value.
pub fn contradiction_hint(
    artifact: &FieldConstraints,
    source_field: &str,
    source_value: &str,
    target_field: &str,
    target_value: f64,
) -> Option<ContradictionHint> {
    let table = artifact.co_occurrence.get(&pair_key(source_field, target_field))?;
    let source_value = values::normalize_token(source_value);
    let buckets = table.buckets.get(&source_value)?;
    let total: u64 = buckets.values().sum();
    if total < MIN_HINT_OBSERVATIONS || !target_value.is_finite() {
        return None;
    }
    let bucket = table.bucket_label(target_value);
    let bucket_count = buckets.get(&bucket).copied().unwrap_or(0);
    let share = bucket_count as f64 / total as f64;
    (share < MAX_HINT_SHARE).then(|| ContradictionHint {
        source_field: source_field.to_string(),
        source_value,
        target_field: target_field.to_string(),
        bucket,
        bucket_count,
        total,
        share,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(validated: bool, normalized: Value) -> RunOutcome {
        serde_json::from_value(json!({
            "summary": { "validated": validated },
            "normalized": normalized,
        }))
        .unwrap()
    }

    #[test]
    fn numeric_summary_tracks_range_and_mean() {
        let mut art = FieldConstraints::default();
        for w in [60, 80, 70] {
            art = update_constraints(art, &run(true, json!({ "weight": w })), 120);
        }
        let n = art.fields["weight"].numeric.unwrap();
        assert_eq!((n.count, n.min, n.max), (3, 60.0, 80.0));
        assert!((n.avg - 70.0).abs() < 1e-9);
        assert!(art.fields["weight"].allowed_values.is_empty());
    }

    #[test]
    fn text_values_counted_and_unknowns_skipped() {
        let mut art = FieldConstraints::default();
        art = update_constraints(art, &run(true, json!({ "sensor": "PAW3395", "shape": "unk" })), 120);
        art = update_constraints(art, &run(true, json!({ "sensor": " paw3395 " })), 120);
        art = update_constraints(art, &run(false, json!({ "sensor": "HERO 2" })), 120);
        assert_eq!(art.fields["sensor"].allowed_values["paw3395"], 2);
        assert_eq!(art.fields["sensor"].allowed_values.len(), 1);
        assert!(!art.fields.contains_key("shape"));
    }

    #[test]
    fn allowed_values_are_capped() {
        let mut art = FieldConstraints::default();
        for i in 0..10 {
            art = update_constraints(art, &run(true, json!({ "color": format!("c{i}") })), 4);
        }
        assert_eq!(art.fields["color"].allowed_values.len(), 4);
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(bucket_label(45.0, 20.0), "40-60");
        assert_eq!(bucket_label(0.0, 20.0), "0-20");
        assert_eq!(bucket_label(100.0, 20.0), "100-120");
    }

    #[test]
    fn rare_bucket_yields_contradiction_hint() {
        let mut art = FieldConstraints::default();
        for _ in 0..30 {
            art = update_constraints(
                art,
                &run(true, json!({ "connection": "Wireless", "battery_hours": 70 })),
                120,
            );
        }
        let dist = co_occurrence_lookup(&art, "connection", "wireless", "battery_hours").unwrap();
        assert_eq!(dist["60-80"], 30);

        let hint = contradiction_hint(&art, "connection", "wireless", "battery_hours", 5.0).unwrap();
        assert_eq!(hint.bucket, "0-20");
        assert_eq!(hint.total, 30);
        assert!(contradiction_hint(&art, "connection", "wireless", "battery_hours", 65.0).is_none());
        assert!(contradiction_hint(&art, "connection", "wired", "battery_hours", 5.0).is_none());
    }
}
