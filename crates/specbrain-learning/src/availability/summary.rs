//! Read-only views over the availability artifact.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::classify::AvailabilityClass;
use super::learner::FieldAvailability;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFieldBuckets {
    pub expected: Vec<String>,
    pub sometimes: Vec<String>,
    pub rare: Vec<String>,
}

/// Split missing fields by availability class, keeping input order.
/// Fields without history fall into `sometimes`.
pub fn bucket_missing_fields(artifact: &FieldAvailability, missing: &[String]) -> MissingFieldBuckets {
    let mut buckets = MissingFieldBuckets::default();
    let mut seen = BTreeSet::new();
    for field in missing.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
        if !seen.insert(field) {
            continue;
        }
        let bucket = match artifact.class_of(field) {
            AvailabilityClass::Expected => &mut buckets.expected,
            AvailabilityClass::Sometimes => &mut buckets.sometimes,
            AvailabilityClass::Rare => &mut buckets.rare,
        };
        bucket.push(field.to_string());
    }
    buckets
}

/// An expected field that still often comes back unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedUnknown {
    pub field: String,
    pub validated_seen: u64,
    pub unknown_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySummary {
    pub fields_total: usize,
    pub expected: usize,
    pub sometimes: usize,
    pub rare: usize,
    pub top_expected_unknown: Vec<ExpectedUnknown>,
}

pub fn availability_summary(artifact: &FieldAvailability, top_n: usize) -> AvailabilitySummary {
    let mut summary = AvailabilitySummary {
        fields_total: artifact.fields.len(),
        ..Default::default()
    };
    let mut expected_unknown = Vec::new();
    for (field, row) in &artifact.fields {
        match row.classification {
            AvailabilityClass::Expected => {
                summary.expected += 1;
                if row.validated_seen > 0 && row.unknown_count() > 0 {
                    expected_unknown.push(ExpectedUnknown {
                        field: field.clone(),
                        validated_seen: row.validated_seen,
                        unknown_rate: row.unknown_count() as f64 / row.validated_seen as f64,
                    });
                }
            }
            AvailabilityClass::Sometimes => summary.sometimes += 1,
            AvailabilityClass::Rare => summary.rare += 1,
        }
    }
    expected_unknown.sort_by(|a, b| {
        b.unknown_rate
            .total_cmp(&a.unknown_rate)
            .then_with(|| a.field.cmp(&b.field))
    });
    expected_unknown.truncate(top_n);
    summary.top_expected_unknown = expected_unknown;
    summary
}
