//! The per-run outcome document handed over by the extraction pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient;
use crate::values;

/// Brand/model/variant tuple a run is trying to fill in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityLock {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub model: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub variant: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub category: String,
    #[serde(alias = "product_id", deserialize_with = "lenient::string_or_empty")]
    pub product_id: String,
    #[serde(alias = "identity_lock")]
    pub identity_lock: IdentityLock,
}

impl Job {
    /// Stable key of the product identity: the product id when present,
    /// otherwise a slug of brand, model and variant.
    pub fn identity_key(&self) -> String {
        let id = values::normalize_token(&self.product_id);
        if !id.is_empty() {
            return id.replace(' ', "-");
        }
        let lock = &self.identity_lock;
        [&lock.brand, &lock.model, &lock.variant]
            .iter()
            .map(|part| values::normalize_token(part))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
            .replace(' ', "-")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldReasoning {
    #[serde(alias = "unknown_reason", deserialize_with = "lenient::opt_string")]
    pub unknown_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunSummary {
    #[serde(deserialize_with = "lenient::bool_or_false")]
    pub validated: bool,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub confidence: f64,
    #[serde(alias = "completeness_required", deserialize_with = "lenient::f64_or_zero")]
    pub completeness_required: f64,
    #[serde(alias = "coverage_overall", deserialize_with = "lenient::f64_or_zero")]
    pub coverage_overall: f64,
    #[serde(alias = "missing_required_fields", deserialize_with = "lenient::string_list")]
    pub missing_required_fields: Vec<String>,
    #[serde(
        alias = "critical_fields_below_pass_target",
        deserialize_with = "lenient::string_list"
    )]
    pub critical_fields_below_pass_target: Vec<String>,
    #[serde(alias = "fields_below_pass_target", deserialize_with = "lenient::string_list")]
    pub fields_below_pass_target: Vec<String>,
    #[serde(alias = "contradiction_count", deserialize_with = "lenient::u64_or_zero")]
    pub contradiction_count: u64,
    #[serde(alias = "field_reasoning", deserialize_with = "map_skip_invalid")]
    pub field_reasoning: BTreeMap<String, FieldReasoning>,
}

impl RunSummary {
    /// Confidence clamped to [0, 1].
    pub fn confidence_ratio(&self) -> f64 {
        values::clamp01(self.confidence)
    }

    /// Required-field completeness as a ratio; percentages are scaled down.
    pub fn completeness_ratio(&self) -> f64 {
        values::ratio_or_percent(self.completeness_required)
    }

    pub fn unknown_reason(&self, field: &str) -> Option<&str> {
        self.field_reasoning
            .get(field)
            .and_then(|r| r.unknown_reason.as_deref())
            .filter(|r| !r.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Evidence {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub host: String,
    #[serde(alias = "root_domain", deserialize_with = "lenient::string_or_empty")]
    pub root_domain: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub url: String,
    #[serde(deserialize_with = "lenient::opt_tier")]
    pub tier: Option<u8>,
    #[serde(alias = "key_path", deserialize_with = "lenient::string_or_empty")]
    pub key_path: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub method: String,
}

impl Evidence {
    /// The declared root domain, or one derived from the host or URL.
    pub fn effective_root_domain(&self) -> String {
        effective_root_domain(&self.root_domain, &self.host, &self.url)
    }

    pub fn effective_host(&self) -> String {
        effective_host(&self.host, &self.url)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldProvenance {
    pub value: Value,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub confidence: f64,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub status: String,
    #[serde(alias = "meets_pass_target", deserialize_with = "lenient::bool_or_false")]
    pub meets_pass_target: bool,
    #[serde(alias = "component_ref", deserialize_with = "lenient::opt_string")]
    pub component_ref: Option<String>,
    #[serde(alias = "component_review_status", deserialize_with = "lenient::opt_string")]
    pub component_review_status: Option<String>,
    #[serde(deserialize_with = "lenient::skip_invalid")]
    pub evidence: Vec<Evidence>,
}

impl FieldProvenance {
    /// Tiers of every evidence item that carries one.
    pub fn tier_history(&self) -> Vec<u8> {
        self.evidence.iter().filter_map(|e| e.tier).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityCheck {
    #[serde(rename = "match", deserialize_with = "lenient::bool_or_false")]
    pub matched: bool,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub score: f64,
    #[serde(alias = "critical_conflicts", deserialize_with = "lenient::string_list")]
    pub critical_conflicts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnchorCheck {
    #[serde(alias = "major_conflicts", deserialize_with = "value_list")]
    pub major_conflicts: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldCandidate {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub field: String,
    pub value: Value,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub method: String,
    #[serde(alias = "key_path", deserialize_with = "lenient::string_or_empty")]
    pub key_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSuggestion {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub url: String,
    #[serde(alias = "field_hints", deserialize_with = "lenient::string_list")]
    pub field_hints: Vec<String>,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserHealth {
    #[serde(alias = "health_score", deserialize_with = "lenient::opt_f64")]
    pub health_score: Option<f64>,
}

/// One fetched source and what the pipeline extracted from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceResult {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub url: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub host: String,
    #[serde(alias = "root_domain", deserialize_with = "lenient::string_or_empty")]
    pub root_domain: String,
    #[serde(deserialize_with = "lenient::opt_tier")]
    pub tier: Option<u8>,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub role: String,
    #[serde(alias = "approved_domain", deserialize_with = "lenient::bool_or_false")]
    pub approved_domain: bool,
    pub identity: IdentityCheck,
    #[serde(alias = "anchor_check")]
    pub anchor_check: AnchorCheck,
    #[serde(alias = "field_candidates", deserialize_with = "lenient::skip_invalid")]
    pub field_candidates: Vec<FieldCandidate>,
    #[serde(alias = "endpoint_suggestions", deserialize_with = "lenient::skip_invalid")]
    pub endpoint_suggestions: Vec<EndpointSuggestion>,
    #[serde(alias = "parser_health")]
    pub parser_health: ParserHealth,
}

impl SourceResult {
    pub fn effective_root_domain(&self) -> String {
        effective_root_domain(&self.root_domain, &self.host, &self.url)
    }

    pub fn effective_host(&self) -> String {
        effective_host(&self.host, &self.url)
    }

    pub fn is_manufacturer(&self) -> bool {
        self.role.trim().eq_ignore_ascii_case("manufacturer")
    }

    pub fn has_major_conflicts(&self) -> bool {
        !self.anchor_check.major_conflicts.is_empty()
    }

    /// Whether the identity check flagged a critical brand mismatch.
    pub fn has_brand_mismatch(&self) -> bool {
        self.identity
            .critical_conflicts
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case("brand_mismatch"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoveryCandidate {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub url: String,
    #[serde(alias = "root_domain", deserialize_with = "lenient::string_or_empty")]
    pub root_domain: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub provider: String,
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub query: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoveryResult {
    #[serde(deserialize_with = "lenient::skip_invalid")]
    pub candidates: Vec<DiscoveryCandidate>,
    #[serde(deserialize_with = "query_list")]
    pub queries: Vec<String>,
}

/// Everything the pipeline reports about one completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOutcome {
    pub job: Job,
    #[serde(deserialize_with = "object_map")]
    pub normalized: BTreeMap<String, Value>,
    pub summary: RunSummary,
    #[serde(deserialize_with = "map_skip_invalid")]
    pub provenance: BTreeMap<String, FieldProvenance>,
    #[serde(alias = "source_results", deserialize_with = "lenient::skip_invalid")]
    pub source_results: Vec<SourceResult>,
    #[serde(alias = "discovery_result", alias = "discoveryResult")]
    pub discovery: DiscoveryResult,
}

impl RunOutcome {
    /// Parse a run document; structurally invalid JSON is the only failure.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn category(&self) -> &str {
        &self.job.category
    }

    pub fn brand(&self) -> &str {
        &self.job.identity_lock.brand
    }

    /// Normalized fields holding a known value, in field order.
    pub fn filled_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.normalized
            .iter()
            .filter(|(_, v)| values::is_known_value(v))
    }

    /// Whether any fetched source matched the identity lock.
    pub fn identity_matched_any(&self) -> bool {
        self.source_results.iter().any(|s| s.identity.matched)
    }
}

fn effective_root_domain(root_domain: &str, host: &str, url: &str) -> String {
    let declared = root_domain.trim().to_ascii_lowercase();
    if !declared.is_empty() {
        return declared;
    }
    values::root_domain(&effective_host(host, url))
}

fn effective_host(host: &str, url: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    if !host.is_empty() {
        return host;
    }
    values::host_of(url)
}

fn value_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

fn object_map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, Value>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

fn map_skip_invalid<'de, D, T>(d: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| serde_json::from_value(v).ok().map(|t| (k, t)))
            .collect(),
        _ => BTreeMap::new(),
    })
}

/// Queries arrive either as plain strings or as `{ "query": ... }` objects.
fn query_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(obj) => obj.get("query").map(values::value_text).unwrap_or_default(),
                other => values::value_text(other),
            })
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}
