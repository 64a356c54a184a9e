//! Source quality and extraction-method weights.

use specbrain_core::types::SourceResult;

/// Quality of a fetched source as a hypothesis origin.
pub fn source_quality(source: &SourceResult) -> f64 {
    let mut score = 0.0;
    if source.is_manufacturer() {
        score += 2.5;
    }
    if source.approved_domain {
        score += 1.6;
    }
    if source.identity.matched {
        score += 1.2;
    }
    if !source.has_major_conflicts() {
        score += 0.4;
    }
    score + tier_bonus(source.tier)
}

/// Bonus per tier step above tier 3; each step below costs the same.
const TIER_STEP: f64 = 0.3;
const MAX_TIER_BONUS: f64 = 0.6;
const MIN_TIER_BONUS: f64 = -1.2;
/// A source whose authority was never assessed ranks below every known tier.
const UNTIERED_BONUS: f64 = -1.6;

/// Tier 1 earns 0.6, tier 3 is neutral, lower tiers lose 0.3 per step down to -1.2.
pub fn tier_bonus(tier: Option<u8>) -> f64 {
    match tier {
        Some(t) => (TIER_STEP * (3.0 - f64::from(t))).clamp(MIN_TIER_BONUS, MAX_TIER_BONUS),
        None => UNTIERED_BONUS,
    }
}

/// Weight of an extraction method; structured payloads rank above DOM scraping.
pub fn method_weight(method: &str) -> f64 {
    match method.trim().to_ascii_lowercase().as_str() {
        "network_json" | "api" => 1.4,
        "json_ld" | "jsonld" => 1.2,
        "embedded_state" => 1.1,
        "microdata" => 1.0,
        "pdf" | "pdf_table" => 0.9,
        "table" | "html_table" => 0.8,
        "llm_extract" | "llm" => 0.7,
        "dom" => 0.6,
        _ => 0.5,
    }
}
