//! Shared value helpers: unknown-token detection, safe numeric parsing,
//! tokenization, and host/domain normalization.

use std::net::IpAddr;

use serde_json::Value;
use url::Url;

/// Tokens the pipeline uses for "no value".
const UNKNOWN_TOKENS: &[&str] = &["", "unk", "unknown", "n/a", "na", "none", "null", "-"];

/// Second-level labels that sit under a country code (`co.uk`, `com.au`).
const COUNTRY_SECOND_LEVEL: &[&str] = &["co", "com", "net", "org", "ac", "gov", "edu", "ne", "or"];

pub fn is_unknown_token(text: &str) -> bool {
    let lowered = text.trim().to_ascii_lowercase();
    UNKNOWN_TOKENS.contains(&lowered.as_str())
}

/// Whether a JSON value carries a real field value.
pub fn is_known_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !is_unknown_token(s),
        Value::Array(items) => items.iter().any(is_known_value),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Render a scalar as text. Strings are trimmed; null and containers become empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// Lowercase, trim, and collapse inner whitespace.
pub fn normalize_token(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a number out of free text: thousands separators are stripped.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn safe_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Non-negative integer view of a value; fractional values are truncated.
pub fn safe_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64)),
        Value::String(s) => parse_number(s).filter(|v| *v >= 0.0).map(|v| v as u64),
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

pub fn safe_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        _ => false,
    }
}

pub fn clamp01(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Values above 1 are read as percentages.
pub fn ratio_or_percent(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    if v > 1.0 {
        clamp01(v / 100.0)
    } else {
        clamp01(v)
    }
}

/// Lowercase alphanumeric tokens of a key path or free text.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Host of a URL, lowercased and IDNA-encoded, without port or credentials.
/// Bare hosts (`www.example.com/specs`) are read as `https` URLs.
pub fn host_of(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let host = |text: &str| {
        Url::parse(text)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase()))
            .filter(|h| !h.is_empty())
    };
    host(trimmed)
        .or_else(|| host(&format!("https://{trimmed}")))
        .unwrap_or_default()
}

/// Registrable root domain of a host: `www.` stripped, last two labels,
/// or three under a country-code second level (`shop.example.co.uk` -> `example.co.uk`).
pub fn root_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
        return host;
    }
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }
    let n = labels.len();
    let keep = if labels[n - 1].len() == 2 && COUNTRY_SECOND_LEVEL.contains(&labels[n - 2]) {
        3
    } else {
        2
    };
    labels[n - keep..].join(".")
}
