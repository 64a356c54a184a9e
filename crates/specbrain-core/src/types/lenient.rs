//! Forgiving `deserialize_with` helpers.
//!
//! Pipeline documents are produced by loosely-typed code: numbers arrive as
//! strings, booleans as `"true"`/`1`, and any field may be `null`. Every helper
//! here coerces what it can and falls back to the empty value otherwise, so a
//! single malformed field never rejects a whole document.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::values;

pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(values::safe_f64(&v).unwrap_or(0.0))
}

pub fn u64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(values::safe_u64(&v).unwrap_or(0))
}

pub fn bool_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(values::safe_bool(&v))
}

pub fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(values::value_text(&v))
}

pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(values::safe_f64(&v))
}

/// Source tiers are small positive integers; anything else means "no tier".
pub fn opt_tier<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(values::safe_u64(&v)
        .filter(|t| (1..=u64::from(u8::MAX)).contains(t))
        .map(|t| t as u8))
}

/// A list of strings; non-string items are rendered as text, empty ones dropped.
pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Array(items) => items
            .iter()
            .map(values::value_text)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

/// A list of typed items; entries that fail to deserialize are skipped.
pub fn skip_invalid<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A non-empty trimmed string, or `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Value::deserialize(d)?;
    let text = values::value_text(&v);
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
