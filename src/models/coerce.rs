// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lenient numeric decoding for form input and legacy documents.
//!
//! Older clients stored numbers as strings ("12", "40.5", "") and some
//! stored nothing at all. Malformed values decode to zero instead of failing
//! the whole document.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Coerce a JSON value to a non-negative integer, 0 when malformed.
pub fn coerce_u32(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v.min(u32::MAX as u64) as u32)
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.min(u32::MAX as f64) as u32))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f.min(u32::MAX as f64) as u32)
            .unwrap_or(0),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

/// Coerce a JSON value to a finite float, 0.0 when malformed.
pub fn coerce_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Coerce a JSON value to display text ("12", "8-12").
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

pub fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(coerce_u32(&Value::deserialize(deserializer)?))
}

pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(coerce_f64(&Value::deserialize(deserializer)?))
}

pub fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(coerce_text(&Value::deserialize(deserializer)?))
}

pub fn lenient_weights<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<String, f64>, D::Error> {
    let raw = Option::<HashMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.iter().map(|(k, v)| (k.clone(), coerce_f64(v))).collect())
}
