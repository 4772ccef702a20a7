//! Forgiving deserializers for provider output.
//!
//! Providers send numbers as strings, leave fields out, or put the wrong type
//! in a slot entirely. None of that is allowed to fail a batch, so each helper
//! reads a raw `serde_json::Value` and maps anything unusable to a default.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{DetectedFace, RawBoundingBox};

pub(crate) fn value_as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_number(&value))
}

pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_string(deserializer)?.unwrap_or_default())
}

pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

pub(crate) fn bounding_box<'de, D>(deserializer: D) -> Result<RawBoundingBox, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

pub(crate) fn faces<'de, D>(deserializer: D) -> Result<Vec<DetectedFace>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.iter().map(face).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(D::Error::custom(format!(
            "faces must be a list, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads one batch element. Elements that are not objects become an empty
/// face so they still produce an output record.
pub(crate) fn face(value: &Value) -> DetectedFace {
    match serde_json::from_value::<DetectedFace>(value.clone()) {
        Ok(face) => face,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable face record, using empty face");
            DetectedFace::default()
        }
    }
}
