//! Forgiving deserializers for form input.
//!
//! Numeric form fields arrive as numbers, numeric strings, empty strings or
//! nothing at all. None of these are rejected: unparseable input becomes
//! zero (or `None` for optional dates).

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  }
  .filter(|v| v.is_finite())
}

pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  Ok(as_f64(&value).unwrap_or(0.0))
}

/// Integers truncate like `parseInt`; negatives clamp to zero
pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  Ok(as_f64(&value).map(|v| v.max(0.0).trunc() as u32).unwrap_or(0))
}

/// ISO day strings; anything else is treated as "not given"
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  Ok(match value {
    Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
    _ => None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Debug, Deserialize)]
  struct Form {
    #[serde(default, deserialize_with = "u32_or_zero")]
    sets: u32,
    #[serde(default, deserialize_with = "f64_or_zero")]
    weight: f64,
    #[serde(default, deserialize_with = "optional_date")]
    date: Option<NaiveDate>,
  }

  #[test]
  fn test_coerces_strings_and_garbage() {
    let form: Form = serde_json::from_value(json!({
      "sets": "5",
      "weight": "abc",
      "date": "2024-03-01"
    }))
    .unwrap();

    assert_eq!(form.sets, 5);
    assert_eq!(form.weight, 0.0);
    assert_eq!(form.date, NaiveDate::from_ymd_opt(2024, 3, 1));
  }

  #[test]
  fn test_missing_and_null_fields_default() {
    let form: Form = serde_json::from_value(json!({ "sets": null, "date": "yesterday" })).unwrap();
    assert_eq!(form.sets, 0);
    assert_eq!(form.weight, 0.0);
    assert_eq!(form.date, None);
  }

  #[test]
  fn test_truncates_and_clamps_integers() {
    let form: Form = serde_json::from_value(json!({ "sets": 3.9 })).unwrap();
    assert_eq!(form.sets, 3);
    let form: Form = serde_json::from_value(json!({ "sets": -2 })).unwrap();
    assert_eq!(form.sets, 0);
  }
}
