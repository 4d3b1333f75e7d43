//! Unit conversions
//!
//! Plan math runs in miles and lift loads in whatever unit the athlete
//! picked. These helpers convert only at the edges: rendering plan text,
//! reading distances out of coach text, and parsing onboarding heights.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const KM_PER_MILE: f64 = 1.60934;
pub const CM_PER_INCH: f64 = 2.54;

/// ---------------------------------------------------------------------------
/// Unit Enums
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
  #[default]
  Mi,
  Km,
}

impl DistanceUnit {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Mi => "mi",
      Self::Km => "km",
    }
  }
}

impl std::fmt::Display for DistanceUnit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for DistanceUnit {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "mi" | "mile" | "miles" => Ok(Self::Mi),
      "km" | "kms" | "kilometer" | "kilometers" => Ok(Self::Km),
      other => Err(format!("Unknown distance unit: {}", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
  #[default]
  Lb,
  Kg,
}

impl WeightUnit {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Lb => "lb",
      Self::Kg => "kg",
    }
  }
}

/// Metric/imperial choice from the questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
  Metric,
  Imperial,
}

impl std::str::FromStr for UnitSystem {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "metric" => Ok(Self::Metric),
      "imperial" => Ok(Self::Imperial),
      other => Err(format!("Unknown unit system: {}", other)),
    }
  }
}

/// Display units for an athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Units {
  pub weight: WeightUnit,
  pub distance: DistanceUnit,
}

impl From<UnitSystem> for Units {
  fn from(system: UnitSystem) -> Self {
    match system {
      UnitSystem::Metric => Self {
        weight: WeightUnit::Kg,
        distance: DistanceUnit::Km,
      },
      UnitSystem::Imperial => Self {
        weight: WeightUnit::Lb,
        distance: DistanceUnit::Mi,
      },
    }
  }
}

/// ---------------------------------------------------------------------------
/// Distance
/// ---------------------------------------------------------------------------

/// Convert a distance between units, rounded to the nearest whole unit.
///
/// Same-unit conversions still round, so `10.4 mi -> mi` is `10`.
pub fn convert_distance(value: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
  match (from, to) {
    (DistanceUnit::Mi, DistanceUnit::Km) => (value * KM_PER_MILE).round(),
    (DistanceUnit::Km, DistanceUnit::Mi) => (value / KM_PER_MILE).round(),
    _ => value.round(),
  }
}

/// Render a mileage figure in the display unit, e.g. `"8 km"`
pub fn format_distance(miles: f64, unit: DistanceUnit) -> String {
  format!(
    "{} {}",
    convert_distance(miles, DistanceUnit::Mi, unit) as i64,
    unit
  )
}

/// ---------------------------------------------------------------------------
/// Height
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Height {
  pub cm: Option<u32>,
  pub text: Option<String>,
}

fn cm_pattern() -> Option<&'static Regex> {
  static CM: OnceLock<Option<Regex>> = OnceLock::new();
  CM.get_or_init(|| Regex::new(r"(?i)(\d{2,3})\s*cm").ok()).as_ref()
}

fn feet_inches_pattern() -> Option<&'static Regex> {
  static FT_IN: OnceLock<Option<Regex>> = OnceLock::new();
  FT_IN
    .get_or_init(|| Regex::new(r#"(\d)'\s*(\d{1,2})"?"#).ok())
    .as_ref()
}

/// Convert feet and inches to whole centimeters
pub fn feet_inches_to_cm(feet: u32, inches: u32) -> u32 {
  ((feet * 12 + inches) as f64 * CM_PER_INCH).round() as u32
}

/// Convert centimeters to (feet, inches), rounding to the nearest inch
pub fn cm_to_feet_inches(cm: u32) -> (u32, u32) {
  let total_inches = (cm as f64 / CM_PER_INCH).round() as u32;
  (total_inches / 12, total_inches % 12)
}

/// Label used by the height dropdown, e.g. `150 cm / 4'11"`
pub fn format_height(cm: u32) -> String {
  let (feet, inches) = cm_to_feet_inches(cm);
  format!("{} cm / {}'{}\"", cm, feet, inches)
}

/// Parse a questionnaire height answer.
///
/// Numbers are taken as centimeters. Strings are tried as `### cm` first,
/// then as `5'11"`. Anything else keeps its text with no centimeter value.
pub fn parse_height(value: &serde_json::Value) -> Height {
  match value {
    serde_json::Value::Null => Height::default(),
    serde_json::Value::Number(n) => {
      let cm = n.as_f64().filter(|v| *v > 0.0).map(|v| v.round() as u32);
      Height {
        cm,
        text: cm.map(|c| format!("{} cm", c)),
      }
    }
    other => {
      let text = match other {
        serde_json::Value::String(s) => s.clone(),
        v => v.to_string(),
      };

      if let Some(caps) = cm_pattern().and_then(|re| re.captures(&text)) {
        return Height {
          cm: caps[1].parse().ok(),
          text: Some(text),
        };
      }

      if let Some(caps) = feet_inches_pattern().and_then(|re| re.captures(&text)) {
        let feet: Option<u32> = caps[1].parse().ok();
        let inches: Option<u32> = caps[2].parse().ok();
        if let (Some(ft), Some(inch)) = (feet, inches) {
          return Height {
            cm: Some(feet_inches_to_cm(ft, inch)),
            text: Some(text),
          };
        }
      }

      Height {
        cm: None,
        text: Some(text),
      }
    }
  }
}
