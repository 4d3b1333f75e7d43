use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::lenient::as_f64;
use crate::units::{parse_height, DistanceUnit, UnitSystem, Units};

/// Raw questionnaire answers keyed by question id
pub type Answers = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
  Male,
  Female,
  #[default]
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPreference {
  FullBody,
  UpperLower,
  PushPullLegs,
  #[default]
  NoPref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardioIntensity {
  Low,
  Mixed,
  High,
  #[default]
  NoPref,
}

/// Athlete profile captured at onboarding.
///
/// Replaced wholesale when the athlete re-onboards. Every field has a
/// default so partially filled answers and older exports still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
  pub name: String,
  pub sex: Sex,
  pub age: Option<u32>,
  pub units: Units,
  pub height_cm: Option<u32>,
  pub height_text: Option<String>,
  pub weight: Option<f64>,
  /// Headline goal shown on the dashboard
  pub goal: String,
  pub goals: Vec<String>,
  pub modalities: Vec<String>,
  pub experience: Experience,
  /// Training days per week, 1-7
  pub weekly_availability: u8,
  pub exercise_frequency: Option<String>,
  pub current_goal: Option<String>,
  pub diet_type: Option<String>,
  pub split_pref: SplitPreference,
  pub cardio_intensity: CardioIntensity,
  pub preferred_rest_days: Vec<Weekday>,
  pub equipment: Vec<String>,
  pub constraints: Vec<String>,
  pub recent_strength: Option<String>,
  pub recent_cardio: Option<String>,
  pub nutrition_pref: Vec<String>,
  pub other_notes: String,
  pub sports: String,
  /// Hide deadlifts from plans and exercise pickers
  pub no_deadlift: bool,
  /// Split one easy day into AM/PM runs
  pub double_runs: bool,
}

impl Default for Profile {
  fn default() -> Self {
    Self {
      name: String::new(),
      sex: Sex::Other,
      age: None,
      units: Units::default(),
      height_cm: None,
      height_text: None,
      weight: None,
      goal: "General fitness".to_string(),
      goals: Vec::new(),
      modalities: Vec::new(),
      experience: Experience::Beginner,
      weekly_availability: 3,
      exercise_frequency: None,
      current_goal: None,
      diet_type: None,
      split_pref: SplitPreference::NoPref,
      cardio_intensity: CardioIntensity::NoPref,
      preferred_rest_days: Vec::new(),
      equipment: Vec::new(),
      constraints: Vec::new(),
      recent_strength: None,
      recent_cardio: None,
      nutrition_pref: Vec::new(),
      other_notes: String::new(),
      sports: String::new(),
      no_deadlift: false,
      double_runs: false,
    }
  }
}

impl Profile {
  pub fn distance_unit(&self) -> DistanceUnit {
    self.units.distance
  }

  /// True once onboarding has produced a named profile
  pub fn is_onboarded(&self) -> bool {
    !self.name.trim().is_empty()
  }

  /// Build a profile from questionnaire answers.
  ///
  /// Unknown enum values and missing answers fall back to the defaults
  /// listed on each field; zero or non-numeric numbers count as missing.
  pub fn from_answers(answers: &Answers) -> Self {
    let height = answers.get("height").map(parse_height).unwrap_or_default();
    let constraints = list(answers, "constraints");
    let modalities = list(answers, "modalities");
    let goals = list(answers, "primary_goals");

    let units = text(answers, "units")
      .and_then(|u| u.parse::<UnitSystem>().ok())
      .map(Units::from)
      .unwrap_or(Units::from(UnitSystem::Metric));

    let weekly_availability = number(answers, "availability")
      .map(|v| v.round().clamp(1.0, 7.0) as u8)
      .unwrap_or(3);

    Self {
      name: text(answers, "name").unwrap_or_else(|| "Athlete".to_string()),
      sex: choice(answers, "sex"),
      age: number(answers, "age").map(|v| v.round() as u32),
      units,
      height_cm: height.cm,
      height_text: height.text,
      weight: number(answers, "weight"),
      goal: goals
        .first()
        .map(|g| humanize(g))
        .unwrap_or_else(|| "General fitness".to_string()),
      goals,
      experience: choice(answers, "experience"),
      weekly_availability,
      exercise_frequency: text(answers, "exercise_frequency"),
      current_goal: text(answers, "current_goal"),
      diet_type: text(answers, "diet_type"),
      split_pref: choice(answers, "split_pref"),
      cardio_intensity: choice(answers, "cardio_intensity"),
      preferred_rest_days: list(answers, "preferred_rest_days")
        .iter()
        .filter_map(|d| d.parse::<Weekday>().ok())
        .collect(),
      equipment: list(answers, "equipment"),
      no_deadlift: constraints.iter().any(|c| c == "no_deadlifts"),
      constraints,
      recent_strength: text(answers, "recent_strength"),
      recent_cardio: text(answers, "recent_cardio"),
      nutrition_pref: list(answers, "nutrition_pref"),
      other_notes: text(answers, "other_notes").unwrap_or_default(),
      sports: modalities.join(", "),
      modalities,
      double_runs: flag(answers, "double_runs"),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Answer Helpers
/// ---------------------------------------------------------------------------

fn text(answers: &Answers, key: &str) -> Option<String> {
  match answers.get(key)? {
    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
    _ => None,
  }
}

fn number(answers: &Answers, key: &str) -> Option<f64> {
  answers.get(key).and_then(as_f64).filter(|v| *v != 0.0)
}

fn list(answers: &Answers, key: &str) -> Vec<String> {
  match answers.get(key) {
    Some(Value::Array(items)) => items
      .iter()
      .filter_map(|v| v.as_str().map(str::to_string))
      .collect(),
    Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
    _ => Vec::new(),
  }
}

/// Checkbox (`true`) or yes/no choice
fn flag(answers: &Answers, key: &str) -> bool {
  match answers.get(key) {
    Some(Value::Bool(b)) => *b,
    Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "true"),
    _ => false,
  }
}

/// Parse a snake_case select answer into its enum, or the enum default
fn choice<T>(answers: &Answers, key: &str) -> T
where
  T: serde::de::DeserializeOwned + Default,
{
  text(answers, key)
    .and_then(|v| serde_json::from_value(Value::String(v)).ok())
    .unwrap_or_default()
}

fn humanize(value: &str) -> String {
  let spaced = value.replace('_', " ");
  let mut chars = spaced.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
