use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::lenient;

/// Run types offered by the run logger and the Today editor
pub const RUN_TYPES: [&str; 6] = ["Long", "Easy", "Tempo", "Intervals", "Fartlek", "Recovery"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
  Strength,
  Run,
  Wellness,
}

impl LogKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Strength => "strength",
      Self::Run => "run",
      Self::Wellness => "wellness",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunSession {
  #[serde(rename = "AM")]
  Am,
  #[serde(rename = "PM")]
  Pm,
  #[default]
  Solo,
}

/// ---------------------------------------------------------------------------
/// Log Entries
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthLog {
  pub id: String,
  pub date: NaiveDate,
  pub exercise: String,
  pub sets: u32,
  pub reps: u32,
  pub weight: f64,
  pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
  pub id: String,
  pub date: NaiveDate,
  pub run_type: String,
  pub session: RunSession,
  pub distance: f64,
  /// Minutes
  pub duration: f64,
  pub pace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessLog {
  pub id: String,
  pub date: NaiveDate,
  /// Hours
  pub sleep: f64,
  pub calories: u32,
  /// Grams
  pub protein: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

/// One historical record in the training log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEntry {
  Strength(StrengthLog),
  Run(RunLog),
  Wellness(WellnessLog),
}

impl LogEntry {
  pub fn id(&self) -> &str {
    match self {
      Self::Strength(l) => &l.id,
      Self::Run(l) => &l.id,
      Self::Wellness(l) => &l.id,
    }
  }

  pub fn date(&self) -> NaiveDate {
    match self {
      Self::Strength(l) => l.date,
      Self::Run(l) => l.date,
      Self::Wellness(l) => l.date,
    }
  }

  pub fn kind(&self) -> LogKind {
    match self {
      Self::Strength(_) => LogKind::Strength,
      Self::Run(_) => LogKind::Run,
      Self::Wellness(_) => LogKind::Wellness,
    }
  }
}

pub fn new_id() -> String {
  Uuid::new_v4().to_string()
}

/// ---------------------------------------------------------------------------
/// Form Input
/// ---------------------------------------------------------------------------

/// A log entry as submitted by a form, before it gets an id.
///
/// Numeric fields are coerced rather than validated; a missing or
/// malformed date means "today".
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NewLogEntry {
  Strength {
    #[serde(default, deserialize_with = "lenient::optional_date")]
    date: Option<NaiveDate>,
    #[serde(default)]
    exercise: String,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    sets: u32,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    reps: u32,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    weight: f64,
    #[serde(default = "default_completed")]
    completed: bool,
  },
  Run {
    #[serde(default, deserialize_with = "lenient::optional_date")]
    date: Option<NaiveDate>,
    #[serde(default = "default_run_type")]
    run_type: String,
    #[serde(default)]
    session: RunSession,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    distance: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    duration: f64,
    #[serde(default)]
    pace: Option<String>,
  },
  Wellness {
    #[serde(default, deserialize_with = "lenient::optional_date")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    sleep: f64,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    calories: u32,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    protein: u32,
    #[serde(default)]
    notes: Option<String>,
  },
}

fn default_completed() -> bool {
  true
}

fn default_run_type() -> String {
  "Easy".to_string()
}

impl NewLogEntry {
  pub fn into_entry(self, today: NaiveDate) -> LogEntry {
    let id = new_id();
    match self {
      Self::Strength {
        date,
        exercise,
        sets,
        reps,
        weight,
        completed,
      } => LogEntry::Strength(StrengthLog {
        id,
        date: date.unwrap_or(today),
        exercise: exercise.trim().to_string(),
        sets,
        reps,
        weight,
        completed,
      }),
      Self::Run {
        date,
        run_type,
        session,
        distance,
        duration,
        pace,
      } => {
        let pace = pace
          .filter(|p| !p.trim().is_empty())
          .or_else(|| pace_per_unit(duration, distance))
          .unwrap_or_default();
        LogEntry::Run(RunLog {
          id,
          date: date.unwrap_or(today),
          run_type,
          session,
          distance,
          duration,
          pace,
        })
      }
      Self::Wellness {
        date,
        sleep,
        calories,
        protein,
        notes,
      } => LogEntry::Wellness(WellnessLog {
        id,
        date: date.unwrap_or(today),
        sleep,
        calories,
        protein,
        notes: notes.filter(|n| !n.trim().is_empty()),
      }),
    }
  }
}

/// Minutes per distance unit, e.g. `"8.5 min"`; None without a distance
pub fn pace_per_unit(duration_min: f64, distance: f64) -> Option<String> {
  if distance > 0.0 && duration_min > 0.0 {
    Some(format!("{:.1} min", duration_min / distance))
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
  }

  #[test]
  fn test_entry_json_shape_is_tagged() {
    let entry = LogEntry::Run(RunLog {
      id: "abc".into(),
      date: day(),
      run_type: "Easy".into(),
      session: RunSession::Am,
      distance: 5.0,
      duration: 45.0,
      pace: "9:00".into(),
    });
    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(value["type"], "run");
    assert_eq!(value["session"], "AM");
    assert_eq!(value["date"], "2024-05-10");
  }

  #[test]
  fn test_new_strength_entry_coerces_input() {
    let input: NewLogEntry = serde_json::from_value(json!({
      "type": "strength",
      "exercise": " Bench Press ",
      "sets": "5",
      "reps": "",
      "weight": "abc"
    }))
    .unwrap();

    match input.into_entry(day()) {
      LogEntry::Strength(log) => {
        assert_eq!(log.exercise, "Bench Press");
        assert_eq!(log.sets, 5);
        assert_eq!(log.reps, 0);
        assert_eq!(log.weight, 0.0);
        assert!(log.completed);
        assert_eq!(log.date, day());
        assert!(!log.id.is_empty());
      }
      other => panic!("Expected strength entry, got {:?}", other),
    }
  }

  #[test]
  fn test_new_run_entry_fills_pace() {
    let input: NewLogEntry = serde_json::from_value(json!({
      "type": "run",
      "date": "2024-05-09",
      "distance": 4,
      "duration": 34
    }))
    .unwrap();

    match input.into_entry(day()) {
      LogEntry::Run(log) => {
        assert_eq!(log.pace, "8.5 min");
        assert_eq!(log.run_type, "Easy");
        assert_eq!(log.session, RunSession::Solo);
        assert_eq!(log.date, NaiveDate::from_ymd_opt(2024, 5, 9).unwrap());
      }
      other => panic!("Expected run entry, got {:?}", other),
    }
  }

  #[test]
  fn test_new_entries_get_unique_ids() {
    let make = || {
      serde_json::from_value::<NewLogEntry>(json!({ "type": "wellness", "notes": "  " }))
        .unwrap()
        .into_entry(day())
    };
    let (a, b) = (make(), make());
    assert_ne!(a.id(), b.id());
    match a {
      LogEntry::Wellness(w) => assert_eq!(w.notes, None),
      other => panic!("Expected wellness entry, got {:?}", other),
    }
  }
}
