//! Training log queries
//!
//! Pure functions over a slice of log entries. Nothing here touches the
//! database; the store loads entries and commands call into these.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::log::{RunLog, RunSession};
use crate::models::{LogEntry, Profile};
use crate::units::WeightUnit;

/// Longest streak reported on the dashboard
pub const STREAK_CAP_DAYS: u32 = 30;

/// Number of entries shown in the "recent" list
pub const RECENT_LIMIT: usize = 8;

/// ---------------------------------------------------------------------------
/// Weekly Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklySummary {
  pub strength_sets: u32,
  /// In whatever unit the runs were logged
  pub mileage: f64,
  pub streak: u32,
}

/// Summarize the seven days ending on `today` (inclusive).
///
/// The streak counts consecutive days with at least one entry, walking
/// back from `today`. A day without entries ends it.
pub fn summarize_weekly(logs: &[LogEntry], today: NaiveDate) -> WeeklySummary {
  let start = today - Duration::days(6);
  let in_week = logs.iter().filter(|l| l.date() >= start && l.date() <= today);

  let mut summary = WeeklySummary::default();
  for entry in in_week {
    match entry {
      LogEntry::Strength(s) => summary.strength_sets += s.sets,
      LogEntry::Run(r) => summary.mileage += r.distance,
      LogEntry::Wellness(_) => {}
    }
  }

  summary.streak = (0..STREAK_CAP_DAYS)
    .take_while(|offset| {
      let day = today - Duration::days(*offset as i64);
      logs.iter().any(|l| l.date() == day)
    })
    .count() as u32;

  summary
}

/// Most recent entries, newest first.
///
/// Ties on the same date keep insertion order reversed so a fresh entry
/// shows above older ones from that day.
pub fn recent(logs: &[LogEntry], limit: usize) -> Vec<LogEntry> {
  let mut sorted: Vec<LogEntry> = logs.iter().rev().cloned().collect();
  sorted.sort_by(|a, b| b.date().cmp(&a.date()));
  sorted.truncate(limit);
  sorted
}

/// ---------------------------------------------------------------------------
/// Load Suggestions
/// ---------------------------------------------------------------------------

fn default_load(unit: WeightUnit) -> f64 {
  match unit {
    WeightUnit::Lb => 45.0,
    WeightUnit::Kg => 20.0,
  }
}

fn load_increment(unit: WeightUnit) -> f64 {
  match unit {
    WeightUnit::Lb => 2.5,
    WeightUnit::Kg => 1.25,
  }
}

/// Next working weight for an exercise.
///
/// Takes the most recent completed set of that exercise and adds one
/// increment, rounded to the nearest half unit. With no history (or a
/// zero-weight entry) the bar weight is used as the base.
pub fn suggest_weight(logs: &[LogEntry], exercise: &str, unit: WeightUnit) -> f64 {
  let last = logs
    .iter()
    .filter_map(|l| match l {
      LogEntry::Strength(s) if s.completed && s.exercise == exercise => Some(s),
      _ => None,
    })
    .max_by_key(|s| s.date);

  match last {
    None => default_load(unit),
    Some(s) => {
      let base = if s.weight > 0.0 { s.weight } else { default_load(unit) };
      ((base + load_increment(unit)) * 2.0).round() / 2.0
    }
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Catalog
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyPart {
  Push,
  Pull,
  Legs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
  pub name: &'static str,
  pub bodypart: BodyPart,
}

const EXERCISES: [Exercise; 10] = [
  Exercise { name: "Bench Press", bodypart: BodyPart::Push },
  Exercise { name: "Incline DB Press", bodypart: BodyPart::Push },
  Exercise { name: "Overhead Press", bodypart: BodyPart::Push },
  Exercise { name: "Lat Pulldown", bodypart: BodyPart::Pull },
  Exercise { name: "Barbell Row", bodypart: BodyPart::Pull },
  Exercise { name: "Seated Cable Row", bodypart: BodyPart::Pull },
  Exercise { name: "Deadlift", bodypart: BodyPart::Pull },
  Exercise { name: "Back Squat", bodypart: BodyPart::Legs },
  Exercise { name: "Leg Press", bodypart: BodyPart::Legs },
  Exercise { name: "Bulgarian Split Squat", bodypart: BodyPart::Legs },
];

/// Exercises offered by the strength logger for this athlete
pub fn strength_catalog(profile: &Profile) -> Vec<Exercise> {
  EXERCISES
    .iter()
    .filter(|ex| !(profile.no_deadlift && ex.name.to_lowercase().contains("deadlift")))
    .cloned()
    .collect()
}

/// ---------------------------------------------------------------------------
/// Double Runs
/// ---------------------------------------------------------------------------

/// Reminder shown when a PM double is at least as long as the day's AM run.
///
/// Only applies to athletes running doubles, and only when another run is
/// already logged for that date.
pub fn double_run_warning(profile: &Profile, logs: &[LogEntry], run: &RunLog) -> Option<String> {
  if !profile.double_runs || run.session != RunSession::Pm {
    return None;
  }

  let longest_other = logs
    .iter()
    .filter_map(|l| match l {
      LogEntry::Run(r) if r.date == run.date && r.id != run.id => Some(r.distance),
      _ => None,
    })
    .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))))?;

  if run.distance >= longest_other {
    Some("Reminder: Longer run should be AM (primary). Consider swapping.".to_string())
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::log::{StrengthLog, WellnessLog};
  use crate::test_utils::{mock_run, mock_strength};

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
  }

  #[test]
  fn test_seven_day_window() {
    let today = day(20);
    let logs = vec![
      mock_strength("Bench Press", day(20), 5, 100.0),
      mock_strength("Back Squat", day(14), 3, 150.0),
      mock_strength("Barbell Row", day(13), 4, 90.0),
      mock_run(day(18), 5.0),
      mock_run(day(12), 10.0),
    ];

    let summary = summarize_weekly(&logs, today);
    assert_eq!(summary.strength_sets, 8);
    assert_eq!(summary.mileage, 5.0);
    assert_eq!(summary.streak, 1);
  }

  #[test]
  fn test_summary_is_order_independent() {
    let today = day(20);
    let mut logs = vec![
      mock_strength("Bench Press", day(20), 5, 100.0),
      mock_run(day(19), 4.5),
      mock_run(day(18), 6.0),
      mock_strength("Back Squat", day(17), 3, 150.0),
    ];
    let forward = summarize_weekly(&logs, today);
    logs.reverse();
    let backward = summarize_weekly(&logs, today);
    assert_eq!(forward, backward);
    assert_eq!(forward.streak, 4);
  }

  #[test]
  fn test_streak_caps_at_thirty() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let logs: Vec<LogEntry> = (0..45)
      .map(|i| mock_run(today - Duration::days(i), 1.0))
      .collect();
    assert_eq!(summarize_weekly(&logs, today).streak, STREAK_CAP_DAYS);
  }

  #[test]
  fn test_empty_log_summary() {
    assert_eq!(summarize_weekly(&[], day(1)), WeeklySummary::default());
  }

  #[test]
  fn test_suggest_weight_uses_latest_completed() {
    let mut skipped = match mock_strength("Bench Press", day(19), 5, 200.0) {
      LogEntry::Strength(s) => s,
      _ => unreachable!(),
    };
    skipped.completed = false;

    let logs = vec![
      mock_strength("Bench Press", day(10), 5, 95.0),
      mock_strength("Bench Press", day(15), 5, 101.0),
      LogEntry::Strength(skipped),
      mock_strength("Back Squat", day(18), 5, 300.0),
    ];

    assert_eq!(suggest_weight(&logs, "Bench Press", WeightUnit::Lb), 103.5);
    assert_eq!(suggest_weight(&logs, "Bench Press", WeightUnit::Kg), 102.5);
    assert_eq!(suggest_weight(&logs, "Overhead Press", WeightUnit::Lb), 45.0);
    assert_eq!(suggest_weight(&[], "Overhead Press", WeightUnit::Kg), 20.0);
  }

  #[test]
  fn test_suggest_weight_zero_load_uses_bar() {
    let logs = vec![LogEntry::Strength(StrengthLog {
      id: "s1".into(),
      date: day(1),
      exercise: "Bench Press".into(),
      sets: 3,
      reps: 5,
      weight: 0.0,
      completed: true,
    })];
    assert_eq!(suggest_weight(&logs, "Bench Press", WeightUnit::Lb), 47.5);
  }

  #[test]
  fn test_recent_is_newest_first_and_limited() {
    let mut logs: Vec<LogEntry> = (1..=12).map(|d| mock_run(day(d), d as f64)).collect();
    logs.push(LogEntry::Wellness(WellnessLog {
      id: "w".into(),
      date: day(12),
      sleep: 8.0,
      calories: 2500,
      protein: 150,
      notes: None,
    }));

    let top = recent(&logs, RECENT_LIMIT);
    assert_eq!(top.len(), RECENT_LIMIT);
    assert_eq!(top[0].id(), "w");
    assert_eq!(top[1].date(), day(12));
    assert_eq!(top[7].date(), day(6));
  }

  #[test]
  fn test_catalog_hides_deadlift() {
    let mut profile = Profile::default();
    assert!(strength_catalog(&profile).iter().any(|e| e.name == "Deadlift"));
    profile.no_deadlift = true;
    assert!(strength_catalog(&profile).iter().all(|e| e.name != "Deadlift"));
  }

  #[test]
  fn test_double_run_warning() {
    let mut profile = Profile::default();
    profile.double_runs = true;

    let am = mock_run(day(5), 6.0);
    let pm = match mock_run(day(5), 6.0) {
      LogEntry::Run(mut r) => {
        r.session = RunSession::Pm;
        r
      }
      _ => unreachable!(),
    };

    assert!(double_run_warning(&profile, &[am.clone()], &pm).is_some());
    assert!(double_run_warning(&profile, &[], &pm).is_none());

    let short_pm = RunLog { distance: 3.0, ..pm.clone() };
    assert!(double_run_warning(&profile, &[am.clone()], &short_pm).is_none());

    profile.double_runs = false;
    assert!(double_run_warning(&profile, &[am], &pm).is_none());
  }
}
