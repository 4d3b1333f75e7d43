//! Test utilities and helpers for unit and command testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Helper assertions

use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::sync::Arc;
use url::Url;

use crate::config::CoachConfig;
use crate::db::AppState;
use crate::models::log::{new_id, RunLog, RunSession, StrengthLog};
use crate::models::{LogEntry, Profile};
use crate::units::{UnitSystem, Units};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Coach config without an API key, pointed at an unroutable base
pub fn mock_config() -> CoachConfig {
  CoachConfig {
    api_key: None,
    coach_name: "Coach".to_string(),
    model: "gpt-4o-mini".to_string(),
    api_base: Url::parse("http://127.0.0.1:9/").expect("valid test url"),
    beta_code: "FORCE3BETA".to_string(),
  }
}

/// App state for command tests, to be passed to `app.manage`
pub fn mock_state(pool: SqlitePool) -> Arc<AppState> {
  Arc::new(AppState::new(pool, mock_config()))
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Onboarded imperial athlete with no plan switches set
pub fn mock_profile() -> Profile {
  Profile {
    name: "Sam".to_string(),
    age: Some(34),
    units: Units::from(UnitSystem::Imperial),
    weight: Some(180.0),
    goal: "Hybrid".to_string(),
    goals: vec!["hybrid".to_string()],
    modalities: vec!["strength".to_string(), "run".to_string()],
    weekly_availability: 5,
    ..Profile::default()
  }
}

/// A completed strength entry
pub fn mock_strength(exercise: &str, date: NaiveDate, sets: u32, weight: f64) -> LogEntry {
  LogEntry::Strength(StrengthLog {
    id: new_id(),
    date,
    exercise: exercise.to_string(),
    sets,
    reps: 5,
    weight,
    completed: true,
  })
}

/// A solo easy run at a 9:00 pace
pub fn mock_run(date: NaiveDate, distance: f64) -> LogEntry {
  LogEntry::Run(RunLog {
    id: new_id(),
    date,
    run_type: "Easy".to_string(),
    session: RunSession::Solo,
    distance,
    duration: (distance * 9.0).round(),
    pace: "9:00".to_string(),
  })
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr) => {
    assert_approx_eq!($left, $right, 1e-9)
  };
  ($left:expr, $right:expr, $tolerance:expr) => {{
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  }};
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();

    assert_eq!(
      names,
      vec!["app_state", "log_entries", "plan_versions", "today_done", "today_run_done", "week_notes"]
    );

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_factories_make_unique_ids() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let a = mock_run(date, 5.0);
    let b = mock_run(date, 5.0);
    assert_ne!(a.id(), b.id());
    assert!(mock_profile().is_onboarded());
  }

  #[test]
  fn test_assert_approx_eq() {
    assert_approx_eq!(0.1_f64 + 0.2, 0.3);
    assert_approx_eq!(10.0_f64, 10.04, 0.05);
  }
}
