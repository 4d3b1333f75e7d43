//! Persistent application state
//!
//! Everything the app remembers lives in SQLite: the profile and settings,
//! the training log, today's template and per-date completion, saved plan
//! versions, week notes and the week grid. Each mutation is saved as it
//! happens. Reads never fail on bad data: a JSON column that no longer
//! decodes is logged and replaced with its default.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::version::MAX_PLAN_VERSIONS;
use crate::models::{LogEntry, PlanVersion, Profile, Settings};
use crate::plan::{WeekGrid, PLAN_WEEKS};
use crate::today::{TodayCompletion, TodayTemplate};

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Could not encode value: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("Week {0} is outside the 16-week plan")]
  InvalidWeek(usize),
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Decode a JSON column, falling back to the default on missing or bad data
fn decode_or_default<T: DeserializeOwned + Default>(column: &str, raw: Option<String>) -> T {
  match raw {
    None => T::default(),
    Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
      warn!(column, error = %e, "Stored value did not decode, using default");
      T::default()
    }),
  }
}

async fn app_state_column(pool: &SqlitePool, column: &str) -> StoreResult<Option<String>> {
  // Column names come from this module only
  let row = sqlx::query(&format!("SELECT {} FROM app_state WHERE id = 1", column))
    .fetch_optional(pool)
    .await?;
  Ok(row.and_then(|r| r.get::<Option<String>, _>(0)))
}

async fn set_app_state_column<T: Serialize>(pool: &SqlitePool, column: &str, value: &T) -> StoreResult<()> {
  let json = serde_json::to_string(value)?;
  sqlx::query(&format!(
    "INSERT INTO app_state (id, {0}, updated_at) VALUES (1, ?, ?)
     ON CONFLICT(id) DO UPDATE SET {0} = excluded.{0}, updated_at = excluded.updated_at",
    column
  ))
  .bind(&json)
  .bind(Utc::now().to_rfc3339())
  .execute(pool)
  .await?;
  debug!(column, "Saved app state");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Beta Gate, Profile, Settings
/// ---------------------------------------------------------------------------

pub async fn is_authed(pool: &SqlitePool) -> StoreResult<bool> {
  let authed: Option<i64> = sqlx::query_scalar("SELECT authed FROM app_state WHERE id = 1")
    .fetch_optional(pool)
    .await?;
  Ok(authed.unwrap_or(0) != 0)
}

pub async fn set_authed(pool: &SqlitePool, authed: bool) -> StoreResult<()> {
  sqlx::query(
    "INSERT INTO app_state (id, authed, updated_at) VALUES (1, ?, ?)
     ON CONFLICT(id) DO UPDATE SET authed = excluded.authed, updated_at = excluded.updated_at",
  )
  .bind(authed as i64)
  .bind(Utc::now().to_rfc3339())
  .execute(pool)
  .await?;
  Ok(())
}

pub async fn load_profile(pool: &SqlitePool) -> StoreResult<Profile> {
  Ok(decode_or_default("profile_json", app_state_column(pool, "profile_json").await?))
}

pub async fn save_profile(pool: &SqlitePool, profile: &Profile) -> StoreResult<()> {
  set_app_state_column(pool, "profile_json", profile).await
}

pub async fn load_settings(pool: &SqlitePool) -> StoreResult<Settings> {
  Ok(decode_or_default("settings_json", app_state_column(pool, "settings_json").await?))
}

pub async fn save_settings(pool: &SqlitePool, settings: &Settings) -> StoreResult<()> {
  set_app_state_column(pool, "settings_json", settings).await
}

/// ---------------------------------------------------------------------------
/// Today Template & Week Grid
/// ---------------------------------------------------------------------------

/// `None` until the dashboard first seeds a template
pub async fn load_today_template(pool: &SqlitePool) -> StoreResult<Option<TodayTemplate>> {
  Ok(decode_or_default("today_json", app_state_column(pool, "today_json").await?))
}

pub async fn save_today_template(pool: &SqlitePool, template: &TodayTemplate) -> StoreResult<()> {
  set_app_state_column(pool, "today_json", template).await
}

pub async fn load_week_grid(pool: &SqlitePool) -> StoreResult<Option<WeekGrid>> {
  Ok(decode_or_default("week_grid_json", app_state_column(pool, "week_grid_json").await?))
}

pub async fn save_week_grid(pool: &SqlitePool, grid: &WeekGrid) -> StoreResult<()> {
  set_app_state_column(pool, "week_grid_json", grid).await
}

/// ---------------------------------------------------------------------------
/// Training Log
/// ---------------------------------------------------------------------------

async fn insert_log<'e, E>(executor: E, entry: &LogEntry) -> StoreResult<()>
where
  E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
  let json = serde_json::to_string(entry)?;
  sqlx::query(
    "INSERT INTO log_entries (id, kind, date, entry_json, created_at) VALUES (?, ?, ?, ?, ?)",
  )
  .bind(entry.id())
  .bind(entry.kind().as_str())
  .bind(entry.date().to_string())
  .bind(&json)
  .bind(Utc::now().to_rfc3339())
  .execute(executor)
  .await?;
  Ok(())
}

pub async fn append_log(pool: &SqlitePool, entry: &LogEntry) -> StoreResult<()> {
  insert_log(pool, entry).await?;
  debug!(id = entry.id(), kind = entry.kind().as_str(), "Appended log entry");
  Ok(())
}

/// All entries in insertion order. Rows that fail to decode are skipped.
pub async fn load_logs(pool: &SqlitePool) -> StoreResult<Vec<LogEntry>> {
  let rows = sqlx::query("SELECT id, entry_json FROM log_entries ORDER BY seq")
    .fetch_all(pool)
    .await?;

  Ok(
    rows
      .into_iter()
      .filter_map(|row| {
        let id: String = row.get("id");
        let json: String = row.get("entry_json");
        serde_json::from_str(&json)
          .map_err(|e| warn!(id = %id, error = %e, "Skipping undecodable log entry"))
          .ok()
      })
      .collect(),
  )
}

/// Returns whether an entry was removed
pub async fn delete_log(pool: &SqlitePool, id: &str) -> StoreResult<bool> {
  let result = sqlx::query("DELETE FROM log_entries WHERE id = ?")
    .bind(id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// ---------------------------------------------------------------------------
/// Today Completion
/// ---------------------------------------------------------------------------

pub async fn load_completion(pool: &SqlitePool, date: NaiveDate) -> StoreResult<TodayCompletion> {
  let key = date.to_string();
  let items: Vec<String> = sqlx::query_scalar("SELECT item_id FROM today_done WHERE date = ?")
    .bind(&key)
    .fetch_all(pool)
    .await?;
  let run: Option<String> = sqlx::query_scalar("SELECT date FROM today_run_done WHERE date = ?")
    .bind(&key)
    .fetch_optional(pool)
    .await?;

  Ok(TodayCompletion {
    date,
    items: items.into_iter().collect(),
    run: run.is_some(),
  })
}

async fn mark_item_done<'e, E>(executor: E, date: NaiveDate, item_id: &str) -> StoreResult<()>
where
  E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
  sqlx::query("INSERT OR IGNORE INTO today_done (date, item_id) VALUES (?, ?)")
    .bind(date.to_string())
    .bind(item_id)
    .execute(executor)
    .await?;
  Ok(())
}

async fn mark_run_done<'e, E>(executor: E, date: NaiveDate) -> StoreResult<()>
where
  E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
  sqlx::query("INSERT OR IGNORE INTO today_run_done (date) VALUES (?)")
    .bind(date.to_string())
    .execute(executor)
    .await?;
  Ok(())
}

/// Persist every flag in `completion`. Flags are only added, never removed.
pub async fn save_completion(pool: &SqlitePool, completion: &TodayCompletion) -> StoreResult<()> {
  let mut tx = pool.begin().await?;
  for item_id in &completion.items {
    mark_item_done(&mut *tx, completion.date, item_id).await?;
  }
  if completion.run {
    mark_run_done(&mut *tx, completion.date).await?;
  }
  tx.commit().await?;
  Ok(())
}

pub async fn clear_completion(pool: &SqlitePool, date: NaiveDate) -> StoreResult<()> {
  let key = date.to_string();
  let mut tx = pool.begin().await?;
  sqlx::query("DELETE FROM today_done WHERE date = ?")
    .bind(&key)
    .execute(&mut *tx)
    .await?;
  sqlx::query("DELETE FROM today_run_done WHERE date = ?")
    .bind(&key)
    .execute(&mut *tx)
    .await?;
  tx.commit().await?;
  Ok(())
}

/// Append a checklist log entry and set its completion flag together.
/// `item_id` of `None` marks the run.
pub async fn record_completion(
  pool: &SqlitePool,
  date: NaiveDate,
  item_id: Option<&str>,
  entry: &LogEntry,
) -> StoreResult<()> {
  let mut tx = pool.begin().await?;
  insert_log(&mut *tx, entry).await?;
  match item_id {
    Some(id) => mark_item_done(&mut *tx, date, id).await?,
    None => mark_run_done(&mut *tx, date).await?,
  }
  tx.commit().await?;
  debug!(%date, item_id, log_id = entry.id(), "Recorded checklist completion");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Plan Versions
/// ---------------------------------------------------------------------------

/// Newest first
pub async fn list_versions(pool: &SqlitePool) -> StoreResult<Vec<PlanVersion>> {
  Ok(
    sqlx::query_as::<_, PlanVersion>(
      "SELECT id, name, content, created_at FROM plan_versions ORDER BY seq DESC",
    )
    .fetch_all(pool)
    .await?,
  )
}

pub async fn get_version(pool: &SqlitePool, id: &str) -> StoreResult<Option<PlanVersion>> {
  Ok(
    sqlx::query_as::<_, PlanVersion>(
      "SELECT id, name, content, created_at FROM plan_versions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?,
  )
}

/// Save a version at the head of the list, evicting the oldest past the cap
pub async fn save_version(pool: &SqlitePool, version: &PlanVersion) -> StoreResult<()> {
  let mut tx = pool.begin().await?;
  sqlx::query("INSERT INTO plan_versions (id, name, content, created_at) VALUES (?, ?, ?, ?)")
    .bind(&version.id)
    .bind(&version.name)
    .bind(&version.content)
    .bind(version.created_at)
    .execute(&mut *tx)
    .await?;
  let evicted = sqlx::query(
    "DELETE FROM plan_versions WHERE seq NOT IN (SELECT seq FROM plan_versions ORDER BY seq DESC LIMIT ?)",
  )
  .bind(MAX_PLAN_VERSIONS as i64)
  .execute(&mut *tx)
  .await?
  .rows_affected();
  tx.commit().await?;

  if evicted > 0 {
    debug!(evicted, "Evicted old plan versions");
  }
  Ok(())
}

pub async fn delete_version(pool: &SqlitePool, id: &str) -> StoreResult<bool> {
  let result = sqlx::query("DELETE FROM plan_versions WHERE id = ?")
    .bind(id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// ---------------------------------------------------------------------------
/// Week Notes
/// ---------------------------------------------------------------------------

/// Always sixteen notes; unsaved weeks are empty
pub async fn load_week_notes(pool: &SqlitePool) -> StoreResult<Vec<String>> {
  let rows: Vec<(i64, String)> = sqlx::query_as("SELECT week, note FROM week_notes")
    .fetch_all(pool)
    .await?;

  let mut notes = vec![String::new(); PLAN_WEEKS];
  for (week, note) in rows {
    if let Some(slot) = (week as usize).checked_sub(1).and_then(|i| notes.get_mut(i)) {
      *slot = note;
    }
  }
  Ok(notes)
}

/// `week` is 1-based
pub async fn save_week_note(pool: &SqlitePool, week: usize, note: &str) -> StoreResult<()> {
  if !(1..=PLAN_WEEKS).contains(&week) {
    return Err(StoreError::InvalidWeek(week));
  }
  sqlx::query(
    "INSERT INTO week_notes (week, note) VALUES (?, ?)
     ON CONFLICT(week) DO UPDATE SET note = excluded.note",
  )
  .bind(week as i64)
  .bind(note)
  .execute(pool)
  .await?;
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Export / Import / Reset
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayCompletion {
  #[serde(default)]
  pub items: BTreeSet<String>,
  #[serde(default)]
  pub run: bool,
}

/// Everything the app stores, as one JSON document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSnapshot {
  pub authed: bool,
  pub profile: Profile,
  pub settings: Settings,
  pub logs: Vec<LogEntry>,
  pub today: Option<TodayTemplate>,
  /// Keyed by ISO date
  pub today_done: BTreeMap<NaiveDate, DayCompletion>,
  /// Newest first
  pub plan_versions: Vec<PlanVersion>,
  pub week_notes: Vec<String>,
  pub week_grid: Option<WeekGrid>,
}

pub async fn export_snapshot(pool: &SqlitePool) -> StoreResult<AppSnapshot> {
  let mut today_done: BTreeMap<NaiveDate, DayCompletion> = BTreeMap::new();

  let items: Vec<(String, String)> = sqlx::query_as("SELECT date, item_id FROM today_done")
    .fetch_all(pool)
    .await?;
  for (date, item_id) in items {
    if let Ok(date) = date.parse::<NaiveDate>() {
      today_done.entry(date).or_default().items.insert(item_id);
    }
  }

  let runs: Vec<String> = sqlx::query_scalar("SELECT date FROM today_run_done")
    .fetch_all(pool)
    .await?;
  for date in runs {
    if let Ok(date) = date.parse::<NaiveDate>() {
      today_done.entry(date).or_default().run = true;
    }
  }

  Ok(AppSnapshot {
    authed: is_authed(pool).await?,
    profile: load_profile(pool).await?,
    settings: load_settings(pool).await?,
    logs: load_logs(pool).await?,
    today: load_today_template(pool).await?,
    today_done,
    plan_versions: list_versions(pool).await?,
    week_notes: load_week_notes(pool).await?,
    week_grid: load_week_grid(pool).await?,
  })
}

async fn clear_all(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>) -> StoreResult<()> {
  for table in ["log_entries", "today_done", "today_run_done", "plan_versions", "week_notes"] {
    sqlx::query(&format!("DELETE FROM {}", table))
      .execute(&mut **tx)
      .await?;
  }
  sqlx::query(
    "UPDATE app_state SET authed = 0, profile_json = NULL, settings_json = NULL,
     today_json = NULL, week_grid_json = NULL, updated_at = ? WHERE id = 1",
  )
  .bind(Utc::now().to_rfc3339())
  .execute(&mut **tx)
  .await?;
  Ok(())
}

/// Replace all stored state with `snapshot`
pub async fn import_snapshot(pool: &SqlitePool, snapshot: &AppSnapshot) -> StoreResult<()> {
  let mut tx = pool.begin().await?;
  clear_all(&mut tx).await?;

  sqlx::query(
    "UPDATE app_state SET authed = ?, profile_json = ?, settings_json = ?,
     today_json = ?, week_grid_json = ?, updated_at = ? WHERE id = 1",
  )
  .bind(snapshot.authed as i64)
  .bind(serde_json::to_string(&snapshot.profile)?)
  .bind(serde_json::to_string(&snapshot.settings)?)
  .bind(snapshot.today.as_ref().map(serde_json::to_string).transpose()?)
  .bind(snapshot.week_grid.as_ref().map(serde_json::to_string).transpose()?)
  .bind(Utc::now().to_rfc3339())
  .execute(&mut *tx)
  .await?;

  for entry in &snapshot.logs {
    insert_log(&mut *tx, entry).await?;
  }

  for (date, done) in &snapshot.today_done {
    for item_id in &done.items {
      mark_item_done(&mut *tx, *date, item_id).await?;
    }
    if done.run {
      mark_run_done(&mut *tx, *date).await?;
    }
  }

  // Oldest first so the newest ends up with the highest seq
  for version in snapshot.plan_versions.iter().take(MAX_PLAN_VERSIONS).rev() {
    sqlx::query("INSERT INTO plan_versions (id, name, content, created_at) VALUES (?, ?, ?, ?)")
      .bind(&version.id)
      .bind(&version.name)
      .bind(&version.content)
      .bind(version.created_at)
      .execute(&mut *tx)
      .await?;
  }

  for (idx, note) in snapshot.week_notes.iter().take(PLAN_WEEKS).enumerate() {
    sqlx::query("INSERT INTO week_notes (week, note) VALUES (?, ?)")
      .bind(idx as i64 + 1)
      .bind(note)
      .execute(&mut *tx)
      .await?;
  }

  tx.commit().await?;
  Ok(())
}

/// Forget everything, as on a fresh install
pub async fn reset(pool: &SqlitePool) -> StoreResult<()> {
  let mut tx = pool.begin().await?;
  clear_all(&mut tx).await?;
  tx.commit().await?;
  Ok(())
}
