//! Training log commands

use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::debug;

use super::{local_today, CommandResult};
use crate::db::AppState;
use crate::logbook::{self, Exercise, WeeklySummary, RECENT_LIMIT};
use crate::models::log::RUN_TYPES;
use crate::models::{LogEntry, NewLogEntry};
use crate::store;

#[derive(Debug, Serialize)]
pub struct AddedLog {
  pub entry: LogEntry,
  /// Set when a PM double is not shorter than that day's other runs
  pub warning: Option<String>,
}

/// Append a form entry. Numeric fields were already coerced on input.
#[tauri::command]
pub async fn add_log_entry(state: State<'_, Arc<AppState>>, entry: NewLogEntry) -> CommandResult<AddedLog> {
  let entry = entry.into_entry(local_today());

  let warning = match &entry {
    LogEntry::Run(run) => {
      let profile = store::load_profile(&state.db).await?;
      let logs = store::load_logs(&state.db).await?;
      logbook::double_run_warning(&profile, &logs, run)
    }
    _ => None,
  };

  store::append_log(&state.db, &entry).await?;
  debug!(kind = entry.kind().as_str(), id = entry.id(), "Logged entry");

  Ok(AddedLog { entry, warning })
}

/// Full history, newest first
#[tauri::command]
pub async fn list_logs(state: State<'_, Arc<AppState>>) -> CommandResult<Vec<LogEntry>> {
  let logs = store::load_logs(&state.db).await?;
  Ok(logbook::recent(&logs, logs.len()))
}

#[tauri::command]
pub async fn recent_logs(state: State<'_, Arc<AppState>>) -> CommandResult<Vec<LogEntry>> {
  let logs = store::load_logs(&state.db).await?;
  Ok(logbook::recent(&logs, RECENT_LIMIT))
}

#[tauri::command]
pub async fn weekly_summary(state: State<'_, Arc<AppState>>) -> CommandResult<WeeklySummary> {
  let logs = store::load_logs(&state.db).await?;
  Ok(logbook::summarize_weekly(&logs, local_today()))
}

/// Suggested next load in the athlete's weight unit
#[tauri::command]
pub async fn suggest_weight(state: State<'_, Arc<AppState>>, exercise: String) -> CommandResult<f64> {
  let profile = store::load_profile(&state.db).await?;
  let logs = store::load_logs(&state.db).await?;
  Ok(logbook::suggest_weight(&logs, exercise.trim(), profile.units.weight))
}

#[tauri::command]
pub async fn strength_catalog(state: State<'_, Arc<AppState>>) -> CommandResult<Vec<Exercise>> {
  let profile = store::load_profile(&state.db).await?;
  Ok(logbook::strength_catalog(&profile))
}

#[tauri::command]
pub fn run_types() -> Vec<&'static str> {
  RUN_TYPES.to_vec()
}
