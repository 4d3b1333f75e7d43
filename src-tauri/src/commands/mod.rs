pub mod coach;
pub mod logs;
pub mod plan;
pub mod profile;
pub mod today;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use thiserror::Error;
use tracing::info;

use crate::coach::CoachError;
use crate::db::AppState;
use crate::models::{Profile, Settings};
use crate::store::{self, AppSnapshot, StoreError};
use crate::today::TodayError;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

/// Every command error crosses IPC as its display string
#[derive(Error, Debug)]
pub enum CommandError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Today(#[from] TodayError),

  #[error(transparent)]
  Coach(#[from] CoachError),

  #[error("{0}")]
  Invalid(String),
}

impl Serialize for CommandError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// The athlete's calendar day
pub fn local_today() -> NaiveDate {
  Local::now().date_naive()
}

/// ---------------------------------------------------------------------------
/// App State Commands
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AppStatus {
  pub authed: bool,
  pub onboarded: bool,
  pub coach_name: String,
  pub coach_available: bool,
  pub today: NaiveDate,
  pub profile: Profile,
  pub settings: Settings,
}

#[tauri::command]
pub async fn get_app_state(state: State<'_, Arc<AppState>>) -> CommandResult<AppStatus> {
  let profile = store::load_profile(&state.db).await?;
  Ok(AppStatus {
    authed: store::is_authed(&state.db).await?,
    onboarded: profile.is_onboarded(),
    coach_name: state.config.coach_name.clone(),
    coach_available: state.config.api_key.is_some(),
    today: local_today(),
    settings: store::load_settings(&state.db).await?,
    profile,
  })
}

/// Plaintext beta gate. Returns whether the code was accepted.
#[tauri::command]
pub async fn unlock_beta(state: State<'_, Arc<AppState>>, code: String) -> CommandResult<bool> {
  let accepted = code.trim() == state.config.beta_code;
  if accepted {
    store::set_authed(&state.db, true).await?;
    info!("Beta unlocked");
  }
  Ok(accepted)
}

#[tauri::command]
pub async fn update_settings(state: State<'_, Arc<AppState>>, settings: Settings) -> CommandResult<Settings> {
  store::save_settings(&state.db, &settings).await?;
  Ok(settings)
}

#[tauri::command]
pub async fn export_state(state: State<'_, Arc<AppState>>) -> CommandResult<AppSnapshot> {
  Ok(store::export_snapshot(&state.db).await?)
}

/// Replace everything with an exported snapshot
#[tauri::command]
pub async fn import_state(state: State<'_, Arc<AppState>>, snapshot: AppSnapshot) -> CommandResult<()> {
  store::import_snapshot(&state.db, &snapshot).await?;
  *state.session() = Default::default();
  info!(logs = snapshot.logs.len(), "Imported snapshot");
  Ok(())
}

#[tauri::command]
pub async fn reset_state(state: State<'_, Arc<AppState>>) -> CommandResult<()> {
  store::reset(&state.db).await?;
  *state.session() = Default::default();
  state.coach_stream.cancel();
  info!("App state reset");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::settings::{Accent, Density};
  use crate::test_utils::*;
  use serial_test::serial;
  use tauri::Manager;

  #[tokio::test]
  #[serial]
  async fn test_get_app_state_defaults() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(mock_state(pool.clone()));

    let status = get_app_state(app.state()).await.unwrap();
    assert!(!status.authed);
    assert!(!status.onboarded);
    assert_eq!(status.coach_name, "Coach");
    assert!(!status.coach_available);
    assert_eq!(status.today, local_today());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_unlock_beta() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(mock_state(pool.clone()));

    assert!(!unlock_beta(app.state(), "force3beta".into()).await.unwrap());
    assert!(!store::is_authed(&pool).await.unwrap());

    assert!(unlock_beta(app.state(), "  FORCE3BETA ".into()).await.unwrap());
    assert!(store::is_authed(&pool).await.unwrap());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_settings_export_reset() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(mock_state(pool.clone()));

    let settings = Settings {
      accent: Accent::Mint,
      density: Density::Compact,
    };
    update_settings(app.state(), settings).await.unwrap();

    let snapshot = export_state(app.state()).await.unwrap();
    assert_eq!(snapshot.settings, settings);

    reset_state(app.state()).await.unwrap();
    assert_eq!(store::load_settings(&pool).await.unwrap(), Settings::default());

    import_state(app.state(), snapshot).await.unwrap();
    assert_eq!(store::load_settings(&pool).await.unwrap(), settings);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_command_error_serializes_as_message() {
    let err = CommandError::from(TodayError::NothingToUndo);
    assert_eq!(serde_json::to_value(&err).unwrap(), "Nothing to undo");
  }
}
