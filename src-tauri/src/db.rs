use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tauri::Manager;
use tracing::info;

use crate::coach::stream::CoachStreamSlot;
use crate::coach::CoachClient;
use crate::config::CoachConfig;
use crate::today::{PendingUndo, TodayDraft};

pub type DbPool = SqlitePool;

/// In-memory state that does not survive a restart
#[derive(Debug, Default)]
pub struct SessionState {
  /// Open Today edit, discarded on cancel
  pub draft: Option<TodayDraft>,
  /// The last log written by a checklist tap
  pub pending_undo: Option<PendingUndo>,
}

/// Application state shared by every command
pub struct AppState {
  pub db: DbPool,
  pub config: CoachConfig,
  pub coach: CoachClient,
  pub coach_stream: CoachStreamSlot,
  session: Mutex<SessionState>,
}

impl AppState {
  pub fn new(db: DbPool, config: CoachConfig) -> Self {
    Self {
      db,
      coach: CoachClient::new(config.clone()),
      config,
      coach_stream: CoachStreamSlot::default(),
      session: Mutex::new(SessionState::default()),
    }
  }

  pub fn session(&self) -> MutexGuard<'_, SessionState> {
    // Session data is plain values, so a poisoned lock is still usable
    self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

/// Get the path to the database file
/// Stored in: ~/Library/Application Support/com.force3.coach/force3.db
fn get_db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<PathBuf, Box<dyn std::error::Error>> {
  let data_dir = app
    .path()
    .app_data_dir()
    .map_err(|e| format!("Failed to get app data dir: {}", e))?;

  fs::create_dir_all(&data_dir)?;

  Ok(data_dir.join("force3.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<DbPool, Box<dyn std::error::Error>> {
  let db_path = get_db_path(app)?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  info!(path = %db_path.display(), "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized");

  Ok(pool)
}
