#[cfg(test)]
#[macro_use]
mod test_utils;

mod coach;
mod commands;
mod config;
mod db;
mod logbook;
mod models;
mod parser;
mod plan;
mod store;
mod today;
mod units;

use config::CoachConfig;
use db::AppState;
use std::sync::Arc;
use tauri::Manager;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
    .with(tracing_subscriber::fmt::layer())
    .init();

  tauri::Builder::default()
    .plugin(tauri_plugin_opener::init())
    .setup(|app| {
      let config = CoachConfig::from_env()?;
      if config.api_key.is_none() {
        info!("OPENAI_API_KEY not set, coach requests will be refused");
      }

      let app_handle = app.handle().clone();
      tauri::async_runtime::block_on(async move {
        match db::initialize_db(&app_handle).await {
          Ok(pool) => {
            app_handle.manage(Arc::new(AppState::new(pool, config)));
            info!("Database ready");
          }
          Err(e) => {
            error!(error = %e, "Failed to initialize database");
          }
        }
      });
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      commands::get_app_state,
      commands::unlock_beta,
      commands::update_settings,
      commands::export_state,
      commands::import_state,
      commands::reset_state,
      // Profile and onboarding
      commands::profile::get_profile,
      commands::profile::save_profile,
      commands::profile::complete_onboarding,
      // Training log
      commands::logs::add_log_entry,
      commands::logs::list_logs,
      commands::logs::recent_logs,
      commands::logs::weekly_summary,
      commands::logs::suggest_weight,
      commands::logs::strength_catalog,
      commands::logs::run_types,
      // Base plan, notes and week grid
      commands::plan::get_training_plan,
      commands::plan::get_planned_mileage,
      commands::plan::export_plan_markdown,
      commands::plan::get_race_paces,
      commands::plan::get_week_notes,
      commands::plan::save_week_note,
      commands::plan::get_week_grid,
      commands::plan::edit_week_grid,
      commands::plan::apply_week_grid_to_today,
      // Today checklist
      commands::today::get_today,
      commands::today::complete_today_item,
      commands::today::complete_today_run,
      commands::today::mark_all_today_done,
      commands::today::undo_last_log,
      commands::today::begin_today_edit,
      commands::today::edit_today_draft,
      commands::today::save_today_edit,
      commands::today::cancel_today_edit,
      // Coach
      commands::coach::get_questionnaire,
      commands::coach::submit_answers,
      commands::coach::ask_coach_stream,
      commands::coach::cancel_coach_stream,
      commands::coach::list_plan_versions,
      commands::coach::save_plan_version,
      commands::coach::delete_plan_version,
      commands::coach::load_plan_version,
      commands::coach::apply_plan_version_to_today,
      commands::coach::apply_coach_document_to_today,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
