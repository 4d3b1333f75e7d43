//! Profile and onboarding commands

use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::info;

use super::CommandResult;
use crate::db::AppState;
use crate::models::{Answers, Profile};
use crate::store;

#[tauri::command]
pub async fn get_profile(state: State<'_, Arc<AppState>>) -> CommandResult<Profile> {
  Ok(store::load_profile(&state.db).await?)
}

/// Save edits from the settings panel
#[tauri::command]
pub async fn save_profile(state: State<'_, Arc<AppState>>, mut profile: Profile) -> CommandResult<Profile> {
  profile.weekly_availability = profile.weekly_availability.clamp(1, 7);
  store::save_profile(&state.db, &profile).await?;
  Ok(profile)
}

#[derive(Debug, Serialize)]
pub struct OnboardingResult {
  pub profile: Profile,
  pub authed: bool,
}

/// Map questionnaire answers to a fresh profile, replacing the old one.
///
/// The beta code may be answered during onboarding. A wrong or missing
/// code never locks an already unlocked app.
#[tauri::command]
pub async fn complete_onboarding(
  state: State<'_, Arc<AppState>>,
  answers: Answers,
  beta_code: Option<String>,
) -> CommandResult<OnboardingResult> {
  let profile = Profile::from_answers(&answers);
  store::save_profile(&state.db, &profile).await?;

  let code_ok = beta_code
    .as_deref()
    .is_some_and(|c| c.trim() == state.config.beta_code);
  if code_ok {
    store::set_authed(&state.db, true).await?;
  }

  info!(units = ?profile.units.distance, "Onboarding complete");
  Ok(OnboardingResult {
    authed: store::is_authed(&state.db).await?,
    profile,
  })
}
