//! Coach commands: questionnaire, plan/chat requests, streamed plans and
//! saved plan versions

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tauri::ipc::Channel;
use tauri::State;
use tracing::{info, warn};

use super::today::apply_parsed_day;
use super::{CommandError, CommandResult};
use crate::coach::document::PlanDocument;
use crate::coach::questionnaire::{questionnaire, Questionnaire};
use crate::coach::{CoachError, PlanRequest};
use crate::db::AppState;
use crate::models::{Answers, PlanVersion, Profile};
use crate::parser::{parse_plan_text, today_from_document};
use crate::store;
use crate::today::TodayChecklist;

#[tauri::command]
pub fn get_questionnaire(state: State<'_, Arc<AppState>>) -> Questionnaire {
  questionnaire(&state.config.coach_name)
}

/// ---------------------------------------------------------------------------
/// Plan and Chat
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoachSubmission {
  /// "answers" (the default) or "chat"
  pub stage: Option<String>,
  pub answers: Option<Answers>,
  pub message: Option<String>,
  pub brief: bool,
}

/// Ask the coach for a plan from questionnaire answers, or chat.
///
/// Plans fall back to the stored profile when no answers are sent.
#[tauri::command]
pub async fn submit_answers(
  state: State<'_, Arc<AppState>>,
  submission: CoachSubmission,
) -> CommandResult<PlanDocument> {
  let stage = submission.stage.as_deref().unwrap_or("answers");
  match stage {
    "answers" => {
      let profile = match &submission.answers {
        Some(answers) => Profile::from_answers(answers),
        None => store::load_profile(&state.db).await?,
      };
      Ok(state.coach.create_plan(&profile, submission.brief).await?)
    }
    "chat" => {
      let message = submission.message.unwrap_or_default();
      Ok(state.coach.chat(&message).await?)
    }
    other => Err(CoachError::UnknownStage(other.to_string()).into()),
  }
}

/// ---------------------------------------------------------------------------
/// Streaming
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoachEvent {
  Started,
  Chunk { text: String },
  Finished { plan: String },
  Failed { message: String },
}

/// Stream a 16-week plan over `on_event`.
///
/// Returns once the request is under way. Starting another stream aborts
/// this one, so late chunks never mix into the new plan.
#[tauri::command]
pub async fn ask_coach_stream(
  state: State<'_, Arc<AppState>>,
  mut request: PlanRequest,
  on_event: Channel<CoachEvent>,
) -> CommandResult<()> {
  if !request.profile.is_onboarded() {
    request.profile = store::load_profile(&state.db).await?;
  }

  let app_state = Arc::clone(state.inner());
  let task = tokio::spawn(async move {
    let _ = on_event.send(CoachEvent::Started);
    let result = app_state
      .coach
      .stream_plan(&request, |text| {
        let _ = on_event.send(CoachEvent::Chunk {
          text: text.to_string(),
        });
      })
      .await;

    let event = match result {
      Ok(plan) => CoachEvent::Finished { plan },
      Err(e) => {
        warn!(error = %e, "Coach stream failed");
        CoachEvent::Failed {
          message: e.to_string(),
        }
      }
    };
    if let Err(e) = on_event.send(event) {
      warn!(error = %e, "Could not deliver final coach event");
    }
  });

  state.coach_stream.replace(task.abort_handle());
  Ok(())
}

/// Returns whether a stream was running
#[tauri::command]
pub fn cancel_coach_stream(state: State<'_, Arc<AppState>>) -> bool {
  state.coach_stream.cancel()
}

/// ---------------------------------------------------------------------------
/// Plan Versions
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn list_plan_versions(state: State<'_, Arc<AppState>>) -> CommandResult<Vec<PlanVersion>> {
  Ok(store::list_versions(&state.db).await?)
}

/// Save plan text as a new version; the oldest drop off past the cap
#[tauri::command]
pub async fn save_plan_version(
  state: State<'_, Arc<AppState>>,
  name: Option<String>,
  content: String,
) -> CommandResult<PlanVersion> {
  if content.trim().is_empty() {
    return Err(CommandError::Invalid("There is no plan to save yet".to_string()));
  }
  let version = PlanVersion::new(name.as_deref().unwrap_or(""), content, Utc::now());
  store::save_version(&state.db, &version).await?;
  info!(id = %version.id, name = %version.name, "Saved plan version");
  Ok(version)
}

#[tauri::command]
pub async fn delete_plan_version(state: State<'_, Arc<AppState>>, id: String) -> CommandResult<bool> {
  Ok(store::delete_version(&state.db, &id).await?)
}

#[tauri::command]
pub async fn load_plan_version(state: State<'_, Arc<AppState>>, id: String) -> CommandResult<PlanVersion> {
  store::get_version(&state.db, &id)
    .await?
    .ok_or_else(|| CommandError::Invalid(format!("No saved plan {}", id)))
}

/// Use a saved plan for Today. Structured documents are read as such,
/// anything else through the text scanner.
#[tauri::command]
pub async fn apply_plan_version_to_today(
  state: State<'_, Arc<AppState>>,
  id: Option<String>,
) -> CommandResult<TodayChecklist> {
  let version = match id {
    Some(id) => store::get_version(&state.db, &id).await?,
    None => store::list_versions(&state.db).await?.into_iter().next(),
  }
  .ok_or_else(|| CommandError::Invalid("No saved plan to apply".to_string()))?;

  let unit = store::load_profile(&state.db).await?.distance_unit();
  let parsed = match PlanDocument::parse(&version.content) {
    Some(doc) => today_from_document(&doc, unit),
    None => parse_plan_text(&version.content, unit),
  };
  apply_parsed_day(&state, parsed).await
}

/// Use a plan document straight from `submit_answers` for Today
#[tauri::command]
pub async fn apply_coach_document_to_today(
  state: State<'_, Arc<AppState>>,
  document: PlanDocument,
) -> CommandResult<TodayChecklist> {
  let unit = store::load_profile(&state.db).await?.distance_unit();
  apply_parsed_day(&state, today_from_document(&document, unit)).await
}
