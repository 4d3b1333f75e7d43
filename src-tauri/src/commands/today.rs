//! Today checklist commands
//!
//! Every command reads the template, the date's completion and the log,
//! changes what it must, and saves before returning the fresh checklist.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::{debug, info};

use super::{local_today, CommandResult};
use crate::db::AppState;
use crate::models::{LogKind, Profile};
use crate::parser::ParsedDay;
use crate::store;
use crate::today::{
  self, DraftEdit, PendingUndo, TodayChecklist, TodayDraft, TodayError, TodayTemplate,
};

/// ---------------------------------------------------------------------------
/// Shared Helpers
/// ---------------------------------------------------------------------------

/// Stored template, seeding the default on first use
pub(crate) async fn load_or_seed_template(state: &AppState, profile: &Profile) -> CommandResult<TodayTemplate> {
  if let Some(template) = store::load_today_template(&state.db).await? {
    return Ok(template);
  }
  let logs = store::load_logs(&state.db).await?;
  let template = TodayTemplate::default_for(profile, &logs);
  store::save_today_template(&state.db, &template).await?;
  debug!("Seeded default Today template");
  Ok(template)
}

/// Reconcile a date's completion against the log and persist any new flags
pub(crate) async fn checklist_for(state: &AppState, date: NaiveDate) -> CommandResult<TodayChecklist> {
  let profile = store::load_profile(&state.db).await?;
  let template = load_or_seed_template(state, &profile).await?;
  let logs = store::load_logs(&state.db).await?;
  let mut completion = store::load_completion(&state.db, date).await?;

  let before = completion.clone();
  let checklist = TodayChecklist::reconcile(&template, &mut completion, &logs);
  if completion != before {
    store::save_completion(&state.db, &completion).await?;
  }
  Ok(checklist)
}

/// Replace today's template with a parsed plan and clear today's completion
pub(crate) async fn apply_parsed_day(state: &AppState, parsed: ParsedDay) -> CommandResult<TodayChecklist> {
  let date = local_today();
  let template = TodayTemplate::applied(parsed.items, parsed.run);
  store::save_today_template(&state.db, &template).await?;
  store::clear_completion(&state.db, date).await?;
  {
    let mut session = state.session();
    session.draft = None;
    session.pending_undo = None;
  }
  info!(items = template.items.len(), run = template.run.is_some(), "Applied plan to Today");
  checklist_for(state, date).await
}

/// ---------------------------------------------------------------------------
/// Checklist Commands
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_today(state: State<'_, Arc<AppState>>) -> CommandResult<TodayChecklist> {
  checklist_for(&state, local_today()).await
}

#[tauri::command]
pub async fn complete_today_item(state: State<'_, Arc<AppState>>, item_id: String) -> CommandResult<TodayChecklist> {
  let date = local_today();
  let profile = store::load_profile(&state.db).await?;
  let template = load_or_seed_template(&state, &profile).await?;
  let logs = store::load_logs(&state.db).await?;
  let mut completion = store::load_completion(&state.db, date).await?;

  // An item the log already satisfies is done; tapping it logs nothing
  TodayChecklist::reconcile(&template, &mut completion, &logs);
  if let Some(entry) = today::complete_item(&template, &mut completion, &item_id)? {
    store::record_completion(&state.db, date, Some(&item_id), &entry).await?;
    state.session().pending_undo = Some(PendingUndo::new(&entry, Utc::now()));
  }
  checklist_for(&state, date).await
}

#[tauri::command]
pub async fn complete_today_run(state: State<'_, Arc<AppState>>) -> CommandResult<TodayChecklist> {
  let date = local_today();
  let profile = store::load_profile(&state.db).await?;
  let template = load_or_seed_template(&state, &profile).await?;
  let logs = store::load_logs(&state.db).await?;
  let mut completion = store::load_completion(&state.db, date).await?;

  TodayChecklist::reconcile(&template, &mut completion, &logs);
  if let Some(entry) = today::complete_run(&template, &mut completion, &profile)? {
    store::record_completion(&state.db, date, None, &entry).await?;
    state.session().pending_undo = Some(PendingUndo::new(&entry, Utc::now()));
  }
  checklist_for(&state, date).await
}

#[tauri::command]
pub async fn mark_all_today_done(state: State<'_, Arc<AppState>>) -> CommandResult<TodayChecklist> {
  let date = local_today();
  let profile = store::load_profile(&state.db).await?;
  let template = load_or_seed_template(&state, &profile).await?;
  let logs = store::load_logs(&state.db).await?;
  let mut completion = store::load_completion(&state.db, date).await?;

  // Items already satisfied by the log are not logged twice
  TodayChecklist::reconcile(&template, &mut completion, &logs);
  let entries = today::mark_all_done(&template, &mut completion, &profile);
  for (item_id, entry) in &entries {
    store::record_completion(&state.db, date, item_id.as_deref(), entry).await?;
  }
  if let Some((_, last)) = entries.last() {
    state.session().pending_undo = Some(PendingUndo::new(last, Utc::now()));
  }
  store::save_completion(&state.db, &completion).await?;

  debug!(logged = entries.len(), "Marked all done");
  checklist_for(&state, date).await
}

#[derive(Debug, Serialize)]
pub struct UndoResult {
  pub log_id: String,
  pub kind: LogKind,
  pub removed: bool,
}

/// Remove the last checklist log if still inside the undo window.
/// The item stays checked.
#[tauri::command]
pub async fn undo_last_log(state: State<'_, Arc<AppState>>) -> CommandResult<UndoResult> {
  let pending = {
    let mut session = state.session();
    today::take_undo(&mut session.pending_undo, Utc::now())?
  };
  let removed = store::delete_log(&state.db, &pending.log_id).await?;
  info!(log_id = %pending.log_id, removed, "Undid checklist log");
  Ok(UndoResult {
    log_id: pending.log_id,
    kind: pending.kind,
    removed,
  })
}

/// ---------------------------------------------------------------------------
/// Draft Editing Commands
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn begin_today_edit(state: State<'_, Arc<AppState>>) -> CommandResult<TodayDraft> {
  let profile = store::load_profile(&state.db).await?;
  let template = load_or_seed_template(&state, &profile).await?;
  let draft = TodayDraft::begin(&template);
  state.session().draft = Some(draft.clone());
  Ok(draft)
}

#[tauri::command]
pub async fn edit_today_draft(state: State<'_, Arc<AppState>>, edit: DraftEdit) -> CommandResult<TodayDraft> {
  let mut session = state.session();
  let draft = session.draft.as_mut().ok_or(TodayError::NoDraft)?;
  draft.apply(edit)?;
  Ok(draft.clone())
}

#[tauri::command]
pub async fn save_today_edit(state: State<'_, Arc<AppState>>) -> CommandResult<TodayChecklist> {
  let draft = state.session().draft.take().ok_or(TodayError::NoDraft)?;
  let template = draft.commit();
  store::save_today_template(&state.db, &template).await?;
  debug!(items = template.items.len(), "Saved Today edit");
  checklist_for(&state, local_today()).await
}

#[tauri::command]
pub async fn cancel_today_edit(state: State<'_, Arc<AppState>>) -> CommandResult<()> {
  state.session().draft = None;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::logs::add_log_entry;
  use crate::commands::CommandError;
  use crate::models::{LogEntry, NewLogEntry};
  use crate::test_utils::*;
  use crate::today::TemplateOrigin;
  use serde_json::json;
  use serial_test::serial;
  use tauri::Manager;

  async fn setup() -> (sqlx::SqlitePool, tauri::App<tauri::test::MockRuntime>) {
    let pool = setup_test_db().await;
    store::save_profile(&pool, &mock_profile()).await.unwrap();
    let app = tauri::test::mock_app();
    app.manage(mock_state(pool.clone()));
    (pool, app)
  }

  #[tokio::test]
  #[serial]
  async fn test_get_today_seeds_default_once() {
    let (pool, app) = setup().await;

    let first = get_today(app.state()).await.unwrap();
    assert_eq!(first.origin, TemplateOrigin::Defaulted);
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.progress_pct, 0);

    let second = get_today(app.state()).await.unwrap();
    assert_eq!(second.items[0].item.id, first.items[0].item.id);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_complete_then_undo_keeps_flag() {
    let (pool, app) = setup().await;
    let today = get_today(app.state()).await.unwrap();
    let bench = today.items[0].item.id.clone();

    let after = complete_today_item(app.state(), bench.clone()).await.unwrap();
    assert!(after.items[0].done);
    assert_eq!(store::load_logs(&pool).await.unwrap().len(), 1);

    // Completing a done item is a no-op
    complete_today_item(app.state(), bench).await.unwrap();
    assert_eq!(store::load_logs(&pool).await.unwrap().len(), 1);

    let undo = undo_last_log(app.state()).await.unwrap();
    assert!(undo.removed);
    assert_eq!(undo.kind, LogKind::Strength);
    assert!(store::load_logs(&pool).await.unwrap().is_empty());

    let view = get_today(app.state()).await.unwrap();
    assert!(view.items[0].done);

    let err = undo_last_log(app.state()).await.unwrap_err();
    assert!(matches!(err, CommandError::Today(TodayError::NothingToUndo)));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_mark_all_done_skips_logged_items() {
    let (pool, app) = setup().await;
    get_today(app.state()).await.unwrap();
    store::append_log(&pool, &mock_strength("Barbell Row", local_today(), 4, 95.0))
      .await
      .unwrap();

    let view = mark_all_today_done(app.state()).await.unwrap();
    assert_eq!(view.progress_pct, 100);

    let logs = store::load_logs(&pool).await.unwrap();
    // Row was already logged; bench, squat and the run are new
    assert_eq!(logs.len(), 4);
    assert!(matches!(logs.last(), Some(LogEntry::Run(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_tap_after_manual_log_does_not_duplicate() {
    let (pool, app) = setup().await;
    let today = get_today(app.state()).await.unwrap();
    let bench = today.items[0].item.id.clone();

    let strength: NewLogEntry = serde_json::from_value(json!({
      "type": "strength",
      "exercise": "Bench Press",
      "sets": 5,
      "reps": 5,
      "weight": 185
    }))
    .unwrap();
    add_log_entry(app.state(), strength).await.unwrap();
    let run: NewLogEntry = serde_json::from_value(json!({
      "type": "run",
      "run_type": "Easy",
      "distance": 3,
      "duration": 27
    }))
    .unwrap();
    add_log_entry(app.state(), run).await.unwrap();

    let view = complete_today_item(app.state(), bench).await.unwrap();
    assert!(view.items[0].done);
    let view = complete_today_run(app.state()).await.unwrap();
    assert!(view.run.unwrap().done);

    assert_eq!(store::load_logs(&pool).await.unwrap().len(), 2);
    let err = undo_last_log(app.state()).await.unwrap_err();
    assert!(matches!(err, CommandError::Today(TodayError::NothingToUndo)));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_draft_edit_save_and_cancel() {
    let (pool, app) = setup().await;
    let original = get_today(app.state()).await.unwrap();

    let draft = begin_today_edit(app.state()).await.unwrap();
    let squat = draft.items[2].id.clone();
    edit_today_draft(app.state(), DraftEdit::MoveUp { id: squat.clone() })
      .await
      .unwrap();
    edit_today_draft(app.state(), DraftEdit::SetReps { id: squat, reps: 0 })
      .await
      .unwrap();
    cancel_today_edit(app.state()).await.unwrap();
    assert_eq!(get_today(app.state()).await.unwrap(), original);

    let err = edit_today_draft(app.state(), DraftEdit::RemoveRun).await.unwrap_err();
    assert!(matches!(err, CommandError::Today(TodayError::NoDraft)));

    begin_today_edit(app.state()).await.unwrap();
    edit_today_draft(app.state(), DraftEdit::RemoveRun).await.unwrap();
    let saved = save_today_edit(app.state()).await.unwrap();
    assert_eq!(saved.origin, TemplateOrigin::Edited);
    assert!(saved.run.is_none());
    assert_eq!(saved.items.len(), 3);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_complete_run_logs_checklist_pace() {
    let (pool, app) = setup().await;
    get_today(app.state()).await.unwrap();

    let view = complete_today_run(app.state()).await.unwrap();
    assert!(view.run.unwrap().done);

    let logs = store::load_logs(&pool).await.unwrap();
    match &logs[0] {
      LogEntry::Run(run) => {
        assert_eq!(run.pace, "9:00");
        assert_approx_eq!(run.duration, 45.0);
      }
      other => panic!("unexpected entry {:?}", other),
    }

    teardown_test_db(pool).await;
  }
}
