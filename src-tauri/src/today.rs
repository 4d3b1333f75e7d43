//! Today checklist engine
//!
//! A single day's template (strength items plus at most one run) and the
//! completion state for a date. Completion is keyed by item id, so
//! reordering or removing template items never disturbs it.
//!
//! The template moves through three origins:
//! - Defaulted: lazily seeded the first time the dashboard is viewed
//! - Edited: saved from a draft
//! - Applied: replaced wholesale by a plan (coach or week grid)

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logbook::suggest_weight;
use crate::models::log::{new_id, RunLog, RunSession, StrengthLog};
use crate::models::{LogEntry, LogKind, Profile};

/// Seconds during which the last completion can be undone
pub const UNDO_WINDOW_SECS: i64 = 6;

/// Assumed easy pace when a run is completed from the checklist
const CHECKLIST_MIN_PER_UNIT: f64 = 9.0;
const CHECKLIST_PACE: &str = "9:00";

const DEFAULT_RUN_TYPE: &str = "Easy";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TodayError {
  #[error("No item {0} in today's template")]
  ItemNotFound(String),

  #[error("No run planned for today")]
  NoRunPlanned,

  #[error("Undo window has passed")]
  UndoExpired,

  #[error("Nothing to undo")]
  NothingToUndo,

  #[error("No edit in progress")]
  NoDraft,
}

impl Serialize for TodayError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Template
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayItem {
  pub id: String,
  pub name: String,
  pub sets: u32,
  pub reps: u32,
  /// Suggested working weight in the athlete's weight unit
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggested: Option<f64>,
}

impl TodayItem {
  pub fn new(name: &str, sets: u32, reps: u32) -> Self {
    Self {
      id: new_id(),
      name: name.trim().to_string(),
      sets: sets.max(1),
      reps: reps.max(1),
      suggested: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayRun {
  #[serde(rename = "type")]
  pub run_type: String,
  /// In the athlete's display unit
  pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateOrigin {
  #[default]
  Defaulted,
  Edited,
  Applied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayTemplate {
  pub items: Vec<TodayItem>,
  pub run: Option<TodayRun>,
  #[serde(default)]
  pub origin: TemplateOrigin,
}

impl TodayTemplate {
  /// Starter day: three barbell lifts and an easy run
  pub fn default_for(profile: &Profile, logs: &[LogEntry]) -> Self {
    let unit = profile.units.weight;
    let items = [("Bench Press", 5, 5), ("Barbell Row", 4, 8), ("Back Squat", 5, 3)]
      .into_iter()
      .map(|(name, sets, reps)| TodayItem {
        suggested: Some(suggest_weight(logs, name, unit)),
        ..TodayItem::new(name, sets, reps)
      })
      .collect();

    Self {
      items,
      run: Some(TodayRun {
        run_type: DEFAULT_RUN_TYPE.to_string(),
        distance: if profile.double_runs { 4.0 } else { 5.0 },
      }),
      origin: TemplateOrigin::Defaulted,
    }
  }

  /// Template replacing today's plan wholesale. Items always get fresh ids.
  pub fn applied(items: Vec<TodayItem>, run: Option<TodayRun>) -> Self {
    let items = items
      .into_iter()
      .map(|item| TodayItem {
        id: new_id(),
        ..item
      })
      .collect();
    Self {
      items,
      run,
      origin: TemplateOrigin::Applied,
    }
  }

  pub fn item(&self, id: &str) -> Option<&TodayItem> {
    self.items.iter().find(|i| i.id == id)
  }
}

/// ---------------------------------------------------------------------------
/// Completion
/// ---------------------------------------------------------------------------

/// Completion flags for one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayCompletion {
  pub date: NaiveDate,
  /// Ids of completed template items
  pub items: BTreeSet<String>,
  pub run: bool,
}

impl TodayCompletion {
  pub fn empty(date: NaiveDate) -> Self {
    Self {
      date,
      items: BTreeSet::new(),
      run: false,
    }
  }

  pub fn is_item_done(&self, id: &str) -> bool {
    self.items.contains(id)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
  #[serde(flatten)]
  pub item: TodayItem,
  pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistRun {
  #[serde(flatten)]
  pub run: TodayRun,
  pub done: bool,
}

/// Template joined with a date's completion, as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayChecklist {
  pub date: NaiveDate,
  pub origin: TemplateOrigin,
  pub items: Vec<ChecklistItem>,
  pub run: Option<ChecklistRun>,
  pub progress_pct: u8,
}

impl TodayChecklist {
  /// Merge log history into `completion` and build the view.
  ///
  /// An item counts as done when its flag is set or a completed strength
  /// log with the same exercise name exists on the date. The run counts
  /// as done when flagged or when any run is logged that day. Flags are
  /// only ever added here, never cleared.
  pub fn reconcile(
    template: &TodayTemplate,
    completion: &mut TodayCompletion,
    logs: &[LogEntry],
  ) -> Self {
    let date = completion.date;

    for item in &template.items {
      let logged = logs.iter().any(|l| match l {
        LogEntry::Strength(s) => s.date == date && s.completed && s.exercise == item.name,
        _ => false,
      });
      if logged {
        completion.items.insert(item.id.clone());
      }
    }

    if template.run.is_some() {
      let logged = logs
        .iter()
        .any(|l| matches!(l, LogEntry::Run(r) if r.date == date));
      completion.run |= logged;
    }

    Self::view(template, completion)
  }

  pub fn view(template: &TodayTemplate, completion: &TodayCompletion) -> Self {
    let items: Vec<ChecklistItem> = template
      .items
      .iter()
      .map(|item| ChecklistItem {
        done: completion.is_item_done(&item.id),
        item: item.clone(),
      })
      .collect();

    let run = template.run.clone().map(|run| ChecklistRun {
      run,
      done: completion.run,
    });

    let total = items.len() + usize::from(run.is_some());
    let done = items.iter().filter(|i| i.done).count()
      + usize::from(run.as_ref().is_some_and(|r| r.done));
    let progress_pct = ((done as f64 / total.max(1) as f64) * 100.0).round() as u8;

    Self {
      date: completion.date,
      origin: template.origin,
      items,
      run,
      progress_pct,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Completing Items
/// ---------------------------------------------------------------------------

/// Complete one strength item.
///
/// Returns the log entry to append, or `None` when the item was already
/// done. The flag is set on `completion`; the caller persists both
/// together.
pub fn complete_item(
  template: &TodayTemplate,
  completion: &mut TodayCompletion,
  item_id: &str,
) -> Result<Option<LogEntry>, TodayError> {
  let item = template
    .item(item_id)
    .ok_or_else(|| TodayError::ItemNotFound(item_id.to_string()))?;

  if !completion.items.insert(item.id.clone()) {
    return Ok(None);
  }

  Ok(Some(LogEntry::Strength(StrengthLog {
    id: new_id(),
    date: completion.date,
    exercise: item.name.clone(),
    sets: item.sets,
    reps: item.reps,
    weight: item.suggested.unwrap_or(0.0),
    completed: true,
  })))
}

pub fn complete_run(
  template: &TodayTemplate,
  completion: &mut TodayCompletion,
  profile: &Profile,
) -> Result<Option<LogEntry>, TodayError> {
  let run = template.run.as_ref().ok_or(TodayError::NoRunPlanned)?;
  if completion.run {
    return Ok(None);
  }
  completion.run = true;

  Ok(Some(LogEntry::Run(RunLog {
    id: new_id(),
    date: completion.date,
    run_type: run.run_type.clone(),
    session: if profile.double_runs {
      RunSession::Am
    } else {
      RunSession::Solo
    },
    distance: run.distance,
    duration: (run.distance * CHECKLIST_MIN_PER_UNIT).round(),
    pace: CHECKLIST_PACE.to_string(),
  })))
}

/// Complete everything not yet done, in template order, run last
pub fn mark_all_done(
  template: &TodayTemplate,
  completion: &mut TodayCompletion,
  profile: &Profile,
) -> Vec<(Option<String>, LogEntry)> {
  let mut entries = Vec::new();
  for item in &template.items {
    if let Ok(Some(entry)) = complete_item(template, completion, &item.id) {
      entries.push((Some(item.id.clone()), entry));
    }
  }
  if let Ok(Some(entry)) = complete_run(template, completion, profile) {
    entries.push((None, entry));
  }
  entries
}

/// ---------------------------------------------------------------------------
/// Undo
/// ---------------------------------------------------------------------------

/// The most recent checklist completion, undoable for a few seconds.
///
/// Undo removes the appended log entry only. The completion flag stays
/// set, so the item still shows as done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUndo {
  pub log_id: String,
  pub kind: LogKind,
  pub created_at: DateTime<Utc>,
}

impl PendingUndo {
  pub fn new(entry: &LogEntry, now: DateTime<Utc>) -> Self {
    Self {
      log_id: entry.id().to_string(),
      kind: entry.kind(),
      created_at: now,
    }
  }

  pub fn is_live(&self, now: DateTime<Utc>) -> bool {
    now - self.created_at <= Duration::seconds(UNDO_WINDOW_SECS)
  }
}

/// Take the pending undo if it is still inside its window.
/// The slot is cleared either way.
pub fn take_undo(
  slot: &mut Option<PendingUndo>,
  now: DateTime<Utc>,
) -> Result<PendingUndo, TodayError> {
  let pending = slot.take().ok_or(TodayError::NothingToUndo)?;
  if pending.is_live(now) {
    Ok(pending)
  } else {
    Err(TodayError::UndoExpired)
  }
}

/// ---------------------------------------------------------------------------
/// Draft Editing
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DraftEdit {
  AddItem { name: String, sets: u32, reps: u32 },
  RemoveItem { id: String },
  MoveUp { id: String },
  SetSets { id: String, sets: u32 },
  SetReps { id: String, reps: u32 },
  AddRun,
  RemoveRun,
  SetRunType { run_type: String },
  SetRunDistance { distance: f64 },
}

/// Staged edits to today's template. Nothing changes until `commit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayDraft {
  pub items: Vec<TodayItem>,
  pub run: Option<TodayRun>,
}

impl TodayDraft {
  pub fn begin(template: &TodayTemplate) -> Self {
    Self {
      items: template.items.clone(),
      run: template.run.clone(),
    }
  }

  fn position(&self, id: &str) -> Result<usize, TodayError> {
    self
      .items
      .iter()
      .position(|i| i.id == id)
      .ok_or_else(|| TodayError::ItemNotFound(id.to_string()))
  }

  pub fn apply(&mut self, edit: DraftEdit) -> Result<(), TodayError> {
    match edit {
      DraftEdit::AddItem { name, sets, reps } => {
        if !name.trim().is_empty() {
          self.items.push(TodayItem::new(&name, sets, reps));
        }
      }
      DraftEdit::RemoveItem { id } => {
        let idx = self.position(&id)?;
        self.items.remove(idx);
      }
      DraftEdit::MoveUp { id } => {
        let idx = self.position(&id)?;
        if idx > 0 {
          self.items.swap(idx - 1, idx);
        }
      }
      DraftEdit::SetSets { id, sets } => {
        let idx = self.position(&id)?;
        self.items[idx].sets = sets.max(1);
      }
      DraftEdit::SetReps { id, reps } => {
        let idx = self.position(&id)?;
        self.items[idx].reps = reps.max(1);
      }
      DraftEdit::AddRun => {
        if self.run.is_none() {
          self.run = Some(TodayRun {
            run_type: DEFAULT_RUN_TYPE.to_string(),
            distance: 5.0,
          });
        }
      }
      DraftEdit::RemoveRun => self.run = None,
      DraftEdit::SetRunType { run_type } => {
        let run = self.run.as_mut().ok_or(TodayError::NoRunPlanned)?;
        run.run_type = run_type;
      }
      DraftEdit::SetRunDistance { distance } => {
        let run = self.run.as_mut().ok_or(TodayError::NoRunPlanned)?;
        run.distance = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
      }
    }
    Ok(())
  }

  pub fn commit(self) -> TodayTemplate {
    TodayTemplate {
      items: self.items,
      run: self.run,
      origin: TemplateOrigin::Edited,
    }
  }
}
