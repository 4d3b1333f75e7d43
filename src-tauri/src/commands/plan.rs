//! Tauri commands for the 16-week base plan, week notes and the week grid

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tauri::State;

use super::today::apply_parsed_day;
use super::{local_today, CommandError, CommandResult};
use crate::db::AppState;
use crate::parser::parse_week_grid;
use crate::plan::{
    generate_plan, plan_to_markdown, planned_weekly_mileage, race_paces, week_index_for,
    week_to_markdown, GridItemKind, RacePaces, WeekGrid, WeekPlan, PLAN_WEEKS,
};
use crate::store;
use crate::today::TodayChecklist;
use crate::units::DistanceUnit;

/// Get all 16 weeks for the current profile
#[tauri::command]
pub async fn get_training_plan(state: State<'_, Arc<AppState>>) -> CommandResult<Vec<WeekPlan>> {
    let profile = store::load_profile(&state.db).await?;
    Ok(generate_plan(&profile))
}

#[derive(Debug, Serialize)]
pub struct PlannedWeek {
    /// 1-based plan week for today
    pub week: usize,
    pub distance: f64,
    pub unit: DistanceUnit,
}

/// Planned volume for the current calendar week
#[tauri::command]
pub async fn get_planned_mileage(state: State<'_, Arc<AppState>>) -> CommandResult<PlannedWeek> {
    let profile = store::load_profile(&state.db).await?;
    let today = local_today();
    Ok(PlannedWeek {
        week: week_index_for(today) + 1,
        distance: planned_weekly_mileage(&profile, today),
        unit: profile.distance_unit(),
    })
}

/// Markdown for one week, or the whole plan when `week` is absent
#[tauri::command]
pub async fn export_plan_markdown(
    state: State<'_, Arc<AppState>>,
    week: Option<usize>,
) -> CommandResult<String> {
    let profile = store::load_profile(&state.db).await?;
    let plan = generate_plan(&profile);
    match week {
        None => Ok(plan_to_markdown(&plan)),
        Some(w) => plan
            .get(w.wrapping_sub(1))
            .map(week_to_markdown)
            .ok_or_else(|| store::StoreError::InvalidWeek(w).into()),
    }
}

/// Marathon, half and 10K paces for a goal time such as "3:15:00"
#[tauri::command]
pub async fn get_race_paces(
    state: State<'_, Arc<AppState>>,
    goal_time: String,
) -> CommandResult<RacePaces> {
    let profile = store::load_profile(&state.db).await?;
    race_paces(&goal_time, profile.distance_unit())
        .ok_or_else(|| CommandError::Invalid(format!("Could not read goal time \"{}\"", goal_time.trim())))
}

/// ---------------------------------------------------------------------------
/// Week Notes
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_week_notes(state: State<'_, Arc<AppState>>) -> CommandResult<Vec<String>> {
    Ok(store::load_week_notes(&state.db).await?)
}

/// `week` is 1-based
#[tauri::command]
pub async fn save_week_note(
    state: State<'_, Arc<AppState>>,
    week: usize,
    note: String,
) -> CommandResult<Vec<String>> {
    store::save_week_note(&state.db, week, &note).await?;
    Ok(store::load_week_notes(&state.db).await?)
}

/// ---------------------------------------------------------------------------
/// Week Grid
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GridEdit {
    Add { day: usize, kind: GridItemKind, label: String },
    Remove { day: usize, item: usize },
    Move { day: usize, item: usize, up: bool },
    Reset,
}

async fn load_grid(state: &AppState) -> CommandResult<WeekGrid> {
    match store::load_week_grid(&state.db).await? {
        Some(grid) => Ok(grid),
        None => {
            let profile = store::load_profile(&state.db).await?;
            Ok(WeekGrid::default_for(&profile))
        }
    }
}

#[tauri::command]
pub async fn get_week_grid(state: State<'_, Arc<AppState>>) -> CommandResult<WeekGrid> {
    load_grid(&state).await
}

/// Apply one edit and save. Out-of-range edits leave the grid unchanged.
#[tauri::command]
pub async fn edit_week_grid(
    state: State<'_, Arc<AppState>>,
    edit: GridEdit,
) -> CommandResult<WeekGrid> {
    let mut grid = load_grid(&state).await?;
    let changed = match edit {
        GridEdit::Add { day, kind, label } => grid.add_item(day, kind, &label),
        GridEdit::Remove { day, item } => grid.remove_item(day, item),
        GridEdit::Move { day, item, up } => grid.move_item(day, item, up),
        GridEdit::Reset => {
            let profile = store::load_profile(&state.db).await?;
            grid = WeekGrid::default_for(&profile);
            true
        }
    };
    if changed {
        store::save_week_grid(&state.db, &grid).await?;
    }
    Ok(grid)
}

/// Replace Today with Monday's lifts and the weekend long run
#[tauri::command]
pub async fn apply_week_grid_to_today(
    state: State<'_, Arc<AppState>>,
) -> CommandResult<TodayChecklist> {
    let grid = load_grid(&state).await?;
    apply_parsed_day(&state, parse_week_grid(&grid)).await
}
