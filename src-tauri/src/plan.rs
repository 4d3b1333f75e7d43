//! Periodized 16-Week Plan Generator
//!
//! Deterministic marathon-style block built from a hand-authored mileage
//! curve. Every week is derived from the profile alone:
//! - block label by week index (Base, Build, Peak, Taper, Race)
//! - a key Tuesday session (intervals, tempo, or marathon pace)
//! - long run at a third of the week, capped at 22 mi
//! - remaining volume split across easy and recovery runs
//!
//! All arithmetic happens in miles. Distances are converted to the
//! athlete's display unit only when day lines are rendered.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Profile;
use crate::units::{format_distance, DistanceUnit};

pub const PLAN_WEEKS: usize = 16;

/// Weekly mileage, week 1 through week 16
pub const WEEKLY_MILES: [u32; PLAN_WEEKS] =
    [35, 38, 41, 44, 48, 52, 55, 58, 62, 65, 67, 70, 60, 50, 38, 26];

pub const LONG_RUN_CAP_MILES: u32 = 22;

const RACE_WEEK: u32 = 16;
const MONDAY_EASY_MILES: u32 = 4;
const MONDAY_STRENGTH: &str = "Mon: Strength (Upper/Push-Pull)";
const WEDNESDAY_STRENGTH: &str = "Wed: Strength (Lower/Legs)";

// ---------------------------------------------------------------------------
/// Block: periodization phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Base,
    Build,
    Peak,
    Taper,
    Race,
}

impl Block {
    pub fn for_week(week: u32) -> Self {
        match week {
            0..=4 => Self::Base,
            5..=8 => Self::Build,
            9..=12 => Self::Peak,
            13..=15 => Self::Taper,
            _ => Self::Race,
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::Base => "Base & consistency",
            Self::Build => "Build aerobic & tempo",
            Self::Peak => "Peak volume + MP work",
            Self::Taper => "Taper & sharpen",
            Self::Race => "Race week (taper)",
        }
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Base => "Base",
            Self::Build => "Build",
            Self::Peak => "Peak",
            Self::Taper => "Taper",
            Self::Race => "Race",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
/// Key Session: the Tuesday workout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySession {
    AerobicIntervals,
    Tempo,
    MarathonPace,
    Shakeout,
}

impl KeySession {
    pub fn for_week(week: u32) -> Self {
        if week == RACE_WEEK {
            Self::Shakeout
        } else if (10..=15).contains(&week) {
            Self::MarathonPace
        } else if week >= 6 {
            Self::Tempo
        } else {
            Self::AerobicIntervals
        }
    }

    pub fn miles(&self) -> u32 {
        match self {
            Self::AerobicIntervals => 8,
            Self::Tempo => 10,
            Self::MarathonPace => 12,
            Self::Shakeout => 3,
        }
    }
}

// ---------------------------------------------------------------------------
/// Distance Allocation: where each mile of the week goes
// ---------------------------------------------------------------------------

/// Per-day mileage for one week. Always sums to the week's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceAllocation {
    pub long_run: u32,
    pub workout: u32,
    pub easy1: u32,
    pub easy2: u32,
    pub easy3: u32,
    pub recovery: u32,
}

impl DistanceAllocation {
    /// Easy buckets never shrink below this while absorbing rounding
    const RECONCILE_FLOOR: u32 = 3;

    pub fn total(&self) -> u32 {
        self.long_run + self.workout + self.easy1 + self.easy2 + self.easy3 + self.recovery
    }

    /// Split a week's volume.
    ///
    /// Rounded proportional buckets (with their own minimums) rarely add up
    /// to the target. A surplus goes to the first easy run; a shortfall is
    /// taken from the easy and recovery buckets in order, none dropping
    /// below three miles, so the total always equals `weekly_miles`.
    pub fn compute(week: u32, weekly_miles: u32) -> Self {
        let long_run = if week == RACE_WEEK {
            0
        } else {
            round_miles(weekly_miles as f64 * 0.33).min(LONG_RUN_CAP_MILES)
        };
        let remaining = weekly_miles.saturating_sub(long_run) as f64;
        let workout = KeySession::for_week(week).miles();

        let mut allocation = Self {
            long_run,
            workout,
            easy1: round_miles(remaining * 0.30).max(5),
            easy2: round_miles(remaining * 0.22).max(4),
            easy3: round_miles(remaining * 0.20).max(4),
            recovery: round_miles(remaining * 0.12).max(3),
        };
        allocation.reconcile(weekly_miles);
        allocation
    }

    fn reconcile(&mut self, weekly_miles: u32) {
        let planned = self.total();
        if planned <= weekly_miles {
            self.easy1 += weekly_miles - planned;
            return;
        }

        let mut excess = planned - weekly_miles;
        for bucket in [
            &mut self.easy1,
            &mut self.easy2,
            &mut self.easy3,
            &mut self.recovery,
        ] {
            let give = bucket.saturating_sub(Self::RECONCILE_FLOOR).min(excess);
            *bucket -= give;
            excess -= give;
            if excess == 0 {
                return;
            }
        }
        // Only reachable if the curve leaves less than the floors allow
        self.easy1 = self.easy1.saturating_sub(excess);
    }
}

fn round_miles(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

// ---------------------------------------------------------------------------
/// Week Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    /// 1-based week index
    pub week: u32,
    pub weekly_miles: u32,
    pub block: Block,
    pub summary: String,
    pub key_session: KeySession,
    pub allocation: DistanceAllocation,
    /// Mon through Sun
    pub days: Vec<String>,
}

/// Generate the full 16-week schedule for a profile
pub fn generate_plan(profile: &Profile) -> Vec<WeekPlan> {
    WEEKLY_MILES
        .iter()
        .enumerate()
        .map(|(idx, &miles)| build_week(profile, idx as u32 + 1, miles))
        .collect()
}

fn build_week(profile: &Profile, week: u32, weekly_miles: u32) -> WeekPlan {
    let unit = profile.distance_unit();
    let dist = |miles: u32| format_distance(miles as f64, unit);
    let block = Block::for_week(week);
    let key_session = KeySession::for_week(week);
    let allocation = DistanceAllocation::compute(week, weekly_miles);

    let mut days = Vec::with_capacity(7);

    days.push(with_strength(
        profile,
        &format!("{} + Easy {}", MONDAY_STRENGTH, dist(MONDAY_EASY_MILES)),
    ));

    days.push(match key_session {
        KeySession::MarathonPace => format!(
            "Tue: Marathon-pace workout {} (e.g., 2x6 @ MP w/ 1 easy)",
            dist(allocation.workout)
        ),
        KeySession::Tempo => format!(
            "Tue: Tempo {} (e.g., 2x3 @ T w/ 1 easy)",
            dist(allocation.workout)
        ),
        KeySession::AerobicIntervals => format!(
            "Tue: Aerobic intervals {} (e.g., 6x1 @ HM effort)",
            dist(allocation.workout)
        ),
        KeySession::Shakeout => format!(
            "Tue: Shakeout {} easy + 4 strides",
            dist(allocation.workout)
        ),
    });

    let wednesday = match bike_minutes(week) {
        Some(minutes) => format!("{} + Bike {}min", WEDNESDAY_STRENGTH, minutes),
        None => WEDNESDAY_STRENGTH.to_string(),
    };
    days.push(with_strength(profile, &wednesday));

    days.push(format!("Thu: Easy {} conversational", dist(allocation.easy1)));

    days.push(if profile.double_runs {
        let (am, pm) = split_double(allocation.easy2);
        format!(
            "Fri: AM {} easy • PM {} easy (doubles; AM longer)",
            dist(am),
            dist(pm)
        )
    } else {
        format!("Fri: Easy {} + drills/strides", dist(allocation.easy2))
    });

    days.push(if week == RACE_WEEK {
        "Sat: OFF / travel / gear prep".to_string()
    } else if key_session == KeySession::MarathonPace && week >= 11 {
        format!("Sat: Long run {} w/ last 4-6 @ MP", dist(allocation.long_run))
    } else {
        format!("Sat: Long run {} steady", dist(allocation.long_run))
    });

    days.push(format!("Sun: Recovery {} + mobility", dist(allocation.recovery)));

    WeekPlan {
        week,
        weekly_miles,
        block,
        summary: block.summary().to_string(),
        key_session,
        allocation,
        days,
    }
}

fn with_strength(profile: &Profile, label: &str) -> String {
    let lifts = if profile.no_deadlift {
        "Bench/Row/Squat/Hip Thrust + accessories"
    } else {
        "Bench/Row/Squat/Deadlift + accessories"
    };
    format!("{} • Strength: {}", label, lifts)
}

/// Midweek cross-training: none in week 1, 45 min through week 5, then 60
fn bike_minutes(week: u32) -> Option<u32> {
    match week {
        0..=1 => None,
        2..=5 => Some(45),
        _ => Some(60),
    }
}

/// Split an easy day into a longer AM run (at least 4) and a PM run (at least 3)
fn split_double(miles: u32) -> (u32, u32) {
    let am = round_miles(miles as f64 * 0.65).max(4);
    let pm = miles.saturating_sub(am).max(3);
    (am, pm)
}

// ---------------------------------------------------------------------------
/// Calendar Helpers
// ---------------------------------------------------------------------------

/// Zero-based plan week for a calendar date (week of year, wrapped to 16)
pub fn week_index_for(date: NaiveDate) -> usize {
    (date.ordinal0() / 7) as usize % PLAN_WEEKS
}

/// Planned weekly volume for the week containing `date`, in display units
pub fn planned_weekly_mileage(profile: &Profile, date: NaiveDate) -> f64 {
    let miles = WEEKLY_MILES[week_index_for(date)] as f64;
    match profile.distance_unit() {
        DistanceUnit::Mi => miles,
        DistanceUnit::Km => crate::units::convert_distance(miles, DistanceUnit::Mi, DistanceUnit::Km),
    }
}

// ---------------------------------------------------------------------------
/// Markdown Export
// ---------------------------------------------------------------------------

pub fn week_to_markdown(week: &WeekPlan) -> String {
    format!(
        "### Week {} - {}\n\n- {}",
        week.week,
        week.summary,
        week.days.join("\n- ")
    )
}

pub fn plan_to_markdown(plan: &[WeekPlan]) -> String {
    plan.iter()
        .map(|w| {
            format!(
                "## Week {} - {}\n\n- {}\n",
                w.week,
                w.summary,
                w.days.join("\n- ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
/// Race Paces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RacePaces {
    pub marathon: String,
    pub half_marathon: String,
    pub ten_k: String,
}

/// Parse `h:mm:ss`, `mm:ss` or plain seconds
pub fn parse_duration_seconds(value: &str) -> Option<f64> {
    let parts: Vec<f64> = value
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        [m, s] => Some(m * 60.0 + s),
        [s] => Some(*s),
        _ => None,
    }
}

pub fn format_pace(seconds_per_unit: f64, unit: DistanceUnit) -> Option<String> {
    if !seconds_per_unit.is_finite() || seconds_per_unit <= 0.0 {
        return None;
    }
    let total = seconds_per_unit.round() as u64;
    Some(format!("{}:{:02}/{}", total / 60, total % 60, unit))
}

/// Training paces from a marathon goal time.
///
/// Half-marathon pace runs about 5% quicker than marathon pace, 10K
/// about 10% quicker.
pub fn race_paces(goal_time: &str, unit: DistanceUnit) -> Option<RacePaces> {
    let total = parse_duration_seconds(goal_time).filter(|s| *s > 0.0)?;
    let marathon_distance = match unit {
        DistanceUnit::Mi => 26.2,
        DistanceUnit::Km => 42.195,
    };
    let per_unit = total / marathon_distance;

    Some(RacePaces {
        marathon: format_pace(per_unit, unit)?,
        half_marathon: format_pace(per_unit * 0.95, unit)?,
        ten_k: format_pace(per_unit * 0.90, unit)?,
    })
}

// ---------------------------------------------------------------------------
/// Week Grid: hand-edited baseline week
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridItemKind {
    Run,
    Strength,
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    pub kind: GridItemKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDay {
    pub name: String,
    pub items: Vec<GridItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekGrid {
    pub days: Vec<GridDay>,
}

impl WeekGrid {
    pub fn default_for(profile: &Profile) -> Self {
        let day = |name: &str, kind: GridItemKind, label: &str| GridDay {
            name: name.to_string(),
            items: vec![GridItem {
                kind,
                label: label.to_string(),
            }],
        };
        let friday = if profile.double_runs {
            "AM 5 / PM 3"
        } else {
            "Easy 7"
        };

        Self {
            days: vec![
                day("Mon", GridItemKind::Strength, "Upper (Bench/Row), easy 4"),
                day("Tue", GridItemKind::Run, "Tempo 6"),
                day("Wed", GridItemKind::Strength, "Lower (Squat), bike 45m"),
                day("Thu", GridItemKind::Run, "Easy 6"),
                day("Fri", GridItemKind::Run, friday),
                day("Sat", GridItemKind::Run, "Long 14"),
                day("Sun", GridItemKind::Run, "Recovery 4 + mobility"),
            ],
        }
    }

    pub fn day(&self, name: &str) -> Option<&GridDay> {
        self.days.iter().find(|d| d.name == name)
    }

    /// Blank labels are ignored. Returns whether an item was added.
    pub fn add_item(&mut self, day_idx: usize, kind: GridItemKind, text: &str) -> bool {
        let label = text.trim();
        match self.days.get_mut(day_idx) {
            Some(day) if !label.is_empty() => {
                day.items.push(GridItem {
                    kind,
                    label: label.to_string(),
                });
                true
            }
            _ => false,
        }
    }

    pub fn remove_item(&mut self, day_idx: usize, item_idx: usize) -> bool {
        match self.days.get_mut(day_idx) {
            Some(day) if item_idx < day.items.len() => {
                day.items.remove(item_idx);
                true
            }
            _ => false,
        }
    }

    /// Swap an item with its neighbour; moves past either end are ignored
    pub fn move_item(&mut self, day_idx: usize, item_idx: usize, up: bool) -> bool {
        let Some(day) = self.days.get_mut(day_idx) else {
            return false;
        };
        let target = if up {
            item_idx.checked_sub(1)
        } else {
            Some(item_idx + 1)
        };
        match target {
            Some(j) if j < day.items.len() && item_idx < day.items.len() => {
                day.items.swap(item_idx, j);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::DistanceUnit;

    fn profile(no_deadlift: bool, double_runs: bool, unit: DistanceUnit) -> Profile {
        let mut p = Profile::default();
        p.name = "Tester".into();
        p.weekly_availability = 4;
        p.no_deadlift = no_deadlift;
        p.double_runs = double_runs;
        p.units.distance = unit;
        p
    }

    #[test]
    fn test_plan_has_sixteen_weeks_on_curve() {
        let plan = generate_plan(&Profile::default());
        assert_eq!(plan.len(), PLAN_WEEKS);
        let miles: Vec<u32> = plan.iter().map(|w| w.weekly_miles).collect();
        assert_eq!(miles, WEEKLY_MILES.to_vec());
        for (idx, week) in plan.iter().enumerate() {
            assert_eq!(week.week, idx as u32 + 1);
            assert_eq!(week.days.len(), 7);
        }
    }

    #[test]
    fn test_allocation_sums_to_weekly_miles() {
        for p in [
            profile(false, false, DistanceUnit::Mi),
            profile(true, true, DistanceUnit::Km),
        ] {
            for week in generate_plan(&p) {
                assert_eq!(
                    week.allocation.total(),
                    week.weekly_miles,
                    "week {} allocation {:?}",
                    week.week,
                    week.allocation
                );
            }
        }
    }

    #[test]
    fn test_allocation_respects_floor_and_cap() {
        for (idx, &miles) in WEEKLY_MILES.iter().enumerate() {
            let a = DistanceAllocation::compute(idx as u32 + 1, miles);
            assert!(a.long_run <= LONG_RUN_CAP_MILES);
            assert!(a.easy1 >= 3 && a.easy2 >= 3 && a.easy3 >= 3 && a.recovery >= 3);
        }
    }

    #[test]
    fn test_block_boundaries() {
        assert_eq!(Block::for_week(1), Block::Base);
        assert_eq!(Block::for_week(4), Block::Base);
        assert_eq!(Block::for_week(5), Block::Build);
        assert_eq!(Block::for_week(9), Block::Peak);
        assert_eq!(Block::for_week(12), Block::Peak);
        assert_eq!(Block::for_week(13), Block::Taper);
        assert_eq!(Block::for_week(15), Block::Taper);
        assert_eq!(Block::for_week(16), Block::Race);
    }

    #[test]
    fn test_key_sessions_by_week() {
        assert_eq!(KeySession::for_week(5), KeySession::AerobicIntervals);
        assert_eq!(KeySession::for_week(6), KeySession::Tempo);
        assert_eq!(KeySession::for_week(10), KeySession::MarathonPace);
        assert_eq!(KeySession::for_week(15), KeySession::MarathonPace);
        assert_eq!(KeySession::for_week(16), KeySession::Shakeout);
    }

    #[test]
    fn test_no_deadlift_week_one() {
        let plan = generate_plan(&profile(true, false, DistanceUnit::Mi));
        for day in &plan[0].days {
            assert!(!day.contains("Deadlift"), "unexpected deadlift in {}", day);
            assert!(!day.to_lowercase().contains("deadlift"));
        }

        let with_lifts = generate_plan(&profile(false, false, DistanceUnit::Mi));
        assert!(with_lifts[0].days[0].contains("Deadlift"));
    }

    #[test]
    fn test_week_one_day_lines() {
        let week = &generate_plan(&profile(false, false, DistanceUnit::Mi))[0];
        assert!(week.days[0].starts_with("Mon: Strength (Upper/Push-Pull) + Easy 4 mi"));
        assert!(week.days[1].starts_with("Tue: Aerobic intervals 8 mi"));
        assert_eq!(week.days[2], "Wed: Strength (Lower/Legs) • Strength: Bench/Row/Squat/Deadlift + accessories");
        assert_eq!(week.days[5], "Sat: Long run 12 mi steady");
    }

    #[test]
    fn test_bike_and_long_run_labels() {
        let plan = generate_plan(&profile(false, false, DistanceUnit::Mi));
        assert!(plan[1].days[2].contains("Bike 45min"));
        assert!(plan[5].days[2].contains("Bike 60min"));
        assert!(plan[10].days[5].contains("@ MP"));
        assert!(plan[9].days[5].ends_with("steady"));
        assert_eq!(plan[15].days[5], "Sat: OFF / travel / gear prep");
        assert!(plan[15].days[1].starts_with("Tue: Shakeout 3 mi"));
    }

    #[test]
    fn test_doubles_split_friday() {
        let plan = generate_plan(&profile(false, true, DistanceUnit::Mi));
        let friday = &plan[11].days[4];
        assert!(friday.starts_with("Fri: AM"), "{}", friday);
        assert_eq!(split_double(4), (4, 3));
        assert_eq!(split_double(10), (7, 3));

        let singles = generate_plan(&profile(false, false, DistanceUnit::Mi));
        assert!(singles[11].days[4].starts_with("Fri: Easy"));
    }

    #[test]
    fn test_km_rendering_only_changes_text() {
        let miles = generate_plan(&profile(false, false, DistanceUnit::Mi));
        let km = generate_plan(&profile(false, false, DistanceUnit::Km));
        assert_eq!(miles[0].allocation, km[0].allocation);
        assert_eq!(km[0].days[5], "Sat: Long run 19 km steady");
    }

    #[test]
    fn test_week_index_wraps() {
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(week_index_for(jan1), 0);
        let feb = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(); // day 35
        assert_eq!(week_index_for(feb), 5);
        let summer = NaiveDate::from_ymd_opt(2024, 4, 22).unwrap(); // day 112
        assert_eq!(week_index_for(summer), 0);
        assert_eq!(planned_weekly_mileage(&Profile::default(), feb), 52.0);
    }

    #[test]
    fn test_markdown_export() {
        let plan = generate_plan(&Profile::default());
        let md = plan_to_markdown(&plan);
        assert!(md.starts_with("## Week 1 - Base & consistency"));
        assert!(md.contains("## Week 16 - Race week (taper)"));
        assert!(week_to_markdown(&plan[2]).starts_with("### Week 3 - "));
    }

    #[test]
    fn test_race_paces() {
        let paces = race_paces("3:00:00", DistanceUnit::Mi).unwrap();
        assert_eq!(paces.marathon, "6:52/mi");
        assert_eq!(paces.half_marathon, "6:32/mi");
        assert_eq!(paces.ten_k, "6:11/mi");
        assert!(race_paces("soon", DistanceUnit::Km).is_none());
        assert_eq!(parse_duration_seconds("20:00"), Some(1200.0));
    }

    #[test]
    fn test_week_grid_edits() {
        let mut grid = WeekGrid::default_for(&Profile::default());
        assert!(!grid.add_item(0, GridItemKind::Strength, "   "));
        assert!(grid.add_item(0, GridItemKind::Strength, "Curl 3x12"));
        assert_eq!(grid.days[0].items.len(), 2);
        assert!(grid.move_item(0, 1, true));
        assert_eq!(grid.days[0].items[0].label, "Curl 3x12");
        assert!(!grid.move_item(0, 0, true));
        assert!(grid.remove_item(0, 0));
        assert!(!grid.remove_item(9, 0));
        assert_eq!(grid.day("Fri").unwrap().items[0].label, "Easy 7");
    }
}
