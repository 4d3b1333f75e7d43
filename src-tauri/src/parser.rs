//! Today templates from coach output
//!
//! Structured plan documents are read first: a section whose heading
//! mentions "today" with an exercise/sets/reps table. Anything else goes
//! through a best-effort line scanner over free text. Neither path fails;
//! no match just means no items and no run.

use regex::Regex;
use std::sync::OnceLock;

use crate::coach::document::{PlanDocument, PlanTable};
use crate::plan::{GridItemKind, WeekGrid};
use crate::today::{TodayItem, TodayRun};
use crate::units::{convert_distance, DistanceUnit};

/// Strength items kept from free text
pub const MAX_PARSED_ITEMS: usize = 5;

const GRID_DEFAULT_SETS: u32 = 4;
const GRID_DEFAULT_REPS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDay {
  pub items: Vec<TodayItem>,
  pub run: Option<TodayRun>,
}

/// ---------------------------------------------------------------------------
/// Patterns
/// ---------------------------------------------------------------------------

fn lift_pattern() -> Option<&'static Regex> {
  static LIFT: OnceLock<Option<Regex>> = OnceLock::new();
  LIFT
    .get_or_init(|| Regex::new(r"(?i)(bench|row|squat|press|pull|deadlift|db|curl|pushdown)").ok())
    .as_ref()
}

fn sets_reps_pattern() -> Option<&'static Regex> {
  static SETS_REPS: OnceLock<Option<Regex>> = OnceLock::new();
  SETS_REPS
    .get_or_init(|| Regex::new(r"(\d+)\s*[x×]\s*(\d+)").ok())
    .as_ref()
}

fn run_with_unit_pattern() -> Option<&'static Regex> {
  static RUN: OnceLock<Option<Regex>> = OnceLock::new();
  RUN
    .get_or_init(|| {
      Regex::new(r"(?i)(\bLong\b|\bEasy\b|\bTempo\b|\bIntervals?\b|\bRecovery\b).*?(\d+(?:\.\d+)?)\s*(mi|km)").ok()
    })
    .as_ref()
}

fn run_pattern() -> Option<&'static Regex> {
  static RUN: OnceLock<Option<Regex>> = OnceLock::new();
  RUN
    .get_or_init(|| Regex::new(r"(?i)(Long|Easy|Tempo|Intervals?|Recovery).*?(\d+(?:\.\d+)?)").ok())
    .as_ref()
}

fn grid_sets_pattern() -> Option<&'static Regex> {
  static STRIP: OnceLock<Option<Regex>> = OnceLock::new();
  STRIP
    .get_or_init(|| Regex::new(r"(?:-\s*|\s+)\d+\s*[x×]\s*\d+").ok())
    .as_ref()
}

fn capitalize(word: &str) -> String {
  let lower = word.to_lowercase();
  let mut chars = lower.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

fn sets_reps(text: &str) -> Option<(u32, u32)> {
  let caps = sets_reps_pattern()?.captures(text)?;
  Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// ---------------------------------------------------------------------------
/// Free Text
/// ---------------------------------------------------------------------------

/// Best-effort scan of free-form plan text.
///
/// A line naming a lift keyword and an `NxM` pattern becomes a strength
/// item named after the keyword. The first `<run type> ... <n> mi|km`
/// anywhere in the text becomes the run, converted to `unit`.
pub fn parse_plan_text(text: &str, unit: DistanceUnit) -> ParsedDay {
  let items = text
    .lines()
    .filter_map(|line| {
      let keyword = lift_pattern()?.captures(line)?;
      let (sets, reps) = sets_reps(line)?;
      Some(TodayItem::new(&capitalize(&keyword[1]), sets, reps))
    })
    .take(MAX_PARSED_ITEMS)
    .collect();

  let run = run_with_unit_pattern()
    .and_then(|re| re.captures(text))
    .and_then(|caps| {
      let distance: f64 = caps[2].parse().ok()?;
      let from: DistanceUnit = caps[3].parse().ok()?;
      Some(TodayRun {
        run_type: capitalize(&caps[1]),
        distance: convert_distance(distance, from, unit),
      })
    });

  ParsedDay { items, run }
}

/// ---------------------------------------------------------------------------
/// Week Grid
/// ---------------------------------------------------------------------------

/// Build today from the week grid: Monday's strength items plus the
/// weekend long run (Saturday preferred, else Sunday, else whatever is
/// first on either day).
pub fn parse_week_grid(grid: &WeekGrid) -> ParsedDay {
  let items = grid
    .day("Mon")
    .map(|mon| {
      mon
        .items
        .iter()
        .filter(|it| it.kind == GridItemKind::Strength)
        .map(|it| {
          let (sets, reps) = sets_reps(&it.label).unwrap_or((GRID_DEFAULT_SETS, GRID_DEFAULT_REPS));
          let name = match grid_sets_pattern() {
            Some(re) => re.replace(&it.label, "").trim().to_string(),
            None => it.label.trim().to_string(),
          };
          TodayItem::new(&name, sets, reps)
        })
        .collect()
    })
    .unwrap_or_default();

  let weekend: Vec<&str> = ["Sat", "Sun"]
    .iter()
    .filter_map(|d| grid.day(d))
    .flat_map(|d| d.items.iter().map(|i| i.label.as_str()))
    .collect();

  let long_label = weekend
    .iter()
    .find(|label| label.to_lowercase().contains("long"))
    .or_else(|| weekend.first())
    .copied()
    .unwrap_or("");

  let run = run_pattern()
    .and_then(|re| re.captures(long_label))
    .and_then(|caps| {
      Some(TodayRun {
        run_type: capitalize(&caps[1]),
        distance: caps[2].parse().ok()?,
      })
    });

  ParsedDay { items, run }
}

/// ---------------------------------------------------------------------------
/// Structured Documents
/// ---------------------------------------------------------------------------

fn column(table: &PlanTable, names: &[&str]) -> Option<usize> {
  table
    .columns
    .iter()
    .position(|c| names.iter().any(|n| c.trim().eq_ignore_ascii_case(n)))
}

fn parse_today_table(table: &PlanTable, unit: DistanceUnit) -> ParsedDay {
  let Some(name_col) = column(table, &["exercise", "name", "movement"]) else {
    return ParsedDay::default();
  };
  let sets_col = column(table, &["sets"]);
  let reps_col = column(table, &["reps"]);
  let cell = |row: &Vec<String>, col: Option<usize>| -> Option<u32> {
    row.get(col?)?.trim().parse::<f64>().ok().map(|v| v.max(1.0) as u32)
  };

  let mut parsed = ParsedDay::default();
  for row in &table.rows {
    let Some(name) = row.get(name_col).map(|n| n.trim()).filter(|n| !n.is_empty()) else {
      continue;
    };

    let line = row.join(" ");
    if parsed.run.is_none() {
      if let Some(run) = parse_plan_text(&line, unit).run {
        parsed.run = Some(run);
        continue;
      }
    }

    let (sets, reps) = match (cell(row, sets_col), cell(row, reps_col)) {
      (Some(s), Some(r)) => (s, r),
      _ => match sets_reps(&line) {
        Some(sr) => sr,
        None => continue,
      },
    };
    parsed.items.push(TodayItem::new(name, sets, reps));
  }
  parsed
}

/// Today's template from a coach plan document.
///
/// Prefers a "today" section table. Falls back to the free-text scanner
/// over the flattened document when that yields nothing.
pub fn today_from_document(doc: &PlanDocument, unit: DistanceUnit) -> ParsedDay {
  let structured = doc
    .sections
    .iter()
    .filter(|s| s.heading.to_lowercase().contains("today"))
    .filter_map(|s| s.table.as_ref())
    .map(|t| parse_today_table(t, unit))
    .find(|p| !p.items.is_empty() || p.run.is_some());

  match structured {
    Some(day) => day,
    None => parse_plan_text(&doc.to_text(), unit),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coach::document::PlanSection;
  use crate::models::Profile;
  use crate::plan::{GridDay, GridItem};

  fn names(day: &ParsedDay) -> Vec<(String, u32, u32)> {
    day.items.iter().map(|i| (i.name.clone(), i.sets, i.reps)).collect()
  }

  #[test]
  fn test_parse_free_text() {
    let text = "Warm up 10 min\nBench press 5x5 @ RPE 7\nbarbell row 4 × 8\nSquat: 3x5\nPlank 3x30s\nThen easy jog 5 mi";
    let day = parse_plan_text(text, DistanceUnit::Mi);
    assert_eq!(
      names(&day),
      vec![
        ("Bench".into(), 5, 5),
        ("Row".into(), 4, 8),
        ("Squat".into(), 3, 5),
      ]
    );
    let run = day.run.unwrap();
    assert_eq!(run.run_type, "Easy");
    assert_eq!(run.distance, 5.0);
  }

  #[test]
  fn test_run_converted_to_display_unit() {
    let day = parse_plan_text("LONG run 10 km steady", DistanceUnit::Mi);
    let run = day.run.unwrap();
    assert_eq!(run.run_type, "Long");
    assert_eq!(run.distance, 6.0);

    let intervals = parse_plan_text("Intervals: 6x800m then 3 mi total", DistanceUnit::Km);
    assert_eq!(intervals.run.unwrap().distance, 5.0);
  }

  #[test]
  fn test_item_limit_and_nothing_found() {
    let text = (0..8).map(|i| format!("Curl {}x10", i + 1)).collect::<Vec<_>>().join("\n");
    assert_eq!(parse_plan_text(&text, DistanceUnit::Mi).items.len(), MAX_PARSED_ITEMS);

    let empty = parse_plan_text("Rest day. Walk the dog.", DistanceUnit::Km);
    assert!(empty.items.is_empty());
    assert!(empty.run.is_none());
  }

  #[test]
  fn test_parse_week_grid() {
    let mut grid = WeekGrid::default_for(&Profile::default());
    grid.days[0].items.push(GridItem {
      kind: GridItemKind::Strength,
      label: "Incline DB Press - 3x10".into(),
    });
    grid.days[0].items.push(GridItem {
      kind: GridItemKind::Run,
      label: "Easy 4".into(),
    });

    let day = parse_week_grid(&grid);
    assert_eq!(
      names(&day),
      vec![
        ("Upper (Bench/Row), easy 4".into(), 4, 8),
        ("Incline DB Press".into(), 3, 10),
      ]
    );
    let run = day.run.unwrap();
    assert_eq!(run.run_type, "Long");
    assert_eq!(run.distance, 14.0);
  }

  #[test]
  fn test_week_grid_falls_back_to_sunday() {
    let grid = WeekGrid {
      days: vec![
        GridDay { name: "Sat".into(), items: vec![] },
        GridDay {
          name: "Sun".into(),
          items: vec![GridItem { kind: GridItemKind::Run, label: "recovery 3.5".into() }],
        },
      ],
    };
    let day = parse_week_grid(&grid);
    assert!(day.items.is_empty());
    let run = day.run.unwrap();
    assert_eq!(run.run_type, "Recovery");
    assert_eq!(run.distance, 3.5);
  }

  #[test]
  fn test_document_table_preferred() {
    let doc = PlanDocument {
      title: "Week 1".into(),
      summary: "Bench 3x3 heavy".into(),
      sections: vec![PlanSection {
        heading: "Today's Session".into(),
        bullets: None,
        table: Some(PlanTable {
          columns: vec!["Exercise".into(), "Sets".into(), "Reps".into()],
          rows: vec![
            vec!["Goblet Squat".into(), "3".into(), "10".into()],
            vec!["Push-up".into(), "3".into(), "12".into()],
            vec!["Easy run 6 km".into(), "".into(), "".into()],
          ],
        }),
      }],
      next_actions: vec![],
    };

    let day = today_from_document(&doc, DistanceUnit::Km);
    assert_eq!(
      names(&day),
      vec![("Goblet Squat".into(), 3, 10), ("Push-up".into(), 3, 12)]
    );
    assert_eq!(day.run.unwrap().distance, 6.0);
  }

  #[test]
  fn test_document_falls_back_to_text() {
    let doc = PlanDocument {
      title: "Plan".into(),
      summary: String::new(),
      sections: vec![PlanSection {
        heading: "Monday".into(),
        bullets: Some(vec!["Deadlift 5x3".into(), "Tempo 5 mi".into()]),
        table: None,
      }],
      next_actions: vec![],
    };
    let day = today_from_document(&doc, DistanceUnit::Mi);
    assert_eq!(names(&day), vec![("Deadlift".into(), 5, 3)]);
    assert_eq!(day.run.unwrap().run_type, "Tempo");
  }
}
