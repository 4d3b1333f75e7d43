//! Structured plan documents returned by the coach model

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTable {
  #[serde(default)]
  pub columns: Vec<String>,
  #[serde(default, deserialize_with = "text_rows")]
  pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSection {
  #[serde(default)]
  pub heading: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bullets: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub table: Option<PlanTable>,
}

/// `{title, summary, sections, next_actions}` as requested in the system prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub summary: String,
  #[serde(default)]
  pub sections: Vec<PlanSection>,
  #[serde(default)]
  pub next_actions: Vec<String>,
}

/// Table cells come back as strings, numbers or null
fn text_rows<'de, D>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error>
where
  D: Deserializer<'de>,
{
  let rows: Vec<Vec<Value>> = Vec::deserialize(deserializer)?;
  Ok(
    rows
      .into_iter()
      .map(|row| {
        row
          .into_iter()
          .map(|cell| match cell {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
          })
          .collect()
      })
      .collect(),
  )
}

impl PlanDocument {
  /// Parse model output, tolerating code fences and surrounding prose
  pub fn parse(text: &str) -> Option<Self> {
    let json = extract_json(text)?;
    match serde_json::from_str::<Value>(json).ok()? {
      Value::Object(map) => serde_json::from_value(Value::Object(map)).ok(),
      _ => None,
    }
  }

  /// Wrapper used when the model did not return the requested JSON
  pub fn fallback(title: String, heading: &str, raw: &str, next_actions: &[&str]) -> Self {
    Self {
      title,
      summary: "Structured JSON was expected.".to_string(),
      sections: vec![PlanSection {
        heading: heading.to_string(),
        bullets: Some(vec![raw.to_string()]),
        table: None,
      }],
      next_actions: next_actions.iter().map(|s| s.to_string()).collect(),
    }
  }

  /// Plain-text rendering, one line per bullet or table row
  pub fn to_text(&self) -> String {
    let mut lines = vec![self.title.clone(), self.summary.clone()];
    for section in &self.sections {
      lines.push(section.heading.clone());
      if let Some(bullets) = &section.bullets {
        lines.extend(bullets.iter().map(|b| format!("- {}", b)));
      }
      if let Some(table) = &section.table {
        lines.push(table.columns.join(" | "));
        lines.extend(table.rows.iter().map(|r| r.join(" ")));
      }
    }
    lines.extend(self.next_actions.iter().map(|a| format!("- {}", a)));
    lines.retain(|l| !l.trim().is_empty());
    lines.join("\n")
  }
}

/// Locate a JSON object in model output (handles markdown code blocks)
pub fn extract_json(text: &str) -> Option<&str> {
  let trimmed = text.trim();
  if trimmed.starts_with('{') {
    return Some(trimmed);
  }

  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Some(text[start..start + end].trim());
    }
  }

  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..]
      .find('\n')
      .map(|i| start + i + 1)
      .unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Some(text[content_start..content_start + end].trim());
    }
  }

  match (text.find('{'), text.rfind('}')) {
    (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_direct_document() {
    let doc = PlanDocument::parse(
      r#"{"title":"Hybrid Plan","summary":"4 days","sections":[{"heading":"Today","table":{"columns":["Exercise","Sets","Reps"],"rows":[["Bench Press",5,5]]}}],"next_actions":["Start Monday"]}"#,
    )
    .unwrap();

    assert_eq!(doc.title, "Hybrid Plan");
    let table = doc.sections[0].table.as_ref().unwrap();
    assert_eq!(table.rows[0], vec!["Bench Press", "5", "5"]);
    assert_eq!(doc.next_actions, vec!["Start Monday"]);
  }

  #[test]
  fn test_parse_code_block() {
    let input = r#"Here's your plan:

```json
{"title": "Plan", "summary": "Easy week", "sections": [], "next_actions": []}
```

Have fun!"#;
    assert_eq!(PlanDocument::parse(input).unwrap().summary, "Easy week");
  }

  #[test]
  fn test_parse_rejects_prose_and_arrays() {
    assert!(PlanDocument::parse("Run 5 miles easy today.").is_none());
    assert!(PlanDocument::parse("[1, 2, 3]").is_none());
  }

  #[test]
  fn test_missing_keys_default() {
    let doc = PlanDocument::parse(r#"{"title":"Only a title"}"#).unwrap();
    assert!(doc.sections.is_empty());
    assert!(doc.next_actions.is_empty());
  }

  #[test]
  fn test_fallback_wraps_raw_text() {
    let doc = PlanDocument::fallback(
      "Coach Plan".into(),
      "Content",
      "just words",
      &["Review and request adjustments."],
    );
    assert_eq!(doc.sections[0].bullets.as_deref(), Some(&["just words".to_string()][..]));
    assert_eq!(doc.summary, "Structured JSON was expected.");
    assert!(doc.to_text().contains("- just words"));
  }
}
