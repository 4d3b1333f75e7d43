use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Saved plan versions are capped; the oldest are evicted first
pub const MAX_PLAN_VERSIONS: usize = 50;

/// Named snapshot of coach plan text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanVersion {
  pub id: String,
  pub name: String,
  pub content: String,
  pub created_at: DateTime<Utc>,
}

impl PlanVersion {
  /// Blank names get a timestamped default
  pub fn new(name: &str, content: String, now: DateTime<Utc>) -> Self {
    let name = match name.trim() {
      "" => format!("Plan {}", now.format("%Y-%m-%d %H:%M")),
      trimmed => trimmed.to_string(),
    };
    Self {
      id: crate::models::log::new_id(),
      name,
      content,
      created_at: now,
    }
  }
}
