//! Environment configuration
//!
//! Read once at startup after `.env` is loaded. Only the API key is
//! needed for coach calls; everything else has a default.

use std::env;
use thiserror::Error;
use url::Url;

pub const DEFAULT_COACH_NAME: &str = "Coach";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/";
pub const DEFAULT_BETA_CODE: &str = "FORCE3BETA";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("{var} is not a valid URL: {reason}")]
  InvalidUrl { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct CoachConfig {
  /// `None` disables coach calls; they fail with a friendly message
  pub api_key: Option<String>,
  pub coach_name: String,
  pub model: String,
  pub api_base: Url,
  pub beta_code: String,
}

fn non_empty(var: &str) -> Option<String> {
  env::var(var)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

/// Parse a base URL, forcing a trailing slash so `join` appends paths
pub fn parse_base_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
  let with_slash = if raw.ends_with('/') {
    raw.to_string()
  } else {
    format!("{}/", raw)
  };
  Url::parse(&with_slash).map_err(|e| ConfigError::InvalidUrl {
    var,
    reason: e.to_string(),
  })
}

impl CoachConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let api_base = match non_empty("COACH_API_BASE") {
      Some(raw) => parse_base_url("COACH_API_BASE", &raw)?,
      None => parse_base_url("COACH_API_BASE", DEFAULT_API_BASE)?,
    };

    Ok(Self {
      api_key: non_empty("OPENAI_API_KEY"),
      coach_name: non_empty("COACH_NAME").unwrap_or_else(|| DEFAULT_COACH_NAME.to_string()),
      model: non_empty("COACH_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
      api_base,
      beta_code: non_empty("FORCE3_BETA_CODE").unwrap_or_else(|| DEFAULT_BETA_CODE.to_string()),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const VARS: [&str; 5] = [
    "OPENAI_API_KEY",
    "COACH_NAME",
    "COACH_MODEL",
    "COACH_API_BASE",
    "FORCE3_BETA_CODE",
  ];

  #[test]
  #[serial]
  fn test_defaults_without_env() {
    temp_env::with_vars_unset(VARS, || {
      let config = CoachConfig::from_env().unwrap();
      assert_eq!(config.api_key, None);
      assert_eq!(config.coach_name, "Coach");
      assert_eq!(config.model, "gpt-4o-mini");
      assert_eq!(config.api_base.as_str(), "https://api.openai.com/");
      assert_eq!(config.beta_code, "FORCE3BETA");
    });
  }

  #[test]
  #[serial]
  fn test_reads_env_overrides() {
    temp_env::with_vars(
      [
        ("OPENAI_API_KEY", Some("sk-test")),
        ("COACH_NAME", Some("  Ricky ")),
        ("COACH_MODEL", Some("gpt-4o")),
        ("COACH_API_BASE", Some("http://127.0.0.1:9999/proxy")),
        ("FORCE3_BETA_CODE", Some("")),
      ],
      || {
        let config = CoachConfig::from_env().unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.coach_name, "Ricky");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_base.as_str(), "http://127.0.0.1:9999/proxy/");
        assert_eq!(config.beta_code, "FORCE3BETA");
      },
    );
  }

  #[test]
  #[serial]
  fn test_invalid_base_url() {
    temp_env::with_var("COACH_API_BASE", Some("not a url"), || {
      let err = CoachConfig::from_env().unwrap_err();
      assert!(err.to_string().starts_with("COACH_API_BASE is not a valid URL"));
    });
  }
}
