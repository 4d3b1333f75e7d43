//! AI coaching gateway
//!
//! Talks to an OpenAI-compatible chat-completion endpoint. Plans and chat
//! replies come back as `PlanDocument`s; the 16-week plan request streams
//! raw text chunks to a callback as they arrive.

pub mod document;
pub mod questionnaire;
pub mod stream;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::CoachConfig;
use crate::models::Profile;

use document::PlanDocument;
use stream::{SseBuffer, SseEvent};

const COMPLETIONS_PATH: &str = "v1/chat/completions";
const NO_CONTENT: &str = r#"{"title":"Plan","summary":"No content","sections":[],"next_actions":[]}"#;
const DEFAULT_CHAT_MESSAGE: &str = "Hello, coach.";

const PLAN_TEMPERATURE: f32 = 0.4;
const PLAN_MAX_TOKENS: u32 = 1200;
const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 700;
const STREAM_MAX_TOKENS: u32 = 1800;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq)]
pub enum CoachError {
  #[error("Missing OPENAI_API_KEY. Add it to .env and restart.")]
  MissingApiKey,

  #[error("{coach} can't access the API. Check your API key and project access.")]
  Unauthorized { coach: String },

  #[error("Rate limit or billing quota reached. Try again later or enable billing.")]
  RateLimited,

  #[error("Coach error: {status}{}", detail_suffix(.detail))]
  Http { status: u16, detail: Option<String> },

  #[error("Network error: {0}")]
  Network(String),

  #[error("Malformed coach response: {0}")]
  Malformed(String),

  #[error("Unknown stage.")]
  UnknownStage(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
  detail.as_deref().map(|d| format!("\n{}", d)).unwrap_or_default()
}

impl Serialize for CoachError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Chat Completion Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage>,
  temperature: f32,
  max_tokens: u32,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
  role: &'static str,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: Option<ChatContent>,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
  content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
  error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Plan Request
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConstraints {
  pub no_back_to_back_intensity: bool,
  pub cap_long_run: bool,
}

/// Extra answers collected on the dashboard before asking for a full plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanQuestions {
  pub base_mileage: Option<f64>,
  pub longest_run: Option<f64>,
  pub recent_5k: Option<String>,
  pub goal_time: Option<String>,
  pub race_date: Option<String>,
  pub injuries: Option<String>,
  pub gym_access: Option<bool>,
  pub preferred_rest: Option<String>,
  pub doubles_enabled: bool,
  pub no_deadlift: bool,
  pub units: Option<String>,
  pub goal: Option<String>,
  pub constraints: PlanConstraints,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
  #[serde(default)]
  pub profile: Profile,
  #[serde(default)]
  pub questions: PlanQuestions,
}

#[derive(Debug, Deserialize)]
struct PlanEnvelope {
  plan: String,
}

/// Streamed plans sometimes arrive wrapped as `{"plan": "..."}`
pub fn unwrap_plan_text(text: &str) -> String {
  match serde_json::from_str::<PlanEnvelope>(text.trim()) {
    Ok(envelope) => envelope.plan,
    Err(_) => text.to_string(),
  }
}

/// ---------------------------------------------------------------------------
/// Coach Client
/// ---------------------------------------------------------------------------

pub struct CoachClient {
  client: Client,
  config: CoachConfig,
}

impl CoachClient {
  pub fn new(config: CoachConfig) -> Self {
    Self {
      client: Client::new(),
      config,
    }
  }

  pub fn coach_name(&self) -> &str {
    &self.config.coach_name
  }

  pub fn system_prompt(&self) -> String {
    include_str!("../prompts/coach_system.txt").replace("{coach_name}", &self.config.coach_name)
  }

  fn endpoint(&self) -> Result<Url, CoachError> {
    self
      .config
      .api_base
      .join(COMPLETIONS_PATH)
      .map_err(|e| CoachError::Network(e.to_string()))
  }

  async fn send(&self, request: &ChatRequest<'_>) -> Result<Response, CoachError> {
    let api_key = self.config.api_key.as_deref().ok_or(CoachError::MissingApiKey)?;

    let response = self
      .client
      .post(self.endpoint()?)
      .bearer_auth(api_key)
      .json(request)
      .send()
      .await
      .map_err(|e| CoachError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "Coach request failed");
    Err(self.status_error(status, &body))
  }

  fn status_error(&self, status: StatusCode, body: &str) -> CoachError {
    match status {
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CoachError::Unauthorized {
        coach: self.config.coach_name.clone(),
      },
      StatusCode::TOO_MANY_REQUESTS => CoachError::RateLimited,
      _ => {
        let detail = serde_json::from_str::<ApiErrorResponse>(body)
          .map(|e| e.error.message)
          .ok()
          .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()));
        CoachError::Http {
          status: status.as_u16(),
          detail,
        }
      }
    }
  }

  fn messages(&self, user: String) -> Vec<ChatMessage> {
    vec![
      ChatMessage {
        role: "system",
        content: self.system_prompt(),
      },
      ChatMessage {
        role: "user",
        content: user,
      },
    ]
  }

  /// One non-streaming completion. `None` when the model sent no content.
  pub async fn complete(
    &self,
    user: String,
    temperature: f32,
    max_tokens: u32,
  ) -> Result<Option<String>, CoachError> {
    let request = ChatRequest {
      model: &self.config.model,
      messages: self.messages(user),
      temperature,
      max_tokens,
      stream: false,
    };

    let body = self
      .send(&request)
      .await?
      .text()
      .await
      .map_err(|e| CoachError::Network(e.to_string()))?;

    let parsed: ChatResponse =
      serde_json::from_str(&body).map_err(|e| CoachError::Malformed(e.to_string()))?;

    Ok(
      parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content),
    )
  }

  /// Personalized plan for the onboarded profile
  pub async fn create_plan(&self, profile: &Profile, brief: bool) -> Result<PlanDocument, CoachError> {
    let payload = json!({
      "task": "Create a personalized plan ONLY for the selected modalities. Be sure to incorporate 'other_notes' preferences.",
      "brief": brief,
      "profile": profile,
    });

    let content = self
      .complete(payload.to_string(), PLAN_TEMPERATURE, PLAN_MAX_TOKENS)
      .await?
      .unwrap_or_else(|| NO_CONTENT.to_string());

    Ok(PlanDocument::parse(&content).unwrap_or_else(|| {
      debug!("Plan response was not JSON, wrapping");
      PlanDocument::fallback(
        format!("{} Plan", self.config.coach_name),
        "Content",
        &content,
        &["Review and request adjustments."],
      )
    }))
  }

  pub async fn chat(&self, message: &str) -> Result<PlanDocument, CoachError> {
    let message = match message.trim() {
      "" => DEFAULT_CHAT_MESSAGE,
      m => m,
    };

    let content = self
      .complete(message.to_string(), CHAT_TEMPERATURE, CHAT_MAX_TOKENS)
      .await?
      .unwrap_or_else(|| NO_CONTENT.replace("\"Plan\"", "\"Coach\""));

    Ok(PlanDocument::parse(&content).unwrap_or_else(|| {
      PlanDocument::fallback(
        format!("{} Reply", self.config.coach_name),
        "Message",
        &content,
        &["Ask a follow-up.", "Provide more details."],
      )
    }))
  }

  /// Stream a 16-week plan as plain text.
  ///
  /// `on_chunk` sees each text delta in arrival order. The returned string
  /// is the full plan, unwrapped if the model answered `{"plan": "..."}`.
  pub async fn stream_plan<F>(&self, request: &PlanRequest, mut on_chunk: F) -> Result<String, CoachError>
  where
    F: FnMut(&str),
  {
    let payload = json!({
      "task": "Write a 16-week hybrid training plan as plain text, one block per week with a line per day. Respect the constraints and units in questions.",
      "profile": request.profile,
      "questions": request.questions,
    });

    let chat = ChatRequest {
      model: &self.config.model,
      messages: self.messages(payload.to_string()),
      temperature: PLAN_TEMPERATURE,
      max_tokens: STREAM_MAX_TOKENS,
      stream: true,
    };

    let mut response = self.send(&chat).await?;
    let mut buffer = SseBuffer::new();
    let mut full = String::new();

    'read: while let Some(bytes) = response
      .chunk()
      .await
      .map_err(|e| CoachError::Network(e.to_string()))?
    {
      for event in buffer.push(&bytes) {
        match event {
          SseEvent::Text(text) => {
            on_chunk(&text);
            full.push_str(&text);
          }
          SseEvent::Done => break 'read,
        }
      }
    }

    if let Some(SseEvent::Text(text)) = buffer.finish() {
      on_chunk(&text);
      full.push_str(&text);
    }

    debug!(chars = full.len(), "Coach stream finished");
    Ok(unwrap_plan_text(&full))
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
