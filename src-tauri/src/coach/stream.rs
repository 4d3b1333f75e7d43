//! Streaming chat-completion plumbing
//!
//! The completion endpoint streams server-sent events, one JSON delta per
//! `data:` line, ending with `data: [DONE]`. Network chunks do not respect
//! line boundaries, so bytes are buffered until a full line is available.

use std::sync::Mutex;

use serde::Deserialize;
use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct StreamChunk {
  #[serde(default)]
  choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
  #[serde(default)]
  delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
  content: Option<String>,
}

/// What one complete SSE line contributed
#[derive(Debug, PartialEq, Eq)]
pub enum SseEvent {
  Text(String),
  Done,
}

/// Accumulates raw bytes and yields events for each complete line
#[derive(Debug, Default)]
pub struct SseBuffer {
  pending: Vec<u8>,
}

impl SseBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
    self.pending.extend_from_slice(bytes);

    let mut events = Vec::new();
    while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
      let line: Vec<u8> = self.pending.drain(..=pos).collect();
      let line = String::from_utf8_lossy(&line);
      if let Some(event) = parse_line(line.trim()) {
        events.push(event);
      }
    }
    events
  }

  /// Flush a trailing line that arrived without a newline
  pub fn finish(&mut self) -> Option<SseEvent> {
    let rest = std::mem::take(&mut self.pending);
    parse_line(String::from_utf8_lossy(&rest).trim())
  }
}

fn parse_line(line: &str) -> Option<SseEvent> {
  let data = line.strip_prefix("data:")?.trim();
  if data == "[DONE]" {
    return Some(SseEvent::Done);
  }

  match serde_json::from_str::<StreamChunk>(data) {
    Ok(chunk) => {
      let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
      (!text.is_empty()).then_some(SseEvent::Text(text))
    }
    Err(e) => {
      debug!(error = %e, "Ignoring unparseable stream line");
      None
    }
  }
}

/// At most one coach stream runs at a time.
///
/// Starting a new stream aborts the one already running so an old
/// response can never write into the new one.
#[derive(Debug, Default)]
pub struct CoachStreamSlot {
  active: Mutex<Option<AbortHandle>>,
}

impl CoachStreamSlot {
  pub fn replace(&self, handle: AbortHandle) {
    let previous = match self.active.lock() {
      Ok(mut guard) => guard.replace(handle),
      Err(poisoned) => poisoned.into_inner().replace(handle),
    };
    if let Some(previous) = previous {
      debug!("Aborting previous coach stream");
      previous.abort();
    }
  }

  /// Returns whether a stream was running
  pub fn cancel(&self) -> bool {
    let previous = match self.active.lock() {
      Ok(mut guard) => guard.take(),
      Err(poisoned) => poisoned.into_inner().take(),
    };
    match previous {
      Some(handle) => {
        let was_running = !handle.is_finished();
        handle.abort();
        was_running
      }
      None => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn delta(text: &str) -> String {
    format!(
      "data: {}\n\n",
      serde_json::json!({ "choices": [{ "delta": { "content": text } }] })
    )
  }

  #[test]
  fn test_events_split_across_chunks() {
    let body = format!("{}{}data: [DONE]\n\n", delta("Week 1: "), delta("Easy 5 mi"));
    let (a, b) = body.as_bytes().split_at(17);

    let mut buffer = SseBuffer::new();
    let mut events = buffer.push(a);
    events.extend(buffer.push(b));

    assert_eq!(
      events,
      vec![
        SseEvent::Text("Week 1: ".into()),
        SseEvent::Text("Easy 5 mi".into()),
        SseEvent::Done,
      ]
    );
    assert_eq!(buffer.finish(), None);
  }

  #[test]
  fn test_role_only_and_junk_lines_ignored() {
    let mut buffer = SseBuffer::new();
    let events = buffer.push(
      b": keep-alive\ndata: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\ndata: nope\n",
    );
    assert!(events.is_empty());
  }

  #[test]
  fn test_finish_flushes_trailing_line() {
    let mut buffer = SseBuffer::new();
    assert!(buffer.push(b"data: [DONE]").is_empty());
    assert_eq!(buffer.finish(), Some(SseEvent::Done));
  }

  #[tokio::test]
  async fn test_slot_aborts_previous_stream() {
    let slot = CoachStreamSlot::default();

    let first = tokio::spawn(std::future::pending::<()>());
    slot.replace(first.abort_handle());

    let second = tokio::spawn(std::future::pending::<()>());
    slot.replace(second.abort_handle());

    assert!(first.await.unwrap_err().is_cancelled());
    assert!(slot.cancel());
    assert!(second.await.unwrap_err().is_cancelled());
    assert!(!slot.cancel());
  }
}
