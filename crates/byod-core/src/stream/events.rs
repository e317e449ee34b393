//! Typed progress-stream events

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::frame::SseFrame;

/// Message used when an `error` event carries no `message` string
pub const UNSPECIFIED_STREAM_ERROR: &str = "stream reported an error";

/// Current phase of a long-running server operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Machine-readable label, e.g. "encrypting"
    pub stage: String,
    /// 0..=100; out-of-range or fractional values are clamped and rounded
    #[serde(deserialize_with = "deserialize_percent")]
    pub percent: u8,
    #[serde(default)]
    pub message: String,
}

fn deserialize_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(de::Error::custom("percent must be a finite number"));
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// Event names the consumer acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Progress,
    Complete,
    Error,
}

impl EventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "progress" => Some(EventKind::Progress),
            "complete" => Some(EventKind::Complete),
            "error" => Some(EventKind::Error),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Progress => "progress",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
        }
    }
}

/// A decoded event ready to apply to a session
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Progress(ProgressEvent),
    /// Final result object, passed through verbatim
    Complete(Map<String, Value>),
    /// Server-reported failure message
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Progress(_))
    }

    /// Decode a frame. Unknown or unset event names yield `Ok(None)`
    /// without their payload being parsed.
    pub fn from_frame(frame: &SseFrame) -> Result<Option<Self>, MalformedEvent> {
        let Some(kind) = EventKind::from_name(&frame.event) else {
            return Ok(None);
        };
        let malformed = |reason: String| MalformedEvent {
            event: kind.name(),
            reason,
        };

        let event = match kind {
            EventKind::Progress => {
                let progress: ProgressEvent =
                    serde_json::from_str(&frame.data).map_err(|e| malformed(e.to_string()))?;
                StreamEvent::Progress(progress)
            }
            EventKind::Complete => {
                match serde_json::from_str::<Value>(&frame.data)
                    .map_err(|e| malformed(e.to_string()))?
                {
                    Value::Object(result) => StreamEvent::Complete(result),
                    other => {
                        return Err(malformed(format!(
                            "expected a JSON object, got {}",
                            json_type(&other)
                        )))
                    }
                }
            }
            EventKind::Error => {
                let payload: Value =
                    serde_json::from_str(&frame.data).map_err(|e| malformed(e.to_string()))?;
                let message = payload
                    .get("message")
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.is_empty())
                    .unwrap_or(UNSPECIFIED_STREAM_ERROR);
                StreamEvent::Error(message.to_string())
            }
        };
        Ok(Some(event))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A recognized event whose payload couldn't be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {event} event: {reason}")]
pub struct MalformedEvent {
    pub event: &'static str,
    pub reason: String,
}
