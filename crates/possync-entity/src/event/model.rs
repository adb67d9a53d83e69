//! Event entity model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::EventPayload;

/// A single line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier, the deduplication key.
    pub id: String,
    /// Raw `type` tag as written by the producer.
    pub event_type: String,
    /// Typed view of the payload.
    pub payload: EventPayload,
    /// The original JSON object, forwarded verbatim as the job payload.
    pub raw: Value,
}

/// Why a log line could not be turned into an [`Event`].
#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    /// The line is valid JSON but not an object.
    #[error("event is not a JSON object")]
    NotAnObject,
    /// `id` is missing or not a string.
    #[error("event has no string `id`")]
    MissingId,
    /// `type` is missing or not a string.
    #[error("event {0} has no string `type`")]
    MissingType(String),
}

impl Event {
    /// Build an event from one parsed log line.
    ///
    /// Only the `id` and `type` fields are required. A known type whose
    /// fields do not fit the typed payload keeps its tag and raw object with
    /// an [`EventPayload::Untyped`] payload.
    pub fn from_value(raw: Value) -> Result<Self, EventParseError> {
        let object = raw.as_object().ok_or(EventParseError::NotAnObject)?;

        let id = object
            .get("id")
            .and_then(Value::as_str)
            .ok_or(EventParseError::MissingId)?
            .to_string();

        let event_type = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| EventParseError::MissingType(id.clone()))?
            .to_string();

        let payload = EventPayload::deserialize(&raw).unwrap_or(EventPayload::Untyped);

        Ok(Self {
            id,
            event_type,
            payload,
            raw,
        })
    }

    /// Parse a single NDJSON line.
    pub fn parse_line(line: &str) -> Result<Self, EventLineError> {
        let value: Value = serde_json::from_str(line)?;
        Ok(Self::from_value(value)?)
    }
}

/// Error from [`Event::parse_line`].
#[derive(Debug, thiserror::Error)]
pub enum EventLineError {
    /// The line is not JSON at all.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// JSON that is not a usable event.
    #[error(transparent)]
    Event(#[from] EventParseError),
}
