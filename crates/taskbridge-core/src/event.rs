//! Tagged events multiplexing the four task notification kinds onto one stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a [`Message`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    #[default]
    Info,
    Log,
    Warning,
    Error,
    Debug,
    Success,
}

/// A diagnostic or informational message emitted by a task.
///
/// The bridge treats the payload as opaque; producers decide what goes in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Free-form text.
    pub text: String,
    /// Severity level.
    pub level: MessageLevel,
}

impl Message {
    /// Create a new message.
    pub fn new(text: impl Into<String>, level: MessageLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    /// Create an `info` message.
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, MessageLevel::Info)
    }

    /// Create a `warning` message.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, MessageLevel::Warning)
    }

    /// Create an `error` message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, MessageLevel::Error)
    }
}

/// One element of a task event stream.
///
/// Exactly one kind of payload is carried per event; no kind implies another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaggedEvent {
    /// A diagnostic message.
    Message { message: Message },
    /// Fractional completion; `None` means indeterminate.
    Progress { progress: Option<f64> },
    /// The task's output value.
    Result { result: Value },
    /// Free-text status description.
    Status { status: String },
}

impl TaggedEvent {
    /// Create a message event.
    pub fn message(message: Message) -> Self {
        Self::Message { message }
    }

    /// Create a progress event.
    pub fn progress(progress: Option<f64>) -> Self {
        Self::Progress { progress }
    }

    /// Create a result event.
    pub fn result(result: impl Into<Value>) -> Self {
        Self::Result {
            result: result.into(),
        }
    }

    /// Create a status event.
    pub fn status(status: impl Into<String>) -> Self {
        Self::Status {
            status: status.into(),
        }
    }

    /// The kind of payload this event carries.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message { .. } => EventKind::Message,
            Self::Progress { .. } => EventKind::Progress,
            Self::Result { .. } => EventKind::Result,
            Self::Status { .. } => EventKind::Status,
        }
    }
}

/// Discriminant of a [`TaggedEvent`], handy for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Message,
    Progress,
    Result,
    Status,
}
