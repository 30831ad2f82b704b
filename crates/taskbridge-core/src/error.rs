//! Producer errors carried through task and stream error channels.

use std::sync::Arc;

use thiserror::Error;

/// Error signalled by a task or a stream.
///
/// Errors are cloned when a stream fans out to several observers, so any
/// foreign error is kept behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// The underlying work failed.
    #[error("Task failed: {0}")]
    Failed(String),

    /// An error raised by the producer's own machinery.
    #[error(transparent)]
    Source(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskError {
    /// Create a `Failed` error from a description.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wrap an arbitrary error raised by a producer.
    pub fn from_source<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Arc::new(error))
    }
}

impl From<std::io::Error> for TaskError {
    fn from(error: std::io::Error) -> Self {
        Self::from_source(error)
    }
}
