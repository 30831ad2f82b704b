//! Lifecycle status of a task.

use serde::{Deserialize, Serialize};

/// Lifecycle of a task: `NotStarted -> Running -> {Completed | Errored | Canceled}`.
///
/// Once terminal, a task never transitions again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// `start()` has not been called yet.
    #[default]
    NotStarted,
    /// Work is in flight.
    Running,
    /// Work finished successfully.
    Completed,
    /// Work failed.
    Errored,
    /// Work was stopped by `cancel()`.
    Canceled,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Canceled)
    }

    /// Returns true if the task is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            Self::NotStarted => next == Self::Running,
            Self::Running => next.is_terminal(),
            _ => false,
        }
    }
}
