//! The task contract.

use serde_json::Value;

use crate::disposable::Disposable;
use crate::error::TaskError;
use crate::event::Message;

/// Called once when the task completes.
pub type CompleteListener = Box<dyn Fn() + Send + Sync>;

/// Called once when the task fails.
pub type ErrorListener = Box<dyn Fn(&TaskError) + Send + Sync>;

/// Called for each message the task emits.
pub type MessageListener = Box<dyn Fn(&Message) + Send + Sync>;

/// Called for each progress update; `None` means indeterminate.
pub type ProgressListener = Box<dyn Fn(Option<f64>) + Send + Sync>;

/// Called when the task produces its result value.
pub type ResultListener = Box<dyn Fn(&Value) + Send + Sync>;

/// Called for each status change.
pub type StatusListener = Box<dyn Fn(&str) + Send + Sync>;

/// An imperative, cancellable unit of asynchronous work.
///
/// Whoever calls `start()` owns the task's lifecycle and must either observe
/// a terminal signal or call `cancel()`. Once a task has completed, errored,
/// or been canceled it fires nothing further.
///
/// The four data notifications are optional capabilities. A task that does
/// not support one keeps the default implementation, which returns `None`
/// without keeping the listener. Callers probe by registering.
pub trait Task: Send + Sync {
    /// Begin the work.
    fn start(&self);

    /// Request an early stop. Does nothing if the task is not running.
    fn cancel(&self);

    /// Register a completion listener.
    fn on_did_complete(&self, listener: CompleteListener) -> Disposable;

    /// Register an error listener.
    fn on_did_error(&self, listener: ErrorListener) -> Disposable;

    /// Register a message listener, if the task emits messages.
    fn on_message(&self, _listener: MessageListener) -> Option<Disposable> {
        None
    }

    /// Register a progress listener, if the task reports progress.
    fn on_progress(&self, _listener: ProgressListener) -> Option<Disposable> {
        None
    }

    /// Register a result listener, if the task produces a result.
    fn on_result(&self, _listener: ResultListener) -> Option<Disposable> {
        None
    }

    /// Register a status listener, if the task reports status.
    fn on_status_change(&self, _listener: StatusListener) -> Option<Disposable> {
        None
    }
}
