//! Task-from-Stream adapter.
//!
//! `start()` subscribes the stream, `cancel()` releases the subscription, and
//! each tagged element is routed to the listeners registered for its kind.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use taskbridge_core::{
    BridgeId, CompleteListener, Disposable, ErrorListener, MessageListener, ProgressListener,
    ResultListener, StatusListener, Task, TaskEmitter, TaskStatus,
};
use taskbridge_rx::{Observable, Observer, Subscription};
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;

/// Wrap a stream of tagged events as a task.
///
/// See [`ObservableTask`].
pub fn task_from_observable<O>(source: O) -> ObservableTask
where
    O: Observable + 'static,
{
    task_from_observable_with(source, BridgeConfig::default())
}

/// Wrap a stream of tagged events as a task, with explicit configuration.
pub fn task_from_observable_with<O>(source: O, config: BridgeConfig) -> ObservableTask
where
    O: Observable + 'static,
{
    ObservableTask {
        source: Arc::new(source),
        shared: Arc::new(Shared {
            id: BridgeId::generate(),
            config,
            emitter: TaskEmitter::new(),
            state: Mutex::new(State::default()),
        }),
    }
}

#[derive(Default)]
struct State {
    status: TaskStatus,
    subscription: Option<Subscription>,
}

struct Shared {
    id: BridgeId,
    config: BridgeConfig,
    emitter: TaskEmitter,
    state: Mutex<State>,
}

impl Shared {
    fn is_running(&self) -> bool {
        self.state.lock().status == TaskStatus::Running
    }

    /// Move from `Running` to `status`. Returns false if no longer running.
    fn finish(&self, status: TaskStatus) -> bool {
        let mut state = self.state.lock();
        if !state.status.can_transition_to(status) {
            return false;
        }
        state.status = status;
        state.subscription = None;
        true
    }
}

/// A task driven by a stream of tagged events.
///
/// Single-use: the first `start()` subscribes; later calls log a warning and
/// do nothing. `cancel()` is safe to call at any time and only releases a
/// live subscription. Listeners may be registered before or after `start()`;
/// events are not replayed to late listeners.
///
/// Dropping the task does not cancel it.
///
/// # Example
///
/// ```rust
/// use taskbridge::task_from_observable;
/// use taskbridge_core::{TaggedEvent, Task};
/// use taskbridge_rx::Subject;
///
/// let events = Subject::new();
/// let task = task_from_observable(events.clone());
/// let _progress = task.on_progress(Box::new(|p| println!("progress: {:?}", p)));
/// let _done = task.on_did_complete(Box::new(|| println!("done")));
///
/// task.start();
/// events.next(TaggedEvent::progress(Some(0.5)));
/// events.complete();
/// ```
pub struct ObservableTask {
    source: Arc<dyn Observable>,
    shared: Arc<Shared>,
}

impl ObservableTask {
    /// Identifier attached to this task's log lines.
    pub fn id(&self) -> &BridgeId {
        &self.shared.id
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TaskStatus {
        self.shared.state.lock().status
    }

    fn observer(&self) -> Observer {
        let next = Arc::clone(&self.shared);
        let error = Arc::clone(&self.shared);
        let complete = Arc::clone(&self.shared);

        Observer::new()
            .on_next(move |event| {
                if !next.is_running() {
                    trace!(bridge_id = %next.id, kind = ?event.kind(), "Dropping event for inactive task");
                    return;
                }
                trace!(bridge_id = %next.id, kind = ?event.kind(), "Dispatching stream event");
                next.emitter.dispatch(&event);
            })
            .on_error(move |err| {
                if error.finish(TaskStatus::Errored) {
                    debug!(bridge_id = %error.id, error = %err, "Event stream errored");
                    error.emitter.emit_error(&err);
                    error.emitter.clear();
                }
            })
            .on_complete(move || {
                if complete.finish(TaskStatus::Completed) {
                    debug!(bridge_id = %complete.id, "Event stream completed");
                    complete.emitter.emit_complete();
                    // Nothing can fire after a terminal signal.
                    complete.emitter.clear();
                }
            })
    }
}

impl Task for ObservableTask {
    fn start(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.status != TaskStatus::NotStarted {
                warn!(
                    bridge_id = %self.shared.id,
                    name = self.shared.config.label(),
                    status = ?state.status,
                    "start() called on an already started task; ignoring"
                );
                return;
            }
            state.status = TaskStatus::Running;
        }

        debug!(bridge_id = %self.shared.id, name = self.shared.config.label(), "Subscribing to event stream");
        // No lock held here: the stream may emit, finish, or see cancel() synchronously.
        let subscription = self.source.subscribe(self.observer());

        let mut state = self.shared.state.lock();
        match state.status {
            TaskStatus::Running => state.subscription = Some(subscription),
            TaskStatus::Canceled => {
                drop(state);
                debug!(bridge_id = %self.shared.id, "Canceled while subscribing; releasing subscription");
                subscription.release();
            }
            _ => {}
        }
    }

    fn cancel(&self) {
        let subscription = {
            let mut state = self.shared.state.lock();
            if state.status != TaskStatus::Running {
                debug!(bridge_id = %self.shared.id, status = ?state.status, "cancel() ignored; task is not running");
                return;
            }
            state.status = TaskStatus::Canceled;
            state.subscription.take()
        };

        debug!(bridge_id = %self.shared.id, "Canceling task; releasing stream subscription");
        if let Some(subscription) = subscription {
            subscription.release();
        }
    }

    fn on_did_complete(&self, listener: CompleteListener) -> Disposable {
        self.shared.emitter.on_did_complete(listener)
    }

    fn on_did_error(&self, listener: ErrorListener) -> Disposable {
        self.shared.emitter.on_did_error(listener)
    }

    fn on_message(&self, listener: MessageListener) -> Option<Disposable> {
        Some(self.shared.emitter.on_message(listener))
    }

    fn on_progress(&self, listener: ProgressListener) -> Option<Disposable> {
        Some(self.shared.emitter.on_progress(listener))
    }

    fn on_result(&self, listener: ResultListener) -> Option<Disposable> {
        Some(self.shared.emitter.on_result(listener))
    }

    fn on_status_change(&self, listener: StatusListener) -> Option<Disposable> {
        Some(self.shared.emitter.on_status_change(listener))
    }
}

impl fmt::Debug for ObservableTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableTask")
            .field("id", &self.shared.id)
            .field("status", &self.status())
            .finish()
    }
}
