//! A task that ticks on the tokio runtime, reporting progress as it goes.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use taskbridge_core::{
    CompleteListener, Disposable, ErrorListener, Message, MessageListener, ProgressListener,
    ResultListener, StatusListener, Task, TaskEmitter, TaskError, TaskStatus,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;

struct Inner {
    emitter: TaskEmitter,
    status: Mutex<TaskStatus>,
    config: Config,
}

impl Inner {
    fn is_running(&self) -> bool {
        self.status.lock().is_active()
    }

    fn transition(&self, status: TaskStatus) -> bool {
        let mut current = self.status.lock();
        if !current.can_transition_to(status) {
            return false;
        }
        *current = status;
        true
    }

    // Lock is released before emitting; listeners may call cancel().
    fn emit(&self, f: impl FnOnce(&TaskEmitter)) {
        if self.is_running() {
            f(&self.emitter);
        }
    }

    async fn run(self: Arc<Self>) {
        let steps = self.config.steps.max(1);
        self.emit(|e| e.emit_status("starting"));

        for step in 1..=steps {
            tokio::time::sleep(self.config.tick_interval()).await;

            if self.config.fail_at == Some(step) {
                self.emit(|e| e.emit_message(&Message::error(format!("tick {step} aborted"))));
                if self.transition(TaskStatus::Errored) {
                    warn!(step, "Ticker failing on request");
                    self.emitter
                        .emit_error(&TaskError::failed(format!("tick {step} failed")));
                }
                return;
            }

            let progress = f64::from(step) / f64::from(steps);
            self.emit(|e| e.emit_progress(Some(progress)));
            self.emit(|e| e.emit_message(&Message::info(format!("tick {step}/{steps}"))));
        }

        self.emit(|e| e.emit_result(&json!({ "ticks": steps })));
        if self.transition(TaskStatus::Completed) {
            debug!(steps, "Ticker completed");
            self.emitter.emit_complete();
        }
    }
}

/// Ticking task. Owns the runtime handle it spawns its work on.
pub struct TickerTask {
    inner: Arc<Inner>,
    runtime: Handle,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TickerTask {
    /// Create a ticker that will run on `runtime` once started.
    pub fn new(config: Config, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                emitter: TaskEmitter::new(),
                status: Mutex::new(TaskStatus::NotStarted),
                config,
            }),
            runtime,
            worker: Mutex::new(None),
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TaskStatus {
        *self.inner.status.lock()
    }
}

impl Task for TickerTask {
    fn start(&self) {
        if !self.inner.transition(TaskStatus::Running) {
            warn!(status = ?self.status(), "Ticker already started; ignoring start()");
            return;
        }
        info!(steps = self.inner.config.steps, "Starting ticker");
        let inner = Arc::clone(&self.inner);
        let worker = self.runtime.spawn(inner.run());
        *self.worker.lock() = Some(worker);
    }

    fn cancel(&self) {
        if !self.inner.transition(TaskStatus::Canceled) {
            debug!(status = ?self.status(), "Ticker not running; ignoring cancel()");
            return;
        }
        info!("Canceling ticker");
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
    }

    fn on_did_complete(&self, listener: CompleteListener) -> Disposable {
        self.inner.emitter.on_did_complete(listener)
    }

    fn on_did_error(&self, listener: ErrorListener) -> Disposable {
        self.inner.emitter.on_did_error(listener)
    }

    fn on_message(&self, listener: MessageListener) -> Option<Disposable> {
        Some(self.inner.emitter.on_message(listener))
    }

    fn on_progress(&self, listener: ProgressListener) -> Option<Disposable> {
        Some(self.inner.emitter.on_progress(listener))
    }

    fn on_result(&self, listener: ResultListener) -> Option<Disposable> {
        Some(self.inner.emitter.on_result(listener))
    }

    fn on_status_change(&self, listener: StatusListener) -> Option<Disposable> {
        Some(self.inner.emitter.on_status_change(listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbridge::observable_from_task;
    use taskbridge_core::TaggedEvent;

    fn quick(steps: u32) -> Config {
        Config {
            steps,
            tick_interval_ms: 10,
            ..Config::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stream_runs_to_completion() {
        let ticker = Arc::new(TickerTask::new(quick(2), Handle::current()));
        let mut events = observable_from_task(ticker.clone()).into_receiver();

        let mut seen = Vec::new();
        while let Some(item) = events.recv().await {
            seen.push(item.unwrap());
        }

        assert_eq!(seen.first(), Some(&TaggedEvent::status("starting")));
        assert!(seen.contains(&TaggedEvent::progress(Some(1.0))));
        assert_eq!(seen.last(), Some(&TaggedEvent::result(json!({ "ticks": 2 }))));
        assert_eq!(ticker.status(), TaskStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_failure_errors_stream() {
        let config = Config {
            fail_at: Some(2),
            ..quick(3)
        };
        let ticker = Arc::new(TickerTask::new(config, Handle::current()));
        let mut events = observable_from_task(ticker.clone()).into_receiver();

        let mut seen = Vec::new();
        while let Some(item) = events.recv().await {
            seen.push(item);
        }

        let err = seen.pop().unwrap().unwrap_err();
        assert_eq!(
            seen.pop().unwrap().unwrap(),
            TaggedEvent::message(Message::error("tick 2 aborted"))
        );
        assert_eq!(err.to_string(), "Task failed: tick 2 failed");
        assert_eq!(ticker.status(), TaskStatus::Errored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_receiver_cancels_ticker() {
        let ticker = Arc::new(TickerTask::new(quick(10), Handle::current()));
        let mut events = observable_from_task(ticker.clone()).into_receiver();

        // "starting" on spawn, the first tick after one interval.
        events.recv().await.unwrap().unwrap();
        events.recv().await.unwrap().unwrap();
        drop(events);

        assert_eq!(ticker.status(), TaskStatus::Canceled);
    }
}
