//! Scriptable task used by the adapter tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use taskbridge_core::{
    CompleteListener, Disposable, ErrorListener, Message, MessageListener, ProgressListener,
    ResultListener, StatusListener, Task, TaskEmitter, TaskError,
};

/// Task whose notifications are fired by hand and whose start/cancel are counted.
#[derive(Default)]
pub struct MockTask {
    pub emitter: TaskEmitter,
    starts: AtomicUsize,
    cancels: AtomicUsize,
}

impl MockTask {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn complete(&self) {
        self.emitter.emit_complete();
    }

    pub fn error(&self, error: TaskError) {
        self.emitter.emit_error(&error);
    }

    pub fn message(&self, message: Message) {
        self.emitter.emit_message(&message);
    }

    pub fn progress(&self, progress: Option<f64>) {
        self.emitter.emit_progress(progress);
    }

    pub fn result(&self, result: Value) {
        self.emitter.emit_result(&result);
    }

    pub fn status(&self, status: &str) {
        self.emitter.emit_status(status);
    }
}

impl Task for MockTask {
    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn on_did_complete(&self, listener: CompleteListener) -> Disposable {
        self.emitter.on_did_complete(listener)
    }

    fn on_did_error(&self, listener: ErrorListener) -> Disposable {
        self.emitter.on_did_error(listener)
    }

    fn on_message(&self, listener: MessageListener) -> Option<Disposable> {
        Some(self.emitter.on_message(listener))
    }

    fn on_progress(&self, listener: ProgressListener) -> Option<Disposable> {
        Some(self.emitter.on_progress(listener))
    }

    fn on_result(&self, listener: ResultListener) -> Option<Disposable> {
        Some(self.emitter.on_result(listener))
    }

    fn on_status_change(&self, listener: StatusListener) -> Option<Disposable> {
        Some(self.emitter.on_status_change(listener))
    }
}
