//! Listener registries and the per-kind dispatch table.
//!
//! `Listeners<T>` is an ordered list of callbacks that can be disposed
//! individually. `TaskEmitter` bundles one registry per task notification kind
//! and routes a [`TaggedEvent`] to exactly one of them.
//!
//! Emission snapshots the registry before calling out, so listeners may
//! register, dispose, or re-enter the emitter while being invoked.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::disposable::Disposable;
use crate::error::TaskError;
use crate::event::{Message, TaggedEvent};
use crate::task::{
    CompleteListener, ErrorListener, MessageListener, ProgressListener, ResultListener,
    StatusListener,
};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// An ordered, disposable list of listeners for values of type `T`.
pub struct Listeners<T: ?Sized + 'static> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: ?Sized + 'static> Listeners<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener. It is invoked after all listeners registered before it.
    pub fn add<F>(&self, listener: F) -> Disposable
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.inner.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::new(listener)));
            id
        };

        let registry = Arc::downgrade(&self.inner);
        Disposable::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Invoke every registered listener with `value`, in registration order.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(value);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

impl<T: ?Sized + 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

/// Dispatch table holding one listener registry per task notification kind.
///
/// Task producers can embed a `TaskEmitter` and forward the `Task`
/// registration methods to it; the emit methods then fire the callbacks.
#[derive(Debug, Default)]
pub struct TaskEmitter {
    complete: Listeners<()>,
    error: Listeners<TaskError>,
    message: Listeners<Message>,
    progress: Listeners<Option<f64>>,
    result: Listeners<Value>,
    status: Listeners<str>,
}

impl TaskEmitter {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_did_complete(&self, listener: CompleteListener) -> Disposable {
        self.complete.add(move |_: &()| listener())
    }

    pub fn on_did_error(&self, listener: ErrorListener) -> Disposable {
        self.error.add(move |error: &TaskError| listener(error))
    }

    pub fn on_message(&self, listener: MessageListener) -> Disposable {
        self.message.add(move |message: &Message| listener(message))
    }

    pub fn on_progress(&self, listener: ProgressListener) -> Disposable {
        self.progress.add(move |progress: &Option<f64>| listener(*progress))
    }

    pub fn on_result(&self, listener: ResultListener) -> Disposable {
        self.result.add(move |result: &Value| listener(result))
    }

    pub fn on_status_change(&self, listener: StatusListener) -> Disposable {
        self.status.add(move |status: &str| listener(status))
    }

    /// Fire the completion listeners.
    pub fn emit_complete(&self) {
        self.complete.emit(&());
    }

    /// Fire the error listeners.
    pub fn emit_error(&self, error: &TaskError) {
        self.error.emit(error);
    }

    pub fn emit_message(&self, message: &Message) {
        self.message.emit(message);
    }

    pub fn emit_progress(&self, progress: Option<f64>) {
        self.progress.emit(&progress);
    }

    pub fn emit_result(&self, result: &Value) {
        self.result.emit(result);
    }

    pub fn emit_status(&self, status: &str) {
        self.status.emit(status);
    }

    /// Route one tagged event to the listeners of its kind, and only those.
    pub fn dispatch(&self, event: &TaggedEvent) {
        match event {
            TaggedEvent::Message { message } => self.message.emit(message),
            TaggedEvent::Progress { progress } => self.progress.emit(progress),
            TaggedEvent::Result { result } => self.result.emit(result),
            TaggedEvent::Status { status } => self.status.emit(status.as_str()),
        }
    }

    /// Total number of listeners across all kinds.
    pub fn listener_count(&self) -> usize {
        self.complete.len()
            + self.error.len()
            + self.message.len()
            + self.progress.len()
            + self.result.len()
            + self.status.len()
    }

    /// Drop every listener of every kind.
    pub fn clear(&self) {
        self.complete.clear();
        self.error.clear();
        self.message.clear();
        self.progress.clear();
        self.result.clear();
        self.status.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MessageLevel;
    use serde_json::json;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let listeners: Listeners<i32> = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = listeners.add(move |v: &i32| first.lock().push(("first", *v)));
        let second = seen.clone();
        let _b = listeners.add(move |v: &i32| second.lock().push(("second", *v)));

        listeners.emit(&7);
        assert_eq!(*seen.lock(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_dispose_removes_only_that_listener() {
        let listeners: Listeners<str> = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = seen.clone();
        let mut first = listeners.add(move |s: &str| a.lock().push(format!("a:{s}")));
        let b = seen.clone();
        let _second = listeners.add(move |s: &str| b.lock().push(format!("b:{s}")));

        first.dispose();
        assert_eq!(listeners.len(), 1);

        listeners.emit("x");
        assert_eq!(*seen.lock(), vec!["b:x".to_string()]);
    }

    #[test]
    fn test_dispose_after_registry_dropped() {
        let listeners: Listeners<()> = Listeners::new();
        let mut disposable = listeners.add(|_: &()| {});
        drop(listeners);
        disposable.dispose();
        assert!(disposable.is_disposed());
    }

    #[test]
    fn test_listener_may_register_during_emit() {
        let listeners: Listeners<()> = Listeners::new();
        let registry = listeners.clone();
        let _d = listeners.add(move |_: &()| {
            let _inner = registry.add(|_: &()| {});
        });

        listeners.emit(&());
        assert_eq!(listeners.len(), 2);
    }

    #[test]
    fn test_dispatch_routes_to_one_kind() {
        let emitter = TaskEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        let _m = emitter.on_message(Box::new(move |m| s.lock().push(format!("message:{}", m.text))));
        let s = seen.clone();
        let _p = emitter.on_progress(Box::new(move |p| s.lock().push(format!("progress:{p:?}"))));
        let s = seen.clone();
        let _r = emitter.on_result(Box::new(move |r| s.lock().push(format!("result:{r}"))));
        let s = seen.clone();
        let _st = emitter.on_status_change(Box::new(move |st| s.lock().push(format!("status:{st}"))));

        emitter.dispatch(&TaggedEvent::message(Message::new("hello", MessageLevel::Warning)));
        emitter.dispatch(&TaggedEvent::progress(Some(0.5)));
        emitter.dispatch(&TaggedEvent::progress(None));
        emitter.dispatch(&TaggedEvent::result(json!(42)));
        emitter.dispatch(&TaggedEvent::status("fine and dandy"));

        assert_eq!(
            *seen.lock(),
            vec![
                "message:hello".to_string(),
                "progress:Some(0.5)".to_string(),
                "progress:None".to_string(),
                "result:42".to_string(),
                "status:fine and dandy".to_string(),
            ]
        );
    }

    #[test]
    fn test_complete_and_error() {
        let emitter = TaskEmitter::new();
        let completed = Arc::new(Mutex::new(0));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let c = completed.clone();
        let _c = emitter.on_did_complete(Box::new(move || *c.lock() += 1));
        let e = errors.clone();
        let _e = emitter.on_did_error(Box::new(move |err| e.lock().push(err.to_string())));

        emitter.emit_complete();
        emitter.emit_error(&TaskError::failed("boom"));

        assert_eq!(*completed.lock(), 1);
        assert_eq!(*errors.lock(), vec!["Task failed: boom".to_string()]);

        assert_eq!(emitter.listener_count(), 2);
        emitter.clear();
        assert_eq!(emitter.listener_count(), 0);
        emitter.emit_complete();
        assert_eq!(*completed.lock(), 1);
    }
}
