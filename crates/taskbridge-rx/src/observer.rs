//! Observers and the subscriber wrapper producers push into.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use taskbridge_core::{TaggedEvent, TaskError};
use tracing::{trace, warn};

use crate::subscription::Subscription;

type NextFn = Box<dyn Fn(TaggedEvent) + Send + Sync>;
type ErrorFn = Box<dyn FnOnce(TaskError) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// Callbacks receiving a stream's elements and its terminal signal.
///
/// Every callback is optional.
///
/// # Example
///
/// ```rust
/// use taskbridge_rx::Observer;
///
/// let observer = Observer::new()
///     .on_next(|event| println!("event: {:?}", event))
///     .on_error(|err| eprintln!("failed: {}", err))
///     .on_complete(|| println!("done"));
/// ```
#[derive(Default)]
pub struct Observer {
    next: Option<NextFn>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl Observer {
    /// An observer that ignores everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element callback.
    pub fn on_next(mut self, f: impl Fn(TaggedEvent) + Send + Sync + 'static) -> Self {
        self.next = Some(Box::new(f));
        self
    }

    /// Set the error callback.
    pub fn on_error(mut self, f: impl FnOnce(TaskError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Set the completion callback.
    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("next", &self.next.is_some())
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

struct Inner {
    next: Option<NextFn>,
    error: Mutex<Option<ErrorFn>>,
    complete: Mutex<Option<CompleteFn>>,
    stopped: AtomicBool,
    subscription: Subscription,
}

/// The producer-side view of one subscription.
///
/// Guarantees the observer sees at most one terminal signal and nothing
/// after it, and nothing at all once the subscription is released. After a
/// terminal signal the subscription is released, running its teardowns.
#[derive(Clone)]
pub struct Subscriber {
    inner: Arc<Inner>,
}

impl Subscriber {
    /// Wrap an observer.
    pub fn new(observer: Observer) -> Self {
        Self {
            inner: Arc::new(Inner {
                next: observer.next,
                error: Mutex::new(observer.error),
                complete: Mutex::new(observer.complete),
                stopped: AtomicBool::new(false),
                subscription: Subscription::empty(),
            }),
        }
    }

    /// Deliver an element, unless the subscriber is closed.
    pub fn next(&self, event: TaggedEvent) {
        if self.is_closed() {
            trace!(kind = ?event.kind(), "Dropping event for closed subscriber");
            return;
        }
        if let Some(next) = &self.inner.next {
            next(event);
        }
    }

    /// Deliver the error signal and release the subscription.
    pub fn error(&self, error: TaskError) {
        if !self.stop() {
            trace!(error = %error, "Dropping error for closed subscriber");
            return;
        }

        let handler = self.inner.error.lock().take();
        self.inner.complete.lock().take();
        match handler {
            Some(handler) => handler(error),
            None => warn!(error = %error, "Unhandled stream error"),
        }
        self.inner.subscription.release();
    }

    /// Deliver the completion signal and release the subscription.
    pub fn complete(&self) {
        if !self.stop() {
            trace!("Dropping completion for closed subscriber");
            return;
        }

        let handler = self.inner.complete.lock().take();
        self.inner.error.lock().take();
        if let Some(handler) = handler {
            handler();
        }
        self.inner.subscription.release();
    }

    // Single check-and-act on the terminal flag; true if this call stopped it.
    fn stop(&self) -> bool {
        !self.inner.subscription.is_released() && !self.inner.stopped.swap(true, Ordering::SeqCst)
    }

    /// Returns true after a terminal signal or release.
    pub fn is_closed(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst) || self.inner.subscription.is_released()
    }

    /// Release `teardown` together with this subscriber.
    pub fn add(&self, teardown: Subscription) {
        self.inner.subscription.add(teardown);
    }

    /// The subscription handle handed to the consumer.
    pub fn subscription(&self) -> Subscription {
        self.inner.subscription.clone()
    }

    /// An observer that forwards everything it receives to this subscriber.
    pub fn as_observer(&self) -> Observer {
        let next = self.clone();
        let error = self.clone();
        let complete = self.clone();
        Observer::new()
            .on_next(move |event| next.next(event))
            .on_error(move |err| error.error(err))
            .on_complete(move || complete.complete())
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("closed", &self.is_closed())
            .finish()
    }
}
