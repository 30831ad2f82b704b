//! Subscription handles and their teardown chains.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

enum Teardown {
    Action(Box<dyn FnOnce() + Send>),
    Child(Subscription),
}

impl Teardown {
    fn run(self) {
        match self {
            Teardown::Action(f) => f(),
            Teardown::Child(child) => child.release(),
        }
    }
}

struct Inner {
    released: AtomicBool,
    teardowns: Mutex<Vec<Teardown>>,
}

/// Ownership handle for an active stream consumer.
///
/// Releasing stops delivery and runs every attached teardown once, in the
/// order they were attached. `release()` is idempotent. Clones share state,
/// so releasing any clone releases them all.
///
/// Dropping a `Subscription` does not release it.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

impl Subscription {
    /// Create a subscription whose release runs `teardown`.
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        let subscription = Self::empty();
        subscription.add_teardown(teardown);
        subscription
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Inner {
                released: AtomicBool::new(false),
                teardowns: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Release `child` together with this subscription.
    ///
    /// If this subscription is already released, `child` is released now.
    pub fn add(&self, child: Subscription) {
        if Arc::ptr_eq(&self.inner, &child.inner) {
            return;
        }
        self.push(Teardown::Child(child));
    }

    /// Run `teardown` when this subscription is released.
    ///
    /// If this subscription is already released, `teardown` runs now.
    pub fn add_teardown(&self, teardown: impl FnOnce() + Send + 'static) {
        self.push(Teardown::Action(Box::new(teardown)));
    }

    fn push(&self, teardown: Teardown) {
        let mut teardowns = self.inner.teardowns.lock();
        if self.inner.released.load(Ordering::SeqCst) {
            drop(teardowns);
            teardown.run();
            return;
        }
        teardowns.push(teardown);
    }

    /// Release the subscription. Calls after the first have no effect.
    pub fn release(&self) {
        if self.inner.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let teardowns = std::mem::take(&mut *self.inner.teardowns.lock());
        for teardown in teardowns {
            teardown.run();
        }
    }

    /// Returns true once released.
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.is_released())
            .finish()
    }
}
