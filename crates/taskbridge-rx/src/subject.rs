//! Hot multicast source.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use taskbridge_core::{TaggedEvent, TaskError};
use tracing::trace;

use crate::observable::Observable;
use crate::observer::{Observer, Subscriber};
use crate::subscription::Subscription;

#[derive(Clone)]
enum Terminal {
    Completed,
    Errored(TaskError),
}

#[derive(Default)]
struct State {
    next_id: u64,
    observers: Vec<(u64, Subscriber)>,
    terminal: Option<Terminal>,
}

/// A hot stream that producers push into directly.
///
/// Elements go to the observers subscribed at the time of the push; there is
/// no replay. Observers subscribing after the subject terminated receive the
/// terminal signal immediately. Clones share the same subject.
#[derive(Clone, Default)]
pub struct Subject {
    state: Arc<Mutex<State>>,
}

impl Subject {
    /// Create a subject with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an element to every current observer.
    pub fn next(&self, event: TaggedEvent) {
        let observers: Vec<Subscriber> = {
            let state = self.state.lock();
            if state.terminal.is_some() {
                trace!(kind = ?event.kind(), "Dropping event pushed to terminated subject");
                return;
            }
            state.observers.iter().map(|(_, o)| o.clone()).collect()
        };

        for observer in observers {
            observer.next(event.clone());
        }
    }

    /// Terminate every observer with `error`.
    pub fn error(&self, error: TaskError) {
        for observer in self.terminate(Terminal::Errored(error.clone())) {
            observer.error(error.clone());
        }
    }

    /// Complete every observer.
    pub fn complete(&self) {
        for observer in self.terminate(Terminal::Completed) {
            observer.complete();
        }
    }

    fn terminate(&self, terminal: Terminal) -> Vec<Subscriber> {
        let mut state = self.state.lock();
        if state.terminal.is_some() {
            return Vec::new();
        }
        state.terminal = Some(terminal);
        std::mem::take(&mut state.observers)
            .into_iter()
            .map(|(_, o)| o)
            .collect()
    }

    /// Number of currently subscribed observers.
    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }
}

impl Observable for Subject {
    fn subscribe(&self, observer: Observer) -> Subscription {
        let subscriber = Subscriber::new(observer);

        let mut state = self.state.lock();
        let terminal = state.terminal.clone();
        if let Some(terminal) = terminal {
            drop(state);
            match terminal {
                Terminal::Completed => subscriber.complete(),
                Terminal::Errored(error) => subscriber.error(error),
            }
            return subscriber.subscription();
        }

        let id = state.next_id;
        state.next_id += 1;
        state.observers.push((id, subscriber.clone()));
        drop(state);

        let registry = Arc::downgrade(&self.state);
        subscriber.add(Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().observers.retain(|(observer_id, _)| *observer_id != id);
            }
        }));
        subscriber.subscription()
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Subject")
            .field("observers", &state.observers.len())
            .field("stopped", &state.terminal.is_some())
            .finish()
    }
}
