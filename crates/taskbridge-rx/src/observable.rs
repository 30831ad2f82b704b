//! The stream contract and the closure-backed `EventStream`.

use std::fmt;
use std::sync::Arc;

use taskbridge_core::{TaggedEvent, TaskError};

use crate::observer::{Observer, Subscriber};
use crate::subscription::Subscription;

/// A push-based source of [`TaggedEvent`]s terminated by completion or error.
///
/// Implementations may be cold (each subscription runs the producer anew) or
/// hot (subscriptions share one live source). Consumers must not assume
/// either.
pub trait Observable: Send + Sync {
    /// Attach an observer. The returned subscription stops delivery when released.
    fn subscribe(&self, observer: Observer) -> Subscription;
}

impl<O: Observable + ?Sized> Observable for Arc<O> {
    fn subscribe(&self, observer: Observer) -> Subscription {
        (**self).subscribe(observer)
    }
}

type Producer = dyn Fn(Subscriber) -> Subscription + Send + Sync;

/// A cold stream defined by a producer closure.
///
/// The producer runs once per subscription. It pushes into the given
/// [`Subscriber`] and returns a subscription whose release tears down
/// whatever it set up.
///
/// # Example
///
/// ```rust
/// use taskbridge_core::TaggedEvent;
/// use taskbridge_rx::{EventStream, Observable, Observer, Subscription};
///
/// let stream = EventStream::new(|subscriber| {
///     subscriber.next(TaggedEvent::status("working"));
///     subscriber.complete();
///     Subscription::empty()
/// });
///
/// let subscription = stream
///     .map(|event| event)
///     .subscribe(Observer::new().on_complete(|| println!("done")));
/// assert!(subscription.is_released());
/// ```
#[derive(Clone)]
pub struct EventStream {
    producer: Arc<Producer>,
}

impl EventStream {
    /// Create a stream from a producer closure.
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn(Subscriber) -> Subscription + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
        }
    }

    /// A stream that completes immediately.
    pub fn empty() -> Self {
        Self::new(|subscriber| {
            subscriber.complete();
            Subscription::empty()
        })
    }

    /// A stream that never emits nor terminates.
    pub fn never() -> Self {
        Self::new(|_| Subscription::empty())
    }

    /// A stream that emits `events` in order and then completes.
    pub fn of(events: impl IntoIterator<Item = TaggedEvent>) -> Self {
        let events: Arc<[TaggedEvent]> = events.into_iter().collect();
        Self::new(move |subscriber| {
            for event in events.iter() {
                if subscriber.is_closed() {
                    break;
                }
                subscriber.next(event.clone());
            }
            subscriber.complete();
            Subscription::empty()
        })
    }

    /// A stream that errors immediately with `error`.
    pub fn throw(error: TaskError) -> Self {
        Self::new(move |subscriber| {
            subscriber.error(error.clone());
            Subscription::empty()
        })
    }

    /// View any observable as an `EventStream`, to chain operators on it.
    pub fn from_observable<O>(source: O) -> Self
    where
        O: Observable + 'static,
    {
        Self::new(move |subscriber| source.subscribe(subscriber.as_observer()))
    }

    /// Transform every element.
    pub fn map<F>(&self, f: F) -> EventStream
    where
        F: Fn(TaggedEvent) -> TaggedEvent + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        EventStream::new(move |downstream| {
            let f = Arc::clone(&f);
            let next = downstream.clone();
            let error = downstream.clone();
            source.subscribe(
                Observer::new()
                    .on_next(move |event| next.next(f(event)))
                    .on_error(move |err| error.error(err))
                    .on_complete(move || downstream.complete()),
            )
        })
    }

    /// Keep only elements matching `predicate`.
    pub fn filter<F>(&self, predicate: F) -> EventStream
    where
        F: Fn(&TaggedEvent) -> bool + Send + Sync + 'static,
    {
        let source = self.clone();
        let predicate = Arc::new(predicate);
        EventStream::new(move |downstream| {
            let predicate = Arc::clone(&predicate);
            let next = downstream.clone();
            let error = downstream.clone();
            source.subscribe(
                Observer::new()
                    .on_next(move |event| {
                        if predicate(&event) {
                            next.next(event);
                        }
                    })
                    .on_error(move |err| error.error(err))
                    .on_complete(move || downstream.complete()),
            )
        })
    }

    /// On error, continue with the stream returned by `handler`.
    ///
    /// The failed source is released before the fallback is subscribed.
    pub fn catch_error<F>(&self, handler: F) -> EventStream
    where
        F: Fn(TaskError) -> EventStream + Send + Sync + 'static,
    {
        let source = self.clone();
        let handler = Arc::new(handler);
        EventStream::new(move |downstream| {
            let handler = Arc::clone(&handler);
            let next = downstream.clone();
            let complete = downstream.clone();
            source.subscribe(
                Observer::new()
                    .on_next(move |event| next.next(event))
                    .on_error(move |err| {
                        let fallback = handler(err);
                        let inner = fallback.subscribe(downstream.as_observer());
                        downstream.add(inner);
                    })
                    .on_complete(move || complete.complete()),
            )
        })
    }
}

impl Observable for EventStream {
    fn subscribe(&self, observer: Observer) -> Subscription {
        let subscriber = Subscriber::new(observer);
        let teardown = (self.producer)(subscriber.clone());
        subscriber.add(teardown);
        subscriber.subscription()
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collect(stream: &EventStream) -> (Arc<Mutex<Vec<String>>>, Subscription) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (n, e, c) = (log.clone(), log.clone(), log.clone());
        let subscription = stream.subscribe(
            Observer::new()
                .on_next(move |event| n.lock().push(serde_json::to_string(&event).unwrap()))
                .on_error(move |err| e.lock().push(format!("error: {err}")))
                .on_complete(move || c.lock().push("complete".to_string())),
        );
        (log, subscription)
    }

    #[test]
    fn test_of_emits_then_completes() {
        let stream = EventStream::of(vec![TaggedEvent::result(42), TaggedEvent::status("ok")]);
        let (log, subscription) = collect(&stream);

        assert_eq!(
            *log.lock(),
            vec![
                r#"{"type":"result","result":42}"#.to_string(),
                r#"{"type":"status","status":"ok"}"#.to_string(),
                "complete".to_string(),
            ]
        );
        assert!(subscription.is_released());
    }

    #[test]
    fn test_cold_stream_runs_producer_per_subscription() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let stream = EventStream::new(move |subscriber| {
            r.fetch_add(1, Ordering::SeqCst);
            subscriber.complete();
            Subscription::empty()
        });

        stream.subscribe(Observer::new());
        stream.subscribe(Observer::new());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_release_runs_producer_teardown() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let td = torn_down.clone();
        let stream = EventStream::new(move |_| {
            let td = td.clone();
            Subscription::new(move || {
                td.fetch_add(1, Ordering::SeqCst);
            })
        });

        let subscription = stream.subscribe(Observer::new());
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);
        subscription.release();
        subscription.release();
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_map_and_filter() {
        let stream = EventStream::of(vec![
            TaggedEvent::progress(Some(0.25)),
            TaggedEvent::status("halfway"),
            TaggedEvent::progress(Some(0.5)),
        ])
        .filter(|event| matches!(event, TaggedEvent::Progress { .. }))
        .map(|event| match event {
            TaggedEvent::Progress { progress } => TaggedEvent::progress(progress.map(|p| p * 2.0)),
            other => other,
        });

        let (log, _) = collect(&stream);
        assert_eq!(
            *log.lock(),
            vec![
                r#"{"type":"progress","progress":0.5}"#.to_string(),
                r#"{"type":"progress","progress":1.0}"#.to_string(),
                "complete".to_string(),
            ]
        );
    }

    #[test]
    fn test_catch_error_switches_to_fallback() {
        let stream = EventStream::throw(TaskError::failed("adb offline"))
            .catch_error(|err| EventStream::of(vec![TaggedEvent::status(err.to_string())]));

        let (log, _) = collect(&stream);
        assert_eq!(
            *log.lock(),
            vec![
                r#"{"type":"status","status":"Task failed: adb offline"}"#.to_string(),
                "complete".to_string(),
            ]
        );
    }

    #[test]
    fn test_throw_propagates_through_map() {
        let stream = EventStream::throw(TaskError::failed("boom")).map(|e| e);
        let (log, subscription) = collect(&stream);
        assert_eq!(*log.lock(), vec!["error: Task failed: boom".to_string()]);
        assert!(subscription.is_released());
    }

    #[test]
    fn test_release_propagates_upstream() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let td = torn_down.clone();
        let stream = EventStream::new(move |_| {
            let td = td.clone();
            Subscription::new(move || {
                td.fetch_add(1, Ordering::SeqCst);
            })
        })
        .map(|e| e)
        .catch_error(|_| EventStream::empty());

        let subscription = stream.subscribe(Observer::new());
        subscription.release();
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_never_stays_open() {
        let (log, subscription) = collect(&EventStream::never());
        assert!(log.lock().is_empty());
        assert!(!subscription.is_released());
    }

    #[test]
    fn test_from_observable_chains_operators_on_a_subject() {
        let subject = crate::subject::Subject::new();
        let stream = EventStream::from_observable(subject.clone())
            .map(|event| match event {
                TaggedEvent::Status { status } => TaggedEvent::status(status.to_uppercase()),
                other => other,
            });

        let (log, subscription) = collect(&stream);
        assert_eq!(subject.observer_count(), 1);

        subject.next(TaggedEvent::status("flashing"));
        subject.complete();

        assert_eq!(
            *log.lock(),
            vec![
                r#"{"type":"status","status":"FLASHING"}"#.to_string(),
                "complete".to_string(),
            ]
        );
        assert!(subscription.is_released());
        assert_eq!(subject.observer_count(), 0);
    }
}
