//! Stream-from-Task adapter.
//!
//! Subscribing the stream starts the task; the task's notifications become
//! tagged stream elements; releasing the subscription while the task is
//! still running cancels it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use taskbridge_core::{BridgeId, Disposable, TaggedEvent, Task};
use taskbridge_rx::{EventStream, Subscriber, Subscription};
use tracing::{debug, trace, warn};

use crate::config::BridgeConfig;

/// Wrap a task as a stream of tagged events.
///
/// See [`observable_from_task_with`].
pub fn observable_from_task(task: Arc<dyn Task>) -> EventStream {
    observable_from_task_with(task, BridgeConfig::default())
}

/// Wrap a task as a stream of tagged events, with explicit configuration.
///
/// The stream is single-use: the first subscription starts the task, any
/// later subscription completes immediately without touching the task.
///
/// # Example
///
/// ```rust,ignore
/// let stream = observable_from_task(Arc::new(my_task));
/// let subscription = stream.subscribe(
///     Observer::new()
///         .on_next(|event| println!("{:?}", event))
///         .on_complete(|| println!("done")),
/// );
/// // Cancels the task if it is still running.
/// subscription.release();
/// ```
pub fn observable_from_task_with(task: Arc<dyn Task>, config: BridgeConfig) -> EventStream {
    let id = BridgeId::generate();
    let config = Arc::new(config);
    let subscribed = AtomicBool::new(false);

    EventStream::new(move |subscriber| {
        if subscribed.swap(true, Ordering::SeqCst) {
            warn!(
                bridge_id = %id,
                name = config.label(),
                "Task-backed stream subscribed more than once; completing without restarting the task"
            );
            subscriber.complete();
            return Subscription::empty();
        }
        run_task(&task, subscriber, &id, &config)
    })
}

fn run_task(
    task: &Arc<dyn Task>,
    subscriber: Subscriber,
    id: &BridgeId,
    config: &BridgeConfig,
) -> Subscription {
    // Set by whichever comes first: completion, error, or release.
    let finished = Arc::new(AtomicBool::new(false));
    let mut listeners: Vec<Disposable> = Vec::with_capacity(6);

    let forward: Arc<dyn Fn(TaggedEvent) + Send + Sync> = {
        let subscriber = subscriber.clone();
        let finished = Arc::clone(&finished);
        let id = id.clone();
        let log_late_events = config.log_late_events;
        Arc::new(move |event: TaggedEvent| {
            if finished.load(Ordering::SeqCst) {
                if log_late_events {
                    debug!(bridge_id = %id, kind = ?event.kind(), "Task emitted after finishing; dropped");
                } else {
                    trace!(bridge_id = %id, kind = ?event.kind(), "Task emitted after finishing; dropped");
                }
                return;
            }
            trace!(bridge_id = %id, kind = ?event.kind(), "Forwarding task event");
            subscriber.next(event);
        })
    };

    let f = Arc::clone(&forward);
    listeners.extend(task.on_message(Box::new(move |message| {
        f(TaggedEvent::message(message.clone()))
    })));
    let f = Arc::clone(&forward);
    listeners.extend(task.on_progress(Box::new(move |progress| {
        f(TaggedEvent::progress(progress))
    })));
    let f = Arc::clone(&forward);
    listeners.extend(task.on_result(Box::new(move |result| {
        f(TaggedEvent::result(result.clone()))
    })));
    let f = forward;
    listeners.extend(task.on_status_change(Box::new(move |status| {
        f(TaggedEvent::status(status))
    })));

    {
        let subscriber = subscriber.clone();
        let finished = Arc::clone(&finished);
        let id = id.clone();
        listeners.push(task.on_did_complete(Box::new(move || {
            if finished.swap(true, Ordering::SeqCst) {
                trace!(bridge_id = %id, "Ignoring completion after finish");
                return;
            }
            debug!(bridge_id = %id, "Task completed");
            subscriber.complete();
        })));
    }

    {
        let subscriber = subscriber.clone();
        let finished = Arc::clone(&finished);
        let id = id.clone();
        listeners.push(task.on_did_error(Box::new(move |error| {
            if finished.swap(true, Ordering::SeqCst) {
                trace!(bridge_id = %id, error = %error, "Ignoring error after finish");
                return;
            }
            debug!(bridge_id = %id, error = %error, "Task errored");
            subscriber.error(error.clone());
        })));
    }

    let teardown = {
        let task = Arc::clone(task);
        let id = id.clone();
        Subscription::new(move || {
            for mut listener in listeners {
                listener.dispose();
            }
            if !finished.swap(true, Ordering::SeqCst) {
                debug!(bridge_id = %id, "Subscription released while task running; canceling task");
                task.cancel();
            }
        })
    };

    debug!(bridge_id = %id, name = config.label(), "Starting task");
    task.start();

    teardown
}
