//! Bridge from push-based streams to async pull-based consumers.

use std::pin::Pin;
use std::task::{Context, Poll};

use taskbridge_core::{TaggedEvent, TaskError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::observable::{EventStream, Observable};
use crate::observer::Observer;
use crate::subscription::Subscription;

enum Signal {
    Next(TaggedEvent),
    Error(TaskError),
    Complete,
    Released,
}

/// An async [`Stream`] over the elements of a subscribed observable.
///
/// Yields `Ok(event)` per element, then ends after completion, or after
/// yielding one `Err` on error. A source that never terminates keeps the
/// receiver pending until [`release`](Self::release) is called. Dropping the
/// receiver releases the underlying subscription.
///
/// # Example
///
/// ```rust,no_run
/// use taskbridge_core::TaggedEvent;
/// use taskbridge_rx::EventStream;
///
/// async fn drain() {
///     let mut events = EventStream::of(vec![TaggedEvent::status("ready")]).into_receiver();
///     while let Some(event) = events.recv().await {
///         println!("{:?}", event);
///     }
/// }
/// ```
pub struct EventReceiver {
    signals: UnboundedReceiverStream<Signal>,
    subscription: Subscription,
    done: bool,
}

impl EventReceiver {
    /// Subscribe to `source`, buffering its signals for async consumption.
    pub fn new<O: Observable + ?Sized>(source: &O) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let next_tx = tx.clone();
        let error_tx = tx.clone();
        let release_tx = tx.clone();

        // Send failures mean the receiver is gone; the subscription is released on drop.
        let subscription = source.subscribe(
            Observer::new()
                .on_next(move |event| {
                    let _ = next_tx.send(Signal::Next(event));
                })
                .on_error(move |err| {
                    let _ = error_tx.send(Signal::Error(err));
                })
                .on_complete(move || {
                    let _ = tx.send(Signal::Complete);
                }),
        );
        // The channel only closes once this runs, whatever the producer keeps.
        subscription.add_teardown(move || {
            let _ = release_tx.send(Signal::Released);
        });

        Self {
            signals: UnboundedReceiverStream::new(rx),
            subscription,
            done: false,
        }
    }

    /// Receive the next element, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<TaggedEvent, TaskError>> {
        self.next().await
    }

    /// Release the subscription early. Buffered elements can still be drained.
    pub fn release(&self) {
        self.subscription.release();
    }

    /// The subscription backing this receiver.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Stream for EventReceiver {
    type Item = Result<TaggedEvent, TaskError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.signals).poll_next(cx) {
            Poll::Ready(Some(Signal::Next(event))) => Poll::Ready(Some(Ok(event))),
            Poll::Ready(Some(Signal::Error(err))) => {
                this.done = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(Some(Signal::Complete | Signal::Released)) | Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for EventReceiver {
    fn drop(&mut self) {
        self.subscription.release();
    }
}

impl EventStream {
    /// Subscribe and consume the stream asynchronously.
    pub fn into_receiver(self) -> EventReceiver {
        EventReceiver::new(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Subject;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drains_until_complete() {
        let mut events = EventStream::of(vec![
            TaggedEvent::progress(Some(0.5)),
            TaggedEvent::result(serde_json::json!({"exit_code": 0})),
        ])
        .into_receiver();

        assert_eq!(events.recv().await.unwrap().unwrap(), TaggedEvent::progress(Some(0.5)));
        assert_eq!(
            events.recv().await.unwrap().unwrap(),
            TaggedEvent::result(serde_json::json!({"exit_code": 0}))
        );
        assert!(events.recv().await.is_none());
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_yields_error_once_then_ends() {
        let mut events = EventStream::throw(TaskError::failed("no device")).into_receiver();

        let err = events.recv().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Task failed: no device");
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_receives_pushes_from_another_task() {
        let subject = Subject::new();
        let mut events = EventReceiver::new(&subject);

        let producer = subject.clone();
        tokio::spawn(async move {
            producer.next(TaggedEvent::status("compiling"));
            producer.complete();
        })
        .await
        .unwrap();

        assert_eq!(events.recv().await.unwrap().unwrap(), TaggedEvent::status("compiling"));
        assert!(events.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_until_released_when_source_never_ends() {
        let mut events = EventStream::never().into_receiver();

        let waited = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
        assert!(waited.is_err());

        events.release();
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_release_drains_buffered_events_first() {
        let subject = Subject::new();
        let mut events = EventReceiver::new(&subject);
        subject.next(TaggedEvent::status("queued"));

        events.release();
        assert_eq!(events.recv().await.unwrap().unwrap(), TaggedEvent::status("queued"));
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let subject = Subject::new();
        let events = EventReceiver::new(&subject);
        assert_eq!(subject.observer_count(), 1);

        drop(events);
        assert_eq!(subject.observer_count(), 0);
    }
}
