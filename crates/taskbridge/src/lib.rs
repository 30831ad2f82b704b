//! TaskBridge
//!
//! Adapters between two shapes of asynchronous work:
//! - a [`Task`]: imperative `start()`/`cancel()` with typed callbacks
//! - an event stream: subscribe/release with [`TaggedEvent`] elements
//!
//! [`observable_from_task`] turns a task into a stream; subscribing starts
//! the task and releasing a live subscription cancels it.
//! [`task_from_observable`] turns a stream into a task; starting subscribes
//! and each element is routed to the listeners of its kind.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use taskbridge::{observable_from_task, task_from_observable};
//! use taskbridge_core::{TaggedEvent, Task};
//! use taskbridge_rx::{EventStream, Observable, Observer};
//!
//! let task = Arc::new(task_from_observable(EventStream::of(vec![
//!     TaggedEvent::status("building"),
//!     TaggedEvent::result(0),
//! ])));
//! let _status = task.on_status_change(Box::new(|s| println!("status: {}", s)));
//!
//! let subscription = observable_from_task(task.clone())
//!     .subscribe(Observer::new().on_next(|event| println!("{:?}", event)));
//! assert!(subscription.is_released());
//! ```

mod config;
mod stream_from_task;
mod task_from_stream;

#[cfg(test)]
mod test_support;

pub use config::BridgeConfig;
pub use stream_from_task::{observable_from_task, observable_from_task_with};
pub use task_from_stream::{task_from_observable, task_from_observable_with, ObservableTask};

// Re-export the contracts the adapters speak
pub use taskbridge_core::{Task, TaggedEvent};
pub use taskbridge_rx::{EventStream, Observable, Subscription};
