//! Push-based event streams for TaskBridge.
//!
//! A small reactive core specialised to [`TaggedEvent`] elements and
//! [`TaskError`] failures:
//! - [`Observable`]: the subscribe contract
//! - [`Subscription`]: idempotent release handle with teardown chains
//! - [`EventStream`]: cold, closure-backed stream with `map`, `filter`, `catch_error`
//! - [`Subject`]: hot multicast source
//! - [`EventReceiver`]: async `Stream` adapter over tokio channels
//!
//! All delivery is synchronous on the pushing thread; nothing here spawns.
//!
//! [`TaggedEvent`]: taskbridge_core::TaggedEvent
//! [`TaskError`]: taskbridge_core::TaskError

mod observable;
mod observer;
mod receiver;
mod subject;
mod subscription;

pub use observable::{EventStream, Observable};
pub use observer::{Observer, Subscriber};
pub use receiver::EventReceiver;
pub use subject::Subject;
pub use subscription::Subscription;
