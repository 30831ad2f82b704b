//! TaskBridge Core Types
//!
//! This crate contains the shared vocabulary of the bridge between
//! imperative tasks and reactive event streams:
//! - The tagged event type multiplexed onto streams
//! - The task contract and its lifecycle states
//! - Listener registries used to fan events out to callbacks
//!
//! Nothing here knows about subscriptions or operators; see `taskbridge-rx`.

pub mod disposable;
pub mod emitter;
pub mod error;
pub mod event;
pub mod ids;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use disposable::Disposable;
pub use emitter::{Listeners, TaskEmitter};
pub use error::TaskError;
pub use event::{EventKind, Message, MessageLevel, TaggedEvent};
pub use ids::BridgeId;
pub use status::TaskStatus;
pub use task::{
    CompleteListener, ErrorListener, MessageListener, ProgressListener, ResultListener,
    StatusListener, Task,
};
