//! # Tidings
//!
//! An in-process observer registry: listeners subscribe to a [`Subject`]
//! globally or under topic keys, optionally with a priority and a predicate,
//! and are called synchronously in priority order when the subject notifies.
//!
//! ## Core Concepts
//!
//! - **Subject**: owns the listener pools and dispatches notifications
//! - **Callbacks**: four shapes, from no-argument to key + value + subject
//! - **Fast path**: plain no-argument listeners are stored and called without
//!   any per-listener metadata
//! - **Slow path**: listeners with a priority or predicate, kept in a lazily
//!   sorted view
//! - **Merging**: global and topic listeners are combined with a linear merge
//!   into pooled buffers
//!
//! ## Example
//!
//! ```ignore
//! use tidings::{Callback, Scope, Subject, SubscribeOptions};
//!
//! let subject: Subject<&str, f64> = Subject::new();
//!
//! subject.subscribe(Callback::no_arg(|| println!("something changed")), &Scope::Global);
//! subject.subscribe_with(
//!     Callback::key_value(|key, price| println!("{:?} -> {:?}", key, price)),
//!     &Scope::key("AAPL"),
//!     SubscribeOptions::new()
//!         .priority(10)
//!         .predicate(|_, price| price.map_or(false, |p| *p > 100.0)),
//! );
//!
//! subject.notify(&Scope::key("AAPL"), Some(&187.5));
//! ```

pub mod dispatch;
pub mod error;
pub mod listeners;
pub mod observable;
pub mod subject;
pub mod types;
pub mod weak;

// Re-exports
pub use dispatch::{
    merge_descending, reporter_fn, BufferPool, ErrorReporter, FailureContext, TracingReporter,
};
pub use error::{ObserverError, Result};
pub use listeners::{Callback, ListenerPool, ListenerRecord, Predicate, SubscribeOptions};
pub use observable::Observable;
pub use subject::Subject;
pub use types::*;
pub use weak::{QueueScheduler, Scheduler, WeakSubscriptions};
