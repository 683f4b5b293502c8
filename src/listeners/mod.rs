//! Listener storage.
//!
//! A subject keeps one [`ListenerPool`] for global listeners and one per
//! topic key. Each pool stores listeners two ways:
//! - a fast map of plain no-argument callbacks (priority 0, no predicate)
//! - a slow map of [`ListenerRecord`]s carrying priority and predicate
//!
//! Sorted iteration views are computed on demand and cached until the pool
//! changes.

mod callback;
mod pool;
mod record;
mod registry;

pub use callback::{
    Callback, KeyValueFn, KeyValueSubjectFn, NoArgFn, Predicate, SubscribeOptions, ValueFn,
};
pub use pool::{ListenerPool, RecordList, SimpleList};
pub use record::ListenerRecord;
pub(crate) use registry::Registry;
