//! Owner-scoped subscriptions with deferred cleanup.
//!
//! Hosts that tie listeners to short-lived objects (widgets, sessions,
//! connections) register them through [`WeakSubscriptions`] with a handle to
//! the owning object. When the owner is dropped the listener stops running
//! immediately, and its registry entries are removed on the next scheduler
//! tick.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = Arc::new(QueueScheduler::new());
//! let table = WeakSubscriptions::new(subject.clone(), scheduler.clone());
//!
//! let widget = Arc::new(Widget::new());
//! table.subscribe(&widget, Callback::no_arg(|| redraw()), Scope::Global, SubscribeOptions::new());
//!
//! drop(widget);
//! subject.notify(&Scope::Global, None); // skipped, sweep queued
//! scheduler.run_pending();              // entry removed
//! ```

mod scheduler;
mod subscriptions;

pub use scheduler::{QueueScheduler, Scheduler, Task};
pub use subscriptions::WeakSubscriptions;
