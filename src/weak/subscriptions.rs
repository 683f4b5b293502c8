//! Subscriptions that end when their owner is dropped.

use super::scheduler::Scheduler;
use crate::listeners::{Callback, SubscribeOptions};
use crate::subject::Subject;
use crate::types::{CallbackId, Scope, Topic};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

type Owner = Weak<dyn Any + Send + Sync>;

struct WeakEntry<K, V> {
    owner: Owner,
    /// Id of the callback as passed in, before guarding.
    source: CallbackId,
    callback: Callback<K, V>,
    scope: Scope<K>,
}

impl<K: PartialEq, V> WeakEntry<K, V> {
    fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }

    fn matches(&self, owner: &Owner, source: CallbackId, scope: &Scope<K>) -> bool {
        self.source == source && Weak::ptr_eq(&self.owner, owner) && self.scope == *scope
    }
}

/// Lets a callback through only while its owner is alive. Once the owner is
/// gone it asks the side table for a sweep instead.
struct Gate<K, V> {
    owner: Owner,
    table: Weak<WeakSubscriptions<K, V>>,
}

impl<K: Topic + Send + 'static, V: 'static> Gate<K, V> {
    fn admit(&self) -> bool {
        if self.owner.strong_count() > 0 {
            return true;
        }
        if let Some(table) = self.table.upgrade() {
            table.schedule_sweep();
        }
        false
    }
}

/// Side table of subscriptions tied to an owner's lifetime.
///
/// Each entry holds a `Weak` handle to its owner. A callback whose owner has
/// been dropped is skipped and triggers a sweep; the sweep itself runs on the
/// [`Scheduler`], never inside a notification.
pub struct WeakSubscriptions<K, V> {
    subject: Arc<Subject<K, V>>,
    scheduler: Arc<dyn Scheduler>,
    entries: Mutex<Vec<WeakEntry<K, V>>>,
    sweep_pending: AtomicBool,
    this: Weak<WeakSubscriptions<K, V>>,
}

impl<K: Topic + Send + 'static, V: 'static> WeakSubscriptions<K, V> {
    /// Create a table over `subject` that sweeps through `scheduler`.
    pub fn new(subject: Arc<Subject<K, V>>, scheduler: Arc<dyn Scheduler>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            subject,
            scheduler,
            entries: Mutex::new(Vec::new()),
            sweep_pending: AtomicBool::new(false),
            this: this.clone(),
        })
    }

    /// The subject listeners are registered on.
    pub fn subject(&self) -> &Arc<Subject<K, V>> {
        &self.subject
    }

    /// Subscribe `callback` for as long as `owner` is alive.
    ///
    /// Returns the guarded callback actually registered; pass it to
    /// [`unsubscribe`](Self::unsubscribe) to end the subscription early.
    /// Subscribing the same callback for the same owner and scope again
    /// returns the existing guarded callback. On a disposed subject nothing
    /// is registered or tracked.
    ///
    /// Queues a sweep if any tracked owner is already gone.
    pub fn subscribe<O>(
        &self,
        owner: &Arc<O>,
        callback: Callback<K, V>,
        scope: Scope<K>,
        options: SubscribeOptions<K, V>,
    ) -> Callback<K, V>
    where
        O: Any + Send + Sync,
    {
        let owner: Owner = Arc::downgrade(owner) as Owner;
        let source = callback.id();
        let gate = Gate {
            owner: owner.clone(),
            table: self.this.clone(),
        };
        let guarded = guard(callback, gate);

        if self.subject.is_disposed() {
            return guarded;
        }

        let has_dead = {
            let mut entries = self.entries.lock();
            if let Some(existing) = entries.iter().find(|e| e.matches(&owner, source, &scope)) {
                return existing.callback.clone();
            }
            self.subject.subscribe_with(guarded.clone(), &scope, options);
            entries.push(WeakEntry {
                owner,
                source,
                callback: guarded.clone(),
                scope,
            });
            entries.iter().any(|e| !e.is_alive())
        };

        if has_dead {
            self.schedule_sweep();
        }
        guarded
    }

    /// Remove a subscription made through this table.
    pub fn unsubscribe(&self, guarded: &Callback<K, V>) -> bool {
        let id = guarded.id();
        let entry = {
            let mut entries = self.entries.lock();
            let Some(index) = entries.iter().position(|e| e.callback.id() == id) else {
                return false;
            };
            entries.swap_remove(index)
        };
        self.subject.unsubscribe(&entry.callback, &entry.scope);
        true
    }

    /// Queue a sweep unless one is already queued. Hosts may call this from
    /// their own tick to reclaim entries whose owners died on quiet scopes.
    pub fn schedule_sweep(&self) {
        if self.sweep_pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let table = self.this.clone();
        self.scheduler.schedule_soon(Box::new(move || {
            if let Some(table) = table.upgrade() {
                table.sweep();
            }
        }));
    }

    /// Unsubscribe every entry whose owner is gone. Returns how many were
    /// removed.
    pub fn sweep(&self) -> usize {
        self.sweep_pending.store(false, Ordering::SeqCst);

        let dead: Vec<WeakEntry<K, V>> = {
            let mut entries = self.entries.lock();
            let (alive, dead) = entries.drain(..).partition(WeakEntry::is_alive);
            *entries = alive;
            dead
        };

        for entry in &dead {
            self.subject.unsubscribe(&entry.callback, &entry.scope);
        }

        if !dead.is_empty() {
            warn!(
                subject = %self.subject.label(),
                removed = dead.len(),
                "Swept subscriptions of dropped owners"
            );
        } else {
            debug!(subject = %self.subject.label(), "Sweep found no dropped owners");
        }
        dead.len()
    }

    /// Entries still tracked, alive or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no entries are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Wrap `callback` so it runs only while the gate admits it. The shape is
/// preserved, so plain callbacks stay on the fast path.
fn guard<K, V>(callback: Callback<K, V>, gate: Gate<K, V>) -> Callback<K, V>
where
    K: Topic + Send + 'static,
    V: 'static,
{
    match callback {
        Callback::NoArg(f) => Callback::no_arg(move || {
            if gate.admit() {
                f()
            }
        }),
        Callback::Value(f) => Callback::value(move |value| {
            if gate.admit() {
                f(value)
            }
        }),
        Callback::KeyValue(f) => Callback::key_value(move |key, value| {
            if gate.admit() {
                f(key, value)
            }
        }),
        Callback::KeyValueSubject(f) => Callback::key_value_subject(move |key, value, subject| {
            if gate.admit() {
                f(key, value, subject)
            }
        }),
    }
}
