//! A value that notifies its subject when it changes.

use crate::listeners::{Callback, SubscribeOptions};
use crate::subject::Subject;
use crate::types::{Scope, SubjectConfig, Topic};
use parking_lot::RwLock;
use std::fmt;

/// Stateful owner of a [`Subject`].
///
/// Writes store the new value, release the lock, then notify with a clone of
/// the value, so listeners may read or write the observable themselves.
pub struct Observable<K, V> {
    value: RwLock<V>,
    subject: Subject<K, V>,
}

impl<K: Topic, V: Clone + PartialEq> Observable<K, V> {
    /// Create an observable with a default subject.
    pub fn new(initial: V) -> Self {
        Self::with_subject(initial, Subject::new())
    }

    /// Create an observable whose subject uses `config`.
    pub fn with_config(initial: V, config: SubjectConfig) -> Self {
        Self::with_subject(initial, Subject::with_config(config))
    }

    /// Create an observable around an existing subject.
    pub fn with_subject(initial: V, subject: Subject<K, V>) -> Self {
        Self {
            value: RwLock::new(initial),
            subject,
        }
    }

    /// Current value.
    pub fn get(&self) -> V {
        self.value.read().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the value and notify global listeners. Returns false and
    /// skips notification when the value is unchanged or the subject is
    /// disposed.
    pub fn set(&self, value: V) -> bool {
        self.store_and_notify(value, &Scope::Global)
    }

    /// Replace the value and notify listeners of `key`, global listeners
    /// included.
    pub fn set_keyed(&self, key: K, value: V) -> bool {
        self.store_and_notify(value, &Scope::Key(key))
    }

    /// Apply `f` to the value under the write lock and notify globally if it
    /// changed. `f` must not access this observable.
    pub fn update(&self, f: impl FnOnce(&mut V)) -> bool {
        if self.subject.is_disposed() {
            return false;
        }
        let value = {
            let mut current = self.value.write();
            let before = current.clone();
            f(&mut current);
            if *current == before {
                return false;
            }
            current.clone()
        };
        self.subject.notify(&Scope::Global, Some(&value));
        true
    }

    fn store_and_notify(&self, value: V, scope: &Scope<K>) -> bool {
        if self.subject.is_disposed() {
            return false;
        }
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.subject.notify(scope, Some(&value));
        true
    }

    /// Shorthand for subscribing to global changes.
    pub fn observe(&self, callback: Callback<K, V>) {
        self.subject.subscribe(callback, &Scope::Global);
    }

    /// Subscribe with an explicit scope and options.
    pub fn observe_with(
        &self,
        callback: Callback<K, V>,
        scope: &Scope<K>,
        options: SubscribeOptions<K, V>,
    ) {
        self.subject.subscribe_with(callback, scope, options);
    }

    /// The subject notified on changes.
    pub fn subject(&self) -> &Subject<K, V> {
        &self.subject
    }

    /// Dispose the subject. Later writes are ignored.
    pub fn dispose(&self) {
        self.subject.dispose();
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Observable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.value.read())
            .field("subject", &self.subject)
            .finish()
    }
}
