//! Listener records: one subscription with its metadata.

use super::callback::{Callback, Predicate, SubscribeOptions};
use crate::subject::Subject;
use crate::types::{CallbackId, Priority, DEFAULT_PRIORITY};
use std::fmt;
use std::sync::Arc;

/// An immutable description of one subscription.
pub struct ListenerRecord<K, V> {
    callback: Callback<K, V>,
    priority: Priority,
    predicate: Option<Predicate<K, V>>,
}

impl<K, V> ListenerRecord<K, V> {
    /// Create a record from a callback and its options.
    pub fn new(callback: Callback<K, V>, options: SubscribeOptions<K, V>) -> Self {
        Self {
            callback,
            priority: options.priority,
            predicate: options.predicate,
        }
    }

    /// Record standing in for a fast-path listener during merges.
    pub(crate) fn simple(callback: Callback<K, V>) -> Self {
        Self {
            callback,
            priority: DEFAULT_PRIORITY,
            predicate: None,
        }
    }

    /// Identity of the wrapped callback.
    pub fn id(&self) -> CallbackId {
        self.callback.id()
    }

    /// Invocation rank.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The wrapped callback.
    pub fn callback(&self) -> &Callback<K, V> {
        &self.callback
    }

    /// True if a predicate gates this record.
    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Evaluate the predicate against the current notification.
    pub fn should_notify(&self, key: Option<&K>, value: Option<&V>) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(key, value),
            None => true,
        }
    }

    /// Check the predicate, then invoke. Returns whether the callback ran.
    pub(crate) fn notify(&self, key: Option<&K>, value: Option<&V>, subject: &Subject<K, V>) -> bool {
        if !self.should_notify(key, value) {
            return false;
        }
        self.callback.invoke(key, value, subject);
        true
    }
}

impl<K, V> PartialEq for ListenerRecord<K, V> {
    fn eq(&self, other: &Self) -> bool {
        let same_predicate = match (&self.predicate, &other.predicate) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.id() == other.id() && self.priority == other.priority && same_predicate
    }
}

impl<K, V> Eq for ListenerRecord<K, V> {}

impl<K, V> fmt::Debug for ListenerRecord<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("callback", &self.callback)
            .field("priority", &self.priority)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
