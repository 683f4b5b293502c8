//! Callback shapes accepted by a subject.

use crate::subject::Subject;
use crate::types::{CallbackId, Priority, DEFAULT_PRIORITY};
use std::fmt;
use std::sync::Arc;

/// Callback taking no arguments. The only shape eligible for the fast path.
pub type NoArgFn = Arc<dyn Fn() + Send + Sync>;

/// Callback receiving the notification value.
pub type ValueFn<V> = Arc<dyn Fn(Option<&V>) + Send + Sync>;

/// Callback receiving the topic key and value.
pub type KeyValueFn<K, V> = Arc<dyn Fn(Option<&K>, Option<&V>) + Send + Sync>;

/// Callback receiving the topic key, value and the notifying subject.
pub type KeyValueSubjectFn<K, V> = Arc<dyn Fn(Option<&K>, Option<&V>, &Subject<K, V>) + Send + Sync>;

/// Filter evaluated against the live notification before each invocation.
pub type Predicate<K, V> = Arc<dyn Fn(Option<&K>, Option<&V>) -> bool + Send + Sync>;

/// A listener callback in one of the four supported shapes.
///
/// Cloning is cheap and preserves identity: a clone unsubscribes the
/// original.
pub enum Callback<K, V> {
    NoArg(NoArgFn),
    Value(ValueFn<V>),
    KeyValue(KeyValueFn<K, V>),
    KeyValueSubject(KeyValueSubjectFn<K, V>),
}

impl<K, V> Callback<K, V> {
    /// Wrap a callback that takes no arguments.
    pub fn no_arg(f: impl Fn() + Send + Sync + 'static) -> Self {
        Callback::NoArg(Arc::new(f))
    }

    /// Wrap a callback that receives the value.
    pub fn value(f: impl Fn(Option<&V>) + Send + Sync + 'static) -> Self {
        Callback::Value(Arc::new(f))
    }

    /// Wrap a callback that receives the key and value.
    pub fn key_value(f: impl Fn(Option<&K>, Option<&V>) + Send + Sync + 'static) -> Self {
        Callback::KeyValue(Arc::new(f))
    }

    /// Wrap a callback that also receives the notifying subject.
    pub fn key_value_subject(
        f: impl Fn(Option<&K>, Option<&V>, &Subject<K, V>) + Send + Sync + 'static,
    ) -> Self {
        Callback::KeyValueSubject(Arc::new(f))
    }

    /// Identity of the underlying allocation.
    pub fn id(&self) -> CallbackId {
        let ptr = match self {
            Callback::NoArg(f) => Arc::as_ptr(f) as *const () as usize,
            Callback::Value(f) => Arc::as_ptr(f) as *const () as usize,
            Callback::KeyValue(f) => Arc::as_ptr(f) as *const () as usize,
            Callback::KeyValueSubject(f) => Arc::as_ptr(f) as *const () as usize,
        };
        CallbackId(ptr)
    }

    /// True for the no-argument shape.
    pub fn is_no_arg(&self) -> bool {
        matches!(self, Callback::NoArg(_))
    }

    /// Invoke with the shape-appropriate arguments.
    pub(crate) fn invoke(&self, key: Option<&K>, value: Option<&V>, subject: &Subject<K, V>) {
        match self {
            Callback::NoArg(f) => f(),
            Callback::Value(f) => f(value),
            Callback::KeyValue(f) => f(key, value),
            Callback::KeyValueSubject(f) => f(key, value, subject),
        }
    }
}

impl<K, V> Clone for Callback<K, V> {
    fn clone(&self) -> Self {
        match self {
            Callback::NoArg(f) => Callback::NoArg(Arc::clone(f)),
            Callback::Value(f) => Callback::Value(Arc::clone(f)),
            Callback::KeyValue(f) => Callback::KeyValue(Arc::clone(f)),
            Callback::KeyValueSubject(f) => Callback::KeyValueSubject(Arc::clone(f)),
        }
    }
}

impl<K, V> fmt::Debug for Callback<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Callback::NoArg(_) => "NoArg",
            Callback::Value(_) => "Value",
            Callback::KeyValue(_) => "KeyValue",
            Callback::KeyValueSubject(_) => "KeyValueSubject",
        };
        write!(f, "Callback::{}({:?})", shape, self.id())
    }
}

/// Per-subscription metadata.
pub struct SubscribeOptions<K, V> {
    pub priority: Priority,
    pub predicate: Option<Predicate<K, V>>,
}

impl<K, V> SubscribeOptions<K, V> {
    /// Options with priority 0 and no predicate.
    pub fn new() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            predicate: None,
        }
    }

    /// Set the priority. Higher runs earlier.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Only notify when `predicate` accepts the key and value.
    pub fn predicate(
        mut self,
        predicate: impl Fn(Option<&K>, Option<&V>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// True when these options carry no metadata at all.
    pub fn is_plain(&self) -> bool {
        self.priority == DEFAULT_PRIORITY && self.predicate.is_none()
    }
}

impl<K, V> Default for SubscribeOptions<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for SubscribeOptions<K, V> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            predicate: self.predicate.clone(),
        }
    }
}
