//! Core types for the observer registry.

use crate::error::{ObserverError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Invocation rank. Higher values run earlier.
pub type Priority = i32;

/// Priority given to listeners subscribed without options.
pub const DEFAULT_PRIORITY: Priority = 0;

/// Default number of reusable dispatch buffers kept per subject.
pub const DEFAULT_BUFFER_POOL_CAPACITY: usize = 4;

/// Any value usable as a topic key.
pub trait Topic: Eq + Hash + Clone + fmt::Debug {}

impl<T: Eq + Hash + Clone + fmt::Debug> Topic for T {}

/// Identity of a callback: the address of its shared allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub(crate) usize);

impl fmt::Debug for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackId({:#x})", self.0)
    }
}

/// Which listener pools an operation addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope<K> {
    /// The global pool.
    Global,
    /// A single topic pool.
    Key(K),
    /// Several topic pools at once. An empty list addresses the global pool
    /// for notify and counts, and nothing for subscribe and unsubscribe.
    Keys(Vec<K>),
}

impl<K> Scope<K> {
    /// Scope for a single topic.
    pub fn key(key: K) -> Self {
        Scope::Key(key)
    }

    /// Scope for several topics.
    pub fn keys(keys: impl IntoIterator<Item = K>) -> Self {
        Scope::Keys(keys.into_iter().collect())
    }

    /// The topic keys named by this scope. Empty for the global scope.
    pub fn as_slice(&self) -> &[K] {
        match self {
            Scope::Global => &[],
            Scope::Key(key) => std::slice::from_ref(key),
            Scope::Keys(keys) => keys,
        }
    }

    /// True for the global scope and for an empty key list.
    pub fn is_global(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl<K> Default for Scope<K> {
    fn default() -> Self {
        Scope::Global
    }
}

impl<K> From<Vec<K>> for Scope<K> {
    fn from(keys: Vec<K>) -> Self {
        Scope::Keys(keys)
    }
}

impl<K> From<Option<K>> for Scope<K> {
    fn from(key: Option<K>) -> Self {
        match key {
            Some(key) => Scope::Key(key),
            None => Scope::Global,
        }
    }
}

/// Subject configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectConfig {
    /// Name used in log lines and failure reports.
    /// Default: "subject"
    pub label: String,

    /// Max merge buffers retained for reuse.
    /// Default: 4
    pub buffer_pool_capacity: usize,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            label: "subject".to_string(),
            buffer_pool_capacity: DEFAULT_BUFFER_POOL_CAPACITY,
        }
    }
}

impl SubjectConfig {
    /// Config with the given label and default everything else.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SubjectConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config for values a subject cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(ObserverError::InvalidConfig(
                "label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time listener counts for a subject.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubjectStats {
    pub label: String,
    pub disposed: bool,
    /// Listeners in the global pool.
    pub global_listeners: usize,
    /// Number of topics with at least one listener.
    pub topics: usize,
    /// Listeners across all topic pools.
    pub topic_listeners: usize,
    /// Listeners stored on the zero-metadata path, all pools.
    pub simple_listeners: usize,
}
