//! Per-subject set of listener pools.

use super::callback::{Callback, SubscribeOptions};
use super::pool::ListenerPool;
use crate::types::{CallbackId, Scope, SubjectStats, Topic};
use std::collections::HashMap;

/// The global pool plus one pool per topic key.
///
/// Topic pools are created on first subscribe and dropped once empty.
pub struct Registry<K, V> {
    pub(crate) global: ListenerPool<K, V>,
    pub(crate) topics: HashMap<K, ListenerPool<K, V>>,
}

impl<K: Topic, V> Registry<K, V> {
    /// Create a registry with an empty global pool.
    pub fn new() -> Self {
        Self {
            global: ListenerPool::new(),
            topics: HashMap::new(),
        }
    }

    /// Add `callback` to every pool named by `scope`. Returns how many pools
    /// accepted it.
    pub fn add(
        &mut self,
        callback: &Callback<K, V>,
        scope: &Scope<K>,
        options: &SubscribeOptions<K, V>,
    ) -> usize {
        match scope {
            Scope::Global => usize::from(self.global.add(callback.clone(), options.clone())),
            Scope::Key(key) => usize::from(self.add_to_topic(key, callback, options)),
            Scope::Keys(keys) => keys
                .iter()
                .filter(|key| self.add_to_topic(key, callback, options))
                .count(),
        }
    }

    fn add_to_topic(
        &mut self,
        key: &K,
        callback: &Callback<K, V>,
        options: &SubscribeOptions<K, V>,
    ) -> bool {
        if let Some(pool) = self.topics.get_mut(key) {
            return pool.add(callback.clone(), options.clone());
        }
        let mut pool = ListenerPool::new();
        let added = pool.add(callback.clone(), options.clone());
        self.topics.insert(key.clone(), pool);
        added
    }

    /// Remove `id` from every pool named by `scope`. Returns how many pools
    /// held it.
    pub fn remove(&mut self, id: CallbackId, scope: &Scope<K>) -> usize {
        match scope {
            Scope::Global => usize::from(self.global.remove(id)),
            Scope::Key(key) => usize::from(self.remove_from_topic(key, id)),
            Scope::Keys(keys) => keys
                .iter()
                .filter(|key| self.remove_from_topic(key, id))
                .count(),
        }
    }

    fn remove_from_topic(&mut self, key: &K, id: CallbackId) -> bool {
        let Some(pool) = self.topics.get_mut(key) else {
            return false;
        };
        let removed = pool.remove(id);
        if pool.is_empty() {
            self.topics.remove(key);
        }
        removed
    }

    /// Listeners across the pools named by `scope`. Repeated keys count once.
    /// An empty key list counts the global pool, as notify does.
    pub fn count(&self, scope: &Scope<K>) -> usize {
        match scope {
            Scope::Global => self.global.len(),
            Scope::Keys(keys) if keys.is_empty() => self.global.len(),
            Scope::Key(key) => self.topics.get(key).map_or(0, ListenerPool::len),
            Scope::Keys(keys) => keys
                .iter()
                .enumerate()
                .filter(|(i, key)| !keys[..*i].contains(key))
                .map(|(_, key)| self.topics.get(key).map_or(0, ListenerPool::len))
                .sum(),
        }
    }

    /// True when no pool holds a listener.
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.topics.is_empty()
    }

    /// Remove every listener and topic.
    pub fn clear(&mut self) {
        self.global.clear();
        self.topics.clear();
    }

    /// Fill the count fields of `stats`.
    pub fn fill_stats(&self, stats: &mut SubjectStats) {
        stats.global_listeners = self.global.len();
        stats.topics = self.topics.len();
        stats.topic_listeners = self.topics.values().map(ListenerPool::len).sum();
        stats.simple_listeners = self.global.simple_len()
            + self
                .topics
                .values()
                .map(ListenerPool::simple_len)
                .sum::<usize>();
    }
}

impl<K: Topic, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_adds_to_each_topic() {
        let mut registry: Registry<&str, u32> = Registry::new();
        let cb = Callback::value(|_| {});
        let scope = Scope::keys(["a", "b", "c"]);

        assert_eq!(registry.add(&cb, &scope, &SubscribeOptions::new()), 3);
        assert_eq!(registry.count(&Scope::key("b")), 1);
        assert_eq!(registry.count(&Scope::Global), 0);

        // Already present everywhere.
        assert_eq!(registry.add(&cb, &scope, &SubscribeOptions::new()), 0);
    }

    #[test]
    fn test_empty_topic_pools_are_dropped() {
        let mut registry: Registry<&str, u32> = Registry::new();
        let cb = Callback::no_arg(|| {});
        registry.add(&cb, &Scope::key("a"), &SubscribeOptions::new());
        assert_eq!(registry.topics.len(), 1);

        assert_eq!(registry.remove(cb.id(), &Scope::key("a")), 1);
        assert!(registry.topics.is_empty());
        assert!(registry.is_empty());

        assert_eq!(registry.remove(cb.id(), &Scope::key("a")), 0);
    }

    #[test]
    fn test_count_ignores_repeated_keys() {
        let mut registry: Registry<&str, u32> = Registry::new();
        registry.add(&Callback::no_arg(|| {}), &Scope::key("a"), &SubscribeOptions::new());
        registry.add(&Callback::no_arg(|| {}), &Scope::key("b"), &SubscribeOptions::new());

        assert_eq!(registry.count(&Scope::keys(["a", "a", "b"])), 2);
        assert_eq!(registry.count(&Scope::Keys(vec![])), 0);
    }

    #[test]
    fn test_empty_key_list_counts_global_pool() {
        let mut registry: Registry<&str, u32> = Registry::new();
        registry.add(&Callback::no_arg(|| {}), &Scope::Global, &SubscribeOptions::new());
        registry.add(&Callback::no_arg(|| {}), &Scope::key("a"), &SubscribeOptions::new());

        assert_eq!(registry.count(&Scope::Keys(vec![])), 1);
        assert_eq!(registry.count(&Scope::Keys(vec![])), registry.count(&Scope::Global));
    }

    #[test]
    fn test_stats() {
        let mut registry: Registry<&str, u32> = Registry::new();
        registry.add(&Callback::no_arg(|| {}), &Scope::Global, &SubscribeOptions::new());
        registry.add(
            &Callback::value(|_| {}),
            &Scope::keys(["a", "b"]),
            &SubscribeOptions::new().priority(2),
        );

        let mut stats = SubjectStats::default();
        registry.fill_stats(&mut stats);
        assert_eq!(stats.global_listeners, 1);
        assert_eq!(stats.topics, 2);
        assert_eq!(stats.topic_listeners, 2);
        assert_eq!(stats.simple_listeners, 1);
    }
}
