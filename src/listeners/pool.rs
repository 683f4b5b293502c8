//! Dual-storage listener pool for one notification scope.

use super::callback::{Callback, NoArgFn, SubscribeOptions};
use super::record::ListenerRecord;
use crate::types::{CallbackId, Priority, DEFAULT_PRIORITY};
use std::collections::HashMap;
use std::sync::Arc;

/// Cached, immutable view handed out for iteration.
pub type RecordList<K, V> = Arc<[Arc<ListenerRecord<K, V>>]>;

/// Cached list of fast-path callbacks.
pub type SimpleList = Arc<[NoArgFn]>;

struct FastEntry {
    seq: u64,
    callback: NoArgFn,
}

struct SlowEntry<K, V> {
    seq: u64,
    record: Arc<ListenerRecord<K, V>>,
}

/// Listeners for one scope (global, or a single topic).
///
/// Plain no-argument callbacks live in the fast map and are called without a
/// record wrapper. Everything else is a [`ListenerRecord`] in the slow map.
/// A callback lives in exactly one of the two.
///
/// Iteration views are built lazily and memoized until the next mutation.
/// Ordering: descending priority; equal priorities run in subscription
/// order; fast-path listeners count as priority 0 and run ahead of slow
/// listeners of priority 0.
pub struct ListenerPool<K, V> {
    fast: HashMap<CallbackId, FastEntry>,
    slow: HashMap<CallbackId, SlowEntry<K, V>>,
    next_seq: u64,

    fast_view: Option<SimpleList>,
    slow_view: Option<RecordList<K, V>>,
    records_view: Option<RecordList<K, V>>,
}

impl<K, V> ListenerPool<K, V> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            fast: HashMap::new(),
            slow: HashMap::new(),
            next_seq: 0,
            fast_view: None,
            slow_view: None,
            records_view: None,
        }
    }

    /// Add a listener. Returns false if the callback is already present in
    /// either storage.
    pub fn add(&mut self, callback: Callback<K, V>, options: SubscribeOptions<K, V>) -> bool {
        let id = callback.id();
        if self.contains(id) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        match callback {
            Callback::NoArg(f) if options.is_plain() => {
                self.fast.insert(id, FastEntry { seq, callback: f });
                self.fast_view = None;
            }
            callback => {
                let record = Arc::new(ListenerRecord::new(callback, options));
                self.slow.insert(id, SlowEntry { seq, record });
                self.slow_view = None;
            }
        }
        self.records_view = None;
        true
    }

    /// Remove a listener. Returns false if it was not present.
    pub fn remove(&mut self, id: CallbackId) -> bool {
        if self.fast.remove(&id).is_some() {
            self.fast_view = None;
        } else if self.slow.remove(&id).is_some() {
            self.slow_view = None;
        } else {
            return false;
        }
        self.records_view = None;
        true
    }

    /// True if `id` is in either storage.
    pub fn contains(&self, id: CallbackId) -> bool {
        self.fast.contains_key(&id) || self.slow.contains_key(&id)
    }

    /// Listeners across both storages.
    pub fn len(&self) -> usize {
        self.fast.len() + self.slow.len()
    }

    /// True when neither storage holds a listener.
    pub fn is_empty(&self) -> bool {
        self.fast.is_empty() && self.slow.is_empty()
    }

    /// Listeners on the fast path.
    pub fn simple_len(&self) -> usize {
        self.fast.len()
    }

    /// True when only fast-path listeners are present.
    pub fn only_simple(&self) -> bool {
        self.slow.is_empty() && !self.fast.is_empty()
    }

    /// Fast-path callbacks in subscription order.
    pub fn fast_list(&mut self) -> SimpleList {
        if let Some(view) = &self.fast_view {
            return Arc::clone(view);
        }

        let mut entries: Vec<&FastEntry> = self.fast.values().collect();
        entries.sort_by_key(|e| e.seq);
        let view: SimpleList = entries.into_iter().map(|e| Arc::clone(&e.callback)).collect();

        self.fast_view = Some(Arc::clone(&view));
        view
    }

    /// Slow-path records, descending priority.
    pub fn sorted_slow(&mut self) -> RecordList<K, V> {
        if let Some(view) = &self.slow_view {
            return Arc::clone(view);
        }

        let mut entries: Vec<&SlowEntry<K, V>> = self.slow.values().collect();
        entries.sort_unstable_by(|a, b| {
            b.record
                .priority()
                .cmp(&a.record.priority())
                .then(a.seq.cmp(&b.seq))
        });
        let view: RecordList<K, V> = entries.into_iter().map(|e| Arc::clone(&e.record)).collect();

        self.slow_view = Some(Arc::clone(&view));
        view
    }

    /// Every listener as a record, in dispatch order. Used when this pool has
    /// to be combined with another.
    pub fn as_records(&mut self) -> RecordList<K, V> {
        if let Some(view) = &self.records_view {
            return Arc::clone(view);
        }

        let slow = self.sorted_slow();
        let fast = self.fast_list();
        let mut records = Vec::with_capacity(slow.len() + fast.len());

        let split = slow
            .iter()
            .position(|r| r.priority() <= DEFAULT_PRIORITY)
            .unwrap_or(slow.len());
        records.extend(slow[..split].iter().cloned());
        records.extend(
            fast.iter()
                .map(|f| Arc::new(ListenerRecord::simple(Callback::NoArg(Arc::clone(f))))),
        );
        records.extend(slow[split..].iter().cloned());

        let view: RecordList<K, V> = records.into();
        self.records_view = Some(Arc::clone(&view));
        view
    }

    /// Highest priority present, treating fast-path listeners as priority 0.
    pub fn max_priority(&mut self) -> Option<Priority> {
        let slow_max = self.sorted_slow().first().map(|r| r.priority());
        let fast_max = (!self.fast.is_empty()).then_some(DEFAULT_PRIORITY);
        slow_max.max(fast_max)
    }

    /// Remove every listener and drop cached views.
    pub fn clear(&mut self) {
        self.fast.clear();
        self.slow.clear();
        self.fast_view = None;
        self.slow_view = None;
        self.records_view = None;
    }
}

impl<K, V> Default for ListenerPool<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
