//! Dispatch path selection and execution.
//!
//! A notification is turned into a [`Plan`] while the registry lock is held,
//! then executed with the lock released. The plan only holds snapshots
//! (cached `Arc` views or a pooled buffer), so listeners may subscribe,
//! unsubscribe or notify again without affecting the batch in progress.
//!
//! Paths, cheapest first:
//! - one pool with only simple listeners: call the cached list directly
//! - one pool with records: walk the sorted view, calling simple listeners
//!   where priority drops to 0
//! - global + topic, both simple: call both lists, global first, no merge
//! - global + topic otherwise: linear merge into a pooled buffer
//! - several topics: concatenate into a pooled buffer and stable-sort

mod buffer;
mod merge;
mod report;

pub use buffer::BufferPool;
pub use merge::{merge_descending, sort_descending};
pub use report::{reporter_fn, ErrorReporter, FailureContext, TracingReporter};

use crate::error::ObserverError;
use crate::listeners::{ListenerPool, ListenerRecord, RecordList, Registry, SimpleList};
use crate::subject::Subject;
use crate::types::{Topic, DEFAULT_PRIORITY};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// One listener queued in a merged batch.
pub(crate) struct Pending<K, V> {
    record: Arc<ListenerRecord<K, V>>,
    /// Index of the notified key this listener was reached through.
    topic: Option<usize>,
}

impl<K, V> Pending<K, V> {
    fn priority(&self) -> i32 {
        self.record.priority()
    }
}

/// Snapshot of the listeners to call for one notification.
pub(crate) enum Plan<K, V> {
    Idle,
    Pool {
        simple: SimpleList,
        slow: RecordList<K, V>,
        topic: Option<usize>,
    },
    SimplePair(SimpleList, SimpleList),
    Buffered(Vec<Pending<K, V>>),
}

impl<K, V> Plan<K, V> {
    /// Short name of the chosen path, for logging.
    pub(crate) fn path(&self) -> &'static str {
        match self {
            Plan::Idle => "idle",
            Plan::Pool { slow, .. } if slow.is_empty() => "simple",
            Plan::Pool { .. } => "pool",
            Plan::SimplePair(..) => "simple-pair",
            Plan::Buffered(_) => "buffered",
        }
    }

    fn single(pool: &mut ListenerPool<K, V>, topic: Option<usize>) -> Self {
        if pool.is_empty() {
            return Plan::Idle;
        }
        Plan::Pool {
            simple: pool.fast_list(),
            slow: pool.sorted_slow(),
            topic,
        }
    }
}

/// Select a dispatch path for `keys` and snapshot the listeners on it.
pub(crate) fn plan<K: Topic, V>(
    registry: &mut Registry<K, V>,
    buffers: &mut BufferPool<Pending<K, V>>,
    keys: &[K],
    include_global: bool,
) -> Plan<K, V> {
    match keys {
        [] => Plan::single(&mut registry.global, None),
        [key] => {
            let global = Some(&mut registry.global).filter(|g| include_global && !g.is_empty());
            let topic = registry.topics.get_mut(key).filter(|t| !t.is_empty());

            match (global, topic) {
                (None, None) => Plan::Idle,
                (Some(pool), None) | (None, Some(pool)) => Plan::single(pool, Some(0)),
                (Some(global), Some(topic)) => {
                    if global.only_simple() && topic.only_simple() {
                        return Plan::SimplePair(global.fast_list(), topic.fast_list());
                    }
                    let left = global.as_records();
                    let right = topic.as_records();
                    let mut buf = buffers.acquire();
                    buf.reserve(left.len() + right.len());
                    merge_descending(
                        left.iter().map(|r| Pending::new(r, Some(0))),
                        right.iter().map(|r| Pending::new(r, Some(0))),
                        &mut buf,
                        Pending::priority,
                    );
                    Plan::Buffered(buf)
                }
            }
        }
        _ => plan_fan_in(registry, buffers, keys, include_global),
    }
}

fn plan_fan_in<K: Topic, V>(
    registry: &mut Registry<K, V>,
    buffers: &mut BufferPool<Pending<K, V>>,
    keys: &[K],
    include_global: bool,
) -> Plan<K, V> {
    let use_global = include_global && !registry.global.is_empty();
    let topics: Vec<usize> = keys
        .iter()
        .enumerate()
        .filter(|(i, key)| !keys[..*i].contains(key))
        .filter(|(_, key)| registry.topics.get(*key).map_or(false, |p| !p.is_empty()))
        .map(|(i, _)| i)
        .collect();

    match (use_global, topics.as_slice()) {
        (false, []) => Plan::Idle,
        (true, []) => Plan::single(&mut registry.global, None),
        (false, [only]) => match registry.topics.get_mut(&keys[*only]) {
            Some(pool) => Plan::single(pool, Some(*only)),
            None => Plan::Idle,
        },
        _ => {
            let mut buf = buffers.acquire();
            if use_global {
                let records = registry.global.as_records();
                buf.extend(records.iter().map(|r| Pending::new(r, None)));
            }
            for &i in &topics {
                if let Some(pool) = registry.topics.get_mut(&keys[i]) {
                    let records = pool.as_records();
                    buf.extend(records.iter().map(|r| Pending::new(r, Some(i))));
                }
            }
            sort_descending(&mut buf, Pending::priority);
            Plan::Buffered(buf)
        }
    }
}

impl<K, V> Pending<K, V> {
    fn new(record: &Arc<ListenerRecord<K, V>>, topic: Option<usize>) -> Self {
        Self {
            record: Arc::clone(record),
            topic,
        }
    }
}

impl<K: Topic, V> Subject<K, V> {
    /// Run every listener in `plan`, isolating failures. Stops early if the
    /// subject is disposed mid-batch.
    pub(crate) fn execute(&self, plan: &Plan<K, V>, keys: &[K], value: Option<&V>) {
        let mut position = 0;
        match plan {
            Plan::Idle => {}
            Plan::Pool {
                simple,
                slow,
                topic,
            } => {
                let key = topic.map(|i| &keys[i]);
                let mut simple_done = simple.is_empty();
                for record in slow.iter() {
                    if !simple_done && record.priority() <= DEFAULT_PRIORITY {
                        if !self.call_simple(simple, key, &mut position) {
                            return;
                        }
                        simple_done = true;
                    }
                    if !self.call_record(record, key, value, &mut position) {
                        return;
                    }
                }
                if !simple_done {
                    self.call_simple(simple, key, &mut position);
                }
            }
            Plan::SimplePair(global, topic) => {
                let key = keys.first();
                if self.call_simple(global, key, &mut position) {
                    self.call_simple(topic, key, &mut position);
                }
            }
            Plan::Buffered(pending) => {
                for item in pending {
                    let key = item.topic.map(|i| &keys[i]);
                    if !self.call_record(&item.record, key, value, &mut position) {
                        return;
                    }
                }
            }
        }
    }

    fn call_simple(&self, list: &SimpleList, key: Option<&K>, position: &mut usize) -> bool {
        for callback in list.iter() {
            if self.is_disposed() {
                return false;
            }
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                self.report_failure(ObserverError::from_panic(payload), key, DEFAULT_PRIORITY, *position);
            }
            *position += 1;
        }
        true
    }

    fn call_record(
        &self,
        record: &ListenerRecord<K, V>,
        key: Option<&K>,
        value: Option<&V>,
        position: &mut usize,
    ) -> bool {
        if self.is_disposed() {
            return false;
        }
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| record.notify(key, value, self))) {
            self.report_failure(ObserverError::from_panic(payload), key, record.priority(), *position);
        }
        *position += 1;
        true
    }

    fn report_failure(&self, error: ObserverError, key: Option<&K>, priority: i32, position: usize) {
        let context = FailureContext {
            subject: self.label(),
            key,
            priority,
            position,
        };
        self.reporter().report(&error, &context);
    }
}
