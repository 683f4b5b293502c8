//! The subject: owner of a notification registry.

use crate::dispatch::{self, BufferPool, ErrorReporter, Pending, Plan, TracingReporter};
use crate::error::{ObserverError, Result};
use crate::listeners::{Callback, Registry, SubscribeOptions};
use crate::types::{Scope, SubjectConfig, SubjectStats, Topic};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// A registry of listeners interested in one stateful owner's changes.
///
/// Listeners subscribe globally or under topic keys, optionally with a
/// priority and a predicate, and are invoked synchronously by [`notify`].
///
/// All methods take `&self`. The registry lock is never held while a
/// listener runs, so listeners may subscribe, unsubscribe, notify or dispose
/// from inside a callback. Each notification iterates a snapshot taken before
/// the first listener is called: changes made during a batch apply from the
/// next notification on.
///
/// Once [`dispose`]d, every mutating call and every notification is silently
/// ignored and all listener counts read 0.
///
/// [`notify`]: Subject::notify
/// [`dispose`]: Subject::dispose
pub struct Subject<K, V> {
    config: SubjectConfig,
    registry: Mutex<Registry<K, V>>,
    buffers: Mutex<BufferPool<Pending<K, V>>>,
    disposed: AtomicBool,
    reporter: Arc<dyn ErrorReporter<K>>,
}

impl<K: Topic, V> Subject<K, V> {
    /// Create a subject with default config that logs listener failures.
    pub fn new() -> Self {
        Self::with_config(SubjectConfig::default())
    }

    /// Create a subject with `config` that logs listener failures.
    pub fn with_config(config: SubjectConfig) -> Self {
        Self::with_reporter(config, TracingReporter)
    }

    /// Create a subject that forwards listener failures to `reporter`.
    pub fn with_reporter(config: SubjectConfig, reporter: impl ErrorReporter<K> + 'static) -> Self {
        let buffers = BufferPool::new(config.buffer_pool_capacity);
        Self {
            config,
            registry: Mutex::new(Registry::new()),
            buffers: Mutex::new(buffers),
            disposed: AtomicBool::new(false),
            reporter: Arc::new(reporter),
        }
    }

    /// Label used in logs and failure reports.
    pub fn label(&self) -> &str {
        &self.config.label
    }

    /// The config this subject was built with.
    pub fn config(&self) -> &SubjectConfig {
        &self.config
    }

    pub(crate) fn reporter(&self) -> &dyn ErrorReporter<K> {
        self.reporter.as_ref()
    }

    // --- Subscriptions ---

    /// Subscribe with priority 0 and no predicate.
    pub fn subscribe(&self, callback: Callback<K, V>, scope: &Scope<K>) {
        self.subscribe_with(callback, scope, SubscribeOptions::new());
    }

    /// Subscribe with explicit options. Re-subscribing a callback already
    /// present in a scope is a no-op for that scope.
    pub fn subscribe_with(
        &self,
        callback: Callback<K, V>,
        scope: &Scope<K>,
        options: SubscribeOptions<K, V>,
    ) {
        let _ = self.add(&callback, scope, &options);
    }

    /// Like [`subscribe_with`](Self::subscribe_with), but reports what the
    /// lenient call absorbs. Returns the number of pools the callback was
    /// added to.
    pub fn try_subscribe(
        &self,
        callback: Callback<K, V>,
        scope: &Scope<K>,
        options: SubscribeOptions<K, V>,
    ) -> Result<usize> {
        let added = self.add(&callback, scope, &options)?;
        let targeted = matches!(scope, Scope::Global) || !scope.as_slice().is_empty();
        if added == 0 && targeted {
            return Err(ObserverError::AlreadySubscribed);
        }
        Ok(added)
    }

    fn add(
        &self,
        callback: &Callback<K, V>,
        scope: &Scope<K>,
        options: &SubscribeOptions<K, V>,
    ) -> Result<usize> {
        if self.is_disposed() {
            return Err(ObserverError::Disposed);
        }
        let added = self.registry.lock().add(callback, scope, options);
        debug!(
            subject = %self.config.label,
            callback = ?callback,
            scope = ?scope,
            priority = options.priority,
            predicate = options.predicate.is_some(),
            added,
            "Subscribed"
        );
        Ok(added)
    }

    /// Remove `callback` from the pools named by `scope`. Unknown callbacks
    /// are ignored.
    pub fn unsubscribe(&self, callback: &Callback<K, V>, scope: &Scope<K>) {
        let _ = self.remove(callback, scope);
    }

    /// Like [`unsubscribe`](Self::unsubscribe), but fails when nothing was
    /// removed. Returns the number of pools the callback was removed from.
    pub fn try_unsubscribe(&self, callback: &Callback<K, V>, scope: &Scope<K>) -> Result<usize> {
        let removed = self.remove(callback, scope)?;
        if removed == 0 {
            return Err(ObserverError::NotSubscribed);
        }
        Ok(removed)
    }

    fn remove(&self, callback: &Callback<K, V>, scope: &Scope<K>) -> Result<usize> {
        if self.is_disposed() {
            return Err(ObserverError::Disposed);
        }
        let removed = self.registry.lock().remove(callback.id(), scope);
        debug!(
            subject = %self.config.label,
            callback = ?callback,
            scope = ?scope,
            removed,
            "Unsubscribed"
        );
        Ok(removed)
    }

    // --- Notification ---

    /// Notify the listeners of `scope`, including global listeners.
    pub fn notify(&self, scope: &Scope<K>, value: Option<&V>) {
        self.notify_with(scope, value, true);
    }

    /// Notify the listeners of `scope`. With `include_global` false, only
    /// topic listeners run. The global scope always reaches global
    /// listeners.
    ///
    /// Listeners run in descending priority. When global and topic listeners
    /// share a priority, global ones run first. A panicking listener is
    /// reported and the rest of the batch still runs.
    pub fn notify_with(&self, scope: &Scope<K>, value: Option<&V>, include_global: bool) {
        if self.is_disposed() {
            return;
        }

        let keys = scope.as_slice();
        let plan = {
            let mut registry = self.registry.lock();
            let mut buffers = self.buffers.lock();
            dispatch::plan(&mut registry, &mut buffers, keys, include_global)
        };

        trace!(
            subject = %self.config.label,
            scope = ?scope,
            include_global,
            path = plan.path(),
            "Notifying"
        );

        self.execute(&plan, keys, value);

        if let Plan::Buffered(buf) = plan {
            self.buffers.lock().release(buf);
        }
    }

    // --- Lifecycle ---

    /// Clear all listeners and stop accepting calls. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.registry.lock().clear();
        debug!(subject = %self.config.label, "Disposed");
    }

    /// True once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    // --- Introspection ---

    /// Listeners subscribed under `scope`.
    pub fn listener_count(&self, scope: &Scope<K>) -> usize {
        self.registry.lock().count(scope)
    }

    /// True if any pool holds a listener.
    pub fn has_listeners(&self) -> bool {
        !self.registry.lock().is_empty()
    }

    /// Snapshot of listener counts.
    pub fn stats(&self) -> SubjectStats {
        let mut stats = SubjectStats {
            label: self.config.label.clone(),
            disposed: self.is_disposed(),
            ..Default::default()
        };
        self.registry.lock().fill_stats(&mut stats);
        stats
    }
}

impl<K: Topic, V> Default for Subject<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Subject<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("label", &self.config.label)
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
