//! Error sink for listener failures.

use crate::error::ObserverError;
use crate::types::Priority;
use std::fmt;

/// Where and how a listener failed.
#[derive(Debug)]
pub struct FailureContext<'a, K> {
    /// Label of the notifying subject.
    pub subject: &'a str,
    /// Topic the listener was reached through, if any.
    pub key: Option<&'a K>,
    pub priority: Priority,
    /// Position of the listener within the batch.
    pub position: usize,
}

/// Receives one report per failed listener. Must not panic.
pub trait ErrorReporter<K>: Send + Sync {
    fn report(&self, error: &ObserverError, context: &FailureContext<'_, K>);
}

impl<K, F> ErrorReporter<K> for F
where
    F: Fn(&ObserverError, &FailureContext<'_, K>) + Send + Sync,
{
    fn report(&self, error: &ObserverError, context: &FailureContext<'_, K>) {
        self(error, context)
    }
}

/// Pin a closure to the reporter signature so its argument types are
/// inferred.
pub fn reporter_fn<K, F>(f: F) -> F
where
    F: Fn(&ObserverError, &FailureContext<'_, K>) + Send + Sync,
{
    f
}

/// Default reporter: logs each failure at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl<K: fmt::Debug> ErrorReporter<K> for TracingReporter {
    fn report(&self, error: &ObserverError, context: &FailureContext<'_, K>) {
        tracing::error!(
            subject = context.subject,
            key = ?context.key,
            priority = context.priority,
            position = context.position,
            error = %error,
            "Listener failed during notify"
        );
    }
}
