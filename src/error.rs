//! Error types for the observer registry.

use thiserror::Error;

/// Main error type for registry operations.
///
/// The lenient subject API never returns these; they surface through the
/// strict `try_*` variants and through the error reporter during dispatch.
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("Listener panicked: {0}")]
    ListenerPanicked(String),

    #[error("Subject is disposed")]
    Disposed,

    #[error("Callback already subscribed for this scope")]
    AlreadySubscribed,

    #[error("Callback not subscribed for this scope")]
    NotSubscribed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ObserverError {
    fn from(e: serde_json::Error) -> Self {
        ObserverError::InvalidConfig(e.to_string())
    }
}

impl ObserverError {
    /// Build a `ListenerPanicked` error from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        ObserverError::ListenerPanicked(message)
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, ObserverError>;
