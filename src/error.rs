//! Dispatch error types
//!
//! Error types for delivery, selection and disposal.

use std::sync::Arc;

/// Payload carried on a stream's error channel
pub type StreamError = Arc<dyn std::error::Error + Send + Sync>;

/// Error type for dispatch operations
#[derive(Debug, Clone)]
pub enum DispatchError {
    /// The sink has already received `end` or `error`
    SinkClosed,
    /// The sink refused the notification
    Rejected(String),
    /// The selector failed to compute a routing key
    Selector(String),
    /// One or more subscribers failed during a single fan-out pass
    Fanout(Vec<DispatchError>),
    /// Releasing the upstream subscription failed
    Dispose(String),
    /// The hub behind a view or select capability no longer exists
    HubDropped,
}

impl DispatchError {
    /// Number of individual failures this error stands for
    pub fn failure_count(&self) -> usize {
        match self {
            DispatchError::Fanout(errors) => errors.iter().map(Self::failure_count).sum(),
            _ => 1,
        }
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::SinkClosed => write!(f, "Sink already terminated"),
            DispatchError::Rejected(reason) => write!(f, "Sink rejected notification: {}", reason),
            DispatchError::Selector(reason) => write!(f, "Selector failed: {}", reason),
            DispatchError::Fanout(errors) => {
                write!(f, "{} subscriber(s) failed during fan-out", errors.len())?;
                if let Some(first) = errors.first() {
                    write!(f, " (first: {})", first)?;
                }
                Ok(())
            }
            DispatchError::Dispose(reason) => write!(f, "Upstream release failed: {}", reason),
            DispatchError::HubDropped => write!(f, "Dispatch hub no longer exists"),
        }
    }
}

impl std::error::Error for DispatchError {}
