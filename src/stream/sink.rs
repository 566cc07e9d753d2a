//! Sink contract and the forwarding adapter

use std::sync::Arc;

use crate::error::{DispatchError, StreamError};

use super::Time;

/// Consumer side of a stream
///
/// A sink reports a failure to consume by returning an error; the producer
/// decides whether that aborts delivery to anyone else.
pub trait Sink<T>: Send + Sync {
    /// Deliver one value
    fn event(&self, time: Time, value: T) -> Result<(), DispatchError>;

    /// Signal normal completion
    fn end(&self, time: Time) -> Result<(), DispatchError>;

    /// Signal failure of the stream
    fn error(&self, time: Time, err: StreamError) -> Result<(), DispatchError>;
}

/// Pass-through sink
///
/// Forwards every notification to the inner sink unchanged. Each `Pipe` is a
/// distinct allocation, which gives every subscription its own identity in a
/// subscriber store even when the same consumer subscribes twice.
pub struct Pipe<T> {
    sink: Arc<dyn Sink<T>>,
}

impl<T> Pipe<T> {
    /// Wrap a sink
    pub fn new(sink: Arc<dyn Sink<T>>) -> Self {
        Self { sink }
    }

    /// The sink notifications are forwarded to
    pub fn inner(&self) -> &Arc<dyn Sink<T>> {
        &self.sink
    }
}

impl<T> Sink<T> for Pipe<T> {
    fn event(&self, time: Time, value: T) -> Result<(), DispatchError> {
        self.sink.event(time, value)
    }

    fn end(&self, time: Time) -> Result<(), DispatchError> {
        self.sink.end(time)
    }

    fn error(&self, time: Time, err: StreamError) -> Result<(), DispatchError> {
        self.sink.error(time, err)
    }
}
