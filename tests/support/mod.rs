//! Shared sinks for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use keyed_dispatch::{DispatchError, Sink, StreamError, Time};
use parking_lot::Mutex;
use tokio::sync::watch;

type Hook<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Route hub logs to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sink collecting timestamped events until the stream ends
pub struct Collector<T> {
    events: Mutex<Vec<(Time, T)>>,
    hook: Mutex<Option<Hook<T>>>,
    failure: Mutex<Option<String>>,
    closed: watch::Sender<bool>,
}

impl<T: Clone + Send + Sync + 'static> Collector<T> {
    pub fn new() -> Arc<Self> {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            hook: Mutex::new(None),
            failure: Mutex::new(None),
            closed,
        })
    }

    pub fn on_event<F>(&self, hook: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        *self.hook.lock() = Some(Box::new(hook));
    }

    pub fn events(&self) -> Vec<(Time, T)> {
        self.events.lock().clone()
    }

    pub fn values(&self) -> Vec<T> {
        self.events.lock().iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl<T: Clone + Send + Sync + 'static> Sink<T> for Collector<T> {
    fn event(&self, time: Time, value: T) -> Result<(), DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::SinkClosed);
        }
        self.events.lock().push((time, value.clone()));
        if let Some(hook) = self.hook.lock().as_ref() {
            hook(&value);
        }
        Ok(())
    }

    fn end(&self, _time: Time) -> Result<(), DispatchError> {
        self.closed.send_replace(true);
        Ok(())
    }

    fn error(&self, _time: Time, err: StreamError) -> Result<(), DispatchError> {
        *self.failure.lock() = Some(err.to_string());
        self.closed.send_replace(true);
        Ok(())
    }
}
