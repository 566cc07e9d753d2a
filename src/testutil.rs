use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{DispatchError, StreamError};
use crate::stream::{Sink, Time};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Notification<T> {
    Event(Time, T),
    End(Time),
    Error(Time, String),
}

pub(crate) fn stream_error(message: &str) -> StreamError {
    Arc::new(std::io::Error::new(std::io::ErrorKind::Other, message.to_string()))
}

type Hook<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Sink recording everything it receives.
///
/// Rejects notifications once it has seen `end` or `error`, like a
/// terminated consumer would.
pub(crate) struct Recorder<T> {
    notifications: Mutex<Vec<Notification<T>>>,
    hook: Mutex<Option<Hook<T>>>,
    reject: Mutex<Option<String>>,
    closed: watch::Sender<bool>,
}

impl<T> Recorder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Arc<Self> {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            notifications: Mutex::new(Vec::new()),
            hook: Mutex::new(None),
            reject: Mutex::new(None),
            closed,
        })
    }

    /// Run `hook` on every event, after it has been recorded.
    pub(crate) fn on_event<F>(&self, hook: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        *self.hook.lock() = Some(Box::new(hook));
    }

    /// Refuse every further event with `reason`.
    pub(crate) fn reject_with(&self, reason: &str) {
        *self.reject.lock() = Some(reason.to_string());
    }

    pub(crate) fn notifications(&self) -> Vec<Notification<T>> {
        self.notifications.lock().clone()
    }

    pub(crate) fn values(&self) -> Vec<T> {
        self.notifications
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Event(_, v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub(crate) async fn wait_closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    fn close(&self) {
        self.closed.send_replace(true);
    }
}

impl<T> Sink<T> for Recorder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn event(&self, time: Time, value: T) -> Result<(), DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::SinkClosed);
        }
        if let Some(reason) = self.reject.lock().clone() {
            return Err(DispatchError::Rejected(reason));
        }
        self.notifications
            .lock()
            .push(Notification::Event(time, value.clone()));
        // The hook may re-enter the hub, so no lock is held while it runs.
        let hook = self.hook.lock().take();
        if let Some(hook) = hook {
            hook(&value);
            let mut slot = self.hook.lock();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
        Ok(())
    }

    fn end(&self, time: Time) -> Result<(), DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::SinkClosed);
        }
        self.notifications.lock().push(Notification::End(time));
        self.close();
        Ok(())
    }

    fn error(&self, time: Time, err: StreamError) -> Result<(), DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::SinkClosed);
        }
        self.notifications
            .lock()
            .push(Notification::Error(time, err.to_string()));
        self.close();
        Ok(())
    }
}
