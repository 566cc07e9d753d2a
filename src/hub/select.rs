//! Key selection
//!
//! [`KeyView`] is what `select(key)` produces: a source that registers with the
//! hub only when it is run. [`Dispatched`] is what wildcard subscribers receive
//! for every event: the value plus a [`Select`] capability bound to the hub.

use std::sync::Arc;

use crate::stream::{Disposable, Pipe, Scheduler, Sink, Source};
use crate::store::{RouteKey, Subscriber};

use super::core::Registry;

/// Opens key views on a hub
pub struct Select<T, K> {
    hub: Arc<dyn Registry<T, K>>,
}

impl<T, K> Select<T, K> {
    pub(crate) fn new(hub: Arc<dyn Registry<T, K>>) -> Self {
        Self { hub }
    }

    /// A source of the events routed to `key`
    pub fn select(&self, key: K) -> KeyView<T, K> {
        KeyView {
            hub: Arc::clone(&self.hub),
            key,
        }
    }
}

impl<T, K> Clone for Select<T, K> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<T, K> std::fmt::Debug for Select<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select").finish_non_exhaustive()
    }
}

/// An event as seen by a wildcard subscriber
pub struct Dispatched<T, K> {
    value: T,
    select: Select<T, K>,
}

impl<T, K> Dispatched<T, K> {
    pub(crate) fn new(value: T, select: Select<T, K>) -> Self {
        Self { value, select }
    }

    /// The upstream event
    pub fn value(&self) -> &T {
        &self.value
    }

    /// A source of the events routed to `key` by the same hub
    pub fn select(&self, key: K) -> KeyView<T, K> {
        self.select.select(key)
    }

    /// The select capability, detached from the event
    pub fn selector(&self) -> &Select<T, K> {
        &self.select
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Select<T, K>) {
        (self.value, self.select)
    }
}

impl<T: Clone, K> Clone for Dispatched<T, K> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            select: self.select.clone(),
        }
    }
}

impl<T: std::fmt::Debug, K> std::fmt::Debug for Dispatched<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatched")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// The events of one routing key
///
/// Not a live subscription: nothing is registered until the view is run, and
/// every run creates its own, independently disposable registration.
pub struct KeyView<T, K> {
    hub: Arc<dyn Registry<T, K>>,
    key: K,
}

impl<T, K> KeyView<T, K> {
    /// The routing key this view follows
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<T, K: Clone> Clone for KeyView<T, K> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            key: self.key.clone(),
        }
    }
}

impl<T, K: std::fmt::Debug> std::fmt::Debug for KeyView<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyView").field("key", &self.key).finish()
    }
}

impl<T, K> Source<T> for KeyView<T, K>
where
    T: Send + Sync + 'static,
    K: Clone + Send + Sync + 'static,
{
    fn run(&self, sink: Arc<dyn Sink<T>>, scheduler: &Arc<dyn Scheduler>) -> Box<dyn Disposable> {
        let subscriber = Subscriber::keyed(Arc::new(Pipe::new(sink)));
        Box::new(
            self.hub
                .add(subscriber, RouteKey::Key(self.key.clone()), scheduler),
        )
    }
}
