//! Subscriber stores
//!
//! A store is a multi-map from routing key to the subscribers registered under
//! it. The hub only talks to the [`SubscriberStore`] trait, so the backing
//! structure can be swapped for keys that need a different notion of equality.
//!
//! ```text
//!   RouteKey::Wildcard ──► [ s1, s4 ]        receives Dispatched<T, K>
//!   RouteKey::Key(3)   ──► [ s2 ]            receives T
//!   RouteKey::Key(5)   ──► [ s3, s5, s6 ]    receives T
//!
//!   len = 6  (maintained on every add/remove, never recounted)
//! ```

pub mod hash;
pub mod linear;

pub use hash::HashStore;
pub use linear::LinearStore;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DispatchError, StreamError};
use crate::hub::{Dispatched, Select};
use crate::stream::{Sink, Time};

/// Key a subscriber is registered under
///
/// `Wildcard` is the reserved "everything" key. It is a separate variant, so no
/// value a selector produces can ever be equal to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteKey<K> {
    /// Subscribed to every event
    Wildcard,
    /// Subscribed to events whose selector output equals this key
    Key(K),
}

impl<K> RouteKey<K> {
    /// The routing key, or `None` for the wildcard
    pub fn key(&self) -> Option<&K> {
        match self {
            RouteKey::Wildcard => None,
            RouteKey::Key(key) => Some(key),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, RouteKey::Wildcard)
    }
}

enum Target<T, K> {
    Wildcard(Arc<dyn Sink<Dispatched<T, K>>>),
    Keyed(Arc<dyn Sink<T>>),
}

/// A registered consumer
///
/// Identity is the identity of the wrapped sink allocation: clones of one
/// `Subscriber` are the same subscriber, two `Subscriber`s built from separate
/// `Arc`s are different ones. Clones also share the live flag, so retiring a
/// subscriber stops delivery to every copy, including copies captured in a
/// fan-out snapshot that is still being walked.
pub struct Subscriber<T, K> {
    target: Target<T, K>,
    live: Arc<AtomicBool>,
}

impl<T, K> Subscriber<T, K> {
    /// A subscriber receiving every event together with its select capability
    pub fn wildcard(sink: Arc<dyn Sink<Dispatched<T, K>>>) -> Self {
        Self::from_target(Target::Wildcard(sink))
    }

    /// A subscriber receiving the raw events of one key
    pub fn keyed(sink: Arc<dyn Sink<T>>) -> Self {
        Self::from_target(Target::Keyed(sink))
    }

    fn from_target(target: Target<T, K>) -> Self {
        Self {
            target,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    fn addr(&self) -> *const () {
        match &self.target {
            Target::Wildcard(sink) => Arc::as_ptr(sink) as *const (),
            Target::Keyed(sink) => Arc::as_ptr(sink) as *const (),
        }
    }

    /// Whether both handles refer to the same registration
    pub fn same(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.target, Target::Wildcard(_))
    }

    /// Whether the subscriber still accepts notifications
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Stop all further delivery
    ///
    /// Returns `true` only for the call that actually retired the subscriber.
    pub(crate) fn retire(&self) -> bool {
        self.live.swap(false, Ordering::AcqRel)
    }

    /// Deliver one upstream event in the shape this subscriber expects
    pub(crate) fn deliver(
        &self,
        time: Time,
        value: &T,
        select: Option<&Select<T, K>>,
    ) -> Result<(), DispatchError>
    where
        T: Clone,
    {
        if !self.is_live() {
            return Ok(());
        }
        match &self.target {
            Target::Keyed(sink) => sink.event(time, value.clone()),
            Target::Wildcard(sink) => match select {
                Some(select) => sink.event(time, Dispatched::new(value.clone(), select.clone())),
                None => Err(DispatchError::HubDropped),
            },
        }
    }

    pub(crate) fn end(&self, time: Time) -> Result<(), DispatchError> {
        if !self.is_live() {
            return Ok(());
        }
        match &self.target {
            Target::Keyed(sink) => sink.end(time),
            Target::Wildcard(sink) => sink.end(time),
        }
    }

    pub(crate) fn error(&self, time: Time, err: &StreamError) -> Result<(), DispatchError> {
        if !self.is_live() {
            return Ok(());
        }
        match &self.target {
            Target::Keyed(sink) => sink.error(time, Arc::clone(err)),
            Target::Wildcard(sink) => sink.error(time, Arc::clone(err)),
        }
    }
}

impl<T, K> Clone for Subscriber<T, K> {
    fn clone(&self) -> Self {
        let target = match &self.target {
            Target::Wildcard(sink) => Target::Wildcard(Arc::clone(sink)),
            Target::Keyed(sink) => Target::Keyed(Arc::clone(sink)),
        };
        Self {
            target,
            live: Arc::clone(&self.live),
        }
    }
}

impl<T, K> std::fmt::Debug for Subscriber<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("wildcard", &self.is_wildcard())
            .field("addr", &self.addr())
            .field("live", &self.is_live())
            .finish()
    }
}

/// Keyed registry of subscribers
///
/// Implementations must keep `len` as a running count so that emptiness checks
/// are O(1), and must drop a key as soon as its last subscriber is removed.
pub trait SubscriberStore<T, K>: Send + 'static
where
    T: 'static,
    K: 'static,
{
    /// Register `subscriber` under `key`
    ///
    /// Returns `true` if the store held no subscribers at all before this call.
    /// Registering the same subscriber under the same key twice is a no-op.
    fn add(&mut self, key: RouteKey<K>, subscriber: Subscriber<T, K>) -> bool;

    /// Unregister `subscriber` from `key`
    ///
    /// Returns the number of subscribers left across all keys.
    fn remove(&mut self, key: &RouteKey<K>, subscriber: &Subscriber<T, K>) -> usize;

    /// Subscribers currently registered under `key`, in registration order
    fn get(&self, key: &RouteKey<K>) -> impl Iterator<Item = &Subscriber<T, K>>;

    /// Every subscriber under every key
    fn all(&self) -> impl Iterator<Item = &Subscriber<T, K>>;

    /// Total number of subscribers
    fn len(&self) -> usize;

    /// Number of keys with at least one subscriber
    fn key_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
