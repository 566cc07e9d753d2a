//! Disposal handles
//!
//! Every registration with a hub hands back a [`DisposalHandle`]. Disposing it
//! removes the registration; the handle whose removal empties the hub also
//! releases the upstream subscription and returns that release as its
//! [`Teardown`].

use std::sync::Weak;

use crate::store::{RouteKey, Subscriber};
use crate::stream::{Disposable, Teardown};

use super::core::Registry;

/// Unsubscribe token for one registration
///
/// Holds only a weak reference to its hub; a handle never keeps a hub alive.
#[must_use = "dropping the handle leaves the subscription registered"]
pub struct DisposalHandle<T, K> {
    hub: Weak<dyn Registry<T, K>>,
    subscriber: Subscriber<T, K>,
    key: RouteKey<K>,
}

impl<T, K> DisposalHandle<T, K> {
    pub(crate) fn new(
        hub: Weak<dyn Registry<T, K>>,
        subscriber: Subscriber<T, K>,
        key: RouteKey<K>,
    ) -> Self {
        Self {
            hub,
            subscriber,
            key,
        }
    }

    /// The key this registration was made under
    pub fn route(&self) -> &RouteKey<K> {
        &self.key
    }

    pub fn is_disposed(&self) -> bool {
        !self.subscriber.is_live()
    }

    /// Remove the registration
    ///
    /// Idempotent. Delivery to this subscriber stops before this returns, even
    /// if a fan-out pass is in progress. The returned teardown completes the
    /// upstream release when this was the last registration, and is already
    /// complete otherwise.
    pub fn dispose(&self) -> Teardown {
        if !self.subscriber.retire() {
            return Teardown::done();
        }
        let Some(hub) = self.hub.upgrade() else {
            return Teardown::done();
        };
        hub.remove(&self.key, &self.subscriber)
    }
}

impl<T, K> Disposable for DisposalHandle<T, K>
where
    T: 'static,
    K: Send + Sync + 'static,
{
    fn dispose(&self) -> Teardown {
        DisposalHandle::dispose(self)
    }
}

impl<T, K: std::fmt::Debug> std::fmt::Debug for DisposalHandle<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalHandle")
            .field("key", &self.key)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
