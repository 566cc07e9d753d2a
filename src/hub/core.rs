//! Dispatch hub implementation
//!
//! The hub is the single consumer of the upstream source and the fan-out point
//! for every downstream registration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::{Mutex, ReentrantMutex};

use crate::error::{DispatchError, StreamError};
use crate::selector::Selector;
use crate::store::{RouteKey, Subscriber, SubscriberStore};
use crate::stream::{Disposable, Scheduler, Sink, Source, Teardown, Time};

use super::config::{FanoutPolicy, HubConfig};
use super::disposal::DisposalHandle;
use super::select::Select;
use super::state::{HubState, HubStats};

/// Type-erased view of a hub
///
/// Key views, select capabilities and disposal handles talk to the hub through
/// this trait so that the store type does not leak into their signatures.
pub(crate) trait Registry<T, K>: Send + Sync {
    /// Register `subscriber` under `key`, starting the upstream if it is the first
    fn add(
        &self,
        subscriber: Subscriber<T, K>,
        key: RouteKey<K>,
        scheduler: &Arc<dyn Scheduler>,
    ) -> DisposalHandle<T, K>;

    /// Unregister, tearing the upstream down if no subscriber is left
    fn remove(&self, key: &RouteKey<K>, subscriber: &Subscriber<T, K>) -> Teardown;

    /// Release the upstream subscription if the hub is empty
    fn teardown(&self) -> Teardown;

    fn stats(&self) -> HubStats;
}

/// Owner of the shared upstream subscription
///
/// Lock order is `lifecycle`, then `subscription`, then `store`. Starting and
/// releasing the upstream both happen under `lifecycle`, which is reentrant so
/// a synchronous upstream may call back into the hub from `run`. Neither
/// `subscription` nor `store` is held while a sink or the upstream is called.
pub(crate) struct Hub<T, K, S> {
    me: Weak<Self>,

    /// Serializes upstream start and release across threads
    lifecycle: ReentrantMutex<()>,

    /// Source shared by every registration
    upstream: Arc<dyn Source<T>>,

    /// Routing key function
    selector: Selector<T, K>,

    /// Registered subscribers
    store: Mutex<S>,

    /// Live upstream subscription, present while the hub is active
    subscription: Mutex<Option<Box<dyn Disposable>>>,

    config: HubConfig,

    upstream_runs: AtomicU64,
    upstream_releases: AtomicU64,
    events: AtomicU64,
}

impl<T, K, S> Hub<T, K, S>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + std::fmt::Debug + Send + Sync + 'static,
    S: SubscriberStore<T, K>,
{
    /// Create an idle hub over `upstream`
    pub(crate) fn new(
        upstream: Arc<dyn Source<T>>,
        selector: Selector<T, K>,
        store: S,
        config: HubConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            lifecycle: ReentrantMutex::new(()),
            upstream,
            selector,
            store: Mutex::new(store),
            subscription: Mutex::new(None),
            config,
            upstream_runs: AtomicU64::new(0),
            upstream_releases: AtomicU64::new(0),
            events: AtomicU64::new(0),
        })
    }

    fn snapshot(&self, key: &RouteKey<K>) -> Vec<Subscriber<T, K>> {
        self.store.lock().get(key).cloned().collect()
    }

    fn snapshot_all(&self) -> Vec<Subscriber<T, K>> {
        self.store.lock().all().cloned().collect()
    }

    /// Deliver to one snapshot, collecting or short-circuiting on failure
    fn fan_out<F>(
        &self,
        notification: &'static str,
        subscribers: &[Subscriber<T, K>],
        failures: &mut Vec<DispatchError>,
        mut deliver: F,
    ) -> Result<(), DispatchError>
    where
        F: FnMut(&Subscriber<T, K>) -> Result<(), DispatchError>,
    {
        for subscriber in subscribers {
            if let Err(err) = deliver(subscriber) {
                tracing::warn!(
                    hub = %self.config.label,
                    notification,
                    wildcard = subscriber.is_wildcard(),
                    error = %err,
                    "Subscriber delivery failed"
                );
                match self.config.fanout {
                    FanoutPolicy::Guarded => failures.push(err),
                    FanoutPolicy::FailFast => return Err(err),
                }
            }
        }
        Ok(())
    }

    fn settle(failures: Vec<DispatchError>) -> Result<(), DispatchError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Fanout(failures))
        }
    }

    /// Start the upstream for the first subscriber
    ///
    /// Called with `lifecycle` held.
    fn connect(&self, scheduler: &Arc<dyn Scheduler>) {
        let Some(me) = self.me.upgrade() else {
            return;
        };
        let sink: Arc<dyn Sink<T>> = me;
        let subscription = self.upstream.run(sink, scheduler);
        self.upstream_runs.fetch_add(1, Ordering::Relaxed);

        let mut slot = self.subscription.lock();
        // The upstream may have emitted synchronously while starting, and a
        // subscriber reacting to that may have left (emptying the hub) or a
        // nested start may already own the slot.
        let orphaned = slot.is_some() || self.store.lock().is_empty();
        if orphaned {
            drop(slot);
            tracing::debug!(hub = %self.config.label, "Upstream started without subscribers, releasing");
            self.upstream_releases.fetch_add(1, Ordering::Relaxed);
            detach(&self.config.label, subscription.dispose());
            return;
        }
        *slot = Some(subscription);

        tracing::info!(hub = %self.config.label, "Upstream subscribed");
    }

    /// Release a taken subscription, reporting failure through the teardown
    fn release(&self, subscription: Box<dyn Disposable>) -> Teardown {
        self.upstream_releases.fetch_add(1, Ordering::Relaxed);
        tracing::info!(hub = %self.config.label, "Upstream released");

        let label = self.config.label.clone();
        let release = subscription.dispose();
        Teardown::new(async move {
            release.await.map_err(|err| {
                tracing::warn!(hub = %label, error = %err, "Upstream release failed");
                match err {
                    DispatchError::Dispose(_) => err,
                    other => DispatchError::Dispose(other.to_string()),
                }
            })
        })
    }

    fn select_capability(&self) -> Option<Select<T, K>> {
        let me: Arc<dyn Registry<T, K>> = self.me.upgrade()?;
        Some(Select::new(me))
    }

    pub(crate) fn state(&self) -> HubState {
        if self.subscription.lock().is_some() {
            HubState::Active
        } else {
            HubState::Idle
        }
    }
}

impl<T, K, S> Registry<T, K> for Hub<T, K, S>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + std::fmt::Debug + Send + Sync + 'static,
    S: SubscriberStore<T, K>,
{
    fn add(
        &self,
        subscriber: Subscriber<T, K>,
        key: RouteKey<K>,
        scheduler: &Arc<dyn Scheduler>,
    ) -> DisposalHandle<T, K> {
        let _lifecycle = self.lifecycle.lock();
        let (was_empty, subscribers) = {
            let mut store = self.store.lock();
            let was_empty = store.add(key.clone(), subscriber.clone());
            (was_empty, store.len())
        };

        tracing::debug!(
            hub = %self.config.label,
            key = ?key,
            subscribers = subscribers,
            "Subscriber added"
        );

        if was_empty && self.subscription.lock().is_none() {
            self.connect(scheduler);
        }

        let hub: Weak<dyn Registry<T, K>> = self.me.clone();
        DisposalHandle::new(hub, subscriber, key)
    }

    fn remove(&self, key: &RouteKey<K>, subscriber: &Subscriber<T, K>) -> Teardown {
        let _lifecycle = self.lifecycle.lock();
        let remaining = self.store.lock().remove(key, subscriber);

        tracing::debug!(
            hub = %self.config.label,
            key = ?key,
            subscribers = remaining,
            "Subscriber removed"
        );

        // Still under `lifecycle`: no add can start a second upstream
        // subscription before this one is taken.
        if remaining == 0 {
            self.teardown()
        } else {
            Teardown::done()
        }
    }

    fn teardown(&self) -> Teardown {
        let _lifecycle = self.lifecycle.lock();
        let taken = {
            let mut slot = self.subscription.lock();
            if self.store.lock().is_empty() {
                slot.take()
            } else {
                None
            }
        };
        match taken {
            Some(subscription) => self.release(subscription),
            None => Teardown::done(),
        }
    }

    fn stats(&self) -> HubStats {
        let (subscribers, keys) = {
            let store = self.store.lock();
            (store.len(), store.key_count())
        };
        HubStats {
            state: self.state(),
            subscribers,
            keys,
            upstream_runs: self.upstream_runs.load(Ordering::Relaxed),
            upstream_releases: self.upstream_releases.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
        }
    }
}

impl<T, K, S> Drop for Hub<T, K, S> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            tracing::debug!(hub = %self.config.label, "Hub dropped while active, releasing upstream");
            self.upstream_releases.fetch_add(1, Ordering::Relaxed);
            detach(&self.config.label, subscription.dispose());
        }
    }
}

/// Let a release nobody awaits finish on its own, logging a failure
///
/// Spawned on the current tokio runtime when there is one. Otherwise the
/// teardown is polled once; an outcome still pending after that is abandoned.
fn detach(label: &str, teardown: Teardown) {
    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        let label = label.to_string();
        runtime.spawn(async move {
            if let Err(err) = teardown.await {
                tracing::warn!(hub = %label, error = %err, "Upstream release failed");
            }
        });
        return;
    }
    match teardown.now_or_never() {
        Some(Ok(())) => {}
        Some(Err(err)) => {
            tracing::warn!(hub = %label, error = %err, "Upstream release failed");
        }
        None => {
            tracing::debug!(hub = %label, "Upstream release pending without a runtime, abandoned");
        }
    }
}

impl<T, K, S> Sink<T> for Hub<T, K, S>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + std::fmt::Debug + Send + Sync + 'static,
    S: SubscriberStore<T, K>,
{
    fn event(&self, time: Time, value: T) -> Result<(), DispatchError> {
        let key = RouteKey::Key(self.selector.key(&value)?);
        self.events.fetch_add(1, Ordering::Relaxed);

        let mut failures = Vec::new();

        // Wildcard pass first. The keyed snapshot is only taken once it is
        // over, so a key view opened by a wildcard subscriber for this very
        // key already sees this event.
        let wildcard = self.snapshot(&RouteKey::Wildcard);
        if !wildcard.is_empty() {
            let select = self.select_capability();
            self.fan_out("event", &wildcard, &mut failures, |s| {
                s.deliver(time, &value, select.as_ref())
            })?;
        }

        let keyed = self.snapshot(&key);
        self.fan_out("event", &keyed, &mut failures, |s| {
            s.deliver(time, &value, None)
        })?;

        Self::settle(failures)
    }

    fn end(&self, time: Time) -> Result<(), DispatchError> {
        let subscribers = self.snapshot_all();

        tracing::debug!(hub = %self.config.label, subscribers = subscribers.len(), "Upstream ended");

        let mut failures = Vec::new();
        self.fan_out("end", &subscribers, &mut failures, |s| s.end(time))?;
        Self::settle(failures)
    }

    fn error(&self, time: Time, err: StreamError) -> Result<(), DispatchError> {
        let subscribers = self.snapshot_all();

        tracing::debug!(
            hub = %self.config.label,
            subscribers = subscribers.len(),
            error = %err,
            "Upstream failed"
        );

        let mut failures = Vec::new();
        self.fan_out("error", &subscribers, &mut failures, |s| s.error(time, &err))?;
        Self::settle(failures)
    }
}
