//! Dispatched streams
//!
//! [`Dispatch`] turns one upstream source into a source of [`Dispatched`]
//! events plus any number of per-key sources, all fed by a single upstream
//! subscription.

use std::hash::Hash;
use std::sync::Arc;

use crate::hub::{
    Dispatched, DisposalHandle, Hub, HubConfig, HubState, HubStats, KeyView, Registry, Select,
};
use crate::selector::Selector;
use crate::store::{HashStore, RouteKey, Subscriber, SubscriberStore};
use crate::stream::{Disposable, Pipe, Scheduler, Sink, Source};

/// An upstream source routed by key
///
/// Running a `Dispatch` subscribes to every event; [`select`](Self::select)
/// gives the events of one key. Clones share the hub.
pub struct Dispatch<T, K> {
    hub: Arc<dyn Registry<T, K>>,
    upstream: Arc<dyn Source<T>>,
    selector: Selector<T, K>,
    config: HubConfig,
}

impl<T, K> Clone for Dispatch<T, K> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            upstream: Arc::clone(&self.upstream),
            selector: self.selector.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T, K> Dispatch<T, K>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + Hash + Eq + std::fmt::Debug + Send + Sync + 'static,
{
    /// Route `upstream` by `selector` with default configuration
    pub fn new<U>(upstream: U, selector: Selector<T, K>) -> Self
    where
        U: Source<T> + 'static,
    {
        Self::with_config(upstream, selector, HubConfig::default())
    }

    /// Route `upstream` by `selector` with custom configuration
    pub fn with_config<U>(upstream: U, selector: Selector<T, K>, config: HubConfig) -> Self
    where
        U: Source<T> + 'static,
    {
        Self::from_shared(Arc::new(upstream), selector, config)
    }

    fn from_shared(
        upstream: Arc<dyn Source<T>>,
        selector: Selector<T, K>,
        config: HubConfig,
    ) -> Self {
        let store = HashStore::with_capacity(config.key_capacity);
        Self::build(upstream, selector, store, config)
    }

    /// Route the same upstream by `selector`
    ///
    /// With the selector this stream already uses, returns this stream; the hub
    /// is shared, not wrapped a second time. Any other selector gets a fresh hub
    /// over the same upstream source.
    pub fn redispatch(&self, selector: Selector<T, K>) -> Self {
        if self.selector.same_as(&selector) {
            return self.clone();
        }
        Self::from_shared(Arc::clone(&self.upstream), selector, self.config.clone())
    }
}

impl<T, K> Dispatch<T, K>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + std::fmt::Debug + Send + Sync + 'static,
{
    /// Route `upstream` by `selector`, indexing subscribers with `store`
    pub fn with_store<U, S>(
        upstream: U,
        selector: Selector<T, K>,
        store: S,
        config: HubConfig,
    ) -> Self
    where
        U: Source<T> + 'static,
        S: SubscriberStore<T, K>,
    {
        Self::build(Arc::new(upstream), selector, store, config)
    }

    fn build<S>(
        upstream: Arc<dyn Source<T>>,
        selector: Selector<T, K>,
        store: S,
        config: HubConfig,
    ) -> Self
    where
        S: SubscriberStore<T, K>,
    {
        let hub: Arc<dyn Registry<T, K>> = Hub::new(
            Arc::clone(&upstream),
            selector.clone(),
            store,
            config.clone(),
        );
        Self {
            hub,
            upstream,
            selector,
            config,
        }
    }

    /// A source of the events whose key equals `key`
    pub fn select(&self, key: K) -> KeyView<T, K> {
        Select::new(Arc::clone(&self.hub)).select(key)
    }

    /// Subscribe `sink` to every event
    ///
    /// Same as [`Source::run`], but keeps the concrete handle type.
    pub fn subscribe(
        &self,
        sink: Arc<dyn Sink<Dispatched<T, K>>>,
        scheduler: &Arc<dyn Scheduler>,
    ) -> DisposalHandle<T, K> {
        let subscriber = Subscriber::wildcard(Arc::new(Pipe::new(sink)));
        self.hub.add(subscriber, RouteKey::Wildcard, scheduler)
    }

    /// The selector events are routed by
    pub fn selector(&self) -> &Selector<T, K> {
        &self.selector
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Current hub statistics
    pub fn stats(&self) -> HubStats {
        self.hub.stats()
    }

    pub fn state(&self) -> HubState {
        self.hub.stats().state
    }

    /// Whether both handles feed from the same hub
    pub fn shares_hub(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.hub), Arc::as_ptr(&other.hub))
    }
}

impl<T, K> Source<Dispatched<T, K>> for Dispatch<T, K>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + std::fmt::Debug + Send + Sync + 'static,
{
    fn run(
        &self,
        sink: Arc<dyn Sink<Dispatched<T, K>>>,
        scheduler: &Arc<dyn Scheduler>,
    ) -> Box<dyn Disposable> {
        Box::new(self.subscribe(sink, scheduler))
    }
}

impl<T, K> std::fmt::Debug for Dispatch<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("label", &self.config.label)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Routing combinators for any source
pub trait DispatchExt<T>: Source<T> + Sized + 'static
where
    T: Clone + Send + Sync + 'static,
{
    /// Route this source by `selector`
    fn dispatch<K>(self, selector: Selector<T, K>) -> Dispatch<T, K>
    where
        K: Clone + Hash + Eq + std::fmt::Debug + Send + Sync + 'static,
    {
        Dispatch::new(self, selector)
    }

    /// Route this source by a key function
    fn dispatch_by<K, F>(self, f: F) -> Dispatch<T, K>
    where
        K: Clone + Hash + Eq + std::fmt::Debug + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.dispatch(Selector::new(f))
    }

    /// Route this source by the events themselves
    fn dispatch_identity(self) -> Dispatch<T, T>
    where
        T: Hash + Eq + std::fmt::Debug,
    {
        self.dispatch(Selector::identity())
    }
}

impl<T, U> DispatchExt<T> for U
where
    T: Clone + Send + Sync + 'static,
    U: Source<T> + 'static,
{
}
