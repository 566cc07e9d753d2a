//! Hash-indexed subscriber store
//!
//! The default store. Keys are indexed with `Hash + Eq`; subscribers under one
//! key are kept in registration order.

use std::collections::HashMap;
use std::hash::Hash;

use super::{RouteKey, Subscriber, SubscriberStore};

/// Subscriber store backed by a `HashMap`
pub struct HashStore<T, K> {
    /// Subscribers per key; a key is present only while it has subscribers
    items: HashMap<RouteKey<K>, Vec<Subscriber<T, K>>>,

    /// Total subscribers across all keys
    len: usize,
}

impl<T, K> HashStore<T, K> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            len: 0,
        }
    }

    /// Create an empty store with room for `keys` keys
    pub fn with_capacity(keys: usize) -> Self {
        Self {
            items: HashMap::with_capacity(keys),
            len: 0,
        }
    }
}

impl<T, K> Default for HashStore<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> SubscriberStore<T, K> for HashStore<T, K>
where
    T: 'static,
    K: Hash + Eq + Send + 'static,
{
    fn add(&mut self, key: RouteKey<K>, subscriber: Subscriber<T, K>) -> bool {
        let was_empty = self.len == 0;
        let subscribers = self.items.entry(key).or_default();
        if !subscribers.iter().any(|s| s.same(&subscriber)) {
            subscribers.push(subscriber);
            self.len += 1;
        }
        was_empty
    }

    fn remove(&mut self, key: &RouteKey<K>, subscriber: &Subscriber<T, K>) -> usize {
        if let Some(subscribers) = self.items.get_mut(key) {
            if let Some(pos) = subscribers.iter().position(|s| s.same(subscriber)) {
                subscribers.remove(pos);
                self.len -= 1;
            }
            if subscribers.is_empty() {
                self.items.remove(key);
            }
        }
        self.len
    }

    fn get(&self, key: &RouteKey<K>) -> impl Iterator<Item = &Subscriber<T, K>> {
        self.items.get(key).into_iter().flatten()
    }

    fn all(&self) -> impl Iterator<Item = &Subscriber<T, K>> {
        self.items.values().flatten()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn key_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::stream::Pipe;
    use crate::testutil::Recorder;

    fn keyed(recorder: &Arc<Recorder<u32>>) -> Subscriber<u32, u32> {
        Subscriber::keyed(Arc::new(Pipe::new(recorder.clone())))
    }

    #[test]
    fn test_add_reports_first_subscriber() {
        let mut store = HashStore::<u32, u32>::new();
        let recorder = Recorder::new();

        assert!(store.add(RouteKey::Key(3), keyed(&recorder)));
        assert!(!store.add(RouteKey::Key(5), keyed(&recorder)));
        assert!(!store.add(RouteKey::Wildcard, keyed(&recorder)));

        assert_eq!(store.len(), 3);
        assert_eq!(store.key_count(), 3);
    }

    #[test]
    fn test_duplicate_pair_is_stored_once() {
        let mut store = HashStore::<u32, u32>::new();
        let recorder = Recorder::new();
        let subscriber = keyed(&recorder);

        store.add(RouteKey::Key(3), subscriber.clone());
        store.add(RouteKey::Key(3), subscriber.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&RouteKey::Key(3)).count(), 1);
    }

    #[test]
    fn test_remove_counts_down_and_drops_empty_keys() {
        let mut store = HashStore::<u32, u32>::new();
        let recorder = Recorder::new();
        let a = keyed(&recorder);
        let b = keyed(&recorder);

        store.add(RouteKey::Key(3), a.clone());
        store.add(RouteKey::Key(5), b.clone());

        assert_eq!(store.remove(&RouteKey::Key(3), &a), 1);
        assert_eq!(store.key_count(), 1);
        assert_eq!(store.get(&RouteKey::Key(3)).count(), 0);

        assert_eq!(store.remove(&RouteKey::Key(5), &b), 0);
        assert!(store.is_empty());
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn test_remove_unknown_pair_is_harmless() {
        let mut store = HashStore::<u32, u32>::new();
        let recorder = Recorder::new();
        let a = keyed(&recorder);

        store.add(RouteKey::Key(3), a.clone());

        // Wrong key, then unknown subscriber
        assert_eq!(store.remove(&RouteKey::Key(4), &a), 1);
        assert_eq!(store.remove(&RouteKey::Key(3), &keyed(&recorder)), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_preserves_registration_order() {
        let mut store = HashStore::<u32, u32>::new();
        let recorder = Recorder::new();
        let subscribers: Vec<_> = (0..4).map(|_| keyed(&recorder)).collect();

        for s in &subscribers {
            store.add(RouteKey::Key(1), s.clone());
        }
        store.remove(&RouteKey::Key(1), &subscribers[1]);

        let got: Vec<_> = store.get(&RouteKey::Key(1)).cloned().collect();
        assert_eq!(got.len(), 3);
        assert!(got[0].same(&subscribers[0]));
        assert!(got[1].same(&subscribers[2]));
        assert!(got[2].same(&subscribers[3]));
    }

    #[test]
    fn test_all_spans_every_key() {
        let mut store = HashStore::<u32, u32>::new();
        let recorder = Recorder::new();

        store.add(RouteKey::Wildcard, keyed(&recorder));
        store.add(RouteKey::Key(1), keyed(&recorder));
        store.add(RouteKey::Key(2), keyed(&recorder));

        assert_eq!(store.all().count(), 3);
        // Re-obtainable
        assert_eq!(store.all().count(), 3);
    }
}
