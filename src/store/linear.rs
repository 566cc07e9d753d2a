//! Subscriber store with caller-defined key equality
//!
//! For keys that cannot be hashed, or whose notion of "same key" differs from
//! `Eq` (case-insensitive names, floats within a tolerance, structural
//! comparison of nested values). Lookups scan the key list, so this store is
//! meant for a modest number of distinct live keys.

use std::sync::Arc;

use super::{RouteKey, Subscriber, SubscriberStore};

type KeyEq<K> = Arc<dyn Fn(&K, &K) -> bool + Send + Sync>;

/// Subscriber store comparing keys with an equality function
pub struct LinearStore<T, K> {
    entries: Vec<(RouteKey<K>, Vec<Subscriber<T, K>>)>,
    eq: KeyEq<K>,
    len: usize,
}

impl<T, K> LinearStore<T, K>
where
    K: PartialEq + 'static,
{
    /// Create a store comparing keys with `PartialEq`
    pub fn new() -> Self {
        Self::with_eq(|a: &K, b: &K| a == b)
    }
}

impl<T, K> Default for LinearStore<T, K>
where
    K: PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> LinearStore<T, K> {
    /// Create a store comparing keys with `eq`
    ///
    /// `eq` must behave as an equivalence relation.
    pub fn with_eq<F>(eq: F) -> Self
    where
        F: Fn(&K, &K) -> bool + Send + Sync + 'static,
    {
        Self {
            entries: Vec::new(),
            eq: Arc::new(eq),
            len: 0,
        }
    }

    fn position(&self, key: &RouteKey<K>) -> Option<usize> {
        self.entries.iter().position(|(k, _)| match (k, key) {
            (RouteKey::Wildcard, RouteKey::Wildcard) => true,
            (RouteKey::Key(a), RouteKey::Key(b)) => (self.eq)(a, b),
            _ => false,
        })
    }
}

impl<T, K> SubscriberStore<T, K> for LinearStore<T, K>
where
    T: 'static,
    K: Send + 'static,
{
    fn add(&mut self, key: RouteKey<K>, subscriber: Subscriber<T, K>) -> bool {
        let was_empty = self.len == 0;
        let index = match self.position(&key) {
            Some(index) => index,
            None => {
                self.entries.push((key, Vec::new()));
                self.entries.len() - 1
            }
        };
        let subscribers = &mut self.entries[index].1;
        if !subscribers.iter().any(|s| s.same(&subscriber)) {
            subscribers.push(subscriber);
            self.len += 1;
        }
        was_empty
    }

    fn remove(&mut self, key: &RouteKey<K>, subscriber: &Subscriber<T, K>) -> usize {
        if let Some(index) = self.position(key) {
            let subscribers = &mut self.entries[index].1;
            if let Some(pos) = subscribers.iter().position(|s| s.same(subscriber)) {
                subscribers.remove(pos);
                self.len -= 1;
            }
            if subscribers.is_empty() {
                self.entries.remove(index);
            }
        }
        self.len
    }

    fn get(&self, key: &RouteKey<K>) -> impl Iterator<Item = &Subscriber<T, K>> {
        self.position(key)
            .map(|index| &self.entries[index].1)
            .into_iter()
            .flatten()
    }

    fn all(&self) -> impl Iterator<Item = &Subscriber<T, K>> {
        self.entries.iter().flat_map(|(_, subscribers)| subscribers)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn key_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Pipe;
    use crate::testutil::Recorder;

    fn keyed(recorder: &Arc<Recorder<String>>) -> Subscriber<String, String> {
        Subscriber::keyed(Arc::new(Pipe::new(recorder.clone())))
    }

    #[test]
    fn test_custom_equality_merges_keys() {
        let mut store =
            LinearStore::<String, String>::with_eq(|a: &String, b: &String| a.eq_ignore_ascii_case(b));
        let recorder = Recorder::new();

        assert!(store.add(RouteKey::Key("Kitchen".into()), keyed(&recorder)));
        assert!(!store.add(RouteKey::Key("KITCHEN".into()), keyed(&recorder)));

        assert_eq!(store.key_count(), 1);
        assert_eq!(store.get(&RouteKey::Key("kitchen".into())).count(), 2);
    }

    #[test]
    fn test_float_keys_without_hash() {
        let mut store = LinearStore::<String, f64>::with_eq(|a: &f64, b: &f64| (a - b).abs() < 1e-9);
        let recorder = Recorder::<String>::new();
        let subscriber: Subscriber<String, f64> =
            Subscriber::keyed(Arc::new(Pipe::new(recorder.clone())));

        store.add(RouteKey::Key(0.1 + 0.2), subscriber.clone());

        assert_eq!(store.get(&RouteKey::Key(0.3)).count(), 1);
        assert_eq!(store.remove(&RouteKey::Key(0.3), &subscriber), 0);
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn test_wildcard_is_its_own_entry() {
        let mut store = LinearStore::<String, String>::new();
        let recorder = Recorder::new();

        store.add(RouteKey::Wildcard, keyed(&recorder));
        store.add(RouteKey::Key(String::new()), keyed(&recorder));

        assert_eq!(store.key_count(), 2);
        assert_eq!(store.get(&RouteKey::Wildcard).count(), 1);
        assert_eq!(store.all().count(), 2);
    }
}
