//! Routing key selectors

use std::sync::Arc;

use crate::error::DispatchError;

type SelectFn<T, K> = dyn Fn(&T) -> Result<K, DispatchError> + Send + Sync;

/// Maps an event to its routing key
///
/// Cloning shares the function. Two selectors are the same selector when they
/// share the function, which is what [`Dispatch::redispatch`] compares.
///
/// [`Dispatch::redispatch`]: crate::Dispatch::redispatch
pub struct Selector<T, K> {
    f: Arc<SelectFn<T, K>>,
}

impl<T, K> Selector<T, K>
where
    T: 'static,
    K: 'static,
{
    /// Create a selector from an infallible function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(move |value: &T| Ok(f(value))),
        }
    }

    /// Create a selector that may fail to produce a key
    ///
    /// The failure surfaces to whoever delivered the event.
    pub fn try_new<F, E>(f: F) -> Self
    where
        F: Fn(&T) -> Result<K, E> + Send + Sync + 'static,
        E: std::fmt::Display + 'static,
    {
        Self {
            f: Arc::new(move |value: &T| {
                f(value).map_err(|err| DispatchError::Selector(err.to_string()))
            }),
        }
    }

    /// Compute the routing key for `value`
    pub fn key(&self, value: &T) -> Result<K, DispatchError> {
        (self.f)(value)
    }

    /// Whether both selectors share the same function
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.f), Arc::as_ptr(&other.f))
    }
}

impl<T> Selector<T, T>
where
    T: Clone + 'static,
{
    /// The event is its own key
    pub fn identity() -> Self {
        Self::new(T::clone)
    }
}

impl<T, K> Clone for Selector<T, K> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<T, K> std::fmt::Debug for Selector<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("f", &Arc::as_ptr(&self.f))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Reading {
        room: u32,
        celsius: i32,
    }

    #[test]
    fn test_new_selects_field() {
        let selector = Selector::new(|r: &Reading| r.room);

        let key = selector.key(&Reading { room: 3, celsius: 21 }).unwrap();
        assert_eq!(key, 3);
    }

    #[test]
    fn test_identity() {
        let selector = Selector::<u32, u32>::identity();

        assert_eq!(selector.key(&7).unwrap(), 7);
    }

    #[test]
    fn test_try_new_reports_failure() {
        let selector = Selector::try_new(|r: &Reading| {
            if r.celsius < -273 {
                Err(format!("impossible reading in room {}", r.room))
            } else {
                Ok(r.room)
            }
        });

        let result = selector.key(&Reading { room: 2, celsius: -300 });
        assert!(
            matches!(result, Err(DispatchError::Selector(reason)) if reason == "impossible reading in room 2")
        );
    }

    #[test]
    fn test_same_as_follows_clones() {
        let a = Selector::new(|r: &Reading| r.room);
        let b = a.clone();
        let c = Selector::new(|r: &Reading| r.room);

        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
