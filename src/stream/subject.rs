//! Manually driven source
//!
//! A [`Subject`] is pushed to by its owner and multicasts every notification
//! to the sinks currently running it. It counts how often it was started and
//! released, which makes it the natural upstream for observing a hub's
//! subscribe/unsubscribe behaviour.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{DispatchError, StreamError};

use super::scheduler::Scheduler;
use super::sink::Sink;
use super::source::{Disposable, Source, Teardown};
use super::Time;

struct Observer<T> {
    id: u64,
    sink: Arc<dyn Sink<T>>,
}

struct SubjectInner<T> {
    observers: Mutex<Vec<Observer<T>>>,
    next_id: AtomicU64,
    runs: AtomicUsize,
    releases: AtomicUsize,
}

impl<T> SubjectInner<T> {
    fn snapshot(&self) -> Vec<Arc<dyn Sink<T>>> {
        self.observers
            .lock()
            .iter()
            .map(|observer| Arc::clone(&observer.sink))
            .collect()
    }
}

/// Push-driven multicast source
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Subject<T> {
    /// Create a subject with no observers
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                observers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                runs: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            }),
        }
    }

    /// Deliver a value to every current observer
    ///
    /// Stops at the first observer that fails and returns its error.
    pub fn event(&self, time: Time, value: T) -> Result<(), DispatchError>
    where
        T: Clone,
    {
        for sink in self.inner.snapshot() {
            sink.event(time, value.clone())?;
        }
        Ok(())
    }

    /// Complete every current observer
    pub fn end(&self, time: Time) -> Result<(), DispatchError> {
        for sink in self.inner.snapshot() {
            sink.end(time)?;
        }
        Ok(())
    }

    /// Fail every current observer
    pub fn error(&self, time: Time, err: StreamError) -> Result<(), DispatchError> {
        for sink in self.inner.snapshot() {
            sink.error(time, Arc::clone(&err))?;
        }
        Ok(())
    }

    /// Number of times the subject has been started
    pub fn runs(&self) -> usize {
        self.inner.runs.load(Ordering::Relaxed)
    }

    /// Number of subscriptions that have been released
    pub fn releases(&self) -> usize {
        self.inner.releases.load(Ordering::Relaxed)
    }

    /// Number of sinks currently running the subject
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }
}

impl<T> Source<T> for Subject<T>
where
    T: 'static,
{
    fn run(&self, sink: Arc<dyn Sink<T>>, _scheduler: &Arc<dyn Scheduler>) -> Box<dyn Disposable> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.lock().push(Observer { id, sink });
        self.inner.runs.fetch_add(1, Ordering::Relaxed);

        tracing::trace!(observer = id, "Subject started");

        Box::new(SubjectSubscription {
            inner: Arc::downgrade(&self.inner),
            id,
            released: AtomicBool::new(false),
        })
    }
}

struct SubjectSubscription<T> {
    inner: Weak<SubjectInner<T>>,
    id: u64,
    released: AtomicBool,
}

impl<T> Disposable for SubjectSubscription<T>
where
    T: 'static,
{
    fn dispose(&self) -> Teardown {
        if self.released.swap(true, Ordering::AcqRel) {
            return Teardown::done();
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.observers.lock().retain(|observer| observer.id != self.id);
            inner.releases.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(observer = self.id, "Subject released");
        }
        Teardown::done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::TokioClock;
    use crate::testutil::{Notification, Recorder};

    #[test]
    fn test_multicasts_to_running_sinks() {
        let subject = Subject::<u32>::new();
        let clock = TokioClock::shared();
        let a = Recorder::new();
        let b = Recorder::new();

        let _sub_a = subject.run(a.clone(), &clock);
        let _sub_b = subject.run(b.clone(), &clock);
        subject.event(1, 7).unwrap();

        assert_eq!(a.values(), vec![7]);
        assert_eq!(b.values(), vec![7]);
        assert_eq!(subject.runs(), 2);
    }

    #[test]
    fn test_dispose_stops_delivery_once() {
        let subject = Subject::<u32>::new();
        let clock = TokioClock::shared();
        let recorder = Recorder::new();

        let subscription = subject.run(recorder.clone(), &clock);
        subject.event(1, 1).unwrap();
        let _ = subscription.dispose();
        let _ = subscription.dispose();
        subject.event(2, 2).unwrap();

        assert_eq!(recorder.values(), vec![1]);
        assert_eq!(subject.releases(), 1);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_end_reaches_observers() {
        let subject = Subject::<u32>::new();
        let clock = TokioClock::shared();
        let recorder = Recorder::new();

        let _subscription = subject.run(recorder.clone(), &clock);
        subject.end(9).unwrap();

        assert_eq!(recorder.notifications(), vec![Notification::End(9)]);
    }
}
