//! Timed item source
//!
//! Emits a fixed list of items from a tokio task, one per period, then ends.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::scheduler::Scheduler;
use super::sink::Sink;
use super::source::{Disposable, Source, Teardown};

/// Source emitting a fixed list of items
///
/// Every run spawns its own task, so each subscriber sees the full list.
/// Must be run from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct Items<T> {
    items: Vec<T>,
    period: Duration,
}

/// Create a source emitting `items` spaced by `period`, then ending
///
/// A zero period yields to the runtime between items instead of sleeping.
pub fn from_items<T, I>(items: I, period: Duration) -> Items<T>
where
    I: IntoIterator<Item = T>,
{
    Items {
        items: items.into_iter().collect(),
        period,
    }
}

impl<T> Items<T> {
    /// Number of items each run emits
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Source<T> for Items<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn run(&self, sink: Arc<dyn Sink<T>>, scheduler: &Arc<dyn Scheduler>) -> Box<dyn Disposable> {
        let items = self.items.clone();
        let period = self.period;
        let scheduler = Arc::clone(scheduler);

        let handle = tokio::spawn(async move {
            for item in items {
                if period.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(period).await;
                }
                if let Err(err) = sink.event(scheduler.now(), item) {
                    tracing::warn!(error = %err, "Item delivery failed");
                }
            }
            if let Err(err) = sink.end(scheduler.now()) {
                tracing::warn!(error = %err, "End delivery failed");
            }
        });

        Box::new(TaskSubscription { handle })
    }
}

struct TaskSubscription {
    handle: JoinHandle<()>,
}

impl Disposable for TaskSubscription {
    fn dispose(&self) -> Teardown {
        self.handle.abort();
        Teardown::done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::TokioClock;
    use crate::testutil::{Notification, Recorder};

    #[tokio::test(start_paused = true)]
    async fn test_emits_items_then_ends() {
        let source = from_items(vec![3u32, 5, 7], Duration::from_millis(10));
        let recorder = Recorder::new();

        let _subscription = source.run(recorder.clone(), &TokioClock::shared());
        recorder.wait_closed().await;

        assert_eq!(
            recorder.notifications(),
            vec![
                Notification::Event(10, 3),
                Notification::Event(20, 5),
                Notification::Event(30, 7),
                Notification::End(30),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_aborts_emission() {
        let source = from_items(vec![1u32, 2, 3], Duration::from_millis(10));
        let recorder = Recorder::new();

        let subscription = source.run(recorder.clone(), &TokioClock::shared());
        tokio::time::sleep(Duration::from_millis(15)).await;
        subscription.dispose().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(recorder.values(), vec![1]);
        assert!(!recorder.is_closed());
    }
}
