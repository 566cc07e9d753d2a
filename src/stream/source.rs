//! Source contract, subscriptions and deferred teardown

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::DispatchError;

use super::scheduler::Scheduler;
use super::sink::Sink;

/// Producer side of a stream
pub trait Source<T>: Send + Sync {
    /// Start delivering to `sink`
    ///
    /// The returned subscription stops delivery when disposed.
    fn run(&self, sink: Arc<dyn Sink<T>>, scheduler: &Arc<dyn Scheduler>) -> Box<dyn Disposable>;
}

impl<T, S> Source<T> for Arc<S>
where
    S: Source<T> + ?Sized,
{
    fn run(&self, sink: Arc<dyn Sink<T>>, scheduler: &Arc<dyn Scheduler>) -> Box<dyn Disposable> {
        (**self).run(sink, scheduler)
    }
}

/// A running subscription
pub trait Disposable: Send + Sync {
    /// Stop delivery and release held resources
    ///
    /// Synchronous effects happen before this returns; any asynchronous part of
    /// the release completes through the returned [`Teardown`].
    fn dispose(&self) -> Teardown;
}

/// Deferred completion of a release
///
/// Resolves once the underlying resource has been let go. Dropping it does not
/// undo anything that already happened synchronously.
#[must_use = "the release may still be in progress; await the teardown to observe its outcome"]
pub struct Teardown {
    inner: BoxFuture<'static, Result<(), DispatchError>>,
}

impl Teardown {
    /// Wrap a release future
    pub fn new<F>(release: F) -> Self
    where
        F: Future<Output = Result<(), DispatchError>> + Send + 'static,
    {
        Self {
            inner: release.boxed(),
        }
    }

    /// A teardown that has already completed
    pub fn done() -> Self {
        Self::ready(Ok(()))
    }

    /// A teardown with a known outcome
    pub fn ready(result: Result<(), DispatchError>) -> Self {
        Self::new(future::ready(result))
    }
}

impl Future for Teardown {
    type Output = Result<(), DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teardown").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_resolves_ok() {
        assert!(tokio_test::block_on(Teardown::done()).is_ok());
    }

    #[test]
    fn test_ready_carries_failure() {
        let teardown = Teardown::ready(Err(DispatchError::Dispose("socket busy".into())));

        let result = tokio_test::block_on(teardown);
        assert!(matches!(result, Err(DispatchError::Dispose(reason)) if reason == "socket busy"));
    }

    #[tokio::test]
    async fn test_new_awaits_release() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let teardown = Teardown::new(async move {
            rx.await
                .map_err(|_| DispatchError::Dispose("release abandoned".into()))
        });

        tx.send(()).unwrap();
        assert!(teardown.await.is_ok());
    }
}
