//! Stream clocks

use std::sync::Arc;

use tokio::time::Instant;

use super::Time;

/// Supplies the current stream time to sources
pub trait Scheduler: Send + Sync {
    fn now(&self) -> Time;
}

/// Milliseconds elapsed on tokio's clock since the clock was created
///
/// Follows tokio's paused clock, so timed sources stay deterministic under
/// `tokio::time::pause`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    /// Create a clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Create a clock ready to hand to [`Source::run`](super::Source::run)
    pub fn shared() -> Arc<dyn Scheduler> {
        Arc::new(Self::new())
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioClock {
    fn now(&self) -> Time {
        Time::try_from(self.origin.elapsed().as_millis()).unwrap_or(Time::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_paused_time() {
        let clock = TokioClock::new();
        assert_eq!(clock.now(), 0);

        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(clock.now(), 250);
    }
}
