//! Paced clock — interruptible inter-turn delay.
//!
//! The external call quota needs a fixed multi-second gap between model
//! calls, but a user stop must land within a fraction of that gap. The
//! clock sleeps in short ticks and polls a cancellation check between
//! them; the tick size is the trade-off between quota safety and
//! cancellation latency.

use std::time::Duration;

use tracing::debug;

use crate::debate::error::DebateError;

/// Default polling granularity during a pacing wait.
pub const DEFAULT_POLL_TICK: Duration = Duration::from_millis(250);

/// Interruptible delay primitive used between debate turns.
#[derive(Debug, Clone)]
pub struct PacedClock {
    tick: Duration,
}

impl PacedClock {
    /// Create a clock that polls at the given tick interval.
    ///
    /// A zero tick is bumped to [`DEFAULT_POLL_TICK`] so the wait loop
    /// always makes progress.
    pub fn new(tick: Duration) -> Self {
        let tick = if tick.is_zero() {
            DEFAULT_POLL_TICK
        } else {
            tick
        };
        Self { tick }
    }

    /// Sleep for `duration`, polling `cancelled` on entry and after every
    /// tick. Returns `Err(DebateError::Cancelled)` the moment the check
    /// observes cancellation, rather than completing the full duration.
    pub async fn wait<F>(&self, duration: Duration, cancelled: F) -> Result<(), DebateError>
    where
        F: Fn() -> bool,
    {
        let mut remaining = duration;
        loop {
            if cancelled() {
                debug!(remaining_ms = remaining.as_millis() as u64, "Pacing wait interrupted");
                return Err(DebateError::Cancelled);
            }
            if remaining.is_zero() {
                return Ok(());
            }
            let slice = remaining.min(self.tick);
            tokio::time::sleep(slice).await;
            remaining -= slice;
        }
    }
}

impl Default for PacedClock {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_TICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_wait_completes_without_cancellation() {
        let clock = PacedClock::new(Duration::from_millis(5));
        let result = clock.wait(Duration::from_millis(20), || false).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_zero_duration_wait_is_immediate() {
        let clock = PacedClock::default();
        let start = Instant::now();
        clock.wait(Duration::ZERO, || false).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_cancellation_at_entry_skips_sleep() {
        let clock = PacedClock::new(Duration::from_millis(5));
        let start = Instant::now();
        let result = clock.wait(Duration::from_secs(10), || true).await;
        assert!(matches!(result, Err(DebateError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cancellation_mid_wait_returns_early() {
        let clock = PacedClock::new(Duration::from_millis(5));
        let flag = Arc::new(AtomicBool::new(false));

        let setter = Arc::clone(&flag);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            setter.store(true, Ordering::SeqCst);
        });

        let start = Instant::now();
        let result = clock
            .wait(Duration::from_secs(10), || flag.load(Ordering::SeqCst))
            .await;
        assert!(matches!(result, Err(DebateError::Cancelled)));
        // Interrupted within a few ticks, nowhere near the full duration.
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_zero_tick_falls_back_to_default() {
        let clock = PacedClock::new(Duration::ZERO);
        assert_eq!(clock.tick, DEFAULT_POLL_TICK);
    }
}
