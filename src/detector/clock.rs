//! Refresh-rate pacing for the inference loop.

use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

/// Highest tick rate accepted; anything above is clamped.
pub const MAX_REFRESH_RATE: u32 = 240;

/// Stand-in for a display refresh callback.
///
/// Missed ticks are skipped rather than bunched up, so a slow `predict`
/// delays the next iteration instead of triggering a burst.
pub struct RefreshClock {
    interval: Interval,
    period: Duration,
}

impl RefreshClock {
    /// Create a clock ticking `rate` times per second. Must be called from
    /// inside a tokio runtime.
    pub fn new(rate: u32) -> Self {
        let period = period_for(rate);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval, period }
    }

    /// Wait for the next scheduled tick.
    pub async fn next_tick(&mut self) {
        self.interval.tick().await;
    }

    /// Drop whatever tick is pending; the next one is a full period away.
    pub fn cancel_pending(&mut self) {
        self.interval.reset();
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

fn period_for(rate: u32) -> Duration {
    let rate = rate.clamp(1, MAX_REFRESH_RATE);
    Duration::from_secs_f64(1.0 / rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_clamps() {
        assert_eq!(period_for(0), Duration::from_secs(1));
        assert_eq!(period_for(1), Duration::from_secs(1));
        assert_eq!(period_for(10_000), period_for(MAX_REFRESH_RATE));
    }

    #[tokio::test]
    async fn test_first_tick_is_immediate() {
        let mut clock = RefreshClock::new(1);
        tokio::time::timeout(Duration::from_millis(200), clock.next_tick())
            .await
            .expect("first tick should not wait a full period");
        assert_eq!(clock.period(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cancel_pending_defers_tick() {
        let mut clock = RefreshClock::new(1);
        clock.next_tick().await;
        clock.cancel_pending();
        let early = tokio::time::timeout(Duration::from_millis(100), clock.next_tick()).await;
        assert!(early.is_err());
    }
}
