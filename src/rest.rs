//! Rest countdown between sets.
//!
//! The timer is a pacing aid only: nothing here touches logged data. A
//! [`RestRequested`] is produced when a set is completed, and the caller
//! decides whether to feed it into a [`RestTimer`].

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_WARMUP_REST_SECS: u32 = 15;
pub const DEFAULT_WORKING_REST_SECS: u32 = 90;

/// How long to rest after completing a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestPolicy {
    pub warmup_secs: u32,
    pub working_secs: u32,
}

impl Default for RestPolicy {
    fn default() -> Self {
        Self {
            warmup_secs: DEFAULT_WARMUP_REST_SECS,
            working_secs: DEFAULT_WORKING_REST_SECS,
        }
    }
}

impl RestPolicy {
    pub fn request_for(&self, is_warmup: bool) -> RestRequested {
        let seconds = if is_warmup {
            self.warmup_secs
        } else {
            self.working_secs
        };
        RestRequested { seconds }
    }
}

/// Emitted when a set transitions to completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestRequested {
    pub seconds: u32,
}

/// Single countdown. Starting it again overwrites whatever was left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestTimer {
    remaining: u32,
    active: bool,
}

impl RestTimer {
    pub fn start(&mut self, request: RestRequested) {
        self.remaining = request.seconds;
        self.active = request.seconds > 0;
    }

    /// Advance by one second. Returns the remaining time, or `None` when
    /// the timer was not running.
    pub fn tick(&mut self) -> Option<u32> {
        if !self.active {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.active = false;
        }
        Some(self.remaining)
    }

    /// Stop immediately; the remaining time is discarded.
    pub fn cancel(&mut self) {
        self.active = false;
        self.remaining = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestOutcome {
    /// Timer was not running.
    Idle,
    Expired,
    Cancelled { remaining: u32 },
}

/// Drive `timer` in real time, one tick per second, until it reaches zero or
/// `cancel` resolves. `on_tick` sees the remaining seconds after every tick.
pub async fn run_countdown<C, F>(timer: &mut RestTimer, cancel: C, mut on_tick: F) -> RestOutcome
where
    C: Future<Output = ()>,
    F: FnMut(u32),
{
    if !timer.is_active() {
        return RestOutcome::Idle;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick of an interval completes immediately.
    interval.tick().await;
    tokio::pin!(cancel);

    loop {
        tokio::select! {
            _ = &mut cancel => {
                let remaining = timer.remaining();
                timer.cancel();
                debug!(remaining, "rest countdown cancelled");
                return RestOutcome::Cancelled { remaining };
            }
            _ = interval.tick() => {
                if let Some(left) = timer.tick() {
                    on_tick(left);
                }
                if !timer.is_active() {
                    debug!("rest countdown expired");
                    return RestOutcome::Expired;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_rest_is_shorter() {
        let policy = RestPolicy::default();
        assert!(policy.request_for(true).seconds < policy.request_for(false).seconds);
        assert_eq!(policy.request_for(true).seconds, 15);
        assert_eq!(policy.request_for(false).seconds, 90);
    }

    #[test]
    fn ticks_down_and_stops_at_zero() {
        let mut timer = RestTimer::default();
        timer.start(RestRequested { seconds: 2 });
        assert!(timer.is_active());
        assert_eq!(timer.tick(), Some(1));
        assert_eq!(timer.tick(), Some(0));
        assert!(!timer.is_active());
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn cancel_stops_further_ticks() {
        let mut timer = RestTimer::default();
        timer.start(RestRequested { seconds: 60 });
        timer.tick();
        timer.cancel();
        assert!(!timer.is_active());
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn restart_overwrites_remaining() {
        let mut timer = RestTimer::default();
        timer.start(RestRequested { seconds: 90 });
        timer.tick();
        timer.start(RestRequested { seconds: 15 });
        assert_eq!(timer.remaining(), 15);
        assert!(timer.is_active());
    }

    #[test]
    fn zero_second_request_never_activates() {
        let mut timer = RestTimer::default();
        timer.start(RestRequested { seconds: 0 });
        assert!(!timer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_to_expiry() {
        let mut timer = RestTimer::default();
        timer.start(RestRequested { seconds: 3 });
        let mut seen = Vec::new();
        let outcome = run_countdown(&mut timer, std::future::pending(), |left| seen.push(left)).await;
        assert_eq!(outcome, RestOutcome::Expired);
        assert_eq!(seen, vec![2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_can_be_cancelled() {
        let mut timer = RestTimer::default();
        timer.start(RestRequested { seconds: 10 });
        let cancel = tokio::time::sleep(Duration::from_millis(2500));
        let outcome = run_countdown(&mut timer, cancel, |_| {}).await;
        assert_eq!(outcome, RestOutcome::Cancelled { remaining: 8 });
        assert!(!timer.is_active());
    }

    #[tokio::test]
    async fn idle_timer_returns_immediately() {
        let mut timer = RestTimer::default();
        let outcome = run_countdown(&mut timer, std::future::pending(), |_| {}).await;
        assert_eq!(outcome, RestOutcome::Idle);
    }
}
