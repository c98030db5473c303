//! Fixed-period tick scheduler polled by the event loop.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TickScheduler {
    period: Duration,
    next_due: Instant,
    running: bool,
}

impl TickScheduler {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: now + period,
            running: true,
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True (and re-armed) if a tick is due at `now`. Missed ticks are not replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.running || now < self.next_due {
            return false;
        }
        self.next_due = now + self.period;
        true
    }

    /// How long the event loop may block before the next tick; `None` while paused.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.running
            .then(|| self.next_due.saturating_duration_since(now))
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Re-arm a full period from `now`, so time spent paused never turns into ticks.
    pub fn resume(&mut self, now: Instant) {
        self.running = true;
        self.next_due = now + self.period;
    }

    /// Flip between paused and running. Returns true if now running.
    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.running {
            self.pause();
        } else {
            self.resume(now);
        }
        self.running
    }
}
