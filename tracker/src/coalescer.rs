//! Debounce and throttle state for bursts of navigation signals.
//!
//! Nothing here sleeps or spawns. The owner feeds in the current instant and
//! asks for the next deadline, which keeps the timing rules testable without
//! a runtime.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalesceMode {
    /// Fire once the input has been quiet for the window, with the latest value.
    Debounce,
    /// Fire on the leading edge, then at most once per window with the latest value.
    Throttle,
}

/// Timing state of a single debounced or throttled input.
#[derive(Debug)]
pub struct Coalescer<T> {
    mode: CoalesceMode,
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
    last_fired_at: Option<Instant>,
}

impl<T> Coalescer<T> {
    pub fn debounce(window: Duration) -> Self {
        Self::new(CoalesceMode::Debounce, window)
    }

    pub fn throttle(window: Duration) -> Self {
        Self::new(CoalesceMode::Throttle, window)
    }

    fn new(mode: CoalesceMode, window: Duration) -> Self {
        Self {
            mode,
            window,
            pending: None,
            deadline: None,
            last_fired_at: None,
        }
    }

    /// Feeds a value in. Returns it straight back when it should fire now
    /// (leading edge of a throttle window); otherwise it becomes the pending
    /// value and a deadline is armed.
    pub fn trigger(&mut self, value: T, now: Instant) -> Option<T> {
        match self.mode {
            CoalesceMode::Debounce => {
                self.pending = Some(value);
                self.deadline = Some(now + self.window);
                None
            }
            CoalesceMode::Throttle => {
                if self.deadline.is_some() {
                    self.pending = Some(value);
                    return None;
                }
                match self.last_fired_at {
                    Some(fired) if now < fired + self.window => {
                        self.pending = Some(value);
                        self.deadline = Some(fired + self.window);
                        None
                    }
                    _ => {
                        self.last_fired_at = Some(now);
                        Some(value)
                    }
                }
            }
        }
    }

    /// Takes the pending value once its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                let value = self.pending.take()?;
                self.last_fired_at = Some(now);
                Some(value)
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drops the pending value and disarms the deadline.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }

    /// Takes the pending value regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }
}

/// The two coalescing lanes of the signal loop plus the "last processed URL"
/// gate they share. One instance lives for the whole loop.
#[derive(Debug)]
pub struct EventCoalescer<T> {
    debounce: Coalescer<T>,
    throttle: Coalescer<T>,
    last_url: Option<String>,
}

impl<T> EventCoalescer<T> {
    pub fn new(debounce: Duration, throttle: Duration) -> Self {
        Self {
            debounce: Coalescer::debounce(debounce),
            throttle: Coalescer::throttle(throttle),
            last_url: None,
        }
    }

    pub fn trigger(&mut self, mode: CoalesceMode, value: T, now: Instant) -> Option<T> {
        self.lane(mode).trigger(value, now)
    }

    /// Earliest armed deadline across both lanes.
    pub fn deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.throttle.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// The next value whose deadline has passed, earliest deadline first.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        let debounce_first = match (self.debounce.deadline(), self.throttle.deadline()) {
            (Some(a), Some(b)) => a <= b,
            (a, _) => a.is_some(),
        };
        if debounce_first {
            self.debounce
                .fire(now)
                .or_else(|| self.throttle.fire(now))
        } else {
            self.throttle
                .fire(now)
                .or_else(|| self.debounce.fire(now))
        }
    }

    /// Pending values of both lanes, regardless of deadlines.
    pub fn flush(&mut self) -> Vec<T> {
        [self.debounce.flush(), self.throttle.flush()]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn cancel(&mut self) {
        self.debounce.cancel();
        self.throttle.cancel();
    }

    /// Lets `url` through unless it is the URL processed last.
    pub fn admit(&mut self, url: &str) -> bool {
        if self.last_url.as_deref() == Some(url) {
            return false;
        }
        self.last_url = Some(url.to_string());
        true
    }

    fn lane(&mut self, mode: CoalesceMode) -> &mut Coalescer<T> {
        match mode {
            CoalesceMode::Debounce => &mut self.debounce,
            CoalesceMode::Throttle => &mut self.throttle,
        }
    }
}
