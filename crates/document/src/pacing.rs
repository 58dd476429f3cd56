//! Rate limiting for event-driven callers.
//!
//! Neither primitive owns a timer. Callers report events with `call(now)` and
//! later ask `poll(now)` whether a deferred run is due, which keeps every
//! handler a plain function of the time it is given.

use std::time::{Duration, Instant};

/// Leading and trailing edge throttle: the first call in a window runs
/// immediately, further calls in that window collapse into one trailing run.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
    trailing: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            trailing: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` when the operation should run now.
    pub fn call(&mut self, now: Instant) -> bool {
        match self.last_run {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.trailing = true;
                false
            }
            _ => {
                self.last_run = Some(now);
                self.trailing = false;
                true
            }
        }
    }

    /// Returns `true` when a trailing run is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_run {
            Some(last) if self.trailing && now.saturating_duration_since(last) >= self.interval => {
                self.last_run = Some(now);
                self.trailing = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.trailing
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.last_run {
            Some(last) if self.trailing => Some(last + self.interval),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.trailing = false;
    }
}

/// Trailing-edge debounce: runs once, `delay` after the last call.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn call(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
