// src/common/timer.rs

use core::time::Duration;

/// A one-shot deadline tracker over a wrapping millisecond counter.
///
/// This is the single timing primitive both acquisition state machines
/// share: started when a measurement is triggered, checked on every poll,
/// stopped when the result is consumed. Timestamps are passed in by the
/// caller rather than read from a clock handle, which keeps this a pure
/// value type.
///
/// Invariant: a stopped (never-started or explicitly stopped) timer never
/// reports expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollTimer {
    started_at_ms: Option<u32>,
}

impl PollTimer {
    /// Creates a stopped timer.
    pub const fn new() -> Self {
        PollTimer { started_at_ms: None }
    }

    /// Records `now_ms` as the reference point for expiry checks.
    /// Restarting a running timer moves the reference point.
    pub fn start(&mut self, now_ms: u32) {
        self.started_at_ms = Some(now_ms);
    }

    /// Returns whether strictly more than `timeout` has elapsed since
    /// `start`. Always false for a stopped timer.
    ///
    /// Wrapping subtraction makes this behave across the counter's
    /// wrap point, as long as `timeout` is much smaller than the full
    /// counter period.
    pub fn expired(&self, now_ms: u32, timeout: Duration) -> bool {
        match self.started_at_ms {
            Some(started) => now_ms.wrapping_sub(started) > timeout.as_millis() as u32,
            None => false,
        }
    }

    /// Clears the reference point; subsequent `expired` calls return
    /// false until the timer is started again.
    pub fn stop(&mut self) {
        self.started_at_ms = None;
    }

    /// Whether the timer currently has a reference point.
    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }
}
