//! # Frame Timer
//!
//! Monotonic wall-clock sampler for the scheduler. `get()` returns the
//! seconds elapsed since the previous `get()` and restarts the epoch;
//! `elapsed()` peeks without restarting. The scheduler samples the timer
//! at the top of each game pass and measures pacing sleeps against the
//! same epoch from the draw side.

use std::time::{Duration, Instant};

/// Monotonic elapsed-seconds timer.
#[derive(Debug)]
pub struct Timer {
    epoch: Instant,
}

impl Timer {
    /// Starts a timer with the epoch set to now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Returns seconds since the last `get()` (or construction) and
    /// restarts the epoch.
    pub fn get(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.epoch).as_secs_f32();
        self.epoch = now;
        elapsed
    }

    /// Returns seconds since the current epoch without restarting it.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.epoch.elapsed().as_secs_f32()
    }

    /// How long to sleep so that `target` seconds will have elapsed
    /// since the current epoch. `None` when the deadline already passed.
    #[must_use]
    pub fn remaining(&self, target: f32) -> Option<Duration> {
        let left = target - self.elapsed();
        if left > 0.0 {
            Some(Duration::from_secs_f32(left))
        } else {
            None
        }
    }

    /// Blocks until `target` seconds have elapsed since the current
    /// epoch. Returns immediately when the deadline already passed.
    pub fn wait(&self, target: f32) {
        if let Some(left) = self.remaining(target) {
            std::thread::sleep(left);
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
