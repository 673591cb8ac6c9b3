//! # Pass Profiler
//!
//! Named-counter timing sampler for the scheduler's frame-pacing
//! diagnostics. Each stat keeps a rolling window of recent samples;
//! debug overlays read averages and maxima while the two tick threads
//! keep recording.

use std::time::Instant;

use parking_lot::Mutex;

/// Number of samples retained per stat.
const HISTORY: usize = 32;

/// The sampled scheduler stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stat {
    /// Full frame interval, one sample per game pass.
    Frame = 0,
    /// Game tick pass duration.
    Game = 1,
    /// Draw tick pass duration.
    Draw = 2,
    /// Handshake/blit gap on the draw side.
    Blit = 3,
}

const STAT_COUNT: usize = 4;

#[derive(Debug)]
struct Counter {
    started: Option<Instant>,
    samples: [f32; HISTORY],
    len: usize,
    cursor: usize,
}

impl Counter {
    const fn new() -> Self {
        Self {
            started: None,
            samples: [0.0; HISTORY],
            len: 0,
            cursor: 0,
        }
    }

    fn record(&mut self, seconds: f32) {
        self.samples[self.cursor] = seconds;
        self.cursor = (self.cursor + 1) % HISTORY;
        self.len = (self.len + 1).min(HISTORY);
    }

    fn avg(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        self.samples[..self.len].iter().sum::<f32>() / self.len as f32
    }

    fn max(&self) -> f32 {
        self.samples[..self.len]
            .iter()
            .copied()
            .fold(0.0_f32, f32::max)
    }

    fn last(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        self.samples[(self.cursor + HISTORY - 1) % HISTORY]
    }
}

/// Thread-safe timing sampler keyed by [`Stat`].
///
/// `start`/`stop` pairs are cheap enough to wrap every pass; a `stop`
/// without a matching `start` is ignored (the very first frame stops
/// [`Stat::Frame`] before ever starting it).
#[derive(Debug)]
pub struct Profiler {
    counters: Mutex<[Counter; STAT_COUNT]>,
}

impl Profiler {
    /// Creates a profiler with empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: Mutex::new([
                Counter::new(),
                Counter::new(),
                Counter::new(),
                Counter::new(),
            ]),
        }
    }

    /// Begins timing a stat. Restarts the window if already running.
    pub fn start(&self, stat: Stat) {
        self.counters.lock()[stat as usize].started = Some(Instant::now());
    }

    /// Ends timing a stat and records the sample. A stop without a
    /// matching start records nothing.
    pub fn stop(&self, stat: Stat) {
        let mut counters = self.counters.lock();
        let counter = &mut counters[stat as usize];
        if let Some(started) = counter.started.take() {
            counter.record(started.elapsed().as_secs_f32());
        }
    }

    /// Average of the retained samples, in seconds.
    #[must_use]
    pub fn avg(&self, stat: Stat) -> f32 {
        self.counters.lock()[stat as usize].avg()
    }

    /// Maximum of the retained samples, in seconds.
    #[must_use]
    pub fn max(&self, stat: Stat) -> f32 {
        self.counters.lock()[stat as usize].max()
    }

    /// Most recent sample, in seconds.
    #[must_use]
    pub fn last(&self, stat: Stat) -> f32 {
        self.counters.lock()[stat as usize].last()
    }

    /// One-line summary for logs and the soak binary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "frame {:.2}ms avg ({:.1} fps) | game {:.2}/{:.2}ms | draw {:.2}/{:.2}ms | blit {:.2}ms",
            self.avg(Stat::Frame) * 1e3,
            if self.avg(Stat::Frame) > 0.0 {
                1.0 / self.avg(Stat::Frame)
            } else {
                0.0
            },
            self.avg(Stat::Game) * 1e3,
            self.max(Stat::Game) * 1e3,
            self.avg(Stat::Draw) * 1e3,
            self.max(Stat::Draw) * 1e3,
            self.avg(Stat::Blit) * 1e3,
        )
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_empty_counters_read_zero() {
        let p = Profiler::new();
        assert_eq!(p.avg(Stat::Frame), 0.0);
        assert_eq!(p.max(Stat::Game), 0.0);
        assert_eq!(p.last(Stat::Draw), 0.0);
    }

    #[test]
    fn test_stop_without_start_is_ignored() {
        let p = Profiler::new();
        p.stop(Stat::Frame);
        assert_eq!(p.avg(Stat::Frame), 0.0);
    }

    #[test]
    fn test_start_stop_records_sample() {
        let p = Profiler::new();
        p.start(Stat::Game);
        thread::sleep(Duration::from_millis(10));
        p.stop(Stat::Game);

        let last = p.last(Stat::Game);
        assert!(last >= 0.009, "measured {last}");
        assert!(p.avg(Stat::Game) > 0.0);
        assert!(p.max(Stat::Game) >= last);
    }

    #[test]
    fn test_window_rolls_over() {
        let p = Profiler::new();
        for _ in 0..(HISTORY + 8) {
            p.start(Stat::Blit);
            p.stop(Stat::Blit);
        }
        // Still well-formed after wraparound.
        assert!(p.avg(Stat::Blit) >= 0.0);
        assert!(p.max(Stat::Blit) >= p.avg(Stat::Blit));
    }
}
