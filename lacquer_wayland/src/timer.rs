// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic clock reads and the frame rate limiter.
//!
//! [`FrameTimer`] brackets one loop iteration. When an iteration finishes
//! early it sleeps off the remainder of the frame budget, then feeds the
//! measured duration (sleep overshoot included) into
//! [`FrameStats`](lacquer_core::stats::FrameStats). Time spent on the
//! statistics themselves is carried into the next sample.

use std::time::Duration;

use lacquer_core::stats::FrameStats;
use rustix::time::{ClockId, Timespec, clock_gettime};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Monotonic time in nanoseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant(pub u64);

impl Instant {
    /// Seconds elapsed from `earlier` to `self`, or zero if `earlier` is later.
    #[must_use]
    pub fn seconds_since(self, earlier: Self) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / 1e9
    }
}

/// Returns the current `CLOCK_MONOTONIC` time.
#[must_use]
pub fn now() -> Instant {
    timespec_to_instant(clock_gettime(ClockId::Monotonic))
}

fn timespec_to_instant(timespec: Timespec) -> Instant {
    let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
    let nanos = u64::try_from(timespec.tv_nsec)
        .unwrap_or(0)
        .min(999_999_999);

    let ticks_u128 = u128::from(seconds)
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(u128::from(nanos));
    Instant(u64::try_from(ticks_u128).unwrap_or(u64::MAX))
}

/// Measures, smooths, and rate-limits loop iterations.
#[derive(Clone, Debug)]
pub struct FrameTimer {
    stats: FrameStats,
    start: Instant,
    carried: f64,
}

impl FrameTimer {
    /// A timer limiting to `max_fps` frames per second, or unlimited if zero.
    #[must_use]
    pub fn new(max_fps: u32) -> Self {
        Self {
            stats: FrameStats::new(max_fps),
            start: now(),
            carried: 0.0,
        }
    }

    /// Smoothed frame duration in seconds.
    #[must_use]
    pub fn delta_time(&self) -> f64 {
        self.stats.delta_time()
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> u32 {
        self.stats.fps()
    }

    /// Configured frame rate cap.
    #[must_use]
    pub fn max_fps(&self) -> u32 {
        self.stats.max_fps()
    }

    /// Marks the start of an iteration.
    pub fn start_frame(&mut self) {
        self.start = now();
    }

    /// Marks the end of an iteration, sleeping if it finished early.
    pub fn end_frame(&mut self) {
        let mut raw = now().seconds_since(self.start) + self.carried;

        if let Some(budget) = self.stats.frame_budget()
            && raw < budget
        {
            let before = now();
            std::thread::sleep(Duration::from_secs_f64(budget - raw));
            raw += now().seconds_since(before);
        }

        let calc_start = now();
        self.stats.record(raw);
        self.carried = now().seconds_since(calc_start);
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameTimer, Instant, now, timespec_to_instant};
    use rustix::time::Timespec;

    #[test]
    fn now_is_monotonic_non_decreasing() {
        let first = now();
        let second = now();
        assert!(second >= first, "monotonic clock should not go backwards");
    }

    #[test]
    fn timespec_conversion_builds_nanoseconds() {
        let input = Timespec {
            tv_sec: 12,
            tv_nsec: 345_678_901,
        };
        assert_eq!(
            timespec_to_instant(input),
            Instant(12 * 1_000_000_000 + 345_678_901)
        );
    }

    #[test]
    fn timespec_conversion_saturates_on_large_values() {
        let input = Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 999_999_999,
        };
        assert_eq!(timespec_to_instant(input), Instant(u64::MAX));
    }

    #[test]
    fn seconds_since_clamps_negative_spans() {
        assert_eq!(Instant(5).seconds_since(Instant(10)), 0.0);
        assert_eq!(Instant(1_500_000_000).seconds_since(Instant(500_000_000)), 1.0);
    }

    #[test]
    fn fast_frames_are_stretched_to_the_budget() {
        let mut timer = FrameTimer::new(50);
        let before = now();
        timer.start_frame();
        timer.end_frame();
        let elapsed = now().seconds_since(before);
        // 20 ms budget; allow for coarse timers.
        assert!(elapsed >= 0.018, "slept only {elapsed}s");
        assert!(timer.delta_time() >= 0.018, "recorded {}", timer.delta_time());
        assert!(timer.fps() <= 55, "fps {}", timer.fps());
    }

    #[test]
    fn unlimited_timer_does_not_sleep() {
        let mut timer = FrameTimer::new(0);
        let before = now();
        timer.start_frame();
        timer.end_frame();
        assert!(now().seconds_since(before) < 0.5);
        assert_eq!(timer.max_fps(), 0);
    }
}
