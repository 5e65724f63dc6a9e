// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Smoothed frame statistics.
//!
//! Raw frame durations go into a fixed ring. Once the ring holds more than
//! `2 * TRIM` samples, the `TRIM` highest and lowest are dropped before
//! averaging so that scheduler jitter does not show up in the reported
//! frame rate or in delta-time-driven animation.

/// Number of raw samples kept.
pub const SAMPLE_CAPACITY: usize = 10;

/// Number of highest and of lowest samples excluded from the mean.
pub const TRIM: usize = 2;

/// Mean of `samples` with `trim` outliers dropped from each end.
///
/// Falls back to a plain mean when there are not more than `2 * trim`
/// samples. Sorts `samples` in place. Returns zero for an empty slice.
#[must_use]
pub fn trimmed_mean(samples: &mut [f64], trim: usize) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let kept: &[f64] = if samples.len() > 2 * trim {
        samples.sort_unstable_by(f64::total_cmp);
        &samples[trim..samples.len() - trim]
    } else {
        samples
    };
    let sum: f64 = kept.iter().sum();
    let count = kept.len() as f64;
    sum / count
}

/// Ring of raw frame durations and the values derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameStats {
    samples: [f64; SAMPLE_CAPACITY],
    len: usize,
    next: usize,
    max_fps: u32,
    delta_time: f64,
    fps: u32,
}

impl FrameStats {
    /// Statistics seeded as if every frame took exactly `1 / max_fps`.
    ///
    /// A `max_fps` of zero means unlimited; the seed then assumes 60 Hz.
    #[must_use]
    pub fn new(max_fps: u32) -> Self {
        let seed_fps = if max_fps == 0 { 60 } else { max_fps };
        Self {
            samples: [0.0; SAMPLE_CAPACITY],
            len: 0,
            next: 0,
            max_fps,
            delta_time: 1.0 / f64::from(seed_fps),
            fps: seed_fps,
        }
    }

    /// Frame rate cap, zero when unlimited.
    #[must_use]
    pub const fn max_fps(&self) -> u32 {
        self.max_fps
    }

    /// Minimum frame duration in seconds, if limiting is enabled.
    #[must_use]
    pub fn frame_budget(&self) -> Option<f64> {
        (self.max_fps > 0).then(|| 1.0 / f64::from(self.max_fps))
    }

    /// Smoothed frame duration in seconds.
    #[must_use]
    pub const fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Smoothed frames per second, truncated.
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    /// Number of samples currently in the ring.
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.len
    }

    /// Records one raw frame duration in seconds and refreshes the
    /// smoothed values.
    pub fn record(&mut self, raw: f64) {
        self.samples[self.next] = raw;
        self.next = (self.next + 1) % SAMPLE_CAPACITY;
        if self.len < SAMPLE_CAPACITY {
            self.len += 1;
        }

        let mut scratch = self.samples;
        let mean = trimmed_mean(&mut scratch[..self.len], TRIM);
        self.delta_time = mean;
        self.fps = fps_from_delta(mean);
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "frame rate is reported truncated; the float cast saturates"
)]
fn fps_from_delta(delta: f64) -> u32 {
    if delta > 0.0 { (1.0 / delta) as u32 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::{FrameStats, SAMPLE_CAPACITY, TRIM, trimmed_mean};

    const FRAME_64HZ: f64 = 1.0 / 64.0;

    #[test]
    fn short_sequences_use_plain_mean() {
        let mut samples = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(trimmed_mean(&mut samples, 2), 2.5);
        assert_eq!(trimmed_mean(&mut [], 2), 0.0);
    }

    #[test]
    fn long_sequences_drop_outliers_on_both_ends() {
        let mut samples = [100.0, 1.0, 0.5, 1.0, 0.0];
        // Sorted: 0.0 0.5 | 1.0 | 1.0 100.0
        assert_eq!(trimmed_mean(&mut samples, 2), 1.0);

        let mut samples = [9.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.0];
        assert_eq!(trimmed_mean(&mut samples, 2), 4.0);
    }

    #[test]
    fn initial_values_assume_max_fps() {
        let stats = FrameStats::new(60);
        assert_eq!(stats.fps(), 60);
        assert_eq!(stats.delta_time(), 1.0 / 60.0);
        assert_eq!(stats.frame_budget(), Some(1.0 / 60.0));

        let unlimited = FrameStats::new(0);
        assert_eq!(unlimited.frame_budget(), None);
        assert_eq!(unlimited.fps(), 60);
    }

    #[test]
    fn spikes_do_not_move_the_reported_rate() {
        let mut stats = FrameStats::new(60);
        for _ in 0..8 {
            stats.record(FRAME_64HZ);
        }
        stats.record(1.0);
        stats.record(0.0);
        assert_eq!(stats.sample_count(), SAMPLE_CAPACITY);
        assert_eq!(stats.delta_time(), FRAME_64HZ);
        assert_eq!(stats.fps(), 64);
    }

    #[test]
    fn ring_forgets_old_samples() {
        let mut stats = FrameStats::new(60);
        for _ in 0..SAMPLE_CAPACITY {
            stats.record(0.5);
        }
        assert_eq!(stats.fps(), 2);
        for _ in 0..SAMPLE_CAPACITY {
            stats.record(FRAME_64HZ);
        }
        assert_eq!(stats.fps(), 64);
    }

    #[test]
    fn few_samples_are_averaged_untrimmed() {
        let mut stats = FrameStats::new(60);
        for _ in 0..2 * TRIM {
            stats.record(0.25);
        }
        stats.record(0.25);
        assert_eq!(stats.fps(), 4);

        let mut stats = FrameStats::new(60);
        stats.record(0.5);
        stats.record(0.25);
        assert_eq!(stats.delta_time(), 0.375);
        assert_eq!(stats.fps(), 2);
    }

    #[test]
    fn synthetic_sequence_is_reproducible() {
        let sequence = [0.016, 0.017, 0.015, 0.030, 0.016, 0.016, 0.001, 0.016];
        let run = || {
            let mut stats = FrameStats::new(60);
            for s in sequence {
                stats.record(s);
            }
            (stats.fps(), stats.delta_time())
        };
        assert_eq!(run(), run());
    }
}
