// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render policy and per-surface frame pacing.
//!
//! [`RenderState`] is the application's global switch deciding whether a
//! loop iteration paints at all. [`FramePacer`] is per surface and keeps at
//! most one frame callback outstanding: a render requested while one is in
//! flight is remembered as a single dirty flag and replayed once the
//! compositor signals readiness.

/// Whether the run loop paints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderState {
    /// Paint every iteration.
    #[default]
    Always,
    /// Paint on the next iteration, then switch to [`Suppressed`](Self::Suppressed).
    Once,
    /// Do not paint until changed.
    Suppressed,
}

impl RenderState {
    /// Decides whether this iteration paints, demoting `Once` afterwards.
    pub fn begin_pass(&mut self) -> bool {
        match *self {
            Self::Always => true,
            Self::Once => {
                *self = Self::Suppressed;
                true
            }
            Self::Suppressed => false,
        }
    }
}

/// Outcome of a render request against a [`FramePacer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pace {
    /// The surface may be painted now.
    Render,
    /// A frame callback is outstanding; the render was deferred.
    Deferred,
}

/// Tracks the outstanding frame callback of one surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FramePacer {
    not_ready: bool,
    dirty: bool,
}

impl FramePacer {
    /// A pacer with no outstanding callback.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            not_ready: false,
            dirty: false,
        }
    }

    /// Whether a frame callback is outstanding.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !self.not_ready
    }

    /// Whether a render was deferred.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Asks to paint.
    pub fn request(&mut self) -> Pace {
        if self.not_ready {
            self.dirty = true;
            Pace::Deferred
        } else {
            Pace::Render
        }
    }

    /// Records a commit that carried a frame callback request.
    pub fn frame_requested(&mut self) {
        self.not_ready = true;
    }

    /// Handles the frame callback. Returns whether a deferred render must
    /// now be issued.
    pub fn frame_done(&mut self) -> bool {
        self.not_ready = false;
        core::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::{FramePacer, Pace, RenderState};

    #[test]
    fn once_paints_exactly_one_iteration() {
        let mut state = RenderState::Once;
        let passes = (0..5).filter(|_| state.begin_pass()).count();
        assert_eq!(passes, 1);
        assert_eq!(state, RenderState::Suppressed);

        state = RenderState::Always;
        assert!(state.begin_pass());
        assert!(state.begin_pass());
    }

    #[test]
    fn default_state_paints() {
        assert_eq!(RenderState::default(), RenderState::Always);
    }

    #[test]
    fn requests_while_not_ready_collapse_into_one_deferred_render() {
        let mut pacer = FramePacer::new();
        assert_eq!(pacer.request(), Pace::Render);
        pacer.frame_requested();

        for _ in 0..5 {
            assert_eq!(pacer.request(), Pace::Deferred);
        }
        assert!(!pacer.is_ready());
        assert!(pacer.is_dirty());

        assert!(pacer.frame_done(), "one deferred render must fire");
        assert!(pacer.is_ready());
        assert!(!pacer.frame_done(), "dirty is a flag, not a counter");
    }

    #[test]
    fn frame_done_without_requests_is_clean() {
        let mut pacer = FramePacer::new();
        pacer.frame_requested();
        assert!(!pacer.frame_done());
        assert_eq!(pacer.request(), Pace::Render);
    }
}
