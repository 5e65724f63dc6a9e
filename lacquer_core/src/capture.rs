// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen capture handshake.
//!
//! A capture runs `Pending -> Ready -> Pending -> Done`: the compositor first
//! advertises the buffer it wants, the client allocates it and requests the
//! copy, and the compositor then reports completion. `Failed` may arrive at
//! any point and is terminal.

/// Observable state of a capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// Waiting on the compositor.
    Pending,
    /// A buffer was advertised; the client must allocate and copy.
    Ready,
    /// The copy completed.
    Done,
    /// The compositor refused or aborted the capture.
    Failed,
}

/// Capture state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureMachine {
    state: CaptureState,
    copying: bool,
}

impl Default for CaptureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureMachine {
    /// A capture that has just been requested.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CaptureState::Pending,
            copying: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// Whether the caller must keep servicing the connection.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, CaptureState::Pending)
    }

    /// Whether no further transitions can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.state, CaptureState::Done | CaptureState::Failed)
    }

    /// The compositor finished advertising the buffer it will copy into.
    ///
    /// Ignored once the copy has been requested.
    pub fn buffer_advertised(&mut self) {
        if self.state == CaptureState::Pending && !self.copying {
            self.state = CaptureState::Ready;
        }
    }

    /// The client allocated the buffer and requested the copy.
    ///
    /// Returns `false` unless the machine was `Ready`.
    pub fn copy_requested(&mut self) -> bool {
        if self.state == CaptureState::Ready {
            self.state = CaptureState::Pending;
            self.copying = true;
            true
        } else {
            false
        }
    }

    /// The compositor reported the copy as complete.
    pub fn copied(&mut self) {
        if self.state == CaptureState::Pending && self.copying {
            self.state = CaptureState::Done;
        }
    }

    /// The compositor reported failure.
    pub fn failed(&mut self) {
        if !self.is_terminal() {
            self.state = CaptureState::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CaptureMachine, CaptureState};
    use alloc::vec::Vec;

    #[derive(Clone, Copy, Debug)]
    enum Step {
        Advertise,
        Copy,
        Copied,
        Fail,
    }

    const STEPS: [Step; 4] = [Step::Advertise, Step::Copy, Step::Copied, Step::Fail];

    fn apply(machine: &mut CaptureMachine, step: Step) {
        match step {
            Step::Advertise => machine.buffer_advertised(),
            Step::Copy => {
                let _ = machine.copy_requested();
            }
            Step::Copied => machine.copied(),
            Step::Fail => machine.failed(),
        }
    }

    #[test]
    fn happy_path_passes_through_ready() {
        let mut m = CaptureMachine::new();
        assert!(m.is_pending());
        m.buffer_advertised();
        assert_eq!(m.state(), CaptureState::Ready);
        assert!(m.copy_requested());
        assert!(m.is_pending());
        m.copied();
        assert_eq!(m.state(), CaptureState::Done);
    }

    #[test]
    fn copied_before_copy_request_is_ignored() {
        let mut m = CaptureMachine::new();
        m.copied();
        assert_eq!(m.state(), CaptureState::Pending);
        assert!(!m.copy_requested());
    }

    #[test]
    fn every_step_sequence_respects_ordering() {
        // Every sequence of five steps; each prefix is checked as it runs.
        const LEN: u32 = 5;
        for code in 0..STEPS.len().pow(LEN) {
            let seq: Vec<Step> = (0..LEN)
                .map(|i| STEPS[code / STEPS.len().pow(i) % STEPS.len()])
                .collect();

            let mut m = CaptureMachine::new();
            let mut seen_ready = false;
            let mut terminal: Option<CaptureState> = None;
            for step in seq.iter().copied() {
                apply(&mut m, step);
                let state = m.state();
                if let Some(t) = terminal {
                    assert_eq!(state, t, "terminal state changed in {seq:?}");
                }
                if state == CaptureState::Ready {
                    seen_ready = true;
                }
                if state == CaptureState::Done {
                    assert!(seen_ready, "done without ready in {seq:?}");
                }
                if m.is_terminal() {
                    terminal = Some(state);
                }
            }
        }
    }
}
