// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Events delivered to the application.
//!
//! Protocol callbacks translate compositor messages into [`Event`]s and push
//! them onto the context's queue. Positions are surface-local logical
//! coordinates; add the output origin to get global coordinates.

use crate::geometry::Point;
use crate::id::{OutputId, SeatId, SurfaceId};

/// Pressed or released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonState {
    /// The button went down.
    Pressed,
    /// The button went up.
    Released,
}

/// Pressed or released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// The key went down.
    Pressed,
    /// The key went up.
    Released,
}

/// Which surface an input device is currently over, and on which output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Focus {
    /// Output the surface was created for, if any.
    pub output: Option<OutputId>,
    /// The entered surface.
    pub surface: SurfaceId,
}

/// An event from the compositor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// The compositor negotiated a size for a layer surface.
    ///
    /// Consumed by the dispatcher to resize render targets; never delivered
    /// to the application.
    LayerSurfaceConfigure {
        /// Output the surface belongs to.
        output: Option<OutputId>,
        /// The configured surface.
        surface: SurfaceId,
        /// Negotiated width in logical units.
        width: u32,
        /// Negotiated height in logical units.
        height: u32,
    },
    /// A pointer entered a surface.
    PointerEnter {
        /// Originating seat.
        seat: SeatId,
        /// Entered surface and its output.
        focus: Focus,
        /// Surface-local position.
        position: Point,
    },
    /// A pointer left a surface.
    PointerLeave {
        /// Originating seat.
        seat: SeatId,
        /// Surface that was left.
        focus: Focus,
    },
    /// A pointer moved within its focused surface.
    PointerMotion {
        /// Originating seat.
        seat: SeatId,
        /// Focused surface, if the enter was seen.
        focus: Option<Focus>,
        /// Surface-local position.
        position: Point,
    },
    /// A pointer button changed state.
    PointerButton {
        /// Originating seat.
        seat: SeatId,
        /// Focused surface, if the enter was seen.
        focus: Option<Focus>,
        /// Linux input event code.
        button: u32,
        /// New state.
        state: ButtonState,
    },
    /// Keyboard focus entered a surface.
    KeyboardEnter {
        /// Originating seat.
        seat: SeatId,
        /// Entered surface and its output.
        focus: Focus,
    },
    /// Keyboard focus left a surface.
    KeyboardLeave {
        /// Originating seat.
        seat: SeatId,
        /// Surface that was left.
        focus: Focus,
    },
    /// A key changed state.
    KeyboardKey {
        /// Originating seat.
        seat: SeatId,
        /// Focused surface, if the enter was seen.
        focus: Option<Focus>,
        /// Linux input event code.
        key: u32,
        /// New state.
        state: KeyState,
    },
    /// A touch point appeared.
    TouchDown {
        /// Originating seat.
        seat: SeatId,
        /// Touched surface and its output.
        focus: Focus,
        /// Touch point identifier, unique while the point is down.
        touch_id: i32,
        /// Surface-local position.
        position: Point,
    },
    /// A touch point was lifted.
    TouchUp {
        /// Originating seat.
        seat: SeatId,
        /// Surface the point went down on, if known.
        focus: Option<Focus>,
        /// Touch point identifier.
        touch_id: i32,
    },
    /// A touch point moved.
    TouchMotion {
        /// Originating seat.
        seat: SeatId,
        /// Surface the point went down on, if known.
        focus: Option<Focus>,
        /// Touch point identifier.
        touch_id: i32,
        /// Surface-local position.
        position: Point,
    },
}

impl Event {
    /// Whether the dispatcher consumes this event itself.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(self, Self::LayerSurfaceConfigure { .. })
    }

    /// Seat the event originated from, for input events.
    #[must_use]
    pub const fn seat(&self) -> Option<SeatId> {
        match self {
            Self::LayerSurfaceConfigure { .. } => None,
            Self::PointerEnter { seat, .. }
            | Self::PointerLeave { seat, .. }
            | Self::PointerMotion { seat, .. }
            | Self::PointerButton { seat, .. }
            | Self::KeyboardEnter { seat, .. }
            | Self::KeyboardLeave { seat, .. }
            | Self::KeyboardKey { seat, .. }
            | Self::TouchDown { seat, .. }
            | Self::TouchUp { seat, .. }
            | Self::TouchMotion { seat, .. } => Some(*seat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Key;

    #[test]
    fn only_configure_is_infrastructure() {
        let surface = SurfaceId::from_parts(0, 0);
        let seat = SeatId::from_parts(0, 0);
        let configure = Event::LayerSurfaceConfigure {
            output: None,
            surface,
            width: 10,
            height: 10,
        };
        let key = Event::KeyboardKey {
            seat,
            focus: None,
            key: 1,
            state: KeyState::Pressed,
        };
        assert!(configure.is_infrastructure());
        assert!(!key.is_infrastructure());
        assert_eq!(configure.seat(), None);
        assert_eq!(key.seat(), Some(seat));
    }
}
