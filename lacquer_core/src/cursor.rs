// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer cursor shapes.
//!
//! The set mirrors the compositor cursor-shape protocol. Shapes are applied
//! either by asking the compositor to draw them or, when that protocol is
//! missing, by loading the image of the same name from the cursor theme.

/// A named pointer cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorShape {
    /// The default arrow.
    #[default]
    Default,
    /// A context menu is available.
    ContextMenu,
    /// Help is available.
    Help,
    /// A link or clickable element.
    Pointer,
    /// Busy, but still interactive.
    Progress,
    /// Busy, not interactive.
    Wait,
    /// A table cell can be selected.
    Cell,
    /// Precise selection.
    Crosshair,
    /// Text can be selected.
    Text,
    /// Vertical text can be selected.
    VerticalText,
    /// An alias or shortcut will be created.
    Alias,
    /// Something will be copied.
    Copy,
    /// Something will be moved.
    Move,
    /// The drop target rejects the item.
    NoDrop,
    /// The action is not allowed.
    NotAllowed,
    /// Something can be grabbed.
    Grab,
    /// Something is being grabbed.
    Grabbing,
    /// Resize towards the east.
    EResize,
    /// Resize towards the north.
    NResize,
    /// Resize towards the north-east.
    NeResize,
    /// Resize towards the north-west.
    NwResize,
    /// Resize towards the south.
    SResize,
    /// Resize towards the south-east.
    SeResize,
    /// Resize towards the south-west.
    SwResize,
    /// Resize towards the west.
    WResize,
    /// Bidirectional resize (ew).
    EwResize,
    /// Bidirectional resize (ns).
    NsResize,
    /// Bidirectional resize (nesw).
    NeswResize,
    /// Bidirectional resize (nwse).
    NwseResize,
    /// A column can be resized.
    ColResize,
    /// A row can be resized.
    RowResize,
    /// Scrolling in any direction.
    AllScroll,
    /// Zoom in.
    ZoomIn,
    /// Zoom out.
    ZoomOut,
}

impl CursorShape {
    /// Every shape, in protocol order.
    pub const ALL: [Self; 34] = [
        Self::Default,
        Self::ContextMenu,
        Self::Help,
        Self::Pointer,
        Self::Progress,
        Self::Wait,
        Self::Cell,
        Self::Crosshair,
        Self::Text,
        Self::VerticalText,
        Self::Alias,
        Self::Copy,
        Self::Move,
        Self::NoDrop,
        Self::NotAllowed,
        Self::Grab,
        Self::Grabbing,
        Self::EResize,
        Self::NResize,
        Self::NeResize,
        Self::NwResize,
        Self::SResize,
        Self::SeResize,
        Self::SwResize,
        Self::WResize,
        Self::EwResize,
        Self::NsResize,
        Self::NeswResize,
        Self::NwseResize,
        Self::ColResize,
        Self::RowResize,
        Self::AllScroll,
        Self::ZoomIn,
        Self::ZoomOut,
    ];

    /// Cursor theme name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ContextMenu => "context-menu",
            Self::Help => "help",
            Self::Pointer => "pointer",
            Self::Progress => "progress",
            Self::Wait => "wait",
            Self::Cell => "cell",
            Self::Crosshair => "crosshair",
            Self::Text => "text",
            Self::VerticalText => "vertical-text",
            Self::Alias => "alias",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::NoDrop => "no-drop",
            Self::NotAllowed => "not-allowed",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
            Self::EResize => "e-resize",
            Self::NResize => "n-resize",
            Self::NeResize => "ne-resize",
            Self::NwResize => "nw-resize",
            Self::SResize => "s-resize",
            Self::SeResize => "se-resize",
            Self::SwResize => "sw-resize",
            Self::WResize => "w-resize",
            Self::EwResize => "ew-resize",
            Self::NsResize => "ns-resize",
            Self::NeswResize => "nesw-resize",
            Self::NwseResize => "nwse-resize",
            Self::ColResize => "col-resize",
            Self::RowResize => "row-resize",
            Self::AllScroll => "all-scroll",
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
        }
    }

    /// Shape for a theme name, accepting `-` or `_` as separator.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| {
            let canonical = shape.name();
            canonical.len() == name.len()
                && canonical
                    .bytes()
                    .zip(name.bytes())
                    .all(|(a, b)| a == b || (a == b'-' && b == b'_'))
        })
    }

    /// Index into the protocol's shape enumeration, which starts at one.
    #[must_use]
    pub fn protocol_index(self) -> u32 {
        let position = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        u32::try_from(position).unwrap_or(0) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::CursorShape;

    #[test]
    fn names_are_unique_and_hyphenated() {
        for (i, a) in CursorShape::ALL.iter().enumerate() {
            assert!(!a.name().contains('_'), "{a:?}");
            for b in &CursorShape::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test]
    fn from_name_accepts_both_separators() {
        assert_eq!(CursorShape::from_name("not-allowed"), Some(CursorShape::NotAllowed));
        assert_eq!(CursorShape::from_name("nwse_resize"), Some(CursorShape::NwseResize));
        assert_eq!(CursorShape::from_name("text"), Some(CursorShape::Text));
        assert_eq!(CursorShape::from_name("nope"), None);
    }

    #[test]
    fn protocol_indices_start_at_one() {
        assert_eq!(CursorShape::Default.protocol_index(), 1);
        assert_eq!(CursorShape::ZoomOut.protocol_index(), 34);
    }
}
