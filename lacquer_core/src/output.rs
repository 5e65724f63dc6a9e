// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output geometry accumulation.
//!
//! An output's rectangle arrives piecemeal and asynchronously: the core
//! output object reports a position, a transform, an integer scale, and a
//! mode in device pixels, while the output-geometry service later reports
//! the DPI-adjusted logical position and size. [`OutputGeometry`] records
//! whatever has arrived so far and resolves it to one logical [`Rect`].
//!
//! Logical reports win field by field once received. The core output
//! reports are only a fallback, with the mode size divided by the integer
//! scale and swapped for quarter-turn transforms.

use crate::geometry::Rect;

/// Partially reported geometry of one output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputGeometry {
    position: Option<(i32, i32)>,
    mode_size: Option<(i32, i32)>,
    scale: i32,
    rotated: bool,
    logical_position: Option<(i32, i32)>,
    logical_size: Option<(i32, i32)>,
}

impl Default for OutputGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputGeometry {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            position: None,
            mode_size: None,
            scale: 1,
            rotated: false,
            logical_position: None,
            logical_size: None,
        }
    }

    /// Records the position and transform from the core output object.
    pub fn set_position(&mut self, x: i32, y: i32, rotated: bool) {
        self.position = Some((x, y));
        self.rotated = rotated;
    }

    /// Records the size of the current mode in device pixels.
    pub fn set_mode_size(&mut self, width: i32, height: i32) {
        self.mode_size = Some((width, height));
    }

    /// Records the integer buffer scale. Non-positive values are ignored.
    pub fn set_scale(&mut self, scale: i32) {
        if scale > 0 {
            self.scale = scale;
        }
    }

    /// Records the logical position from the output-geometry service.
    pub fn set_logical_position(&mut self, x: i32, y: i32) {
        self.logical_position = Some((x, y));
    }

    /// Records the logical size from the output-geometry service.
    pub fn set_logical_size(&mut self, width: i32, height: i32) {
        self.logical_size = Some((width, height));
    }

    /// Whether both logical fields have been reported.
    #[must_use]
    pub const fn is_logical(&self) -> bool {
        self.logical_position.is_some() && self.logical_size.is_some()
    }

    /// Integer scale reported by the core output object.
    #[must_use]
    pub const fn scale(&self) -> i32 {
        self.scale
    }

    /// Resolves the best known logical rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        let (x, y) = self
            .logical_position
            .or(self.position)
            .unwrap_or((0, 0));
        let (w, h) = self.logical_size.or_else(|| self.fallback_size()).unwrap_or((0, 0));
        Rect::new(x, y, w, h)
    }

    fn fallback_size(&self) -> Option<(i32, i32)> {
        let (w, h) = self.mode_size?;
        let (w, h) = (w / self.scale, h / self.scale);
        Some(if self.rotated { (h, w) } else { (w, h) })
    }
}

#[cfg(test)]
mod tests {
    use super::OutputGeometry;
    use crate::geometry::Rect;

    #[test]
    fn empty_geometry_is_zero_rect() {
        assert_eq!(OutputGeometry::new().rect(), Rect::default());
    }

    #[test]
    fn mode_fallback_is_divided_by_scale() {
        let mut g = OutputGeometry::new();
        g.set_position(1920, 0, false);
        g.set_mode_size(3840, 2160);
        g.set_scale(2);
        assert_eq!(g.rect(), Rect::new(1920, 0, 1920, 1080));
        assert!(!g.is_logical());
    }

    #[test]
    fn rotated_mode_swaps_axes() {
        let mut g = OutputGeometry::new();
        g.set_position(0, 0, true);
        g.set_mode_size(1920, 1080);
        assert_eq!(g.rect(), Rect::new(0, 0, 1080, 1920));
    }

    #[test]
    fn logical_reports_win_field_by_field() {
        let mut g = OutputGeometry::new();
        g.set_position(0, 0, false);
        g.set_mode_size(2880, 1800);
        g.set_logical_size(1920, 1200);
        assert_eq!(g.rect(), Rect::new(0, 0, 1920, 1200));

        g.set_logical_position(2560, 0);
        assert_eq!(g.rect(), Rect::new(2560, 0, 1920, 1200));
        assert!(g.is_logical());

        // Late core reports do not override logical values.
        g.set_position(5, 5, false);
        g.set_mode_size(100, 100);
        assert_eq!(g.rect(), Rect::new(2560, 0, 1920, 1200));
    }

    #[test]
    fn non_positive_scale_is_ignored() {
        let mut g = OutputGeometry::new();
        g.set_scale(0);
        g.set_mode_size(800, 600);
        assert_eq!(g.scale(), 1);
        assert_eq!(g.rect().extent().width, 800);
    }
}
