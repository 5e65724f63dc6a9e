// Copyright 2026 the Lacquer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Logical-space geometry and hit predicates.
//!
//! All rectangles live in the compositor's global logical coordinate space,
//! where each output occupies one [`Rect`]. The predicates answer "does this
//! shape touch this output?" so that a paint request expressed in global
//! coordinates can be routed to the outputs it lands on and translated into
//! each output's local coordinates with [`Rect::to_local`].

/// A point in logical coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A size in whole logical units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Extent {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Extent {
    /// Creates an extent.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned integer rectangle in logical coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: i32,
    /// Height.
    pub h: i32,
}

impl Rect {
    /// Creates a rectangle from its origin and size.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Whether the rectangle has no area.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// The size of the rectangle, clamping negative dimensions to zero.
    #[must_use]
    pub fn extent(self) -> Extent {
        Extent::new(
            u32::try_from(self.w).unwrap_or(0),
            u32::try_from(self.h).unwrap_or(0),
        )
    }

    /// Whether `p` lies strictly inside the rectangle.
    ///
    /// Points on an edge belong to neither neighbour.
    #[must_use]
    pub fn contains_point(self, p: Point) -> bool {
        p.x > f64::from(self.x)
            && p.x < f64::from(self.right())
            && p.y > f64::from(self.y)
            && p.y < f64::from(self.bottom())
    }

    /// Whether the two rectangles overlap with non-zero area.
    #[must_use]
    pub const fn intersects_rect(self, other: Self) -> bool {
        other.x < self.right()
            && other.right() > self.x
            && other.y < self.bottom()
            && other.bottom() > self.y
    }

    /// Whether the square with top-left corner `origin` and side `size`
    /// overlaps the rectangle.
    #[must_use]
    pub fn intersects_square(self, origin: Point, size: f64) -> bool {
        origin.x < f64::from(self.right())
            && origin.x + size > f64::from(self.x)
            && origin.y < f64::from(self.bottom())
            && origin.y + size > f64::from(self.y)
    }

    /// Whether a circle overlaps the rectangle.
    ///
    /// Rejects on the expanded bounding box first, accepts anything whose
    /// centre projects onto an edge span, and otherwise tests the nearest
    /// corner distance.
    #[must_use]
    pub fn intersects_circle(self, center: Point, radius: f64) -> bool {
        let half_w = f64::from(self.w) / 2.0;
        let half_h = f64::from(self.h) / 2.0;
        let dx = abs(f64::from(self.x) + half_w - center.x);
        let dy = abs(f64::from(self.y) + half_h - center.y);

        if dx > half_w + radius || dy > half_h + radius {
            return false;
        }
        if dx <= half_w || dy <= half_h {
            return true;
        }
        let cx = dx - half_w;
        let cy = dy - half_h;
        cx * cx + cy * cy <= radius * radius
    }

    /// Whether all three vertices of a triangle lie strictly inside.
    #[must_use]
    pub fn contains_triangle(self, a: Point, b: Point, c: Point) -> bool {
        self.contains_point(a) && self.contains_point(b) && self.contains_point(c)
    }

    /// Translates a global point into this rectangle's local coordinates.
    #[inline]
    #[must_use]
    pub fn to_local(self, p: Point) -> Point {
        Point::new(p.x - f64::from(self.x), p.y - f64::from(self.y))
    }

    /// Translates a global rectangle into this rectangle's local coordinates.
    #[inline]
    #[must_use]
    pub const fn to_local_rect(self, r: Self) -> Self {
        Self::new(r.x - self.x, r.y - self.y, r.w, r.h)
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    /// Bounding union of a set of rectangles, or `None` if the set is empty.
    #[must_use]
    pub fn bounding(rects: impl IntoIterator<Item = Self>) -> Option<Self> {
        rects.into_iter().reduce(Self::union)
    }
}

// `f64::abs` is not available without `std`.
fn abs(v: f64) -> f64 {
    if v < 0.0 { -v } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const LEFT: Rect = Rect::new(0, 0, 1920, 1080);
    const RIGHT: Rect = Rect::new(1920, 0, 1920, 1080);

    #[test]
    fn circle_is_routed_to_the_output_it_lands_on() {
        let center = Point::new(3000.0, 540.0);
        let hits: Vec<Rect> = [LEFT, RIGHT]
            .into_iter()
            .filter(|o| o.intersects_circle(center, 100.0))
            .collect();
        assert_eq!(hits, [RIGHT]);
        assert_eq!(RIGHT.to_local(center), Point::new(1080.0, 540.0));
    }

    #[test]
    fn circle_straddling_a_seam_hits_both_outputs() {
        let center = Point::new(1900.0, 540.0);
        assert!(LEFT.intersects_circle(center, 50.0));
        assert!(RIGHT.intersects_circle(center, 50.0));
    }

    #[test]
    fn circle_near_corner_uses_corner_distance() {
        let r = Rect::new(0, 0, 100, 100);
        // Inside the expanded box but beyond the corner radius.
        assert!(!r.intersects_circle(Point::new(108.0, 108.0), 10.0));
        assert!(r.intersects_circle(Point::new(105.0, 105.0), 10.0));
    }

    #[test]
    fn point_on_edge_is_outside() {
        assert!(!LEFT.contains_point(Point::new(0.0, 10.0)));
        assert!(!LEFT.contains_point(Point::new(1920.0, 10.0)));
        assert!(LEFT.contains_point(Point::new(1.0, 1.0)));
        assert!(RIGHT.contains_point(Point::new(1920.5, 1.0)));
    }

    #[test]
    fn rect_overlap_requires_area() {
        assert!(!LEFT.intersects_rect(RIGHT));
        assert!(LEFT.intersects_rect(Rect::new(1900, 100, 40, 40)));
        assert!(RIGHT.intersects_rect(Rect::new(1900, 100, 40, 40)));
        assert!(!LEFT.intersects_rect(Rect::new(0, 1080, 10, 10)));
    }

    #[test]
    fn square_and_triangle_predicates() {
        assert!(RIGHT.intersects_square(Point::new(1910.0, 0.0), 20.0));
        assert!(!RIGHT.intersects_square(Point::new(1890.0, 0.0), 20.0));

        let a = Point::new(10.0, 10.0);
        let b = Point::new(100.0, 10.0);
        let c = Point::new(50.0, 90.0);
        assert!(LEFT.contains_triangle(a, b, c));
        assert!(!RIGHT.contains_triangle(a, b, c));
        assert!(!LEFT.contains_triangle(a, b, Point::new(2000.0, 90.0)));
    }

    #[test]
    fn bounding_union_covers_all_outputs() {
        assert_eq!(Rect::bounding([]), None);
        let below = Rect::new(-200, 1080, 800, 600);
        assert_eq!(
            Rect::bounding([LEFT, RIGHT, below]),
            Some(Rect::new(-200, 0, 4040, 1680))
        );
    }

    #[test]
    fn local_rect_translation() {
        assert_eq!(
            RIGHT.to_local_rect(Rect::new(2000, 50, 10, 20)),
            Rect::new(80, 50, 10, 20)
        );
    }
}
