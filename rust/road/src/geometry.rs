// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar geometry shared by road segments and bus primitives.
//!
//! Points are nalgebra `Point2<f64>`; [`Rect`] is an axis-aligned bounding box.

use nalgebra::Point2;

/// A point in the plane.
pub type Point = Point2<f64>;

/// Default distance under which two endpoints are considered the same
/// road connection.
pub const DEFAULT_CONNECTION_TOLERANCE: f64 = 1e-6;

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    min: Point,
    max: Point,
}

impl Rect {
    /// Creates the rectangle spanned by two corners, in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Degenerate rectangle covering a single point.
    pub fn from_point(p: Point) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest rectangle enclosing all points, or `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = Self::from_point(*iter.next()?);
        Some(iter.fold(first, |r, p| r.expanded(p)))
    }

    /// Union of all rectangles, or `None` if there are none.
    pub fn union_all(rects: impl IntoIterator<Item = Rect>) -> Option<Self> {
        rects.into_iter().reduce(|a, b| a.union(&b))
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        nalgebra::center(&self.min, &self.max)
    }

    /// Returns a copy grown to include `p`.
    pub fn expanded(&self, p: &Point) -> Self {
        Self {
            min: Point::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    pub fn union(&self, other: &Rect) -> Self {
        self.expanded(&other.min).expanded(&other.max)
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Returns `true` if two points are within `tolerance` of each other.
pub fn coincide(a: &Point, b: &Point, tolerance: f64) -> bool {
    nalgebra::distance(a, b) <= tolerance
}

/// Projects `p` onto the segment `a`-`b`.
///
/// Returns the clamped parameter `t` in `[0, 1]` and the projected point.
pub fn project_on_segment(p: &Point, a: &Point, b: &Point) -> (f64, Point) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-24 {
        return (0.0, *a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (t, a + ab * t)
}
