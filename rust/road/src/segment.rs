// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Road segment abstraction.
//!
//! Bus itineraries never own road geometry. They hold shared references to
//! segments provided by a road network and only consume the queries exposed by
//! [`RoadSegment`]: length, endpoints, projection of a point, distance to a
//! point, bounds, and the identity of the owning road network.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geometry::{project_on_segment, Point, Rect};

/// Stable identity of a road segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment:{}", self.0)
    }
}

/// Identity of a road network. Two segments belong to the same network iff
/// their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoadNetworkId(pub Uuid);

impl RoadNetworkId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoadNetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road-network:{}", self.0)
    }
}

/// Result of projecting a point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Curviline offset from the segment's begin point.
    pub offset: f64,
    /// Projected point on the segment.
    pub point: Point,
    /// Distance between the query point and `point`.
    pub distance: f64,
}

/// Geometry services a road segment exposes to the bus model.
pub trait RoadSegment: fmt::Debug + Send + Sync {
    fn id(&self) -> SegmentId;

    /// The road network this segment belongs to, if any.
    fn road_network(&self) -> Option<RoadNetworkId>;

    fn length(&self) -> f64;

    fn begin_point(&self) -> Point;

    fn end_point(&self) -> Point;

    /// Nearest position on the segment to `point`.
    fn nearest_position(&self, point: &Point) -> Projection;

    /// Point at the given curviline offset, clamped to the segment.
    fn point_at(&self, offset: f64) -> Point;

    fn bounds(&self) -> Rect;

    fn distance(&self, point: &Point) -> f64 {
        self.nearest_position(point).distance
    }

    /// Start point when traversed in the given direction.
    fn first_point(&self, forward: bool) -> Point {
        if forward {
            self.begin_point()
        } else {
            self.end_point()
        }
    }

    /// End point when traversed in the given direction.
    fn last_point(&self, forward: bool) -> Point {
        if forward {
            self.end_point()
        } else {
            self.begin_point()
        }
    }
}

/// Shared handle to a road segment.
pub type SegmentRef = Arc<dyn RoadSegment>;

/// A road segment made of straight pieces between consecutive points.
#[derive(Debug, Clone)]
pub struct RoadPolyline {
    id: SegmentId,
    network: Option<RoadNetworkId>,
    points: Vec<Point>,
    /// Cumulative length at each point; `cumulative[0] == 0`.
    cumulative: Vec<f64>,
}

impl RoadPolyline {
    /// Creates a polyline segment.
    ///
    /// Returns an error if fewer than 2 points are given or any coordinate is
    /// not finite.
    pub fn new(network: Option<RoadNetworkId>, points: Vec<Point>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::DegenerateSegment(points.len()));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(Error::NonFiniteCoordinate);
        }

        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        for w in points.windows(2) {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + nalgebra::distance(&w[0], &w[1]));
        }

        Ok(Self {
            id: SegmentId::new_v4(),
            network,
            points,
            cumulative,
        })
    }

    /// Straight segment between two points.
    pub fn straight(network: Option<RoadNetworkId>, from: Point, to: Point) -> Result<Self> {
        Self::new(network, vec![from, to])
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Wraps this polyline into a shared [`SegmentRef`].
    pub fn into_ref(self) -> SegmentRef {
        Arc::new(self)
    }
}

impl RoadSegment for RoadPolyline {
    fn id(&self) -> SegmentId {
        self.id
    }

    fn road_network(&self) -> Option<RoadNetworkId> {
        self.network
    }

    fn length(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }

    fn begin_point(&self) -> Point {
        self.points[0]
    }

    fn end_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    fn nearest_position(&self, point: &Point) -> Projection {
        let mut best = Projection {
            offset: 0.0,
            point: self.points[0],
            distance: f64::INFINITY,
        };
        for (i, w) in self.points.windows(2).enumerate() {
            let (t, projected) = project_on_segment(point, &w[0], &w[1]);
            let distance = nalgebra::distance(point, &projected);
            // First piece wins ties
            if distance < best.distance {
                let piece = self.cumulative[i + 1] - self.cumulative[i];
                best = Projection {
                    offset: self.cumulative[i] + t * piece,
                    point: projected,
                    distance,
                };
            }
        }
        best
    }

    fn point_at(&self, offset: f64) -> Point {
        let offset = offset.clamp(0.0, self.length());
        let i = self
            .cumulative
            .partition_point(|&c| c <= offset)
            .clamp(1, self.points.len() - 1);
        let (a, b) = (self.points[i - 1], self.points[i]);
        let piece = self.cumulative[i] - self.cumulative[i - 1];
        if piece <= 0.0 {
            return a;
        }
        let t = (offset - self.cumulative[i - 1]) / piece;
        a + (b - a) * t
    }

    fn bounds(&self) -> Rect {
        // `new` guarantees at least two points
        Rect::from_points(&self.points).unwrap_or_else(|| Rect::from_point(self.points[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l_shape() -> RoadPolyline {
        RoadPolyline::new(
            None,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 5.0)],
        )
        .unwrap()
    }

    #[test]
    fn polyline_length_sums_pieces() {
        assert_relative_eq!(l_shape().length(), 15.0);
    }

    #[test]
    fn degenerate_polyline_rejected() {
        let err = RoadPolyline::new(None, vec![Point::new(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, Error::DegenerateSegment(1)));

        let err = RoadPolyline::straight(None, Point::new(f64::NAN, 0.0), Point::new(1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::NonFiniteCoordinate));
    }

    #[test]
    fn nearest_position_on_second_piece() {
        let seg = l_shape();
        let proj = seg.nearest_position(&Point::new(12.0, 3.0));
        assert_relative_eq!(proj.offset, 13.0);
        assert_relative_eq!(proj.distance, 2.0);
        assert_relative_eq!(proj.point.y, 3.0);
    }

    #[test]
    fn point_at_walks_pieces() {
        let seg = l_shape();
        let p = seg.point_at(12.5);
        assert_relative_eq!(p.x, 10.0);
        assert_relative_eq!(p.y, 2.5);

        assert_eq!(seg.point_at(-1.0), Point::new(0.0, 0.0));
        assert_eq!(seg.point_at(100.0), Point::new(10.0, 5.0));
    }

    #[test]
    fn directional_endpoints() {
        let seg = l_shape();
        assert_eq!(seg.first_point(false), Point::new(10.0, 5.0));
        assert_eq!(seg.last_point(false), Point::new(0.0, 0.0));
        assert_relative_eq!(seg.bounds().height(), 5.0);
    }
}
