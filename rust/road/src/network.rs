// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A minimal in-memory road network that hands out [`RoadPolyline`] segments.

use crate::error::Result;
use crate::geometry::Point;
use crate::segment::{RoadNetworkId, RoadPolyline, SegmentId, SegmentRef};

/// Registry of road segments sharing one [`RoadNetworkId`].
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    id: RoadNetworkId,
    segments: Vec<SegmentRef>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self {
            id: RoadNetworkId::new_v4(),
            segments: Vec::new(),
        }
    }

    pub fn id(&self) -> RoadNetworkId {
        self.id
    }

    /// Adds a polyline segment to this network.
    pub fn add_segment(&mut self, points: Vec<Point>) -> Result<SegmentRef> {
        let segment = RoadPolyline::new(Some(self.id), points)?.into_ref();
        self.segments.push(segment.clone());
        Ok(segment)
    }

    /// Adds a straight segment between two points.
    pub fn add_straight(&mut self, from: Point, to: Point) -> Result<SegmentRef> {
        self.add_segment(vec![from, to])
    }

    pub fn segments(&self) -> &[SegmentRef] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&SegmentRef> {
        self.segments.iter().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment closest to `point`; the first one found wins ties.
    pub fn nearest_segment(&self, point: &Point) -> Option<&SegmentRef> {
        let mut best: Option<(&SegmentRef, f64)> = None;
        for segment in &self.segments {
            let d = segment.distance(point);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((segment, d));
            }
        }
        best.map(|(s, _)| s)
    }
}

impl Default for RoadNetwork {
    fn default() -> Self {
        Self::new()
    }
}
