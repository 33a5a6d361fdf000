// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A single connected chain of directed road segments.
//!
//! A [`RoadPath`] stores each segment together with its traversal direction:
//! `forward == true` means the segment is walked from its begin point to its
//! end point. Consecutive steps share a point: the last point of step `i` is
//! the first point of step `i + 1`. Connectivity is checked when steps are
//! joined, never re-verified afterwards.

use crate::error::{Error, Result};
use crate::geometry::{coincide, Point};
use crate::segment::{SegmentId, SegmentRef};

/// Identity of one occurrence of a segment inside a clustered path.
///
/// The same segment may appear several times (loops), so halts bind to an
/// occurrence rather than to the segment itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub(crate) u64);

/// One directed segment occurrence in a path.
#[derive(Debug, Clone)]
pub struct PathStep {
    pub segment: SegmentRef,
    pub forward: bool,
    pub(crate) id: StepId,
}

impl PathStep {
    pub fn new(segment: SegmentRef, forward: bool) -> Self {
        Self {
            segment,
            forward,
            id: StepId(0),
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn segment_id(&self) -> SegmentId {
        self.segment.id()
    }

    pub fn first_point(&self) -> Point {
        self.segment.first_point(self.forward)
    }

    pub fn last_point(&self) -> Point {
        self.segment.last_point(self.forward)
    }

    /// Converts a curviline offset on the segment into the distance travelled
    /// from this step's first point.
    pub fn travelled(&self, offset: f64) -> f64 {
        if self.forward {
            offset
        } else {
            self.segment.length() - offset
        }
    }

    fn reversed(mut self) -> Self {
        self.forward = !self.forward;
        self
    }
}

/// A point where the path enters and leaves consecutive steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossRoad {
    pub point: Point,
    /// Path length from the first point of the path.
    pub distance: f64,
    /// Step arriving at this point, `None` at the path start.
    pub entering: Option<usize>,
    /// Step leaving this point, `None` at the path end.
    pub exiting: Option<usize>,
}

/// Connected chain of directed segments.
#[derive(Debug, Clone, Default)]
pub struct RoadPath {
    pub(crate) steps: Vec<PathStep>,
}

impl RoadPath {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Path made of a single forward segment.
    pub fn single(segment: SegmentRef) -> Self {
        Self {
            steps: vec![PathStep::new(segment, true)],
        }
    }

    /// Creates a path from an ordered list of segments.
    ///
    /// Segment directions are deduced from shared endpoints, within
    /// `tolerance`. Returns an error if the list is empty or two consecutive
    /// segments do not touch.
    pub fn from_segments(segments: &[SegmentRef], tolerance: f64) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::EmptyPath);
        }

        let mut steps = Vec::with_capacity(segments.len());

        if segments.len() == 1 {
            steps.push(PathStep::new(segments[0].clone(), true));
            return Ok(Self { steps });
        }

        let touches = |p: Point, s: &SegmentRef| {
            coincide(&p, &s.begin_point(), tolerance) || coincide(&p, &s.end_point(), tolerance)
        };

        // First segment direction depends on which end meets the second one
        if touches(segments[0].end_point(), &segments[1]) {
            steps.push(PathStep::new(segments[0].clone(), true));
        } else if touches(segments[0].begin_point(), &segments[1]) {
            steps.push(PathStep::new(segments[0].clone(), false));
        } else {
            return Err(Error::DisconnectedPath(0, 1));
        }

        for i in 1..segments.len() {
            let prev_end = steps[i - 1].last_point();
            let curr = &segments[i];
            if coincide(&prev_end, &curr.begin_point(), tolerance) {
                steps.push(PathStep::new(curr.clone(), true));
            } else if coincide(&prev_end, &curr.end_point(), tolerance) {
                steps.push(PathStep::new(curr.clone(), false));
            } else {
                return Err(Error::DisconnectedPath(i - 1, i));
            }
        }

        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&PathStep> {
        self.steps.get(index)
    }

    pub fn segments(&self) -> impl Iterator<Item = &SegmentRef> + '_ {
        self.steps.iter().map(|s| &s.segment)
    }

    pub fn first_point(&self) -> Option<Point> {
        self.steps.first().map(PathStep::first_point)
    }

    pub fn last_point(&self) -> Option<Point> {
        self.steps.last().map(PathStep::last_point)
    }

    /// Returns `true` if the path ends where it starts.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match (self.first_point(), self.last_point()) {
            (Some(a), Some(b)) => coincide(&a, &b, tolerance),
            _ => false,
        }
    }

    pub fn length(&self) -> f64 {
        self.steps.iter().map(|s| s.segment.length()).sum()
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.steps.iter().position(|s| s.segment.id() == id)
    }

    pub fn last_index_of(&self, id: SegmentId) -> Option<usize> {
        self.steps.iter().rposition(|s| s.segment.id() == id)
    }

    /// Returns `true` if both paths use at least one common segment.
    pub fn shares_segment_with(&self, other: &RoadPath) -> bool {
        self.steps.iter().any(|s| other.contains(s.segment.id()))
    }

    /// Reverses the traversal direction of the whole path.
    pub fn invert(&mut self) {
        self.steps.reverse();
        for step in &mut self.steps {
            step.forward = !step.forward;
        }
    }

    /// Joins `other` onto either end of this path.
    ///
    /// Tries, in order: append as-is, append inverted, prepend as-is, prepend
    /// inverted. The traversal direction of `self` is preserved. Gives `other`
    /// back untouched if no endpoint coincides.
    pub fn connect(&mut self, mut other: RoadPath, tolerance: f64) -> std::result::Result<(), RoadPath> {
        let (Some(other_first), Some(other_last)) = (other.first_point(), other.last_point()) else {
            return Ok(());
        };
        let (Some(first), Some(last)) = (self.first_point(), self.last_point()) else {
            *self = other;
            return Ok(());
        };

        if coincide(&last, &other_first, tolerance) {
            self.steps.append(&mut other.steps);
        } else if coincide(&last, &other_last, tolerance) {
            other.invert();
            self.steps.append(&mut other.steps);
        } else if coincide(&first, &other_last, tolerance) {
            other.steps.append(&mut self.steps);
            self.steps = other.steps;
        } else if coincide(&first, &other_first, tolerance) {
            other.invert();
            other.steps.append(&mut self.steps);
            self.steps = other.steps;
        } else {
            return Err(other);
        }
        Ok(())
    }

    /// Appends `other` without changing its direction.
    ///
    /// Gives `other` back if it does not start where this path ends.
    pub fn extend_connected(&mut self, mut other: RoadPath, tolerance: f64) -> std::result::Result<(), RoadPath> {
        match (self.last_point(), other.first_point()) {
            (_, None) => Ok(()),
            (None, Some(_)) => {
                *self = other;
                Ok(())
            }
            (Some(last), Some(first)) if coincide(&last, &first, tolerance) => {
                self.steps.append(&mut other.steps);
                Ok(())
            }
            _ => Err(other),
        }
    }

    /// Every point where the path passes, with the cumulative distance from
    /// the start. A path of `n` steps has `n + 1` cross roads.
    pub fn cross_roads(&self) -> Vec<CrossRoad> {
        let Some(start) = self.first_point() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.steps.len() + 1);
        out.push(CrossRoad {
            point: start,
            distance: 0.0,
            entering: None,
            exiting: Some(0),
        });
        let mut distance = 0.0;
        for (i, step) in self.steps.iter().enumerate() {
            distance += step.segment.length();
            out.push(CrossRoad {
                point: step.last_point(),
                distance,
                entering: Some(i),
                exiting: (i + 1 < self.steps.len()).then_some(i + 1),
            });
        }
        out
    }

    /// Steps `range` walked backwards, as a new path.
    pub(crate) fn reversed_slice(&self, range: std::ops::Range<usize>) -> RoadPath {
        RoadPath {
            steps: self.steps[range]
                .iter()
                .rev()
                .cloned()
                .map(PathStep::reversed)
                .collect(),
        }
    }

    pub(crate) fn slice(&self, range: std::ops::Range<usize>) -> RoadPath {
        RoadPath {
            steps: self.steps[range].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DEFAULT_CONNECTION_TOLERANCE as TOL;
    use crate::segment::RoadPolyline;
    use approx::assert_relative_eq;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> SegmentRef {
        RoadPolyline::straight(None, Point::new(x0, y0), Point::new(x1, y1))
            .unwrap()
            .into_ref()
    }

    // --- Construction tests ---

    #[test]
    fn from_segments_detects_orientation() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(20.0, 0.0, 10.0, 0.0); // stored backwards
        let c = seg(20.0, 0.0, 20.0, 5.0);
        let path = RoadPath::from_segments(&[a, b, c], TOL).unwrap();

        let dirs: Vec<bool> = path.steps().iter().map(|s| s.forward).collect();
        assert_eq!(dirs, vec![true, false, true]);
        assert_eq!(path.first_point(), Some(Point::new(0.0, 0.0)));
        assert_eq!(path.last_point(), Some(Point::new(20.0, 5.0)));
        assert_relative_eq!(path.length(), 25.0);
    }

    #[test]
    fn from_segments_reversed_first_segment() {
        // Only the begin point of `a` meets `b`
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(0.0, 0.0, 0.0, 10.0);
        let path = RoadPath::from_segments(&[a, b], TOL).unwrap();
        assert!(!path.steps()[0].forward);
        assert!(path.steps()[1].forward);
        assert_eq!(path.first_point(), Some(Point::new(10.0, 0.0)));
        assert_eq!(path.last_point(), Some(Point::new(0.0, 10.0)));
    }

    #[test]
    fn from_segments_rejects_gap() {
        let a = seg(0.0, 0.0, 1.0, 0.0);
        let b = seg(1.0, 0.0, 2.0, 0.0);
        let c = seg(5.0, 0.0, 6.0, 0.0);
        let err = RoadPath::from_segments(&[a, b, c], TOL).unwrap_err();
        assert!(matches!(err, Error::DisconnectedPath(1, 2)));
        assert!(matches!(RoadPath::from_segments(&[], TOL), Err(Error::EmptyPath)));
    }

    // --- Connection tests ---

    #[test]
    fn connect_appends_and_inverts() {
        let mut path = RoadPath::single(seg(0.0, 0.0, 10.0, 0.0));
        // Touches our end with its own end: appended inverted
        path.connect(RoadPath::single(seg(20.0, 0.0, 10.0, 0.0)), TOL)
            .unwrap();
        assert_eq!(path.len(), 2);
        assert!(!path.steps()[1].forward);
        assert_eq!(path.last_point(), Some(Point::new(20.0, 0.0)));
    }

    #[test]
    fn connect_prepends_keeping_direction() {
        let mut path = RoadPath::single(seg(0.0, 0.0, 10.0, 0.0));
        path.connect(RoadPath::single(seg(0.0, 0.0, 0.0, -5.0)), TOL)
            .unwrap();
        assert_eq!(path.first_point(), Some(Point::new(0.0, -5.0)));
        assert_eq!(path.last_point(), Some(Point::new(10.0, 0.0)));
        assert!(path.steps()[1].forward);
    }

    #[test]
    fn connect_returns_unrelated_path() {
        let mut path = RoadPath::single(seg(0.0, 0.0, 10.0, 0.0));
        let other = RoadPath::single(seg(50.0, 0.0, 60.0, 0.0));
        let back = path.connect(other, TOL).unwrap_err();
        assert_eq!(back.len(), 1);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn invert_twice_is_identity() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 10.0, 10.0);
        let mut path = RoadPath::from_segments(&[a.clone(), b.clone()], TOL).unwrap();
        path.invert();
        assert_eq!(path.steps()[0].segment_id(), b.id());
        assert_eq!(path.first_point(), Some(Point::new(10.0, 10.0)));
        path.invert();
        assert_eq!(path.steps()[0].segment_id(), a.id());
        assert!(path.steps().iter().all(|s| s.forward));
    }

    #[test]
    fn cross_roads_accumulate_distance() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 10.0, 5.0);
        let path = RoadPath::from_segments(&[a, b], TOL).unwrap();
        let xs = path.cross_roads();
        assert_eq!(xs.len(), 3);
        assert_eq!(xs[0].entering, None);
        assert_eq!(xs[1].entering, Some(0));
        assert_eq!(xs[1].exiting, Some(1));
        assert_relative_eq!(xs[2].distance, 15.0);
        assert_eq!(xs[2].exiting, None);
    }
}
