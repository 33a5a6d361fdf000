// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Possibly fragmented road geometry of an itinerary.
//!
//! A [`ClusteredRoadPath`] is an ordered list of disjoint [`RoadPath`]
//! clusters. Positions are addressed by an absolute index over the logical
//! concatenation of all clusters, in cluster order; bus halts use that index
//! as their coordinate system. Every step also carries a [`StepId`] that
//! survives splicing, splitting and inversion, so callers can recompute the
//! absolute index of a bound position after any structural change.

use tracing::debug;

use crate::geometry::{coincide, Point, DEFAULT_CONNECTION_TOLERANCE};
use crate::path::{CrossRoad, PathStep, RoadPath, StepId};
use crate::segment::{RoadSegment, SegmentId, SegmentRef};

/// Ordered set of disjoint connected road paths.
#[derive(Debug, Clone)]
pub struct ClusteredRoadPath {
    clusters: Vec<RoadPath>,
    tolerance: f64,
    next_step: u64,
}

impl ClusteredRoadPath {
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_CONNECTION_TOLERANCE)
    }

    /// Creates an empty path whose endpoints connect when closer than
    /// `tolerance`.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            clusters: Vec::new(),
            tolerance,
            next_step: 1,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    // --- Queries ---

    pub fn clusters(&self) -> &[RoadPath] {
        &self.clusters
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Total number of segment occurrences over all clusters.
    pub fn segment_count(&self) -> usize {
        self.clusters.iter().map(RoadPath::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn length(&self) -> f64 {
        self.clusters.iter().map(RoadPath::length).sum()
    }

    /// All steps in absolute index order.
    pub fn steps(&self) -> impl Iterator<Item = &PathStep> + '_ {
        self.clusters.iter().flat_map(|c| c.steps().iter())
    }

    /// Maps an absolute index to `(cluster, index in cluster)`.
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut base = 0;
        for (c, cluster) in self.clusters.iter().enumerate() {
            if index < base + cluster.len() {
                return Some((c, index - base));
            }
            base += cluster.len();
        }
        None
    }

    pub fn step_at(&self, index: usize) -> Option<&PathStep> {
        let (c, local) = self.locate(index)?;
        self.clusters[c].step(local)
    }

    pub fn segment_at(&self, index: usize) -> Option<&SegmentRef> {
        self.step_at(index).map(|s| &s.segment)
    }

    /// Traversal direction of the segment at `index`.
    pub fn is_forward_at(&self, index: usize) -> Option<bool> {
        self.step_at(index).map(|s| s.forward)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.index_of(id).is_some()
    }

    /// Absolute index of the first occurrence of a segment.
    pub fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.steps().position(|s| s.segment.id() == id)
    }

    /// Absolute index of the last occurrence of a segment.
    pub fn last_index_of(&self, id: SegmentId) -> Option<usize> {
        let mut found = None;
        for (i, s) in self.steps().enumerate() {
            if s.segment.id() == id {
                found = Some(i);
            }
        }
        found
    }

    /// Absolute index of a step occurrence.
    pub fn index_of_step(&self, step: StepId) -> Option<usize> {
        self.steps().position(|s| s.id == step)
    }

    /// Length of all segments strictly before `index`.
    pub fn distance_before(&self, index: usize) -> f64 {
        self.steps().take(index).map(|s| s.segment.length()).sum()
    }

    // --- Mutation ---

    /// Adds a path, splicing it onto a cluster whose first or last point
    /// coincides with one of its endpoints.
    ///
    /// When both endpoints touch two different clusters, the three are merged
    /// into the larger cluster. Returns the index of the cluster that received
    /// the path, or `None` for an empty path.
    pub fn add_path(&mut self, mut path: RoadPath) -> Option<usize> {
        let (first, last) = (path.first_point()?, path.last_point()?);
        self.retag(&mut path);

        let tol = self.tolerance;
        let touches = |c: &RoadPath, p: &Point| {
            c.first_point().is_some_and(|f| coincide(&f, p, tol))
                || c.last_point().is_some_and(|l| coincide(&l, p, tol))
        };
        let to_first = self.clusters.iter().position(|c| touches(c, &first));
        let to_last = self.clusters.iter().position(|c| touches(c, &last));

        let changed = match (to_first, to_last) {
            (Some(a), Some(b)) if a != b => {
                // Merge into the larger cluster; the first one found wins ties
                let (reference, other) = if self.clusters[a].len() >= self.clusters[b].len() {
                    (a, b)
                } else {
                    (b, a)
                };
                let absorbed = self.clusters.remove(other);
                let reference = if other < reference { reference - 1 } else { reference };
                self.join(reference, path);
                self.join(reference, absorbed);
                debug!(cluster = reference, "merged two road clusters");
                reference
            }
            (Some(c), _) | (None, Some(c)) => self.join(c, path),
            (None, None) => {
                self.clusters.push(path);
                self.clusters.len() - 1
            }
        };
        Some(changed)
    }

    /// Connects `path` to cluster `target`, or stores it as its own cluster
    /// if no endpoint matches. Returns the cluster holding `path`.
    fn join(&mut self, target: usize, path: RoadPath) -> usize {
        match self.clusters[target].connect(path, self.tolerance) {
            Ok(()) => target,
            Err(path) => {
                self.clusters.push(path);
                self.clusters.len() - 1
            }
        }
    }

    /// Best-effort merge of cluster `changed` into another cluster it touches
    /// at an intermediate point.
    ///
    /// `added` is the path that was just inserted into `changed`; only
    /// clusters it touches directly are considered. When `changed` joins the
    /// other cluster at a single point and the itinerary was valid before the
    /// insertion, nothing is done. Otherwise the other cluster is walked back
    /// to the junction from its nearest end (the start when equally close) so
    /// both form a single chain. When `changed` joins the other cluster at two
    /// points, it becomes a detour between them.
    ///
    /// Returns the index of the merged cluster.
    pub fn auto_loop(&mut self, changed: usize, added: &RoadPath, was_valid: bool) -> Option<usize> {
        let tol = self.tolerance;
        let branch = self.clusters.get(changed)?.clone();
        let (branch_first, branch_last) = (branch.first_point()?, branch.last_point()?);
        let (added_first, added_last) = (added.first_point()?, added.last_point()?);

        for target in 0..self.clusters.len() {
            if target == changed {
                continue;
            }
            let crossroads = self.clusters[target].cross_roads();
            let directly_connected = crossroads
                .iter()
                .any(|c| coincide(&c.point, &added_first, tol) || coincide(&c.point, &added_last, tol));
            if !directly_connected {
                continue;
            }

            let Some((ia, a)) = crossroads.iter().enumerate().find(|(_, c)| {
                coincide(&c.point, &branch_first, tol) || coincide(&c.point, &branch_last, tol)
            }) else {
                continue;
            };
            // The second junction must be the other end of the branch
            let other_end = if coincide(&a.point, &branch_first, tol) {
                branch_last
            } else {
                branch_first
            };
            let b = if branch.is_closed(tol) {
                None
            } else {
                crossroads[ia + 1..]
                    .iter()
                    .enumerate()
                    .find(|(_, c)| coincide(&c.point, &other_end, tol))
                    .map(|(i, c)| (ia + 1 + i, *c))
            };

            if was_valid && b.is_none() {
                continue;
            }

            let merged = match b {
                Some((ib, _)) => self.splice_detour(target, &branch, ia, ib),
                None => self.splice_branch(target, &branch, ia, a),
            };
            let Some(merged) = merged else {
                continue;
            };

            self.clusters[target] = merged;
            self.clusters.remove(changed);
            let target = if changed < target { target - 1 } else { target };
            debug!(cluster = target, "auto-looped road cluster");
            return Some(target);
        }
        None
    }

    /// `target[..ib]`, then the branch from junction b back to junction a,
    /// then `target[ia..ib]` again, then the rest of `target`.
    fn splice_detour(&mut self, target: usize, branch: &RoadPath, ia: usize, ib: usize) -> Option<RoadPath> {
        let tol = self.tolerance;
        let path = &self.clusters[target];
        let mut out = path.slice(0..ib);
        let mut shared = path.slice(ia..ib);
        let tail = path.slice(ib..path.len());
        self.retag(&mut shared);

        out.connect(branch.clone(), tol).ok()?;
        out.extend_connected(shared, tol).ok()?;
        out.extend_connected(tail, tol).ok()?;
        Some(out)
    }

    /// Joins a branch touching `target` at cross road `ia` only.
    fn splice_branch(&mut self, target: usize, branch: &RoadPath, ia: usize, a: &CrossRoad) -> Option<RoadPath> {
        let tol = self.tolerance;
        let path = &self.clusters[target];
        let total = path.length();

        if branch.is_closed(tol) {
            // A loop is inserted in place
            let mut out = path.slice(0..ia);
            let tail = path.slice(ia..path.len());
            if out.is_empty() {
                out = branch.clone();
            } else {
                out.connect(branch.clone(), tol).ok()?;
            }
            out.extend_connected(tail, tol).ok()?;
            return Some(out);
        }

        if a.distance <= total - a.distance {
            // Walk from the branch end back to the start, then the whole path
            let mut back = path.reversed_slice(0..ia);
            let whole = path.clone();
            self.retag(&mut back);

            let mut out = branch.clone();
            if !out.last_point().is_some_and(|p| coincide(&p, &a.point, tol)) {
                out.invert();
            }
            out.extend_connected(back, tol).ok()?;
            out.extend_connected(whole, tol).ok()?;
            Some(out)
        } else {
            // The whole path, back to the junction, then the branch
            let mut back = path.reversed_slice(ia..path.len());
            let mut out = path.clone();
            self.retag(&mut back);

            out.extend_connected(back, tol).ok()?;
            out.connect(branch.clone(), tol).ok()?;
            Some(out)
        }
    }

    /// Removes every occurrence of the segments matching `matches`.
    ///
    /// A removal in the middle of a cluster splits it in two. When
    /// `try_reconnect` is set, [`reconnect`](Self::reconnect) runs afterwards.
    /// Returns the removed absolute indices, in ascending order, expressed in
    /// the coordinates before the removal.
    pub fn remove_segment<F>(&mut self, matches: F, try_reconnect: bool) -> Vec<usize>
    where
        F: Fn(&dyn RoadSegment) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.clusters.len());
        let mut base = 0;

        for cluster in std::mem::take(&mut self.clusters) {
            let len = cluster.len();
            let mut current = RoadPath::new();
            for (i, step) in cluster.steps.into_iter().enumerate() {
                if matches(step.segment.as_ref()) {
                    removed.push(base + i);
                    if !current.is_empty() {
                        kept.push(std::mem::take(&mut current));
                    }
                } else {
                    current.steps.push(step);
                }
            }
            if !current.is_empty() {
                kept.push(current);
            }
            base += len;
        }
        self.clusters = kept;

        if !removed.is_empty() && try_reconnect {
            self.reconnect();
        }
        removed
    }

    /// Removes the segment occurrence at an absolute index, splitting its
    /// cluster.
    pub fn remove_at(&mut self, index: usize) -> Option<PathStep> {
        let (c, local) = self.locate(index)?;
        let cluster = &mut self.clusters[c];
        let tail = cluster.steps.split_off(local + 1);
        let step = cluster.steps.pop()?;

        let mut insert_at = c + 1;
        if cluster.is_empty() {
            self.clusters.remove(c);
            insert_at = c;
        }
        if !tail.is_empty() {
            self.clusters.insert(insert_at, RoadPath { steps: tail });
        }
        Some(step)
    }

    /// Merges clusters whose endpoints coincide.
    ///
    /// For every pair `(i, j)` with `i < j`, cluster `j` is joined onto `i`
    /// forward or inverted when they share an endpoint and no segment. Runs
    /// until no pair connects. Returns the number of merges.
    pub fn reconnect(&mut self) -> usize {
        let tol = self.tolerance;
        let mut merges = 0;
        'scan: loop {
            for i in 0..self.clusters.len() {
                for j in (i + 1)..self.clusters.len() {
                    if self.clusters[i].shares_segment_with(&self.clusters[j]) {
                        continue;
                    }
                    let candidate = self.clusters[j].clone();
                    if self.clusters[i].connect(candidate, tol).is_ok() {
                        self.clusters.remove(j);
                        merges += 1;
                        continue 'scan;
                    }
                }
            }
            break;
        }
        if merges > 0 {
            debug!(merges, clusters = self.clusters.len(), "reconnected road clusters");
        }
        merges
    }

    /// Reverses the whole path: cluster order and every cluster's direction.
    ///
    /// An occurrence at absolute index `i` moves to `segment_count - i - 1`.
    pub fn invert(&mut self) {
        self.clusters.reverse();
        for cluster in &mut self.clusters {
            cluster.invert();
        }
    }

    /// Removes every cluster. Returns the number of removed occurrences.
    pub fn clear(&mut self) -> usize {
        let count = self.segment_count();
        self.clusters.clear();
        count
    }

    fn retag(&mut self, path: &mut RoadPath) {
        for step in &mut path.steps {
            step.id = StepId(self.next_step);
            self.next_step += 1;
        }
    }
}

impl Default for ClusteredRoadPath {
    fn default() -> Self {
        Self::new()
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

    fn ids(path: &ClusteredRoadPath) -> Vec<SegmentId> {
        path.steps().map(|s| s.segment_id()).collect()
    }

    // --- Insertion tests ---

    #[test]
    fn disjoint_paths_make_separate_clusters() {
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::single(seg(0.0, 0.0, 10.0, 0.0)));
        path.add_path(RoadPath::single(seg(50.0, 0.0, 60.0, 0.0)));
        assert_eq!(path.cluster_count(), 2);
        assert_eq!(path.segment_count(), 2);
    }

    #[test]
    fn touching_path_is_spliced() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 20.0, 0.0);
        let c = seg(-10.0, 0.0, 0.0, 0.0);
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::single(a.clone()));
        path.add_path(RoadPath::single(b.clone()));
        path.add_path(RoadPath::single(c.clone()));

        assert_eq!(path.cluster_count(), 1);
        assert_eq!(ids(&path), vec![c.id(), a.id(), b.id()]);
        assert_relative_eq!(path.length(), 30.0);
    }

    #[test]
    fn bridging_path_merges_two_clusters() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 20.0, 0.0);
        let d = seg(30.0, 0.0, 40.0, 0.0);
        let bridge = seg(20.0, 0.0, 30.0, 0.0);

        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a.clone(), b.clone()], TOL).unwrap());
        path.add_path(RoadPath::single(d.clone()));
        assert_eq!(path.cluster_count(), 2);

        let changed = path.add_path(RoadPath::single(bridge.clone()));
        assert_eq!(changed, Some(0));
        assert_eq!(path.cluster_count(), 1);
        assert_eq!(ids(&path), vec![a.id(), b.id(), bridge.id(), d.id()]);
    }

    #[test]
    fn index_of_spans_clusters() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(50.0, 0.0, 60.0, 0.0);
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::single(a.clone()));
        path.add_path(RoadPath::single(b.clone()));

        assert_eq!(path.index_of(a.id()), Some(0));
        assert_eq!(path.index_of(b.id()), Some(1));
        assert_eq!(path.locate(1), Some((1, 0)));
        assert_eq!(path.segment_at(1).map(|s| s.id()), Some(b.id()));
        assert!(path.segment_at(2).is_none());
    }

    // --- Removal tests ---

    #[test]
    fn removing_middle_segment_splits_cluster() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 20.0, 0.0);
        let c = seg(20.0, 0.0, 30.0, 0.0);
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a.clone(), b.clone(), c.clone()], TOL).unwrap());

        let bid = b.id();
        let removed = path.remove_segment(|s| s.id() == bid, true);
        assert_eq!(removed, vec![1]);
        assert_eq!(path.cluster_count(), 2);
        assert_eq!(ids(&path), vec![a.id(), c.id()]);
    }

    #[test]
    fn removal_reconnects_through_loop() {
        // a ends at (10,0); the loop goes out and back to (10,0); c continues
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let loop_seg = RoadPolyline::new(
            None,
            vec![Point::new(10.0, 0.0), Point::new(15.0, 5.0), Point::new(10.0, 0.0)],
        )
        .unwrap()
        .into_ref();
        let c = seg(10.0, 0.0, 20.0, 0.0);
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a.clone(), loop_seg.clone(), c.clone()], TOL).unwrap());

        let lid = loop_seg.id();
        path.remove_segment(|s| s.id() == lid, false);
        assert_eq!(path.cluster_count(), 2);

        let mut path2 = ClusteredRoadPath::new();
        path2.add_path(RoadPath::from_segments(&[a.clone(), loop_seg, c.clone()], TOL).unwrap());
        path2.remove_segment(|s| s.id() == lid, true);
        assert_eq!(path2.cluster_count(), 1);
        assert_eq!(ids(&path2), vec![a.id(), c.id()]);
    }

    #[test]
    fn remove_unknown_segment_is_noop() {
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::single(seg(0.0, 0.0, 1.0, 0.0)));
        let removed = path.remove_segment(|_| false, true);
        assert!(removed.is_empty());
        assert_eq!(path.segment_count(), 1);
    }

    #[test]
    fn remove_at_splits_cluster() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 20.0, 0.0);
        let c = seg(20.0, 0.0, 30.0, 0.0);
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a, b.clone(), c], TOL).unwrap());

        let step = path.remove_at(1).unwrap();
        assert_eq!(step.segment_id(), b.id());
        assert_eq!(path.cluster_count(), 2);
        assert!(path.remove_at(5).is_none());

        path.remove_at(0);
        assert_eq!(path.cluster_count(), 1);
        assert_eq!(path.segment_count(), 1);
    }

    // --- Inversion tests ---

    #[test]
    fn invert_complements_indices() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 20.0, 0.0);
        let d = seg(50.0, 0.0, 60.0, 0.0);
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a.clone(), b.clone()], TOL).unwrap());
        path.add_path(RoadPath::single(d.clone()));

        let tag = path.step_at(0).unwrap().id();
        path.invert();
        assert_eq!(ids(&path), vec![d.id(), b.id(), a.id()]);
        assert_eq!(path.index_of_step(tag), Some(2));
        assert_eq!(path.is_forward_at(2), Some(false));

        path.invert();
        assert_eq!(ids(&path), vec![a.id(), b.id(), d.id()]);
        assert_eq!(path.index_of_step(tag), Some(0));
    }

    #[test]
    fn step_ids_survive_splicing() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::single(a));
        let tag = path.step_at(0).unwrap().id();

        path.add_path(RoadPath::single(seg(-10.0, 0.0, 0.0, 0.0)));
        assert_eq!(path.index_of_step(tag), Some(1));
    }

    // --- Auto-loop tests ---

    #[test]
    fn auto_loop_joins_branch_at_intermediate_point() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 30.0, 0.0);
        let branch = seg(10.0, 0.0, 10.0, 10.0);

        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a.clone(), b.clone()], TOL).unwrap());
        let added = RoadPath::single(branch.clone());
        let changed = path.add_path(added.clone()).unwrap();
        assert_eq!(path.cluster_count(), 2);

        let merged = path.auto_loop(changed, &added, false);
        assert_eq!(merged, Some(0));
        assert_eq!(path.cluster_count(), 1);
        // Junction is nearer the start: branch, back along a, then a and b
        assert_eq!(ids(&path), vec![branch.id(), a.id(), a.id(), b.id()]);
        let steps: Vec<bool> = path.steps().map(|s| s.forward).collect();
        assert_eq!(steps, vec![false, false, true, true]);
    }

    #[test]
    fn auto_loop_prefers_start_on_equal_distance() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 20.0, 0.0);
        let branch = seg(10.0, 0.0, 10.0, 10.0);

        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a.clone(), b.clone()], TOL).unwrap());
        let added = RoadPath::single(branch.clone());
        let changed = path.add_path(added.clone()).unwrap();

        path.auto_loop(changed, &added, false).unwrap();
        assert_eq!(path.steps().next().map(|s| s.segment_id()), Some(branch.id()));
    }

    #[test]
    fn auto_loop_skips_single_junction_when_valid() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 30.0, 0.0);
        let branch = seg(10.0, 0.0, 10.0, 10.0);

        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a, b], TOL).unwrap());
        let added = RoadPath::single(branch);
        let changed = path.add_path(added.clone()).unwrap();

        assert_eq!(path.auto_loop(changed, &added, true), None);
        assert_eq!(path.cluster_count(), 2);
    }

    #[test]
    fn auto_loop_makes_detour_between_two_junctions() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(10.0, 0.0, 20.0, 0.0);
        let c = seg(20.0, 0.0, 30.0, 0.0);
        let detour = RoadPolyline::new(
            None,
            vec![Point::new(10.0, 0.0), Point::new(15.0, 5.0), Point::new(20.0, 0.0)],
        )
        .unwrap()
        .into_ref();

        let mut path = ClusteredRoadPath::new();
        path.add_path(RoadPath::from_segments(&[a.clone(), b.clone(), c.clone()], TOL).unwrap());
        let added = RoadPath::single(detour.clone());
        let changed = path.add_path(added.clone()).unwrap();

        path.auto_loop(changed, &added, true).unwrap();
        assert_eq!(path.cluster_count(), 1);
        assert_eq!(
            ids(&path),
            vec![a.id(), b.id(), detour.id(), b.id(), c.id()]
        );
        assert_eq!(path.is_forward_at(2), Some(false));
    }
}
