// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Road geometry of itineraries and the binding of their halts.
//!
//! Halts are bound to a step of the itinerary's [`ClusteredRoadPath`], not to
//! an absolute index. After every structural change of the road, the absolute
//! index of each bound halt is recomputed from its step; halts whose step was
//! removed become unbound.

use busnet_road::{ClusteredRoadPath, Point, RoadPath, SegmentId, SegmentRef};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::events::{ChangeEvent, ChangeKind, ChangeSet, Mutation};
use crate::keys::*;
use crate::network::{BusNetwork, ItineraryData};

/// Options for [`BusNetwork::add_road_segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInsertion {
    /// Bind halts that are not on the road yet to their nearest segment.
    pub auto_connect_halts: bool,
    /// Try to merge the receiving cluster into another cluster it touches.
    pub auto_loop: bool,
}

impl From<&NetworkConfig> for SegmentInsertion {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            auto_connect_halts: config.auto_connect_halts,
            auto_loop: config.auto_loop,
        }
    }
}

impl BusNetwork {
    // --- Adding segments ---

    /// Appends one segment with the network's default insertion options.
    pub fn add_road_segment(&mut self, itinerary: ItineraryKey, segment: SegmentRef) -> Mutation<bool> {
        let insertion = SegmentInsertion::from(&self.config);
        self.add_road_segments(itinerary, RoadPath::single(segment), insertion)
    }

    /// Appends an ordered list of connected segments.
    ///
    /// Fails if the list is empty or two consecutive segments do not touch.
    pub fn add_road_segment_list(&mut self, itinerary: ItineraryKey, segments: &[SegmentRef]) -> Result<Mutation<bool>> {
        let path = RoadPath::from_segments(segments, self.config.connection_tolerance)?;
        let insertion = SegmentInsertion::from(&self.config);
        Ok(self.add_road_segments(itinerary, path, insertion))
    }

    /// Inserts a connected path into the itinerary's road.
    ///
    /// The path is spliced onto a cluster it touches at an end, or becomes a
    /// new cluster. Returns `false` for an unknown itinerary or an empty path.
    pub fn add_road_segments(
        &mut self,
        itinerary: ItineraryKey,
        path: RoadPath,
        insertion: SegmentInsertion,
    ) -> Mutation<bool> {
        if path.is_empty() || !self.itineraries.contains_key(itinerary) {
            return Mutation::unchanged(false);
        }
        let was_valid = self.is_valid(itinerary);
        let ids: Vec<SegmentId> = path.steps().iter().map(|s| s.segment_id()).collect();

        let Some(data) = self.itineraries.get_mut(itinerary) else {
            return Mutation::unchanged(false);
        };
        let Some(changed) = data.road.add_path(path.clone()) else {
            return Mutation::unchanged(false);
        };
        if insertion.auto_loop {
            data.road.auto_loop(changed, &path, was_valid);
        }

        let mut changes = ChangeSet::new();
        for id in ids {
            let mut event = ChangeEvent::new(ChangeKind::SegmentAdded, itinerary).affecting(id);
            if let Some(index) = data.road.last_index_of(id) {
                event = event.at(index);
            }
            changes.push(event);
        }
        debug!(
            ?itinerary,
            segments = data.road.segment_count(),
            clusters = data.road.cluster_count(),
            "road segments added"
        );

        self.bind_road_network(itinerary, &mut changes);
        self.rebind_halts(itinerary, &mut changes);
        if insertion.auto_connect_halts {
            self.bind_unbound_halts(itinerary, &mut changes);
        }
        self.resync_halts(itinerary);
        Mutation::new(true, changes)
    }

    /// Binds the network to the road network of the itinerary's first segment
    /// when the itinerary is in the network and no road network is set.
    pub(crate) fn bind_road_network(&mut self, itinerary: ItineraryKey, changes: &mut ChangeSet) {
        if self.road_network.is_some() {
            return;
        }
        let Some(data) = self.itineraries.get(itinerary) else {
            return;
        };
        let attached = data.line.and_then(|l| self.lines.get(l)).is_some_and(|l| l.attached);
        let Some(road_network) = data.road.steps().next().and_then(|s| s.segment.road_network()) else {
            return;
        };
        if !attached {
            return;
        }
        let Mutation { changes: bound, .. } = self.set_road_network(Some(road_network));
        changes.merge(bound);
        debug!(%road_network, "bus network bound to road network");
    }

    // --- Removing segments ---

    /// Removes every occurrence of a segment.
    ///
    /// With `try_reconnect`, clusters left with touching ends are joined
    /// again. Halts bound to a removed occurrence become unbound.
    pub fn remove_road_segment(&mut self, itinerary: ItineraryKey, segment: SegmentId, try_reconnect: bool) -> Mutation<bool> {
        let Some(data) = self.itineraries.get_mut(itinerary) else {
            return Mutation::unchanged(false);
        };
        let removed = data.road.remove_segment(|s| s.id() == segment, try_reconnect);
        if removed.is_empty() {
            return Mutation::unchanged(false);
        }
        let mut changes = ChangeSet::new();
        for &index in removed.iter().rev() {
            changes.push(
                ChangeEvent::new(ChangeKind::SegmentRemoved, itinerary)
                    .affecting(segment)
                    .at(index),
            );
        }
        debug!(?itinerary, %segment, occurrences = removed.len(), "road segment removed");
        self.after_road_change(itinerary, &mut changes);
        Mutation::new(true, changes)
    }

    /// Removes the segment occurrence at an absolute index.
    pub fn remove_road_segment_at(&mut self, itinerary: ItineraryKey, index: usize) -> Mutation<bool> {
        let Some(step) = self.itineraries.get_mut(itinerary).and_then(|d| d.road.remove_at(index)) else {
            return Mutation::unchanged(false);
        };
        let mut changes = ChangeSet::new();
        changes.push(
            ChangeEvent::new(ChangeKind::SegmentRemoved, itinerary)
                .affecting(step.segment_id())
                .at(index),
        );
        self.after_road_change(itinerary, &mut changes);
        Mutation::new(true, changes)
    }

    /// Empties the road. Returns the number of removed occurrences.
    pub fn remove_all_road_segments(&mut self, itinerary: ItineraryKey) -> Mutation<usize> {
        let removed = match self.itineraries.get_mut(itinerary) {
            Some(data) if !data.road.is_empty() => data.road.clear(),
            _ => return Mutation::unchanged(0),
        };
        let mut changes = ChangeSet::new();
        changes.push(ChangeEvent::new(ChangeKind::AllSegmentsRemoved, itinerary));
        self.after_road_change(itinerary, &mut changes);
        Mutation::new(removed, changes)
    }

    /// Reverses the road and the declared order of the halts.
    ///
    /// Halts keep their physical position; the absolute index of a halt
    /// bound at `i` becomes `segment_count - i - 1`.
    pub fn invert(&mut self, itinerary: ItineraryKey) -> Mutation<bool> {
        let Some(data) = self.itineraries.get_mut(itinerary) else {
            return Mutation::unchanged(false);
        };
        data.road.invert();

        let mut declared: Vec<(usize, HaltKey)> = data
            .halts
            .iter()
            .filter_map(|&h| self.halts.get(h).map(|d| (d.order, h)))
            .collect();
        declared.sort_unstable();
        let orders: Vec<usize> = declared.iter().map(|&(order, _)| order).collect();
        for (&(_, halt), &order) in declared.iter().zip(orders.iter().rev()) {
            if let Some(d) = self.halts.get_mut(halt) {
                d.order = order;
            }
        }

        let mut changes = ChangeSet::new();
        changes.push(ChangeEvent::new(ChangeKind::ItineraryInverted, itinerary));
        self.after_road_change(itinerary, &mut changes);
        debug!(?itinerary, "itinerary inverted");
        Mutation::new(true, changes)
    }

    fn after_road_change(&mut self, itinerary: ItineraryKey, changes: &mut ChangeSet) {
        self.rebind_halts(itinerary, changes);
        self.resync_halts(itinerary);
        if let Some(data) = self.itineraries.get_mut(itinerary) {
            data.primitive.bounds = None;
        }
    }

    // --- Halt binding ---

    /// Recomputes the absolute index of every halt from its bound step and
    /// invalidates the halts and the itinerary.
    pub(crate) fn rebind_halts(&mut self, itinerary: ItineraryKey, changes: &mut ChangeSet) {
        let Some(data) = self.itineraries.get(itinerary) else {
            return;
        };
        let halts: Vec<HaltKey> = data.halts.iter().copied().collect();
        let road = &data.road;
        for &halt in &halts {
            let Some(h) = self.halts.get_mut(halt) else {
                continue;
            };
            let index = h.step.and_then(|s| road.index_of_step(s));
            if h.step.is_some() && index.is_none() {
                h.unbind();
            }
            if h.segment_index != index {
                let old = std::mem::replace(&mut h.segment_index, index);
                changes.push(
                    ChangeEvent::new(ChangeKind::ItineraryHaltChanged, itinerary)
                        .affecting(halt)
                        .with_property("segment_index", old, index),
                );
            }
        }
        self.invalidate(itinerary, changes);
        for halt in halts {
            self.invalidate(halt, changes);
        }
    }

    /// Binds every halt that is not on the road and has a located stop to the
    /// nearest segment. Returns the number of halts bound.
    pub(crate) fn bind_unbound_halts(&mut self, itinerary: ItineraryKey, changes: &mut ChangeSet) -> usize {
        let Some(data) = self.itineraries.get(itinerary) else {
            return 0;
        };
        let count = data.road.segment_count();
        let mut pending: Vec<(usize, HaltKey, Point)> = data
            .halts
            .iter()
            .filter_map(|&h| {
                let halt = self.halts.get(h)?;
                if halt.segment_index.is_some_and(|i| i < count) {
                    return None;
                }
                let position = halt.stop.and_then(|s| self.stop_position(s))?;
                Some((halt.order, h, position))
            })
            .collect();
        pending.sort_by_key(|&(order, _, _)| order);

        let mut bound = 0;
        for (_, halt, position) in pending {
            if self.bind_to_nearest(itinerary, halt, &position, changes) {
                bound += 1;
            }
        }
        bound
    }

    /// Binds a halt to the segment closest to `position`; the first segment
    /// found wins ties.
    fn bind_to_nearest(&mut self, itinerary: ItineraryKey, halt: HaltKey, position: &Point, changes: &mut ChangeSet) -> bool {
        let Some(data) = self.itineraries.get(itinerary) else {
            return false;
        };
        let mut best: Option<(usize, f64)> = None;
        for (i, step) in data.road.steps().enumerate() {
            let distance = step.segment.distance(position);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        let Some((index, _)) = best else {
            return false;
        };
        let Some(step) = data.road.step_at(index) else {
            return false;
        };
        let (step_id, offset) = (step.id(), step.segment.nearest_position(position).offset);

        let Some(h) = self.halts.get_mut(halt) else {
            return false;
        };
        h.step = Some(step_id);
        h.segment_index = Some(index);
        h.offset = offset;
        changes.push(
            ChangeEvent::new(ChangeKind::ItineraryHaltChanged, itinerary)
                .affecting(halt)
                .with_property("binding", Value::Null, json!({ "segment_index": index, "offset": offset })),
        );
        self.invalidate(halt, changes);
        debug!(?halt, index, offset, "halt bound to nearest segment");
        true
    }

    // --- Queries ---

    pub fn itinerary(&self, itinerary: ItineraryKey) -> Option<&ItineraryData> {
        self.itineraries.get(itinerary)
    }

    pub fn road_path(&self, itinerary: ItineraryKey) -> Option<&ClusteredRoadPath> {
        self.itineraries.get(itinerary).map(|d| &d.road)
    }

    pub fn road_segment_count(&self, itinerary: ItineraryKey) -> usize {
        self.road_path(itinerary).map_or(0, ClusteredRoadPath::segment_count)
    }

    pub fn road_segment_at(&self, itinerary: ItineraryKey, index: usize) -> Option<&SegmentRef> {
        self.road_path(itinerary)?.segment_at(index)
    }

    pub fn index_of_road_segment(&self, itinerary: ItineraryKey, segment: SegmentId) -> Option<usize> {
        self.road_path(itinerary)?.index_of(segment)
    }

    pub fn last_index_of_road_segment(&self, itinerary: ItineraryKey, segment: SegmentId) -> Option<usize> {
        self.road_path(itinerary)?.last_index_of(segment)
    }

    /// Distance along the road from the start of the itinerary to a bound
    /// halt.
    pub(crate) fn distance_along(&self, itinerary: ItineraryKey, halt: HaltKey) -> Option<f64> {
        let road = self.road_path(itinerary)?;
        let h = self.halts.get(halt)?;
        let index = h.segment_index?;
        let step = road.step_at(index)?;
        Some(road.distance_before(index) + step.travelled(h.offset))
    }

    /// Distance travelled between the first and the last valid halt met
    /// along the road.
    pub fn itinerary_length(&self, itinerary: ItineraryKey) -> f64 {
        let along: Vec<f64> = self
            .valid_halts(itinerary)
            .iter()
            .filter_map(|&h| self.distance_along(itinerary, h))
            .collect();
        if along.len() < 2 {
            return 0.0;
        }
        let first = along.iter().copied().fold(f64::INFINITY, f64::min);
        let last = along.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        last - first
    }

    /// Road distance from halt `from` to halt `to`, both valid halts of the
    /// itinerary. Negative when `to` comes first.
    pub fn distance_between_halts(&self, itinerary: ItineraryKey, from: HaltKey, to: HaltKey) -> Option<f64> {
        let valid = self.valid_halts(itinerary);
        if !valid.contains(&from) || !valid.contains(&to) {
            return None;
        }
        Some(self.distance_along(itinerary, to)? - self.distance_along(itinerary, from)?)
    }

    /// Number of sections, a section joining two consecutive valid halts.
    pub fn section_count(&self, itinerary: ItineraryKey) -> usize {
        self.valid_halts(itinerary).len().saturating_sub(1)
    }

    /// Road distance between the valid halts `section` and `section + 1`.
    pub fn section_length(&self, itinerary: ItineraryKey, section: usize) -> Option<f64> {
        let valid = self.valid_halts(itinerary);
        let (&from, &to) = (valid.get(section)?, valid.get(section + 1)?);
        self.distance_between_halts(itinerary, from, to).map(f64::abs)
    }

    /// Halt of the itinerary closest to `point`.
    pub fn nearest_halt(&self, itinerary: ItineraryKey, point: &Point) -> Option<HaltKey> {
        let mut best: Option<(HaltKey, f64)> = None;
        for &halt in self.itineraries.get(itinerary)?.halts.iter() {
            let Some(position) = self.halt_position(halt) else {
                continue;
            };
            let distance = nalgebra::distance(&position, point);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((halt, distance));
            }
        }
        best.map(|(halt, _)| halt)
    }

    /// Absolute index of the segment closest to `point`.
    pub fn nearest_road_segment(&self, itinerary: ItineraryKey, point: &Point) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, step) in self.road_path(itinerary)?.steps().enumerate() {
            let distance = step.segment.distance(point);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Halts bound at `index`, valid ones first by offset.
    pub fn halts_on_segment(&self, itinerary: ItineraryKey, index: usize) -> Vec<HaltKey> {
        let Some(data) = self.itineraries.get(itinerary) else {
            return Vec::new();
        };
        data.halts
            .iter()
            .copied()
            .filter(|&h| self.halts.get(h).is_some_and(|d| d.segment_index == Some(index)))
            .collect()
    }

    pub fn has_halt_on_segment(&self, itinerary: ItineraryKey, index: usize) -> bool {
        !self.halts_on_segment(itinerary, index).is_empty()
    }
}
