// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Halts of an itinerary: membership, stop links and road bindings.

use busnet_road::{Point, SegmentId};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeKind, ChangeSet, Mutation};
use crate::keys::*;
use crate::network::{BusNetwork, HaltData, HaltKind};
use crate::primitive::Primitive;

/// Where [`BusNetwork::insert_halt`] puts the new halt in the declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltPlacement {
    Last,
    Before(HaltKey),
    After(HaltKey),
}

impl BusNetwork {
    // --- Construction ---

    /// Creates a halt outside of any itinerary.
    pub fn create_halt(&mut self, name: impl Into<String>, stop: Option<StopKey>, kind: HaltKind) -> HaltKey {
        let stop = stop.filter(|&s| self.stops.contains_key(s));
        let halt = self.halts.insert(HaltData {
            primitive: Primitive::new(name),
            itinerary: None,
            stop,
            kind,
            step: None,
            segment_index: None,
            offset: f64::NAN,
            order: 0,
        });
        if let Some(stop) = stop {
            self.link_stop_halt(stop, halt);
        }
        halt
    }

    /// Creates a halt at the end of the itinerary. `None` if the itinerary is
    /// unknown.
    pub fn add_halt(
        &mut self,
        itinerary: ItineraryKey,
        name: impl Into<String>,
        stop: Option<StopKey>,
        kind: HaltKind,
    ) -> Mutation<Option<HaltKey>> {
        self.insert_halt(itinerary, HaltPlacement::Last, name, stop, kind)
    }

    pub fn insert_halt_before(
        &mut self,
        reference: HaltKey,
        name: impl Into<String>,
        stop: Option<StopKey>,
        kind: HaltKind,
    ) -> Mutation<Option<HaltKey>> {
        match self.halts.get(reference).and_then(|h| h.itinerary) {
            Some(itinerary) => self.insert_halt(itinerary, HaltPlacement::Before(reference), name, stop, kind),
            None => Mutation::unchanged(None),
        }
    }

    pub fn insert_halt_after(
        &mut self,
        reference: HaltKey,
        name: impl Into<String>,
        stop: Option<StopKey>,
        kind: HaltKind,
    ) -> Mutation<Option<HaltKey>> {
        match self.halts.get(reference).and_then(|h| h.itinerary) {
            Some(itinerary) => self.insert_halt(itinerary, HaltPlacement::After(reference), name, stop, kind),
            None => Mutation::unchanged(None),
        }
    }

    /// Creates a halt and places it in the itinerary's declared order.
    pub fn insert_halt(
        &mut self,
        itinerary: ItineraryKey,
        placement: HaltPlacement,
        name: impl Into<String>,
        stop: Option<StopKey>,
        kind: HaltKind,
    ) -> Mutation<Option<HaltKey>> {
        if !self.itineraries.contains_key(itinerary) {
            return Mutation::unchanged(None);
        }
        let halt = self.create_halt(name, stop, kind);
        let Mutation { value, changes } = self.attach_halt_at(itinerary, halt, placement);
        if !value {
            self.halts.remove(halt);
            if let Some(stop) = stop {
                self.unlink_stop_halt(stop, halt);
            }
            return Mutation::unchanged(None);
        }
        Mutation::new(Some(halt), changes)
    }

    /// Appends a detached halt to an itinerary.
    pub fn attach_halt(&mut self, itinerary: ItineraryKey, halt: HaltKey) -> Mutation<bool> {
        self.attach_halt_at(itinerary, halt, HaltPlacement::Last)
    }

    fn attach_halt_at(&mut self, itinerary: ItineraryKey, halt: HaltKey, placement: HaltPlacement) -> Mutation<bool> {
        if !self.halts.get(halt).is_some_and(|h| h.itinerary.is_none()) {
            return Mutation::unchanged(false);
        }
        let order = match placement {
            HaltPlacement::Last => None,
            HaltPlacement::Before(reference) | HaltPlacement::After(reference) => {
                let Some(r) = self.halts.get(reference).filter(|r| r.itinerary == Some(itinerary)) else {
                    return Mutation::unchanged(false);
                };
                Some(if matches!(placement, HaltPlacement::Before(_)) { r.order } else { r.order + 1 })
            }
        };
        let Some(data) = self.itineraries.get_mut(itinerary) else {
            return Mutation::unchanged(false);
        };
        let order = match order {
            Some(order) => {
                for &h in data.halts.iter() {
                    if let Some(other) = self.halts.get_mut(h).filter(|o| o.order >= order) {
                        other.order += 1;
                    }
                }
                order
            }
            None => data.next_order,
        };
        data.next_order = data.next_order.max(order) + 1;

        if let Some(h) = self.halts.get_mut(halt) {
            h.itinerary = Some(itinerary);
            h.order = order;
            h.unbind();
        }
        let mut changes = ChangeSet::new();
        self.invalidate(halt, &mut changes);
        let valid = self.is_valid(halt);
        if let Some(data) = self.itineraries.get_mut(itinerary) {
            let binding = crate::validation::by_binding(&self.halts);
            let declared = crate::validation::by_declared_order(&self.halts);
            let buckets = crate::partition::BucketOrder {
                valid: &binding,
                invalid: &declared,
            };
            data.halts.insert(halt, valid, &buckets);
        }
        let index = self.halts(itinerary).iter().position(|&h| h == halt).unwrap_or(order);
        changes.push(
            ChangeEvent::new(ChangeKind::ItineraryHaltAdded, itinerary)
                .affecting(halt)
                .at(index),
        );

        if self.config.auto_connect_halts {
            self.bind_unbound_halts(itinerary, &mut changes);
        }
        self.resync_halts(itinerary);
        Mutation::new(true, changes)
    }

    // --- Removal ---

    /// Removes a halt from its itinerary, dropping its binding and its stop.
    pub fn remove_halt(&mut self, halt: HaltKey) -> Mutation<bool> {
        let Some(itinerary) = self.halts.get(halt).and_then(|h| h.itinerary) else {
            return Mutation::unchanged(false);
        };
        let index = self.halts(itinerary).iter().position(|&h| h == halt);
        let mut changes = ChangeSet::new();
        self.detach_halt(itinerary, halt, &mut changes);

        let mut event = ChangeEvent::new(ChangeKind::ItineraryHaltRemoved, itinerary).affecting(halt);
        if let Some(index) = index {
            event = event.at(index);
        }
        changes.push(event);
        self.resync_halts(itinerary);
        Mutation::new(true, changes)
    }

    pub fn remove_halt_named(&mut self, itinerary: ItineraryKey, name: &str) -> Mutation<bool> {
        match self.halt_named(itinerary, name) {
            Some(halt) => self.remove_halt(halt),
            None => Mutation::unchanged(false),
        }
    }

    /// Removes the halt at `index` in declared order.
    pub fn remove_halt_at(&mut self, itinerary: ItineraryKey, index: usize) -> Mutation<bool> {
        match self.halts(itinerary).get(index).copied() {
            Some(halt) => self.remove_halt(halt),
            None => Mutation::unchanged(false),
        }
    }

    pub fn remove_all_halts(&mut self, itinerary: ItineraryKey) -> Mutation<usize> {
        let all = self.halts(itinerary);
        if all.is_empty() {
            return Mutation::unchanged(0);
        }
        let mut changes = ChangeSet::new();
        for &halt in &all {
            self.detach_halt(itinerary, halt, &mut changes);
        }
        changes.push(ChangeEvent::new(ChangeKind::AllItineraryHaltsRemoved, itinerary));
        Mutation::new(all.len(), changes)
    }

    fn detach_halt(&mut self, itinerary: ItineraryKey, halt: HaltKey, changes: &mut ChangeSet) {
        self.invalidate(halt, changes);
        if let Some(data) = self.itineraries.get_mut(itinerary) {
            let binding = crate::validation::by_binding(&self.halts);
            let declared = crate::validation::by_declared_order(&self.halts);
            let buckets = crate::partition::BucketOrder {
                valid: &binding,
                invalid: &declared,
            };
            data.halts.remove(halt, &buckets);
        }
        let stop = self.halts.get_mut(halt).and_then(|h| {
            h.itinerary = None;
            h.unbind();
            h.stop.take()
        });
        if let Some(stop) = stop {
            self.unlink_stop_halt(stop, halt);
        }
        self.invalidate(halt, changes);
        self.invalidate(itinerary, changes);
    }

    // --- Attributes ---

    /// Links a halt to a stop, or unlinks it with `None`.
    pub fn set_halt_stop(&mut self, halt: HaltKey, stop: Option<StopKey>) -> Mutation<bool> {
        if stop.is_some_and(|s| !self.stops.contains_key(s)) {
            return Mutation::unchanged(false);
        }
        let Some(data) = self.halts.get_mut(halt) else {
            return Mutation::unchanged(false);
        };
        if data.stop == stop {
            return Mutation::unchanged(false);
        }
        let old = std::mem::replace(&mut data.stop, stop);
        let itinerary = data.itinerary;
        if let Some(old) = old {
            self.unlink_stop_halt(old, halt);
        }
        if let Some(stop) = stop {
            self.link_stop_halt(stop, halt);
        }

        let mut changes = ChangeSet::new();
        let id = |s: Option<StopKey>| s.and_then(|s| self.identifier(s)).map(|id| id.to_string());
        let event = ChangeEvent::new(ChangeKind::ItineraryHaltChanged, itinerary.map_or(PrimitiveKey::from(halt), PrimitiveKey::from))
            .affecting(halt)
            .with_property("stop", id(old), id(stop));
        changes.push(event);
        self.invalidate(halt, &mut changes);

        if let Some(itinerary) = itinerary {
            if self.config.auto_connect_halts {
                self.bind_unbound_halts(itinerary, &mut changes);
            }
            self.resync_halts(itinerary);
        }
        Mutation::new(true, changes)
    }

    pub fn set_halt_kind(&mut self, halt: HaltKey, kind: HaltKind) -> Mutation<bool> {
        let Some(data) = self.halts.get_mut(halt) else {
            return Mutation::unchanged(false);
        };
        if data.kind == kind {
            return Mutation::unchanged(false);
        }
        let old = std::mem::replace(&mut data.kind, kind);
        let source = data.itinerary.map_or(PrimitiveKey::from(halt), PrimitiveKey::from);
        let mut changes = ChangeSet::new();
        changes.push(ChangeEvent::new(ChangeKind::ItineraryHaltChanged, source).affecting(halt).with_property(
            "kind",
            serde_json::to_value(old).unwrap_or(Value::Null),
            serde_json::to_value(kind).unwrap_or(Value::Null),
        ));
        Mutation::new(true, changes)
    }

    // --- Binding ---

    /// Current binding as `(segment index, curviline offset)`.
    pub fn halt_binding(&self, halt: HaltKey) -> Option<(usize, f64)> {
        let h = self.halts.get(halt)?;
        Some((h.segment_index?, h.offset))
    }

    /// Binds a halt explicitly.
    ///
    /// Fails if the halt has no itinerary. An out-of-range index is stored
    /// as is and leaves the halt invalid.
    pub fn set_halt_binding(&mut self, halt: HaltKey, index: usize, offset: f64) -> Result<Mutation<bool>> {
        let itinerary = self
            .halts
            .get(halt)
            .ok_or(Error::NotFound(PrimitiveKey::Halt(halt)))?
            .itinerary
            .ok_or(Error::HaltNotInItinerary(halt))?;
        let step = self
            .itineraries
            .get(itinerary)
            .and_then(|d| d.road.step_at(index))
            .map(|s| s.id());

        let Some(h) = self.halts.get_mut(halt) else {
            return Ok(Mutation::unchanged(false));
        };
        if h.segment_index == Some(index) && h.offset.to_bits() == offset.to_bits() {
            return Ok(Mutation::unchanged(false));
        }
        let old = json!({ "segment_index": h.segment_index, "offset": finite_or_null(h.offset) });
        h.step = step;
        h.segment_index = Some(index);
        h.offset = offset;

        let mut changes = ChangeSet::new();
        changes.push(
            ChangeEvent::new(ChangeKind::ItineraryHaltChanged, itinerary)
                .affecting(halt)
                .with_property("binding", old, json!({ "segment_index": index, "offset": finite_or_null(offset) })),
        );
        self.invalidate(halt, &mut changes);
        self.resync_halts(itinerary);
        Ok(Mutation::new(true, changes))
    }

    /// Removes a halt's binding.
    pub fn clear_halt_binding(&mut self, halt: HaltKey) -> Mutation<bool> {
        let Some(h) = self.halts.get_mut(halt) else {
            return Mutation::unchanged(false);
        };
        if h.step.is_none() && h.segment_index.is_none() {
            return Mutation::unchanged(false);
        }
        let old = json!({ "segment_index": h.segment_index, "offset": finite_or_null(h.offset) });
        h.unbind();
        let itinerary = h.itinerary;

        let mut changes = ChangeSet::new();
        let source = itinerary.map_or(PrimitiveKey::from(halt), PrimitiveKey::from);
        changes.push(
            ChangeEvent::new(ChangeKind::ItineraryHaltChanged, source)
                .affecting(halt)
                .with_property("binding", old, Value::Null),
        );
        self.invalidate(halt, &mut changes);
        if let Some(itinerary) = itinerary {
            self.resync_halts(itinerary);
        }
        Mutation::new(true, changes)
    }

    /// Binds a halt to the first occurrence of `segment`, at the projection
    /// of its stop.
    ///
    /// Fails if the halt has no itinerary; `false` if the stop has no
    /// position or the segment is not on the itinerary's road.
    pub fn put_halt_on_road(&mut self, halt: HaltKey, segment: SegmentId) -> Result<Mutation<bool>> {
        let h = self.halts.get(halt).ok_or(Error::NotFound(PrimitiveKey::Halt(halt)))?;
        let itinerary = h.itinerary.ok_or(Error::HaltNotInItinerary(halt))?;
        let Some(position) = h.stop.and_then(|s| self.stop_position(s)) else {
            return Ok(Mutation::unchanged(false));
        };
        let Some(road) = self.road_path(itinerary) else {
            return Ok(Mutation::unchanged(false));
        };
        let Some(index) = road.index_of(segment) else {
            return Ok(Mutation::unchanged(false));
        };
        let offset = road
            .segment_at(index)
            .map_or(f64::NAN, |s| s.nearest_position(&position).offset);
        self.set_halt_binding(halt, index, offset)
    }

    /// Binds every halt of the itinerary that is off the road and has a
    /// located stop to its nearest segment. Returns the number of bound halts.
    pub fn put_invalid_halts_on_roads(&mut self, itinerary: ItineraryKey) -> Mutation<usize> {
        let mut changes = ChangeSet::new();
        let bound = self.bind_unbound_halts(itinerary, &mut changes);
        if bound > 0 {
            self.resync_halts(itinerary);
            debug!(?itinerary, bound, "halts put on road");
        }
        Mutation::new(bound, changes)
    }

    // --- Queries ---

    pub fn halt(&self, halt: HaltKey) -> Option<&HaltData> {
        self.halts.get(halt)
    }

    /// Halts of an itinerary in declared order.
    pub fn halts(&self, itinerary: ItineraryKey) -> Vec<HaltKey> {
        let Some(data) = self.itineraries.get(itinerary) else {
            return Vec::new();
        };
        let mut halts: Vec<HaltKey> = data.halts.iter().copied().collect();
        halts.sort_by_key(|&h| self.halts.get(h).map_or(usize::MAX, |d| d.order));
        halts
    }

    /// Valid halts by segment index and offset.
    pub fn valid_halts(&self, itinerary: ItineraryKey) -> &[HaltKey] {
        self.itineraries.get(itinerary).map(|d| d.halts.valid()).unwrap_or_default()
    }

    /// Invalid halts in declared order.
    pub fn invalid_halts(&self, itinerary: ItineraryKey) -> &[HaltKey] {
        self.itineraries.get(itinerary).map(|d| d.halts.invalid()).unwrap_or_default()
    }

    pub fn halt_count(&self, itinerary: ItineraryKey) -> usize {
        self.itineraries.get(itinerary).map_or(0, |d| d.halts.len())
    }

    pub fn halt_named(&self, itinerary: ItineraryKey, name: &str) -> Option<HaltKey> {
        self.halts(itinerary)
            .into_iter()
            .find(|&h| self.halts.get(h).is_some_and(|d| d.primitive.name == name))
    }

    /// Point of the road where a bound halt lies.
    pub fn halt_position(&self, halt: HaltKey) -> Option<Point> {
        let h = self.halts.get(halt)?;
        if !h.offset.is_finite() {
            return None;
        }
        let segment = self.road_path(h.itinerary?)?.segment_at(h.segment_index?)?;
        Some(segment.point_at(h.offset))
    }

    /// `true` for the first valid halt of its itinerary.
    pub fn is_starting_halt(&self, halt: HaltKey) -> bool {
        self.halts
            .get(halt)
            .and_then(|h| h.itinerary)
            .is_some_and(|i| self.valid_halts(i).first() == Some(&halt))
    }

    /// `true` for the last valid halt of its itinerary.
    pub fn is_ending_halt(&self, halt: HaltKey) -> bool {
        self.halts
            .get(halt)
            .and_then(|h| h.itinerary)
            .is_some_and(|i| self.valid_halts(i).last() == Some(&halt))
    }

    pub fn is_terminus(&self, halt: HaltKey) -> bool {
        self.is_starting_halt(halt) || self.is_ending_halt(halt)
    }

    pub fn first_free_halt_name(&self, itinerary: ItineraryKey) -> String {
        let prefix = &self.config.halt_name_prefix;
        (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|name| self.halt_named(itinerary, name).is_none())
            .unwrap_or_else(|| prefix.clone())
    }
}

fn finite_or_null(value: f64) -> Value {
    if value.is_finite() {
        json!(value)
    } else {
        Value::Null
    }
}
