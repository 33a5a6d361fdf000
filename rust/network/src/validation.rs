// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validity evaluation and propagation.
//!
//! Mutations reset the validity cache of the touched primitive and of every
//! primitive depending on it, and record them as dirty in a [`ChangeSet`].
//! [`BusNetwork::apply`] then settles the dirty primitives bottom-up: each is
//! evaluated once, moved to the right bucket of its container, and a VALIDITY
//! event is emitted when its validity differs from the last one announced.
//!
//! Reads never see a stale value: a `NotChecked` cache is evaluated on the
//! fly, without touching the stored state.

use std::cmp::Ordering;
use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use serde_json::Value;
use slotmap::SlotMap;
use tracing::trace;

use crate::events::{ChangeEvent, ChangeKind, ChangeSet};
use crate::keys::*;
use crate::network::{BusNetwork, HaltData, ItineraryData, StopData};
use crate::partition::BucketOrder;
use crate::validity::{Invalidity, InvalidityReason, Validity};

/// Binding of a halt as `(segment index, offset)`. Unbound halts sort last.
pub(crate) fn binding_key(halt: &HaltData) -> (usize, f64) {
    match halt.segment_index {
        Some(index) => (index, halt.offset),
        None => (usize::MAX, f64::INFINITY),
    }
}

pub(crate) fn compare_binding(a: (usize, f64), b: (usize, f64)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1))
}

/// Valid halts: by segment index then offset, ties by declared order.
pub(crate) fn by_binding(halts: &SlotMap<HaltKey, HaltData>) -> impl Fn(&HaltKey, &HaltKey) -> Ordering + '_ {
    move |a, b| match (halts.get(*a), halts.get(*b)) {
        (Some(ha), Some(hb)) => {
            compare_binding(binding_key(ha), binding_key(hb)).then_with(|| ha.order.cmp(&hb.order))
        }
        _ => Ordering::Equal,
    }
}

/// Invalid halts: declared order.
pub(crate) fn by_declared_order(halts: &SlotMap<HaltKey, HaltData>) -> impl Fn(&HaltKey, &HaltKey) -> Ordering + '_ {
    move |a, b| {
        let order = |k: &HaltKey| halts.get(*k).map_or(usize::MAX, |h| h.order);
        order(a).cmp(&order(b))
    }
}

pub(crate) fn by_stop_id(stops: &SlotMap<StopKey, StopData>) -> impl Fn(&StopKey, &StopKey) -> Ordering + '_ {
    move |a, b| {
        let id = |k: &StopKey| stops.get(*k).map(|s| s.primitive.id);
        id(a).cmp(&id(b))
    }
}

impl BusNetwork {
    // --- Queries ---

    /// Current validity of a primitive, evaluated if the cache is stale.
    ///
    /// Unknown keys report `NotChecked`.
    pub fn validity(&self, key: impl Into<PrimitiveKey>) -> Validity {
        let key = key.into();
        match self.primitive(key) {
            Some(p) if p.validity.is_checked() => p.validity.clone(),
            Some(_) => self.evaluate(key),
            None => Validity::NotChecked,
        }
    }

    pub fn is_valid(&self, key: impl Into<PrimitiveKey>) -> bool {
        let key = key.into();
        match self.primitive(key) {
            Some(p) if p.validity.is_checked() => p.validity.is_valid(),
            Some(_) => self.evaluate(key).is_valid(),
            None => false,
        }
    }

    /// Why a primitive is invalid, `None` if it is valid or unknown.
    pub fn invalidity(&self, key: impl Into<PrimitiveKey>) -> Option<Invalidity> {
        match self.validity(key) {
            Validity::Invalid(inv) => Some(inv),
            _ => None,
        }
    }

    /// The stored cache, without evaluation.
    pub fn cached_validity(&self, key: impl Into<PrimitiveKey>) -> Option<&Validity> {
        self.primitive(key.into()).map(|p| &p.validity)
    }

    // --- Predicates ---

    pub(crate) fn evaluate(&self, key: PrimitiveKey) -> Validity {
        let result = match key {
            PrimitiveKey::Network => self.check_network(),
            PrimitiveKey::Line(k) => self.check_line(k),
            PrimitiveKey::Itinerary(k) => self.check_itinerary(k),
            PrimitiveKey::Halt(k) => self.check_halt(k),
            PrimitiveKey::Stop(k) => self.check_stop(k),
            PrimitiveKey::Hub(k) => self.check_hub(k),
        };
        match result {
            Ok(()) => Validity::Valid,
            Err(inv) => Validity::Invalid(inv),
        }
    }

    fn check_stop(&self, k: StopKey) -> Result<(), Invalidity> {
        use InvalidityReason::*;
        let Some(stop) = self.stops.get(k) else {
            return Err(StopNotInNetwork.into());
        };
        if stop.position.is_none() {
            return Err(NoStopPosition.into());
        }
        if !stop.attached {
            return Err(StopNotInNetwork.into());
        }
        Ok(())
    }

    fn check_hub(&self, k: HubKey) -> Result<(), Invalidity> {
        use InvalidityReason::*;
        let Some(hub) = self.hubs.get(k) else {
            return Err(NoStopInHub.into());
        };
        if hub.stops.is_empty() {
            return Err(NoStopInHub.into());
        }
        for &stop in &hub.stops {
            if !self.is_valid(stop) {
                return Err(Invalidity::with_detail(InvalidStopInHub, self.label(stop)));
            }
        }
        for &stop in &hub.stops {
            let attached = self.stops.get(stop).is_some_and(|s| s.attached);
            if !hub.attached || !attached {
                return Err(Invalidity::with_detail(NotInSameNetwork, self.label(stop)));
            }
        }
        Ok(())
    }

    fn check_halt(&self, k: HaltKey) -> Result<(), Invalidity> {
        use InvalidityReason::*;
        let Some(halt) = self.halts.get(k) else {
            return Err(HaltNotInItinerary.into());
        };
        let Some(itinerary) = halt.itinerary.and_then(|i| self.itineraries.get(i)) else {
            return Err(HaltNotInItinerary.into());
        };
        let Some(stop) = halt.stop else {
            return Err(NoStopInHalt.into());
        };
        if !self.is_valid(stop) {
            return Err(Invalidity::with_detail(InvalidLinkedStop, self.label(stop)));
        }
        match halt.segment_index {
            Some(index) if index < itinerary.road.segment_count() => {}
            _ => return Err(HaltNotOnRoadSegment.into()),
        }
        if !halt.offset.is_finite() {
            return Err(InvalidCurvilinePosition.into());
        }
        let stop_attached = self.stops.get(stop).is_some_and(|s| s.attached);
        if !stop_attached || !self.itinerary_in_network(itinerary) {
            return Err(Invalidity::with_detail(NotInSameNetwork, self.label(stop)));
        }
        Ok(())
    }

    fn itinerary_in_network(&self, itinerary: &ItineraryData) -> bool {
        itinerary.line.and_then(|l| self.lines.get(l)).is_some_and(|l| l.attached)
    }

    fn check_itinerary(&self, k: ItineraryKey) -> Result<(), Invalidity> {
        use InvalidityReason::*;
        let Some(itinerary) = self.itineraries.get(k) else {
            return Err(NoBusNetwork.into());
        };
        let road = &itinerary.road;
        if road.is_empty() {
            return Err(NoRoadSegmentInItinerary.into());
        }
        if road.cluster_count() > 1 {
            return Err(Invalidity::with_detail(
                DiscontinuousPathInItinerary,
                road.cluster_count().to_string(),
            ));
        }

        let valid_count = itinerary.halts.iter().filter(|&&h| self.is_valid(h)).count();
        if valid_count < self.config.min_valid_halts {
            return Err(Invalidity::with_detail(NotEnoughValidBusHalts, valid_count.to_string()));
        }
        if let Some(&h) = itinerary.halts.iter().find(|&&h| !self.is_valid(h)) {
            return Err(Invalidity::with_detail(InvalidHaltInItinerary, self.label(h)));
        }

        if !self.itinerary_in_network(itinerary) {
            return Err(NoBusNetwork.into());
        }
        let Some(road_network) = self.road_network else {
            return Err(NoRoadNetwork.into());
        };
        if let Some(step) = road.steps().find(|s| s.segment.road_network() != Some(road_network)) {
            return Err(Invalidity::with_detail(SegmentOutsideRoadNetwork, step.segment_id().to_string()));
        }

        // Valid bucket must follow the road
        let keys: Vec<(HaltKey, (usize, f64))> = itinerary
            .halts
            .valid()
            .iter()
            .filter_map(|&h| self.halts.get(h).map(|d| (h, binding_key(d))))
            .collect();
        for pair in keys.windows(2) {
            if compare_binding(pair[0].1, pair[1].1) == Ordering::Greater {
                return Err(Invalidity::with_detail(InvalidHaltOrder, self.label(pair[1].0)));
            }
        }

        // Every halt is valid here
        let indices: Vec<usize> = itinerary
            .halts
            .iter()
            .filter_map(|&h| self.halts.get(h).and_then(|d| d.segment_index))
            .collect();
        let first = indices.iter().min().copied();
        let last = indices.iter().max().copied();
        if first != Some(0) || last != Some(road.segment_count() - 1) {
            return Err(UnusedRoadSegmentBeyondTerminus.into());
        }
        Ok(())
    }

    fn check_line(&self, k: LineKey) -> Result<(), Invalidity> {
        use InvalidityReason::*;
        let Some(line) = self.lines.get(k) else {
            return Err(NoItineraryInLine.into());
        };
        if line.itineraries.is_empty() {
            return Err(NoItineraryInLine.into());
        }
        if let Some(&i) = line.itineraries.iter().find(|&&i| !self.is_valid(i)) {
            return Err(Invalidity::with_detail(InvalidItineraryInLine, self.label(i)));
        }
        Ok(())
    }

    fn check_network(&self) -> Result<(), Invalidity> {
        use InvalidityReason::*;
        let valid_stops = self.stop_buckets.iter().filter(|&&s| self.is_valid(s)).count();
        if valid_stops < self.config.min_valid_stops {
            return Err(Invalidity::with_detail(NotEnoughValidBusStops, valid_stops.to_string()));
        }
        if let Some(&s) = self.stop_buckets.iter().find(|&&s| !self.is_valid(s)) {
            return Err(Invalidity::with_detail(InvalidStopInNetwork, self.label(s)));
        }
        if let Some(&h) = self.hub_buckets.iter().find(|&&h| !self.is_valid(h)) {
            return Err(Invalidity::with_detail(InvalidHubInNetwork, self.label(h)));
        }
        if self.line_order.is_empty() {
            return Err(NoLineInNetwork.into());
        }
        if let Some(&l) = self.line_order.iter().find(|&&l| !self.is_valid(l)) {
            return Err(Invalidity::with_detail(InvalidLineInNetwork, self.label(l)));
        }
        Ok(())
    }

    fn label(&self, key: impl Into<PrimitiveKey>) -> String {
        self.name(key).unwrap_or_default().to_string()
    }

    // --- Invalidation ---

    /// Primitives whose validity depends on `key`.
    fn dependents(&self, key: PrimitiveKey) -> Vec<PrimitiveKey> {
        let mut out = Vec::new();
        match key {
            PrimitiveKey::Network => {}
            PrimitiveKey::Stop(k) => {
                if let Some(halts) = self.stop_to_halts.get(&k) {
                    let mut halts: Vec<HaltKey> = halts.iter().copied().collect();
                    halts.sort();
                    out.extend(halts.into_iter().map(PrimitiveKey::from));
                }
                if let Some(hubs) = self.stop_to_hubs.get(&k) {
                    let mut hubs: Vec<HubKey> = hubs.iter().copied().collect();
                    hubs.sort();
                    out.extend(hubs.into_iter().map(PrimitiveKey::from));
                }
                if self.stops.get(k).is_some_and(|s| s.attached) {
                    out.push(PrimitiveKey::Network);
                }
            }
            PrimitiveKey::Halt(k) => {
                if let Some(i) = self.halts.get(k).and_then(|h| h.itinerary) {
                    out.push(i.into());
                }
            }
            PrimitiveKey::Hub(k) => {
                if self.hubs.get(k).is_some_and(|h| h.attached) {
                    out.push(PrimitiveKey::Network);
                }
            }
            PrimitiveKey::Itinerary(k) => {
                if let Some(l) = self.itineraries.get(k).and_then(|i| i.line) {
                    out.push(l.into());
                }
            }
            PrimitiveKey::Line(k) => {
                if self.lines.get(k).is_some_and(|l| l.attached) {
                    out.push(PrimitiveKey::Network);
                }
            }
        }
        out
    }

    /// Resets the cache of `key` and of everything depending on it, and
    /// marks them dirty.
    pub(crate) fn invalidate(&mut self, key: impl Into<PrimitiveKey>, changes: &mut ChangeSet) {
        let mut stack = vec![key.into()];
        let mut seen = FxHashSet::default();
        while let Some(k) = stack.pop() {
            if !seen.insert(k) {
                continue;
            }
            let Some(p) = self.primitive_mut(k) else {
                continue;
            };
            p.reset();
            changes.mark(k);
            stack.extend(self.dependents(k));
        }
    }

    /// `key` and every primitive it owns, children first.
    fn subtree(&self, key: PrimitiveKey) -> Vec<PrimitiveKey> {
        let mut out = Vec::new();
        match key {
            PrimitiveKey::Network => {
                for &s in self.stop_buckets.iter() {
                    out.push(s.into());
                }
                for &h in self.hub_buckets.iter() {
                    out.push(h.into());
                }
                for &l in &self.line_order {
                    out.extend(self.subtree(l.into()));
                }
            }
            PrimitiveKey::Line(k) => {
                if let Some(line) = self.lines.get(k) {
                    for &i in &line.itineraries {
                        out.extend(self.subtree(i.into()));
                    }
                }
            }
            PrimitiveKey::Itinerary(k) => {
                if let Some(itinerary) = self.itineraries.get(k) {
                    out.extend(itinerary.halts.iter().map(|&h| PrimitiveKey::from(h)));
                }
            }
            PrimitiveKey::Hub(k) => {
                if let Some(hub) = self.hubs.get(k) {
                    out.extend(hub.stops.iter().map(|&s| PrimitiveKey::from(s)));
                }
            }
            PrimitiveKey::Halt(_) | PrimitiveKey::Stop(_) => {}
        }
        out.push(key);
        out
    }

    // --- Settling ---

    /// Settles the validity of the dirty primitives of `changes`, then
    /// delivers every event to the listeners if `notify` is set.
    ///
    /// Returns the structural events followed by the VALIDITY events.
    pub fn apply(&mut self, changes: ChangeSet, notify: bool) -> Vec<ChangeEvent> {
        let ChangeSet { mut events, dirty } = changes;
        self.settle(dirty, &mut events, true);
        if notify {
            self.deliver(&events);
        }
        events
    }

    /// Checks `key` and its owned subtree again, children first.
    ///
    /// Calling it twice in a row changes nothing the second time.
    pub fn revalidate(&mut self, key: impl Into<PrimitiveKey>, notify: bool) -> Vec<ChangeEvent> {
        let mut changes = ChangeSet::new();
        for k in self.subtree(key.into()) {
            self.invalidate(k, &mut changes);
        }
        self.apply(changes, notify)
    }

    /// Recomputes every validity cache and container bucket from scratch.
    ///
    /// Each primitive is checked once, bottom-up, the network last. Meant to
    /// finish a bulk load whose changes were applied without notification.
    pub fn rebuild(&mut self, notify: bool) -> Vec<ChangeEvent> {
        let mut keys: Vec<PrimitiveKey> = Vec::new();
        keys.extend(self.stops.keys().map(PrimitiveKey::from));
        keys.extend(self.halts.keys().map(PrimitiveKey::from));
        keys.extend(self.hubs.keys().map(PrimitiveKey::from));
        keys.extend(self.itineraries.keys().map(PrimitiveKey::from));
        keys.extend(self.lines.keys().map(PrimitiveKey::from));
        keys.push(PrimitiveKey::Network);
        for &k in &keys {
            if let Some(p) = self.primitive_mut(k) {
                p.reset();
            }
        }

        let mut events = Vec::new();
        self.settle(keys, &mut events, false);

        let itineraries: Vec<ItineraryKey> = self.itineraries.keys().collect();
        for itinerary in itineraries {
            self.resync_halts(itinerary);
        }
        self.resync_members();

        if notify {
            self.deliver(&events);
        }
        events
    }

    fn settle(&mut self, dirty: Vec<PrimitiveKey>, events: &mut Vec<ChangeEvent>, cascade: bool) {
        // One queue per primitive type, drained in dependency order
        let mut queues: [VecDeque<PrimitiveKey>; 6] = Default::default();
        let mut queued = FxHashSet::default();
        for key in dirty {
            if queued.insert(key) {
                queues[key.primitive_type() as usize].push_back(key);
            }
        }

        while let Some(key) = queues.iter_mut().find_map(|q| q.pop_front()) {
            if self.primitive(key).is_none() {
                continue;
            }
            let validity = self.evaluate(key);
            let valid = validity.is_valid();
            let changed = self.set_validity(key, validity);
            self.sync_membership(key, valid);

            let Some((old, new)) = changed else {
                continue;
            };
            trace!(?key, %old, %new, "validity changed");
            events.push(ChangeEvent::new(ChangeKind::Validity, key).with_property(
                "validity",
                serde_json::to_value(&old).unwrap_or(Value::Null),
                serde_json::to_value(&new).unwrap_or(Value::Null),
            ));
            if cascade {
                for dependent in self.dependents(key) {
                    if queued.insert(dependent) {
                        if let Some(p) = self.primitive_mut(dependent) {
                            p.reset();
                        }
                        queues[dependent.primitive_type() as usize].push_back(dependent);
                    }
                }
            }
        }
    }

    /// Stores a freshly evaluated validity. Returns the previously announced
    /// value and the new one if they differ.
    fn set_validity(&mut self, key: PrimitiveKey, validity: Validity) -> Option<(Validity, Validity)> {
        let p = self.primitive_mut(key)?;
        p.validity = validity.clone();
        if p.reported == validity {
            return None;
        }
        p.bounds = None;
        let old = std::mem::replace(&mut p.reported, validity.clone());
        Some((old, validity))
    }

    /// Moves a settled primitive to the bucket matching its validity.
    fn sync_membership(&mut self, key: PrimitiveKey, valid: bool) {
        match key {
            PrimitiveKey::Stop(k) => {
                if self.stops.get(k).is_some_and(|s| s.attached) {
                    let cmp = by_stop_id(&self.stops);
                    self.stop_buckets.relocate(k, valid, &BucketOrder::uniform(&cmp));
                }
            }
            PrimitiveKey::Hub(k) => {
                if self.hubs.get(k).is_some_and(|h| h.attached) {
                    let hubs = &self.hubs;
                    let cmp = |a: &HubKey, b: &HubKey| {
                        let id = |k: &HubKey| hubs.get(*k).map(|h| h.primitive.id);
                        id(a).cmp(&id(b))
                    };
                    self.hub_buckets.relocate(k, valid, &BucketOrder::uniform(&cmp));
                }
            }
            PrimitiveKey::Halt(k) => {
                let Some(itinerary) = self.halts.get(k).and_then(|h| h.itinerary) else {
                    return;
                };
                let Some(data) = self.itineraries.get_mut(itinerary) else {
                    return;
                };
                let binding = by_binding(&self.halts);
                let declared = by_declared_order(&self.halts);
                let order = BucketOrder {
                    valid: &binding,
                    invalid: &declared,
                };
                data.halts.relocate(k, valid, &order);
            }
            PrimitiveKey::Network | PrimitiveKey::Line(_) | PrimitiveKey::Itinerary(_) => {}
        }
    }

    /// Rebuilds both halt buckets of an itinerary from the current validity
    /// and binding of its halts.
    pub(crate) fn resync_halts(&mut self, itinerary: ItineraryKey) {
        let Some(data) = self.itineraries.get(itinerary) else {
            return;
        };
        let members: Vec<(HaltKey, bool)> = data.halts.iter().map(|&h| (h, self.is_valid(h))).collect();
        let Some(data) = self.itineraries.get_mut(itinerary) else {
            return;
        };
        data.halts.clear();
        let binding = by_binding(&self.halts);
        let declared = by_declared_order(&self.halts);
        let order = BucketOrder {
            valid: &binding,
            invalid: &declared,
        };
        for (halt, valid) in members {
            data.halts.insert(halt, valid, &order);
        }
    }

    /// Rebuilds the network's stop and hub buckets.
    fn resync_members(&mut self) {
        let stops: Vec<(StopKey, bool)> = self.stop_buckets.iter().map(|&s| (s, self.is_valid(s))).collect();
        let hubs: Vec<(HubKey, bool)> = self.hub_buckets.iter().map(|&h| (h, self.is_valid(h))).collect();
        for (stop, valid) in stops {
            self.sync_membership(stop.into(), valid);
        }
        for (hub, valid) in hubs {
            self.sync_membership(hub.into(), valid);
        }
    }
}
