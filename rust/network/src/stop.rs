// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus stops and their referrer bookkeeping.

use busnet_road::Point;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::events::{ChangeEvent, ChangeKind, ChangeSet, Mutation};
use crate::keys::*;
use crate::network::{BusNetwork, StopData};
use crate::partition::BucketOrder;
use crate::primitive::Primitive;
use crate::validation::by_stop_id;

pub(crate) fn point_value(point: Option<Point>) -> Value {
    point.map_or(Value::Null, |p| json!([p.x, p.y]))
}

impl BusNetwork {
    /// Creates a stop outside of the network.
    pub fn create_stop(&mut self, name: impl Into<String>, position: Option<Point>) -> StopKey {
        self.stops.insert(StopData {
            primitive: Primitive::new(name),
            attached: false,
            position,
        })
    }

    /// Creates a stop and adds it to the network.
    pub fn add_stop(&mut self, name: impl Into<String>, position: Option<Point>) -> Mutation<StopKey> {
        let stop = self.create_stop(name, position);
        let Mutation { changes, .. } = self.attach_stop(stop);
        Mutation::new(stop, changes)
    }

    /// Adds a detached stop to the network.
    pub fn attach_stop(&mut self, stop: StopKey) -> Mutation<bool> {
        match self.stops.get_mut(stop) {
            Some(data) if !data.attached => data.attached = true,
            _ => return Mutation::unchanged(false),
        }
        let mut changes = ChangeSet::new();
        self.invalidate(stop, &mut changes);

        let valid = self.is_valid(stop);
        let cmp = by_stop_id(&self.stops);
        self.stop_buckets.insert(stop, valid, &BucketOrder::uniform(&cmp));
        changes.push(ChangeEvent::new(ChangeKind::StopAdded, PrimitiveKey::Network).affecting(stop));
        Mutation::new(true, changes)
    }

    /// Removes a stop from the network.
    ///
    /// Halts referencing it lose their stop and hubs drop it from their list.
    pub fn remove_stop(&mut self, stop: StopKey) -> Mutation<bool> {
        if !self.stops.get(stop).is_some_and(|s| s.attached) {
            return Mutation::unchanged(false);
        }
        let mut changes = ChangeSet::new();
        self.invalidate(stop, &mut changes);
        self.detach_stop(stop);
        self.clear_stop_referrers(stop, &mut changes);
        changes.push(ChangeEvent::new(ChangeKind::StopRemoved, PrimitiveKey::Network).affecting(stop));
        self.invalidate(stop, &mut changes);
        Mutation::new(true, changes)
    }

    /// Removes every stop from the network. Returns the number removed.
    pub fn remove_all_stops(&mut self) -> Mutation<usize> {
        let all: Vec<StopKey> = self.stop_buckets.iter().copied().collect();
        if all.is_empty() {
            return Mutation::unchanged(0);
        }
        let mut changes = ChangeSet::new();
        for &stop in &all {
            self.invalidate(stop, &mut changes);
        }
        self.stop_buckets.clear();
        for &stop in &all {
            if let Some(data) = self.stops.get_mut(stop) {
                data.attached = false;
            }
            self.clear_stop_referrers(stop, &mut changes);
            self.invalidate(stop, &mut changes);
        }
        self.invalidate(PrimitiveKey::Network, &mut changes);
        changes.push(ChangeEvent::new(ChangeKind::AllStopsRemoved, PrimitiveKey::Network));
        Mutation::new(all.len(), changes)
    }

    fn detach_stop(&mut self, stop: StopKey) {
        {
            let cmp = by_stop_id(&self.stops);
            self.stop_buckets.remove(stop, &BucketOrder::uniform(&cmp));
        }
        if let Some(data) = self.stops.get_mut(stop) {
            data.attached = false;
        }
    }

    /// Unlinks every halt and hub referencing `stop`.
    pub(crate) fn clear_stop_referrers(&mut self, stop: StopKey, changes: &mut ChangeSet) {
        for halt in self.halts_of_stop(stop) {
            self.invalidate(halt, changes);
            if let Some(data) = self.halts.get_mut(halt) {
                data.stop = None;
            }
            let source = self.halts.get(halt).and_then(|h| h.itinerary).map_or(PrimitiveKey::from(halt), PrimitiveKey::from);
            changes.push(
                ChangeEvent::new(ChangeKind::ItineraryHaltChanged, source)
                    .affecting(halt)
                    .with_property("stop", self.identifier(stop).map(|id| id.to_string()), Value::Null),
            );
        }
        self.stop_to_halts.remove(&stop);

        for hub in self.hubs_of_stop(stop) {
            self.invalidate(hub, changes);
            if let Some(data) = self.hubs.get_mut(hub) {
                data.stops.retain(|&s| s != stop);
            }
            changes.push(ChangeEvent::new(ChangeKind::HubChanged, hub).affecting(stop));
        }
        self.stop_to_hubs.remove(&stop);
    }

    /// Moves a stop. Halts and hubs using it are checked again.
    pub fn set_stop_position(&mut self, stop: StopKey, position: Option<Point>) -> Mutation<bool> {
        let Some(data) = self.stops.get_mut(stop) else {
            return Mutation::unchanged(false);
        };
        if data.position == position {
            return Mutation::unchanged(false);
        }
        let old = std::mem::replace(&mut data.position, position);
        let attached = data.attached;

        let mut changes = ChangeSet::new();
        let source = if attached { PrimitiveKey::Network } else { PrimitiveKey::from(stop) };
        changes.push(
            ChangeEvent::new(ChangeKind::StopChanged, source)
                .affecting(stop)
                .with_property("position", point_value(old), point_value(position)),
        );
        self.invalidate(stop, &mut changes);
        debug!(?stop, ?position, "stop moved");
        Mutation::new(true, changes)
    }

    // --- Queries ---

    pub fn stop(&self, stop: StopKey) -> Option<&StopData> {
        self.stops.get(stop)
    }

    pub fn stop_position(&self, stop: StopKey) -> Option<Point> {
        self.stops.get(stop).and_then(|s| s.position)
    }

    /// Stops of the network: valid ones first, each group by identifier.
    pub fn stops(&self) -> impl Iterator<Item = StopKey> + '_ {
        self.stop_buckets.iter().copied()
    }

    pub fn valid_stops(&self) -> &[StopKey] {
        self.stop_buckets.valid()
    }

    pub fn invalid_stops(&self) -> &[StopKey] {
        self.stop_buckets.invalid()
    }

    pub fn stop_named(&self, name: &str) -> Option<StopKey> {
        self.stops()
            .find(|&s| self.stops.get(s).is_some_and(|d| d.primitive.name == name))
    }

    pub fn stop_by_id(&self, id: Uuid) -> Option<StopKey> {
        self.stops().find(|&s| self.stops.get(s).is_some_and(|d| d.primitive.id == id))
    }

    /// Located stop of the network closest to `point`; the first found wins
    /// ties.
    pub fn nearest_stop(&self, point: &Point) -> Option<StopKey> {
        let mut best: Option<(StopKey, f64)> = None;
        for stop in self.stops() {
            let Some(position) = self.stop_position(stop) else {
                continue;
            };
            let distance = nalgebra::distance(&position, point);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((stop, distance));
            }
        }
        best.map(|(stop, _)| stop)
    }

    /// Halts currently referencing a stop.
    pub fn halts_of_stop(&self, stop: StopKey) -> Vec<HaltKey> {
        let mut halts: Vec<HaltKey> = self
            .stop_to_halts
            .get(&stop)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        halts.sort();
        halts
    }

    /// Hubs currently containing a stop.
    pub fn hubs_of_stop(&self, stop: StopKey) -> Vec<HubKey> {
        let mut hubs: Vec<HubKey> = self
            .stop_to_hubs
            .get(&stop)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        hubs.sort();
        hubs
    }
}
