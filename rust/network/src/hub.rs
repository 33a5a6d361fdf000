// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hubs: groups of stops allowing transfers between itineraries.

use busnet_road::Point;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::events::{ChangeEvent, ChangeKind, ChangeSet, Mutation};
use crate::keys::*;
use crate::network::{BusNetwork, HubData};
use crate::partition::BucketOrder;
use crate::primitive::Primitive;

fn by_hub_id(hubs: &SlotMap<HubKey, HubData>) -> impl Fn(&HubKey, &HubKey) -> std::cmp::Ordering + '_ {
    move |a, b| {
        let id = |k: &HubKey| hubs.get(*k).map(|h| h.primitive.id);
        id(a).cmp(&id(b))
    }
}

impl BusNetwork {
    /// Creates an empty hub outside of the network.
    pub fn create_hub(&mut self, name: impl Into<String>) -> HubKey {
        self.hubs.insert(HubData {
            primitive: Primitive::new(name),
            attached: false,
            stops: Vec::new(),
        })
    }

    pub fn add_hub(&mut self, name: impl Into<String>) -> Mutation<HubKey> {
        self.add_hub_with_stops(name, &[])
    }

    /// Creates a hub grouping `stops` and adds it to the network.
    pub fn add_hub_with_stops(&mut self, name: impl Into<String>, stops: &[StopKey]) -> Mutation<HubKey> {
        let hub = self.create_hub(name);
        let mut changes = ChangeSet::new();
        for &stop in stops {
            self.add_stop_to_hub(hub, stop).defer(&mut changes);
        }
        self.attach_hub(hub).defer(&mut changes);
        Mutation::new(hub, changes)
    }

    pub fn attach_hub(&mut self, hub: HubKey) -> Mutation<bool> {
        match self.hubs.get_mut(hub) {
            Some(data) if !data.attached => data.attached = true,
            _ => return Mutation::unchanged(false),
        }
        let mut changes = ChangeSet::new();
        self.invalidate(hub, &mut changes);

        let valid = self.is_valid(hub);
        let cmp = by_hub_id(&self.hubs);
        self.hub_buckets.insert(hub, valid, &BucketOrder::uniform(&cmp));
        changes.push(ChangeEvent::new(ChangeKind::HubAdded, PrimitiveKey::Network).affecting(hub));
        Mutation::new(true, changes)
    }

    /// Removes a hub from the network and empties it.
    pub fn remove_hub(&mut self, hub: HubKey) -> Mutation<bool> {
        if !self.hubs.get(hub).is_some_and(|h| h.attached) {
            return Mutation::unchanged(false);
        }
        let mut changes = ChangeSet::new();
        self.invalidate(hub, &mut changes);
        {
            let cmp = by_hub_id(&self.hubs);
            self.hub_buckets.remove(hub, &BucketOrder::uniform(&cmp));
        }
        self.empty_hub(hub);
        changes.push(ChangeEvent::new(ChangeKind::HubRemoved, PrimitiveKey::Network).affecting(hub));
        self.invalidate(hub, &mut changes);
        Mutation::new(true, changes)
    }

    pub fn remove_all_hubs(&mut self) -> Mutation<usize> {
        let all: Vec<HubKey> = self.hub_buckets.iter().copied().collect();
        if all.is_empty() {
            return Mutation::unchanged(0);
        }
        let mut changes = ChangeSet::new();
        for &hub in &all {
            self.invalidate(hub, &mut changes);
        }
        self.hub_buckets.clear();
        for &hub in &all {
            self.empty_hub(hub);
            self.invalidate(hub, &mut changes);
        }
        self.invalidate(PrimitiveKey::Network, &mut changes);
        changes.push(ChangeEvent::new(ChangeKind::AllHubsRemoved, PrimitiveKey::Network));
        Mutation::new(all.len(), changes)
    }

    fn empty_hub(&mut self, hub: HubKey) {
        let stops = match self.hubs.get_mut(hub) {
            Some(data) => {
                data.attached = false;
                std::mem::take(&mut data.stops)
            }
            None => return,
        };
        for stop in stops {
            self.unlink_stop_hub(stop, hub);
        }
    }

    // --- Stops of a hub ---

    /// Appends a stop to a hub. `false` if either is unknown or the stop is
    /// already there.
    pub fn add_stop_to_hub(&mut self, hub: HubKey, stop: StopKey) -> Mutation<bool> {
        if !self.stops.contains_key(stop) {
            return Mutation::unchanged(false);
        }
        let index = match self.hubs.get_mut(hub) {
            Some(data) if !data.stops.contains(&stop) => {
                data.stops.push(stop);
                data.stops.len() - 1
            }
            _ => return Mutation::unchanged(false),
        };
        self.link_stop_hub(stop, hub);

        let mut changes = ChangeSet::new();
        changes.push(ChangeEvent::new(ChangeKind::HubChanged, hub).affecting(stop).at(index));
        self.invalidate(hub, &mut changes);
        Mutation::new(true, changes)
    }

    pub fn remove_stop_from_hub(&mut self, hub: HubKey, stop: StopKey) -> Mutation<bool> {
        let index = match self.hubs.get_mut(hub) {
            Some(data) => match data.stops.iter().position(|&s| s == stop) {
                Some(index) => {
                    data.stops.remove(index);
                    index
                }
                None => return Mutation::unchanged(false),
            },
            None => return Mutation::unchanged(false),
        };
        self.unlink_stop_hub(stop, hub);

        let mut changes = ChangeSet::new();
        changes.push(ChangeEvent::new(ChangeKind::HubChanged, hub).affecting(stop).at(index));
        self.invalidate(hub, &mut changes);
        Mutation::new(true, changes)
    }

    // --- Queries ---

    pub fn hub(&self, hub: HubKey) -> Option<&HubData> {
        self.hubs.get(hub)
    }

    pub fn hub_stops(&self, hub: HubKey) -> &[StopKey] {
        self.hubs.get(hub).map(|h| h.stops.as_slice()).unwrap_or_default()
    }

    /// Barycentre of the hub's located stops.
    pub fn hub_position(&self, hub: HubKey) -> Option<Point> {
        let points: Vec<Point> = self.hub_stops(hub).iter().filter_map(|&s| self.stop_position(s)).collect();
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
        Some(Point::from(sum / points.len() as f64))
    }

    /// Hubs of the network: valid ones first, each group by identifier.
    pub fn hubs(&self) -> impl Iterator<Item = HubKey> + '_ {
        self.hub_buckets.iter().copied()
    }

    pub fn valid_hubs(&self) -> &[HubKey] {
        self.hub_buckets.valid()
    }

    pub fn invalid_hubs(&self) -> &[HubKey] {
        self.hub_buckets.invalid()
    }

    pub fn hub_named(&self, name: &str) -> Option<HubKey> {
        self.hubs().find(|&h| self.hubs.get(h).is_some_and(|d| d.primitive.name == name))
    }

    pub fn hub_by_id(&self, id: Uuid) -> Option<HubKey> {
        self.hubs().find(|&h| self.hubs.get(h).is_some_and(|d| d.primitive.id == id))
    }

    pub fn nearest_hub(&self, point: &Point) -> Option<HubKey> {
        let mut best: Option<(HubKey, f64)> = None;
        for hub in self.hubs() {
            let Some(position) = self.hub_position(hub) else {
                continue;
            };
            let distance = nalgebra::distance(&position, point);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((hub, distance));
            }
        }
        best.map(|(hub, _)| hub)
    }
}
