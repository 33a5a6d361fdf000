// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attributes shared by every bus primitive.
//!
//! Each stored element embeds a [`Primitive`]: identifier, display name,
//! flags, optional color, validity cache and a lazily computed bounding box.

use busnet_road::{Point, Rect};
use serde_json::Value;
use uuid::Uuid;

use crate::events::{ChangeEvent, ChangeKind, ChangeSet, Mutation};
use crate::keys::PrimitiveKey;
use crate::network::BusNetwork;
use crate::validity::Validity;

/// Small flag set carried by every primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PrimitiveFlags(u32);

impl PrimitiveFlags {
    pub const READ_ONLY: Self = Self(1);
    pub const SELECTED: Self = Self(1 << 1);
    pub const HIDDEN: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for PrimitiveFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Common state of a bus primitive.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) flags: PrimitiveFlags,
    pub(crate) color: Option<u32>,
    /// Cache read by validity queries; `NotChecked` when stale.
    pub(crate) validity: Validity,
    /// Last validity announced with a VALIDITY event.
    pub(crate) reported: Validity,
    pub(crate) bounds: Option<Rect>,
}

impl Primitive {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            flags: PrimitiveFlags::empty(),
            color: None,
            validity: Validity::NotChecked,
            reported: Validity::NotChecked,
            bounds: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> PrimitiveFlags {
        self.flags
    }

    /// Color override as `0xRRGGBB`.
    pub fn color(&self) -> Option<u32> {
        self.color
    }

    /// Cached validity, `NotChecked` if a dependency changed since the last
    /// settle.
    pub fn cached_validity(&self) -> &Validity {
        &self.validity
    }

    /// Marks the cache stale.
    pub(crate) fn reset(&mut self) {
        self.validity = Validity::NotChecked;
        self.bounds = None;
    }
}

impl BusNetwork {
    pub(crate) fn primitive(&self, key: PrimitiveKey) -> Option<&Primitive> {
        match key {
            PrimitiveKey::Network => Some(&self.primitive),
            PrimitiveKey::Line(k) => self.lines.get(k).map(|d| &d.primitive),
            PrimitiveKey::Itinerary(k) => self.itineraries.get(k).map(|d| &d.primitive),
            PrimitiveKey::Halt(k) => self.halts.get(k).map(|d| &d.primitive),
            PrimitiveKey::Stop(k) => self.stops.get(k).map(|d| &d.primitive),
            PrimitiveKey::Hub(k) => self.hubs.get(k).map(|d| &d.primitive),
        }
    }

    pub(crate) fn primitive_mut(&mut self, key: PrimitiveKey) -> Option<&mut Primitive> {
        match key {
            PrimitiveKey::Network => Some(&mut self.primitive),
            PrimitiveKey::Line(k) => self.lines.get_mut(k).map(|d| &mut d.primitive),
            PrimitiveKey::Itinerary(k) => self.itineraries.get_mut(k).map(|d| &mut d.primitive),
            PrimitiveKey::Halt(k) => self.halts.get_mut(k).map(|d| &mut d.primitive),
            PrimitiveKey::Stop(k) => self.stops.get_mut(k).map(|d| &mut d.primitive),
            PrimitiveKey::Hub(k) => self.hubs.get_mut(k).map(|d| &mut d.primitive),
        }
    }

    /// Returns `true` if the key references a primitive of this network.
    pub fn contains(&self, key: impl Into<PrimitiveKey>) -> bool {
        self.primitive(key.into()).is_some()
    }

    pub fn name(&self, key: impl Into<PrimitiveKey>) -> Option<&str> {
        self.primitive(key.into()).map(Primitive::name)
    }

    pub fn identifier(&self, key: impl Into<PrimitiveKey>) -> Option<Uuid> {
        self.primitive(key.into()).map(Primitive::id)
    }

    pub fn flags(&self, key: impl Into<PrimitiveKey>) -> Option<PrimitiveFlags> {
        self.primitive(key.into()).map(Primitive::flags)
    }

    pub fn color(&self, key: impl Into<PrimitiveKey>) -> Option<u32> {
        self.primitive(key.into()).and_then(Primitive::color)
    }

    /// Renames a primitive. Returns `false` if the key is unknown or the name
    /// is unchanged.
    pub fn set_name(&mut self, key: impl Into<PrimitiveKey>, name: impl Into<String>) -> Mutation<bool> {
        let key = key.into();
        let name = name.into();
        let Some(p) = self.primitive_mut(key) else {
            return Mutation::unchanged(false);
        };
        if p.name == name {
            return Mutation::unchanged(false);
        }
        let old = std::mem::replace(&mut p.name, name.clone());
        let mut changes = ChangeSet::new();
        changes.push(ChangeEvent::new(ChangeKind::PrimitiveChanged, key).with_property("name", old, name));
        Mutation::new(true, changes)
    }

    pub fn set_flags(&mut self, key: impl Into<PrimitiveKey>, flags: PrimitiveFlags) -> Mutation<bool> {
        let key = key.into();
        let Some(p) = self.primitive_mut(key) else {
            return Mutation::unchanged(false);
        };
        if p.flags == flags {
            return Mutation::unchanged(false);
        }
        let old = std::mem::replace(&mut p.flags, flags);
        let mut changes = ChangeSet::new();
        changes.push(
            ChangeEvent::new(ChangeKind::PrimitiveChanged, key).with_property("flags", old.bits(), flags.bits()),
        );
        Mutation::new(true, changes)
    }

    pub fn set_color(&mut self, key: impl Into<PrimitiveKey>, color: Option<u32>) -> Mutation<bool> {
        let key = key.into();
        let Some(p) = self.primitive_mut(key) else {
            return Mutation::unchanged(false);
        };
        if p.color == color {
            return Mutation::unchanged(false);
        }
        let old = std::mem::replace(&mut p.color, color);
        let mut changes = ChangeSet::new();
        changes.push(ChangeEvent::new(ChangeKind::PrimitiveChanged, key).with_property(
            "color",
            old.map_or(Value::Null, Value::from),
            color.map_or(Value::Null, Value::from),
        ));
        Mutation::new(true, changes)
    }

    // --- Bounds ---

    /// Bounding box of a primitive, computed on first request and cached
    /// until the primitive or one of its dependencies changes.
    ///
    /// Containers only account for their valid members.
    pub fn bounds(&mut self, key: impl Into<PrimitiveKey>) -> Option<Rect> {
        let key = key.into();
        if let Some(cached) = self.primitive(key)?.bounds {
            return Some(cached);
        }
        let computed = self.compute_bounds(key)?;
        if let Some(p) = self.primitive_mut(key) {
            p.bounds = Some(computed);
        }
        Some(computed)
    }

    fn compute_bounds(&mut self, key: PrimitiveKey) -> Option<Rect> {
        match key {
            PrimitiveKey::Stop(k) => self.stops.get(k)?.position.map(Rect::from_point),
            PrimitiveKey::Halt(k) => self.halt_position(k).map(Rect::from_point),
            PrimitiveKey::Hub(k) => {
                let points: Vec<Point> = self.hubs.get(k)?.stops.iter().filter_map(|&s| self.stop_position(s)).collect();
                Rect::from_points(&points)
            }
            PrimitiveKey::Itinerary(k) => {
                Rect::union_all(self.itineraries.get(k)?.road.steps().map(|s| s.segment.bounds()))
            }
            PrimitiveKey::Line(k) => {
                let members: Vec<PrimitiveKey> = self
                    .lines
                    .get(k)?
                    .itineraries
                    .iter()
                    .filter(|&&i| self.is_valid(i))
                    .map(|&i| i.into())
                    .collect();
                self.union_bounds(members)
            }
            PrimitiveKey::Network => {
                let mut members: Vec<PrimitiveKey> =
                    self.line_order.iter().filter(|&&l| self.is_valid(l)).map(|&l| l.into()).collect();
                members.extend(self.stop_buckets.valid().iter().map(|&s| PrimitiveKey::from(s)));
                members.extend(self.hub_buckets.valid().iter().map(|&h| PrimitiveKey::from(h)));
                self.union_bounds(members)
            }
        }
    }

    fn union_bounds(&mut self, members: Vec<PrimitiveKey>) -> Option<Rect> {
        let rects: Vec<Rect> = members.into_iter().filter_map(|m| self.bounds(m)).collect();
        Rect::union_all(rects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_insert_remove() {
        let mut flags = PrimitiveFlags::empty();
        flags.insert(PrimitiveFlags::SELECTED | PrimitiveFlags::READ_ONLY);
        assert!(flags.contains(PrimitiveFlags::SELECTED));
        flags.remove(PrimitiveFlags::SELECTED);
        assert!(!flags.contains(PrimitiveFlags::SELECTED));
        assert!(flags.contains(PrimitiveFlags::READ_ONLY));
        assert_eq!(flags.bits(), 1);
    }

    #[test]
    fn rename_emits_property_change() {
        let mut net = BusNetwork::new("net");
        let line = net.add_line("L1").commit(&mut net);
        let m = net.set_name(line, "L2");
        assert!(m.value);
        let event = &m.changes.events()[0];
        assert_eq!(event.kind, ChangeKind::PrimitiveChanged);
        assert_eq!(event.property.as_ref().unwrap().new, Value::from("L2"));
        m.commit(&mut net);
        assert_eq!(net.name(line), Some("L2"));

        let same = net.set_name(line, "L2");
        assert!(!same.value);
        assert!(same.changes.is_empty());
    }

    #[test]
    fn color_and_flags_round_trip() {
        let mut net = BusNetwork::new("net");
        let stop = net.add_stop("s", None).commit(&mut net);
        assert!(net.set_color(stop, Some(0xff0000)).commit(&mut net));
        assert_eq!(net.color(stop), Some(0xff0000));
        assert!(net.set_flags(stop, PrimitiveFlags::HIDDEN).commit(&mut net));
        assert_eq!(net.flags(stop), Some(PrimitiveFlags::HIDDEN));
        assert!(net.identifier(stop).is_some());
    }

    #[test]
    fn stop_bounds_follow_position() {
        let mut net = BusNetwork::new("net");
        let stop = net.add_stop("s", Some(Point::new(3.0, 4.0))).commit(&mut net);
        assert_eq!(net.bounds(stop), Some(Rect::from_point(Point::new(3.0, 4.0))));
        net.set_stop_position(stop, Some(Point::new(5.0, 5.0))).commit(&mut net);
        assert_eq!(net.bounds(stop), Some(Rect::from_point(Point::new(5.0, 5.0))));
    }
}
