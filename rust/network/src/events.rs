// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change events and the two-phase mutation API.
//!
//! A mutating operation on a [`BusNetwork`] performs the structural change and
//! returns a [`Mutation`]: its result value plus a [`ChangeSet`] listing the
//! events produced and the primitives whose validity must be settled. Nothing
//! is delivered until the change set is applied with
//! [`BusNetwork::apply`]; the `notify` argument of `apply` decides whether
//! listeners see the events. Bulk loads merge many change sets into one batch
//! (or skip them entirely and call [`BusNetwork::rebuild`]).

use busnet_road::SegmentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keys::PrimitiveKey;
use crate::network::BusNetwork;

/// Kind of a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// An attribute of the source changed (name, flags, color, position, ...).
    PrimitiveChanged,
    LineAdded,
    LineRemoved,
    LineChanged,
    AllLinesRemoved,
    StopAdded,
    StopRemoved,
    StopChanged,
    AllStopsRemoved,
    HubAdded,
    HubRemoved,
    HubChanged,
    AllHubsRemoved,
    ItineraryAdded,
    ItineraryRemoved,
    ItineraryChanged,
    AllItinerariesRemoved,
    ItineraryInverted,
    ItineraryHaltAdded,
    ItineraryHaltRemoved,
    ItineraryHaltChanged,
    AllItineraryHaltsRemoved,
    SegmentAdded,
    SegmentRemoved,
    AllSegmentsRemoved,
    /// The validity of the source changed.
    Validity,
}

/// The sub-object an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affected {
    Primitive(PrimitiveKey),
    Segment(SegmentId),
}

/// Old and new value of a changed property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub name: String,
    pub old: Value,
    pub new: Value,
}

/// One structural or validity change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Primitive that produced the event, usually the container.
    pub source: PrimitiveKey,
    pub affected: Option<Affected>,
    /// Position of the affected object in its container.
    pub index: Option<usize>,
    pub property: Option<PropertyChange>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, source: impl Into<PrimitiveKey>) -> Self {
        Self {
            kind,
            source: source.into(),
            affected: None,
            index: None,
            property: None,
        }
    }

    pub fn affecting(mut self, affected: impl Into<Affected>) -> Self {
        self.affected = Some(affected.into());
        self
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_property(mut self, name: &str, old: impl Into<Value>, new: impl Into<Value>) -> Self {
        self.property = Some(PropertyChange {
            name: name.to_string(),
            old: old.into(),
            new: new.into(),
        });
        self
    }
}

impl From<PrimitiveKey> for Affected {
    fn from(k: PrimitiveKey) -> Self {
        Affected::Primitive(k)
    }
}

impl From<SegmentId> for Affected {
    fn from(id: SegmentId) -> Self {
        Affected::Segment(id)
    }
}

macro_rules! affected_from_key {
    ($($key:ty),*) => {
        $(impl From<$key> for Affected {
            fn from(k: $key) -> Self {
                Affected::Primitive(k.into())
            }
        })*
    };
}

affected_from_key!(
    crate::keys::LineKey,
    crate::keys::ItineraryKey,
    crate::keys::HaltKey,
    crate::keys::StopKey,
    crate::keys::HubKey
);

/// Events and pending validity work produced by one or more mutations.
#[derive(Debug, Clone, Default)]
#[must_use = "changes are only validated and delivered once applied"]
pub struct ChangeSet {
    pub(crate) events: Vec<ChangeEvent>,
    pub(crate) dirty: Vec<PrimitiveKey>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    /// Primitives whose validity will be settled on apply.
    pub fn dirty(&self) -> &[PrimitiveKey] {
        &self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.dirty.is_empty()
    }

    /// Appends another change set, keeping event order.
    pub fn merge(&mut self, mut other: ChangeSet) {
        self.events.append(&mut other.events);
        self.dirty.append(&mut other.dirty);
    }

    pub(crate) fn push(&mut self, event: ChangeEvent) {
        self.events.push(event);
    }

    pub(crate) fn mark(&mut self, key: impl Into<PrimitiveKey>) {
        self.dirty.push(key.into());
    }
}

/// Result of a mutating operation together with its pending changes.
#[derive(Debug)]
#[must_use = "changes are only validated and delivered once applied"]
pub struct Mutation<T> {
    pub value: T,
    pub changes: ChangeSet,
}

impl<T> Mutation<T> {
    pub(crate) fn new(value: T, changes: ChangeSet) -> Self {
        Self { value, changes }
    }

    /// A mutation that changed nothing.
    pub(crate) fn unchanged(value: T) -> Self {
        Self::new(value, ChangeSet::new())
    }

    /// Applies the changes with notification and returns the value.
    pub fn commit(self, network: &mut BusNetwork) -> T {
        network.apply(self.changes, true);
        self.value
    }

    /// Applies the changes without notifying listeners.
    pub fn commit_silently(self, network: &mut BusNetwork) -> T {
        network.apply(self.changes, false);
        self.value
    }

    /// Queues the changes into `batch` and returns the value.
    pub fn defer(self, batch: &mut ChangeSet) -> T {
        batch.merge(self.changes);
        self.value
    }

    pub fn into_parts(self) -> (T, ChangeSet) {
        (self.value, self.changes)
    }
}

/// Receiver of delivered change events.
pub trait ChangeListener {
    fn on_change(&mut self, event: &ChangeEvent);
}

impl<F: FnMut(&ChangeEvent)> ChangeListener for F {
    fn on_change(&mut self, event: &ChangeEvent) {
        self(event)
    }
}

/// Handle returned by [`BusNetwork::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
