// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lines of the network and the itineraries they own.

use busnet_road::ClusteredRoadPath;
use tracing::debug;
use uuid::Uuid;

use crate::events::{ChangeEvent, ChangeKind, ChangeSet, Mutation};
use crate::keys::*;
use crate::network::{BusNetwork, ItineraryData, LineData};
use crate::partition::Partition;
use crate::primitive::Primitive;

impl BusNetwork {
    // --- Line construction ---

    /// Creates a line outside of the network.
    pub fn create_line(&mut self, name: impl Into<String>) -> LineKey {
        self.lines.insert(LineData {
            primitive: Primitive::new(name),
            attached: false,
            itineraries: Vec::new(),
        })
    }

    /// Creates a line and appends it to the network.
    pub fn add_line(&mut self, name: impl Into<String>) -> Mutation<LineKey> {
        let line = self.create_line(name);
        let Mutation { changes, .. } = self.attach_line(line);
        Mutation::new(line, changes)
    }

    /// Appends a detached line to the network.
    pub fn attach_line(&mut self, line: LineKey) -> Mutation<bool> {
        match self.lines.get_mut(line) {
            Some(data) if !data.attached => data.attached = true,
            _ => return Mutation::unchanged(false),
        }
        self.line_order.push(line);
        let index = self.line_order.len() - 1;

        let mut changes = ChangeSet::new();
        changes.push(
            ChangeEvent::new(ChangeKind::LineAdded, PrimitiveKey::Network)
                .affecting(line)
                .at(index),
        );
        self.invalidate_line_members(line, &mut changes);
        debug!(?line, index, "line attached");
        Mutation::new(true, changes)
    }

    // --- Line removal ---

    /// Detaches a line from the network. The line keeps its itineraries.
    pub fn remove_line(&mut self, line: LineKey) -> Mutation<bool> {
        let Some(index) = self.line_index(line) else {
            return Mutation::unchanged(false);
        };
        let mut changes = ChangeSet::new();
        self.invalidate_line_members(line, &mut changes);

        self.line_order.remove(index);
        if let Some(data) = self.lines.get_mut(line) {
            data.attached = false;
        }
        changes.push(
            ChangeEvent::new(ChangeKind::LineRemoved, PrimitiveKey::Network)
                .affecting(line)
                .at(index),
        );
        self.invalidate(PrimitiveKey::Network, &mut changes);
        self.invalidate_line_members(line, &mut changes);
        Mutation::new(true, changes)
    }

    pub fn remove_line_at(&mut self, index: usize) -> Mutation<bool> {
        match self.line_at(index) {
            Some(line) => self.remove_line(line),
            None => Mutation::unchanged(false),
        }
    }

    pub fn remove_line_named(&mut self, name: &str) -> Mutation<bool> {
        match self.line_named(name) {
            Some(line) => self.remove_line(line),
            None => Mutation::unchanged(false),
        }
    }

    /// Detaches every line. Returns the number of removed lines.
    pub fn remove_all_lines(&mut self) -> Mutation<usize> {
        if self.line_order.is_empty() {
            return Mutation::unchanged(0);
        }
        let mut changes = ChangeSet::new();
        let removed = std::mem::take(&mut self.line_order);
        for &line in &removed {
            if let Some(data) = self.lines.get_mut(line) {
                data.attached = false;
            }
            self.invalidate_line_members(line, &mut changes);
        }
        self.invalidate(PrimitiveKey::Network, &mut changes);
        changes.push(ChangeEvent::new(ChangeKind::AllLinesRemoved, PrimitiveKey::Network));
        Mutation::new(removed.len(), changes)
    }

    // --- Line queries ---

    /// Lines of the network, in insertion order.
    pub fn lines(&self) -> &[LineKey] {
        &self.line_order
    }

    pub fn line(&self, line: LineKey) -> Option<&LineData> {
        self.lines.get(line)
    }

    pub fn line_at(&self, index: usize) -> Option<LineKey> {
        self.line_order.get(index).copied()
    }

    pub fn line_index(&self, line: LineKey) -> Option<usize> {
        self.line_order.iter().position(|&l| l == line)
    }

    pub fn line_named(&self, name: &str) -> Option<LineKey> {
        self.line_order
            .iter()
            .copied()
            .find(|&l| self.lines.get(l).is_some_and(|d| d.primitive.name == name))
    }

    pub fn line_by_id(&self, id: Uuid) -> Option<LineKey> {
        self.line_order
            .iter()
            .copied()
            .find(|&l| self.lines.get(l).is_some_and(|d| d.primitive.id == id))
    }

    /// Invalidates a line and everything below it whose validity depends on
    /// the line being in the network.
    fn invalidate_line_members(&mut self, line: LineKey, changes: &mut ChangeSet) {
        self.invalidate(line, changes);
        let itineraries = self.lines.get(line).map(|d| d.itineraries.clone()).unwrap_or_default();
        for itinerary in itineraries {
            self.invalidate_itinerary_members(itinerary, changes);
        }
    }

    pub(crate) fn invalidate_itinerary_members(&mut self, itinerary: ItineraryKey, changes: &mut ChangeSet) {
        self.invalidate(itinerary, changes);
        let halts: Vec<HaltKey> = self
            .itineraries
            .get(itinerary)
            .map(|d| d.halts.iter().copied().collect())
            .unwrap_or_default();
        for halt in halts {
            self.invalidate(halt, changes);
        }
    }

    // --- Itinerary membership ---

    /// Creates an itinerary outside of any line.
    pub fn create_itinerary(&mut self, name: impl Into<String>) -> ItineraryKey {
        self.itineraries.insert(ItineraryData {
            primitive: Primitive::new(name),
            line: None,
            road: ClusteredRoadPath::with_tolerance(self.config.connection_tolerance),
            halts: Partition::new(),
            next_order: 0,
        })
    }

    /// Creates an itinerary and appends it to `line`. `None` if the line is
    /// unknown.
    pub fn add_itinerary(&mut self, line: LineKey, name: impl Into<String>) -> Mutation<Option<ItineraryKey>> {
        if !self.lines.contains_key(line) {
            return Mutation::unchanged(None);
        }
        let itinerary = self.create_itinerary(name);
        let Mutation { changes, .. } = self.attach_itinerary(line, itinerary);
        Mutation::new(Some(itinerary), changes)
    }

    /// Appends a detached itinerary to `line`.
    ///
    /// Binds the network to the road network of the itinerary's segments if
    /// it has none yet.
    pub fn attach_itinerary(&mut self, line: LineKey, itinerary: ItineraryKey) -> Mutation<bool> {
        if !self.lines.contains_key(line) {
            return Mutation::unchanged(false);
        }
        match self.itineraries.get_mut(itinerary) {
            Some(data) if data.line.is_none() => data.line = Some(line),
            _ => return Mutation::unchanged(false),
        }
        let Some(data) = self.lines.get_mut(line) else {
            return Mutation::unchanged(false);
        };
        data.itineraries.push(itinerary);
        let index = data.itineraries.len() - 1;

        let mut changes = ChangeSet::new();
        changes.push(
            ChangeEvent::new(ChangeKind::ItineraryAdded, line)
                .affecting(itinerary)
                .at(index),
        );
        self.invalidate_itinerary_members(itinerary, &mut changes);
        self.bind_road_network(itinerary, &mut changes);
        Mutation::new(true, changes)
    }

    /// Detaches an itinerary from its line. It keeps its road and halts.
    pub fn remove_itinerary(&mut self, itinerary: ItineraryKey) -> Mutation<bool> {
        let Some(line) = self.itineraries.get(itinerary).and_then(|d| d.line) else {
            return Mutation::unchanged(false);
        };
        let mut changes = ChangeSet::new();
        self.invalidate_itinerary_members(itinerary, &mut changes);

        let index = self.lines.get_mut(line).and_then(|data| {
            let index = data.itineraries.iter().position(|&i| i == itinerary)?;
            data.itineraries.remove(index);
            Some(index)
        });
        if let Some(data) = self.itineraries.get_mut(itinerary) {
            data.line = None;
        }
        let mut event = ChangeEvent::new(ChangeKind::ItineraryRemoved, line).affecting(itinerary);
        if let Some(index) = index {
            event = event.at(index);
        }
        changes.push(event);
        self.invalidate(line, &mut changes);
        self.invalidate_itinerary_members(itinerary, &mut changes);
        Mutation::new(true, changes)
    }

    pub fn remove_itinerary_at(&mut self, line: LineKey, index: usize) -> Mutation<bool> {
        match self.itineraries(line).get(index).copied() {
            Some(itinerary) => self.remove_itinerary(itinerary),
            None => Mutation::unchanged(false),
        }
    }

    pub fn remove_itinerary_named(&mut self, line: LineKey, name: &str) -> Mutation<bool> {
        match self.itinerary_named(line, name) {
            Some(itinerary) => self.remove_itinerary(itinerary),
            None => Mutation::unchanged(false),
        }
    }

    /// Detaches every itinerary of `line`. Returns the number removed.
    pub fn remove_all_itineraries(&mut self, line: LineKey) -> Mutation<usize> {
        let owned = match self.lines.get(line) {
            Some(data) if !data.itineraries.is_empty() => data.itineraries.clone(),
            _ => return Mutation::unchanged(0),
        };
        let mut changes = ChangeSet::new();
        for &itinerary in &owned {
            self.invalidate_itinerary_members(itinerary, &mut changes);
        }
        if let Some(data) = self.lines.get_mut(line) {
            data.itineraries.clear();
        }
        for &itinerary in &owned {
            if let Some(data) = self.itineraries.get_mut(itinerary) {
                data.line = None;
            }
        }
        self.invalidate(line, &mut changes);
        changes.push(ChangeEvent::new(ChangeKind::AllItinerariesRemoved, line));
        Mutation::new(owned.len(), changes)
    }

    /// Itineraries of a line, in insertion order; empty for unknown lines.
    pub fn itineraries(&self, line: LineKey) -> &[ItineraryKey] {
        self.lines.get(line).map(|d| d.itineraries.as_slice()).unwrap_or_default()
    }

    pub fn itinerary_named(&self, line: LineKey, name: &str) -> Option<ItineraryKey> {
        self.itineraries(line)
            .iter()
            .copied()
            .find(|&i| self.itineraries.get(i).is_some_and(|d| d.primitive.name == name))
    }

    /// First `<prefix><n>` name, `n` counting from 1, no itinerary of the
    /// line uses.
    pub fn first_free_itinerary_name(&self, line: LineKey) -> String {
        let prefix = &self.config.itinerary_name_prefix;
        (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|name| self.itinerary_named(line, name).is_none())
            .unwrap_or_else(|| prefix.clone())
    }
}
