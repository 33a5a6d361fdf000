// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for bus network primitives.
//!
//! The [`BusNetwork`] is both the root primitive of the model and the owner of
//! every line, itinerary, halt, stop and hub, each stored in a slot map with a
//! stable, generational key. Ownership is a tree:
//!
//! ```text
//! BusNetwork ─┬─ lines ── itineraries ── halts ·····> stop
//!             ├─ stops
//!             └─ hubs ·····> stops
//! ```
//!
//! Dotted arrows are non-owning references. Their reverse direction is kept in
//! explicit referrer registries (stop → halts, stop → hubs), updated by the
//! referrer whenever it links or unlinks a stop, so that a change of a stop's
//! validity reaches every halt and hub that depends on it.
//!
//! Elements may exist detached (created but not attached, or removed from
//! their container). A detached element keeps its own data and subtree until
//! it is [`discard`](BusNetwork::discard)ed.

use std::fmt;

use busnet_road::{ClusteredRoadPath, Point, RoadNetworkId, StepId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::debug;

use crate::config::NetworkConfig;
use crate::events::{ChangeEvent, ChangeKind, ChangeListener, ChangeSet, ListenerId, Mutation};
use crate::keys::*;
use crate::partition::Partition;
use crate::primitive::Primitive;

/// Data stored for a bus line.
#[derive(Debug, Clone)]
pub struct LineData {
    pub(crate) primitive: Primitive,
    pub(crate) attached: bool,
    pub(crate) itineraries: Vec<ItineraryKey>,
}

impl LineData {
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    /// Returns `true` while the line belongs to the network.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn itineraries(&self) -> &[ItineraryKey] {
        &self.itineraries
    }
}

/// Data stored for an itinerary: its road path and its halts.
#[derive(Debug, Clone)]
pub struct ItineraryData {
    pub(crate) primitive: Primitive,
    pub(crate) line: Option<LineKey>,
    pub(crate) road: ClusteredRoadPath,
    /// Valid halts by (segment index, offset), invalid halts in declared order.
    pub(crate) halts: Partition<HaltKey>,
    pub(crate) next_order: usize,
}

impl ItineraryData {
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    pub fn line(&self) -> Option<LineKey> {
        self.line
    }

    pub fn road(&self) -> &ClusteredRoadPath {
        &self.road
    }
}

/// How a bus is expected to serve a halt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HaltKind {
    /// The bus always stops.
    Systematic,
    /// The bus stops when requested.
    #[default]
    OnDemand,
}

/// Data stored for a halt.
#[derive(Debug, Clone)]
pub struct HaltData {
    pub(crate) primitive: Primitive,
    pub(crate) itinerary: Option<ItineraryKey>,
    pub(crate) stop: Option<StopKey>,
    pub(crate) kind: HaltKind,
    /// Occurrence of the bound segment, tracked across path edits.
    pub(crate) step: Option<StepId>,
    pub(crate) segment_index: Option<usize>,
    /// Curviline offset on the bound segment; NaN when unbound.
    pub(crate) offset: f64,
    /// Declared position among the itinerary's halts.
    pub(crate) order: usize,
}

impl HaltData {
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    pub fn itinerary(&self) -> Option<ItineraryKey> {
        self.itinerary
    }

    pub fn stop(&self) -> Option<StopKey> {
        self.stop
    }

    pub fn kind(&self) -> HaltKind {
        self.kind
    }

    pub fn segment_index(&self) -> Option<usize> {
        self.segment_index
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub(crate) fn unbind(&mut self) {
        self.step = None;
        self.segment_index = None;
        self.offset = f64::NAN;
    }
}

/// Data stored for a stop: a geographic point.
#[derive(Debug, Clone)]
pub struct StopData {
    pub(crate) primitive: Primitive,
    pub(crate) attached: bool,
    pub(crate) position: Option<Point>,
}

impl StopData {
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }
}

/// Data stored for a hub: an ordered group of stops.
#[derive(Debug, Clone)]
pub struct HubData {
    pub(crate) primitive: Primitive,
    pub(crate) attached: bool,
    pub(crate) stops: Vec<StopKey>,
}

impl HubData {
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn stops(&self) -> &[StopKey] {
        &self.stops
    }
}

/// Root of the bus model and owner of all its primitives.
///
/// # Example
///
/// ```
/// use busnet_network::BusNetwork;
/// use busnet_road::Point;
///
/// let mut net = BusNetwork::new("city");
/// let stop = net.add_stop("Central", Some(Point::new(0.0, 0.0))).commit(&mut net);
/// let hub = net.add_hub_with_stops("Central hub", &[stop]).commit(&mut net);
///
/// assert!(net.is_valid(stop));
/// assert!(net.is_valid(hub));
/// ```
pub struct BusNetwork {
    pub(crate) primitive: Primitive,
    pub(crate) config: NetworkConfig,
    pub(crate) road_network: Option<RoadNetworkId>,

    // Entity storage
    pub(crate) lines: SlotMap<LineKey, LineData>,
    pub(crate) itineraries: SlotMap<ItineraryKey, ItineraryData>,
    pub(crate) halts: SlotMap<HaltKey, HaltData>,
    pub(crate) stops: SlotMap<StopKey, StopData>,
    pub(crate) hubs: SlotMap<HubKey, HubData>,

    // Network members
    pub(crate) line_order: Vec<LineKey>,
    pub(crate) stop_buckets: Partition<StopKey>,
    pub(crate) hub_buckets: Partition<HubKey>,

    // Referrer registries: stop → who references it
    pub(crate) stop_to_halts: FxHashMap<StopKey, FxHashSet<HaltKey>>,
    pub(crate) stop_to_hubs: FxHashMap<StopKey, FxHashSet<HubKey>>,

    listeners: Vec<(ListenerId, Box<dyn ChangeListener>)>,
    next_listener: u64,
}

impl BusNetwork {
    /// Creates an empty network with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, NetworkConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: NetworkConfig) -> Self {
        Self {
            primitive: Primitive::new(name),
            config,
            road_network: None,

            lines: SlotMap::with_key(),
            itineraries: SlotMap::with_key(),
            halts: SlotMap::with_key(),
            stops: SlotMap::with_key(),
            hubs: SlotMap::with_key(),

            line_order: Vec::new(),
            stop_buckets: Partition::new(),
            hub_buckets: Partition::new(),

            stop_to_halts: FxHashMap::default(),
            stop_to_hubs: FxHashMap::default(),

            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The network's own primitive attributes.
    pub fn network_primitive(&self) -> &Primitive {
        &self.primitive
    }

    // --- Road network ---

    /// Road network every itinerary segment must belong to.
    pub fn road_network(&self) -> Option<RoadNetworkId> {
        self.road_network
    }

    /// Binds the network to a road network. Every itinerary is re-checked.
    pub fn set_road_network(&mut self, road_network: Option<RoadNetworkId>) -> Mutation<bool> {
        if self.road_network == road_network {
            return Mutation::unchanged(false);
        }
        let old = std::mem::replace(&mut self.road_network, road_network);
        let id = |r: Option<RoadNetworkId>| r.map(|id| id.to_string());
        let mut changes = ChangeSet::new();
        changes.push(
            ChangeEvent::new(ChangeKind::PrimitiveChanged, PrimitiveKey::Network).with_property(
                "road_network",
                id(old),
                id(road_network),
            ),
        );
        let all: Vec<ItineraryKey> = self.itineraries.keys().collect();
        for itinerary in all {
            self.invalidate(itinerary, &mut changes);
        }
        Mutation::new(true, changes)
    }

    // --- Counts ---

    pub fn line_count(&self) -> usize {
        self.line_order.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stop_buckets.len()
    }

    pub fn hub_count(&self) -> usize {
        self.hub_buckets.len()
    }

    // --- Listeners ---

    /// Registers a listener that receives every event applied with
    /// notification.
    pub fn add_listener(&mut self, listener: impl ChangeListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub(crate) fn deliver(&mut self, events: &[ChangeEvent]) {
        for event in events {
            for (_, listener) in &mut self.listeners {
                listener.on_change(event);
            }
        }
    }

    // --- Referrer registry helpers ---

    /// Registers that a halt references a stop.
    pub(crate) fn link_stop_halt(&mut self, stop: StopKey, halt: HaltKey) {
        self.stop_to_halts.entry(stop).or_default().insert(halt);
    }

    pub(crate) fn unlink_stop_halt(&mut self, stop: StopKey, halt: HaltKey) {
        if let Some(set) = self.stop_to_halts.get_mut(&stop) {
            set.remove(&halt);
            if set.is_empty() {
                self.stop_to_halts.remove(&stop);
            }
        }
    }

    /// Registers that a hub references a stop.
    pub(crate) fn link_stop_hub(&mut self, stop: StopKey, hub: HubKey) {
        self.stop_to_hubs.entry(stop).or_default().insert(hub);
    }

    pub(crate) fn unlink_stop_hub(&mut self, stop: StopKey, hub: HubKey) {
        if let Some(set) = self.stop_to_hubs.get_mut(&stop) {
            set.remove(&hub);
            if set.is_empty() {
                self.stop_to_hubs.remove(&stop);
            }
        }
    }

    // --- Destruction ---

    /// Drops a detached primitive and its owned subtree from the arena.
    ///
    /// Attached primitives and the network itself are left alone; remove them
    /// from their container first. Halts and hubs still referencing a
    /// discarded stop lose that reference.
    pub fn discard(&mut self, key: impl Into<PrimitiveKey>) -> Mutation<bool> {
        let key = key.into();
        let mut changes = ChangeSet::new();
        let done = match key {
            PrimitiveKey::Network => false,
            PrimitiveKey::Line(k) => match self.lines.get(k) {
                Some(line) if !line.attached => {
                    let owned = line.itineraries.clone();
                    for itinerary in owned {
                        if let Some(data) = self.itineraries.get_mut(itinerary) {
                            data.line = None;
                        }
                        self.drop_itinerary(itinerary);
                    }
                    self.lines.remove(k);
                    true
                }
                _ => false,
            },
            PrimitiveKey::Itinerary(k) => match self.itineraries.get(k) {
                Some(itinerary) if itinerary.line.is_none() => {
                    self.drop_itinerary(k);
                    true
                }
                _ => false,
            },
            PrimitiveKey::Halt(k) => match self.halts.get(k) {
                Some(halt) if halt.itinerary.is_none() => {
                    self.drop_halt(k);
                    true
                }
                _ => false,
            },
            PrimitiveKey::Stop(k) => match self.stops.get(k) {
                Some(stop) if !stop.attached => {
                    self.clear_stop_referrers(k, &mut changes);
                    self.stops.remove(k);
                    true
                }
                _ => false,
            },
            PrimitiveKey::Hub(k) => match self.hubs.get(k) {
                Some(hub) if !hub.attached => {
                    let stops = hub.stops.clone();
                    for stop in stops {
                        self.unlink_stop_hub(stop, k);
                    }
                    self.hubs.remove(k);
                    true
                }
                _ => false,
            },
        };
        if done {
            debug!(?key, "discarded bus primitive");
        }
        Mutation::new(done, changes)
    }

    fn drop_itinerary(&mut self, itinerary: ItineraryKey) {
        if let Some(data) = self.itineraries.remove(itinerary) {
            for &halt in data.halts.iter() {
                self.drop_halt(halt);
            }
        }
    }

    fn drop_halt(&mut self, halt: HaltKey) {
        if let Some(data) = self.halts.remove(halt) {
            if let Some(stop) = data.stop {
                self.unlink_stop_halt(stop, halt);
            }
        }
    }
}

impl fmt::Debug for BusNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusNetwork")
            .field("name", &self.primitive.name)
            .field("lines", &self.line_order.len())
            .field("itineraries", &self.itineraries.len())
            .field("halts", &self.halts.len())
            .field("stops", &self.stop_buckets.len())
            .field("hubs", &self.hub_buckets.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for BusNetwork {
    fn default() -> Self {
        Self::new("")
    }
}
