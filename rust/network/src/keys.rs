// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based storage of bus primitives.
//!
//! Each primitive kind gets its own `slotmap` key. Keys stay valid while
//! other primitives are removed; a key is only dangling after
//! [`discard`](crate::BusNetwork::discard).

use slotmap::new_key_type;

new_key_type! {
    /// Key for a bus line.
    pub struct LineKey;

    /// Key for an itinerary (one directional variant of a line).
    pub struct ItineraryKey;

    /// Key for a halt on an itinerary.
    pub struct HaltKey;

    /// Key for a bus stop.
    pub struct StopKey;

    /// Key for a bus hub.
    pub struct HubKey;
}

/// A key that can reference any primitive of a [`BusNetwork`](crate::BusNetwork),
/// the network itself included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKey {
    Network,
    Line(LineKey),
    Itinerary(ItineraryKey),
    Halt(HaltKey),
    Stop(StopKey),
    Hub(HubKey),
}

impl PrimitiveKey {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            PrimitiveKey::Network => PrimitiveType::Network,
            PrimitiveKey::Line(_) => PrimitiveType::Line,
            PrimitiveKey::Itinerary(_) => PrimitiveType::Itinerary,
            PrimitiveKey::Halt(_) => PrimitiveType::Halt,
            PrimitiveKey::Stop(_) => PrimitiveType::Stop,
            PrimitiveKey::Hub(_) => PrimitiveType::Hub,
        }
    }
}

/// Discriminant for primitive kinds.
///
/// The order is the settle order: a kind only depends on kinds sorted before
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Stop = 0,
    Halt = 1,
    Hub = 2,
    Itinerary = 3,
    Line = 4,
    Network = 5,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Stop => "BusStop",
            PrimitiveType::Halt => "BusItineraryHalt",
            PrimitiveType::Hub => "BusHub",
            PrimitiveType::Itinerary => "BusItinerary",
            PrimitiveType::Line => "BusLine",
            PrimitiveType::Network => "BusNetwork",
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LineKey> for PrimitiveKey {
    fn from(k: LineKey) -> Self {
        PrimitiveKey::Line(k)
    }
}

impl From<ItineraryKey> for PrimitiveKey {
    fn from(k: ItineraryKey) -> Self {
        PrimitiveKey::Itinerary(k)
    }
}

impl From<HaltKey> for PrimitiveKey {
    fn from(k: HaltKey) -> Self {
        PrimitiveKey::Halt(k)
    }
}

impl From<StopKey> for PrimitiveKey {
    fn from(k: StopKey) -> Self {
        PrimitiveKey::Stop(k)
    }
}

impl From<HubKey> for PrimitiveKey {
    fn from(k: HubKey) -> Self {
        PrimitiveKey::Hub(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_type_names() {
        assert_eq!(PrimitiveType::Stop.as_str(), "BusStop");
        assert_eq!(PrimitiveType::Halt.to_string(), "BusItineraryHalt");
        assert_eq!(PrimitiveKey::Network.primitive_type(), PrimitiveType::Network);
    }

    #[test]
    fn settle_order_is_bottom_up() {
        assert!(PrimitiveType::Stop < PrimitiveType::Halt);
        assert!(PrimitiveType::Halt < PrimitiveType::Hub);
        assert!(PrimitiveType::Hub < PrimitiveType::Itinerary);
        assert!(PrimitiveType::Itinerary < PrimitiveType::Line);
        assert!(PrimitiveType::Line < PrimitiveType::Network);
    }
}
