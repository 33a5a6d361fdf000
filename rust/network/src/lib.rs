// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Busnet Network
//!
//! Hierarchical bus network model: a network owns lines, lines own
//! itineraries, itineraries own halts; the network also owns stops and hubs.
//!
//! Every primitive carries a lazily computed validity. Containers keep their
//! members in a valid and an invalid bucket, and an itinerary binds its halts
//! to precise offsets along a possibly fragmented road path.
//!
//! Mutations are two-phase: each operation returns a [`Mutation`] holding the
//! value and a [`ChangeSet`], which [`BusNetwork::apply`] settles and delivers
//! to listeners. Deferring change sets allows a bulk load to run without
//! notification, finished by a single [`BusNetwork::rebuild`].

pub mod config;
pub mod error;
pub mod events;
pub mod halt;
pub mod hub;
pub mod itinerary;
pub mod keys;
pub mod line;
pub mod network;
pub mod partition;
pub mod primitive;
pub mod stop;
pub mod validation;
pub mod validity;

pub use config::NetworkConfig;
pub use error::{Error, Result};
pub use events::{
    Affected, ChangeEvent, ChangeKind, ChangeListener, ChangeSet, ListenerId, Mutation, PropertyChange,
};
pub use halt::HaltPlacement;
pub use itinerary::SegmentInsertion;
pub use keys::{HaltKey, HubKey, ItineraryKey, LineKey, PrimitiveKey, PrimitiveType, StopKey};
pub use network::{BusNetwork, HaltData, HaltKind, HubData, ItineraryData, LineData, StopData};
pub use partition::{BucketOrder, Partition};
pub use primitive::{Primitive, PrimitiveFlags};
pub use validity::{Invalidity, InvalidityReason, Validity};
