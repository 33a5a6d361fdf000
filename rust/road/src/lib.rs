// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Busnet Road
//!
//! Road geometry consumed by the bus network model.
//!
//! Road segments are opaque collaborators behind the [`RoadSegment`] trait;
//! [`RoadPolyline`] and [`RoadNetwork`] are small concrete implementations.
//! An itinerary's geometry is a [`ClusteredRoadPath`]: disjoint chains of
//! directed segments that are spliced, split, reconnected and inverted as the
//! itinerary is edited.

pub mod clustered;
pub mod error;
pub mod geometry;
pub mod network;
pub mod path;
pub mod segment;

pub use clustered::ClusteredRoadPath;
pub use error::{Error, Result};
pub use geometry::{coincide, Point, Rect, DEFAULT_CONNECTION_TOLERANCE};
pub use network::RoadNetwork;
pub use path::{CrossRoad, PathStep, RoadPath, StepId};
pub use segment::{Projection, RoadNetworkId, RoadPolyline, RoadSegment, SegmentId, SegmentRef};
