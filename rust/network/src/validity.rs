// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validity states and invalidity reasons of bus primitives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a primitive failed its validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidityReason {
    // Network
    NotEnoughValidBusStops,
    InvalidStopInNetwork,
    InvalidHubInNetwork,
    NoLineInNetwork,
    InvalidLineInNetwork,

    // Line
    NoItineraryInLine,
    InvalidItineraryInLine,

    // Itinerary
    NoRoadSegmentInItinerary,
    DiscontinuousPathInItinerary,
    NotEnoughValidBusHalts,
    InvalidHaltInItinerary,
    NoBusNetwork,
    NoRoadNetwork,
    SegmentOutsideRoadNetwork,
    InvalidHaltOrder,
    UnusedRoadSegmentBeyondTerminus,

    // Halt
    HaltNotInItinerary,
    NoStopInHalt,
    InvalidLinkedStop,
    HaltNotOnRoadSegment,
    InvalidCurvilinePosition,
    NotInSameNetwork,

    // Stop
    NoStopPosition,
    StopNotInNetwork,

    // Hub
    NoStopInHub,
    InvalidStopInHub,
}

impl InvalidityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidityReason::NotEnoughValidBusStops => "NOT_ENOUGH_VALID_BUS_STOPS",
            InvalidityReason::InvalidStopInNetwork => "INVALID_STOP_IN_NETWORK",
            InvalidityReason::InvalidHubInNetwork => "INVALID_HUB_IN_NETWORK",
            InvalidityReason::NoLineInNetwork => "NO_LINE_IN_NETWORK",
            InvalidityReason::InvalidLineInNetwork => "INVALID_LINE_IN_NETWORK",
            InvalidityReason::NoItineraryInLine => "NO_ITINERARY_IN_LINE",
            InvalidityReason::InvalidItineraryInLine => "INVALID_ITINERARY_IN_LINE",
            InvalidityReason::NoRoadSegmentInItinerary => "NO_ROAD_SEGMENT_IN_ITINERARY",
            InvalidityReason::DiscontinuousPathInItinerary => "DISCONTINUOUS_PATH_IN_ITINERARY",
            InvalidityReason::NotEnoughValidBusHalts => "NOT_ENOUGH_VALID_BUS_HALTS",
            InvalidityReason::InvalidHaltInItinerary => "INVALID_HALT_IN_ITINERARY",
            InvalidityReason::NoBusNetwork => "NO_BUS_NETWORK",
            InvalidityReason::NoRoadNetwork => "NO_ROAD_NETWORK",
            InvalidityReason::SegmentOutsideRoadNetwork => "SEGMENT_OUTSIDE_ROAD_NETWORK",
            InvalidityReason::InvalidHaltOrder => "INVALID_HALT_ORDER",
            InvalidityReason::UnusedRoadSegmentBeyondTerminus => "UNUSED_ROAD_SEGMENT_BEYOND_TERMINUS",
            InvalidityReason::HaltNotInItinerary => "HALT_NOT_IN_ITINERARY",
            InvalidityReason::NoStopInHalt => "NO_STOP_IN_HALT",
            InvalidityReason::InvalidLinkedStop => "INVALID_LINKED_STOP",
            InvalidityReason::HaltNotOnRoadSegment => "HALT_NOT_ON_ROAD_SEGMENT",
            InvalidityReason::InvalidCurvilinePosition => "INVALID_CURVILINE_POSITION",
            InvalidityReason::NotInSameNetwork => "NOT_IN_SAME_NETWORK",
            InvalidityReason::NoStopPosition => "NO_STOP_POSITION",
            InvalidityReason::StopNotInNetwork => "STOP_NOT_IN_NETWORK",
            InvalidityReason::NoStopInHub => "NO_STOP_IN_HUB",
            InvalidityReason::InvalidStopInHub => "INVALID_STOP_IN_HUB",
        }
    }
}

impl fmt::Display for InvalidityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An invalidity reason with an optional free-text elaboration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalidity {
    pub reason: InvalidityReason,
    pub detail: Option<String>,
}

impl Invalidity {
    pub fn new(reason: InvalidityReason) -> Self {
        Self { reason, detail: None }
    }

    pub fn with_detail(reason: InvalidityReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: Some(detail.into()),
        }
    }
}

impl From<InvalidityReason> for Invalidity {
    fn from(reason: InvalidityReason) -> Self {
        Self::new(reason)
    }
}

impl fmt::Display for Invalidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// Cached validity of a primitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validity {
    /// Not computed since the last change of something it depends on.
    #[default]
    NotChecked,
    Valid,
    Invalid(Invalidity),
}

impl Validity {
    pub fn invalid(reason: InvalidityReason) -> Self {
        Validity::Invalid(Invalidity::new(reason))
    }

    pub fn invalid_with(reason: InvalidityReason, detail: impl Into<String>) -> Self {
        Validity::Invalid(Invalidity::with_detail(reason, detail))
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn is_checked(&self) -> bool {
        !matches!(self, Validity::NotChecked)
    }

    pub fn invalidity(&self) -> Option<&Invalidity> {
        match self {
            Validity::Invalid(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<InvalidityReason> {
        self.invalidity().map(|inv| inv.reason)
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::NotChecked => f.write_str("not checked"),
            Validity::Valid => f.write_str("valid"),
            Validity::Invalid(inv) => write!(f, "invalid: {inv}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_names_match_serde() {
        let json = serde_json::to_string(&InvalidityReason::UnusedRoadSegmentBeyondTerminus).unwrap();
        assert_eq!(json, "\"UNUSED_ROAD_SEGMENT_BEYOND_TERMINUS\"");
        assert_eq!(
            InvalidityReason::UnusedRoadSegmentBeyondTerminus.as_str(),
            "UNUSED_ROAD_SEGMENT_BEYOND_TERMINUS"
        );
    }

    #[test]
    fn validity_accessors() {
        assert!(!Validity::NotChecked.is_checked());
        assert!(Validity::Valid.is_valid());
        let v = Validity::invalid_with(InvalidityReason::InvalidLineInNetwork, "L1");
        assert_eq!(v.reason(), Some(InvalidityReason::InvalidLineInNetwork));
        assert_eq!(v.to_string(), "invalid: INVALID_LINE_IN_NETWORK (L1)");
    }
}
