// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for bus network operations.
//!
//! Only programmer errors are reported here. Missing members and unknown
//! names are `bool`/`Option` results, and invalid primitives are a regular
//! state queried through the validity API.

use crate::keys::{HaltKey, PrimitiveKey};

/// Result type alias for bus network operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The halt binding can only change while the halt belongs to an itinerary.
    #[error("halt is not attached to an itinerary: {0:?}")]
    HaltNotInItinerary(HaltKey),

    /// A referenced primitive is not in the arena.
    #[error("bus primitive not found: {0:?}")]
    NotFound(PrimitiveKey),

    /// Road path construction failed.
    #[error(transparent)]
    Road(#[from] busnet_road::Error),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
