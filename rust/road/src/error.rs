// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for road path construction.

/// Result type alias for road operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building road segments or paths.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Segments in a path are not connected end-to-end.
    #[error("road path segments are not connected: segment {0} endpoint does not match segment {1}")]
    DisconnectedPath(usize, usize),

    /// A path must have at least one segment.
    #[error("road path must have at least one segment")]
    EmptyPath,

    /// A polyline needs two distinct points to have a length.
    #[error("road segment needs at least 2 points, got {0}")]
    DegenerateSegment(usize),

    /// A coordinate was NaN or infinite.
    #[error("non-finite coordinate in road segment")]
    NonFiniteCoordinate,
}
