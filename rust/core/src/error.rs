// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the geometry model.

use crate::keys::{NodeKey, ShapeKey, VolumeKey};

/// Result type alias for geometry model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reading a geometry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The geometry description is structurally invalid.
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),

    /// A placement key does not resolve in the arena.
    #[error("placement not found: {0:?}")]
    MissingNode(NodeKey),

    /// A volume key does not resolve in the arena.
    #[error("volume not found: {0:?}")]
    MissingVolume(VolumeKey),

    /// A shape key does not resolve in the arena.
    #[error("shape not found: {0:?}")]
    MissingShape(ShapeKey),

    /// No volume carries the requested object name.
    #[error("no geometry object named '{0}'")]
    UnknownObject(String),

    /// The arena has no top placement.
    #[error("geometry has no top placement")]
    NoTop,

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
