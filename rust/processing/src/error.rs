// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the conversion pipeline.

use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a conversion.
///
/// An empty subpart is not an error; it is reported as a warning and listed
/// in the conversion report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Geometry error: {0}")]
    Geometry(#[from] detgeo_geometry::Error),

    #[error("Geometry model error: {0}")]
    Model(#[from] detgeo_core::Error),

    /// A record refers to an index outside its target table.
    #[error("Dangling reference: {table} index {index} out of range (table has {len} entries)")]
    ReferenceConsistency {
        table: &'static str,
        index: u64,
        len: usize,
    },

    /// A record does not have the shape the deduplicator relies on.
    #[error("Malformed output document: {0}")]
    MalformedDocument(String),

    /// The scene builder or exporter failed.
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
