// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! detgeo Geometry Processing
//!
//! In-place passes over a shared geometry DAG: path matching, depth and
//! hidden-path pruning, visibility propagation with sphere simplification,
//! and bottom-up subpart selection.
//!
//! Every pass mutates the [`GeometryArena`] it is given. Visibility bits and
//! child lists live on volumes, so a pass that reaches a shared volume
//! through one placement changes it for all placements.

pub mod error;
pub mod matcher;
pub mod prune;
pub mod subpart;
pub mod visibility;

pub use detgeo_core::{GeometryArena, NodeKey, PathMode, VisFlags, VolumeKey};

pub use error::{Error, Result};
pub use matcher::{matches, PathPattern, PatternSet};
pub use prune::{prune, PruneStats};
pub use subpart::select_subpart;
pub use visibility::{
    fix_shape_tessellation, set_invisible_recursively, set_invisible_recursively_only,
    set_visible_recursively, SIMPLIFIED_SPHERE_SEGMENTS, SIMPLIFIED_SPHERE_Z_SLICES,
};
