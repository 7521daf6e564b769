// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # detgeo Core
//!
//! In-memory model of a hierarchical detector geometry.
//!
//! The geometry is a DAG rather than a tree: a placement (`NodeData`) puts a
//! reusable logical volume (`VolumeData`) inside its mother volume, and the
//! same volume may be placed many times. Child placements hang off the
//! *volume*, so every placement of a volume sees the same children, the same
//! shape and the same visibility bits.
//!
//! All entities live in a [`GeometryArena`] behind generational slot-map keys.
//! Sharing is expressed through keys only, which makes the aliasing explicit:
//! flipping a bit on a volume is observed through every placement of it.
//!
//! ## Quick Start
//!
//! ```
//! use detgeo_core::{GeometryArena, ShapeData, VisFlags};
//!
//! let mut arena = GeometryArena::new();
//! let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
//! let world = arena.add_volume("world", shape);
//! let top = arena.add_node("world_1", world);
//! arena.set_top(top);
//!
//! let det = arena.add_volume("tracker", shape);
//! arena.place(world, "tracker_0", det);
//!
//! assert_eq!(arena.node_count(), 2);
//! assert!(!arena.volume(det).unwrap().vis.contains(VisFlags::THIS));
//! ```

pub mod arena;
pub mod error;
pub mod keys;
pub mod reader;
pub mod shape;
pub mod traversal;
pub mod visibility;

pub use arena::{GeometryArena, NodeData, VolumeData};
pub use error::{Error, Result};
pub use keys::{NodeKey, ShapeKey, VolumeKey};
pub use reader::read_geometry_json;
pub use shape::{BooleanOp, ShapeData};
pub use traversal::{PathMode, PlacementVisit, PATH_SEPARATOR};
pub use visibility::VisFlags;
