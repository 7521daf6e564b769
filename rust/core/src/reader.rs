// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON geometry reader.
//!
//! The on-disk form is a flat table of shapes and volumes addressed by
//! integer ids, with placements written inline in their mother volume:
//!
//! ```json
//! {
//!   "top": { "name": "World_1", "volume": 0 },
//!   "shapes": [
//!     { "type": "other", "id": 0, "typeName": "TGeoBBox" },
//!     { "type": "sphere", "id": 1, "rmax": 2.0, "segments": 20, "zSlices": 11 }
//!   ],
//!   "volumes": [
//!     { "id": 0, "name": "World", "shape": 0,
//!       "nodes": [ { "name": "mirror_0", "volume": 1 } ] },
//!     { "id": 1, "name": "Mirror", "shape": 1, "fillStyle": 1001 }
//!   ]
//! }
//! ```
//!
//! A volume without `nodes` is a leaf. Reusing a volume id in several
//! placements shares that volume, exactly as in the source geometry.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use crate::arena::{GeometryArena, VolumeData};
use crate::error::{Error, Result};
use crate::keys::{ShapeKey, VolumeKey};
use crate::shape::{BooleanOp, ShapeData};
use crate::visibility::VisFlags;

#[derive(Debug, Deserialize)]
struct GeometryDocument {
    top: PlacementRecord,
    #[serde(default)]
    shapes: Vec<ShapeRecord>,
    volumes: Vec<VolumeRecord>,
}

#[derive(Debug, Deserialize)]
struct PlacementRecord {
    name: String,
    volume: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeRecord {
    id: u32,
    name: String,
    shape: Option<u32>,
    #[serde(default = "default_fill_style")]
    fill_style: i32,
    #[serde(default = "default_color")]
    color: i32,
    /// Raw attribute bitfield; takes precedence over the booleans.
    geo_att: Option<u32>,
    visible: Option<bool>,
    visible_daughters: Option<bool>,
    nodes: Option<Vec<PlacementRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ShapeRecord {
    Sphere {
        id: u32,
        #[serde(default)]
        rmin: f64,
        rmax: f64,
        #[serde(default = "default_segments")]
        segments: u32,
        #[serde(default = "default_z_slices", rename = "zSlices")]
        z_slices: u32,
    },
    Composite {
        id: u32,
        #[serde(default)]
        op: BooleanOp,
        left: u32,
        right: u32,
    },
    Other {
        id: u32,
        #[serde(rename = "typeName")]
        type_name: String,
    },
}

impl ShapeRecord {
    fn id(&self) -> u32 {
        match self {
            ShapeRecord::Sphere { id, .. }
            | ShapeRecord::Composite { id, .. }
            | ShapeRecord::Other { id, .. } => *id,
        }
    }
}

fn default_fill_style() -> i32 {
    VolumeData::DEFAULT_FILL_STYLE
}

fn default_color() -> i32 {
    1
}

fn default_segments() -> u32 {
    ShapeData::DEFAULT_SPHERE_SEGMENTS
}

fn default_z_slices() -> u32 {
    ShapeData::DEFAULT_SPHERE_Z_SLICES
}

/// Reads a JSON geometry description into a new arena.
///
/// Dangling or duplicate ids, volumes without a shape and cyclic composite
/// shapes are reported as [`Error::MalformedGeometry`].
pub fn read_geometry_json(content: &str) -> Result<GeometryArena> {
    let document: GeometryDocument = serde_json::from_str(content)?;
    build_arena(document)
}

fn build_arena(document: GeometryDocument) -> Result<GeometryArena> {
    let mut arena = GeometryArena::new();

    // Shapes first, with placeholders so composites can refer forward.
    let mut shape_ids: FxHashMap<u32, ShapeKey> = FxHashMap::default();
    for record in &document.shapes {
        let key = arena.add_shape(ShapeData::other("unresolved"));
        if shape_ids.insert(record.id(), key).is_some() {
            return Err(Error::MalformedGeometry(format!(
                "duplicate shape id {}",
                record.id()
            )));
        }
    }
    let resolve_shape = |id: u32, context: &str| {
        shape_ids.get(&id).copied().ok_or_else(|| {
            Error::MalformedGeometry(format!("{context} references unknown shape {id}"))
        })
    };
    for record in &document.shapes {
        let key = shape_ids[&record.id()];
        let data = match record {
            ShapeRecord::Sphere {
                rmin,
                rmax,
                segments,
                z_slices,
                ..
            } => ShapeData::Sphere {
                rmin: *rmin,
                rmax: *rmax,
                segments: *segments,
                z_slices: *z_slices,
            },
            ShapeRecord::Composite {
                id, op, left, right,
            } => {
                let context = format!("composite shape {id}");
                ShapeData::Composite {
                    op: *op,
                    left: resolve_shape(*left, &context)?,
                    right: resolve_shape(*right, &context)?,
                }
            }
            ShapeRecord::Other { type_name, .. } => ShapeData::other(type_name.clone()),
        };
        arena.shapes[key] = data;
    }
    check_composite_cycles(&arena)?;

    // Volumes, then their placements once every id is known.
    let mut volume_ids: FxHashMap<u32, VolumeKey> = FxHashMap::default();
    for record in &document.volumes {
        let shape_id = record.shape.ok_or_else(|| {
            Error::MalformedGeometry(format!("volume {} ({}) has no shape", record.id, record.name))
        })?;
        let shape = resolve_shape(shape_id, &format!("volume {}", record.id))?;
        let vis = match record.geo_att {
            Some(bits) => VisFlags::from_bits_retain(bits),
            None => VisFlags::from_bools(
                record.visible.unwrap_or(true),
                record.visible_daughters.unwrap_or(true),
            ),
        };
        let key = arena.insert_volume(VolumeData {
            name: record.name.clone(),
            fill_style: record.fill_style,
            color: record.color,
            shape,
            vis,
            nodes: Vec::new(),
        });
        if volume_ids.insert(record.id, key).is_some() {
            return Err(Error::MalformedGeometry(format!(
                "duplicate volume id {}",
                record.id
            )));
        }
    }
    let resolve_volume = |id: u32, placement: &str| {
        volume_ids.get(&id).copied().ok_or_else(|| {
            Error::MalformedGeometry(format!(
                "placement {placement} references unknown volume {id}"
            ))
        })
    };
    for record in document.volumes {
        let mother = volume_ids[&record.id];
        for placement in record.nodes.unwrap_or_default() {
            let daughter = resolve_volume(placement.volume, &placement.name)?;
            arena.place(mother, placement.name, daughter);
        }
    }

    check_placement_cycles(&arena)?;

    let top_volume = resolve_volume(document.top.volume, &document.top.name)?;
    let top = arena.add_node(document.top.name, top_volume);
    arena.set_top(top);

    Ok(arena)
}

/// Rejects volumes that place themselves, directly or through descendants.
fn check_placement_cycles(arena: &GeometryArena) -> Result<()> {
    let mut done: FxHashSet<VolumeKey> = FxHashSet::default();
    for (start, _) in arena.volumes.iter() {
        let mut on_path: FxHashSet<VolumeKey> = FxHashSet::default();
        visit_volume(arena, start, &mut on_path, &mut done)?;
    }
    Ok(())
}

fn visit_volume(
    arena: &GeometryArena,
    key: VolumeKey,
    on_path: &mut FxHashSet<VolumeKey>,
    done: &mut FxHashSet<VolumeKey>,
) -> Result<()> {
    if done.contains(&key) {
        return Ok(());
    }
    if !on_path.insert(key) {
        let name = arena.volumes.get(key).map_or("?", |v| v.name.as_str());
        return Err(Error::MalformedGeometry(format!(
            "volume {name} is placed inside itself"
        )));
    }
    for &child in arena.children(key) {
        if let Some(daughter) = arena.node_volume(child) {
            visit_volume(arena, daughter, on_path, done)?;
        }
    }
    on_path.remove(&key);
    done.insert(key);
    Ok(())
}

/// Rejects composite shapes that contain themselves.
fn check_composite_cycles(arena: &GeometryArena) -> Result<()> {
    let mut done: FxHashSet<ShapeKey> = FxHashSet::default();
    for (start, _) in arena.shapes.iter() {
        let mut on_path: FxHashSet<ShapeKey> = FxHashSet::default();
        visit_shape(arena, start, &mut on_path, &mut done)?;
    }
    Ok(())
}

fn visit_shape(
    arena: &GeometryArena,
    key: ShapeKey,
    on_path: &mut FxHashSet<ShapeKey>,
    done: &mut FxHashSet<ShapeKey>,
) -> Result<()> {
    if done.contains(&key) {
        return Ok(());
    }
    if !on_path.insert(key) {
        return Err(Error::MalformedGeometry(
            "composite shape refers to itself".to_string(),
        ));
    }
    if let Some((left, right)) = arena.shapes.get(key).and_then(ShapeData::operands) {
        visit_shape(arena, left, on_path, done)?;
        visit_shape(arena, right, on_path, done)?;
    }
    on_path.remove(&key);
    done.insert(key);
    Ok(())
}
