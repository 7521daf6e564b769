// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene building from the visibility-marked geometry DAG.
//!
//! The builder walks placements from the top, following volumes that are
//! drawn ([`VisFlags::THIS`]) or passed through ([`VisFlags::DAUGHTERS`]).
//! Visibility is read per volume, so every placement of a visible volume is
//! emitted; the post-filter in [`crate::scene`] corrects that afterwards.

use detgeo_core::{GeometryArena, NodeKey, ShapeData, ShapeKey, VisFlags, VolumeData};

use crate::config::BuildLimits;
use crate::error::Result;
use crate::scene::{MaterialSpec, SceneMesh, SceneNode};

/// Turns a marked geometry into a scene tree.
pub trait SceneBuilder {
    /// Builds the scene below the arena's top placement. The root node is
    /// named after the top volume so scene paths mirror geometry paths.
    fn build(&mut self, arena: &GeometryArena, limits: &BuildLimits) -> Result<SceneNode>;
}

/// Builder emitting one node per visible placement and one mesh per drawn
/// volume, with face counts estimated from the shape's tessellation.
#[derive(Debug, Clone)]
pub struct VolumeSceneBuilder {
    faces_per_circle: u32,
}

impl VolumeSceneBuilder {
    pub fn new(faces_per_circle: u32) -> Self {
        Self {
            faces_per_circle: faces_per_circle.max(3),
        }
    }

    pub fn faces_per_circle(&self) -> u32 {
        self.faces_per_circle
    }
}

impl Default for VolumeSceneBuilder {
    fn default() -> Self {
        Self::new(24)
    }
}

/// Running totals checked against [`BuildLimits`].
#[derive(Debug, Default)]
struct Budget {
    nodes: usize,
    faces: usize,
    faces_exhausted: bool,
    nodes_exhausted: bool,
}

impl SceneBuilder for VolumeSceneBuilder {
    fn build(&mut self, arena: &GeometryArena, limits: &BuildLimits) -> Result<SceneNode> {
        let top = arena.require_top()?;
        let top_volume = arena.top_volume()?;
        let volume = arena
            .volume(top_volume)
            .ok_or(detgeo_core::Error::MissingVolume(top_volume))?;

        let mut budget = Budget {
            nodes: 1,
            ..Budget::default()
        };
        let mut root = SceneNode::new(volume.name.clone());
        if volume.vis.contains(VisFlags::THIS) {
            root.mesh = self.mesh_for(arena, volume, limits, &mut budget);
        }
        if volume.vis.contains(VisFlags::DAUGHTERS) {
            root.children = self.build_children(arena, top, 0, limits, &mut budget);
        }

        if budget.faces_exhausted {
            tracing::warn!(
                max_faces = limits.max_faces,
                "Face budget exhausted, remaining meshes were skipped"
            );
        }
        if budget.nodes_exhausted {
            tracing::warn!(
                max_nodes = limits.max_nodes,
                "Node budget exhausted, scene is truncated"
            );
        }
        tracing::debug!(nodes = budget.nodes, faces = budget.faces, "Built scene");
        Ok(root)
    }
}

impl VolumeSceneBuilder {
    fn build_children(
        &self,
        arena: &GeometryArena,
        node: NodeKey,
        level: usize,
        limits: &BuildLimits,
        budget: &mut Budget,
    ) -> Vec<SceneNode> {
        if level >= limits.vis_level {
            return Vec::new();
        }
        let Some(volume) = arena.node_volume(node) else {
            return Vec::new();
        };

        let mut children = Vec::new();
        for &child in arena.children(volume) {
            if budget.nodes >= limits.max_nodes {
                budget.nodes_exhausted = true;
                break;
            }
            let (Some(placement), Some(data)) = (arena.node(child), arena.volume_of(child)) else {
                continue;
            };
            if !data.vis.is_drawn_or_traversed() {
                continue;
            }

            budget.nodes += 1;
            let mut scene_node = SceneNode::new(placement.name.clone());
            if data.vis.contains(VisFlags::THIS) {
                scene_node.mesh = self.mesh_for(arena, data, limits, budget);
            }
            if data.vis.contains(VisFlags::DAUGHTERS) {
                scene_node.children = self.build_children(arena, child, level + 1, limits, budget);
            }

            if scene_node.mesh.is_some() || !scene_node.children.is_empty() {
                children.push(scene_node);
            } else {
                budget.nodes -= 1;
            }
        }
        children
    }

    fn mesh_for(
        &self,
        arena: &GeometryArena,
        volume: &VolumeData,
        limits: &BuildLimits,
        budget: &mut Budget,
    ) -> Option<SceneMesh> {
        let (vertex_count, face_count) = self.estimate(arena, volume.shape);
        if budget.faces + face_count > limits.max_faces {
            budget.faces_exhausted = true;
            return None;
        }
        budget.faces += face_count;

        let shape_type = arena
            .shape(volume.shape)
            .map_or("unknown", ShapeData::type_name)
            .to_string();
        Some(SceneMesh {
            name: volume.name.clone(),
            shape: volume.shape,
            shape_type,
            vertex_count,
            face_count,
            material: MaterialSpec {
                base_color: palette_color(volume.color),
                double_sided: false,
            },
        })
    }

    /// Estimated `(vertices, triangles)` of a shape's tessellation.
    fn estimate(&self, arena: &GeometryArena, shape: ShapeKey) -> (usize, usize) {
        let circle = self.faces_per_circle as usize;
        match arena.shape(shape) {
            Some(ShapeData::Sphere {
                segments, z_slices, ..
            }) => {
                let (s, z) = (*segments as usize, *z_slices as usize);
                ((s + 1) * (z + 1), 2 * s * z)
            }
            Some(ShapeData::Composite { left, right, .. }) => {
                let (lv, lf) = self.estimate(arena, *left);
                let (rv, rf) = self.estimate(arena, *right);
                (lv + rv, lf + rf)
            }
            Some(ShapeData::Other { type_name }) if is_round(type_name) => {
                // Two rims and the side wall, each `circle` wide.
                (4 * circle, 4 * circle)
            }
            Some(ShapeData::Other { .. }) | None => (8, 12),
        }
    }
}

fn is_round(type_name: &str) -> bool {
    matches!(
        type_name,
        "TGeoTube"
            | "TGeoTubeSeg"
            | "TGeoCtub"
            | "TGeoCone"
            | "TGeoConeSeg"
            | "TGeoPcon"
            | "TGeoPgon"
            | "TGeoEltu"
            | "TGeoTorus"
            | "TGeoParaboloid"
            | "TGeoHype"
    )
}

/// RGBA for the basic colour indices of the source format, grey otherwise.
pub fn palette_color(index: i32) -> [f32; 4] {
    match index {
        0 => [1.0, 1.0, 1.0, 1.0],
        1 => [0.0, 0.0, 0.0, 1.0],
        2 => [1.0, 0.0, 0.0, 1.0],
        3 => [0.0, 1.0, 0.0, 1.0],
        4 => [0.0, 0.0, 1.0, 1.0],
        5 => [1.0, 1.0, 0.0, 1.0],
        6 => [1.0, 0.0, 1.0, 1.0],
        7 => [0.0, 1.0, 1.0, 1.0],
        8 => [0.35, 0.83, 0.33, 1.0],
        9 => [0.35, 0.33, 0.85, 1.0],
        _ => [0.6, 0.6, 0.6, 1.0],
    }
}
