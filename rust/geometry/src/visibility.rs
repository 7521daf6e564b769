// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Visibility propagation and shape simplification.
//!
//! Both visibility bits and child lists belong to volumes, so every pass here
//! visits each reachable volume once, however many placements lead to it.
//! All passes are idempotent.

use rustc_hash::FxHashSet;

use detgeo_core::{GeometryArena, NodeKey, ShapeData, ShapeKey, VisFlags, VolumeKey};

/// Sphere segment count forced by [`fix_shape_tessellation`].
pub const SIMPLIFIED_SPHERE_SEGMENTS: u32 = 3;
/// Sphere z-slice count forced by [`fix_shape_tessellation`].
pub const SIMPLIFIED_SPHERE_Z_SLICES: u32 = 3;

/// Visits `node`'s volume and every volume below it exactly once.
fn for_each_volume_below(
    arena: &mut GeometryArena,
    node: NodeKey,
    mut apply: impl FnMut(&mut GeometryArena, VolumeKey),
) -> usize {
    let Some(start) = arena.node_volume(node) else {
        return 0;
    };
    let mut seen: FxHashSet<VolumeKey> = FxHashSet::default();
    let mut stack = vec![start];
    while let Some(volume) = stack.pop() {
        if !seen.insert(volume) {
            continue;
        }
        apply(arena, volume);
        // Reverse keeps child order when popping.
        for &child in arena.children(volume).iter().rev() {
            if let Some(daughter) = arena.node_volume(child) {
                stack.push(daughter);
            }
        }
    }
    seen.len()
}

/// Clears both visibility bits on `node`'s volume and everything below.
///
/// This is the per-subpart reset. Returns the number of volumes visited.
pub fn set_invisible_recursively(arena: &mut GeometryArena, node: NodeKey) -> usize {
    for_each_volume_below(arena, node, |arena, volume| {
        if let Some(data) = arena.volume_mut(volume) {
            data.vis.remove(VisFlags::THIS | VisFlags::DAUGHTERS);
        }
    })
}

/// Clears only the "render own shape" bit below `node`, leaving pass-through
/// bits and shapes untouched. Returns the number of volumes visited.
pub fn set_invisible_recursively_only(arena: &mut GeometryArena, node: NodeKey) -> usize {
    for_each_volume_below(arena, node, |arena, volume| {
        if let Some(data) = arena.volume_mut(volume) {
            data.vis.remove(VisFlags::THIS);
        }
    })
}

/// Makes `node` and everything below it visible.
///
/// Placeholder volumes (`fill_style == 0`) are not drawn but still traversed.
/// Volumes with children are marked pass-through so a builder walks into
/// them. Every shape reached is simplified with [`fix_shape_tessellation`].
/// Returns the number of volumes visited.
pub fn set_visible_recursively(arena: &mut GeometryArena, node: NodeKey) -> usize {
    let mut fixed_shapes: FxHashSet<ShapeKey> = FxHashSet::default();
    let mut simplified = 0;
    let visited = for_each_volume_below(arena, node, |arena, volume| {
        let Some(data) = arena.volume_mut(volume) else {
            return;
        };
        if !data.is_placeholder() {
            data.vis.insert(VisFlags::THIS);
        }
        if !data.nodes.is_empty() {
            data.vis.insert(VisFlags::DAUGHTERS);
        }
        let shape = data.shape;
        simplified += simplify_shape(arena, shape, &mut fixed_shapes);
    });
    if simplified > 0 {
        tracing::debug!(spheres = simplified, "Simplified sphere tessellation");
    }
    visited
}

/// Forces spheres to a coarse tessellation, recursing into composite
/// operands. Other shapes are untouched.
///
/// The change is made on the shared shape and cannot be undone; every volume
/// using the shape sees it. Returns the number of spheres changed.
pub fn fix_shape_tessellation(arena: &mut GeometryArena, shape: ShapeKey) -> usize {
    let mut fixed_shapes: FxHashSet<ShapeKey> = FxHashSet::default();
    simplify_shape(arena, shape, &mut fixed_shapes)
}

fn simplify_shape(
    arena: &mut GeometryArena,
    shape: ShapeKey,
    fixed: &mut FxHashSet<ShapeKey>,
) -> usize {
    let mut changed = 0;
    let mut stack = vec![shape];
    while let Some(key) = stack.pop() {
        if !fixed.insert(key) {
            continue;
        }
        match arena.shape_mut(key) {
            Some(ShapeData::Sphere {
                segments, z_slices, ..
            }) => {
                if *segments != SIMPLIFIED_SPHERE_SEGMENTS || *z_slices != SIMPLIFIED_SPHERE_Z_SLICES
                {
                    *segments = SIMPLIFIED_SPHERE_SEGMENTS;
                    *z_slices = SIMPLIFIED_SPHERE_Z_SLICES;
                    changed += 1;
                }
            }
            Some(ShapeData::Composite { left, right, .. }) => {
                stack.push(*right);
                stack.push(*left);
            }
            Some(ShapeData::Other { .. }) | None => {}
        }
    }
    changed
}
