// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for the geometry DAG.
//!
//! The [`GeometryArena`] owns every placement, volume and shape. Placements
//! point at volumes, volumes own their ordered child placement lists and
//! point at shapes, and composite shapes point at their operands. Nothing is
//! ever deep-copied: a volume placed in three mothers is one `VolumeData`,
//! and a change to its child list or visibility bits is seen through all
//! three placements.

use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::keys::*;
use crate::shape::ShapeData;
use crate::visibility::VisFlags;

/// A placement of a volume inside a mother volume.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub name: String,
    /// Non-owning reference: other placements may point at the same volume.
    pub volume: VolumeKey,
}

/// A reusable logical volume.
#[derive(Debug, Clone)]
pub struct VolumeData {
    pub name: String,
    /// Fill style of the volume; `0` marks a fully transparent placeholder.
    pub fill_style: i32,
    /// Colour index used for the exported material.
    pub color: i32,
    pub shape: ShapeKey,
    pub vis: VisFlags,
    /// Ordered child placements, empty for a leaf.
    pub nodes: Vec<NodeKey>,
}

impl VolumeData {
    /// Solid fill, the default of the source format.
    pub const DEFAULT_FILL_STYLE: i32 = 1001;

    /// Creates a leaf volume with default attributes and no visibility bits.
    pub fn new(name: impl Into<String>, shape: ShapeKey) -> Self {
        Self {
            name: name.into(),
            fill_style: Self::DEFAULT_FILL_STYLE,
            color: 1,
            shape,
            vis: VisFlags::empty(),
            nodes: Vec::new(),
        }
    }

    /// Returns `true` for fully transparent placeholder volumes.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.fill_style == 0
    }
}

/// The central arena that owns the whole geometry.
///
/// # Example
///
/// ```
/// use detgeo_core::{GeometryArena, ShapeData};
///
/// let mut arena = GeometryArena::new();
/// let shape = arena.add_shape(ShapeData::sphere(1.0));
/// let shared = arena.add_volume("mirror", shape);
/// let world = arena.add_volume("world", shape);
///
/// // Two placements of one volume.
/// arena.place(world, "mirror_0", shared);
/// arena.place(world, "mirror_1", shared);
///
/// assert_eq!(arena.volume_count(), 2);
/// assert_eq!(arena.children(world).len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct GeometryArena {
    pub(crate) nodes: SlotMap<NodeKey, NodeData>,
    pub(crate) volumes: SlotMap<VolumeKey, VolumeData>,
    pub(crate) shapes: SlotMap<ShapeKey, ShapeData>,
    pub(crate) top: Option<NodeKey>,
}

impl GeometryArena {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Shapes ---

    /// Adds a shape and returns its key.
    pub fn add_shape(&mut self, shape: ShapeData) -> ShapeKey {
        self.shapes.insert(shape)
    }

    /// Returns the shape for the given key, or `None` if not found.
    pub fn shape(&self, key: ShapeKey) -> Option<&ShapeData> {
        self.shapes.get(key)
    }

    /// Mutable access to a shared shape. Every volume using it sees the change.
    pub fn shape_mut(&mut self, key: ShapeKey) -> Option<&mut ShapeData> {
        self.shapes.get_mut(key)
    }

    /// Returns the number of shapes in the arena.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    // --- Volumes ---

    /// Adds a leaf volume with default attributes.
    pub fn add_volume(&mut self, name: impl Into<String>, shape: ShapeKey) -> VolumeKey {
        self.volumes.insert(VolumeData::new(name, shape))
    }

    /// Adds a fully specified volume.
    pub fn insert_volume(&mut self, volume: VolumeData) -> VolumeKey {
        self.volumes.insert(volume)
    }

    /// Returns the volume for the given key, or `None` if not found.
    pub fn volume(&self, key: VolumeKey) -> Option<&VolumeData> {
        self.volumes.get(key)
    }

    /// Mutable access to a volume, shared by all of its placements.
    pub fn volume_mut(&mut self, key: VolumeKey) -> Option<&mut VolumeData> {
        self.volumes.get_mut(key)
    }

    /// Returns the number of volumes in the arena.
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    /// Iterates over all volumes.
    pub fn volumes(&self) -> impl Iterator<Item = (VolumeKey, &VolumeData)> {
        self.volumes.iter()
    }

    /// Child placements of a volume. An unknown key reads as a leaf.
    pub fn children(&self, key: VolumeKey) -> &[NodeKey] {
        self.volumes
            .get(key)
            .map(|v| v.nodes.as_slice())
            .unwrap_or(&[])
    }

    // --- Placements ---

    /// Adds a placement that is not yet attached to any mother volume.
    pub fn add_node(&mut self, name: impl Into<String>, volume: VolumeKey) -> NodeKey {
        self.nodes.insert(NodeData {
            name: name.into(),
            volume,
        })
    }

    /// Places `daughter` inside `mother` under the given placement name.
    ///
    /// The placement is appended to the mother's child list. Unknown mothers
    /// leave the placement detached.
    pub fn place(
        &mut self,
        mother: VolumeKey,
        name: impl Into<String>,
        daughter: VolumeKey,
    ) -> NodeKey {
        let node = self.add_node(name, daughter);
        if let Some(volume) = self.volumes.get_mut(mother) {
            volume.nodes.push(node);
        }
        node
    }

    /// Returns the placement for the given key, or `None` if not found.
    pub fn node(&self, key: NodeKey) -> Option<&NodeData> {
        self.nodes.get(key)
    }

    /// Returns the number of placements in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Volume placed by a placement.
    pub fn node_volume(&self, key: NodeKey) -> Option<VolumeKey> {
        self.nodes.get(key).map(|n| n.volume)
    }

    /// Volume data of the volume placed by a placement.
    pub fn volume_of(&self, key: NodeKey) -> Option<&VolumeData> {
        self.nodes.get(key).and_then(|n| self.volumes.get(n.volume))
    }

    /// Mutable volume data of the volume placed by a placement.
    pub fn volume_of_mut(&mut self, key: NodeKey) -> Option<&mut VolumeData> {
        let volume = self.nodes.get(key)?.volume;
        self.volumes.get_mut(volume)
    }

    // --- Top ---

    /// Designates the root placement of the geometry.
    pub fn set_top(&mut self, node: NodeKey) {
        self.top = Some(node);
    }

    /// Returns the root placement, if one was designated.
    pub fn top(&self) -> Option<NodeKey> {
        self.top
    }

    /// Returns the root placement or [`Error::NoTop`].
    pub fn require_top(&self) -> Result<NodeKey> {
        let top = self.top.ok_or(Error::NoTop)?;
        if !self.nodes.contains_key(top) {
            return Err(Error::MissingNode(top));
        }
        Ok(top)
    }

    /// Re-roots the geometry at the first volume named `name`, placed under
    /// a new top placement `{name}_1`. Placements outside that volume's
    /// subtree stay in the arena but are no longer reachable.
    pub fn set_top_object(&mut self, name: &str) -> Result<NodeKey> {
        let volume = self
            .volumes
            .iter()
            .find(|(_, v)| v.name == name)
            .map(|(key, _)| key)
            .ok_or_else(|| Error::UnknownObject(name.to_string()))?;
        let top = self.add_node(format!("{name}_1"), volume);
        self.top = Some(top);
        Ok(top)
    }

    /// Root placement's volume, whose name heads every full path.
    pub fn top_volume(&self) -> Result<VolumeKey> {
        let top = self.require_top()?;
        let volume = self.nodes[top].volume;
        if !self.volumes.contains_key(volume) {
            return Err(Error::MissingVolume(volume));
        }
        Ok(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_arena_is_empty() {
        let arena = GeometryArena::new();
        assert_eq!(arena.node_count(), 0);
        assert_eq!(arena.volume_count(), 0);
        assert_eq!(arena.shape_count(), 0);
        assert!(arena.top().is_none());
        assert!(matches!(arena.require_top(), Err(Error::NoTop)));
    }

    #[test]
    fn place_appends_in_order() {
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let world = arena.add_volume("world", shape);
        let a = arena.add_volume("a", shape);
        let b = arena.add_volume("b", shape);

        let na = arena.place(world, "a_0", a);
        let nb = arena.place(world, "b_0", b);

        assert_eq!(arena.children(world), &[na, nb]);
        assert_eq!(arena.node(na).unwrap().name, "a_0");
        assert_eq!(arena.node_volume(nb), Some(b));
    }

    #[test]
    fn shared_volume_mutation_is_seen_by_every_placement() {
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let world = arena.add_volume("world", shape);
        let shared = arena.add_volume("shared", shape);
        let p1 = arena.place(world, "p1", shared);
        let p2 = arena.place(world, "p2", shared);

        arena.volume_of_mut(p1).unwrap().vis.insert(VisFlags::THIS);

        assert!(arena.volume_of(p2).unwrap().vis.contains(VisFlags::THIS));
    }

    #[test]
    fn unknown_volume_reads_as_leaf() {
        let arena = GeometryArena::new();
        assert!(arena.children(VolumeKey::default()).is_empty());
        assert!(arena.volume_of(NodeKey::default()).is_none());
    }

    #[test]
    fn top_volume_resolves_through_top_placement() {
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let world = arena.add_volume("world", shape);
        let top = arena.add_node("world_1", world);
        arena.set_top(top);

        assert_eq!(arena.require_top().unwrap(), top);
        assert_eq!(arena.top_volume().unwrap(), world);
    }

    #[test]
    fn set_top_object_reroots_at_named_volume() {
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let world = arena.add_volume("world", shape);
        let rich = arena.add_volume("Rich", shape);
        arena.place(world, "rich_0", rich);
        let top = arena.add_node("world_1", world);
        arena.set_top(top);

        let new_top = arena.set_top_object("Rich").unwrap();
        assert_eq!(arena.top(), Some(new_top));
        assert_eq!(arena.top_volume().unwrap(), rich);
        assert_eq!(arena.node(new_top).unwrap().name, "Rich_1");

        assert!(matches!(
            arena.set_top_object("Muon"),
            Err(Error::UnknownObject(name)) if name == "Muon"
        ));
        assert_eq!(arena.top(), Some(new_top));
    }

    #[test]
    fn placeholder_detection() {
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let key = arena.add_volume("ghost", shape);
        assert!(!arena.volume(key).unwrap().is_placeholder());
        arena.volume_mut(key).unwrap().fill_style = 0;
        assert!(arena.volume(key).unwrap().is_placeholder());
    }
}
