// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built scene trees and the subpart post-filter.
//!
//! A scene builder honours visibility per volume, so a volume that is visible
//! through one placement is emitted under *every* placement of it. The
//! post-filter re-applies the subpart patterns to the built tree, whose node
//! names mirror placement names, and drops every branch that neither matches
//! nor leads to a match.

use detgeo_core::traversal::join_path;
use detgeo_core::ShapeKey;
use detgeo_geometry::{PathMode, PatternSet};

use crate::config::SubpartVisibility;

/// Surface material of a built mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSpec {
    /// Linear RGBA base colour.
    pub base_color: [f32; 4],
    pub double_sided: bool,
}

/// Mesh payload of a scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMesh {
    /// Name of the volume the mesh was built from.
    pub name: String,
    /// Source shape; meshes built from one shape share geometry on export.
    pub shape: ShapeKey,
    pub shape_type: String,
    pub vertex_count: usize,
    pub face_count: usize,
    pub material: MaterialSpec,
}

/// Node of a built scene tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneNode {
    /// Placement name; empty for structural grouping nodes.
    pub name: String,
    pub mesh: Option<SceneMesh>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Number of mesh-bearing nodes in this subtree.
    pub fn mesh_count(&self) -> usize {
        usize::from(self.mesh.is_some())
            + self.children.iter().map(SceneNode::mesh_count).sum::<usize>()
    }

    /// Calls `visit` on every node with its full path, depth first.
    /// Empty-named nodes do not contribute to the path.
    pub fn visit_paths(&self, visit: &mut impl FnMut(&SceneNode, &str)) {
        self.visit_paths_below("", visit);
    }

    fn visit_paths_below(&self, parent: &str, visit: &mut impl FnMut(&SceneNode, &str)) {
        let path = if self.name.is_empty() {
            parent.to_string()
        } else {
            join_path(parent, &self.name)
        };
        visit(self, &path);
        for child in &self.children {
            child.visit_paths_below(&path, visit);
        }
    }
}

/// One subpart's scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Menu path of the subpart, e.g. `"Trackers > VELO"`.
    pub name: String,
    /// Built tree; `None` once filtering leaves nothing.
    pub root: Option<SceneNode>,
    pub visibility: SubpartVisibility,
}

impl Scene {
    pub fn new(name: impl Into<String>, root: Option<SceneNode>, visibility: SubpartVisibility) -> Self {
        Self {
            name: name.into(),
            root,
            visibility,
        }
    }

    /// Applies [`filter_scene`] to the root, dropping it when nothing matched.
    /// Returns whether anything matched.
    pub fn filter(&mut self, patterns: &PatternSet, mode: PathMode) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let found = filter_scene(root, patterns, mode);
        if !found && !root.name.is_empty() {
            self.root = None;
        }
        found
    }

    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, SceneNode::node_count)
    }

    pub fn mesh_count(&self) -> usize {
        self.root.as_ref().map_or(0, SceneNode::mesh_count)
    }
}

/// Removes every branch below `root` that neither matches `patterns` nor
/// contains a match.
///
/// The root itself is never tested, only its descendants, mirroring subpart
/// selection which starts below the top placement. A node whose candidate
/// string matches is kept with its whole subtree. Nodes with an empty name
/// are transparent: always kept, recursed through, and not part of the path.
/// Returns whether a descendant matched. Applying the filter twice gives the
/// same tree as applying it once.
pub fn filter_scene(root: &mut SceneNode, patterns: &PatternSet, mode: PathMode) -> bool {
    let path = join_path("", &root.name);
    filter_children(root, &path, patterns, mode)
}

fn filter_below(node: &mut SceneNode, parent: &str, patterns: &PatternSet, mode: PathMode) -> bool {
    if node.name.is_empty() {
        return filter_children(node, parent, patterns, mode);
    }
    let path = join_path(parent, &node.name);
    let candidate = match mode {
        PathMode::Name => node.name.as_str(),
        PathMode::FullPath => path.as_str(),
    };
    patterns.matches(candidate) || filter_children(node, &path, patterns, mode)
}

fn filter_children(node: &mut SceneNode, path: &str, patterns: &PatternSet, mode: PathMode) -> bool {
    let mut found = false;
    node.children.retain_mut(|child| {
        let matched = filter_below(child, path, patterns, mode);
        found |= matched;
        matched || child.name.is_empty()
    });
    found
}
