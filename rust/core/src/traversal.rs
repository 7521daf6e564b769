// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Path building and depth-first walks over the placement DAG.
//!
//! A path is built from the root down. The top placement contributes the
//! name of its *volume*; every other placement contributes its own name.
//! Levels count from the top's direct children, which sit at level 0.

use crate::arena::GeometryArena;
use crate::error::Result;
use crate::keys::NodeKey;

/// Separator between path components.
pub const PATH_SEPARATOR: char = '/';

/// Which string a placement is matched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    /// The bare placement name.
    #[default]
    Name,
    /// The slash-joined path from the top volume down to the placement.
    FullPath,
}

impl PathMode {
    /// Candidate string for a child placement.
    ///
    /// `parent_path` is the full path of the mother; it is ignored in
    /// [`PathMode::Name`].
    pub fn child_candidate(self, parent_path: &str, child_name: &str) -> String {
        match self {
            PathMode::Name => child_name.to_string(),
            PathMode::FullPath => join_path(parent_path, child_name),
        }
    }
}

impl From<bool> for PathMode {
    fn from(full_path: bool) -> Self {
        if full_path {
            PathMode::FullPath
        } else {
            PathMode::Name
        }
    }
}

/// Joins a parent path and a child name. An empty parent yields the bare name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        return name.to_string();
    }
    let mut path = String::with_capacity(parent.len() + 1 + name.len());
    path.push_str(parent);
    path.push(PATH_SEPARATOR);
    path.push_str(name);
    path
}

/// One placement reached during a walk.
#[derive(Debug, Clone)]
pub struct PlacementVisit {
    pub node: NodeKey,
    /// Level below the top; the top's direct children are level 0.
    pub level: usize,
    /// Full path, headed by the top volume's name.
    pub path: String,
}

impl GeometryArena {
    /// Path of the top placement, i.e. its volume's name.
    pub fn top_path(&self) -> Result<String> {
        let volume = self.top_volume()?;
        Ok(self.volumes[volume].name.clone())
    }

    /// Visits every placement reachable from the top, depth first, in child
    /// order. A shared volume is visited once per placement path.
    pub fn walk_placements(&self, mut visit: impl FnMut(&PlacementVisit)) -> Result<()> {
        let top = self.require_top()?;
        let root_path = self.top_path()?;
        self.walk_below(top, &root_path, 0, &mut visit);
        Ok(())
    }

    fn walk_below(
        &self,
        node: NodeKey,
        path: &str,
        level: usize,
        visit: &mut impl FnMut(&PlacementVisit),
    ) {
        let Some(volume) = self.node_volume(node) else {
            return;
        };
        for &child in self.children(volume) {
            let Some(data) = self.node(child) else {
                continue;
            };
            let entry = PlacementVisit {
                node: child,
                level,
                path: join_path(path, &data.name),
            };
            visit(&entry);
            self.walk_below(child, &entry.path, level + 1, visit);
        }
    }

    /// Number of placement paths reachable below the top.
    pub fn reachable_count(&self) -> Result<usize> {
        let mut count = 0;
        self.walk_placements(|_| count += 1)?;
        Ok(count)
    }

    /// Deepest level reached below the top, `None` if the top is a leaf.
    pub fn deepest_level(&self) -> Result<Option<usize>> {
        let mut deepest = None;
        self.walk_placements(|v| {
            deepest = Some(deepest.map_or(v.level, |d: usize| d.max(v.level)));
        })?;
        Ok(deepest)
    }

    /// Full paths of every reachable placement, in walk order.
    pub fn placement_paths(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        self.walk_placements(|v| paths.push(v.path.clone()))?;
        Ok(paths)
    }
}
