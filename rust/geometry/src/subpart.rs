// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bottom-up subpart selection.
//!
//! Starting below a top placement, every child whose candidate string matches
//! the subpart patterns is made visible together with its whole subtree. A
//! child that does not match is searched recursively, and if something below
//! it was selected it is marked pass-through ([`VisFlags::DAUGHTERS`]) without
//! being drawn itself. A direct match always wins over the recursive search.
//!
//! The caller is expected to have reset visibility first; selection only ever
//! sets bits.

use rustc_hash::FxHashMap;

use detgeo_core::traversal::join_path;
use detgeo_core::{GeometryArena, NodeKey, PathMode, VisFlags, VolumeKey};

use crate::error::Result;
use crate::matcher::PatternSet;
use crate::visibility::set_visible_recursively;

/// Marks the subpart selected by `patterns` below `top`.
///
/// The top placement's path is its volume's name, and the top itself is left
/// untouched. Returns whether anything below `top` became visible.
pub fn select_subpart(
    arena: &mut GeometryArena,
    top: NodeKey,
    patterns: &PatternSet,
    mode: PathMode,
) -> Result<bool> {
    let volume = arena
        .node_volume(top)
        .ok_or(detgeo_core::Error::MissingNode(top))?;
    let path = arena
        .volume(volume)
        .ok_or(detgeo_core::Error::MissingVolume(volume))?
        .name
        .clone();

    let mut memo = FxHashMap::default();
    Ok(select_below(arena, volume, &path, patterns, mode, &mut memo))
}

/// In [`PathMode::Name`] the outcome for a volume does not depend on the path
/// that reached it, so it is computed once per volume.
fn select_below(
    arena: &mut GeometryArena,
    volume: VolumeKey,
    path: &str,
    patterns: &PatternSet,
    mode: PathMode,
    memo: &mut FxHashMap<VolumeKey, bool>,
) -> bool {
    if mode == PathMode::Name {
        if let Some(&found) = memo.get(&volume) {
            return found;
        }
    }

    let children = arena.children(volume).to_vec();
    let mut found = false;
    for child in children {
        let Some(data) = arena.node(child) else {
            continue;
        };
        let daughter = data.volume;
        let child_path = join_path(path, &data.name);
        let candidate = match mode {
            PathMode::Name => data.name.as_str(),
            PathMode::FullPath => child_path.as_str(),
        };

        if patterns.matches(candidate) {
            set_visible_recursively(arena, child);
            found = true;
        } else if select_below(arena, daughter, &child_path, patterns, mode, memo) {
            if let Some(data) = arena.volume_mut(daughter) {
                data.vis.insert(VisFlags::DAUGHTERS);
            }
            found = true;
        }
    }

    if mode == PathMode::Name {
        memo.insert(volume, found);
    }
    found
}
