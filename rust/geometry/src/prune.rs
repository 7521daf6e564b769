// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth and hidden-path pruning.
//!
//! Pruning rewrites the child list of every visited volume in place. The
//! decision for a child is made with the path of the placement being walked,
//! but the trimmed list is stored on the volume, which may be shared. When two
//! placements of one volume disagree, whichever is walked last trims the list
//! again, and both see the result. Dropped placements stay in the arena and
//! remain reachable through any other volume that still lists them.

use detgeo_core::traversal::join_path;
use detgeo_core::{GeometryArena, NodeKey, PathMode};

use crate::error::Result;
use crate::matcher::PatternSet;

/// Counters from one pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Child placements examined, counting shared volumes once per path.
    pub visited: usize,
    /// Child placements dropped from their mother's list.
    pub removed: usize,
}

/// Prunes the DAG below `root`.
///
/// A child of a placement at level `l` (the root's children are level 0) is
/// kept iff `l < max_level` and its candidate string, chosen by `mode`, does
/// not match `hidden`. Only kept children are descended into. Must run once,
/// before any subpart is processed.
pub fn prune(
    arena: &mut GeometryArena,
    root: NodeKey,
    hidden: &PatternSet,
    max_level: usize,
    mode: PathMode,
) -> Result<PruneStats> {
    let root_volume = arena
        .volume_of(root)
        .ok_or(detgeo_core::Error::MissingNode(root))?;
    let root_path = root_volume.name.clone();

    let mut stats = PruneStats::default();
    prune_below(arena, root, &root_path, 0, hidden, max_level, mode, &mut stats);

    tracing::debug!(
        visited = stats.visited,
        removed = stats.removed,
        max_level,
        hidden_patterns = hidden.len(),
        "Pruned geometry"
    );
    Ok(stats)
}

#[allow(clippy::too_many_arguments)]
fn prune_below(
    arena: &mut GeometryArena,
    node: NodeKey,
    path: &str,
    level: usize,
    hidden: &PatternSet,
    max_level: usize,
    mode: PathMode,
    stats: &mut PruneStats,
) {
    let Some(volume) = arena.node_volume(node) else {
        return;
    };

    let mut kept: Vec<(NodeKey, String)> = Vec::new();
    for &child in arena.children(volume) {
        stats.visited += 1;
        // Placements that do not resolve are dropped like hidden ones.
        let Some(data) = arena.node(child) else {
            stats.removed += 1;
            continue;
        };
        let keep = level < max_level && !hidden.matches(&mode.child_candidate(path, &data.name));
        if keep {
            kept.push((child, join_path(path, &data.name)));
        } else {
            stats.removed += 1;
        }
    }

    if let Some(data) = arena.volume_mut(volume) {
        data.nodes = kept.iter().map(|(child, _)| *child).collect();
    }

    for (child, child_path) in kept {
        prune_below(arena, child, &child_path, level + 1, hidden, max_level, mode, stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detgeo_core::ShapeData;

    struct Chain {
        arena: GeometryArena,
        top: NodeKey,
        b: NodeKey,
        d: NodeKey,
    }

    /// World ─ A ─┬─ B ─ C
    ///            └─ D
    fn chain() -> Chain {
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let world = arena.add_volume("World", shape);
        let va = arena.add_volume("VA", shape);
        let vb = arena.add_volume("VB", shape);
        let vc = arena.add_volume("VC", shape);
        let vd = arena.add_volume("VD", shape);
        let top = arena.add_node("World_1", world);
        arena.set_top(top);
        arena.place(world, "A", va);
        let b = arena.place(va, "B", vb);
        arena.place(vb, "C", vc);
        let d = arena.place(va, "D", vd);
        Chain { arena, top, b, d }
    }

    fn paths(arena: &GeometryArena) -> Vec<String> {
        arena.placement_paths().unwrap()
    }

    #[test]
    fn hidden_full_path_drops_subtree_keeps_sibling() {
        let Chain {
            mut arena, top, b, d,
        } = chain();
        let hidden = PatternSet::prefixes(["World/A/B"]);
        let stats = prune(&mut arena, top, &hidden, 999, PathMode::FullPath).unwrap();

        assert_eq!(paths(&arena), vec!["World/A", "World/A/D"]);
        assert_eq!(stats.removed, 1);
        let va = arena.volume_of(arena.children(arena.top_volume().unwrap())[0]).unwrap();
        assert_eq!(va.nodes, vec![d]);
        // The dropped placement is unreachable but still owned by the arena.
        assert!(arena.node(b).is_some());
    }

    #[test]
    fn hidden_name_mode_matches_bare_names() {
        let Chain { mut arena, top, .. } = chain();
        // In name mode the full path must not match.
        let hidden = PatternSet::prefixes(["World/A/B"]);
        prune(&mut arena, top, &hidden, 999, PathMode::Name).unwrap();
        assert_eq!(paths(&arena).len(), 4);

        let hidden = PatternSet::prefixes(["B"]);
        prune(&mut arena, top, &hidden, 999, PathMode::Name).unwrap();
        assert_eq!(paths(&arena), vec!["World/A", "World/A/D"]);
    }

    #[test]
    fn chain_with_hidden_middle_leaves_top_child_empty() {
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let va = arena.add_volume("VA", shape);
        let vb = arena.add_volume("VB", shape);
        let vc = arena.add_volume("VC", shape);
        let a = arena.add_node("A", va);
        arena.set_top(a);
        arena.place(va, "B", vb);
        arena.place(vb, "C", vc);

        prune(&mut arena, a, &PatternSet::prefixes(["B"]), 999, PathMode::Name).unwrap();
        assert!(arena.children(va).is_empty());
    }

    #[test]
    fn max_level_bounds_depth() {
        for max_level in 0..4 {
            let Chain { mut arena, top, .. } = chain();
            prune(&mut arena, top, &PatternSet::new(), max_level, PathMode::Name).unwrap();
            let mut levels = Vec::new();
            arena.walk_placements(|v| levels.push(v.level)).unwrap();
            assert!(levels.iter().all(|&l| l < max_level), "max_level {max_level}: {levels:?}");
            // Everything shallower than the limit survives.
            let expected = [0, 1, 3, 4][max_level.min(3)];
            assert_eq!(levels.len(), expected, "max_level {max_level}");
        }
    }

    #[test]
    fn shared_volume_last_walk_wins() {
        // Two placements of one volume; only the second path is hidden below.
        let mut arena = GeometryArena::new();
        let shape = arena.add_shape(ShapeData::other("TGeoBBox"));
        let world = arena.add_volume("World", shape);
        let shared = arena.add_volume("S", shape);
        let leaf = arena.add_volume("L", shape);
        let top = arena.add_node("World_1", world);
        arena.set_top(top);
        arena.place(world, "s_0", shared);
        arena.place(world, "s_1", shared);
        arena.place(shared, "leaf", leaf);

        let hidden = PatternSet::prefixes(["World/s_1/leaf"]);
        prune(&mut arena, top, &hidden, 999, PathMode::FullPath).unwrap();

        // The trimmed list lives on the shared volume, so s_0 lost it too.
        assert_eq!(paths(&arena), vec!["World/s_0", "World/s_1"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let mut arena = GeometryArena::new();
        let result = prune(
            &mut arena,
            NodeKey::default(),
            &PatternSet::new(),
            3,
            PathMode::Name,
        );
        assert!(result.is_err());
    }
}
