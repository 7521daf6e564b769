// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion of a geometry DAG into one multi-scene document.
//!
//! Subparts are processed strictly one after another: every subpart resets
//! and then rewrites the visibility bits of the shared DAG, so two subparts
//! in flight would corrupt each other.

use detgeo_core::{GeometryArena, VisFlags};
use detgeo_geometry::{prune, select_subpart, set_invisible_recursively, PruneStats};

use crate::builder::{SceneBuilder, VolumeSceneBuilder};
use crate::config::{ConversionConfig, SubpartSpec};
use crate::dedup::{deduplicate, DedupStats};
use crate::document::OutputDocument;
use crate::error::Result;
use crate::exporter::GltfExporter;
use crate::scene::Scene;

/// Outcome for one subpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpartReport {
    pub name: String,
    /// Whether the selector marked anything.
    pub found: bool,
    /// Scene nodes left after post-filtering.
    pub nodes: usize,
    pub meshes: usize,
}

/// Summary of a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub prune: PruneStats,
    pub subparts: Vec<SubpartReport>,
    /// Subparts whose patterns matched nothing. Their scenes are still written,
    /// empty.
    pub empty_subparts: Vec<String>,
    pub dedup: DedupStats,
}

/// A validated document with its run report.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub document: OutputDocument,
    pub report: ConversionReport,
}

/// Drives pruning, per-subpart selection, scene building, export and
/// deduplication.
#[derive(Debug)]
pub struct Converter<B: SceneBuilder = VolumeSceneBuilder> {
    config: ConversionConfig,
    builder: B,
}

impl Converter<VolumeSceneBuilder> {
    /// Creates a converter using the built-in scene builder.
    pub fn new(config: ConversionConfig) -> Result<Self> {
        let builder = VolumeSceneBuilder::new(config.faces_per_circle);
        Self::with_builder(config, builder)
    }
}

impl<B: SceneBuilder> Converter<B> {
    pub fn with_builder(config: ConversionConfig, builder: B) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, builder })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Converts `arena` in place.
    ///
    /// The arena is pruned once, then each subpart is selected, built,
    /// filtered and exported in configuration order. Any failure aborts the
    /// whole run; no document is returned in that case.
    pub fn convert(&mut self, arena: &mut GeometryArena) -> Result<ConversionOutput> {
        let top = arena.require_top()?;
        let mode = self.config.path_mode();

        tracing::info!(
            max_level = self.config.max_level,
            hidden_patterns = self.config.hidden_patterns.len(),
            "Pruning geometry"
        );
        let prune_stats = prune(
            arena,
            top,
            &self.config.hidden_patterns,
            self.config.max_level,
            mode,
        )?;

        let mut report = ConversionReport {
            prune: prune_stats,
            ..ConversionReport::default()
        };
        let mut scenes = Vec::with_capacity(self.config.subparts.len());
        for spec in &self.config.subparts {
            let (scene, subpart) = build_subpart(&mut self.builder, &self.config, arena, spec)?;
            if !subpart.found {
                tracing::warn!(subpart = %spec.name, "Subpart patterns matched nothing");
                report.empty_subparts.push(spec.name.clone());
            }
            report.subparts.push(subpart);
            scenes.push(scene);
        }

        tracing::info!(scenes = scenes.len(), "Exporting scenes");
        let mut document = GltfExporter::export(&scenes);
        report.dedup = deduplicate(&mut document)?;
        tracing::info!(
            materials = document.materials.len(),
            meshes = document.meshes.len(),
            nodes = document.nodes.len(),
            "Conversion complete"
        );

        Ok(ConversionOutput { document, report })
    }
}

/// Resets visibility, selects `spec`, then builds and filters its scene.
fn build_subpart<B: SceneBuilder>(
    builder: &mut B,
    config: &ConversionConfig,
    arena: &mut GeometryArena,
    spec: &SubpartSpec,
) -> Result<(Scene, SubpartReport)> {
    tracing::info!(subpart = %spec.name, "Generating subpart");
    let top = arena.require_top()?;
    let mode = config.path_mode();

    set_invisible_recursively(arena, top);
    let found = select_subpart(arena, top, &spec.patterns, mode)?;
    if found {
        let top_volume = arena.top_volume()?;
        if let Some(volume) = arena.volume_mut(top_volume) {
            volume.vis.insert(VisFlags::DAUGHTERS);
        }
    }

    let root = builder.build(arena, &config.build)?;
    let mut scene = Scene::new(spec.name.clone(), Some(root), spec.visibility);
    scene.filter(&spec.patterns, mode);

    let subpart = SubpartReport {
        name: spec.name.clone(),
        found,
        nodes: scene.node_count(),
        meshes: scene.mesh_count(),
    };
    tracing::debug!(
        subpart = %spec.name,
        nodes = subpart.nodes,
        meshes = subpart.meshes,
        "Subpart scene built"
    );
    Ok((scene, subpart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildLimits, SubpartVisibility};
    use crate::error::Error;
    use crate::scene::SceneNode;
    use detgeo_core::ShapeData;
    use detgeo_geometry::PatternSet;

    /// World -> {Tracker -> Layer, Calo}
    fn arena() -> GeometryArena {
        let mut arena = GeometryArena::new();
        let bbox = arena.add_shape(ShapeData::other("TGeoBBox"));
        let world = arena.add_volume("World", bbox);
        let tracker = arena.add_volume("TrackerVol", bbox);
        let layer = arena.add_volume("LayerVol", bbox);
        let calo = arena.add_volume("CaloVol", bbox);
        arena.place(tracker, "Layer", layer);
        arena.place(world, "Tracker", tracker);
        arena.place(world, "Calo", calo);
        let top = arena.add_node("world", world);
        arena.set_top(top);
        arena
    }

    fn config(subparts: Vec<SubpartSpec>) -> ConversionConfig {
        ConversionConfig {
            subparts,
            ..ConversionConfig::default()
        }
    }

    #[test]
    fn one_scene_per_subpart_in_order() {
        let mut arena = arena();
        let mut converter = Converter::new(config(vec![
            SubpartSpec::new("Calo", PatternSet::prefixes(["Calo"]), SubpartVisibility::Visible),
            SubpartSpec::new(
                "Trackers > Inner",
                PatternSet::prefixes(["Tracker"]),
                SubpartVisibility::VisibleWithOpacity(0.3),
            ),
        ]))
        .unwrap();

        let output = converter.convert(&mut arena).unwrap();
        let doc = &output.document;
        assert_eq!(doc.scenes.len(), 2);
        assert_eq!(doc.scenes[0]["name"], "Calo");
        assert_eq!(doc.scenes[1]["name"], "Trackers > Inner");
        assert_eq!(doc.scenes[1]["extras"]["opacity"], 0.3);
        assert!(output.report.empty_subparts.is_empty());

        // World, Tracker, Layer
        assert_eq!(output.report.subparts[1].nodes, 3);
        assert_eq!(output.report.subparts[1].meshes, 2);
    }

    #[test]
    fn empty_subpart_is_a_warning_not_an_error() {
        let mut arena = arena();
        let mut converter = Converter::new(config(vec![SubpartSpec::new(
            "Future",
            PatternSet::prefixes(["Muon"]),
            SubpartVisibility::Hidden,
        )]))
        .unwrap();

        let output = converter.convert(&mut arena).unwrap();
        assert_eq!(output.report.empty_subparts, vec!["Future".to_string()]);
        assert_eq!(output.document.scenes.len(), 1);
        assert_eq!(output.document.scenes[0]["extras"]["visible"], false);
        assert!(output.document.nodes.is_empty());
    }

    #[test]
    fn previous_subpart_does_not_leak() {
        let mut arena = arena();
        let mut converter = Converter::new(config(vec![
            SubpartSpec::new("Tracker", PatternSet::prefixes(["Tracker"]), SubpartVisibility::Visible),
            SubpartSpec::new("Calo", PatternSet::prefixes(["Calo"]), SubpartVisibility::Visible),
        ]))
        .unwrap();

        let output = converter.convert(&mut arena).unwrap();
        // World and Calo only.
        assert_eq!(output.report.subparts[1].nodes, 2);
        assert_eq!(output.report.subparts[1].meshes, 1);
    }

    struct FailingBuilder;

    impl SceneBuilder for FailingBuilder {
        fn build(&mut self, _: &GeometryArena, _: &BuildLimits) -> Result<SceneNode> {
            Err(Error::Collaborator("builder unavailable".into()))
        }
    }

    #[test]
    fn collaborator_failure_aborts_the_run() {
        let mut arena = arena();
        let mut converter = Converter::with_builder(
            config(vec![SubpartSpec::new(
                "Calo",
                PatternSet::prefixes(["Calo"]),
                SubpartVisibility::Visible,
            )]),
            FailingBuilder,
        )
        .unwrap();

        assert!(matches!(
            converter.convert(&mut arena),
            Err(Error::Collaborator(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut cfg = config(Vec::new());
        cfg.faces_per_circle = 2;
        assert!(matches!(Converter::new(cfg), Err(Error::InvalidConfig(_))));
    }
}
