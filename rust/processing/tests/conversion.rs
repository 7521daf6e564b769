// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end conversion of a small detector with a shared station volume.

use detgeo_core::{read_geometry_json, PathMode, VisFlags};
use detgeo_geometry::{select_subpart, set_invisible_recursively, PatternSet};
use detgeo_processing::{
    deduplicate, filter_scene, BuildLimits, ConversionConfig, Converter, SceneBuilder,
    VolumeSceneBuilder,
};

/// `World` places the shared `Station` volume twice (`S1`, `S2`), and `Calo`
/// once. `Station` holds one `Module` placement `M_0`.
const DETECTOR: &str = r#"{
    "top": { "name": "World_1", "volume": 0 },
    "shapes": [
        { "type": "other", "id": 0, "typeName": "TGeoBBox" },
        { "type": "sphere", "id": 1, "rmax": 1.0 },
        { "type": "other", "id": 2, "typeName": "TGeoTube" }
    ],
    "volumes": [
        { "id": 0, "name": "World", "shape": 0,
          "nodes": [
              { "name": "S1", "volume": 1 },
              { "name": "S2", "volume": 1 },
              { "name": "Calo", "volume": 3 }
          ] },
        { "id": 1, "name": "Station", "shape": 0, "color": 3,
          "nodes": [ { "name": "M_0", "volume": 2 } ] },
        { "id": 2, "name": "Module", "shape": 1, "color": 2 },
        { "id": 3, "name": "CaloVol", "shape": 2, "color": 4,
          "nodes": [ { "name": "Cell", "volume": 2 } ] }
    ]
}"#;

#[test]
fn shared_volume_branch_is_removed_by_post_filter() {
    let mut arena = read_geometry_json(DETECTOR).unwrap();
    let top = arena.require_top().unwrap();
    let patterns = PatternSet::prefixes(["World/S1/M_0"]);

    set_invisible_recursively(&mut arena, top);
    assert!(select_subpart(&mut arena, top, &patterns, PathMode::FullPath).unwrap());
    let world = arena.top_volume().unwrap();
    arena.volume_mut(world).unwrap().vis.insert(VisFlags::DAUGHTERS);

    let mut builder = VolumeSceneBuilder::default();
    let mut root = builder.build(&arena, &BuildLimits::default()).unwrap();

    // Station is pass-through for both placements, so the raw scene has S2.
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["S1", "S2"]);

    assert!(filter_scene(&mut root, &patterns, PathMode::FullPath));
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["S1"]);
    assert_eq!(root.children[0].children[0].name, "M_0");

    let once = root.clone();
    assert!(filter_scene(&mut root, &patterns, PathMode::FullPath));
    assert_eq!(root, once);
}

#[test]
fn every_kept_node_matches_or_leads_to_a_match() {
    let mut arena = read_geometry_json(DETECTOR).unwrap();
    let config = ConversionConfig::from_json(
        r#"{
            "full_path": true,
            "subparts": [ { "name": "Station 1", "patterns": ["World/S1"] } ]
        }"#,
    )
    .unwrap();
    let output = Converter::new(config).unwrap().convert(&mut arena).unwrap();

    let doc = &output.document;
    let names: Vec<&str> = doc
        .nodes
        .iter()
        .filter_map(|n| n.get("name").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(names, ["World", "S1", "M_0"]);
}

#[test]
fn converts_subparts_and_collapses_shared_records() {
    let mut arena = read_geometry_json(DETECTOR).unwrap();
    let config = ConversionConfig::from_json(
        r#"{
            "subparts": [
                { "name": "Muon > Stations", "patterns": ["S"], "visibility": true },
                { "name": "Calo", "patterns": ["Calo"], "visibility": 0.25 },
                { "name": "Reserved", "patterns": ["Rich"], "visibility": false }
            ]
        }"#,
    )
    .unwrap();

    let output = Converter::new(config).unwrap().convert(&mut arena).unwrap();
    let doc = &output.document;
    let report = &output.report;

    assert_eq!(doc.scene, Some(0));
    assert_eq!(doc.scenes.len(), 3);
    assert_eq!(doc.scenes[0]["name"], "Muon > Stations");
    assert_eq!(doc.scenes[1]["extras"]["opacity"], 0.25);
    assert_eq!(doc.scenes[2]["extras"]["visible"], false);
    assert_eq!(report.empty_subparts, ["Reserved"]);

    // Station twice, Module three times (two stations and Calo's cell), CaloVol once.
    assert_eq!(report.dedup.meshes_before, 6);
    // Distinct meshes: Station, Module, CaloVol.
    assert_eq!(doc.meshes.len(), 3);
    // Distinct colours: 3, 2, 4.
    assert_eq!(doc.materials.len(), 3);
    doc.validate_references().unwrap();

    // Module was simplified when it became visible.
    let module = doc
        .meshes
        .iter()
        .find(|m| m["name"] == "Module")
        .unwrap();
    assert_eq!(module["extras"]["faces"], 18);
}

#[test]
fn pruning_happens_once_before_subparts() {
    let mut arena = read_geometry_json(DETECTOR).unwrap();
    let config = ConversionConfig::from_json(
        r#"{
            "max_level": 1,
            "hidden_patterns": ["Calo"],
            "subparts": [ { "name": "All", "patterns": ["S1", "S2", "Calo", "M_0"] } ]
        }"#,
    )
    .unwrap();

    let output = Converter::new(config).unwrap().convert(&mut arena).unwrap();
    assert_eq!(output.report.prune.removed, 2);
    // World, S1, S2; modules sat at level 1.
    assert_eq!(output.report.subparts[0].nodes, 3);
    assert_eq!(arena.children(arena.top_volume().unwrap()).len(), 2);
}

#[test]
fn deduplicated_output_is_stable() {
    let mut arena = read_geometry_json(DETECTOR).unwrap();
    let config = ConversionConfig::from_json(
        r#"{ "subparts": [ { "name": "All", "patterns": ["S1", "S2", "Calo"] } ] }"#,
    )
    .unwrap();
    let output = Converter::new(config).unwrap().convert(&mut arena).unwrap();

    let mut again = output.document.clone();
    let stats = deduplicate(&mut again).unwrap();
    assert_eq!(again, output.document);
    assert_eq!(stats.meshes_removed(), 0);
    assert_eq!(stats.materials_removed(), 0);
}

#[test]
fn pattern_prefixing_the_top_name_still_filters_shared_branches() {
    let mut arena = read_geometry_json(
        r#"{
            "top": { "name": "World_1", "volume": 0 },
            "shapes": [ { "type": "other", "id": 0, "typeName": "TGeoBBox" } ],
            "volumes": [
                { "id": 0, "name": "World", "shape": 0,
                  "nodes": [ { "name": "Wheel", "volume": 1 }, { "name": "Other", "volume": 1 } ] },
                { "id": 1, "name": "Station", "shape": 0,
                  "nodes": [ { "name": "M_0", "volume": 2 } ] },
                { "id": 2, "name": "Module", "shape": 0 }
            ]
        }"#,
    )
    .unwrap();
    let config = ConversionConfig::from_json(
        r#"{ "subparts": [ { "name": "Wheel", "patterns": ["W"] } ] }"#,
    )
    .unwrap();

    let output = Converter::new(config).unwrap().convert(&mut arena).unwrap();
    let names: Vec<&str> = output
        .document
        .nodes
        .iter()
        .filter_map(|n| n.get("name").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(names, ["World", "Wheel", "M_0"]);
}
