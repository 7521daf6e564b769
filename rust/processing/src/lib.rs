// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! detgeo Processing
//!
//! Turns a pruned, visibility-marked geometry DAG into a glTF document with
//! one scene per configured subpart.
//!
//! ```rust,no_run
//! use detgeo_core::read_geometry_json;
//! use detgeo_processing::{ConversionConfig, Converter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut arena = read_geometry_json(&std::fs::read_to_string("geometry.json")?)?;
//! let config = ConversionConfig::from_json(&std::fs::read_to_string("config.json")?)?;
//! let output = Converter::new(config)?.convert(&mut arena)?;
//! std::fs::write("detector.gltf", output.document.to_json()?)?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod converter;
pub mod dedup;
pub mod document;
pub mod error;
pub mod exporter;
pub mod scene;

pub use builder::{palette_color, SceneBuilder, VolumeSceneBuilder};
pub use config::{BuildLimits, ConversionConfig, SubpartSpec, SubpartVisibility};
pub use converter::{ConversionOutput, ConversionReport, Converter, SubpartReport};
pub use dedup::{deduplicate, DedupStats};
pub use document::OutputDocument;
pub use error::{Error, Result};
pub use exporter::GltfExporter;
pub use scene::{filter_scene, MaterialSpec, Scene, SceneMesh, SceneNode};
