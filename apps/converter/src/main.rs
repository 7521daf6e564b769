// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! detgeo converter - detector geometry to multi-scene glTF.
//!
//! Reads a geometry description and a conversion config, then writes one
//! glTF document with a scene per configured subpart:
//!
//! ```text
//! detgeo-converter lhcb.json -o lhcb.gltf --config subparts.json --max-level 7
//! ```
//!
//! Command-line flags override the matching config file values. The output
//! file is written only once the whole conversion has succeeded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use detgeo_core::read_geometry_json;
use detgeo_processing::{ConversionConfig, Converter};

#[derive(Parser)]
#[command(name = "detgeo-converter")]
#[command(about = "Convert detector geometry into a multi-scene glTF document")]
#[command(version)]
struct Cli {
    /// Geometry description (.json)
    input: PathBuf,

    /// Output glTF file
    #[arg(short, long)]
    output: PathBuf,

    /// Conversion config (.json); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prune placements at this level or deeper
    #[arg(long)]
    max_level: Option<usize>,

    /// Match patterns against full slash-joined paths
    #[arg(long)]
    full_path: bool,

    /// Circle tessellation used when building meshes
    #[arg(long)]
    faces_per_circle: Option<u32>,

    /// Name of the volume to convert instead of the file's top
    #[arg(long)]
    object: Option<String>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli).await?;

    tracing::info!(input = %cli.input.display(), "Reading geometry");
    let content = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let mut arena = read_geometry_json(&content)
        .with_context(|| format!("failed to parse geometry in {}", cli.input.display()))?;
    if let Some(object) = &cli.object {
        arena.set_top_object(object)?;
    }
    tracing::info!(
        volumes = arena.volume_count(),
        placements = arena.node_count(),
        "Geometry loaded"
    );

    let output = Converter::new(config)?.convert(&mut arena)?;
    for name in &output.report.empty_subparts {
        tracing::warn!(subpart = %name, "Scene is empty");
    }

    let json = if cli.pretty {
        output.document.to_json_pretty()?
    } else {
        output.document.to_json()?
    };
    tokio::fs::write(&cli.output, json)
        .await
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    tracing::info!(
        output = %cli.output.display(),
        scenes = output.document.scenes.len(),
        meshes = output.document.meshes.len(),
        materials = output.document.materials.len(),
        materials_removed = output.report.dedup.materials_removed(),
        meshes_removed = output.report.dedup.meshes_removed(),
        "Wrote glTF"
    );
    Ok(())
}

async fn load_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            ConversionConfig::from_json(&content)
                .with_context(|| format!("invalid config in {}", path.display()))?
        }
        None => ConversionConfig::default(),
    };

    if let Some(max_level) = cli.max_level {
        config.max_level = max_level;
    }
    if cli.full_path {
        config.full_path = true;
    }
    if let Some(faces) = cli.faces_per_circle {
        config.faces_per_circle = faces;
    }
    config.validate()?;

    if config.subparts.is_empty() {
        tracing::warn!("No subparts configured, the document will have no scenes");
    }
    Ok(config)
}
