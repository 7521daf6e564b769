// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion configuration.
//!
//! Loaded from JSON:
//!
//! ```json
//! {
//!   "max_level": 7,
//!   "hidden_patterns": ["BeamPipe", { "regex": "Supports?$" }],
//!   "full_path": false,
//!   "faces_per_circle": 24,
//!   "build": { "max_faces": 10000000, "max_nodes": 500000, "vis_level": 10 },
//!   "subparts": [
//!     { "name": "Trackers > VELO", "patterns": ["Velo"], "visibility": true },
//!     { "name": "Calorimeters > ECAL", "patterns": ["Ecal"], "visibility": 0.3 }
//!   ]
//! }
//! ```
//!
//! Subpart names use `" > "` between menu levels and are exported verbatim
//! as scene names. Subparts are processed in the order listed.

use detgeo_geometry::{PathMode, PatternSet};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default visibility of a subpart in the event display menu.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(try_from = "VisibilityRecord")]
pub enum SubpartVisibility {
    Hidden,
    #[default]
    Visible,
    /// Visible with the given opacity in `[0, 1]`.
    VisibleWithOpacity(f64),
}

/// Config form: `false`, `true`, or an opacity number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VisibilityRecord {
    Flag(bool),
    Opacity(f64),
}

impl TryFrom<VisibilityRecord> for SubpartVisibility {
    type Error = Error;

    fn try_from(record: VisibilityRecord) -> Result<Self> {
        match record {
            VisibilityRecord::Flag(true) => Ok(SubpartVisibility::Visible),
            VisibilityRecord::Flag(false) => Ok(SubpartVisibility::Hidden),
            VisibilityRecord::Opacity(opacity) => SubpartVisibility::with_opacity(opacity),
        }
    }
}

impl SubpartVisibility {
    /// Visible with the given opacity; rejects values outside `[0, 1]`.
    pub fn with_opacity(opacity: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&opacity) {
            Ok(SubpartVisibility::VisibleWithOpacity(opacity))
        } else {
            Err(Error::InvalidConfig(format!(
                "opacity {opacity} is outside [0, 1]"
            )))
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, SubpartVisibility::Hidden)
    }

    pub fn opacity(&self) -> Option<f64> {
        match self {
            SubpartVisibility::VisibleWithOpacity(opacity) => Some(*opacity),
            _ => None,
        }
    }

    /// Scene metadata: `{"visible": bool}` plus `"opacity"` when set.
    pub fn to_extras(&self) -> serde_json::Value {
        let mut extras = serde_json::Map::new();
        extras.insert("visible".into(), self.is_visible().into());
        if let Some(opacity) = self.opacity() {
            extras.insert("opacity".into(), opacity.into());
        }
        serde_json::Value::Object(extras)
    }
}

/// One named subpart.
#[derive(Debug, Clone, Deserialize)]
pub struct SubpartSpec {
    pub name: String,
    pub patterns: PatternSet,
    #[serde(default)]
    pub visibility: SubpartVisibility,
}

impl SubpartSpec {
    pub fn new(name: impl Into<String>, patterns: PatternSet, visibility: SubpartVisibility) -> Self {
        Self {
            name: name.into(),
            patterns,
            visibility,
        }
    }
}

/// Limits handed to the scene builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildLimits {
    /// Total face budget for one scene.
    pub max_faces: usize,
    /// Node budget for one scene.
    pub max_nodes: usize,
    /// Deepest level the builder descends to; the top's children are level 0.
    pub vis_level: usize,
}

impl Default for BuildLimits {
    fn default() -> Self {
        Self {
            max_faces: 10_000_000,
            max_nodes: 500_000,
            vis_level: 10,
        }
    }
}

/// Full conversion configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Placements at this level or deeper are pruned.
    pub max_level: usize,
    /// Subtrees to drop entirely before any subpart is processed.
    pub hidden_patterns: PatternSet,
    /// Ordered subparts, one scene each.
    pub subparts: Vec<SubpartSpec>,
    /// Match full slash-joined paths instead of bare placement names.
    pub full_path: bool,
    /// Circle tessellation used by the scene builder.
    pub faces_per_circle: u32,
    pub build: BuildLimits,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_level: 999,
            hidden_patterns: PatternSet::new(),
            subparts: Vec::new(),
            full_path: false,
            // 15 degrees per segment.
            faces_per_circle: 24,
            build: BuildLimits::default(),
        }
    }
}

impl ConversionConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.faces_per_circle < 3 {
            return Err(Error::InvalidConfig(format!(
                "faces_per_circle must be at least 3, got {}",
                self.faces_per_circle
            )));
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for spec in &self.subparts {
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate subpart name '{}'",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    pub fn path_mode(&self) -> PathMode {
        PathMode::from(self.full_path)
    }
}
