// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF JSON output document.
//!
//! Tables hold raw JSON records so that structural equality is plain
//! [`serde_json::Value`] equality: field-wise, order-sensitive for arrays,
//! key-set based for objects, exact for numbers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A glTF 2.0 document in JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub asset: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Value>,
    /// Any other top-level glTF property, kept as read.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self {
            asset: serde_json::json!({ "version": "2.0", "generator": Self::GENERATOR }),
            scene: None,
            scenes: Vec::new(),
            nodes: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            accessors: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl OutputDocument {
    pub const GENERATOR: &'static str = concat!("detgeo ", env!("CARGO_PKG_VERSION"));

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every material, mesh, accessor and node index resolves.
    pub fn validate_references(&self) -> Result<()> {
        for mesh in &self.meshes {
            for primitive in primitives(mesh) {
                if let Some(material) = primitive.get("material") {
                    check_index("materials", material, self.materials.len())?;
                }
                if let Some(Value::Object(attributes)) = primitive.get("attributes") {
                    for accessor in attributes.values() {
                        check_index("accessors", accessor, self.accessors.len())?;
                    }
                }
                if let Some(indices) = primitive.get("indices") {
                    check_index("accessors", indices, self.accessors.len())?;
                }
            }
        }
        for node in &self.nodes {
            if let Some(mesh) = node.get("mesh") {
                check_index("meshes", mesh, self.meshes.len())?;
            }
            if let Some(Value::Array(children)) = node.get("children") {
                for child in children {
                    check_index("nodes", child, self.nodes.len())?;
                }
            }
        }
        for scene in &self.scenes {
            if let Some(Value::Array(roots)) = scene.get("nodes") {
                for root in roots {
                    check_index("nodes", root, self.nodes.len())?;
                }
            }
        }
        if let Some(scene) = self.scene {
            if scene >= self.scenes.len() {
                return Err(Error::ReferenceConsistency {
                    table: "scenes",
                    index: scene as u64,
                    len: self.scenes.len(),
                });
            }
        }
        Ok(())
    }
}

/// Primitives of a mesh record; empty if the record has none.
pub(crate) fn primitives(mesh: &Value) -> impl Iterator<Item = &Value> {
    mesh.get("primitives")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn check_index(table: &'static str, value: &Value, len: usize) -> Result<()> {
    let index = value.as_u64().ok_or_else(|| {
        Error::MalformedDocument(format!("{table} reference {value} is not an index"))
    })?;
    if index as usize >= len {
        return Err(Error::ReferenceConsistency { table, index, len });
    }
    Ok(())
}
