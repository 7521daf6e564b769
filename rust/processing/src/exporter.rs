// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF JSON export of built scenes.
//!
//! Every mesh-bearing node gets its own mesh and material record, the way a
//! generic scene exporter writes them; identical records are collapsed later
//! by [`crate::dedup`]. Geometry is shared per source shape: all meshes built
//! from one shape point at one accessor.

use rustc_hash::FxHashMap;
use serde_json::{json, Value};

use detgeo_core::ShapeKey;

use crate::document::OutputDocument;
use crate::scene::{Scene, SceneMesh, SceneNode};

const COMPONENT_TYPE_FLOAT: u32 = 5126;
const MODE_TRIANGLES: u32 = 4;

/// Writes a list of scenes into one multi-scene document.
#[derive(Debug, Default)]
pub struct GltfExporter {
    document: OutputDocument,
    accessor_by_shape: FxHashMap<ShapeKey, usize>,
}

impl GltfExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exports `scenes` in order. The first scene is the default one.
    pub fn export(scenes: &[Scene]) -> OutputDocument {
        let mut exporter = Self::new();
        for scene in scenes {
            exporter.add_scene(scene);
        }
        exporter.finish()
    }

    /// Appends one scene with its `{visible, opacity?}` metadata.
    pub fn add_scene(&mut self, scene: &Scene) {
        let roots: Vec<usize> = scene
            .root
            .iter()
            .map(|root| self.add_node(root))
            .collect();
        self.document.scenes.push(json!({
            "name": scene.name,
            "nodes": roots,
            "extras": scene.visibility.to_extras(),
        }));
    }

    pub fn finish(mut self) -> OutputDocument {
        if !self.document.scenes.is_empty() {
            self.document.scene = Some(0);
        }
        self.document
    }

    /// Writes `node` and its subtree, returning its index. Parents are written
    /// before their children.
    fn add_node(&mut self, node: &SceneNode) -> usize {
        let index = self.document.nodes.len();
        self.document.nodes.push(Value::Null);

        let mut record = serde_json::Map::new();
        if !node.name.is_empty() {
            record.insert("name".into(), node.name.clone().into());
        }
        if let Some(mesh) = &node.mesh {
            record.insert("mesh".into(), self.add_mesh(mesh).into());
        }
        let children: Vec<usize> = node.children.iter().map(|c| self.add_node(c)).collect();
        if !children.is_empty() {
            record.insert("children".into(), children.into());
        }

        self.document.nodes[index] = Value::Object(record);
        index
    }

    fn add_mesh(&mut self, mesh: &SceneMesh) -> usize {
        let accessor = self.accessor_for(mesh);

        let material = self.document.materials.len();
        let [r, g, b, a] = mesh.material.base_color;
        self.document.materials.push(json!({
            "pbrMetallicRoughness": {
                "baseColorFactor": [r, g, b, a],
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0,
            },
            "doubleSided": mesh.material.double_sided,
        }));

        let index = self.document.meshes.len();
        self.document.meshes.push(json!({
            "name": mesh.name,
            "primitives": [{
                "attributes": { "POSITION": accessor },
                "material": material,
                "mode": MODE_TRIANGLES,
            }],
            "extras": {
                "shape": mesh.shape_type,
                "faces": mesh.face_count,
            },
        }));
        index
    }

    fn accessor_for(&mut self, mesh: &SceneMesh) -> usize {
        if let Some(&accessor) = self.accessor_by_shape.get(&mesh.shape) {
            return accessor;
        }
        let accessor = self.document.accessors.len();
        self.document.accessors.push(json!({
            "componentType": COMPONENT_TYPE_FLOAT,
            "count": mesh.vertex_count,
            "type": "VEC3",
        }));
        self.accessor_by_shape.insert(mesh.shape, accessor);
        accessor
    }
}
