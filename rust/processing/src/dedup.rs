// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record deduplication for exported documents.
//!
//! Two passes in fixed order: materials first, then meshes compared as they
//! stand after the material references were rewritten. Each pass keeps the
//! first occurrence of every distinct record, in first-seen order, and maps
//! later duplicates onto it.
//!
//! Records are bucketed by a content hash of their canonical form and only
//! compared field-wise within a bucket, so a pass is linear in the table
//! size for distinct records.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};
use serde_json::Value;

use crate::document::OutputDocument;
use crate::error::{Error, Result};

/// Record counts before and after deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub materials_before: usize,
    pub materials_after: usize,
    pub meshes_before: usize,
    pub meshes_after: usize,
}

impl DedupStats {
    pub fn materials_removed(&self) -> usize {
        self.materials_before - self.materials_after
    }

    pub fn meshes_removed(&self) -> usize {
        self.meshes_before - self.meshes_after
    }
}

/// Collapses structurally identical materials and meshes, rewriting every
/// reference to them, then checks that all references resolve.
pub fn deduplicate(document: &mut OutputDocument) -> Result<DedupStats> {
    let mut stats = DedupStats {
        materials_before: document.materials.len(),
        meshes_before: document.meshes.len(),
        ..DedupStats::default()
    };

    let material_map = compact(&mut document.materials);
    stats.materials_after = document.materials.len();
    for mesh in &mut document.meshes {
        rewrite_material_refs(mesh, &material_map)?;
    }

    let mesh_map = compact(&mut document.meshes);
    stats.meshes_after = document.meshes.len();
    for record in document
        .nodes
        .iter_mut()
        .chain(document.scenes.iter_mut())
        .chain(document.extra.values_mut())
    {
        rewrite_mesh_refs(record, &mesh_map)?;
    }

    document.validate_references()?;

    tracing::debug!(
        materials_removed = stats.materials_removed(),
        meshes_removed = stats.meshes_removed(),
        "Deduplicated output records"
    );
    Ok(stats)
}

/// Removes duplicate records in place, keeping first occurrences in order.
/// Returns the old-index to new-index map.
fn compact(records: &mut Vec<Value>) -> Vec<usize> {
    let mut buckets: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
    let mut kept: Vec<Value> = Vec::with_capacity(records.len());
    let mut map = Vec::with_capacity(records.len());

    for record in records.drain(..) {
        let bucket = buckets.entry(content_hash(&record)).or_default();
        match bucket.iter().copied().find(|&k| kept[k] == record) {
            Some(existing) => map.push(existing),
            None => {
                let index = kept.len();
                bucket.push(index);
                kept.push(record);
                map.push(index);
            }
        }
    }

    *records = kept;
    map
}

fn content_hash(value: &Value) -> u64 {
    let mut hasher = FxHasher::default();
    hash_value(value, &mut hasher);
    hasher.finish()
}

/// Hashes the canonical form of `value`: object keys in sorted order and
/// numbers by kind and value, so equal values hash equally.
fn hash_value(value: &Value, hasher: &mut FxHasher) {
    match value {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Number(n) => {
            2u8.hash(hasher);
            if let Some(u) = n.as_u64() {
                0u8.hash(hasher);
                u.hash(hasher);
            } else if let Some(i) = n.as_i64() {
                1u8.hash(hasher);
                i.hash(hasher);
            } else if let Some(f) = n.as_f64() {
                // -0.0 and 0.0 compare equal.
                2u8.hash(hasher);
                (f + 0.0).to_bits().hash(hasher);
            }
        }
        Value::String(s) => {
            3u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Array(items) => {
            4u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Object(map) => {
            5u8.hash(hasher);
            map.len().hash(hasher);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            for key in keys {
                key.hash(hasher);
                hash_value(&map[key.as_str()], hasher);
            }
        }
    }
}

fn remap(table: &'static str, value: &mut Value, map: &[usize]) -> Result<()> {
    let index = value.as_u64().ok_or_else(|| {
        Error::MalformedDocument(format!("{table} reference {value} is not an index"))
    })?;
    let target = map
        .get(index as usize)
        .copied()
        .ok_or(Error::ReferenceConsistency {
            table,
            index,
            len: map.len(),
        })?;
    *value = Value::from(target);
    Ok(())
}

fn rewrite_material_refs(mesh: &mut Value, map: &[usize]) -> Result<()> {
    let Some(Value::Array(primitives)) = mesh.get_mut("primitives") else {
        return Ok(());
    };
    for primitive in primitives {
        if let Some(material) = primitive.get_mut("material") {
            remap("materials", material, map)?;
        }
    }
    Ok(())
}

/// Rewrites every integer `"mesh"` field at any depth below `value`.
fn rewrite_mesh_refs(value: &mut Value, map: &[usize]) -> Result<()> {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields.iter_mut() {
                if key == "mesh" && field.is_u64() {
                    remap("meshes", field, map)?;
                } else {
                    rewrite_mesh_refs(field, map)?;
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_mesh_refs(item, map)?;
            }
        }
        _ => {}
    }
    Ok(())
}
