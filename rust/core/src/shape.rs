// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid shape definitions.
//!
//! Only spheres and boolean composites carry parameters that the conversion
//! touches; every other solid is kept as an opaque type name.

use serde::{Deserialize, Serialize};

use crate::keys::ShapeKey;

/// Boolean operator of a composite shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    #[default]
    Union,
    Subtraction,
    Intersection,
}

/// A solid shape, stored in the arena and possibly shared.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeData {
    /// Spherical shell section, tessellated into `segments` × `z_slices` facets.
    Sphere {
        rmin: f64,
        rmax: f64,
        segments: u32,
        z_slices: u32,
    },
    /// Boolean combination of two operand shapes.
    Composite {
        op: BooleanOp,
        left: ShapeKey,
        right: ShapeKey,
    },
    /// Any other solid, identified by its type name.
    Other { type_name: String },
}

impl ShapeData {
    /// Default sphere tessellation of the source format.
    pub const DEFAULT_SPHERE_SEGMENTS: u32 = 20;
    pub const DEFAULT_SPHERE_Z_SLICES: u32 = 11;

    /// Creates a full sphere with the default tessellation.
    pub fn sphere(rmax: f64) -> Self {
        ShapeData::Sphere {
            rmin: 0.0,
            rmax,
            segments: Self::DEFAULT_SPHERE_SEGMENTS,
            z_slices: Self::DEFAULT_SPHERE_Z_SLICES,
        }
    }

    /// Creates an opaque shape.
    pub fn other(type_name: impl Into<String>) -> Self {
        ShapeData::Other {
            type_name: type_name.into(),
        }
    }

    /// Type name used in logs and exported extras.
    pub fn type_name(&self) -> &str {
        match self {
            ShapeData::Sphere { .. } => "TGeoSphere",
            ShapeData::Composite { .. } => "TGeoCompositeShape",
            ShapeData::Other { type_name } => type_name,
        }
    }

    /// Operand keys of a composite, `None` for primitive shapes.
    pub fn operands(&self) -> Option<(ShapeKey, ShapeKey)> {
        match self {
            ShapeData::Composite { left, right, .. } => Some((*left, *right)),
            _ => None,
        }
    }
}
