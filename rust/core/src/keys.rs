// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based geometry storage.
//!
//! Keys are created by `slotmap::SlotMap` and stay valid for the lifetime of
//! the arena. Two placements holding the same [`VolumeKey`] share that volume.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a placement of a volume inside its mother volume.
    pub struct NodeKey;

    /// Key for a reusable logical volume.
    pub struct VolumeKey;

    /// Key for a solid shape, possibly shared between volumes.
    pub struct ShapeKey;
}
