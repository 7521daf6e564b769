// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Volume visibility attribute bits.

use bitflags::bitflags;

bitflags! {
    /// Visibility attribute bitfield of a volume.
    ///
    /// The two named bits are independent. Bits this crate does not know
    /// about are kept as read so they survive a round trip.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VisFlags: u32 {
        /// Render the volume's own shape.
        const THIS = 0x80;
        /// Keep the volume as a pass-through ancestor of something visible.
        const DAUGHTERS = 0x08;

        const _ = !0;
    }
}

impl VisFlags {
    /// Builds flags from the two booleans.
    pub fn from_bools(this: bool, daughters: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::THIS, this);
        flags.set(Self::DAUGHTERS, daughters);
        flags
    }

    /// Returns `true` if either named bit is set.
    pub fn is_drawn_or_traversed(self) -> bool {
        self.intersects(Self::THIS | Self::DAUGHTERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_values_match_source_format() {
        assert_eq!(VisFlags::THIS.bits(), 0x80);
        assert_eq!(VisFlags::DAUGHTERS.bits(), 0x08);
    }

    #[test]
    fn unknown_bits_are_retained() {
        let mut flags = VisFlags::from_bits_retain(0x80 | 0x4000);
        flags.remove(VisFlags::THIS);
        assert_eq!(flags.bits(), 0x4000);
        assert!(!flags.is_drawn_or_traversed());
    }

    #[test]
    fn from_bools_sets_independent_bits() {
        let flags = VisFlags::from_bools(false, true);
        assert!(!flags.contains(VisFlags::THIS));
        assert!(flags.contains(VisFlags::DAUGHTERS));
        assert!(flags.is_drawn_or_traversed());
    }
}
