//! Bitfield describing which categories of a [`crate::SpaceEntity`] changed
//! as a result of applying a local or remote patch.

use bitflags::bitflags;

bitflags! {
    /// Passed to an entity's update callback after `apply_local_patch` /
    /// `apply_remote_patch` so observers don't have to diff the whole
    /// entity to find out what changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UpdateFlags: u32 {
        const NAME                 = 1 << 0;
        const POSITION             = 1 << 1;
        const ROTATION              = 1 << 2;
        const SCALE                 = 1 << 3;
        const COMPONENTS            = 1 << 4;
        const SELECTION             = 1 << 5;
        const THIRD_PARTY_REF       = 1 << 6;
        const THIRD_PARTY_PLATFORM  = 1 << 7;
        const PARENT                = 1 << 8;
    }
}
