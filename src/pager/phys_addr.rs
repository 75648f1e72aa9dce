// SPDX-License-Identifier: Unlicense

use super::{FrameIndex, Geometry};

use core::fmt::{Debug, Error, Formatter};

/// A word address in the simulated physical memory.
#[derive(Copy, Clone, PartialOrd, PartialEq)]
pub struct PhysAddr(u64);

impl Debug for PhysAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "PhysAddr(0x{:08x})", self.0)
    }
}

impl PhysAddr {
    /// Construct at literal address.
    pub const fn at(addr: u64) -> Self {
        Self(addr)
    }

    /// Word `index` of a frame.
    pub const fn in_frame(geometry: &Geometry, frame: FrameIndex, index: u64) -> Self {
        Self(frame * geometry.page_size() + index)
    }

    /// Get address as an integer.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Frame containing this address.
    pub const fn frame(self, geometry: &Geometry) -> FrameIndex {
        self.0 >> geometry.offset_width()
    }

    /// Word within the frame.
    pub const fn offset(self, geometry: &Geometry) -> u64 {
        self.0 & (geometry.page_size() - 1)
    }

    /// True iff the address is inside physical memory.
    pub const fn is_within(self, geometry: &Geometry) -> bool {
        self.0 < geometry.ram_size()
    }
}
