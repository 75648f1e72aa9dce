// SPDX-License-Identifier: Unlicense

//! Type-checked virtual addresses, and their decomposition into page number,
//! per-level table indices, and page offset.

use super::{Geometry, PageNumber};

use core::fmt::{Debug, Error, Formatter};

/// A word address in the simulated virtual memory.
#[derive(Copy, Clone, PartialOrd, PartialEq)]
pub struct VirtAddr(u64);

impl Debug for VirtAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "VirtAddr(0x{:08x})", self.0)
    }
}

impl VirtAddr {
    /// Construct at literal address.
    pub const fn at(addr: u64) -> Self {
        Self(addr)
    }

    /// Get the address as an integer.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// True iff the address is inside the virtual memory.
    pub const fn is_within(self, geometry: &Geometry) -> bool {
        self.0 < geometry.virtual_memory_size()
    }

    /// All bits above the offset.
    pub const fn page_number(self, geometry: &Geometry) -> PageNumber {
        self.0 >> geometry.offset_width()
    }

    /// Word within the page.
    pub const fn offset(self, geometry: &Geometry) -> u64 {
        self.0 & (geometry.page_size() - 1)
    }
}

impl Geometry {
    /// Index into the table at `level` (0 is the root) on the way to `page`.
    ///
    /// The root takes the most significant field of the page number.
    pub const fn level_index(&self, page: PageNumber, level: u32) -> u64 {
        let shift = (self.depth() - 1 - level) * self.offset_width();
        (page >> shift) & (self.page_size() - 1)
    }

    /// Distance between two pages on a ring of all page numbers.
    pub fn cyclic_distance(&self, page1: PageNumber, page2: PageNumber) -> u64 {
        let direct = if page1 > page2 {
            page1 - page2
        } else {
            page2 - page1
        };
        core::cmp::min(direct, self.num_pages() - direct)
    }
}
