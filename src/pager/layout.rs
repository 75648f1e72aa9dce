// SPDX-License-Identifier: Unlicense

//! Geometry of the simulated virtual and physical memory.
//!
//! All sizes are in words. A page and a frame hold `page_size()` words, and a
//! page table is one frame whose words are child frame indices, so the table
//! fan-out is the same as the page size.

use super::{FrameIndex, PageNumber};
use crate::device::ram::Word;
use crate::{Error, Result};

use log::warn;

/// Widest virtual address supported, in bits.
const MAX_ADDRESS_WIDTH: u32 = 63;

/// Fixed parameters of a simulation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    offset_width: u32,
    depth: u32,
    num_frames: u64,
    virtual_width: u32,
}

impl Default for Geometry {
    /// 16-word pages, 64 frames, 2^20 words of virtual memory in four levels.
    fn default() -> Self {
        Self {
            offset_width: 4,
            depth: 4,
            num_frames: 64,
            virtual_width: 20,
        }
    }
}

impl Geometry {
    /// A tree of `depth` full levels of tables with `2^offset_width` entries each.
    pub fn new(offset_width: u32, depth: u32, num_frames: u64) -> Result<Self> {
        let virtual_width = depth
            .checked_add(1)
            .and_then(|levels| levels.checked_mul(offset_width))
            .ok_or(Error::InvalidGeometry)?;
        Self {
            offset_width,
            depth,
            num_frames,
            virtual_width,
        }
        .validated()
    }

    /// Geometry from address widths in bits.
    ///
    /// The number of levels is the fewest that cover the page number, so the
    /// root table may only use part of its entries.
    pub fn from_widths(offset_width: u32, physical_width: u32, virtual_width: u32) -> Result<Self> {
        if offset_width == 0
            || physical_width < offset_width
            || virtual_width <= offset_width
            || physical_width - offset_width >= MAX_ADDRESS_WIDTH
        {
            warn!(
                "rejecting widths: offset {}, physical {}, virtual {}",
                offset_width, physical_width, virtual_width
            );
            return Err(Error::InvalidGeometry);
        }
        let page_number_width = virtual_width - offset_width;
        Self {
            offset_width,
            depth: (page_number_width + offset_width - 1) / offset_width,
            num_frames: 1u64 << (physical_width - offset_width),
            virtual_width,
        }
        .validated()
    }

    fn validated(self) -> Result<Self> {
        let valid = self.offset_width > 0
            && self.depth > 0
            && self.num_frames > 0
            && self.virtual_width > self.offset_width
            && self.virtual_width <= MAX_ADDRESS_WIDTH
            && self.tree_covers_page_number()
            && self.num_frames - 1 <= Word::MAX as u64
            && self.num_frames.checked_mul(self.page_size()).is_some();
        if valid {
            Ok(self)
        } else {
            warn!("rejecting {:?}", self);
            Err(Error::InvalidGeometry)
        }
    }

    /// Levels reach every page-number bit and the root level is not wholly unused.
    fn tree_covers_page_number(&self) -> bool {
        let page_number_width = self.virtual_width - self.offset_width;
        let levels_width = self.depth as u64 * self.offset_width as u64;
        levels_width >= page_number_width as u64
            && levels_width - (self.offset_width as u64) < page_number_width as u64
    }

    /// Bits of the page offset, and of each table index.
    pub const fn offset_width(&self) -> u32 {
        self.offset_width
    }

    /// Number of table levels between the root and a data page.
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Words in a page, frame, or table; the table fan-out.
    pub const fn page_size(&self) -> u64 {
        1 << self.offset_width
    }

    /// Frames of physical memory, including the root table.
    pub const fn num_frames(&self) -> FrameIndex {
        self.num_frames
    }

    /// Words of virtual memory.
    pub const fn virtual_memory_size(&self) -> u64 {
        1 << self.virtual_width
    }

    /// Pages of virtual memory.
    pub const fn num_pages(&self) -> PageNumber {
        1 << (self.virtual_width - self.offset_width)
    }

    /// Words of physical memory.
    pub const fn ram_size(&self) -> u64 {
        self.num_frames << self.offset_width
    }
}
