// SPDX-License-Identifier: Unlicense

//! Simulated physical memory: a fixed array of frames plus a swap store.
//!
//! Out-of-range accesses and double evictions are bugs in the caller and
//! panic rather than return an error.

use crate::pager::{FrameIndex, Geometry, PageNumber, PhysAddr};

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use core::fmt::{Debug, Formatter, Write};
use core::ops::{Index, IndexMut};

use log::{debug, trace};

/// Contents of one memory location.
pub type Word = i32;

/// The words of one frame, or of one page saved in swap.
#[derive(Clone, PartialEq)]
pub struct Page(Box<[Word]>);

impl Page {
    /// A page of zeros.
    pub fn new(words: usize) -> Self {
        Self(vec![0; words].into_boxed_slice())
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Debug for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Page({:?})", &self.0[..])
    }
}

impl Index<usize> for Page {
    type Output = Word;

    fn index(&self, index: usize) -> &Self::Output {
        assert_lt!(index, self.len());
        &self.0[index]
    }
}

impl IndexMut<usize> for Page {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        assert_lt!(index, self.len());
        &mut self.0[index]
    }
}

/// Word-addressed physical memory backed by a swap store keyed by page number.
pub trait PhysicalMemory {
    /// Read the word at a physical address.
    fn read(&self, phys_addr: PhysAddr) -> Word;

    /// Write the word at a physical address.
    fn write(&mut self, phys_addr: PhysAddr, value: Word);

    /// Save the contents of a frame to swap as `page`.
    ///
    /// The page must not already be in swap.
    fn evict(&mut self, frame: FrameIndex, page: PageNumber);

    /// Move `page` from swap into a frame.
    ///
    /// If the page was never evicted the frame is left as it is.
    fn restore(&mut self, frame: FrameIndex, page: PageNumber);

    /// True iff `page` is currently held in swap.
    fn contains_swapped(&self, page: PageNumber) -> bool;
}

/// RAM and swap held on the heap.
pub struct Ram {
    geometry: Geometry,
    frames: Vec<Page>,
    swap: BTreeMap<PageNumber, Page>,
    evictions: u64,
}

impl Debug for Ram {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Ram(frames: {}, swapped: {}, evictions: {})",
            self.frames.len(),
            self.swap.len(),
            self.evictions
        )
    }
}

impl Ram {
    /// Zeroed frames and an empty swap store.
    pub fn new(geometry: Geometry) -> Self {
        let frames = (0..geometry.num_frames())
            .map(|_| Page::new(geometry.page_size() as usize))
            .collect();
        Self {
            geometry,
            frames,
            swap: BTreeMap::new(),
            evictions: 0,
        }
    }

    /// Zero every frame, empty swap and clear the eviction count.
    pub fn reset(&mut self) {
        *self = Self::new(self.geometry);
    }

    /// Geometry the memory was sized for.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Number of evictions since creation or reset.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Pages currently in swap, in ascending order.
    pub fn swapped_pages(&self) -> impl Iterator<Item = PageNumber> + '_ {
        self.swap.keys().copied()
    }

    /// Write every physical word as `address: value` lines.
    pub fn dump(&self, out: &mut impl Write) -> core::fmt::Result {
        for addr in 0..self.geometry.ram_size() {
            writeln!(out, "{}: {}", addr, self.read(PhysAddr::at(addr)))?;
        }
        Ok(())
    }

    fn locate(&self, phys_addr: PhysAddr) -> (usize, usize) {
        assert_lt!(phys_addr.get(), self.geometry.ram_size());
        (
            phys_addr.frame(&self.geometry) as usize,
            phys_addr.offset(&self.geometry) as usize,
        )
    }
}

impl PhysicalMemory for Ram {
    fn read(&self, phys_addr: PhysAddr) -> Word {
        let (frame, offset) = self.locate(phys_addr);
        self.frames[frame][offset]
    }

    fn write(&mut self, phys_addr: PhysAddr, value: Word) {
        let (frame, offset) = self.locate(phys_addr);
        trace!("write {} at {:?}", value, phys_addr);
        self.frames[frame][offset] = value;
    }

    fn evict(&mut self, frame: FrameIndex, page: PageNumber) {
        assert_lt!(frame, self.geometry.num_frames());
        assert_lt!(page, self.geometry.num_pages());
        assert!(
            !self.swap.contains_key(&page),
            "page {} is already in swap",
            page
        );
        debug!("evict page {} from frame {}", page, frame);
        self.swap.insert(page, self.frames[frame as usize].clone());
        self.evictions += 1;
    }

    fn restore(&mut self, frame: FrameIndex, page: PageNumber) {
        assert_lt!(frame, self.geometry.num_frames());
        if let Some(saved) = self.swap.remove(&page) {
            debug!("restore page {} to frame {}", page, frame);
            self.frames[frame as usize] = saved;
        }
    }

    fn contains_swapped(&self, page: PageNumber) -> bool {
        self.swap.contains_key(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ram() -> Ram {
        Ram::new(Geometry::new(2, 2, 4).expect("geometry"))
    }

    #[test]
    fn read_write() {
        let mut ram = ram();
        ram.write(PhysAddr::at(13), 42);
        assert_eq!(42, ram.read(PhysAddr::at(13)));
        assert_eq!(0, ram.read(PhysAddr::at(12)));
    }

    #[test]
    #[should_panic]
    fn out_of_range() {
        ram().read(PhysAddr::at(16));
    }

    #[test]
    fn evict_and_restore() {
        let mut ram = ram();
        ram.write(PhysAddr::at(9), 7);
        ram.evict(2, 1);
        assert!(ram.contains_swapped(1));
        assert_eq!(1, ram.evictions());

        ram.write(PhysAddr::at(9), 0);
        ram.restore(3, 1);
        assert!(!ram.contains_swapped(1));
        assert_eq!(7, ram.read(PhysAddr::at(13)));
        assert_none!(ram.swapped_pages().next());
    }

    #[test]
    fn restore_first_touch_leaves_frame() {
        let mut ram = ram();
        ram.write(PhysAddr::at(9), 5);
        ram.restore(2, 11);
        assert_eq!(5, ram.read(PhysAddr::at(9)));
    }

    #[test]
    #[should_panic]
    fn double_evict() {
        let mut ram = ram();
        ram.evict(2, 1);
        ram.evict(3, 1);
    }

    #[test]
    fn dump_and_reset() {
        let mut ram = ram();
        ram.write(PhysAddr::at(1), -3);
        ram.evict(1, 4);

        let mut out = String::new();
        assert_ok!(ram.dump(&mut out));
        assert_eq!(16, out.lines().count());
        assert_some_eq!(out.lines().nth(1), "1: -3");

        let geometry = *ram.geometry();
        ram.reset();
        assert_eq!(&geometry, ram.geometry());
        assert_eq!(0, ram.read(PhysAddr::at(1)));
        assert_eq!(0, ram.evictions());
        assert!(!ram.contains_swapped(4));
    }
}
