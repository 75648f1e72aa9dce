// SPDX-License-Identifier: Unlicense

//! Managing virtual address space, address translation and page faults.
//!
//! Page tables live in simulated physical memory, rooted at frame 0. Each
//! table is one frame whose words are child frame indices, with 0 meaning
//! unmapped. Tables and pages are faulted in on first access, and when memory
//! is full a resident page is evicted to swap.

mod audit;
mod frames;
mod layout;
mod phys_addr;
mod translation;
mod virt_addr;

pub use audit::Resident;
pub use frames::{select, ReclaimKind, Slot, Victim};
pub use layout::Geometry;
pub use phys_addr::PhysAddr;
pub use virt_addr::VirtAddr;

use crate::device::ram::{PhysicalMemory, Ram, Word};
use crate::{Error, Result};
use translation::Translator;

use enum_map::EnumMap;
use log::{debug, info, warn};

/// Index of a frame of physical memory.
pub type FrameIndex = u64;

/// Index of a page of virtual memory.
pub type PageNumber = u64;

/// Frame holding the root table, which is never reclaimed.
pub const ROOT_FRAME: FrameIndex = 0;

/// Counts of page faults by how they were satisfied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    /// Faults satisfied, at any level.
    pub faults: u64,
    /// Faults satisfied, by kind of frame taken.
    pub reclaimed: EnumMap<ReclaimKind, u64>,
}

/// Virtual memory over a physical memory.
pub struct Pager<M: PhysicalMemory> {
    geometry: Geometry,
    memory: M,
    initialised: bool,
    stats: Stats,
}

impl Pager<Ram> {
    /// Pager over freshly zeroed RAM.
    pub fn with_ram(geometry: Geometry) -> Self {
        Self::new(geometry, Ram::new(geometry))
    }
}

impl<M: PhysicalMemory> Pager<M> {
    /// Pager over existing memory. Must be initialised before use.
    pub fn new(geometry: Geometry, memory: M) -> Self {
        Self {
            geometry,
            memory,
            initialised: false,
            stats: Stats::default(),
        }
    }

    /// Clear the root table, unmapping every page.
    pub fn initialize(&mut self) {
        info!("initialize: {:?}", self.geometry);
        for index in 0..self.geometry.page_size() {
            self.memory
                .write(PhysAddr::in_frame(&self.geometry, ROOT_FRAME, index), 0);
        }
        self.initialised = true;
    }

    /// Read the word at a virtual address.
    pub fn read(&mut self, virt_addr: VirtAddr) -> Result<Word> {
        let phys_addr = self.translate(virt_addr)?;
        let value = self.memory.read(phys_addr);
        debug!("read {:?}: {}", virt_addr, value);
        Ok(value)
    }

    /// Write the word at a virtual address.
    pub fn write(&mut self, virt_addr: VirtAddr, value: Word) -> Result<()> {
        let phys_addr = self.translate(virt_addr)?;
        debug!("write {:?}: {}", virt_addr, value);
        self.memory.write(phys_addr, value);
        Ok(())
    }

    fn translate(&mut self, virt_addr: VirtAddr) -> Result<PhysAddr> {
        if !virt_addr.is_within(&self.geometry) {
            warn!("{:?} out of range", virt_addr);
            return Err(Error::OutOfRangeAddress);
        }
        if !self.initialised {
            return Err(Error::UnInitialised);
        }
        Translator::new(&mut self.memory, &self.geometry, &mut self.stats).translate(virt_addr)
    }

    /// Geometry of the simulation.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Fault counts since creation.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The underlying physical memory.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Give up the pager, keeping its memory.
    pub fn into_memory(self) -> M {
        self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::logger;
    use log::LevelFilter;

    /// Ram that records the order of swap operations.
    struct Recording {
        ram: Ram,
        log: Vec<Op>,
    }

    #[derive(Debug, PartialEq)]
    enum Op {
        Evict(FrameIndex, PageNumber),
        Restore(FrameIndex, PageNumber),
    }

    impl PhysicalMemory for Recording {
        fn read(&self, phys_addr: PhysAddr) -> Word {
            self.ram.read(phys_addr)
        }

        fn write(&mut self, phys_addr: PhysAddr, value: Word) {
            self.ram.write(phys_addr, value)
        }

        fn evict(&mut self, frame: FrameIndex, page: PageNumber) {
            self.log.push(Op::Evict(frame, page));
            self.ram.evict(frame, page)
        }

        fn restore(&mut self, frame: FrameIndex, page: PageNumber) {
            self.log.push(Op::Restore(frame, page));
            self.ram.restore(frame, page)
        }

        fn contains_swapped(&self, page: PageNumber) -> bool {
            self.ram.contains_swapped(page)
        }
    }

    fn setup(offset_width: u32, depth: u32, num_frames: u64) -> Pager<Recording> {
        logger::init(LevelFilter::Trace, &[]);
        let geometry = Geometry::new(offset_width, depth, num_frames).expect("geometry");
        let mut pager = Pager::new(
            geometry,
            Recording {
                ram: Ram::new(geometry),
                log: Vec::new(),
            },
        );
        pager.initialize();
        pager
    }

    fn evictions(pager: &Pager<Recording>) -> Vec<(FrameIndex, PageNumber)> {
        pager
            .memory()
            .log
            .iter()
            .filter_map(|op| match op {
                Op::Evict(frame, page) => Some((*frame, *page)),
                Op::Restore(..) => None,
            })
            .collect()
    }

    #[test]
    fn cold_miss_builds_path() {
        let mut pager = setup(2, 2, 4);
        assert_ok!(pager.write(VirtAddr::at(5), 7));
        assert_ok_eq!(pager.read(VirtAddr::at(5)), 7);

        // root [0] -> table 1, table 1 [1] -> page frame 2
        let memory = &pager.memory().ram;
        assert_eq!(1, memory.read(PhysAddr::at(0)));
        assert_eq!(2, memory.read(PhysAddr::at(5)));
        assert_eq!(7, memory.read(PhysAddr::at(9)));
        assert_eq!(vec![Op::Restore(2, 1)], pager.memory().log);
        assert_eq!(2, pager.stats().faults);
        assert_eq!(2, pager.stats().reclaimed[ReclaimKind::Unused]);
    }

    #[test]
    fn evicts_furthest_page() {
        let mut pager = setup(2, 2, 4);
        assert_ok!(pager.write(VirtAddr::at(5), 7));
        assert_ok!(pager.write(VirtAddr::at(8), 8));
        assert_ok!(pager.write(VirtAddr::at(36), 36));
        assert_eq!(vec![(2, 1), (3, 2)], evictions(&pager));
        assert!(pager.memory().contains_swapped(1));
        assert!(pager.memory().contains_swapped(2));

        assert_ok_eq!(pager.read(VirtAddr::at(5)), 7);
        assert_eq!(vec![(2, 1), (3, 2), (3, 9)], evictions(&pager));
        assert!(!pager.memory().contains_swapped(1));

        assert_ok_eq!(pager.read(VirtAddr::at(36)), 36);
        assert_eq!(vec![(2, 1), (3, 2), (3, 9), (3, 1)], evictions(&pager));
        assert_ok!(pager.audit());
    }

    #[test]
    fn reclaims_empty_table() {
        let mut pager = setup(2, 2, 4);
        assert_ok!(pager.write(VirtAddr::at(5), 7));
        assert_ok!(pager.write(VirtAddr::at(8), 8));
        assert_ok!(pager.write(VirtAddr::at(36), 36));

        // table 1 emptied by the evictions, and is off the path to page 10
        assert_ok!(pager.write(VirtAddr::at(40), 40));
        assert_eq!(1, pager.stats().reclaimed[ReclaimKind::EmptyTable]);
        assert_eq!(0, pager.memory().read(PhysAddr::at(0)));
        assert_eq!(1, pager.memory().read(PhysAddr::at(10)));
        assert_eq!(2, evictions(&pager).len());

        assert_ok_eq!(pager.read(VirtAddr::at(36)), 36);
        assert_ok_eq!(pager.read(VirtAddr::at(40)), 40);
        assert_ok_eq!(pager.read(VirtAddr::at(8)), 8);
        assert_ok_eq!(pager.read(VirtAddr::at(5)), 7);
    }

    #[test]
    fn out_of_range() {
        let mut pager = setup(2, 2, 4);
        assert_eq!(Err(Error::OutOfRangeAddress), pager.read(VirtAddr::at(64)));
        assert_eq!(Err(Error::OutOfRangeAddress), pager.write(VirtAddr::at(u64::MAX), 1));
        assert_eq!(0, pager.stats().faults);
        assert!(pager.memory().log.is_empty());
    }

    #[test]
    fn uninitialised() {
        let geometry = Geometry::new(2, 2, 4).expect("geometry");
        let mut pager = Pager::with_ram(geometry);
        assert_eq!(Err(Error::UnInitialised), pager.read(VirtAddr::at(0)));
        pager.initialize();
        assert_ok!(pager.write(VirtAddr::at(0), 1));
    }

    #[test]
    fn exhaustion_rolls_back() {
        let mut pager = setup(2, 2, 2);
        assert_eq!(Err(Error::FrameExhaustion), pager.write(VirtAddr::at(5), 7));
        assert_eq!(0, pager.memory().read(PhysAddr::at(0)));
        assert_eq!(Err(Error::FrameExhaustion), pager.read(VirtAddr::at(5)));
        assert_eq!(0, pager.memory().read(PhysAddr::at(0)));
        assert_eq!(Ok(vec![]), pager.audit());

        let mut pager = setup(2, 2, 1);
        assert_eq!(Err(Error::FrameExhaustion), pager.write(VirtAddr::at(5), 7));
        assert_eq!(0, pager.stats().faults);
    }

    #[test]
    fn corrupt_entry() {
        let mut pager = setup(2, 2, 4);
        pager.memory.write(PhysAddr::at(0), 9);
        assert_eq!(Err(Error::CorruptTable), pager.read(VirtAddr::at(5)));
        assert_eq!(Err(Error::CorruptTable), pager.audit());
    }

    #[test]
    fn initialize_unmaps() {
        let mut pager = setup(2, 2, 4);
        assert_ok!(pager.write(VirtAddr::at(5), 7));
        pager.initialize();
        assert_eq!(Ok(vec![]), pager.audit());
        let faults = pager.stats().faults;
        assert_ok!(pager.read(VirtAddr::at(5)));
        assert_eq!(faults + 2, pager.stats().faults);
    }

    #[test]
    fn into_memory_keeps_contents() {
        let geometry = Geometry::new(2, 2, 4).expect("geometry");
        let mut pager = Pager::with_ram(geometry);
        pager.initialize();
        assert_eq!(&geometry, pager.geometry());
        assert_ok!(pager.write(VirtAddr::at(1), 6));

        let ram = pager.into_memory();
        assert_eq!(&geometry, ram.geometry());
        assert_eq!(1, ram.read(PhysAddr::at(0)));
        assert_eq!(2, ram.read(PhysAddr::at(4)));
        assert_eq!(6, ram.read(PhysAddr::at(9)));
    }
}
