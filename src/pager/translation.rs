// SPDX-License-Identifier: Unlicense

//! Translation of virtual addresses by walking the page tables, faulting in
//! tables and the page itself wherever an entry is unset.

use super::frames::{self, Slot, Victim};
use super::{FrameIndex, Geometry, PageNumber, PhysAddr, Stats, VirtAddr};
use crate::device::ram::{PhysicalMemory, Word};
use crate::{Error, Result};

use log::{debug, error, info, trace, warn};

/// Progress of a walk down the tables.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Walk {
    /// About to read the table at `level`, held in `table`.
    Level { level: u32, table: FrameIndex },
    /// Every level resolved; `frame` holds the page.
    Done { frame: FrameIndex },
    /// The walk cannot continue.
    Failed(Error),
}

/// Walks the tables for one access.
pub struct Translator<'a, M: PhysicalMemory> {
    memory: &'a mut M,
    geometry: &'a Geometry,
    stats: &'a mut Stats,
    first_link: Option<Slot>,
}

impl<'a, M: PhysicalMemory> Translator<'a, M> {
    /// Translator over the given memory, counting faults into `stats`.
    pub fn new(memory: &'a mut M, geometry: &'a Geometry, stats: &'a mut Stats) -> Self {
        Self {
            memory,
            geometry,
            stats,
            first_link: None,
        }
    }

    /// Physical address of a virtual address already known to be in range.
    ///
    /// On failure every entry linked by this walk is unlinked again, so the
    /// mapping is as it was. Pages evicted on the way stay in swap.
    pub fn translate(mut self, virt_addr: VirtAddr) -> Result<PhysAddr> {
        let page = virt_addr.page_number(self.geometry);
        let mut walk = Walk::Level { level: 0, table: 0 };
        let frame = loop {
            walk = match walk {
                Walk::Level { level, table } => self.step(page, level, table),
                Walk::Done { frame } => break frame,
                Walk::Failed(error) => {
                    warn!("translating {:?} failed: {}", virt_addr, error);
                    self.roll_back();
                    return Err(error);
                }
            };
        };

        let phys_addr = PhysAddr::in_frame(self.geometry, frame, virt_addr.offset(self.geometry));
        if !phys_addr.is_within(self.geometry) {
            error!("{:?} translated outside memory to {:?}", virt_addr, phys_addr);
            return Err(Error::CorruptTable);
        }
        trace!("{:?} -> {:?}", virt_addr, phys_addr);
        Ok(phys_addr)
    }

    /// Resolve one level, faulting if the entry is unset.
    fn step(&mut self, page: PageNumber, level: u32, table: FrameIndex) -> Walk {
        let slot = Slot {
            frame: table,
            index: self.geometry.level_index(page, level),
        };
        let entry = self.memory.read(slot.phys_addr(self.geometry));
        let next = if entry == 0 {
            match self.fault(page, level, slot) {
                Ok(frame) => frame,
                Err(error) => return Walk::Failed(error),
            }
        } else if entry < 0 || entry as FrameIndex >= self.geometry.num_frames() {
            error!("{:?} holds {}", slot, entry);
            return Walk::Failed(Error::CorruptTable);
        } else {
            entry as FrameIndex
        };

        trace!("level {}: {:?} -> {}", level, slot, next);
        if level + 1 == self.geometry.depth() {
            Walk::Done { frame: next }
        } else {
            Walk::Level {
                level: level + 1,
                table: next,
            }
        }
    }

    /// Find a frame for the entry at `slot` and link it in.
    ///
    /// Nothing is written until a frame has been found.
    fn fault(&mut self, page: PageNumber, level: u32, slot: Slot) -> Result<FrameIndex> {
        let victim = frames::select(&*self.memory, self.geometry, page)?;
        self.stats.faults += 1;
        self.stats.reclaimed[victim.kind()] += 1;

        match victim {
            Victim::EmptyTable { frame, parent } => {
                debug!("reclaiming empty table {} from {:?}", frame, parent);
                self.unlink(parent);
            }
            Victim::Evict {
                frame,
                page: evicted,
                parent,
            } => {
                info!("evicting page {} from frame {} for page {}", evicted, frame, page);
                self.unlink(parent);
                self.memory.evict(frame, evicted);
            }
            Victim::Unused { frame } => {
                debug!("using frame {}", frame);
            }
        }

        let frame = victim.frame();
        if level + 1 < self.geometry.depth() {
            for index in 0..self.geometry.page_size() {
                self.memory
                    .write(PhysAddr::in_frame(self.geometry, frame, index), 0);
            }
        } else {
            self.memory.restore(frame, page);
        }

        self.memory
            .write(slot.phys_addr(self.geometry), frame as Word);
        if self.first_link.is_none() {
            self.first_link = Some(slot);
        }
        Ok(frame)
    }

    fn unlink(&mut self, slot: Slot) {
        self.memory.write(slot.phys_addr(self.geometry), 0);
    }

    /// Cut the topmost entry this walk linked, dropping the chain beneath it.
    fn roll_back(&mut self) {
        if let Some(slot) = self.first_link.take() {
            debug!("rolling back {:?}", slot);
            self.unlink(slot);
        }
    }
}
