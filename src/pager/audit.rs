// SPDX-License-Identifier: Unlicense

//! Consistency check of the whole page table tree.

use super::{FrameIndex, PageNumber, Pager, PhysAddr, ROOT_FRAME};
use crate::device::ram::PhysicalMemory;
use crate::{Error, Result};

use alloc::vec;
use alloc::vec::Vec;

use log::error;

/// A page held in a frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resident {
    /// The virtual page.
    pub page: PageNumber,
    /// The frame holding it.
    pub frame: FrameIndex,
}

impl<M: PhysicalMemory> Pager<M> {
    /// Resident pages in table order, after checking that every frame has at
    /// most one parent and no resident page is also in swap.
    pub fn audit(&self) -> Result<Vec<Resident>> {
        let mut resident = Vec::new();
        if !self.initialised {
            return Ok(resident);
        }
        let mut owned = vec![false; self.geometry.num_frames() as usize];
        owned[ROOT_FRAME as usize] = true;
        self.audit_table(ROOT_FRAME, 0, 0, &mut owned, &mut resident)?;

        if let Some(both) = resident
            .iter()
            .find(|r| self.memory.contains_swapped(r.page))
        {
            error!("page {} is resident and in swap", both.page);
            return Err(Error::CorruptTable);
        }
        Ok(resident)
    }

    fn audit_table(
        &self,
        table: FrameIndex,
        depth: u32,
        prefix: PageNumber,
        owned: &mut [bool],
        resident: &mut Vec<Resident>,
    ) -> Result<()> {
        let geometry = &self.geometry;
        for index in 0..geometry.page_size() {
            let entry = self.memory.read(PhysAddr::in_frame(geometry, table, index));
            if entry == 0 {
                continue;
            }
            if entry < 0 || entry as FrameIndex >= geometry.num_frames() {
                error!("table {} [{}] holds {}", table, index, entry);
                return Err(Error::CorruptTable);
            }
            let frame = entry as FrameIndex;
            if owned[frame as usize] {
                error!("frame {} has more than one parent", frame);
                return Err(Error::CorruptTable);
            }
            owned[frame as usize] = true;

            let page = (prefix << geometry.offset_width()) | index;
            if depth + 1 == geometry.depth() {
                resident.push(Resident { page, frame });
            } else {
                self.audit_table(frame, depth + 1, page, owned, resident)?;
            }
        }
        Ok(())
    }
}
