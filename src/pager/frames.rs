// SPDX-License-Identifier: Unlicense

//! Choosing a frame to satisfy a page fault.
//!
//! One depth-first walk of the populated tree finds, all at once, an empty
//! table that can be reclaimed, the highest frame in use, and the resident page
//! furthest from the faulting page. The walk only reads memory and does not use
//! the heap: it recurses at most `depth` levels and keeps its findings in a
//! `Selection`.

use super::{FrameIndex, Geometry, PageNumber, PhysAddr};
use crate::device::ram::PhysicalMemory;
use crate::{Error, Result};

use enum_map::Enum;
use log::{debug, error, trace};

/// Word `index` of table `frame`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Slot {
    /// Table holding the entry.
    pub frame: FrameIndex,
    /// Entry within the table.
    pub index: u64,
}

impl Slot {
    /// Physical address of the entry.
    pub const fn phys_addr(&self, geometry: &Geometry) -> PhysAddr {
        PhysAddr::in_frame(geometry, self.frame, self.index)
    }
}

/// How a fault obtained its frame.
#[derive(Copy, Clone, Debug, PartialEq, Enum)]
pub enum ReclaimKind {
    /// A table with no entries, detached from its parent.
    EmptyTable,
    /// A frame never used before.
    Unused,
    /// A resident page, saved to swap.
    Evict,
}

/// The frame chosen for a fault, and the link that must be cut to take it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Victim {
    /// Reclaim an empty table referenced from `parent`.
    EmptyTable { frame: FrameIndex, parent: Slot },
    /// Take a frame that nothing references.
    Unused { frame: FrameIndex },
    /// Evict `page`, referenced from `parent`.
    Evict {
        frame: FrameIndex,
        page: PageNumber,
        parent: Slot,
    },
}

impl Victim {
    /// The chosen frame.
    pub fn frame(&self) -> FrameIndex {
        match *self {
            Self::EmptyTable { frame, .. } => frame,
            Self::Unused { frame } => frame,
            Self::Evict { frame, .. } => frame,
        }
    }

    /// Which kind of reclamation this is.
    pub fn kind(&self) -> ReclaimKind {
        match self {
            Self::EmptyTable { .. } => ReclaimKind::EmptyTable,
            Self::Unused { .. } => ReclaimKind::Unused,
            Self::Evict { .. } => ReclaimKind::Evict,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Candidate {
    frame: FrameIndex,
    page: PageNumber,
    parent: Slot,
    distance: u64,
}

/// Best findings so far in one walk.
struct Selection<'a, M: PhysicalMemory> {
    memory: &'a M,
    geometry: &'a Geometry,
    target: PageNumber,
    empty_table: Option<(FrameIndex, Slot)>,
    eviction: Option<Candidate>,
    max_frame: FrameIndex,
}

impl<'a, M: PhysicalMemory> Selection<'a, M> {
    fn new(memory: &'a M, geometry: &'a Geometry, target: PageNumber) -> Self {
        Self {
            memory,
            geometry,
            target,
            empty_table: None,
            eviction: None,
            max_frame: 0,
        }
    }

    /// Visit every child of a table, returning true iff it has none.
    ///
    /// `prefix` is the page number bits above this table, and `on_path` is
    /// true iff the table lies on the way to the target page.
    fn walk_table(
        &mut self,
        table: FrameIndex,
        depth: u32,
        prefix: PageNumber,
        on_path: bool,
    ) -> Result<bool> {
        let target_index = self.geometry.level_index(self.target, depth);
        let mut empty = true;
        for index in 0..self.geometry.page_size() {
            let parent = Slot {
                frame: table,
                index,
            };
            let entry = self.memory.read(parent.phys_addr(self.geometry));
            if entry == 0 {
                continue;
            }
            empty = false;
            trace!("table {} [{}] -> {}", table, index, entry);
            if entry < 0 {
                error!("table {} [{}] holds {}", table, index, entry);
                return Err(Error::CorruptTable);
            }
            self.visit(
                entry as FrameIndex,
                depth + 1,
                (prefix << self.geometry.offset_width()) | index,
                parent,
                on_path && index == target_index,
            )?;
        }
        Ok(empty)
    }

    fn visit(
        &mut self,
        frame: FrameIndex,
        depth: u32,
        prefix: PageNumber,
        parent: Slot,
        on_path: bool,
    ) -> Result<()> {
        if frame == 0 || frame >= self.geometry.num_frames() {
            error!("{:?} refers to frame {}", parent, frame);
            return Err(Error::CorruptTable);
        }
        self.max_frame = core::cmp::max(self.max_frame, frame);

        if depth == self.geometry.depth() {
            self.consider_eviction(frame, prefix, parent);
            return Ok(());
        }

        let empty = self.walk_table(frame, depth, prefix, on_path)?;
        if empty && !on_path && self.empty_table.is_none() {
            debug!("empty table {} at depth {}", frame, depth);
            self.empty_table = Some((frame, parent));
        }
        Ok(())
    }

    /// Keep the first page seen at the greatest distance from the target.
    fn consider_eviction(&mut self, frame: FrameIndex, page: PageNumber, parent: Slot) {
        if page == self.target {
            return;
        }
        let distance = self.geometry.cyclic_distance(self.target, page);
        let better = match self.eviction {
            None => true,
            Some(best) => distance > best.distance,
        };
        if better {
            trace!("eviction candidate: page {} distance {}", page, distance);
            self.eviction = Some(Candidate {
                frame,
                page,
                parent,
                distance,
            });
        }
    }

    fn decide(self) -> Result<Victim> {
        if let Some((frame, parent)) = self.empty_table {
            return Ok(Victim::EmptyTable { frame, parent });
        }
        if self.max_frame + 1 < self.geometry.num_frames() {
            return Ok(Victim::Unused {
                frame: self.max_frame + 1,
            });
        }
        match self.eviction {
            Some(Candidate {
                frame,
                page,
                parent,
                ..
            }) => Ok(Victim::Evict {
                frame,
                page,
                parent,
            }),
            None => Err(Error::FrameExhaustion),
        }
    }
}

/// Choose a frame for a fault on `target`.
///
/// In order of preference: an empty table off the path to `target`, the
/// frame after the highest in use, or the page at the greatest cyclic distance
/// from `target`.
pub fn select(
    memory: &impl PhysicalMemory,
    geometry: &Geometry,
    target: PageNumber,
) -> Result<Victim> {
    if geometry.num_frames() <= 1 {
        return Err(Error::FrameExhaustion);
    }
    let mut selection = Selection::new(memory, geometry, target);
    selection.walk_table(0, 0, 0, true)?;
    let victim = selection.decide();
    debug!("select for page {}: {:?}", target, victim);
    victim
}
