// SPDX-License-Identifier: Unlicense

//! Setup shared between integration tests.

#![allow(dead_code)]

use libvmsim::debug::{logger, QUIET_WALK};
use libvmsim::device::ram::Ram;
use libvmsim::pager::{Geometry, Pager};

use log::LevelFilter;

/// Initialised pager over fresh RAM, with logging on.
pub fn pager(geometry: Geometry) -> Pager<Ram> {
    logger::init(LevelFilter::Debug, QUIET_WALK);
    let mut pager = Pager::with_ram(geometry);
    pager.initialize();
    pager
}

/// Deterministic pseudo-random sequence for access patterns.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Next value below `bound`.
    pub fn below(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}
