// SPDX-License-Identifier: Unlicense

//! Run a strided workload through the simulated MMU and report evictions.

use libvmsim::debug::{logger, QUIET_WALK};
use libvmsim::device::ram::Word;
use libvmsim::pager::{Geometry, Pager, ReclaimKind, VirtAddr};
use libvmsim::Result;

use log::{error, info, LevelFilter};

/// Writes one word in each of this many pages, then reads them all back.
const PAGES_TOUCHED: u64 = 250;

fn main() {
    logger::init(LevelFilter::Info, QUIET_WALK);

    if let Err(e) = run() {
        error!("workload failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut pager = Pager::with_ram(Geometry::default());
    pager.initialize();
    let geometry = *pager.geometry();

    let stride = 5 * geometry.page_size();
    let addrs = (0..PAGES_TOUCHED)
        .map(|i| VirtAddr::at(i * stride))
        .filter(|virt_addr| virt_addr.is_within(&geometry));

    for (i, virt_addr) in addrs.clone().enumerate() {
        pager.write(virt_addr, i as Word)?;
    }
    for (i, virt_addr) in addrs.enumerate() {
        let value = pager.read(virt_addr)?;
        if value != i as Word {
            error!("{:?} read {} expected {}", virt_addr, value, i);
        }
    }

    let stats = pager.stats();
    info!(
        "faults: {}, unused: {}, empty tables: {}, evictions: {}",
        stats.faults,
        stats.reclaimed[ReclaimKind::Unused],
        stats.reclaimed[ReclaimKind::EmptyTable],
        stats.reclaimed[ReclaimKind::Evict],
    );
    println!("{}", pager.memory().evictions());
    Ok(())
}
