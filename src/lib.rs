// SPDX-License-Identifier: Unlicense

//! Simulated memory management unit.
//!
//! Virtual reads and writes are translated through a multi-level page table
//! kept in a small simulated physical memory. Tables and pages are allocated
//! on demand, empty tables are reclaimed, and when memory is full the page
//! furthest from the faulting page is evicted to swap.
//!
//! The simulation itself only needs `alloc`. The `std` feature, on by
//! default, adds the printing logger in [`debug::logger`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

#[macro_use]
extern crate claim;

pub mod debug;
pub mod device;
pub mod pager;
pub mod util;

pub use util::result::{Error, Result};
