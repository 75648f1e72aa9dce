// SPDX-License-Identifier: Unlicense

//! Simulated hardware underneath the pager.

pub mod ram;
