// SPDX-License-Identifier: Unlicense

//! Miscellaneous support functions.

pub mod result;
