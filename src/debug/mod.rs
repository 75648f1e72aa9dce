// SPDX-License-Identifier: Unlicense

//! Capture and log debugging output.

#[cfg(any(test, feature = "std"))]
pub mod logger;

use log::LevelFilter;

/// Module path suffix and the level it is logged at.
pub type LevelOverride = (&'static str, LevelFilter);

/// Overrides that keep the per-fault tree walk out of the log.
///
/// The frame selector traces every table entry it visits, which swamps
/// anything else once more than a handful of frames are in use.
pub const QUIET_WALK: &[LevelOverride] = &[
    ("pager::frames", LevelFilter::Debug),
    ("pager::translation", LevelFilter::Debug),
];
