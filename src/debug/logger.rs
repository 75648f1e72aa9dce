// SPDX-License-Identifier: Unlicense

//! Print log records to standard output, with per-module level overrides.

use log::{LevelFilter, Log, Metadata, Record};
use spin::Once;

pub use super::LevelOverride;

struct Settings {
    default: LevelFilter,
    overrides: &'static [LevelOverride],
}

static SETTINGS: Once<Settings> = Once::new();
static LOGGER: PrintLogger = PrintLogger;

struct PrintLogger;

/// Effective level for a target: the last override whose suffix matches wins.
fn effective_level(
    default: LevelFilter,
    overrides: &[LevelOverride],
    target: &str,
) -> LevelFilter {
    overrides.iter().fold(default, |base, (suffix, level)| {
        if target.ends_with(suffix) {
            *level
        } else {
            base
        }
    })
}

fn level_for(target: &str) -> LevelFilter {
    match SETTINGS.get() {
        None => LevelFilter::Off,
        Some(settings) => effective_level(settings.default, settings.overrides, target),
    }
}

impl Log for PrintLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        use std::{println, string::String};

        if self.enabled(record.metadata()) {
            println!(
                "{:5} [{:>30}:{:3}] {}",
                record.level(),
                record
                    .target()
                    .trim_start_matches("libvmsim::")
                    .chars()
                    .take(30)
                    .collect::<String>(),
                record.line().unwrap_or(0),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Install the print logger.
///
/// Only the first call has any effect. If another logger is already installed
/// the settings are recorded but nothing is printed by this one.
pub fn init(default: LevelFilter, overrides: &'static [LevelOverride]) {
    SETTINGS.call_once(|| {
        let max = overrides
            .iter()
            .map(|(_, level)| *level)
            .fold(default, core::cmp::max);
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(max);
        }
        Settings { default, overrides }
    });
}
