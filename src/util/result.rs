// SPDX-License-Identifier: Unlicense

//! Uniform structure for errors and results.

use core::fmt::{Display, Formatter};

/// Specified errors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Error {
    /// Virtual address at or beyond the configured virtual memory size.
    OutOfRangeAddress,
    /// No frame beyond the root could be found for a page fault.
    FrameExhaustion,
    /// Access before the root table was initialised.
    UnInitialised,
    /// Table entry or physical address outside physical memory.
    CorruptTable,
    /// Geometry parameters are inconsistent.
    InvalidGeometry,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::OutOfRangeAddress => "virtual address out of range",
            Self::FrameExhaustion => "no frame available",
            Self::UnInitialised => "virtual memory not initialised",
            Self::CorruptTable => "page table corrupt",
            Self::InvalidGeometry => "invalid memory geometry",
        };
        f.write_str(msg)
    }
}

/// Default error type for simulator functions.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_error() {
        assert_eq!("no frame available", format!("{}", Error::FrameExhaustion));
        assert_eq!("FrameExhaustion", format!("{:?}", Error::FrameExhaustion));
    }

    #[test]
    fn return_error() {
        fn fn_ok() -> Result<u64> {
            Ok(1)
        }

        fn fn_error() -> Result<u64> {
            Err(Error::CorruptTable)
        }

        fn fn_qmark() -> Result<u64> {
            fn_error()?;
            Ok(1)
        }

        assert_ok_eq!(fn_ok(), 1);
        assert_err!(fn_error());
        assert_eq!(Err(Error::CorruptTable), fn_qmark());
    }
}
