//! compact-number
//!
//! Locale-aware compact number formatting ("1.5K", "1,5 тис.", "1.2万")
//! backed by data extracted from CLDR, plus the `cldr-extract` tool that
//! produces that data.

// Note: deny (not forbid) to allow #[allow(unsafe_code)] in test helpers for env var manipulation
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod extract;
pub mod number;
pub mod storage;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{CompactError, ExitCode, Result};
pub use number::{
    CompactNumber, CompactNumberFormatter, FormatContext, format_compact_number,
};
