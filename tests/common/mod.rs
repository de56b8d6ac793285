//! Common helpers for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: CLDR fixture trees and extraction helpers
//! - `log_capture`: Tracing layer that records events for assertions

pub mod fixtures;
pub mod log_capture;
