//! Command-line interface of the `cldr-extract` binary.

pub mod args;

pub use args::Cli;
