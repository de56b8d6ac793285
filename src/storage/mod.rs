//! Configuration loading and application paths.

pub mod config;
pub mod paths;

pub use config::{
    Config, ConfigSource, ConfigSources, ENV_CLDR_DIR, ENV_CONFIG, ENV_OUT_DIR, ENV_PRETTY,
    ExtractConfig, ResolvedExtractConfig, RuntimeConfig,
};
pub use paths::AppPaths;
