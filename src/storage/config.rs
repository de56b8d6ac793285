//! Configuration file loading and precedence resolution.
//!
//! Loads `config.toml` from `COMPACT_NUMBER_CONFIG` or the platform config
//! directory (`~/.config/compact-number/config.toml` on Linux).
//!
//! ## Precedence
//!
//! Extraction settings are resolved with the following precedence (highest
//! first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `COMPACT_NUMBER_CONFIG`: Override config file path
//! - `COMPACT_NUMBER_CLDR_DIR`: CLDR numbers package root
//! - `COMPACT_NUMBER_OUT_DIR`: Output directory for locale records
//! - `COMPACT_NUMBER_PRETTY`: Pretty-print records (1, true, yes, on)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::cli::args::Cli;
use crate::core::locale::LanguageTag;
use crate::error::{CompactError, Result};
use crate::number::options::Formats;

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "COMPACT_NUMBER_CONFIG";
/// Environment variable for the CLDR package root.
pub const ENV_CLDR_DIR: &str = "COMPACT_NUMBER_CLDR_DIR";
/// Environment variable for the output directory.
pub const ENV_OUT_DIR: &str = "COMPACT_NUMBER_OUT_DIR";
/// Environment variable for pretty-printed records.
pub const ENV_PRETTY: &str = "COMPACT_NUMBER_PRETTY";

/// Default CLDR package root, relative to the working directory.
pub const DEFAULT_CLDR_DIR: &str = "node_modules/cldr-numbers-modern";
/// Default output directory, relative to the working directory.
pub const DEFAULT_OUT_DIR: &str = "locale-data";

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction settings.
    pub extract: ExtractConfig,
    /// Runtime registry settings.
    pub runtime: RuntimeConfig,
    /// Named formats (`[formats.number.<name>]`).
    pub formats: Formats,
}

/// `[extract]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub cldr_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    /// Locales to extract; empty means every locale found.
    pub locales: Vec<String>,
    pub pretty: bool,
}

/// `[runtime]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory of extracted records to load at startup.
    pub data_dir: Option<PathBuf>,
    /// Default locale override.
    pub default_locale: Option<String>,
}

impl Config {
    /// Load from `COMPACT_NUMBER_CONFIG` or the default path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if `COMPACT_NUMBER_CONFIG` names a missing
    /// file, or `ConfigParse` if the file is invalid.
    pub fn load() -> Result<Self> {
        match std::env::var(ENV_CONFIG) {
            Ok(path) if !path.trim().is_empty() => Self::load_required(Path::new(path.trim())),
            _ => Self::load_from(&Self::config_path()),
        }
    }

    /// Load from an explicitly requested path, which must exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` or `ConfigParse`.
    pub fn load_required(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CompactError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        Self::load_from(path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns the default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| CompactError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CompactError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate locale tags.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first malformed tag.
    pub fn validate(&self) -> Result<()> {
        let tags = self
            .extract
            .locales
            .iter()
            .map(|tag| ("extract.locales", tag))
            .chain(
                self.runtime
                    .default_locale
                    .iter()
                    .map(|tag| ("runtime.default_locale", tag)),
            );
        for (field, tag) in tags {
            LanguageTag::parse(tag)
                .map_err(|_| CompactError::Config(format!("Invalid locale \"{tag}\" in {field}")))?;
        }
        Ok(())
    }
}

// =============================================================================
// Resolved Extraction Settings
// =============================================================================

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Tracks the source of each extraction setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    pub cldr_dir: ConfigSource,
    pub out_dir: ConfigSource,
    pub locales: ConfigSource,
    pub pretty: ConfigSource,
}

/// Extraction settings after merging CLI, env vars, and config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExtractConfig {
    pub cldr_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Empty means every locale under `<cldr_dir>/main`.
    pub locales: Vec<String>,
    pub pretty: bool,
    pub sources: ConfigSources,
}

impl ResolvedExtractConfig {
    /// Resolve from CLI args, the environment, and the config file.
    ///
    /// `--config` takes precedence over `COMPACT_NUMBER_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from loading the file.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load_required(path)?,
            None => Config::load()?,
        };
        Ok(Self::resolve_with(cli, &config))
    }

    /// Resolve against an already loaded config.
    #[must_use]
    pub fn resolve_with(cli: &Cli, config: &Config) -> Self {
        let mut sources = ConfigSources::default();

        let cldr_dir = Self::resolve_path(
            cli.cldr_dir.as_ref(),
            ENV_CLDR_DIR,
            config.extract.cldr_dir.as_ref(),
            DEFAULT_CLDR_DIR,
            &mut sources.cldr_dir,
        );
        let out_dir = Self::resolve_path(
            cli.out_dir.as_ref(),
            ENV_OUT_DIR,
            config.extract.out_dir.as_ref(),
            DEFAULT_OUT_DIR,
            &mut sources.out_dir,
        );
        let locales = Self::resolve_locales(cli, config, &mut sources.locales);
        let pretty = Self::resolve_pretty(cli, config, &mut sources.pretty);

        Self {
            cldr_dir,
            out_dir,
            locales,
            pretty,
            sources,
        }
    }

    fn resolve_path(
        cli: Option<&PathBuf>,
        env: &str,
        file: Option<&PathBuf>,
        default: &str,
        source: &mut ConfigSource,
    ) -> PathBuf {
        // 1. CLI flag
        if let Some(path) = cli {
            *source = ConfigSource::Cli;
            return path.clone();
        }

        // 2. Environment variable
        if let Ok(value) = std::env::var(env) {
            if !value.trim().is_empty() {
                *source = ConfigSource::Env;
                return PathBuf::from(value.trim());
            }
        }

        // 3. Config file
        if let Some(path) = file {
            *source = ConfigSource::ConfigFile;
            return path.clone();
        }

        // 4. Default
        *source = ConfigSource::Default;
        PathBuf::from(default)
    }

    fn resolve_locales(cli: &Cli, config: &Config, source: &mut ConfigSource) -> Vec<String> {
        if !cli.locales.is_empty() {
            *source = ConfigSource::Cli;
            return cli.locales.clone();
        }
        if !config.extract.locales.is_empty() {
            *source = ConfigSource::ConfigFile;
            return config.extract.locales.clone();
        }
        *source = ConfigSource::Default;
        Vec::new()
    }

    fn resolve_pretty(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }
        if is_env_truthy(ENV_PRETTY) {
            *source = ConfigSource::Env;
            return true;
        }
        if config.extract.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }
        *source = ConfigSource::Default;
        false
    }
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var: &str) -> bool {
    std::env::var(var)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[allow(unsafe_code)]
    fn with_env_var(key: &str, value: &str, f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        let prior = std::env::var(key).ok();
        unsafe {
            std::env::set_var(key, value);
        }
        f();
        match prior {
            Some(val) => unsafe {
                std::env::set_var(key, val);
            },
            None => unsafe {
                std::env::remove_var(key);
            },
        }
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("cldr-extract").chain(args.iter().copied()))
    }

    #[test]
    fn load_missing_file_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_required_missing_file_fails() {
        let err = Config::load_required(Path::new("/nonexistent/path/config.toml")).unwrap_err();
        assert!(matches!(err, CompactError::ConfigNotFound { .. }));
    }

    #[test]
    fn load_valid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[extract]
cldr_dir = "/data/cldr"
locales = ["en", "uk"]
pretty = true

[runtime]
default_locale = "en"

[formats.number.compact1]
maximum_fraction_digits = 1
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.extract.cldr_dir, Some(PathBuf::from("/data/cldr")));
        assert_eq!(config.extract.locales, vec!["en", "uk"]);
        assert!(config.extract.pretty);
        assert_eq!(config.runtime.default_locale.as_deref(), Some("en"));
        assert_eq!(
            config.formats.number["compact1"].maximum_fraction_digits,
            Some(1)
        );
    }

    #[test]
    fn load_invalid_toml_returns_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, CompactError::ConfigParse { .. }));
    }

    #[test]
    fn invalid_locale_is_rejected() {
        let mut config = Config::default();
        config.extract.locales = vec!["en_US".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("extract.locales"));
    }

    #[test]
    fn roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.extract.pretty = true;
        config.runtime.data_dir = Some(PathBuf::from("locale-data"));

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let mut config = Config::default();
        config.extract.out_dir = Some(PathBuf::from("from-file"));

        with_env_var(ENV_OUT_DIR, "from-env", || {
            let resolved = ResolvedExtractConfig::resolve_with(&cli(&["--out-dir", "from-cli"]), &config);
            assert_eq!(resolved.out_dir, PathBuf::from("from-cli"));
            assert_eq!(resolved.sources.out_dir, ConfigSource::Cli);

            let resolved = ResolvedExtractConfig::resolve_with(&cli(&[]), &config);
            assert_eq!(resolved.out_dir, PathBuf::from("from-env"));
            assert_eq!(resolved.sources.out_dir, ConfigSource::Env);
        });
    }

    #[test]
    fn file_beats_default() {
        let mut config = Config::default();
        config.extract.locales = vec!["ja".to_string()];
        let resolved = ResolvedExtractConfig::resolve_with(&cli(&[]), &config);
        assert_eq!(resolved.locales, vec!["ja"]);
        assert_eq!(resolved.sources.locales, ConfigSource::ConfigFile);
        assert_eq!(resolved.sources.cldr_dir, ConfigSource::Default);
        assert_eq!(resolved.cldr_dir, PathBuf::from(DEFAULT_CLDR_DIR));
    }
}
