//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Extract compact number tables from CLDR `numbers.json` files.
#[derive(Parser, Debug)]
#[command(name = "cldr-extract")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// CLDR numbers package root (contains main/<locale>/numbers.json)
    #[arg(long, value_name = "DIR")]
    pub cldr_dir: Option<PathBuf>,

    /// Output directory for per-locale records and manifest.json
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Locale to extract (repeatable; default: every locale found)
    #[arg(long = "locale", value_name = "TAG")]
    pub locales: Vec<String>,

    /// Pretty-print the JSON records
    #[arg(long)]
    pub pretty: bool,

    /// Config file (overrides COMPACT_NUMBER_CONFIG)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn locales_repeat() {
        let cli = Cli::parse_from([
            "cldr-extract",
            "--locale",
            "en",
            "--locale",
            "uk",
            "--pretty",
        ]);
        assert_eq!(cli.locales, vec!["en", "uk"]);
        assert!(cli.pretty);
        assert!(cli.cldr_dir.is_none());
    }
}
