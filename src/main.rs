//! cldr-extract
//!
//! Builds per-locale compact number records from CLDR `numbers.json` files.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use clap::Parser;

use compact_number::cli::Cli;
use compact_number::core::logging;
use compact_number::extract::{self, ExtractionReport};
use compact_number::storage::ResolvedExtractConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::parse_log_level_from_env)
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    match run(&cli) {
        Ok(report) => {
            print_summary(&report, cli.json_output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("error[{}]: {e}", e.error_code());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> compact_number::Result<ExtractionReport> {
    let config = ResolvedExtractConfig::resolve(cli)?;
    tracing::debug!(
        cldr_dir = %config.cldr_dir.display(),
        cldr_dir_source = %config.sources.cldr_dir,
        out_dir = %config.out_dir.display(),
        out_dir_source = %config.sources.out_dir,
        locales = config.locales.len(),
        pretty = config.pretty,
        "Resolved extraction config"
    );
    extract::generate_locale_data(&config)
}

fn print_summary(report: &ExtractionReport, json: bool) {
    if json {
        let summary = serde_json::json!({
            "locales": report.locales,
            "bytes": report.total_bytes(),
            "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{summary}");
        return;
    }

    for (path, size) in &report.written_files {
        println!("{:>10}  {}", size, path.display());
    }
    println!(
        "Wrote {} locale(s), {} bytes",
        report.locales.len(),
        report.total_bytes()
    );
    if !report.warnings.is_empty() {
        eprintln!("{} table(s) or locale(s) skipped:", report.warnings.len());
        for warning in &report.warnings {
            eprintln!("  - {warning}");
        }
    }
}
