//! Integration test for subscriber installation.
//!
//! `init` installs a process-wide subscriber, so this binary holds a single test.

use compact_number::core::logging::{self, LogFormat, LogLevel};
use compact_number::test_utils::TestDir;

#[test]
fn json_logs_are_appended_to_the_log_file() {
    let dir = TestDir::new();
    let path = dir.file_path("cldr-extract.log");

    logging::init(LogLevel::Info, LogFormat::Json, Some(path.clone()), false);
    tracing::info!(target: "compact_number", locales = 3, "Extraction finished");
    tracing::debug!(target: "compact_number", "filtered out at info");

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect();
    assert_eq!(lines.len(), 1, "log file: {content}");
    assert_eq!(lines[0]["level"], "INFO");
    assert_eq!(lines[0]["fields"]["message"], "Extraction finished");
    assert_eq!(lines[0]["fields"]["locales"], 3);
}
