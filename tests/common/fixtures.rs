#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use compact_number::core::models::NumberFormatLocaleData;
use compact_number::storage::{ConfigSources, ResolvedExtractConfig};
use compact_number::test_utils::{TestDir, fixture_cldr_dir, malformed_cldr_dir};

/// Extraction settings reading `cldr_dir` and writing into `out`.
pub fn extract_config(cldr_dir: PathBuf, out: &Path, locales: &[&str]) -> ResolvedExtractConfig {
    ResolvedExtractConfig {
        cldr_dir,
        out_dir: out.to_path_buf(),
        locales: locales.iter().map(|l| (*l).to_string()).collect(),
        pretty: false,
        sources: ConfigSources::default(),
    }
}

pub fn fixture_config(out: &Path, locales: &[&str]) -> ResolvedExtractConfig {
    extract_config(fixture_cldr_dir(), out, locales)
}

pub fn malformed_config(out: &Path, locales: &[&str]) -> ResolvedExtractConfig {
    extract_config(malformed_cldr_dir(), out, locales)
}

/// Read a persisted per-locale record.
pub fn read_record(dir: &Path, locale: &str) -> NumberFormatLocaleData {
    let content = fs::read_to_string(dir.join(format!("{locale}.json")))
        .unwrap_or_else(|e| panic!("record for {locale} is readable: {e}"));
    serde_json::from_str(&content).expect("record deserializes")
}

/// Copy one fixture locale into a scratch CLDR tree.
pub fn copy_fixture_locale(dir: &TestDir, locale: &str) {
    let source = fixture_cldr_dir().join("main").join(locale).join("numbers.json");
    let content = fs::read_to_string(source).expect("fixture is readable");
    dir.create_file(&format!("main/{locale}/numbers.json"), &content);
}
