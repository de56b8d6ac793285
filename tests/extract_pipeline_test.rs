//! Integration tests for the CLDR extraction pipeline.
//!
//! Covers:
//! - Batch extraction of the fixture tree with manifest output
//! - Parity between persisted records and in-memory extraction
//! - Malformed tables and locales being skipped with warnings

use std::fs;

use compact_number::core::models::{CompactDisplay, DataManifest, TableKind};
use compact_number::core::plural::PluralCategory;
use compact_number::error::CompactError;
use compact_number::extract::{available_locales, generate_locale_data};
use compact_number::test_utils::{TestDir, fixture_cldr_dir, fixture_locale_data};

mod common;
use common::fixtures::{fixture_config, malformed_config, read_record};
use common::log_capture::TestLogCapture;

const FIXTURE_LOCALES: [&str; 5] = ["ar", "de", "en", "ja", "uk"];

#[test]
fn lists_every_fixture_locale_sorted() {
    let locales = available_locales(&fixture_cldr_dir()).unwrap();
    assert_eq!(locales, FIXTURE_LOCALES);
}

#[test]
fn extracts_every_locale_with_manifest() {
    let out = TestDir::new();
    let report = generate_locale_data(&fixture_config(out.path(), &[])).unwrap();

    assert_eq!(report.locales, FIXTURE_LOCALES);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    assert_eq!(report.written_files.len(), FIXTURE_LOCALES.len() + 1);
    assert!(report.total_bytes() > 0);

    let manifest: DataManifest =
        serde_json::from_str(&out.read_file("manifest.json").unwrap()).unwrap();
    assert_eq!(manifest.locales, FIXTURE_LOCALES);
    for locale in FIXTURE_LOCALES {
        assert!(out.file_exists(&format!("{locale}.json")), "{locale}.json written");
    }
}

#[test]
fn persisted_records_match_in_memory_extraction() {
    let out = TestDir::new();
    generate_locale_data(&fixture_config(out.path(), &["en", "ja"])).unwrap();

    assert_eq!(read_record(out.path(), "en"), fixture_locale_data("en"));
    assert_eq!(read_record(out.path(), "ja"), fixture_locale_data("ja"));
    assert!(!out.file_exists("uk.json"));
}

#[test]
fn alt_variants_never_replace_plain_patterns() {
    let data = fixture_locale_data("en");
    let styles = data.styles(TableKind::Currency, "latn").unwrap();
    let bucket = styles.style(CompactDisplay::Short).bucket(1000).unwrap();
    assert_eq!(bucket[&PluralCategory::One], "¤0K");
    assert_eq!(bucket[&PluralCategory::Other], "¤0K");
    assert!(styles.long.is_none());
}

#[test]
fn numbering_systems_follow_document_order() {
    let data = fixture_locale_data("ar");
    assert_eq!(data.numbering_systems, vec!["arab".to_string(), "latn".to_string()]);
    assert_eq!(data.default_numbering_system.as_deref(), Some("arab"));
    assert_eq!(data.symbols["arab"].decimal, "٫");
    assert_eq!(data.preferred_numbering_system(), "arab");
}

#[test]
fn long_tables_keep_plural_forms() {
    let data = fixture_locale_data("uk");
    let long = data.decimal.get("latn").unwrap().style(CompactDisplay::Long);
    let bucket = long.bucket(1_000_000).unwrap();
    assert_eq!(bucket[&PluralCategory::One], "0 мільйон");
    assert_eq!(bucket[&PluralCategory::Many], "0 мільйонів");
}

#[test]
fn pretty_output_is_indented() {
    let out = TestDir::new();
    let mut config = fixture_config(out.path(), &["de"]);
    config.pretty = true;
    generate_locale_data(&config).unwrap();

    let record = out.read_file("de.json").unwrap();
    assert!(record.contains("\n  \"numberingSystems\""));
}

#[test]
fn malformed_tables_and_locales_are_skipped() {
    let capture = TestLogCapture::start();
    let out = TestDir::new();
    let report =
        generate_locale_data(&malformed_config(out.path(), &["es", "fr", "it", "zz"])).unwrap();

    assert_eq!(report.locales, vec!["fr".to_string()]);
    // fr: arab table without "long", currency table with an unknown count.
    // es: truncated JSON. it: no numbers node. zz: no such directory.
    assert_eq!(report.warnings.len(), 5, "warnings: {:?}", report.warnings);

    let table_warnings = report
        .warnings
        .iter()
        .filter(|w| matches!(w, CompactError::MalformedCldrTable { numbering_system: Some(_), .. }))
        .count();
    assert_eq!(table_warnings, 2);

    let fr = read_record(out.path(), "fr");
    assert_eq!(fr.numbering_systems, vec!["latn".to_string()]);
    assert!(fr.decimal.get("arab").is_none());
    assert!(fr.currency.get("latn").is_none());
    assert_eq!(fr.symbols["latn"].decimal, ",");

    capture.assert_logged_at_level(tracing::Level::WARN, "Skipping malformed CLDR table");
    capture.assert_logged_at_level(tracing::Level::WARN, "Skipping malformed CLDR locale");
    capture.assert_field_logged("locale", "fr");
    capture.assert_no_errors();

    let manifest = fs::read_to_string(out.path().join("manifest.json")).unwrap();
    assert_eq!(manifest, r#"{"locales":["fr"]}"#);
}

#[test]
fn invalid_locale_names_are_skipped() {
    let out = TestDir::new();
    let report = generate_locale_data(&fixture_config(out.path(), &["en", "not a tag"])).unwrap();
    assert_eq!(report.locales, vec!["en".to_string()]);
    assert!(matches!(report.warnings[0], CompactError::InvalidLocaleTag(_)));
}

#[test]
fn missing_cldr_directory_is_an_io_error() {
    let out = TestDir::new();
    let config = common::fixtures::extract_config(out.path().join("nowhere"), out.path(), &[]);
    let err = generate_locale_data(&config).unwrap_err();
    assert!(matches!(err, CompactError::Io(_)));
}
