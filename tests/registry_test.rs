//! Registry integration tests over extracted records on disk.

use std::sync::Arc;

use compact_number::core::registry::{LocaleDataOptions, LocaleDataRegistry, LocaleMatcher};
use compact_number::error::CompactError;
use compact_number::extract::generate_locale_data;
use compact_number::number::format::CldrNumberFormatFactory;
use compact_number::number::{FormatContext, format_compact_number};
use compact_number::storage::RuntimeConfig;
use compact_number::test_utils::{TestDir, fixture_locale_data};

mod common;
use common::fixtures::fixture_config;

fn extracted(locales: &[&str]) -> TestDir {
    let out = TestDir::new();
    generate_locale_data(&fixture_config(out.path(), locales)).unwrap();
    out
}

#[test]
fn load_dir_follows_manifest_order() {
    let out = extracted(&["uk", "en"]);
    let registry = LocaleDataRegistry::new();
    let loaded = registry.load_dir(out.path()).unwrap();
    assert_eq!(loaded, vec!["uk".to_string(), "en".to_string()]);
    assert_eq!(registry.default_locale().unwrap(), "uk");
}

#[test]
fn load_dir_without_manifest_uses_file_names() {
    let out = extracted(&["ja", "de"]);
    std::fs::remove_file(out.path().join("manifest.json")).unwrap();

    let registry = LocaleDataRegistry::new();
    let loaded = registry.load_dir(out.path()).unwrap();
    assert_eq!(loaded, vec!["de".to_string(), "ja".to_string()]);
}

#[test]
fn from_config_loads_and_sets_default() {
    let out = extracted(&["ar", "en"]);
    let runtime = RuntimeConfig {
        data_dir: Some(out.path().to_path_buf()),
        default_locale: Some("en-US".to_string()),
    };
    let registry = Arc::new(LocaleDataRegistry::from_config(&runtime).unwrap());
    assert_eq!(registry.default_locale().unwrap(), "en");

    let factory = CldrNumberFormatFactory::new(Arc::clone(&registry));
    let context = FormatContext::new("en-GB", registry);
    let number = format_compact_number(&factory, &context, 1500.0, None);
    assert_eq!(number.to_string(), "1.5K");
}

#[test]
fn from_config_rejects_unavailable_default() {
    let out = extracted(&["en"]);
    let runtime = RuntimeConfig {
        data_dir: Some(out.path().to_path_buf()),
        default_locale: Some("fr-FR".to_string()),
    };
    let err = LocaleDataRegistry::from_config(&runtime).unwrap_err();
    match err {
        CompactError::LocaleAndMinimizedUnavailable { locale, minimized } => {
            assert_eq!(locale, "fr-FR");
            assert_eq!(minimized, "fr");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unrelated_registrations_keep_the_default() {
    let registry = LocaleDataRegistry::new();
    registry.add_locale_data("en", fixture_locale_data("en")).unwrap();
    registry.add_locale_data("ja", fixture_locale_data("ja")).unwrap();
    registry.add_locale_data("uk", fixture_locale_data("uk")).unwrap();
    assert_eq!(registry.default_locale().unwrap(), "en");

    registry.set_default_locale("uk-UA").unwrap();
    assert_eq!(registry.default_locale().unwrap(), "uk");

    let err = registry.set_default_locale("fr").unwrap_err();
    assert!(matches!(err, CompactError::LocaleUnavailable { .. }));
    assert_eq!(registry.default_locale().unwrap(), "uk");
}

#[test]
fn unregistered_locale_falls_back_to_default_record() {
    let registry = LocaleDataRegistry::new();
    registry.add_locale_data("en", fixture_locale_data("en")).unwrap();
    registry.add_locale_data("ja", fixture_locale_data("ja")).unwrap();

    let data = registry
        .get_locale_data(&["fr-CA"], &LocaleDataOptions::default())
        .unwrap();
    assert_eq!(*data, fixture_locale_data("en"));

    let supported = registry
        .supported_locales_of(&["fr-CA", "ja-JP", "en-GB"], LocaleMatcher::BestFit)
        .unwrap();
    assert_eq!(supported, vec!["ja-JP".to_string(), "en-GB".to_string()]);
}

#[test]
fn empty_registry_reports_no_data() {
    let registry = LocaleDataRegistry::new();
    assert!(registry.is_empty());
    assert!(matches!(registry.default_locale(), Err(CompactError::NoDataLoaded)));
    assert!(matches!(
        registry.get_locale_data(&["en"], &LocaleDataOptions::default()),
        Err(CompactError::NoDataLoaded)
    ));
}

#[test]
fn concurrent_readers_see_consistent_snapshots() {
    let registry = Arc::new(LocaleDataRegistry::new());
    registry.add_locale_data("en", fixture_locale_data("en")).unwrap();

    let writer = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            for locale in ["ja", "uk", "de", "ar"] {
                registry.add_locale_data(locale, fixture_locale_data(locale)).unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let data = registry
                        .get_locale_data(&["en"], &LocaleDataOptions::default())
                        .unwrap();
                    assert!(data.supports_numbering_system("latn"));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(registry.default_locale().unwrap(), "en");
}
