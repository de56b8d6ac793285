//! Test utilities for compact-number.
//!
//! Provides shared helpers, fixture loaders, instrumented formatter
//! factories, and assertion macros for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use compact_number::test_utils::*;
//!
//! let registry = fixture_registry();
//! let factory = CountingFactory::new(Arc::clone(&registry));
//! let errors = ErrorCollector::new();
//! let context = FormatContext::new("en", registry).with_error_reporter(errors.reporter());
//! ```

use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::models::NumberFormatLocaleData;
use crate::core::registry::LocaleDataRegistry;
use crate::error::{CompactError, ErrorReporter, Result};
use crate::extract::extract_locale_data;
use crate::number::format::{
    CldrNumberFormatFactory, NumberFormat, NumberFormatFactory, NumberFormatPart,
};
use crate::number::options::{NumberFormatOptions, ResolvedNumberFormatOptions};

// =============================================================================
// CLDR Fixtures
// =============================================================================

/// Raw CLDR `numbers.json` documents shipped with the test suite.
pub const FIXTURE_DOCUMENTS: &[(&str, &str)] = &[
    ("ar", include_str!("../tests/fixtures/cldr/main/ar/numbers.json")),
    ("de", include_str!("../tests/fixtures/cldr/main/de/numbers.json")),
    ("en", include_str!("../tests/fixtures/cldr/main/en/numbers.json")),
    ("ja", include_str!("../tests/fixtures/cldr/main/ja/numbers.json")),
    ("uk", include_str!("../tests/fixtures/cldr/main/uk/numbers.json")),
];

/// Root of the well-formed CLDR fixture tree (contains `main/`).
#[must_use]
pub fn fixture_cldr_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cldr")
}

/// Root of the malformed CLDR fixture tree.
#[must_use]
pub fn malformed_cldr_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cldr-malformed")
}

/// Extract one fixture locale.
///
/// # Panics
///
/// Panics if the locale has no fixture or the fixture does not extract cleanly.
#[must_use]
pub fn fixture_locale_data(locale: &str) -> NumberFormatLocaleData {
    let (_, raw) = FIXTURE_DOCUMENTS
        .iter()
        .find(|(name, _)| *name == locale)
        .unwrap_or_else(|| panic!("no CLDR fixture for {locale}"));
    let document: serde_json::Value =
        serde_json::from_str(raw).expect("CLDR fixture is valid JSON");
    let (data, warnings) =
        extract_locale_data(locale, &document).expect("CLDR fixture has a numbers node");
    assert!(warnings.is_empty(), "fixture {locale} produced warnings: {warnings:?}");
    data
}

/// Registry holding the given fixture locales; the first becomes the default.
///
/// # Panics
///
/// Panics if a fixture cannot be registered.
#[must_use]
pub fn fixture_registry_with(locales: &[&str]) -> Arc<LocaleDataRegistry> {
    let registry = LocaleDataRegistry::new();
    for locale in locales {
        registry
            .add_locale_data(locale, fixture_locale_data(locale))
            .expect("fixture locale registers");
    }
    Arc::new(registry)
}

/// Registry holding every fixture locale, with `en` as the default.
#[must_use]
pub fn fixture_registry() -> Arc<LocaleDataRegistry> {
    fixture_registry_with(&["en", "ar", "de", "ja", "uk"])
}

// =============================================================================
// Error Capture
// =============================================================================

/// Collects reported errors as `(error_code, message)` pairs.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    errors: Arc<Mutex<Vec<(String, String)>>>,
}

impl ErrorCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that appends to this collector.
    #[must_use]
    pub fn reporter(&self) -> ErrorReporter {
        let errors = Arc::clone(&self.errors);
        Arc::new(move |error: &CompactError| {
            errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((error.error_code().to_string(), error.to_string()));
        })
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|(code, _)| code).collect()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|(_, message)| message).collect()
    }

    fn snapshot(&self) -> Vec<(String, String)> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// =============================================================================
// Instrumented Factories
// =============================================================================

/// Call counters shared between a [`CountingFactory`] and its formatters.
#[derive(Debug, Clone, Default)]
pub struct CallCounts {
    pub constructions: Arc<AtomicUsize>,
    pub format: Arc<AtomicUsize>,
    pub format_to_parts: Arc<AtomicUsize>,
}

impl CallCounts {
    #[must_use]
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn format(&self) -> usize {
        self.format.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn format_to_parts(&self) -> usize {
        self.format_to_parts.load(Ordering::SeqCst)
    }
}

/// Wraps [`CldrNumberFormatFactory`] and counts primitive invocations.
///
/// With [`CountingFactory::failing_formats`], every produced formatter
/// errors on `format` and `format_to_parts`.
#[derive(Debug, Clone)]
pub struct CountingFactory {
    inner: CldrNumberFormatFactory,
    counts: CallCounts,
    fail_formats: bool,
}

impl CountingFactory {
    #[must_use]
    pub fn new(registry: Arc<LocaleDataRegistry>) -> Self {
        Self {
            inner: CldrNumberFormatFactory::new(registry),
            counts: CallCounts::default(),
            fail_formats: false,
        }
    }

    /// Produce formatters whose outputs always fail.
    #[must_use]
    pub fn failing_formats(mut self) -> Self {
        self.fail_formats = true;
        self
    }

    #[must_use]
    pub const fn counts(&self) -> &CallCounts {
        &self.counts
    }
}

impl NumberFormatFactory for CountingFactory {
    fn number_format(
        &self,
        locales: &[String],
        options: &NumberFormatOptions,
    ) -> Result<Box<dyn NumberFormat + Send + Sync>> {
        self.counts.constructions.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.number_format(locales, options)?;
        Ok(Box::new(CountingFormat {
            inner,
            counts: self.counts.clone(),
            fail: self.fail_formats,
        }))
    }
}

#[derive(Debug)]
struct CountingFormat {
    inner: Box<dyn NumberFormat + Send + Sync>,
    counts: CallCounts,
    fail: bool,
}

impl CountingFormat {
    fn injected_failure(&self) -> Result<()> {
        if self.fail {
            return Err(CompactError::Other(anyhow::anyhow!("injected format failure")));
        }
        Ok(())
    }
}

impl NumberFormat for CountingFormat {
    fn format(&self, value: f64) -> Result<String> {
        self.counts.format.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        self.inner.format(value)
    }

    fn format_to_parts(&self, value: f64) -> Result<Vec<NumberFormatPart>> {
        self.counts.format_to_parts.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        self.inner.format_to_parts(value)
    }

    fn resolved_options(&self) -> &ResolvedNumberFormatOptions {
        self.inner.resolved_options()
    }
}

/// Factory whose construction always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingFactory;

impl NumberFormatFactory for FailingFactory {
    fn number_format(
        &self,
        _locales: &[String],
        _options: &NumberFormatOptions,
    ) -> Result<Box<dyn NumberFormat + Send + Sync>> {
        Err(CompactError::UnsupportedOption {
            option: "notation".to_string(),
            value: "compact".to_string(),
        })
    }
}

// =============================================================================
// Temporary Directories
// =============================================================================

/// Isolated temporary directory, deleted when the `TestDir` is dropped.
/// Uses the `tempfile` crate internally.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content. Creates parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
///
/// ```rust,ignore
/// use compact_number::assert_contains;
///
/// assert_contains!("1.5K", "K");
/// ```
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that two floats are equal within an epsilon.
///
/// ```rust,ignore
/// use compact_number::assert_float_eq;
///
/// assert_float_eq!(1500.0, 1500.0);
/// assert_float_eq!(0.1 + 0.2, 0.3, 0.001);
/// ```
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_float_eq!($left, $right, f64::EPSILON * 100.0)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() <= epsilon * right.abs().max(1.0),
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    }};
}
