//! Locale data model for compact number formatting.
//!
//! These types mirror the persisted per-locale record produced by the
//! extraction pipeline:
//!
//! ```json
//! {
//!   "numberingSystems": ["latn"],
//!   "decimal":  { "latn": { "short": { "1000": { "one": "0K" } }, "long": { } } },
//!   "currency": { "latn": { "short": { "1000": { "one": "¤0K" } } } }
//! }
//! ```
//!
//! Records are immutable once built and are shared as `Arc`s by the registry.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::plural::PluralCategory;

/// Numbering system used when a record names none.
pub const DEFAULT_NUMBERING_SYSTEM: &str = "latn";

// =============================================================================
// Compact Display
// =============================================================================

/// Which compact style table to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompactDisplay {
    /// Abbreviated form ("1.5K").
    #[default]
    Short,
    /// Spelled-out form ("1.5 thousand").
    Long,
}

impl CompactDisplay {
    /// CLDR node name for this style.
    #[must_use]
    pub const fn node_name(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for CompactDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_name())
    }
}

// =============================================================================
// Pattern Tables
// =============================================================================

/// Patterns for one magnitude bucket, keyed by plural category.
pub type PluralPatterns = BTreeMap<PluralCategory, String>;

/// Magnitude thresholds (powers of ten) mapped to their plural patterns.
///
/// Keys are ordered numerically, so iteration walks buckets from the
/// smallest magnitude upwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactPatternTable(BTreeMap<u64, PluralPatterns>);

impl CompactPatternTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pattern unless one is already present for the bucket/category.
    ///
    /// Returns `true` if the pattern was stored.
    pub fn insert_if_absent(
        &mut self,
        threshold: u64,
        category: PluralCategory,
        pattern: impl Into<String>,
    ) -> bool {
        let bucket = self.0.entry(threshold).or_default();
        if bucket.contains_key(&category) {
            return false;
        }
        bucket.insert(category, pattern.into());
        true
    }

    /// Patterns for an exact threshold.
    #[must_use]
    pub fn bucket(&self, threshold: u64) -> Option<&PluralPatterns> {
        self.0.get(&threshold)
    }

    /// Largest threshold not exceeding `value`, with its patterns.
    #[must_use]
    pub fn bucket_for(&self, value: f64) -> Option<(u64, &PluralPatterns)> {
        self.0
            .iter()
            .rev()
            .find(|(threshold, _)| **threshold as f64 <= value)
            .map(|(threshold, patterns)| (*threshold, patterns))
    }

    /// Smallest threshold in the table.
    #[must_use]
    pub fn first_threshold(&self) -> Option<u64> {
        self.0.keys().next().copied()
    }

    /// Iterate buckets in ascending threshold order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &PluralPatterns)> {
        self.0.iter().map(|(threshold, patterns)| (*threshold, patterns))
    }

    /// Number of magnitude buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Select the pattern for `category`, falling back to `other`, then to any.
#[must_use]
pub fn select_pattern(patterns: &PluralPatterns, category: PluralCategory) -> Option<&str> {
    patterns
        .get(&category)
        .or_else(|| patterns.get(&PluralCategory::Other))
        .or_else(|| patterns.values().next())
        .map(String::as_str)
}

/// Short and long tables for one numbering system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactStyles {
    /// Abbreviated patterns.
    #[serde(default)]
    pub short: CompactPatternTable,
    /// Spelled-out patterns. Always present for decimal tables, absent for
    /// currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<CompactPatternTable>,
}

static EMPTY_TABLE: CompactPatternTable = CompactPatternTable(BTreeMap::new());

impl CompactStyles {
    /// Table for the given display style; a missing `long` reads as empty.
    #[must_use]
    pub fn style(&self, display: CompactDisplay) -> &CompactPatternTable {
        match display {
            CompactDisplay::Short => &self.short,
            CompactDisplay::Long => self.long.as_ref().unwrap_or(&EMPTY_TABLE),
        }
    }

    /// Mutable table for the given display style, creating `long` on demand.
    pub fn style_mut(&mut self, display: CompactDisplay) -> &mut CompactPatternTable {
        match display {
            CompactDisplay::Short => &mut self.short,
            CompactDisplay::Long => self.long.get_or_insert_with(CompactPatternTable::new),
        }
    }
}

/// Compact tables for every numbering system of one format type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleCompactTable(BTreeMap<String, CompactStyles>);

impl LocaleCompactTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Styles for a numbering system.
    #[must_use]
    pub fn get(&self, numbering_system: &str) -> Option<&CompactStyles> {
        self.0.get(numbering_system)
    }

    /// Store the styles for a numbering system, replacing earlier ones.
    pub fn insert(&mut self, numbering_system: impl Into<String>, styles: CompactStyles) {
        self.0.insert(numbering_system.into(), styles);
    }

    /// Numbering systems covered by this table.
    pub fn numbering_systems(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether the table covers no numbering system.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Symbols
// =============================================================================

/// Number symbols for one numbering system.
///
/// Missing fields take the `latn` defaults; unknown CLDR symbols are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumberSymbols {
    pub decimal: String,
    pub group: String,
    pub minus_sign: String,
    pub plus_sign: String,
}

impl Default for NumberSymbols {
    fn default() -> Self {
        Self {
            decimal: ".".to_string(),
            group: ",".to_string(),
            minus_sign: "-".to_string(),
            plus_sign: "+".to_string(),
        }
    }
}

// =============================================================================
// Locale Record
// =============================================================================

/// Which table family a compact lookup reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Decimal,
    Currency,
}

impl TableKind {
    /// Key used in the persisted record.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Currency => "currency",
        }
    }
}

/// Compact formatting data for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFormatLocaleData {
    /// Every numbering system seen in the decimal or currency tables.
    pub numbering_systems: Vec<String>,
    /// CLDR default numbering system for the locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_numbering_system: Option<String>,
    /// Decimal compact patterns.
    #[serde(default)]
    pub decimal: LocaleCompactTable,
    /// Currency compact patterns (short only).
    #[serde(default)]
    pub currency: LocaleCompactTable,
    /// Number symbols per numbering system.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub symbols: BTreeMap<String, NumberSymbols>,
}

impl NumberFormatLocaleData {
    /// Table family by kind.
    #[must_use]
    pub const fn table(&self, kind: TableKind) -> &LocaleCompactTable {
        match kind {
            TableKind::Decimal => &self.decimal,
            TableKind::Currency => &self.currency,
        }
    }

    /// Whether `numbering_system` is listed by this record.
    #[must_use]
    pub fn supports_numbering_system(&self, numbering_system: &str) -> bool {
        self.numbering_systems.iter().any(|nu| nu == numbering_system)
    }

    /// Numbering system used when none is requested.
    #[must_use]
    pub fn preferred_numbering_system(&self) -> &str {
        self.default_numbering_system
            .as_deref()
            .filter(|nu| self.supports_numbering_system(nu))
            .or_else(|| self.numbering_systems.first().map(String::as_str))
            .unwrap_or(DEFAULT_NUMBERING_SYSTEM)
    }

    /// Styles for `numbering_system`, falling back to the first listed system.
    #[must_use]
    pub fn styles(&self, kind: TableKind, numbering_system: &str) -> Option<&CompactStyles> {
        let table = self.table(kind);
        table.get(numbering_system).or_else(|| {
            self.numbering_systems
                .first()
                .and_then(|first| table.get(first))
        })
    }

    /// Symbols for `numbering_system`, falling back to `latn`, then defaults.
    #[must_use]
    pub fn symbols_for(&self, numbering_system: &str) -> NumberSymbols {
        self.symbols
            .get(numbering_system)
            .or_else(|| self.symbols.get(DEFAULT_NUMBERING_SYSTEM))
            .cloned()
            .unwrap_or_default()
    }
}

/// Index written next to the per-locale records of an output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataManifest {
    /// Locales in the order they were extracted.
    pub locales: Vec<String>,
}
