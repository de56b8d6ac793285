//! Locale data model, locale tags, plural rules, and the data registry.

pub mod locale;
pub mod logging;
pub mod models;
pub mod plural;
pub mod registry;

pub use locale::{LanguageTag, canonicalize_locale_list, minimize_tag};
pub use models::{
    CompactDisplay, CompactPatternTable, CompactStyles, DataManifest, LocaleCompactTable,
    NumberFormatLocaleData, NumberSymbols, PluralPatterns, TableKind,
};
pub use plural::{PluralCategory, PluralOperands, PluralRule};
pub use registry::{LocaleDataOptions, LocaleDataRegistry, LocaleMatcher, ResolvedLocale};
