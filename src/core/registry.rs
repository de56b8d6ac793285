//! Locale data registry and locale negotiation.
//!
//! The registry owns every loaded [`NumberFormatLocaleData`] record and
//! answers "which record serves this requested locale list".
//!
//! # Invariants
//!
//! 1. **Alias views**: a record registered as `en-US` is reachable as both
//!    `en-US` and its minimized tag `en`; both keys hold the same `Arc`.
//!
//! 2. **First registration wins the default**: the first successful
//!    `add_locale_data` sets the default locale; later registrations never
//!    change it. Only [`LocaleDataRegistry::set_default_locale`] does.
//!
//! 3. **Snapshot reads**: writers clone the current snapshot, mutate the
//!    clone, and swap it in under the write lock. Readers take an `Arc` to
//!    the current snapshot and never observe a half-applied registration.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Nothing loaded | Resolution before any registration | `NoDataLoaded` |
//! | Malformed request | Bad BCP-47 tag in the requested list | `InvalidLocaleTag` |
//! | No match | Requested locales unavailable | Falls back to default |

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::locale::{LanguageTag, canonicalize_locale_list};
use super::models::{DataManifest, NumberFormatLocaleData};
use crate::error::{CompactError, Result};
use crate::storage::config::RuntimeConfig;

/// File name of the manifest written next to per-locale records.
pub const MANIFEST_FILE: &str = "manifest.json";

// =============================================================================
// Negotiation Options
// =============================================================================

/// Locale matching strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocaleMatcher {
    /// RFC 4647 lookup: truncate subtags until something matches.
    #[serde(rename = "lookup")]
    Lookup,
    /// Lookup, then comparison of maximized tags.
    #[default]
    #[serde(rename = "best fit", alias = "best-fit", alias = "bestFit")]
    BestFit,
}

/// Options for [`LocaleDataRegistry::get_locale_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleDataOptions {
    /// Matching strategy.
    pub locale_matcher: LocaleMatcher,
    /// Preferred numbering system, overriding any `-u-nu-` extension.
    pub numbering_system: Option<String>,
}

/// Outcome of negotiating a requested locale list.
#[derive(Debug, Clone)]
pub struct ResolvedLocale {
    /// Resolved locale, including a supported `-u-nu-` extension.
    pub locale: String,
    /// Registry key the data was found under.
    pub data_locale: String,
    /// Numbering system to format with.
    pub numbering_system: String,
    /// The shared record.
    pub data: Arc<NumberFormatLocaleData>,
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Clone, Default)]
struct RegistrySnapshot {
    data: HashMap<String, Arc<NumberFormatLocaleData>>,
    available: BTreeSet<String>,
    default_locale: Option<String>,
}

impl RegistrySnapshot {
    fn default_locale(&self) -> Result<&str> {
        self.default_locale
            .as_deref()
            .ok_or(CompactError::NoDataLoaded)
    }

    /// Find the available tag serving `base` (a tag without extensions).
    ///
    /// `BestFit` only accepts a truncated lookup hit whose likely script
    /// agrees with the request, so `zh-HK` never lands on `zh` (Hans).
    fn match_locale(&self, base: &LanguageTag, matcher: LocaleMatcher) -> Option<String> {
        let found = lookup(&self.available, &base.to_string());
        match matcher {
            LocaleMatcher::Lookup => found,
            LocaleMatcher::BestFit => found
                .filter(|tag| same_likely_script(tag, base))
                .or_else(|| self.best_fit(base)),
        }
    }

    fn best_fit(&self, base: &LanguageTag) -> Option<String> {
        let max = base.maximize();
        if let Some(found) =
            lookup(&self.available, &max.to_string()).filter(|tag| same_likely_script(tag, &max))
        {
            return Some(found);
        }

        let mut same_script = None;
        for candidate in &self.available {
            let Ok(tag) = LanguageTag::parse(candidate) else {
                continue;
            };
            let expanded = tag.maximize();
            if expanded.language() != max.language() || expanded.script() != max.script() {
                continue;
            }
            if expanded.region() == max.region() {
                return Some(candidate.clone());
            }
            if same_script.is_none() {
                same_script = Some(candidate.clone());
            }
        }
        same_script
    }
}

fn same_likely_script(candidate: &str, requested: &LanguageTag) -> bool {
    LanguageTag::parse(candidate)
        .is_ok_and(|tag| tag.maximize().script() == requested.maximize().script())
}

/// RFC 4647 lookup of `tag` against `available`.
fn lookup(available: &BTreeSet<String>, tag: &str) -> Option<String> {
    let mut candidate = tag;
    loop {
        if available.contains(candidate) {
            return Some(candidate.to_string());
        }
        let mut cut = candidate.rfind('-')?;
        // Never leave a dangling singleton.
        if cut >= 2 && candidate.as_bytes()[cut - 2] == b'-' {
            cut -= 2;
        }
        candidate = &candidate[..cut];
    }
}

/// In-memory store of per-locale compact data with locale negotiation.
///
/// `Send + Sync`; share it as `Arc<LocaleDataRegistry>`.
///
/// # Example
///
/// ```
/// use compact_number::core::models::NumberFormatLocaleData;
/// use compact_number::core::registry::{LocaleDataOptions, LocaleDataRegistry};
///
/// let registry = LocaleDataRegistry::new();
/// registry.add_locale_data("en-US", NumberFormatLocaleData::default()).unwrap();
///
/// assert_eq!(registry.default_locale().unwrap(), "en");
/// let via_full = registry.get_locale_data(&["en-US"], &LocaleDataOptions::default()).unwrap();
/// let via_min = registry.get_locale_data(&["en"], &LocaleDataOptions::default()).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&via_full, &via_min));
/// ```
#[derive(Debug, Default)]
pub struct LocaleDataRegistry {
    state: RwLock<Arc<RegistrySnapshot>>,
}

impl LocaleDataRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from runtime configuration.
    ///
    /// Loads `data_dir` (if set) and applies the `default_locale` override.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be read or the default
    /// locale is not available.
    pub fn from_config(runtime: &RuntimeConfig) -> Result<Self> {
        let registry = Self::new();
        if let Some(dir) = &runtime.data_dir {
            registry.load_dir(dir)?;
        }
        if let Some(default_locale) = &runtime.default_locale {
            registry.set_default_locale(default_locale)?;
        }
        Ok(registry)
    }

    fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn update<R>(&self, apply: impl FnOnce(&mut RegistrySnapshot) -> Result<R>) -> Result<R> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistrySnapshot::clone(&guard);
        let outcome = apply(&mut next)?;
        *guard = Arc::new(next);
        Ok(outcome)
    }

    /// Register data for `locale` under its canonical and minimized tags.
    ///
    /// The first registration also sets the default locale (minimized tag).
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocaleTag` if `locale` is malformed.
    pub fn add_locale_data(
        &self,
        locale: &str,
        data: impl Into<Arc<NumberFormatLocaleData>>,
    ) -> Result<()> {
        let tag = LanguageTag::parse(locale)?;
        let canonical = tag.to_string();
        let minimized = tag.minimize().to_string();
        let data = data.into();

        let became_default = self.update(|state| {
            state.data.insert(canonical.clone(), Arc::clone(&data));
            state.data.insert(minimized.clone(), data);
            state.available.insert(canonical.clone());
            state.available.insert(minimized.clone());
            if state.default_locale.is_none() {
                state.default_locale = Some(minimized.clone());
                return Ok(true);
            }
            Ok(false)
        })?;

        tracing::debug!(
            locale = %canonical,
            minimized = %minimized,
            default = became_default,
            "Registered compact locale data"
        );
        Ok(())
    }

    /// Parse a persisted JSON record and register it.
    ///
    /// # Errors
    ///
    /// Returns `Json` for an invalid record or `InvalidLocaleTag`.
    pub fn add_locale_data_json(&self, locale: &str, json: &str) -> Result<()> {
        let data: NumberFormatLocaleData = serde_json::from_str(json)?;
        self.add_locale_data(locale, data)
    }

    /// Load every record listed in `<dir>/manifest.json`, in manifest order.
    ///
    /// Without a manifest, `*.json` files are loaded in file-name order.
    /// Returns the registered locales.
    ///
    /// # Errors
    ///
    /// Returns an error if a listed record cannot be read or parsed.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let locales = if manifest_path.exists() {
            let manifest: DataManifest = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
            manifest.locales
        } else {
            let mut found: Vec<String> = fs::read_dir(dir)?
                .filter_map(std::result::Result::ok)
                .filter_map(|entry| {
                    let path = entry.path();
                    let is_json = path.extension().is_some_and(|ext| ext == "json");
                    if !is_json {
                        return None;
                    }
                    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
                })
                .collect();
            found.sort();
            found
        };

        for locale in &locales {
            let record = fs::read_to_string(dir.join(format!("{locale}.json")))?;
            self.add_locale_data_json(locale, &record)?;
        }

        tracing::info!(
            dir = %dir.display(),
            count = locales.len(),
            "Loaded compact locale data"
        );
        Ok(locales)
    }

    /// Current default locale.
    ///
    /// # Errors
    ///
    /// Returns `NoDataLoaded` if nothing was ever registered.
    pub fn default_locale(&self) -> Result<String> {
        self.snapshot().default_locale().map(str::to_string)
    }

    /// Override the default locale.
    ///
    /// Accepts `tag` if it is available, otherwise its minimized form.
    ///
    /// # Errors
    ///
    /// Returns `LocaleUnavailable` when `tag` is unavailable and minimizes to
    /// itself, and `LocaleAndMinimizedUnavailable` when neither form is
    /// available.
    pub fn set_default_locale(&self, tag: &str) -> Result<()> {
        let canonical = LanguageTag::parse(tag)?;
        let canonical_str = canonical.to_string();

        let applied = self.update(|state| {
            let mut apply = canonical_str.clone();
            if !state.available.contains(&apply) {
                apply = canonical.minimize().to_string();
                if apply == canonical_str {
                    return Err(CompactError::LocaleUnavailable {
                        locale: tag.to_string(),
                    });
                }
                if !state.available.contains(&apply) {
                    return Err(CompactError::LocaleAndMinimizedUnavailable {
                        locale: tag.to_string(),
                        minimized: apply,
                    });
                }
            }
            state.default_locale = Some(apply.clone());
            Ok(apply)
        })?;

        tracing::debug!(requested = %tag, default = %applied, "Default compact locale changed");
        Ok(())
    }

    /// Every registered tag (full and minimized), sorted.
    #[must_use]
    pub fn available_locales(&self) -> Vec<String> {
        self.snapshot().available.iter().cloned().collect()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().available.is_empty()
    }

    /// Negotiate `requested` and return the matching record.
    ///
    /// Falls back to the default locale when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocaleTag` for malformed requests and `NoDataLoaded`
    /// if the fallback is needed but nothing was registered.
    pub fn get_locale_data<S: AsRef<str>>(
        &self,
        requested: &[S],
        options: &LocaleDataOptions,
    ) -> Result<Arc<NumberFormatLocaleData>> {
        self.resolve_locale(requested, options).map(|resolved| resolved.data)
    }

    /// Negotiate `requested` and return the resolved locale, numbering
    /// system, and record.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_locale_data`].
    pub fn resolve_locale<S: AsRef<str>>(
        &self,
        requested: &[S],
        options: &LocaleDataOptions,
    ) -> Result<ResolvedLocale> {
        let requested = canonicalize_locale_list(requested)?;
        let state = self.snapshot();

        let mut matched = None;
        for locale in &requested {
            let tag = LanguageTag::parse(locale)?;
            if let Some(found) = state.match_locale(&tag.base(), options.locale_matcher) {
                matched = Some((found, tag.unicode_keyword("nu")));
                break;
            }
        }

        let (data_locale, extension_nu) = match matched {
            Some(found) => found,
            None => {
                let fallback = state.default_locale()?.to_string();
                tracing::debug!(
                    requested = ?requested,
                    fallback = %fallback,
                    "No requested locale available, using default"
                );
                (fallback, None)
            }
        };

        let data = state
            .data
            .get(&data_locale)
            .cloned()
            .ok_or_else(|| CompactError::MissingLocaleData {
                locale: data_locale.clone(),
            })?;

        let extension_nu = extension_nu.filter(|nu| data.supports_numbering_system(nu));
        let option_nu = options
            .numbering_system
            .as_deref()
            .filter(|nu| data.supports_numbering_system(nu));

        let mut locale = data_locale.clone();
        if let Some(nu) = &extension_nu {
            if option_nu.is_none_or(|opt| opt == nu) {
                locale = format!("{data_locale}-u-nu-{nu}");
            }
        }

        let numbering_system = option_nu
            .map(str::to_string)
            .or(extension_nu)
            .unwrap_or_else(|| data.preferred_numbering_system().to_string());

        Ok(ResolvedLocale {
            locale,
            data_locale,
            numbering_system,
            data,
        })
    }

    /// The subset of `requested` that is served without falling back.
    ///
    /// Order is preserved; entries are returned in canonical form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocaleTag` for malformed requests.
    pub fn supported_locales_of<S: AsRef<str>>(
        &self,
        requested: &[S],
        matcher: LocaleMatcher,
    ) -> Result<Vec<String>> {
        let requested = canonicalize_locale_list(requested)?;
        let state = self.snapshot();

        let mut supported = Vec::with_capacity(requested.len());
        for locale in requested {
            let tag = LanguageTag::parse(&locale)?;
            if state.match_locale(&tag.base(), matcher).is_some() {
                supported.push(locale);
            }
        }
        Ok(supported)
    }
}
