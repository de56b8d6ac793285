//! BCP-47 language tags.
//!
//! Structural parsing, canonical casing, and add/remove-likely-subtags
//! (maximize/minimize) backed by a built-in subset of the CLDR
//! likely-subtags table. Extensions and variants are carried through
//! untouched apart from lowercasing.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Malformed tag | Bad subtag length/charset, duplicate variant/singleton | `InvalidLocaleTag` |
//! | Unknown language | Not in the likely-subtags table | maximize/minimize return the tag unchanged |

use std::fmt;
use std::str::FromStr;

use crate::error::{CompactError, Result};

/// Likely subtags: `language[-Script][-REGION]` → full `language-Script-REGION`.
const LIKELY_SUBTAGS: &[(&str, &str)] = &[
    ("af", "af-Latn-ZA"),
    ("am", "am-Ethi-ET"),
    ("ar", "ar-Arab-EG"),
    ("az", "az-Latn-AZ"),
    ("az-Arab", "az-Arab-IR"),
    ("az-IQ", "az-Arab-IQ"),
    ("az-IR", "az-Arab-IR"),
    ("be", "be-Cyrl-BY"),
    ("bg", "bg-Cyrl-BG"),
    ("bn", "bn-Beng-BD"),
    ("bs", "bs-Latn-BA"),
    ("ca", "ca-Latn-ES"),
    ("cs", "cs-Latn-CZ"),
    ("cy", "cy-Latn-GB"),
    ("da", "da-Latn-DK"),
    ("de", "de-Latn-DE"),
    ("el", "el-Grek-GR"),
    ("en", "en-Latn-US"),
    ("es", "es-Latn-ES"),
    ("et", "et-Latn-EE"),
    ("eu", "eu-Latn-ES"),
    ("fa", "fa-Arab-IR"),
    ("fi", "fi-Latn-FI"),
    ("fil", "fil-Latn-PH"),
    ("fr", "fr-Latn-FR"),
    ("ga", "ga-Latn-IE"),
    ("gl", "gl-Latn-ES"),
    ("gu", "gu-Gujr-IN"),
    ("he", "he-Hebr-IL"),
    ("hi", "hi-Deva-IN"),
    ("hr", "hr-Latn-HR"),
    ("hu", "hu-Latn-HU"),
    ("hy", "hy-Armn-AM"),
    ("id", "id-Latn-ID"),
    ("is", "is-Latn-IS"),
    ("it", "it-Latn-IT"),
    ("ja", "ja-Jpan-JP"),
    ("ka", "ka-Geor-GE"),
    ("kk", "kk-Cyrl-KZ"),
    ("kk-CN", "kk-Arab-CN"),
    ("km", "km-Khmr-KH"),
    ("kn", "kn-Knda-IN"),
    ("ko", "ko-Kore-KR"),
    ("lt", "lt-Latn-LT"),
    ("lv", "lv-Latn-LV"),
    ("mk", "mk-Cyrl-MK"),
    ("ml", "ml-Mlym-IN"),
    ("mn", "mn-Cyrl-MN"),
    ("mn-CN", "mn-Mong-CN"),
    ("mr", "mr-Deva-IN"),
    ("ms", "ms-Latn-MY"),
    ("my", "my-Mymr-MM"),
    ("nb", "nb-Latn-NO"),
    ("ne", "ne-Deva-NP"),
    ("nl", "nl-Latn-NL"),
    ("pa", "pa-Guru-IN"),
    ("pa-Arab", "pa-Arab-PK"),
    ("pa-PK", "pa-Arab-PK"),
    ("pl", "pl-Latn-PL"),
    ("pt", "pt-Latn-BR"),
    ("ro", "ro-Latn-RO"),
    ("ru", "ru-Cyrl-RU"),
    ("sk", "sk-Latn-SK"),
    ("sl", "sl-Latn-SI"),
    ("sq", "sq-Latn-AL"),
    ("sr", "sr-Cyrl-RS"),
    ("sr-BA", "sr-Cyrl-BA"),
    ("sr-Latn", "sr-Latn-RS"),
    ("sr-ME", "sr-Latn-ME"),
    ("sr-RO", "sr-Latn-RO"),
    ("sr-RU", "sr-Latn-RU"),
    ("sv", "sv-Latn-SE"),
    ("sw", "sw-Latn-TZ"),
    ("ta", "ta-Taml-IN"),
    ("te", "te-Telu-IN"),
    ("th", "th-Thai-TH"),
    ("tr", "tr-Latn-TR"),
    ("uk", "uk-Cyrl-UA"),
    ("und", "en-Latn-US"),
    ("ur", "ur-Arab-PK"),
    ("uz", "uz-Latn-UZ"),
    ("uz-AF", "uz-Arab-AF"),
    ("uz-Arab", "uz-Arab-AF"),
    ("vi", "vi-Latn-VN"),
    ("yue", "yue-Hant-HK"),
    ("yue-CN", "yue-Hans-CN"),
    ("yue-Hans", "yue-Hans-CN"),
    ("zh", "zh-Hans-CN"),
    ("zh-HK", "zh-Hant-HK"),
    ("zh-Hant", "zh-Hant-TW"),
    ("zh-MO", "zh-Hant-MO"),
    ("zh-TW", "zh-Hant-TW"),
    ("zu", "zu-Latn-ZA"),
];

/// A structurally valid BCP-47 language tag in canonical casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag {
    language: String,
    script: Option<String>,
    region: Option<String>,
    variants: Vec<String>,
    /// Extension sequences including their singleton, e.g. `u-nu-arab`.
    extensions: Vec<String>,
    private_use: Option<String>,
}

impl LanguageTag {
    /// Parse and canonicalize a tag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocaleTag` if the tag is not well-formed.
    pub fn parse(tag: &str) -> Result<Self> {
        let invalid = || CompactError::InvalidLocaleTag(tag.to_string());
        if tag.is_empty() || !tag.is_ascii() {
            return Err(invalid());
        }

        let lower = tag.to_ascii_lowercase();
        let mut subtags = lower.split('-').peekable();

        let language = subtags.next().ok_or_else(invalid)?;
        let valid_language = matches!(language.len(), 2 | 3 | 5..=8)
            && language.bytes().all(|b| b.is_ascii_alphabetic());
        if !valid_language {
            return Err(invalid());
        }

        let mut parsed = Self {
            language: language.to_string(),
            script: None,
            region: None,
            variants: Vec::new(),
            extensions: Vec::new(),
            private_use: None,
        };

        if let Some(next) = subtags.peek() {
            if next.len() == 4 && next.bytes().all(|b| b.is_ascii_alphabetic()) {
                parsed.script = Some(title_case(next));
                subtags.next();
            }
        }

        if let Some(next) = subtags.peek() {
            let alpha_region = next.len() == 2 && next.bytes().all(|b| b.is_ascii_alphabetic());
            let numeric_region = next.len() == 3 && next.bytes().all(|b| b.is_ascii_digit());
            if alpha_region || numeric_region {
                parsed.region = Some(next.to_ascii_uppercase());
                subtags.next();
            }
        }

        while let Some(next) = subtags.peek() {
            if !is_variant(next) {
                break;
            }
            if parsed.variants.iter().any(|v| v == next) {
                return Err(invalid());
            }
            parsed.variants.push((*next).to_string());
            subtags.next();
        }

        let mut singletons: Vec<char> = Vec::new();
        while let Some(singleton) = subtags.next() {
            if singleton.len() != 1 || !singleton.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(invalid());
            }

            if singleton == "x" {
                let rest: Vec<&str> = subtags.by_ref().collect();
                let valid = !rest.is_empty()
                    && rest
                        .iter()
                        .all(|s| (1..=8).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphanumeric()));
                if !valid {
                    return Err(invalid());
                }
                parsed.private_use = Some(format!("x-{}", rest.join("-")));
                break;
            }

            let key = singleton.chars().next().ok_or_else(invalid)?;
            if singletons.contains(&key) {
                return Err(invalid());
            }
            singletons.push(key);

            let mut parts = vec![singleton];
            while let Some(part) = subtags.peek() {
                if part.len() == 1 {
                    break;
                }
                if !(2..=8).contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_alphanumeric()) {
                    return Err(invalid());
                }
                parts.push(*part);
                subtags.next();
            }
            if parts.len() < 2 {
                return Err(invalid());
            }
            parsed.extensions.push(parts.join("-"));
        }

        Ok(parsed)
    }

    /// Primary language subtag.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Script subtag, if present.
    #[must_use]
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Region subtag, if present.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Whether the tag carries extensions or private-use subtags.
    #[must_use]
    pub fn has_extensions(&self) -> bool {
        !self.extensions.is_empty() || self.private_use.is_some()
    }

    /// The tag without extensions and private-use subtags.
    #[must_use]
    pub fn base(&self) -> Self {
        Self {
            extensions: Vec::new(),
            private_use: None,
            ..self.clone()
        }
    }

    /// Value of a Unicode extension keyword (`-u-<key>-<value>`).
    #[must_use]
    pub fn unicode_keyword(&self, key: &str) -> Option<String> {
        let extension = self.extensions.iter().find(|e| e.starts_with("u-"))?;
        let mut subtags = extension.split('-').skip(1).skip_while(|s| s.len() != 2);
        while let Some(current) = subtags.next() {
            let values: Vec<&str> = subtags.clone().take_while(|s| s.len() != 2).collect();
            if current == key {
                return Some(if values.is_empty() {
                    "true".to_string()
                } else {
                    values.join("-")
                });
            }
            for _ in 0..values.len() {
                subtags.next();
            }
        }
        None
    }

    /// Add likely subtags (`en` → `en-Latn-US`).
    ///
    /// Tags whose language is not in the table are returned unchanged.
    #[must_use]
    pub fn maximize(&self) -> Self {
        if self.script.is_some() && self.region.is_some() {
            return self.clone();
        }

        let mut candidates = Vec::with_capacity(3);
        if let Some(region) = &self.region {
            candidates.push(format!("{}-{region}", self.language));
        }
        if let Some(script) = &self.script {
            candidates.push(format!("{}-{script}", self.language));
        }
        candidates.push(self.language.clone());

        let Some(full) = candidates.iter().find_map(|key| lookup_likely(key)) else {
            return self.clone();
        };

        let mut parts = full.split('-');
        let language = parts.next().unwrap_or_default();
        let script = parts.next();
        let region = parts.next();

        Self {
            language: if self.language == "und" {
                language.to_string()
            } else {
                self.language.clone()
            },
            script: self.script.clone().or_else(|| script.map(str::to_string)),
            region: self.region.clone().or_else(|| region.map(str::to_string)),
            ..self.clone()
        }
    }

    /// Remove likely subtags (`en-Latn-US` → `en`, `zh-Hant-TW` → `zh-TW`).
    #[must_use]
    pub fn minimize(&self) -> Self {
        let max = self.maximize();
        if max.script.is_none() || max.region.is_none() {
            return self.clone();
        }

        let trials = [
            (None, None),
            (None, max.region.clone()),
            (max.script.clone(), None),
        ];
        for (script, region) in trials {
            let trial = Self {
                language: max.language.clone(),
                script,
                region,
                variants: Vec::new(),
                extensions: Vec::new(),
                private_use: None,
            };
            let expanded = trial.maximize();
            if expanded.script == max.script && expanded.region == max.region {
                return Self {
                    variants: self.variants.clone(),
                    extensions: self.extensions.clone(),
                    private_use: self.private_use.clone(),
                    ..trial
                };
            }
        }

        max
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        for subtag in self
            .script
            .iter()
            .chain(self.region.iter())
            .chain(self.variants.iter())
            .chain(self.extensions.iter())
            .chain(self.private_use.iter())
        {
            write!(f, "-{subtag}")?;
        }
        Ok(())
    }
}

impl FromStr for LanguageTag {
    type Err = CompactError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn lookup_likely(key: &str) -> Option<&'static str> {
    LIKELY_SUBTAGS
        .binary_search_by(|(k, _)| (*k).cmp(key))
        .ok()
        .map(|idx| LIKELY_SUBTAGS[idx].1)
}

fn is_variant(subtag: &str) -> bool {
    let alnum = subtag.bytes().all(|b| b.is_ascii_alphanumeric());
    match subtag.len() {
        5..=8 => alnum,
        4 => alnum && subtag.as_bytes()[0].is_ascii_digit(),
        _ => false,
    }
}

fn title_case(subtag: &str) -> String {
    let mut chars = subtag.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_uppercase().to_string() + chars.as_str()
    })
}

/// Canonicalize a requested locale list: validate, canonical casing, dedupe.
///
/// # Errors
///
/// Returns `InvalidLocaleTag` for the first malformed entry.
pub fn canonicalize_locale_list<S: AsRef<str>>(locales: &[S]) -> Result<Vec<String>> {
    let mut seen = Vec::with_capacity(locales.len());
    for locale in locales {
        let canonical = LanguageTag::parse(locale.as_ref())?.to_string();
        if !seen.contains(&canonical) {
            seen.push(canonical);
        }
    }
    Ok(seen)
}

/// Minimized string form of a tag.
///
/// # Errors
///
/// Returns `InvalidLocaleTag` if the tag is malformed.
pub fn minimize_tag(tag: &str) -> Result<String> {
    Ok(LanguageTag::parse(tag)?.minimize().to_string())
}
