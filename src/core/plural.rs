//! CLDR plural categories and rule families.
//!
//! Only the cardinal rules needed to pick compact patterns are modelled.
//! Locales are grouped into families that share a rule; unknown languages
//! use the English-style `one`/`other` split.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grammatical-number class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// All categories in CLDR order.
    pub const ALL: &'static [Self] = &[
        Self::Zero,
        Self::One,
        Self::Two,
        Self::Few,
        Self::Many,
        Self::Other,
    ];

    /// CLDR keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }

    /// Parse a CLDR keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == keyword)
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plural operands of a decimal number as displayed.
///
/// `i` is the integer part, `v` the count of visible fraction digits and
/// `f` the visible fraction digits as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluralOperands {
    pub i: u64,
    pub v: usize,
    pub f: u64,
}

impl PluralOperands {
    /// Operands from the integer and fraction digit strings of a rendering.
    #[must_use]
    pub fn from_digits(integer: &str, fraction: &str) -> Self {
        Self {
            i: parse_tail(integer),
            v: fraction.len(),
            f: parse_tail(fraction),
        }
    }

    /// Operands of an integer.
    #[must_use]
    pub const fn integer(value: u64) -> Self {
        Self { i: value, v: 0, f: 0 }
    }
}

/// Parse at most the last 18 digits; rules only look at small remainders.
fn parse_tail(digits: &str) -> u64 {
    let start = digits.len().saturating_sub(18);
    digits[start..].parse().unwrap_or(0)
}

/// Cardinal plural rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// No distinctions (ja, zh, ko, th, vi, id, ...).
    OtherOnly,
    /// `one` for integer 1 (en, de, nl, it, es, ...).
    OneOther,
    /// `one` for 0 and 1 integer parts (fr, pt, hi).
    ZeroOneOther,
    /// East Slavic one/few/many (uk, ru, be).
    EastSlavic,
    /// Polish one/few/many.
    Polish,
    /// Czech and Slovak one/few/many.
    CzechSlovak,
    /// Arabic zero/one/two/few/many.
    Arabic,
}

impl PluralRule {
    /// Rule for a locale tag, by primary language subtag.
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        let language = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "ja" | "zh" | "ko" | "th" | "vi" | "id" | "ms" | "lo" | "my" | "km" | "yue" => {
                Self::OtherOnly
            }
            "fr" | "pt" | "hi" | "bn" | "fa" | "zu" | "am" => Self::ZeroOneOther,
            "uk" | "ru" | "be" => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::CzechSlovak,
            "ar" => Self::Arabic,
            _ => Self::OneOther,
        }
    }

    /// Category for the given operands.
    #[must_use]
    pub const fn select(self, op: PluralOperands) -> PluralCategory {
        let PluralOperands { i, v, f } = op;
        match self {
            Self::OtherOnly => PluralCategory::Other,
            Self::OneOther => {
                if i == 1 && v == 0 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::ZeroOneOther => {
                if i == 0 || i == 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::EastSlavic => {
                if v != 0 {
                    return PluralCategory::Other;
                }
                let (m10, m100) = (i % 10, i % 100);
                if m10 == 1 && m100 != 11 {
                    PluralCategory::One
                } else if m10 >= 2 && m10 <= 4 && !(m100 >= 12 && m100 <= 14) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
            Self::Polish => {
                if v != 0 {
                    return PluralCategory::Other;
                }
                let (m10, m100) = (i % 10, i % 100);
                if i == 1 {
                    PluralCategory::One
                } else if m10 >= 2 && m10 <= 4 && !(m100 >= 12 && m100 <= 14) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
            Self::CzechSlovak => {
                if v != 0 {
                    PluralCategory::Many
                } else if i == 1 {
                    PluralCategory::One
                } else if i >= 2 && i <= 4 {
                    PluralCategory::Few
                } else {
                    PluralCategory::Other
                }
            }
            Self::Arabic => {
                if v != 0 || f != 0 {
                    return PluralCategory::Other;
                }
                let m100 = i % 100;
                match i {
                    0 => PluralCategory::Zero,
                    1 => PluralCategory::One,
                    2 => PluralCategory::Two,
                    _ if m100 >= 3 && m100 <= 10 => PluralCategory::Few,
                    _ if m100 >= 11 => PluralCategory::Many,
                    _ => PluralCategory::Other,
                }
            }
        }
    }
}
