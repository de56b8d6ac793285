//! Number formatting primitive: the traits the compact engine consumes and
//! a reference implementation rendering CLDR compact patterns.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::compact::{compact_table, compute_exponent};
use super::decimal::{RoundedDecimal, rescale, round};
use super::options::{
    CurrencyDisplay, DigitRange, Notation, NumberFormatOptions, ResolvedNumberFormatOptions,
    SignDisplay, Style, UseGrouping, currency_digits, resolve_digit_options,
};
use crate::core::models::{CompactPatternTable, NumberFormatLocaleData, NumberSymbols, select_pattern};
use crate::core::plural::PluralRule;
use crate::core::registry::{LocaleDataOptions, LocaleDataRegistry};
use crate::error::{CompactError, Result};

// =============================================================================
// Parts
// =============================================================================

/// Kind of a formatted part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartKind {
    MinusSign,
    PlusSign,
    Integer,
    Group,
    Decimal,
    Fraction,
    Compact,
    Currency,
    Literal,
    Infinity,
    Nan,
}

/// One typed span of a formatted number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormatPart {
    #[serde(rename = "type")]
    pub kind: PartKind,
    pub value: String,
}

impl NumberFormatPart {
    #[must_use]
    pub fn new(kind: PartKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// A single literal part.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::new(PartKind::Literal, value)
    }
}

/// Concatenate part values.
#[must_use]
pub fn join_parts(parts: &[NumberFormatPart]) -> String {
    parts.iter().map(|part| part.value.as_str()).collect()
}

// =============================================================================
// Traits
// =============================================================================

/// A constructed number formatter.
pub trait NumberFormat: fmt::Debug {
    /// Format `value` to a string.
    ///
    /// # Errors
    ///
    /// Implementations may fail for values they cannot render.
    fn format(&self, value: f64) -> Result<String> {
        self.format_to_parts(value).map(|parts| join_parts(&parts))
    }

    /// Format `value` to typed parts.
    ///
    /// # Errors
    ///
    /// Implementations may fail for values they cannot render.
    fn format_to_parts(&self, value: f64) -> Result<Vec<NumberFormatPart>>;

    /// Effective options after negotiation and defaulting.
    fn resolved_options(&self) -> &ResolvedNumberFormatOptions;
}

/// Builds formatters for a locale list and option set.
pub trait NumberFormatFactory {
    /// # Errors
    ///
    /// Returns an error when the options are rejected or no locale data is
    /// available.
    fn number_format(
        &self,
        locales: &[String],
        options: &NumberFormatOptions,
    ) -> Result<Box<dyn NumberFormat + Send + Sync>>;
}

// =============================================================================
// Reference Implementation
// =============================================================================

/// Factory for [`CldrNumberFormat`] backed by a registry.
#[derive(Debug, Clone)]
pub struct CldrNumberFormatFactory {
    registry: Arc<LocaleDataRegistry>,
}

impl CldrNumberFormatFactory {
    #[must_use]
    pub const fn new(registry: Arc<LocaleDataRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<LocaleDataRegistry> {
        &self.registry
    }
}

impl NumberFormatFactory for CldrNumberFormatFactory {
    fn number_format(
        &self,
        locales: &[String],
        options: &NumberFormatOptions,
    ) -> Result<Box<dyn NumberFormat + Send + Sync>> {
        Ok(Box::new(CldrNumberFormat::new(&self.registry, locales, options)?))
    }
}

/// Prefix, number placeholder, and suffix of a compact pattern.
static PATTERN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>(?:'[^']*'|[^0'])*)(?P<zeros>0+)(?P<suffix>.*)$")
        .expect("compact pattern regex is valid")
});

const NARROW_NBSP: char = '\u{202f}';
const NBSP: char = '\u{a0}';

fn digit_set(numbering_system: &str) -> [char; 10] {
    let digits = match numbering_system {
        "arab" => "٠١٢٣٤٥٦٧٨٩",
        "arabext" => "۰۱۲۳۴۵۶۷۸۹",
        "beng" => "০১২৩৪৫৬৭৮৯",
        "deva" => "०१२३४५६७८९",
        "fullwide" => "０１２３４５６７８９",
        "hanidec" => "〇一二三四五六七八九",
        "thai" => "๐๑๒๓๔๕๖๗๘๙",
        _ => "0123456789",
    };
    let mut set = ['0'; 10];
    for (slot, digit) in set.iter_mut().zip(digits.chars()) {
        *slot = digit;
    }
    set
}

fn currency_symbol(code: &str, display: CurrencyDisplay) -> String {
    let symbol = match (code, display) {
        (_, CurrencyDisplay::Code | CurrencyDisplay::Name) => code,
        ("USD", _) => "$",
        ("EUR", _) => "€",
        ("GBP", _) => "£",
        ("JPY", _) => "¥",
        ("CNY", CurrencyDisplay::NarrowSymbol) => "¥",
        ("CNY", _) => "CN¥",
        ("INR", _) => "₹",
        ("KRW", _) => "₩",
        ("UAH", _) => "₴",
        ("ILS", _) => "₪",
        ("RUB", CurrencyDisplay::NarrowSymbol) => "₽",
        _ => code,
    };
    symbol.to_string()
}

/// Remove CLDR quoting: `'.'` → `.`, `''` → `'`.
fn unquote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            out.push(c);
        } else if chars.peek() == Some(&'\'') {
            chars.next();
            out.push('\'');
        }
    }
    out
}

/// Count the `0` placeholders of a pattern outside quoted literals.
#[must_use]
pub fn pattern_zeros(pattern: &str) -> usize {
    let mut quoted = false;
    pattern
        .chars()
        .filter(|c| {
            if *c == '\'' {
                quoted = !quoted;
            }
            !quoted && *c == '0'
        })
        .count()
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || c == NBSP || c == NARROW_NBSP
}

/// Formatter rendering CLDR compact patterns from registry data.
#[derive(Debug, Clone)]
pub struct CldrNumberFormat {
    resolved: ResolvedNumberFormatOptions,
    data: Arc<NumberFormatLocaleData>,
    symbols: NumberSymbols,
    plural: PluralRule,
    digits: [char; 10],
}

impl CldrNumberFormat {
    /// Negotiate `locales` and validate `options`.
    ///
    /// # Errors
    ///
    /// `UnsupportedOption` for percent/unit styles, `InvalidOption` for a
    /// missing or malformed currency and out-of-range digit options, and
    /// locale errors from negotiation.
    pub fn new(
        registry: &LocaleDataRegistry,
        locales: &[String],
        options: &NumberFormatOptions,
    ) -> Result<Self> {
        let style = options.style.unwrap_or_default();
        if matches!(style, Style::Percent | Style::Unit) {
            return Err(CompactError::UnsupportedOption {
                option: "style".to_string(),
                value: style.as_str().to_string(),
            });
        }

        let currency = match style {
            Style::Currency => {
                let code = options.currency.as_deref().ok_or_else(|| CompactError::InvalidOption {
                    option: "currency".to_string(),
                    message: "required with the currency style".to_string(),
                })?;
                if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return Err(CompactError::InvalidOption {
                        option: "currency".to_string(),
                        message: format!("{code:?} is not an ISO 4217 code"),
                    });
                }
                Some(code.to_ascii_uppercase())
            }
            _ => None,
        };

        let notation = options.notation.unwrap_or_default();
        // Currency minor units only apply to standard notation.
        let default_fraction = match (notation, currency.as_deref()) {
            (Notation::Standard, Some(code)) => {
                let digits = currency_digits(code);
                DigitRange::new(digits, digits)
            }
            _ => DigitRange::new(0, 3),
        };
        let (minimum_integer_digits, rounding) =
            resolve_digit_options(options, default_fraction, notation)?;

        let resolved_locale = registry.resolve_locale(
            locales,
            &LocaleDataOptions {
                locale_matcher: options.locale_matcher.unwrap_or_default(),
                numbering_system: options.numbering_system.clone(),
            },
        )?;

        let resolved = ResolvedNumberFormatOptions {
            locale: resolved_locale.locale,
            numbering_system: resolved_locale.numbering_system.clone(),
            style,
            currency,
            currency_display: options.currency_display.unwrap_or_default(),
            notation,
            compact_display: options.compact_display.unwrap_or_default(),
            sign_display: options.sign_display.unwrap_or_default(),
            use_grouping: options.use_grouping.unwrap_or(match notation {
                Notation::Compact => UseGrouping::Min2,
                Notation::Standard => UseGrouping::Auto,
            }),
            minimum_integer_digits,
            rounding,
        };

        tracing::trace!(
            locale = %resolved.locale,
            numbering_system = %resolved.numbering_system,
            "Constructed number formatter"
        );

        Ok(Self {
            symbols: resolved_locale.data.symbols_for(&resolved_locale.numbering_system),
            plural: PluralRule::for_locale(&resolved_locale.data_locale),
            digits: digit_set(&resolved_locale.numbering_system),
            data: resolved_locale.data,
            resolved,
        })
    }

    fn table(&self) -> Option<&CompactPatternTable> {
        compact_table(&self.data, &self.resolved)
    }

    fn transliterate(&self, ascii_digits: &str) -> String {
        ascii_digits
            .bytes()
            .map(|b| self.digits[usize::from(b - b'0')])
            .collect()
    }

    fn sign_part(&self, negative: bool, zero: bool) -> Option<NumberFormatPart> {
        let minus = || NumberFormatPart::new(PartKind::MinusSign, self.symbols.minus_sign.clone());
        let plus = || NumberFormatPart::new(PartKind::PlusSign, self.symbols.plus_sign.clone());
        match self.resolved.sign_display {
            SignDisplay::Auto => negative.then(minus),
            SignDisplay::Never => None,
            SignDisplay::Always => Some(if negative { minus() } else { plus() }),
            SignDisplay::ExceptZero if zero => None,
            SignDisplay::ExceptZero => Some(if negative { minus() } else { plus() }),
            SignDisplay::Negative => (negative && !zero).then(minus),
        }
    }

    fn number_parts(&self, rounded: &RoundedDecimal) -> Vec<NumberFormatPart> {
        let integer = rounded.integer_digits();
        let group = match self.resolved.use_grouping {
            UseGrouping::Always | UseGrouping::Auto => integer.len() >= 4,
            UseGrouping::Min2 => integer.len() >= 5,
            UseGrouping::Never => false,
        };

        let mut parts = Vec::new();
        if group {
            let head = integer.len() % 3;
            let mut chunks = Vec::new();
            if head > 0 {
                chunks.push(&integer[..head]);
            }
            chunks.extend(
                integer.as_bytes()[head..]
                    .chunks(3)
                    .filter_map(|chunk| std::str::from_utf8(chunk).ok()),
            );
            for (index, chunk) in chunks.into_iter().enumerate() {
                if index > 0 {
                    parts.push(NumberFormatPart::new(PartKind::Group, self.symbols.group.clone()));
                }
                parts.push(NumberFormatPart::new(PartKind::Integer, self.transliterate(chunk)));
            }
        } else {
            parts.push(NumberFormatPart::new(PartKind::Integer, self.transliterate(&integer)));
        }

        let fraction = rounded.fraction_digits();
        if !fraction.is_empty() {
            parts.push(NumberFormatPart::new(PartKind::Decimal, self.symbols.decimal.clone()));
            parts.push(NumberFormatPart::new(PartKind::Fraction, self.transliterate(&fraction)));
        }
        parts
    }

    fn currency_text(&self) -> Option<String> {
        self.resolved
            .currency
            .as_deref()
            .map(|code| currency_symbol(code, self.resolved.currency_display))
    }

    /// Split affix text into currency, whitespace literal, and compact parts.
    fn affix_parts(&self, text: &str, out: &mut Vec<NumberFormatPart>) {
        let mut current = String::new();
        let mut current_kind = None;
        let flush = |current: &mut String, kind: Option<PartKind>, out: &mut Vec<NumberFormatPart>| {
            if let Some(kind) = kind.filter(|_| !current.is_empty()) {
                out.push(NumberFormatPart::new(kind, std::mem::take(current)));
            }
        };

        for c in text.chars() {
            if c == '¤' {
                flush(&mut current, current_kind, out);
                current_kind = None;
                if let Some(symbol) = self.currency_text() {
                    out.push(NumberFormatPart::new(PartKind::Currency, symbol));
                }
                continue;
            }
            let kind = if is_space(c) {
                PartKind::Literal
            } else {
                PartKind::Compact
            };
            if current_kind != Some(kind) {
                flush(&mut current, current_kind, out);
                current_kind = Some(kind);
            }
            current.push(c);
        }
        flush(&mut current, current_kind, out);
    }

    /// Insert a no-break space between an alphabetic currency and a digit.
    fn space_currency(parts: &mut Vec<NumberFormatPart>) {
        let mut index = 1;
        while index < parts.len() {
            let (before, after) = (&parts[index - 1], &parts[index]);
            let letter_then_digit = before.kind == PartKind::Currency
                && before.value.chars().last().is_some_and(char::is_alphabetic)
                && after.kind == PartKind::Integer;
            let digit_then_letter = after.kind == PartKind::Currency
                && after.value.chars().next().is_some_and(char::is_alphabetic)
                && matches!(before.kind, PartKind::Integer | PartKind::Fraction);
            if letter_then_digit || digit_then_letter {
                parts.insert(index, NumberFormatPart::literal(NBSP.to_string()));
                index += 1;
            }
            index += 1;
        }
    }
}

impl NumberFormat for CldrNumberFormat {
    fn format_to_parts(&self, value: f64) -> Result<Vec<NumberFormatPart>> {
        if value.is_nan() {
            return Ok(vec![NumberFormatPart::new(PartKind::Nan, "NaN")]);
        }
        let negative = value.is_sign_negative() && value != 0.0;
        if value.is_infinite() {
            let mut parts: Vec<_> = self.sign_part(negative, false).into_iter().collect();
            parts.push(NumberFormatPart::new(PartKind::Infinity, "∞"));
            return Ok(parts);
        }

        let abs = value.abs();
        let rounding = self.resolved.rounding;
        let (exponent, pattern_source) = match (self.resolved.notation, self.table()) {
            (Notation::Compact, Some(table)) => {
                let (exponent, magnitude) = compute_exponent(abs, table, rounding);
                let bucket = (magnitude >= 0)
                    .then(|| table.bucket_for(10f64.powi(magnitude)))
                    .flatten()
                    .map(|(_, patterns)| patterns);
                (exponent, bucket)
            }
            _ => (0, None),
        };

        let rounded = round(
            rescale(abs, exponent),
            rounding,
            self.resolved.minimum_integer_digits,
        );
        let category = self.plural.select(rounded.plural_operands());
        let pattern = pattern_source
            .and_then(|patterns| select_pattern(patterns, category))
            .filter(|pattern| *pattern != "0");

        let mut parts: Vec<_> = self.sign_part(negative, rounded.is_zero()).into_iter().collect();
        let number = self.number_parts(&rounded);
        let name_display = self.resolved.style == Style::Currency
            && self.resolved.currency_display == CurrencyDisplay::Name;

        match pattern.and_then(|p| PATTERN_REGEX.captures(p)) {
            Some(captures) => {
                let prefix = unquote(captures.name("prefix").map_or("", |m| m.as_str()));
                let suffix = unquote(captures.name("suffix").map_or("", |m| m.as_str()));
                self.affix_parts(&prefix, &mut parts);
                parts.extend(number);
                self.affix_parts(&suffix, &mut parts);
            }
            None => {
                if self.resolved.style == Style::Currency && !name_display {
                    self.affix_parts("¤", &mut parts);
                }
                parts.extend(number);
            }
        }

        if name_display {
            if let Some(code) = &self.resolved.currency {
                parts.push(NumberFormatPart::literal(" "));
                parts.push(NumberFormatPart::new(PartKind::Currency, code.clone()));
            }
        }

        Self::space_currency(&mut parts);
        Ok(parts)
    }

    fn resolved_options(&self) -> &ResolvedNumberFormatOptions {
        &self.resolved
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MinusSign => "minusSign",
            Self::PlusSign => "plusSign",
            Self::Integer => "integer",
            Self::Group => "group",
            Self::Decimal => "decimal",
            Self::Fraction => "fraction",
            Self::Compact => "compact",
            Self::Currency => "currency",
            Self::Literal => "literal",
            Self::Infinity => "infinity",
            Self::Nan => "nan",
        };
        f.write_str(name)
    }
}
