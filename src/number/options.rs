//! Number format options, named formats, and digit-option resolution.
//!
//! [`NumberFormatOptions`] is what callers (and the `[formats.number.*]`
//! config tables) supply; every field is optional. A formatter resolves it
//! into [`ResolvedNumberFormatOptions`], whose [`RoundingPolicy`] drives both
//! rendering and the plural-selection value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::models::CompactDisplay;
use crate::core::registry::LocaleMatcher;
use crate::error::{CompactError, Result};

// =============================================================================
// Option Enums
// =============================================================================

/// Formatting style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Decimal,
    Currency,
    Percent,
    Unit,
}

impl Style {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Currency => "currency",
            Self::Percent => "percent",
            Self::Unit => "unit",
        }
    }
}

/// How a currency is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurrencyDisplay {
    #[default]
    Symbol,
    NarrowSymbol,
    Code,
    Name,
}

/// Notation. Compact formatting always forces `Compact`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    #[default]
    Standard,
    Compact,
}

/// When to show the sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignDisplay {
    #[default]
    Auto,
    Never,
    Always,
    ExceptZero,
    Negative,
}

/// Grouping separator strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseGrouping {
    /// Group every integer with four or more digits.
    Always,
    /// Locale default; same as `Always` for the supported locales.
    Auto,
    /// Group only integers with five or more digits.
    Min2,
    /// Never group.
    #[serde(alias = "false")]
    Never,
}

// =============================================================================
// Options
// =============================================================================

/// Caller-supplied number format options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormatOptions {
    /// Name of a format in `formats.number` to use as defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale_matcher: Option<LocaleMatcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    /// ISO 4217 code, required for the currency style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_display: Option<CurrencyDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notation: Option<Notation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_display: Option<CompactDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_display: Option<SignDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_grouping: Option<UseGrouping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_integer_digits: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_fraction_digits: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_fraction_digits: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_significant_digits: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_significant_digits: Option<u8>,
}

impl NumberFormatOptions {
    /// Options with only the compact notation set.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            notation: Some(Notation::Compact),
            ..Self::default()
        }
    }

    /// Formatting fields of `self`, falling back to `defaults` field by field.
    ///
    /// `format` and `locale_matcher` are selection fields, not formatting
    /// ones, and are dropped from the result.
    #[must_use]
    pub fn merged_over(&self, defaults: &Self) -> Self {
        Self {
            format: None,
            locale_matcher: None,
            numbering_system: self
                .numbering_system
                .clone()
                .or_else(|| defaults.numbering_system.clone()),
            style: self.style.or(defaults.style),
            currency: self.currency.clone().or_else(|| defaults.currency.clone()),
            currency_display: self.currency_display.or(defaults.currency_display),
            notation: self.notation.or(defaults.notation),
            compact_display: self.compact_display.or(defaults.compact_display),
            sign_display: self.sign_display.or(defaults.sign_display),
            use_grouping: self.use_grouping.or(defaults.use_grouping),
            minimum_integer_digits: self.minimum_integer_digits.or(defaults.minimum_integer_digits),
            minimum_fraction_digits: self
                .minimum_fraction_digits
                .or(defaults.minimum_fraction_digits),
            maximum_fraction_digits: self
                .maximum_fraction_digits
                .or(defaults.maximum_fraction_digits),
            minimum_significant_digits: self
                .minimum_significant_digits
                .or(defaults.minimum_significant_digits),
            maximum_significant_digits: self
                .maximum_significant_digits
                .or(defaults.maximum_significant_digits),
        }
    }
}

/// Named number formats (`formats.number.<name>`).
pub type CustomNumberFormats = BTreeMap<String, NumberFormatOptions>;

/// Named formats available to a formatting context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formats {
    pub number: CustomNumberFormats,
}

impl Formats {
    /// Named number format.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNamedFormat` if no format is registered under `name`.
    pub fn number_format(&self, name: &str) -> Result<&NumberFormatOptions> {
        self.number
            .get(name)
            .ok_or_else(|| CompactError::UnknownNamedFormat(name.to_string()))
    }
}

// =============================================================================
// Rounding
// =============================================================================

/// Inclusive digit count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigitRange {
    pub minimum: u8,
    pub maximum: u8,
}

impl DigitRange {
    #[must_use]
    pub const fn new(minimum: u8, maximum: u8) -> Self {
        Self { minimum, maximum }
    }
}

/// How a number is rounded before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RoundingPolicy {
    /// Round to significant digits.
    Significant(DigitRange),
    /// Round to fraction digits.
    Fraction(DigitRange),
    /// Use whichever of the two keeps more precision.
    MorePrecision {
        significant: DigitRange,
        fraction: DigitRange,
    },
}

impl RoundingPolicy {
    /// Default rounding of compact notation: at most two significant digits
    /// or an integer, whichever keeps more precision.
    pub const COMPACT: Self = Self::MorePrecision {
        significant: DigitRange::new(1, 2),
        fraction: DigitRange::new(0, 0),
    };
}

pub const MAX_INTEGER_DIGITS: u8 = 21;
pub const MAX_FRACTION_DIGITS: u8 = 20;
pub const MAX_SIGNIFICANT_DIGITS: u8 = 21;

/// Minor-unit digits of a currency.
#[must_use]
pub fn currency_digits(code: &str) -> u8 {
    match code {
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX"
        | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        _ => 2,
    }
}

fn checked_digits(option: &'static str, value: Option<u8>, low: u8, high: u8, fallback: u8) -> Result<u8> {
    match value {
        None => Ok(fallback),
        Some(v) if (low..=high).contains(&v) => Ok(v),
        Some(v) => Err(CompactError::InvalidOption {
            option: option.to_string(),
            message: format!("{v} is outside {low}..={high}"),
        }),
    }
}

/// Resolve the digit options into `(minimum_integer_digits, policy)`.
///
/// Significant digits win over fraction digits. Compact notation without
/// any digit option gets [`RoundingPolicy::COMPACT`].
///
/// # Errors
///
/// Returns `InvalidOption` for out-of-range values or a minimum above its
/// maximum.
pub fn resolve_digit_options(
    options: &NumberFormatOptions,
    default_fraction: DigitRange,
    notation: Notation,
) -> Result<(u8, RoundingPolicy)> {
    let min_integer = checked_digits(
        "minimum_integer_digits",
        options.minimum_integer_digits,
        1,
        MAX_INTEGER_DIGITS,
        1,
    )?;

    let has_significant =
        options.minimum_significant_digits.is_some() || options.maximum_significant_digits.is_some();
    let has_fraction =
        options.minimum_fraction_digits.is_some() || options.maximum_fraction_digits.is_some();

    if has_significant {
        let minimum = checked_digits(
            "minimum_significant_digits",
            options.minimum_significant_digits,
            1,
            MAX_SIGNIFICANT_DIGITS,
            1,
        )?;
        let maximum = checked_digits(
            "maximum_significant_digits",
            options.maximum_significant_digits,
            minimum,
            MAX_SIGNIFICANT_DIGITS,
            MAX_SIGNIFICANT_DIGITS,
        )?;
        return Ok((min_integer, RoundingPolicy::Significant(DigitRange::new(minimum, maximum))));
    }

    if has_fraction {
        let minimum = checked_digits(
            "minimum_fraction_digits",
            options.minimum_fraction_digits,
            0,
            MAX_FRACTION_DIGITS,
            default_fraction
                .minimum
                .min(options.maximum_fraction_digits.unwrap_or(u8::MAX)),
        )?;
        let maximum = checked_digits(
            "maximum_fraction_digits",
            options.maximum_fraction_digits,
            minimum,
            MAX_FRACTION_DIGITS,
            default_fraction.maximum.max(minimum),
        )?;
        return Ok((min_integer, RoundingPolicy::Fraction(DigitRange::new(minimum, maximum))));
    }

    let policy = match notation {
        Notation::Compact => RoundingPolicy::COMPACT,
        Notation::Standard => RoundingPolicy::Fraction(default_fraction),
    };
    Ok((min_integer, policy))
}

// =============================================================================
// Resolved Options
// =============================================================================

/// Effective options of a constructed formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNumberFormatOptions {
    /// Negotiated locale, including a supported `-u-nu-` keyword.
    pub locale: String,
    pub numbering_system: String,
    pub style: Style,
    pub currency: Option<String>,
    pub currency_display: CurrencyDisplay,
    pub notation: Notation,
    pub compact_display: CompactDisplay,
    pub sign_display: SignDisplay,
    pub use_grouping: UseGrouping,
    pub minimum_integer_digits: u8,
    pub rounding: RoundingPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_options_win_over_named_defaults() {
        let named = NumberFormatOptions {
            maximum_fraction_digits: Some(1),
            sign_display: Some(SignDisplay::Always),
            ..Default::default()
        };
        let explicit = NumberFormatOptions {
            format: Some("compact1".to_string()),
            locale_matcher: Some(LocaleMatcher::Lookup),
            sign_display: Some(SignDisplay::Never),
            ..Default::default()
        };
        let merged = explicit.merged_over(&named);
        assert_eq!(merged.maximum_fraction_digits, Some(1));
        assert_eq!(merged.sign_display, Some(SignDisplay::Never));
        assert!(merged.format.is_none());
        assert!(merged.locale_matcher.is_none());
    }

    #[test]
    fn compact_without_digit_options_uses_compact_rounding() {
        let (min_int, policy) =
            resolve_digit_options(&NumberFormatOptions::compact(), DigitRange::new(0, 3), Notation::Compact)
                .unwrap();
        assert_eq!(min_int, 1);
        assert_eq!(policy, RoundingPolicy::COMPACT);
    }

    #[test]
    fn maximum_fraction_only_lowers_minimum() {
        let options = NumberFormatOptions {
            maximum_fraction_digits: Some(1),
            ..Default::default()
        };
        let (_, policy) = resolve_digit_options(&options, DigitRange::new(2, 2), Notation::Compact).unwrap();
        assert_eq!(policy, RoundingPolicy::Fraction(DigitRange::new(1, 1)));

        let (_, policy) = resolve_digit_options(&options, DigitRange::new(0, 3), Notation::Compact).unwrap();
        assert_eq!(policy, RoundingPolicy::Fraction(DigitRange::new(0, 1)));
    }

    #[test]
    fn significant_digits_win() {
        let options = NumberFormatOptions {
            maximum_fraction_digits: Some(1),
            maximum_significant_digits: Some(3),
            ..Default::default()
        };
        let (_, policy) = resolve_digit_options(&options, DigitRange::new(0, 3), Notation::Compact).unwrap();
        assert_eq!(policy, RoundingPolicy::Significant(DigitRange::new(1, 3)));
    }

    #[test]
    fn out_of_range_digits_are_rejected() {
        let options = NumberFormatOptions {
            minimum_fraction_digits: Some(4),
            maximum_fraction_digits: Some(2),
            ..Default::default()
        };
        let err = resolve_digit_options(&options, DigitRange::new(0, 3), Notation::Standard).unwrap_err();
        assert!(matches!(err, CompactError::InvalidOption { ref option, .. } if option == "maximum_fraction_digits"));

        let options = NumberFormatOptions {
            minimum_integer_digits: Some(0),
            ..Default::default()
        };
        assert!(resolve_digit_options(&options, DigitRange::new(0, 3), Notation::Standard).is_err());
    }

    #[test]
    fn options_deserialize_from_toml() {
        let options: NumberFormatOptions = toml::from_str(
            r#"
            style = "currency"
            currency = "EUR"
            currency_display = "narrowSymbol"
            use_grouping = "min2"
            maximum_fraction_digits = 1
            "#,
        )
        .unwrap();
        assert_eq!(options.style, Some(Style::Currency));
        assert_eq!(options.currency_display, Some(CurrencyDisplay::NarrowSymbol));
        assert_eq!(options.use_grouping, Some(UseGrouping::Min2));
        assert_eq!(options.maximum_fraction_digits, Some(1));
    }

    #[test]
    fn zero_digit_currencies() {
        assert_eq!(currency_digits("JPY"), 0);
        assert_eq!(currency_digits("KRW"), 0);
        assert_eq!(currency_digits("USD"), 2);
    }
}
