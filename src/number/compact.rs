//! Compact number engine.
//!
//! [`format_compact_number`] turns a value into a [`CompactNumber`]: a lazy
//! value object with three independently memoized outputs.
//!
//! # Plural-selection value
//!
//! Display rounding may cross a magnitude boundary (999 500 renders as "1M",
//! not "999.5K"), so the numeric output is derived from the *rounded* display
//! quantity rescaled back: `round(v / 10^E) × 10^E`, where `E` is re-derived
//! if rounding changed the magnitude.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Formatter construction fails | Rejected options, no locale data | Degraded outputs, reported once |
//! | Computation fails | Registry lookup or primitive error | Degraded output, reported once |
//! | Unknown named format | `options.format` not in `formats.number` | Reported, explicit options used |
//!
//! Accessors never return errors.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use super::decimal::{magnitude_of, rescale, round};
use super::format::{NumberFormat, NumberFormatFactory, NumberFormatPart, pattern_zeros};
use super::options::{
    CurrencyDisplay, Formats, Notation, NumberFormatOptions, ResolvedNumberFormatOptions,
    RoundingPolicy, Style,
};
use crate::core::models::{
    CompactDisplay, CompactPatternTable, NumberFormatLocaleData, TableKind, select_pattern,
};
use crate::core::plural::PluralCategory;
use crate::core::registry::{LocaleDataOptions, LocaleDataRegistry, LocaleMatcher};
use crate::error::{CompactError, ErrorReporter, Result};

// =============================================================================
// Exponent
// =============================================================================

fn digit_count(mut n: u64) -> i32 {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

/// Exponent of the bucket serving numbers of `magnitude`.
///
/// The largest threshold not exceeding `10^magnitude` is picked and
/// `E = digits(threshold) − zeros(pattern)`. Below the first threshold, or
/// for the pattern `"0"`, `E` is 0.
#[must_use]
pub fn exponent_for_magnitude(table: &CompactPatternTable, magnitude: i32) -> i32 {
    if magnitude < 0 {
        return 0;
    }
    let Some((threshold, patterns)) = table.bucket_for(10f64.powi(magnitude)) else {
        return 0;
    };
    let Some(pattern) = select_pattern(patterns, PluralCategory::Other) else {
        return 0;
    };
    if pattern == "0" {
        return 0;
    }
    match i32::try_from(pattern_zeros(pattern)) {
        Ok(zeros) if zeros > 0 => digit_count(threshold) - zeros,
        _ => 0,
    }
}

/// `(exponent, magnitude)` for `value` under `table` and `rounding`.
///
/// If rounding pushes the rescaled value into the next magnitude, the
/// exponent for `magnitude + 1` is returned with that magnitude.
#[must_use]
pub fn compute_exponent(
    value: f64,
    table: &CompactPatternTable,
    rounding: RoundingPolicy,
) -> (i32, i32) {
    if value == 0.0 || !value.is_finite() {
        return (0, 0);
    }
    let magnitude = magnitude_of(value);
    let exponent = exponent_for_magnitude(table, magnitude);
    let rounded = round(rescale(value.abs(), exponent), rounding, 1);

    if rounded.is_zero() || rounded.magnitude() == magnitude - exponent {
        return (exponent, magnitude);
    }
    (exponent_for_magnitude(table, magnitude + 1), magnitude + 1)
}

/// Compact table for a formatter's resolved options.
///
/// Currency style reads the currency `short` table unless the currency is
/// displayed by name; everything else reads the decimal table for the
/// compact display. Missing tables fall back to the decimal `short` one.
#[must_use]
pub fn compact_table<'a>(
    data: &'a NumberFormatLocaleData,
    resolved: &ResolvedNumberFormatOptions,
) -> Option<&'a CompactPatternTable> {
    let nu = resolved.numbering_system.as_str();
    let (kind, display) = if resolved.style == Style::Currency
        && resolved.currency_display != CurrencyDisplay::Name
    {
        (TableKind::Currency, CompactDisplay::Short)
    } else {
        (TableKind::Decimal, resolved.compact_display)
    };

    [
        (kind, display),
        (kind, CompactDisplay::Short),
        (TableKind::Decimal, CompactDisplay::Short),
    ]
    .into_iter()
    .filter_map(|(kind, display)| data.styles(kind, nu).map(|styles| styles.style(display)))
    .find(|table| !table.is_empty())
}

// =============================================================================
// Context
// =============================================================================

/// Everything a formatting call needs besides the value.
#[derive(Clone)]
pub struct FormatContext {
    /// Requested locales, most preferred first.
    pub locales: Vec<String>,
    /// Named formats for `options.format`.
    pub formats: Formats,
    /// Receives every reported failure.
    pub on_error: ErrorReporter,
    /// Locale data used for exponent computation.
    pub registry: Arc<LocaleDataRegistry>,
}

impl FormatContext {
    /// Context for one locale with no named formats; errors are logged.
    #[must_use]
    pub fn new(locale: impl Into<String>, registry: Arc<LocaleDataRegistry>) -> Self {
        Self {
            locales: vec![locale.into()],
            formats: Formats::default(),
            on_error: Arc::new(|error: &CompactError| {
                tracing::warn!(code = %error.error_code(), error = %error, "Compact number error");
            }),
            registry,
        }
    }

    #[must_use]
    pub fn with_formats(mut self, formats: Formats) -> Self {
        self.formats = formats;
        self
    }

    #[must_use]
    pub fn with_error_reporter(mut self, on_error: ErrorReporter) -> Self {
        self.on_error = on_error;
        self
    }

    /// Options after applying the named format, with compact notation forced.
    fn effective_options(&self, options: Option<NumberFormatOptions>) -> NumberFormatOptions {
        let options = options.unwrap_or_default();
        let defaults = match options.format.as_deref() {
            Some(name) => match self.formats.number_format(name) {
                Ok(defaults) => defaults.clone(),
                Err(error) => {
                    (self.on_error)(&error);
                    NumberFormatOptions::default()
                }
            },
            None => NumberFormatOptions::default(),
        };

        let locale_matcher = options.locale_matcher;
        let mut merged = options.merged_over(&defaults);
        merged.locale_matcher = locale_matcher;
        merged.notation = Some(Notation::Compact);
        merged
    }
}

impl fmt::Debug for FormatContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatContext")
            .field("locales", &self.locales)
            .field("formats", &self.formats)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Compact Number
// =============================================================================

/// A number formatted in compact notation, with a plural-selection value.
///
/// Outputs are computed on first access and cached; each accessor runs the
/// formatting primitive at most once. `Display` gives the formatted string.
pub struct CompactNumber {
    value: f64,
    formatter: Option<Box<dyn NumberFormat + Send + Sync>>,
    registry: Arc<LocaleDataRegistry>,
    on_error: ErrorReporter,
    reported: AtomicBool,
    numeric: OnceLock<f64>,
    string: OnceLock<String>,
    parts: OnceLock<Vec<NumberFormatPart>>,
}

impl CompactNumber {
    /// The raw input value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Whether the formatter could not be constructed.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.formatter.is_none()
    }

    /// Rounded value for plural selection.
    ///
    /// Falls back to the raw value on failure.
    pub fn as_f64(&self) -> f64 {
        *self.numeric.get_or_init(|| match self.compute_numeric() {
            Ok(numeric) => numeric,
            Err(error) => {
                self.report(CompactError::computation_failed(error));
                self.value
            }
        })
    }

    /// Formatted string. Falls back to the plain number on failure.
    pub fn as_str(&self) -> &str {
        self.string.get_or_init(|| {
            let Some(formatter) = &self.formatter else {
                return self.plain();
            };
            formatter.format(self.value).unwrap_or_else(|error| {
                self.report(CompactError::computation_failed(error));
                self.plain()
            })
        })
    }

    /// Formatted parts. Falls back to one literal part on failure.
    pub fn parts(&self) -> &[NumberFormatPart] {
        self.parts.get_or_init(|| {
            let Some(formatter) = &self.formatter else {
                return vec![NumberFormatPart::literal(self.plain())];
            };
            formatter.format_to_parts(self.value).unwrap_or_else(|error| {
                self.report(CompactError::computation_failed(error));
                vec![NumberFormatPart::literal(self.plain())]
            })
        })
    }

    fn plain(&self) -> String {
        self.value.to_string()
    }

    fn compute_numeric(&self) -> Result<f64> {
        let Some(formatter) = &self.formatter else {
            return Ok(self.value);
        };
        if !self.value.is_finite() {
            return Ok(self.value);
        }

        let resolved = formatter.resolved_options();
        let data = self.registry.get_locale_data(
            &[resolved.locale.as_str()],
            &LocaleDataOptions {
                locale_matcher: LocaleMatcher::BestFit,
                numbering_system: Some(resolved.numbering_system.clone()),
            },
        )?;

        let exponent = compact_table(&data, resolved).map_or(0, |table| {
            compute_exponent(self.value.abs(), table, resolved.rounding).0
        });
        let rounded = round(
            rescale(self.value, exponent),
            resolved.rounding,
            resolved.minimum_integer_digits,
        );
        Ok(rounded.to_f64_scaled(exponent))
    }

    fn report(&self, error: CompactError) {
        if !self.reported.swap(true, Ordering::AcqRel) {
            (self.on_error)(&error);
        }
    }
}

impl fmt::Display for CompactNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CompactNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactNumber")
            .field("value", &self.value)
            .field("degraded", &self.is_degraded())
            .field("numeric", &self.numeric.get())
            .field("string", &self.string.get())
            .finish_non_exhaustive()
    }
}

/// Create a [`CompactNumber`] for `value`.
///
/// The notation is always compact. Construction failures are reported
/// through `context.on_error` and yield a degraded value.
pub fn format_compact_number(
    factory: &dyn NumberFormatFactory,
    context: &FormatContext,
    value: f64,
    options: Option<NumberFormatOptions>,
) -> CompactNumber {
    let options = context.effective_options(options);
    let reported = AtomicBool::new(false);

    let formatter = match factory.number_format(&context.locales, &options) {
        Ok(formatter) => Some(formatter),
        Err(error) => {
            tracing::debug!(error = %error, "Compact formatter construction failed");
            (context.on_error)(&CompactError::construction_failed(error));
            reported.store(true, Ordering::Release);
            None
        }
    };

    CompactNumber {
        value,
        formatter,
        registry: Arc::clone(&context.registry),
        on_error: Arc::clone(&context.on_error),
        reported,
        numeric: OnceLock::new(),
        string: OnceLock::new(),
        parts: OnceLock::new(),
    }
}

// =============================================================================
// Formatter Binding
// =============================================================================

/// A factory bound to a context.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use compact_number::core::registry::LocaleDataRegistry;
/// use compact_number::number::compact::{CompactNumberFormatter, FormatContext};
/// use compact_number::number::format::CldrNumberFormatFactory;
///
/// let registry = Arc::new(LocaleDataRegistry::new());
/// registry
///     .add_locale_data_json(
///         "en",
///         r#"{"numberingSystems":["latn"],
///             "decimal":{"latn":{"short":{"1000":{"one":"0K","other":"0K"}}}},
///             "currency":{}}"#,
///     )
///     .unwrap();
///
/// let factory = CldrNumberFormatFactory::new(Arc::clone(&registry));
/// let formatter = CompactNumberFormatter::new(&factory, FormatContext::new("en-US", registry));
/// let number = formatter.format(1500.0, None);
/// assert_eq!(number.to_string(), "1.5K");
/// assert_eq!(number.as_f64(), 1500.0);
/// ```
pub struct CompactNumberFormatter<'f> {
    factory: &'f dyn NumberFormatFactory,
    context: FormatContext,
}

impl<'f> CompactNumberFormatter<'f> {
    /// Bind `factory` to `context`.
    ///
    /// Reports `MissingLocaleData` once if none of the context's locales is
    /// served by the registry without falling back.
    pub fn new(factory: &'f dyn NumberFormatFactory, context: FormatContext) -> Self {
        let supported = context
            .registry
            .supported_locales_of(&context.locales, LocaleMatcher::BestFit)
            .unwrap_or_default();
        if supported.is_empty() {
            (context.on_error)(&CompactError::MissingLocaleData {
                locale: context.locales.join(", "),
            });
        }
        Self { factory, context }
    }

    #[must_use]
    pub const fn context(&self) -> &FormatContext {
        &self.context
    }

    /// Format `value` in compact notation.
    #[must_use]
    pub fn format(&self, value: f64, options: Option<NumberFormatOptions>) -> CompactNumber {
        format_compact_number(self.factory, &self.context, value, options)
    }
}

impl fmt::Debug for CompactNumberFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactNumberFormatter")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// One chunk of formatted message output.
#[derive(Debug)]
pub enum FormattedChunk<T> {
    /// Plain text.
    Text(String),
    /// A compact number, flattened to its string by [`normalize`].
    Compact(CompactNumber),
    /// A caller-defined value (rich-text element, etc.).
    Value(T),
    /// Nested output.
    Sequence(Vec<FormattedChunk<T>>),
}

/// A normalized chunk: no compact numbers left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedChunk<T> {
    Text(String),
    Value(T),
}

/// Result of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized<T> {
    /// Every chunk was text; joined.
    Text(String),
    /// At least one caller value remains.
    Mixed(Vec<NormalizedChunk<T>>),
}

fn flatten_into<T>(chunk: FormattedChunk<T>, out: &mut Vec<NormalizedChunk<T>>) {
    match chunk {
        FormattedChunk::Text(text) => out.push(NormalizedChunk::Text(text)),
        FormattedChunk::Compact(number) => out.push(NormalizedChunk::Text(number.to_string())),
        FormattedChunk::Value(value) => out.push(NormalizedChunk::Value(value)),
        FormattedChunk::Sequence(chunks) => {
            for chunk in chunks {
                flatten_into(chunk, out);
            }
        }
    }
}

/// Replace compact numbers by their strings and flatten nested sequences.
///
/// All-text output is joined into [`Normalized::Text`].
pub fn normalize<T>(output: FormattedChunk<T>) -> Normalized<T> {
    let mut chunks = Vec::new();
    flatten_into(output, &mut chunks);

    if chunks.iter().all(|chunk| matches!(chunk, NormalizedChunk::Text(_))) {
        let text = chunks
            .into_iter()
            .filter_map(|chunk| match chunk {
                NormalizedChunk::Text(text) => Some(text),
                NormalizedChunk::Value(_) => None,
            })
            .collect();
        return Normalized::Text(text);
    }
    Normalized::Mixed(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_short() -> CompactPatternTable {
        let mut table = CompactPatternTable::new();
        for (threshold, pattern) in [
            (1_000, "0K"),
            (10_000, "00K"),
            (100_000, "000K"),
            (1_000_000, "0M"),
            (10_000_000, "00M"),
            (100_000_000, "000M"),
        ] {
            table.insert_if_absent(threshold, PluralCategory::Other, pattern);
        }
        table
    }

    #[test]
    fn exponent_tracks_largest_threshold() {
        let table = en_short();
        assert_eq!(compute_exponent(999.0, &table, RoundingPolicy::COMPACT), (0, 2));
        assert_eq!(compute_exponent(1_500.0, &table, RoundingPolicy::COMPACT), (3, 3));
        assert_eq!(compute_exponent(45_000.0, &table, RoundingPolicy::COMPACT), (3, 4));
        assert_eq!(compute_exponent(2.5e9, &table, RoundingPolicy::COMPACT), (6, 9));
    }

    #[test]
    fn exponent_rechecked_after_rounding() {
        let table = en_short();
        assert_eq!(compute_exponent(999_500.0, &table, RoundingPolicy::COMPACT), (6, 6));
        assert_eq!(compute_exponent(999_499.0, &table, RoundingPolicy::COMPACT), (3, 5));
    }

    #[test]
    fn placeholder_pattern_has_zero_exponent() {
        let mut table = CompactPatternTable::new();
        table.insert_if_absent(1_000, PluralCategory::Other, "0");
        table.insert_if_absent(10_000, PluralCategory::Other, "0万");
        assert_eq!(exponent_for_magnitude(&table, 3), 0);
        assert_eq!(exponent_for_magnitude(&table, 4), 4);
        assert_eq!(exponent_for_magnitude(&table, -2), 0);
    }

    #[test]
    fn normalize_joins_text() {
        let output: FormattedChunk<()> = FormattedChunk::Sequence(vec![
            FormattedChunk::Text("a".to_string()),
            FormattedChunk::Sequence(vec![FormattedChunk::Text("b".to_string())]),
        ]);
        assert_eq!(normalize(output), Normalized::Text("ab".to_string()));
    }

    #[test]
    fn normalize_keeps_values() {
        let output = FormattedChunk::Sequence(vec![
            FormattedChunk::Text("x".to_string()),
            FormattedChunk::Value(7_u8),
        ]);
        assert_eq!(
            normalize(output),
            Normalized::Mixed(vec![
                NormalizedChunk::Text("x".to_string()),
                NormalizedChunk::Value(7),
            ])
        );
    }
}
