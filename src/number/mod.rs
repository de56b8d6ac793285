//! Number formatting: options, rounding, the formatting primitive, and the
//! compact number engine.

pub mod compact;
pub mod decimal;
pub mod format;
pub mod options;

pub use compact::{
    CompactNumber, CompactNumberFormatter, FormatContext, FormattedChunk, Normalized,
    NormalizedChunk, compute_exponent, format_compact_number, normalize,
};
pub use format::{
    CldrNumberFormat, CldrNumberFormatFactory, NumberFormat, NumberFormatFactory,
    NumberFormatPart, PartKind,
};
pub use options::{
    CurrencyDisplay, DigitRange, Formats, Notation, NumberFormatOptions,
    ResolvedNumberFormatOptions, RoundingPolicy, SignDisplay, Style, UseGrouping,
};
