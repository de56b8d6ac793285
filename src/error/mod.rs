//! Error types for compact-number.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into five main categories:
//! - **Locale**: No data loaded, unavailable locales, malformed tags
//! - **Format**: Rejected formatter options, construction or computation failures
//! - **Data**: Structural violations in CLDR input trees
//! - **Configuration**: Config file parsing, validation, or missing values
//! - **Internal**: I/O, serialization, unclassified issues
//!
//! Each error has a stable error code (e.g., `CNF-L001`) for programmatic handling.
//!
//! ## Propagation
//!
//! Locale errors surface synchronously to the caller that attempted resolution.
//! Format construction/computation failures never escape a
//! [`CompactNumber`](crate::number::CompactNumber) accessor; they are handed to
//! the configured [`ErrorReporter`] once and the value degrades to a plain
//! rendering. `MalformedCldrTable` stays inside the extraction pipeline.

use std::sync::Arc;

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Locale resolution issues (no data, unavailable or malformed tags).
    Locale,
    /// Formatter option, construction, or computation issues.
    Format,
    /// Structural problems in CLDR source data.
    Data,
    /// Configuration issues (parse errors, invalid values, missing files).
    Configuration,
    /// Internal errors (I/O, serialization, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Locale => "Locale error",
            Self::Format => "Format error",
            Self::Data => "Locale data error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Locale => "L",
            Self::Format => "F",
            Self::Data => "D",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for the `cldr-extract` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Invalid configuration or arguments
    ConfigError = 2,
    /// Locale data could not be read or produced
    DataError = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Main error type for compact-number operations.
#[derive(Error, Debug)]
pub enum CompactError {
    // ==========================================================================
    // Locale errors (Category: Locale)
    // ==========================================================================
    /// The registry has never received a registration.
    #[error("no compact number data has been loaded")]
    NoDataLoaded,

    /// No registry entry for the requested or default locale.
    #[error("missing locale data for locale \"{locale}\"")]
    MissingLocaleData { locale: String },

    /// Requested default locale is not available and minimizes to itself.
    #[error("no compact number data has been loaded for locale \"{locale}\"")]
    LocaleUnavailable { locale: String },

    /// Neither the requested default locale nor its minimized form is available.
    #[error(
        "no compact number data has been loaded for locale \"{locale}\", nor its minimized variant \"{minimized}\""
    )]
    LocaleAndMinimizedUnavailable { locale: String, minimized: String },

    /// A locale tag is not structurally valid BCP-47.
    #[error("invalid language tag: \"{0}\"")]
    InvalidLocaleTag(String),

    // ==========================================================================
    // Format errors (Category: Format)
    // ==========================================================================
    /// A formatter option is out of range or inconsistent.
    #[error("invalid value for option '{option}': {message}")]
    InvalidOption { option: String, message: String },

    /// A formatter option is valid but not supported by this formatter.
    #[error("unsupported {option}: {value}")]
    UnsupportedOption { option: String, value: String },

    /// A named format was referenced but not configured.
    #[error("no number format named \"{0}\"")]
    UnknownNamedFormat(String),

    /// The formatting primitive rejected the resolved options.
    #[error("error creating formatter for the compact number: {message}")]
    FormatterConstructionFailed {
        message: String,
        #[source]
        cause: Option<Box<CompactError>>,
    },

    /// A step of exponent/round/format failed mid-computation.
    #[error("error formatting the compact number: {message}")]
    FormatComputationFailed {
        message: String,
        #[source]
        cause: Option<Box<CompactError>>,
    },

    // ==========================================================================
    // Data errors (Category: Data)
    // ==========================================================================
    /// Structural violation in a CLDR numbers tree.
    #[error("cannot process CLDR data (locale \"{locale}\", numbering system {}): {message}", .numbering_system.as_deref().unwrap_or("<none>"))]
    MalformedCldrTable {
        locale: String,
        numbering_system: Option<String>,
        message: String,
    },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Configuration file not found at an explicitly requested path.
    #[error("config file not found: {path}")]
    ConfigNotFound { path: String },

    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // I/O errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompactError {
    /// Wrap an error raised while constructing the formatting primitive.
    #[must_use]
    pub fn construction_failed(cause: Self) -> Self {
        Self::FormatterConstructionFailed {
            message: cause.to_string(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Wrap an error raised while computing one of the compact outputs.
    #[must_use]
    pub fn computation_failed(cause: Self) -> Self {
        Self::FormatComputationFailed {
            message: cause.to_string(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Map error to the binary's exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::Config(_)
            | Self::InvalidLocaleTag(_) => ExitCode::ConfigError,

            Self::MalformedCldrTable { .. }
            | Self::NoDataLoaded
            | Self::MissingLocaleData { .. }
            | Self::LocaleUnavailable { .. }
            | Self::LocaleAndMinimizedUnavailable { .. }
            | Self::Json(_) => ExitCode::DataError,

            Self::InvalidOption { .. }
            | Self::UnsupportedOption { .. }
            | Self::UnknownNamedFormat(_)
            | Self::FormatterConstructionFailed { .. }
            | Self::FormatComputationFailed { .. }
            | Self::Io(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NoDataLoaded
            | Self::MissingLocaleData { .. }
            | Self::LocaleUnavailable { .. }
            | Self::LocaleAndMinimizedUnavailable { .. }
            | Self::InvalidLocaleTag(_) => ErrorCategory::Locale,

            Self::InvalidOption { .. }
            | Self::UnsupportedOption { .. }
            | Self::UnknownNamedFormat(_)
            | Self::FormatterConstructionFailed { .. }
            | Self::FormatComputationFailed { .. } => ErrorCategory::Format,

            Self::MalformedCldrTable { .. } => ErrorCategory::Data,

            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::Config(_) => {
                ErrorCategory::Configuration
            }

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `CNF-{category}{number}` where category is:
    /// - L: Locale
    /// - F: Format
    /// - D: Data
    /// - C: Configuration
    /// - X: Internal
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            // Locale errors (L001-L099)
            Self::NoDataLoaded => "CNF-L001",
            Self::MissingLocaleData { .. } => "CNF-L002",
            Self::LocaleUnavailable { .. } => "CNF-L003",
            Self::LocaleAndMinimizedUnavailable { .. } => "CNF-L004",
            Self::InvalidLocaleTag(_) => "CNF-L010",

            // Format errors (F001-F099)
            Self::InvalidOption { .. } => "CNF-F001",
            Self::UnsupportedOption { .. } => "CNF-F002",
            Self::UnknownNamedFormat(_) => "CNF-F003",
            Self::FormatterConstructionFailed { .. } => "CNF-F010",
            Self::FormatComputationFailed { .. } => "CNF-F011",

            // Data errors (D001-D099)
            Self::MalformedCldrTable { .. } => "CNF-D001",

            // Configuration errors (C001-C099)
            Self::ConfigNotFound { .. } => "CNF-C001",
            Self::ConfigParse { .. } => "CNF-C002",
            Self::Config(_) => "CNF-C003",

            // Internal errors (X001-X099)
            Self::Io(_) => "CNF-X001",
            Self::Json(_) => "CNF-X002",
            Self::Other(_) => "CNF-X099",
        }
    }

    /// Returns the locale tag this error is about, if any.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        match self {
            Self::MissingLocaleData { locale }
            | Self::LocaleUnavailable { locale }
            | Self::LocaleAndMinimizedUnavailable { locale, .. }
            | Self::MalformedCldrTable { locale, .. } => Some(locale),
            Self::InvalidLocaleTag(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Callback receiving errors that are recovered instead of returned.
///
/// Must not panic or block; it is called from inside formatting accessors.
pub type ErrorReporter = Arc<dyn Fn(&CompactError) + Send + Sync>;

/// Result type alias for compact-number operations.
pub type Result<T> = std::result::Result<T, CompactError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn error_codes_use_category_prefix() {
        let errors = vec![
            CompactError::NoDataLoaded,
            CompactError::MissingLocaleData { locale: "fr".to_string() },
            CompactError::InvalidOption {
                option: "maximumFractionDigits".to_string(),
                message: "out of range".to_string(),
            },
            CompactError::MalformedCldrTable {
                locale: "xx".to_string(),
                numbering_system: Some("latn".to_string()),
                message: "missing long".to_string(),
            },
            CompactError::Config("bad".to_string()),
            CompactError::Io(std::io::Error::other("disk")),
        ];

        for err in errors {
            let expected = format!("CNF-{}", err.category().code_prefix());
            assert!(
                err.error_code().starts_with(&expected),
                "{:?} should have code starting with {}",
                err,
                expected
            );
        }
    }

    #[test]
    fn minimized_variant_message_names_both_tags() {
        let err = CompactError::LocaleAndMinimizedUnavailable {
            locale: "zh-Hans".to_string(),
            minimized: "zh".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("\"zh-Hans\""));
        assert!(message.contains("\"zh\""));
        assert_eq!(err.locale(), Some("zh-Hans"));
    }

    #[test]
    fn construction_failure_keeps_cause() {
        let err = CompactError::construction_failed(CompactError::UnsupportedOption {
            option: "style".to_string(),
            value: "percent".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Format);
        assert_eq!(err.error_code(), "CNF-F010");
        let source = err.source().expect("cause is attached");
        assert!(source.to_string().contains("percent"));
    }

    #[test]
    fn malformed_table_without_numbering_system() {
        let err = CompactError::MalformedCldrTable {
            locale: "xx".to_string(),
            numbering_system: None,
            message: "numbers node missing".to_string(),
        };
        assert!(err.to_string().contains("<none>"));
        assert_eq!(err.exit_code(), ExitCode::DataError);
    }

    #[test]
    fn exit_codes_are_correct() {
        assert_eq!(CompactError::Config("x".to_string()).exit_code(), ExitCode::ConfigError);
        assert_eq!(CompactError::NoDataLoaded.exit_code(), ExitCode::DataError);
        assert_eq!(
            CompactError::Io(std::io::Error::other("x")).exit_code(),
            ExitCode::GeneralError
        );
    }
}
