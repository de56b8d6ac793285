//! CLDR extraction pipeline.
//!
//! Turns `<cldr_dir>/main/<locale>/numbers.json` trees into flat
//! [`NumberFormatLocaleData`] records and writes them, with a
//! `manifest.json`, to an output directory.
//!
//! CLDR node names encode a type plus dash-separated attribute pairs:
//! `decimalFormats-numberSystem-latn`, `1000-count-one`,
//! `1000-count-one-alt-alphaNextToNumber`.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Malformed table | Missing style/format node, bad count or threshold | Warn, skip that (locale, numbering system) |
//! | Malformed locale | Missing `numbers` node, unreadable or invalid JSON | Warn, skip the locale |
//! | Output failure | Output directory not writable | Abort with `Io` |

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::locale::LanguageTag;
use crate::core::models::{
    CompactDisplay, CompactStyles, DataManifest, NumberFormatLocaleData, NumberSymbols, TableKind,
};
use crate::core::plural::PluralCategory;
use crate::core::registry::MANIFEST_FILE;
use crate::error::{CompactError, Result};
use crate::storage::config::ResolvedExtractConfig;

// =============================================================================
// Node Selectors
// =============================================================================

/// Which CLDR nodes feed one table kind.
#[derive(Debug, Clone, Copy)]
struct TableSelector {
    kind: TableKind,
    /// Top-level node id, e.g. `decimalFormats`.
    node_id: &'static str,
    /// Format root inside each style node.
    format_node_id: &'static str,
    styles: &'static [CompactDisplay],
}

const SELECTORS: [TableSelector; 2] = [
    TableSelector {
        kind: TableKind::Decimal,
        node_id: "decimalFormats",
        format_node_id: "decimalFormat",
        styles: &[CompactDisplay::Long, CompactDisplay::Short],
    },
    TableSelector {
        kind: TableKind::Currency,
        node_id: "currencyFormats",
        format_node_id: "standard",
        styles: &[CompactDisplay::Short],
    },
];

const SYMBOLS_NODE_ID: &str = "symbols";

/// Split an encoded node name into its id and attribute pairs.
///
/// A trailing attribute without a value is dropped.
#[must_use]
pub fn decode_node_name(name: &str) -> (&str, Vec<(&str, &str)>) {
    let mut segments = name.split('-');
    let id = segments.next().unwrap_or_default();
    let rest: Vec<&str> = segments.collect();
    let attrs = rest
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    (id, attrs)
}

fn attr<'a>(attrs: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

// =============================================================================
// Per-Locale Extraction
// =============================================================================

/// Extract one table (all styles of one numbering system).
fn process_formats_node(
    node: &Value,
    selector: &TableSelector,
) -> std::result::Result<CompactStyles, String> {
    let mut styles = CompactStyles::default();

    for display in selector.styles {
        let style_name = display.node_name();
        let style_node = node
            .get(style_name)
            .ok_or_else(|| format!("missing style node \"{style_name}\""))?;
        let format_root = style_node
            .get(selector.format_node_id)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                format!(
                    "style node \"{style_name}\" is missing format root \"{}\"",
                    selector.format_node_id
                )
            })?;

        let table = styles.style_mut(*display);
        for (encoded, pattern) in format_root {
            let (threshold, attrs) = decode_node_name(encoded);
            let Some(count) = attr(&attrs, "count") else {
                continue;
            };
            if attr(&attrs, "alt").is_some() {
                continue;
            }

            let category = PluralCategory::from_keyword(count)
                .ok_or_else(|| format!("unknown plural count \"{count}\" in \"{encoded}\""))?;
            let threshold: u64 = threshold
                .parse()
                .map_err(|_| format!("non-numeric threshold in \"{encoded}\""))?;
            let pattern = pattern
                .as_str()
                .ok_or_else(|| format!("pattern \"{encoded}\" is not a string"))?;

            table.insert_if_absent(threshold, category, pattern);
        }
    }

    Ok(styles)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Extract the compact tables of one locale document.
///
/// Returns the record and the table-level violations that were skipped.
///
/// # Errors
///
/// Returns `MalformedCldrTable` (without a numbering system) if the
/// document has no `main.<locale>.numbers` node.
pub fn extract_locale_data(
    locale: &str,
    document: &Value,
) -> Result<(NumberFormatLocaleData, Vec<CompactError>)> {
    let numbers = document
        .get("main")
        .and_then(|main| main.get(locale))
        .and_then(|root| root.get("numbers"))
        .and_then(Value::as_object)
        .ok_or_else(|| CompactError::MalformedCldrTable {
            locale: locale.to_string(),
            numbering_system: None,
            message: "missing numbers node".to_string(),
        })?;

    let mut data = NumberFormatLocaleData {
        default_numbering_system: numbers
            .get("defaultNumberingSystem")
            .and_then(Value::as_str)
            .map(str::to_string),
        ..NumberFormatLocaleData::default()
    };
    let mut warnings = Vec::new();
    let mut seen: [Vec<String>; 2] = [Vec::new(), Vec::new()];

    for (encoded, node) in numbers {
        let (id, attrs) = decode_node_name(encoded);
        let numbering_system = attr(&attrs, "numberSystem");

        if id == SYMBOLS_NODE_ID {
            let Some(nu) = numbering_system else { continue };
            match serde_json::from_value::<NumberSymbols>(node.clone()) {
                Ok(symbols) => {
                    data.symbols.insert(nu.to_string(), symbols);
                }
                Err(e) => warnings.push(CompactError::MalformedCldrTable {
                    locale: locale.to_string(),
                    numbering_system: Some(nu.to_string()),
                    message: format!("invalid symbols node: {e}"),
                }),
            }
            continue;
        }

        let Some((index, selector)) = SELECTORS
            .iter()
            .enumerate()
            .find(|(_, selector)| selector.node_id == id)
        else {
            continue;
        };

        let Some(nu) = numbering_system else {
            warnings.push(CompactError::MalformedCldrTable {
                locale: locale.to_string(),
                numbering_system: None,
                message: format!("\"{encoded}\" is missing the numberSystem attribute"),
            });
            continue;
        };

        match process_formats_node(node, selector) {
            Ok(styles) => {
                let table = match selector.kind {
                    TableKind::Decimal => &mut data.decimal,
                    TableKind::Currency => &mut data.currency,
                };
                table.insert(nu, styles);
                push_unique(&mut seen[index], nu);
            }
            Err(message) => warnings.push(CompactError::MalformedCldrTable {
                locale: locale.to_string(),
                numbering_system: Some(nu.to_string()),
                message: format!("{id}: {message}"),
            }),
        }
    }

    for nu in seen.iter().flatten() {
        push_unique(&mut data.numbering_systems, nu);
    }

    for warning in &warnings {
        tracing::warn!(
            locale,
            numbering_system = ?warning_numbering_system(warning),
            error = %warning,
            "Skipping malformed CLDR table"
        );
    }

    Ok((data, warnings))
}

fn warning_numbering_system(error: &CompactError) -> Option<&str> {
    match error {
        CompactError::MalformedCldrTable {
            numbering_system, ..
        } => numbering_system.as_deref(),
        _ => None,
    }
}

// =============================================================================
// Batch
// =============================================================================

/// Outcome of a batch extraction.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Locales written, in manifest order.
    pub locales: Vec<String>,
    /// Files written with their sizes in bytes.
    pub written_files: Vec<(PathBuf, u64)>,
    /// Skipped tables and locales.
    pub warnings: Vec<CompactError>,
}

impl ExtractionReport {
    /// Total bytes written.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.written_files.iter().map(|(_, size)| size).sum()
    }
}

/// Locales available under `<cldr_dir>/main`, sorted.
///
/// # Errors
///
/// Returns `Io` if the directory cannot be read.
pub fn available_locales(cldr_dir: &Path) -> Result<Vec<String>> {
    let mut locales: Vec<String> = fs::read_dir(cldr_dir.join("main"))?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    locales.sort();
    Ok(locales)
}

fn read_document(cldr_dir: &Path, locale: &str) -> Result<Value> {
    let path = cldr_dir.join("main").join(locale).join("numbers.json");
    let content = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json(path: &Path, value: &impl serde::Serialize, pretty: bool) -> Result<u64> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    fs::write(path, &content)?;
    Ok(content.len() as u64)
}

/// Run the extraction for `config`.
///
/// # Errors
///
/// Returns `Io` if the CLDR directory cannot be listed or the output cannot
/// be written. Per-locale problems are recorded as warnings instead.
pub fn generate_locale_data(config: &ResolvedExtractConfig) -> Result<ExtractionReport> {
    let locales = if config.locales.is_empty() {
        available_locales(&config.cldr_dir)?
    } else {
        config.locales.clone()
    };

    fs::create_dir_all(&config.out_dir)?;
    let mut report = ExtractionReport::default();

    for locale in &locales {
        if let Err(e) = LanguageTag::parse(locale) {
            tracing::warn!(locale = %locale, error = %e, "Skipping locale with invalid tag");
            report.warnings.push(e);
            continue;
        }

        let extracted = read_document(&config.cldr_dir, locale)
            .and_then(|document| extract_locale_data(locale, &document));
        let (data, warnings) = match extracted {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::warn!(locale = %locale, error = %e, "Skipping malformed CLDR locale");
                report.warnings.push(e);
                continue;
            }
        };
        report.warnings.extend(warnings);

        let path = config.out_dir.join(format!("{locale}.json"));
        let size = write_json(&path, &data, config.pretty)?;
        tracing::debug!(locale = %locale, path = %path.display(), size, "Wrote locale data");
        report.written_files.push((path, size));
        report.locales.push(locale.clone());
    }

    let manifest = DataManifest {
        locales: report.locales.clone(),
    };
    let manifest_path = config.out_dir.join(MANIFEST_FILE);
    let size = write_json(&manifest_path, &manifest, config.pretty)?;
    report.written_files.push((manifest_path, size));

    tracing::info!(
        locales = report.locales.len(),
        warnings = report.warnings.len(),
        bytes = report.total_bytes(),
        out_dir = %config.out_dir.display(),
        "Extraction finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn decode_node_names() {
        assert_eq!(
            decode_node_name("decimalFormats-numberSystem-latn"),
            ("decimalFormats", vec![("numberSystem", "latn")])
        );
        assert_eq!(
            decode_node_name("1000-count-one-alt-alphaNextToNumber"),
            ("1000", vec![("count", "one"), ("alt", "alphaNextToNumber")])
        );
        assert_eq!(decode_node_name("standard"), ("standard", vec![]));
    }

    fn document(numbers: Value) -> Value {
        json!({ "main": { "xx": { "numbers": numbers } } })
    }

    #[test]
    fn leaves_without_count_and_alt_leaves_are_skipped() {
        let doc = document(json!({
            "decimalFormats-numberSystem-latn": {
                "standard": "#,##0.###",
                "long": { "decimalFormat": { "1000-count-other": "0 thousand" } },
                "short": { "decimalFormat": {
                    "1000-count-one": "0K",
                    "1000-count-one-alt-alphaNextToNumber": "0 K",
                    "1000-count-other": "0K"
                } }
            }
        }));
        let (data, warnings) = extract_locale_data("xx", &doc).unwrap();
        assert!(warnings.is_empty());
        let styles = data.decimal.get("latn").unwrap();
        let bucket = styles.short.bucket(1000).unwrap();
        assert_eq!(bucket[&PluralCategory::One], "0K");
        assert_eq!(
            styles.style(CompactDisplay::Long).bucket(1000).unwrap()[&PluralCategory::Other],
            "0 thousand"
        );
    }

    #[test]
    fn missing_style_node_skips_only_that_pair() {
        let doc = document(json!({
            "decimalFormats-numberSystem-arab": {
                "short": { "decimalFormat": { "1000-count-other": "0 ألف" } }
            },
            "decimalFormats-numberSystem-latn": {
                "long": { "decimalFormat": { "1000-count-other": "0 thousand" } },
                "short": { "decimalFormat": { "1000-count-other": "0K" } }
            }
        }));
        let (data, warnings) = extract_locale_data("xx", &doc).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            CompactError::MalformedCldrTable { numbering_system: Some(nu), .. } if nu == "arab"
        ));
        assert_eq!(data.numbering_systems, vec!["latn".to_string()]);
    }

    #[test]
    fn numbering_systems_deduplicated_in_order() {
        let short = json!({ "short": { "standard": { "1000-count-other": "¤0K" } } });
        let decimal = json!({
            "long": { "decimalFormat": {} },
            "short": { "decimalFormat": { "1000-count-other": "0K" } }
        });
        let doc = document(json!({
            "defaultNumberingSystem": "arab",
            "decimalFormats-numberSystem-arab": decimal.clone(),
            "decimalFormats-numberSystem-latn": decimal,
            "currencyFormats-numberSystem-latn": short.clone(),
            "currencyFormats-numberSystem-arab": short,
            "symbols-numberSystem-arab": { "decimal": "٫", "group": "٬" }
        }));
        let (data, _) = extract_locale_data("xx", &doc).unwrap();
        assert_eq!(data.numbering_systems, vec!["arab".to_string(), "latn".to_string()]);
        assert_eq!(data.default_numbering_system.as_deref(), Some("arab"));
        assert_eq!(data.symbols["arab"].decimal, "٫");
        assert_eq!(data.symbols["arab"].minus_sign, "-");
    }

    #[test]
    fn missing_numbers_node_is_malformed_locale() {
        let err = extract_locale_data("xx", &json!({ "main": { "xx": {} } })).unwrap_err();
        assert!(matches!(err, CompactError::MalformedCldrTable { numbering_system: None, .. }));
    }

    #[test]
    fn decimal_records_always_carry_long() {
        let doc = document(json!({
            "decimalFormats-numberSystem-latn": {
                "long": { "decimalFormat": {} },
                "short": { "decimalFormat": { "1000-count-other": "0K" } }
            },
            "currencyFormats-numberSystem-latn": {
                "short": { "standard": { "1000-count-other": "¤0K" } }
            }
        }));
        let (data, warnings) = extract_locale_data("xx", &doc).unwrap();
        assert!(warnings.is_empty());

        let record = serde_json::to_value(&data).unwrap();
        assert_eq!(record["decimal"]["latn"]["long"], json!({}));
        assert!(record["currency"]["latn"].get("long").is_none());
    }

    #[test]
    #[traced_test]
    fn violations_are_logged() {
        let doc = document(json!({
            "decimalFormats-numberSystem-latn": {
                "long": { "decimalFormat": {} },
                "short": { "decimalFormat": { "1e3-count-other": "0K" } }
            }
        }));
        let (_, warnings) = extract_locale_data("xx", &doc).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(logs_contain("Skipping malformed CLDR table"));
        assert!(logs_contain("non-numeric threshold"));
    }

    #[test]
    fn unknown_count_is_a_violation() {
        let doc = document(json!({
            "decimalFormats-numberSystem-latn": {
                "long": { "decimalFormat": {} },
                "short": { "decimalFormat": { "1000-count-several": "0K" } }
            }
        }));
        let (data, warnings) = extract_locale_data("xx", &doc).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(data.decimal.is_empty());
    }
}
