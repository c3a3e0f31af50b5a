//! Header detection for the base file.
//!
//! Labels are canonicalized with [`normalize_header`] so that headers written
//! by different people (`Total Amount`, `total_amount`, `TOTAL-AMOUNT`) compare
//! equal. The rule set:
//!
//! 1. full-width ASCII variants (U+FF01..U+FF5E) and the ideographic space map
//!    to their half-width forms, so `（金额）：` becomes `(金额):`;
//! 2. letters are lower-cased;
//! 3. whitespace, `-` and `_` are removed.
//!
//! Digits and every other punctuation mark are kept as-is. Each step only
//! produces characters that later steps leave alone, so normalizing twice
//! yields the same label.
//!
//! Only a cell without text ends the header row. A cell holding nothing but
//! whitespace keeps the row going; its entry normalizes to an empty label, so
//! it never matches a source column and is written with empty values.

use tracing::debug;

use crate::classify::ValueClassifier;
use crate::config::MergeConfig;
use crate::error::{Result, ToolError};
use crate::io::workbook::SheetDocument;
use crate::model::{HeaderEntry, HeaderSchema};

const HEADER_ROW: u32 = 1;

/// Canonical form of a header label.
pub fn normalize_header(label: &str) -> String {
    label
        .chars()
        .map(to_half_width)
        .flat_map(char::to_lowercase)
        .filter(|ch| !is_separator(*ch))
        .collect()
}

fn to_half_width(ch: char) -> char {
    match ch {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(ch as u32 - 0xFEE0).unwrap_or(ch),
        other => other,
    }
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ch == '-' || ch == '_'
}

/// Scans the header row of `document` and builds the base schema.
///
/// Scanning starts at column 1. After each recorded column the next
/// `empty_column_threshold` cells are inspected; the row ends when all of them
/// are empty. A label found beyond `max_columns` also ends the scan and marks
/// the schema as truncated, which is not an error.
pub fn analyze_header<D: SheetDocument>(
    document: &D,
    config: &MergeConfig,
    classifier: &ValueClassifier,
) -> HeaderSchema {
    let mut entries = Vec::new();
    let mut truncated = false;

    let mut column = 1;
    while column <= config.max_columns {
        let original_label = document.cell_text(HEADER_ROW, column);
        let normalized_label = original_label
            .as_deref()
            .map(normalize_header)
            .unwrap_or_default();
        let is_amount_column = original_label
            .as_deref()
            .is_some_and(|label| classifier.is_amount_column(label));

        entries.push(HeaderEntry {
            column_index: column,
            original_label,
            normalized_label,
            is_amount_column,
            is_provenance: false,
        });

        match header_end(document, column, config) {
            HeaderEnd::EmptyRun => break,
            HeaderEnd::ColumnLimit => {
                truncated = true;
                break;
            }
            HeaderEnd::Continue => column += 1,
        }
    }

    debug!(columns = entries.len(), truncated, "header row analyzed");
    HeaderSchema::new(entries, truncated)
}

/// Like [`analyze_header`], but rejects a header row without any label.
pub fn analyze_base_header<D: SheetDocument>(
    document: &D,
    config: &MergeConfig,
    classifier: &ValueClassifier,
    path: &std::path::Path,
) -> Result<HeaderSchema> {
    let schema = analyze_header(document, config, classifier);
    if schema.is_empty() || schema.has_no_labels() {
        return Err(ToolError::EmptyHeader(path.to_path_buf()));
    }
    Ok(schema)
}

#[derive(Debug, PartialEq, Eq)]
enum HeaderEnd {
    Continue,
    EmptyRun,
    ColumnLimit,
}

fn header_end<D: SheetDocument>(document: &D, column: u32, config: &MergeConfig) -> HeaderEnd {
    for offset in 1..=config.empty_column_threshold {
        let next = column.saturating_add(offset);
        if document.cell_text(HEADER_ROW, next).is_none() {
            continue;
        }
        return if next > config.max_columns {
            HeaderEnd::ColumnLimit
        } else {
            HeaderEnd::Continue
        };
    }
    HeaderEnd::EmptyRun
}
