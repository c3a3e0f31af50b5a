use std::collections::HashMap;

/// Number format code Excel uses for "treat as text".
pub const TEXT_FORMAT: &str = "@";
/// Number format code of a cell that never had one assigned.
pub const GENERAL_FORMAT: &str = "General";

/// One detected column of the base file's header row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderEntry {
    /// 1-based worksheet column.
    pub column_index: u32,
    /// Header text as found in the sheet, `None` for an empty cell.
    pub original_label: Option<String>,
    /// Canonical form used for cross-file matching.
    pub normalized_label: String,
    /// Values in this column are coerced to numbers and right-aligned.
    pub is_amount_column: bool,
    /// The column carries the originating file name rather than sheet data.
    pub is_provenance: bool,
}

/// Normalized label → column index, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    columns: HashMap<String, u32>,
}

impl HeaderMap {
    pub fn from_entries(entries: &[HeaderEntry]) -> Self {
        let mut map = Self::default();
        for entry in entries {
            map.insert(&entry.normalized_label, entry.column_index);
        }
        map
    }

    /// Records `label` unless it is empty or already mapped.
    pub fn insert(&mut self, label: &str, column_index: u32) {
        if label.is_empty() || self.columns.contains_key(label) {
            return;
        }
        self.columns.insert(label.to_string(), column_index);
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.columns.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The base file's column schema shared by every aligned file.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSchema {
    entries: Vec<HeaderEntry>,
    map: HeaderMap,
    truncated: bool,
}

impl HeaderSchema {
    pub fn new(entries: Vec<HeaderEntry>, truncated: bool) -> Self {
        let map = HeaderMap::from_entries(&entries);
        Self {
            entries,
            map,
            truncated,
        }
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn map(&self) -> &HeaderMap {
        &self.map
    }

    /// True when scanning stopped at the column limit rather than at an empty run.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no entry carries a usable label.
    pub fn has_no_labels(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.normalized_label.is_empty())
    }

    pub fn has_provenance(&self) -> bool {
        self.entries.iter().any(|entry| entry.is_provenance)
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.normalized_label.clone())
            .collect()
    }

    pub fn amount_columns(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.entries.iter().filter(|entry| entry.is_amount_column)
    }

    /// Replaces the entry list and rebuilds the label map.
    pub(crate) fn replace_entries(&mut self, entries: Vec<HeaderEntry>) {
        self.map = HeaderMap::from_entries(&entries);
        self.entries = entries;
    }
}

/// A source file re-projected onto the base schema.
///
/// Every row holds exactly one value per schema column, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSource {
    /// Name of the file the rows came from.
    pub file_name: String,
    /// Normalized labels, identical to the schema's label list.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RowSource {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Per-file contribution recorded in a [`MergedTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpan {
    pub file_name: String,
    pub row_count: usize,
}

/// All aligned rows in file-processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub spans: Vec<FileSpan>,
}

impl MergedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value at (`row`, `column`), empty when the row is short.
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Typed value written into a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

/// Where a written cell's number format comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatDecision {
    /// Keep the reference cell's format.
    Inherit,
    /// Force the text format (`@`).
    Text,
}

/// Outcome of classifying one raw value for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct CellWriteDecision {
    pub value: CellValue,
    pub number_format: FormatDecision,
    pub force_right_align: bool,
}

impl CellWriteDecision {
    /// Resolves the final number format code against the reference cell's code.
    pub fn format_code<'a>(&self, reference: &'a str) -> &'a str {
        match self.number_format {
            FormatDecision::Inherit => reference,
            FormatDecision::Text => TEXT_FORMAT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HorizontalAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
    Distributed,
}

/// A colour as stored in the workbook.
///
/// Exactly one of `argb`, `theme` or `indexed` is normally set; `tint`
/// lightens (positive) or darkens (negative) a theme or indexed colour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorSpec {
    /// ARGB hex, e.g. `FF000000`.
    pub argb: Option<String>,
    /// Index into the workbook theme's colour scheme.
    pub theme: Option<u32>,
    /// Index into the legacy indexed palette.
    pub indexed: Option<u32>,
    pub tint: Option<f64>,
}

impl ColorSpec {
    pub fn argb(value: &str) -> Self {
        Self {
            argb: Some(value.to_string()),
            ..Self::default()
        }
    }

    pub fn theme(index: u32, tint: Option<f64>) -> Self {
        Self {
            theme: Some(index),
            tint,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontStyle {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    /// OOXML underline kind such as `single` or `double`.
    pub underline: Option<String>,
    pub strikethrough: bool,
    pub color: Option<ColorSpec>,
    /// `superscript` or `subscript`; `None` is the baseline.
    pub vertical_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillStyle {
    /// OOXML pattern name such as `solid` or `gray125`.
    pub pattern: Option<String>,
    pub foreground_color: Option<ColorSpec>,
    pub background_color: Option<ColorSpec>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderEdge {
    /// OOXML border style such as `thin` or `medium`.
    pub style: Option<String>,
    pub color: Option<ColorSpec>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderStyle {
    pub left: BorderEdge,
    pub right: BorderEdge,
    pub top: BorderEdge,
    pub bottom: BorderEdge,
    pub diagonal: BorderEdge,
    pub diagonal_up: bool,
    pub diagonal_down: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentStyle {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub wrap_text: bool,
    pub text_rotation: u32,
}

/// Complete, owned visual style of one cell.
///
/// Values are plain data: cloning yields a fully independent style, so a cell
/// written from a copy never shares state with the reference cell or its peers.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    pub number_format: String,
    pub font: FontStyle,
    pub fill: FillStyle,
    pub border: BorderStyle,
    pub alignment: AlignmentStyle,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            number_format: GENERAL_FORMAT.to_string(),
            font: FontStyle::default(),
            fill: FillStyle::default(),
            border: BorderStyle::default(),
            alignment: AlignmentStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(column_index: u32, label: &str) -> HeaderEntry {
        HeaderEntry {
            column_index,
            original_label: Some(label.to_string()),
            normalized_label: label.to_string(),
            is_amount_column: false,
            is_provenance: false,
        }
    }

    #[test]
    fn header_map_keeps_first_occurrence_and_skips_empty() {
        let entries = vec![entry(1, "id"), entry(2, ""), entry(3, "id"), entry(4, "note")];
        let map = HeaderMap::from_entries(&entries);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("id"), Some(1));
        assert_eq!(map.get("note"), Some(4));
        assert_eq!(map.get(""), None);
    }

    #[test]
    fn merged_table_value_defaults_to_empty() {
        let table = MergedTable {
            columns: vec!["id".into(), "amount".into()],
            rows: vec![vec!["1".into()]],
            spans: Vec::new(),
        };
        assert_eq!(table.value(0, 0), "1");
        assert_eq!(table.value(0, 1), "");
        assert_eq!(table.value(5, 0), "");
    }

    #[test]
    fn format_code_resolution() {
        let decision = CellWriteDecision {
            value: CellValue::Text("N/A".into()),
            number_format: FormatDecision::Text,
            force_right_align: true,
        };
        assert_eq!(decision.format_code("#,##0.00"), "@");

        let inherit = CellWriteDecision {
            number_format: FormatDecision::Inherit,
            ..decision
        };
        assert_eq!(inherit.format_code("#,##0.00"), "#,##0.00");
    }
}
