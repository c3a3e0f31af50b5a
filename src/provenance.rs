//! Source column injection.
//!
//! Adds a leading column naming the file each row came from. The worksheet
//! gains a new column A, every schema entry shifts one column to the right,
//! and the base file's own rows are labelled with the base file name. This
//! has to happen before any file is aligned so that alignment sees the
//! shifted schema.

use std::path::Path;

use tracing::info;

use crate::error::{Result, ToolError};
use crate::header::normalize_header;
use crate::io::workbook::SheetDocument;
use crate::model::{CellValue, HeaderEntry, HeaderSchema};

const SOURCE_COLUMN: u32 = 1;

/// File name without its extension, used as the provenance value.
pub fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Inserts the provenance column into `schema` and `document`.
///
/// `base_row_count` is the number of data rows below the header that belong
/// to the base file; they receive `base_label`. New cells take their style
/// from the cell that was in column A before the shift.
pub fn inject_provenance<D: SheetDocument>(
    mut schema: HeaderSchema,
    document: &mut D,
    column_label: &str,
    base_label: &str,
    base_row_count: usize,
) -> Result<HeaderSchema> {
    if schema.has_provenance() {
        return Err(ToolError::ProvenanceAlreadyInjected);
    }

    document.insert_columns(SOURCE_COLUMN, 1);

    let style_column = SOURCE_COLUMN + 1;
    let header_style = document.cell_style(1, style_column);
    document.write_cell(
        1,
        SOURCE_COLUMN,
        &CellValue::Text(column_label.to_string()),
        &header_style,
    );

    let base_value = CellValue::Text(base_label.to_string());
    for row in 2..=(base_row_count as u32 + 1) {
        let style = document.cell_style(row, style_column);
        document.write_cell(row, SOURCE_COLUMN, &base_value, &style);
    }

    let mut entries = Vec::with_capacity(schema.len() + 1);
    entries.push(HeaderEntry {
        column_index: SOURCE_COLUMN,
        original_label: Some(column_label.to_string()),
        normalized_label: normalize_header(column_label),
        is_amount_column: false,
        is_provenance: true,
    });
    entries.extend(schema.entries().iter().cloned().map(|mut entry| {
        entry.column_index += 1;
        entry
    }));
    schema.replace_entries(entries);

    info!(
        column = column_label,
        backfilled_rows = base_row_count,
        "source column injected"
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::workbook::memory::MemorySheet;
    use crate::model::{CellStyle, FontStyle};

    fn base_schema() -> HeaderSchema {
        let entries = ["ID", "Amount"]
            .iter()
            .enumerate()
            .map(|(idx, label)| HeaderEntry {
                column_index: idx as u32 + 1,
                original_label: Some(label.to_string()),
                normalized_label: normalize_header(label),
                is_amount_column: *label == "Amount",
                is_provenance: false,
            })
            .collect();
        HeaderSchema::new(entries, false)
    }

    fn base_sheet() -> MemorySheet {
        let mut sheet = MemorySheet::with_header(&["ID", "Amount"]);
        sheet.set_text(2, 1, "1");
        sheet.set_text(2, 2, "10");
        sheet.set_text(3, 1, "2");
        sheet.set_text(3, 2, "20");
        sheet.set_style(
            2,
            1,
            CellStyle {
                font: FontStyle {
                    bold: true,
                    ..FontStyle::default()
                },
                ..CellStyle::default()
            },
        );
        sheet
    }

    #[test]
    fn indices_shift_and_map_is_rebuilt() {
        let mut sheet = base_sheet();
        let schema = inject_provenance(base_schema(), &mut sheet, "来源", "shop-a", 2)
            .expect("injection succeeds");

        assert_eq!(schema.labels(), vec!["来源", "id", "amount"]);
        let indices: Vec<u32> = schema.entries().iter().map(|e| e.column_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(schema.map().get("来源"), Some(1));
        assert_eq!(schema.map().get("amount"), Some(3));
        assert!(schema.entries()[2].is_amount_column);
    }

    #[test]
    fn base_rows_are_backfilled_with_shifted_styles() {
        let mut sheet = base_sheet();
        inject_provenance(base_schema(), &mut sheet, "来源", "shop-a", 2)
            .expect("injection succeeds");

        assert_eq!(sheet.cell_text(1, 1).as_deref(), Some("来源"));
        assert_eq!(sheet.cell_text(2, 1).as_deref(), Some("shop-a"));
        assert_eq!(sheet.cell_text(3, 1).as_deref(), Some("shop-a"));
        assert_eq!(sheet.cell_text(4, 1), None);
        assert_eq!(sheet.cell_text(2, 2).as_deref(), Some("1"));
        assert_eq!(sheet.cell_text(3, 3).as_deref(), Some("20"));
        assert!(sheet.cell_style(2, 1).font.bold);
    }

    #[test]
    fn second_injection_is_rejected() {
        let mut sheet = base_sheet();
        let schema = inject_provenance(base_schema(), &mut sheet, "来源", "shop-a", 2)
            .expect("injection succeeds");
        let error = inject_provenance(schema, &mut sheet, "来源", "shop-a", 2)
            .expect_err("second injection rejected");
        assert!(matches!(error, ToolError::ProvenanceAlreadyInjected));
    }

    #[test]
    fn file_label_strips_extension() {
        assert_eq!(file_label(Path::new("/data/北区门店.xlsx")), "北区门店");
        assert_eq!(file_label(Path::new("report.v2.xlsm")), "report.v2");
    }
}
