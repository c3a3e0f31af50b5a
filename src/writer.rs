//! Format-preserving append of merged rows into the base worksheet.

use tracing::{debug, info};

use crate::classify::ValueClassifier;
use crate::io::progress::ProgressSink;
use crate::io::workbook::SheetDocument;
use crate::model::{CellStyle, HeaderSchema, HorizontalAlign, MergedTable};

/// Where and how merged rows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePlan {
    /// Data rows already present in the base worksheet (below the header).
    pub base_row_count: usize,
    /// Rows per progress step.
    pub batch_size: usize,
}

impl WritePlan {
    /// First worksheet row receiving merged data.
    pub fn start_row(&self) -> u32 {
        self.base_row_count as u32 + 2
    }

    /// Row whose styles are copied: the first base data row, or the header
    /// row when the base file has no data.
    pub fn reference_row(&self) -> u32 {
        if self.base_row_count > 0 { 2 } else { 1 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub rows_written: usize,
    pub stale_rows_removed: u32,
}

/// Appends every row of `table` after the base file's own rows.
///
/// The first `plan.base_row_count` rows of `table` are the base file's rows
/// and are already in the worksheet, so writing starts with the next one.
/// Rows left below the append point by an earlier save are deleted first.
pub fn write_merged<D: SheetDocument>(
    document: &mut D,
    schema: &HeaderSchema,
    table: &MergedTable,
    plan: &WritePlan,
    classifier: &ValueClassifier,
    sink: &mut dyn ProgressSink,
) -> WriteReport {
    let mut report = WriteReport::default();
    let start_row = plan.start_row();

    let highest = document.highest_row();
    if highest >= start_row {
        let stale = highest - start_row + 1;
        document.delete_rows(start_row, stale);
        report.stale_rows_removed = stale;
        sink.append(&format!(
            "removed {stale} leftover row(s) below the base file's data"
        ));
    }

    let reference_row = plan.reference_row();
    let reference_styles: Vec<CellStyle> = schema
        .entries()
        .iter()
        .map(|entry| document.cell_style(reference_row, entry.column_index))
        .collect();
    debug!(
        reference_row,
        columns = reference_styles.len(),
        "reference styles captured"
    );

    let total = table.row_count().saturating_sub(plan.base_row_count);
    let batch_size = plan.batch_size.max(1);

    for batch_start in (0..total).step_by(batch_size) {
        let batch_len = batch_size.min(total - batch_start);
        for offset in batch_start..batch_start + batch_len {
            let target_row = start_row + offset as u32;
            let table_row = plan.base_row_count + offset;
            for (column, entry) in schema.entries().iter().enumerate() {
                let raw = table.value(table_row, column);
                let decision = classifier.classify_and_coerce(raw, entry.is_amount_column);

                let reference = &reference_styles[column];
                let mut style = reference.clone();
                style.number_format = decision.format_code(&reference.number_format).to_string();
                if decision.force_right_align {
                    style.alignment.horizontal = HorizontalAlign::Right;
                }

                document.write_cell(target_row, entry.column_index, &decision.value, &style);
            }
        }
        let written = batch_start + batch_len;
        report.rows_written = written;
        sink.append(&format!("writing rows: {written}/{total}"));
        info!(written, total, "batch written");
    }

    report
}
