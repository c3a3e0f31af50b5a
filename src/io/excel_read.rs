use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};

use crate::error::{Result, ToolError};

/// Text content of a worksheet, anchored at cell A1.
///
/// Row 0 is the header row; every following row is a data row. Rows keep the
/// width they were read with, so trailing empty cells may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn headers(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

/// Reads the first worksheet of `path` as text.
pub fn read_grid(path: &Path) -> Result<SheetGrid> {
    let source_error = |reason: String| ToolError::SourceRead {
        path: path.to_path_buf(),
        reason,
    };
    let mut workbook = open_workbook_auto(path).map_err(|error| source_error(error.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| source_error("workbook has no worksheets".into()))?
        .map_err(|error| source_error(error.to_string()))?;
    Ok(grid_from_range(&range))
}

fn grid_from_range(range: &calamine::Range<DataType>) -> SheetGrid {
    let Some((end_row, end_col)) = range.end() else {
        return SheetGrid::default();
    };

    // calamine ranges start at the first used cell; re-anchor at A1 so that
    // row 0 is always the sheet's first row.
    let rows = (0..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| cell_to_string(range.get_value((row, col))))
                .collect::<Vec<_>>()
        })
        .collect();
    SheetGrid { rows }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(cell @ DataType::DateTime(_)) => cell
            .as_datetime()
            .map(|value| value.to_string())
            .unwrap_or_else(|| cell.to_string()),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
