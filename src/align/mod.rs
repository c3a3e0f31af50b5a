use tracing::debug;

use crate::header::normalize_header;
use crate::io::excel_read::SheetGrid;
use crate::model::{FileSpan, HeaderSchema, MergedTable, RowSource};

/// Projects `grid` onto the columns of `schema`.
///
/// Each schema column takes its values from the first source column whose
/// normalized header equals the schema label. Schema columns without a match,
/// and columns with an empty label, are filled with empty text. Source
/// columns that match nothing are dropped. The provenance column, when
/// present, is filled with `file_label` on every row.
pub fn align_rows(
    schema: &HeaderSchema,
    grid: &SheetGrid,
    file_name: &str,
    file_label: &str,
) -> RowSource {
    let source_headers: Vec<String> = grid
        .headers()
        .iter()
        .map(|header| normalize_header(header))
        .collect();

    let mut matched = 0usize;
    let column_sources: Vec<ColumnSource> = schema
        .entries()
        .iter()
        .map(|entry| {
            if entry.is_provenance {
                return ColumnSource::FileLabel;
            }
            if entry.normalized_label.is_empty() {
                return ColumnSource::Empty;
            }
            match source_headers
                .iter()
                .position(|header| *header == entry.normalized_label)
            {
                Some(index) => {
                    matched += 1;
                    ColumnSource::Source(index)
                }
                None => ColumnSource::Empty,
            }
        })
        .collect();

    let rows = grid
        .data_rows()
        .iter()
        .map(|row| {
            column_sources
                .iter()
                .map(|source| match source {
                    ColumnSource::Source(index) => row.get(*index).cloned().unwrap_or_default(),
                    ColumnSource::FileLabel => file_label.to_string(),
                    ColumnSource::Empty => String::new(),
                })
                .collect()
        })
        .collect::<Vec<Vec<String>>>();

    debug!(
        file = file_name,
        matched_columns = matched,
        schema_columns = schema.len(),
        rows = rows.len(),
        "aligned source file"
    );

    RowSource {
        file_name: file_name.to_string(),
        columns: schema.labels(),
        rows,
    }
}

enum ColumnSource {
    Source(usize),
    FileLabel,
    Empty,
}

/// Concatenates aligned sources in the given order.
///
/// Every source carries the same columns, so the table takes them from the
/// first one.
pub fn concat_sources(sources: Vec<RowSource>) -> MergedTable {
    let total = sources.iter().map(RowSource::row_count).sum();
    let mut table = MergedTable {
        columns: sources
            .first()
            .map(|source| source.columns.clone())
            .unwrap_or_default(),
        rows: Vec::with_capacity(total),
        spans: Vec::with_capacity(sources.len()),
    };
    for source in sources {
        debug_assert_eq!(source.columns, table.columns);
        table.spans.push(FileSpan {
            file_name: source.file_name,
            row_count: source.rows.len(),
        });
        table.rows.extend(source.rows);
    }
    table
}
