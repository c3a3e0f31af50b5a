use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, instrument, warn};

use crate::align::{align_rows, concat_sources};
use crate::classify::ValueClassifier;
use crate::config::MergeConfig;
use crate::error::{Result, ToolError};
use crate::header::analyze_base_header;
use crate::io::excel_read;
use crate::io::progress::ProgressSink;
use crate::io::workbook::{SheetDocument, UmyaDocument};
use crate::model::{FileSpan, HeaderSchema, RowSource};
use crate::provenance::{file_label, inject_provenance};
use crate::writer::{WritePlan, write_merged};

/// Summary of a completed merge run.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub output_path: PathBuf,
    /// Files whose rows made it into the output with their row counts, in
    /// merge order.
    pub merged_files: Vec<FileSpan>,
    /// Files skipped because they could not be read.
    pub skipped_files: Vec<String>,
    /// Rows appended below the base file's own rows.
    pub rows_written: usize,
    pub stale_rows_removed: u32,
}

/// Lists the spreadsheet files of `source_dir` in native directory order.
///
/// The order is not sorted: the first entry becomes the base file.
pub fn list_input_files(source_dir: &Path, config: &MergeConfig) -> Result<Vec<PathBuf>> {
    if !source_dir.exists() {
        return Err(ToolError::MissingInput(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(ToolError::NotADirectory(source_dir.to_path_buf()));
    }

    let io_error = |source| ToolError::Io {
        path: source_dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(source_dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.file_type().map_err(io_error)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if config.accepts_file_name(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Merges every spreadsheet in `source_dir` into one workbook under `output_dir`.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %source_dir.display(), output = %output_dir.display())
)]
pub fn merge(
    source_dir: &Path,
    output_dir: &Path,
    config: &MergeConfig,
    sink: &mut dyn ProgressSink,
) -> Result<MergeOutcome> {
    sink.append(&format!("scanning folder: {}", source_dir.display()));
    let files = list_input_files(source_dir, config)?;
    if files.is_empty() {
        return Err(ToolError::NoInputFiles(source_dir.to_path_buf()));
    }
    sink.append(&format!("found {} spreadsheet file(s)", files.len()));
    info!(file_count = files.len(), "input files listed");
    merge_files(&files, output_dir, config, sink)
}

/// Merges `files` in the given order; the first file is the base.
#[instrument(level = "info", skip_all, fields(output = %output_dir.display()))]
pub fn merge_files(
    files: &[PathBuf],
    output_dir: &Path,
    config: &MergeConfig,
    sink: &mut dyn ProgressSink,
) -> Result<MergeOutcome> {
    config.validate()?;
    let Some((base_path, others)) = files.split_first() else {
        return Err(ToolError::NoValidInput);
    };
    let base_name = display_name(base_path);
    sink.append(&format!("using '{base_name}' as the base file"));

    let classifier = ValueClassifier::new(config);
    let mut document = UmyaDocument::open(base_path)?;
    let mut schema = analyze_base_header(&document, config, &classifier, base_path)?;
    report_header(&schema, config, sink);

    let base_grid = excel_read::read_grid(base_path)?;
    let base_row_count = base_grid.data_row_count();
    debug!(base_row_count, "base file rows counted");

    if let Some(column_label) = &config.provenance_column {
        schema = inject_provenance(
            schema,
            &mut document,
            column_label,
            &file_label(base_path),
            base_row_count,
        )?;
        sink.append(&format!("added source column '{column_label}'"));
    }

    let mut sources: Vec<RowSource> = Vec::with_capacity(files.len());
    sources.push(align_rows(
        &schema,
        &base_grid,
        &base_name,
        &file_label(base_path),
    ));

    let mut skipped_files = Vec::new();
    for path in others {
        let name = display_name(path);
        match align_file(&schema, path) {
            Ok(source) => {
                info!(file = %name, rows = source.row_count(), "file processed");
                sink.append(&format!("processed file: {name}"));
                sources.push(source);
            }
            Err(error) => {
                warn!(file = %name, %error, "skipping unreadable file");
                sink.append(&format!("warning: skipped {name}: {error}"));
                skipped_files.push(name);
            }
        }
    }

    if sources.len() == 1 {
        sink.append("warning: only the base file contributed rows");
    }

    let table = concat_sources(sources);
    for span in &table.spans {
        debug!(file = %span.file_name, rows = span.row_count, "rows contributed");
    }
    sink.append(&format!(
        "merged {} row(s) from {} file(s)",
        table.row_count(),
        table.spans.len()
    ));

    let plan = WritePlan {
        base_row_count,
        batch_size: config.write_batch_size,
    };
    let report = write_merged(&mut document, &schema, &table, &plan, &classifier, sink);

    let output_path = save_output(&document, output_dir, &config.output_prefix, Local::now())?;
    sink.append(&format!("saved merged workbook: {}", output_path.display()));
    info!(
        output = %output_path.display(),
        rows_written = report.rows_written,
        "merge complete"
    );

    Ok(MergeOutcome {
        output_path,
        merged_files: table.spans,
        skipped_files,
        rows_written: report.rows_written,
        stale_rows_removed: report.stale_rows_removed,
    })
}

fn align_file(schema: &HeaderSchema, path: &Path) -> Result<RowSource> {
    let grid = excel_read::read_grid(path)?;
    Ok(align_rows(
        schema,
        &grid,
        &display_name(path),
        &file_label(path),
    ))
}

fn report_header(schema: &HeaderSchema, config: &MergeConfig, sink: &mut dyn ProgressSink) {
    sink.append(&format!(
        "base header analyzed: {} column(s)",
        schema.len()
    ));
    if schema.is_truncated() {
        sink.append(&format!(
            "warning: header scan stopped at the {}-column limit",
            config.max_columns
        ));
    }
    let amount_columns: Vec<String> = schema
        .amount_columns()
        .map(|entry| {
            format!(
                "column {}: {}",
                entry.column_index,
                entry.original_label.as_deref().unwrap_or_default()
            )
        })
        .collect();
    if !amount_columns.is_empty() {
        sink.append(&format!(
            "amount columns detected: {}",
            amount_columns.join(", ")
        ));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Picks `<prefix>_<timestamp>.xlsx` in `output_dir`, adding `_1`, `_2`, ...
/// when that name is taken.
pub fn output_file_path(output_dir: &Path, prefix: &str, now: DateTime<Local>) -> PathBuf {
    let stamp = format!("{prefix}_{}", now.format("%Y%m%d_%H%M%S"));
    let candidate = output_dir.join(format!("{stamp}.xlsx"));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let candidate = output_dir.join(format!("{stamp}_{counter}.xlsx"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn save_output<D: SheetDocument>(
    document: &D,
    output_dir: &Path,
    prefix: &str,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|source| ToolError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = output_file_path(output_dir, prefix, now);
    if let Err(error) = document.save_as(&path) {
        if path.exists() {
            if let Err(cleanup) = fs::remove_file(&path) {
                warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "partial output could not be removed"
                );
            }
        }
        return Err(error);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 1)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn output_names_are_timestamped_and_unique() {
        let dir = tempdir().expect("temporary directory");

        let first = output_file_path(dir.path(), "汇总结果", fixed_time());
        assert_eq!(
            first.file_name().and_then(|name| name.to_str()),
            Some("汇总结果_20240305_090701.xlsx")
        );

        fs::write(&first, b"taken").expect("placeholder written");
        let second = output_file_path(dir.path(), "汇总结果", fixed_time());
        assert_eq!(
            second.file_name().and_then(|name| name.to_str()),
            Some("汇总结果_20240305_090701_1.xlsx")
        );
    }

    #[test]
    fn listing_filters_extensions_and_lock_files() {
        let dir = tempdir().expect("temporary directory");
        for name in ["a.xlsx", "b.XLSM", "~$a.xlsx", "notes.txt", "old.xls"] {
            fs::write(dir.path().join(name), b"").expect("file written");
        }
        fs::create_dir(dir.path().join("nested.xlsx")).expect("directory created");

        let mut names: Vec<String> = list_input_files(dir.path(), &MergeConfig::default())
            .expect("listing succeeds")
            .iter()
            .map(|path| display_name(path))
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.xlsx", "b.XLSM"]);
    }

    #[test]
    fn listing_rejects_missing_and_non_directories() {
        let dir = tempdir().expect("temporary directory");
        let missing = dir.path().join("absent");
        assert!(matches!(
            list_input_files(&missing, &MergeConfig::default()),
            Err(ToolError::MissingInput(_))
        ));

        let file = dir.path().join("plain.xlsx");
        fs::write(&file, b"").expect("file written");
        assert!(matches!(
            list_input_files(&file, &MergeConfig::default()),
            Err(ToolError::NotADirectory(_))
        ));
    }

    #[test]
    fn empty_folder_is_fatal() {
        let dir = tempdir().expect("temporary directory");
        let mut sink = crate::io::progress::MemorySink::default();
        let error = merge(dir.path(), dir.path(), &MergeConfig::default(), &mut sink)
            .expect_err("empty folder rejected");
        assert!(matches!(error, ToolError::NoInputFiles(_)));
    }

    struct TruncatingDocument;

    impl SheetDocument for TruncatingDocument {
        fn cell_text(&self, _row: u32, _column: u32) -> Option<String> {
            None
        }

        fn cell_style(&self, _row: u32, _column: u32) -> crate::model::CellStyle {
            crate::model::CellStyle::default()
        }

        fn highest_row(&self) -> u32 {
            0
        }

        fn delete_rows(&mut self, _start_row: u32, _count: u32) {}

        fn insert_columns(&mut self, _column: u32, _count: u32) {}

        fn write_cell(
            &mut self,
            _row: u32,
            _column: u32,
            _value: &crate::model::CellValue,
            _style: &crate::model::CellStyle,
        ) {
        }

        fn save_as(&self, path: &Path) -> Result<()> {
            fs::write(path, b"PK\x03\x04 partial").expect("partial output written");
            Err(ToolError::Save {
                path: path.to_path_buf(),
                reason: "disk full".into(),
            })
        }
    }

    #[test]
    fn failed_save_leaves_no_partial_output() {
        let dir = tempdir().expect("temporary directory");
        let output = dir.path().join("out");

        let error = save_output(&TruncatingDocument, &output, "汇总结果", fixed_time())
            .expect_err("save failure surfaces");

        assert!(matches!(error, ToolError::Save { .. }));
        assert!(error.to_string().contains("汇总结果_20240305_090701.xlsx"));
        assert_eq!(fs::read_dir(&output).expect("output listed").count(), 0);
    }

    #[test]
    fn empty_file_list_is_fatal() {
        let dir = tempdir().expect("temporary directory");
        let mut sink = crate::io::progress::MemorySink::default();
        let error = merge_files(&[], dir.path(), &MergeConfig::default(), &mut sink)
            .expect_err("empty list rejected");
        assert!(matches!(error, ToolError::NoValidInput));
    }
}
