//! Tunables for a merge run.
//!
//! Every knob can be supplied from a JSON file (see [`MergeConfig::load`]) and
//! any key left out keeps its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// File-name suffixes accepted as inputs, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Files whose name starts with this prefix are editor lock files and are ignored.
    pub temp_file_prefix: String,
    /// Number of consecutive empty header cells that ends the header row.
    pub empty_column_threshold: u32,
    /// Hard limit on the number of header columns scanned.
    pub max_columns: u32,
    /// Substrings marking a header as an amount column.
    pub amount_keywords: Vec<String>,
    /// Symbols stripped from amount values before numeric parsing.
    pub currency_symbols: Vec<String>,
    /// Digit-only values longer than this are written as text.
    pub long_number_threshold: usize,
    /// Rows written per progress step.
    pub write_batch_size: usize,
    /// Output directory used when the caller does not name one.
    pub default_output_dir: PathBuf,
    /// Stem of the generated output file name.
    pub output_prefix: String,
    /// Label of the injected source column; `None` disables injection.
    pub provenance_column: Option<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".xlsx".to_string(), ".xlsm".to_string()],
            temp_file_prefix: "~$".to_string(),
            empty_column_threshold: 3,
            max_columns: 100,
            amount_keywords: ["金额", "钱", "款", "费用", "总计", "合计", "sum", "amount"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            currency_symbols: ["¥", "￥", "$"].into_iter().map(str::to_string).collect(),
            long_number_threshold: 10,
            write_batch_size: 100,
            default_output_dir: PathBuf::from("."),
            output_prefix: "汇总结果".to_string(),
            provenance_column: None,
        }
    }
}

impl MergeConfig {
    /// Loads a configuration from a JSON file and validates it.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MergeConfig =
            serde_json::from_str(&data).map_err(|source| ToolError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(ToolError::InvalidConfig(
                "at least one file extension is required".into(),
            ));
        }
        if self.empty_column_threshold == 0 {
            return Err(ToolError::InvalidConfig(
                "empty_column_threshold must be at least 1".into(),
            ));
        }
        if self.max_columns == 0 {
            return Err(ToolError::InvalidConfig(
                "max_columns must be at least 1".into(),
            ));
        }
        if self.write_batch_size == 0 {
            return Err(ToolError::InvalidConfig(
                "write_batch_size must be at least 1".into(),
            ));
        }
        if self.output_prefix.trim().is_empty() {
            return Err(ToolError::InvalidConfig(
                "output_prefix must not be empty".into(),
            ));
        }
        if matches!(&self.provenance_column, Some(label) if label.trim().is_empty()) {
            return Err(ToolError::InvalidConfig(
                "provenance_column must not be blank".into(),
            ));
        }
        Ok(())
    }

    /// Returns true when `file_name` passes the extension and temp-prefix filters.
    pub fn accepts_file_name(&self, file_name: &str) -> bool {
        if !self.temp_file_prefix.is_empty() && file_name.starts_with(&self.temp_file_prefix) {
            return false;
        }
        let lowered = file_name.to_lowercase();
        self.extensions
            .iter()
            .filter(|ext| !ext.is_empty())
            .any(|ext| lowered.ends_with(&ext.to_lowercase()))
    }
}
