//! Core library for the xlsx-merge command line application.
//!
//! The library merges every spreadsheet of a folder into one workbook. The
//! first file is the base: its header row defines the output columns and its
//! formatting is kept, while rows from the other files are aligned by header
//! name and appended below. Responsibilities are split narrowly: IO adapters
//! live under [`io`], data representations inside [`model`], header
//! detection in [`header`], value heuristics in [`classify`], column
//! alignment in [`align`], the formatted append in [`writer`], and the run
//! orchestration under [`merge`].

pub mod align;
pub mod classify;
pub mod config;
pub mod error;
pub mod header;
pub mod io;
pub mod merge;
pub mod model;
pub mod provenance;
pub mod writer;

pub use config::MergeConfig;
pub use error::{Result, ToolError};
pub use merge::{MergeOutcome, merge, merge_files};
