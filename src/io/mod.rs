pub mod excel_read;
pub mod progress;
pub mod workbook;
