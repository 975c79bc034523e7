//! Services module

pub mod excel;
pub mod store;

pub use excel::{build_workbook, SpreadsheetExporter};
pub use store::ReportStore;
