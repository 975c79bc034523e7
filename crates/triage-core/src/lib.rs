//! # triage-core
//!
//! Core logic for Triage - shared by the HTTP server and its tests.
//!
//! This crate provides:
//! - Database setup and schema (`db` module)
//! - Data models (`models` module)
//! - Report store and spreadsheet export (`services` module)
//! - Runtime configuration (`config` module)
//! - Unified error handling (`error` module)

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

// Re-exports for convenience
pub use config::AppConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{CellValue, ExportRow, NewReport, Report, EXPORT_HEADER};
pub use services::{ReportStore, SpreadsheetExporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_format() {
        let v = version();
        // Should be semver format: x.y.z
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "Version should be in x.y.z format");
    }
}
