//! Spreadsheet export service
//!
//! Keeps a running `.xlsx` audit trail of every created report.
//!
//! The workbook is regenerated in full on each append from a JSON-lines row
//! ledger stored next to it (`reports.jsonl` beside `reports.xlsx`), since the
//! workbook writer cannot read files back. Both files are written to a temp
//! file first and renamed into place.

use rust_xlsxwriter::Workbook;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{CellValue, ExportRow, EXPORT_HEADER};

/// Worksheet name for the single export sheet
const SHEET_NAME: &str = "Sheet";

/// Append-only spreadsheet exporter
pub struct SpreadsheetExporter {
    path: PathBuf,
    ledger_path: PathBuf,
    // Serializes appends within this process
    lock: Mutex<()>,
}

impl SpreadsheetExporter {
    /// Create an exporter writing to the given `.xlsx` path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ledger_path = path.with_extension("jsonl");
        Self {
            path,
            ledger_path,
            lock: Mutex::new(()),
        }
    }

    /// Path of the workbook
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Append a row, logging instead of returning any failure
    pub fn append(&self, row: &ExportRow) {
        match self.try_append(row) {
            Ok(count) => log::debug!("[excel] Spreadsheet now holds {} rows", count),
            Err(e) => log::error!("[excel] xlsx write error: {}", e),
        }
    }

    /// Append a row and rewrite the workbook
    ///
    /// Starts a fresh workbook when none exists. Returns the number of data
    /// rows (header excluded) after the append.
    ///
    /// # Errors
    /// Fails without touching either file when an existing workbook has no
    /// readable ledger.
    pub fn try_append(&self, row: &ExportRow) -> Result<usize> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::export("exporter lock poisoned"))?;

        let mut rows = if self.path.exists() {
            self.read_ledger()?
        } else {
            log::info!("[excel] Creating new spreadsheet: {}", self.path.display());
            Vec::new()
        };
        rows.push(row.clone());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut ledger = String::new();
        for row in &rows {
            ledger.push_str(&serde_json::to_string(row)?);
            ledger.push('\n');
        }
        let workbook = build_workbook(&rows)?;

        write_atomic(&self.ledger_path, ledger.as_bytes())?;
        write_atomic(&self.path, &workbook)?;

        Ok(rows.len())
    }

    /// Data rows currently in the spreadsheet, in append order
    ///
    /// Empty when no workbook exists yet.
    pub fn rows(&self) -> Result<Vec<ExportRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        self.read_ledger()
    }

    fn read_ledger(&self) -> Result<Vec<ExportRow>> {
        let content = match fs::read_to_string(&self.ledger_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::export(format!(
                    "row ledger {} missing for existing spreadsheet",
                    self.ledger_path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| {
                    Error::export(format!("corrupt ledger line {}: {}", i + 1, e))
                })
            })
            .collect()
    }
}

/// Render header + rows into xlsx bytes
pub fn build_workbook(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in EXPORT_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.cells().into_iter().enumerate() {
            let c = col as u16;
            match cell {
                CellValue::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write to `<path>.tmp`, then rename over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    /// Every row of the export sheet, header included
    fn read_sheet(path: &Path) -> Vec<Vec<Data>> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        range.rows().map(|row| row.to_vec()).collect()
    }

    fn header_cells() -> Vec<Data> {
        EXPORT_HEADER
            .iter()
            .map(|title| Data::String(title.to_string()))
            .collect()
    }

    fn row(id: &str) -> ExportRow {
        ExportRow {
            id: CellValue::Text(id.to_string()),
            title: CellValue::Text(format!("Title {}", id)),
            description: CellValue::Text("desc".to_string()),
            impact: CellValue::Number(5.0),
            created: CellValue::Text("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        }
    }

    fn ids(rows: &[ExportRow]) -> Vec<CellValue> {
        rows.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_first_append_creates_workbook() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(temp_dir.path().join("reports.xlsx"));

        assert!(exporter.rows().unwrap().is_empty());
        assert_eq!(exporter.try_append(&row("r1")).unwrap(), 1);

        assert!(exporter.path().exists());
        assert!(exporter.ledger_path().exists());
        let bytes = fs::read(exporter.path()).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_appends_keep_creation_order() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(temp_dir.path().join("reports.xlsx"));

        for id in ["a", "b", "c"] {
            exporter.append(&row(id));
        }

        let rows = exporter.rows().unwrap();
        assert_eq!(
            ids(&rows),
            vec![
                CellValue::Text("a".into()),
                CellValue::Text("b".into()),
                CellValue::Text("c".into()),
            ]
        );
        assert_eq!(rows[0].impact, CellValue::Number(5.0));
        assert_eq!(rows[0].startup, CellValue::Empty);
    }

    #[test]
    fn test_deleted_workbook_starts_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(temp_dir.path().join("reports.xlsx"));

        exporter.try_append(&row("old")).unwrap();
        fs::remove_file(exporter.path()).unwrap();

        assert_eq!(exporter.try_append(&row("new")).unwrap(), 1);
        assert_eq!(ids(&exporter.rows().unwrap()), vec![CellValue::Text("new".into())]);
    }

    #[test]
    fn test_missing_ledger_is_not_clobbered() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports.xlsx");
        fs::write(&path, b"foreign workbook").unwrap();
        let exporter = SpreadsheetExporter::new(&path);

        let err = exporter.try_append(&row("r1")).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
        assert_eq!(fs::read(&path).unwrap(), b"foreign workbook");
    }

    #[test]
    fn test_corrupt_ledger_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(temp_dir.path().join("reports.xlsx"));
        exporter.try_append(&row("r1")).unwrap();

        fs::write(exporter.ledger_path(), "{not json\n").unwrap();

        let err = exporter.try_append(&row("r2")).unwrap_err();
        assert!(err.to_string().contains("corrupt ledger line 1"));
    }

    #[test]
    fn test_append_fails_open() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let exporter = SpreadsheetExporter::new(blocker.join("reports.xlsx"));

        // Parent is a regular file, so every write fails
        assert!(exporter.try_append(&row("r1")).is_err());
        exporter.append(&row("r1"));
    }

    #[test]
    fn test_build_workbook_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.xlsx");
        fs::write(&path, build_workbook(&[]).unwrap()).unwrap();

        assert_eq!(read_sheet(&path), vec![header_cells()]);
    }

    #[test]
    fn test_workbook_cells_follow_header_order() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(temp_dir.path().join("reports.xlsx"));

        let full = ExportRow {
            id: CellValue::Text("r1".into()),
            startup: CellValue::Text("ProblemPad".into()),
            startup_desc: CellValue::Text("notes app".into()),
            title: CellValue::Text("XSS".into()),
            description: CellValue::Text("desc".into()),
            impact: CellValue::Number(8.0),
            severity: CellValue::Text("high".into()),
            solution: CellValue::Bool(true),
            created: CellValue::Text("2024-01-01".into()),
        };
        exporter.try_append(&full).unwrap();
        exporter.try_append(&row("r2")).unwrap();

        let sheet = read_sheet(exporter.path());
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet[0], header_cells());
        assert_eq!(
            sheet[1],
            vec![
                Data::String("r1".into()),
                Data::String("ProblemPad".into()),
                Data::String("notes app".into()),
                Data::String("XSS".into()),
                Data::String("desc".into()),
                Data::Float(8.0),
                Data::String("high".into()),
                Data::Bool(true),
                Data::String("2024-01-01".into()),
            ]
        );
        // Missing optional fields stay empty
        assert_eq!(sheet[2][0], Data::String("r2".into()));
        assert_eq!(sheet[2][1], Data::Empty);
        assert_eq!(sheet[2][5], Data::Float(5.0));
        assert_eq!(sheet[2][6], Data::Empty);
    }

    #[test]
    fn test_ledger_path_sits_beside_workbook() {
        let exporter = SpreadsheetExporter::new("/srv/triage/reports.xlsx");
        assert_eq!(exporter.ledger_path(), Path::new("/srv/triage/reports.jsonl"));
    }
}
