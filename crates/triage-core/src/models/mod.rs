//! Data models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::error::{Error, Result};

/// Fields a create payload must carry (non-null)
pub const REQUIRED_FIELDS: [&str; 4] = ["id", "title", "description", "created"];

/// Spreadsheet header row, in column order
pub const EXPORT_HEADER: [&str; 9] = [
    "id",
    "startup",
    "startup_desc",
    "title",
    "description",
    "impact",
    "severity",
    "solution",
    "created",
];

/// Report model, one row of the `reports` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Option<String>,
    pub solution: Option<String>,
    pub created: String,
}

/// A single spreadsheet cell
///
/// Keeps the JSON type of the submitted value so numbers land as numeric cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => CellValue::Empty,
            Some(Value::Bool(b)) => CellValue::Bool(*b),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            Some(Value::String(s)) => CellValue::Text(s.clone()),
            Some(other) => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// One spreadsheet row; field order matches `EXPORT_HEADER`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExportRow {
    pub id: CellValue,
    pub startup: CellValue,
    pub startup_desc: CellValue,
    pub title: CellValue,
    pub description: CellValue,
    pub impact: CellValue,
    pub severity: CellValue,
    pub solution: CellValue,
    pub created: CellValue,
}

impl ExportRow {
    /// Cells in header order
    pub fn cells(&self) -> [&CellValue; 9] {
        [
            &self.id,
            &self.startup,
            &self.startup_desc,
            &self.title,
            &self.description,
            &self.impact,
            &self.severity,
            &self.solution,
            &self.created,
        ]
    }
}

/// A validated create request
///
/// Carries both the record for the store and the wider row for the
/// spreadsheet. The store gets `severity`, falling back to `impact`; the
/// spreadsheet gets both fields exactly as submitted.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub report: Report,
    pub export: ExportRow,
}

impl NewReport {
    /// Parse a raw request body
    ///
    /// Bodies that are not a JSON object count as an empty payload.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let payload = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self::from_payload(&payload)
    }

    /// Validate a JSON object payload
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let present = |key: &str| payload.get(key).is_some_and(|v| !v.is_null());
        if !REQUIRED_FIELDS.iter().all(|key| present(*key)) {
            return Err(Error::validation("missing fields"));
        }

        let required = |key: &str| stored_text(payload.get(key)).unwrap_or_default();
        let severity = [payload.get("severity"), payload.get("impact")]
            .into_iter()
            .flatten()
            .find(|v| is_truthy(v));

        let report = Report {
            id: required("id"),
            title: required("title"),
            description: required("description"),
            severity: stored_text(severity),
            solution: stored_text(payload.get("solution")),
            created: required("created"),
        };

        let cell = |key: &str| CellValue::from_json(payload.get(key));
        let export = ExportRow {
            id: cell("id"),
            startup: cell("startup"),
            startup_desc: cell("startup_desc"),
            title: cell("title"),
            description: cell("description"),
            impact: cell("impact"),
            severity: cell("severity"),
            solution: cell("solution"),
            created: cell("created"),
        };

        Ok(Self { report, export })
    }
}

/// Text form of a JSON value for a TEXT column
fn stored_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
