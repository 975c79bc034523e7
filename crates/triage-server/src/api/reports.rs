//! Reports API routes

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use triage_core::{NewReport, Report, ReportStore};

use super::{ApiError, AppState, StoreConn};

/// List all reports, newest first
pub async fn list_reports(StoreConn(mut conn): StoreConn) -> Result<Json<Vec<Report>>, ApiError> {
    let reports = ReportStore::new(&mut conn).list().await?;
    Ok(Json(reports))
}

/// Create a report, then mirror it into the spreadsheet
///
/// The response only reflects the store write; spreadsheet failures are
/// logged by the exporter.
pub async fn create_report(
    State(state): State<AppState>,
    StoreConn(mut conn): StoreConn,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewReport::from_slice(&body)?;

    ReportStore::new(&mut conn).create(&new.report).await?;
    drop(conn);

    let exporter = state.exporter.clone();
    let row = new.export;
    if let Err(e) = tokio::task::spawn_blocking(move || exporter.append(&row)).await {
        log::error!("[api] Spreadsheet export task failed: {}", e);
    }

    Ok((StatusCode::CREATED, Json(json!({ "ok": true }))))
}

/// Delete a report by id; always succeeds
pub async fn delete_report(
    StoreConn(mut conn): StoreConn,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ReportStore::new(&mut conn).delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
