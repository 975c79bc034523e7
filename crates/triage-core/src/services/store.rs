//! Report storage layer
//!
//! Handles persistence of reports to SQLite. A store borrows one connection,
//! normally the one checked out for the current request.

use sqlx::SqliteConnection;

use crate::error::{Error, Result};
use crate::models::Report;

/// Storage layer for reports
pub struct ReportStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ReportStore<'c> {
    /// Create a store over the given connection
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// All reports, newest `created` first
    pub async fn list(&mut self) -> Result<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, title, description, severity, solution, created
            FROM reports
            ORDER BY created DESC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        log::debug!("[store] Listed {} reports", reports.len());
        Ok(reports)
    }

    /// Insert a new report
    ///
    /// # Errors
    /// Returns `Error::DuplicateId` when the id is taken; nothing is written.
    pub async fn create(&mut self, report: &Report) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO reports (id, title, description, severity, solution, created)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.title)
        .bind(&report.description)
        .bind(&report.severity)
        .bind(&report.solution)
        .bind(&report.created)
        .execute(&mut *self.conn)
        .await;

        match result {
            Ok(_) => {
                log::info!("[store] Created report {}", report.id);
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                log::debug!("[store] Rejected duplicate report id {}", report.id);
                Err(Error::DuplicateId(report.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a report by id; unknown ids are a no-op
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() > 0 {
            log::info!("[store] Deleted report {}", id);
        } else {
            log::debug!("[store] Delete of unknown report {} ignored", id);
        }
        Ok(())
    }
}
