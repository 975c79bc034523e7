//! Triage - report submission server
//!
//! Clients submit reports over a JSON API; an administrator lists, deletes
//! and downloads them as a spreadsheet.

pub mod api;

use anyhow::{Context, Result};
use triage_core::{AppConfig, Database};

pub use api::{create_router, AppState};

/// Open the database and serve the API until the listener fails
pub async fn serve(config: AppConfig) -> Result<()> {
    if config.uses_default_token() {
        log::warn!("ADMIN_TOKEN is not set; using the placeholder token");
    }

    let db = Database::open(config.db_path()).await?;
    log::info!("Database initialized successfully");

    let addr = config.socket_addr();
    let app = create_router(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    log::info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
