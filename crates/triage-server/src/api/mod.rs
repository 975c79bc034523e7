//! API module - Axum routes

pub mod admin;
pub mod error;
pub mod reports;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    middleware,
    routing::{delete, get},
    Router,
};
use sqlx::{pool::PoolConnection, Sqlite};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use triage_core::{AppConfig, Database, SpreadsheetExporter};

pub use error::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub exporter: Arc<SpreadsheetExporter>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Self {
        let exporter = SpreadsheetExporter::new(config.xlsx_path());
        Self {
            db,
            exporter: Arc::new(exporter),
            config: Arc::new(config),
        }
    }
}

/// Database connection scoped to a single request
///
/// Checked out of the pool when the handler's arguments are extracted and
/// returned when the handler finishes, whichever way it exits.
pub struct StoreConn(pub PoolConnection<Sqlite>);

#[async_trait]
impl FromRequestParts<AppState> for StoreConn {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let conn = state.db.acquire().await?;
        Ok(StoreConn(conn))
    }
}

/// Create the router with all routes
///
/// Paths without a route fall through to static files under the static root.
/// The admin page needs the token however its path is spelled.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.config.static_root);

    Router::new()
        .route(
            "/api/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route("/api/reports.xlsx", get(admin::download_xlsx))
        .route("/api/reports/:id", delete(reports::delete_report))
        .route("/admin.html", get(admin::admin_page))
        .fallback_service(static_files)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin::guard_admin_page,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
