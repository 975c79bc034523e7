//! Admin routes, gated by the shared admin token

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, Query, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::io::ErrorKind;
use std::path::{Component, Path};
use triage_core::Error;

use super::{ApiError, AppState};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const ADMIN_PAGE: &str = "admin.html";

/// Admin token taken from the `token` query parameter
///
/// Only the first `token` pair counts. A query string that cannot be parsed
/// yields no token, so the request is refused as forbidden rather than
/// rejected as malformed.
#[derive(Debug, Default)]
pub struct AdminToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for AdminToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(pairs)| {
                pairs
                    .into_iter()
                    .find(|(key, _)| key == "token")
                    .map(|(_, value)| value)
            });
        Ok(AdminToken(token))
    }
}

fn require_admin(state: &AppState, token: &AdminToken) -> Result<(), ApiError> {
    if state.config.token_matches(token.0.as_deref()) {
        Ok(())
    } else {
        log::warn!("[admin] Rejected request with invalid admin token");
        Err(ApiError::Forbidden)
    }
}

/// Whether a raw request path resolves to the admin page under the static root
///
/// Decodes and walks the path the way the static file service does, so every
/// spelling of the page (`//admin.html`, `/%61dmin.html`, `/./admin.html`)
/// is caught.
pub fn is_admin_page(path: &str) -> bool {
    let Ok(decoded) = percent_decode_str(path.trim_start_matches('/')).decode_utf8() else {
        return false;
    };
    let mut components = Path::new(&*decoded)
        .components()
        .filter(|c| !matches!(c, Component::CurDir));

    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => name.eq_ignore_ascii_case(ADMIN_PAGE),
        _ => false,
    }
}

/// Refuse the admin page without a valid token, whichever route serves it
pub async fn guard_admin_page(
    State(state): State<AppState>,
    token: AdminToken,
    request: Request,
    next: Next,
) -> Response {
    if is_admin_page(request.uri().path()) {
        if let Err(e) = require_admin(&state, &token) {
            return e.into_response();
        }
    }
    next.run(request).await
}

/// Download the spreadsheet export as an attachment
pub async fn download_xlsx(
    State(state): State<AppState>,
    token: AdminToken,
) -> Result<Response, ApiError> {
    require_admin(&state, &token)?;

    let buffer = match tokio::fs::read(state.exporter.path()).await {
        Ok(buffer) => buffer,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::not_found("xlsx not found").into());
        }
        Err(e) => return Err(Error::from(e).into()),
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"reports.xlsx\"",
        )
        .body(Body::from(buffer))
        .map_err(|e| Error::internal(e.to_string()))?;

    Ok(response)
}

/// Serve the admin page from the static root
pub async fn admin_page(
    State(state): State<AppState>,
    token: AdminToken,
) -> Result<Html<String>, ApiError> {
    require_admin(&state, &token)?;

    let path = state.config.static_root.join(ADMIN_PAGE);
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(Error::not_found("admin page not found").into())
        }
        Err(e) => Err(Error::from(e).into()),
    }
}
