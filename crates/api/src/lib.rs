//! HTTP surface of the folio document service.

pub mod audit;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::state::AppState;

/// Room for multipart boundaries and the non-file fields of an upload.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Router with every route group and the standard middleware stack.
///
/// Bodies slightly over `max_upload_bytes` still reach the upload service so
/// it can report the size. Anything past the overhead fails body extraction
/// and is reported as a `validationError`.
pub fn app(state: AppState, max_upload_bytes: u64) -> Router {
    let body_limit = usize::try_from(max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    routes::build_router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer())
}
