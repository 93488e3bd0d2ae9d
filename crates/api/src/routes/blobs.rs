use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use super::documents::pdf_response;
use crate::error::ApiResult;
use crate::state::AppState;

/// Targets of the URLs handed out by the sharing endpoint.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/blobs/public/{*path}", get(public_blob))
        .route("/blobs/signed", get(signed_blob))
}

async fn public_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let (document, data) = state.services().sharing.open_public(&path).await?;
    Ok(pdf_response(&document, data))
}

#[derive(Debug, Deserialize)]
struct SignedQuery {
    token: String,
}

async fn signed_blob(
    State(state): State<AppState>,
    query: Result<Query<SignedQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(SignedQuery { token }) = query?;
    let (document, data) = state.services().sharing.open_signed(&token).await?;
    Ok(pdf_response(&document, data))
}
