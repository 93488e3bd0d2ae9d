pub mod auth;
pub mod blobs;
pub mod comments;
pub mod documents;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(documents::routes())
        .merge(comments::routes())
        .merge(blobs::routes())
        .with_state(state)
}
