use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use folio_core::comment::{Comment, CommentView};
use folio_core::document::validate::ValidationError;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{MaybeCaller, Session};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/documents/{id}/comments",
        get(list_comments).post(add_comment),
    )
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: i64,
}

#[derive(Debug, Deserialize)]
struct NewCommentBody {
    #[serde(rename = "pageNumber", alias = "page_number")]
    page_number: i64,
    content: String,
}

async fn list_comments(
    State(state): State<AppState>,
    caller: MaybeCaller,
    Path(id): Path<Uuid>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let Query(PageQuery { page }) = query?;
    let page = u32::try_from(page)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or(ValidationError::InvalidPageNumber(page))?;
    let comments = state
        .services()
        .comments
        .list(caller.identity(), id, page)
        .await?;
    Ok(Json(comments))
}

async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    body: Result<Json<NewCommentBody>, JsonRejection>,
) -> ApiResult<Json<Comment>> {
    let Json(body) = body?;
    let comment = state
        .services()
        .comments
        .add(Some(&session.identity), id, body.page_number, &body.content)
        .await?;
    Ok(Json(comment))
}
