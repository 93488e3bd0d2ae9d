use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use folio_core::document::path::sanitize_filename;
use folio_core::document::validate::ValidationError;
use folio_core::document::Document;
use folio_core::services::{DocumentUpdate, ShareReference, UploadRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{MaybeCaller, Session};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents).post(upload_document))
        .route(
            "/documents/{id}",
            get(get_document).patch(update_document).delete(delete_document),
        )
        .route("/documents/{id}/content", get(document_content))
        .route("/documents/{id}/share", get(share_document))
}

async fn list_documents(
    State(state): State<AppState>,
    caller: MaybeCaller,
) -> ApiResult<Json<Vec<Document>>> {
    let documents = state.services().access.list(caller.identity()).await?;
    Ok(Json(documents))
}

fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "is_public must be a boolean, got {other:?}"
        ))),
    }
}

/// Multipart fields: `file` (required), `title`, `is_public`.
async fn upload_document(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> ApiResult<Json<Document>> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut title = None;
    let mut is_public = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                file = Some((filename, mime, data));
            }
            "title" => title = Some(field.text().await?),
            "is_public" => is_public = parse_flag(&field.text().await?)?,
            _ => {}
        }
    }

    let (filename, declared_mime, data) = file.ok_or(ValidationError::MissingFile)?;
    let request = UploadRequest {
        data,
        declared_mime,
        filename,
        title,
        is_public,
    };
    let document = state
        .services()
        .upload
        .upload(Some(&session.identity), request)
        .await?;
    Ok(Json(document))
}

async fn get_document(
    State(state): State<AppState>,
    caller: MaybeCaller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    let document = state.services().access.get(caller.identity(), id).await?;
    Ok(Json(document))
}

#[derive(Debug, Default, Deserialize)]
struct UpdateBody {
    title: Option<String>,
    #[serde(alias = "isPublic")]
    is_public: Option<bool>,
}

/// Title and visibility land in one record write.
async fn update_document(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateBody>, JsonRejection>,
) -> ApiResult<Json<Document>> {
    let Json(body) = body?;
    let update = DocumentUpdate {
        title: body.title,
        is_public: body.is_public,
    };
    let document = state
        .services()
        .access
        .update(Some(&session.identity), id, update)
        .await?;
    Ok(Json(document))
}

async fn delete_document(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state
        .services()
        .access
        .delete(Some(&session.identity), id)
        .await?;
    Ok(Json(json!({ "deleted": id })))
}

async fn document_content(
    State(state): State<AppState>,
    caller: MaybeCaller,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let (document, data) = state
        .services()
        .access
        .read_content(caller.identity(), id)
        .await?;
    Ok(pdf_response(&document, data))
}

async fn share_document(
    State(state): State<AppState>,
    caller: MaybeCaller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShareReference>> {
    let share = state
        .services()
        .sharing
        .share_reference(caller.identity(), id)
        .await?;
    Ok(Json(share))
}

/// Inline PDF response named after the original upload.
pub(crate) fn pdf_response(document: &Document, data: Bytes) -> Response {
    let disposition = format!(
        "inline; filename=\"{}\"",
        sanitize_filename(&document.original_name)
    );
    (
        [
            (header::CONTENT_TYPE, document.mime_type.clone()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response()
}
