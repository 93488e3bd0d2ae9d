use bytes::Bytes;
use chrono::Utc;
use tracing::{error, info};

use super::{require_caller, ServiceContext};
use crate::document::validate::{default_title, validate_title, validate_upload};
use crate::document::{BlobPath, Document, NewDocument};
use crate::events::{DocumentChange, DocumentEvent};
use crate::identity::Identity;
use crate::Result;

/// An incoming file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub declared_mime: String,
    pub filename: String,
    pub title: Option<String>,
    pub is_public: bool,
}

/// Validates uploads and persists each as a (blob, record) pair.
#[derive(Clone)]
pub struct UploadService {
    ctx: ServiceContext,
}

impl UploadService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Store the blob, then insert the record.
    ///
    /// A failed insert triggers a best-effort delete of the blob just
    /// written. If that cleanup also fails the blob is left orphaned; the
    /// failure is logged and appended to the returned error.
    pub async fn upload(&self, caller: Option<&Identity>, request: UploadRequest) -> Result<Document> {
        let owner = require_caller(caller)?;
        let config = &self.ctx.config;

        let size = request.data.len() as u64;
        validate_upload(
            &request.declared_mime,
            size,
            &config.allowed_mime_type,
            config.max_upload_bytes,
        )?;
        let title = match request.title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => validate_title(title)?,
            None => default_title(&request.filename),
        };

        let blob_path = BlobPath::generate(owner.id, &request.filename, Utc::now());
        let blobs = &self.ctx.stores.blobs;
        self.ctx
            .call(
                "put_blob",
                blobs.put(&blob_path, request.data, &request.declared_mime),
            )
            .await?;

        let new = NewDocument {
            title,
            blob_path: blob_path.clone(),
            original_name: request.filename,
            size: size as i64,
            mime_type: request.declared_mime,
            owner_id: owner.id,
            is_public: request.is_public,
        };
        let inserted = self
            .ctx
            .call("insert_document", self.ctx.stores.records.insert_document(new))
            .await;

        let document = match inserted {
            Ok(document) => document,
            Err(err) => {
                error!(blob_path = %blob_path, error = %err, "upload: record insert failed, removing blob");
                if let Err(cleanup) = self.ctx.call("delete_blob", blobs.delete(&blob_path)).await {
                    error!(blob_path = %blob_path, error = %cleanup, "upload: orphaned blob cleanup failed");
                    return Err(err.annotate(format!(
                        "cleanup of blob {blob_path} also failed: {cleanup}"
                    )));
                }
                return Err(err);
            }
        };

        info!(
            document_id = %document.id,
            owner_id = %owner.id,
            size,
            is_public = document.is_public,
            "document uploaded"
        );
        self.ctx.events.publish(DocumentEvent::Uploaded(DocumentChange::now(
            document.id,
            owner.id,
        )));
        Ok(document)
    }
}
