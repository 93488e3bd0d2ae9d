use bytes::Bytes;
use tracing::{error, info};
use uuid::Uuid;

use super::{ensure_owner, ensure_readable, require_caller, ServiceContext};
use crate::document::validate::validate_title;
use crate::document::{Document, DocumentPatch};
use crate::events::{DocumentChange, DocumentEvent};
use crate::identity::Identity;
use crate::{Error, Result};

/// Owner-editable document fields, applied in a single record write.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub is_public: Option<bool>,
}

/// Authorizes reads, edits and deletes of document records.
///
/// Existence is checked before ownership, so a missing row is `NotFound`
/// for everyone and a non-owned one is `Unauthorized`/`Forbidden`.
#[derive(Clone)]
pub struct AccessController {
    ctx: ServiceContext,
}

impl AccessController {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get(&self, caller: Option<&Identity>, id: Uuid) -> Result<Document> {
        let document = self.ctx.load_document(id).await?;
        ensure_readable(&document, caller)?;
        Ok(document)
    }

    /// Fetch the PDF bytes under the same rule as [`get`](Self::get).
    pub async fn read_content(&self, caller: Option<&Identity>, id: Uuid) -> Result<(Document, Bytes)> {
        let document = self.get(caller, id).await?;
        let data = self
            .ctx
            .call("get_blob", self.ctx.stores.blobs.get(&document.blob_path))
            .await?;
        Ok((document, data))
    }

    /// Public documents plus the caller's own, newest first.
    pub async fn list(&self, caller: Option<&Identity>) -> Result<Vec<Document>> {
        let viewer = caller.map(|identity| identity.id);
        self.ctx
            .call(
                "list_documents",
                self.ctx.stores.records.list_visible_documents(viewer),
            )
            .await
    }

    pub async fn update(
        &self,
        caller: Option<&Identity>,
        id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Document> {
        let caller = require_caller(caller)?;
        let document = self.ctx.load_document(id).await?;
        ensure_owner(&document, caller)?;

        // Setting the current visibility is not a change.
        let patch = DocumentPatch {
            title: update.title.as_deref().map(validate_title).transpose()?,
            is_public: update.is_public.filter(|&flag| flag != document.is_public),
        };
        if patch.is_empty() {
            return Ok(document);
        }

        let updated = self
            .ctx
            .call(
                "update_document",
                self.ctx.stores.records.update_document(id, &patch),
            )
            .await?
            .ok_or_else(|| Error::not_found("document", id))?;

        info!(
            document_id = %id,
            title_changed = patch.title.is_some(),
            is_public = updated.is_public,
            "document updated"
        );
        if patch.title.is_some() {
            self.ctx
                .events
                .publish(DocumentEvent::Updated(DocumentChange::now(id, caller.id)));
        }
        if let Some(is_public) = patch.is_public {
            self.ctx.events.publish(DocumentEvent::VisibilityChanged {
                change: DocumentChange::now(id, caller.id),
                is_public,
            });
        }
        Ok(updated)
    }

    /// Remove the blob, then the record.
    ///
    /// A failed blob delete aborts with the record untouched. A failed record
    /// delete after the blob is gone is reported as is; the row keeps a
    /// dangling blob path until the caller deletes again.
    pub async fn delete(&self, caller: Option<&Identity>, id: Uuid) -> Result<()> {
        let caller = require_caller(caller)?;
        let document = self.ctx.load_document(id).await?;
        ensure_owner(&document, caller)?;

        self.ctx
            .call(
                "delete_blob",
                self.ctx.stores.blobs.delete(&document.blob_path),
            )
            .await?;

        let deleted = self
            .ctx
            .call("delete_document", self.ctx.stores.records.delete_document(id))
            .await
            .inspect_err(|err| {
                error!(
                    document_id = %id,
                    blob_path = %document.blob_path,
                    error = %err,
                    "document record delete failed after blob removal"
                );
            })?;
        if !deleted {
            return Err(Error::not_found("document", id));
        }

        info!(document_id = %id, "document deleted");
        self.ctx
            .events
            .publish(DocumentEvent::Deleted(DocumentChange::now(id, caller.id)));
        Ok(())
    }
}
