use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{ensure_owner, ensure_readable, require_caller, ServiceContext};
use crate::document::{BlobPath, Document, DocumentPatch};
use crate::events::{DocumentChange, DocumentEvent};
use crate::identity::Identity;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    /// Durable link, valid while the document stays public.
    Public,
    /// Capability link that stops working at `expires_at`.
    Signed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareReference {
    pub url: String,
    pub kind: ShareKind,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Owns the Private/Public visibility flag and hands out share links.
#[derive(Clone)]
pub struct SharingController {
    ctx: ServiceContext,
}

impl SharingController {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Flip visibility. Setting the current value writes nothing.
    pub async fn set_public(
        &self,
        caller: Option<&Identity>,
        id: Uuid,
        is_public: bool,
    ) -> Result<Document> {
        let caller = require_caller(caller)?;
        let document = self.ctx.load_document(id).await?;
        ensure_owner(&document, caller)?;

        if document.is_public == is_public {
            return Ok(document);
        }

        let patch = DocumentPatch {
            title: None,
            is_public: Some(is_public),
        };
        let updated = self
            .ctx
            .call(
                "update_document",
                self.ctx.stores.records.update_document(id, &patch),
            )
            .await?
            .ok_or_else(|| Error::not_found("document", id))?;

        info!(document_id = %id, is_public, "document visibility changed");
        self.ctx.events.publish(DocumentEvent::VisibilityChanged {
            change: DocumentChange::now(id, caller.id),
            is_public,
        });
        Ok(updated)
    }

    /// A public URL for public documents; for private ones, a signed URL
    /// that only the owner may obtain.
    pub async fn share_reference(&self, caller: Option<&Identity>, id: Uuid) -> Result<ShareReference> {
        let document = self.ctx.load_document(id).await?;
        ensure_readable(&document, caller)?;

        let blobs = &self.ctx.stores.blobs;
        if document.is_public {
            return Ok(ShareReference {
                url: blobs.public_url(&document.blob_path),
                kind: ShareKind::Public,
                expires_at: None,
            });
        }

        let ttl = self.ctx.config.signed_url_ttl;
        let url = blobs.signed_url(&document.blob_path, ttl)?;
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        Ok(ShareReference {
            url,
            kind: ShareKind::Signed,
            expires_at,
        })
    }

    /// Serve the blob behind a public URL. Paths that are malformed, unknown
    /// or belong to a private document are all `NotFound`.
    pub async fn open_public(&self, path: &str) -> Result<(Document, Bytes)> {
        let path = BlobPath::parse(path).map_err(|_| Error::not_found("blob", path))?;
        let document = self
            .find_by_blob(&path)
            .await?
            .filter(|document| document.is_public)
            .ok_or_else(|| Error::not_found("blob", &path))?;
        self.read_blob(document).await
    }

    /// Serve the blob named by a signed URL token.
    pub async fn open_signed(&self, token: &str) -> Result<(Document, Bytes)> {
        let path = self.ctx.stores.blobs.verify_signed(token)?;
        let document = self
            .find_by_blob(&path)
            .await?
            .ok_or_else(|| Error::not_found("blob", &path))?;
        self.read_blob(document).await
    }

    async fn find_by_blob(&self, path: &BlobPath) -> Result<Option<Document>> {
        self.ctx
            .call(
                "find_document_by_blob_path",
                self.ctx.stores.records.find_document_by_blob_path(path),
            )
            .await
    }

    async fn read_blob(&self, document: Document) -> Result<(Document, Bytes)> {
        let data = self
            .ctx
            .call("get_blob", self.ctx.stores.blobs.get(&document.blob_path))
            .await?;
        Ok((document, data))
    }
}
