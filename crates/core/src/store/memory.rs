//! In-process store adapters, used for local development and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::signing::UrlSigner;
use super::{BlobStore, RecordStore};
use crate::comment::{Comment, NewComment};
use crate::document::{BlobPath, Document, DocumentPatch, NewDocument};
use crate::identity::{NewUser, Profile, SessionRecord, UserRecord};
use crate::{Error, Result};

#[derive(Default)]
struct Tables {
    documents: HashMap<Uuid, Document>,
    comments: Vec<Comment>,
    users: HashMap<Uuid, UserRecord>,
    sessions: HashMap<Uuid, SessionRecord>,
}

/// Record store held entirely in memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored comments across all documents.
    pub async fn comment_count(&self) -> usize {
        self.tables.read().await.comments.len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_document(&self, new: NewDocument) -> Result<Document> {
        let mut tables = self.tables.write().await;
        if tables.documents.values().any(|d| d.blob_path == new.blob_path) {
            return Err(Error::Conflict(format!(
                "a document already references blob {}",
                new.blob_path
            )));
        }
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            title: new.title,
            blob_path: new.blob_path,
            original_name: new.original_name,
            size: new.size,
            mime_type: new.mime_type,
            owner_id: new.owner_id,
            is_public: new.is_public,
            created_at: now,
            updated_at: now,
        };
        tables.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.tables.read().await.documents.get(&id).cloned())
    }

    async fn find_document_by_blob_path(&self, path: &BlobPath) -> Result<Option<Document>> {
        let tables = self.tables.read().await;
        Ok(tables.documents.values().find(|d| &d.blob_path == path).cloned())
    }

    async fn list_visible_documents(&self, viewer: Option<Uuid>) -> Result<Vec<Document>> {
        let tables = self.tables.read().await;
        let mut documents: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| d.is_public || Some(d.owner_id) == viewer)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(documents)
    }

    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> Result<Option<Document>> {
        let mut tables = self.tables.write().await;
        let Some(document) = tables.documents.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            document.title = title.clone();
        }
        if let Some(is_public) = patch.is_public {
            document.is_public = is_public;
        }
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.documents.remove(&id).is_some();
        if removed {
            tables.comments.retain(|c| c.document_id != id);
        }
        Ok(removed)
    }

    async fn insert_comment(&self, new: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.documents.contains_key(&new.document_id) {
            return Err(Error::not_found("document", new.document_id));
        }
        let comment = Comment {
            id: Uuid::now_v7(),
            document_id: new.document_id,
            author_id: new.author_id,
            page_number: new.page_number,
            content: new.content,
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, document_id: Uuid, page_number: u32) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.document_id == document_id && c.page_number == page_number)
            .cloned()
            .collect();
        // stable sort: equal timestamps keep insertion order
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn get_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id))
            .map(UserRecord::profile)
            .collect())
    }

    async fn insert_user(&self, new: NewUser) -> Result<UserRecord> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(Error::Conflict("user with this email already exists".into()));
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_session(&self, session: &SessionRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        self.tables.write().await.sessions.remove(&id);
        Ok(())
    }
}

/// Blob store held entirely in memory. URLs are signed like the filesystem
/// store's, so the HTTP blob routes work against it unchanged.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<BlobPath, (Bytes, String)>>,
    signer: UrlSigner,
}

impl MemoryBlobStore {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            signer,
        }
    }

    pub async fn contains(&self, path: &BlobPath) -> bool {
        self.blobs.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    pub async fn content_type(&self, path: &BlobPath) -> Option<String> {
        self.blobs.read().await.get(path).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &BlobPath, data: Bytes, content_type: &str) -> Result<()> {
        let mut blobs = self.blobs.write().await;
        if blobs.contains_key(path) {
            return Err(Error::Conflict(format!("blob {path} already exists")));
        }
        blobs.insert(path.clone(), (data, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, path: &BlobPath) -> Result<Bytes> {
        self.blobs
            .read()
            .await
            .get(path)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| Error::not_found("blob", path))
    }

    async fn delete(&self, path: &BlobPath) -> Result<()> {
        self.blobs.write().await.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &BlobPath) -> String {
        self.signer.public_url(path)
    }

    fn signed_url(&self, path: &BlobPath, ttl: Duration) -> Result<String> {
        self.signer.signed_url(path, ttl)
    }

    fn verify_signed(&self, token: &str) -> Result<BlobPath> {
        self.signer.verify(token)
    }
}
