//! Capability interfaces over the backing stores, plus their adapters.
//!
//! Services only see [`RecordStore`] and [`BlobStore`]. Each adapter
//! translates its native errors into [`crate::Error`] before returning.

pub mod local_blob;
pub mod memory;
pub mod postgres;
pub mod signing;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::comment::{Comment, NewComment};
use crate::document::{BlobPath, Document, DocumentPatch, NewDocument};
use crate::identity::{NewUser, Profile, SessionRecord, UserRecord};
use crate::Result;

pub use local_blob::LocalBlobStore;
pub use memory::{MemoryBlobStore, MemoryRecordStore};
pub use postgres::PgRecordStore;
pub use signing::UrlSigner;

/// Relational rows: documents, comments, users and sessions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Cheap connectivity check.
    async fn ping(&self) -> Result<()>;

    async fn insert_document(&self, document: NewDocument) -> Result<Document>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    async fn find_document_by_blob_path(&self, path: &BlobPath) -> Result<Option<Document>>;

    /// Public documents plus those owned by `viewer`, newest first.
    async fn list_visible_documents(&self, viewer: Option<Uuid>) -> Result<Vec<Document>>;

    /// Apply `patch` and bump `updated_at`. `None` when the row is gone.
    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> Result<Option<Document>>;

    /// Delete the row and its comments. `false` when nothing was deleted.
    async fn delete_document(&self, id: Uuid) -> Result<bool>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Comments for one page, ascending by `created_at`.
    async fn list_comments(&self, document_id: Uuid, page_number: u32) -> Result<Vec<Comment>>;

    /// Batched profile lookup. Unknown ids are simply absent from the result.
    async fn get_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>>;

    /// Insert a user. A duplicate email is a `Conflict`.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn insert_session(&self, session: &SessionRecord) -> Result<()>;

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>>;

    async fn delete_session(&self, id: Uuid) -> Result<()>;
}

/// Path-addressed binary storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a new blob. Writing to an existing path is a `Conflict`.
    async fn put(&self, path: &BlobPath, data: Bytes, content_type: &str) -> Result<()>;

    async fn get(&self, path: &BlobPath) -> Result<Bytes>;

    /// Remove a blob. Removing a missing blob succeeds.
    async fn delete(&self, path: &BlobPath) -> Result<()>;

    /// Durable URL for a blob whose document is public.
    fn public_url(&self, path: &BlobPath) -> String;

    /// Short-lived capability URL granting read access to one blob.
    fn signed_url(&self, path: &BlobPath, ttl: Duration) -> Result<String>;

    /// Resolve a token from a signed URL back to its blob path.
    fn verify_signed(&self, token: &str) -> Result<BlobPath>;
}

/// The pair of stores every service works against.
#[derive(Clone)]
pub struct Stores {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Stores {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }
}
