#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use folio_core::auth::SessionProvider;
use folio_core::comment::{Comment, NewComment};
use folio_core::config::ServiceConfig;
use folio_core::document::{BlobPath, Document, DocumentPatch, NewDocument};
use folio_core::events::EventBus;
use folio_core::identity::{Identity, NewUser, Profile, SessionRecord, UserRecord};
use folio_core::retry::RetryPolicy;
use folio_core::services::{ServiceContext, Services, UploadRequest};
use folio_core::store::{BlobStore, MemoryBlobStore, MemoryRecordStore, RecordStore, Stores, UrlSigner};
use folio_core::{Error, Result};

pub const BASE_URL: &str = "http://folio.test";
pub const SECRET: &[u8] = b"test-secret";

/// Blob store wrapper whose operations can be switched to fail.
pub struct FaultyBlobs {
    pub inner: MemoryBlobStore,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FaultyBlobs {
    fn injected(op: &str) -> Error {
        Error::StoreUnavailable(format!("injected {op} failure"))
    }
}

#[async_trait]
impl BlobStore for FaultyBlobs {
    async fn put(&self, path: &BlobPath, data: Bytes, content_type: &str) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Self::injected("put"));
        }
        self.inner.put(path, data, content_type).await
    }

    async fn get(&self, path: &BlobPath) -> Result<Bytes> {
        self.inner.get(path).await
    }

    async fn delete(&self, path: &BlobPath) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::injected("delete"));
        }
        self.inner.delete(path).await
    }

    fn public_url(&self, path: &BlobPath) -> String {
        self.inner.public_url(path)
    }

    fn signed_url(&self, path: &BlobPath, ttl: Duration) -> Result<String> {
        self.inner.signed_url(path, ttl)
    }

    fn verify_signed(&self, token: &str) -> Result<BlobPath> {
        self.inner.verify_signed(token)
    }
}

/// Record store wrapper with switchable failures on the calls the
/// workflows compensate for.
pub struct FaultyRecords {
    pub inner: MemoryRecordStore,
    pub fail_insert_document: AtomicBool,
    pub fail_delete_document: AtomicBool,
    pub fail_get_profiles: AtomicBool,
    pub hide_sessions: AtomicBool,
    pub hang_sessions: AtomicBool,
    pub fail_update_document: AtomicBool,
}

#[async_trait]
impl RecordStore for FaultyRecords {
    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn insert_document(&self, document: NewDocument) -> Result<Document> {
        if self.fail_insert_document.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("injected insert failure".into()));
        }
        self.inner.insert_document(document).await
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        self.inner.get_document(id).await
    }

    async fn find_document_by_blob_path(&self, path: &BlobPath) -> Result<Option<Document>> {
        self.inner.find_document_by_blob_path(path).await
    }

    async fn list_visible_documents(&self, viewer: Option<Uuid>) -> Result<Vec<Document>> {
        self.inner.list_visible_documents(viewer).await
    }

    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> Result<Option<Document>> {
        if self.fail_update_document.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("injected update failure".into()));
        }
        self.inner.update_document(id, patch).await
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        if self.fail_delete_document.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("injected delete failure".into()));
        }
        self.inner.delete_document(id).await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        self.inner.insert_comment(comment).await
    }

    async fn list_comments(&self, document_id: Uuid, page_number: u32) -> Result<Vec<Comment>> {
        self.inner.list_comments(document_id, page_number).await
    }

    async fn get_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>> {
        if self.fail_get_profiles.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("injected profile failure".into()));
        }
        self.inner.get_profiles(ids).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        self.inner.insert_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.inner.find_user_by_email(email).await
    }

    async fn insert_session(&self, session: &SessionRecord) -> Result<()> {
        self.inner.insert_session(session).await
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        if self.hang_sessions.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        if self.hide_sessions.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get_session(id).await
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        self.inner.delete_session(id).await
    }
}

pub struct Harness {
    pub services: Services,
    pub records: Arc<FaultyRecords>,
    pub blobs: Arc<FaultyBlobs>,
    pub events: EventBus,
}

pub fn harness() -> Harness {
    let records = Arc::new(FaultyRecords {
        inner: MemoryRecordStore::new(),
        fail_insert_document: AtomicBool::new(false),
        fail_delete_document: AtomicBool::new(false),
        fail_get_profiles: AtomicBool::new(false),
        hide_sessions: AtomicBool::new(false),
        hang_sessions: AtomicBool::new(false),
        fail_update_document: AtomicBool::new(false),
    });
    let blobs = Arc::new(FaultyBlobs {
        inner: MemoryBlobStore::new(UrlSigner::new(BASE_URL, SECRET)),
        fail_put: AtomicBool::new(false),
        fail_delete: AtomicBool::new(false),
    });
    let config = ServiceConfig {
        session_verify: RetryPolicy::new(3, Duration::ZERO),
        ..ServiceConfig::default()
    };
    let events = EventBus::new(64);
    let stores = Stores::new(records.clone(), blobs.clone());
    let sessions = SessionProvider::new(records.clone(), SECRET, config.session_ttl);
    let context = ServiceContext::new(stores, config, events.clone());
    Harness {
        services: Services::new(context, sessions),
        records,
        blobs,
        events,
    }
}

pub fn set(flag: &AtomicBool, on: bool) {
    flag.store(on, Ordering::SeqCst);
}

pub fn identity(email: &str) -> Identity {
    Identity::new(Uuid::new_v4(), email, None)
}

pub fn pdf_bytes() -> Bytes {
    Bytes::from_static(b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n")
}

pub fn pdf_upload(filename: &str) -> UploadRequest {
    UploadRequest {
        data: pdf_bytes(),
        declared_mime: "application/pdf".into(),
        filename: filename.into(),
        title: None,
        is_public: false,
    }
}

impl Harness {
    pub async fn upload(&self, owner: &Identity, filename: &str) -> Document {
        self.services
            .upload
            .upload(Some(owner), pdf_upload(filename))
            .await
            .expect("upload should succeed")
    }
}
