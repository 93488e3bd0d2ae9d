use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::signing::UrlSigner;
use super::BlobStore;
use crate::document::BlobPath;
use crate::{Error, Result};

/// Filesystem blob store.
///
/// Blobs live at `{root}/{blob_path}`. The content type is not persisted;
/// every stored blob is served as the single allowed upload type.
pub struct LocalBlobStore {
    root: PathBuf,
    signer: UrlSigner,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, signer: UrlSigner) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    /// Create the root directory if needed.
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::StoreUnavailable(format!("create blob root {}: {e}", self.root.display()))
        })
    }

    fn full_path(&self, path: &BlobPath) -> PathBuf {
        path.segments().fold(self.root.clone(), |acc, seg| acc.join(seg))
    }
}

fn io_error(op: &str, path: &BlobPath, err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::NotFound => Error::not_found("blob", path),
        ErrorKind::AlreadyExists => Error::Conflict(format!("blob {path} already exists")),
        _ => Error::StoreUnavailable(format!("blob {op} failed for {path}: {err}")),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &BlobPath, data: Bytes, content_type: &str) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(blob_path = %path, size = data.len(), content_type, "local_blob: put");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("put", path, e))?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(|e| io_error("put", path, e))?;

        let written = async {
            file.write_all(&data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            warn!(blob_path = %path, error = %e, "local_blob: write failed, removing partial file");
            drop(file);
            let _ = fs::remove_file(&full_path).await;
            return Err(io_error("put", path, e));
        }
        Ok(())
    }

    async fn get(&self, path: &BlobPath) -> Result<Bytes> {
        let data = fs::read(self.full_path(path))
            .await
            .map_err(|e| io_error("get", path, e))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, path: &BlobPath) -> Result<()> {
        debug!(blob_path = %path, "local_blob: delete");
        match fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", path, e)),
        }
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
