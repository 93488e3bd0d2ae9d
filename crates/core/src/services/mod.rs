//! The workflow services. Each takes its collaborators explicitly through a
//! [`ServiceContext`]; none of them holds global state.

pub mod access;
pub mod auth;
pub mod comments;
pub mod sharing;
pub mod upload;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionProvider;
use crate::config::ServiceConfig;
use crate::document::Document;
use crate::events::EventBus;
use crate::identity::Identity;
use crate::store::Stores;
use crate::{Error, Result};

pub use access::{AccessController, DocumentUpdate};
pub use auth::{AuthService, SignIn};
pub use comments::CommentService;
pub use sharing::{ShareKind, ShareReference, SharingController};
pub use upload::{UploadRequest, UploadService};

/// Everything a service needs to talk to the outside world.
#[derive(Clone)]
pub struct ServiceContext {
    pub stores: Stores,
    pub config: Arc<ServiceConfig>,
    pub events: EventBus,
}

impl ServiceContext {
    pub fn new(stores: Stores, config: ServiceConfig, events: EventBus) -> Self {
        Self {
            stores,
            config: Arc::new(config),
            events,
        }
    }

    /// Run one store call under the configured timeout. Expiry is reported
    /// as `StoreUnavailable`; there is no retry.
    pub(crate) async fn call<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        bounded(self.config.store_timeout, op, fut).await
    }

    /// Fetch a document or fail with `NotFound`.
    pub(crate) async fn load_document(&self, id: uuid::Uuid) -> Result<Document> {
        self.call("get_document", self.stores.records.get_document(id))
            .await?
            .ok_or_else(|| Error::not_found("document", id))
    }
}

pub(crate) async fn bounded<T, F>(timeout: Duration, op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(op, timeout_ms = timeout.as_millis() as u64, "store call timed out");
            Err(Error::StoreUnavailable(format!("{op} timed out")))
        }
    }
}

/// Reject anonymous callers.
pub(crate) fn require_caller(caller: Option<&Identity>) -> Result<&Identity> {
    caller.ok_or(Error::Unauthenticated)
}

/// Read gate shared by documents, their content and their comments.
pub(crate) fn ensure_readable(document: &Document, caller: Option<&Identity>) -> Result<()> {
    if document.is_readable_by(caller) {
        Ok(())
    } else {
        Err(Error::Unauthorized(format!(
            "document {} is private",
            document.id
        )))
    }
}

/// Mutation gate: only the owner may change a document.
pub(crate) fn ensure_owner(document: &Document, caller: &Identity) -> Result<()> {
    if document.is_owned_by(caller) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "only the owner can modify document {}",
            document.id
        )))
    }
}

/// All services over one shared context.
#[derive(Clone)]
pub struct Services {
    pub context: ServiceContext,
    pub sessions: SessionProvider,
    pub upload: UploadService,
    pub access: AccessController,
    pub comments: CommentService,
    pub sharing: SharingController,
    pub auth: AuthService,
}

impl Services {
    pub fn new(context: ServiceContext, sessions: SessionProvider) -> Self {
        let sessions = sessions.with_store_timeout(context.config.store_timeout);
        Self {
            upload: UploadService::new(context.clone()),
            access: AccessController::new(context.clone()),
            comments: CommentService::new(context.clone()),
            sharing: SharingController::new(context.clone()),
            auth: AuthService::new(context.clone(), sessions.clone()),
            sessions,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_maps_timeout_to_store_unavailable() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, Error>(())
        };
        let err = bounded(Duration::from_secs(1), "get_document", slow)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "storeUnavailable");
        assert_eq!(err.to_string(), "store unavailable: get_document timed out");
    }

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let value = bounded(Duration::from_secs(1), "ping", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
