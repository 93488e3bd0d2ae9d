use std::sync::Arc;

use folio_core::auth::SessionProvider;
use folio_core::events::EventBus;
use folio_core::services::Services;
use folio_core::store::Stores;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    services: Services,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            inner: Arc::new(InnerState { services }),
        }
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.inner.services.sessions
    }

    pub fn stores(&self) -> &Stores {
        &self.inner.services.context.stores
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.services.context.events
    }
}
