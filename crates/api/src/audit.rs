use folio_core::events::{DocumentEvent, EventBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Log every document event until the bus closes.
pub fn spawn_audit_log(bus: &EventBus) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => record(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "audit log fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn record(event: &DocumentEvent) {
    let change = event.change();
    tracing::info!(
        target: "folio::audit",
        event = event.name(),
        document_id = %change.document_id,
        actor_id = %change.actor_id,
        at = %change.timestamp,
        "document event"
    );
}
