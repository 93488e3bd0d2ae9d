use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted after successful document and comment mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DocumentEvent {
    Uploaded(DocumentChange),
    Updated(DocumentChange),
    VisibilityChanged {
        #[serde(flatten)]
        change: DocumentChange,
        is_public: bool,
    },
    Deleted(DocumentChange),
    CommentAdded {
        #[serde(flatten)]
        change: DocumentChange,
        comment_id: Uuid,
        page_number: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChange {
    pub document_id: Uuid,
    pub actor_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl DocumentChange {
    pub fn now(document_id: Uuid, actor_id: Uuid) -> Self {
        Self {
            document_id,
            actor_id,
            timestamp: Utc::now(),
        }
    }
}

impl DocumentEvent {
    pub fn change(&self) -> &DocumentChange {
        match self {
            DocumentEvent::Uploaded(change)
            | DocumentEvent::Updated(change)
            | DocumentEvent::Deleted(change) => change,
            DocumentEvent::VisibilityChanged { change, .. }
            | DocumentEvent::CommentAdded { change, .. } => change,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentEvent::Uploaded(_) => "uploaded",
            DocumentEvent::Updated(_) => "updated",
            DocumentEvent::VisibilityChanged { .. } => "visibilityChanged",
            DocumentEvent::Deleted(_) => "deleted",
            DocumentEvent::CommentAdded { .. } => "commentAdded",
        }
    }
}
