use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::path::BlobPath;
use crate::identity::Identity;

/// One uploaded PDF.
/// Maps to the `documents` PostgreSQL table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub blob_path: BlobPath,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    pub owner_id: Uuid,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.owner_id == identity.id
    }

    /// Public documents are readable by anyone, private ones by their owner.
    pub fn is_readable_by(&self, caller: Option<&Identity>) -> bool {
        self.is_public || caller.is_some_and(|identity| self.is_owned_by(identity))
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

/// Fields of a document row supplied at insert time. The store assigns
/// `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub blob_path: BlobPath,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    pub owner_id: Uuid,
    pub is_public: bool,
}

/// Partial update applied by the record store. `None` leaves a column alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub is_public: Option<bool>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.is_public.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(owner_id: Uuid, is_public: bool) -> Document {
        let now = Utc::now();
        Document {
            id: Uuid::new_v4(),
            title: "Report".into(),
            blob_path: BlobPath::generate(owner_id, "report.pdf", now),
            original_name: "report.pdf".into(),
            size: 10,
            mime_type: "application/pdf".into(),
            owner_id,
            is_public,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn visibility_gate() {
        let owner = Identity::new(Uuid::new_v4(), "ann@x.com", Some("Ann".into()));
        let other = Identity::new(Uuid::new_v4(), "bob@x.com", None);

        let private = document(owner.id, false);
        assert!(private.is_readable_by(Some(&owner)));
        assert!(!private.is_readable_by(Some(&other)));
        assert!(!private.is_readable_by(None));
        assert_eq!(private.visibility(), Visibility::Private);

        let public = document(owner.id, true);
        assert!(public.is_readable_by(None));
        assert!(public.is_readable_by(Some(&other)));
    }

    #[test]
    fn serializes_snake_case() {
        let doc = document(Uuid::new_v4(), true);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["is_public"], true);
        assert_eq!(json["blob_path"], doc.blob_path.as_str());
    }
}
