use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::RecordStore;
use crate::comment::{Comment, NewComment};
use crate::document::{BlobPath, Document, DocumentPatch, NewDocument};
use crate::identity::{NewUser, Profile, SessionRecord, UserRecord};
use crate::{Error, Result};

const DOCUMENT_COLUMNS: &str = "id, title, blob_path, original_name, size, mime_type, owner_id, \
                                is_public, created_at, updated_at";

/// Record store backed by PostgreSQL. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate sqlx failures into the service error taxonomy.
fn map_sqlx(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::RowNotFound => Error::NotFound("row not found".into()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            Error::NotFound(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            Error::Validation(crate::document::validate::ValidationError::Malformed(
                db.message().to_string(),
            ))
        }
        sqlx::Error::PoolTimedOut => Error::StoreUnavailable("database pool timed out".into()),
        _ => Error::StoreUnavailable(err.to_string()),
    }
}

/// Database row representation of a document.
#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    blob_path: String,
    original_name: String,
    size: i64,
    mime_type: String,
    owner_id: Uuid,
    is_public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = Error;

    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Document {
            id: row.id,
            title: row.title,
            blob_path: BlobPath::parse(&row.blob_path).map_err(|_| {
                Error::StoreUnavailable(format!("document {} has a malformed blob path", row.id))
            })?,
            original_name: row.original_name,
            size: row.size,
            mime_type: row.mime_type,
            owner_id: row.owner_id,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    document_id: Uuid,
    author_id: Uuid,
    page_number: i32,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            document_id: row.document_id,
            author_id: row.author_id,
            page_number: row.page_number.max(0) as u32,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

fn documents(rows: Vec<DocumentRow>) -> Result<Vec<Document>> {
    rows.into_iter().map(Document::try_from).collect()
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_document(&self, new: NewDocument) -> Result<Document> {
        let sql = format!(
            "INSERT INTO documents (id, title, blob_path, original_name, size, mime_type, owner_id, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {DOCUMENT_COLUMNS}"
        );
        let row: DocumentRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.title)
            .bind(new.blob_path.as_str())
            .bind(&new.original_name)
            .bind(new.size)
            .bind(&new.mime_type)
            .bind(new.owner_id)
            .bind(new.is_public)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.try_into()
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");
        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Document::try_from).transpose()
    }

    async fn find_document_by_blob_path(&self, path: &BlobPath) -> Result<Option<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE blob_path = $1");
        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(path.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Document::try_from).transpose()
    }

    async fn list_visible_documents(&self, viewer: Option<Uuid>) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE is_public OR owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql)
            .bind(viewer)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        documents(rows)
    }

    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> Result<Option<Document>> {
        let sql = format!(
            "UPDATE documents SET \
                title = COALESCE($2, title), \
                is_public = COALESCE($3, is_public), \
                updated_at = now() \
             WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        );
        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(patch.is_public)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Document::try_from).transpose()
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        // comments go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, new: NewComment) -> Result<Comment> {
        let page_number = i32::try_from(new.page_number).map_err(|_| {
            Error::Validation(crate::document::validate::ValidationError::InvalidPageNumber(
                i64::from(new.page_number),
            ))
        })?;
        let row: CommentRow = sqlx::query_as(
            "INSERT INTO comments (id, document_id, author_id, page_number, content) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, document_id, author_id, page_number, content, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(new.document_id)
        .bind(new.author_id)
        .bind(page_number)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.into())
    }

    async fn list_comments(&self, document_id: Uuid, page_number: u32) -> Result<Vec<Comment>> {
        let Ok(page_number) = i32::try_from(page_number) else {
            return Ok(Vec::new());
        };
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, document_id, author_id, page_number, content, created_at \
             FROM comments WHERE document_id = $1 AND page_number = $2 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(document_id)
        .bind(page_number)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn get_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(Uuid, String, String)> =
            sqlx::query_as("SELECT id, email, name FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?;
        Ok(rows
            .into_iter()
            .map(|(id, email, name)| Profile {
                id,
                email,
                name: Some(name),
            })
            .collect())
    }

    async fn insert_user(&self, new: NewUser) -> Result<UserRecord> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, name, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_sqlx(e) {
            Error::Conflict(_) => Error::Conflict("user with this email already exists".into()),
            other => other,
        })?;
        Ok(row.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(UserRecord::from))
    }

    async fn insert_session(&self, session: &SessionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(|r| SessionRecord {
            id: r.id,
            user_id: r.user_id,
            created_at: r.created_at,
            expires_at: r.expires_at,
        }))
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}
