use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};
use uuid::Uuid;

use super::{ensure_readable, require_caller, ServiceContext};
use crate::comment::{author_label, Comment, CommentView, NewComment};
use crate::document::validate::validate_comment;
use crate::events::{DocumentChange, DocumentEvent};
use crate::identity::{Identity, Profile};
use crate::Result;

/// Page-scoped comment threads on documents.
#[derive(Clone)]
pub struct CommentService {
    ctx: ServiceContext,
}

impl CommentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Comments on one page, oldest first, with author labels resolved in a
    /// single profile lookup.
    pub async fn list(
        &self,
        caller: Option<&Identity>,
        document_id: Uuid,
        page_number: u32,
    ) -> Result<Vec<CommentView>> {
        let document = self.ctx.load_document(document_id).await?;
        ensure_readable(&document, caller)?;

        let comments = self
            .ctx
            .call(
                "list_comments",
                self.ctx.stores.records.list_comments(document_id, page_number),
            )
            .await?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: Vec<Uuid> = comments
            .iter()
            .map(|c| c.author_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles: HashMap<Uuid, Profile> = match self
            .ctx
            .call("get_profiles", self.ctx.stores.records.get_profiles(&author_ids))
            .await
        {
            Ok(profiles) => profiles.into_iter().map(|p| (p.id, p)).collect(),
            Err(err) => {
                warn!(%document_id, error = %err, "comments: profile lookup failed, using fallback labels");
                HashMap::new()
            }
        };

        Ok(comments
            .into_iter()
            .map(|comment| {
                let profile = profiles.get(&comment.author_id);
                CommentView {
                    author_name: author_label(profile),
                    author_email: profile.map(|p| p.email.clone()).filter(|e| !e.is_empty()),
                    comment,
                }
            })
            .collect())
    }

    pub async fn add(
        &self,
        caller: Option<&Identity>,
        document_id: Uuid,
        page_number: i64,
        content: &str,
    ) -> Result<Comment> {
        let author = require_caller(caller)?;
        let (page_number, content) = validate_comment(page_number, content)?;

        let document = self.ctx.load_document(document_id).await?;
        ensure_readable(&document, Some(author))?;

        let comment = self
            .ctx
            .call(
                "insert_comment",
                self.ctx.stores.records.insert_comment(NewComment {
                    document_id,
                    author_id: author.id,
                    page_number,
                    content,
                }),
            )
            .await?;

        info!(%document_id, comment_id = %comment.id, page_number, "comment added");
        self.ctx.events.publish(DocumentEvent::CommentAdded {
            change: DocumentChange::now(document_id, author.id),
            comment_id: comment.id,
            page_number,
        });
        Ok(comment)
    }
}
