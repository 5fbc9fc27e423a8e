//! Comment submission and the post detail it refreshes.
//!
//! A successful submission does not patch any cached comment list. The caller
//! re-fetches the post detail so the thread shows server timestamps and joined
//! author names.

use crate::error::CommentError;
use crate::model::{Comment, PostDetail, PostId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[async_trait]
pub trait CommentService: Send + Sync {
    async fn create_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
    ) -> anyhow::Result<Comment>;
}

#[async_trait]
pub trait PostDetailSource: Send + Sync {
    async fn fetch_post_detail(&self, post_id: PostId) -> anyhow::Result<Option<PostDetail>>;
}

#[derive(Clone)]
pub struct CommentSubmission {
    service: Arc<dyn CommentService>,
}

impl CommentSubmission {
    pub fn new(service: Arc<dyn CommentService>) -> Self {
        Self { service }
    }

    /// `author_id` comes from the session; `None` means nobody is signed in.
    #[instrument(skip(self, content))]
    pub async fn submit(
        &self,
        post_id: PostId,
        author_id: Option<UserId>,
        content: &str,
    ) -> Result<Comment, CommentError> {
        let author_id = author_id.ok_or(CommentError::MissingAuthor)?;
        if content.trim().is_empty() {
            return Err(CommentError::EmptyContent);
        }
        match self.service.create_comment(post_id, author_id, content).await {
            Ok(comment) => {
                info!(comment_id = comment.id, "comment created");
                Ok(comment)
            }
            Err(err) => {
                warn!(?err, "comment submission failed");
                Err(CommentError::Service(err))
            }
        }
    }
}

/// A post page's data, replaced wholesale on every refresh.
pub struct PostDetailView {
    post_id: PostId,
    source: Arc<dyn PostDetailSource>,
    detail: Option<PostDetail>,
}

impl PostDetailView {
    pub fn new(post_id: PostId, source: Arc<dyn PostDetailSource>) -> Self {
        Self {
            post_id,
            source,
            detail: None,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn detail(&self) -> Option<&PostDetail> {
        self.detail.as_ref()
    }

    /// Full re-fetch. On error the previous detail stays in place.
    pub async fn refresh(&mut self) -> anyhow::Result<Option<&PostDetail>> {
        self.detail = self.source.fetch_post_detail(self.post_id).await?;
        Ok(self.detail.as_ref())
    }
}
