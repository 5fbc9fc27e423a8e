use super::repo::{self, Pool};
use crate::comments::{CommentService, PostDetailSource};
use crate::feed::PostSource;
use crate::filter::FeedPredicate;
use crate::model::{Comment, Cursor, Page, PostDetail, PostId, Tag, UserId};
use crate::tags::TagSource;
use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl PostSource for SqliteStore {
    async fn fetch_page(
        &self,
        predicate: &FeedPredicate,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> Result<Page> {
        repo::fetch_feed_page(&self.pool, predicate, cursor, page_size).await
    }
}

#[async_trait]
impl TagSource for SqliteStore {
    async fn fetch_all_tags(&self) -> Result<Vec<Tag>> {
        repo::list_tags(&self.pool).await
    }
}

#[async_trait]
impl CommentService for SqliteStore {
    async fn create_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
    ) -> Result<Comment> {
        repo::insert_comment(&self.pool, post_id, author_id, content).await
    }
}

#[async_trait]
impl PostDetailSource for SqliteStore {
    async fn fetch_post_detail(&self, post_id: PostId) -> Result<Option<PostDetail>> {
        repo::fetch_post_detail(&self.pool, post_id).await
    }
}
