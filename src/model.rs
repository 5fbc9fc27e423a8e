use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type UserId = i64;
pub type PostId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn parse_status(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// Which tab of the feed is active.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Global,
    Personal,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Global => "global",
            ViewMode::Personal => "personal",
        }
    }
}

/// Opaque continuation token handed out by a post source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorRef {
    pub id: UserId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub author: AuthorRef,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub favorite_count: i64,
}

/// One fetched slice of the feed. `next_cursor == None` marks the last page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<PostSummary>,
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub post_id: PostId,
    pub author: AuthorRef,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the post page shows: the post body plus its comment thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostDetail {
    pub summary: PostSummary,
    pub status: PostStatus,
    pub content: String,
    pub comments: Vec<Comment>,
}

impl PostDetail {
    /// Only the author may edit a post.
    pub fn is_editable_by(&self, viewer: Option<UserId>) -> bool {
        viewer == Some(self.summary.author.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(owner: UserId) -> PostDetail {
        PostDetail {
            summary: PostSummary {
                id: 1,
                title: "t".into(),
                author: AuthorRef {
                    id: owner,
                    name: None,
                },
                created_at: Utc::now(),
                tags: BTreeSet::new(),
                favorite_count: 0,
            },
            status: PostStatus::Published,
            content: String::new(),
            comments: vec![],
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [PostStatus::Draft, PostStatus::Published] {
            assert_eq!(PostStatus::parse_status(s.as_str()), Some(s));
        }
        assert_eq!(PostStatus::parse_status("archived"), None);
    }

    #[test]
    fn only_owner_can_edit() {
        let d = detail(7);
        assert!(d.is_editable_by(Some(7)));
        assert!(!d.is_editable_by(Some(8)));
        assert!(!d.is_editable_by(None));
    }
}
