//! Row-level models used by the repository.
//!
//! Keep these focused on what the queries return; the public domain types live
//! in `crate::model`.

use crate::model::{AuthorRef, Cursor, PostId, PostSummary, UserId};
use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeSet;

/// Position of a post in feed order (`created_at_ms DESC, id DESC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedKey {
    pub created_at_ms: i64,
    pub id: PostId,
}

impl FeedKey {
    pub fn encode(&self) -> Cursor {
        Cursor::new(format!("{}:{}", self.created_at_ms, self.id))
    }

    pub fn decode(cursor: &Cursor) -> Result<Self> {
        let (ms, id) = cursor
            .as_str()
            .split_once(':')
            .ok_or_else(|| anyhow!("malformed feed cursor {:?}", cursor.as_str()))?;
        Ok(Self {
            created_at_ms: ms
                .parse()
                .map_err(|_| anyhow!("malformed feed cursor {:?}", cursor.as_str()))?,
            id: id
                .parse()
                .map_err(|_| anyhow!("malformed feed cursor {:?}", cursor.as_str()))?,
        })
    }
}

/// Post columns shared by the feed and detail queries.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: PostId,
    pub title: String,
    pub user_id: UserId,
    pub author_name: Option<String>,
    pub created_at_ms: i64,
    pub favorite_count: i64,
}

impl PostRow {
    pub fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            user_id: row.get("user_id"),
            author_name: row.try_get::<Option<String>, _>("author_name").ok().flatten(),
            created_at_ms: row.get("created_at_ms"),
            favorite_count: row.get("favorite_count"),
        }
    }

    pub fn key(&self) -> FeedKey {
        FeedKey {
            created_at_ms: self.created_at_ms,
            id: self.id,
        }
    }

    pub fn into_summary(self, tags: BTreeSet<String>) -> Result<PostSummary> {
        Ok(PostSummary {
            id: self.id,
            title: self.title,
            author: AuthorRef {
                id: self.user_id,
                name: self.author_name,
            },
            created_at: from_millis(self.created_at_ms)?,
            tags,
            favorite_count: self.favorite_count,
        })
    }
}

pub fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| anyhow!("timestamp {} out of range", ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trip() {
        let key = FeedKey {
            created_at_ms: 1_700_000_000_123,
            id: 42,
        };
        assert_eq!(key.encode().as_str(), "1700000000123:42");
        assert_eq!(FeedKey::decode(&key.encode()).unwrap(), key);
    }

    #[test]
    fn malformed_cursor_is_an_error() {
        for raw in ["", "abc", "1:x", "x:1"] {
            assert!(FeedKey::decode(&Cursor::new(raw)).is_err(), "{raw}");
        }
    }
}
