use super::model::{from_millis, FeedKey, PostRow};
use crate::filter::FeedPredicate;
use crate::model::{
    AuthorRef, Comment, Cursor, Page, PostDetail, PostId, PostStatus, Tag, UserId,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use tracing::instrument;

pub type Pool = SqlitePool;

const POST_COLUMNS: &str = "SELECT p.id, p.title, p.content, p.status, p.user_id, \
     u.name AS author_name, p.created_at_ms, \
     (SELECT COUNT(*) FROM favorites fv WHERE fv.post_id = p.id) AS favorite_count \
     FROM posts p JOIN users u ON u.id = p.user_id";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    // Without mode=rwc sqlx refuses to create a missing database file.
    let mut rebuilt = format!("sqlite://{}", expanded_path);
    match query_part {
        Some(q) => {
            rebuilt.push('?');
            rebuilt.push_str(q);
        }
        None => rebuilt.push_str("?mode=rwc"),
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_user(pool: &Pool, email: &str, name: Option<&str>) -> Result<UserId> {
    if let Some(id) = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?
    {
        return Ok(id);
    }

    let rec = sqlx::query("INSERT INTO users (email, name) VALUES (?, ?) RETURNING id")
        .bind(email)
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(rec.get::<i64, _>("id"))
}

#[instrument(skip_all)]
pub async fn follow_user(pool: &Pool, follower_id: UserId, followee_id: UserId) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO follows (follower_id, followee_id) VALUES (?, ?)")
        .bind(follower_id)
        .bind(followee_id)
        .execute(pool)
        .await
        .context("failed to persist follow")?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_post(
    pool: &Pool,
    user_id: UserId,
    title: &str,
    content: &str,
    status: PostStatus,
    created_at: DateTime<Utc>,
) -> Result<PostId> {
    let rec = sqlx::query(
        "INSERT INTO posts (user_id, title, content, status, created_at_ms) VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(status.as_str())
    .bind(created_at.timestamp_millis())
    .fetch_one(pool)
    .await?;
    Ok(rec.get("id"))
}

/// Attach a tag to a post, creating the tag on first use.
#[instrument(skip_all)]
pub async fn tag_post(pool: &Pool, post_id: PostId, tag_name: &str) -> Result<i64> {
    if tag_name.is_empty() {
        return Err(anyhow!("tag name must be non-empty"));
    }
    let mut tx = pool.begin().await?;
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE name = ?")
        .bind(tag_name)
        .fetch_optional(&mut *tx)
        .await?;
    let tag_id = match existing {
        Some(id) => id,
        None => sqlx::query("INSERT INTO tags (name) VALUES (?) RETURNING id")
            .bind(tag_name)
            .fetch_one(&mut *tx)
            .await?
            .get("id"),
    };
    sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(tag_id)
}

#[instrument(skip_all)]
pub async fn favorite_post(pool: &Pool, user_id: UserId, post_id: PostId) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO favorites (user_id, post_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await
        .context("failed to persist favorite")?;
    Ok(())
}

/// One page of the feed, newest first. Reads `page_size + 1` rows so the
/// cursor is only handed out when something actually follows.
#[instrument(skip_all, fields(page_size = page_size))]
pub async fn fetch_feed_page(
    pool: &Pool,
    predicate: &FeedPredicate,
    cursor: Option<&Cursor>,
    page_size: u32,
) -> Result<Page> {
    let page_size = page_size.max(1) as usize;
    let after = cursor.map(FeedKey::decode).transpose()?;

    let mut qb = QueryBuilder::<Sqlite>::new(POST_COLUMNS);
    qb.push(" WHERE p.status = ").push_bind(predicate.status.as_str());
    if let Some(tag) = &predicate.tag_contains {
        // instr() keeps the match case-sensitive; LIKE would not.
        qb.push(
            " AND EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.post_id = p.id AND instr(t.name, ",
        )
        .push_bind(tag.clone())
        .push(") > 0)");
    }
    if let Some(viewer) = predicate.followed_by {
        qb.push(
            " AND EXISTS (SELECT 1 FROM follows fl \
             WHERE fl.followee_id = p.user_id AND fl.follower_id = ",
        )
        .push_bind(viewer)
        .push(")");
    }
    if let Some(key) = after {
        qb.push(" AND (p.created_at_ms < ")
            .push_bind(key.created_at_ms)
            .push(" OR (p.created_at_ms = ")
            .push_bind(key.created_at_ms)
            .push(" AND p.id < ")
            .push_bind(key.id)
            .push("))");
    }
    qb.push(" ORDER BY p.created_at_ms DESC, p.id DESC LIMIT ")
        .push_bind(page_size as i64 + 1);

    let rows = qb.build().fetch_all(pool).await?;
    let mut posts: Vec<PostRow> = rows.iter().map(PostRow::from_row).collect();
    let next_cursor = if posts.len() > page_size {
        posts.truncate(page_size);
        posts.last().map(|p| p.key().encode())
    } else {
        None
    };

    let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
    let mut tags = tag_names_for_posts(pool, &ids).await?;
    let items = posts
        .into_iter()
        .map(|p| {
            let names = tags.remove(&p.id).unwrap_or_default();
            p.into_summary(names)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, next_cursor })
}

async fn tag_names_for_posts(
    pool: &Pool,
    post_ids: &[PostId],
) -> Result<HashMap<PostId, BTreeSet<String>>> {
    let mut out: HashMap<PostId, BTreeSet<String>> = HashMap::new();
    if post_ids.is_empty() {
        return Ok(out);
    }
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT pt.post_id, t.name FROM post_tags pt JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id IN (",
    );
    let mut ids = qb.separated(", ");
    for id in post_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");

    for row in qb.build().fetch_all(pool).await? {
        let post_id: PostId = row.get("post_id");
        let name: String = row.get("name");
        out.entry(post_id).or_default().insert(name);
    }
    Ok(out)
}

#[instrument(skip_all)]
pub async fn list_tags(pool: &Pool) -> Result<Vec<Tag>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM tags ORDER BY id ASC")
        .fetch_all(pool)
        .await?;
    Ok(names.into_iter().map(Tag::new).collect())
}

#[instrument(skip_all)]
pub async fn insert_comment(
    pool: &Pool,
    post_id: PostId,
    user_id: UserId,
    content: &str,
) -> Result<Comment> {
    let mut tx = pool.begin().await?;
    let post = sqlx::query_scalar::<_, i64>("SELECT id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;
    if post.is_none() {
        return Err(anyhow!("post {} not found", post_id));
    }
    let author_name = sqlx::query_scalar::<_, Option<String>>("SELECT name FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| anyhow!("user {} not found", user_id))?;

    let created_at_ms = Utc::now().timestamp_millis();
    let id: i64 = sqlx::query(
        "INSERT INTO comments (post_id, user_id, content, created_at_ms) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .bind(created_at_ms)
    .fetch_one(&mut *tx)
    .await?
    .get("id");
    tx.commit().await?;

    Ok(Comment {
        id,
        post_id,
        author: AuthorRef {
            id: user_id,
            name: author_name,
        },
        content: content.to_string(),
        created_at: from_millis(created_at_ms)?,
    })
}

#[instrument(skip_all)]
pub async fn fetch_post_detail(pool: &Pool, post_id: PostId) -> Result<Option<PostDetail>> {
    let row = sqlx::query(&format!("{} WHERE p.id = ?", POST_COLUMNS))
        .bind(post_id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let status_str: String = row.get("status");
    let status = PostStatus::parse_status(&status_str)
        .ok_or_else(|| anyhow!("post {} has unknown status {}", post_id, status_str))?;
    let content: String = row.get("content");
    let mut tags = tag_names_for_posts(pool, &[post_id]).await?;
    let summary = PostRow::from_row(&row).into_summary(tags.remove(&post_id).unwrap_or_default())?;

    let comments = sqlx::query(
        "SELECT c.id, c.user_id, u.name AS author_name, c.content, c.created_at_ms \
         FROM comments c JOIN users u ON u.id = c.user_id \
         WHERE c.post_id = ? ORDER BY c.created_at_ms ASC, c.id ASC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| -> Result<Comment> {
        Ok(Comment {
            id: row.get("id"),
            post_id,
            author: AuthorRef {
                id: row.get("user_id"),
                name: row.try_get::<Option<String>, _>("author_name").ok().flatten(),
            },
            content: row.get("content"),
            created_at: from_millis(row.get("created_at_ms"))?,
        })
    })
    .collect::<Result<Vec<_>>>()?;

    Ok(Some(PostDetail {
        summary,
        status,
        content,
        comments,
    }))
}
