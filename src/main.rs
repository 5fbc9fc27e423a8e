use anyhow::{anyhow, Result};
use blog_feed::comments::{CommentSubmission, PostDetailView};
use blog_feed::config;
use blog_feed::db::{self, SqliteStore};
use blog_feed::feed::Feed;
use blog_feed::model::{PostDetail, PostSummary, ViewMode};
use blog_feed::session::{SessionProvider, StaticSession};
use blog_feed::tags::TagIndex;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Walk the feed page by page
    Feed {
        /// Show the personal feed (requires --viewer)
        #[arg(long)]
        personal: bool,
        /// Only posts with a tag containing this text
        #[arg(long, default_value = "")]
        tag: String,
        /// Signed-in user id
        #[arg(long)]
        viewer: Option<i64>,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Print items as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tags, optionally narrowed by a search string
    Tags {
        #[arg(long, default_value = "")]
        query: String,
        /// Tag the feed is currently filtered by
        #[arg(long, default_value = "")]
        active: String,
    },
    /// Show a post with its comments
    Post { id: i64 },
    /// Add a comment to a post
    Comment {
        post_id: i64,
        /// Signed-in user id
        #[arg(long)]
        author: Option<i64>,
        #[arg(long)]
        content: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;
    let store = Arc::new(SqliteStore::new(pool));

    match args.command {
        Command::Feed {
            personal,
            tag,
            viewer,
            pages,
            json,
        } => {
            let session = StaticSession::from(viewer);
            let view_mode = if personal {
                ViewMode::Personal
            } else {
                cfg.feed.default_view
            };
            if view_mode == ViewMode::Personal && session.viewer_id().is_none() {
                warn!("personal feed needs a viewer; showing the global feed");
            }
            let mut feed = Feed::new(store.clone(), cfg.feed.page_size).with_state(
                view_mode,
                &tag,
                session.viewer_id(),
            );
            feed.start().await?;
            for _ in 1..pages {
                if !feed.view().can_load_more {
                    break;
                }
                feed.load_more().await?;
            }

            let view = feed.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&view.items)?);
            } else {
                for post in &view.items {
                    print_summary(post);
                }
            }
            info!(
                items = view.items.len(),
                status = ?feed.controller().status(),
                "feed loaded"
            );
            if view.is_exhausted {
                println!("That's all folks :)");
            }
        }
        Command::Tags { query, active } => {
            let index = TagIndex::load(store.as_ref()).await?;
            for entry in index.entries(&query, &active) {
                let marker = if entry.is_active { "*" } else { " " };
                println!("{} #{}", marker, entry.name);
            }
        }
        Command::Post { id } => {
            let mut view = PostDetailView::new(id, store.clone());
            let detail = view
                .refresh()
                .await?
                .ok_or_else(|| anyhow!("post {} not found", id))?;
            print_detail(detail);
        }
        Command::Comment {
            post_id,
            author,
            content,
        } => {
            let session = StaticSession::from(author);
            let comment = CommentSubmission::new(store.clone())
                .submit(post_id, session.viewer_id(), &content)
                .await?;
            info!(comment_id = comment.id, post_id, "comment added");

            let mut view = PostDetailView::new(post_id, store.clone());
            if let Some(detail) = view.refresh().await? {
                print_detail(detail);
            }
        }
    }

    Ok(())
}

fn print_summary(post: &PostSummary) {
    let tags: Vec<String> = post.tags.iter().map(|t| format!("#{}", t)).collect();
    println!(
        "{}\t{}\t{}\tby {}\t{}\t♥ {}",
        post.id,
        post.created_at.format("%Y-%m-%d %H:%M"),
        post.title,
        post.author.name.as_deref().unwrap_or("anonymous"),
        tags.join(" "),
        post.favorite_count
    );
}

fn print_detail(detail: &PostDetail) {
    print_summary(&detail.summary);
    println!();
    println!("{}", detail.content);
    println!();
    println!("Comments ({}):", detail.comments.len());
    for c in &detail.comments {
        println!(
            "- {} ({}): {}",
            c.author.name.as_deref().unwrap_or(""),
            c.created_at.format("%Y-%m-%d %H:%M"),
            c.content
        );
    }
}
