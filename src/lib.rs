//! Feed query composition and incremental pagination for a social blogging site.
//!
//! The core is storage-agnostic: [`filter`] compiles UI state into a
//! [`filter::FeedPredicate`], [`feed`] pages through a [`feed::PostSource`],
//! [`tags`] narrows the tag sidebar and [`comments`] validates new comments.
//! [`db`] is the SQLite implementation of every collaborator trait.

pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod filter;
pub mod model;
pub mod pages;
pub mod session;
pub mod tags;

pub use error::{CommentError, FetchError};
pub use feed::{Feed, FeedController, FeedStatus, FeedView, PostSource};
pub use filter::{compile, FeedPredicate};
