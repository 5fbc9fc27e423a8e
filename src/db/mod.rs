//! Database module: SQLite-backed collaborators for the feed core.
//!
//! - `model`: row models and the feed cursor codec.
//! - `repo`: SQL-only functions that map rows into domain types.
//! - `store`: [`SqliteStore`], which plugs the repository into the feed,
//!   tag and comment traits.
//!
//! External modules should import from `blog_feed::db`; the repository API is
//! re-exported here.

pub mod model;
pub mod repo;
pub mod store;

pub use repo::*;
pub use store::SqliteStore;
