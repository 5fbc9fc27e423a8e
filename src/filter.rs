//! Turns the feed's UI state into the predicate sent to the post source.
//!
//! Compilation is pure: the controller relies on structural equality of two
//! compiled predicates to decide whether the feed has to be rebuilt.

use crate::model::{PostStatus, UserId, ViewMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedPredicate {
    pub status: PostStatus,
    /// Case-sensitive substring matched against the post's tag names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_contains: Option<String>,
    /// Restrict to authors followed by this user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followed_by: Option<UserId>,
}

impl FeedPredicate {
    pub fn published() -> Self {
        Self {
            status: PostStatus::Published,
            tag_contains: None,
            followed_by: None,
        }
    }
}

/// Build the predicate for a feed tab.
///
/// An empty `tag_name` means "no tag filter". `Personal` without a viewer falls
/// back to the global predicate instead of querying for an undefined user.
pub fn compile(view_mode: ViewMode, tag_name: &str, viewer_id: Option<UserId>) -> FeedPredicate {
    let mut predicate = FeedPredicate::published();
    if !tag_name.is_empty() {
        predicate.tag_contains = Some(tag_name.to_string());
    }
    if view_mode == ViewMode::Personal {
        predicate.followed_by = viewer_id;
    }
    predicate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_without_tag_is_published_only() {
        let p = compile(ViewMode::Global, "", None);
        assert_eq!(p, FeedPredicate::published());
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            serde_json::json!({ "status": "published" })
        );
    }

    #[test]
    fn compile_is_idempotent() {
        let inputs = [
            (ViewMode::Global, "", None),
            (ViewMode::Global, "rust", Some(3)),
            (ViewMode::Personal, "", Some(3)),
            (ViewMode::Personal, "go", None),
        ];
        for (mode, tag, viewer) in inputs {
            assert_eq!(compile(mode, tag, viewer), compile(mode, tag, viewer));
        }
    }

    #[test]
    fn personal_without_viewer_falls_back_to_global() {
        assert_eq!(
            compile(ViewMode::Personal, "", None),
            compile(ViewMode::Global, "", None)
        );
        assert_eq!(
            compile(ViewMode::Personal, "rust", None),
            compile(ViewMode::Global, "rust", None)
        );
    }

    #[test]
    fn personal_with_viewer_adds_follow_clause() {
        let p = compile(ViewMode::Personal, "rust", Some(42));
        assert_eq!(p.followed_by, Some(42));
        assert_eq!(p.tag_contains.as_deref(), Some("rust"));
        assert_ne!(p, compile(ViewMode::Global, "rust", Some(42)));
    }

    #[test]
    fn global_ignores_viewer() {
        assert_eq!(
            compile(ViewMode::Global, "", Some(42)),
            compile(ViewMode::Global, "", None)
        );
    }

    #[test]
    fn tag_is_kept_verbatim() {
        let p = compile(ViewMode::Global, "Rust ", None);
        assert_eq!(p.tag_contains.as_deref(), Some("Rust "));
    }
}
