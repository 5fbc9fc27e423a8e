//! Tag sidebar: the full tag list, narrowed by a live search box.

use crate::model::Tag;
use async_trait::async_trait;
use tracing::instrument;

#[async_trait]
pub trait TagSource: Send + Sync {
    /// All tags in one unpaginated call.
    async fn fetch_all_tags(&self) -> anyhow::Result<Vec<Tag>>;
}

/// Tags whose name contains `query`, in their original order.
///
/// Matching is case-sensitive, the same as the feed's tag predicate, so a tag
/// shown here yields results when selected.
pub fn filter(tags: &[Tag], query: &str) -> Vec<Tag> {
    tags.iter()
        .filter(|t| t.name.contains(query))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub name: String,
    /// The tag the feed is currently filtered by.
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    tags: Vec<Tag>,
}

impl TagIndex {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self { tags }
    }

    #[instrument(skip_all)]
    pub async fn load(source: &dyn TagSource) -> anyhow::Result<Self> {
        Ok(Self::new(source.fetch_all_tags().await?))
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn search(&self, query: &str) -> Vec<Tag> {
        filter(&self.tags, query)
    }

    pub fn entries(&self, query: &str, active_tag: &str) -> Vec<TagEntry> {
        self.tags
            .iter()
            .filter(|t| t.name.contains(query))
            .map(|t| TagEntry {
                name: t.name.clone(),
                is_active: !active_tag.is_empty() && t.name == active_tag,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<Tag> {
        names.iter().map(|n| Tag::new(*n)).collect()
    }

    struct FixedTags(Vec<Tag>);

    #[async_trait]
    impl TagSource for FixedTags {
        async fn fetch_all_tags(&self) -> anyhow::Result<Vec<Tag>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn substring_match() {
        let all = tags(&["go", "golang", "rust"]);
        assert_eq!(filter(&all, "go"), tags(&["go", "golang"]));
        assert_eq!(filter(&all, "lang"), tags(&["golang"]));
        assert!(filter(&all, "zig").is_empty());
    }

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let all = tags(&["rust", "go", "async"]);
        assert_eq!(filter(&all, ""), all);
    }

    #[test]
    fn match_is_case_sensitive() {
        let all = tags(&["Rust", "rust"]);
        assert_eq!(filter(&all, "rust"), tags(&["rust"]));
        assert_eq!(filter(&all, "R"), tags(&["Rust"]));
    }

    #[test]
    fn entries_mark_active_tag() {
        let index = TagIndex::new(tags(&["go", "golang", "rust"]));
        let entries = index.entries("go", "golang");
        assert_eq!(
            entries,
            vec![
                TagEntry {
                    name: "go".into(),
                    is_active: false
                },
                TagEntry {
                    name: "golang".into(),
                    is_active: true
                },
            ]
        );
        assert!(index.entries("", "").iter().all(|e| !e.is_active));
    }

    #[tokio::test]
    async fn load_from_source() {
        let index = TagIndex::load(&FixedTags(tags(&["a", "b"]))).await.unwrap();
        assert_eq!(index.tags().len(), 2);
        assert_eq!(index.search("b"), tags(&["b"]));
    }
}
