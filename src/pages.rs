//! Accumulated feed pages and the cursor for the next request.

use crate::filter::FeedPredicate;
use crate::model::{Cursor, Page, PostSummary};

/// Where the next page request starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    First,
    After(Cursor),
    Exhausted,
}

/// Pages fetched for a single predicate, in fetch order.
///
/// Items are never reordered or de-duplicated: a post created between two
/// fetches may show up twice and both copies are kept.
#[derive(Debug, Default)]
pub struct PageCursorStore {
    predicate: Option<FeedPredicate>,
    pages: Vec<Page>,
    next: Option<NextPage>,
    epoch: u64,
}

impl PageCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and point the cursor at the first page of `predicate`.
    pub fn reset(&mut self, predicate: FeedPredicate) {
        self.predicate = Some(predicate);
        self.pages.clear();
        self.next = Some(NextPage::First);
        self.epoch += 1;
    }

    pub fn append_page(&mut self, page: Page) {
        self.next = Some(match &page.next_cursor {
            Some(cursor) => NextPage::After(cursor.clone()),
            None => NextPage::Exhausted,
        });
        self.pages.push(page);
    }

    /// Cursor for the next request; `None` once exhausted or before any reset.
    /// `Some(None)` asks for the first page.
    pub fn next_request(&self) -> Option<Option<Cursor>> {
        match self.next.as_ref()? {
            NextPage::First => Some(None),
            NextPage::After(cursor) => Some(Some(cursor.clone())),
            NextPage::Exhausted => None,
        }
    }

    pub fn predicate(&self) -> Option<&FeedPredicate> {
        self.predicate.as_ref()
    }

    /// Bumped on every reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn has_pages(&self) -> bool {
        !self.pages.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.next, Some(NextPage::Exhausted))
    }

    pub fn items(&self) -> impl Iterator<Item = &PostSummary> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::AuthorRef;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    pub(crate) fn post(id: i64) -> PostSummary {
        PostSummary {
            id,
            title: format!("post {id}"),
            author: AuthorRef {
                id: 1,
                name: Some("alice".into()),
            },
            created_at: Utc.timestamp_opt(1_700_000_000 - id, 0).unwrap(),
            tags: BTreeSet::new(),
            favorite_count: 0,
        }
    }

    pub(crate) fn page(ids: &[i64], next: Option<&str>) -> Page {
        Page {
            items: ids.iter().copied().map(post).collect(),
            next_cursor: next.map(Cursor::new),
        }
    }

    #[test]
    fn fresh_store_has_no_request() {
        let store = PageCursorStore::new();
        assert_eq!(store.next_request(), None);
        assert!(!store.is_exhausted());
        assert_eq!(store.epoch(), 0);
    }

    #[test]
    fn reset_requests_first_page() {
        let mut store = PageCursorStore::new();
        store.reset(FeedPredicate::published());
        assert_eq!(store.next_request(), Some(None));
        assert_eq!(store.epoch(), 1);
    }

    #[test]
    fn append_tracks_cursor_and_exhaustion() {
        let mut store = PageCursorStore::new();
        store.reset(FeedPredicate::published());
        store.append_page(page(&[1, 2], Some("c1")));
        assert_eq!(store.next_request(), Some(Some(Cursor::new("c1"))));

        store.append_page(page(&[3], None));
        assert!(store.is_exhausted());
        assert_eq!(store.next_request(), None);
        let ids: Vec<i64> = store.items().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn duplicates_across_pages_are_kept() {
        let mut store = PageCursorStore::new();
        store.reset(FeedPredicate::published());
        store.append_page(page(&[5, 4], Some("c1")));
        store.append_page(page(&[4, 3], None));
        let ids: Vec<i64> = store.items().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 4, 4, 3]);
    }

    #[test]
    fn reset_clears_pages_and_exhaustion() {
        let mut store = PageCursorStore::new();
        store.reset(FeedPredicate::published());
        store.append_page(page(&[1], None));
        assert!(store.is_exhausted());

        let mut tagged = FeedPredicate::published();
        tagged.tag_contains = Some("rust".into());
        store.reset(tagged.clone());
        assert!(!store.has_pages());
        assert!(!store.is_exhausted());
        assert_eq!(store.predicate(), Some(&tagged));
        assert_eq!(store.epoch(), 2);
    }
}
