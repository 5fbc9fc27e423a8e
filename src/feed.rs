//! Incremental feed retrieval.
//!
//! [`FeedController`] is the state machine: it hands out a [`FetchTicket`] for
//! every page it wants and accepts the outcome through [`FeedController::resolve`].
//! A ticket only applies while it is the single outstanding request for the
//! predicate it was issued for, so responses that arrive after a filter change
//! are dropped. [`Feed`] drives the controller from UI commands against a
//! [`PostSource`].

use crate::error::FetchError;
use crate::filter::{self, FeedPredicate};
use crate::model::{Cursor, Page, PostSummary, UserId, ViewMode};
use crate::pages::PageCursorStore;
use crate::session::SessionProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Paged post retrieval. Implementations must return posts newest first and
/// set `next_cursor` to `None` exactly when nothing follows.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_page(
        &self,
        predicate: &FeedPredicate,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> anyhow::Result<Page>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Fetching,
    Ready,
    Exhausted,
}

/// A page request issued by the controller. `cursor == None` asks for the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub predicate: FeedPredicate,
    pub cursor: Option<Cursor>,
    epoch: u64,
    id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The ticket belonged to a superseded request.
    Discarded,
}

/// Read model for the UI.
#[derive(Debug, Clone)]
pub struct FeedView<'a> {
    pub items: Vec<&'a PostSummary>,
    pub is_fetching: bool,
    pub can_load_more: bool,
    pub is_exhausted: bool,
}

#[derive(Debug)]
pub struct FeedController {
    store: PageCursorStore,
    status: FeedStatus,
    in_flight: Option<u64>,
    next_id: u64,
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedController {
    pub fn new() -> Self {
        Self {
            store: PageCursorStore::new(),
            status: FeedStatus::Idle,
            in_flight: None,
            next_id: 0,
        }
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn predicate(&self) -> Option<&FeedPredicate> {
        self.store.predicate()
    }

    pub fn store(&self) -> &PageCursorStore {
        &self.store
    }

    /// Change detector, run after every UI state mutation.
    ///
    /// A structurally different predicate rebuilds the feed from its first page.
    /// The same predicate is a no-op, except while `Idle` where it (re)starts the
    /// first-page fetch.
    pub fn apply_predicate(&mut self, predicate: FeedPredicate) -> Option<FetchTicket> {
        let changed = self.store.predicate() != Some(&predicate);
        if !changed && self.status != FeedStatus::Idle {
            return None;
        }
        if changed {
            info!(?predicate, "feed predicate changed");
        }
        Some(self.begin_first_page(predicate))
    }

    /// Rebuild the current predicate's feed from scratch.
    pub fn restart(&mut self) -> Option<FetchTicket> {
        let predicate = self.store.predicate()?.clone();
        Some(self.begin_first_page(predicate))
    }

    /// Request the next page. Only honoured in `Ready`; anything else is ignored.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.status != FeedStatus::Ready {
            debug!(status = ?self.status, "load more ignored");
            return None;
        }
        let Some(Some(cursor)) = self.store.next_request() else {
            return None;
        };
        let predicate = self.store.predicate()?.clone();
        self.status = FeedStatus::Fetching;
        Some(self.issue(predicate, Some(cursor)))
    }

    /// Apply the outcome of a ticket.
    ///
    /// Stale tickets are discarded whatever their outcome. A failure of the
    /// current ticket leaves the pages untouched and is handed back to the caller.
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page, FetchError>,
    ) -> Result<Resolution, FetchError> {
        if !self.is_current(&ticket) {
            debug!(predicate = ?ticket.predicate, "discarding stale feed response");
            return Ok(Resolution::Discarded);
        }
        self.in_flight = None;
        match result {
            Ok(page) => {
                let count = page.items.len();
                self.store.append_page(page);
                self.status = if self.store.is_exhausted() {
                    FeedStatus::Exhausted
                } else {
                    FeedStatus::Ready
                };
                debug!(count, status = ?self.status, "feed page applied");
                Ok(Resolution::Applied)
            }
            Err(err) => {
                self.status = if self.store.has_pages() {
                    FeedStatus::Ready
                } else {
                    FeedStatus::Idle
                };
                warn!(?err, status = ?self.status, "feed fetch failed");
                Err(err)
            }
        }
    }

    pub fn view(&self) -> FeedView<'_> {
        FeedView {
            items: self.store.items().collect(),
            is_fetching: self.status == FeedStatus::Fetching,
            can_load_more: self.status == FeedStatus::Ready,
            is_exhausted: self.status == FeedStatus::Exhausted,
        }
    }

    fn begin_first_page(&mut self, predicate: FeedPredicate) -> FetchTicket {
        self.store.reset(predicate.clone());
        self.status = FeedStatus::Fetching;
        self.issue(predicate, None)
    }

    fn issue(&mut self, predicate: FeedPredicate, cursor: Option<Cursor>) -> FetchTicket {
        self.next_id += 1;
        self.in_flight = Some(self.next_id);
        FetchTicket {
            predicate,
            cursor,
            epoch: self.store.epoch(),
            id: self.next_id,
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.in_flight == Some(ticket.id)
            && ticket.epoch == self.store.epoch()
            && self.store.predicate() == Some(&ticket.predicate)
    }
}

/// The feed as the page host sees it: tab, tag filter and viewer in, read model out.
pub struct Feed {
    source: Arc<dyn PostSource>,
    page_size: u32,
    view_mode: ViewMode,
    tag_name: String,
    viewer: Option<UserId>,
    controller: FeedController,
}

impl Feed {
    pub fn new(source: Arc<dyn PostSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size,
            view_mode: ViewMode::Global,
            tag_name: String::new(),
            viewer: None,
            controller: FeedController::new(),
        }
    }

    /// Set the initial UI state without fetching; call [`Feed::start`] afterwards.
    pub fn with_state(mut self, view_mode: ViewMode, tag_name: &str, viewer: Option<UserId>) -> Self {
        self.view_mode = view_mode;
        self.tag_name = tag_name.to_string();
        self.viewer = viewer;
        self
    }

    /// Compile the initial predicate and fetch the first page.
    pub async fn start(&mut self) -> Result<(), FetchError> {
        self.recompute().await
    }

    pub async fn set_view_mode(&mut self, mode: ViewMode) -> Result<(), FetchError> {
        self.view_mode = mode;
        self.recompute().await
    }

    pub async fn set_tag_filter(&mut self, tag_name: &str) -> Result<(), FetchError> {
        self.tag_name = tag_name.to_string();
        self.recompute().await
    }

    pub async fn set_viewer(&mut self, viewer: Option<UserId>) -> Result<(), FetchError> {
        self.viewer = viewer;
        self.recompute().await
    }

    pub async fn sync_session(&mut self, session: &dyn SessionProvider) -> Result<(), FetchError> {
        self.set_viewer(session.viewer_id()).await
    }

    pub async fn load_more(&mut self) -> Result<(), FetchError> {
        match self.controller.load_more() {
            Some(ticket) => self.run(ticket).await,
            None => Ok(()),
        }
    }

    pub async fn refetch(&mut self) -> Result<(), FetchError> {
        match self.controller.restart() {
            Some(ticket) => self.run(ticket).await,
            None => self.recompute().await,
        }
    }

    /// The personal tab is only offered to signed-in viewers.
    pub fn personal_available(&self) -> bool {
        self.viewer.is_some()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn tag_filter(&self) -> &str {
        &self.tag_name
    }

    pub fn view(&self) -> FeedView<'_> {
        self.controller.view()
    }

    pub fn controller(&self) -> &FeedController {
        &self.controller
    }

    async fn recompute(&mut self) -> Result<(), FetchError> {
        let predicate = filter::compile(self.view_mode, &self.tag_name, self.viewer);
        match self.controller.apply_predicate(predicate) {
            Some(ticket) => self.run(ticket).await,
            None => Ok(()),
        }
    }

    async fn run(&mut self, ticket: FetchTicket) -> Result<(), FetchError> {
        let result = self
            .source
            .fetch_page(&ticket.predicate, ticket.cursor.as_ref(), self.page_size)
            .await
            .map_err(FetchError::from);
        self.controller.resolve(ticket, result).map(|_| ())
    }
}
