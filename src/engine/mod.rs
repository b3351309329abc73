//! Listing view-state engine.
//!
//! Owns the full record set of the last applied fetch together with the
//! filter, sort and page parameters, and re-derives the visible page after
//! every change. Subscribers are called with each new [`DerivedView`].

pub mod derive;
pub mod highlight;
pub mod pagination;

use std::fmt;
use tracing::{debug, warn};

use crate::models::{FilterParams, FilterPatch, ListingId, ListingRecord, SortKey};

pub use derive::{derive, matches, sort_listings, DerivedView, ViewState, VisibleListing};
pub use highlight::{search_highlight, Highlighted, Segment};
pub use pagination::{
    page_window, CountPolicy, PaginationMetadata, PaginationState, DEFAULT_PAGE_SIZE,
};

/// Generation number handed out when a fetch starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

pub type Subscriber = Box<dyn FnMut(&DerivedView) + Send>;

pub struct ListingEngine {
    records: Vec<ListingRecord>,
    state: ViewState,
    view: DerivedView,
    issued: u64,
    applied: u64,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for ListingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingEngine")
            .field("records", &self.records.len())
            .field("state", &self.state)
            .field("issued", &self.issued)
            .field("applied", &self.applied)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for ListingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListingEngine {
    pub fn new(page_size: usize) -> Self {
        Self::with_count_policy(page_size, CountPolicy::default())
    }

    pub fn with_count_policy(page_size: usize, count_policy: CountPolicy) -> Self {
        let state = ViewState::new(page_size, count_policy);
        let view = derive(&[], &state);
        Self {
            records: Vec::new(),
            state,
            view,
            issued: 0,
            applied: 0,
            subscribers: Vec::new(),
        }
    }

    /// Register a callback run after every derivation
    pub fn subscribe(&mut self, subscriber: impl FnMut(&DerivedView) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Replace the full record set and re-derive.
    ///
    /// Counts as the newest generation, so fetches still in flight are stale.
    pub fn load_all(&mut self, records: Vec<ListingRecord>) {
        self.issued += 1;
        self.applied = self.issued;
        self.replace_records(records);
    }

    /// Start a fetch; pass the ticket back to [`Self::load_fetched`]
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Apply a fetch result unless a newer one has already been applied.
    ///
    /// Returns whether the records were applied.
    pub fn load_fetched(&mut self, ticket: FetchTicket, records: Vec<ListingRecord>) -> bool {
        if ticket.0 < self.applied {
            warn!(
                ticket = ticket.0,
                applied = self.applied,
                "Discarding stale listing fetch"
            );
            return false;
        }
        self.applied = ticket.0;
        self.replace_records(records);
        true
    }

    /// Merge `patch` into the filters and go back to page 1
    pub fn set_filters(&mut self, patch: FilterPatch) {
        self.state.filters.apply(&patch);
        self.state.pagination.current_page = 1;
        self.refresh_view();
    }

    /// Change the ordering; the current page is kept
    pub fn set_sort(&mut self, key: SortKey) {
        self.state.filters.sort_key = key;
        self.refresh_view();
    }

    /// Jump to `page`, clamped into the valid range
    pub fn set_page(&mut self, page: usize) {
        self.state.pagination.current_page = self.state.pagination.clamp(page);
        self.refresh_view();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.state.pagination.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.state.pagination.current_page.saturating_sub(1));
    }

    /// The acting user changed; affects the `Mine` scope
    pub fn set_current_user(&mut self, user: Option<String>) {
        if self.state.current_user == user {
            return;
        }
        self.state.current_user = user;
        self.refresh_view();
    }

    /// Recompute the visible page without touching the cache
    pub fn derive(&self) -> DerivedView {
        derive(&self.records, &self.state)
    }

    /// Last derived view
    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn find(&self, id: &ListingId) -> Option<&ListingRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn filters(&self) -> &FilterParams {
        &self.state.filters
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn current_page(&self) -> usize {
        self.state.pagination.current_page
    }

    pub fn current_user(&self) -> Option<&str> {
        self.state.current_user.as_deref()
    }

    fn replace_records(&mut self, records: Vec<ListingRecord>) {
        self.state.pagination.total_count = records.len();
        self.records = records;
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        let mut view = derive(&self.records, &self.state);
        self.state.pagination.total_count = view.pagination.total_count;

        // A shrinking record set can leave the page past the end
        let clamped = self.state.pagination.clamp(self.state.pagination.current_page);
        if clamped != self.state.pagination.current_page {
            self.state.pagination.current_page = clamped;
            view = derive(&self.records, &self.state);
        }

        debug!(
            visible = view.listings.len(),
            matched = view.matched_count,
            page = view.pagination.current_page,
            total_pages = view.pagination.total_pages,
            "Derived listing view"
        );

        for subscriber in &mut self.subscribers {
            subscriber(&view);
        }
        self.view = view;
    }
}
