//! The filter → sort → paginate pipeline.
//!
//! Everything in here is a pure function of the record set and a
//! [`ViewState`]; the engine owns the state and caches the output.

use serde::Serialize;

use super::highlight::{search_highlight, Highlighted};
use super::pagination::{CountPolicy, PaginationMetadata, PaginationState};
use crate::models::{FilterParams, ListingRecord, OwnerScope, SortKey};

/// Every input of a derivation besides the records themselves
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub filters: FilterParams,
    pub pagination: PaginationState,
    pub current_user: Option<String>,
    pub count_policy: CountPolicy,
}

impl ViewState {
    pub fn new(page_size: usize, count_policy: CountPolicy) -> Self {
        Self {
            filters: FilterParams::default(),
            pagination: PaginationState::new(page_size),
            current_user: None,
            count_policy,
        }
    }
}

/// A record on the visible page with its search highlights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleListing {
    pub record: ListingRecord,
    pub title: Highlighted,
    pub location: Highlighted,
    pub description: Highlighted,
}

impl VisibleListing {
    fn new(record: &ListingRecord, term: &str) -> Self {
        Self {
            title: search_highlight(&record.title, term),
            location: search_highlight(&record.location, term),
            description: search_highlight(&record.description, term),
            record: record.clone(),
        }
    }
}

/// Output of one derivation
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedView {
    pub listings: Vec<VisibleListing>,
    pub pagination: PaginationMetadata,
    /// Records that passed the filters, before slicing
    pub matched_count: usize,
    /// Normalized term the highlights were computed with
    pub search_term: String,
}

impl DerivedView {
    pub fn records(&self) -> impl Iterator<Item = &ListingRecord> {
        self.listings.iter().map(|l| &l.record)
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Whether `record` passes every active filter
pub fn matches(
    record: &ListingRecord,
    filters: &FilterParams,
    term: &str,
    current_user: Option<&str>,
) -> bool {
    let text_match = term.is_empty()
        || [&record.title, &record.location, &record.description]
            .iter()
            .any(|field| field.to_lowercase().contains(term));

    let bedrooms_match = filters.min_bedrooms == 0
        || record
            .bedrooms
            .is_some_and(|bedrooms| bedrooms >= filters.min_bedrooms);

    let min_price_match = filters
        .min_price
        .map_or(true, |min| record.price.is_some_and(|price| price >= min));
    let max_price_match = filters
        .max_price
        .map_or(true, |max| record.price.is_some_and(|price| price <= max));

    let owner_match = match filters.owner_scope {
        OwnerScope::All => true,
        OwnerScope::Mine => record.is_owned_by(current_user),
    };

    text_match && bedrooms_match && min_price_match && max_price_match && owner_match
}

fn sort_value(record: &ListingRecord, key: SortKey) -> f64 {
    match key {
        SortKey::PriceAsc | SortKey::PriceDesc => record.price.unwrap_or(0.0),
        SortKey::BedroomsAsc | SortKey::BedroomsDesc => {
            f64::from(record.bedrooms.unwrap_or(0))
        }
        SortKey::None => 0.0,
    }
}

/// Stable sort; equal keys keep their relative order
pub fn sort_listings(listings: &mut [&ListingRecord], key: SortKey) {
    let descending = match key {
        SortKey::None => return,
        SortKey::PriceAsc | SortKey::BedroomsAsc => false,
        SortKey::PriceDesc | SortKey::BedroomsDesc => true,
    };
    listings.sort_by(|a, b| {
        let ordering = sort_value(a, key).total_cmp(&sort_value(b, key));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Filter, sort and slice `records` according to `state`.
///
/// The returned metadata carries the total count selected by the state's
/// [`CountPolicy`]. The page number is used as given; clamping is the
/// caller's job.
pub fn derive(records: &[ListingRecord], state: &ViewState) -> DerivedView {
    let term = state.filters.normalized_term();
    let current_user = state.current_user.as_deref();

    let mut filtered: Vec<&ListingRecord> = records
        .iter()
        .filter(|record| matches(record, &state.filters, &term, current_user))
        .collect();
    sort_listings(&mut filtered, state.filters.sort_key);

    let mut pagination = state.pagination.clone();
    pagination.total_count = match state.count_policy {
        CountPolicy::Filtered => filtered.len(),
        CountPolicy::Raw => records.len(),
    };

    let listings = filtered[pagination.window(filtered.len())]
        .iter()
        .map(|record| VisibleListing::new(record, &term))
        .collect();

    DerivedView {
        listings,
        pagination: pagination.metadata(),
        matched_count: filtered.len(),
        search_term: term,
    }
}
