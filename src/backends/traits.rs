use async_trait::async_trait;

use crate::backends::types::{FetchScope, ImageBlob, ImageChange};
use crate::error::ListingResult;
use crate::models::{ListingId, ListingRecord};
use crate::validation::ListingDraft;

/// Common trait for every listing backend.
///
/// The engine never talks to a backend directly; the session fetches through
/// this trait and hands the records over.
#[async_trait]
pub trait ListingBackend: Send + Sync {
    /// Fetch every listing in `scope`
    async fn fetch_listings(&self, scope: &FetchScope) -> ListingResult<Vec<ListingRecord>>;

    /// Create a listing, uploading `image` alongside it
    async fn create_listing(
        &self,
        draft: &ListingDraft,
        image: Option<&ImageBlob>,
    ) -> ListingResult<ListingRecord>;

    /// Replace a listing's data; `draft.owner_id` is the acting user
    async fn update_listing(
        &self,
        id: &ListingId,
        draft: &ListingDraft,
        image: &ImageChange,
    ) -> ListingResult<ListingRecord>;

    async fn delete_listing(&self, id: &ListingId, acting_user: Option<&str>) -> ListingResult<()>;

    /// Get the name of the backend
    fn backend_name(&self) -> &'static str;
}
