//! Presentation-boundary controller.
//!
//! A [`ListingSession`] owns one engine and drives it from user actions:
//! it fetches through the backend, validates forms before any network call,
//! pre-checks ownership, and reports every outcome as a notification.

use tracing::{info, warn};

use crate::backends::{FetchScope, ImageBlob, ImageChange, ListingBackend};
use crate::engine::ListingEngine;
use crate::error::{ListingError, ListingResult};
use crate::identity::IdentityProvider;
use crate::models::{FilterPatch, ListingId, ListingRecord, OwnerScope, SortKey};
use crate::notifications::NotificationQueue;
use crate::validation::{validate_image, Inquiry, ListingForm};

pub struct ListingSession<B, I> {
    backend: B,
    identity: I,
    engine: ListingEngine,
    notifications: NotificationQueue,
    require_sign_in: bool,
}

impl<B, I> std::fmt::Debug for ListingSession<B, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingSession")
            .field("engine", &self.engine)
            .field("notifications", &self.notifications.len())
            .field("require_sign_in", &self.require_sign_in)
            .finish()
    }
}

impl<B: ListingBackend, I: IdentityProvider> ListingSession<B, I> {
    pub fn new(backend: B, identity: I, mut engine: ListingEngine) -> Self {
        engine.set_current_user(identity.current_user_id());
        Self {
            backend,
            identity,
            engine,
            notifications: NotificationQueue::default(),
            require_sign_in: false,
        }
    }

    /// Refuse to publish, edit or delete without a signed-in user
    pub fn requiring_sign_in(mut self) -> Self {
        self.require_sign_in = true;
        self
    }

    pub fn engine(&self) -> &ListingEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ListingEngine {
        &mut self.engine
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationQueue {
        &mut self.notifications
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    fn fetch_scope(&self) -> FetchScope {
        match (self.engine.filters().owner_scope, self.engine.current_user()) {
            (OwnerScope::Mine, Some(user)) => FetchScope::OwnedBy(user.to_string()),
            _ => FetchScope::All,
        }
    }

    /// Surface an error to the user and hand it back
    fn report(&mut self, err: ListingError) -> ListingError {
        self.notifications.error(err.user_message());
        err
    }

    /// Fetch the current scope and load it into the engine.
    ///
    /// On failure the previous view stays in place.
    pub async fn refresh(&mut self) -> ListingResult<()> {
        let scope = self.fetch_scope();
        let ticket = self.engine.begin_fetch();

        let fetched = self.backend.fetch_listings(&scope).await;
        match fetched {
            Ok(records) => {
                info!(
                    backend = self.backend.backend_name(),
                    count = records.len(),
                    "Loaded listings"
                );
                self.engine.load_fetched(ticket, records);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to load listings");
                Err(self.report(err))
            }
        }
    }

    /// Merge filter changes; refetches only when the scope changed
    pub async fn apply_filters(&mut self, patch: FilterPatch) -> ListingResult<()> {
        let scope_changed = patch
            .owner_scope
            .is_some_and(|scope| scope != self.engine.filters().owner_scope);
        self.engine.set_filters(patch);
        if scope_changed {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Reset every filter and the sort order
    pub fn clear_filters(&mut self) {
        self.engine.set_sort(SortKey::None);
        self.engine.set_filters(FilterPatch::clear());
    }

    pub fn change_sort(&mut self, key: SortKey) {
        self.engine.set_sort(key);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.engine.set_page(page);
    }

    /// Switch between all listings and the user's own
    pub async fn toggle_scope(&mut self) -> ListingResult<OwnerScope> {
        let next = match self.engine.filters().owner_scope {
            OwnerScope::All => OwnerScope::Mine,
            OwnerScope::Mine => OwnerScope::All,
        };
        if next == OwnerScope::Mine && self.engine.current_user().is_none() {
            self.notifications.info("Sign in to see your listings.");
            return Ok(OwnerScope::All);
        }
        self.apply_filters(FilterPatch::default().scope(next)).await?;
        Ok(next)
    }

    /// Pick up a sign-in or sign-out and reload
    pub async fn identity_changed(&mut self) -> ListingResult<()> {
        let user = self.identity.current_user_id();
        if user.is_none() && self.engine.filters().owner_scope == OwnerScope::Mine {
            self.engine.set_filters(FilterPatch::default().scope(OwnerScope::All));
        }
        self.engine.set_current_user(user);
        self.refresh().await
    }

    fn acting_user(&self) -> ListingResult<Option<String>> {
        let user = self.identity.current_user_id();
        if self.require_sign_in && user.is_none() {
            return Err(ListingError::validation(
                "user",
                "You need to sign in to manage listings.",
            ));
        }
        Ok(user)
    }

    /// Client-side ownership pre-check; the backend re-checks
    fn check_can_modify(&self, id: &ListingId, user: Option<&str>) -> ListingResult<()> {
        let record = self
            .engine
            .find(id)
            .ok_or_else(|| ListingError::NotFound { id: id.clone() })?;
        if record.owner_id.is_some() && !record.is_owned_by(user) {
            return Err(ListingError::Permission { id: id.clone() });
        }
        Ok(())
    }

    /// Refresh after a successful mutation; failures were already reported
    async fn refresh_after_mutation(&mut self) {
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "Refresh after mutation failed");
        }
    }

    /// Validate and create a listing
    pub async fn publish(
        &mut self,
        form: &ListingForm,
        image: Option<ImageBlob>,
    ) -> ListingResult<ListingRecord> {
        let user = self.acting_user().map_err(|e| self.report(e))?;
        let mut draft = form.parse().map_err(|e| self.report(e))?;
        if let Some(image) = &image {
            validate_image(image).map_err(|e| self.report(e))?;
        }
        draft.owner_id = user;

        let created = self.backend.create_listing(&draft, image.as_ref()).await;
        let record = created.map_err(|e| self.report(e))?;

        info!(id = %record.id, "Published listing");
        self.notifications.success("Listing published.");
        self.refresh_after_mutation().await;
        Ok(record)
    }

    /// Validate and replace an existing listing
    pub async fn edit(
        &mut self,
        id: &ListingId,
        form: &ListingForm,
        image: ImageChange,
    ) -> ListingResult<ListingRecord> {
        let user = self.acting_user().map_err(|e| self.report(e))?;
        self.check_can_modify(id, user.as_deref())
            .map_err(|e| self.report(e))?;
        let mut draft = form.parse().map_err(|e| self.report(e))?;
        if let ImageChange::Replace(blob) = &image {
            validate_image(blob).map_err(|e| self.report(e))?;
        }
        draft.owner_id = user;

        let updated = self.backend.update_listing(id, &draft, &image).await;
        let record = updated.map_err(|e| self.report(e))?;

        info!(id = %record.id, "Updated listing");
        self.notifications.success("Listing updated.");
        self.refresh_after_mutation().await;
        Ok(record)
    }

    pub async fn remove(&mut self, id: &ListingId) -> ListingResult<()> {
        let user = self.acting_user().map_err(|e| self.report(e))?;
        self.check_can_modify(id, user.as_deref())
            .map_err(|e| self.report(e))?;

        let deleted = self.backend.delete_listing(id, user.as_deref()).await;
        deleted.map_err(|e| self.report(e))?;

        info!(%id, "Deleted listing");
        self.notifications.info("Listing deleted.");
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Validate an inquiry to a listing's publisher
    pub fn send_inquiry(&mut self, id: &ListingId, inquiry: &Inquiry) -> ListingResult<Inquiry> {
        let inquiry = inquiry.normalized().map_err(|e| self.report(e))?;
        let title = match self.engine.find(id) {
            Some(record) => record.title.clone(),
            None => return Err(self.report(ListingError::NotFound { id: id.clone() })),
        };

        info!(
            listing = %title,
            from = %inquiry.email,
            "Inquiry sent"
        );
        self.notifications
            .success("Inquiry sent. The publisher will get in touch soon.");
        Ok(inquiry)
    }
}
