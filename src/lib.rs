//! Client-side engine for browsing, filtering and managing apartment listings.

pub mod backends;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod models;
pub mod notifications;
pub mod session;
pub mod validation;

pub use backends::{FetchScope, ImageBlob, ImageChange, InMemoryBackend, ListingBackend, RestBackend};
pub use config::Config;
pub use engine::{search_highlight, CountPolicy, DerivedView, ListingEngine, PaginationMetadata};
pub use error::{FieldErrors, ListingError, ListingResult};
pub use identity::{IdentityProvider, WatchIdentity};
pub use models::{FilterParams, FilterPatch, ListingId, ListingRecord, OwnerScope, SortKey};
pub use notifications::{Notification, NotificationLevel, NotificationQueue};
pub use session::ListingSession;
pub use validation::{Inquiry, ListingDraft, ListingForm};
