use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backends::traits::ListingBackend;
use crate::backends::types::{FetchScope, ImageBlob, ImageChange};
use crate::error::{ListingError, ListingResult};
use crate::models::{ListingId, ListingRecord};
use crate::validation::ListingDraft;

#[derive(Debug, Default)]
struct Store {
    records: Vec<ListingRecord>,
    next_id: i64,
}

/// Listing backend kept in process memory.
///
/// Enforces ownership on update and delete the way a real server would.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
    fail_next_fetch: AtomicBool,
    fetches: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ListingRecord>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|record| match record.id {
                ListingId::Number(n) => Some(n),
                ListingId::Text(_) => None,
            })
            .max()
            .unwrap_or(0);

        Self {
            store: Mutex::new(Store { records, next_id }),
            ..Self::default()
        }
    }

    /// Make the next fetch fail with a transport error
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Number of fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<ListingRecord> {
        self.store.lock().await.records.clone()
    }

    fn image_url(image: &ImageBlob) -> String {
        format!(
            "memory://images/departments/{}_{}",
            Utc::now().timestamp_millis(),
            image.file_name
        )
    }

    fn ensure_owner(record: &ListingRecord, acting_user: Option<&str>) -> ListingResult<()> {
        match &record.owner_id {
            Some(_) if !record.is_owned_by(acting_user) => Err(ListingError::Permission {
                id: record.id.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Backend preloaded with a handful of sample listings
    pub fn with_sample_listings() -> Self {
        info!("📋 Loading sample department listings");

        let sample = |id: i64,
                      title: &str,
                      location: &str,
                      price: f64,
                      bedrooms: u32,
                      bathrooms: f64,
                      description: &str,
                      owner: Option<&str>| ListingRecord {
            id: ListingId::Number(id),
            title: title.to_string(),
            location: location.to_string(),
            contact: "info@inmobiliaria.example".to_string(),
            price: Some(price),
            bedrooms: Some(bedrooms),
            bathrooms: Some(bathrooms),
            description: description.to_string(),
            image_url: None,
            owner_id: owner.map(str::to_string),
            created_at: Some(Utc::now()),
        };

        Self::with_records(vec![
            sample(1, "Monoambiente luminoso", "Palermo, CABA", 350.0, 1, 1.0,
                "A metros del subte, ideal estudiantes.", Some("demo-user")),
            sample(2, "Departamento frente a la playa", "Mar del Plata", 900.0, 2, 1.0,
                "Vista al mar, balcón corrido.", None),
            sample(3, "Dúplex con terraza", "Nueva Córdoba", 650.0, 3, 2.0,
                "Terraza propia con parrilla.", Some("demo-user")),
            sample(4, "Tres ambientes reciclado", "Rosario Centro", 480.0, 2, 1.5,
                "Cocina integrada, pisos de madera.", None),
            sample(5, "Casa de playa", "Pinamar", 1200.0, 4, 2.5,
                "A dos cuadras del mar, pileta.", None),
            sample(6, "Loft industrial", "San Telmo, CABA", 700.0, 1, 1.0,
                "Doble altura, cerca de la feria.", None),
            sample(7, "Departamento familiar", "Mendoza", 550.0, 3, 2.0,
                "Cochera y baulera incluidas.", Some("other-user")),
            sample(8, "Dos ambientes con balcón", "La Plata", 400.0, 1, 1.0,
                "Frente a plaza, muy luminoso.", None),
        ])
    }
}

#[async_trait]
impl ListingBackend for InMemoryBackend {
    async fn fetch_listings(&self, scope: &FetchScope) -> ListingResult<Vec<ListingRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            warn!("Simulated fetch failure");
            return Err(ListingError::Transport {
                operation: "fetch listings",
                status: None,
                message: "simulated outage".to_string(),
            });
        }

        let store = self.store.lock().await;
        let records: Vec<ListingRecord> = match scope {
            FetchScope::All => store.records.clone(),
            FetchScope::OwnedBy(owner) => store
                .records
                .iter()
                .filter(|record| record.is_owned_by(Some(owner)))
                .cloned()
                .collect(),
        };
        debug!("Serving {} listings from memory", records.len());
        Ok(records)
    }

    async fn create_listing(
        &self,
        draft: &ListingDraft,
        image: Option<&ImageBlob>,
    ) -> ListingResult<ListingRecord> {
        let mut store = self.store.lock().await;
        store.next_id += 1;

        let record = ListingRecord {
            id: ListingId::Number(store.next_id),
            title: draft.title.clone(),
            location: draft.location.clone(),
            contact: draft.contact.clone(),
            price: Some(draft.price),
            bedrooms: Some(draft.bedrooms),
            bathrooms: Some(draft.bathrooms),
            description: draft.description.clone(),
            image_url: image.map(Self::image_url),
            owner_id: draft.owner_id.clone(),
            created_at: Some(Utc::now()),
        };
        store.records.push(record.clone());
        Ok(record)
    }

    async fn update_listing(
        &self,
        id: &ListingId,
        draft: &ListingDraft,
        image: &ImageChange,
    ) -> ListingResult<ListingRecord> {
        let mut store = self.store.lock().await;
        let existing = store
            .records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| ListingError::NotFound { id: id.clone() })?;
        Self::ensure_owner(existing, draft.owner_id.as_deref())?;

        let image_url = match image {
            ImageChange::Keep => existing.image_url.clone(),
            ImageChange::Replace(blob) => Some(Self::image_url(blob)),
            ImageChange::Remove => None,
        };

        *existing = ListingRecord {
            id: existing.id.clone(),
            title: draft.title.clone(),
            location: draft.location.clone(),
            contact: draft.contact.clone(),
            price: Some(draft.price),
            bedrooms: Some(draft.bedrooms),
            bathrooms: Some(draft.bathrooms),
            description: draft.description.clone(),
            image_url,
            owner_id: existing.owner_id.clone(),
            created_at: existing.created_at,
        };
        Ok(existing.clone())
    }

    async fn delete_listing(&self, id: &ListingId, acting_user: Option<&str>) -> ListingResult<()> {
        let mut store = self.store.lock().await;
        let index = store
            .records
            .iter()
            .position(|record| &record.id == id)
            .ok_or_else(|| ListingError::NotFound { id: id.clone() })?;
        Self::ensure_owner(&store.records[index], acting_user)?;

        store.records.remove(index);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(owner: Option<&str>) -> ListingDraft {
        ListingDraft {
            title: "Nuevo".to_string(),
            location: "Tigre".to_string(),
            contact: "555-1234".to_string(),
            price: 300.0,
            bedrooms: 1,
            bathrooms: 1.0,
            description: "Sobre el río".to_string(),
            owner_id: owner.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let backend = InMemoryBackend::with_sample_listings();
        let created = backend.create_listing(&draft(None), None).await.unwrap();

        assert_eq!(created.id, ListingId::Number(9));
        assert!(created.created_at.is_some());
        assert_eq!(backend.snapshot().await.len(), 9);
    }

    #[tokio::test]
    async fn test_owned_by_scope() {
        let backend = InMemoryBackend::with_sample_listings();
        let mine = backend
            .fetch_listings(&FetchScope::OwnedBy("demo-user".to_string()))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
    }

    #[tokio::test]
    async fn test_update_enforces_owner_and_keeps_created_at() {
        let backend = InMemoryBackend::with_sample_listings();
        let id = ListingId::Number(1);
        let before = backend.snapshot().await[0].created_at;

        let denied = backend
            .update_listing(&id, &draft(Some("intruder")), &ImageChange::Keep)
            .await;
        assert!(matches!(denied, Err(ListingError::Permission { .. })));

        let updated = backend
            .update_listing(&id, &draft(Some("demo-user")), &ImageChange::Keep)
            .await
            .unwrap();
        assert_eq!(updated.title, "Nuevo");
        assert_eq!(updated.owner_id.as_deref(), Some("demo-user"));
        assert_eq!(updated.created_at, before);
    }

    #[tokio::test]
    async fn test_replace_and_remove_image() {
        let backend = InMemoryBackend::with_sample_listings();
        let id = ListingId::Number(2);

        let replaced = backend
            .update_listing(
                &id,
                &draft(None),
                &ImageChange::Replace(ImageBlob::new("mar.png", vec![1])),
            )
            .await
            .unwrap();
        assert!(replaced.image_url.unwrap().ends_with("_mar.png"));

        let removed = backend
            .update_listing(&id, &draft(None), &ImageChange::Remove)
            .await
            .unwrap();
        assert!(removed.image_url.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let backend = InMemoryBackend::new();
        let result = backend.delete_listing(&ListingId::Number(42), None).await;
        assert!(matches!(result, Err(ListingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_simulated_failure_is_one_shot() {
        let backend = InMemoryBackend::with_sample_listings();
        backend.fail_next_fetch();

        assert!(backend.fetch_listings(&FetchScope::All).await.is_err());
        assert!(backend.fetch_listings(&FetchScope::All).await.is_ok());
        assert_eq!(backend.fetch_count(), 2);
    }
}
