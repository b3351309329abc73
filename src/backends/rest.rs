use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backends::traits::ListingBackend;
use crate::backends::types::{FetchScope, ImageBlob, ImageChange};
use crate::error::{FieldErrors, ListingError, ListingResult};
use crate::models::{ListingId, ListingRecord};
use crate::validation::ListingDraft;

/// Body the API sends with a 400
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

/// Listings backend speaking the `/api/departments` REST API
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    /// Create a backend for the API rooted at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("housing-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection_url(&self) -> String {
        format!("{}/api/departments", self.base_url)
    }

    fn item_url(&self, id: &ListingId) -> String {
        format!("{}/api/departments/{}", self.base_url, id)
    }

    /// Multipart form carrying every draft field
    fn draft_form(draft: &ListingDraft) -> Form {
        let form = Form::new()
            .text("title", draft.title.clone())
            .text("location", draft.location.clone())
            .text("contact", draft.contact.clone())
            .text("price", draft.price.to_string())
            .text("bedrooms", draft.bedrooms.to_string())
            .text("bathrooms", draft.bathrooms.to_string())
            .text("description", draft.description.clone());

        match &draft.owner_id {
            Some(owner) => form.text("userId", owner.clone()),
            None => form,
        }
    }

    fn image_part(image: &ImageBlob) -> ListingResult<Part> {
        let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        match &image.content_type {
            Some(mime) => part
                .mime_str(mime)
                .map_err(|e| ListingError::transport("attach image", e)),
            None => Ok(part),
        }
    }

    /// Map a non-2xx response onto the error taxonomy
    async fn check_status(
        response: Response,
        operation: &'static str,
        id: Option<&ListingId>,
    ) -> ListingResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!(%status, operation, "Listings API returned an error status");

        match (status, id) {
            (StatusCode::BAD_REQUEST, _) => {
                let body: ApiErrorBody = response.json().await.unwrap_or_default();
                let mut errors = FieldErrors::from(body.errors);
                if errors.is_empty() {
                    errors.add(
                        "form",
                        body.message
                            .unwrap_or_else(|| "The listing was rejected.".to_string()),
                    );
                }
                Err(ListingError::Validation(errors))
            }
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, Some(id)) => {
                Err(ListingError::Permission { id: id.clone() })
            }
            (StatusCode::NOT_FOUND, Some(id)) => Err(ListingError::NotFound { id: id.clone() }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ListingError::Transport {
                    operation,
                    status: Some(status.as_u16()),
                    message: if body.is_empty() {
                        status.to_string()
                    } else {
                        body
                    },
                })
            }
        }
    }
}

#[async_trait]
impl ListingBackend for RestBackend {
    async fn fetch_listings(&self, scope: &FetchScope) -> ListingResult<Vec<ListingRecord>> {
        let url = self.collection_url();
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ListingError::transport("fetch listings", e))?;
        let response = Self::check_status(response, "fetch listings", None).await?;

        let documents: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ListingError::transport("decode listings", e))?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<ListingRecord>(document) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed listing: {}", e),
            }
        }

        // The REST API has no owner column to query on
        if let FetchScope::OwnedBy(owner) = scope {
            records.retain(|record| record.is_owned_by(Some(owner)));
        }

        info!("Fetched {} listings from {}", records.len(), self.base_url);
        Ok(records)
    }

    async fn create_listing(
        &self,
        draft: &ListingDraft,
        image: Option<&ImageBlob>,
    ) -> ListingResult<ListingRecord> {
        let mut form = Self::draft_form(draft);
        if let Some(image) = image {
            form = form.part("image", Self::image_part(image)?);
        }

        let response = self
            .client
            .post(self.collection_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ListingError::transport("create listing", e))?;
        let response = Self::check_status(response, "create listing", None).await?;

        let record: ListingRecord = response
            .json()
            .await
            .map_err(|e| ListingError::transport("decode created listing", e))?;
        info!(id = %record.id, "Created listing");
        Ok(record)
    }

    async fn update_listing(
        &self,
        id: &ListingId,
        draft: &ListingDraft,
        image: &ImageChange,
    ) -> ListingResult<ListingRecord> {
        let form = Self::draft_form(draft);
        let form = match image {
            ImageChange::Keep => form.text("image_url_unchanged", "true"),
            ImageChange::Replace(blob) => form
                .text("image_url_unchanged", "false")
                .part("image", Self::image_part(blob)?),
            ImageChange::Remove => form
                .text("image_url_unchanged", "false")
                .text("image", ""),
        };

        let response = self
            .client
            .put(self.item_url(id))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ListingError::transport("update listing", e))?;
        let response = Self::check_status(response, "update listing", Some(id)).await?;

        let record: ListingRecord = response
            .json()
            .await
            .map_err(|e| ListingError::transport("decode updated listing", e))?;
        info!(id = %record.id, "Updated listing");
        Ok(record)
    }

    async fn delete_listing(&self, id: &ListingId, _acting_user: Option<&str>) -> ListingResult<()> {
        let response = self
            .client
            .delete(self.item_url(id))
            .send()
            .await
            .map_err(|e| ListingError::transport("delete listing", e))?;
        Self::check_status(response, "delete listing", Some(id)).await?;

        info!(%id, "Deleted listing");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "REST"
    }
}
