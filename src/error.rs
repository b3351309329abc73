//! Error types shared by the engine, the session and the backends.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::models::ListingId;

/// Order fields appear in on the listing and inquiry forms
pub const FORM_FIELD_ORDER: [&str; 12] = [
    "user",
    "title",
    "location",
    "contact",
    "price",
    "bedrooms",
    "bathrooms",
    "description",
    "image",
    "name",
    "email",
    "message",
];

fn form_rank(field: &str) -> usize {
    FORM_FIELD_ORDER
        .iter()
        .position(|known| *known == field)
        .unwrap_or(FORM_FIELD_ORDER.len())
}

/// Field-level validation messages, in the order they were recorded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(Vec<(String, String)>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message; the first message for a field wins
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if !self.contains(&field) {
            self.0.push((field, message.into()));
        }
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }

    /// Reorder to match the form layout; unknown fields go last
    pub fn in_form_order(mut self) -> Self {
        self.0.sort_by_key(|(field, _)| form_rank(field));
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|(name, _)| name == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ListingError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ListingError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl From<BTreeMap<String, String>> for FieldErrors {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map.into_iter().collect()).in_form_order()
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            if let Some(first) = list.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                out.add(field, message);
            }
        }
        out.in_form_order()
    }
}

#[derive(Debug, Error)]
pub enum ListingError {
    /// A form value failed a client-side precondition
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The backend was unreachable or answered with a failure status
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The acting user does not own the listing
    #[error("not allowed to modify listing {id}")]
    Permission { id: ListingId },

    #[error("listing {id} not found")]
    NotFound { id: ListingId },
}

pub type ListingResult<T> = Result<T, ListingError>;

impl ListingError {
    pub fn transport(operation: &'static str, err: reqwest::Error) -> Self {
        ListingError::Transport {
            operation,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        ListingError::Validation(errors)
    }

    /// Text suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            ListingError::Validation(errors) => errors
                .iter()
                .next()
                .map(|(_, message)| message.to_string())
                .unwrap_or_else(|| "Invalid form data.".to_string()),
            ListingError::Transport { .. } => {
                "Could not reach the listings service. Try again later.".to_string()
            }
            ListingError::Permission { .. } => {
                "You do not have permission to modify this listing.".to_string()
            }
            ListingError::NotFound { .. } => "The listing no longer exists.".to_string(),
        }
    }
}
