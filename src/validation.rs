//! Client-side form validation.
//!
//! Everything here runs before a backend call is attempted. Raw form input is
//! parsed into typed drafts; text rules are declared with `validator` and the
//! numeric rules are checked while parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::backends::types::ImageBlob;
use crate::error::{FieldErrors, ListingError, ListingResult};

/// Email, or a phone number of at least 7 digits/separators
pub static CONTACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$|^[0-9\s\-\(\)\+]{7,}$")
        .expect("Invalid contact regex")
});

/// Address with a local part, a domain and a dotted suffix
pub static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// 16 MiB, the backend's request limit
pub const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

pub fn is_valid_contact(value: &str) -> bool {
    CONTACT_RE.is_match(value.trim())
}

/// Listing form exactly as the user typed it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingForm {
    pub title: String,
    pub location: String,
    pub contact: String,
    pub price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub description: String,
}

/// Validated listing data sent to a backend on create or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ListingDraft {
    #[validate(length(min = 1, message = "Title is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "Location is required."))]
    pub location: String,
    #[validate(regex(
        path = "CONTACT_RE",
        message = "Invalid contact format. Enter an email or a phone number (at least 7 digits)."
    ))]
    pub contact: String,
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: f64,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    /// Stamped by the session from the acting user, never taken from the form
    pub owner_id: Option<String>,
}

impl ListingForm {
    /// Parse and validate, collecting every field error
    pub fn parse(&self) -> ListingResult<ListingDraft> {
        let mut errors = FieldErrors::new();

        let price = parse_positive_real(&self.price).unwrap_or_else(|| {
            errors.add("price", "Price must be a positive number.");
            0.0
        });
        let bedrooms = parse_positive_whole(&self.bedrooms).unwrap_or_else(|| {
            errors.add("bedrooms", "Bedrooms must be a positive whole number.");
            0
        });
        let bathrooms = parse_positive_real(&self.bathrooms).unwrap_or_else(|| {
            errors.add("bathrooms", "Bathrooms must be a positive number.");
            0.0
        });

        let contact = self.contact.trim().to_string();
        if contact.is_empty() {
            errors.add("contact", "Contact is required.");
        }

        let draft = ListingDraft {
            title: self.title.trim().to_string(),
            location: self.location.trim().to_string(),
            contact,
            price,
            bedrooms,
            bathrooms,
            description: self.description.trim().to_string(),
            owner_id: None,
        };

        if let Err(invalid) = draft.validate() {
            errors.merge(FieldErrors::from(invalid));
        }

        errors.in_form_order().into_result().map(|()| draft)
    }
}

impl From<&crate::models::ListingRecord> for ListingForm {
    /// Prefill the edit form from a stored record
    fn from(record: &crate::models::ListingRecord) -> Self {
        let number = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        Self {
            title: record.title.clone(),
            location: record.location.clone(),
            contact: record.contact.clone(),
            price: number(record.price),
            bedrooms: record.bedrooms.map(|b| b.to_string()).unwrap_or_default(),
            bathrooms: number(record.bathrooms),
            description: record.description.clone(),
        }
    }
}

fn parse_positive_real(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

fn parse_positive_whole(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|value| *value > 0)
}

/// Check an image attachment before upload
pub fn validate_image(image: &ImageBlob) -> ListingResult<()> {
    let mut errors = FieldErrors::new();

    match image.extension() {
        Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => errors.add(
            "image",
            "File type not allowed. Only PNG, JPG, JPEG and GIF are accepted.",
        ),
    }
    if image.bytes.is_empty() {
        errors.add("image", "The image file is empty.");
    } else if image.bytes.len() > MAX_IMAGE_BYTES {
        errors.add("image", "The image exceeds the 16 MB limit.");
    }

    errors.into_result()
}

/// Message sent to a listing's publisher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Inquiry {
    #[validate(length(min = 1, message = "Please enter your name."))]
    pub name: String,
    #[validate(regex(path = "EMAIL_RE", message = "Please enter a valid email."))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "The message cannot be empty."))]
    pub message: String,
}

impl Inquiry {
    /// Trim every field and validate
    pub fn normalized(&self) -> ListingResult<Inquiry> {
        let inquiry = Inquiry {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            message: self.message.trim().to_string(),
        };
        inquiry
            .validate()
            .map_err(|invalid| ListingError::Validation(FieldErrors::from(invalid)))?;
        Ok(inquiry)
    }
}
