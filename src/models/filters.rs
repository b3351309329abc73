use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ordering applied to the filtered listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    None,
    PriceAsc,
    PriceDesc,
    BedroomsAsc,
    BedroomsDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SortKey::None),
            "price-asc" | "price-ascending" => Ok(SortKey::PriceAsc),
            "price-desc" | "price-descending" => Ok(SortKey::PriceDesc),
            "bedrooms-asc" | "bedrooms-ascending" => Ok(SortKey::BedroomsAsc),
            "bedrooms-desc" | "bedrooms-descending" => Ok(SortKey::BedroomsDesc),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

/// Whether a query targets every listing or only the acting user's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerScope {
    #[default]
    All,
    Mine,
}

/// Filter and sort parameters for the listing view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterParams {
    /// Case-insensitive substring matched against title, location and description
    pub search_term: String,
    /// 0 disables the bound
    pub min_bedrooms: u32,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub owner_scope: OwnerScope,
    pub sort_key: SortKey,
}

impl FilterParams {
    /// Search term as it is matched: trimmed and lowercased
    pub fn normalized_term(&self) -> String {
        self.search_term.trim().to_lowercase()
    }

    /// Merge the fields present in `patch`
    pub fn apply(&mut self, patch: &FilterPatch) {
        if let Some(term) = &patch.search_term {
            self.search_term = term.clone();
        }
        if let Some(min_bedrooms) = patch.min_bedrooms {
            self.min_bedrooms = min_bedrooms;
        }
        if let Some(min_price) = patch.min_price {
            self.min_price = min_price;
        }
        if let Some(max_price) = patch.max_price {
            self.max_price = max_price;
        }
        if let Some(scope) = patch.owner_scope {
            self.owner_scope = scope;
        }
    }
}

/// Partial update of [`FilterParams`].
///
/// `None` leaves a field untouched. For the price bounds `Some(None)` clears
/// the bound.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterPatch {
    pub search_term: Option<String>,
    pub min_bedrooms: Option<u32>,
    pub min_price: Option<Option<f64>>,
    pub max_price: Option<Option<f64>>,
    pub owner_scope: Option<OwnerScope>,
}

impl FilterPatch {
    /// Patch that resets every filter to its default
    pub fn clear() -> Self {
        Self {
            search_term: Some(String::new()),
            min_bedrooms: Some(0),
            min_price: Some(None),
            max_price: Some(None),
            owner_scope: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn min_bedrooms(mut self, bedrooms: u32) -> Self {
        self.min_bedrooms = Some(bedrooms);
        self
    }

    pub fn min_price(mut self, price: Option<f64>) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: Option<f64>) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn scope(mut self, scope: OwnerScope) -> Self {
        self.owner_scope = Some(scope);
        self
    }
}
