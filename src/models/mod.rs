pub mod filters;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use filters::{FilterParams, FilterPatch, OwnerScope, SortKey};

/// Image shown for listings that have no hosted image
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/300x200/cccccc/FFFFFF?text=Sin+Imagen";

/// Backend-assigned listing identifier.
///
/// The REST backend hands out integers, document stores hand out strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingId::Number(n) => write!(f, "{}", n),
            ListingId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ListingId {
    fn from(value: i64) -> Self {
        ListingId::Number(value)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        ListingId::Text(value.to_string())
    }
}

impl From<String> for ListingId {
    fn from(value: String) -> Self {
        ListingId::Text(value)
    }
}

/// One property listing as returned by a backend.
///
/// Numeric fields are optional because collaborators are not trusted to send
/// complete documents; the filter and sort rules decide what an absent value
/// means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: ListingId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default, deserialize_with = "lenient::real")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::whole")]
    pub bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient::real")]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default, alias = "userId")]
    pub owner_id: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ListingRecord {
    /// Hosted image, or the placeholder when the listing has none
    pub fn display_image_url(&self) -> &str {
        self.image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE_URL)
    }

    pub fn is_owned_by(&self, user_id: Option<&str>) -> bool {
        match (self.owner_id.as_deref(), user_id) {
            (Some(owner), Some(user)) => owner == user,
            _ => false,
        }
    }
}

/// Field decoders that turn off-shape values into `None` instead of failing
/// the whole record.
mod lenient {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|n| n.is_finite())
    }

    pub fn real<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(number))
    }

    pub fn whole<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(number)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32))
    }

    /// RFC 3339 strings, epoch milliseconds, or `{seconds, nanoseconds}` maps
    pub fn timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(|value| match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Value::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(Value::as_i64)?;
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0);
                Utc.timestamp_opt(seconds, nanos).single()
            }
            _ => None,
        }))
    }
}
