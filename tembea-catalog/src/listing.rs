use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offering categories in the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingCategory {
    Tour,
    Stay,
    Volunteer,
}

impl ListingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingCategory::Tour => "tour",
            ListingCategory::Stay => "stay",
            ListingCategory::Volunteer => "volunteer",
        }
    }
}

impl std::fmt::Display for ListingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingCategory {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tour" => Ok(ListingCategory::Tour),
            "stay" => Ok(ListingCategory::Stay),
            "volunteer" => Ok(ListingCategory::Volunteer),
            other => Err(ListingError::UnknownCategory(other.to_string())),
        }
    }
}

/// Publication state. Only published listings are visible to end users; the
/// store enforces this independently of any filter a caller supplies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Published,
    Draft,
    Archived,
}

/// Booked-out dates carried on the listing row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Availability {
    #[serde(default)]
    pub booked_dates: Vec<NaiveDate>,
}

/// A bookable or applyable offering (tour, stay, or volunteer opportunity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: ListingCategory,
    /// Price per traveler in cents; volunteer listings carry none.
    pub price_cents: Option<i64>,
    pub rating: Option<f32>,
    pub location: Option<String>,
    /// Secondary tag within the category (e.g. "Safari", "Beach House").
    /// Not indexed remotely; filtering on it happens client-side.
    #[serde(rename = "type")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub availability: Availability,
    /// Storage paths or absolute URLs, in display order.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: serde_json::Value,
    #[serde(default)]
    pub amenities: serde_json::Value,
    #[serde(default)]
    pub itinerary: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub status: ListingStatus,
}

impl Listing {
    /// Decode a row as the store serialized it.
    pub fn from_row(row: serde_json::Value) -> Result<Self, ListingError> {
        serde_json::from_value(row).map_err(|e| ListingError::Malformed(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Unknown listing category: {0}")]
    UnknownCategory(String),

    #[error("Malformed listing row: {0}")]
    Malformed(String),
}
