use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One enriched restaurant record, the unit both output writers consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u64>,
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: serde_json::Value,
    #[serde(default)]
    pub photo_local_paths: Vec<String>,
    #[serde(default)]
    pub menu_photo_paths: Vec<String>,
    #[serde(default)]
    pub menu_urls: Vec<String>,
    /// RFC 3339 UTC timestamp of when this record was assembled.
    pub source_timestamp: String,
}

impl PlaceRecord {
    pub fn from_details(details: &PlaceDetails) -> Self {
        Self {
            place_id: details.place_id.clone(),
            name: details.name.clone(),
            lat: details.geometry.location.lat,
            lng: details.geometry.location.lng,
            formatted_address: details.formatted_address.clone(),
            rating: details.rating,
            user_ratings_total: details.user_ratings_total,
            website: details.website.clone(),
            opening_hours: details.opening_hours.clone(),
            photo_local_paths: Vec::new(),
            menu_photo_paths: Vec::new(),
            menu_urls: Vec::new(),
            source_timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// One row of a search response; just enough to fetch details later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub location: LatLng,
}

/// A photo attachment on a place details response. Width and height come
/// from the API, so aspect ratios are known without decoding anything.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoRef {
    pub photo_reference: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl PhotoRef {
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub geometry: Geometry,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u64>,
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: serde_json::Value,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}
