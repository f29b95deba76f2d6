use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::GeoPoint;

/// One hit from Nominatim's `jsonv2` search output. Coordinates arrive as
/// strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Persisted geocode result, keyed by the normalized address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedPoint {
    pub lat: f64,
    pub lon: f64,
    pub ts: DateTime<Utc>,
}

impl CachedPoint {
    pub fn new(point: GeoPoint, ts: DateTime<Utc>) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            ts,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}
