// libs/shared/models/src/geo.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Postal address fields as entered for a case or referral.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressParts {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub cross_streets: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

impl AddressParts {
    /// Non-empty parts joined with ", " in street-to-zip order.
    pub fn compose_query(&self) -> String {
        [
            &self.address,
            &self.cross_streets,
            &self.city,
            &self.state,
            &self.zip,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Cache key: the composed query, whitespace-collapsed and lowercased.
    pub fn cache_key(&self) -> String {
        self.compose_query()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.cache_key().is_empty()
    }
}
