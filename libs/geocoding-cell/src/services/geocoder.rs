use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_models::{AddressParts, GeoPoint};

use crate::error::GeocodeError;
use crate::models::NominatimPlace;
use crate::services::cache::GeoCache;
use crate::services::throttle::RequestThrottle;

/// Address -> coordinate resolution used by case creation and the distance
/// filter.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, parts: &AddressParts) -> Result<GeoPoint, GeocodeError>;
}

/// Endpoint and cache file identify one upstream budget.
type SharedKey = (String, PathBuf);

static SHARED: OnceLock<Mutex<HashMap<SharedKey, Arc<NominatimGeocoder>>>> = OnceLock::new();

/// OpenStreetMap Nominatim client with a throttle and cache.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    contact_email: String,
    throttle: RequestThrottle,
    cache: GeoCache,
}

impl NominatimGeocoder {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_cache(config, GeoCache::persistent(&config.geo_cache_path))
    }

    /// Process-wide instance for this endpoint and cache file. Every caller
    /// with the same config queues on one throttle and reads one cache.
    pub fn shared(config: &AppConfig) -> Arc<Self> {
        let key = (
            config.geocoder_base_url.clone(),
            config.geo_cache_path.clone(),
        );
        let registry = SHARED.get_or_init(|| Mutex::new(HashMap::new()));
        let mut registry = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        registry
            .entry(key)
            .or_insert_with(|| {
                debug!("Creating shared geocoder for {}", config.geocoder_base_url);
                Arc::new(Self::new(config))
            })
            .clone()
    }

    pub fn with_cache(config: &AppConfig, cache: GeoCache) -> Self {
        Self {
            client: Client::new(),
            base_url: config.geocoder_base_url.clone(),
            contact_email: config.geocoder_contact_email.clone(),
            throttle: RequestThrottle::new(config.geocode_min_interval()),
            cache,
        }
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    async fn lookup(&self, query: &str) -> Result<GeoPoint, GeocodeError> {
        debug!("Geocoding '{}'", query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("format", "jsonv2"),
                ("limit", "1"),
                ("email", self.contact_email.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Geocoder request failed: {}", e);
                GeocodeError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Geocoder returned {} for '{}'", status, query);
            return Err(GeocodeError::HttpStatus(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let place = places.into_iter().next().ok_or(GeocodeError::NotFound)?;

        let lat: f64 = place
            .lat
            .parse()
            .map_err(|_| GeocodeError::MalformedResponse(format!("lat '{}'", place.lat)))?;
        let lon: f64 = place
            .lon
            .parse()
            .map_err(|_| GeocodeError::MalformedResponse(format!("lon '{}'", place.lon)))?;

        Ok(GeoPoint::new(lat, lon))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, parts: &AddressParts) -> Result<GeoPoint, GeocodeError> {
        let key = parts.cache_key();
        if key.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        if let Some(point) = self.cache.get(&key) {
            debug!("Geocode cache hit for '{}'", key);
            return Ok(point);
        }

        let query = parts.compose_query();
        let point = self.throttle.throttled(|| self.lookup(&query)).await?;

        info!("Geocoded '{}' to ({}, {})", query, point.lat, point.lon);
        self.cache.insert(&key, point)?;
        Ok(point)
    }
}
