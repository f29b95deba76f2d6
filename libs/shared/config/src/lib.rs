use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_GEOCODE_MIN_INTERVAL_MS: u64 = 1100;
pub const DEFAULT_DATA_PATH: &str = "tms_state.json";
pub const DEFAULT_GEO_CACHE_PATH: &str = "tms_geo_cache_v1.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub geocoder_base_url: String,
    pub geocoder_contact_email: String,
    pub geocode_min_interval_ms: u64,
    pub data_path: PathBuf,
    pub geo_cache_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geocoder_base_url: DEFAULT_GEOCODER_BASE_URL.to_string(),
            geocoder_contact_email: String::new(),
            geocode_min_interval_ms: DEFAULT_GEOCODE_MIN_INTERVAL_MS,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            geo_cache_path: PathBuf::from(DEFAULT_GEO_CACHE_PATH),
        }
    }
}

impl AppConfig {
    /// Reads `.env` (if any) and then the process environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let config = Self {
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("GEOCODER_BASE_URL not set, using default");
                    DEFAULT_GEOCODER_BASE_URL.to_string()
                }),
            geocoder_contact_email: env::var("GEOCODER_CONTACT_EMAIL")
                .unwrap_or_else(|_| {
                    warn!("GEOCODER_CONTACT_EMAIL not set, using empty value");
                    String::new()
                }),
            geocode_min_interval_ms: env::var("GEOCODE_MIN_INTERVAL_MS")
                .ok()
                .and_then(|raw| match raw.parse() {
                    Ok(ms) => Some(ms),
                    Err(_) => {
                        warn!("GEOCODE_MIN_INTERVAL_MS is not a number: {}", raw);
                        None
                    }
                })
                .unwrap_or(DEFAULT_GEOCODE_MIN_INTERVAL_MS),
            data_path: env::var("TMS_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("TMS_DATA_PATH not set, using default");
                    PathBuf::from(DEFAULT_DATA_PATH)
                }),
            geo_cache_path: env::var("TMS_GEO_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("TMS_GEO_CACHE_PATH not set, using default");
                    PathBuf::from(DEFAULT_GEO_CACHE_PATH)
                }),
        };

        if !config.is_geocoder_configured() {
            warn!("Geocoder not fully configured - requests will be sent without a contact address");
        }

        config
    }

    /// Nominatim's usage policy asks for a contact address on every request.
    pub fn is_geocoder_configured(&self) -> bool {
        !self.geocoder_base_url.is_empty() && !self.geocoder_contact_email.is_empty()
    }

    pub fn geocode_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocode_min_interval_ms)
    }
}
