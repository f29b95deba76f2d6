pub mod cache;
pub mod distance;
pub mod geocoder;
pub mod throttle;

pub use cache::GeoCache;
pub use distance::haversine_miles;
pub use geocoder::{Geocoder, NominatimGeocoder};
pub use throttle::RequestThrottle;
