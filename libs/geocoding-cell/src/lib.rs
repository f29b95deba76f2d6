pub mod error;
pub mod models;
pub mod services;

pub use error::GeocodeError;
pub use models::CachedPoint;
pub use services::*;
