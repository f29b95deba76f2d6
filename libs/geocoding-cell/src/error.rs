use thiserror::Error;

use shared_models::AppError;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("EMPTY_ADDRESS")]
    EmptyAddress,

    #[error("GEOCODE_NOT_FOUND")]
    NotFound,

    #[error("GEOCODE_HTTP_{0}")]
    HttpStatus(u16),

    #[error("Geocoder transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed geocoder response: {0}")]
    MalformedResponse(String),

    #[error("Geocode cache error: {0}")]
    Cache(String),
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        AppError::Geocode(err.to_string())
    }
}
