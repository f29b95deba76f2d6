use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Invalid display increment: {0} minutes (expected 15, 30 or 60)")]
    InvalidIncrement(u32),

    #[error("Cannot add to case {case_id}: {conflicts:?} already booked for another case")]
    Overlap {
        case_id: String,
        conflicts: Vec<String>,
    },

    #[error("Child ID already exists: {0}")]
    DuplicateChildId(String),

    #[error("Geocoding failed: {0}")]
    Geocode(String),

    #[error("Invalid import format: {0}")]
    ImportFormat(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Errors a caller reports inline next to the triggering control.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Overlap { .. }
                | AppError::DuplicateChildId(_)
                | AppError::Geocode(_)
                | AppError::ImportFormat(_)
                | AppError::Validation(_)
        )
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
