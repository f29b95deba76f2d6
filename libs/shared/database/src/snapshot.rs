use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_models::{AppError, Referral, Therapist};

/// The full persisted state: `{ therapists, referrals }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub therapists: Vec<Therapist>,
    #[serde(default)]
    pub referrals: Vec<Referral>,
}

impl Snapshot {
    /// Validates an import payload. A missing or non-array `referrals` key
    /// is read as an empty list.
    pub fn from_value(mut value: Value) -> Result<Self, AppError> {
        let object = value.as_object_mut().ok_or_else(|| {
            AppError::ImportFormat(
                "Expected an object with a \"therapists\" array".to_string(),
            )
        })?;

        if !object.get("therapists").is_some_and(Value::is_array) {
            return Err(AppError::ImportFormat(
                "Expected an object with a \"therapists\" array".to_string(),
            ));
        }

        if !object.get("referrals").is_some_and(Value::is_array) {
            object.insert("referrals".to_string(), Value::Array(vec![]));
        }

        let mut snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| AppError::ImportFormat(e.to_string()))?;
        snapshot.hydrate_totals();
        Ok(snapshot)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| AppError::ImportFormat(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self).map_err(|e| AppError::Storage(e.to_string()))
    }

    pub fn hydrate_totals(&mut self) {
        for therapist in &mut self.therapists {
            therapist.recompute_total_hours();
        }
    }
}
