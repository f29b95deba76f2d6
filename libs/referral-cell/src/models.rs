// libs/referral-cell/src/models.rs
use serde::{Deserialize, Serialize};

use shared_models::{AddressParts, ReferralStatus, SlotSet};

/// Intake form for a new referral.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReferral {
    pub child_name: String,
    pub child_id: String,
    #[serde(default)]
    pub total_referred_hours: f64,
    /// Left empty to follow `total_referred_hours / 5`.
    #[serde(default)]
    pub max_desired_per_day: Option<f64>,
    #[serde(default)]
    pub status: ReferralStatus,
    #[serde(flatten)]
    pub address: AddressParts,
    #[serde(default)]
    pub preferred_availability: SlotSet,
}

/// Picker entry: `"Name — #ID"`, or just the name without an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralOption {
    pub id: String,
    pub label: String,
}
