// libs/shared/models/src/roster.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{AddressParts, GeoPoint};
use crate::slot::{slots_to_hours, Slot, SlotSet};

// ==============================================================================
// THERAPISTS AND CASES
// ==============================================================================

/// One booked 15-minute slot. Case identity is copied in for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub slot_id: Slot,
    pub case_id: String,
    pub case_name: String,
    pub color_index: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub patient_id: String,
    #[serde(flatten)]
    pub address: AddressParts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub color_index: u8,
}

impl Case {
    pub fn entry_for(&self, slot: Slot) -> ScheduleEntry {
        ScheduleEntry {
            slot_id: slot,
            case_id: self.id.clone(),
            case_name: self.name.clone(),
            color_index: self.color_index,
        }
    }

    pub fn slot_set(&self) -> SlotSet {
        self.schedule.iter().map(|entry| entry.slot_id).collect()
    }

    pub fn has_slot(&self, slot: &Slot) -> bool {
        self.schedule.iter().any(|entry| entry.slot_id == *slot)
    }

    pub fn booked_hours(&self) -> f64 {
        slots_to_hours(self.schedule.len())
    }

    pub fn coordinate(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(GeoPoint::new(lat, lon))
            }
            _ => None,
        }
    }

    pub fn set_coordinate(&mut self, point: GeoPoint) {
        self.lat = Some(point.lat);
        self.lon = Some(point.lon);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Therapist {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub borough_prefs: Vec<String>,
    #[serde(default)]
    pub required_hours: f64,
    /// Derived from the case schedules; refreshed by the store on every write.
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub cases: Vec<Case>,
}

impl Therapist {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Union of every slot booked across all of this therapist's cases.
    pub fn busy_set(&self) -> SlotSet {
        self.cases
            .iter()
            .flat_map(|case| case.schedule.iter().map(|entry| entry.slot_id))
            .collect()
    }

    pub fn booked_slot_count(&self) -> usize {
        self.cases.iter().map(|case| case.schedule.len()).sum()
    }

    pub fn recompute_total_hours(&mut self) {
        self.total_hours = slots_to_hours(self.booked_slot_count());
    }

    pub fn case(&self, case_id: &str) -> Option<&Case> {
        self.cases.iter().find(|case| case.id == case_id)
    }

    pub fn case_mut(&mut self, case_id: &str) -> Option<&mut Case> {
        self.cases.iter_mut().find(|case| case.id == case_id)
    }

    /// OR semantics; an empty filter matches everyone.
    pub fn serves_any_borough(&self, boroughs: &[String]) -> bool {
        boroughs.is_empty()
            || self
                .borough_prefs
                .iter()
                .any(|pref| boroughs.iter().any(|wanted| wanted == pref))
    }
}

// ==============================================================================
// REFERRALS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    #[default]
    Referred,
    Staffed,
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferralStatus::Referred => write!(f, "referred"),
            ReferralStatus::Staffed => write!(f, "staffed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub child_name: String,
    pub child_id: String,
    #[serde(default)]
    pub total_referred_hours: f64,
    #[serde(default)]
    pub max_desired_per_day: f64,
    /// Set once `max_desired_per_day` was entered explicitly; from then on
    /// it no longer follows `total_referred_hours`.
    #[serde(default)]
    pub max_desired_per_day_pinned: bool,
    #[serde(default)]
    pub status: ReferralStatus,
    #[serde(flatten)]
    pub address: AddressParts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub preferred_availability: SlotSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Referral {
    /// Child ids are unique ignoring surrounding whitespace and case.
    pub fn normalized_child_id(&self) -> String {
        normalize_child_id(&self.child_id)
    }

    pub fn coordinate(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(GeoPoint::new(lat, lon))
            }
            _ => None,
        }
    }

    pub fn set_coordinate(&mut self, point: GeoPoint) {
        self.lat = Some(point.lat);
        self.lon = Some(point.lon);
    }

    pub fn preferred_hours(&self) -> f64 {
        slots_to_hours(self.preferred_availability.len())
    }
}

pub fn normalize_child_id(child_id: &str) -> String {
    child_id.trim().to_lowercase()
}

/// Partial update for a referral; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralPatch {
    pub child_name: Option<String>,
    pub child_id: Option<String>,
    pub total_referred_hours: Option<f64>,
    pub max_desired_per_day: Option<f64>,
    pub max_desired_per_day_pinned: Option<bool>,
    pub status: Option<ReferralStatus>,
    pub address: Option<AddressParts>,
    pub coordinate: Option<GeoPoint>,
    pub preferred_availability: Option<SlotSet>,
}

impl ReferralPatch {
    pub fn apply_to(self, referral: &mut Referral) {
        if let Some(child_name) = self.child_name {
            referral.child_name = child_name;
        }
        if let Some(child_id) = self.child_id {
            referral.child_id = child_id;
        }
        if let Some(total) = self.total_referred_hours {
            referral.total_referred_hours = total;
        }
        if let Some(max_per_day) = self.max_desired_per_day {
            referral.max_desired_per_day = max_per_day;
        }
        if let Some(pinned) = self.max_desired_per_day_pinned {
            referral.max_desired_per_day_pinned = pinned;
        }
        if let Some(status) = self.status {
            referral.status = status;
        }
        if let Some(address) = self.address {
            // A new address invalidates the cached coordinate.
            if address != referral.address {
                referral.lat = None;
                referral.lon = None;
            }
            referral.address = address;
        }
        if let Some(point) = self.coordinate {
            referral.set_coordinate(point);
        }
        if let Some(slots) = self.preferred_availability {
            referral.preferred_availability = slots;
        }
    }
}
