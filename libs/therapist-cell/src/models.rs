// libs/therapist-cell/src/models.rs
use serde::{Deserialize, Serialize};

use shared_models::{AddressParts, GeoPoint, Slot, SlotSet, Therapist};

// ==============================================================================
// DISPLAY PROJECTION
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Top,
    Bottom,
}

/// How much of one display cell a slot set covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellCoverage {
    pub cell: Slot,
    pub covered: usize,
    pub total: usize,
    pub ratio: f64,
    pub alignment: Alignment,
    /// The previous display cell of the same day is untouched.
    pub block_start: bool,
}

impl CellCoverage {
    pub fn is_full(&self) -> bool {
        self.covered == self.total
    }

    pub fn percent(&self) -> u8 {
        (self.ratio * 100.0).round() as u8
    }
}

/// Hours booked in one contiguous run, anchored on a display cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTotal {
    pub anchor: Slot,
    pub first_slot: Slot,
    pub last_slot: Slot,
    pub slot_count: usize,
    pub hours: f64,
    pub label: String,
}

/// One case's share of a display cell in the combined view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSegment {
    pub case_id: String,
    pub color_index: u8,
    pub start_pct: u8,
    pub end_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSegments {
    pub cell: Slot,
    pub segments: Vec<CaseSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub case_id: String,
    pub label: String,
    pub color_index: u8,
    pub hours_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub total_label: String,
}

// ==============================================================================
// BREAKS
// ==============================================================================

/// The buffer placed after one booked run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakRun {
    pub case_id: String,
    pub run_end: Slot,
    pub slots: Vec<Slot>,
}

// ==============================================================================
// SEARCH
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// OR filter on borough preferences; empty keeps everyone.
    #[serde(default)]
    pub boroughs: Vec<String>,
    /// Keep therapists with `total_hours <= threshold`. Without one, keep
    /// therapists still under their own `required_hours`.
    #[serde(default)]
    pub hours_threshold: Option<f64>,
    #[serde(default)]
    pub selected_slots: SlotSet,
    #[serde(default)]
    pub required_total_hours: f64,
    #[serde(default)]
    pub break_minutes: i32,
    /// Distance filter is active when positive.
    #[serde(default)]
    pub max_miles: f64,
    #[serde(default)]
    pub referral_address: AddressParts,
    #[serde(default)]
    pub referral_coordinate: Option<GeoPoint>,
}

impl SearchCriteria {
    pub fn distance_enabled(&self) -> bool {
        self.max_miles > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapistMatch {
    pub therapist: Therapist,
    pub remaining_hours: f64,
    pub farthest_case_miles: Option<f64>,
    pub match_reasons: Vec<String>,
}

/// Picker entry: `"Dr. First Last (10h)"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TherapistOption {
    pub id: String,
    pub label: String,
}

/// Per-case hours and distance from the referral for a chosen therapist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDistance {
    pub case_id: String,
    pub label: String,
    pub color_index: u8,
    pub hours_label: String,
    pub miles: Option<f64>,
}

// ==============================================================================
// ROSTER REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTherapist {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub required_hours: f64,
    #[serde(default)]
    pub borough_prefs: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapistPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub required_hours: Option<f64>,
    pub borough_prefs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    pub first_name: String,
    pub last_name: String,
    pub patient_id: String,
    #[serde(flatten)]
    pub address: AddressParts,
}
