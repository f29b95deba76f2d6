// libs/shared/database/src/seed.rs
//! Queens demo dataset: five staffed therapists plus three open referrals.

use shared_models::slot::{day_block, slots_to_hours};
use shared_models::{
    AddressParts, AppError, Case, Referral, ReferralStatus, SlotSet, Therapist,
};
use shared_utils::round_to_quarter;

use crate::snapshot::Snapshot;

const WEEKDAYS: [u8; 5] = [1, 2, 3, 4, 5];

struct StaffedDef {
    therapist_id: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    phone: &'static str,
    case_id: &'static str,
    child_name: &'static str,
    patient_id: &'static str,
    cross_streets: &'static str,
    city: &'static str,
    zip: &'static str,
    start: &'static str,
    end: &'static str,
}

struct OpenDef {
    child_name: &'static str,
    child_id: &'static str,
    cross_streets: &'static str,
    city: &'static str,
    zip: &'static str,
    blocks: &'static [(&'static [u8], &'static str, &'static str)],
}

const STAFFED: [StaffedDef; 5] = [
    StaffedDef {
        therapist_id: "maya-singh",
        first_name: "Maya",
        last_name: "Singh",
        phone: "(718) 555-0101",
        case_id: "maya-case1",
        child_name: "Aiden Lopez",
        patient_id: "Q1001",
        cross_streets: "Queens Blvd & 63rd Dr",
        city: "Rego Park",
        zip: "11374",
        start: "15:00",
        end: "17:00",
    },
    StaffedDef {
        therapist_id: "carlos-rivera",
        first_name: "Carlos",
        last_name: "Rivera",
        phone: "(718) 555-0102",
        case_id: "carlos-case1",
        child_name: "Liam Kim",
        patient_id: "Q1002",
        cross_streets: "Broadway & 46th St",
        city: "Astoria",
        zip: "11103",
        start: "09:00",
        end: "11:00",
    },
    StaffedDef {
        therapist_id: "emily-chen",
        first_name: "Emily",
        last_name: "Chen",
        phone: "(718) 555-0103",
        case_id: "emily-case1",
        child_name: "Ella Martinez",
        patient_id: "Q1003",
        cross_streets: "Northern Blvd & 150th St",
        city: "Flushing",
        zip: "11354",
        start: "13:00",
        end: "15:00",
    },
    StaffedDef {
        therapist_id: "jacob-cohen",
        first_name: "Jacob",
        last_name: "Cohen",
        phone: "(718) 555-0104",
        case_id: "jacob-case1",
        child_name: "Noah Johnson",
        patient_id: "Q1004",
        cross_streets: "Jamaica Ave & 168th St",
        city: "Jamaica",
        zip: "11432",
        start: "10:00",
        end: "12:00",
    },
    StaffedDef {
        therapist_id: "sophia-patel",
        first_name: "Sophia",
        last_name: "Patel",
        phone: "(718) 555-0105",
        case_id: "sophia-case1",
        child_name: "Mia Williams",
        patient_id: "Q1005",
        cross_streets: "Queens Blvd & 46th St",
        city: "Sunnyside",
        zip: "11104",
        start: "14:00",
        end: "16:00",
    },
];

const OPEN: [OpenDef; 3] = [
    OpenDef {
        child_name: "Oliver Garcia",
        child_id: "Q2001",
        cross_streets: "Steinway St & 30th Ave",
        city: "Astoria",
        zip: "11103",
        blocks: &[(&WEEKDAYS, "15:00", "16:00")],
    },
    OpenDef {
        child_name: "Ava Brown",
        child_id: "Q2002",
        cross_streets: "Bell Blvd & 41st Ave",
        city: "Bayside",
        zip: "11361",
        blocks: &[(&[1, 3, 5], "14:00", "15:30"), (&[2, 4], "09:00", "10:00")],
    },
    OpenDef {
        child_name: "Ethan Davis",
        child_id: "Q2003",
        cross_streets: "Metropolitan Ave & 69th St",
        city: "Middle Village",
        zip: "11379",
        blocks: &[(&WEEKDAYS, "10:00", "11:15")],
    },
];

fn queens_address(cross_streets: &str, city: &str, zip: &str) -> AddressParts {
    AddressParts {
        address: String::new(),
        cross_streets: cross_streets.to_string(),
        city: city.to_string(),
        state: "NY".to_string(),
        zip: zip.to_string(),
    }
}

fn blocks_to_slots(days: &[u8], start: &str, end: &str) -> Result<SlotSet, AppError> {
    let mut slots = SlotSet::new();
    for day in days {
        slots.extend(day_block(*day, start, end)?);
    }
    Ok(slots)
}

fn staffed_therapist(def: &StaffedDef, booked: &SlotSet) -> Therapist {
    let mut case = Case {
        id: def.case_id.to_string(),
        name: def.child_name.to_string(),
        patient_id: def.patient_id.to_string(),
        address: queens_address(def.cross_streets, def.city, def.zip),
        lat: None,
        lon: None,
        schedule: vec![],
        color_index: 0,
    };
    case.schedule = booked.iter().map(|slot| case.entry_for(*slot)).collect();

    let mut therapist = Therapist {
        id: def.therapist_id.to_string(),
        first_name: def.first_name.to_string(),
        last_name: def.last_name.to_string(),
        phone: def.phone.to_string(),
        email: format!(
            "{}.{}@example.com",
            def.first_name.to_lowercase(),
            def.last_name.to_lowercase()
        ),
        borough_prefs: vec!["Queens".to_string()],
        required_hours: 25.0,
        total_hours: 0.0,
        cases: vec![case],
    };
    therapist.recompute_total_hours();
    therapist
}

fn referral(
    child_name: &str,
    child_id: &str,
    address: AddressParts,
    preferred: SlotSet,
    status: ReferralStatus,
    total: f64,
    max_per_day: f64,
) -> Referral {
    Referral {
        id: format!("ref-{}", child_id),
        child_name: child_name.to_string(),
        child_id: child_id.to_string(),
        total_referred_hours: total,
        max_desired_per_day: max_per_day,
        max_desired_per_day_pinned: false,
        status,
        address,
        lat: None,
        lon: None,
        preferred_availability: preferred,
        created_at: None,
        updated_at: None,
    }
}

/// Staffed referrals mirror the therapists' cases and come first.
pub fn queens_dataset() -> Result<Snapshot, AppError> {
    let mut therapists = Vec::with_capacity(STAFFED.len());
    let mut referrals = Vec::with_capacity(STAFFED.len() + OPEN.len());

    for def in &STAFFED {
        let booked = blocks_to_slots(&WEEKDAYS, def.start, def.end)?;
        therapists.push(staffed_therapist(def, &booked));
        referrals.push(referral(
            def.child_name,
            def.patient_id,
            queens_address(def.cross_streets, def.city, def.zip),
            booked,
            ReferralStatus::Staffed,
            10.0,
            2.0,
        ));
    }

    for def in &OPEN {
        let mut preferred = SlotSet::new();
        for (days, start, end) in def.blocks {
            preferred.extend(blocks_to_slots(days, start, end)?);
        }
        let total = slots_to_hours(preferred.len());
        referrals.push(referral(
            def.child_name,
            def.child_id,
            queens_address(def.cross_streets, def.city, def.zip),
            preferred,
            ReferralStatus::Referred,
            (total * 100.0).round() / 100.0,
            round_to_quarter(total / 5.0),
        ));
    }

    Ok(Snapshot {
        therapists,
        referrals,
    })
}
