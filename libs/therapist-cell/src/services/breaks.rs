// libs/therapist-cell/src/services/breaks.rs
//! Travel/break buffers placed directly after each booked run.

use shared_models::slot::{contiguous_runs, SLOT_MINUTES};
use shared_models::{Increment, SlotSet, Therapist};

use crate::models::{BreakRun, CellCoverage};
use crate::services::projector;

pub const MAX_BREAK_MINUTES: i32 = 120;

/// Clamps to `[0, 120]` and rounds to whole 15-minute slots.
pub fn break_slot_count(requested_minutes: i32) -> usize {
    let clamped = requested_minutes.clamp(0, MAX_BREAK_MINUTES);
    (clamped as f64 / SLOT_MINUTES as f64).round() as usize
}

/// Per booked run of every case, the buffer slots that fit after it. Runs
/// whose buffer comes out empty are left out.
pub fn break_runs(therapist: &Therapist, requested_minutes: i32) -> Vec<BreakRun> {
    let wanted = break_slot_count(requested_minutes);
    if wanted == 0 {
        return vec![];
    }

    let busy = therapist.busy_set();
    let mut runs = Vec::new();

    for case in &therapist.cases {
        for run in contiguous_runs(case.slot_set()) {
            let Some(run_end) = run.last().copied() else {
                continue;
            };

            let slots: Vec<_> = (1..=wanted as u16)
                .map_while(|step| run_end.offset(step))
                .take_while(|slot| !busy.contains(slot))
                .collect();

            if !slots.is_empty() {
                runs.push(BreakRun {
                    case_id: case.id.clone(),
                    run_end,
                    slots,
                });
            }
        }
    }

    runs
}

/// Union of every buffer slot for the therapist.
pub fn allocate_break(therapist: &Therapist, requested_minutes: i32) -> SlotSet {
    break_runs(therapist, requested_minutes)
        .into_iter()
        .flat_map(|run| run.slots)
        .collect()
}

/// Break buffers on the display grid, using the same coverage rules as
/// bookings.
pub fn break_coverage(
    therapist: &Therapist,
    requested_minutes: i32,
    increment: Increment,
) -> Vec<CellCoverage> {
    projector::project(&allocate_break(therapist, requested_minutes), increment)
}
