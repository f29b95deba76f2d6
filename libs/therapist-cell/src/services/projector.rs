// libs/therapist-cell/src/services/projector.rs
//! Re-bins 15-minute bookings onto the 15/30/60-minute display grid.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use shared_models::slot::{contiguous_runs, project_to_display, slots_to_hours, sub_slots_of_display_cell};
use shared_models::{Case, Increment, Slot, SlotSet};
use shared_utils::format_hours;

use crate::models::{
    Alignment, BlockTotal, CaseSegment, CellCoverage, CellSegments, Legend, LegendEntry,
};

/// Coverage of a single display cell, or `None` when nothing in it is set.
pub fn cell_coverage(slots: &SlotSet, cell: Slot, increment: Increment) -> Option<CellCoverage> {
    let sub_slots = sub_slots_of_display_cell(cell, increment);
    let total = sub_slots.len();
    let covered = sub_slots.iter().filter(|slot| slots.contains(slot)).count();
    if covered == 0 {
        return None;
    }

    let start_run = sub_slots.iter().take_while(|slot| slots.contains(slot)).count();
    let end_run = sub_slots
        .iter()
        .rev()
        .take_while(|slot| slots.contains(slot))
        .count();

    let (run, alignment) = if covered == total {
        (total, Alignment::Top)
    } else if start_run > 0 && end_run == 0 {
        (start_run, Alignment::Top)
    } else if end_run > 0 && start_run == 0 {
        (end_run, Alignment::Bottom)
    } else {
        // Coverage touches both edges or neither.
        (covered, Alignment::Top)
    };

    Some(CellCoverage {
        cell,
        covered,
        total,
        ratio: run as f64 / total as f64,
        alignment,
        block_start: false,
    })
}

/// Every touched display cell, chronologically.
pub fn project(slots: &SlotSet, increment: Increment) -> Vec<CellCoverage> {
    let touched: BTreeSet<Slot> = slots
        .iter()
        .map(|slot| project_to_display(*slot, increment))
        .collect();

    touched
        .iter()
        .filter_map(|cell| {
            let mut coverage = cell_coverage(slots, *cell, increment)?;
            coverage.block_start = previous_cell(*cell, increment)
                .map_or(true, |previous| !touched.contains(&previous));
            Some(coverage)
        })
        .collect()
}

pub fn project_case(case: &Case, increment: Increment) -> Vec<CellCoverage> {
    project(&case.slot_set(), increment)
}

fn previous_cell(cell: Slot, increment: Increment) -> Option<Slot> {
    let minute_of_day = cell.minute_of_day().checked_sub(increment.minutes())?;
    Slot::from_minute_of_day(cell.day(), minute_of_day).ok()
}

/// One total per contiguous run, anchored on the run's last fully covered
/// display cell (or its last cell when none is full).
pub fn block_totals(slots: &SlotSet, increment: Increment) -> Vec<BlockTotal> {
    let cell_width = increment.sub_slot_count();

    contiguous_runs(slots.iter().copied())
        .into_iter()
        .filter_map(|run| {
            let first_slot = *run.first()?;
            let last_slot = *run.last()?;

            let mut per_cell: BTreeMap<Slot, usize> = BTreeMap::new();
            for slot in &run {
                *per_cell.entry(project_to_display(*slot, increment)).or_default() += 1;
            }

            let last_full = per_cell
                .iter()
                .filter(|(_, count)| **count == cell_width)
                .map(|(cell, _)| *cell)
                .last();
            let anchor = last_full.or_else(|| per_cell.keys().next_back().copied())?;

            Some(BlockTotal {
                anchor,
                first_slot,
                last_slot,
                slot_count: run.len(),
                hours: slots_to_hours(run.len()),
                label: format!("{}h", format_hours(run.len())),
            })
        })
        .collect()
}

/// Per display cell, the vertical span each case occupies, ordered by start.
pub fn case_segments(cases: &[Case], increment: Increment) -> Vec<CellSegments> {
    let mut cells: BTreeMap<Slot, Vec<CaseSegment>> = BTreeMap::new();

    for case in cases {
        let booked = case.slot_set();
        let touched: BTreeSet<Slot> = booked
            .iter()
            .map(|slot| project_to_display(*slot, increment))
            .collect();

        for cell in touched {
            let sub_slots = sub_slots_of_display_cell(cell, increment);
            let count = sub_slots.len() as f64;
            let first = sub_slots.iter().position(|slot| booked.contains(slot));
            let last = sub_slots.iter().rposition(|slot| booked.contains(slot));

            if let (Some(first), Some(last)) = (first, last) {
                cells.entry(cell).or_default().push(CaseSegment {
                    case_id: case.id.clone(),
                    color_index: case.color_index,
                    start_pct: (first as f64 / count * 100.0).round() as u8,
                    end_pct: ((last + 1) as f64 / count * 100.0).round() as u8,
                });
            }
        }
    }

    cells
        .into_iter()
        .map(|(cell, mut segments)| {
            segments.sort_by_key(|segment| segment.start_pct);
            CellSegments { cell, segments }
        })
        .collect()
}

/// Case list with booked hours and a grand total.
pub fn legend(cases: &[Case]) -> Legend {
    let mut seen = HashSet::new();
    let mut total_slots = 0;
    let mut entries = Vec::new();

    for case in cases {
        if !seen.insert(case.id.as_str()) {
            continue;
        }
        total_slots += case.schedule.len();
        entries.push(LegendEntry {
            case_id: case.id.clone(),
            label: format!("{} - #{}", case.name, case.patient_id),
            color_index: case.color_index,
            hours_label: format!("{}h", format_hours(case.schedule.len())),
        });
    }

    Legend {
        entries,
        total_label: format!("Total: {}h", format_hours(total_slots)),
    }
}
