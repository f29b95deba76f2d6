// libs/therapist-cell/src/services/scheduler.rs
//! Per-case booking edits with overlap prevention across one therapist.

use tracing::{debug, info, warn};

use shared_database::Store;
use shared_models::slot::sub_slots_of_display_cell;
use shared_models::{AppError, Case, Increment, Slot, Therapist, ToggleOutcome};

/// Toggles one display cell on `target`.
///
/// When every sub-slot is already booked on `target` they are all released.
/// Otherwise the missing sub-slots are added, unless any sub-slot is booked by
/// a sibling case, in which case nothing changes and `Overlap` is returned.
pub fn toggle_display_cell<'a, I>(
    target: &mut Case,
    siblings: I,
    cell: Slot,
    increment: Increment,
) -> Result<ToggleOutcome, AppError>
where
    I: IntoIterator<Item = &'a Case>,
{
    let sub_slots = sub_slots_of_display_cell(cell, increment);

    if sub_slots.iter().all(|slot| target.has_slot(slot)) {
        target
            .schedule
            .retain(|entry| !sub_slots.contains(&entry.slot_id));
        debug!("Released {} slots from case {}", sub_slots.len(), target.id);
        return Ok(ToggleOutcome::Removed(sub_slots));
    }

    let mut conflicts: Vec<Slot> = siblings
        .into_iter()
        .filter(|sibling| sibling.id != target.id)
        .flat_map(|sibling| sub_slots.iter().filter(move |slot| sibling.has_slot(slot)))
        .copied()
        .collect();

    if !conflicts.is_empty() {
        conflicts.sort();
        conflicts.dedup();
        warn!(
            "Toggle on case {} rejected, {} slot(s) booked by another case",
            target.id,
            conflicts.len()
        );
        return Err(AppError::Overlap {
            case_id: target.id.clone(),
            conflicts: conflicts.iter().map(Slot::to_string).collect(),
        });
    }

    let added: Vec<Slot> = sub_slots
        .into_iter()
        .filter(|slot| !target.has_slot(slot))
        .collect();
    let entries: Vec<_> = added.iter().map(|slot| target.entry_for(*slot)).collect();
    target.schedule.extend(entries);

    debug!("Booked {} slots on case {}", added.len(), target.id);
    Ok(ToggleOutcome::Added(added))
}

/// Same as [`toggle_display_cell`], picking the target out of the therapist's
/// own case list so the remaining cases act as siblings.
pub fn toggle_therapist_case(
    therapist: &mut Therapist,
    case_id: &str,
    cell: Slot,
    increment: Increment,
) -> Result<ToggleOutcome, AppError> {
    let index = therapist
        .cases
        .iter()
        .position(|case| case.id == case_id)
        .ok_or_else(|| AppError::NotFound(format!("case {} for therapist {}", case_id, therapist.id)))?;

    let (before, rest) = therapist.cases.split_at_mut(index);
    let (target, after) = rest
        .split_first_mut()
        .ok_or_else(|| AppError::NotFound(format!("case {}", case_id)))?;

    let outcome = toggle_display_cell(target, before.iter().chain(after.iter()), cell, increment)?;
    therapist.recompute_total_hours();
    Ok(outcome)
}

/// Applies a toggle through the store. On `Overlap` nothing is written.
pub fn toggle_case_cell(
    store: &mut Store,
    therapist_id: &str,
    case_id: &str,
    cell: Slot,
    increment: Increment,
) -> Result<ToggleOutcome, AppError> {
    debug!(
        "Toggling {} ({}m) on case {} of therapist {}",
        cell,
        increment.minutes(),
        case_id,
        therapist_id
    );

    let outcome = store.try_update_therapists(|therapists| {
        let therapist = therapists
            .iter_mut()
            .find(|t| t.id == therapist_id)
            .ok_or_else(|| AppError::NotFound(format!("therapist {}", therapist_id)))?;
        toggle_therapist_case(therapist, case_id, cell, increment)
    })?;

    info!("Schedule updated for therapist {}", therapist_id);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::SlotSet;
    use shared_utils::test_utils::{block, slot, slots, TestCase, TestTherapist};

    #[test]
    fn test_overlap_rejected_and_nothing_changes() {
        let mut therapist = TestTherapist::new("Emily", "Chen")
            .case(TestCase::new("case1").booked(block(&[2], "10:00", "11:00")).build())
            .case(TestCase::new("case2").color(1).build())
            .build();
        let before = therapist.clone();

        let result = toggle_therapist_case(&mut therapist, "case2", slot("2-10:30"), Increment::Fifteen);

        match result {
            Err(AppError::Overlap { case_id, conflicts }) => {
                assert_eq!(case_id, "case2");
                assert_eq!(conflicts, vec!["2-10:30".to_string()]);
            }
            other => panic!("expected overlap, got {:?}", other),
        }
        assert_eq!(therapist, before);
    }

    #[test]
    fn test_partial_conflict_adds_nothing() {
        let mut therapist = TestTherapist::new("Emily", "Chen")
            .case(TestCase::new("case1").booked(slots(&["3-9:45"])).build())
            .case(TestCase::new("case2").build())
            .build();

        let result = toggle_therapist_case(&mut therapist, "case2", slot("3-9:00"), Increment::Sixty);

        assert!(matches!(result, Err(AppError::Overlap { .. })));
        assert!(therapist.case("case2").unwrap().schedule.is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_schedule() {
        let mut therapist = TestTherapist::new("Jacob", "Cohen")
            .case(TestCase::new("case1").booked(slots(&["1-9:00"])).build())
            .build();
        let before = therapist.case("case1").unwrap().slot_set();

        let first = toggle_therapist_case(&mut therapist, "case1", slot("1-9:00"), Increment::Thirty).unwrap();
        assert_eq!(first, ToggleOutcome::Added(vec![slot("1-9:15")]));
        assert_eq!(therapist.total_hours, 0.5);

        let second = toggle_therapist_case(&mut therapist, "case1", slot("1-9:00"), Increment::Thirty).unwrap();
        assert_eq!(second, ToggleOutcome::Removed(vec![slot("1-9:00"), slot("1-9:15")]));
        assert!(therapist.case("case1").unwrap().slot_set().is_empty());

        // A full cell toggled off and on again comes back identical.
        toggle_therapist_case(&mut therapist, "case1", slot("1-9:00"), Increment::Fifteen).unwrap();
        assert_eq!(therapist.case("case1").unwrap().slot_set(), before);
    }

    #[test]
    fn test_entries_carry_case_identity() {
        let mut case = TestCase::new("kid").color(4).build();
        toggle_display_cell(&mut case, [], slot("5-14:00"), Increment::Fifteen).unwrap();

        let entry = &case.schedule[0];
        assert_eq!(entry.case_id, "kid");
        assert_eq!(entry.case_name, "Child kid");
        assert_eq!(entry.color_index, 4);
    }

    #[test]
    fn test_off_grid_cell_books_whole_grid_cell() {
        let mut therapist = TestTherapist::new("Mia", "Lee")
            .case(TestCase::new("case1").build())
            .build();

        let outcome = toggle_therapist_case(&mut therapist, "case1", slot("1-9:15"), Increment::Sixty).unwrap();

        assert_eq!(outcome, ToggleOutcome::Added(block(&[1], "9:00", "10:00").into_iter().collect()));
        assert_eq!(therapist.case("case1").unwrap().slot_set(), block(&[1], "9:00", "10:00"));
    }

    #[test]
    fn test_toggle_sequences_never_double_book() {
        let increments = [Increment::Fifteen, Increment::Thirty, Increment::Sixty];
        let case_ids = ["a", "b", "c"];
        // A narrow window keeps the cases colliding.
        let cells: Vec<Slot> = Slot::week()
            .filter(|cell| cell.day() == 1 && cell.hour() < 10)
            .collect();

        let mut therapist = TestTherapist::new("Emily", "Chen")
            .case(TestCase::new("a").build())
            .case(TestCase::new("b").color(1).build())
            .case(TestCase::new("c").color(2).build())
            .build();
        let mut rejected = 0;

        for step in 0..900usize {
            let cell = cells[(step * 7 + step / 5) % cells.len()];
            let increment = increments[step % increments.len()];
            let case_id = case_ids[(step / 2) % case_ids.len()];
            let before = therapist.clone();

            match toggle_therapist_case(&mut therapist, case_id, cell, increment) {
                Ok(_) => {}
                Err(AppError::Overlap { .. }) => {
                    rejected += 1;
                    assert_eq!(therapist, before, "rejected toggle changed state at step {}", step);
                }
                Err(other) => panic!("unexpected error at step {}: {:?}", step, other),
            }

            let mut seen = SlotSet::new();
            for case in &therapist.cases {
                assert_eq!(case.slot_set().len(), case.schedule.len());
                for booked in case.slot_set() {
                    assert!(seen.insert(booked), "{} booked twice after step {}", booked, step);
                }
            }
            assert_eq!(therapist.total_hours, seen.len() as f64 / 4.0);
        }

        assert!(rejected > 0);
    }

    #[test]
    fn test_unknown_case_is_not_found() {
        let mut therapist = TestTherapist::new("Mia", "Lee").build();
        let result = toggle_therapist_case(&mut therapist, "nope", slot("1-9:00"), Increment::Fifteen);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
