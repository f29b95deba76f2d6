pub mod breaks;
pub mod matching;
pub mod projector;
pub mod roster;
pub mod scheduler;

pub use breaks::{allocate_break, break_coverage, break_runs, break_slot_count};
pub use matching::{passes_hour_budget, remaining_hours, therapist_options, MatchEngine};
pub use projector::{block_totals, case_segments, legend, project, project_case};
pub use roster::TherapistService;
pub use scheduler::{toggle_case_cell, toggle_display_cell, toggle_therapist_case};
