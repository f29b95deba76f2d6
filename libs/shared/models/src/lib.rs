pub mod error;
pub mod geo;
pub mod roster;
pub mod slot;

pub use error::{AppError, AppResult};
pub use geo::{AddressParts, GeoPoint};
pub use roster::{Case, Referral, ReferralPatch, ReferralStatus, ScheduleEntry, Therapist};
pub use slot::{Increment, Slot, SlotSet, ToggleOutcome};
