pub mod lifecycle;
pub mod options;

pub use lifecycle::{default_max_per_day, ReferralService};
pub use options::{referral_options, search_criteria_for};
