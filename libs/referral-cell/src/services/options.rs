// libs/referral-cell/src/services/options.rs
use shared_models::Referral;
use therapist_cell::SearchCriteria;

use crate::models::ReferralOption;

/// Child pickers, ordered by name then id, both case-insensitive. Referrals
/// with neither a name nor an id are skipped.
pub fn referral_options(referrals: &[Referral]) -> Vec<ReferralOption> {
    let mut sorted: Vec<&Referral> = referrals.iter().collect();
    sorted.sort_by_cached_key(|r| (r.child_name.to_lowercase(), r.child_id.to_lowercase()));

    sorted
        .into_iter()
        .filter_map(|r| {
            let name = r.child_name.trim();
            let child_id = r.child_id.trim();
            let label = match (name.is_empty(), child_id.is_empty()) {
                (true, true) => return None,
                (_, true) => name.to_string(),
                _ => format!("{} — #{}", name, child_id),
            };
            Some(ReferralOption {
                id: r.id.clone(),
                label,
            })
        })
        .collect()
}

/// Fills the referral's side of a search: preferred slots, hours needed and
/// where the child lives. Filters the user chose stay as given in `base`.
pub fn search_criteria_for(referral: &Referral, base: SearchCriteria) -> SearchCriteria {
    SearchCriteria {
        selected_slots: referral.preferred_availability.clone(),
        required_total_hours: referral.total_referred_hours,
        referral_address: referral.address.clone(),
        referral_coordinate: referral.coordinate(),
        ..base
    }
}
