// libs/therapist-cell/src/services/matching.rs
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use geocoding_cell::{haversine_miles, Geocoder, NominatimGeocoder};
use shared_config::AppConfig;
use shared_database::Store;
use shared_models::slot::slots_to_hours;
use shared_models::{AppError, GeoPoint, SlotSet, Therapist};
use shared_utils::format_hours;

use crate::models::{CaseDistance, SearchCriteria, TherapistMatch, TherapistOption};
use crate::services::breaks::allocate_break;

/// Filters therapists against a referral's needs.
pub struct MatchEngine {
    geocoder: Arc<dyn Geocoder>,
}

impl MatchEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_geocoder(NominatimGeocoder::shared(config))
    }

    pub fn with_geocoder(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Runs the borough, hour-budget, remaining-availability and distance
    /// filters in that order. Case coordinates resolved along the way are
    /// written back to the store per therapist and stay written even if a
    /// later step fails.
    pub async fn search(
        &self,
        store: &mut Store,
        criteria: &SearchCriteria,
    ) -> Result<Vec<TherapistMatch>, AppError> {
        debug!(
            "Searching {} therapists: boroughs={:?} threshold={:?} need={}h break={}m max_miles={}",
            store.therapists().len(),
            criteria.boroughs,
            criteria.hours_threshold,
            criteria.required_total_hours,
            criteria.break_minutes,
            criteria.max_miles
        );

        let origin = if criteria.distance_enabled() {
            Some(self.referral_point(criteria).await?)
        } else {
            None
        };

        let candidates: Vec<Therapist> = store.therapists().to_vec();
        let mut matches = Vec::new();

        for therapist in candidates {
            if !therapist.serves_any_borough(&criteria.boroughs) {
                debug!("{} excluded: borough", therapist.id);
                continue;
            }

            if !passes_hour_budget(&therapist, criteria.hours_threshold) {
                debug!("{} excluded: hour budget", therapist.id);
                continue;
            }

            let free_slots =
                remaining_slot_count(&therapist, &criteria.selected_slots, criteria.break_minutes);
            let remaining_hours = slots_to_hours(free_slots);
            if remaining_hours < criteria.required_total_hours {
                debug!(
                    "{} excluded: {}h free, {}h needed",
                    therapist.id, remaining_hours, criteria.required_total_hours
                );
                continue;
            }

            let mut therapist = therapist;
            let mut farthest_case_miles = None;

            if let Some(origin) = origin {
                therapist = self.resolve_case_coordinates(store, therapist).await?;

                let Some(distances) = case_miles(&therapist, origin) else {
                    warn!("{} excluded: case without coordinates", therapist.id);
                    continue;
                };
                let farthest = distances.into_iter().fold(None, |acc: Option<f64>, miles| {
                    Some(acc.map_or(miles, |current| current.max(miles)))
                });
                if farthest.is_some_and(|miles| miles > criteria.max_miles) {
                    debug!("{} excluded: farthest case {:?} mi", therapist.id, farthest);
                    continue;
                }
                farthest_case_miles = farthest;
            }

            let match_reasons =
                match_reasons(&therapist, criteria, free_slots, farthest_case_miles);
            matches.push(TherapistMatch {
                therapist,
                remaining_hours,
                farthest_case_miles,
                match_reasons,
            });
        }

        matches.sort_by_key(|m| m.therapist.display_name().to_lowercase());
        info!("Search matched {} therapist(s)", matches.len());
        Ok(matches)
    }

    /// Hours and distance per case of one therapist, for the search legend.
    /// Missing case coordinates are looked up and persisted; lookups that
    /// fail leave `miles` empty.
    pub async fn case_distances(
        &self,
        store: &mut Store,
        therapist_id: &str,
        origin: Option<GeoPoint>,
    ) -> Result<Vec<CaseDistance>, AppError> {
        let therapist = store
            .therapist(therapist_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("therapist {}", therapist_id)))?;
        let therapist = self.resolve_case_coordinates(store, therapist).await?;

        Ok(therapist
            .cases
            .iter()
            .map(|case| CaseDistance {
                case_id: case.id.clone(),
                label: format!("{} - #{}", case.name, case.patient_id),
                color_index: case.color_index,
                hours_label: format!("{}h", format_hours(case.schedule.len())),
                miles: origin
                    .zip(case.coordinate())
                    .map(|(from, to)| haversine_miles(from, to)),
            })
            .collect())
    }

    async fn referral_point(&self, criteria: &SearchCriteria) -> Result<GeoPoint, AppError> {
        if let Some(point) = criteria.referral_coordinate {
            return Ok(point);
        }

        self.geocoder
            .geocode(&criteria.referral_address)
            .await
            .map_err(|e| {
                error!("Could not geocode referral address: {}", e);
                AppError::from(e)
            })
    }

    /// Geocodes every case missing a coordinate. Successes are saved right
    /// away; failures are logged and left empty.
    async fn resolve_case_coordinates(
        &self,
        store: &mut Store,
        mut therapist: Therapist,
    ) -> Result<Therapist, AppError> {
        let mut changed = false;

        for case in therapist.cases.iter_mut().filter(|case| case.coordinate().is_none()) {
            match self.geocoder.geocode(&case.address).await {
                Ok(point) => {
                    case.set_coordinate(point);
                    changed = true;
                }
                Err(e) => warn!("Case {} has no coordinate: {}", case.id, e),
            }
        }

        if changed {
            let resolved = therapist.clone();
            store.set_therapists(|therapists| {
                let Some(stored) = therapists.iter_mut().find(|t| t.id == resolved.id) else {
                    return;
                };
                for case in stored.cases.iter_mut() {
                    if let Some(point) = resolved.case(&case.id).and_then(|c| c.coordinate()) {
                        case.set_coordinate(point);
                    }
                }
            })?;
            info!("Saved case coordinates for therapist {}", therapist.id);
        }

        Ok(therapist)
    }
}

/// With a threshold, `total_hours <= threshold`; otherwise the therapist
/// must still be under `required_hours`.
pub fn passes_hour_budget(therapist: &Therapist, threshold: Option<f64>) -> bool {
    match threshold {
        Some(limit) => therapist.total_hours <= limit,
        None => therapist.total_hours < therapist.required_hours,
    }
}

/// Selected slots the therapist is neither booked for nor travelling in.
pub fn remaining_slot_count(therapist: &Therapist, selected: &SlotSet, break_minutes: i32) -> usize {
    let busy = therapist.busy_set();
    let breaks = allocate_break(therapist, break_minutes);

    selected
        .iter()
        .filter(|slot| !busy.contains(slot) && !breaks.contains(slot))
        .count()
}

pub fn remaining_hours(therapist: &Therapist, selected: &SlotSet, break_minutes: i32) -> f64 {
    slots_to_hours(remaining_slot_count(therapist, selected, break_minutes))
}

/// Distance to every case, or `None` when any case lacks a coordinate.
fn case_miles(therapist: &Therapist, origin: GeoPoint) -> Option<Vec<f64>> {
    therapist
        .cases
        .iter()
        .map(|case| case.coordinate().map(|point| haversine_miles(origin, point)))
        .collect()
}

fn match_reasons(
    therapist: &Therapist,
    criteria: &SearchCriteria,
    free_slots: usize,
    farthest_case_miles: Option<f64>,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if !criteria.boroughs.is_empty() {
        let served: Vec<&str> = therapist
            .borough_prefs
            .iter()
            .filter(|pref| criteria.boroughs.contains(pref))
            .map(String::as_str)
            .collect();
        reasons.push(format!("Serves {}", served.join(", ")));
    }

    let booked = format_hours(therapist.booked_slot_count());
    reasons.push(match criteria.hours_threshold {
        Some(limit) => format!("{}h booked, within {}h limit", booked, limit),
        None => format!("{}h booked of {}h required", booked, therapist.required_hours),
    });

    reasons.push(format!("{}h of selected time free", format_hours(free_slots)));

    if criteria.distance_enabled() {
        reasons.push(match farthest_case_miles {
            Some(miles) => format!("All cases within {:.1} mi", miles),
            None => "No current cases to travel from".to_string(),
        });
    }

    reasons
}

/// Preliminary picker: borough OR filter plus the optional hours threshold,
/// sorted by name.
pub fn therapist_options(
    therapists: &[Therapist],
    boroughs: &[String],
    hours_threshold: Option<f64>,
) -> Vec<TherapistOption> {
    let mut shortlist: Vec<&Therapist> = therapists
        .iter()
        .filter(|t| t.serves_any_borough(boroughs))
        .filter(|t| hours_threshold.map_or(true, |limit| t.total_hours <= limit))
        .collect();
    shortlist.sort_by_key(|t| t.display_name().to_lowercase());

    shortlist
        .into_iter()
        .map(|t| TherapistOption {
            id: t.id.clone(),
            label: format!("Dr. {} ({}h)", t.display_name(), format_hours(t.booked_slot_count())),
        })
        .collect()
}
