// libs/therapist-cell/src/services/roster.rs
use std::sync::Arc;

use tracing::{debug, error, info};

use geocoding_cell::{Geocoder, NominatimGeocoder};
use shared_config::AppConfig;
use shared_database::Store;
use shared_models::{AddressParts, AppError, Case, Therapist};
use shared_utils::{slugify, unique_id};

use crate::models::{NewCase, NewTherapist, TherapistPatch};

const CASE_COLORS: u8 = 10;

/// Therapist and case records: creation, edits, referral assignment.
pub struct TherapistService {
    geocoder: Arc<dyn Geocoder>,
}

impl TherapistService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_geocoder(NominatimGeocoder::shared(config))
    }

    pub fn with_geocoder(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub fn add_therapist(&self, store: &mut Store, request: NewTherapist) -> Result<Therapist, AppError> {
        let first_name = request.first_name.trim().to_string();
        let last_name = request.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::Validation("Please enter first and last name.".to_string()));
        }

        let base = slugify(&format!("{}-{}", first_name, last_name));
        let id = unique_id(&base, "therapist", |candidate| store.therapist(candidate).is_some());

        let therapist = Therapist {
            id,
            first_name,
            last_name,
            phone: request.phone.trim().to_string(),
            email: request.email.trim().to_string(),
            borough_prefs: request.borough_prefs,
            required_hours: request.required_hours,
            total_hours: 0.0,
            cases: vec![],
        };

        let created = therapist.clone();
        store.set_therapists(|therapists| therapists.push(therapist))?;
        info!("Added therapist {}", created.id);
        Ok(created)
    }

    pub fn update_therapist(
        &self,
        store: &mut Store,
        therapist_id: &str,
        patch: TherapistPatch,
    ) -> Result<Therapist, AppError> {
        debug!("Updating therapist {}", therapist_id);

        store.try_update_therapists(|therapists| {
            let therapist = therapists
                .iter_mut()
                .find(|t| t.id == therapist_id)
                .ok_or_else(|| AppError::NotFound(format!("therapist {}", therapist_id)))?;

            if let Some(first_name) = patch.first_name {
                therapist.first_name = first_name.trim().to_string();
            }
            if let Some(last_name) = patch.last_name {
                therapist.last_name = last_name.trim().to_string();
            }
            if therapist.first_name.is_empty() || therapist.last_name.is_empty() {
                return Err(AppError::Validation("Please enter first and last name.".to_string()));
            }
            if let Some(phone) = patch.phone {
                therapist.phone = phone.trim().to_string();
            }
            if let Some(email) = patch.email {
                therapist.email = email.trim().to_string();
            }
            if let Some(required_hours) = patch.required_hours {
                therapist.required_hours = required_hours;
            }
            if let Some(borough_prefs) = patch.borough_prefs {
                therapist.borough_prefs = borough_prefs;
            }

            Ok(therapist.clone())
        })
    }

    /// Geocodes the address first; when that fails nothing is saved.
    pub async fn add_case(
        &self,
        store: &mut Store,
        therapist_id: &str,
        request: NewCase,
    ) -> Result<Case, AppError> {
        debug!("Adding case {} to therapist {}", request.patient_id, therapist_id);

        let therapist = store
            .therapist(therapist_id)
            .ok_or_else(|| AppError::NotFound(format!("therapist {}", therapist_id)))?;

        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();
        let patient_id = request.patient_id.trim();
        let address = trimmed(&request.address);
        if first_name.is_empty()
            || last_name.is_empty()
            || patient_id.is_empty()
            || address.cross_streets.is_empty()
            || address.city.is_empty()
            || address.zip.is_empty()
        {
            return Err(AppError::Validation(
                "First name, last name, ID, cross streets, city and zip are required.".to_string(),
            ));
        }

        let base = slugify(&format!("{}-{}-{}", first_name, last_name, patient_id));
        let mut case = Case {
            id: unique_id(&base, "case", |candidate| therapist.case(candidate).is_some()),
            name: format!("{} {}", first_name, last_name),
            patient_id: patient_id.to_string(),
            address,
            lat: None,
            lon: None,
            schedule: vec![],
            color_index: next_color_index(therapist),
        };

        let point = self.geocoder.geocode(&case.address).await.map_err(|e| {
            error!("Case address could not be geocoded: {}", e);
            AppError::from(e)
        })?;
        case.set_coordinate(point);

        let created = case.clone();
        attach_case(store, therapist_id, case)?;
        info!("Added case {} to therapist {}", created.id, therapist_id);
        Ok(created)
    }

    /// Finds or creates the therapist's case for a referral. The referral's
    /// preferred availability is not copied into the schedule.
    pub fn assign_referral(
        &self,
        store: &mut Store,
        therapist_id: &str,
        referral_id: &str,
    ) -> Result<Case, AppError> {
        let referral = store
            .find_referral(referral_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("referral {}", referral_id)))?;
        let therapist = store
            .therapist(therapist_id)
            .ok_or_else(|| AppError::NotFound(format!("therapist {}", therapist_id)))?;

        if let Some(existing) = therapist
            .cases
            .iter()
            .find(|case| case.patient_id == referral.child_id)
        {
            debug!("Referral {} already assigned as case {}", referral_id, existing.id);
            return Ok(existing.clone());
        }

        let name = if referral.child_name.is_empty() {
            "child"
        } else {
            referral.child_name.as_str()
        };
        let base = slugify(&format!("{}-{}", name, referral.child_id));

        let case = Case {
            id: unique_id(&base, "case", |candidate| therapist.case(candidate).is_some()),
            name: referral.child_name.clone(),
            patient_id: referral.child_id.clone(),
            address: referral.address.clone(),
            lat: referral.lat,
            lon: referral.lon,
            schedule: vec![],
            color_index: next_color_index(therapist),
        };

        let created = case.clone();
        attach_case(store, therapist_id, case)?;
        info!("Assigned referral {} to therapist {} as case {}", referral_id, therapist_id, created.id);
        Ok(created)
    }
}

/// One past the highest color in use, wrapping at the palette size.
/// Imported colors outside the palette wrap first.
pub fn next_color_index(therapist: &Therapist) -> u8 {
    therapist
        .cases
        .iter()
        .map(|case| case.color_index)
        .max()
        .map_or(0, |max| (max % CASE_COLORS + 1) % CASE_COLORS)
}

fn attach_case(store: &mut Store, therapist_id: &str, case: Case) -> Result<(), AppError> {
    store.try_update_therapists(|therapists| {
        let therapist = therapists
            .iter_mut()
            .find(|t| t.id == therapist_id)
            .ok_or_else(|| AppError::NotFound(format!("therapist {}", therapist_id)))?;
        therapist.cases.push(case);
        Ok(())
    })
}

fn trimmed(address: &AddressParts) -> AddressParts {
    AddressParts {
        address: address.address.trim().to_string(),
        cross_streets: address.cross_streets.trim().to_string(),
        city: address.city.trim().to_string(),
        state: address.state.trim().to_string(),
        zip: address.zip.trim().to_string(),
    }
}
