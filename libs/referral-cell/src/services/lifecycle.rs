// libs/referral-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use geocoding_cell::{Geocoder, NominatimGeocoder};
use shared_config::AppConfig;
use shared_database::Store;
use shared_models::slot::toggle_selection;
use shared_models::{
    AddressParts, AppError, GeoPoint, Increment, Referral, ReferralPatch, Slot, ToggleOutcome,
};
use shared_utils::{round_to_quarter, slugify, unique_id};

use crate::models::NewReferral;

/// Max hours per day a referral asks for when none was entered.
pub fn default_max_per_day(total_referred_hours: f64) -> f64 {
    round_to_quarter(total_referred_hours / 5.0)
}

pub struct ReferralService {
    geocoder: Arc<dyn Geocoder>,
}

impl ReferralService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_geocoder(NominatimGeocoder::shared(config))
    }

    pub fn with_geocoder(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Validates, geocodes the address and stores the referral at the front
    /// of the list. Nothing is saved when any step fails.
    pub async fn create_referral(
        &self,
        store: &mut Store,
        request: NewReferral,
    ) -> Result<Referral, AppError> {
        let child_name = request.child_name.trim().to_string();
        let child_id = request.child_id.trim().to_string();
        let address = trimmed(&request.address);
        debug!("Creating referral for child {}", child_id);

        if child_name.is_empty() || child_id.is_empty() {
            return Err(AppError::Validation("Please enter Child Name and Child ID.".to_string()));
        }
        validate_address(&address)?;

        if store.find_referral_by_child_id(&child_id).is_some() {
            warn!("Referral for child {} already exists", child_id);
            return Err(AppError::DuplicateChildId(child_id));
        }

        let point = self.locate(&address).await?;

        let base = slugify(&format!("{}-{}", child_name, child_id));
        let id = unique_id(&base, "referral", |candidate| store.find_referral(candidate).is_some());

        let total_referred_hours = round_to_quarter(request.total_referred_hours);
        let (max_desired_per_day, max_desired_per_day_pinned) = match request.max_desired_per_day {
            Some(max) => (round_to_quarter(max), true),
            None => (default_max_per_day(total_referred_hours), false),
        };

        let referral = Referral {
            id: id.clone(),
            child_name,
            child_id,
            total_referred_hours,
            max_desired_per_day,
            max_desired_per_day_pinned,
            status: request.status,
            address,
            lat: Some(point.lat),
            lon: Some(point.lon),
            preferred_availability: request.preferred_availability,
            created_at: None,
            updated_at: None,
        };

        store.add_referral(referral)?;
        info!("Created referral {}", id);

        store
            .find_referral(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("referral {}", id)))
    }

    /// Applies a partial edit.
    ///
    /// An explicit `max_desired_per_day` pins the value. While unpinned, a new
    /// `total_referred_hours` recomputes it. A changed address is geocoded
    /// again before anything is written.
    pub async fn update_referral(
        &self,
        store: &mut Store,
        referral_id: &str,
        mut patch: ReferralPatch,
    ) -> Result<Referral, AppError> {
        debug!("Updating referral {}", referral_id);

        let current = store
            .find_referral(referral_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("referral {}", referral_id)))?;

        if let Some(child_name) = patch.child_name.as_mut() {
            *child_name = child_name.trim().to_string();
            if child_name.is_empty() {
                return Err(AppError::Validation("Child Name is required.".to_string()));
            }
        }
        if let Some(child_id) = patch.child_id.as_mut() {
            *child_id = child_id.trim().to_string();
            if child_id.is_empty() {
                return Err(AppError::Validation("Child ID is required.".to_string()));
            }
        }

        let next_child_id = patch.child_id.as_deref().unwrap_or(&current.child_id);
        store.ensure_child_id_free(next_child_id, Some(referral_id))?;

        if let Some(total) = patch.total_referred_hours.as_mut() {
            *total = round_to_quarter(*total);
        }

        match patch.max_desired_per_day {
            Some(max) => {
                patch.max_desired_per_day = Some(round_to_quarter(max));
                patch.max_desired_per_day_pinned = Some(true);
            }
            None => {
                let pinned = patch
                    .max_desired_per_day_pinned
                    .unwrap_or(current.max_desired_per_day_pinned);
                if let (false, Some(total)) = (pinned, patch.total_referred_hours) {
                    patch.max_desired_per_day = Some(default_max_per_day(total));
                }
            }
        }

        if let Some(address) = patch.address.as_mut() {
            *address = trimmed(address);
            validate_address(address)?;

            let moved = *address != current.address || current.coordinate().is_none();
            if moved && patch.coordinate.is_none() {
                patch.coordinate = Some(self.locate(address).await?);
            }
        }

        let updated = store.update_referral(referral_id, patch)?.clone();
        info!("Updated referral {}", referral_id);
        Ok(updated)
    }

    pub fn delete_referral(&self, store: &mut Store, referral_id: &str) -> Result<Option<Referral>, AppError> {
        let removed = store.delete_referral(referral_id)?;
        if removed.is_some() {
            info!("Deleted referral {}", referral_id);
        }
        Ok(removed)
    }

    /// Toggles one display cell of the referral's preferred availability.
    /// No overlap rule applies to preferences.
    pub fn toggle_preferred_cell(
        &self,
        store: &mut Store,
        referral_id: &str,
        cell: Slot,
        increment: Increment,
    ) -> Result<ToggleOutcome, AppError> {
        let mut preferred = store
            .find_referral(referral_id)
            .map(|referral| referral.preferred_availability.clone())
            .ok_or_else(|| AppError::NotFound(format!("referral {}", referral_id)))?;

        let outcome = toggle_selection(&mut preferred, cell, increment);
        store.update_referral(
            referral_id,
            ReferralPatch {
                preferred_availability: Some(preferred),
                ..Default::default()
            },
        )?;

        debug!("Toggled preferred cell {} on referral {}", cell, referral_id);
        Ok(outcome)
    }

    async fn locate(&self, address: &AddressParts) -> Result<GeoPoint, AppError> {
        self.geocoder.geocode(address).await.map_err(|e| {
            error!("Referral address could not be geocoded: {}", e);
            AppError::from(e)
        })
    }
}

fn validate_address(address: &AddressParts) -> Result<(), AppError> {
    if address.cross_streets.is_empty() || address.city.is_empty() || address.zip.is_empty() {
        return Err(AppError::Validation(
            "Please enter Cross Streets, City, and Zip.".to_string(),
        ));
    }
    Ok(())
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
