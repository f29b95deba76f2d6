// libs/shared/database/src/store.rs
//! Explicit application state with write-through persistence.
//!
//! Every committed change recomputes derived therapist totals and hands the
//! full snapshot to the [`StorageBackend`] before returning.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use shared_models::roster::normalize_child_id;
use shared_models::{AppError, Referral, ReferralPatch, Therapist};

use crate::backend::{MemoryBackend, StorageBackend};
use crate::seed;
use crate::snapshot::Snapshot;

pub struct Store {
    therapists: Vec<Therapist>,
    referrals: Vec<Referral>,
    backend: Box<dyn StorageBackend>,
}

impl Store {
    /// Loads whatever the backend holds, or starts empty.
    pub fn open(backend: impl StorageBackend + 'static) -> Result<Self, AppError> {
        let snapshot = backend.load()?.unwrap_or_default();
        let mut store = Self {
            therapists: snapshot.therapists,
            referrals: snapshot.referrals,
            backend: Box::new(backend),
        };
        store.hydrate_totals();
        Ok(store)
    }

    /// Like [`Store::open`], but an empty backend gets the Queens demo dataset.
    pub fn seeded(backend: impl StorageBackend + 'static) -> Result<Self, AppError> {
        match backend.load()? {
            Some(snapshot) => {
                let mut store = Self {
                    therapists: snapshot.therapists,
                    referrals: snapshot.referrals,
                    backend: Box::new(backend),
                };
                store.hydrate_totals();
                Ok(store)
            }
            None => {
                info!("No persisted state, applying demo dataset");
                let mut store = Self {
                    therapists: vec![],
                    referrals: vec![],
                    backend: Box::new(backend),
                };
                store.replace(seed::queens_dataset()?)?;
                Ok(store)
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            therapists: vec![],
            referrals: vec![],
            backend: Box::new(MemoryBackend::new()),
        }
    }

    // ==============================================================================
    // THERAPISTS
    // ==============================================================================

    pub fn therapists(&self) -> &[Therapist] {
        &self.therapists
    }

    pub fn therapist(&self, therapist_id: &str) -> Option<&Therapist> {
        self.therapists.iter().find(|t| t.id == therapist_id)
    }

    /// Applies `updater`, recomputes every therapist's `total_hours`, persists.
    pub fn set_therapists<F>(&mut self, updater: F) -> Result<&[Therapist], AppError>
    where
        F: FnOnce(&mut Vec<Therapist>),
    {
        updater(&mut self.therapists);
        self.hydrate_totals();
        self.persist()?;
        Ok(&self.therapists)
    }

    /// Runs a fallible edit against a working copy. Nothing is committed or
    /// persisted unless `edit` succeeds.
    pub fn try_update_therapists<F, T>(&mut self, edit: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Vec<Therapist>) -> Result<T, AppError>,
    {
        let mut working = self.therapists.clone();
        let outcome = edit(&mut working)?;
        self.therapists = working;
        self.hydrate_totals();
        self.persist()?;
        Ok(outcome)
    }

    // ==============================================================================
    // REFERRALS
    // ==============================================================================

    pub fn referrals(&self) -> &[Referral] {
        &self.referrals
    }

    pub fn find_referral(&self, referral_id: &str) -> Option<&Referral> {
        self.referrals.iter().find(|r| r.id == referral_id)
    }

    /// Case-insensitive lookup; a blank child id matches nothing.
    pub fn find_referral_by_child_id(&self, child_id: &str) -> Option<&Referral> {
        let wanted = normalize_child_id(child_id);
        if wanted.is_empty() {
            return None;
        }
        self.referrals
            .iter()
            .find(|r| r.normalized_child_id() == wanted)
    }

    /// Inserts at the front and stamps `created_at`/`updated_at`.
    pub fn add_referral(&mut self, mut referral: Referral) -> Result<&[Referral], AppError> {
        self.ensure_child_id_free(&referral.child_id, None)?;

        let now = Utc::now();
        referral.created_at = Some(now);
        referral.updated_at = Some(now);

        debug!("Adding referral {} ({})", referral.id, referral.child_id);
        self.referrals.insert(0, referral);
        self.persist()?;
        Ok(&self.referrals)
    }

    pub fn update_referral(
        &mut self,
        referral_id: &str,
        patch: ReferralPatch,
    ) -> Result<&Referral, AppError> {
        let index = self
            .referrals
            .iter()
            .position(|r| r.id == referral_id)
            .ok_or_else(|| AppError::NotFound(format!("referral {}", referral_id)))?;

        let next_child_id = patch
            .child_id
            .clone()
            .unwrap_or_else(|| self.referrals[index].child_id.clone());
        self.ensure_child_id_free(&next_child_id, Some(referral_id))?;

        let referral = &mut self.referrals[index];
        patch.apply_to(referral);
        referral.updated_at = Some(Utc::now());

        debug!("Updated referral {}", referral_id);
        self.persist()?;
        Ok(&self.referrals[index])
    }

    /// Returns the removed referral, if there was one.
    pub fn delete_referral(&mut self, referral_id: &str) -> Result<Option<Referral>, AppError> {
        let Some(index) = self.referrals.iter().position(|r| r.id == referral_id) else {
            warn!("Delete requested for unknown referral {}", referral_id);
            return Ok(None);
        };

        let removed = self.referrals.remove(index);
        self.persist()?;
        Ok(Some(removed))
    }

    /// Fails with `DuplicateChildId` when another referral (other than
    /// `except_id`) already uses this child id.
    pub fn ensure_child_id_free(&self, child_id: &str, except_id: Option<&str>) -> Result<(), AppError> {
        let wanted = normalize_child_id(child_id);
        if wanted.is_empty() {
            return Ok(());
        }

        let taken = self
            .referrals
            .iter()
            .filter(|r| Some(r.id.as_str()) != except_id)
            .any(|r| r.normalized_child_id() == wanted);

        if taken {
            warn!("Duplicate child id rejected: {}", child_id.trim());
            return Err(AppError::DuplicateChildId(child_id.trim().to_string()));
        }
        Ok(())
    }

    // ==============================================================================
    // IMPORT / EXPORT
    // ==============================================================================

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            therapists: self.therapists.clone(),
            referrals: self.referrals.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String, AppError> {
        self.snapshot().to_json()
    }

    /// Replaces all state. On a malformed payload nothing changes.
    pub fn import_value(&mut self, value: Value) -> Result<(), AppError> {
        let snapshot = Snapshot::from_value(value)?;
        info!(
            "Importing {} therapists and {} referrals",
            snapshot.therapists.len(),
            snapshot.referrals.len()
        );
        self.replace(snapshot)
    }

    pub fn import_json(&mut self, raw: &str) -> Result<(), AppError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| AppError::ImportFormat(e.to_string()))?;
        self.import_value(value)
    }

    fn replace(&mut self, snapshot: Snapshot) -> Result<(), AppError> {
        self.therapists = snapshot.therapists;
        self.referrals = snapshot.referrals;
        self.hydrate_totals();
        self.persist()
    }

    fn hydrate_totals(&mut self) {
        for therapist in &mut self.therapists {
            therapist.recompute_total_hours();
        }
    }

    fn persist(&self) -> Result<(), AppError> {
        self.backend.save(&self.snapshot())
    }
}
