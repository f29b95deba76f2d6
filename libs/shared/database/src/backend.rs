use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use shared_models::AppError;

use crate::snapshot::Snapshot;

/// Where the store's snapshot lives between sessions.
pub trait StorageBackend: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Snapshot>, AppError>;

    fn save(&self, snapshot: &Snapshot) -> Result<(), AppError>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn load(&self) -> Result<Option<Snapshot>, AppError> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        (**self).save(snapshot)
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    saved: Mutex<Option<Snapshot>>,
    save_count: Mutex<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
            save_count: Mutex::new(0),
        }
    }

    /// Last snapshot written, if any.
    pub fn saved(&self) -> Option<Snapshot> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }

    pub fn save_count(&self) -> usize {
        self.save_count.lock().map(|count| *count).unwrap_or(0)
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Snapshot>, AppError> {
        let saved = self
            .saved
            .lock()
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(saved.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|e| AppError::Storage(e.to_string()))?;
        *saved = Some(snapshot.clone());

        let mut count = self
            .save_count
            .lock()
            .map_err(|e| AppError::Storage(e.to_string()))?;
        *count += 1;
        Ok(())
    }
}

/// Pretty-printed JSON file, replaced atomically on every save.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<Snapshot>, AppError> {
        if !self.path.exists() {
            debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read snapshot {}: {}", self.path.display(), e);
            AppError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let snapshot = Snapshot::from_json(&raw).map_err(|e| {
            error!("Snapshot {} is unreadable: {}", self.path.display(), e);
            AppError::Storage(format!("Unreadable snapshot {}: {}", self.path.display(), e))
        })?;

        debug!(
            "Loaded snapshot with {} therapists and {} referrals",
            snapshot.therapists.len(),
            snapshot.referrals.len()
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let body = snapshot.to_json()?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, body)
            .and_then(|_| fs::rename(&tmp_path, &self.path))
            .map_err(|e| {
                error!("Save failed for {}: {}", self.path.display(), e);
                AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
            })
    }
}
