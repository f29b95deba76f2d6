use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, warn};

use shared_models::GeoPoint;

use crate::error::GeocodeError;
use crate::models::CachedPoint;

/// Address -> coordinate cache, optionally mirrored to a JSON file.
///
/// The file is the source of truth when several caches share a path: misses
/// re-read it and every insert merges with what is on disk before replacing
/// it. An unreadable file starts an empty cache and a failed write only costs
/// a repeat lookup later.
#[derive(Default)]
pub struct GeoCache {
    entries: Mutex<HashMap<String, CachedPoint>>,
    path: Option<PathBuf>,
}

impl GeoCache {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        debug!("Geocode cache loaded {} entries from {}", entries.len(), path.display());
        Self {
            entries: Mutex::new(entries),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<GeoPoint> {
        let mut entries = self.entries.lock().ok()?;
        if let Some(cached) = entries.get(key) {
            return Some(cached.point());
        }

        let path = self.path.as_ref()?;
        for (k, v) in load_entries(path) {
            entries.entry(k).or_insert(v);
        }
        entries.get(key).map(CachedPoint::point)
    }

    pub fn insert(&self, key: &str, point: GeoPoint) -> Result<(), GeocodeError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| GeocodeError::Cache(e.to_string()))?;

        if let Some(path) = &self.path {
            for (k, v) in load_entries(path) {
                entries.entry(k).or_insert(v);
            }
        }
        entries.insert(key.to_string(), CachedPoint::new(point, Utc::now()));

        if let Some(path) = &self.path {
            if let Err(e) = save_entries(path, &entries) {
                warn!("Geocode cache not written to {}: {}", path.display(), e);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_entries(path: &Path) -> HashMap<String, CachedPoint> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Ignoring unreadable geocode cache {}: {}", path.display(), e);
        HashMap::new()
    })
}

fn save_entries(path: &Path, entries: &HashMap<String, CachedPoint>) -> Result<(), GeocodeError> {
    let body = serde_json::to_string(entries).map_err(|e| GeocodeError::Cache(e.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, body)
        .and_then(|_| fs::rename(&tmp_path, path))
        .map_err(|e| GeocodeError::Cache(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_persistent_cache_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geo_cache.json");

        let cache = GeoCache::persistent(&path);
        assert!(cache.is_empty());
        cache
            .insert("broadway & 46th st, astoria, ny, 11103", GeoPoint::new(40.756, -73.913))
            .unwrap();

        let reopened = GeoCache::persistent(&path);
        assert_eq!(
            reopened.get("broadway & 46th st, astoria, ny, 11103"),
            Some(GeoPoint::new(40.756, -73.913))
        );
    }

    #[test]
    fn test_caches_on_one_file_keep_each_others_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geo_cache.json");

        let first = GeoCache::persistent(&path);
        let second = GeoCache::persistent(&path);
        first.insert("steinway st, astoria", GeoPoint::new(1.0, 1.0)).unwrap();
        second.insert("main st, flushing", GeoPoint::new(2.0, 2.0)).unwrap();

        // A miss falls through to the file.
        assert_eq!(second.get("steinway st, astoria"), Some(GeoPoint::new(1.0, 1.0)));

        let reopened = GeoCache::persistent(&path);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("steinway st, astoria"), Some(GeoPoint::new(1.0, 1.0)));
        assert_eq!(reopened.get("main st, flushing"), Some(GeoPoint::new(2.0, 2.0)));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_cache_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geo_cache.json");
        fs::write(&path, "[not a map").unwrap();

        let cache = GeoCache::persistent(&path);
        assert_eq!(cache.len(), 0);
    }
}
