//! Registration store - durable list of tracked package identifiers
//!
//! The store is a single JSON document holding a list of uppercase
//! identifier strings. It is read in full once at startup and rewritten in
//! full after every mutation. Persistence is best-effort (plain overwrite,
//! no temp-and-rename); the recovery path for a torn write is the
//! defensive load-or-default at the next startup.

use crate::domain::types::TrackingId;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("package already tracked: {0}")]
    AlreadyRegistered(TrackingId),

    #[error("package not tracked: {0}")]
    NotRegistered(TrackingId),
}

/// Ordered list of tracked identifiers, backed by a JSON file
pub struct RegistrationStore {
    path: PathBuf,
    ids: Vec<TrackingId>,
}

impl RegistrationStore {
    /// Load the store from `path`.
    ///
    /// A missing file means the store was never populated; unreadable or
    /// corrupt contents are absorbed the same way. Both yield an empty
    /// store, distinguished only in the logs.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let ids = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<TrackingId>>(&contents) {
                Ok(ids) => {
                    info!(path = %path.display(), count = ids.len(), "registrations_loaded");
                    ids
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "registrations_unreadable");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "registrations_file_missing");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "registrations_read_failed");
                Vec::new()
            }
        };

        Self { path, ids }
    }

    /// Append an identifier and persist.
    ///
    /// The identifier arrives normalized (`TrackingId` uppercases at
    /// construction); duplicates are rejected without touching the file.
    pub fn register(&mut self, id: TrackingId) -> Result<(), RegistrationError> {
        if self.ids.contains(&id) {
            return Err(RegistrationError::AlreadyRegistered(id));
        }

        self.ids.push(id);
        self.persist();
        Ok(())
    }

    /// Remove an identifier and persist.
    pub fn unregister(&mut self, id: &TrackingId) -> Result<(), RegistrationError> {
        let Some(position) = self.ids.iter().position(|known| known == id) else {
            return Err(RegistrationError::NotRegistered(id.clone()));
        };

        self.ids.remove(position);
        self.persist();
        Ok(())
    }

    pub fn contains(&self, id: &TrackingId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[TrackingId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Full-file overwrite of the backing document.
    ///
    /// A write failure keeps the in-memory mutation; the store and the
    /// entity registry stay consistent within the process and the file
    /// catches up on the next successful persist.
    fn persist(&self) {
        let json = match serde_json::to_string_pretty(&self.ids) {
            Ok(json) => json,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "registrations_encode_failed");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!(path = %self.path.display(), error = %e, "registrations_mkdir_failed");
                    return;
                }
            }
        }

        match fs::write(&self.path, json) {
            Ok(()) => {
                debug!(path = %self.path.display(), count = self.ids.len(), "registrations_persisted");
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "registrations_persist_failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("dhl_tracking.json")
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = RegistrationStore::load(store_path(&dir));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);
        fs::write(&path, "{not valid json").unwrap();

        let store = RegistrationStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_register_persists_normalized_id() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);
        let mut store = RegistrationStore::load(&path);

        store.register(TrackingId::new("abc123")).unwrap();

        assert!(store.contains(&TrackingId::new("ABC123")));
        let contents = fs::read_to_string(&path).unwrap();
        let persisted: Vec<String> = serde_json::from_str(&contents).unwrap();
        assert_eq!(persisted, vec!["ABC123".to_string()]);
    }

    #[test]
    fn test_duplicate_register_no_mutation_no_write() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);
        let mut store = RegistrationStore::load(&path);

        store.register(TrackingId::new("abc123")).unwrap();
        let after_first = fs::read(&path).unwrap();

        // Re-register under a different case: rejected, file untouched
        let result = store.register(TrackingId::new("ABC123"));
        assert_eq!(
            result,
            Err(RegistrationError::AlreadyRegistered(TrackingId::new("abc123")))
        );
        assert_eq!(store.len(), 1);
        assert_eq!(fs::read(&path).unwrap(), after_first);
    }

    #[test]
    fn test_unregister_removes_and_persists() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);
        let mut store = RegistrationStore::load(&path);
        store.register(TrackingId::new("abc123")).unwrap();
        store.register(TrackingId::new("def456")).unwrap();

        store.unregister(&TrackingId::new("abc123")).unwrap();

        assert_eq!(store.ids(), &[TrackingId::new("def456")]);
        let persisted: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(persisted, vec!["DEF456".to_string()]);
    }

    #[test]
    fn test_unregister_unknown_no_mutation_no_write() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);
        let mut store = RegistrationStore::load(&path);
        store.register(TrackingId::new("abc123")).unwrap();
        let before = fs::read(&path).unwrap();

        let result = store.unregister(&TrackingId::new("zzz999"));

        assert_eq!(
            result,
            Err(RegistrationError::NotRegistered(TrackingId::new("zzz999")))
        );
        assert_eq!(store.len(), 1);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_save_load_round_trip_preserves_order() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);

        let mut store = RegistrationStore::load(&path);
        store.register(TrackingId::new("charlie1")).unwrap();
        store.register(TrackingId::new("alpha2")).unwrap();
        store.register(TrackingId::new("bravo3")).unwrap();

        let reloaded = RegistrationStore::load(&path);
        assert_eq!(reloaded.ids(), store.ids());

        // Load/save with no intervening mutation is idempotent
        let again = RegistrationStore::load(&path);
        assert_eq!(again.ids(), reloaded.ids());
    }
}
