//! Persistence of the single license record.

pub mod file;

use crate::protocol::models::LicenseRecord;
use crate::KeystampError;
use std::sync::Mutex;

pub use file::FileStore;

/// Storage for the one license of this device.
pub trait LicenseStore: Send + Sync {
    /// Load the stored license; `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<LicenseRecord>, KeystampError>;

    /// Persist a license, replacing any previous one.
    fn save(&self, record: &LicenseRecord) -> Result<(), KeystampError>;

    /// Remove the stored license.
    fn clear(&self) -> Result<(), KeystampError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<LicenseRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LicenseStore for MemoryStore {
    fn load(&self) -> Result<Option<LicenseRecord>, KeystampError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| KeystampError::StoreIo("license slot lock poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, record: &LicenseRecord) -> Result<(), KeystampError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| KeystampError::StoreIo("license slot lock poisoned".to_string()))?;
        *slot = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), KeystampError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| KeystampError::StoreIo("license slot lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(license_id: &str) -> LicenseRecord {
        LicenseRecord::from_json(&format!(
            r#"{{"license_id":"{}","app_id":"X","device_hash":"SHA256:abc","signature":"ed25519:AA=="}}"#,
            license_id
        ))
        .unwrap()
    }

    #[test]
    fn test_memory_store_starts_empty() {
        assert!(MemoryStore::new().load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_save_replaces() {
        let store = MemoryStore::new();
        store.save(&record("L1")).unwrap();
        store.save(&record("L2")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().license_id(), "L2");
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryStore::new();
        store.save(&record("L1")).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
