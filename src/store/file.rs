//! File-based license store with atomic writes.
//!
//! Stores the license document at `dirs::data_dir()/<namespace>/license.json`.
//! Uses temp file + rename for atomic writes.

use crate::protocol::models::LicenseRecord;
use crate::store::LicenseStore;
use crate::KeystampError;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the stored license.
pub const LICENSE_FILE_NAME: &str = "license.json";

/// File-based license store.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory holding the license file.
    store_dir: PathBuf,
}

impl FileStore {
    /// Create a store under the platform data directory.
    ///
    /// The license is stored under `dirs::data_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, KeystampError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| KeystampError::StoreIo("Could not find data directory".to_string()))?;

        Self::with_path(base_dir.join(namespace))
    }

    /// Create a store in a specific directory.
    pub fn with_path(store_dir: PathBuf) -> Result<Self, KeystampError> {
        fs::create_dir_all(&store_dir)
            .map_err(|e| KeystampError::StoreIo(format!("Failed to create store dir: {}", e)))?;
        Ok(Self { store_dir })
    }

    /// Path of the license file.
    pub fn license_path(&self) -> PathBuf {
        self.store_dir.join(LICENSE_FILE_NAME)
    }

    /// Directory holding the license file.
    pub fn dir(&self) -> &Path {
        &self.store_dir
    }
}

impl LicenseStore for FileStore {
    /// Load the stored license.
    ///
    /// # Returns
    /// * `Ok(None)` - No license file
    /// * `Err(StoreIo)` - The file exists but cannot be read
    /// * `Err(StoreCorrupt)` - The file is not a JSON object
    /// * `Err(MalformedRecord)` - The object is not a license record
    fn load(&self) -> Result<Option<LicenseRecord>, KeystampError> {
        let path = self.license_path();

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(KeystampError::StoreIo(format!(
                    "Failed to read license file: {}",
                    e
                )))
            }
        };

        let document = match serde_json::from_str::<Value>(&json) {
            Ok(Value::Object(document)) => document,
            Ok(_) => {
                return Err(KeystampError::StoreCorrupt(
                    "license file does not hold a JSON object".to_string(),
                ))
            }
            Err(e) => {
                return Err(KeystampError::StoreCorrupt(format!(
                    "Failed to parse license file: {}",
                    e
                )))
            }
        };

        LicenseRecord::from_document(document).map(Some)
    }

    /// Save a license atomically, replacing any previous one.
    ///
    /// Uses temp file + rename for atomic write.
    fn save(&self, record: &LicenseRecord) -> Result<(), KeystampError> {
        let target_path = self.license_path();
        let temp_path = self.store_dir.join(format!("{}.tmp", LICENSE_FILE_NAME));

        let json = record.to_json_pretty()?;

        fs::write(&temp_path, json)
            .map_err(|e| KeystampError::StoreIo(format!("Failed to write temp file: {}", e)))?;

        fs::rename(&temp_path, &target_path)
            .map_err(|e| KeystampError::StoreIo(format!("Failed to rename license file: {}", e)))?;

        Ok(())
    }

    /// Delete the stored license, if any.
    fn clear(&self) -> Result<(), KeystampError> {
        match fs::remove_file(self.license_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KeystampError::StoreIo(format!(
                "Failed to delete license file: {}",
                e
            ))),
        }
    }
}
