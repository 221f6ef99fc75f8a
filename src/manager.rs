//! License Manager - the main public API for Keystamp.
//!
//! The `LicenseManager` ties the pieces together:
//! - Offline validation of the stored license
//! - Online activation with verification before anything is persisted
//! - Deactivation (forgetting the stored license)

use crate::client::http::ActivationClient;
use crate::clock::{Clock, SystemClock};
use crate::config::KeystampConfig;
use crate::device::{DeviceIdentity, HostIdentity};
use crate::store::{FileStore, LicenseStore};
use crate::validator::{LicenseValidator, Verdict};
use crate::KeystampError;
use std::sync::Arc;
use tracing::{info, warn};

/// Main license manager for Keystamp.
///
/// Create one instance per application and reuse it for all license checks.
pub struct LicenseManager {
    config: KeystampConfig,
    device: Arc<dyn DeviceIdentity>,
    store: Arc<dyn LicenseStore>,
    validator: LicenseValidator,
    client: ActivationClient,
}

impl LicenseManager {
    /// Create a license manager with the system clock, the host fingerprint and
    /// a file store under the platform data directory.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    /// - Store directory creation fails
    pub fn new(config: KeystampConfig) -> Result<Self, KeystampError> {
        config.validate()?;
        let store = FileStore::new(config.store_namespace)?;
        Self::with_parts(
            config,
            Arc::new(SystemClock),
            Arc::new(HostIdentity),
            Arc::new(store),
        )
    }

    /// Create a license manager from explicit collaborators.
    pub fn with_parts(
        config: KeystampConfig,
        clock: Arc<dyn Clock>,
        device: Arc<dyn DeviceIdentity>,
        store: Arc<dyn LicenseStore>,
    ) -> Result<Self, KeystampError> {
        config.validate()?;
        let validator =
            LicenseValidator::new(config.verifying_key()?, config.app_id, clock, device.clone());
        let client = ActivationClient::new(&config)?;

        Ok(Self {
            config,
            device,
            store,
            validator,
            client,
        })
    }

    /// Validate the stored license without network access.
    ///
    /// # Errors
    /// Only store faults; every rejection is a [`Verdict`].
    pub fn check(&self) -> Result<Verdict, KeystampError> {
        self.validator.validate(self.store.as_ref())
    }

    /// Exchange an activation code for a license and persist it.
    ///
    /// The issued record goes through the same checks as a stored one and is
    /// saved only when the verdict is `Valid`; otherwise the previous license,
    /// if any, stays in place.
    ///
    /// # Errors
    /// - `MissingActivationCode` - Empty code
    /// - `Activation` - The issuer rejected the code
    /// - `Transport` / `Protocol` - The exchange failed
    /// - `StoreIo` - The license could not be saved
    pub fn activate(&self, code: &str) -> Result<Verdict, KeystampError> {
        let fingerprint = self.device.fingerprint();
        let record = self.client.activate(code, &fingerprint)?;

        let verdict = self.validator.validate_record(&record);
        if verdict.may_proceed() {
            self.store.save(&record)?;
            info!(license_id = record.license_id(), "license activated");
        } else {
            warn!(%verdict, "issued license rejected, not saved");
        }

        Ok(verdict)
    }

    /// Forget the stored license.
    pub fn deactivate(&self) -> Result<(), KeystampError> {
        self.store.clear()?;
        info!("license removed");
        Ok(())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &KeystampConfig {
        &self.config
    }
}
