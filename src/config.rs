//! Keystamp configuration.

use crate::crypto::verify::PublicKey;
use crate::KeystampError;
use std::time::Duration;

/// Deploy-time configuration for license activation and validation.
///
/// Every field is meant to be a constant compiled into the host application.
#[derive(Debug, Clone)]
pub struct KeystampConfig {
    /// Application identifier the license must be issued for (e.g., "moments_ai").
    pub app_id: &'static str,

    /// Application version reported to the issuer on activation.
    pub app_version: &'static str,

    /// Issuer Ed25519 verify key, base64 (44 chars) or hex (64 chars).
    /// SECURITY: This should be hard-coded in your application, not from environment.
    pub public_key: &'static str,

    /// Base URL of the activation service (e.g., "https://activate.example.com").
    pub activation_url: &'static str,

    /// Store namespace; the license lives under `dirs::data_dir()/<namespace>/`.
    /// Each product should use a unique namespace to avoid collisions.
    pub store_namespace: &'static str,

    /// Timeout for the activation request.
    pub request_timeout: Duration,
}

impl KeystampConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), KeystampError> {
        if self.app_id.is_empty() {
            return Err(KeystampError::ConfigError(
                "app_id cannot be empty".to_string(),
            ));
        }
        if self.store_namespace.is_empty() {
            return Err(KeystampError::ConfigError(
                "store_namespace cannot be empty".to_string(),
            ));
        }
        if !(self.activation_url.starts_with("https://")
            || self.activation_url.starts_with("http://"))
        {
            return Err(KeystampError::ConfigError(format!(
                "activation_url must be an http(s) URL, got {:?}",
                self.activation_url
            )));
        }
        self.verifying_key()?;
        Ok(())
    }

    /// Decode the configured public key.
    pub fn verifying_key(&self) -> Result<PublicKey, KeystampError> {
        PublicKey::decode(self.public_key)
    }
}
