//! Reqwest-based HTTP client for the activation service.
//!
//! One request per activation attempt; retrying is the caller's decision.

use crate::config::KeystampConfig;
use crate::device::DeviceFingerprint;
use crate::protocol::models::{parse_activate_response, ActivateRequest, LicenseRecord};
use crate::KeystampError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{debug, info};

/// Path of the activation endpoint, relative to the service base URL.
pub const ACTIVATE_PATH: &str = "/api/activate";

/// Activation service client.
#[derive(Debug)]
pub struct ActivationClient {
    client: Client,
    endpoint: String,
    app_id: String,
    app_version: String,
    user_agent: String,
}

impl ActivationClient {
    /// Create a new activation client from config.
    pub fn new(config: &KeystampConfig) -> Result<Self, KeystampError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| KeystampError::Transport(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: activation_endpoint(config.activation_url),
            app_id: config.app_id.to_string(),
            app_version: config.app_version.to_string(),
            user_agent: build_user_agent(config),
        })
    }

    /// Exchange an activation code for a signed license bound to `device`.
    ///
    /// The returned record is not yet verified; see
    /// [`LicenseManager::activate`](crate::LicenseManager::activate).
    ///
    /// # Errors
    /// - `MissingActivationCode` - Empty code, no request sent
    /// - `Transport` - Request failed or the service answered with a non-JSON error page
    /// - `Activation` - The service rejected the code
    /// - `Protocol` - Response body could not be understood
    pub fn activate(
        &self,
        code: &str,
        device: &DeviceFingerprint,
    ) -> Result<LicenseRecord, KeystampError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(KeystampError::MissingActivationCode);
        }

        let request = ActivateRequest {
            code,
            device_hash: device.as_str(),
            app_id: &self.app_id,
            app_version: &self.app_version,
        };

        info!(endpoint = %self.endpoint, "requesting activation");

        let response = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .map_err(|e| KeystampError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .map_err(|e| KeystampError::Transport(format!("Failed to read body: {}", e)))?;

        debug!(status = status.as_u16(), bytes = body.len(), "activation response");

        // Rejections come back as 4xx with a JSON error object, so parse first.
        match parse_activate_response(&body) {
            Ok(parsed) => parsed.into_result(),
            Err(_) if !status.is_success() => Err(KeystampError::Transport(format!(
                "Activation service returned HTTP {}",
                status.as_u16()
            ))),
            Err(e) => Err(e),
        }
    }

    /// Full URL of the activation endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Join the service base URL and the activation path.
pub fn activation_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ACTIVATE_PATH)
}

/// Build a User-Agent string from config.
///
/// Format: `<app_id>/<app_version> keystamp/<version>`
/// Example: `moments_ai/1.0.0 keystamp/0.1.0`
pub fn build_user_agent(config: &KeystampConfig) -> String {
    format!(
        "{}/{} keystamp/{}",
        config.app_id,
        config.app_version,
        env!("CARGO_PKG_VERSION")
    )
}
