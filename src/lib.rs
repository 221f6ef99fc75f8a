//! # Keystamp
//!
//! **Offline license activation and validation for Rust applications.**
//!
//! A device exchanges an activation code for a license record signed by the
//! issuer's Ed25519 key, stores it, and from then on re-validates it locally
//! on every start without network access.
//!
//! ## Features
//!
//! - **Canonical signing form**: key-sorted, whitespace-free UTF-8 JSON,
//!   identical on every platform that verifies the record
//! - **Ed25519 signature verification** with a key compiled into the application
//! - **Device binding**: licenses carry `SHA256(hostname + arch)` of the machine
//! - **Ordered verdicts**: signature, device, expiry, application; rejections are
//!   values, never panics
//! - **Fail-closed**: there is no code path that skips signature verification
//!
//! ## Quickstart
//!
//! ```no_run
//! use keystamp::{KeystampConfig, LicenseManager, Verdict};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), keystamp::KeystampError> {
//!     let config = KeystampConfig {
//!         app_id: "moments_ai",
//!         app_version: "1.0.0",
//!         public_key: "your-issuer-ed25519-public-key-base64",
//!         activation_url: "https://activate.example.com",
//!         store_namespace: "moments_ai",
//!         request_timeout: Duration::from_secs(10),
//!     };
//!
//!     let manager = LicenseManager::new(config)?;
//!     let verdict = match manager.check()? {
//!         Verdict::NotActivated => manager.activate("ACT-XXXX-XXXX")?,
//!         verdict => verdict,
//!     };
//!
//!     if verdict.may_proceed() {
//!         println!("{}", verdict);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Keystamp protects against:
//! - **Forged or edited licenses**: any change to a signed field breaks the signature
//! - **License copying**: a record validates only on the machine it was issued for
//!
//! Keystamp does **not** prevent binary patching, clock rollback on the
//! device, or spoofing of the hostname. Client-side licensing can always be
//! bypassed by a determined attacker with access to the binary.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Device binding
pub mod device;

// Protocol layer
pub mod protocol;

// Storage layer
pub mod store;

// Validation
pub mod validator;

// Client layer
pub mod client;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use clock::{Clock, MockClock, SystemClock};
pub use config::KeystampConfig;
pub use crypto::verify::{Ed25519Verifier, PublicKey, SignatureVerifier};
pub use device::{DeviceFingerprint, DeviceIdentity, HostIdentity};
pub use errors::KeystampError;
pub use manager::LicenseManager;
pub use protocol::models::LicenseRecord;
pub use store::{FileStore, LicenseStore, MemoryStore};
pub use validator::{LicenseSummary, LicenseValidator, SignatureFailure, Verdict};
