//! Keystamp error types.

use crate::protocol::models::ActivationErrorCode;
use thiserror::Error;

/// Errors that can occur while validating, storing or activating a license.
///
/// Expected rejection outcomes of validation (device mismatch, expiry, ...) are
/// reported as a [`Verdict`](crate::Verdict), not through this type.
#[derive(Debug, Error)]
pub enum KeystampError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// License record violates the schema (missing or mistyped field).
    #[error("Malformed license record: {0}")]
    MalformedRecord(String),

    /// Signature field is not `ed25519:<base64>` of a 64-byte signature.
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    /// Signature does not verify over the canonical record.
    #[error("License signature verification failed")]
    SignatureInvalid,

    /// License store could not be read or written.
    #[error("License store I/O error: {0}")]
    StoreIo(String),

    /// License store holds something that is not a license document.
    #[error("License store is corrupt: {0}")]
    StoreCorrupt(String),

    /// No activation code provided.
    #[error("No activation code provided")]
    MissingActivationCode,

    /// The issuer rejected the activation request.
    #[error("Activation rejected ({code}): {message}")]
    Activation {
        /// Machine-readable error code returned by the issuer.
        code: ActivationErrorCode,
        /// Human-readable message returned by the issuer.
        message: String,
    },

    /// HTTP transport error communicating with the issuer.
    #[error("Activation transport error: {0}")]
    Transport(String),

    /// Issuer response could not be understood.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
