//! Ed25519 signature verification of license records.

use crate::crypto::canonical::canonical_bytes;
use crate::protocol::models::LicenseRecord;
use crate::KeystampError;
use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use std::fmt;

/// Prefix of the record's `signature` field.
pub const SIGNATURE_PREFIX: &str = "ed25519:";

/// Length of a raw Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// The issuer's Ed25519 verify key.
///
/// A plain 32-byte value, checked to be a valid curve point on construction.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Build a key from its raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeystampError> {
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| KeystampError::ConfigError(format!("Invalid Ed25519 public key: {}", e)))?;
        Ok(Self(bytes))
    }

    /// Decode a key from 64-char hex or standard base64.
    pub fn decode(encoded: &str) -> Result<Self, KeystampError> {
        let encoded = encoded.trim();
        let bytes = if encoded.len() == 64 && encoded.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode(encoded)
                .map_err(|e| KeystampError::ConfigError(format!("Invalid public key hex: {}", e)))?
        } else {
            STANDARD.decode(encoded).map_err(|e| {
                KeystampError::ConfigError(format!("Invalid public key base64: {}", e))
            })?
        };

        let key_array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| KeystampError::ConfigError("Public key must be 32 bytes".to_string()))?;

        Self::from_bytes(key_array)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&hex::encode(self.0)).finish()
    }
}

/// Asymmetric verification primitive.
///
/// Returns whether `signature` is valid for `message` under `key`.
pub trait SignatureVerifier: Send + Sync {
    /// Verify a raw signature over a message.
    fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_LENGTH], key: &PublicKey) -> bool;
}

/// Ed25519 verification backed by `ed25519-dalek`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_LENGTH], key: &PublicKey) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(key.as_bytes()) else {
            return false;
        };
        let signature = Signature::from_bytes(signature);
        verifying_key.verify(message, &signature).is_ok()
    }
}

/// Parse a `ed25519:<base64>` signature field into raw signature bytes.
///
/// # Errors
/// * `InvalidSignatureFormat` - wrong prefix, bad base64, or not 64 bytes
pub fn parse_signature_field(field: &str) -> Result<[u8; SIGNATURE_LENGTH], KeystampError> {
    let encoded = field.strip_prefix(SIGNATURE_PREFIX).ok_or_else(|| {
        KeystampError::InvalidSignatureFormat(format!(
            "expected {} prefix",
            SIGNATURE_PREFIX.trim_end_matches(':')
        ))
    })?;

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| KeystampError::InvalidSignatureFormat(format!("invalid base64: {}", e)))?;

    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        KeystampError::InvalidSignatureFormat(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_LENGTH, len
        ))
    })
}

/// Verify a record's signature over its canonical form.
///
/// # Returns
/// * `Ok(())` - Signature is valid
/// * `Err(InvalidSignatureFormat)` - Signature field cannot be parsed
/// * `Err(SignatureInvalid)` - Signature does not match the record
pub fn verify_record<V: SignatureVerifier + ?Sized>(
    record: &LicenseRecord,
    key: &PublicKey,
    verifier: &V,
) -> Result<(), KeystampError> {
    let signature = parse_signature_field(record.signature())?;
    let message = canonical_bytes(record);

    if !verifier.verify(&message, &signature, key) {
        return Err(KeystampError::SignatureInvalid);
    }

    Ok(())
}
