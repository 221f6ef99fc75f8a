//! Shared test helpers for license tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signer, SigningKey};
use keystamp::crypto::canonical::canonical_bytes;
use keystamp::{DeviceFingerprint, DeviceIdentity, LicenseRecord, MockClock, PublicKey};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (SigningKey, PublicKey) {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    let signing_key = SigningKey::from_bytes(&seed);
    let public_key = PublicKey::from_bytes(signing_key.verifying_key().to_bytes()).unwrap();
    (signing_key, public_key)
}

/// Signs a license document the way the issuer does and returns the record.
pub fn sign_document(signing_key: &SigningKey, document: Value) -> LicenseRecord {
    let mut document: Map<String, Value> = match document {
        Value::Object(map) => map,
        other => panic!("license document must be an object, got {}", other),
    };
    document.insert("signature".to_string(), Value::String(String::new()));

    let unsigned = LicenseRecord::from_document(document.clone()).unwrap();
    let signature = signing_key.sign(&canonical_bytes(&unsigned));
    document.insert(
        "signature".to_string(),
        Value::String(format!("ed25519:{}", STANDARD.encode(signature.to_bytes()))),
    );
    LicenseRecord::from_document(document).unwrap()
}

/// Returns a copy of `record` with one member replaced, keeping the old signature.
pub fn tamper(record: &LicenseRecord, name: &str, value: Value) -> LicenseRecord {
    let mut document = record.document().clone();
    document.insert(name.to_string(), value);
    LicenseRecord::from_document(document).unwrap()
}

/// Clock frozen at an RFC 3339 instant.
pub fn clock_at(rfc3339: &str) -> Arc<MockClock> {
    Arc::new(MockClock::from_rfc3339(rfc3339).unwrap())
}

/// Device identity with a fixed fingerprint.
pub struct FixedDevice(pub &'static str);

impl DeviceIdentity for FixedDevice {
    fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint::from_raw(self.0)
    }
}
