//! License validation state machine.
//!
//! A stored license goes through a fixed sequence of checks. The first failing
//! check decides the verdict:
//! 1. Presence: no stored record → [`Verdict::NotActivated`]
//! 2. Signature: canonical form + Ed25519 → [`Verdict::SignatureInvalid`]
//! 3. Device binding: `device_hash` vs fresh fingerprint → [`Verdict::DeviceMismatch`]
//! 4. Expiry: `now >= expires_at` → [`Verdict::Expired`]
//! 5. Application: `app_id` vs expected → [`Verdict::AppMismatch`]
//!
//! Nothing after step 2 reads a field of a record whose signature has not verified.

use crate::clock::Clock;
use crate::crypto::verify::{verify_record, Ed25519Verifier, PublicKey, SignatureVerifier};
use crate::device::DeviceIdentity;
use crate::protocol::models::LicenseRecord;
use crate::store::LicenseStore;
use crate::KeystampError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Display data of a valid license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseSummary {
    /// Issuer-assigned license identifier.
    pub license_id: String,
    /// Entitlement tier.
    pub plan: Option<String>,
    /// Issue timestamp as sent by the issuer.
    pub issued_at: Option<String>,
    /// Expiry timestamp as sent by the issuer; `None` means non-expiring.
    pub expires_at: Option<String>,
    /// Feature entitlements (empty if the record has none).
    pub features: Map<String, Value>,
}

impl LicenseSummary {
    fn from_record(record: &LicenseRecord) -> Self {
        Self {
            license_id: record.license_id().to_string(),
            plan: record.plan().map(String::from),
            issued_at: record.issued_at().map(String::from),
            expires_at: record.expires_at().map(String::from),
            features: record.features().cloned().unwrap_or_default(),
        }
    }
}

/// Why a record failed the signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureFailure {
    /// The record violates the schema.
    MalformedRecord(String),
    /// The signature field is not `ed25519:<base64>` of 64 bytes.
    InvalidFormat(String),
    /// The signature does not verify over the record.
    VerificationFailed,
    /// Verification could not be carried out.
    Unverifiable(String),
}

impl SignatureFailure {
    fn from_error(error: KeystampError) -> Self {
        match error {
            KeystampError::MalformedRecord(reason) => Self::MalformedRecord(reason),
            KeystampError::InvalidSignatureFormat(reason) => Self::InvalidFormat(reason),
            KeystampError::SignatureInvalid => Self::VerificationFailed,
            other => Self::Unverifiable(other.to_string()),
        }
    }
}

impl fmt::Display for SignatureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord(reason) => write!(f, "malformed record: {}", reason),
            Self::InvalidFormat(reason) => write!(f, "invalid signature format: {}", reason),
            Self::VerificationFailed => f.write_str("signature verification failed"),
            Self::Unverifiable(reason) => write!(f, "signature could not be verified: {}", reason),
        }
    }
}

/// Terminal outcome of validating the stored license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// All checks passed.
    Valid(LicenseSummary),
    /// No license is stored.
    NotActivated,
    /// The record is malformed, unsigned or forged.
    SignatureInvalid(SignatureFailure),
    /// The license is bound to another device.
    DeviceMismatch {
        /// Fingerprint the license was issued for.
        licensed: String,
        /// Fingerprint of this device.
        current: String,
    },
    /// The license expired.
    Expired {
        /// Parsed expiry instant.
        expires_at: DateTime<Utc>,
    },
    /// The license belongs to another application.
    AppMismatch {
        /// Application this validator expects.
        expected: String,
        /// Application the license names.
        found: String,
    },
}

impl Verdict {
    /// Whether the host application may proceed. Only `Valid` permits it.
    pub fn may_proceed(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Display data, for valid licenses.
    pub fn summary(&self) -> Option<&LicenseSummary> {
        match self {
            Self::Valid(summary) => Some(summary),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(summary) => write!(f, "License {} is valid", summary.license_id),
            Self::NotActivated => f.write_str("No license found; activation required"),
            Self::SignatureInvalid(reason) => write!(f, "License is not authentic ({})", reason),
            Self::DeviceMismatch { .. } => f.write_str("License is bound to a different device"),
            Self::Expired { expires_at } => {
                write!(f, "License expired at {}", expires_at.to_rfc3339())
            }
            Self::AppMismatch { expected, found } => write!(
                f,
                "License is for application {:?}, expected {:?}",
                found, expected
            ),
        }
    }
}

/// ISO 8601 layouts carrying an explicit offset (`Z`, `+00:00` or `+0000`).
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y%m%dT%H%M%S%#z",
];

/// ISO 8601 layouts without an offset, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

/// Parse an issuer timestamp as a UTC instant.
///
/// Accepts RFC 3339 and the other ISO 8601 forms issuers emit: minute
/// precision, offsets with or without a colon, the basic `YYYYMMDDTHHMMSS`
/// layout, and a space instead of `T`. Values without an offset, including
/// a bare `YYYY-MM-DD`, are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Offline license validator.
///
/// Stateless apart from its read-only inputs; one instance can serve any
/// number of validations, concurrently.
pub struct LicenseValidator<V: SignatureVerifier = Ed25519Verifier> {
    public_key: PublicKey,
    app_id: String,
    clock: Arc<dyn Clock>,
    device: Arc<dyn DeviceIdentity>,
    verifier: V,
}

impl LicenseValidator<Ed25519Verifier> {
    /// Create a validator using Ed25519 verification.
    pub fn new(
        public_key: PublicKey,
        app_id: impl Into<String>,
        clock: Arc<dyn Clock>,
        device: Arc<dyn DeviceIdentity>,
    ) -> Self {
        Self::with_verifier(public_key, app_id, clock, device, Ed25519Verifier)
    }
}

impl<V: SignatureVerifier> LicenseValidator<V> {
    /// Create a validator with a specific signature primitive.
    pub fn with_verifier(
        public_key: PublicKey,
        app_id: impl Into<String>,
        clock: Arc<dyn Clock>,
        device: Arc<dyn DeviceIdentity>,
        verifier: V,
    ) -> Self {
        Self {
            public_key,
            app_id: app_id.into(),
            clock,
            device,
            verifier,
        }
    }

    /// Validate the license held by `store`.
    ///
    /// # Errors
    /// Only store faults (`StoreIo`, `StoreCorrupt`) are returned as errors.
    /// A record that fails the schema is reported as
    /// [`Verdict::SignatureInvalid`], like any other untrusted record.
    pub fn validate<S: LicenseStore + ?Sized>(&self, store: &S) -> Result<Verdict, KeystampError> {
        let record = match store.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("no stored license");
                return Ok(Verdict::NotActivated);
            }
            Err(KeystampError::MalformedRecord(reason)) => {
                warn!(%reason, "stored license is malformed");
                return Ok(Verdict::SignatureInvalid(SignatureFailure::MalformedRecord(
                    reason,
                )));
            }
            Err(e) => return Err(e),
        };

        Ok(self.validate_record(&record))
    }

    /// Run the signature, device, expiry and application checks on a record.
    pub fn validate_record(&self, record: &LicenseRecord) -> Verdict {
        if let Err(e) = verify_record(record, &self.public_key, &self.verifier) {
            let failure = SignatureFailure::from_error(e);
            warn!(%failure, "license rejected");
            return Verdict::SignatureInvalid(failure);
        }
        debug!(license_id = record.license_id(), "license signature verified");

        let current = self.device.fingerprint();
        if record.device_hash() != current.as_str() {
            warn!(license_id = record.license_id(), "license bound to another device");
            return Verdict::DeviceMismatch {
                licensed: record.device_hash().to_string(),
                current: current.as_str().to_string(),
            };
        }

        if let Some(raw) = record.expires_at() {
            match parse_timestamp(raw) {
                Some(expires_at) if self.clock.now_utc() >= expires_at => {
                    warn!(license_id = record.license_id(), %expires_at, "license expired");
                    return Verdict::Expired { expires_at };
                }
                Some(_) => {}
                None => {
                    // An unparseable expiry never revokes.
                    warn!(
                        license_id = record.license_id(),
                        expires_at = raw,
                        "unparseable expiry, skipping expiry check"
                    );
                }
            }
        }

        if record.app_id() != self.app_id {
            warn!(
                license_id = record.license_id(),
                found = record.app_id(),
                "license issued for another application"
            );
            return Verdict::AppMismatch {
                expected: self.app_id.clone(),
                found: record.app_id().to_string(),
            };
        }

        debug!(license_id = record.license_id(), "license valid");
        Verdict::Valid(LicenseSummary::from_record(record))
    }

    /// The application identifier licenses must carry.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}
