//! Device fingerprinting for license binding.
//!
//! The fingerprint is `SHA256:<hex>` of the hostname immediately followed by
//! the machine architecture string. Both inputs are stable across reboots and
//! readable without privileges or network access.

use crate::crypto::digest::format_tagged_digest;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io;
use tracing::warn;

/// Hostname used when the OS does not report one.
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// A per-machine fingerprint, `SHA256:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    /// Wrap an already computed fingerprint string.
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The fingerprint string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute a fingerprint from a hostname and an architecture string.
///
/// Pure in its inputs.
pub fn fingerprint_of(hostname: &str, arch: &str) -> DeviceFingerprint {
    let identity = format!("{}{}", hostname, arch);
    DeviceFingerprint(format_tagged_digest(identity.as_bytes()))
}

/// Source of the current device's fingerprint.
pub trait DeviceIdentity: Send + Sync {
    /// Compute the fingerprint of the device this process runs on.
    fn fingerprint(&self) -> DeviceFingerprint;
}

/// Fingerprint derived from the local hostname and architecture.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostIdentity;

impl HostIdentity {
    /// The local hostname, or [`UNKNOWN_HOSTNAME`] if it cannot be read.
    ///
    /// Non-UTF-8 bytes are replaced, so distinct names stay distinct.
    pub fn hostname() -> String {
        hostname_or_fallback(hostname::get())
    }

    /// The machine architecture, spelled the way the issuer's reference client reports it.
    pub fn machine_arch() -> &'static str {
        machine_arch_name(env::consts::OS, env::consts::ARCH)
    }
}

impl DeviceIdentity for HostIdentity {
    fn fingerprint(&self) -> DeviceFingerprint {
        fingerprint_of(&Self::hostname(), Self::machine_arch())
    }
}

fn hostname_or_fallback(result: io::Result<OsString>) -> String {
    match result {
        Ok(name) if !name.is_empty() => name.to_string_lossy().into_owned(),
        Ok(_) => {
            warn!("hostname is empty, device fingerprint falls back to {:?}", UNKNOWN_HOSTNAME);
            UNKNOWN_HOSTNAME.to_string()
        }
        Err(e) => {
            warn!(error = %e, "hostname unavailable, device fingerprint falls back to {:?}", UNKNOWN_HOSTNAME);
            UNKNOWN_HOSTNAME.to_string()
        }
    }
}

/// Map Rust's `(OS, ARCH)` pair to the platform's native machine name.
///
/// Windows reports `AMD64`/`ARM64`, macOS reports `arm64`; elsewhere the Rust
/// name already matches `uname -m`.
fn machine_arch_name(os: &str, arch: &'static str) -> &'static str {
    match (os, arch) {
        ("windows", "x86_64") => "AMD64",
        ("windows", "aarch64") => "ARM64",
        ("windows", "x86") => "x86",
        ("macos", "aarch64") => "arm64",
        _ => arch,
    }
}
