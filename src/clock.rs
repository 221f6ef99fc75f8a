//! Deterministic clock abstraction for expiry checks.

use crate::protocol::models::LicenseRecord;
use crate::validator::parse_timestamp;
use chrono::{DateTime, Utc};

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock using actual wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant, for tests and license previews.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: DateTime<Utc>,
}

impl MockClock {
    /// Create a mock clock frozen at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Create a mock clock from an RFC 3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        let now = DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc);
        Ok(Self { now })
    }

    /// Create a mock clock frozen at the instant `record` expires.
    ///
    /// Returns `None` for non-expiring records and unparseable expiries.
    pub fn at_expiry(record: &LicenseRecord) -> Option<Self> {
        record.expires_at().and_then(parse_timestamp).map(Self::new)
    }

    /// Advance the clock by a duration (negative values move it back).
    pub fn advance(&mut self, duration: chrono::Duration) {
        self.now += duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
    }
}
