use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clock skew tolerated before a timestamp counts as "in the future".
const FUTURE_SKEW_SECONDS: i64 = 300;
const MIN_YEAR: i32 = 1900;

/// Moment a location fix or photo was observed.
///
/// A capture time is only accepted when it parses to a real date, is not in
/// the future, and is not before 1900. Anything else falls back to "now" at
/// the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureTime(DateTime<Utc>);

impl CaptureTime {
    pub fn new(value: DateTime<Utc>) -> Result<Self, String> {
        Self::validate(value)?;
        Ok(Self(value))
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Rehydrates a value that was validated when first captured. Storage
    /// mappers use this so old records survive clock skew at read time.
    pub fn from_stored(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    /// Parses an RFC 3339 timestamp, applying the validity rules.
    pub fn parse(value: &str) -> Result<Self, String> {
        let parsed = DateTime::parse_from_rfc3339(value)
            .map_err(|e| format!("Invalid timestamp {value:?}: {e}"))?;
        Self::new(parsed.with_timezone(&Utc))
    }

    pub fn validate(value: DateTime<Utc>) -> Result<(), String> {
        if value.year() < MIN_YEAR {
            return Err(format!("Timestamp before {MIN_YEAR}: {value}"));
        }
        if value > Utc::now() + Duration::seconds(FUTURE_SKEW_SECONDS) {
            return Err(format!("Timestamp in the future: {value}"));
        }
        Ok(())
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
