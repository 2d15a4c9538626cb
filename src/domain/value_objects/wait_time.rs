use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated dwell time at a location, in whole seconds. Monotonically
/// non-decreasing while the record stays pending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WaitTime(u64);

impl WaitTime {
    pub fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    pub fn as_seconds(&self) -> u64 {
        self.0
    }

    /// The value actually sent remotely: stored seconds plus whatever accrued
    /// between capture and `now`, clamped at zero for a clock that moved
    /// backwards.
    ///
    /// Both the foreground engine and the background task recompute this from
    /// the local clock at send time, so any later write for the same record
    /// carries a value greater than or equal to any earlier one. With a
    /// single writer device that makes plain last-write-wins monotone; no
    /// conditional write is needed.
    pub fn topped_up(&self, captured_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let elapsed = (now - captured_at).num_seconds().max(0) as u64;
        Self(self.0 + elapsed)
    }
}
