//! Monotonic-ish timestamps stamped onto lines when they are mutated.
//!
//! Grounded on `original_source/app/timestamp.cc` — the reference keeps a
//! simple wall-clock-derived stamp per line so a host can decide what to
//! redraw. `chrono` stands in for the reference's own tiny timestamp type.

use chrono::{DateTime, Utc};

/// The time a line was last mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// A timestamp that compares less than any real stamp; used to seed
    /// freshly allocated lines before they are ever written to.
    pub const EPOCH: Timestamp = Timestamp(0);

    pub fn now() -> Self {
        Timestamp(Utc::now().timestamp_millis())
    }

    pub fn millis_since_epoch(self) -> i64 {
        self.0
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or_else(|| DateTime::UNIX_EPOCH)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}
