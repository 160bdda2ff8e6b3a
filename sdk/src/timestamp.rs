//! Wall-clock instants with nanosecond precision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Seconds and nanoseconds since the Unix epoch.
///
/// `nanos` is always normalised into `0..1_000_000_000`, so the derived
/// ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawTimestamp")]
pub struct Timestamp {
    /// Whole seconds since the epoch.
    pub seconds: i64,
    /// Sub-second nanoseconds.
    pub nanos: u32,
}

impl Timestamp {
    /// Creates a timestamp, carrying excess nanoseconds into seconds.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self::from_total_nanos(i128::from(seconds) * i128::from(NANOS_PER_SECOND) + i128::from(nanos))
    }

    /// The current UTC time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Returns this instant moved forward by `duration`.
    pub fn plus(self, duration: Duration) -> Self {
        Self::from_total_nanos(self.total_nanos() + duration.as_nanos() as i128)
    }

    /// Returns this instant moved back by `duration`.
    pub fn minus(self, duration: Duration) -> Self {
        Self::from_total_nanos(self.total_nanos() - duration.as_nanos() as i128)
    }

    fn total_nanos(self) -> i128 {
        i128::from(self.seconds) * i128::from(NANOS_PER_SECOND) + i128::from(self.nanos)
    }

    fn from_total_nanos(total: i128) -> Self {
        let per_second = i128::from(NANOS_PER_SECOND);
        Self {
            seconds: total.div_euclid(per_second) as i64,
            nanos: total.rem_euclid(per_second) as u32,
        }
    }
}

/// Wire form of a [`Timestamp`], before normalisation.
#[derive(Deserialize)]
struct RawTimestamp {
    seconds: i64,
    nanos: u32,
}

impl From<RawTimestamp> for Timestamp {
    fn from(raw: RawTimestamp) -> Self {
        Self::new(raw.seconds, raw.nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanos_carry_into_seconds() {
        let ts = Timestamp::new(10, 1_500_000_000);
        assert_eq!(ts, Timestamp { seconds: 11, nanos: 500_000_000 });
    }

    #[test]
    fn plus_and_minus_are_inverse() {
        let ts = Timestamp::new(1_700_000_000, 999_999_999);
        let later = ts.plus(Duration::from_nanos(1));
        assert_eq!(later, Timestamp::new(1_700_000_001, 0));
        assert_eq!(later.minus(Duration::from_nanos(1)), ts);
    }

    #[test]
    fn display_pads_nanos() {
        assert_eq!(Timestamp::new(5, 42).to_string(), "5.000000042");
    }

    #[test]
    fn decoding_normalises_out_of_range_nanos() {
        let raw = bincode::serialize(&(7i64, 2_000_000_001u32)).unwrap();
        let ts: Timestamp = bincode::deserialize(&raw).unwrap();
        assert_eq!(ts, Timestamp::new(9, 1));
        assert!(ts > Timestamp::new(8, 999_999_999));
    }

    #[test]
    fn ordering_is_chronological() {
        assert!(Timestamp::new(1, 999) < Timestamp::new(2, 0));
        assert!(Timestamp::now() > Timestamp::new(1_600_000_000, 0));
    }
}
