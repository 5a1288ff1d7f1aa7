use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Ledger-assigned consensus time with nanosecond precision.
///
/// Within a topic consensus timestamps increase with every message, which
/// makes them the authoritative ordering key. They are rendered the way the
/// mirror node renders them: `seconds.nanos` with nine fractional digits.
///
/// Ordering: `seconds` → `nanos` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ConsensusTimestamp {
    /// Whole seconds since the UNIX epoch.
    pub seconds: i64,
    /// Sub-second nanoseconds, always `< 1_000_000_000`.
    pub nanos: u32,
}

impl ConsensusTimestamp {
    /// Create a timestamp, normalizing overflowing nanoseconds into seconds.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self {
            seconds: seconds + i64::from(nanos / NANOS_PER_SECOND),
            nanos: nanos % NANOS_PER_SECOND,
        }
    }

    /// The epoch (zero) timestamp.
    pub const fn zero() -> Self {
        Self {
            seconds: 0,
            nanos: 0,
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Total nanoseconds since the epoch.
    pub fn as_nanos(&self) -> i128 {
        i128::from(self.seconds) * i128::from(NANOS_PER_SECOND) + i128::from(self.nanos)
    }

    /// Build from total nanoseconds since the epoch.
    pub fn from_nanos(total: i128) -> Self {
        let per = i128::from(NANOS_PER_SECOND);
        let seconds = total.div_euclid(per);
        let nanos = total.rem_euclid(per);
        Self {
            seconds: seconds as i64,
            nanos: nanos as u32,
        }
    }

    /// The timestamp `duration` after this one.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let delta = i128::try_from(duration.as_nanos()).unwrap_or(i128::MAX / 2);
        Self::from_nanos(self.as_nanos().saturating_add(delta))
    }

    /// The timestamp `duration` before this one.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        let delta = i128::try_from(duration.as_nanos()).unwrap_or(i128::MAX / 2);
        Self::from_nanos(self.as_nanos().saturating_sub(delta))
    }

    /// The next representable timestamp (one nanosecond later).
    pub fn next(&self) -> Self {
        Self::from_nanos(self.as_nanos() + 1)
    }

    /// Convert to a chrono UTC datetime.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.seconds, self.nanos)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Parse the mirror-node form `seconds.nanos`.
    ///
    /// A missing fractional part means zero nanoseconds; fewer than nine
    /// fractional digits are right-padded.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidTimestamp(s.to_string());
        let (secs, frac) = match s.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (s, ""),
        };
        let seconds = secs.parse::<i64>().map_err(|_| invalid())?;
        if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let nanos = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<9}").parse::<u32>().map_err(|_| invalid())?
        };
        Ok(Self { seconds, nanos })
    }
}

impl From<DateTime<Utc>> for ConsensusTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos() % NANOS_PER_SECOND,
        }
    }
}

impl FromStr for ConsensusTimestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ConsensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsensusTimestamp({self})")
    }
}

impl fmt::Display for ConsensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}
