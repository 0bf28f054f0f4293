//! Wall-clock timestamps for lease records.
//!
//! Timestamps are derived from `tokio::time::Instant` against an anchor
//! taken once per process, so record times advance with the runtime clock
//! (including a paused test clock) and never jump when the system clock is
//! stepped.

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use lazy_static::lazy_static;
use tokio::time::Duration;
use tokio::time::Instant;

lazy_static! {
    static ref ANCHOR: (DateTime<Utc>, Instant) = (Utc::now(), Instant::now());
}

/// Current time as written into `renewTime` / `acquireTime`
pub(crate) fn now_utc() -> DateTime<Utc> {
    at(Instant::now())
}

/// Wall-clock time corresponding to a runtime instant
pub(crate) fn at(instant: Instant) -> DateTime<Utc> {
    let (anchor_utc, anchor_instant) = *ANCHOR;
    let shifted = if instant >= anchor_instant {
        anchor_utc.checked_add_signed(delta(instant - anchor_instant))
    } else {
        anchor_utc.checked_sub_signed(delta(anchor_instant - instant))
    };
    shifted.unwrap_or(anchor_utc)
}

/// `Duration` as a chrono delta, saturating at the chrono range
pub(crate) fn delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
