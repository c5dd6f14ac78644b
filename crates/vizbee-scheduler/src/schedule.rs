use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::types::Schedule;

/// Wall-clock time of the fire following `from`. `None` only when the result
/// is out of chrono's range.
pub fn compute_next_run(schedule: &Schedule, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(schedule.as_secs()).ok()?;
    from.checked_add_signed(chrono::Duration::try_seconds(secs)?)
}

/// First point of the grid `due + k * period` (k >= 1) not earlier than `now`,
/// and how many grid points were skipped on the way. `None` when that point
/// is past what `Instant` can represent.
pub fn realign(due: Instant, period: Duration, now: Instant) -> Option<(Instant, u32)> {
    let mut next = due.checked_add(period)?;
    let mut skipped = 0u32;
    while next < now {
        next = next.checked_add(period)?;
        skipped = skipped.saturating_add(1);
    }
    Some((next, skipped))
}
