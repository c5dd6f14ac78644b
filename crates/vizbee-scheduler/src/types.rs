use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::SchedulerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl IntervalUnit {
    pub fn as_secs(&self) -> u64 {
        match self {
            IntervalUnit::Days => 86_400,
            IntervalUnit::Hours => 3_600,
            IntervalUnit::Minutes => 60,
            IntervalUnit::Seconds => 1,
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntervalUnit::Days => "days",
            IntervalUnit::Hours => "hours",
            IntervalUnit::Minutes => "minutes",
            IntervalUnit::Seconds => "seconds",
        };
        write!(f, "{s}")
    }
}

impl FromStr for IntervalUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "days" => Ok(IntervalUnit::Days),
            "hours" => Ok(IntervalUnit::Hours),
            "minutes" => Ok(IntervalUnit::Minutes),
            "seconds" => Ok(IntervalUnit::Seconds),
            other => Err(format!("unknown interval unit: {other}")),
        }
    }
}

/// Fixed repeat interval, e.g. `"5 minutes"`. Always positive and small
/// enough to be added to the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schedule {
    every: u64,
    unit: IntervalUnit,
}

impl Schedule {
    pub fn new(every: u64, unit: IntervalUnit) -> Result<Self, SchedulerError> {
        if every == 0 {
            return Err(SchedulerError::InvalidSchedule(format!("0 {unit}")));
        }
        let invalid = || SchedulerError::InvalidSchedule(format!("{every} {unit}"));
        let secs = every.checked_mul(unit.as_secs()).ok_or_else(invalid)?;
        Instant::now()
            .checked_add(Duration::from_secs(secs))
            .ok_or_else(invalid)?;
        Ok(Self { every, unit })
    }

    pub fn every(&self) -> u64 {
        self.every
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    pub fn as_secs(&self) -> u64 {
        // Overflow is rejected in `new`.
        self.every * self.unit.as_secs()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.every, self.unit)
    }
}

/// Parses `<digits> <unit>` with exactly one space, the same shape the config
/// schema accepts.
impl FromStr for Schedule {
    type Err = SchedulerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || SchedulerError::InvalidSchedule(s.to_string());

        let (every, unit) = s.split_once(' ').ok_or_else(invalid)?;
        if every.is_empty() || !every.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let every: u64 = every.parse().map_err(|_| invalid())?;
        let unit: IntervalUnit = unit.parse().map_err(|_| invalid())?;
        Schedule::new(every, unit).map_err(|_| invalid())
    }
}

/// A registered job.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// UUID v4 string.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub schedule: Schedule,
    /// Opaque payload forwarded to the job handler.
    pub action: String,
    /// Completed runs, successful or not.
    pub run_count: u32,
    /// Fires skipped because the previous run was still going.
    pub skipped_count: u32,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
