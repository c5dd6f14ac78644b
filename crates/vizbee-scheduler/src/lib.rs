//! `vizbee-scheduler`: in-memory interval job scheduler on tokio.
//!
//! # Overview
//!
//! Jobs are registered on a [`engine::SchedulerEngine`] before it starts.
//! [`engine::SchedulerEngine::run`] then sleeps until the earliest due job,
//! hands it to a [`engine::JobHandler`] and computes the next fire time, until
//! the shutdown signal flips to `true`.
//!
//! Jobs run inline, one at a time. A job that overruns its interval does not
//! queue up missed fires: they are skipped and the next fire is realigned to
//! the job's original grid.
//!
//! # Schedule format
//!
//! | Text           | Interval     |
//! |----------------|--------------|
//! | `30 seconds`   | 30 s         |
//! | `5 minutes`    | 300 s        |
//! | `1 hours`      | 3 600 s      |
//! | `2 days`       | 172 800 s    |

pub mod engine;
pub mod error;
pub mod schedule;
pub mod types;

pub use engine::{JobHandler, SchedulerEngine};
pub use error::{Result, SchedulerError};
pub use types::{IntervalUnit, Job, Schedule};
