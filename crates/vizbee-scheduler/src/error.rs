use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The schedule text is not `<positive integer> <unit>`, or the interval
    /// is too long to schedule.
    #[error("Invalid schedule `{0}`")]
    InvalidSchedule(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
