//! Job and action errors.

use thiserror::Error;

use crate::record::JobStatus;

/// Errors surfaced to callers of the registry, scheduler and service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// Create input is missing or malformed. The job is never created.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The confirmation number already has a scheduled or running job.
    #[error("Confirmation number {0} is already scheduled for check-in")]
    DuplicateActive(String),

    /// Unknown job id.
    #[error("Check-in not found: {0}")]
    NotFound(String),

    /// The requested status is not reachable from the current one.
    #[error("Invalid transition for check-in {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// A timer is already armed (or has fired) for this id.
    #[error("Check-in already scheduled: {0}")]
    AlreadyScheduled(String),
}

/// Failures of the external check-in action.
///
/// These never reach callers; the runner records them as the job's `error`.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The executable could not be started.
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading output or waiting on the process failed.
    #[error("Process I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stdio pipe was not captured on spawn.
    #[error("Process {0} was not captured")]
    MissingPipe(&'static str),

    /// Generic error.
    #[error("{0}")]
    Custom(String),
}
