//! Job record and status definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Opaque job identifier.
pub type JobId = String;

/// Check-in job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for the delay to elapse.
    Scheduled,
    /// External action is in flight.
    Running,
    /// External action exited 0.
    Completed,
    /// Launch failure or non-zero exit.
    Failed,
    /// Cancelled before it started.
    Cancelled,
}

impl JobStatus {
    /// Stable lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// No transitions leave a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Scheduled or running.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Whether `next` is a legal edge from `self`.
    ///
    /// Running is deliberately not cancellable: once the action starts it
    /// runs to completion.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Running)
                | (Self::Scheduled, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status change plus the fields it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// scheduled -> running, stamps `startedAt`.
    Start,
    /// running -> completed, stamps `completedAt`.
    Complete,
    /// running -> failed, records `error`.
    Fail { error: String },
    /// scheduled -> cancelled, stamps `cancelledAt`.
    Cancel,
}

impl Transition {
    /// Status the job ends up in.
    pub fn target(&self) -> JobStatus {
        match self {
            Self::Start => JobStatus::Running,
            Self::Complete => JobStatus::Completed,
            Self::Fail { .. } => JobStatus::Failed,
            Self::Cancel => JobStatus::Cancelled,
        }
    }
}

/// One line of captured action output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl OutputLine {
    /// Line stamped with the current time.
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Create input as received from the caller.
///
/// Missing fields deserialize as empty strings and are rejected by
/// [`CheckInRequest::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    #[serde(default)]
    pub confirmation_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl CheckInRequest {
    pub fn new(
        confirmation_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            confirmation_number: confirmation_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Trim every field, upper-case the confirmation number and check that
    /// it is six ASCII alphanumerics.
    pub fn validate(self) -> Result<Self, JobError> {
        let confirmation_number = self.confirmation_number.trim().to_ascii_uppercase();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();

        let missing: Vec<&str> = [
            ("confirmationNumber", confirmation_number.is_empty()),
            ("firstName", first_name.is_empty()),
            ("lastName", last_name.is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, empty)| empty.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(JobError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        if confirmation_number.len() != 6
            || !confirmation_number.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(JobError::Validation(
                "Invalid confirmation number format. Must be 6 alphanumeric characters."
                    .to_string(),
            ));
        }

        Ok(Self {
            confirmation_number,
            first_name,
            last_name,
        })
    }
}

/// A check-in attempt and its evolving state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: JobId,
    pub confirmation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Informational; the scheduler's timer decides when the job fires.
    pub scheduled_for: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub output: Vec<OutputLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// New scheduled record from already-validated input.
    pub fn new(id: JobId, request: CheckInRequest, scheduled_for: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id,
            confirmation_number: request.confirmation_number,
            first_name: request.first_name,
            last_name: request.last_name,
            status: JobStatus::Scheduled,
            created_at: now,
            updated_at: now,
            scheduled_for,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            output: Vec::new(),
            error: None,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
