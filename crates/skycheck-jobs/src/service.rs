//! Check-in service - the facade the HTTP layer talks to.
//!
//! Reads go straight to the registry. `create` inserts and arms a timer whose
//! callback hands the job to the runner; `cancel` moves the job to cancelled
//! and disarms its timer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::action::ExternalAction;
use crate::delay::DelayPolicy;
use crate::error::JobError;
use crate::record::{CheckInRequest, JobId, JobRecord, JobStatus, OutputLine, Transition};
use crate::registry::JobRegistry;
use crate::runner::ExecutionRunner;
use crate::scheduler::DelayScheduler;

/// Heartbeat plus queue depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub status: &'static str,
    pub scheduled_count: usize,
    pub running_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Output and timing of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLogs {
    #[serde(rename = "logs")]
    pub output: Vec<OutputLine>,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<JobRecord> for JobLogs {
    fn from(job: JobRecord) -> Self {
        Self {
            output: job.output,
            status: job.status,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// Wires registry, scheduler, runner and delay policy together.
pub struct CheckInService {
    registry: Arc<JobRegistry>,
    scheduler: DelayScheduler<JobId>,
    runner: Arc<ExecutionRunner>,
    policy: Arc<dyn DelayPolicy>,
}

impl CheckInService {
    pub fn new(action: Arc<dyn ExternalAction>, policy: Arc<dyn DelayPolicy>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let runner = Arc::new(ExecutionRunner::new(registry.clone(), action));
        Self {
            registry,
            scheduler: DelayScheduler::new(),
            runner,
            policy,
        }
    }

    /// Create a job and arm its timer. Must be called inside a tokio runtime.
    pub fn create(&self, request: CheckInRequest) -> Result<JobRecord, JobError> {
        let plan = self.policy.plan(Utc::now());
        let job = self.registry.create(request, plan.scheduled_for)?;

        let runner = self.runner.clone();
        let armed = self.scheduler.arm(job.id.clone(), plan.fire_after, move |id| async move {
            // Outcomes are recorded on the job; nothing to propagate here.
            let _ = runner.execute(&id).await;
        });
        if let Err(e) = armed {
            warn!(job_id = %job.id, "failed to arm check-in timer: {}", e);
            let _ = self.registry.transition(&job.id, Transition::Cancel);
            return Err(e);
        }

        info!(
            job_id = %job.id,
            confirmation = %job.confirmation_number,
            fire_after_secs = plan.fire_after.as_secs(),
            scheduled_for = %job.scheduled_for.to_rfc3339(),
            "check-in scheduled"
        );
        Ok(job)
    }

    /// Cancel a scheduled job. Running and finished jobs are rejected.
    pub fn cancel(&self, id: &str) -> Result<JobRecord, JobError> {
        let job = self.registry.transition(id, Transition::Cancel)?;
        self.scheduler.cancel(&job.id);
        info!(job_id = %id, "check-in cancelled");
        Ok(job)
    }

    pub fn get(&self, id: &str) -> Result<JobRecord, JobError> {
        self.registry.get(id)
    }

    /// Every job, newest first.
    pub fn list_all(&self) -> Vec<JobRecord> {
        self.registry.list()
    }

    pub fn logs_for(&self, id: &str) -> Result<JobLogs, JobError> {
        self.registry.get(id).map(JobLogs::from)
    }

    pub fn status_summary(&self) -> StatusSummary {
        StatusSummary {
            status: "healthy",
            scheduled_count: self.registry.count_by_status(JobStatus::Scheduled),
            running_count: self.registry.count_by_status(JobStatus::Running),
            timestamp: Utc::now(),
        }
    }

    /// Disarm every pending timer. Jobs already running finish on their own.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        info!(
            scheduled = self.registry.count_by_status(JobStatus::Scheduled),
            "check-in service stopped accepting timers"
        );
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
