//! Concurrency-safe job registry.
//!
//! Every read and mutation of a [`JobRecord`] goes through this type. The map
//! is sharded (`DashMap`), so a mutation locks only the shard holding that
//! job: calls on the same job are totally ordered and calls on different jobs
//! rarely contend.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use uuid::Uuid;

use crate::error::JobError;
use crate::record::{CheckInRequest, JobId, JobRecord, JobStatus, OutputLine, Transition};

/// Registry of every job created during the process lifetime.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<JobId, JobRecord>,
    /// Confirmation number -> id of its scheduled or running job.
    active: DashMap<String, JobId>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `request` and insert a new scheduled job.
    ///
    /// Nothing is inserted on error.
    pub fn create(
        &self,
        request: CheckInRequest,
        scheduled_for: DateTime<Utc>,
    ) -> Result<JobRecord, JobError> {
        let request = request.validate()?;
        let id = Uuid::new_v4().to_string();

        // Holding the `active` slot makes the duplicate check and the insert atomic.
        match self.active.entry(request.confirmation_number.clone()) {
            Entry::Occupied(mut existing) => {
                // The owner may already be terminal while `transition` has not
                // yet released its slot.
                let owner_active = self
                    .jobs
                    .get(existing.get())
                    .is_some_and(|owner| owner.status.is_active());
                if owner_active {
                    debug!(
                        confirmation = %existing.key(),
                        job_id = %existing.get(),
                        "rejecting duplicate active check-in"
                    );
                    return Err(JobError::DuplicateActive(existing.key().clone()));
                }
                let record = self.insert_scheduled(id.clone(), request, scheduled_for);
                existing.insert(id);
                Ok(record)
            }
            Entry::Vacant(slot) => {
                let record = self.insert_scheduled(id.clone(), request, scheduled_for);
                slot.insert(id);
                Ok(record)
            }
        }
    }

    fn insert_scheduled(
        &self,
        id: JobId,
        request: CheckInRequest,
        scheduled_for: DateTime<Utc>,
    ) -> JobRecord {
        let record = JobRecord::new(id.clone(), request, scheduled_for);
        self.jobs.insert(id, record.clone());
        record
    }

    /// Snapshot of one job.
    pub fn get(&self, id: &str) -> Result<JobRecord, JobError> {
        self.jobs
            .get(id)
            .map(|job| job.value().clone())
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    /// Snapshot of every job, newest first.
    pub fn list(&self) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.jobs.iter().map(|job| job.value().clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    /// Atomically apply `transition` and return the updated snapshot.
    pub fn transition(&self, id: &str, transition: Transition) -> Result<JobRecord, JobError> {
        let (record, released) = {
            let mut entry = self
                .jobs
                .get_mut(id)
                .ok_or_else(|| JobError::NotFound(id.to_string()))?;
            let job = entry.value_mut();
            let target = transition.target();

            if !job.status.can_transition_to(target) {
                return Err(JobError::InvalidTransition {
                    id: id.to_string(),
                    from: job.status,
                    to: target,
                });
            }

            let now = Utc::now();
            job.status = target;
            job.updated_at = now;
            match transition {
                Transition::Start => job.started_at = Some(now),
                Transition::Complete => job.completed_at = Some(now),
                Transition::Fail { error } => job.error = Some(error),
                Transition::Cancel => job.cancelled_at = Some(now),
            }

            let released = target
                .is_terminal()
                .then(|| job.confirmation_number.clone());
            (job.clone(), released)
        };

        // The job entry is released before touching `active`; `create` locks in
        // the opposite order.
        if let Some(confirmation) = released {
            self.active.remove_if(&confirmation, |_, owner| owner == id);
        }

        debug!(job_id = %id, status = %record.status, "check-in transitioned");
        Ok(record)
    }

    /// Append one output line if the job is running.
    ///
    /// Returns `Ok(false)` when the line is dropped because the job is not
    /// running; late lines racing a terminal transition are expected.
    pub fn append_output(&self, id: &str, line: OutputLine) -> Result<bool, JobError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        let job = entry.value_mut();

        if job.status != JobStatus::Running {
            return Ok(false);
        }

        job.updated_at = line.timestamp;
        job.output.push(line);
        Ok(true)
    }

    /// Number of jobs currently in `status`.
    pub fn count_by_status(&self, status: JobStatus) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.value().status == status)
            .count()
    }

    /// Total number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job was ever created.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
