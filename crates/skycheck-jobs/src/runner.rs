//! Execution runner - drives one fired job through running to a terminal state.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::action::{CheckInArgs, ExternalAction, OutputSink};
use crate::error::JobError;
use crate::record::{JobRecord, OutputLine, Transition};
use crate::registry::JobRegistry;

/// Forwards action output into the job's record as it is produced.
struct RegistrySink<'a> {
    registry: &'a JobRegistry,
    id: &'a str,
}

impl OutputSink for RegistrySink<'_> {
    fn line(&self, message: String) {
        debug!(job_id = %self.id, output = %message, "check-in output");
        match self.registry.append_output(self.id, OutputLine::now(message)) {
            Ok(true) => {}
            Ok(false) => debug!(job_id = %self.id, "dropping output for finished check-in"),
            Err(e) => warn!(job_id = %self.id, "failed to record output: {}", e),
        }
    }
}

/// Runs the external action for a job and records the result.
pub struct ExecutionRunner {
    registry: Arc<JobRegistry>,
    action: Arc<dyn ExternalAction>,
}

impl ExecutionRunner {
    pub fn new(registry: Arc<JobRegistry>, action: Arc<dyn ExternalAction>) -> Self {
        Self { registry, action }
    }

    /// Execute job `id`.
    ///
    /// Returns `Err` only when the job could not be started (unknown id or no
    /// longer scheduled, e.g. cancelled); the action is not launched then.
    /// Every failure after the start is absorbed into the job as `failed`.
    pub async fn execute(&self, id: &str) -> Result<JobRecord, JobError> {
        let job = self.registry.transition(id, Transition::Start).map_err(|e| {
            info!(job_id = %id, "check-in not started: {}", e);
            e
        })?;
        info!(
            job_id = %id,
            confirmation = %job.confirmation_number,
            "check-in started"
        );

        let args = CheckInArgs::from(&job);
        let sink = RegistrySink {
            registry: &self.registry,
            id,
        };
        let run = AssertUnwindSafe(self.action.run(&args, &sink)).catch_unwind();

        let finish = match run.await {
            Ok(Ok(outcome)) if outcome.is_success() => {
                info!(job_id = %id, "check-in completed");
                Transition::Complete
            }
            Ok(Ok(outcome)) => {
                let error = outcome.failure_message();
                warn!(job_id = %id, exit_code = ?outcome.exit_code, "check-in failed: {}", error);
                Transition::Fail { error }
            }
            Ok(Err(e)) => {
                error!(job_id = %id, "check-in action error: {}", e);
                Transition::Fail {
                    error: e.to_string(),
                }
            }
            Err(_) => {
                error!(job_id = %id, "check-in action panicked");
                Transition::Fail {
                    error: "Check-in action panicked".to_string(),
                }
            }
        };

        self.registry.transition(id, finish).map_err(|e| {
            error!(job_id = %id, "failed to finalize check-in: {}", e);
            e
        })
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
