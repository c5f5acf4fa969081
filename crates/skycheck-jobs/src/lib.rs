//! # Skycheck Jobs
//!
//! Delayed execution of external check-in jobs with an observable lifecycle.
//!
//! ## Components
//!
//! - [`JobRegistry`]: concurrency-safe map of job id to [`JobRecord`]
//! - [`DelayScheduler`]: single-shot, cancellable timers keyed by job id
//! - [`ExecutionRunner`]: launches the [`ExternalAction`] and streams its output
//! - [`CheckInService`]: the facade the HTTP layer talks to
//!
//! ## Lifecycle
//!
//! ```text
//! scheduled ──► running ──► completed
//!     │            └──────► failed
//!     └──► cancelled
//! ```

pub mod action;
pub mod delay;
pub mod error;
pub mod record;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use action::{ActionOutcome, CheckInArgs, ExternalAction, OutputSink, ProcessAction};
pub use delay::{DelayPlan, DelayPolicy, FixedDelay};
pub use error::{ActionError, JobError};
pub use record::{CheckInRequest, JobId, JobRecord, JobStatus, OutputLine, Transition};
pub use registry::JobRegistry;
pub use runner::ExecutionRunner;
pub use scheduler::DelayScheduler;
pub use service::{CheckInService, JobLogs, StatusSummary};
