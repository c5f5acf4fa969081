//! Fake actions shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::action::{ActionOutcome, CheckInArgs, ExternalAction, OutputSink};
use crate::error::ActionError;

/// Emits fixed lines then returns a fixed result.
pub(crate) struct ScriptedAction {
    lines: Vec<String>,
    result: Result<ActionOutcome, String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<CheckInArgs>>,
}

impl ScriptedAction {
    pub(crate) fn succeeding(lines: &[&str]) -> Self {
        Self::new(lines, Ok(ActionOutcome::success()))
    }

    pub(crate) fn exiting(lines: &[&str], code: i32, stderr: &str) -> Self {
        Self::new(lines, Ok(ActionOutcome::failure(code, stderr)))
    }

    pub(crate) fn erroring(message: &str) -> Self {
        Self::new(&[], Err(message.to_string()))
    }

    fn new(lines: &[&str], result: Result<ActionOutcome, String>) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            result,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<CheckInArgs> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalAction for ScriptedAction {
    async fn run(
        &self,
        args: &CheckInArgs,
        sink: &dyn OutputSink,
    ) -> Result<ActionOutcome, ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(args.clone());
        for line in &self.lines {
            sink.line(line.clone());
        }
        self.result.clone().map_err(ActionError::Custom)
    }
}

/// Emits `before`, waits for `release`, then emits `after` and succeeds.
pub(crate) struct GatedAction {
    before: String,
    after: String,
    pub(crate) started: Notify,
    pub(crate) release: Notify,
}

impl GatedAction {
    pub(crate) fn new(before: &str, after: &str) -> Self {
        Self {
            before: before.to_string(),
            after: after.to_string(),
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ExternalAction for GatedAction {
    async fn run(
        &self,
        _args: &CheckInArgs,
        sink: &dyn OutputSink,
    ) -> Result<ActionOutcome, ActionError> {
        sink.line(self.before.clone());
        self.started.notify_one();
        self.release.notified().await;
        sink.line(self.after.clone());
        Ok(ActionOutcome::success())
    }
}

/// Panics mid-run.
pub(crate) struct PanickingAction;

#[async_trait]
impl ExternalAction for PanickingAction {
    async fn run(
        &self,
        _args: &CheckInArgs,
        sink: &dyn OutputSink,
    ) -> Result<ActionOutcome, ActionError> {
        sink.line("about to fail".to_string());
        panic!("driver crashed");
    }
}
