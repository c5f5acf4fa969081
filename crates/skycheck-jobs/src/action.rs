//! The external check-in action.
//!
//! An action receives the three check-in strings, pushes each output line to
//! an [`OutputSink`] as soon as it is produced, and reports the exit code.
//! [`ProcessAction`] runs a real executable; tests substitute fakes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use skycheck_config::{ActionConfig, FARE_CHECK_ENV_VAR};

use crate::error::ActionError;
use crate::record::JobRecord;

/// Positional arguments passed to the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInArgs {
    pub confirmation_number: String,
    pub first_name: String,
    pub last_name: String,
}

impl CheckInArgs {
    /// Arguments in the order the script expects them.
    pub fn as_array(&self) -> [&str; 3] {
        [
            self.confirmation_number.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
        ]
    }
}

impl From<&JobRecord> for CheckInArgs {
    fn from(job: &JobRecord) -> Self {
        Self {
            confirmation_number: job.confirmation_number.clone(),
            first_name: job.first_name.clone(),
            last_name: job.last_name.clone(),
        }
    }
}

/// Receiver for output lines, called in emission order.
pub trait OutputSink: Send + Sync {
    fn line(&self, message: String);
}

/// How the action terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Lines the action wrote to stderr, newline-joined.
    pub stderr: String,
}

impl ActionOutcome {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Captured stderr, or a synthesized message when stderr was empty.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.exit_code {
            Some(code) => format!("Check-in process exited with code {}", code),
            None => "Check-in process was terminated by a signal".to_string(),
        }
    }
}

/// Capability performing the actual check-in.
#[async_trait]
pub trait ExternalAction: Send + Sync {
    /// Run to completion, streaming every output line into `sink`.
    async fn run(
        &self,
        args: &CheckInArgs,
        sink: &dyn OutputSink,
    ) -> Result<ActionOutcome, ActionError>;
}

/// Runs the check-in script as a child process.
///
/// stdout and stderr are read concurrently and merged into one stream in
/// arrival order; each stream keeps its own order. Lines are trimmed and
/// blank lines are skipped. Bytes that are not UTF-8 become U+FFFD.
#[derive(Debug, Clone)]
pub struct ProcessAction {
    program: String,
    leading_args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ProcessAction {
    /// Run `program` with fare checking disabled.
    pub fn new(program: impl Into<String>) -> Self {
        let mut env = BTreeMap::new();
        env.insert(FARE_CHECK_ENV_VAR.to_string(), "false".to_string());
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            working_dir: None,
            env,
        }
    }

    /// Arguments placed before the three check-in strings.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, args: &CheckInArgs) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args.as_array())
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl From<&ActionConfig> for ProcessAction {
    fn from(config: &ActionConfig) -> Self {
        let mut action = Self::new(config.program.clone()).with_args(config.args.clone());
        action.env.extend(config.env.clone());
        if let Some(dir) = &config.working_dir {
            action = action.with_working_dir(dir.clone());
        }
        action
    }
}

#[async_trait]
impl ExternalAction for ProcessAction {
    async fn run(
        &self,
        args: &CheckInArgs,
        sink: &dyn OutputSink,
    ) -> Result<ActionOutcome, ActionError> {
        let mut child = self
            .command(args)
            .spawn()
            .map_err(|source| ActionError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        info!(
            program = %self.program,
            pid = child.id().unwrap_or_default(),
            confirmation = %args.confirmation_number,
            "check-in process launched"
        );

        let stdout = child.stdout.take().ok_or(ActionError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(ActionError::MissingPipe("stderr"))?;
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let (mut stdout_buf, mut stderr_buf) = (Vec::new(), Vec::new());
        let (mut stdout_open, mut stderr_open) = (true, true);
        let mut stderr_lines = Vec::new();

        // Raw reads: a byte that is not UTF-8 must not end the stream.
        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read_until(b'\n', &mut stdout_buf), if stdout_open => {
                    if read? == 0 {
                        stdout_open = false;
                    } else {
                        forward(sink, &String::from_utf8_lossy(&stdout_buf));
                        stdout_buf.clear();
                    }
                }
                read = stderr.read_until(b'\n', &mut stderr_buf), if stderr_open => {
                    if read? == 0 {
                        stderr_open = false;
                    } else {
                        if let Some(line) = forward(sink, &String::from_utf8_lossy(&stderr_buf)) {
                            stderr_lines.push(line);
                        }
                        stderr_buf.clear();
                    }
                }
            }
        }

        let status = child.wait().await?;
        debug!(program = %self.program, ?status, "check-in process exited");

        Ok(ActionOutcome {
            exit_code: status.code(),
            stderr: stderr_lines.join("\n"),
        })
    }
}

/// Push a non-blank trimmed line to the sink and return it.
fn forward(sink: &dyn OutputSink, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    sink.line(line.to_string());
    Some(line.to_string())
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
