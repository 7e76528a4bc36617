use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use crate::config::EnvSnapshot;

const KILLED_MESSAGE: &str = "The build failed because the process exited too early. \
This probably means the system ran out of memory or someone called \
`kill -9` on the process.";

const TERMINATED_MESSAGE: &str = "The build failed because the process exited too early. \
Someone might have called `kill` or `killall`, or the system could \
be shutting down.";

/// A fully assembled runtime invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Launch {
    pub runtime: PathBuf,
    pub args: Vec<String>,
    /// `None` inherits the parent environment untouched.
    #[serde(skip)]
    pub env: Option<EnvSnapshot>,
}

impl Launch {
    /// `runtime_args ++ [entry_point] ++ script_args`
    pub fn new(
        runtime: PathBuf,
        runtime_args: &[String],
        entry_point: PathBuf,
        script_args: &[String],
    ) -> Self {
        let mut args = runtime_args.to_vec();
        args.push(entry_point.to_string_lossy().into_owned());
        args.extend_from_slice(script_args);
        Self {
            runtime,
            args,
            env: None,
        }
    }

    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    /// Run the child with inherited stdio and block until it exits.
    pub fn run(&self) -> Result<ChildOutcome> {
        let mut cmd = Command::new(&self.runtime);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(env) = &self.env {
            cmd.env_clear().envs(env.iter_os());
        }

        info!("Running {} {}", self.runtime.display(), self.args.join(" "));
        let status = cmd
            .status()
            .with_context(|| format!("Failed to run {}", self.runtime.display()))?;
        debug!("Child finished with {}", status);

        Ok(ChildOutcome::from(status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    Exited(i32),
    /// Terminated by a signal; the number is `None` where the platform has no signals.
    Signaled(Option<i32>),
}

impl ChildOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            ChildOutcome::Exited(code) => *code,
            ChildOutcome::Signaled(_) => 1,
        }
    }

    /// Message explaining an early exit, for the signals we can explain.
    pub fn explanation(&self) -> Option<&'static str> {
        match self {
            #[cfg(unix)]
            ChildOutcome::Signaled(Some(libc::SIGKILL)) => Some(KILLED_MESSAGE),
            #[cfg(unix)]
            ChildOutcome::Signaled(Some(libc::SIGTERM)) => Some(TERMINATED_MESSAGE),
            _ => None,
        }
    }
}

impl From<ExitStatus> for ChildOutcome {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ChildOutcome::Exited(code),
            None => ChildOutcome::Signaled(terminating_signal(status)),
        }
    }
}

#[cfg(unix)]
fn terminating_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: ExitStatus) -> Option<i32> {
    None
}
