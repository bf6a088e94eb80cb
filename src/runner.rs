use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use crate::{Error, Result};

/// Captured output of one CLI invocation that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program with an explicit argument list.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CliOutput>;
}

/// Runs the SmartThings CLI as a child process.
#[derive(Debug, Clone, Default)]
pub struct CliRunner {
    timeout: Option<Duration>,
}

impl CliRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the child and fail with [`Error::Timeout`] if it runs longer
    /// than `timeout`. Without one, a hung CLI blocks the caller.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

#[async_trait]
impl CommandRunner for CliRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CliOutput> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::Spawn)?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| Error::Timeout)??,
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        trace!(status = ?output.status, stdout_len = stdout.len(), "CLI exited");

        if !output.status.success() {
            return Err(Error::CommandFailed {
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CliOutput { stdout, stderr })
    }
}
