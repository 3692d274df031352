//! Language-server child process management.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::error::Error;
use crate::types::ServerConfig;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Handle on a spawned language server.
///
/// The child is killed on drop, so losing the handle never leaks a
/// server process.
pub struct ServerProcess {
    child: Child,
    program: String,
}

/// The stdio pipes of a spawned server, ready to feed a dispatcher.
pub struct ServerIo {
    pub stdout: ChildStdout,
    pub stdin: ChildStdin,
}

impl ServerProcess {
    /// Resolve the configured command on `PATH` and spawn it with piped
    /// stdio. Stderr is drained into the log in the background.
    pub fn spawn(config: &ServerConfig) -> Result<(Self, ServerIo), Error> {
        let program = which::which(&config.command).map_err(|e| Error::Spawn {
            program: config.command.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e),
        })?;

        let mut child = Command::new(&program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Spawn {
                program: config.command.clone(),
                source: e,
            })?;

        tracing::info!(program = %program.display(), "language server spawned");

        // Pipes are always present with Stdio::piped; a missing handle
        // means the child is unusable.
        let stdin = child.stdin.take().ok_or_else(|| Error::Spawn {
            program: config.command.clone(),
            source: std::io::Error::other("child stdin not captured"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| Error::Spawn {
            program: config.command.clone(),
            source: std::io::Error::other("child stdout not captured"),
        })?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr, config.command.clone()));
        }

        let process = Self {
            child,
            program: config.command.clone(),
        };
        Ok((process, ServerIo { stdout, stdin }))
    }

    /// Give the server a short grace period to exit, then kill it.
    pub async fn shutdown(mut self) {
        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(server = %self.program, %status, "language server exited");
            }
            Ok(Err(e)) => {
                tracing::warn!(server = %self.program, "wait on language server failed: {e}");
            }
            Err(_) => {
                tracing::warn!(server = %self.program, "language server did not exit, killing");
                if let Err(e) = self.child.kill().await {
                    tracing::warn!(server = %self.program, "kill failed: {e}");
                }
            }
        }
    }
}

async fn drain_stderr(stderr: ChildStderr, program: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(server = %program, "stderr: {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_unknown_program_fails() {
        let config = ServerConfig::new("definitely-not-a-real-lsp-server-9f2c", Vec::new());
        let result = ServerProcess::spawn(&config);
        match result {
            Err(Error::Spawn { program, .. }) => {
                assert_eq!(program, "definitely-not-a-real-lsp-server-9f2c");
            }
            Err(other) => panic!("expected Spawn error, got {other:?}"),
            Ok(_) => panic!("spawn of a nonexistent binary succeeded"),
        }
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown_real_process() {
        let config = ServerConfig::new("cat", Vec::new());
        let (process, io) = ServerProcess::spawn(&config).unwrap();
        drop(io); // closing stdin lets cat exit on its own
        process.shutdown().await;
    }
}
