//! `ProcessRunner` — the per-executable process-supervision adapter.
//!
//! Spawns the child in its own process group/session so a single
//! group-level signal reaps shell-invoked grandchildren (a `sleep` started
//! by a shell command would otherwise survive a parent-only kill). Exposes
//! the child's stdout/stderr as readable handles, a timeout-aware `wait`,
//! and a `terminate` that escalates from `SIGTERM` to `SIGKILL` after a
//! short grace period.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{ChildStderr, ChildStdout, Command};

use crate::error::ProcessError;
use crate::executable::Executable;

/// How a child process came to an end.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The child exited on its own within the timeout.
    Exited(ExitStatus),
    /// The timeout elapsed before the child exited.
    TimedOut,
    /// Waiting on the child failed at the OS level.
    Error(std::io::Error),
}

/// The grace period `terminate` waits for `SIGTERM` before escalating to
/// `SIGKILL`.
const TERMINATION_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// A running (or finished) child process.
///
/// Stdout/stderr are handed back separately from `start` so a caller can
/// `tokio::spawn` readers for both streams that run concurrently with
/// `wait` — reading them only after the child exits risks deadlock if the
/// child fills a pipe buffer before it terminates.
pub struct ProcessRunner {
    child: tokio::process::Child,
}

impl ProcessRunner {
    /// Spawn `executable` as a child process in a new process group,
    /// returning the runner plus its piped stdout/stderr.
    ///
    /// `CommandExec` runs under the system shell; `FunctionExec` re-execs
    /// the current binary with a hidden invocation subcommand so the
    /// target always runs isolated in its own process, never in-process.
    pub fn start(executable: &Executable) -> Result<(Self, ChildStdout, ChildStderr), ProcessError> {
        let mut command = match executable {
            Executable::Command { cmd, .. } => {
                let mut c = Command::new("/bin/sh");
                c.arg("-c").arg(cmd);
                c
            }
            Executable::Function {
                target,
                args,
                kwargs,
                ..
            } => {
                let exe = std::env::current_exe()?;
                let args_json = serde_json::to_string(args)
                    .map_err(|e| ProcessError::UnsupportedExecutable(e.to_string()))?;
                let kwargs_json = serde_json::to_string(kwargs)
                    .map_err(|e| ProcessError::UnsupportedExecutable(e.to_string()))?;
                let mut c = Command::new(exe);
                c.arg("__invoke-function")
                    .arg(target)
                    .arg(args_json)
                    .arg(kwargs_json);
                c
            }
        };

        command
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .stdin(std::process::Stdio::null());

        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn()?;
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        Ok((Self { child }, stdout, stderr))
    }

    /// The OS process id of the child, if it hasn't already been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the child to exit, or for `timeout` to elapse.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> WaitOutcome {
        let wait_fut = self.child.wait();
        match timeout {
            None => match wait_fut.await {
                Ok(status) => WaitOutcome::Exited(status),
                Err(e) => WaitOutcome::Error(e),
            },
            Some(d) => match tokio::time::timeout(d, wait_fut).await {
                Ok(Ok(status)) => WaitOutcome::Exited(status),
                Ok(Err(e)) => WaitOutcome::Error(e),
                Err(_elapsed) => WaitOutcome::TimedOut,
            },
        }
    }

    /// Send a termination signal to the whole process group; escalate to a
    /// forced kill if the child is still alive after the grace period.
    /// Always followed by a final bounded `wait` so the process is reaped,
    /// whose status (e.g. `-15` once translated by [`exit_code`]) is
    /// returned to the caller.
    pub async fn terminate(&mut self) -> Option<ExitStatus> {
        self.signal_group(TerminationSignal::Term);

        match self.wait(Some(TERMINATION_GRACE_PERIOD)).await {
            WaitOutcome::Exited(status) => Some(status),
            WaitOutcome::TimedOut => {
                tracing::warn!(
                    pid = self.pid(),
                    "process survived SIGTERM grace period, escalating to SIGKILL"
                );
                self.signal_group(TerminationSignal::Kill);
                // A killed process cannot block indefinitely; no timeout needed.
                self.child.wait().await.ok()
            }
            WaitOutcome::Error(e) => {
                tracing::warn!(pid = self.pid(), error = %e, "error waiting on terminated process");
                None
            }
        }
    }

    #[cfg(unix)]
    fn signal_group(&self, which: TerminationSignal) {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.pid() else { return };
        let pgid = Pid::from_raw(pid as i32);
        let signal = match which {
            TerminationSignal::Term => Signal::SIGTERM,
            TerminationSignal::Kill => Signal::SIGKILL,
        };
        if let Err(e) = killpg(pgid, signal) {
            tracing::warn!(pid, ?signal, error = %e, "failed to signal process group");
        }
    }

    #[cfg(not(unix))]
    fn signal_group(&self, which: TerminationSignal) {
        match which {
            TerminationSignal::Term => {
                let _ = self.child.start_kill();
            }
            TerminationSignal::Kill => {
                let _ = self.child.start_kill();
            }
        }
    }
}

enum TerminationSignal {
    Term,
    Kill,
}

/// POSIX exit-code semantics: normal exit yields the non-negative exit
/// code; termination by signal yields `-signal_number`, matching `wait(2)`.
pub fn exit_code(status: &ExitStatus) -> Option<i32> {
    if let Some(code) = status.code() {
        return Some(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(-signal);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn command_runs_to_completion() {
        let exec = Executable::Command {
            cmd: "exit 0".into(),
            timeout: None,
        };
        let (mut runner, _out, _err) = ProcessRunner::start(&exec).unwrap();
        match runner.wait(None).await {
            WaitOutcome::Exited(status) => assert_eq!(exit_code(&status), Some(0)),
            other => panic!("expected Exited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn command_reports_nonzero_exit() {
        let exec = Executable::Command {
            cmd: "exit 7".into(),
            timeout: None,
        };
        let (mut runner, _out, _err) = ProcessRunner::start(&exec).unwrap();
        match runner.wait(None).await {
            WaitOutcome::Exited(status) => assert_eq!(exit_code(&status), Some(7)),
            other => panic!("expected Exited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wait_times_out_on_slow_command() {
        let exec = Executable::Command {
            cmd: "sleep 5".into(),
            timeout: Some(Duration::from_millis(50)),
        };
        let (mut runner, _out, _err) = ProcessRunner::start(&exec).unwrap();
        match runner.wait(exec.timeout()).await {
            WaitOutcome::TimedOut => {}
            other => panic!("expected TimedOut, got {other:?}"),
        }
        runner.terminate().await;
    }

    #[tokio::test]
    async fn terminate_reaps_process_group_including_grandchildren() {
        // `sleep 5` run under a shell is the grandchild; terminate() must
        // kill the whole group, not just the shell.
        let exec = Executable::Command {
            cmd: "sleep 5 & wait".into(),
            timeout: Some(Duration::from_millis(50)),
        };
        let (mut runner, _out, _err) = ProcessRunner::start(&exec).unwrap();
        let pid = runner.pid().unwrap();
        assert!(matches!(runner.wait(Some(Duration::from_millis(50))).await, WaitOutcome::TimedOut));
        runner.terminate().await;

        // The process group leader should no longer be alive.
        #[cfg(unix)]
        {
            use nix::sys::signal::kill;
            use nix::unistd::Pid;
            let alive = kill(Pid::from_raw(pid as i32), None).is_ok();
            assert!(!alive, "process group leader should have been reaped");
        }
    }
}
