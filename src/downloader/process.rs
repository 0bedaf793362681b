//! Cancellable subprocess runner.
//!
//! Every external tool (yt-dlp, python, ffmpeg) goes through [`run_streaming`].
//! The child is raced against the command deadline and a [`CancellationToken`]
//! (which [`RunLimits::cancel_on_ctrl_c`] ties to Ctrl+C). When either fires
//! first, the child's whole process group is killed and the child reaped
//! before the function returns, so no work continues after the caller gives up.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::sys::signal::{killpg, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

use super::errors::DownloadError;

/// Program plus the arguments that always precede per-call arguments
/// (e.g. `python3 -m yt_dlp`).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    program: PathBuf,
    base_args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Human-readable command line for logs.
    pub fn display(&self, args: &[String]) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.base_args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }
}

/// Deadline and cancellation shared by every subprocess of one command.
#[derive(Debug, Clone)]
pub struct RunLimits {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RunLimits {
    /// Start the clock now.
    pub fn new(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        Self {
            timeout,
            deadline: timeout.map(|t| Instant::now() + t),
            cancel,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None, CancellationToken::new())
    }

    /// Same token, deadline no later than `cap` from now.
    ///
    /// Expiry of the cap alone still reports the outer timeout; callers that
    /// need to tell the two apart check the outer limits afterwards.
    pub fn capped(&self, cap: Duration) -> Self {
        let capped = Instant::now() + cap;
        Self {
            timeout: self.timeout,
            deadline: Some(self.deadline.map_or(capped, |d| d.min(capped))),
            cancel: self.cancel.clone(),
        }
    }

    /// Cancel on Ctrl+C for as long as the returned task runs.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = signal::ctrl_c() => {
                    if result.is_ok() {
                        warn!("interrupted, cancelling");
                        cancel.cancel();
                    }
                }
                () = cancel.cancelled() => {}
            }
        })
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().map_or(false, |r| r.is_zero())
    }

    /// Sub-second remainders round up, so a 500 ms deadline reports 1 second.
    pub fn timed_out(&self) -> DownloadError {
        DownloadError::TimedOut {
            seconds: self
                .timeout
                .map_or(0, |t| t.as_secs() + u64::from(t.subsec_nanos() > 0)),
        }
    }

    /// Fail fast before spawning anything new.
    pub fn check(&self) -> Result<(), DownloadError> {
        if self.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        if self.is_expired() {
            return Err(self.timed_out());
        }
        Ok(())
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Collected result of a finished subprocess.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

impl ProcessOutput {
    pub fn stdout_text(&self) -> String {
        self.stdout_lines.join("\n")
    }

    pub fn stderr_text(&self) -> String {
        self.stderr_lines.join("\n")
    }
}

enum Interrupt {
    Cancelled,
    Deadline,
}

/// Run a command, handing each output line to `on_line` as it arrives.
///
/// Both pipes are read line by line; yt-dlp writes its progress to stderr
/// whenever `--print` puts it in quiet mode.
pub async fn run_streaming<F>(
    tool: &ToolCommand,
    args: &[String],
    limits: &RunLimits,
    mut on_line: F,
) -> Result<ProcessOutput, DownloadError>
where
    F: FnMut(OutputStream, &str),
{
    limits.check()?;

    debug!(command = %tool.display(args), "spawning");

    let mut command = Command::new(&tool.program);
    command
        .args(&tool.base_args)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group, so ffmpeg started by yt-dlp dies with it
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DownloadError::ToolNotFound(format!("{}: {}", tool.program.display(), e))
            } else {
                DownloadError::ExecutionError(format!(
                    "Failed to start {}: {}",
                    tool.program.display(),
                    e
                ))
            }
        })?;
    let group = child.id();

    let stdout = child.stdout.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!(
            "Failed to capture stdout from {}",
            tool.program.display()
        ))
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!(
            "Failed to capture stderr from {}",
            tool.program.display()
        ))
    })?;

    let mut out_reader = BufReader::new(stdout).lines();
    let mut err_reader = BufReader::new(stderr).lines();
    let mut out_open = true;
    let mut err_open = true;
    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();

    let interrupt = loop {
        if !out_open && !err_open {
            // Both pipes closed; the process may still be finishing up
            tokio::select! {
                () = limits.cancel.cancelled() => break Interrupt::Cancelled,
                () = limits.expired() => break Interrupt::Deadline,
                status = child.wait() => {
                    let status = status.map_err(|e| {
                        DownloadError::ExecutionError(format!(
                            "Failed to wait for {}: {}",
                            tool.program.display(),
                            e
                        ))
                    })?;
                    debug!(program = %tool.program.display(), %status, "process exited");
                    return Ok(ProcessOutput {
                        status,
                        stdout_lines,
                        stderr_lines,
                    });
                }
            }
        }

        tokio::select! {
            () = limits.cancel.cancelled() => break Interrupt::Cancelled,

            () = limits.expired() => break Interrupt::Deadline,

            line = out_reader.next_line(), if out_open => {
                match line {
                    Ok(Some(line)) => {
                        on_line(OutputStream::Stdout, &line);
                        stdout_lines.push(line);
                    }
                    Ok(None) => out_open = false,
                    Err(e) => {
                        terminate(&mut child, group).await;
                        return Err(read_error(tool, e));
                    }
                }
            }

            line = err_reader.next_line(), if err_open => {
                match line {
                    Ok(Some(line)) => {
                        on_line(OutputStream::Stderr, &line);
                        stderr_lines.push(line);
                    }
                    Ok(None) => err_open = false,
                    Err(e) => {
                        terminate(&mut child, group).await;
                        return Err(read_error(tool, e));
                    }
                }
            }
        }
    };

    terminate(&mut child, group).await;

    match interrupt {
        Interrupt::Deadline => {
            warn!(program = %tool.program.display(), "deadline expired, process killed");
            Err(limits.timed_out())
        }
        Interrupt::Cancelled => {
            warn!(program = %tool.program.display(), "cancelled, process killed");
            Err(DownloadError::Cancelled)
        }
    }
}

/// Run a command and collect its whole output.
pub async fn run_capture(
    tool: &ToolCommand,
    args: &[String],
    limits: &RunLimits,
) -> Result<ProcessOutput, DownloadError> {
    run_streaming(tool, args, limits, |_, _| {}).await
}

fn read_error(tool: &ToolCommand, e: std::io::Error) -> DownloadError {
    DownloadError::ExecutionError(format!(
        "Failed to read output of {}: {}",
        tool.program.display(),
        e
    ))
}

/// Kill the child's process group, then the child itself, and reap it.
async fn terminate(child: &mut Child, group: Option<u32>) {
    if let Some(pgid) = group {
        kill_group(pgid);
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill child process");
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => debug!(pgid, "killed process group"),
        // Group already gone
        Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(pgid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}
