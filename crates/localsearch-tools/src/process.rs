//! Bounded, streaming execution of native search executables.

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period between SIGTERM and SIGKILL when tearing down a process group.
#[cfg(unix)]
const KILL_GRACE: Duration = Duration::from_millis(200);

/// What the line consumer wants after seeing a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineControl {
    Continue,
    Stop,
}

/// Outcome of [`run_streaming`].
#[derive(Debug)]
pub enum StreamEnd {
    /// The process closed stdout and exited on its own.
    Exited { status: ExitStatus, stderr: Vec<u8> },
    /// The consumer returned [`LineControl::Stop`]; the process group was
    /// terminated.
    Stopped,
    /// The wall-clock limit expired; the process group was terminated.
    TimedOut,
}

/// Run `program` with discrete argv entries and a hard wall-clock limit,
/// handing each stdout line to `on_line` as soon as it arrives.
///
/// No shell is involved. Lines are decoded lossily and passed without the
/// trailing newline. Stderr is drained concurrently so a chatty child never
/// blocks. The child gets its own process group so that a stop or timeout
/// can take down anything it spawned; it is always reaped before this
/// function returns. Dropping the returned future kills the child.
pub async fn run_streaming<F>(
    program: &Path,
    args: &[OsString],
    limit: Duration,
    mut on_line: F,
) -> std::io::Result<StreamEnd>
where
    F: FnMut(&str) -> LineControl,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    let mut child = cmd.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });

    let streamed = timeout(limit, async {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if on_line(line.trim_end_matches(['\n', '\r'])) == LineControl::Stop {
                return Ok(None);
            }
        }
        let status = child.wait().await?;
        Ok::<_, std::io::Error>(Some(status))
    })
    .await;

    match streamed {
        Ok(Ok(Some(status))) => {
            let stderr = stderr_task.await.unwrap_or_default();
            Ok(StreamEnd::Exited { status, stderr })
        }
        Ok(Ok(None)) => {
            debug!(program = %program.display(), "Consumer stopped early, terminating");
            terminate(&mut child).await;
            stderr_task.abort();
            Ok(StreamEnd::Stopped)
        }
        Ok(Err(e)) => {
            terminate(&mut child).await;
            stderr_task.abort();
            Err(e)
        }
        Err(_) => {
            warn!(
                program = %program.display(),
                timeout_ms = limit.as_millis() as u64,
                "Search process timed out, terminating"
            );
            terminate(&mut child).await;
            stderr_task.abort();
            Ok(StreamEnd::TimedOut)
        }
    }
}

/// SIGTERM the child's process group, escalate to SIGKILL if the leader is
/// still alive after [`KILL_GRACE`], then reap.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        let pgid = Pid::from_raw(pid as i32);
        let _ = killpg(pgid, Signal::SIGTERM);
        if timeout(KILL_GRACE, child.wait()).await.is_err() {
            let _ = killpg(pgid, Signal::SIGKILL);
        }
    }

    let _ = child.start_kill();
    let _ = child.wait().await;
}
