use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::error::{AnalysisError, Result};
use crate::parsers::text::truncate_chars;

/// Bytes of stderr kept for error messages
const STDERR_CAP: u64 = 64 * 1024;

/// Runs an external command and returns its stdout.
///
/// The child is killed if it outlives `timeout` or writes more than
/// `max_output` bytes to stdout. A non-zero exit status is an error.
pub async fn run_script(
    program: &str,
    args: &[&str],
    timeout: Duration,
    max_output: usize,
) -> Result<String> {
    ::log::debug!("Running {} {}", program, args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AnalysisError::Tool(format!("failed to start {}: {}", program, e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AnalysisError::Tool(format!("{} has no stdout", program)))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AnalysisError::Tool(format!("{} has no stderr", program)))?;

    let run = collect(child, stdout, stderr, program, max_output);

    let (status, out, err) = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| {
            ::log::warn!("{} exceeded {:?}, killing it", program, timeout);
            AnalysisError::Timeout {
                operation: program.to_string(),
                seconds: timeout.as_secs(),
            }
        })??;

    if !status.success() {
        let stderr = String::from_utf8_lossy(&err);
        return Err(AnalysisError::Tool(format!(
            "{} exited with {}: {}",
            program,
            status,
            truncate_chars(stderr.trim(), 500)
        )));
    }

    String::from_utf8(out)
        .map_err(|e| AnalysisError::Tool(format!("{} wrote invalid UTF-8: {}", program, e)))
}

/// Reads stdout up to the cap while stderr drains on its own task, so a
/// child that keeps writing is stopped as soon as it passes the cap.
async fn collect(
    mut child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    program: &str,
    max_output: usize,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let stderr_task = tokio::spawn(async move {
        let mut err = Vec::new();
        if let Err(e) = stderr.take(STDERR_CAP).read_to_end(&mut err).await {
            ::log::debug!("Failed to read stderr: {}", e);
        }
        err
    });

    let mut out = Vec::new();
    let read = stdout
        .take(max_output as u64 + 1)
        .read_to_end(&mut out)
        .await;
    if let Err(e) = read {
        stderr_task.abort();
        return Err(e.into());
    }

    if out.len() > max_output {
        stderr_task.abort();
        if let Err(e) = child.start_kill() {
            ::log::warn!("Failed to kill {}: {}", program, e);
        }
        return Err(AnalysisError::Tool(format!(
            "{} produced more than {} bytes of output",
            program, max_output
        )));
    }

    let status = child.wait().await?;
    let err = stderr_task.await.unwrap_or_default();
    Ok((status, out, err))
}
