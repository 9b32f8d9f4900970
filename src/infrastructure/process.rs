use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::{debug, error};

use crate::common::error::{AppError, AppResult};

const STDERR_TAIL_LINES: usize = 6;

/// Runs an external tool to completion and maps spawn failures and non-zero
/// exits to [`AppError::ExternalToolFailure`].
pub async fn run_tool(tool: &'static str, mut cmd: Command) -> AppResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {}: {:?}", tool, cmd.as_std());

    let output = cmd
        .output()
        .await
        .map_err(|e| AppError::tool(tool, format!("could not start: {}", e)))?;

    if !output.status.success() {
        let tail = stderr_tail(&output.stderr);
        error!("{} exited with {}: {}", tool, output.status, tail);
        let message = if tail.is_empty() {
            format!("exited with {}", output.status)
        } else {
            tail
        };
        return Err(AppError::tool(tool, message));
    }

    Ok(output)
}

/// Last few non-empty stderr lines; the end is where tools put the cause.
pub fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
