use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs an external tool to completion, capturing its output.
///
/// Returns a human-readable reason on spawn failure, timeout, or a non-zero
/// exit status. Stderr is included in the reason for failed runs. A tool
/// that exceeds `timeout` is killed before the error is returned.
pub(crate) async fn run_tool(
    name: &str,
    mut command: Command,
    timeout: Duration,
) -> Result<Output, String> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|e| format!("failed to spawn {name}: {e}"))?;

    // Dropping the wait future on expiry drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(waited) => waited.map_err(|e| format!("failed to wait for {name}: {e}"))?,
        Err(_) => {
            warn!(tool = name, ?timeout, "tool timed out, killed");
            return Err(format!("{name} timed out after {timeout:?}"));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{name} exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    debug!(tool = name, "tool finished");
    Ok(output)
}
