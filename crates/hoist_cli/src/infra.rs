//! External infrastructure commands, run in the install directory.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs the configured command for `step`, or skips it when none is set.
///
/// A non-zero exit logs the command's stderr and fails the step.
pub async fn run_step(
    step: &str,
    command: &[String],
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some((program, args)) = command.split_first() else {
        info!("No {step} command configured, skipping");
        return Ok(());
    };

    info!("Running {step}: {}", command.join(" "));
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| format!("{step}: failed to start {program}: {e}"))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(step, "{line}");
    }
    if !output.status.success() {
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!(step, "{line}");
        }
        return Err(format!("{step}: {program} exited with {}", output.status).into());
    }
    Ok(())
}
