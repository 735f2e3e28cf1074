//! System operations run on timer expiry

use tokio::process::Command;
use tracing::info;

/// Run a shell command through `sh -c`
pub async fn execute_expiry_command(command: &str) -> Result<(), String> {
    info!("Executing expiry command: {}", command);

    let output = Command::new("sh")
        .args(["-c", command])
        .output()
        .await
        .map_err(|e| format!("Failed to execute '{}': {}", command, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("'{}' exited with {}: {}", command, output.status, stderr.trim()));
    }

    info!("Expiry command completed");
    Ok(())
}
