//! Scheduler notification by running an external command.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::StoreError;
use crate::storage_traits::{NotifyAction, SchedulerNotifier, StoreResult};

/// Runs `<program> <args..> <action> <job_name>` for every notification.
///
/// A typical setup points this at a scheduler CLI wrapper that reloads or
/// disables the named job.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandNotifier {
    /// `command[0]` is the executable, the rest are leading arguments.
    pub fn new(command: Vec<String>, timeout: Duration) -> StoreResult<Self> {
        if command.is_empty() {
            return Err(StoreError::Notify("notify command is empty".to_string()));
        }
        Ok(Self { command, timeout })
    }
}

#[async_trait]
impl SchedulerNotifier for CommandNotifier {
    async fn notify(&self, action: NotifyAction, job_name: &str) -> StoreResult<()> {
        let exe = &self.command[0];
        let args = &self.command[1..];

        debug!(command = %exe, action = %action, job = %job_name, "notifying scheduler");
        let child = Command::new(exe)
            .args(args)
            .arg(action.as_str())
            .arg(job_name)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| StoreError::Notify(format!("failed to spawn {exe}: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                StoreError::Notify(format!("{exe} timed out after {:?}", self.timeout))
            })?
            .map_err(|e| StoreError::Notify(format!("{exe} failed: {e}")))?;

        if !output.status.success() {
            return Err(StoreError::Notify(format!(
                "{exe} exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_rejected() {
        assert!(CommandNotifier::new(vec![], Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn successful_command() {
        let notifier =
            CommandNotifier::new(vec!["true".to_string()], Duration::from_secs(10)).unwrap();
        notifier
            .notify(NotifyAction::Created, "pull-jdk8-p")
            .await
            .expect("true should succeed");
    }

    #[tokio::test]
    async fn hung_command_is_killed_at_the_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        // Extra arguments (action, job name) land in $0 and $1 of the script.
        let script = format!("sleep 1 && touch '{}'", marker.display());
        let notifier = CommandNotifier::new(
            vec!["sh".to_string(), "-c".to_string(), script],
            Duration::from_millis(100),
        )
        .unwrap();

        let err = notifier
            .notify(NotifyAction::Updated, "pull-jdk8-p")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out after 100ms"));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn failing_command_reports_exit_code() {
        let notifier =
            CommandNotifier::new(vec!["false".to_string()], Duration::from_secs(10)).unwrap();
        let err = notifier
            .notify(NotifyAction::Archived, "pull-jdk8-p")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exited with code"));
    }
}
