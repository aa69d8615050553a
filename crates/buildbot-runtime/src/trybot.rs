use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use buildbot_github::api_client::RepoRef;
use tokio::process::Command;

/// A fully assembled `buildbot try` request: who asked, which repository it
/// targets, and the property set carrying command, PR, and callback identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryBuildRequest {
    pub who: String,
    pub repo: RepoRef,
    pub properties: Vec<String>,
}

/// Schedules a try build against the external build orchestrator.
#[async_trait]
pub trait TryScheduler: Send + Sync {
    /// Returns the combined output of the scheduling command.
    async fn schedule(&self, request: &TryBuildRequest) -> Result<String>;
}

/// Shells out to `buildbot try` against the configured master. A build is
/// planned purely from the passed properties, so the diff handed to buildbot
/// is an empty dummy file.
pub struct BuildbotTryScheduler {
    master: String,
    try_user: String,
    try_password: String,
}

impl BuildbotTryScheduler {
    pub fn new(master: String, try_user: String, try_password: String) -> Self {
        Self {
            master,
            try_user,
            try_password,
        }
    }
}

#[async_trait]
impl TryScheduler for BuildbotTryScheduler {
    async fn schedule(&self, request: &TryBuildRequest) -> Result<String> {
        let dummy_diff = tempfile::Builder::new()
            .prefix("dummy.")
            .suffix(".diff")
            .tempfile()
            .context("failed to create dummy diff file for buildbot try")?;

        let mut command = Command::new("buildbot");
        command
            .arg("try")
            .arg(format!("--master={}", self.master))
            .arg("--builder=delegationBuilder")
            .arg(format!("--username={}", self.try_user))
            .arg(format!("--passwd={}", self.try_password))
            .arg(format!("--diff={}", dummy_diff.path().display()))
            .arg("--connect=pb")
            .arg("--vc=git")
            .arg(format!("--who={}", request.who))
            .arg(format!(
                "--repository={}/{}",
                request.repo.owner, request.repo.name
            ))
            .args(&request.properties);

        let output = command
            .output()
            .await
            .context("failed to run buildbot try")?;
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if !output.status.success() {
            anyhow::bail!("buildbot try exited with {}: {combined}", output.status);
        }
        Ok(combined)
    }
}

/// Test scheduler that records every request instead of spawning a process.
#[derive(Debug, Default)]
pub struct RecordingTryScheduler {
    requests: Mutex<Vec<TryBuildRequest>>,
}

impl RecordingTryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<TryBuildRequest> {
        self.requests.lock().expect("recorded requests").clone()
    }
}

#[async_trait]
impl TryScheduler for RecordingTryScheduler {
    async fn schedule(&self, request: &TryBuildRequest) -> Result<String> {
        self.requests
            .lock()
            .expect("recorded requests")
            .push(request.clone());
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use buildbot_github::api_client::RepoRef;

    use super::{RecordingTryScheduler, TryBuildRequest, TryScheduler};

    #[tokio::test]
    async fn unit_recording_scheduler_captures_requests_in_order() {
        let scheduler = RecordingTryScheduler::new();
        let first = TryBuildRequest {
            who: "johndoe".to_string(),
            repo: RepoRef::new("acme", "repo"),
            properties: vec!["--property=command_force=false".to_string()],
        };
        let second = TryBuildRequest {
            who: "janedoe".to_string(),
            repo: RepoRef::new("acme", "repo"),
            properties: Vec::new(),
        };
        scheduler.schedule(&first).await.expect("first");
        scheduler.schedule(&second).await.expect("second");
        assert_eq!(scheduler.requests(), vec![first, second]);
    }
}
