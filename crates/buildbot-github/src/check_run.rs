use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle states of a GitHub check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunState {
    Queued,
    InProgress,
    Completed,
}

impl CheckRunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// Terminal conclusions of a GitHub check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
}

impl CheckRunConclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
        }
    }
}

/// Maps a buildbot result code to a check-run conclusion.
///
/// Codes follow the buildbot build-result table: 0 success, 1 warning,
/// 2 failure, 3 skipped, 4 exception, 5 retry, 6 cancelled. Everything else
/// reads as failure.
pub fn conclusion_from_buildbot_result(result_code: i64) -> CheckRunConclusion {
    match result_code {
        0 => CheckRunConclusion::Success,
        1 => CheckRunConclusion::Neutral,
        2 => CheckRunConclusion::Failure,
        3 => CheckRunConclusion::Skipped,
        4 => CheckRunConclusion::Failure,
        5 => CheckRunConclusion::Failure,
        6 => CheckRunConclusion::Cancelled,
        _ => CheckRunConclusion::Failure,
    }
}

/// Prefixes a status-log line with an RFC2822 timestamp, the format used for
/// both check-run summaries and build-log comments.
pub fn wrap_with_time_prefix(message: &str, at: DateTime<Utc>) -> String {
    format!("[{}]: {}", at.to_rfc2822(), message)
}

/// A check run as returned by the GitHub REST API (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub output: Option<CheckRunOutput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRunOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A requested action button rendered on the check-run page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRunAction {
    pub label: String,
    pub description: String,
    pub identifier: String,
}

/// Payload for `POST /repos/{owner}/{repo}/check-runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: CheckRunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CheckRunOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<CheckRunAction>,
}

/// Payload for `PATCH /repos/{owner}/{repo}/check-runs/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCheckRun {
    pub name: String,
    pub status: CheckRunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<CheckRunConclusion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CheckRunOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<CheckRunAction>,
}

/// The action set attached to every bridge-owned check run.
pub fn default_check_run_actions() -> Vec<CheckRunAction> {
    vec![
        CheckRunAction {
            label: "Make check required".to_string(),
            description: "Make check required to pass".to_string(),
            identifier: "MakeMandatory".to_string(),
        },
        CheckRunAction {
            label: "Make check optional".to_string(),
            description: "This check is optional".to_string(),
            identifier: "MakeOptional".to_string(),
        },
        CheckRunAction {
            label: "Rerun check".to_string(),
            description: "Reruns the check".to_string(),
            identifier: "ReRunCheck".to_string(),
        },
    ]
}
