//! Serde models for the webhook payloads the bridge consumes (subset of the
//! GitHub event schema: issue-comment events and the pull-request object).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Repository {
    pub name: String,
    pub owner: GithubUser,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Installation {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Issue {
    pub number: u64,
    /// Present only when the issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub user: GithubUser,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// The `issue_comment` webhook event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: Issue,
    pub comment: IssueComment,
    pub repository: Repository,
    #[serde(default)]
    pub installation: Option<Installation>,
}

/// The `check_run` webhook event (subset): carries the action button a user
/// clicked on the check-run page, if any.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckRunEvent {
    pub action: String,
    #[serde(default)]
    pub requested_action: Option<RequestedAction>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestedAction {
    pub identifier: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PullRequestBranch {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
    #[serde(default)]
    pub repo: Option<Repository>,
}

/// The pull-request object as fetched from the REST API (subset).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub mergeable: Option<bool>,
    pub base: PullRequestBranch,
    pub head: PullRequestBranch,
}

#[cfg(test)]
mod tests {
    use super::{IssueCommentEvent, PullRequest};

    #[test]
    fn unit_issue_comment_event_decodes_pull_request_marker() {
        let payload = serde_json::json!({
            "action": "created",
            "issue": { "number": 123, "pull_request": { "url": "https://example.com" } },
            "comment": {
                "id": 9,
                "body": "/buildbot",
                "user": { "login": "johndoe" },
                "html_url": "https://github.com/acme/repo/pull/123#issuecomment-9"
            },
            "repository": { "name": "examplerepo", "owner": { "login": "janedoe" } },
            "installation": { "id": 1234 }
        });
        let event: IssueCommentEvent = serde_json::from_value(payload).expect("decode");
        assert!(event.issue.is_pull_request());
        assert_eq!(event.comment.user.login, "johndoe");
        assert_eq!(event.installation.map(|i| i.id), Some(1234));
    }

    #[test]
    fn unit_issue_comment_event_tolerates_missing_optional_fields() {
        let payload = serde_json::json!({
            "action": "created",
            "issue": { "number": 5 },
            "comment": { "id": 1, "user": { "login": "alice" } },
            "repository": { "name": "r", "owner": { "login": "o" } }
        });
        let event: IssueCommentEvent = serde_json::from_value(payload).expect("decode");
        assert!(!event.issue.is_pull_request());
        assert!(event.comment.body.is_none());
        assert!(event.installation.is_none());
    }

    #[test]
    fn unit_pull_request_decodes_base_and_head_refs() {
        let payload = serde_json::json!({
            "number": 123,
            "mergeable": true,
            "base": {
                "ref": "main",
                "sha": "basesha",
                "repo": { "name": "examplerepo", "owner": { "login": "janedoe" } }
            },
            "head": { "ref": "feature", "sha": "5da7cf6468aabc181b3c7c662539cd3e70526c1b" }
        });
        let pr: PullRequest = serde_json::from_value(payload).expect("decode");
        assert_eq!(pr.base.git_ref, "main");
        assert_eq!(pr.head.sha, "5da7cf6468aabc181b3c7c662539cd3e70526c1b");
        assert_eq!(pr.mergeable, Some(true));
    }
}
