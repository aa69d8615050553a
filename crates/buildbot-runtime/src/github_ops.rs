use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use buildbot_github::api_client::{GithubApiClient, IssueCommentHandle, RepoRef};
use buildbot_github::check_run::{CheckRun, CreateCheckRun, UpdateCheckRun};
use buildbot_github::webhook_events::PullRequest;

/// Capability set over the GitHub operations the bridge performs. The live
/// implementation is [`GithubApiClient`]; tests use [`InMemoryGithubOps`].
#[async_trait]
pub trait GithubOps: Send + Sync {
    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest>;
    async fn list_check_runs_for_ref(&self, repo: &RepoRef, git_ref: &str)
        -> Result<Vec<CheckRun>>;
    async fn create_check_run(&self, repo: &RepoRef, payload: &CreateCheckRun)
        -> Result<CheckRun>;
    async fn get_check_run(&self, repo: &RepoRef, check_run_id: u64) -> Result<CheckRun>;
    async fn update_check_run(
        &self,
        repo: &RepoRef,
        check_run_id: u64,
        payload: &UpdateCheckRun,
    ) -> Result<CheckRun>;
    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<IssueCommentHandle>;
    async fn get_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
    ) -> Result<IssueCommentHandle>;
    async fn update_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueCommentHandle>;
}

#[async_trait]
impl GithubOps for GithubApiClient {
    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        GithubApiClient::get_pull_request(self, repo, number).await
    }

    async fn list_check_runs_for_ref(
        &self,
        repo: &RepoRef,
        git_ref: &str,
    ) -> Result<Vec<CheckRun>> {
        GithubApiClient::list_check_runs_for_ref(self, repo, git_ref).await
    }

    async fn create_check_run(
        &self,
        repo: &RepoRef,
        payload: &CreateCheckRun,
    ) -> Result<CheckRun> {
        GithubApiClient::create_check_run(self, repo, payload).await
    }

    async fn get_check_run(&self, repo: &RepoRef, check_run_id: u64) -> Result<CheckRun> {
        GithubApiClient::get_check_run(self, repo, check_run_id).await
    }

    async fn update_check_run(
        &self,
        repo: &RepoRef,
        check_run_id: u64,
        payload: &UpdateCheckRun,
    ) -> Result<CheckRun> {
        GithubApiClient::update_check_run(self, repo, check_run_id, payload).await
    }

    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<IssueCommentHandle> {
        GithubApiClient::create_issue_comment(self, repo, issue_number, body).await
    }

    async fn get_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
    ) -> Result<IssueCommentHandle> {
        GithubApiClient::get_issue_comment(self, repo, comment_id).await
    }

    async fn update_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueCommentHandle> {
        GithubApiClient::update_issue_comment(self, repo, comment_id, body).await
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    pull_requests: HashMap<u64, PullRequest>,
    check_runs: Vec<StoredCheckRun>,
    comments: HashMap<u64, String>,
    next_check_run_id: u64,
    next_comment_id: u64,
}

#[derive(Debug, Clone)]
struct StoredCheckRun {
    id: u64,
    name: String,
    head_sha: String,
    status: String,
    conclusion: Option<String>,
    summary: Option<String>,
    details_url: Option<String>,
}

impl StoredCheckRun {
    fn as_check_run(&self) -> CheckRun {
        CheckRun {
            id: self.id,
            name: self.name.clone(),
            html_url: Some(format!("https://github.test/runs/{}", self.id)),
            status: Some(self.status.clone()),
            conclusion: self.conclusion.clone(),
            output: Some(buildbot_github::check_run::CheckRunOutput {
                title: None,
                summary: self.summary.clone(),
                text: None,
            }),
        }
    }
}

/// In-memory [`GithubOps`] implementation backing the runtime tests. State is
/// seeded up front and inspected after the flow under test has run.
#[derive(Debug, Default)]
pub struct InMemoryGithubOps {
    state: Mutex<InMemoryState>,
}

impl InMemoryGithubOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_pull_request(&self, pr: PullRequest) {
        let mut state = self.state.lock().expect("in-memory github state");
        state.pull_requests.insert(pr.number, pr);
    }

    pub fn seed_check_run(&self, head_sha: &str, name: &str) -> u64 {
        let mut state = self.state.lock().expect("in-memory github state");
        state.next_check_run_id += 1;
        let id = state.next_check_run_id;
        state.check_runs.push(StoredCheckRun {
            id,
            name: name.to_string(),
            head_sha: head_sha.to_string(),
            status: "completed".to_string(),
            conclusion: Some("success".to_string()),
            summary: None,
            details_url: None,
        });
        id
    }

    pub fn check_run_names(&self) -> Vec<String> {
        let state = self.state.lock().expect("in-memory github state");
        state
            .check_runs
            .iter()
            .map(|check_run| check_run.name.clone())
            .collect()
    }

    pub fn check_run_summary(&self, check_run_id: u64) -> Option<String> {
        let state = self.state.lock().expect("in-memory github state");
        state
            .check_runs
            .iter()
            .find(|check_run| check_run.id == check_run_id)
            .and_then(|check_run| check_run.summary.clone())
    }

    pub fn check_run_conclusion(&self, check_run_id: u64) -> Option<String> {
        let state = self.state.lock().expect("in-memory github state");
        state
            .check_runs
            .iter()
            .find(|check_run| check_run.id == check_run_id)
            .and_then(|check_run| check_run.conclusion.clone())
    }

    pub fn comment_bodies(&self) -> Vec<String> {
        let state = self.state.lock().expect("in-memory github state");
        let mut ids: Vec<&u64> = state.comments.keys().collect();
        ids.sort();
        ids.iter()
            .map(|id| state.comments[id].clone())
            .collect()
    }

    pub fn comment_body(&self, comment_id: u64) -> Option<String> {
        let state = self.state.lock().expect("in-memory github state");
        state.comments.get(&comment_id).cloned()
    }
}

#[async_trait]
impl GithubOps for InMemoryGithubOps {
    async fn get_pull_request(&self, _repo: &RepoRef, number: u64) -> Result<PullRequest> {
        let state = self.state.lock().expect("in-memory github state");
        match state.pull_requests.get(&number) {
            Some(pr) => Ok(pr.clone()),
            None => bail!("unknown pull request: {number}"),
        }
    }

    async fn list_check_runs_for_ref(
        &self,
        _repo: &RepoRef,
        git_ref: &str,
    ) -> Result<Vec<CheckRun>> {
        let state = self.state.lock().expect("in-memory github state");
        Ok(state
            .check_runs
            .iter()
            .filter(|check_run| check_run.head_sha == git_ref)
            .map(StoredCheckRun::as_check_run)
            .collect())
    }

    async fn create_check_run(
        &self,
        _repo: &RepoRef,
        payload: &CreateCheckRun,
    ) -> Result<CheckRun> {
        let mut state = self.state.lock().expect("in-memory github state");
        state.next_check_run_id += 1;
        let stored = StoredCheckRun {
            id: state.next_check_run_id,
            name: payload.name.clone(),
            head_sha: payload.head_sha.clone(),
            status: payload.status.as_str().to_string(),
            conclusion: None,
            summary: payload
                .output
                .as_ref()
                .and_then(|output| output.summary.clone()),
            details_url: None,
        };
        let created = stored.as_check_run();
        state.check_runs.push(stored);
        Ok(created)
    }

    async fn get_check_run(&self, _repo: &RepoRef, check_run_id: u64) -> Result<CheckRun> {
        let state = self.state.lock().expect("in-memory github state");
        match state
            .check_runs
            .iter()
            .find(|check_run| check_run.id == check_run_id)
        {
            Some(check_run) => Ok(check_run.as_check_run()),
            None => bail!("unknown check run: {check_run_id}"),
        }
    }

    async fn update_check_run(
        &self,
        _repo: &RepoRef,
        check_run_id: u64,
        payload: &UpdateCheckRun,
    ) -> Result<CheckRun> {
        let mut state = self.state.lock().expect("in-memory github state");
        let Some(check_run) = state
            .check_runs
            .iter_mut()
            .find(|check_run| check_run.id == check_run_id)
        else {
            bail!("unknown check run: {check_run_id}");
        };
        check_run.status = payload.status.as_str().to_string();
        check_run.conclusion = payload.conclusion.map(|value| value.as_str().to_string());
        if let Some(details_url) = &payload.details_url {
            check_run.details_url = Some(details_url.clone());
        }
        if let Some(output) = &payload.output {
            check_run.summary = output.summary.clone();
        }
        Ok(check_run.as_check_run())
    }

    async fn create_issue_comment(
        &self,
        _repo: &RepoRef,
        _issue_number: u64,
        body: &str,
    ) -> Result<IssueCommentHandle> {
        let mut state = self.state.lock().expect("in-memory github state");
        state.next_comment_id += 1;
        let id = state.next_comment_id;
        state.comments.insert(id, body.to_string());
        Ok(IssueCommentHandle {
            id,
            body: Some(body.to_string()),
            html_url: Some(format!("https://github.test/comments/{id}")),
        })
    }

    async fn get_issue_comment(
        &self,
        _repo: &RepoRef,
        comment_id: u64,
    ) -> Result<IssueCommentHandle> {
        let state = self.state.lock().expect("in-memory github state");
        match state.comments.get(&comment_id) {
            Some(body) => Ok(IssueCommentHandle {
                id: comment_id,
                body: Some(body.clone()),
                html_url: Some(format!("https://github.test/comments/{comment_id}")),
            }),
            None => bail!("unknown issue comment: {comment_id}"),
        }
    }

    async fn update_issue_comment(
        &self,
        _repo: &RepoRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueCommentHandle> {
        let mut state = self.state.lock().expect("in-memory github state");
        if !state.comments.contains_key(&comment_id) {
            bail!("unknown issue comment: {comment_id}");
        }
        state.comments.insert(comment_id, body.to_string());
        Ok(IssueCommentHandle {
            id: comment_id,
            body: Some(body.to_string()),
            html_url: Some(format!("https://github.test/comments/{comment_id}")),
        })
    }
}
