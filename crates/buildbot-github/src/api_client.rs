use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::check_run::{CheckRun, CreateCheckRun, UpdateCheckRun};
use crate::webhook_events::PullRequest;

const LIST_PAGE_SIZE: usize = 100;

/// Identifies a repository for API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Handle to an issue comment created or updated through the API.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentHandle {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CheckRunListPage {
    check_runs: Vec<CheckRun>,
}

/// Thin typed client over the GitHub REST surface the bridge needs: pull
/// requests, check runs, and issue comments. Calls are single-shot; any retry
/// policy belongs to the caller, and none is applied here.
#[derive(Clone)]
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubApiClient {
    pub fn new(api_base: String, token: String, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("buildbot-app-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest> {
        self.request_json("get pull request", || {
            self.http.get(format!(
                "{}/repos/{}/{}/pulls/{}",
                self.api_base, repo.owner, repo.name, number
            ))
        })
        .await
    }

    /// Lists every check run attached to the given commit, walking all pages.
    /// Callers depend on the aggregation being complete; a short page ends
    /// the traversal.
    pub async fn list_check_runs_for_ref(
        &self,
        repo: &RepoRef,
        git_ref: &str,
    ) -> Result<Vec<CheckRun>> {
        let mut page = 1_u32;
        let mut rows = Vec::new();
        loop {
            let page_value = page.to_string();
            let chunk: CheckRunListPage = self
                .request_json("list check runs", || {
                    self.http
                        .get(format!(
                            "{}/repos/{}/{}/commits/{}/check-runs",
                            self.api_base, repo.owner, repo.name, git_ref
                        ))
                        .query(&[
                            ("per_page", LIST_PAGE_SIZE.to_string().as_str()),
                            ("page", page_value.as_str()),
                        ])
                })
                .await?;
            let chunk_len = chunk.check_runs.len();
            rows.extend(chunk.check_runs);
            if chunk_len < LIST_PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    pub async fn create_check_run(
        &self,
        repo: &RepoRef,
        payload: &CreateCheckRun,
    ) -> Result<CheckRun> {
        self.request_json("create check run", || {
            self.http
                .post(format!(
                    "{}/repos/{}/{}/check-runs",
                    self.api_base, repo.owner, repo.name
                ))
                .json(payload)
        })
        .await
    }

    pub async fn get_check_run(&self, repo: &RepoRef, check_run_id: u64) -> Result<CheckRun> {
        self.request_json("get check run", || {
            self.http.get(format!(
                "{}/repos/{}/{}/check-runs/{}",
                self.api_base, repo.owner, repo.name, check_run_id
            ))
        })
        .await
    }

    pub async fn update_check_run(
        &self,
        repo: &RepoRef,
        check_run_id: u64,
        payload: &UpdateCheckRun,
    ) -> Result<CheckRun> {
        self.request_json("update check run", || {
            self.http
                .patch(format!(
                    "{}/repos/{}/{}/check-runs/{}",
                    self.api_base, repo.owner, repo.name, check_run_id
                ))
                .json(payload)
        })
        .await
    }

    pub async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<IssueCommentHandle> {
        let payload = json!({ "body": body });
        self.request_json("create issue comment", || {
            self.http
                .post(format!(
                    "{}/repos/{}/{}/issues/{}/comments",
                    self.api_base, repo.owner, repo.name, issue_number
                ))
                .json(&payload)
        })
        .await
    }

    pub async fn get_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
    ) -> Result<IssueCommentHandle> {
        self.request_json("get issue comment", || {
            self.http.get(format!(
                "{}/repos/{}/{}/issues/comments/{}",
                self.api_base, repo.owner, repo.name, comment_id
            ))
        })
        .await
    }

    pub async fn update_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueCommentHandle> {
        let payload = json!({ "body": body });
        self.request_json("update issue comment", || {
            self.http
                .patch(format!(
                    "{}/repos/{}/{}/issues/comments/{}",
                    self.api_base, repo.owner, repo.name, comment_id
                ))
                .json(&payload)
        })
        .await
    }

    async fn request_json<T, F>(&self, operation: &str, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        let response = request_builder()
            .send()
            .await
            .with_context(|| format!("github api {operation} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "github api {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode github {operation}"))
    }
}

fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let truncated: String = body.chars().take(max_chars).collect();
    format!("{truncated}…")
}
