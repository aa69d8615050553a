use anyhow::{Context, Result};
use buildbot_github::api_client::RepoRef;
use buildbot_github::check_run::{
    conclusion_from_buildbot_result, default_check_run_actions, wrap_with_time_prefix,
    CheckRunOutput, CheckRunState, UpdateCheckRun,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::github_ops::GithubOps;

/// Subset of the buildbot HTTPStatusPush payload the bridge consumes. The
/// property bag carries the `github_*` properties the bridge planted when it
/// scheduled the build; buildbot reports each property as a list of strings.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildStatusEvent {
    #[serde(default)]
    pub buildid: Option<u64>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub state_string: String,
    #[serde(default)]
    pub results: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub builder: BuildStatusBuilder,
    #[serde(default)]
    pub properties: BuildStatusProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildStatusBuilder {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildStatusProperties {
    #[serde(default)]
    pub github_pull_request_repo_owner: Vec<String>,
    #[serde(default)]
    pub github_pull_request_repo_name: Vec<String>,
    #[serde(default)]
    pub github_check_run_id: Vec<String>,
    #[serde(default)]
    pub github_app_installation_id: Vec<String>,
    #[serde(default)]
    pub github_build_log_comment_id: Vec<String>,
}

fn first_property<'a>(values: &'a [String], key: &str) -> Result<&'a str> {
    values
        .first()
        .map(String::as_str)
        .with_context(|| format!("build status payload is missing property {key}"))
}

fn first_property_id(values: &[String], key: &str) -> Result<u64> {
    first_property(values, key)?
        .parse::<u64>()
        .with_context(|| format!("failed to parse property {key} as u64"))
}

/// Reflects a buildbot status push back to GitHub: the check run gets the
/// mapped conclusion and an appended status line, and the build-log comment
/// gets the same line in HTML form.
pub async fn handle_build_status_event(
    ops: &dyn GithubOps,
    event: &BuildStatusEvent,
) -> Result<()> {
    let repo = RepoRef::new(
        first_property(
            &event.properties.github_pull_request_repo_owner,
            "github_pull_request_repo_owner",
        )?,
        first_property(
            &event.properties.github_pull_request_repo_name,
            "github_pull_request_repo_name",
        )?,
    );
    let check_run_id =
        first_property_id(&event.properties.github_check_run_id, "github_check_run_id")?;
    let build_log_comment_id = first_property_id(
        &event.properties.github_build_log_comment_id,
        "github_build_log_comment_id",
    )?;

    let check_run = ops
        .get_check_run(&repo, check_run_id)
        .await
        .context("failed to get check run for build status")?;
    let conclusion = conclusion_from_buildbot_result(event.results);
    let now = Utc::now();

    let state_line = format!(
        "[Builder: {}]: {} ([log]({}))",
        event.builder.name, event.state_string, event.url
    );
    let summary = match check_run
        .output
        .as_ref()
        .and_then(|output| output.summary.as_deref())
    {
        Some(existing) if !existing.is_empty() => {
            format!("{existing}\n{}", wrap_with_time_prefix(&state_line, now))
        }
        _ => wrap_with_time_prefix(&state_line, now),
    };

    ops.update_check_run(
        &repo,
        check_run_id,
        &UpdateCheckRun {
            name: check_run.name.clone(),
            status: CheckRunState::Completed,
            conclusion: Some(conclusion),
            details_url: Some(event.url.clone()),
            output: Some(CheckRunOutput {
                title: Some("Buildbot Status Log".to_string()),
                summary: Some(summary),
                text: Some(format!("[Buildbot Build Page]({})", event.url)),
            }),
            actions: default_check_run_actions(),
        },
    )
    .await
    .context("failed to update try bot check run")?;
    info!(
        check_run_id,
        conclusion = conclusion.as_str(),
        build = ?event.buildid,
        "updated github check run from build status"
    );

    let build_log_comment = ops
        .get_issue_comment(&repo, build_log_comment_id)
        .await
        .context("failed to get build log comment")?;
    let updated_body = format!(
        "{}<br/><strong>{}</strong> <i>[Builder: {}]</i> {} (<a href=\"{}\">log</a>)",
        build_log_comment.body.unwrap_or_default(),
        now.to_rfc2822(),
        event.builder.name,
        event.state_string,
        event.url
    );
    ops.update_issue_comment(&repo, build_log_comment_id, &updated_body)
        .await
        .context("failed to edit build log comment")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use buildbot_github::api_client::RepoRef;
    use buildbot_github::webhook_events::{PullRequest, PullRequestBranch};

    use super::{handle_build_status_event, BuildStatusEvent};
    use crate::github_ops::{GithubOps, InMemoryGithubOps};

    fn status_event(check_run_id: u64, comment_id: u64, results: i64) -> BuildStatusEvent {
        let payload = serde_json::json!({
            "buildid": 7,
            "complete": true,
            "state_string": "build successful",
            "results": results,
            "url": "https://buildbot.test/#/builders/1/builds/7",
            "builder": { "name": "fedora-rawhide-x86_64" },
            "properties": {
                "github_pull_request_repo_owner": ["janedoe", "Try user"],
                "github_pull_request_repo_name": ["examplerepo", "Try user"],
                "github_check_run_id": [check_run_id.to_string(), "Try user"],
                "github_app_installation_id": ["1234", "Try user"],
                "github_build_log_comment_id": [comment_id.to_string(), "Try user"]
            }
        });
        serde_json::from_value(payload).expect("status payload")
    }

    async fn seeded(ops: &InMemoryGithubOps) -> (u64, u64) {
        // Seed a PR so the store mirrors a live repository, a queued check
        // run, and the build-log comment the bridge would have created.
        ops.seed_pull_request(PullRequest {
            number: 123,
            mergeable: Some(true),
            base: PullRequestBranch {
                git_ref: "main".to_string(),
                sha: "basesha".to_string(),
                repo: None,
            },
            head: PullRequestBranch {
                git_ref: "feature".to_string(),
                sha: "headsha".to_string(),
                repo: None,
            },
        });
        let check_run_id = ops.seed_check_run("headsha", "@johndoe /buildbot mandatory=true force=false builder=[]");
        let comment = ops
            .create_issue_comment(&RepoRef::new("janedoe", "examplerepo"), 123, "Thank you @johndoe!")
            .await
            .expect("seed comment");
        (check_run_id, comment.id)
    }

    #[tokio::test]
    async fn functional_status_push_completes_check_run_and_appends_log_line() {
        let ops = InMemoryGithubOps::new();
        let (check_run_id, comment_id) = seeded(&ops).await;
        let event = status_event(check_run_id, comment_id, 0);

        handle_build_status_event(&ops, &event).await.expect("handled");

        assert_eq!(
            ops.check_run_conclusion(check_run_id).as_deref(),
            Some("success")
        );
        let summary = ops.check_run_summary(check_run_id).expect("summary");
        assert!(summary.contains("[Builder: fedora-rawhide-x86_64]: build successful"));

        let body = ops.comment_body(comment_id).expect("comment");
        assert!(body.starts_with("Thank you @johndoe!<br/>"));
        assert!(body.contains("<i>[Builder: fedora-rawhide-x86_64]</i>"));
        assert!(body.contains("https://buildbot.test/#/builders/1/builds/7"));
    }

    #[tokio::test]
    async fn functional_failed_result_code_maps_to_failure_conclusion() {
        let ops = InMemoryGithubOps::new();
        let (check_run_id, comment_id) = seeded(&ops).await;
        let event = status_event(check_run_id, comment_id, 2);

        handle_build_status_event(&ops, &event).await.expect("handled");
        assert_eq!(
            ops.check_run_conclusion(check_run_id).as_deref(),
            Some("failure")
        );
    }

    #[tokio::test]
    async fn regression_missing_check_run_property_is_a_hard_error() {
        let ops = InMemoryGithubOps::new();
        let payload = serde_json::json!({
            "state_string": "build successful",
            "results": 0,
            "url": "https://buildbot.test/b/1",
            "builder": { "name": "b" },
            "properties": {
                "github_pull_request_repo_owner": ["janedoe"],
                "github_pull_request_repo_name": ["examplerepo"]
            }
        });
        let event: BuildStatusEvent = serde_json::from_value(payload).expect("payload");
        let error = handle_build_status_event(&ops, &event)
            .await
            .expect_err("missing property");
        assert!(format!("{error:#}").contains("github_check_run_id"));
    }

    #[tokio::test]
    async fn regression_unknown_check_run_id_surfaces_a_lookup_error() {
        let ops = InMemoryGithubOps::new();
        let event = status_event(999, 1, 0);
        assert!(handle_build_status_event(&ops, &event).await.is_err());
    }
}
