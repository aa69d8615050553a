use anyhow::{bail, Context, Result};
use buildbot_command::build_command::BuildCommand;
use buildbot_command::dedup_gate::{should_build, BuildDecision, CheckRunRef};
use buildbot_command::try_properties::PullRequestRef;
use buildbot_github::api_client::RepoRef;
use buildbot_github::check_run::{
    default_check_run_actions, wrap_with_time_prefix, CheckRunOutput, CheckRunState,
    CreateCheckRun,
};
use buildbot_github::webhook_events::IssueCommentEvent;
use chrono::Utc;
use tracing::{debug, info};

use crate::github_ops::GithubOps;
use crate::trybot::{TryBuildRequest, TryScheduler};

/// How an issue-comment event was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueCommentOutcome {
    /// The event carried no actionable command; nothing was written.
    Ignored { reason_code: &'static str },
    /// An identical build request already exists for the head revision.
    SkippedDuplicate { check_run_id: u64 },
    /// A check run was created and the try build was scheduled.
    Scheduled { check_run_id: u64 },
}

/// Handles a GitHub `issue_comment` event end to end: filter, parse, gate,
/// reflect state back as a comment plus a queued check run, and hand the
/// request to the try scheduler.
pub async fn handle_issue_comment_event(
    ops: &dyn GithubOps,
    scheduler: &dyn TryScheduler,
    event: &IssueCommentEvent,
) -> Result<IssueCommentOutcome> {
    // Only PR comments can trigger builds, and only fresh or edited ones.
    if !event.issue.is_pull_request() {
        return Ok(IssueCommentOutcome::Ignored {
            reason_code: "not_a_pull_request",
        });
    }
    if event.action != "created" && event.action != "edited" {
        return Ok(IssueCommentOutcome::Ignored {
            reason_code: "unhandled_action",
        });
    }
    let Some(body) = event.comment.body.as_deref() else {
        return Ok(IssueCommentOutcome::Ignored {
            reason_code: "empty_comment",
        });
    };

    let mut command = match BuildCommand::parse(body) {
        Ok(command) => command,
        Err(error) => {
            // Ordinary PR conversation lands here; only worth a debug line.
            debug!("comment is not a buildbot command: {error}");
            return Ok(IssueCommentOutcome::Ignored {
                reason_code: "not_a_command",
            });
        }
    };
    command.comment_author = event.comment.user.login.clone();
    info!(
        author = %command.comment_author,
        issue = event.issue.number,
        "buildbot command received"
    );

    let repo = RepoRef::new(
        event.repository.owner.login.clone(),
        event.repository.name.clone(),
    );
    let pr = ops
        .get_pull_request(&repo, event.issue.number)
        .await
        .context("failed to get pull request")?;
    if pr.mergeable != Some(true) {
        ops.create_issue_comment(
            &repo,
            event.issue.number,
            "Sorry, but this PR is currently not mergable.",
        )
        .await
        .context("failed to write comment about mergability")?;
        bail!("pr is not mergable: #{}", pr.number);
    }

    let head_sha = pr.head.sha.clone();
    // The gate needs the complete check-run set for the head revision; the
    // client aggregates all listing pages before returning.
    let existing: Vec<CheckRunRef> = ops
        .list_check_runs_for_ref(&repo, &head_sha)
        .await
        .context("failed to list check runs for head revision")?
        .into_iter()
        .map(|check_run| CheckRunRef {
            id: check_run.id,
            name: check_run.name,
            html_url: check_run.html_url,
        })
        .collect();

    if let BuildDecision::Skip { matched } = should_build(&command, &existing) {
        info!(
            check_run_id = matched.id,
            "identical build already requested for this revision"
        );
        let reference = matched
            .html_url
            .clone()
            .unwrap_or_else(|| matched.name.clone());
        ops.create_issue_comment(
            &repo,
            event.issue.number,
            &format!(
                "A build for this very command has already been requested ({reference}). \
                 Add <code>force=true</code> to your command to request a new build anyway."
            ),
        )
        .await
        .context("failed to write duplicate-build comment")?;
        return Ok(IssueCommentOutcome::SkippedDuplicate {
            check_run_id: matched.id,
        });
    }

    let comment_location = event
        .comment
        .html_url
        .as_deref()
        .unwrap_or("this pull request");
    let build_log_comment = ops
        .create_issue_comment(
            &repo,
            event.issue.number,
            &format!(
                "Thank you @{} for using the <code>/buildbot</code> command here ({comment_location})!\n\
                 <sub>This very comment will be used to continuously log build state changes for \
                 your request, in addition to the check run below.</sub>",
                command.comment_author
            ),
        )
        .await
        .context("failed to create build log comment")?;

    // The check run must exist before buildbot is called so its ID can ride
    // along as a property and come back with every status push.
    let check_run = ops
        .create_check_run(
            &repo,
            &CreateCheckRun {
                name: command.check_run_name(),
                head_sha: head_sha.clone(),
                status: CheckRunState::Queued,
                output: Some(CheckRunOutput {
                    title: Some("Buildbot Status Log".to_string()),
                    summary: Some(wrap_with_time_prefix(
                        "We're about to forward your request to buildbot.",
                        Utc::now(),
                    )),
                    text: Some(
                        "Please wait for the URL to your buildbot job to appear here.".to_string(),
                    ),
                }),
                actions: default_check_run_actions(),
            },
        )
        .await
        .context("failed to create try bot check run")?;

    let pr_ref = PullRequestRef {
        number: pr.number,
        base_repo_owner: repo.owner.clone(),
        base_repo_name: repo.name.clone(),
        base_ref: pr.base.git_ref.clone(),
        base_sha: pr.base.sha.clone(),
        head_ref: pr.head.git_ref.clone(),
        head_sha,
    };
    let installation_id = event
        .installation
        .as_ref()
        .map(|installation| installation.id)
        .unwrap_or_default();
    let mut properties = pr_ref.try_properties();
    properties.extend(command.try_properties());
    properties.push(format!("--property=github_check_run_id={}", check_run.id));
    properties.push(format!(
        "--property=github_app_installation_id={installation_id}"
    ));
    properties.push(format!(
        "--property=github_build_log_comment_id={}",
        build_log_comment.id
    ));

    let output = scheduler
        .schedule(&TryBuildRequest {
            who: command.comment_author.clone(),
            repo,
            properties,
        })
        .await
        .context("failed to run trybot")?;
    info!(check_run_id = check_run.id, "trybot command executed: {output}");

    Ok(IssueCommentOutcome::Scheduled {
        check_run_id: check_run.id,
    })
}
