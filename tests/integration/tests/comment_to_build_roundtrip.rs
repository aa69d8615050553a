//! End-to-end bridge flow over the in-memory GitHub fake: a trigger comment
//! becomes a queued check run and a scheduled try build, a repeated comment
//! is deduplicated, a forced one is not, and a buildbot status push completes
//! the check run and extends the build log comment.

use std::sync::Arc;

use buildbot_runtime::build_status_flow::{handle_build_status_event, BuildStatusEvent};
use buildbot_runtime::github_ops::InMemoryGithubOps;
use buildbot_runtime::issue_comment_flow::{handle_issue_comment_event, IssueCommentOutcome};
use buildbot_runtime::trybot::RecordingTryScheduler;
use buildbot_github::webhook_events::IssueCommentEvent;

const HEAD_SHA: &str = "5da7cf6468aabc181b3c7c662539cd3e70526c1b";

fn comment_event(body: &str) -> IssueCommentEvent {
    serde_json::from_value(serde_json::json!({
        "action": "created",
        "issue": { "number": 123, "pull_request": {} },
        "comment": {
            "id": 9,
            "body": body,
            "user": { "login": "johndoe" },
            "html_url": "https://github.com/janedoe/examplerepo/pull/123#issuecomment-9"
        },
        "repository": { "name": "examplerepo", "owner": { "login": "janedoe" } },
        "installation": { "id": 1234 }
    }))
    .expect("issue comment event")
}

fn seeded_ops() -> Arc<InMemoryGithubOps> {
    let ops = Arc::new(InMemoryGithubOps::new());
    ops.seed_pull_request(
        serde_json::from_value(serde_json::json!({
            "number": 123,
            "mergeable": true,
            "base": { "ref": "main", "sha": "basesha" },
            "head": { "ref": "feature", "sha": HEAD_SHA }
        }))
        .expect("pull request"),
    );
    ops
}

fn status_event(check_run_id: u64, comment_id: u64, results: i64) -> BuildStatusEvent {
    serde_json::from_value(serde_json::json!({
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
    }))
    .expect("status event")
}

#[tokio::test]
async fn integration_comment_dedup_force_and_status_roundtrip() {
    let ops = seeded_ops();
    let scheduler = RecordingTryScheduler::new();

    // First trigger comment: one check run, one try build, one log comment.
    let outcome = handle_issue_comment_event(
        ops.as_ref(),
        &scheduler,
        &comment_event("/buildbot builder=linux"),
    )
    .await
    .expect("first command");
    let IssueCommentOutcome::Scheduled { check_run_id } = outcome else {
        panic!("expected scheduled outcome, got {outcome:?}");
    };
    assert_eq!(scheduler.requests().len(), 1);
    assert_eq!(
        ops.check_run_names(),
        vec!["@johndoe /buildbot mandatory=true force=false builder=[linux]"]
    );
    let build_log_comment_id = 1;
    assert!(ops
        .comment_body(build_log_comment_id)
        .expect("build log comment")
        .contains("@johndoe"));

    // The same command again is recognized as a duplicate and not scheduled.
    let outcome = handle_issue_comment_event(
        ops.as_ref(),
        &scheduler,
        &comment_event("/buildbot builder=linux"),
    )
    .await
    .expect("duplicate command");
    assert_eq!(outcome, IssueCommentOutcome::SkippedDuplicate { check_run_id });
    assert_eq!(scheduler.requests().len(), 1);

    // With force=true the gate is bypassed and a second build is scheduled.
    let outcome = handle_issue_comment_event(
        ops.as_ref(),
        &scheduler,
        &comment_event("/buildbot builder=linux force=true"),
    )
    .await
    .expect("forced command");
    assert!(matches!(outcome, IssueCommentOutcome::Scheduled { .. }));
    assert_eq!(scheduler.requests().len(), 2);

    // A buildbot status push completes the first check run and appends to
    // the build log comment.
    handle_build_status_event(
        ops.as_ref(),
        &status_event(check_run_id, build_log_comment_id, 0),
    )
    .await
    .expect("status push");
    assert_eq!(
        ops.check_run_conclusion(check_run_id).as_deref(),
        Some("success")
    );
    let body = ops.comment_body(build_log_comment_id).expect("comment");
    assert!(body.contains("[Builder: fedora-rawhide-x86_64]"));
}

#[tokio::test]
async fn integration_scheduled_properties_carry_command_and_pr_identity() {
    let ops = seeded_ops();
    let scheduler = RecordingTryScheduler::new();

    handle_issue_comment_event(
        ops.as_ref(),
        &scheduler,
        &comment_event("/buildbot mandatory=no builder=windows builder=linux"),
    )
    .await
    .expect("command");

    let requests = scheduler.requests();
    assert_eq!(requests.len(), 1);
    let properties = &requests[0].properties;
    for expected in [
        "--property=github_pull_request_number=123",
        "--property=github_pull_request_repo_name=examplerepo",
        "--property=github_pull_request_repo_owner=janedoe",
        "--property=command_is_mandatory=false",
        "--property=command_force=false",
        "--property=command_builders=linux;windows",
        "--property=github_app_installation_id=1234",
    ] {
        assert!(
            properties.contains(&expected.to_string()),
            "missing {expected} in {properties:?}"
        );
    }
}
