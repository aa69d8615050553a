//! GitHub collaborator surface for the buildbot bridge: typed REST client,
//! check-run model, webhook payload types, and webhook signature
//! verification. This crate performs the I/O the core decision logic stays
//! free of.

pub mod api_client;
pub mod check_run;
pub mod webhook_events;
pub mod webhook_signature;

pub use api_client::{GithubApiClient, IssueCommentHandle, RepoRef};
pub use check_run::{
    conclusion_from_buildbot_result, default_check_run_actions, wrap_with_time_prefix, CheckRun,
    CheckRunAction, CheckRunConclusion, CheckRunOutput, CheckRunState, CreateCheckRun,
    UpdateCheckRun,
};
pub use webhook_events::{CheckRunEvent, IssueCommentEvent, PullRequest};
pub use webhook_signature::verify_webhook_signature;
