//! Orchestration for the buildbot bridge: issue-comment handling (parse →
//! dedup gate → check run → trybot), buildbot status-push handling, and the
//! capability traits that keep both flows testable without a network.

pub mod build_status_flow;
pub mod github_ops;
pub mod issue_comment_flow;
pub mod trybot;

pub use build_status_flow::{handle_build_status_event, BuildStatusEvent};
pub use github_ops::{GithubOps, InMemoryGithubOps};
pub use issue_comment_flow::{handle_issue_comment_event, IssueCommentOutcome};
pub use trybot::{BuildbotTryScheduler, RecordingTryScheduler, TryBuildRequest, TryScheduler};
