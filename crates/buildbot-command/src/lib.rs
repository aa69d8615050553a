//! Core decision logic for the buildbot bridge: the `/buildbot` comment
//! grammar, the normalized [`BuildCommand`] value, the deterministic check-run
//! display key, and the build deduplication gate. Everything in this crate is
//! pure; all I/O lives in the surrounding crates.

pub mod build_command;
pub mod dedup_gate;
pub mod try_properties;

pub use build_command::{BuildCommand, CommandError, BUILDBOT_TRIGGER};
pub use dedup_gate::{should_build, BuildDecision, CheckRunRef};
pub use try_properties::PullRequestRef;
