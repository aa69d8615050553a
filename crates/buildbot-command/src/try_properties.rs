//! Statically enumerated `--property=…` mappings handed to `buildbot try`.
//! Each field is mapped to its external property key explicitly; nothing here
//! relies on runtime type introspection.

use crate::build_command::BuildCommand;

/// Everything needed to identify a pull request, both towards GitHub and as
/// buildbot build properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub number: u64,
    pub base_repo_owner: String,
    pub base_repo_name: String,
    pub base_ref: String,
    pub base_sha: String,
    pub head_ref: String,
    pub head_sha: String,
}

fn property(key: &str, value: impl std::fmt::Display) -> String {
    format!("--property={key}={value}")
}

impl BuildCommand {
    /// Command options as `buildbot try` properties.
    pub fn try_properties(&self) -> Vec<String> {
        vec![
            property("command_is_mandatory", self.is_mandatory),
            property("command_force", self.force),
            property("command_builders", self.builder_names.join(";")),
        ]
    }
}

impl PullRequestRef {
    /// Pull-request identity as `buildbot try` properties, in field order.
    pub fn try_properties(&self) -> Vec<String> {
        vec![
            property("github_pull_request_number", self.number),
            property("github_pull_request_repo_name", &self.base_repo_name),
            property("github_pull_request_repo_owner", &self.base_repo_owner),
            property("github_pull_request_base_ref", &self.base_ref),
            property("github_pull_request_base_sha", &self.base_sha),
            property("github_pull_request_head_ref", &self.head_ref),
            property("github_pull_request_head_sha", &self.head_sha),
        ]
    }
}
