use crate::build_command::BuildCommand;

/// A check run as seen by the dedup gate: the display name it was created
/// with and the handle needed to reference it in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunRef {
    pub id: u64,
    pub name: String,
    pub html_url: Option<String>,
}

/// Outcome of the build deduplication gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDecision {
    /// No identical build request exists (or force was set); request a build.
    Proceed,
    /// An identical request already exists for this revision.
    Skip { matched: CheckRunRef },
}

/// Decides whether a parsed command represents a build that has already been
/// requested for the current head revision.
///
/// `existing` must hold every check run attached to the head SHA, aggregated
/// across all listing pages; a partial slice risks a false `Proceed`. The
/// comparison key is the command's display name, matched byte for byte, so
/// commands differing in any option are distinct build requests. `force=true`
/// always proceeds, regardless of how many matches exist.
pub fn should_build(command: &BuildCommand, existing: &[CheckRunRef]) -> BuildDecision {
    let key = command.check_run_name();
    let matched = existing.iter().find(|check_run| check_run.name == key);
    match matched {
        Some(check_run) if !command.force => BuildDecision::Skip {
            matched: check_run.clone(),
        },
        _ => BuildDecision::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::{should_build, BuildDecision, CheckRunRef};
    use crate::build_command::BuildCommand;

    fn sample_command(force: bool) -> BuildCommand {
        let mut command = BuildCommand::parse("/buildbot builder=linux").expect("parsed");
        command.comment_author = "johndoe".to_string();
        command.force = force;
        command
    }

    fn check_run(id: u64, name: &str) -> CheckRunRef {
        CheckRunRef {
            id,
            name: name.to_string(),
            html_url: None,
        }
    }

    #[test]
    fn unit_should_build_proceeds_without_existing_check_runs() {
        let command = sample_command(false);
        assert_eq!(should_build(&command, &[]), BuildDecision::Proceed);
    }

    #[test]
    fn unit_should_build_ignores_check_runs_with_other_names() {
        let command = sample_command(false);
        let existing = [check_run(1, "some other check run with a different name")];
        assert_eq!(should_build(&command, &existing), BuildDecision::Proceed);
    }

    #[test]
    fn functional_should_build_skips_exact_name_match() {
        let command = sample_command(false);
        let matched = check_run(7, &command.check_run_name());
        let existing = [check_run(1, "unrelated"), matched.clone()];
        assert_eq!(
            should_build(&command, &existing),
            BuildDecision::Skip { matched }
        );
    }

    #[test]
    fn functional_should_build_force_overrides_any_match() {
        let command = sample_command(true);
        let existing = [
            check_run(1, &command.check_run_name()),
            check_run(2, &command.check_run_name()),
        ];
        assert_eq!(should_build(&command, &existing), BuildDecision::Proceed);
    }

    #[test]
    fn regression_should_build_treats_option_changes_as_distinct_requests() {
        let queued = sample_command(false);
        let existing = [check_run(3, &queued.check_run_name())];

        let mut optional = queued.clone();
        optional.is_mandatory = false;
        assert_eq!(should_build(&optional, &existing), BuildDecision::Proceed);

        let mut more_builders = queued.clone();
        more_builders.builder_names.push("windows".to_string());
        assert_eq!(should_build(&more_builders, &existing), BuildDecision::Proceed);
    }

    #[test]
    fn regression_should_build_skip_returns_the_matched_handle() {
        let command = sample_command(false);
        let matched = CheckRunRef {
            id: 42,
            name: command.check_run_name(),
            html_url: Some("https://github.com/acme/repo/runs/42".to_string()),
        };
        match should_build(&command, std::slice::from_ref(&matched)) {
            BuildDecision::Skip { matched: found } => assert_eq!(found, matched),
            BuildDecision::Proceed => panic!("expected skip"),
        }
    }
}
