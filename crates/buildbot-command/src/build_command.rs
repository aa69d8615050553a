use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// The literal that triggers the buildbot workflow in a GitHub comment.
pub const BUILDBOT_TRIGGER: &str = "/buildbot";

/// Boolean option that makes the resulting check run gate merge eligibility.
pub const OPTION_MANDATORY: &str = "mandatory";

/// Repeatable option selecting builders. The resulting list is
/// case-sensitive, sorted, and free of duplicates.
pub const OPTION_BUILDER: &str = "builder";

/// Boolean option that requests a new build even when an identical one has
/// already been requested for the same head revision.
pub const OPTION_FORCE: &str = "force";

const TRUE_TOKENS: &[&str] = &["true", "t", "yes", "y", "1"];

#[derive(Debug, Error, PartialEq, Eq)]
/// Errors produced while turning a comment body into a [`BuildCommand`].
pub enum CommandError {
    #[error("string is no valid command: {0}")]
    InvalidCommand(String),
}

/// A normalized `/buildbot` command parsed from a trigger comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    /// When true, the resulting check run has to pass for the PR to be
    /// mergeable (default: true).
    pub is_mandatory: bool,
    /// Case-sensitive, ascending-sorted list of builder names without
    /// duplicates.
    pub builder_names: Vec<String>,
    /// GitHub login of the comment author. Not part of the grammar; set by
    /// the caller after parsing.
    pub comment_author: String,
    /// When true, the dedup gate is bypassed and a new build is requested
    /// even if an identical one already exists (default: false).
    pub force: bool,
}

impl Default for BuildCommand {
    fn default() -> Self {
        Self {
            is_mandatory: true,
            builder_names: Vec::new(),
            comment_author: String::new(),
            force: false,
        }
    }
}

/// Transient fold target between tokenizing and materializing a command.
/// Scalar options overwrite on repeat, `builder` accumulates.
#[derive(Debug, Default)]
struct ParsedOptions {
    mandatory: Option<String>,
    force: Option<String>,
    builders: Vec<String>,
}

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let bool_tokens = "(yes|no|true|false|f|t|y|n|0|1)";
        let pattern = format!(
            r"^{trigger}(\s+|{mandatory}={bools}|{force}={bools}|{builder}=(\w+))*$",
            trigger = BUILDBOT_TRIGGER,
            mandatory = OPTION_MANDATORY,
            force = OPTION_FORCE,
            builder = OPTION_BUILDER,
            bools = bool_tokens,
        );
        Regex::new(&pattern).unwrap_or_else(|error| panic!("invalid command grammar: {error}"))
    })
}

/// Returns true if the given string matches the whole `/buildbot` grammar.
pub fn is_command(text: &str) -> bool {
    command_regex().is_match(text)
}

/// Returns true if the trimmed, lowercased value is one of the accepted
/// true tokens. Anything else counts as false; the grammar already limits
/// the value space, so only the true subset needs recognizing.
fn value_is_true(value: &str) -> bool {
    let value = value.trim();
    TRUE_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
}

/// Returns everything after the first occurrence of the trigger, trimmed.
/// Strings without the trigger are returned unchanged.
fn strip_trigger(text: &str) -> &str {
    match text.split_once(BUILDBOT_TRIGGER) {
        Some((_, after)) => after.trim(),
        None => text,
    }
}

impl BuildCommand {
    /// Parses a comment body into a normalized command.
    ///
    /// The entire input must match the command grammar; there is no partial
    /// acceptance. Options fold left to right: `mandatory` and `force`
    /// overwrite on repeat, `builder` accumulates and is deduplicated
    /// (case-sensitive) and sorted ascending before the command is built.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        if !is_command(text) {
            return Err(CommandError::InvalidCommand(text.to_string()));
        }

        let mut options = ParsedOptions::default();
        let argument_text = strip_trigger(text);
        if !argument_text.is_empty() {
            for token in argument_text.split(' ') {
                // The grammar already guarantees key=value shape; a token
                // failing here still rejects the whole comment.
                let (key, value) = token
                    .split_once('=')
                    .ok_or_else(|| CommandError::InvalidCommand(text.to_string()))?;
                if value.is_empty() {
                    return Err(CommandError::InvalidCommand(text.to_string()));
                }
                match key.to_ascii_lowercase().as_str() {
                    OPTION_MANDATORY => options.mandatory = Some(value.to_string()),
                    OPTION_FORCE => options.force = Some(value.to_string()),
                    OPTION_BUILDER => options.builders.push(value.to_string()),
                    _ => return Err(CommandError::InvalidCommand(text.to_string())),
                }
            }
        }

        let mut command = BuildCommand::default();
        if let Some(mandatory) = options.mandatory {
            command.is_mandatory = value_is_true(&mandatory);
        }
        if let Some(force) = options.force {
            command.force = value_is_true(&force);
        }
        options.builders.sort_unstable();
        options.builders.dedup();
        command.builder_names = options.builders;
        Ok(command)
    }

    /// Deterministic display key, used verbatim as the GitHub check-run name
    /// and as the dedup comparison key. Two commands with identical fields
    /// always produce identical keys.
    pub fn check_run_name(&self) -> String {
        format!(
            "@{} {} {}={} {}={} {}=[{}]",
            self.comment_author,
            BUILDBOT_TRIGGER,
            OPTION_MANDATORY,
            self.is_mandatory,
            OPTION_FORCE,
            self.force,
            OPTION_BUILDER,
            self.builder_names.join(" "),
        )
    }
}
