//! Turning a tagged commit history into an ordered step list.

use serde::{Deserialize, Serialize};

use crate::types::{RawCommit, Step, StepType};

/// What to do with `readme:` commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadmeMode {
    /// Drop them; they never become steps.
    #[default]
    Exclude,
    /// Keep them as [`StepType::Readme`] steps that `next`/`previous` skip.
    Preserve,
}

/// Options for [`extract_steps`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub readme: ReadmeMode,
}

impl ExtractConfig {
    pub fn with_readme(mut self, readme: ReadmeMode) -> Self {
        self.readme = readme;
        self
    }
}

/// Split a commit message into its step type and title.
///
/// Only the subject line is considered. The tag is the text before the first
/// `:`, matched case-insensitively; the title is the trimmed remainder.
///
/// # Examples
///
/// ```
/// use gitorial::{StepType, extract::parse_message};
///
/// assert_eq!(
///     parse_message("Template: Add a counter\n\nbody"),
///     Some((StepType::Template, "Add a counter".to_string())),
/// );
/// assert_eq!(parse_message("fix typo"), None);
/// ```
pub fn parse_message(message: &str) -> Option<(StepType, String)> {
    let subject = message.trim().lines().next().unwrap_or("");
    let (tag, title) = subject.split_once(':')?;
    let step_type = StepType::from_tag(&tag.trim().to_lowercase())?;
    Some((step_type, title.trim().to_string()))
}

/// Build steps from commits listed newest-first.
///
/// The result is oldest-first with sequential indices. Commits without a
/// recognized tag are skipped with a warning; an empty result is returned
/// as-is and left for [`crate::Tutorial::new`] to reject.
pub fn extract_steps(commits: &[RawCommit], config: &ExtractConfig) -> Vec<Step> {
    let mut steps = Vec::new();

    for commit in commits.iter().rev() {
        let Some((step_type, title)) = parse_message(&commit.message) else {
            tracing::warn!(
                commit = %short_hash(&commit.hash),
                subject = commit.subject(),
                "skipping commit without a recognized step tag"
            );
            continue;
        };

        if step_type == StepType::Readme && config.readme == ReadmeMode::Exclude {
            tracing::debug!(commit = %short_hash(&commit.hash), "skipping readme commit");
            continue;
        }

        let index = steps.len();
        steps.push(Step::new(commit.hash.clone(), step_type, title).with_index(index));
    }

    steps
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(8).collect()
}
