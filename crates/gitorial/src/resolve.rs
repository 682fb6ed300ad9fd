//! Choosing the step a tutorial opens on.

use serde::Serialize;
use std::fmt;

use crate::error::{GitorialError, Result};
use crate::types::Step;

/// Which input produced the resolved step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedFrom {
    /// A caller-supplied commit hash (deep link).
    Explicit,
    /// The step id saved by a previous session.
    Persisted,
    /// Neither matched; the first step.
    Default,
}

/// An identifier that was supplied but did not match any step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolutionMiss {
    ExplicitCommit(String),
    PersistedStep(String),
}

impl fmt::Display for ResolutionMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMiss::ExplicitCommit(hash) => {
                write!(f, "no step for commit '{}'", hash)
            }
            ResolutionMiss::PersistedStep(id) => write!(f, "no step with id '{}'", id),
        }
    }
}

/// Result of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub step: &'a Step,
    pub source: ResolvedFrom,
    /// Misses in the order they were tried; each was also logged.
    pub misses: Vec<ResolutionMiss>,
}

/// Pick a starting step.
///
/// Tried in order: the step whose commit is `explicit_commit`, the step whose
/// id is `persisted_step_id`, the first step. The first match wins when
/// several steps qualify.
///
/// An explicit commit that is empty or whitespace counts as supplied and
/// missed. An empty persisted id counts as absent; any other persisted id,
/// whitespace included, is looked up verbatim.
///
/// # Examples
///
/// ```
/// use gitorial::{Step, StepType};
/// use gitorial::resolve::{ResolvedFrom, resolve};
///
/// let steps = vec![
///     Step::new("abc123", StepType::Section, "one").with_id("s1"),
///     Step::new("def456", StepType::Action, "two").with_id("s2").with_index(1),
/// ];
///
/// let hit = resolve(&steps, Some("def456"), Some("s1")).unwrap();
/// assert_eq!(hit.step.id, "s2");
/// assert_eq!(hit.source, ResolvedFrom::Explicit);
///
/// let fallback = resolve(&steps, None, None).unwrap();
/// assert_eq!(fallback.step.id, "s1");
/// ```
pub fn resolve<'a>(
    steps: &'a [Step],
    explicit_commit: Option<&str>,
    persisted_step_id: Option<&str>,
) -> Result<Resolution<'a>> {
    let first = default_step(steps)?;
    let mut misses = Vec::new();

    if let Some(hash) = explicit_commit {
        let hash = hash.trim();
        match steps
            .iter()
            .find(|s| !hash.is_empty() && s.commit_hash == hash)
        {
            Some(step) => {
                return Ok(Resolution {
                    step,
                    source: ResolvedFrom::Explicit,
                    misses,
                });
            }
            None => {
                tracing::warn!(commit = hash, "requested commit is not a step in this tutorial");
                misses.push(ResolutionMiss::ExplicitCommit(hash.to_string()));
            }
        }
    }

    if let Some(id) = persisted_step_id.filter(|id| !id.is_empty()) {
        match steps.iter().find(|s| s.id == id) {
            Some(step) => {
                return Ok(Resolution {
                    step,
                    source: ResolvedFrom::Persisted,
                    misses,
                });
            }
            None => {
                tracing::warn!(step_id = id, "saved step no longer exists in this tutorial");
                misses.push(ResolutionMiss::PersistedStep(id.to_string()));
            }
        }
    }

    Ok(Resolution {
        step: first,
        source: ResolvedFrom::Default,
        misses,
    })
}

/// The first step, or [`GitorialError::NoSteps`].
pub fn default_step(steps: &[Step]) -> Result<&Step> {
    steps.first().ok_or(GitorialError::NoSteps)
}
