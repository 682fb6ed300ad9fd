use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::change::ViewSnapshot;
use crate::error::{GitorialError, Result};
use crate::navigate;

// ============================================================================
// Commits
// ============================================================================

/// A commit as reported by the version control collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    pub hash: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

impl RawCommit {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
            date: DateTime::<Utc>::default(),
            author: "unknown".to_string(),
            author_email: None,
        }
    }

    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author = name.into();
        self.author_email = Some(email.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

// ============================================================================
// Steps
// ============================================================================

/// The tag a commit message carries before its first `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// Narrative only, no exercise.
    Section,
    /// An incomplete exercise, followed by its solution commit.
    Template,
    /// Completed code for the preceding template.
    Solution,
    /// A code change with no exercise attached.
    Action,
    /// Explanatory commit kept only when extraction preserves readmes.
    Readme,
}

impl StepType {
    /// Parse a lower-cased, trimmed tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "section" => Some(StepType::Section),
            "template" => Some(StepType::Template),
            "solution" => Some(StepType::Solution),
            "action" => Some(StepType::Action),
            "readme" => Some(StepType::Readme),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Section => "section",
            StepType::Template => "template",
            StepType::Solution => "solution",
            StepType::Action => "action",
            StepType::Readme => "readme",
        }
    }

    /// Whether `next`/`previous` may stop on a step of this type.
    pub fn is_navigable(&self) -> bool {
        !matches!(self, StepType::Solution | StepType::Readme)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One navigable unit of a tutorial, backed by a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub commit_hash: String,
    pub title: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub index: usize,
}

impl Step {
    /// A step whose id is its commit hash.
    pub fn new(
        commit_hash: impl Into<String>,
        step_type: StepType,
        title: impl Into<String>,
    ) -> Self {
        let commit_hash = commit_hash.into();
        Self {
            id: commit_hash.clone(),
            commit_hash,
            title: title.into(),
            step_type,
            index: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

// ============================================================================
// Tutorial
// ============================================================================

/// Position of the learner within a tutorial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub active_step_index: usize,
    pub showing_solution: bool,
}

impl Cursor {
    pub fn at(index: usize) -> Self {
        Self {
            active_step_index: index,
            showing_solution: false,
        }
    }
}

/// A structural inconsistency in the template/solution pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairingIssue {
    /// A template that is not immediately followed by a solution.
    TemplateWithoutSolution { index: usize },
    /// A solution that does not immediately follow a template.
    OrphanSolution { index: usize },
}

impl fmt::Display for PairingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingIssue::TemplateWithoutSolution { index } => {
                write!(f, "template step {} has no solution after it", index)
            }
            PairingIssue::OrphanSolution { index } => {
                write!(f, "solution step {} does not follow a template", index)
            }
        }
    }
}

/// A tutorial: an ordered, non-empty list of steps plus the learner's cursor.
///
/// Steps are fixed at construction. The cursor only moves through the
/// functions in [`crate::navigate`], which keep it in range and clear the
/// solution flag on every step change.
#[derive(Debug, Clone, Serialize)]
pub struct Tutorial {
    id: String,
    title: String,
    local_path: PathBuf,
    steps: Vec<Step>,
    #[serde(flatten)]
    cursor: Cursor,
}

impl Tutorial {
    /// Build a tutorial positioned on its first step.
    ///
    /// Step indices are rewritten to match their position. Fails with
    /// [`GitorialError::NoSteps`] on an empty list and
    /// [`GitorialError::DuplicateStepId`] when two steps share an id.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        local_path: impl Into<PathBuf>,
        steps: Vec<Step>,
    ) -> Result<Self> {
        if steps.is_empty() {
            return Err(GitorialError::NoSteps);
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(GitorialError::DuplicateStepId(step.id.clone()));
            }
        }

        let steps: Vec<Step> = steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| step.with_index(index))
            .collect();

        let tutorial = Self {
            id: id.into(),
            title: title.into(),
            local_path: local_path.into(),
            steps,
            cursor: Cursor::default(),
        };

        for issue in tutorial.pairing_issues() {
            tracing::warn!(
                tutorial = %tutorial.id,
                %issue,
                "inconsistent template/solution pairing"
            );
        }

        Ok(tutorial)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: [`Tutorial::new`] rejects an empty step list.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn active_step_index(&self) -> usize {
        self.cursor.active_step_index
    }

    pub fn is_showing_solution(&self) -> bool {
        self.cursor.showing_solution
    }

    pub fn active_step(&self) -> &Step {
        &self.steps[self.cursor.active_step_index]
    }

    /// First step whose commit matches `hash`.
    pub fn find_by_commit(&self, hash: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.commit_hash == hash)
    }

    /// First step with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// The solution paired with the template at `index`, if the pairing holds.
    pub fn solution_for(&self, index: usize) -> Option<&Step> {
        let template = self.steps.get(index)?;
        if template.step_type != StepType::Template {
            return None;
        }
        self.steps
            .get(index + 1)
            .filter(|s| s.step_type == StepType::Solution)
    }

    /// Every place the template-then-solution authoring rule is broken.
    pub fn pairing_issues(&self) -> Vec<PairingIssue> {
        let mut issues = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            match step.step_type {
                StepType::Template if self.solution_for(index).is_none() => {
                    issues.push(PairingIssue::TemplateWithoutSolution { index });
                }
                StepType::Solution => {
                    let follows_template = index
                        .checked_sub(1)
                        .and_then(|prev| self.steps.get(prev))
                        .is_some_and(|prev| prev.step_type == StepType::Template);
                    if !follows_template {
                        issues.push(PairingIssue::OrphanSolution { index });
                    }
                }
                _ => {}
            }
        }
        issues
    }

    /// The view model handed to a renderer.
    pub fn view(&self) -> TutorialView {
        let index = self.cursor.active_step_index;
        let active = self.active_step();
        let solution = self.solution_for(index);
        let content_ref = match solution {
            Some(solution) if self.cursor.showing_solution => solution.commit_hash.clone(),
            _ => active.commit_hash.clone(),
        };

        TutorialView {
            tutorial_id: self.id.clone(),
            tutorial_title: self.title.clone(),
            active_step: active.clone(),
            active_step_index: index,
            total_steps: self.steps.len(),
            showing_solution: self.cursor.showing_solution,
            content_ref,
            has_solution: solution.is_some(),
            is_first: !navigate::can_previous(self),
            is_last: !navigate::can_next(self),
        }
    }

    pub(crate) fn set_cursor(&mut self, cursor: Cursor) {
        debug_assert!(cursor.active_step_index < self.steps.len());
        self.cursor = cursor;
    }
}

/// What a renderer needs after each transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorialView {
    pub tutorial_id: String,
    pub tutorial_title: String,
    pub active_step: Step,
    pub active_step_index: usize,
    pub total_steps: usize,
    pub showing_solution: bool,
    /// Commit whose content should be displayed: the paired solution while
    /// it is shown, the active step otherwise.
    pub content_ref: String,
    pub has_solution: bool,
    pub is_first: bool,
    pub is_last: bool,
}

impl TutorialView {
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            step_id: self.active_step.id.clone(),
            showing_solution: self.showing_solution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_steps() -> Vec<Step> {
        vec![
            Step::new("c1", StepType::Section, "Intro"),
            Step::new("c2", StepType::Template, "Write a function"),
            Step::new("c3", StepType::Solution, "Write a function"),
            Step::new("c4", StepType::Action, "Wire it up"),
        ]
    }

    // ── StepType ───────────────────────────────────────────────────────

    #[test]
    fn test_step_type_from_tag() {
        assert_eq!(StepType::from_tag("section"), Some(StepType::Section));
        assert_eq!(StepType::from_tag("template"), Some(StepType::Template));
        assert_eq!(StepType::from_tag("solution"), Some(StepType::Solution));
        assert_eq!(StepType::from_tag("action"), Some(StepType::Action));
        assert_eq!(StepType::from_tag("readme"), Some(StepType::Readme));
        assert_eq!(StepType::from_tag("chore"), None);
    }

    #[test]
    fn test_step_type_navigability() {
        assert!(StepType::Section.is_navigable());
        assert!(StepType::Template.is_navigable());
        assert!(StepType::Action.is_navigable());
        assert!(!StepType::Solution.is_navigable());
        assert!(!StepType::Readme.is_navigable());
    }

    #[test]
    fn test_step_serializes_type_lowercase() {
        let step = Step::new("abc", StepType::Template, "Do it");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "template");
        assert_eq!(json["id"], "abc");
        assert_eq!(json["commit_hash"], "abc");
    }

    // ── Tutorial::new ──────────────────────────────────────────────────

    #[test]
    fn test_new_rejects_empty() {
        let err = Tutorial::new("t", "T", "/tmp/t", vec![]).unwrap_err();
        assert!(matches!(err, GitorialError::NoSteps));
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let steps = vec![
            Step::new("c1", StepType::Section, "a"),
            Step::new("c2", StepType::Action, "b").with_id("c1"),
        ];
        let err = Tutorial::new("t", "T", "/tmp/t", steps).unwrap_err();
        assert!(matches!(err, GitorialError::DuplicateStepId(id) if id == "c1"));
    }

    #[test]
    fn test_new_reindexes_steps() {
        let steps = vec![
            Step::new("c1", StepType::Section, "a").with_index(7),
            Step::new("c2", StepType::Action, "b").with_index(7),
        ];
        let t = Tutorial::new("t", "T", "/tmp/t", steps).unwrap();
        for (i, step) in t.steps().iter().enumerate() {
            assert_eq!(step.index, i);
        }
    }

    #[test]
    fn test_new_starts_on_first_step() {
        let t = Tutorial::new("t", "T", "/tmp/t", sample_steps()).unwrap();
        assert_eq!(t.active_step_index(), 0);
        assert!(!t.is_showing_solution());
        assert_eq!(t.active_step().id, "c1");
        assert_eq!(t.local_path(), Path::new("/tmp/t"));
        assert!(!t.is_empty());
        assert_eq!(t.len(), sample_steps().len());
    }

    // ── Lookups ────────────────────────────────────────────────────────

    #[test]
    fn test_solution_for_template() {
        let t = Tutorial::new("t", "T", "/tmp/t", sample_steps()).unwrap();
        assert_eq!(t.solution_for(1).unwrap().id, "c3");
        assert!(t.solution_for(0).is_none());
        assert!(t.solution_for(3).is_none());
        assert!(t.solution_for(99).is_none());
    }

    #[test]
    fn test_find_by_commit_and_id() {
        let steps = vec![
            Step::new("abc123", StepType::Section, "a").with_id("s1"),
            Step::new("def456", StepType::Action, "b").with_id("s2"),
        ];
        let t = Tutorial::new("t", "T", "/tmp/t", steps).unwrap();
        assert_eq!(t.find_by_commit("def456").unwrap().id, "s2");
        assert_eq!(t.find_by_id("s1").unwrap().commit_hash, "abc123");
        assert!(t.find_by_commit("s1").is_none());
    }

    // ── Pairing ────────────────────────────────────────────────────────

    #[test]
    fn test_pairing_issues_clean() {
        let t = Tutorial::new("t", "T", "/tmp/t", sample_steps()).unwrap();
        assert!(t.pairing_issues().is_empty());
    }

    #[test]
    fn test_pairing_issues_detects_both_kinds() {
        let steps = vec![
            Step::new("c1", StepType::Solution, "orphan"),
            Step::new("c2", StepType::Action, "a"),
            Step::new("c3", StepType::Template, "trailing"),
        ];
        let t = Tutorial::new("t", "T", "/tmp/t", steps).unwrap();
        assert_eq!(
            t.pairing_issues(),
            vec![
                PairingIssue::OrphanSolution { index: 0 },
                PairingIssue::TemplateWithoutSolution { index: 2 },
            ]
        );
    }

    // ── View ───────────────────────────────────────────────────────────

    #[test]
    fn test_view_content_ref_follows_solution_flag() {
        let mut t = Tutorial::new("t", "T", "/tmp/t", sample_steps()).unwrap();
        t.set_cursor(Cursor::at(1));
        let view = t.view();
        assert_eq!(view.content_ref, "c2");
        assert!(view.has_solution);

        t.set_cursor(Cursor {
            active_step_index: 1,
            showing_solution: true,
        });
        let view = t.view();
        assert_eq!(view.content_ref, "c3");
        assert_eq!(view.active_step.id, "c2");
        assert_eq!(view.snapshot().step_id, "c2");
        assert!(view.snapshot().showing_solution);
    }

    #[test]
    fn test_view_first_and_last_flags() {
        let mut t = Tutorial::new("t", "T", "/tmp/t", sample_steps()).unwrap();
        let view = t.view();
        assert!(view.is_first);
        assert!(!view.is_last);
        assert_eq!(view.total_steps, 4);

        t.set_cursor(Cursor::at(3));
        let view = t.view();
        assert!(!view.is_first);
        assert!(view.is_last);
    }
}
