//! Loading a tutorial and driving it against real collaborators.
//!
//! Every transition runs in a fixed order: move the cursor, check out the
//! commit the new view displays, save the position. If the checkout or the
//! save fails, the cursor is put back.

use serde::Serialize;
use std::path::PathBuf;

use crate::change::{self, ChangeKind, ViewSnapshot};
use crate::error::Result;
use crate::extract::{ExtractConfig, extract_steps};
use crate::navigate::{self, Refusal, Transition};
use crate::ports::{FileChange, SavedPosition, StateStore, VersionControl};
use crate::resolve::{Resolution, ResolutionMiss, ResolvedFrom, resolve};
use crate::types::{Cursor, StepType, Tutorial, TutorialView};

/// Everything [`TutorialSession::load`] needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub tutorial_id: String,
    pub title: String,
    pub local_path: PathBuf,
    /// Branch holding the tutorial history.
    pub branch: String,
    /// Deep link: open on the step for this commit if it exists.
    pub target_commit: Option<String>,
    pub extract: ExtractConfig,
    /// Check out and save the resolved position during load.
    pub checkout: bool,
}

impl LoadOptions {
    pub fn new(
        tutorial_id: impl Into<String>,
        title: impl Into<String>,
        local_path: impl Into<PathBuf>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            tutorial_id: tutorial_id.into(),
            title: title.into(),
            local_path: local_path.into(),
            branch: branch.into(),
            target_commit: None,
            extract: ExtractConfig::default(),
            checkout: true,
        }
    }

    pub fn with_target_commit(mut self, commit: impl Into<String>) -> Self {
        self.target_commit = Some(commit.into());
        self
    }

    pub fn with_extract_config(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    /// Load without touching the working tree or the saved position.
    pub fn without_checkout(mut self) -> Self {
        self.checkout = false;
        self
    }
}

/// Outcome of a successful session operation.
#[derive(Debug, Clone, Serialize)]
pub struct Update {
    pub transition: Transition,
    /// Difference from the previously reported view.
    pub change: ChangeKind,
    pub view: TutorialView,
}

/// A loaded tutorial wired to a repository and a state store.
#[derive(Debug)]
pub struct TutorialSession<V, S> {
    tutorial: Tutorial,
    vcs: V,
    store: S,
    resolved_from: ResolvedFrom,
    misses: Vec<ResolutionMiss>,
    last_snapshot: Option<ViewSnapshot>,
}

impl<V: VersionControl, S: StateStore> TutorialSession<V, S> {
    /// Read the branch history, build the tutorial, and open it on the
    /// resolved step.
    ///
    /// A saved position restores a revealed solution too, unless an explicit
    /// target chose the step. The resolved position is checked out and saved
    /// before this returns unless [`LoadOptions::without_checkout`] was set.
    pub fn load(vcs: V, store: S, options: LoadOptions) -> Result<Self> {
        let commits = vcs.list_commits(&options.branch)?;
        let steps = extract_steps(&commits, &options.extract);
        let mut tutorial = Tutorial::new(
            options.tutorial_id,
            options.title,
            options.local_path,
            steps,
        )?;

        let saved = store.get(tutorial.id())?;
        let Resolution {
            step,
            source,
            misses,
        } = resolve(
            tutorial.steps(),
            options.target_commit.as_deref(),
            saved.as_ref().map(|p| p.step_id.as_str()),
        )?;
        let index = step.index;
        tutorial.set_cursor(Cursor::at(index));

        let revealed = saved.as_ref().is_some_and(|p| p.showing_solution);
        if source == ResolvedFrom::Persisted
            && revealed
            && let Err(refusal) = navigate::toggle_solution(&mut tutorial, true)
        {
            tracing::debug!(%refusal, "saved solution reveal no longer applies");
        }

        tracing::debug!(
            tutorial = tutorial.id(),
            steps = tutorial.len(),
            index,
            ?source,
            "tutorial loaded"
        );

        let mut session = Self {
            tutorial,
            vcs,
            store,
            resolved_from: source,
            misses,
            last_snapshot: None,
        };
        let view = if options.checkout {
            session.sync()?
        } else {
            session.tutorial.view()
        };
        session.last_snapshot = Some(view.snapshot());
        Ok(session)
    }

    pub fn tutorial(&self) -> &Tutorial {
        &self.tutorial
    }

    pub fn view(&self) -> TutorialView {
        self.tutorial.view()
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Which input chose the starting step.
    pub fn resolved_from(&self) -> ResolvedFrom {
        self.resolved_from
    }

    /// Identifiers that were supplied at load time but matched nothing.
    pub fn resolution_misses(&self) -> &[ResolutionMiss] {
        &self.misses
    }

    pub fn next(&mut self) -> Result<Update> {
        self.apply(navigate::next)
    }

    pub fn previous(&mut self) -> Result<Update> {
        self.apply(navigate::previous)
    }

    pub fn go_to(&mut self, index: usize) -> Result<Update> {
        self.apply(|t| navigate::go_to(t, index))
    }

    pub fn toggle_solution(&mut self, show: bool) -> Result<Update> {
        self.apply(|t| navigate::toggle_solution(t, show))
    }

    pub fn show_solution(&mut self) -> Result<Update> {
        self.toggle_solution(true)
    }

    pub fn hide_solution(&mut self) -> Result<Update> {
        self.toggle_solution(false)
    }

    /// Return to the first step and forget the saved position.
    ///
    /// If the saved position cannot be cleared, the previous position is
    /// checked out and saved again.
    pub fn reset(&mut self) -> Result<Update> {
        let before = self.tutorial.cursor();
        let last_snapshot = self.last_snapshot.clone();
        let update = self.go_to(0)?;

        if let Err(err) = self.store.clear(self.tutorial.id()) {
            self.restore(before);
            self.last_snapshot = last_snapshot;
            let position = self.position();
            if let Err(save_err) = self.store.set(self.tutorial.id(), &position) {
                tracing::warn!(
                    error = %save_err,
                    "could not save the previous position after a failed reset"
                );
            }
            return Err(err);
        }
        Ok(update)
    }

    /// Files the solution changes relative to the active template.
    pub fn solution_diff(&self) -> Result<Vec<FileChange>> {
        let index = self.tutorial.active_step_index();
        let template = self.tutorial.active_step();
        if template.step_type != StepType::Template {
            return Err(Refusal::NotATemplate {
                index,
                step_type: template.step_type,
            }
            .into());
        }
        let solution = self
            .tutorial
            .solution_for(index)
            .ok_or(Refusal::MissingSolution { index })?;
        self.vcs.diff(&template.commit_hash, &solution.commit_hash)
    }

    fn apply<F>(&mut self, op: F) -> Result<Update>
    where
        F: FnOnce(&mut Tutorial) -> std::result::Result<Transition, Refusal>,
    {
        let before = self.tutorial.cursor();
        let transition = op(&mut self.tutorial)?;

        let view = match self.sync() {
            Ok(view) => view,
            Err(err) => {
                self.restore(before);
                return Err(err);
            }
        };

        let snapshot = view.snapshot();
        let change = change::detect(&snapshot, self.last_snapshot.as_ref());
        self.last_snapshot = Some(snapshot);

        tracing::debug!(tutorial = self.tutorial.id(), ?transition, ?change, "transition applied");
        Ok(Update {
            transition,
            change,
            view,
        })
    }

    fn sync(&mut self) -> Result<TutorialView> {
        let view = self.tutorial.view();
        self.vcs.checkout(&view.content_ref)?;
        let position = self.position();
        self.store.set(self.tutorial.id(), &position)?;
        Ok(view)
    }

    fn position(&self) -> SavedPosition {
        SavedPosition::new(self.tutorial.active_step().id.clone())
            .with_solution(self.tutorial.is_showing_solution())
    }

    fn restore(&mut self, cursor: Cursor) {
        self.tutorial.set_cursor(cursor);
        let content_ref = self.tutorial.view().content_ref;
        if let Err(err) = self.vcs.checkout(&content_ref) {
            tracing::warn!(
                commit = %content_ref,
                error = %err,
                "could not restore the working tree after a failed transition"
            );
        }
    }
}
