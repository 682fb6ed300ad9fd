use anyhow::{Context, Result};
use clap::ValueEnum;
use gitorial::{
    ExtractConfig, FileChange, GitorialError, LoadOptions, Refusal, ResolutionMiss, ResolvedFrom,
    TutorialSession, TutorialView, Update,
};
use gitorial_git::GitRepository;
use serde::Serialize;

use crate::RepoArgs;
use crate::state_store::JsonStateStore;

type Session = TutorialSession<GitRepository, JsonStateStore>;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionAction {
    /// Check out the solution of the current template step
    Show,
    /// Go back to the template
    Hide,
    /// List the files the solution changes
    Diff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOp {
    Open { at: Option<String> },
    Status,
    Next,
    Previous,
    /// 1-based step number.
    GoTo(usize),
    Solution(SolutionAction),
    Reset,
}

pub fn run(op: NavOp, args: &RepoArgs, json: bool) -> Result<()> {
    let target = match &op {
        NavOp::Open { at } => at.clone(),
        _ => None,
    };
    // Read-only commands leave the working tree and saved position alone.
    let checkout = !matches!(op, NavOp::Status | NavOp::Solution(SolutionAction::Diff));
    let mut session = open_session(args, target, checkout)?;

    let result = match op {
        NavOp::Open { .. } => return print_opened(&session, true, json),
        NavOp::Status => return print_opened(&session, false, json),
        NavOp::Solution(SolutionAction::Diff) => return run_diff(&session, json),
        NavOp::Next => session.next(),
        NavOp::Previous => session.previous(),
        NavOp::GoTo(step) => {
            let index = step.checked_sub(1).context("step numbers start at 1")?;
            session.go_to(index)
        }
        NavOp::Solution(SolutionAction::Show) => session.show_solution(),
        NavOp::Solution(SolutionAction::Hide) => session.hide_solution(),
        NavOp::Reset => session.reset(),
    };

    match result {
        Ok(update) => print_update(&update, json),
        Err(GitorialError::Refused(refusal)) => print_refusal(&refusal, &session.view(), json),
        Err(err) => Err(err).context("tutorial operation failed"),
    }
}

/// Load the tutorial in `args.repo`, checked out on the resolved step when
/// `checkout` is set.
pub fn open_session(args: &RepoArgs, target: Option<String>, checkout: bool) -> Result<Session> {
    let repo = args.open_repository()?;
    let branch = args.branch_for(&repo)?;
    let identity = gitorial_git::tutorial_identity(&repo, &args.remote);
    let store = JsonStateStore::new(args.state_path()?);

    tracing::debug!(
        tutorial = %identity.id,
        %branch,
        state = %store.path().display(),
        "opening tutorial"
    );

    let mut options = LoadOptions::new(identity.id, identity.title, repo.root(), branch)
        .with_extract_config(ExtractConfig::default().with_readme(args.readme.into()));
    if let Some(commit) = target {
        options = options.with_target_commit(commit);
    }
    if !checkout {
        options = options.without_checkout();
    }

    TutorialSession::load(repo, store, options).context("failed to open tutorial")
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenedReport<'a> {
    view: TutorialView,
    resolved_from: ResolvedFrom,
    misses: &'a [ResolutionMiss],
}

#[derive(Debug, Serialize)]
struct RefusedReport {
    refused: String,
    view: TutorialView,
}

fn print_opened(session: &Session, announce: bool, json: bool) -> Result<()> {
    let view = session.view();
    if json {
        let report = OpenedReport {
            view,
            resolved_from: session.resolved_from(),
            misses: session.resolution_misses(),
        };
        let out = serde_json::to_string_pretty(&report).context("failed to serialize view")?;
        println!("{out}");
        return Ok(());
    }

    println!("{}", render_view(&view));
    if announce {
        let from = match session.resolved_from() {
            ResolvedFrom::Explicit => "requested commit",
            ResolvedFrom::Persisted => "saved position",
            ResolvedFrom::Default => "first step",
        };
        println!("  opened at {from}");
    }
    Ok(())
}

fn print_update(update: &Update, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(update).context("failed to serialize update")?;
        println!("{out}");
    } else {
        println!("{}", render_view(&update.view));
    }
    Ok(())
}

fn print_refusal(refusal: &Refusal, view: &TutorialView, json: bool) -> Result<()> {
    let message = refusal_message(refusal);
    if json {
        let report = RefusedReport {
            refused: message,
            view: view.clone(),
        };
        let out = serde_json::to_string_pretty(&report).context("failed to serialize refusal")?;
        println!("{out}");
    } else {
        println!("{message}");
    }
    Ok(())
}

fn run_diff(session: &Session, json: bool) -> Result<()> {
    let changes = match session.solution_diff() {
        Ok(changes) => changes,
        Err(GitorialError::Refused(refusal)) => {
            return print_refusal(&refusal, &session.view(), json);
        }
        Err(err) => return Err(err).context("failed to diff solution"),
    };

    if json {
        let out = serde_json::to_string_pretty(&changes).context("failed to serialize diff")?;
        println!("{out}");
    } else {
        print!("{}", render_changes(&changes));
    }
    Ok(())
}

/// Step numbers are shown 1-based, so out-of-range targets are too.
fn refusal_message(refusal: &Refusal) -> String {
    match refusal {
        Refusal::OutOfRange { target, len } => {
            format!("there is no step {} (tutorial has {} steps)", target + 1, len)
        }
        other => other.to_string(),
    }
}

fn render_view(view: &TutorialView) -> String {
    let step = &view.active_step;
    let mut out = format!(
        "{}\nStep {}/{} [{}] {}\n  commit {}",
        view.tutorial_title,
        view.active_step_index + 1,
        view.total_steps,
        step.step_type,
        step.title,
        short(&step.commit_hash),
    );
    if view.showing_solution {
        out.push_str(&format!("\n  showing solution {}", short(&view.content_ref)));
    } else if view.has_solution {
        out.push_str("\n  solution available");
    }
    if view.is_last {
        out.push_str("\n  last step");
    }
    out
}

fn render_changes(changes: &[FileChange]) -> String {
    if changes.is_empty() {
        return "solution changes no files\n".to_string();
    }
    changes
        .iter()
        .map(|c| format!("{} {}\n", c.kind, c.path))
        .collect()
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitorial::{FileChangeKind, RawCommit, StepType, Tutorial, extract_steps};

    fn tutorial() -> Tutorial {
        let commits = vec![
            RawCommit::new("cccccccccccc", "solution: Add"),
            RawCommit::new("bbbbbbbbbbbb", "template: Add"),
            RawCommit::new("aaaaaaaaaaaa", "section: Intro"),
        ];
        let steps = extract_steps(&commits, &ExtractConfig::default());
        Tutorial::new("demo", "Demo", "/tmp/demo", steps).unwrap()
    }

    // ── render_view ──────────────────────────────────────────────────

    #[test]
    fn test_render_first_step() {
        let out = render_view(&tutorial().view());
        assert_eq!(out, "Demo\nStep 1/3 [section] Intro\n  commit aaaaaaaa");
    }

    #[test]
    fn test_render_template_with_solution() {
        let mut view = tutorial().view();
        view.active_step = gitorial::Step::new("bbbbbbbbbbbb", StepType::Template, "Add");
        view.active_step_index = 1;
        view.has_solution = true;
        view.is_last = true;

        let out = render_view(&view);
        assert!(out.contains("Step 2/3 [template] Add"));
        assert!(out.contains("solution available"));
        assert!(out.ends_with("last step"));

        view.showing_solution = true;
        view.content_ref = "cccccccccccc".into();
        let out = render_view(&view);
        assert!(out.contains("showing solution cccccccc"));
        assert!(!out.contains("solution available"));
    }

    // ── refusal_message ──────────────────────────────────────────────

    #[test]
    fn test_out_of_range_is_one_based() {
        let msg = refusal_message(&Refusal::OutOfRange { target: 4, len: 3 });
        assert_eq!(msg, "there is no step 5 (tutorial has 3 steps)");
    }

    #[test]
    fn test_other_refusals_use_display() {
        assert_eq!(refusal_message(&Refusal::AtLastStep), "already on the last step");
    }

    // ── render_changes ───────────────────────────────────────────────

    #[test]
    fn test_render_changes() {
        let changes = vec![
            FileChange {
                path: "src/lib.rs".into(),
                kind: FileChangeKind::Modified,
            },
            FileChange {
                path: "src/new.rs".into(),
                kind: FileChangeKind::Added,
            },
        ];
        assert_eq!(render_changes(&changes), "M src/lib.rs\nA src/new.rs\n");
        assert_eq!(render_changes(&[]), "solution changes no files\n");
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short("0123456789abcdef"), "01234567");
        assert_eq!(short("abc"), "abc");
    }
}
