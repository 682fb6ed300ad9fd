use anyhow::{Context, Result};
use gitorial::{ExtractConfig, StateStore, Step, StepType, extract_steps};
use serde::Serialize;

use crate::RepoArgs;
use crate::state_store::JsonStateStore;

#[derive(Debug, Serialize)]
struct BranchSummary {
    name: String,
    is_remote: bool,
    head: String,
    subject: String,
    author: String,
    timestamp: String,
    tagged: bool,
    tutorial: bool,
}

pub fn run_branches(args: &RepoArgs, json: bool) -> Result<()> {
    let repo = args.open_repository()?;
    let detected = gitorial_git::detect_tutorial_branch(repo.repository());
    let branches = gitorial_git::list_branches(repo.repository())?;

    let summaries: Vec<BranchSummary> = branches
        .into_iter()
        .map(|b| BranchSummary {
            tutorial: detected.as_deref() == Some(b.name.as_str()),
            name: b.name,
            is_remote: b.is_remote,
            head: b.head,
            subject: b.subject,
            author: b.author,
            timestamp: b.timestamp,
            tagged: b.tagged,
        })
        .collect();

    if json {
        let out =
            serde_json::to_string_pretty(&summaries).context("failed to serialize branch list")?;
        println!("{out}");
    } else if summaries.is_empty() {
        println!("No branches.");
    } else {
        for b in &summaries {
            let marker = if b.tutorial { '*' } else { ' ' };
            println!(
                "{} {} | {} | {}",
                marker,
                b.name,
                &b.head[..b.head.len().min(8)],
                b.subject
            );
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct StepListing<'a> {
    branch: &'a str,
    saved_step: Option<&'a str>,
    steps: &'a [Step],
}

pub fn run_steps(args: &RepoArgs, json: bool) -> Result<()> {
    let repo = args.open_repository()?;
    let branch = args.branch_for(&repo)?;
    let commits = gitorial_git::list_commits(repo.repository(), &branch)?;
    let config = ExtractConfig::default().with_readme(args.readme.into());
    let steps = extract_steps(&commits, &config);

    let identity = gitorial_git::tutorial_identity(&repo, &args.remote);
    let saved = JsonStateStore::new(args.state_path()?)
        .get(&identity.id)
        .context("failed to read saved position")?
        .map(|position| position.step_id);

    if json {
        let listing = StepListing {
            branch: &branch,
            saved_step: saved.as_deref(),
            steps: &steps,
        };
        let out =
            serde_json::to_string_pretty(&listing).context("failed to serialize step list")?;
        println!("{out}");
    } else if steps.is_empty() {
        println!("No tutorial steps on {branch}.");
    } else {
        for step in &steps {
            println!("{}", render_step(step, saved.as_deref()));
        }
    }
    Ok(())
}

fn render_step(step: &Step, saved: Option<&str>) -> String {
    let marker = if saved == Some(step.id.as_str()) {
        '>'
    } else {
        ' '
    };
    let indent = match step.step_type {
        StepType::Solution | StepType::Readme => "  ",
        _ => "",
    };
    format!(
        "{}{:>3}  {}{:<8} {}  {}",
        marker,
        step.index + 1,
        indent,
        step.step_type.as_str(),
        &step.commit_hash[..step.commit_hash.len().min(8)],
        step.title
    )
}
