#![doc = include_str!("../README.md")]

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use git2::{BranchType, Commit, Delta, Oid, Repository};
use gitorial::{FileChange, FileChangeKind, GitorialError, RawCommit, VersionControl};
use std::path::{Path, PathBuf};

/// Branch names tried, in order, when no branch is given.
pub const TUTORIAL_BRANCHES: &[&str] = &["gitorial", "origin/gitorial"];

// ============================================================================
// Repository adapter
// ============================================================================

/// A git repository exposed through [`VersionControl`].
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open the repository at `path` (no upward discovery).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("Failed to open repository at {:?}", path))?;
        Ok(Self { repo })
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Working directory root, or the `.git` directory's parent for bare layouts.
    pub fn root(&self) -> PathBuf {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .or_else(|| self.repo.path().parent().map(Path::to_path_buf))
            .unwrap_or_else(|| self.repo.path().to_path_buf())
    }
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl VersionControl for GitRepository {
    fn list_commits(&self, branch: &str) -> gitorial::Result<Vec<RawCommit>> {
        list_commits(&self.repo, branch).map_err(vcs_error)
    }

    fn checkout(&self, reference: &str) -> gitorial::Result<()> {
        checkout(&self.repo, reference).map_err(vcs_error)
    }

    fn diff(&self, from: &str, to: &str) -> gitorial::Result<Vec<FileChange>> {
        diff(&self.repo, from, to).map_err(vcs_error)
    }
}

fn vcs_error(err: anyhow::Error) -> GitorialError {
    GitorialError::VersionControl(format!("{:#}", err))
}

// ============================================================================
// Public API
// ============================================================================

/// Commits on `branch`, newest first, following first parents only.
///
/// `branch` is any revision expression git understands (`gitorial`,
/// `origin/gitorial`, `HEAD`, a hash).
pub fn list_commits(repo: &Repository, branch: &str) -> Result<Vec<RawCommit>> {
    let tip = resolve_commit(repo, branch)?;

    let mut walker = repo.revwalk()?;
    walker.push(tip.id())?;
    walker.simplify_first_parent()?;
    walker.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

    let mut commits = Vec::new();
    for oid_result in walker {
        let oid = oid_result?;
        let commit = repo.find_commit(oid)?;
        commits.push(to_raw_commit(&commit));
    }

    tracing::debug!(branch, count = commits.len(), "listed commits");
    Ok(commits)
}

/// Force the working tree to `reference` and detach HEAD there.
///
/// Uncommitted changes in the working tree are overwritten.
pub fn checkout(repo: &Repository, reference: &str) -> Result<()> {
    let commit = resolve_commit(repo, reference)?;

    let mut opts = git2::build::CheckoutBuilder::new();
    opts.force();
    repo.checkout_tree(commit.as_object(), Some(&mut opts))
        .with_context(|| format!("Failed to check out '{}'", reference))?;
    repo.set_head_detached(commit.id())?;

    tracing::debug!(commit = %short_oid(commit.id()), "checked out");
    Ok(())
}

/// Files that differ between the trees of `from` and `to`.
pub fn diff(repo: &Repository, from: &str, to: &str) -> Result<Vec<FileChange>> {
    let old_tree = resolve_commit(repo, from)?.tree()?;
    let new_tree = resolve_commit(repo, to)?.tree()?;

    let mut diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
    diff.find_similar(None)?;

    let mut changes = Vec::new();
    for delta in diff.deltas() {
        let kind = match delta.status() {
            Delta::Added | Delta::Copied | Delta::Untracked => FileChangeKind::Added,
            Delta::Deleted => FileChangeKind::Deleted,
            Delta::Renamed => FileChangeKind::Renamed,
            Delta::Modified | Delta::Typechange => FileChangeKind::Modified,
            _ => continue,
        };
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string());
        if let Some(path) = path {
            changes.push(FileChange { path, kind });
        }
    }

    changes.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(changes)
}

/// Find the branch that holds the tutorial, trying [`TUTORIAL_BRANCHES`].
pub fn detect_tutorial_branch(repo: &Repository) -> Option<String> {
    TUTORIAL_BRANCHES
        .iter()
        .find(|name| resolve_commit(repo, name).is_ok())
        .map(|name| name.to_string())
}

/// Name the branch HEAD belongs to, for repositories without a tutorial branch.
///
/// An attached HEAD names its branch. A detached HEAD, such as the one
/// [`checkout`] leaves behind, resolves to the single local branch whose
/// history contains it.
pub fn head_branch(repo: &Repository) -> Result<String> {
    let head = repo.head().context("Repository has no HEAD")?;
    if !repo.head_detached()? {
        return head
            .shorthand()
            .map(str::to_string)
            .context("HEAD branch name is not valid UTF-8");
    }

    let head_oid = head.target().context("HEAD does not point at a commit")?;
    let mut candidates = Vec::new();
    for branch_result in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch_result?;
        let Some(tip) = branch.get().target() else {
            continue;
        };
        if (tip == head_oid || repo.graph_descendant_of(tip, head_oid)?)
            && let Some(name) = branch.name()?
        {
            candidates.push(name.to_string());
        }
    }

    match candidates.as_slice() {
        [name] => Ok(name.clone()),
        [] => bail!("HEAD is detached and no local branch contains it; pass --branch"),
        _ => bail!(
            "HEAD is detached and several branches contain it ({}); pass --branch",
            candidates.join(", ")
        ),
    }
}

/// Stable id and display title for the tutorial in `repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialIdentity {
    pub id: String,
    pub title: String,
}

/// Derive the tutorial id and title from `remote`'s URL, falling back to the
/// working directory name.
pub fn tutorial_identity(repo: &GitRepository, remote: &str) -> TutorialIdentity {
    if let Ok(remote) = repo.repository().find_remote(remote)
        && let Some(url) = remote.url()
    {
        let normalized = normalize_git_url(url);
        return TutorialIdentity {
            id: sanitize_id(&normalized),
            title: repo_name(&normalized),
        };
    }

    let root = repo.root();
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "tutorial".to_string());
    TutorialIdentity {
        id: sanitize_id(&name),
        title: name,
    }
}

/// Normalize a git remote URL to a canonical short form.
///
/// # Examples
///
/// ```
/// use gitorial_git::normalize_git_url;
///
/// assert_eq!(normalize_git_url("git@github.com:org/repo.git"), "github:org/repo");
/// assert_eq!(normalize_git_url("https://gitlab.com/org/repo"), "gitlab:org/repo");
/// assert_eq!(
///     normalize_git_url("https://bitbucket.org/org/repo"),
///     "https://bitbucket.org/org/repo",
/// );
/// ```
pub fn normalize_git_url(url: &str) -> String {
    const HOSTS: &[(&str, &str)] = &[
        ("git@github.com:", "github"),
        ("https://github.com/", "github"),
        ("git@gitlab.com:", "gitlab"),
        ("https://gitlab.com/", "gitlab"),
    ];

    for (prefix, short) in HOSTS {
        if let Some(rest) = url.strip_prefix(prefix) {
            return format!("{}:{}", short, rest.trim_end_matches(".git"));
        }
    }

    url.to_string()
}

/// Lower-case `s` and collapse every run of non-alphanumerics into one `-`.
///
/// # Examples
///
/// ```
/// use gitorial_git::sanitize_id;
///
/// assert_eq!(sanitize_id("github:org/Rust_Tutorial"), "github-org-rust-tutorial");
/// assert_eq!(sanitize_id("..weird..name.."), "weird-name");
/// ```
pub fn sanitize_id(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

// ============================================================================
// Listing / discovery
// ============================================================================

/// Summary information about a branch.
#[derive(Debug, Clone)]
pub struct BranchInfo {
    /// Branch name (e.g., "gitorial", "origin/gitorial").
    pub name: String,
    pub is_remote: bool,
    /// Short (8-char) hex of the tip commit.
    pub head_short: String,
    pub head: String,
    /// First line of the tip commit message.
    pub subject: String,
    pub author: String,
    /// ISO 8601 timestamp of the tip commit.
    pub timestamp: String,
    /// Whether the tip commit carries a step tag.
    pub tagged: bool,
}

/// List local and remote-tracking branches with summary metadata.
pub fn list_branches(repo: &Repository) -> Result<Vec<BranchInfo>> {
    let mut branches = Vec::new();

    for branch_result in repo.branches(None)? {
        let (branch, branch_type) = branch_result?;
        let name = branch.name()?.unwrap_or("<invalid utf-8>").to_string();
        if name.ends_with("/HEAD") {
            continue;
        }

        let commit = branch.get().peel_to_commit()?;
        let raw = to_raw_commit(&commit);

        branches.push(BranchInfo {
            name,
            is_remote: branch_type == git2::BranchType::Remote,
            head_short: short_oid(commit.id()),
            head: raw.hash.clone(),
            subject: raw.subject().to_string(),
            tagged: gitorial::extract::parse_message(&raw.message).is_some(),
            author: raw.author,
            timestamp: raw.date.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        });
    }

    branches.sort_by(|a, b| (a.is_remote, &a.name).cmp(&(b.is_remote, &b.name)));
    Ok(branches)
}

// ============================================================================
// Private helpers
// ============================================================================

fn resolve_commit<'a>(repo: &'a Repository, spec: &str) -> Result<Commit<'a>> {
    let obj = repo
        .revparse_single(spec)
        .with_context(|| format!("Failed to resolve '{}'", spec))?;
    obj.peel_to_commit()
        .with_context(|| format!("'{}' does not point at a commit", spec))
}

fn to_raw_commit(commit: &Commit) -> RawCommit {
    let author = commit.author();
    let date = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0).unwrap_or_default();

    RawCommit {
        hash: commit.id().to_string(),
        message: commit.message().unwrap_or("").to_string(),
        date,
        author: author.name().unwrap_or("unknown").to_string(),
        author_email: author.email().map(str::to_string),
    }
}

fn repo_name(normalized: &str) -> String {
    normalized
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(normalized)
        .trim_end_matches(".git")
        .to_string()
}

fn short_oid(oid: Oid) -> String {
    oid.to_string().chars().take(8).collect()
}
