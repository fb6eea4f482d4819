//! Read-only repository queries: identity, staged changes, working-tree state.

use std::fmt;
use std::path::Path;

use git2::{
    Delta, Diff, DiffFindOptions, DiffFormat, ErrorCode, Repository, Status, StatusOptions, Tree,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Repo;
use super::history::{CommitSummary, recent_commits};
use crate::error::GitError;

/// Number of recent commits included in the repository identity.
pub const RECENT_COMMIT_COUNT: usize = 3;

/// Repository name used when no `origin` remote is configured.
pub const UNKNOWN_REPOSITORY: &str = "unknown";

/// Branch name used when HEAD does not point at a branch.
pub const DETACHED_HEAD: &str = "detached";

/// Who and where we are: repository name, branch and a little recent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub name: String,
    pub branch: String,
    /// Newest first.
    pub recent_commits: Vec<CommitSummary>,
}

/// Status of a staged file, mirroring `git diff --name-status` letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
}

impl FileStatus {
    /// Single-letter status code as printed by `git diff --name-status`.
    pub fn code(&self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Modified => 'M',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
            FileStatus::TypeChanged => 'T',
            FileStatus::Unmerged => 'U',
        }
    }

    fn from_delta(delta: Delta) -> Option<Self> {
        match delta {
            Delta::Added => Some(FileStatus::Added),
            Delta::Modified => Some(FileStatus::Modified),
            Delta::Deleted => Some(FileStatus::Deleted),
            Delta::Renamed => Some(FileStatus::Renamed),
            Delta::Copied => Some(FileStatus::Copied),
            Delta::Typechange => Some(FileStatus::TypeChanged),
            Delta::Conflicted => Some(FileStatus::Unmerged),
            Delta::Unmodified
            | Delta::Ignored
            | Delta::Untracked
            | Delta::Unreadable => None,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    /// Old path for renamed or copied files.
    pub old_path: Option<String>,
}

impl fmt::Display for ChangedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old_path {
            Some(old) => write!(f, "{}\t{} -> {}", self.status, old, self.path),
            None => write!(f, "{}\t{}", self.status, self.path),
        }
    }
}

/// Everything staged in the index relative to HEAD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedChangeSet {
    pub files: Vec<ChangedFile>,
    pub diff_text: String,
}

impl StagedChangeSet {
    /// True when nothing at all is staged.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.diff_text.is_empty()
    }
}

/// Whether `path` lies inside a git working tree.
pub fn is_repository(path: &Path) -> bool {
    Repository::discover(path)
        .map(|repo| !repo.is_bare())
        .unwrap_or(false)
}

/// Gather the repository name, current branch and recent history.
pub fn identity(repo: &Repo) -> Result<RepositoryIdentity, GitError> {
    let git = repo.git2();

    let name = git
        .find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().and_then(repository_name_from_url))
        .unwrap_or_else(|| UNKNOWN_REPOSITORY.to_string());

    let branch = current_branch(git);
    let recent_commits = recent_commits(git, RECENT_COMMIT_COUNT)?;

    debug!(
        "Repository identity: {} on {} ({} recent commits)",
        name,
        branch,
        recent_commits.len()
    );

    Ok(RepositoryIdentity {
        name,
        branch,
        recent_commits,
    })
}

/// Derive a repository name from a remote URL.
///
/// Takes the last path segment and strips a trailing `.git`. Handles both
/// `https://host/owner/repo.git` and `git@host:owner/repo.git` forms.
pub fn repository_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit(['/', ':']).next()?;
    let name = segment.strip_suffix(".git").unwrap_or(segment);

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Current branch name, or [`DETACHED_HEAD`].
///
/// An unborn branch (no commits yet) still reports the branch HEAD points at.
fn current_branch(repo: &Repository) -> String {
    match repo.head() {
        Ok(head) if head.is_branch() => head
            .shorthand()
            .map(str::to_string)
            .unwrap_or_else(|| DETACHED_HEAD.to_string()),
        Ok(_) => DETACHED_HEAD.to_string(),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => repo
            .find_reference("HEAD")
            .ok()
            .and_then(|head| {
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DETACHED_HEAD.to_string()),
        Err(e) => {
            warn!("Could not read HEAD: {e}");
            DETACHED_HEAD.to_string()
        }
    }
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(GitError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect the staged (index vs HEAD) file list and unified diff text.
pub fn staged_changes(repo: &Repo) -> Result<StagedChangeSet, GitError> {
    let git = repo.git2();
    let head_tree = resolve_head_tree(git)?;

    let mut diff = git
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(GitError::DiffFailed)?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(GitError::DiffFailed)?;

    let files = collect_files_from_diff(&diff);
    let diff_text = render_patch(&diff)?;

    Ok(StagedChangeSet { files, diff_text })
}

/// Collect changed file entries from a diff, in diff order.
fn collect_files_from_diff(diff: &Diff<'_>) -> Vec<ChangedFile> {
    let mut files = Vec::new();

    for delta in diff.deltas() {
        let Some(status) = FileStatus::from_delta(delta.status()) else {
            continue;
        };

        let new_path = delta
            .new_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());
        let old_path = delta
            .old_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());

        let (path, old_path) = match status {
            FileStatus::Renamed | FileStatus::Copied => {
                let path = new_path
                    .clone()
                    .or_else(|| old_path.clone())
                    .unwrap_or_default();
                (path, old_path)
            }
            _ => (new_path.or(old_path).unwrap_or_default(), None),
        };

        if !path.is_empty() {
            files.push(ChangedFile {
                path,
                status,
                old_path,
            });
        }
    }

    files
}

/// Render a diff as unified patch text.
fn render_patch(diff: &Diff<'_>) -> Result<String, GitError> {
    let mut text = String::new();

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(GitError::DiffFailed)?;

    Ok(text)
}

/// Whether the working tree has unstaged or untracked changes.
pub fn has_unstaged_changes(repo: &Repo) -> bool {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true).exclude_submodules(false);

    let worktree_flags = Status::WT_NEW
        | Status::WT_MODIFIED
        | Status::WT_DELETED
        | Status::WT_RENAMED
        | Status::WT_TYPECHANGE;

    match repo.git2().statuses(Some(&mut opts)) {
        Ok(statuses) => statuses
            .iter()
            .any(|entry| entry.status().intersects(worktree_flags)),
        Err(e) => {
            warn!("Could not read working tree status: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn init_with_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let sig = Signature::now("Test", "test@test.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        repo
    }

    fn stage(repo: &Repository, path: &str) {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn test_file_status_codes() {
        assert_eq!(FileStatus::Added.to_string(), "A");
        assert_eq!(FileStatus::Modified.to_string(), "M");
        assert_eq!(FileStatus::Deleted.to_string(), "D");
        assert_eq!(FileStatus::Renamed.to_string(), "R");
        assert_eq!(FileStatus::TypeChanged.to_string(), "T");
    }

    #[test]
    fn test_changed_file_display() {
        let plain = ChangedFile {
            path: "src/lib.rs".to_string(),
            status: FileStatus::Modified,
            old_path: None,
        };
        assert_eq!(plain.to_string(), "M\tsrc/lib.rs");

        let renamed = ChangedFile {
            path: "new.rs".to_string(),
            status: FileStatus::Renamed,
            old_path: Some("old.rs".to_string()),
        };
        assert_eq!(renamed.to_string(), "R\told.rs -> new.rs");
    }

    #[test]
    fn test_repository_name_from_url() {
        assert_eq!(
            repository_name_from_url("https://github.com/owner/project.git").as_deref(),
            Some("project")
        );
        assert_eq!(
            repository_name_from_url("git@github.com:owner/project.git").as_deref(),
            Some("project")
        );
        assert_eq!(
            repository_name_from_url("git@host:project.git").as_deref(),
            Some("project")
        );
        assert_eq!(
            repository_name_from_url("https://example.com/owner/project/").as_deref(),
            Some("project")
        );
        assert_eq!(
            repository_name_from_url("/srv/git/plain").as_deref(),
            Some("plain")
        );
        assert_eq!(repository_name_from_url(""), None);
        assert_eq!(repository_name_from_url(".git"), None);
    }

    #[test]
    fn test_is_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_repository(dir.path()));

        Repository::init(dir.path()).unwrap();
        assert!(is_repository(dir.path()));

        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(is_repository(&nested));
    }

    #[test]
    fn test_is_repository_bare_is_false() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init_bare(dir.path()).unwrap();
        assert!(!is_repository(dir.path()));
    }

    #[test]
    fn test_identity_without_remote_or_commits() {
        let dir = tempfile::tempdir().unwrap();
        let git = Repository::init(dir.path()).unwrap();
        git.set_head("refs/heads/trunk").unwrap();

        let repo = Repo::open(dir.path()).unwrap();
        let id = identity(&repo).unwrap();
        assert_eq!(id.name, UNKNOWN_REPOSITORY);
        assert_eq!(id.branch, "trunk");
        assert!(id.recent_commits.is_empty());
    }

    #[test]
    fn test_identity_with_remote_and_branch() {
        let dir = tempfile::tempdir().unwrap();
        let git = init_with_commit(dir.path());
        git.remote("origin", "git@github.com:owner/widget.git")
            .unwrap();

        let repo = Repo::open(dir.path()).unwrap();
        let id = identity(&repo).unwrap();
        assert_eq!(id.name, "widget");
        assert_ne!(id.branch, DETACHED_HEAD);
        assert_eq!(id.recent_commits.len(), 1);
        assert_eq!(id.recent_commits[0].subject, "init");
    }

    #[test]
    fn test_identity_detached_head() {
        let dir = tempfile::tempdir().unwrap();
        let git = init_with_commit(dir.path());
        let head = git.head().unwrap().target().unwrap();
        git.set_head_detached(head).unwrap();

        let repo = Repo::open(dir.path()).unwrap();
        assert_eq!(identity(&repo).unwrap().branch, DETACHED_HEAD);
    }

    #[test]
    fn test_staged_changes_empty_when_nothing_staged() {
        let dir = tempfile::tempdir().unwrap();
        init_with_commit(dir.path());
        std::fs::write(dir.path().join("untracked.txt"), "hello\n").unwrap();

        let repo = Repo::open(dir.path()).unwrap();
        let changes = staged_changes(&repo).unwrap();
        assert!(changes.is_empty());
        assert!(has_unstaged_changes(&repo));
    }

    #[test]
    fn test_staged_changes_detects_added_file() {
        let dir = tempfile::tempdir().unwrap();
        let git = init_with_commit(dir.path());
        std::fs::write(dir.path().join("new.txt"), "hello world\n").unwrap();
        stage(&git, "new.txt");

        let repo = Repo::open(dir.path()).unwrap();
        let changes = staged_changes(&repo).unwrap();
        assert_eq!(changes.files.len(), 1);
        assert_eq!(changes.files[0].path, "new.txt");
        assert_eq!(changes.files[0].status, FileStatus::Added);
        assert!(changes.diff_text.contains("+hello world"));
    }

    #[test]
    fn test_staged_changes_ignores_unstaged_edits() {
        let dir = tempfile::tempdir().unwrap();
        let git = init_with_commit(dir.path());
        std::fs::write(dir.path().join("a.txt"), "staged\n").unwrap();
        stage(&git, "a.txt");
        std::fs::write(dir.path().join("b.txt"), "not staged\n").unwrap();

        let repo = Repo::open(dir.path()).unwrap();
        let changes = staged_changes(&repo).unwrap();
        let paths: Vec<&str> = changes.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt"]);
        assert!(!changes.diff_text.contains("not staged"));
    }

    #[test]
    fn test_staged_changes_on_unborn_branch() {
        let dir = tempfile::tempdir().unwrap();
        let git = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("first.txt"), "first\n").unwrap();
        stage(&git, "first.txt");

        let repo = Repo::open(dir.path()).unwrap();
        let changes = staged_changes(&repo).unwrap();
        assert!(changes.files.iter().any(|f| f.path == "first.txt"));
    }

    #[test]
    fn test_staged_changes_corrupt_head_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        init_with_commit(dir.path());

        // Corrupt HEAD by pointing it to a non-existent ref
        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/\0invalid").unwrap();

        let repo = Repo::open(dir.path()).unwrap();
        let result = staged_changes(&repo);
        assert!(
            matches!(result, Err(GitError::DiffFailed(_))),
            "Expected DiffFailed for corrupt HEAD, got: {:?}",
            result
        );
    }
}
