//! Commit log queries rendered as `(short revision, subject)` pairs.

use git2::{Commit, Oid, Repository, Sort};
use serde::{Deserialize, Serialize};

use crate::error::GitError;

/// One line of commit history: abbreviated hash and subject line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub short_id: String,
    pub subject: String,
}

impl CommitSummary {
    /// Create a CommitSummary from a git2 Commit.
    pub fn from_git2_commit(commit: &Commit) -> Result<Self, GitError> {
        let short_id = commit
            .as_object()
            .short_id()
            .map_err(GitError::ParseCommit)?
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| commit.id().to_string());
        let subject = commit.summary().unwrap_or("").to_string();

        Ok(Self { short_id, subject })
    }
}

/// Fetch the most recent `limit` commits reachable from HEAD, newest first.
///
/// A repository without commits yields an empty list.
pub fn recent_commits(repo: &Repository, limit: usize) -> Result<Vec<CommitSummary>, GitError> {
    let head_oid = match repo.head().ok().and_then(|head| head.target()) {
        Some(oid) => oid,
        None => return Ok(Vec::new()),
    };

    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
        .map_err(GitError::RevwalkError)?;
    revwalk.push(head_oid).map_err(GitError::RevwalkError)?;

    let mut commits = Vec::with_capacity(limit);
    for oid_result in revwalk.take(limit) {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        commits.push(CommitSummary::from_git2_commit(&commit)?);
    }

    Ok(commits)
}

/// Fetch the commits reachable from `to_oid` but not from `from_oid`, oldest first.
pub fn commits_in_range(
    repo: &Repository,
    from_oid: Oid,
    to_oid: Oid,
) -> Result<Vec<CommitSummary>, GitError> {
    let mut revwalk = repo.revwalk().map_err(GitError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
        .map_err(GitError::RevwalkError)?;

    revwalk.push(to_oid).map_err(GitError::RevwalkError)?;
    revwalk.hide(from_oid).map_err(GitError::RevwalkError)?;

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(GitError::RevwalkError)?;
        let commit = repo.find_commit(oid).map_err(GitError::ParseCommit)?;
        commits.push(CommitSummary::from_git2_commit(&commit)?);
    }

    Ok(commits)
}
