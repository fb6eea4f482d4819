//! Git operations: `git2` for read-only queries, the `git` binary for mutations
//! and for the submodule summary diff.

pub mod cli;
pub mod history;
pub mod probe;

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::error::GitError;

pub use cli::{commit, stage_all, staged_submodule_summary};
pub use history::{CommitSummary, commits_in_range, recent_commits};
pub use probe::{
    ChangedFile, FileStatus, RepositoryIdentity, StagedChangeSet, has_unstaged_changes, identity,
    is_repository, staged_changes,
};

/// A repository handle that carries its own working-tree root.
///
/// Every query takes a `Repo` explicitly, so nested repositories are addressed
/// by opening another handle rather than by changing the process directory.
pub struct Repo {
    root: PathBuf,
    inner: Repository,
}

impl Repo {
    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let inner = Repository::discover(path).map_err(|source| GitError::OpenRepository {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_git2(inner, path)
    }

    /// Open the repository rooted exactly at `path`.
    ///
    /// Unlike [`Repo::discover`] this never falls back to an enclosing
    /// repository, which matters for submodule directories that were never
    /// initialised.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let inner = Repository::open(path).map_err(|source| GitError::OpenRepository {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_git2(inner, path)
    }

    fn from_git2(inner: Repository, path: &Path) -> Result<Self, GitError> {
        let root = inner
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::BareRepository(path.to_path_buf()))?;
        Ok(Self { root, inner })
    }

    /// Working-tree root of this repository.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The underlying `git2` repository.
    pub fn git2(&self) -> &Repository {
        &self.inner
    }
}
