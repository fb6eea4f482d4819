//! Resolution of the commits spanned by a submodule pointer move.

use git2::Oid;
use tracing::debug;

use super::parser::SubmodulePointerChange;
use crate::error::{GitError, SubmoduleError};
use crate::git::{CommitSummary, Repo, commits_in_range};

/// Source of submodule history, one pointer change at a time.
///
/// This abstraction lets the aggregator be exercised without real nested
/// repositories on disk.
pub trait HistoryResolver {
    /// Commits reachable from `change.new_revision` but not from
    /// `change.old_revision`, oldest first.
    fn resolve(&self, change: &SubmodulePointerChange)
    -> Result<Vec<CommitSummary>, SubmoduleError>;
}

/// Resolves submodule history by opening each submodule as its own repository
/// beneath the parent working tree.
pub struct SubmoduleHistoryResolver<'a> {
    parent: &'a Repo,
}

impl<'a> SubmoduleHistoryResolver<'a> {
    pub fn new(parent: &'a Repo) -> Self {
        Self { parent }
    }
}

impl HistoryResolver for SubmoduleHistoryResolver<'_> {
    fn resolve(
        &self,
        change: &SubmodulePointerChange,
    ) -> Result<Vec<CommitSummary>, SubmoduleError> {
        if change.is_noop() {
            return Ok(Vec::new());
        }

        let nested_path = self.parent.root().join(&change.path);
        if !nested_path.is_dir() {
            return Err(SubmoduleError::MissingPath(change.path.clone()));
        }

        // `Repo::open` never walks up, so an uninitialised submodule directory
        // is reported instead of silently resolving against the parent.
        let nested = Repo::open(&nested_path).map_err(|e| match e {
            GitError::OpenRepository { source, .. } => {
                SubmoduleError::NotARepository {
                    path: change.path.clone(),
                    source,
                }
            }
            other => SubmoduleError::History {
                path: change.path.clone(),
                source: other,
            },
        })?;

        let old = resolve_revision(&nested, &change.path, &change.old_revision)?;
        let new = resolve_revision(&nested, &change.path, &change.new_revision)?;

        let commits =
            commits_in_range(nested.git2(), old, new).map_err(|source| SubmoduleError::History {
                path: change.path.clone(),
                source,
            })?;

        debug!(
            "Submodule {}: {} commits in {}..{}",
            change.path,
            commits.len(),
            change.old_revision,
            change.new_revision
        );

        Ok(commits)
    }
}

/// Resolve a (possibly abbreviated) revision to a commit id.
fn resolve_revision(repo: &Repo, path: &str, revision: &str) -> Result<Oid, SubmoduleError> {
    repo.git2()
        .revparse_single(revision)
        .and_then(|obj| obj.peel_to_commit())
        .map(|commit| commit.id())
        .map_err(|source| SubmoduleError::UnknownRevision {
            path: path.to_string(),
            revision: revision.to_string(),
            source,
        })
}
