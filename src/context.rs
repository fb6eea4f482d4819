//! The change context: everything the prompt is built from, gathered once per run.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::git::{CommitSummary, RepositoryIdentity, StagedChangeSet};
use crate::submodule::{HistoryResolver, SubmodulePointerChange};

/// Commits a submodule pointer move brought in, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmoduleHistorySummary {
    pub path: String,
    pub old_revision: String,
    pub new_revision: String,
    pub commits: Vec<CommitSummary>,
}

/// Aggregated, immutable view of one staged change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeContext {
    pub identity: RepositoryIdentity,
    pub changes: StagedChangeSet,
    /// In the order the pointer changes appeared in the diff.
    pub submodules: Vec<SubmoduleHistorySummary>,
    /// Notes about submodules whose history could not be resolved.
    pub advisories: Vec<String>,
}

/// Build the change context, resolving each pointer change in order.
///
/// A submodule whose history cannot be resolved gets an empty summary and an
/// advisory note; it never fails the aggregation.
pub fn aggregate<R: HistoryResolver + ?Sized>(
    identity: RepositoryIdentity,
    changes: StagedChangeSet,
    pointer_changes: &[SubmodulePointerChange],
    resolver: &R,
) -> ChangeContext {
    let mut submodules = Vec::with_capacity(pointer_changes.len());
    let mut advisories = Vec::new();

    for change in pointer_changes {
        let commits = match resolver.resolve(change) {
            Ok(commits) => commits,
            Err(e) => {
                warn!("Skipping submodule history: {e}");
                advisories.push(e.to_string());
                Vec::new()
            }
        };

        submodules.push(SubmoduleHistorySummary {
            path: change.path.clone(),
            old_revision: change.old_revision.clone(),
            new_revision: change.new_revision.clone(),
            commits,
        });
    }

    ChangeContext {
        identity,
        changes,
        submodules,
        advisories,
    }
}
