//! Operations that shell out to the system `git` binary.
//!
//! Mutations (staging, committing) go through `git` so the user's hooks,
//! signing config and credential setup apply. The submodule summary diff has no
//! libgit2 equivalent and is read from `git diff --submodule=log`.

use std::process::Command;

use tracing::debug;

use super::Repo;
use crate::error::GitError;

/// Staged diff annotated with one `Submodule <path> <old>..<new>` line per
/// moved submodule pointer.
pub fn staged_submodule_summary(repo: &Repo) -> Result<String, GitError> {
    run_git(
        repo,
        &[
            "diff",
            "--cached",
            "--no-color",
            "--no-ext-diff",
            "--submodule=log",
        ],
    )
}

/// Stage every change in the working tree, like `git add -A`.
pub fn stage_all(repo: &Repo) -> Result<(), GitError> {
    run_git(repo, &["add", "-A"]).map(|_| ())
}

/// Create a commit from the current index with the given message.
pub fn commit(repo: &Repo, message: &str) -> Result<(), GitError> {
    run_git(repo, &["commit", "-m", message]).map(|_| ())
}

/// Run a git command inside `repo` and return its stdout.
///
/// The command runs with `-C <root>` so the process working directory is never
/// consulted, and with `LC_ALL=C` so the output shape does not depend on the
/// user's locale.
fn run_git(repo: &Repo, args: &[&str]) -> Result<String, GitError> {
    debug!("Running git {} in {}", args.join(" "), repo.root().display());

    let output = Command::new("git")
        .arg("-C")
        .arg(repo.root())
        .args(args)
        .env("LC_ALL", "C")
        .output()
        .map_err(GitError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed {
            command: args.first().copied().unwrap_or_default().to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
