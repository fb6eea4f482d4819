//! Error types for smart-commit modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Repository at {0} has no working directory")]
    BareRepository(PathBuf),

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("Failed to parse commit: {0}")]
    ParseCommit(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to spawn git: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git {command} exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Errors from resolving the history of a single submodule pointer change.
///
/// All of these are recoverable: the affected submodule gets an empty summary.
#[derive(Error, Debug)]
pub enum SubmoduleError {
    #[error("Submodule directory {0} does not exist")]
    MissingPath(String),

    #[error("Submodule {path} is not a git repository: {source}")]
    NotARepository {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Submodule {path}: cannot resolve revision {revision}: {source}")]
    UnknownRevision {
        path: String,
        revision: String,
        #[source]
        source: git2::Error,
    },

    #[error("Submodule {path}: {source}")]
    History {
        path: String,
        #[source]
        source: GitError,
    },
}

/// Errors from the text-generation backend.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{0} command not found. Install Ollama from https://github.com/ollama/ollama")]
    NotInstalled(String),

    #[error("Failed to spawn generation backend: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to send prompt to generation backend: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Generation backend timed out after {0} seconds")]
    Timeout(u64),

    #[error("Generation backend exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Generation backend returned no output")]
    EmptyResponse,
}

/// Errors that abort a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} is not inside a git repository", .0.display())]
    NotARepository(PathBuf),

    #[error("No staged changes to summarize{}", nothing_staged_hint(.has_unstaged))]
    NothingStaged { has_unstaged: bool },

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] GitError),

    #[error(transparent)]
    Git(#[from] GitError),
}

fn nothing_staged_hint(has_unstaged: &bool) -> &'static str {
    if *has_unstaged {
        ". Unstaged changes were found: stage them with 'git add <path>' or rerun with --all"
    } else {
        ""
    }
}
