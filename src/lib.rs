//! smart-commit - Generates commit messages for staged changes with a local model.
//!
//! # Overview
//!
//! smart-commit reads the staged changes of a git repository, follows every
//! staged submodule pointer move into the submodule's own history, and asks a
//! locally running Ollama model for a commit message built from all of it.

pub mod context;
pub mod error;
pub mod generation;
pub mod git;
pub mod pipeline;
pub mod prompt;
pub mod submodule;

// Re-export commonly used types
pub use context::{ChangeContext, SubmoduleHistorySummary, aggregate};
pub use error::{GenerationError, GitError, PipelineError, SubmoduleError};
pub use generation::{GenerationClient, OllamaCli};
pub use git::{CommitSummary, Repo, RepositoryIdentity, StagedChangeSet};
pub use pipeline::{Draft, PipelineOptions};
pub use prompt::{GenerationRequest, compose};
pub use submodule::{SubmodulePointerChange, parse_pointer_changes};
