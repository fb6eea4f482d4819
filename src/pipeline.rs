//! End-to-end run: probe, parse, resolve, aggregate, compose, generate.
//!
//! Every stage runs once, in order, and each is awaited before the next one
//! starts. Only the preconditions and a failure to read the primary staged
//! diff abort the run; everything downstream degrades instead.

use std::path::Path;

use tracing::{debug, warn};

use crate::context::{ChangeContext, aggregate};
use crate::error::{GenerationError, PipelineError};
use crate::generation::{GenerationClient, fallback_message};
use crate::git::{self, Repo};
use crate::prompt::{GenerationRequest, compose};
use crate::submodule::{SubmoduleHistoryResolver, parse_pointer_changes};

/// Model used when none is given on the command line.
pub const DEFAULT_MODEL: &str = "mistral-nemo";

/// Options for a single pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub model: String,
    /// Stage every working-tree change before reading the index.
    pub stage_all: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            stage_all: false,
        }
    }
}

/// Result of a run: the context, the request built from it, and the message.
///
/// When generation failed `message` holds fallback text and `failure` holds
/// the reason; such a draft must never be committed.
#[derive(Debug)]
pub struct Draft {
    pub context: ChangeContext,
    pub request: GenerationRequest,
    pub message: String,
    pub failure: Option<GenerationError>,
}

impl Draft {
    /// Whether the message came from the backend and may be committed.
    pub fn is_generated(&self) -> bool {
        self.failure.is_none()
    }
}

/// The change context and the request composed from it, ready to send.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub context: ChangeContext,
    pub request: GenerationRequest,
}

/// Run the pipeline for the repository containing `workdir`.
pub async fn run<C: GenerationClient + ?Sized>(
    workdir: &Path,
    client: &C,
    options: &PipelineOptions,
) -> Result<Draft, PipelineError> {
    let prepared = prepare(workdir, options)?;
    Ok(generate(prepared, client).await)
}

/// Check preconditions, then gather everything the prompt is built from.
///
/// Never touches the generation backend.
pub fn prepare(workdir: &Path, options: &PipelineOptions) -> Result<Prepared, PipelineError> {
    if !git::is_repository(workdir) {
        return Err(PipelineError::NotARepository(workdir.to_path_buf()));
    }
    let repo = Repo::discover(workdir)?;

    if options.stage_all {
        git::stage_all(&repo).map_err(PipelineError::StagingFailed)?;
    }

    let changes = git::staged_changes(&repo)?;
    if changes.is_empty() {
        return Err(PipelineError::NothingStaged {
            has_unstaged: git::has_unstaged_changes(&repo),
        });
    }
    debug!("{} staged files", changes.files.len());

    let identity = git::identity(&repo)?;

    let summary = match git::staged_submodule_summary(&repo) {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not read submodule summary, assuming no submodule changes: {e}");
            String::new()
        }
    };
    let pointer_changes = parse_pointer_changes(&summary);
    debug!("{} submodule pointer changes", pointer_changes.len());

    let resolver = SubmoduleHistoryResolver::new(&repo);
    let context = aggregate(identity, changes, &pointer_changes, &resolver);
    let request = compose(&context, &options.model);

    Ok(Prepared { context, request })
}

/// Send the prepared request once; a backend failure becomes fallback text.
pub async fn generate<C: GenerationClient + ?Sized>(prepared: Prepared, client: &C) -> Draft {
    let Prepared { context, request } = prepared;

    let (message, failure) = match client.generate(&request).await {
        Ok(message) => (message, None),
        Err(e) => {
            warn!("Generation failed: {e}");
            (fallback_message(&e), Some(e))
        }
    };

    Draft {
        context,
        request,
        message,
        failure,
    }
}

/// Whether rerunning with `stage_all` would find something to summarize.
pub fn can_stage_all_and_retry(error: &PipelineError, options: &PipelineOptions) -> bool {
    matches!(error, PipelineError::NothingStaged { has_unstaged: true }) && !options.stage_all
}
