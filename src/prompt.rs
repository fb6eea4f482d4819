//! Prompt construction for commit message generation.

use std::fmt::Write as _;

use serde::Serialize;

use crate::context::{ChangeContext, SubmoduleHistorySummary};

/// Version of [`INSTRUCTIONS`]. Bump whenever the rules change.
pub const INSTRUCTIONS_VERSION: u32 = 1;

/// Authoring rules appended to every prompt.
pub const INSTRUCTIONS: &str = r#"## Commit Message Rules
1. Use the present tense ("add caching", not "added caching").
2. The first line is a short summary of at most 50 characters.
3. Leave exactly one blank line between the summary and the body.
4. The body explains why the change was made, not how it was made.
5. Reference any related issue or ticket identifiers that can be inferred from the changes.

Respond with ONLY the commit message, no preamble and no explanation."#;

const PREAMBLE: &str = "You are writing a professional Git commit message for the staged changes below, following established best practices.";

/// A backend-agnostic request for the text-generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
}

/// Render the change context into a generation request.
///
/// Layout is fixed: preamble, repository, staged changes, one block per
/// submodule update, then [`INSTRUCTIONS`]. Diff text is included verbatim.
pub fn compose(context: &ChangeContext, model: &str) -> GenerationRequest {
    let mut prompt = String::new();

    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\n");

    prompt.push_str(&render_identity(context));
    prompt.push('\n');

    prompt.push_str(&render_changes(context));
    prompt.push('\n');

    if !context.submodules.is_empty() {
        prompt.push_str("## Submodule Updates\n");
        for summary in &context.submodules {
            prompt.push_str(&render_submodule(summary));
        }
        prompt.push('\n');
    }

    prompt.push_str(INSTRUCTIONS);
    prompt.push('\n');

    GenerationRequest {
        model: model.to_string(),
        prompt,
    }
}

fn render_identity(context: &ChangeContext) -> String {
    let identity = &context.identity;
    let mut out = String::new();

    let _ = writeln!(out, "## Repository");
    let _ = writeln!(out, "Repository: {}", identity.name);
    let _ = writeln!(out, "Branch: {}", identity.branch);
    let _ = writeln!(out, "Recent commits:");
    if identity.recent_commits.is_empty() {
        let _ = writeln!(out, "(no commits yet)");
    }
    for commit in &identity.recent_commits {
        let _ = writeln!(out, "- {} {}", commit.short_id, commit.subject);
    }

    out
}

fn render_changes(context: &ChangeContext) -> String {
    let changes = &context.changes;
    let mut out = String::new();

    let _ = writeln!(out, "## Staged Files");
    for file in &changes.files {
        let _ = writeln!(out, "{file}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Staged Diff");
    out.push_str(&changes.diff_text);
    if !changes.diff_text.ends_with('\n') {
        out.push('\n');
    }

    out
}

fn render_submodule(summary: &SubmoduleHistorySummary) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "### {} ({}..{})",
        summary.path, summary.old_revision, summary.new_revision
    );
    if summary.commits.is_empty() {
        let _ = writeln!(out, "(no new commits in this range)");
    }
    for commit in &summary.commits {
        let _ = writeln!(out, "- {} {}", commit.short_id, commit.subject);
    }

    out
}
