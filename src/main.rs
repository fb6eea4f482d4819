//! smart-commit - CLI entry point.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use dialoguer::Confirm;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use smart_commit::generation::OllamaCli;
use smart_commit::git::{self, Repo};
use smart_commit::pipeline::{self, DEFAULT_MODEL, Draft, PipelineOptions};

/// Draft commit messages for staged changes with a local Ollama model.
#[derive(Parser, Debug)]
#[command(name = "smart-commit")]
#[command(about = "Draft commit messages for staged changes with a local Ollama model")]
#[command(version)]
struct Cli {
    /// Generate a commit message and print it
    #[arg(short = 'g', long)]
    generate: bool,

    /// Generate a commit message and commit with it
    #[arg(short = 'c', long)]
    commit: bool,

    /// Ollama model to use
    #[arg(short = 'm', long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Stage all changes (git add -A) before generating
    #[arg(short = 'a', long)]
    all: bool,

    /// Commit without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print the aggregated change context as JSON
    #[arg(long)]
    show_context: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.generate && !cli.commit {
        Cli::command().print_help()?;
        return Ok(());
    }

    let workdir = std::env::current_dir().context("Failed to read current directory")?;
    let mut options = PipelineOptions {
        model: cli.model.clone(),
        stage_all: cli.all,
    };

    let prepared = match pipeline::prepare(&workdir, &options) {
        Ok(prepared) => prepared,
        Err(e) if pipeline::can_stage_all_and_retry(&e, &options) && offer_stage_all(cli.yes)? => {
            options.stage_all = true;
            pipeline::prepare(&workdir, &options)?
        }
        Err(e) => return Err(e.into()),
    };

    let client = OllamaCli::from_env();
    eprintln!("Generating commit message with {}...", options.model);
    let draft = pipeline::generate(prepared, &client).await;

    report_context(&draft);
    if cli.show_context {
        let json = serde_json::to_string_pretty(&draft.context)
            .context("Failed to serialize change context")?;
        eprintln!("{json}");
    }

    println!("{}", draft.message);

    if !cli.commit {
        return Ok(());
    }

    if !draft.is_generated() {
        eprintln!("Skipping commit: no message was generated.");
        return Ok(());
    }

    commit_draft(&workdir, &draft, cli.yes)
}

/// Initialise tracing on stderr; `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Offer to stage every change when the index is clean but the tree is dirty.
fn offer_stage_all(skip_confirm: bool) -> Result<bool> {
    if skip_confirm {
        return Ok(false);
    }

    Confirm::new()
        .with_prompt("Nothing is staged. Stage all changes and continue?")
        .default(true)
        .interact()
        .context("Failed to read confirmation")
}

/// Print detected submodule updates and any advisories to stderr.
fn report_context(draft: &Draft) {
    for summary in &draft.context.submodules {
        eprintln!(
            "Submodule {} {}..{} ({} commits)",
            summary.path,
            summary.old_revision,
            summary.new_revision,
            summary.commits.len()
        );
    }
    for advisory in &draft.context.advisories {
        eprintln!("Warning: {advisory}");
    }
}

/// Ask for confirmation, then commit the staged changes with the draft message.
fn commit_draft(workdir: &Path, draft: &Draft, skip_confirm: bool) -> Result<()> {
    if !skip_confirm {
        println!();
        let confirmed = Confirm::new()
            .with_prompt("Commit with this message?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;

        if !confirmed {
            eprintln!("Commit cancelled.");
            return Ok(());
        }
    }

    let repo = Repo::discover(workdir)?;
    git::commit(&repo, &draft.message).context("Failed to create commit")?;
    println!("✓ Committed");

    Ok(())
}
