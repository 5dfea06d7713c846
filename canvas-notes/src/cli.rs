//! This module implements the full CLI interface for canvas-notes: command
//! parsing, argument validation, entrypoints and user-visible output.
//!
//! All core business logic (reconciliation, rendering, rule parsing) lives in
//! the [`canvas-notes-core`] crate. This module wires the real collaborators
//! (Canvas client, vault, JSON state) into it.
//!
//! ## How To Use
//! - For command-line users: use the installed `canvas-notes` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`canvas-notes-core`]: ../../canvas-notes-core/

use crate::canvas::CanvasClient;
use crate::load_config::{apply_changes, load_config};
use crate::state::JsonStateStore;
use crate::vault::VaultNoteStore;
use anyhow::{Context, Result};
use canvas_notes_core::contract::StateStore;
use canvas_notes_core::render::RubricMode;
use canvas_notes_core::settings::SettingsChange;
use canvas_notes_core::synchronise::{Reconciler, SyncState, SynchroniseReport};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// CLI for canvas-notes: keep markdown notes in sync with Canvas assignments.
#[derive(Parser)]
#[clap(
    name = "canvas-notes",
    version,
    about = "Synchronise Canvas LMS assignments into a folder of markdown notes"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronise every configured course into the vault
    Sync {
        /// Root directory of the note vault
        #[clap(long)]
        vault: PathBuf,
    },
    /// Re-fetch one assignment and update its note
    Refresh {
        #[clap(long)]
        vault: PathBuf,
        /// Canvas course id
        #[clap(long)]
        course: u64,
        /// Canvas assignment id
        #[clap(long)]
        assignment: u64,
    },
    /// Initialise the vault's settings from a YAML file
    Init {
        #[clap(long)]
        vault: PathBuf,
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Change individual settings
    Configure {
        #[clap(long)]
        vault: PathBuf,
        #[clap(long)]
        api_host: Option<String>,
        #[clap(long)]
        access_token: Option<String>,
        /// `todo-list` or `table`
        #[clap(long)]
        rubric_mode: Option<RubricMode>,
        /// File with one course rule per line
        #[clap(long)]
        courses_file: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { vault } => sync(&vault).await,
        Commands::Refresh {
            vault,
            course,
            assignment,
        } => refresh(&vault, course, assignment).await,
        Commands::Init { vault, config } => {
            let changes = load_config(&config)?.into_changes();
            update_settings(&vault, changes).await
        }
        Commands::Configure {
            vault,
            api_host,
            access_token,
            rubric_mode,
            courses_file,
        } => {
            let mut changes = Vec::new();
            if let Some(host) = api_host {
                changes.push(SettingsChange::ApiHost(host));
            }
            if let Some(token) = access_token {
                changes.push(SettingsChange::AccessToken(token));
            }
            if let Some(mode) = rubric_mode {
                changes.push(SettingsChange::RubricMode(mode));
            }
            if let Some(path) = courses_file {
                let rules = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read courses file {}", path.display()))?;
                changes.push(SettingsChange::CourseRules(rules));
            }
            update_settings(&vault, changes).await
        }
    }
}

async fn reconciler(
    vault: &Path,
) -> Result<Reconciler<CanvasClient, VaultNoteStore, JsonStateStore>> {
    let store = JsonStateStore::for_vault(vault);
    let (settings, cache) = store.load().await.context("Failed to load state")?;
    let client = CanvasClient::from_settings(&settings).map_err(anyhow::Error::msg)?;
    Ok(Reconciler::new(
        client,
        VaultNoteStore::new(vault),
        store,
        SyncState { settings, cache },
    ))
}

async fn sync(vault: &Path) -> Result<()> {
    let reconciler = reconciler(vault).await?;
    println!("Synchronise starting...");
    match reconciler.sync_all().await {
        Ok(report) => {
            println!(
                "Synchronise complete in {:.2}s.",
                report.elapsed.as_secs_f64()
            );
            print_summary(&report);
            tracing::info!(command = "sync", ?report, "Synchronisation complete");
            Ok(())
        }
        Err(e) => {
            eprintln!("[ERROR] Synchronisation failed. Check your access token and API host.");
            tracing::error!(command = "sync", error = %e, "Synchronisation failed");
            Err(anyhow::Error::new(e))
        }
    }
}

async fn refresh(vault: &Path, course: u64, assignment: u64) -> Result<()> {
    let reconciler = reconciler(vault).await?;
    match reconciler.refresh_assignment(course, assignment).await {
        Ok(outcome) => {
            println!("Refreshed assignment {assignment}: {outcome:?}");
            Ok(())
        }
        Err(e) => {
            eprintln!("[ERROR] Refresh failed. Check your access token and API host.");
            tracing::error!(command = "refresh", error = %e, "Refresh failed");
            Err(anyhow::Error::new(e))
        }
    }
}

async fn update_settings(vault: &Path, changes: Vec<SettingsChange>) -> Result<()> {
    let store = JsonStateStore::for_vault(vault);
    let (settings, cache) = store.load().await.context("Failed to load state")?;
    let count = changes.len();
    let settings = apply_changes(settings, changes)?;
    store
        .save(&settings, &cache)
        .await
        .context("Failed to save settings")?;
    tracing::info!(changes = count, courses = settings.courses.len(), "Settings saved");
    println!(
        "Settings saved ({} course{} configured).",
        settings.courses.len(),
        if settings.courses.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

fn print_summary(report: &SynchroniseReport) {
    for course in &report.courses {
        println!(
            "  course {}: {} fetched, {} created, {} updated, {} recreated, {} unchanged, {} skipped",
            course.course_id,
            course.fetched,
            course.created.len(),
            course.updated.len(),
            course.recreated.len(),
            course.unchanged,
            course.collisions.len(),
        );
    }
}
