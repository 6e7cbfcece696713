//! Command-line interface for kinesis.
//!
//! Provides commands for resolving input, searching the content provider,
//! and managing the local video library.

pub mod key;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::adapters::{ContentProvider, HttpProvider};
use crate::config::{self, ResolvedConfig};
use crate::core::{
    filter, query, resolve, Aggregator, BulkOrchestrator, BulkRun, FacetMachine, SearchContext,
    SearchError,
};
use crate::domain::{LibraryStatus, SearchIntent, SearchMode, Video};
use crate::library::{annotate_status, JsonLibrary, LibraryStore};

/// kinesis - Resolve search input and aggregate video results
#[derive(Parser, Debug)]
#[command(name = "kinesis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how an input would be interpreted
    Resolve {
        /// URL, handle, id, facet query or free text
        input: String,

        /// Print the intent as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the content provider
    Search {
        /// URL, handle, id, facet query or free text
        input: String,

        /// Load every page instead of just the first
        #[arg(short, long)]
        all: bool,

        /// Narrow the results locally (same as typing after `filter_search:`)
        #[arg(short, long)]
        filter: Option<String>,

        /// Save the visible results to the library
        #[arg(short, long)]
        save: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List items in the library
    Library {
        /// Filter terms or a facet query
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum number of items to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Save videos from a JSON file (array of videos) to the library
    Import {
        /// JSON file to import
        file: PathBuf,
    },

    /// Delete a video from the library
    Delete {
        /// Video ID
        id: String,
    },

    /// Print the transcript of a video
    Transcript {
        /// Video URL or id
        input: String,
    },

    /// Manage the API key used for channel listings and transcripts
    Key {
        #[command(subcommand)]
        command: key::KeyCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Resolve { input, json } => resolve_input(&input, json),
            Commands::Search {
                input,
                all,
                filter,
                save,
                json,
            } => search(&input, all, filter, save, json).await,
            Commands::Library { query, limit } => list_library(query, limit).await,
            Commands::Import { file } => import_videos(&file).await,
            Commands::Delete { id } => delete_video(&id).await,
            Commands::Transcript { input } => show_transcript(&input).await,
            Commands::Key { command } => key::execute(command).await,
            Commands::Config => show_config(),
        }
    }
}

/// Convert an engine error into a CLI error carrying the user-facing message
fn user_error(err: SearchError) -> anyhow::Error {
    debug!(error = %err, "Search error");
    anyhow::anyhow!(err.user_message())
}

/// Print how the input resolves
fn resolve_input(input: &str, json: bool) -> Result<()> {
    let Some(intent) = resolve(input).map_err(user_error)? else {
        println!("Nothing to search for.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&intent)?);
    } else {
        println!("Mode:   {}", intent.mode);
        println!("Target: {}", intent.target_id);
        println!("Forced: {}", intent.forced);
    }
    Ok(())
}

/// Search the provider, optionally load all pages, filter and save
async fn search(
    input: &str,
    all: bool,
    filter_terms: Option<String>,
    save: bool,
    json: bool,
) -> Result<()> {
    let cfg = config::config()?;

    let mut machine = FacetMachine::new(SearchContext::Network);
    let Some(intent) = intent_from_input(&mut machine, input).map_err(user_error)? else {
        println!("Nothing to search for.");
        return Ok(());
    };

    let provider = Arc::new(HttpProvider::from_config(cfg)?);
    let aggregator = Aggregator::new(provider, cfg.has_api_key()).with_settings(cfg.pagination);

    aggregator.start(&intent).await.map_err(user_error)?;
    machine.on_search_success();

    if all {
        // Keep what was merged before a failure
        if let Err(e) = aggregator.all().await {
            eprintln!("Stopped loading: {}", e.user_message());
        }
    }

    if let Some(terms) = filter_terms {
        machine.set_input(&terms);
    }

    let library = JsonLibrary::from_config(cfg);
    let mut videos = aggregator.snapshot().videos;
    annotate_status(&mut videos, &library).await?;

    let mut visible: Vec<Video> = filter(&videos, &machine.canonical_query())
        .into_iter()
        .cloned()
        .collect();

    // A failed save still shows what made it into the library
    let saved = if save {
        let result = save_videos(&visible, &library, cfg).await;
        mark_saved(&mut visible, &library).await?;
        result
    } else {
        Ok(())
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
    } else {
        print_videos(visible.iter());
        let more = if aggregator.has_more() {
            " (more available, use --all)"
        } else {
            ""
        };
        println!("\nShowing {} of {} results{}", visible.len(), videos.len(), more);
    }
    saved
}

/// Mark videos that were not in the library before a save but are now.
///
/// Returns how many were newly saved.
async fn mark_saved(videos: &mut [Video], store: &dyn LibraryStore) -> Result<usize> {
    let mut marked = 0;
    for video in videos.iter_mut().filter(|v| v.library_status.is_none()) {
        if store.exists(&video.id).await? {
            video.library_status = Some(LibraryStatus::Saved);
            marked += 1;
        }
    }
    Ok(marked)
}

/// Enter `input` the way the search box receives a paste, then resolve the
/// canonical query it produces
fn intent_from_input(
    machine: &mut FacetMachine,
    input: &str,
) -> std::result::Result<Option<SearchIntent>, SearchError> {
    let change = machine.set_input(input);
    resolve(&change.query)
}

/// Run a bulk save, reporting progress on stderr
async fn save_videos(
    videos: &[Video],
    store: &dyn LibraryStore,
    cfg: &ResolvedConfig,
) -> Result<()> {
    let orchestrator = BulkOrchestrator::new(cfg.chunk_size);

    let mut progress = orchestrator.subscribe();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let label = progress.borrow_and_update().as_ref().map(|p| p.label.clone());
            if let Some(label) = label {
                eprintln!("{}", label);
            }
        }
    });

    let result = orchestrator.run(videos, store).await;
    drop(orchestrator);
    let _ = reporter.await;

    match result {
        Ok(BulkRun::Completed(tally)) => {
            eprintln!("{}", tally.summary());
            Ok(())
        }
        Ok(BulkRun::Skipped) => Ok(()),
        Err(e) => Err(user_error(e)),
    }
}

/// List the library, optionally filtered
async fn list_library(query_text: Option<String>, limit: usize) -> Result<()> {
    let cfg = config::config()?;
    let library = JsonLibrary::from_config(cfg);
    let videos = library.list_saved().await?;

    if videos.is_empty() {
        println!("Library is empty. Use 'kinesis search <input> --save' to add videos.");
        return Ok(());
    }

    let mut machine = FacetMachine::new(SearchContext::Library);
    if let Some(text) = query_text {
        // Bare terms filter the library
        let text = if query::parse(&text).filter().is_none() {
            format!("filter_search: {}", text)
        } else {
            text
        };
        machine.set_input(&text);
    }

    let visible = filter(&videos, &machine.canonical_query());
    print_videos(visible.iter().take(limit).copied());

    println!("\nShowing {} of {} items", visible.len().min(limit), videos.len());
    Ok(())
}

/// Import videos from a JSON file
async fn import_videos(path: &Path) -> Result<()> {
    let cfg = config::config()?;
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let videos: Vec<Video> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse videos from: {}", path.display()))?;

    eprintln!("Importing {} videos from {}", videos.len(), path.display());
    let library = JsonLibrary::from_config(cfg);
    save_videos(&videos, &library, cfg).await
}

/// Delete a single video
async fn delete_video(id: &str) -> Result<()> {
    let cfg = config::config()?;
    let library = JsonLibrary::from_config(cfg);

    if library.delete_one(id).await? {
        println!("Deleted {}", id);
    } else {
        println!("Not in library: {}", id);
    }
    Ok(())
}

/// Print a transcript for a video URL or id
async fn show_transcript(input: &str) -> Result<()> {
    let cfg = config::config()?;

    let intent = resolve(input)
        .map_err(user_error)?
        .filter(|i| i.mode == SearchMode::Video)
        .context("Transcripts need a video URL or id")?;

    let provider = HttpProvider::from_config(cfg)?;
    let text = provider
        .fetch_transcript(&intent.target_id)
        .await
        .map_err(|e| user_error(SearchError::from(e)))?;

    println!("{}", text);
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("kinesis configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  Library: {}", cfg.library_path.display());
    println!();
    println!("Provider:");
    println!(
        "  Endpoint: {}",
        cfg.provider_endpoint.as_deref().unwrap_or("(not configured)")
    );
    println!(
        "  API key:  {}",
        if cfg.has_api_key() { "configured" } else { "not configured" }
    );
    println!();
    println!("Pagination:");
    println!("  Page delay: {}ms", cfg.pagination.page_delay.as_millis());
    println!("  Max pages:  {}", cfg.pagination.max_pages);
    println!();
    println!("Bulk save:");
    println!("  Chunk size: {}", cfg.chunk_size);

    Ok(())
}

fn status_label(video: &Video) -> &'static str {
    match video.library_status {
        Some(LibraryStatus::Exists) => "saved",
        Some(LibraryStatus::Saved) => "new",
        None => "",
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn print_videos<'a>(videos: impl Iterator<Item = &'a Video>) {
    println!("{:<13} {:<6} {:<50} {:<20}", "ID", "LIB", "TITLE", "AUTHOR");
    println!("{}", "-".repeat(92));

    for video in videos {
        println!(
            "{:<13} {:<6} {:<50} {:<20}",
            video.id,
            status_label(video),
            truncate(&video.title, 50),
            truncate(video.author.as_deref().unwrap_or(""), 20)
        );
    }
}
