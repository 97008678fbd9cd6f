//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use url::Url;

use bookport_client::ApiClient;
use bookport_core::{
    ExportOptions, ExportOrchestrator, ItemState, JobControl, PostFilters,
};
use bookport_guard::{OperationContext, PermissionGuard, PermissionLevel, UndoableAction};
use bookport_shared::{
    AppConfig, MediaMode, MemoryStore, init_config, load_config, resolve_database_id,
    resolve_token,
};
use bookport_source::SourceClient;

use crate::confirm::{self, TerminalPrompt};
use crate::progress::ExportProgress;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bookport: export bookmarked forum threads into a block-structured KB.
#[derive(Parser)]
#[command(
    name = "bookport",
    version,
    about = "Export bookmarked forum threads into a block-structured knowledge base.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Image handling mode flag.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum MediaArg {
    Upload,
    External,
    Skip,
}

impl From<MediaArg> for MediaMode {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::Upload => MediaMode::Upload,
            MediaArg::External => MediaMode::External,
            MediaArg::Skip => MediaMode::Skip,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Export a user's bookmarked topics to the destination database.
    Export {
        /// Forum username whose bookmarks are exported.
        username: String,

        /// Destination database id (overrides config).
        #[arg(short, long)]
        database: Option<String>,

        /// Lowest post number to include.
        #[arg(long)]
        range_start: Option<u32>,

        /// Highest post number to include.
        #[arg(long)]
        range_end: Option<u32>,

        /// Export only the opening post of each topic.
        #[arg(long)]
        first_post_only: bool,

        /// Export only posts written by the topic author.
        #[arg(long)]
        author_only: bool,

        /// Image handling: upload, external, or skip.
        #[arg(long)]
        media: Option<MediaArg>,

        /// Delay between items in ms.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Export at most this many bookmarks.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Check configuration and destination reachability.
    Validate {
        /// Destination database id (overrides config).
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Archive (soft-delete) a destination page, with confirmation and a
    /// short undo window.
    Archive {
        /// Page id to archive.
        page_id: String,

        /// Exact display name of the page (retyped during confirmation).
        #[arg(long)]
        name: String,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bookport=info",
        1 => "bookport=debug",
        _ => "bookport=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Export {
            username,
            database,
            range_start,
            range_end,
            first_post_only,
            author_only,
            media,
            delay_ms,
            limit,
        } => {
            export(
                &username,
                database.as_deref(),
                range_start,
                range_end,
                first_post_only,
                author_only,
                media,
                delay_ms,
                limit,
                cli.verbose,
            )
            .await
        }
        Command::Validate { database } => validate(database.as_deref()).await,
        Command::Archive { page_id, name } => archive(&page_id, &name).await,
        Command::Config { action } => match action {
            ConfigAction::Init => {
                let path = init_config()?;
                println!("wrote {}", path.display());
                Ok(())
            }
            ConfigAction::Show => {
                let config = load_config()?;
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        },
    }
}

/// Build the per-session guard from configuration.
fn guard_from(config: &AppConfig) -> Result<PermissionGuard> {
    let level = PermissionLevel::from_index(config.permissions.level)
        .ok_or_else(|| eyre!("invalid permission level {} in config", config.permissions.level))?;
    Ok(PermissionGuard::new(
        level,
        config.permissions.require_confirm,
        config.permissions.enable_audit_log,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn export(
    username: &str,
    database: Option<&str>,
    range_start: Option<u32>,
    range_end: Option<u32>,
    first_post_only: bool,
    author_only: bool,
    media: Option<MediaArg>,
    delay_ms: Option<u64>,
    limit: Option<usize>,
    verbose: u8,
) -> Result<()> {
    let config = load_config()?;
    // Configuration errors surface before any network call.
    let token = resolve_token(&config)?;
    let database_id = resolve_database_id(&config, database)?;
    let mut guard = guard_from(&config)?;

    let base = Url::parse(&config.source.base_url)?;
    let source = SourceClient::new(base)?;
    let api = ApiClient::new(token)?;
    // Session-scoped store; durable bookkeeping belongs to the host app.
    let store = MemoryStore::new();

    println!("fetching bookmarks for {username}…");
    let mut bookmarks = source.fetch_all_bookmarks(username).await?;
    if let Some(limit) = limit {
        bookmarks.truncate(limit);
    }
    if bookmarks.is_empty() {
        println!("no bookmarks found");
        return Ok(());
    }
    println!("{} bookmarks queued", bookmarks.len());

    let options = ExportOptions {
        database_id,
        filters: PostFilters {
            range_start: range_start.unwrap_or(config.export.range_start),
            range_end: range_end.unwrap_or(config.export.range_end),
            first_post_only: first_post_only || config.export.first_post_only,
            author_only: author_only || config.export.author_only,
        },
        media_mode: media.map(MediaMode::from).unwrap_or(config.export.media_mode),
        item_delay: Duration::from_millis(delay_ms.unwrap_or(config.export.item_delay_ms)),
    };

    let control = Arc::new(JobControl::new());
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ncancelling after the current item…");
                control.cancel();
            }
        });
    }

    let progress = ExportProgress::new(bookmarks.len());
    let mut orchestrator = ExportOrchestrator::new(
        &source,
        &api,
        &mut guard,
        &TerminalPrompt,
        &store,
        options,
    );
    let report = orchestrator.run(&bookmarks, &control, &progress).await;
    progress.finish();

    println!("exported: {}", report.succeeded().len());
    for item in report.failed() {
        if let ItemState::Failed { error } = &item.state {
            println!("  ✗ {} — {error}", item.title);
        }
    }
    if !report.skipped().is_empty() {
        println!("skipped: {}", report.skipped().len());
    }

    if verbose > 0 {
        println!("\nrecent operations:");
        for record in guard.audit().recent(10) {
            let duration = (record.ended_at - record.started_at).num_milliseconds();
            println!(
                "  {:?} {} ({duration}ms){}",
                record.status,
                record.operation,
                record
                    .error
                    .as_deref()
                    .map(|e| format!(" — {e}"))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

async fn validate(database: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let token = resolve_token(&config)?;
    let database_id = resolve_database_id(&config, database)?;

    let api = ApiClient::new(token)?;
    let db = api.fetch_database(&database_id).await?;

    let title = db["title"][0]["plain_text"].as_str().unwrap_or("(untitled)");
    info!(database_id, "destination database reachable");
    println!("✓ destination database reachable: {title}");
    Ok(())
}

async fn archive(page_id: &str, name: &str) -> Result<()> {
    let config = load_config()?;
    let token = resolve_token(&config)?;
    let mut guard = guard_from(&config)?;

    let api = Arc::new(ApiClient::new(token)?);

    let undo = {
        let api = Arc::clone(&api);
        let page_id = page_id.to_string();
        UndoableAction::new(format!("restore page: {name}"), move || async move {
            api.restore_page(&page_id).await.map(|_| ())
        })
    };

    let action_api = Arc::clone(&api);
    let target = page_id.to_string();
    guard
        .execute(
            "archive_page",
            OperationContext::target(page_id.to_string(), name.to_string()),
            &TerminalPrompt,
            Some(undo),
            move || async move { action_api.archive_page(&target).await },
        )
        .await?;

    println!("✓ archived: {name}");

    let pending = guard
        .pending_undo()
        .map(|(description, remaining)| (description.to_string(), remaining));
    if let Some((description, remaining)) = pending {
        println!(
            "press Enter within {}s to undo ({description})",
            remaining.as_secs()
        );
        if confirm::enter_within(remaining).await {
            if guard.invoke_undo().await? {
                println!("✓ restored: {name}");
            } else {
                println!("undo window elapsed");
            }
        }
    }

    Ok(())
}
