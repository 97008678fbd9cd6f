//! Batch export orchestrator: per-item pipeline with pause/resume/cancel
//! and failure isolation across the queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use bookport_blocks::{ConvertOptions, enforce_child_limit};
use bookport_client::{ApiClient, MediaRelay};
use bookport_guard::{ConfirmationPrompt, OperationContext, PermissionGuard};
use bookport_shared::{BookportError, MediaMode, Result, SettingsStore, mark_exported};
use bookport_source::{Bookmark, SourceClient};

use crate::assemble::assemble_topic_blocks;
use crate::filter::{PostFilters, filter_posts};
use crate::properties::build_properties;

/// Poll interval of the cooperative pause loop.
const PAUSE_POLL: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Job control & progress
// ---------------------------------------------------------------------------

/// Cooperative pause/cancel flags for one export job.
///
/// An explicit per-session instance, shared by reference between the
/// orchestrator loop and whatever drives it. Cancellation is polled at item
/// boundaries and inside the pause loop, never preemptively mid-item.
#[derive(Debug, Default)]
pub struct JobControl {
    paused: AtomicBool,
    cancelled: AtomicBool,
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Cancel the job; also lifts a pause so the loop can observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Pipeline stage of the item currently being exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Convert,
    Relay,
    Create,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetching",
            Self::Convert => "converting",
            Self::Relay => "relaying media",
            Self::Create => "creating page",
            Self::Done => "done",
        })
    }
}

/// One progress event, fired around each stage of each item.
#[derive(Debug, Clone)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub title: String,
    pub stage: Stage,
}

/// Progress sink supplied by the UI layer.
pub trait ProgressSink: Send + Sync {
    fn event(&self, progress: &Progress);
}

/// No-op sink for headless/test usage.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn event(&self, _progress: &Progress) {}
}

// ---------------------------------------------------------------------------
// Items & report
// ---------------------------------------------------------------------------

/// Lifecycle of one queued item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Running,
    Done { page_id: String },
    Failed { error: String },
    Skipped { reason: String },
}

/// One bookmarked topic queued for export.
#[derive(Debug, Clone)]
pub struct ExportItem {
    pub source_id: u64,
    pub title: String,
    pub state: ItemState,
}

/// Final per-item outcomes of a batch.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub items: Vec<ExportItem>,
}

impl ExportReport {
    pub fn succeeded(&self) -> Vec<&ExportItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.state, ItemState::Done { .. }))
            .collect()
    }

    pub fn failed(&self) -> Vec<&ExportItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.state, ItemState::Failed { .. }))
            .collect()
    }

    pub fn skipped(&self) -> Vec<&ExportItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.state, ItemState::Skipped { .. }))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runtime options for one batch.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Destination database the pages land in.
    pub database_id: String,
    pub filters: PostFilters,
    pub media_mode: MediaMode,
    /// Delay between items, respecting the shared rate budget.
    pub item_delay: Duration,
}

/// Top-level per-item pipeline over a bookmark queue.
pub struct ExportOrchestrator<'a> {
    source: &'a SourceClient,
    api: &'a ApiClient,
    guard: &'a mut PermissionGuard,
    prompt: &'a dyn ConfirmationPrompt,
    store: &'a dyn SettingsStore,
    options: ExportOptions,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(
        source: &'a SourceClient,
        api: &'a ApiClient,
        guard: &'a mut PermissionGuard,
        prompt: &'a dyn ConfirmationPrompt,
        store: &'a dyn SettingsStore,
        options: ExportOptions,
    ) -> Self {
        Self {
            source,
            api,
            guard,
            prompt,
            store,
            options,
        }
    }

    /// Export the queue in submission order.
    ///
    /// A single item's error is caught, recorded, and never stops its
    /// siblings. Cancellation drains the remaining queue into skipped items.
    #[instrument(skip_all, fields(total = bookmarks.len()))]
    pub async fn run(
        &mut self,
        bookmarks: &[Bookmark],
        control: &JobControl,
        progress: &dyn ProgressSink,
    ) -> ExportReport {
        let total = bookmarks.len();
        let mut items: Vec<ExportItem> = bookmarks
            .iter()
            .map(|b| ExportItem {
                source_id: b.topic_id().unwrap_or_default(),
                title: b.display_title(),
                state: ItemState::Pending,
            })
            .collect();

        info!(total, "starting export batch");

        for (index, bookmark) in bookmarks.iter().enumerate() {
            // Cooperative pause: poll and sleep while the flag is set.
            while control.is_paused() {
                if control.is_cancelled() {
                    break;
                }
                tokio::time::sleep(PAUSE_POLL).await;
            }

            if control.is_cancelled() {
                let remaining = total - index;
                for item in &mut items[index..] {
                    item.state = ItemState::Skipped {
                        reason: "batch cancelled".into(),
                    };
                }
                info!(remaining, "batch cancelled, draining queue");
                break;
            }

            let title = items[index].title.clone();
            items[index].state = ItemState::Running;

            let outcome = match bookmark.topic_id() {
                Some(topic_id) => {
                    self.export_one(topic_id, bookmark, index + 1, total, &title, progress)
                        .await
                }
                None => Err(BookportError::validation("bookmark carries no topic id")),
            };

            match outcome {
                Ok(page_id) => {
                    if let Some(topic_id) = bookmark.topic_id() {
                        mark_exported(self.store, topic_id);
                    }
                    items[index].state = ItemState::Done { page_id };
                }
                Err(e) => {
                    warn!(item = %title, error = %e, "item failed, continuing batch");
                    items[index].state = ItemState::Failed {
                        error: e.to_string(),
                    };
                }
            }

            progress.event(&Progress {
                current: index + 1,
                total,
                title,
                stage: Stage::Done,
            });

            if index + 1 < total && !control.is_cancelled() {
                tokio::time::sleep(self.options.item_delay).await;
            }
        }

        let report = ExportReport { items };
        info!(
            succeeded = report.succeeded().len(),
            failed = report.failed().len(),
            skipped = report.skipped().len(),
            "export batch finished"
        );
        report
    }

    /// Export a single topic: fetch → filter → convert → chunk → relay →
    /// guarded create (first 100 blocks inline, remainder appended).
    async fn export_one(
        &mut self,
        topic_id: u64,
        bookmark: &Bookmark,
        current: usize,
        total: usize,
        title: &str,
        progress: &dyn ProgressSink,
    ) -> Result<String> {
        let stage_event = |stage: Stage| Progress {
            current,
            total,
            title: title.to_string(),
            stage,
        };

        progress.event(&stage_event(Stage::Fetch));
        let (topic, posts) = self.source.fetch_topic(topic_id).await?;
        let kept = filter_posts(&posts, &topic, &self.options.filters);
        debug!(topic_id, posts = posts.len(), kept = kept.len(), "posts filtered");

        progress.event(&stage_event(Stage::Convert));
        let convert_opts = ConvertOptions {
            media_mode: self.options.media_mode,
            base_url: Some(self.source.base_url().clone()),
        };
        let blocks = assemble_topic_blocks(&topic, &kept, &convert_opts);
        let mut blocks = enforce_child_limit(blocks);

        if self.options.media_mode == MediaMode::Upload {
            progress.event(&stage_event(Stage::Relay));
            let relay = MediaRelay::new(self.api)?;
            let stats = relay.relay_blocks(&mut blocks).await;
            debug!(
                topic_id,
                uploaded = stats.uploaded,
                linked = stats.linked,
                "media relayed"
            );
        }

        progress.event(&stage_event(Stage::Create));
        let properties = build_properties(&topic, bookmark);
        let api = self.api;
        let database_id = self.options.database_id.clone();

        let page = self
            .guard
            .execute(
                "create_page",
                OperationContext::target(topic.id.to_string(), title),
                self.prompt,
                None,
                move || async move { api.create_page(&database_id, properties, blocks).await },
            )
            .await?;

        let page_id = page["id"].as_str().unwrap_or_default().to_string();
        info!(topic_id, page_id = %page_id, "item exported");
        Ok(page_id)
    }
}
