//! Single-slot, time-windowed undo of reversible operations.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use tracing::debug;

use bookport_shared::Result;

/// How long a registered undo stays invokable.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);

/// Boxed reverse operation, runnable once.
pub type ReverseFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type ReverseFn = Box<dyn FnOnce() -> ReverseFuture + Send>;

/// A registered reverse operation invokable within a bounded window.
pub struct UndoableAction {
    pub description: String,
    reverse: ReverseFn,
    registered_at: Instant,
}

impl UndoableAction {
    pub fn new<F, Fut>(description: impl Into<String>, reverse: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            description: description.into(),
            reverse: Box::new(move || Box::pin(reverse())),
            registered_at: Instant::now(),
        }
    }
}

impl std::fmt::Debug for UndoableAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoableAction")
            .field("description", &self.description)
            .field("registered_at", &self.registered_at)
            .finish_non_exhaustive()
    }
}

/// Holds at most one outstanding undoable action.
///
/// Registering a new action silently evicts the previous one; expiry
/// silently discards the slot.
#[derive(Debug)]
pub struct UndoManager {
    pending: Option<UndoableAction>,
    window: Duration,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_UNDO_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            pending: None,
            window,
        }
    }

    /// Register an action, evicting any previous one.
    pub fn register(&mut self, action: UndoableAction) {
        if let Some(old) = self.pending.take() {
            debug!(evicted = %old.description, "undo slot replaced");
        }
        self.pending = Some(action);
    }

    /// Whether an unexpired action is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|a| a.registered_at.elapsed() < self.window)
    }

    /// Time left before the pending action expires.
    pub fn remaining(&self) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|a| self.window.saturating_sub(a.registered_at.elapsed()))
            .filter(|d| !d.is_zero())
    }

    /// Description of the pending action, if still invokable.
    pub fn pending_description(&self) -> Option<&str> {
        if self.has_pending() {
            self.pending.as_ref().map(|a| a.description.as_str())
        } else {
            None
        }
    }

    /// Run the pending reverse operation.
    ///
    /// Returns `Ok(false)` without running anything when the slot is empty
    /// or the window has elapsed; the expired action is discarded.
    pub async fn invoke(&mut self) -> Result<bool> {
        let Some(action) = self.pending.take() else {
            return Ok(false);
        };

        if action.registered_at.elapsed() >= self.window {
            debug!(description = %action.description, "undo window elapsed, discarding");
            return Ok(false);
        }

        (action.reverse)().await?;
        Ok(true)
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
