//! Permission guard, audit log, and undo manager.
//!
//! Every mutating destination call goes through [`PermissionGuard::execute`]:
//! authorize against the static operation table, confirm dangerous
//! operations interactively, invoke the action, append an audit record
//! regardless of outcome, and register a bounded-window undo where the
//! operation is reversible.
//!
//! Guard state is an explicit per-session instance passed by reference;
//! there is no global.

mod audit;
mod permission;
mod undo;

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use bookport_shared::{BookportError, Result};

pub use audit::{
    AuditLog, DEFAULT_LOG_CAPACITY, OperationContext, OperationRecord, OperationStatus,
};
pub use permission::{OperationSpec, PermissionLevel, operation_spec};
pub use undo::{DEFAULT_UNDO_WINDOW, ReverseFuture, UndoManager, UndoableAction};

/// Countdown before a dangerous operation can be confirmed.
const CONFIRM_COUNTDOWN: Duration = Duration::from_secs(5);

/// Longer countdown for operations that cannot be undone.
const IRREVERSIBLE_COUNTDOWN: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Confirmation seam
// ---------------------------------------------------------------------------

/// What the interactive confirmation step must collect from the operator.
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    pub operation: String,
    /// Exact display name the operator must retype.
    pub target_name: String,
    /// Countdown that must elapse before confirming.
    pub countdown: Duration,
    /// Whether the operation can still be undone afterward.
    pub reversible: bool,
}

/// Interactive confirmation, supplied by the UI layer.
pub trait ConfirmationPrompt: Send + Sync {
    /// Block until the operator confirms or declines.
    fn confirm(&self, request: &ConfirmationRequest) -> bool;
}

/// Declines every confirmation; the safe default for headless sessions.
pub struct NoInteraction;

impl ConfirmationPrompt for NoInteraction {
    fn confirm(&self, _request: &ConfirmationRequest) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// PermissionGuard
// ---------------------------------------------------------------------------

/// Per-session authorization, confirmation, audit, and undo state.
pub struct PermissionGuard {
    level: PermissionLevel,
    require_confirm: bool,
    audit: AuditLog,
    undo: UndoManager,
}

impl PermissionGuard {
    pub fn new(level: PermissionLevel, require_confirm: bool, audit_enabled: bool) -> Self {
        Self {
            level,
            require_confirm,
            audit: AuditLog::new(audit_enabled),
            undo: UndoManager::new(),
        }
    }

    /// Override the undo window (tests).
    pub fn with_undo_window(mut self, window: Duration) -> Self {
        self.undo = UndoManager::with_window(window);
        self
    }

    pub fn level(&self) -> PermissionLevel {
        self.level
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Whether an unexpired undo is waiting.
    pub fn has_pending_undo(&self) -> bool {
        self.undo.has_pending()
    }

    /// Description and remaining window of the pending undo.
    pub fn pending_undo(&self) -> Option<(&str, Duration)> {
        let description = self.undo.pending_description()?;
        let remaining = self.undo.remaining()?;
        Some((description, remaining))
    }

    /// Check the configured level against an operation's declaration.
    ///
    /// An operation with no declared level is denied outright.
    pub fn authorize(&self, operation: &str) -> Result<&'static OperationSpec> {
        let Some(spec) = operation_spec(operation) else {
            return Err(BookportError::permission(format!(
                "operation '{operation}' is not declared and is denied by default"
            )));
        };

        if self.level < spec.min_level {
            return Err(BookportError::permission(format!(
                "'{operation}' requires the {} level (session is {})",
                spec.min_level, self.level
            )));
        }

        Ok(spec)
    }

    /// Run `action` under the full guard protocol.
    ///
    /// Order: authorize → confirm (dangerous only) → invoke → audit record
    /// (appended for success and failure alike) → undo registration for
    /// reversible dangerous operations. A declined confirmation aborts
    /// before the action runs and leaves no side effect.
    pub async fn execute<T, F, Fut>(
        &mut self,
        operation: &str,
        context: OperationContext,
        prompt: &dyn ConfirmationPrompt,
        undo_action: Option<UndoableAction>,
        action: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let spec = self.authorize(operation)?;

        if spec.dangerous && self.require_confirm {
            let request = ConfirmationRequest {
                operation: operation.to_string(),
                target_name: context
                    .target_name
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                countdown: if spec.reversible {
                    CONFIRM_COUNTDOWN
                } else {
                    IRREVERSIBLE_COUNTDOWN
                },
                reversible: spec.reversible,
            };

            if !prompt.confirm(&request) {
                return Err(BookportError::ConfirmationAborted(format!(
                    "'{operation}' was not confirmed"
                )));
            }
        }

        let started_at = Utc::now();
        let result = action().await;

        let (status, error) = match &result {
            Ok(_) => (OperationStatus::Success, None),
            Err(e) => (OperationStatus::Failed, Some(e.to_string())),
        };
        self.audit.append(OperationRecord::new(
            operation,
            context,
            started_at,
            status,
            error,
        ));

        if result.is_ok() && spec.dangerous {
            match (spec.reversible, undo_action) {
                (true, Some(undo_action)) => {
                    info!(operation, description = %undo_action.description, "undo registered");
                    self.undo.register(undo_action);
                }
                (false, _) => {
                    warn!(operation, "operation is irreversible, no undo available");
                }
                (true, None) => {}
            }
        }

        result
    }

    /// Re-run the pending reverse operation, logging its own record.
    ///
    /// Returns `Ok(false)` when nothing is invokable (empty slot or elapsed
    /// window); nothing runs and nothing is logged in that case.
    pub async fn invoke_undo(&mut self) -> Result<bool> {
        let Some(description) = self.undo.pending_description().map(str::to_string) else {
            return Ok(false);
        };

        let started_at = Utc::now();
        let outcome = self.undo.invoke().await;

        let context = OperationContext {
            target_id: None,
            target_name: Some(description),
        };

        match outcome {
            Ok(true) => {
                self.audit.append(OperationRecord::new(
                    "undo",
                    context,
                    started_at,
                    OperationStatus::Success,
                    None,
                ));
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.audit.append(OperationRecord::new(
                    "undo",
                    context,
                    started_at,
                    OperationStatus::Failed,
                    Some(e.to_string()),
                ));
                Err(e)
            }
        }
    }
}
