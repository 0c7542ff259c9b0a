//! Append-only audit trail.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::clock::{Clock, SystemClock};
use super::event::{AuditAction, AuditEvent, AuditOutcome};
use super::export::{write_delimited, ExportOptions};
use crate::error::Error;
use crate::request::Actor;

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
    events: Vec<AuditEvent>,
}

/// Thread-safe, append-only recorder for audit events.
///
/// Each append assigns the id and timestamp and pushes the event under one
/// lock, so concurrent callers never observe a partial event or a repeated
/// id. Timestamps never go backwards along the trail even if the clock does.
///
/// # Example
///
/// ```
/// use patient_access::{Actor, AuditAction, AuditTrail, Role};
///
/// let trail = AuditTrail::new();
/// let admin = Actor::new(1, "admin", Role::Admin);
///
/// let event = trail.record(Some(&admin), AuditAction::ViewPatient, Some(3), "Viewed patient 3");
/// assert_eq!(event.id(), 1);
/// assert_eq!(trail.list().len(), 1);
/// ```
pub struct AuditTrail {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    emit_traces: bool,
}

impl AuditTrail {
    /// Creates an empty trail stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty trail stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
            clock,
            emit_traces: true,
        }
    }

    /// Enables or disables mirroring events to `tracing`.
    pub fn with_traces(mut self, emit: bool) -> Self {
        self.emit_traces = emit;
        self
    }

    /// Records a successful action.
    pub fn record(
        &self,
        actor: Option<&Actor>,
        action: AuditAction,
        target: Option<u64>,
        details: impl Into<String>,
    ) -> AuditEvent {
        self.record_attempt(actor, action, target, details, AuditOutcome::Success)
    }

    /// Records an action with an explicit outcome.
    ///
    /// Use this for denied or failed attempts so they stay distinguishable
    /// from completed actions.
    pub fn record_attempt(
        &self,
        actor: Option<&Actor>,
        action: AuditAction,
        target: Option<u64>,
        details: impl Into<String>,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        let details = details.into();
        let event = {
            let mut inner = self.lock();
            let now = self.clock.now();
            let timestamp = match inner.last_timestamp {
                Some(last) if last > now => last,
                _ => now,
            };
            let id = inner.next_id;
            inner.next_id += 1;
            inner.last_timestamp = Some(timestamp);

            let event = AuditEvent::new(
                id,
                timestamp,
                actor.map(|a| a.id),
                actor.map(|a| a.username.clone()),
                action,
                outcome,
                target,
                details,
            );
            inner.events.push(event.clone());
            event
        };

        if self.emit_traces {
            emit(&event);
        }
        event
    }

    /// All events, most recent first.
    pub fn list(&self) -> Vec<AuditEvent> {
        self.lock().events.iter().rev().cloned().collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Writes every event, most recent first, as delimited text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Export`] if the writer fails.
    pub fn export(&self, options: &ExportOptions) -> Result<Vec<u8>, Error> {
        write_delimited(&self.list(), options)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Appends are a single push; a panic elsewhere cannot leave a half-written event.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail")
            .field("len", &self.len())
            .field("emit_traces", &self.emit_traces)
            .finish()
    }
}

fn emit(event: &AuditEvent) {
    tracing::info!(
        target: "patient_audit",
        id = event.id(),
        timestamp = %event.timestamp().to_rfc3339(),
        actor_id = ?event.actor_id(),
        actor = ?event.actor_name(),
        action = %event.action(),
        class = %event.class(),
        outcome = %event.outcome(),
        target_id = ?event.target_id(),
        details = %event.details(),
        "audit event"
    );
}
