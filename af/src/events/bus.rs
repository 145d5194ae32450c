//! Event Bus - pub/sub for pipeline progress
//!
//! Uses a tokio broadcast channel so any number of consumers (progress
//! printer, tests) see every event emitted after they subscribe.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

use super::PipelineEvent;
use crate::agent::Stage;

/// Default channel capacity (events)
///
/// A run emits at most eight events, so this covers many concurrent runs.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Central event bus for pipeline progress
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped; a full
    /// channel drops the oldest events for lagging receivers.
    pub fn emit(&self, event: PipelineEvent) {
        debug!(event_type = event.event_type(), run_id = event.run_id(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter bound to one run
    pub fn emitter_for(&self, run_id: impl Into<String>) -> EventEmitter {
        let run_id = run_id.into();
        debug!(%run_id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            run_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for emitting the events of one run
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<PipelineEvent>,
    run_id: String,
}

impl EventEmitter {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit a raw event
    pub fn emit(&self, event: PipelineEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    pub fn workflow_started(&self, task: &str) {
        self.emit(PipelineEvent::WorkflowStarted {
            run_id: self.run_id.clone(),
            task: task.to_string(),
        });
    }

    pub fn stage_started(&self, stage: Stage) {
        self.emit(PipelineEvent::StageStarted {
            run_id: self.run_id.clone(),
            stage,
            position: stage.position(),
            total: Stage::ALL.len(),
        });
    }

    pub fn stage_completed(&self, stage: Stage, elapsed: Duration, parsed: bool) {
        self.emit(PipelineEvent::StageCompleted {
            run_id: self.run_id.clone(),
            stage,
            elapsed_ms: elapsed.as_millis() as u64,
            parsed,
        });
    }

    pub fn stage_failed(&self, stage: Stage, error: &str) {
        self.emit(PipelineEvent::StageFailed {
            run_id: self.run_id.clone(),
            stage,
            error: error.to_string(),
        });
    }

    pub fn workflow_completed(&self, total: Duration) {
        self.emit(PipelineEvent::WorkflowCompleted {
            run_id: self.run_id.clone(),
            total_duration_ms: total.as_millis() as u64,
        });
    }
}
