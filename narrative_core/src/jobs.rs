//! Card-generation jobs waiting for the next writer batch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use uuid::Uuid;

use crate::story::PlotNode;
use game_rules::EventDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// A plot node fired and needs its card.
    Plot,
    /// An event started.
    EventStart,
    /// An event phase completed.
    EventPhase,
    /// Continuation of a multi-card storyline.
    Chain,
    Info,
}

impl JobKind {
    /// Jobs that should trigger a writer batch before the deck runs low.
    pub fn is_high_priority(self) -> bool {
        matches!(self, JobKind::Plot | JobKind::EventStart)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardGenJob {
    pub id: Uuid,
    pub kind: JobKind,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl CardGenJob {
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn plot(node: &PlotNode) -> Self {
        Self::new(JobKind::Plot)
            .with_context("node_id", node.id.clone())
            .with_context("plot_description", node.plot_description.clone())
            .with_context("is_ending", node.is_ending)
            .with_context(
                "ending_text",
                node.ending_text.clone().map(Value::String).unwrap_or(Value::Null),
            )
    }

    pub fn event_start(event: &EventDisplay) -> Self {
        Self::new(JobKind::EventStart)
            .with_context("event_id", event.id.clone())
            .with_context("name", event.name.clone())
            .with_context("description", event.description.clone())
            .with_context("type", event.kind.clone())
    }

    pub fn event_phase(event_id: &str, phase: &str) -> Self {
        Self::new(JobKind::EventPhase)
            .with_context("event_id", event_id)
            .with_context("completed_phase", phase)
    }
}

/// FIFO of pending jobs, drained by the writer in one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobQueue {
    pending: VecDeque<CardGenJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, job: CardGenJob) {
        tracing::debug!(job_id = %job.id, kind = ?job.kind, "queued card job");
        self.pending.push_back(job);
    }

    pub fn drain(&mut self) -> Vec<CardGenJob> {
        self.pending.drain(..).collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = &CardGenJob> {
        self.pending.iter()
    }

    pub fn has_jobs(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn has_high_priority(&self) -> bool {
        self.pending.iter().any(|j| j.kind.is_high_priority())
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
