use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Read-only snapshot of the world that conditions are evaluated against.
///
/// Owned rather than borrowed so it can be shared with the evaluation
/// thread and outlive the lock that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionContext {
    pub stats: BTreeMap<String, i32>,
    pub tags: BTreeSet<String>,
    /// IDs of events currently active.
    pub events: BTreeSet<String>,
    /// IDs of NPCs currently enabled.
    pub npcs: BTreeSet<String>,
    pub day: u32,
    pub season: u32,
    pub year: i32,
    pub elapsed_days: i64,
    pub turn: u64,
    pub life: u32,
    pub is_alive: bool,
}

impl ConditionContext {
    pub fn with_stat(mut self, id: impl Into<String>, value: i32) -> Self {
        self.stats.insert(id.into(), value);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_event(mut self, event_id: impl Into<String>) -> Self {
        self.events.insert(event_id.into());
        self
    }
}
