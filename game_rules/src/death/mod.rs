//! Death and resurrection.
//!
//! A life ends when any stat touches either bound. Resurrection carries a
//! handful of tags forward as karma and restarts the world at the next
//! season.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::mechanics::{is_lethal, STAT_MIN};
use crate::world_state::{DeathRecord, GlobalBlackboard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeathBoundary {
    Min,
    Max,
}

impl DeathBoundary {
    pub fn as_str(self) -> &'static str {
        match self {
            DeathBoundary::Min => "min",
            DeathBoundary::Max => "max",
        }
    }
}

/// Everything known about a death at the moment it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathInfo {
    pub cause_stat: String,
    pub cause_value: i32,
    pub boundary: DeathBoundary,
    /// Elapsed days when the life ended.
    pub turn: i64,
    pub life_number: u32,
    pub tags_at_death: BTreeSet<String>,
    pub stats_at_death: BTreeMap<String, i32>,
}

impl DeathInfo {
    /// Key of the pre-generated card for this kind of death, e.g.
    /// `death_health_min`.
    pub fn death_card_key(&self) -> String {
        death_card_key(&self.cause_stat, self.boundary)
    }
}

pub fn death_card_key(stat: &str, boundary: DeathBoundary) -> String {
    format!("death_{}_{}", stat, boundary.as_str())
}

#[derive(Debug, Clone)]
pub struct DeathLoop {
    karma_cap: usize,
    resurrection_stat: i32,
}

impl DeathLoop {
    pub fn new(karma_cap: usize, resurrection_stat: i32) -> Self {
        Self {
            karma_cap,
            resurrection_stat,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.karma_cap, config.resurrection_stat)
    }

    pub fn karma_cap(&self) -> usize {
        self.karma_cap
    }

    /// Ends the current life if any stat sits on a bound.
    ///
    /// The first lethal stat in ascending ID order is the cause. Returns
    /// `None`, and changes nothing, when every stat is safe or the player
    /// is already dead.
    pub fn check_death(&self, board: &mut GlobalBlackboard) -> Option<DeathInfo> {
        if !board.is_alive {
            return None;
        }
        let (stat, value) = board
            .stats
            .iter()
            .find(|(_, value)| is_lethal(**value))
            .map(|(stat, value)| (stat.clone(), *value))?;

        let boundary = if value <= STAT_MIN {
            DeathBoundary::Min
        } else {
            DeathBoundary::Max
        };
        let turn = board.calendar.elapsed_days();

        board.is_alive = false;
        board.death = Some(DeathRecord {
            cause_stat: stat.clone(),
            turn,
        });

        tracing::info!(
            stat = %stat,
            value,
            boundary = boundary.as_str(),
            life = board.life,
            "player died"
        );

        Some(DeathInfo {
            cause_stat: stat,
            cause_value: value,
            boundary,
            turn,
            life_number: board.life,
            tags_at_death: board.tags.clone(),
            stats_at_death: board.stats.clone(),
        })
    }

    /// Starts the next life. Returns the karma tags carried over.
    ///
    /// Up to `karma_cap` current tags that are not in `temp_tags` survive,
    /// taken in ascending order. Every stat is reset, every NPC disabled,
    /// every event dropped, and the calendar moves to day 1 of the next
    /// season. The story graph is not touched here.
    pub fn resurrect(
        &self,
        board: &mut GlobalBlackboard,
        temp_tags: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let karma: BTreeSet<String> = board
            .tags
            .iter()
            .filter(|tag| !temp_tags.contains(*tag))
            .take(self.karma_cap)
            .cloned()
            .collect();

        board.previous_life_tags = std::mem::take(&mut board.tags);
        for value in board.stats.values_mut() {
            *value = self.resurrection_stat;
        }
        for npc in board.npcs.values_mut() {
            npc.enabled = false;
        }
        board.events.clear();
        board.calendar.advance_to_next_season();

        board.tags = karma.clone();
        board.karma = karma.clone();
        board.life += 1;
        board.death = None;
        board.is_alive = true;

        tracing::info!(life = board.life, karma = karma.len(), "player resurrected");
        karma
    }
}

impl Default for DeathLoop {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}
