//! Game mechanics: stat bounds, calendar lengths, card priority tiers and
//! swipe directions.

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// Lowest value a stat can hold. Reaching it is lethal.
pub const STAT_MIN: i32 = 0;

/// Highest value a stat can hold. Reaching it is lethal.
pub const STAT_MAX: i32 = 100;

pub const DAYS_PER_WEEK: u32 = 7;
pub const DAYS_PER_SEASON: u32 = 28;
pub const SEASONS_PER_YEAR: u32 = 4;
pub const DAYS_PER_YEAR: u32 = DAYS_PER_SEASON * SEASONS_PER_YEAR;

/// Character used for cards that are not spoken by an NPC.
pub const NARRATOR: &str = "narrator";

/// Priority tier of a card in the weekly deck.
///
/// Tiers are ordered: a higher tier is always drawn before a lower one.
/// Only `Common` cards are ever evicted under deck pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Filler content generated in bulk.
    #[default]
    Common,
    /// Cards about an active event.
    Event,
    /// Cards narrating a fired plot node.
    Plot,
    /// Follow-up cards from a choice, shown within the same day.
    Tree,
    /// Structural cards: welcome, reborn, season, death.
    Story,
}

impl Priority {
    /// Map a writer-supplied card source onto a tier. Unknown sources are common.
    pub fn from_source(source: &str) -> Self {
        match source {
            "event" => Priority::Event,
            "plot" => Priority::Plot,
            "tree" => Priority::Tree,
            "story" => Priority::Story,
            _ => Priority::Common,
        }
    }

    /// Whether the deck may drop this card when over capacity.
    pub fn is_evictable(self) -> bool {
        self == Priority::Common
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Common => "common",
            Priority::Event => "event",
            Priority::Plot => "plot",
            Priority::Tree => "tree",
            Priority::Story => "story",
        }
    }
}

/// Swipe direction on a choice card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(RulesError::InvalidDirection(other.to_string())),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a raw stat value into the legal range.
pub fn clamp_stat(value: i64) -> i32 {
    value.clamp(STAT_MIN as i64, STAT_MAX as i64) as i32
}

/// Whether a stat value sits on a lethal boundary.
pub fn is_lethal(value: i32) -> bool {
    value <= STAT_MIN || value >= STAT_MAX
}
