//! Cards: the unit of player interaction.
//!
//! A [`ChoiceCard`] offers a left and a right choice, each carrying
//! function calls and optional follow-up cards. An [`InfoCard`] is read
//! only and may chain into further info cards.

mod deck;
mod defs;
mod executor;

pub use deck::*;
pub use defs::*;
pub use executor::*;

use serde::{Deserialize, Serialize};

use crate::mechanics::{Direction, Priority, NARRATOR};

/// A single game action, as produced by the content writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub calls: Vec<FunctionCall>,
}

/// Fields shared by both card kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "narrator")]
    pub character: String,
    #[serde(default = "common_source")]
    pub source: String,
    #[serde(default)]
    pub priority: Priority,
}

fn narrator() -> String {
    NARRATOR.to_string()
}

fn common_source() -> String {
    Priority::Common.as_str().to_string()
}

impl CardInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            character: narrator(),
            source: common_source(),
            priority: Priority::Common,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceCard {
    #[serde(flatten)]
    pub info: CardInfo,
    pub left: Choice,
    pub right: Choice,
    #[serde(default)]
    pub tree_left: Vec<Card>,
    #[serde(default)]
    pub tree_right: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoCard {
    #[serde(flatten)]
    pub info: CardInfo,
    #[serde(default)]
    pub next_cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Card {
    Choice(ChoiceCard),
    Info(InfoCard),
}

impl Card {
    pub fn info(&self) -> &CardInfo {
        match self {
            Card::Choice(c) => &c.info,
            Card::Info(c) => &c.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut CardInfo {
        match self {
            Card::Choice(c) => &mut c.info,
            Card::Info(c) => &mut c.info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn priority(&self) -> Priority {
        self.info().priority
    }

    /// Re-tiers the card; the source label follows the tier.
    pub fn set_priority(&mut self, priority: Priority) {
        let info = self.info_mut();
        info.priority = priority;
        info.source = priority.as_str().to_string();
    }

    pub fn character(&self) -> &str {
        &self.info().character
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Card::Info(_))
    }

    /// Calls attached to the chosen side. Info cards have none.
    pub fn calls(&self, direction: Direction) -> &[FunctionCall] {
        match (self, direction) {
            (Card::Choice(c), Direction::Left) => &c.left.calls,
            (Card::Choice(c), Direction::Right) => &c.right.calls,
            (Card::Info(_), _) => &[],
        }
    }

    /// Cards to show right after this one, for the chosen side.
    pub fn follow_ups(&self, direction: Direction) -> &[Card] {
        match (self, direction) {
            (Card::Choice(c), Direction::Left) => &c.tree_left,
            (Card::Choice(c), Direction::Right) => &c.tree_right,
            (Card::Info(c), _) => &c.next_cards,
        }
    }
}
