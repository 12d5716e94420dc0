//! Character definitions.

use serde::{Deserialize, Serialize};

/// The player character. One per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    #[serde(default = "player_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub traits: Vec<String>,
}

fn player_id() -> String {
    "player".to_string()
}

impl PlayerCharacter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: player_id(),
            name: name.into(),
            role: String::new(),
            description: String::new(),
            traits: Vec::new(),
        }
    }
}

impl Default for PlayerCharacter {
    fn default() -> Self {
        Self::new("")
    }
}

/// A non-player character that cards can feature.
///
/// Disabled NPCs stay in the roster but are hidden from the writer and
/// from condition checks on `npcs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub appearance_count: u32,
}

fn enabled_by_default() -> bool {
    true
}

impl Npc {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: String::new(),
            description: String::new(),
            traits: Vec::new(),
            enabled: true,
            appearance_count: 0,
        }
    }

    /// Matches either the NPC ID or its display name.
    pub fn is_called(&self, who: &str) -> bool {
        self.id == who || self.name == who
    }
}
