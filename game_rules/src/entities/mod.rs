//! People in the game world: the player character and the NPC roster.

mod character;

pub use character::*;

use serde::{Deserialize, Serialize};

/// A named relationship between two entities ("player" or an NPC ID).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub a: String,
    pub b: String,
    pub relationship: String,
}

impl Relationship {
    pub fn involves(&self, entity_id: &str) -> bool {
        self.a == entity_id || self.b == entity_id
    }
}
