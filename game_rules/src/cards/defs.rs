//! Writer-supplied card definitions and their validation into [`Card`]s.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Card, CardInfo, Choice, ChoiceCard, FunctionCall, InfoCard};
use crate::mechanics::{Priority, NARRATOR};
use crate::world_state::GlobalBlackboard;

/// Follow-up nesting deeper than this is dropped.
pub const MAX_TREE_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CardDef {
    Choice(ChoiceCardDef),
    Info(InfoCardDef),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceCardDef {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub source: String,
    pub left_text: String,
    #[serde(default)]
    pub left_calls: Vec<FunctionCall>,
    pub right_text: String,
    #[serde(default)]
    pub right_calls: Vec<FunctionCall>,
    #[serde(default)]
    pub tree_left: Vec<CardDef>,
    #[serde(default)]
    pub tree_right: Vec<CardDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoCardDef {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub next_cards: Vec<CardDef>,
}

/// Short random card ID: the first eight hex digits of a v4 UUID.
pub fn generate_card_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

impl CardDef {
    pub fn id(&self) -> Option<&str> {
        match self {
            CardDef::Choice(d) => d.id.as_deref(),
            CardDef::Info(d) => d.id.as_deref(),
        }
    }

    /// Converts the definition into a playable card.
    ///
    /// Unknown characters become the narrator, unknown sources become
    /// common, missing IDs are generated. Follow-up cards are validated
    /// the same way, down to [`MAX_TREE_DEPTH`].
    pub fn validate(&self, board: &GlobalBlackboard) -> Card {
        self.validate_at(board, 0)
    }

    fn validate_at(&self, board: &GlobalBlackboard, depth: usize) -> Card {
        let (id, title, description, character, source) = match self {
            CardDef::Choice(d) => (&d.id, &d.title, &d.description, &d.character, &d.source),
            CardDef::Info(d) => (&d.id, &d.title, &d.description, &d.character, &d.source),
        };

        let priority = Priority::from_source(source);
        let info = CardInfo {
            id: id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(generate_card_id),
            title: title.clone(),
            description: description.clone(),
            character: known_character(character, board),
            source: priority.as_str().to_string(),
            priority,
        };

        let card_id = info.id.clone();
        let children = |defs: &[CardDef]| -> Vec<Card> {
            if depth + 1 >= MAX_TREE_DEPTH {
                if !defs.is_empty() {
                    tracing::warn!(card_id = %card_id, dropped = defs.len(), "follow-up cards nested too deep");
                }
                return Vec::new();
            }
            defs.iter().map(|d| d.validate_at(board, depth + 1)).collect()
        };

        match self {
            CardDef::Choice(d) => Card::Choice(ChoiceCard {
                left: Choice {
                    text: d.left_text.clone(),
                    calls: d.left_calls.clone(),
                },
                right: Choice {
                    text: d.right_text.clone(),
                    calls: d.right_calls.clone(),
                },
                tree_left: children(&d.tree_left),
                tree_right: children(&d.tree_right),
                info,
            }),
            CardDef::Info(d) => Card::Info(InfoCard {
                next_cards: children(&d.next_cards),
                info,
            }),
        }
    }
}

fn known_character(character: &str, board: &GlobalBlackboard) -> String {
    if board.npc(character).is_some() {
        character.to_string()
    } else {
        NARRATOR.to_string()
    }
}
