//! World definition produced by the content generator at session start.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::cards::FunctionCall;
use crate::entities::{Npc, PlayerCharacter, Relationship};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Temporary tags are never carried into the next life.
    #[serde(default)]
    pub is_temp: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonDef {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub on_week_end_calls: Vec<FunctionCall>,
    #[serde(default)]
    pub on_season_end_calls: Vec<FunctionCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotNodeDef {
    pub id: String,
    #[serde(default)]
    pub plot_description: String,
    /// Blank means always satisfied.
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub calls: Vec<FunctionCall>,
    #[serde(default, alias = "successor_ids")]
    pub next_nodes: Vec<String>,
    #[serde(default)]
    pub is_ending: bool,
    #[serde(default)]
    pub ending_text: Option<String>,
}

fn first_year() -> i32 {
    1
}

/// Everything the engine needs to open a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSchema {
    pub world_name: String,
    #[serde(default)]
    pub world_description: String,
    #[serde(default)]
    pub era: String,
    #[serde(default = "first_year")]
    pub starting_year: i32,
    #[serde(default)]
    pub resurrection_mechanic: String,
    #[serde(default)]
    pub resurrection_flavor: String,
    #[serde(default)]
    pub player_character: PlayerCharacter,
    #[serde(default)]
    pub stats: Vec<StatDef>,
    #[serde(default)]
    pub npcs: Vec<Npc>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub tags: Vec<TagDef>,
    #[serde(default)]
    pub plot_nodes: Vec<PlotNodeDef>,
    #[serde(default)]
    pub seasons: Vec<SeasonDef>,
    #[serde(default)]
    pub initial_stats: BTreeMap<String, i32>,
    #[serde(default)]
    pub initial_tags: Vec<String>,
}

impl WorldSchema {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn temp_tags(&self) -> BTreeSet<String> {
        self.tags
            .iter()
            .filter(|t| t.is_temp)
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn plot_node(&self, id: &str) -> Option<&PlotNodeDef> {
        self.plot_nodes.iter().find(|n| n.id == id)
    }
}
