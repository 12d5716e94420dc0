//! Context handed to the card writer before each batch.
//!
//! Collects what the writer needs from the engine into one serializable
//! value: who the player is, where the story stands, and which jobs are
//! waiting. [`GenerationContext::to_prompt_string`] renders it as markdown.

use serde::{Deserialize, Serialize};

use super::GameEngine;
use crate::jobs::CardGenJob;
use crate::story::WriterDagContext;
use game_rules::{EventDisplay, Npc, PlayerCharacter, Relationship};

/// Full context for one writer batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    /// Day 1 of a season: the writer should add structural cards.
    pub is_season_start: bool,
    pub is_first_day_after_death: bool,
    pub snapshot: StateSnapshot,
    pub dag_context: WriterDagContext,
    pub ongoing_events: Vec<EventDisplay>,
    pub available_tags: Vec<TagSummary>,
    pub season: SeasonContext,
    pub pending_jobs: Vec<CardGenJob>,
    pub common_count: usize,
}

/// Game state as the writer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub world: String,
    pub era: String,
    pub date: String,
    pub elapsed: String,
    pub life: u32,
    pub stats: Vec<StatLine>,
    pub tags: Vec<String>,
    pub karma: Vec<String>,
    pub previous_life_tags: Vec<String>,
    pub player: PlayerCharacter,
    /// Enabled NPCs only.
    pub npcs: Vec<Npc>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub id: String,
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonContext {
    pub name: String,
    pub description: String,
    pub week: u32,
}

impl GenerationContext {
    pub fn assemble(engine: &GameEngine) -> Self {
        let board = engine.state();
        let calendar = board.calendar();

        let stats = board
            .stats()
            .iter()
            .map(|(id, value)| StatLine {
                id: id.clone(),
                name: board.stat_name(id).to_string(),
                value: *value,
            })
            .collect();

        let snapshot = StateSnapshot {
            world: board.world.name.clone(),
            era: board.world.era.clone(),
            date: board.date_display(),
            elapsed: calendar.elapsed_display(),
            life: board.life(),
            stats,
            tags: board.tags().iter().cloned().collect(),
            karma: board.karma().iter().cloned().collect(),
            previous_life_tags: board.previous_life_tags().iter().cloned().collect(),
            player: board.player.clone(),
            npcs: board.enabled_npcs().cloned().collect(),
            relationships: board.relationships.clone(),
        };

        let season = board
            .current_season_def()
            .map(|s| SeasonContext {
                name: s.name.clone(),
                description: s.description.clone(),
                week: calendar.week_in_season(),
            })
            .unwrap_or_else(|| SeasonContext {
                week: calendar.week_in_season(),
                ..SeasonContext::default()
            });

        Self {
            is_season_start: engine.is_season_start(),
            is_first_day_after_death: board.is_first_day_after_death(),
            snapshot,
            dag_context: engine.dag().writer_context(),
            ongoing_events: engine.events_for_display(),
            available_tags: board
                .tag_defs
                .iter()
                .map(|t| TagSummary {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    description: t.description.clone(),
                })
                .collect(),
            season,
            pending_jobs: engine.jobs().pending().cloned().collect(),
            common_count: engine.common_count(),
        }
    }

    /// Format the context as a prompt string.
    pub fn to_prompt_string(&self) -> String {
        let snap = &self.snapshot;
        let mut prompt = String::new();

        prompt.push_str("## World\n");
        prompt.push_str(&format!("{} ({})\n", snap.world, snap.era));
        prompt.push_str(&format!(
            "{} | {}, week {} | Life {}\n",
            snap.date, self.season.name, self.season.week, snap.life
        ));
        if self.is_season_start {
            prompt.push_str("A new season begins.\n");
        }
        if self.is_first_day_after_death {
            prompt.push_str("The player has just been reborn.\n");
        }
        prompt.push('\n');

        prompt.push_str("## Player\n");
        prompt.push_str(&snap.player.name);
        if !snap.player.role.is_empty() {
            prompt.push_str(&format!(", {}", snap.player.role));
        }
        prompt.push('\n');
        for stat in &snap.stats {
            prompt.push_str(&format!("- {}: {}\n", stat.name, stat.value));
        }
        prompt.push_str(&format!(
            "Tags: {}\n",
            if snap.tags.is_empty() {
                "None".to_string()
            } else {
                snap.tags.join(", ")
            }
        ));
        if !snap.karma.is_empty() {
            prompt.push_str(&format!("Karma: {}\n", snap.karma.join(", ")));
        }
        prompt.push('\n');

        if !snap.npcs.is_empty() {
            prompt.push_str("## Characters\n");
            for npc in &snap.npcs {
                prompt.push_str(&format!("- {} ({}): {}\n", npc.name, npc.id, npc.role));
            }
            prompt.push('\n');
        }

        if !self.dag_context.fired.is_empty() || !self.dag_context.activatable.is_empty() {
            prompt.push_str("## Story So Far\n");
            for node in &self.dag_context.fired {
                prompt.push_str(&format!("- [done] {}\n", node.description));
            }
            for node in &self.dag_context.activatable {
                prompt.push_str(&format!("- [next] {}\n", node.description));
            }
            prompt.push('\n');
        }

        if !self.ongoing_events.is_empty() {
            prompt.push_str("## Ongoing Events\n");
            for event in &self.ongoing_events {
                prompt.push_str(&format!(
                    "- {} {} ({}): {}\n",
                    event.icon, event.name, event.progress, event.description
                ));
            }
            prompt.push('\n');
        }

        prompt.push_str("## Requests\n");
        prompt.push_str(&format!("Common cards: {}\n", self.common_count));
        for job in &self.pending_jobs {
            prompt.push_str(&format!(
                "- {}: {}\n",
                serde_json::to_string(&job.kind).unwrap_or_default(),
                serde_json::Value::Object(job.context.clone())
            ));
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{MacroDAG, PlotNode};
    use game_rules::{GameConfig, GlobalBlackboard, StatDef};

    fn engine() -> GameEngine {
        let mut board = GlobalBlackboard::default();
        board.world.name = "Vessaria".into();
        board.world.era = "Late Bronze".into();
        board.stat_defs.push(StatDef {
            id: "health".into(),
            name: "Health".into(),
            description: String::new(),
            icon: String::new(),
        });
        board.set_stat("health", 40);
        board.add_tag("wounded");
        let mut dag = MacroDAG::new();
        dag.add_node(PlotNode::new("arrival", "A stranger arrives.", "").unwrap())
            .unwrap();
        GameEngine::from_parts(board, dag, GameConfig::default())
    }

    #[test]
    fn test_assemble_reads_engine_state() {
        let ctx = engine().generation_context();

        assert!(ctx.is_season_start);
        assert_eq!(ctx.snapshot.stats[0].name, "Health");
        assert_eq!(ctx.snapshot.tags, vec!["wounded".to_string()]);
        assert_eq!(ctx.dag_context.activatable.len(), 1);
        assert_eq!(ctx.common_count, 7);
    }

    #[test]
    fn test_prompt_sections() {
        let mut engine = engine();
        engine.advance_week().unwrap();
        let prompt = engine.generation_context().to_prompt_string();

        assert!(prompt.contains("## World\nVessaria (Late Bronze)"));
        assert!(prompt.contains("- Health: 40"));
        assert!(prompt.contains("[done] A stranger arrives."));
        assert!(prompt.contains("\"plot\""));
    }
}
