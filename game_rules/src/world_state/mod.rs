//! World state management - the blackboard holding all mutable game data.
//!
//! Collections are ordered (`BTreeMap` / `BTreeSet`) so every "first"
//! and "up to N" selection over stats, tags or events follows ascending
//! ID order.

mod calendar;

pub use calendar::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::cards::Card;
use crate::condition::ConditionContext;
use crate::config::GameConfig;
use crate::entities::{Npc, PlayerCharacter, Relationship};
use crate::error::RulesError;
use crate::events::Event;
use crate::mechanics::clamp_stat;
use crate::schema::{SeasonDef, StatDef, TagDef, WorldSchema};

/// World metadata, fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldInfo {
    pub name: String,
    pub era: String,
    pub description: String,
    #[serde(default)]
    pub resurrection_mechanic: String,
    #[serde(default)]
    pub resurrection_flavor: String,
}

/// Slots for pre-generated structural info cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralSlot {
    Welcome,
    Reborn,
    SeasonStart,
}

/// How the current life ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub cause_stat: String,
    /// Elapsed days at the moment of death.
    pub turn: i64,
}

/// The single source of truth during a play session.
///
/// World definitions are public. Everything that changes during play is
/// reached through accessors, which keep stats clamped and collections
/// consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalBlackboard {
    pub world: WorldInfo,
    pub player: PlayerCharacter,
    #[serde(default)]
    pub stat_defs: Vec<StatDef>,
    #[serde(default)]
    pub tag_defs: Vec<TagDef>,
    #[serde(default)]
    pub seasons: Vec<SeasonDef>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,

    pub(crate) stats: BTreeMap<String, i32>,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) npcs: BTreeMap<String, Npc>,
    pub(crate) events: BTreeMap<String, Event>,
    pub(crate) calendar: Calendar,

    pub(crate) is_alive: bool,
    pub(crate) life: u32,
    pub(crate) death: Option<DeathRecord>,
    pub(crate) karma: BTreeSet<String>,
    pub(crate) previous_life_tags: BTreeSet<String>,
    pub(crate) is_first_day_after_death: bool,

    #[serde(default)]
    pub(crate) structural_cards: BTreeMap<StructuralSlot, Card>,
    /// Keyed `death_<stat>_<min|max>`.
    #[serde(default)]
    pub(crate) pending_death_cards: BTreeMap<String, Card>,
}

impl GlobalBlackboard {
    pub fn new(starting_year: i32) -> Self {
        Self {
            world: WorldInfo::default(),
            player: PlayerCharacter::default(),
            stat_defs: Vec::new(),
            tag_defs: Vec::new(),
            seasons: Vec::new(),
            relationships: Vec::new(),
            stats: BTreeMap::new(),
            tags: BTreeSet::new(),
            npcs: BTreeMap::new(),
            events: BTreeMap::new(),
            calendar: Calendar::new(starting_year),
            is_alive: true,
            life: 1,
            death: None,
            karma: BTreeSet::new(),
            previous_life_tags: BTreeSet::new(),
            is_first_day_after_death: false,
            structural_cards: BTreeMap::new(),
            pending_death_cards: BTreeMap::new(),
        }
    }

    /// Builds the opening state of a session from the generated world.
    ///
    /// Every defined stat starts at its `initial_stats` entry, or at the
    /// configured default.
    pub fn from_schema(schema: &WorldSchema, config: &GameConfig) -> Self {
        let mut board = Self::new(schema.starting_year);
        board.world = WorldInfo {
            name: schema.world_name.clone(),
            era: schema.era.clone(),
            description: schema.world_description.clone(),
            resurrection_mechanic: schema.resurrection_mechanic.clone(),
            resurrection_flavor: schema.resurrection_flavor.clone(),
        };
        board.player = schema.player_character.clone();
        board.stat_defs = schema.stats.clone();
        board.tag_defs = schema.tags.clone();
        board.seasons = schema.seasons.clone();
        board.relationships = schema.relationships.clone();

        for def in &schema.stats {
            let value = schema
                .initial_stats
                .get(&def.id)
                .copied()
                .unwrap_or(config.default_stat);
            board.set_stat(&def.id, value.into());
        }
        for (id, value) in &schema.initial_stats {
            if !board.stats.contains_key(id) {
                board.set_stat(id, (*value).into());
            }
        }
        board.tags = schema.initial_tags.iter().cloned().collect();
        for npc in &schema.npcs {
            board.insert_npc(npc.clone());
        }
        board
    }

    // -- stats ---------------------------------------------------------

    pub fn stats(&self) -> &BTreeMap<String, i32> {
        &self.stats
    }

    pub fn stat(&self, id: &str) -> Option<i32> {
        self.stats.get(id).copied()
    }

    /// Writes a stat, clamped into range. Returns the stored value.
    pub fn set_stat(&mut self, id: &str, value: i64) -> i32 {
        let clamped = clamp_stat(value);
        self.stats.insert(id.to_string(), clamped);
        clamped
    }

    /// Adds `delta` to an existing stat and returns the change actually
    /// applied after clamping.
    pub fn apply_stat_delta(&mut self, id: &str, delta: i64) -> Result<i32, RulesError> {
        let old = self
            .stat(id)
            .ok_or_else(|| RulesError::UnknownStat(id.to_string()))?;
        let new = self.set_stat(id, i64::from(old).saturating_add(delta));
        Ok(new - old)
    }

    pub fn stat_def(&self, id: &str) -> Option<&StatDef> {
        self.stat_defs.iter().find(|d| d.id == id)
    }

    pub fn stat_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.stat_def(id).map(|d| d.name.as_str()).unwrap_or(id)
    }

    // -- tags ----------------------------------------------------------

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns false when the tag was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn tag_def(&self, id: &str) -> Option<&TagDef> {
        self.tag_defs.iter().find(|d| d.id == id)
    }

    /// Tags flagged as temporary in the world definition.
    pub fn temp_tags(&self) -> BTreeSet<String> {
        self.tag_defs
            .iter()
            .filter(|d| d.is_temp)
            .map(|d| d.id.clone())
            .collect()
    }

    // -- NPCs ----------------------------------------------------------

    pub fn npcs(&self) -> &BTreeMap<String, Npc> {
        &self.npcs
    }

    pub fn npc(&self, id: &str) -> Option<&Npc> {
        self.npcs.get(id)
    }

    pub fn insert_npc(&mut self, npc: Npc) {
        self.npcs.insert(npc.id.clone(), npc);
    }

    /// Returns false when no NPC has that ID.
    pub fn set_npc_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.npcs.get_mut(id) {
            Some(npc) => {
                npc.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Bumps the appearance counter of the NPC matching `who` by ID or name.
    pub fn record_appearance(&mut self, who: &str) -> bool {
        match self.npcs.values_mut().find(|n| n.is_called(who)) {
            Some(npc) => {
                npc.appearance_count += 1;
                true
            }
            None => false,
        }
    }

    pub fn enabled_npcs(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values().filter(|n| n.enabled)
    }

    // -- events --------------------------------------------------------

    pub fn events(&self) -> &BTreeMap<String, Event> {
        &self.events
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn event_mut(&mut self, id: &str) -> Option<&mut Event> {
        self.events.get_mut(id)
    }

    /// Registers an event, replacing any event with the same ID.
    pub fn insert_event(&mut self, event: Event) -> Option<Event> {
        self.events.insert(event.id().to_string(), event)
    }

    pub fn remove_event(&mut self, id: &str) -> Option<Event> {
        self.events.remove(id)
    }

    // -- calendar ------------------------------------------------------

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn today(&self) -> GameDate {
        self.calendar.today()
    }

    pub fn advance_day(&mut self) -> DayBoundary {
        self.calendar.advance_day()
    }

    pub fn season_def(&self, index: u32) -> Option<&SeasonDef> {
        self.seasons.get(usize::try_from(index).ok()?)
    }

    pub fn current_season_def(&self) -> Option<&SeasonDef> {
        self.season_def(self.calendar.season)
    }

    pub fn date_display(&self) -> String {
        self.calendar
            .date_display(self.current_season_def().map(|s| s.name.as_str()))
    }

    // -- life cycle ----------------------------------------------------

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn life(&self) -> u32 {
        self.life
    }

    pub fn death(&self) -> Option<&DeathRecord> {
        self.death.as_ref()
    }

    pub fn karma(&self) -> &BTreeSet<String> {
        &self.karma
    }

    pub fn previous_life_tags(&self) -> &BTreeSet<String> {
        &self.previous_life_tags
    }

    pub fn is_first_day_after_death(&self) -> bool {
        self.is_first_day_after_death
    }

    pub fn set_first_day_after_death(&mut self, value: bool) {
        self.is_first_day_after_death = value;
    }

    // -- structural cards ----------------------------------------------

    pub fn store_structural_card(&mut self, slot: StructuralSlot, card: Card) {
        self.structural_cards.insert(slot, card);
    }

    pub fn structural_card(&self, slot: StructuralSlot) -> Option<&Card> {
        self.structural_cards.get(&slot)
    }

    pub fn take_structural_card(&mut self, slot: StructuralSlot) -> Option<Card> {
        self.structural_cards.remove(&slot)
    }

    pub fn store_death_card(&mut self, key: impl Into<String>, card: Card) {
        self.pending_death_cards.insert(key.into(), card);
    }

    pub fn death_card(&self, key: &str) -> Option<&Card> {
        self.pending_death_cards.get(key)
    }

    pub fn take_death_card(&mut self, key: &str) -> Option<Card> {
        self.pending_death_cards.remove(key)
    }

    pub fn clear_death_cards(&mut self) {
        self.pending_death_cards.clear();
    }

    // -- conditions ----------------------------------------------------

    /// Owned snapshot for condition evaluation.
    pub fn condition_context(&self) -> ConditionContext {
        ConditionContext {
            stats: self.stats.clone(),
            tags: self.tags.clone(),
            events: self.events.keys().cloned().collect(),
            npcs: self
                .enabled_npcs()
                .map(|n| n.id.clone())
                .collect(),
            day: self.calendar.day,
            season: self.calendar.season,
            year: self.calendar.year,
            elapsed_days: self.calendar.elapsed_days(),
            turn: self.calendar.turn,
            life: self.life,
            is_alive: self.is_alive,
        }
    }
}

impl Default for GlobalBlackboard {
    fn default() -> Self {
        Self::new(1)
    }
}
