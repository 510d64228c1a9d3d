//! Read-only game data consulted by the script loader and the runtime.
//!
//! [`GameCatalog`] is the lookup surface; [`CatalogData`] is the concrete
//! implementation backed by ordered maps and loadable from a JSON dump.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dbscript::errors::ScriptError;
use crate::world::object::{GameObjectType, Position, QuestStatus};

/// Quest objective that can be completed by exploration or a scripted event.
pub const QUEST_SPECIAL_FLAG_EXPLORATION_OR_EVENT: u32 = 0x0000_0002;

pub const MAX_EFFECT_INDEX: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub entry: u32,
    pub name: String,
    #[serde(default)]
    pub display_ids: Vec<u32>,
    #[serde(default)]
    pub faction: u32,
    #[serde(default)]
    pub script_name: String,
}

impl CreatureTemplate {
    /// First non-zero model, mirroring how a fresh spawn picks its display.
    pub fn choose_display_id(&self) -> u32 {
        self.display_ids
            .iter()
            .copied()
            .find(|id| *id != 0)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureSpawn {
    pub guid: u32,
    pub entry: u32,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameObjectTemplate {
    pub entry: u32,
    pub name: String,
    pub go_type: GameObjectType,
    /// Event ids raised by this object (goober, chest, camera, capture point slots).
    #[serde(default)]
    pub event_ids: Vec<u32>,
    #[serde(default)]
    pub script_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameObjectSpawn {
    pub guid: u32,
    pub entry: u32,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestTemplate {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub special_flags: u32,
}

impl QuestTemplate {
    pub fn has_special_flag(&self, flag: u32) -> bool {
        self.special_flags & flag != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellEffectKind {
    #[default]
    None,
    Dummy,
    ScriptEffect,
    TriggerSpell,
    SendEvent,
    SendTaxi,
    ApplyAura,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpellEffect {
    #[serde(default)]
    pub kind: SpellEffectKind,
    #[serde(default)]
    pub misc_value: i32,
    #[serde(default)]
    pub trigger_spell: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub effects: [SpellEffect; MAX_EFFECT_INDEX],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub entry: u32,
    pub name: String,
    #[serde(default)]
    pub script_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub battleground: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionTemplate {
    pub id: u32,
    /// Faction templates treated as friendly, besides the template itself.
    #[serde(default)]
    pub friendly: Vec<u32>,
}

impl FactionTemplate {
    pub fn is_friendly_to(&self, other: u32) -> bool {
        self.id == other || self.friendly.contains(&other)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxiPathNode {
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub arrival_event_id: u32,
    #[serde(default)]
    pub departure_event_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxiPath {
    pub id: u32,
    #[serde(default)]
    pub nodes: Vec<TaxiPathNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaTrigger {
    pub id: u32,
    pub map_id: u32,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    #[default]
    Say,
    Yell,
    TextEmote,
    BossEmote,
    Whisper,
    BossWhisper,
    ZoneYell,
}

impl ChatType {
    pub fn needs_player_target(self) -> bool {
        matches!(self, ChatType::Whisper | ChatType::BossWhisper)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptText {
    pub id: i32,
    pub text: String,
    #[serde(default)]
    pub chat_type: ChatType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelComparison {
    Equal,
    AtLeast,
    AtMost,
}

/// Stored condition evaluated against a player and an optional second object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerCondition {
    Always,
    HasAura { spell_id: u32 },
    HasItem { item: u32, count: u32 },
    QuestStatus { quest: u32, status: QuestStatus },
    QuestNone { quest: u32 },
    Level { level: u8, comparison: LevelComparison },
    /// Second object is alive (creatures), or present (anything else).
    SecondAlive,
    /// Living creature with `entry` within `radius` of the player.
    NearCreature { entry: u32, radius: f32 },
    Not { condition: u32 },
    And { first: u32, second: u32 },
    Or { first: u32, second: u32 },
}

/// Read-only lookups the loader, resolver and dispatcher need.
///
/// Every method is return-or-absent; nothing here mutates game data.
pub trait GameCatalog: Send + Sync {
    fn creature_template(&self, entry: u32) -> Option<&CreatureTemplate>;
    fn creature_spawn(&self, guid: u32) -> Option<&CreatureSpawn>;
    fn game_object_template(&self, entry: u32) -> Option<&GameObjectTemplate>;
    fn game_object_templates(&self) -> Box<dyn Iterator<Item = &GameObjectTemplate> + '_>;
    fn game_object_spawn(&self, guid: u32) -> Option<&GameObjectSpawn>;
    fn quest(&self, id: u32) -> Option<&QuestTemplate>;
    fn spell(&self, id: u32) -> Option<&SpellEntry>;
    fn spells(&self) -> Box<dyn Iterator<Item = &SpellEntry> + '_>;
    fn item_template(&self, entry: u32) -> Option<&ItemTemplate>;
    fn map(&self, id: u32) -> Option<&MapEntry>;
    fn faction_template(&self, id: u32) -> Option<&FactionTemplate>;
    fn taxi_path(&self, id: u32) -> Option<&TaxiPath>;
    fn taxi_paths(&self) -> Box<dyn Iterator<Item = &TaxiPath> + '_>;
    fn area_trigger(&self, id: u32) -> Option<&AreaTrigger>;
    fn condition(&self, id: u32) -> Option<&PlayerCondition>;
    fn script_text(&self, id: i32) -> Option<&ScriptText>;
    fn script_texts(&self) -> Box<dyn Iterator<Item = &ScriptText> + '_>;
    fn has_emote(&self, id: u32) -> bool;
    fn has_sound(&self, id: u32) -> bool;
    fn has_display_model(&self, id: u32) -> bool;
    /// Every non-empty script name referenced by templates the catalog owns.
    fn owned_script_names(&self) -> Vec<String>;
}

/// Map-backed catalog. Serializes as a single JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogData {
    pub creature_templates: BTreeMap<u32, CreatureTemplate>,
    pub creature_spawns: BTreeMap<u32, CreatureSpawn>,
    pub game_object_templates: BTreeMap<u32, GameObjectTemplate>,
    pub game_object_spawns: BTreeMap<u32, GameObjectSpawn>,
    pub quests: BTreeMap<u32, QuestTemplate>,
    pub spells: BTreeMap<u32, SpellEntry>,
    pub item_templates: BTreeMap<u32, ItemTemplate>,
    pub maps: BTreeMap<u32, MapEntry>,
    pub factions: BTreeMap<u32, FactionTemplate>,
    pub taxi_paths: BTreeMap<u32, TaxiPath>,
    pub area_triggers: BTreeMap<u32, AreaTrigger>,
    pub conditions: BTreeMap<u32, PlayerCondition>,
    pub script_texts: BTreeMap<i32, ScriptText>,
    pub emotes: BTreeSet<u32>,
    pub sounds: BTreeSet<u32>,
    pub display_models: BTreeSet<u32>,
    /// Script names bound to instance maps, keyed by map id.
    pub instance_scripts: BTreeMap<u32, String>,
    /// Script names bound to continent maps, keyed by map id.
    pub world_scripts: BTreeMap<u32, String>,
}

impl CatalogData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let catalog: CatalogData = serde_json::from_str(&contents)?;
        log::info!(
            "Loaded game catalog from {} ({} creatures, {} objects, {} quests, {} spells)",
            path.display(),
            catalog.creature_templates.len(),
            catalog.game_object_templates.len(),
            catalog.quests.len(),
            catalog.spells.len()
        );
        Ok(catalog)
    }

    pub fn with_creature(mut self, entry: u32, name: &str, display_id: u32, faction: u32) -> Self {
        self.creature_templates.insert(
            entry,
            CreatureTemplate {
                entry,
                name: name.to_string(),
                display_ids: vec![display_id],
                faction,
                script_name: String::new(),
            },
        );
        self
    }

    pub fn with_creature_spawn(mut self, guid: u32, entry: u32, position: Position) -> Self {
        self.creature_spawns.insert(
            guid,
            CreatureSpawn {
                guid,
                entry,
                position,
            },
        );
        self
    }

    pub fn with_game_object(mut self, entry: u32, name: &str, go_type: GameObjectType) -> Self {
        self.game_object_templates.insert(
            entry,
            GameObjectTemplate {
                entry,
                name: name.to_string(),
                go_type,
                event_ids: Vec::new(),
                script_name: String::new(),
            },
        );
        self
    }

    pub fn with_game_object_spawn(mut self, guid: u32, entry: u32, position: Position) -> Self {
        self.game_object_spawns.insert(
            guid,
            GameObjectSpawn {
                guid,
                entry,
                position,
            },
        );
        self
    }

    pub fn with_quest(mut self, id: u32, title: &str, special_flags: u32) -> Self {
        self.quests.insert(
            id,
            QuestTemplate {
                id,
                title: title.to_string(),
                special_flags,
            },
        );
        self
    }

    pub fn with_spell(mut self, id: u32, name: &str, effects: [SpellEffect; MAX_EFFECT_INDEX]) -> Self {
        self.spells.insert(
            id,
            SpellEntry {
                id,
                name: name.to_string(),
                effects,
            },
        );
        self
    }

    pub fn with_item(mut self, entry: u32, name: &str) -> Self {
        self.item_templates.insert(
            entry,
            ItemTemplate {
                entry,
                name: name.to_string(),
                script_name: String::new(),
            },
        );
        self
    }

    pub fn with_map(mut self, id: u32, name: &str, battleground: bool) -> Self {
        self.maps.insert(
            id,
            MapEntry {
                id,
                name: name.to_string(),
                battleground,
            },
        );
        self
    }

    pub fn with_faction(mut self, id: u32, friendly: &[u32]) -> Self {
        self.factions.insert(
            id,
            FactionTemplate {
                id,
                friendly: friendly.to_vec(),
            },
        );
        self
    }

    pub fn with_taxi_path(mut self, id: u32, nodes: Vec<TaxiPathNode>) -> Self {
        self.taxi_paths.insert(id, TaxiPath { id, nodes });
        self
    }

    pub fn with_area_trigger(mut self, id: u32, map_id: u32, position: Position, radius: f32) -> Self {
        self.area_triggers.insert(
            id,
            AreaTrigger {
                id,
                map_id,
                position,
                radius,
            },
        );
        self
    }

    pub fn with_condition(mut self, id: u32, condition: PlayerCondition) -> Self {
        self.conditions.insert(id, condition);
        self
    }

    pub fn with_text(mut self, id: i32, text: &str, chat_type: ChatType) -> Self {
        self.script_texts.insert(
            id,
            ScriptText {
                id,
                text: text.to_string(),
                chat_type,
            },
        );
        self
    }

    pub fn with_emotes(mut self, ids: &[u32]) -> Self {
        self.emotes.extend(ids.iter().copied());
        self
    }

    pub fn with_sounds(mut self, ids: &[u32]) -> Self {
        self.sounds.extend(ids.iter().copied());
        self
    }

    pub fn with_display_models(mut self, ids: &[u32]) -> Self {
        self.display_models.extend(ids.iter().copied());
        self
    }

    /// Marks the given quests as completable by exploration or event.
    ///
    /// The loader reports quests whose scripts complete them this way without
    /// the flag; the owner of the catalog applies the correction after loading.
    pub fn apply_quest_corrections<'a, I>(&mut self, quest_ids: I) -> usize
    where
        I: IntoIterator<Item = &'a u32>,
    {
        let mut changed = 0;
        for id in quest_ids {
            if let Some(quest) = self.quests.get_mut(id) {
                if !quest.has_special_flag(QUEST_SPECIAL_FLAG_EXPLORATION_OR_EVENT) {
                    quest.special_flags |= QUEST_SPECIAL_FLAG_EXPLORATION_OR_EVENT;
                    changed += 1;
                }
            }
        }
        changed
    }
}

impl GameCatalog for CatalogData {
    fn creature_template(&self, entry: u32) -> Option<&CreatureTemplate> {
        self.creature_templates.get(&entry)
    }

    fn creature_spawn(&self, guid: u32) -> Option<&CreatureSpawn> {
        self.creature_spawns.get(&guid)
    }

    fn game_object_template(&self, entry: u32) -> Option<&GameObjectTemplate> {
        self.game_object_templates.get(&entry)
    }

    fn game_object_templates(&self) -> Box<dyn Iterator<Item = &GameObjectTemplate> + '_> {
        Box::new(self.game_object_templates.values())
    }

    fn game_object_spawn(&self, guid: u32) -> Option<&GameObjectSpawn> {
        self.game_object_spawns.get(&guid)
    }

    fn quest(&self, id: u32) -> Option<&QuestTemplate> {
        self.quests.get(&id)
    }

    fn spell(&self, id: u32) -> Option<&SpellEntry> {
        self.spells.get(&id)
    }

    fn spells(&self) -> Box<dyn Iterator<Item = &SpellEntry> + '_> {
        Box::new(self.spells.values())
    }

    fn item_template(&self, entry: u32) -> Option<&ItemTemplate> {
        self.item_templates.get(&entry)
    }

    fn map(&self, id: u32) -> Option<&MapEntry> {
        self.maps.get(&id)
    }

    fn faction_template(&self, id: u32) -> Option<&FactionTemplate> {
        self.factions.get(&id)
    }

    fn taxi_path(&self, id: u32) -> Option<&TaxiPath> {
        self.taxi_paths.get(&id)
    }

    fn taxi_paths(&self) -> Box<dyn Iterator<Item = &TaxiPath> + '_> {
        Box::new(self.taxi_paths.values())
    }

    fn area_trigger(&self, id: u32) -> Option<&AreaTrigger> {
        self.area_triggers.get(&id)
    }

    fn condition(&self, id: u32) -> Option<&PlayerCondition> {
        self.conditions.get(&id)
    }

    fn script_text(&self, id: i32) -> Option<&ScriptText> {
        self.script_texts.get(&id)
    }

    fn script_texts(&self) -> Box<dyn Iterator<Item = &ScriptText> + '_> {
        Box::new(self.script_texts.values())
    }

    fn has_emote(&self, id: u32) -> bool {
        self.emotes.contains(&id)
    }

    fn has_sound(&self, id: u32) -> bool {
        self.sounds.contains(&id)
    }

    fn has_display_model(&self, id: u32) -> bool {
        self.display_models.contains(&id)
    }

    fn owned_script_names(&self) -> Vec<String> {
        let names = self
            .creature_templates
            .values()
            .map(|t| t.script_name.as_str())
            .chain(self.game_object_templates.values().map(|t| t.script_name.as_str()))
            .chain(self.item_templates.values().map(|t| t.script_name.as_str()))
            .chain(self.instance_scripts.values().map(String::as_str))
            .chain(self.world_scripts.values().map(String::as_str))
            .filter(|name| !name.is_empty());
        let unique: BTreeSet<&str> = names.collect();
        unique.into_iter().map(str::to_string).collect()
    }
}
