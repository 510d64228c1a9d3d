//! Row validation and table construction.
//!
//! Every row goes through the same pipeline: decode, generic buddy checks,
//! flag checks, then the command-specific rules. A failing row is logged under
//! the `db_scripts` target and dropped; nothing here aborts a load.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::dbscript::command::{
    CommandKind, CommandPayload, ScriptCommand, ScriptFlags, ScriptRow, GO_INTERACT, GO_LOCK,
    GO_NON_INTERACT, GO_UNLOCK, SOUND_FLAG_DISTANCE, SOUND_FLAG_MAP_WIDE, SOUND_FLAG_TARGET_PLAYER,
    SOUND_FLAG_ZONE_WIDE,
};
use crate::dbscript::errors::{LoadValidationError, ScriptError};
use crate::dbscript::names::ScriptNames;
use crate::dbscript::table::{ScriptTable, ScriptTableKind};
use crate::logutil::escape_log;
use crate::world::catalog::{
    GameCatalog, SpellEffectKind, SpellEntry, MAX_EFFECT_INDEX,
    QUEST_SPECIAL_FLAG_EXPLORATION_OR_EVENT,
};
use crate::world::object::GameObjectType;

pub const MIN_DB_SCRIPT_STRING_ID: i32 = 2_000_000_000;
pub const MAX_DB_SCRIPT_STRING_ID: i32 = 2_000_010_000;
pub const DEFAULT_VISIBILITY_DISTANCE: f32 = 90.0;
pub const INTERACTION_DISTANCE: f32 = 5.0;
pub const MAX_UNIT_STAND_STATE: u32 = 9;

const LOG_TARGET: &str = "db_scripts";

/// Trigger id bound to a named supplementary-module script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedScript {
    pub id: u32,
    pub script_name: String,
}

/// Where raw script rows come from.
pub trait RowSource {
    fn script_rows(&self, table: &str) -> Result<Vec<ScriptRow>, ScriptError>;
    fn area_trigger_scripts(&self) -> Result<Vec<NamedScript>, ScriptError>;
    fn event_id_scripts(&self) -> Result<Vec<NamedScript>, ScriptError>;
    /// Script names owned by sources other than the game catalog.
    fn script_names(&self) -> Result<Vec<String>, ScriptError>;
}

/// Rows held in memory, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    pub tables: BTreeMap<String, Vec<ScriptRow>>,
    pub area_triggers: Vec<NamedScript>,
    pub event_ids: Vec<NamedScript>,
    pub names: Vec<String>,
}

impl MemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<ScriptRow>) -> Self {
        self.tables.entry(table.to_string()).or_default().extend(rows);
        self
    }

    pub fn with_area_trigger(mut self, id: u32, script_name: &str) -> Self {
        self.area_triggers.push(NamedScript {
            id,
            script_name: script_name.to_string(),
        });
        self
    }

    pub fn with_event_id(mut self, id: u32, script_name: &str) -> Self {
        self.event_ids.push(NamedScript {
            id,
            script_name: script_name.to_string(),
        });
        self
    }
}

impl RowSource for MemoryRowSource {
    fn script_rows(&self, table: &str) -> Result<Vec<ScriptRow>, ScriptError> {
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    fn area_trigger_scripts(&self) -> Result<Vec<NamedScript>, ScriptError> {
        Ok(self.area_triggers.clone())
    }

    fn event_id_scripts(&self) -> Result<Vec<NamedScript>, ScriptError> {
        Ok(self.event_ids.clone())
    }

    fn script_names(&self) -> Result<Vec<String>, ScriptError> {
        Ok(self.names.clone())
    }
}

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Reject taxi paths that a spell can already trigger.
    pub strict_checks: bool,
    pub text_id_range: Range<i32>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            strict_checks: true,
            text_id_range: MIN_DB_SCRIPT_STRING_ID..MAX_DB_SCRIPT_STRING_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub id: u32,
    pub command: u32,
    pub reason: LoadValidationError,
}

/// Outcome of loading one table.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub table: String,
    pub loaded: usize,
    pub rejected: Vec<RejectedRow>,
    /// Quests completed by exploration scripts that lack the matching flag.
    pub quest_corrections: BTreeSet<u32>,
    /// Script ids with no matching spawn/template/quest/spell/event.
    pub unknown_ids: Vec<u32>,
}

/// Findings of the cross-table text check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextReport {
    /// (table, script id, text id) for talk texts with no string.
    pub missing: Vec<(String, u32, i32)>,
    pub unused: Vec<i32>,
}

pub struct ScriptLoader<'a> {
    catalog: &'a dyn GameCatalog,
    options: LoaderOptions,
}

impl<'a> ScriptLoader<'a> {
    pub fn new(catalog: &'a dyn GameCatalog) -> Self {
        Self::with_options(catalog, LoaderOptions::default())
    }

    pub fn with_options(catalog: &'a dyn GameCatalog, options: LoaderOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Loads, validates and cross-checks one table.
    pub fn load_table(
        &self,
        source: &dyn RowSource,
        kind: ScriptTableKind,
        table_name: &str,
    ) -> Result<(ScriptTable, LoadReport), ScriptError> {
        info!(target: LOG_TARGET, "{} :", table_name);
        let rows = source.script_rows(table_name)?;

        let mut report = LoadReport {
            table: table_name.to_string(),
            ..LoadReport::default()
        };
        let mut accepted = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.validate_row(table_name, row, &mut report.quest_corrections) {
                Ok(command) => accepted.push(command),
                Err(reason) => {
                    error!(
                        target: LOG_TARGET,
                        "Table `{}` id {} command {}: {}, skipping.",
                        table_name, row.id, row.command, reason
                    );
                    report.rejected.push(RejectedRow {
                        id: row.id,
                        command: row.command,
                        reason,
                    });
                }
            }
        }
        report.loaded = accepted.len();

        let table = ScriptTable::from_commands(kind, table_name, accepted);
        report.unknown_ids = self.check_table_ids(&table);
        info!(target: LOG_TARGET, ">> Loaded {} script definitions", report.loaded);
        Ok((table, report))
    }

    /// Decodes and validates a single row.
    pub fn validate_row(
        &self,
        table_name: &str,
        row: &ScriptRow,
        quest_corrections: &mut BTreeSet<u32>,
    ) -> Result<ScriptCommand, LoadValidationError> {
        let command = ScriptCommand::from_row(row)?;
        self.check_buddy(&command)?;
        self.check_flags(&command)?;
        self.check_command(table_name, &command, quest_corrections)?;
        Ok(command)
    }

    fn check_buddy(&self, command: &ScriptCommand) -> Result<(), LoadValidationError> {
        if command.buddy_entry == 0 || command.has_flag(ScriptFlags::BUDDY_BY_GUID) {
            return Ok(());
        }
        if command.is_creature_buddy() {
            if self.catalog.creature_template(command.buddy_entry).is_none() {
                return Err(LoadValidationError::UnknownBuddyTemplate {
                    entry: command.buddy_entry,
                    kind: "creature",
                });
            }
        } else if self.catalog.game_object_template(command.buddy_entry).is_none() {
            return Err(LoadValidationError::UnknownBuddyTemplate {
                entry: command.buddy_entry,
                kind: "gameobject",
            });
        }
        if command.search_radius_or_guid == 0 {
            return Err(LoadValidationError::ZeroSearchRadius {
                entry: command.buddy_entry,
            });
        }
        Ok(())
    }

    fn check_flags(&self, command: &ScriptCommand) -> Result<(), LoadValidationError> {
        let bits = command.flags.bits();
        if command.is_additional() && !command.kind().supports_additional_flag() {
            return Err(LoadValidationError::AdditionalNotSupported(bits));
        }
        if command.has_flag(ScriptFlags::BUDDY_AS_TARGET) && command.buddy_entry == 0 {
            return Err(LoadValidationError::BuddyRequired(bits));
        }
        if command.has_flag(ScriptFlags::BUDDY_BY_GUID) {
            let guid = command.search_radius_or_guid;
            let spawned_entry = if command.is_creature_buddy() {
                self.catalog.creature_spawn(guid).map(|spawn| spawn.entry)
            } else {
                self.catalog.game_object_spawn(guid).map(|spawn| spawn.entry)
            };
            match spawned_entry {
                None => return Err(LoadValidationError::BuddyGuidNotSpawned { guid }),
                Some(found) if found != command.buddy_entry => {
                    return Err(LoadValidationError::BuddyGuidEntryMismatch {
                        guid,
                        found,
                        expected: command.buddy_entry,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Resolves the game object a respawn/door command will act on: the
    /// explicit spawn guid when given, else the buddy entry.
    fn command_object_type(&self, command: &ScriptCommand) -> Result<GameObjectType, LoadValidationError> {
        let entry = match command.go_guid() {
            Some(guid) => {
                self.catalog
                    .game_object_spawn(guid)
                    .ok_or(LoadValidationError::UnknownGameObjectGuid(guid))?
                    .entry
            }
            None if command.buddy_entry == 0 => return Err(LoadValidationError::NoGameObject),
            None => command.buddy_entry,
        };
        self.catalog
            .game_object_template(entry)
            .map(|info| info.go_type)
            .ok_or(LoadValidationError::UnknownGameObjectEntry(entry))
    }

    fn check_command(
        &self,
        table_name: &str,
        command: &ScriptCommand,
        quest_corrections: &mut BTreeSet<u32>,
    ) -> Result<(), LoadValidationError> {
        let catalog = self.catalog;
        match &command.payload {
            CommandPayload::Talk => {
                if command.text_ids[0] == 0 {
                    return Err(LoadValidationError::MissingTalkText(command.text_ids[0]));
                }
                let range = &self.options.text_id_range;
                for (slot, id) in command.text_ids.iter().copied().enumerate() {
                    if id != 0 && !range.contains(&id) {
                        return Err(LoadValidationError::TextIdOutOfRange {
                            slot: slot + 1,
                            id,
                            min: range.start,
                            max: range.end,
                        });
                    }
                }
            }
            CommandPayload::Emote { emote_id } => {
                if !catalog.has_emote(*emote_id) {
                    return Err(LoadValidationError::UnknownEmote(i64::from(*emote_id)));
                }
                for id in command.populated_text_ids() {
                    let known = u32::try_from(id).map(|e| catalog.has_emote(e)).unwrap_or(false);
                    if !known {
                        return Err(LoadValidationError::UnknownEmote(i64::from(id)));
                    }
                }
            }
            CommandPayload::FieldSet { .. }
            | CommandPayload::MoveTo { .. }
            | CommandPayload::FlagSet { .. }
            | CommandPayload::FlagRemove { .. }
            | CommandPayload::ActivateObject
            | CommandPayload::DespawnSelf { .. }
            | CommandPayload::Movement { .. }
            | CommandPayload::SetActiveObject { .. }
            | CommandPayload::SetRun { .. }
            | CommandPayload::AttackStart
            | CommandPayload::ModifyNpcFlags { .. }
            | CommandPayload::PauseWaypoints { .. }
            | CommandPayload::XpUser { .. } => {}
            CommandPayload::TeleportTo { map_id } => {
                if catalog.map(*map_id).is_none() {
                    return Err(LoadValidationError::UnknownMap(*map_id));
                }
                self.check_coordinates(command)?;
            }
            CommandPayload::QuestExplored { quest_id, distance } => {
                let quest = catalog
                    .quest(*quest_id)
                    .ok_or(LoadValidationError::UnknownQuest(*quest_id))?;
                if !quest.has_special_flag(QUEST_SPECIAL_FLAG_EXPLORATION_OR_EVENT)
                    && quest_corrections.insert(*quest_id)
                {
                    warn!(
                        target: LOG_TARGET,
                        "Table `{}` has quest {} in {} for script id {}, but the quest lacks the exploration/event flag. Quest modified to require objective.",
                        table_name, quest_id, command.kind(), command.id
                    );
                }
                let distance_f = *distance as f32;
                if distance_f > DEFAULT_VISIBILITY_DISTANCE {
                    return Err(LoadValidationError::DistanceTooLarge(*distance));
                }
                if *distance != 0 && distance_f < INTERACTION_DISTANCE {
                    return Err(LoadValidationError::DistanceTooSmall(*distance));
                }
            }
            CommandPayload::KillCredit { creature_entry, .. } => {
                if *creature_entry != 0 && catalog.creature_template(*creature_entry).is_none() {
                    return Err(LoadValidationError::UnknownCreature(*creature_entry));
                }
            }
            CommandPayload::RespawnGameObject { .. } => {
                let go_type = self.command_object_type(command)?;
                if go_type.blocks_script_respawn() {
                    return Err(LoadValidationError::UnsupportedGameObjectType(go_type));
                }
            }
            CommandPayload::TempSummonCreature { creature_entry, .. } => {
                self.check_coordinates(command)?;
                if catalog.creature_template(*creature_entry).is_none() {
                    return Err(LoadValidationError::UnknownCreature(*creature_entry));
                }
            }
            CommandPayload::OpenDoor { .. } | CommandPayload::CloseDoor { .. } => {
                let go_type = self.command_object_type(command)?;
                if go_type != GameObjectType::Door {
                    return Err(LoadValidationError::UnsupportedGameObjectType(go_type));
                }
            }
            CommandPayload::RemoveAura { spell_id } | CommandPayload::CastSpell { spell_id } => {
                if catalog.spell(*spell_id).is_none() {
                    return Err(LoadValidationError::UnknownSpell(*spell_id));
                }
            }
            CommandPayload::PlaySound { sound_id, flags } => {
                if !catalog.has_sound(*sound_id) {
                    return Err(LoadValidationError::UnknownSound(*sound_id));
                }
                let known = SOUND_FLAG_TARGET_PLAYER | SOUND_FLAG_DISTANCE | SOUND_FLAG_MAP_WIDE | SOUND_FLAG_ZONE_WIDE;
                if flags & !known != 0 {
                    warn!(
                        target: LOG_TARGET,
                        "Table `{}` uses unsupported sound flags {} for script id {}, unsupported flags will be ignored",
                        table_name, flags, command.id
                    );
                }
                if flags & (SOUND_FLAG_TARGET_PLAYER | SOUND_FLAG_DISTANCE) != 0
                    && flags & (SOUND_FLAG_MAP_WIDE | SOUND_FLAG_ZONE_WIDE) != 0
                {
                    warn!(
                        target: LOG_TARGET,
                        "Table `{}` uses sound flags {} for script id {}, combining (1|2) with (4|8) makes no sense",
                        table_name, flags, command.id
                    );
                }
            }
            CommandPayload::CreateItem { item_entry, amount } => {
                if catalog.item_template(*item_entry).is_none() {
                    return Err(LoadValidationError::UnknownItem(*item_entry));
                }
                if *amount == 0 {
                    return Err(LoadValidationError::ZeroItemAmount);
                }
            }
            CommandPayload::PlayMovie { .. } => return Err(LoadValidationError::MovieUnsupported),
            CommandPayload::SetFaction { faction_id, .. } => {
                if *faction_id != 0 && catalog.faction_template(*faction_id).is_none() {
                    return Err(LoadValidationError::UnknownFaction(*faction_id));
                }
            }
            CommandPayload::MorphToEntryOrModel { creature_or_model }
            | CommandPayload::MountToEntryOrModel { creature_or_model } => {
                let entry = *creature_or_model;
                if entry != 0 {
                    if command.is_additional() {
                        if !catalog.has_display_model(entry) {
                            return Err(LoadValidationError::UnknownDisplayModel(entry));
                        }
                    } else if catalog.creature_template(entry).is_none() {
                        return Err(LoadValidationError::UnknownCreature(entry));
                    }
                }
            }
            CommandPayload::GoLockState { lock_state } => {
                let state = *lock_state;
                let both_lock = state & GO_LOCK != 0 && state & GO_UNLOCK != 0;
                let both_interact = state & GO_NON_INTERACT != 0 && state & GO_INTERACT != 0;
                if both_lock || both_interact || state == 0 || state >= 0x10 {
                    return Err(LoadValidationError::InvalidLockState(state));
                }
            }
            CommandPayload::StandState { stand_state } => {
                if *stand_state >= MAX_UNIT_STAND_STATE {
                    return Err(LoadValidationError::InvalidStandState(*stand_state));
                }
            }
            CommandPayload::SendTaxiPath { path_id } => {
                if catalog.taxi_path(*path_id).is_none() {
                    return Err(LoadValidationError::UnknownTaxiPath(*path_id));
                }
                if self.options.strict_checks {
                    if let Some(spell) = spell_triggering_taxi_path(catalog, *path_id) {
                        return Err(LoadValidationError::AmbiguousTaxiPath {
                            path: *path_id,
                            spell,
                        });
                    }
                }
            }
            CommandPayload::TerminateScript { npc_entry, .. } => {
                if *npc_entry != 0 && catalog.creature_template(*npc_entry).is_none() {
                    return Err(LoadValidationError::UnknownCreature(*npc_entry));
                }
            }
            CommandPayload::TerminateCondition {
                condition_id,
                fail_quest,
            } => {
                if catalog.condition(*condition_id).is_none() {
                    return Err(LoadValidationError::UnknownCondition(*condition_id));
                }
                if *fail_quest != 0 && catalog.quest(*fail_quest).is_none() {
                    return Err(LoadValidationError::UnknownQuest(*fail_quest));
                }
            }
        }
        Ok(())
    }

    fn check_coordinates(&self, command: &ScriptCommand) -> Result<(), LoadValidationError> {
        if command.position.is_valid_map_coord() {
            Ok(())
        } else {
            Err(LoadValidationError::InvalidCoordinates {
                x: command.position.x,
                y: command.position.y,
                z: command.position.z,
            })
        }
    }

    /// Ids of `table` that name nothing in the catalog for its family.
    pub fn check_table_ids(&self, table: &ScriptTable) -> Vec<u32> {
        let catalog = self.catalog;
        let event_ids = match table.kind() {
            ScriptTableKind::Event => collect_possible_event_ids(catalog),
            _ => BTreeSet::new(),
        };
        let mut unknown = Vec::new();
        for id in table.ids() {
            let problem = match table.kind() {
                ScriptTableKind::GameObjectUse => {
                    catalog.game_object_spawn(id).is_none().then_some("gameobject guid")
                }
                ScriptTableKind::GameObjectTemplateUse => {
                    catalog.game_object_template(id).is_none().then_some("gameobject entry")
                }
                ScriptTableKind::QuestStart | ScriptTableKind::QuestEnd => {
                    catalog.quest(id).is_none().then_some("quest")
                }
                ScriptTableKind::Spell => match catalog.spell(id) {
                    None => Some("spell"),
                    Some(spell) => (0..MAX_EFFECT_INDEX)
                        .all(|index| spell_start_priority(catalog, spell, index) == 0)
                        .then_some("spell able to start a script"),
                },
                ScriptTableKind::Event => (!event_ids.contains(&id))
                    .then_some("gameobject event, spell send-event effect or taxi node event"),
                ScriptTableKind::CreatureDeath => {
                    catalog.creature_template(id).is_none().then_some("creature entry")
                }
                ScriptTableKind::Gossip | ScriptTableKind::CreatureMovement => None,
            };
            if let Some(expected) = problem {
                warn!(
                    target: LOG_TARGET,
                    "Table `{}` has script id {} not referring to any {}",
                    table.name(),
                    id,
                    expected
                );
                unknown.push(id);
            }
        }
        unknown
    }

    /// Cross-checks talk texts of every table against the string catalog.
    pub fn check_script_texts<'t, I>(&self, tables: I) -> TextReport
    where
        I: IntoIterator<Item = &'t ScriptTable>,
    {
        let range = &self.options.text_id_range;
        let mut unused: BTreeSet<i32> = self
            .catalog
            .script_texts()
            .map(|text| text.id)
            .filter(|id| range.contains(id))
            .collect();
        let mut report = TextReport::default();

        for table in tables {
            for (id, steps) in table.iter() {
                for step in steps.iter().filter(|step| step.kind() == CommandKind::Talk) {
                    for text_id in step.populated_text_ids() {
                        if self.catalog.script_text(text_id).is_none() {
                            warn!(
                                target: LOG_TARGET,
                                "Table `db_script_string` is missing string id {}, used in database script table {} id {}.",
                                text_id,
                                table.name(),
                                id
                            );
                            report.missing.push((table.name().to_string(), id, text_id));
                        }
                        unused.remove(&text_id);
                    }
                }
            }
        }

        for id in &unused {
            warn!(target: LOG_TARGET, "Table `db_script_string` has unused string id {}", id);
        }
        report.unused = unused.into_iter().collect();
        report
    }

    /// Trigger-id to script-id map for area triggers; unknown triggers are skipped.
    pub fn load_area_trigger_scripts(
        &self,
        source: &dyn RowSource,
        names: &ScriptNames,
    ) -> Result<BTreeMap<u32, u32>, ScriptError> {
        let mut scripts = BTreeMap::new();
        for row in source.area_trigger_scripts()? {
            if self.catalog.area_trigger(row.id).is_none() {
                error!(
                    target: LOG_TARGET,
                    "Table `scripted_areatrigger` has area trigger (ID: {}) not listed in the area trigger catalog.",
                    row.id
                );
                continue;
            }
            scripts.insert(row.id, names.script_id(&row.script_name));
        }
        info!(target: LOG_TARGET, ">> Loaded {} areatrigger scripts", scripts.len());
        Ok(scripts)
    }

    /// Event-id to script-id map; unknown event ids are reported but kept.
    pub fn load_event_id_scripts(
        &self,
        source: &dyn RowSource,
        names: &ScriptNames,
    ) -> Result<BTreeMap<u32, u32>, ScriptError> {
        let possible = collect_possible_event_ids(self.catalog);
        let mut scripts = BTreeMap::new();
        for row in source.event_id_scripts()? {
            if !possible.contains(&row.id) {
                warn!(
                    target: LOG_TARGET,
                    "Table `scripted_event_id` has id {} ({}) not referring to any gameobject event, spell send-event effect or taxi node event",
                    row.id,
                    escape_log(&row.script_name)
                );
            }
            scripts.insert(row.id, names.script_id(&row.script_name));
        }
        info!(target: LOG_TARGET, ">> Loaded {} scripted event id", scripts.len());
        Ok(scripts)
    }
}

/// Rank of effect `index` as a script starter: script effect 10, dummy 9,
/// trigger of a nonexistent spell 5, anything else 0.
pub fn spell_start_priority(catalog: &dyn GameCatalog, spell: &SpellEntry, index: usize) -> u8 {
    let Some(effect) = spell.effects.get(index) else {
        return 0;
    };
    match effect.kind {
        SpellEffectKind::ScriptEffect => 10,
        SpellEffectKind::Dummy => 9,
        SpellEffectKind::TriggerSpell if catalog.spell(effect.trigger_spell).is_none() => 5,
        _ => 0,
    }
}

/// Whether effect `index` is the one that starts the spell's DB script: the
/// highest-ranked effect wins, ties go to the lowest index.
pub fn can_spell_effect_start_db_script(catalog: &dyn GameCatalog, spell: &SpellEntry, index: usize) -> bool {
    let priority = spell_start_priority(catalog, spell, index);
    if priority == 0 {
        return false;
    }
    (0..MAX_EFFECT_INDEX).all(|other| {
        let current = spell_start_priority(catalog, spell, other);
        current < priority || (current == priority && other >= index)
    })
}

/// Every event id some game object, spell or taxi node can raise.
pub fn collect_possible_event_ids(catalog: &dyn GameCatalog) -> BTreeSet<u32> {
    let mut ids = BTreeSet::new();
    for template in catalog.game_object_templates() {
        if matches!(
            template.go_type,
            GameObjectType::Goober | GameObjectType::Chest | GameObjectType::Camera | GameObjectType::CapturePoint
        ) {
            ids.extend(template.event_ids.iter().copied().filter(|id| *id != 0));
        }
    }
    for spell in catalog.spells() {
        for effect in &spell.effects {
            if effect.kind == SpellEffectKind::SendEvent && effect.misc_value > 0 {
                ids.insert(effect.misc_value as u32);
            }
        }
    }
    for path in catalog.taxi_paths() {
        for node in &path.nodes {
            ids.extend([node.arrival_event_id, node.departure_event_id].into_iter().filter(|id| *id != 0));
        }
    }
    ids
}

fn spell_triggering_taxi_path(catalog: &dyn GameCatalog, path_id: u32) -> Option<u32> {
    catalog
        .spells()
        .find(|spell| {
            spell
                .effects
                .iter()
                .any(|effect| effect.kind == SpellEffectKind::SendTaxi && effect.misc_value == path_id as i32)
        })
        .map(|spell| spell.id)
}
