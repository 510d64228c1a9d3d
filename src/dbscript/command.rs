//! Typed script commands decoded from persistent rows.
//!
//! A [`ScriptRow`] is the raw storage shape shared by every script table. The
//! loader turns each row into a [`ScriptCommand`] whose [`CommandPayload`]
//! carries only the fields its command kind understands.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::dbscript::errors::LoadValidationError;
use crate::world::object::Position;

pub const MAX_TEXT_ID: usize = 4;
pub const SCRIPT_ROW_SCHEMA_VERSION: u8 = 1;

bitflags! {
    /// Per-row modifiers controlling buddy lookup and source/target wiring.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScriptFlags: u32 {
        const BUDDY_AS_TARGET = 0x01;
        const REVERSE_DIRECTION = 0x02;
        const SOURCE_TARGETS_SELF = 0x04;
        const COMMAND_ADDITIONAL = 0x08;
        const BUDDY_BY_GUID = 0x10;
        const BUDDY_IS_PET = 0x20;
    }
}

/// One row of any `dbscripts_on_*` table, exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRow {
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
    pub id: u32,
    #[serde(default)]
    pub delay: u32,
    pub command: u32,
    #[serde(default)]
    pub datalong: u32,
    #[serde(default)]
    pub datalong2: u32,
    #[serde(default)]
    pub buddy_entry: u32,
    #[serde(default)]
    pub search_radius: u32,
    #[serde(default)]
    pub data_flags: u32,
    #[serde(default)]
    pub dataint: i32,
    #[serde(default)]
    pub dataint2: i32,
    #[serde(default)]
    pub dataint3: i32,
    #[serde(default)]
    pub dataint4: i32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default)]
    pub o: f32,
}

fn default_schema_version() -> u8 {
    SCRIPT_ROW_SCHEMA_VERSION
}

impl ScriptRow {
    pub fn new(id: u32, delay: u32, command: u32) -> Self {
        Self {
            schema_version: SCRIPT_ROW_SCHEMA_VERSION,
            id,
            delay,
            command,
            datalong: 0,
            datalong2: 0,
            buddy_entry: 0,
            search_radius: 0,
            data_flags: 0,
            dataint: 0,
            dataint2: 0,
            dataint3: 0,
            dataint4: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            o: 0.0,
        }
    }

    pub fn with_data(mut self, datalong: u32, datalong2: u32) -> Self {
        self.datalong = datalong;
        self.datalong2 = datalong2;
        self
    }

    pub fn with_buddy(mut self, entry: u32, radius_or_guid: u32) -> Self {
        self.buddy_entry = entry;
        self.search_radius = radius_or_guid;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.data_flags = flags;
        self
    }

    pub fn with_texts(mut self, texts: [i32; MAX_TEXT_ID]) -> Self {
        self.dataint = texts[0];
        self.dataint2 = texts[1];
        self.dataint3 = texts[2];
        self.dataint4 = texts[3];
        self
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32, o: f32) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self.o = o;
        self
    }

    pub fn text_ids(&self) -> [i32; MAX_TEXT_ID] {
        [self.dataint, self.dataint2, self.dataint3, self.dataint4]
    }
}

/// Command discriminants as stored in the `command` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum CommandKind {
    Talk = 0,
    Emote = 1,
    FieldSet = 2,
    MoveTo = 3,
    FlagSet = 4,
    FlagRemove = 5,
    TeleportTo = 6,
    QuestExplored = 7,
    KillCredit = 8,
    RespawnGameObject = 9,
    TempSummonCreature = 10,
    OpenDoor = 11,
    CloseDoor = 12,
    ActivateObject = 13,
    RemoveAura = 14,
    CastSpell = 15,
    PlaySound = 16,
    CreateItem = 17,
    DespawnSelf = 18,
    PlayMovie = 19,
    Movement = 20,
    SetActiveObject = 21,
    SetFaction = 22,
    MorphToEntryOrModel = 23,
    MountToEntryOrModel = 24,
    SetRun = 25,
    AttackStart = 26,
    GoLockState = 27,
    StandState = 28,
    ModifyNpcFlags = 29,
    SendTaxiPath = 30,
    TerminateScript = 31,
    PauseWaypoints = 32,
    XpUser = 33,
    TerminateCondition = 34,
}

impl CommandKind {
    pub const ALL: [CommandKind; 35] = [
        CommandKind::Talk,
        CommandKind::Emote,
        CommandKind::FieldSet,
        CommandKind::MoveTo,
        CommandKind::FlagSet,
        CommandKind::FlagRemove,
        CommandKind::TeleportTo,
        CommandKind::QuestExplored,
        CommandKind::KillCredit,
        CommandKind::RespawnGameObject,
        CommandKind::TempSummonCreature,
        CommandKind::OpenDoor,
        CommandKind::CloseDoor,
        CommandKind::ActivateObject,
        CommandKind::RemoveAura,
        CommandKind::CastSpell,
        CommandKind::PlaySound,
        CommandKind::CreateItem,
        CommandKind::DespawnSelf,
        CommandKind::PlayMovie,
        CommandKind::Movement,
        CommandKind::SetActiveObject,
        CommandKind::SetFaction,
        CommandKind::MorphToEntryOrModel,
        CommandKind::MountToEntryOrModel,
        CommandKind::SetRun,
        CommandKind::AttackStart,
        CommandKind::GoLockState,
        CommandKind::StandState,
        CommandKind::ModifyNpcFlags,
        CommandKind::SendTaxiPath,
        CommandKind::TerminateScript,
        CommandKind::PauseWaypoints,
        CommandKind::XpUser,
        CommandKind::TerminateCondition,
    ];

    /// Buddy searches for these commands look at game objects, all others at creatures.
    pub fn is_creature_buddy(self) -> bool {
        !matches!(
            self,
            CommandKind::RespawnGameObject
                | CommandKind::OpenDoor
                | CommandKind::CloseDoor
                | CommandKind::GoLockState
        )
    }

    pub fn supports_additional_flag(self) -> bool {
        matches!(
            self,
            CommandKind::MoveTo
                | CommandKind::TempSummonCreature
                | CommandKind::CastSpell
                | CommandKind::Movement
                | CommandKind::MorphToEntryOrModel
                | CommandKind::MountToEntryOrModel
                | CommandKind::TerminateScript
                | CommandKind::TerminateCondition
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Talk => "SCRIPT_COMMAND_TALK",
            CommandKind::Emote => "SCRIPT_COMMAND_EMOTE",
            CommandKind::FieldSet => "SCRIPT_COMMAND_FIELD_SET",
            CommandKind::MoveTo => "SCRIPT_COMMAND_MOVE_TO",
            CommandKind::FlagSet => "SCRIPT_COMMAND_FLAG_SET",
            CommandKind::FlagRemove => "SCRIPT_COMMAND_FLAG_REMOVE",
            CommandKind::TeleportTo => "SCRIPT_COMMAND_TELEPORT_TO",
            CommandKind::QuestExplored => "SCRIPT_COMMAND_QUEST_EXPLORED",
            CommandKind::KillCredit => "SCRIPT_COMMAND_KILL_CREDIT",
            CommandKind::RespawnGameObject => "SCRIPT_COMMAND_RESPAWN_GAMEOBJECT",
            CommandKind::TempSummonCreature => "SCRIPT_COMMAND_TEMP_SUMMON_CREATURE",
            CommandKind::OpenDoor => "SCRIPT_COMMAND_OPEN_DOOR",
            CommandKind::CloseDoor => "SCRIPT_COMMAND_CLOSE_DOOR",
            CommandKind::ActivateObject => "SCRIPT_COMMAND_ACTIVATE_OBJECT",
            CommandKind::RemoveAura => "SCRIPT_COMMAND_REMOVE_AURA",
            CommandKind::CastSpell => "SCRIPT_COMMAND_CAST_SPELL",
            CommandKind::PlaySound => "SCRIPT_COMMAND_PLAY_SOUND",
            CommandKind::CreateItem => "SCRIPT_COMMAND_CREATE_ITEM",
            CommandKind::DespawnSelf => "SCRIPT_COMMAND_DESPAWN_SELF",
            CommandKind::PlayMovie => "SCRIPT_COMMAND_PLAY_MOVIE",
            CommandKind::Movement => "SCRIPT_COMMAND_MOVEMENT",
            CommandKind::SetActiveObject => "SCRIPT_COMMAND_SET_ACTIVEOBJECT",
            CommandKind::SetFaction => "SCRIPT_COMMAND_SET_FACTION",
            CommandKind::MorphToEntryOrModel => "SCRIPT_COMMAND_MORPH_TO_ENTRY_OR_MODEL",
            CommandKind::MountToEntryOrModel => "SCRIPT_COMMAND_MOUNT_TO_ENTRY_OR_MODEL",
            CommandKind::SetRun => "SCRIPT_COMMAND_SET_RUN",
            CommandKind::AttackStart => "SCRIPT_COMMAND_ATTACK_START",
            CommandKind::GoLockState => "SCRIPT_COMMAND_GO_LOCK_STATE",
            CommandKind::StandState => "SCRIPT_COMMAND_STAND_STATE",
            CommandKind::ModifyNpcFlags => "SCRIPT_COMMAND_MODIFY_NPC_FLAGS",
            CommandKind::SendTaxiPath => "SCRIPT_COMMAND_SEND_TAXI_PATH",
            CommandKind::TerminateScript => "SCRIPT_COMMAND_TERMINATE_SCRIPT",
            CommandKind::PauseWaypoints => "SCRIPT_COMMAND_PAUSE_WAYPOINTS",
            CommandKind::XpUser => "SCRIPT_COMMAND_XP_USER",
            CommandKind::TerminateCondition => "SCRIPT_COMMAND_TERMINATE_COND",
        }
    }
}

impl TryFrom<u32> for CommandKind {
    type Error = LoadValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        CommandKind::ALL
            .get(value as usize)
            .copied()
            .ok_or(LoadValidationError::UnknownCommand(value))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as u32)
    }
}

/// Motion generators a movement command can switch a creature to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbMotion {
    Idle,
    Random,
    Waypoint,
}

impl TryFrom<u32> for DbMotion {
    type Error = LoadValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DbMotion::Idle),
            1 => Ok(DbMotion::Random),
            2 => Ok(DbMotion::Waypoint),
            other => Err(LoadValidationError::InvalidMovementType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcFlagChange {
    Add,
    Remove,
    Toggle,
}

impl From<u32> for NpcFlagChange {
    fn from(value: u32) -> Self {
        if value & 0x01 != 0 {
            NpcFlagChange::Add
        } else if value & 0x02 != 0 {
            NpcFlagChange::Remove
        } else {
            NpcFlagChange::Toggle
        }
    }
}

pub const SOUND_FLAG_TARGET_PLAYER: u32 = 0x1;
pub const SOUND_FLAG_DISTANCE: u32 = 0x2;
pub const SOUND_FLAG_MAP_WIDE: u32 = 0x4;
pub const SOUND_FLAG_ZONE_WIDE: u32 = 0x8;

pub const GO_LOCK: u32 = 0x01;
pub const GO_UNLOCK: u32 = 0x02;
pub const GO_NON_INTERACT: u32 = 0x04;
pub const GO_INTERACT: u32 = 0x08;

/// Command-specific data; one variant per command kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    /// Text ids live in the shared text slots.
    Talk,
    /// Alternative emotes live in the shared text slots.
    Emote { emote_id: u32 },
    FieldSet { field: u32, value: u32 },
    /// Speed in hundredths of a unit per second; 0 uses default pathing.
    MoveTo { travel_speed: u32 },
    FlagSet { field: u32, value: u32 },
    FlagRemove { field: u32, value: u32 },
    TeleportTo { map_id: u32 },
    QuestExplored { quest_id: u32, distance: u32 },
    KillCredit { creature_entry: u32, group_credit: bool },
    RespawnGameObject { go_guid: u32, despawn_delay: u32 },
    TempSummonCreature { creature_entry: u32, despawn_delay: u32 },
    OpenDoor { go_guid: u32, reset_delay: u32 },
    CloseDoor { go_guid: u32, reset_delay: u32 },
    ActivateObject,
    RemoveAura { spell_id: u32 },
    CastSpell { spell_id: u32 },
    PlaySound { sound_id: u32, flags: u32 },
    CreateItem { item_entry: u32, amount: u32 },
    DespawnSelf { delay: u32 },
    PlayMovie { movie_id: u32 },
    Movement { motion: DbMotion, wander_distance: u32 },
    SetActiveObject { activate: bool },
    SetFaction { faction_id: u32, flags: u32 },
    MorphToEntryOrModel { creature_or_model: u32 },
    MountToEntryOrModel { creature_or_model: u32 },
    SetRun { run: bool },
    AttackStart,
    GoLockState { lock_state: u32 },
    StandState { stand_state: u32 },
    ModifyNpcFlags { flag: u32, change: NpcFlagChange },
    SendTaxiPath { path_id: u32 },
    /// Waypoint pause (ms) lives in the first text slot.
    TerminateScript { npc_entry: u32, search_distance: u32 },
    PauseWaypoints { pause: bool },
    XpUser { disable: bool },
    TerminateCondition { condition_id: u32, fail_quest: u32 },
}

impl CommandPayload {
    fn decode(kind: CommandKind, a: u32, b: u32) -> Result<Self, LoadValidationError> {
        Ok(match kind {
            CommandKind::Talk => CommandPayload::Talk,
            CommandKind::Emote => CommandPayload::Emote { emote_id: a },
            CommandKind::FieldSet => CommandPayload::FieldSet { field: a, value: b },
            CommandKind::MoveTo => CommandPayload::MoveTo { travel_speed: b },
            CommandKind::FlagSet => CommandPayload::FlagSet { field: a, value: b },
            CommandKind::FlagRemove => CommandPayload::FlagRemove { field: a, value: b },
            CommandKind::TeleportTo => CommandPayload::TeleportTo { map_id: a },
            CommandKind::QuestExplored => CommandPayload::QuestExplored {
                quest_id: a,
                distance: b,
            },
            CommandKind::KillCredit => CommandPayload::KillCredit {
                creature_entry: a,
                group_credit: b != 0,
            },
            CommandKind::RespawnGameObject => CommandPayload::RespawnGameObject {
                go_guid: a,
                despawn_delay: b,
            },
            CommandKind::TempSummonCreature => CommandPayload::TempSummonCreature {
                creature_entry: a,
                despawn_delay: b,
            },
            CommandKind::OpenDoor => CommandPayload::OpenDoor {
                go_guid: a,
                reset_delay: b,
            },
            CommandKind::CloseDoor => CommandPayload::CloseDoor {
                go_guid: a,
                reset_delay: b,
            },
            CommandKind::ActivateObject => CommandPayload::ActivateObject,
            CommandKind::RemoveAura => CommandPayload::RemoveAura { spell_id: a },
            CommandKind::CastSpell => CommandPayload::CastSpell { spell_id: a },
            CommandKind::PlaySound => CommandPayload::PlaySound {
                sound_id: a,
                flags: b,
            },
            CommandKind::CreateItem => CommandPayload::CreateItem {
                item_entry: a,
                amount: b,
            },
            CommandKind::DespawnSelf => CommandPayload::DespawnSelf { delay: a },
            CommandKind::PlayMovie => CommandPayload::PlayMovie { movie_id: a },
            CommandKind::Movement => CommandPayload::Movement {
                motion: DbMotion::try_from(a)?,
                wander_distance: b,
            },
            CommandKind::SetActiveObject => CommandPayload::SetActiveObject { activate: a != 0 },
            CommandKind::SetFaction => CommandPayload::SetFaction {
                faction_id: a,
                flags: b,
            },
            CommandKind::MorphToEntryOrModel => CommandPayload::MorphToEntryOrModel { creature_or_model: a },
            CommandKind::MountToEntryOrModel => CommandPayload::MountToEntryOrModel { creature_or_model: a },
            CommandKind::SetRun => CommandPayload::SetRun { run: a != 0 },
            CommandKind::AttackStart => CommandPayload::AttackStart,
            CommandKind::GoLockState => CommandPayload::GoLockState { lock_state: a },
            CommandKind::StandState => CommandPayload::StandState { stand_state: a },
            CommandKind::ModifyNpcFlags => CommandPayload::ModifyNpcFlags {
                flag: a,
                change: NpcFlagChange::from(b),
            },
            CommandKind::SendTaxiPath => CommandPayload::SendTaxiPath { path_id: a },
            CommandKind::TerminateScript => CommandPayload::TerminateScript {
                npc_entry: a,
                search_distance: b,
            },
            CommandKind::PauseWaypoints => CommandPayload::PauseWaypoints { pause: a != 0 },
            CommandKind::XpUser => CommandPayload::XpUser { disable: a != 0 },
            CommandKind::TerminateCondition => CommandPayload::TerminateCondition {
                condition_id: a,
                fail_quest: b,
            },
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            CommandPayload::Talk => CommandKind::Talk,
            CommandPayload::Emote { .. } => CommandKind::Emote,
            CommandPayload::FieldSet { .. } => CommandKind::FieldSet,
            CommandPayload::MoveTo { .. } => CommandKind::MoveTo,
            CommandPayload::FlagSet { .. } => CommandKind::FlagSet,
            CommandPayload::FlagRemove { .. } => CommandKind::FlagRemove,
            CommandPayload::TeleportTo { .. } => CommandKind::TeleportTo,
            CommandPayload::QuestExplored { .. } => CommandKind::QuestExplored,
            CommandPayload::KillCredit { .. } => CommandKind::KillCredit,
            CommandPayload::RespawnGameObject { .. } => CommandKind::RespawnGameObject,
            CommandPayload::TempSummonCreature { .. } => CommandKind::TempSummonCreature,
            CommandPayload::OpenDoor { .. } => CommandKind::OpenDoor,
            CommandPayload::CloseDoor { .. } => CommandKind::CloseDoor,
            CommandPayload::ActivateObject => CommandKind::ActivateObject,
            CommandPayload::RemoveAura { .. } => CommandKind::RemoveAura,
            CommandPayload::CastSpell { .. } => CommandKind::CastSpell,
            CommandPayload::PlaySound { .. } => CommandKind::PlaySound,
            CommandPayload::CreateItem { .. } => CommandKind::CreateItem,
            CommandPayload::DespawnSelf { .. } => CommandKind::DespawnSelf,
            CommandPayload::PlayMovie { .. } => CommandKind::PlayMovie,
            CommandPayload::Movement { .. } => CommandKind::Movement,
            CommandPayload::SetActiveObject { .. } => CommandKind::SetActiveObject,
            CommandPayload::SetFaction { .. } => CommandKind::SetFaction,
            CommandPayload::MorphToEntryOrModel { .. } => CommandKind::MorphToEntryOrModel,
            CommandPayload::MountToEntryOrModel { .. } => CommandKind::MountToEntryOrModel,
            CommandPayload::SetRun { .. } => CommandKind::SetRun,
            CommandPayload::AttackStart => CommandKind::AttackStart,
            CommandPayload::GoLockState { .. } => CommandKind::GoLockState,
            CommandPayload::StandState { .. } => CommandKind::StandState,
            CommandPayload::ModifyNpcFlags { .. } => CommandKind::ModifyNpcFlags,
            CommandPayload::SendTaxiPath { .. } => CommandKind::SendTaxiPath,
            CommandPayload::TerminateScript { .. } => CommandKind::TerminateScript,
            CommandPayload::PauseWaypoints { .. } => CommandKind::PauseWaypoints,
            CommandPayload::XpUser { .. } => CommandKind::XpUser,
            CommandPayload::TerminateCondition { .. } => CommandKind::TerminateCondition,
        }
    }
}

/// A validated step of a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCommand {
    pub id: u32,
    /// Seconds after the trigger.
    pub delay: u32,
    pub payload: CommandPayload,
    pub buddy_entry: u32,
    /// Search radius, or the spawn guid under [`ScriptFlags::BUDDY_BY_GUID`].
    pub search_radius_or_guid: u32,
    pub flags: ScriptFlags,
    pub text_ids: [i32; MAX_TEXT_ID],
    pub position: Position,
}

impl ScriptCommand {
    /// Decodes the discriminant, flag bits and payload of a row. Catalog checks
    /// happen in the loader.
    pub fn from_row(row: &ScriptRow) -> Result<Self, LoadValidationError> {
        let kind = CommandKind::try_from(row.command)?;
        let flags = ScriptFlags::from_bits(row.data_flags)
            .ok_or(LoadValidationError::InvalidFlags(row.data_flags))?;
        let payload = CommandPayload::decode(kind, row.datalong, row.datalong2)?;
        Ok(Self {
            id: row.id,
            delay: row.delay,
            payload,
            buddy_entry: row.buddy_entry,
            search_radius_or_guid: row.search_radius,
            flags,
            text_ids: row.text_ids(),
            position: Position::new(row.x, row.y, row.z, row.o),
        })
    }

    pub fn kind(&self) -> CommandKind {
        self.payload.kind()
    }

    pub fn is_creature_buddy(&self) -> bool {
        self.kind().is_creature_buddy()
    }

    pub fn has_flag(&self, flag: ScriptFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_additional(&self) -> bool {
        self.flags.contains(ScriptFlags::COMMAND_ADDITIONAL)
    }

    /// Explicit spawn guid for commands that address a game object directly.
    pub fn go_guid(&self) -> Option<u32> {
        match self.payload {
            CommandPayload::RespawnGameObject { go_guid, .. }
            | CommandPayload::OpenDoor { go_guid, .. }
            | CommandPayload::CloseDoor { go_guid, .. } => Some(go_guid).filter(|guid| *guid != 0),
            _ => None,
        }
    }

    /// Non-zero text slots, in slot order.
    pub fn populated_text_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.text_ids.iter().copied().filter(|id| *id != 0)
    }

    /// Alternative emotes: the leading run of non-zero text slots.
    pub fn emote_alternatives(&self) -> impl Iterator<Item = u32> + '_ {
        self.text_ids.iter().copied().take_while(|id| *id != 0).map(|id| id as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_match_storage_values() {
        for (index, kind) in CommandKind::ALL.iter().enumerate() {
            assert_eq!(*kind as u32, index as u32);
            assert_eq!(CommandKind::try_from(index as u32), Ok(*kind));
        }
        assert_eq!(
            CommandKind::try_from(35),
            Err(LoadValidationError::UnknownCommand(35))
        );
    }

    #[test]
    fn object_buddy_commands_are_the_game_object_ones() {
        let object_buddies: Vec<CommandKind> = CommandKind::ALL
            .iter()
            .copied()
            .filter(|kind| !kind.is_creature_buddy())
            .collect();
        assert_eq!(
            object_buddies,
            vec![
                CommandKind::RespawnGameObject,
                CommandKind::OpenDoor,
                CommandKind::CloseDoor,
                CommandKind::GoLockState
            ]
        );
    }

    #[test]
    fn rows_decode_into_matching_payloads() {
        let row = ScriptRow::new(5, 2, CommandKind::KillCredit as u32).with_data(101, 1);
        let command = ScriptCommand::from_row(&row).unwrap();
        assert_eq!(
            command.payload,
            CommandPayload::KillCredit {
                creature_entry: 101,
                group_credit: true
            }
        );
        assert_eq!(command.delay, 2);

        let bad_flags = ScriptRow::new(5, 0, 0).with_flags(0x40);
        assert_eq!(
            ScriptCommand::from_row(&bad_flags),
            Err(LoadValidationError::InvalidFlags(0x40))
        );

        let bad_motion = ScriptRow::new(5, 0, CommandKind::Movement as u32).with_data(3, 0);
        assert_eq!(
            ScriptCommand::from_row(&bad_motion),
            Err(LoadValidationError::InvalidMovementType(3))
        );
    }

    #[test]
    fn npc_flag_change_prefers_add_over_remove() {
        assert_eq!(NpcFlagChange::from(0x3), NpcFlagChange::Add);
        assert_eq!(NpcFlagChange::from(0x2), NpcFlagChange::Remove);
        assert_eq!(NpcFlagChange::from(0), NpcFlagChange::Toggle);
    }
}
