//! Shared world for integration tests: a guard post with a door, a chest, a
//! signal fire and three players.
#![allow(dead_code)]

use std::sync::Arc;

use dbscripts::dbscript::{
    MemoryRowSource, RegistryHandle, RegistryOptions, ScriptEngine, ScriptRegistry, ScriptRow,
};
use dbscripts::world::catalog::{ChatType, PlayerCondition};
use dbscripts::world::object::{Creature, GameObject, GameObjectType, Player, QuestStatus};
use dbscripts::world::{CatalogData, ObjectGuid, Position, Region};

pub const GUARD_ENTRY: u32 = 100;
pub const THUG_ENTRY: u32 = 101;
pub const DOOR_ENTRY: u32 = 200;
pub const CHEST_ENTRY: u32 = 202;
pub const SIGNAL_FIRE_ENTRY: u32 = 203;

pub const GUARD: ObjectGuid = ObjectGuid::creature(GUARD_ENTRY, 1);
pub const THUG: ObjectGuid = ObjectGuid::creature(THUG_ENTRY, 2);
pub const DOOR: ObjectGuid = ObjectGuid::game_object(DOOR_ENTRY, 10);
pub const CHEST: ObjectGuid = ObjectGuid::game_object(CHEST_ENTRY, 12);
pub const SIGNAL_FIRE: ObjectGuid = ObjectGuid::game_object(SIGNAL_FIRE_ENTRY, 14);
pub const ALICE: ObjectGuid = ObjectGuid::player(1);
pub const BOB: ObjectGuid = ObjectGuid::player(2);
pub const CAROL: ObjectGuid = ObjectGuid::player(3);
pub const DAVE: ObjectGuid = ObjectGuid::player(4);

pub const QUEST_ESCORT: u32 = 302;
pub const COND_ESCORT_INCOMPLETE: u32 = 801;

pub const TEXT_SAY: i32 = 2_000_000_001;
pub const TEXT_YELL: i32 = 2_000_000_002;

pub const EVENT_SIGNAL: u32 = 5001;

pub fn catalog() -> CatalogData {
    let mut catalog = CatalogData::new()
        .with_creature(GUARD_ENTRY, "Stormwind Guard", 1000, 11)
        .with_creature(THUG_ENTRY, "Defias Thug", 1001, 17)
        .with_creature_spawn(GUARD.counter(), GUARD_ENTRY, Position::default())
        .with_creature_spawn(THUG.counter(), THUG_ENTRY, Position::new(10.0, 0.0, 0.0, 0.0))
        .with_game_object(DOOR_ENTRY, "Iron Gate", GameObjectType::Door)
        .with_game_object(CHEST_ENTRY, "Battered Chest", GameObjectType::Chest)
        .with_game_object(SIGNAL_FIRE_ENTRY, "Signal Fire", GameObjectType::Goober)
        .with_game_object_spawn(DOOR.counter(), DOOR_ENTRY, Position::new(5.0, 0.0, 0.0, 0.0))
        .with_game_object_spawn(CHEST.counter(), CHEST_ENTRY, Position::new(8.0, 0.0, 0.0, 0.0))
        .with_game_object_spawn(SIGNAL_FIRE.counter(), SIGNAL_FIRE_ENTRY, Position::new(12.0, 0.0, 0.0, 0.0))
        .with_quest(QUEST_ESCORT, "The Defias Brotherhood", 0)
        .with_map(0, "Eastern Kingdoms", false)
        .with_condition(
            COND_ESCORT_INCOMPLETE,
            PlayerCondition::QuestStatus {
                quest: QUEST_ESCORT,
                status: QuestStatus::Incomplete,
            },
        )
        .with_text(TEXT_SAY, "Halt! Who goes there?", ChatType::Say)
        .with_text(TEXT_YELL, "To arms!", ChatType::Yell)
        .with_emotes(&[1, 2, 3])
        .with_display_models(&[1000, 1001]);
    if let Some(fire) = catalog.game_object_templates.get_mut(&SIGNAL_FIRE_ENTRY) {
        fire.event_ids.push(EVENT_SIGNAL);
    }
    catalog
}

pub fn region() -> Region {
    let mut region = Region::new(0);
    region.add_creature(Creature::new(GUARD, Position::default(), 11, 1000));
    region.add_creature(Creature::new(THUG, Position::new(10.0, 0.0, 0.0, 0.0), 17, 1001));

    region.add_game_object(GameObject::new(DOOR, GameObjectType::Door, Position::new(5.0, 0.0, 0.0, 0.0)));
    let mut chest = GameObject::new(CHEST, GameObjectType::Chest, Position::new(8.0, 0.0, 0.0, 0.0));
    chest.spawned = false;
    region.add_game_object(chest);
    region.add_game_object(GameObject::new(
        SIGNAL_FIRE,
        GameObjectType::Goober,
        Position::new(12.0, 0.0, 0.0, 0.0),
    ));

    for (counter, name, x) in [(1, "Alice", 2.0), (2, "Bob", 3.0), (3, "Carol", 4.0)] {
        region.add_player(Player::new(counter, name, Position::new(x, 0.0, 0.0, 0.0), 0));
    }
    region
}

/// Builds an engine whose registry was loaded from `tables` (table name, rows).
pub fn engine_with(tables: Vec<(&str, Vec<ScriptRow>)>) -> ScriptEngine {
    let mut source = MemoryRowSource::new();
    for (table, rows) in tables {
        source = source.with_rows(table, rows);
    }
    let catalog = Arc::new(catalog());
    let (registry, report) =
        ScriptRegistry::build(&source, catalog.as_ref(), &RegistryOptions::default()).unwrap();
    assert_eq!(report.rejected_rows(), 0, "unexpected rejections: {:?}", report.tables);
    ScriptEngine::new(RegistryHandle::new(registry), catalog)
}
