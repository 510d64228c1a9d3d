//! Small Elwynn-flavoured world shared by unit tests.

use crate::world::catalog::{
    CatalogData, ChatType, PlayerCondition, SpellEffect, SpellEffectKind, TaxiPathNode,
    QUEST_SPECIAL_FLAG_EXPLORATION_OR_EVENT,
};
use crate::world::object::{
    Creature, GameObject, GameObjectType, ObjectGuid, Player, Position, QuestStatus,
};
use crate::world::region::Region;

pub const GUARD_ENTRY: u32 = 100;
pub const THUG_ENTRY: u32 = 101;
pub const MARSHAL_ENTRY: u32 = 102;
pub const WOLF_ENTRY: u32 = 103;

pub const DOOR_ENTRY: u32 = 200;
pub const LEVER_ENTRY: u32 = 201;
pub const CHEST_ENTRY: u32 = 202;
pub const SIGNAL_FIRE_ENTRY: u32 = 203;
pub const TRAP_ENTRY: u32 = 204;

pub const GUARD: ObjectGuid = ObjectGuid::creature(GUARD_ENTRY, 1);
pub const THUG: ObjectGuid = ObjectGuid::creature(THUG_ENTRY, 2);
pub const MARSHAL: ObjectGuid = ObjectGuid::creature(MARSHAL_ENTRY, 3);
pub const DOOR: ObjectGuid = ObjectGuid::game_object(DOOR_ENTRY, 10);
pub const LEVER: ObjectGuid = ObjectGuid::game_object(LEVER_ENTRY, 11);
pub const CHEST: ObjectGuid = ObjectGuid::game_object(CHEST_ENTRY, 12);
pub const TRAP: ObjectGuid = ObjectGuid::game_object(TRAP_ENTRY, 13);
pub const ALICE: ObjectGuid = ObjectGuid::player(1);
pub const BOB: ObjectGuid = ObjectGuid::player(2);
pub const CAROL: ObjectGuid = ObjectGuid::player(3);

pub const QUEST_EXPLORE: u32 = 300;
pub const QUEST_UNFLAGGED: u32 = 301;
pub const QUEST_ESCORT: u32 = 302;

pub const SPELL_SCRIPT_EFFECT: u32 = 400;
pub const SPELL_DUMMY: u32 = 401;
pub const SPELL_TRIGGER_MISSING: u32 = 402;
pub const SPELL_SEND_EVENT: u32 = 403;
pub const SPELL_SEND_TAXI: u32 = 404;
pub const SPELL_AURA_ONLY: u32 = 405;

pub const ITEM_LETTER: u32 = 500;
pub const TAXI_PATH: u32 = 600;
pub const TAXI_PATH_SPELL_FREE: u32 = 601;
pub const AREA_TRIGGER: u32 = 700;

pub const COND_HAS_DUMMY_AURA: u32 = 800;
pub const COND_ESCORT_INCOMPLETE: u32 = 801;
pub const COND_ALWAYS: u32 = 802;

pub const TEXT_SAY: i32 = 2_000_000_001;
pub const TEXT_YELL: i32 = 2_000_000_002;
pub const TEXT_WHISPER: i32 = 2_000_000_003;
pub const TEXT_UNUSED: i32 = 2_000_000_004;

pub const SOUND_BELL: u32 = 900;
pub const FACTION_STORMWIND: u32 = 11;
pub const FACTION_DEFIAS: u32 = 17;
pub const MORPH_MODEL: u32 = 2000;

fn effect(kind: SpellEffectKind, misc_value: i32, trigger_spell: u32) -> SpellEffect {
    SpellEffect {
        kind,
        misc_value,
        trigger_spell,
    }
}

pub fn sample_catalog() -> CatalogData {
    let none = SpellEffect::default();
    let mut catalog = CatalogData::new()
        .with_creature(GUARD_ENTRY, "Stormwind Guard", 1000, FACTION_STORMWIND)
        .with_creature(THUG_ENTRY, "Defias Thug", 1001, FACTION_DEFIAS)
        .with_creature(MARSHAL_ENTRY, "Marshal Dughan", 1002, FACTION_STORMWIND)
        .with_creature(WOLF_ENTRY, "Timber Wolf", 1003, FACTION_STORMWIND)
        .with_creature_spawn(GUARD.counter(), GUARD_ENTRY, Position::default())
        .with_creature_spawn(THUG.counter(), THUG_ENTRY, Position::new(10.0, 0.0, 0.0, 0.0))
        .with_creature_spawn(MARSHAL.counter(), MARSHAL_ENTRY, Position::new(50.0, 0.0, 0.0, 0.0))
        .with_game_object(DOOR_ENTRY, "Iron Gate", GameObjectType::Door)
        .with_game_object(LEVER_ENTRY, "Gate Lever", GameObjectType::Button)
        .with_game_object(CHEST_ENTRY, "Battered Chest", GameObjectType::Chest)
        .with_game_object(SIGNAL_FIRE_ENTRY, "Signal Fire", GameObjectType::Goober)
        .with_game_object(TRAP_ENTRY, "Snare", GameObjectType::Trap)
        .with_game_object_spawn(DOOR.counter(), DOOR_ENTRY, Position::new(5.0, 0.0, 0.0, 0.0))
        .with_game_object_spawn(LEVER.counter(), LEVER_ENTRY, Position::new(6.0, 0.0, 0.0, 0.0))
        .with_game_object_spawn(CHEST.counter(), CHEST_ENTRY, Position::new(8.0, 0.0, 0.0, 0.0))
        .with_game_object_spawn(TRAP.counter(), TRAP_ENTRY, Position::new(9.0, 0.0, 0.0, 0.0))
        .with_quest(QUEST_EXPLORE, "Scouting the Vineyards", QUEST_SPECIAL_FLAG_EXPLORATION_OR_EVENT)
        .with_quest(QUEST_UNFLAGGED, "Report to Goldshire", 0)
        .with_quest(QUEST_ESCORT, "The Defias Brotherhood", 0)
        .with_spell(
            SPELL_SCRIPT_EFFECT,
            "Summon Marshal",
            [effect(SpellEffectKind::Dummy, 0, 0), effect(SpellEffectKind::ScriptEffect, 0, 0), none],
        )
        .with_spell(SPELL_DUMMY, "Ring Bell", [effect(SpellEffectKind::Dummy, 0, 0), none, none])
        .with_spell(
            SPELL_TRIGGER_MISSING,
            "Lost Trigger",
            [effect(SpellEffectKind::TriggerSpell, 0, 9999), none, none],
        )
        .with_spell(
            SPELL_SEND_EVENT,
            "Light Signal",
            [effect(SpellEffectKind::SendEvent, 5002, 0), none, none],
        )
        .with_spell(
            SPELL_SEND_TAXI,
            "Gryphon Ride",
            [effect(SpellEffectKind::SendTaxi, TAXI_PATH as i32, 0), none, none],
        )
        .with_spell(SPELL_AURA_ONLY, "Blessing", [effect(SpellEffectKind::ApplyAura, 0, 0), none, none])
        .with_item(ITEM_LETTER, "Sealed Letter")
        .with_map(0, "Eastern Kingdoms", false)
        .with_map(1, "Kalimdor", false)
        .with_map(30, "Alterac Valley", true)
        .with_faction(FACTION_STORMWIND, &[12])
        .with_faction(12, &[FACTION_STORMWIND])
        .with_faction(FACTION_DEFIAS, &[])
        .with_taxi_path(
            TAXI_PATH,
            vec![
                TaxiPathNode::default(),
                TaxiPathNode {
                    arrival_event_id: 5003,
                    ..TaxiPathNode::default()
                },
            ],
        )
        .with_taxi_path(TAXI_PATH_SPELL_FREE, vec![TaxiPathNode::default()])
        .with_area_trigger(AREA_TRIGGER, 0, Position::default(), 5.0)
        .with_condition(COND_HAS_DUMMY_AURA, PlayerCondition::HasAura { spell_id: SPELL_DUMMY })
        .with_condition(
            COND_ESCORT_INCOMPLETE,
            PlayerCondition::QuestStatus {
                quest: QUEST_ESCORT,
                status: QuestStatus::Incomplete,
            },
        )
        .with_condition(COND_ALWAYS, PlayerCondition::Always)
        .with_text(TEXT_SAY, "Halt! Who goes there?", ChatType::Say)
        .with_text(TEXT_YELL, "To arms!", ChatType::Yell)
        .with_text(TEXT_WHISPER, "Psst, over here.", ChatType::Whisper)
        .with_text(TEXT_UNUSED, "Nobody says this.", ChatType::Say)
        .with_emotes(&[1, 2, 3])
        .with_sounds(&[SOUND_BELL])
        .with_display_models(&[1000, 1001, 1002, 1003, MORPH_MODEL]);

    if let Some(chest) = catalog.game_object_templates.get_mut(&CHEST_ENTRY) {
        chest.event_ids.push(5000);
    }
    if let Some(fire) = catalog.game_object_templates.get_mut(&SIGNAL_FIRE_ENTRY) {
        fire.event_ids.push(5001);
    }
    catalog
}

fn creature(guid: ObjectGuid, x: f32, faction: u32, display: u32) -> Creature {
    Creature::new(guid, Position::new(x, 0.0, 0.0, 0.0), faction, display)
}

/// Region 0 populated with every spawn of [`sample_catalog`] and three players.
pub fn sample_region() -> Region {
    let mut region = Region::new(0);
    region.add_creature(creature(GUARD, 0.0, FACTION_STORMWIND, 1000));
    region.add_creature(creature(THUG, 10.0, FACTION_DEFIAS, 1001));
    region.add_creature(creature(MARSHAL, 50.0, FACTION_STORMWIND, 1002));

    region.add_game_object(GameObject::new(DOOR, GameObjectType::Door, Position::new(5.0, 0.0, 0.0, 0.0)));
    region.add_game_object(GameObject::new(LEVER, GameObjectType::Button, Position::new(6.0, 0.0, 0.0, 0.0)));
    let mut chest = GameObject::new(CHEST, GameObjectType::Chest, Position::new(8.0, 0.0, 0.0, 0.0));
    chest.spawned = false;
    region.add_game_object(chest);
    region.add_game_object(GameObject::new(TRAP, GameObjectType::Trap, Position::new(9.0, 0.0, 0.0, 0.0)));

    for (counter, name, x) in [(1, "Alice", 2.0), (2, "Bob", 3.0), (3, "Carol", 4.0)] {
        region.add_player(Player::new(counter, name, Position::new(x, 0.0, 0.0, 0.0), 0));
    }
    region
}
