//! Per-command semantics.
//!
//! [`execute_step`] resolves the step's objects and applies one command to the
//! region. A returned [`StepError`] means the step did nothing; the caller logs
//! it and moves on. Only the two termination commands produce
//! [`StepOutcome::Terminate`].

use log::{debug, error, trace};
use rand::{Rng, RngCore};

use crate::dbscript::command::{
    CommandPayload, DbMotion, NpcFlagChange, ScriptCommand, GO_INTERACT, GO_LOCK, GO_NON_INTERACT,
    GO_UNLOCK, SOUND_FLAG_DISTANCE, SOUND_FLAG_MAP_WIDE, SOUND_FLAG_TARGET_PLAYER, SOUND_FLAG_ZONE_WIDE,
};
use crate::dbscript::errors::StepError;
use crate::dbscript::resolver::{resolve_step, StepTargets};
use crate::world::catalog::GameCatalog;
use crate::world::condition::is_player_meeting_condition;
use crate::world::object::{
    GameObjectType, GoState, Motion, ObjectGuid, ObjectRef, ObjectValues, Position, QuestStatus,
    SummonDespawn, TemporaryFaction, TypeId, WaypointMotion, GAMEOBJECT_FLAGS, GO_FLAG_LOCKED, GO_FLAG_NO_INTERACT, OBJECT_FIELD_ENTRY, PLAYER_FLAGS,
    PLAYER_FLAGS_XP_USER_DISABLED, UNIT_NPC_FLAGS,
};
use crate::world::region::{Region, SoundScope, WorldEvent};
use crate::world::search::{nearest_creature, within_distance, SearchScope};

const LOG_TARGET: &str = "db_scripts::exec";

pub const MIN_RESPAWN_DELAY_SECS: u32 = 5;
pub const MIN_DOOR_RESET_SECS: u32 = 15;
/// Point-to-point distance under which a move-to only turns the actor.
pub const MOVE_TO_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    /// Stop every remaining step of this invocation.
    Terminate,
}

/// Read-only inputs a step needs besides the region.
pub struct StepContext<'a> {
    pub catalog: &'a dyn GameCatalog,
    /// Name of the table the step came from, for diagnostics.
    pub table: &'a str,
    pub rng: &'a mut dyn RngCore,
}

/// Resolves and applies one step.
pub fn execute_step(
    ctx: &mut StepContext<'_>,
    region: &mut Region,
    command: &ScriptCommand,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
) -> Result<StepOutcome, StepError> {
    let objects = resolve_step(region, command, source, target)?;
    trace!(
        target: LOG_TARGET,
        "Process table `{}` id {}, command {} for source {:?}, target {:?}",
        ctx.table,
        command.id,
        command.kind(),
        objects.source,
        objects.target
    );
    apply(ctx, region, command, objects).map(|outcome| {
        if outcome == StepOutcome::Terminate {
            debug!(
                target: LOG_TARGET,
                "Process table `{}` id {}, terminate further steps of this script",
                ctx.table,
                command.id
            );
        }
        outcome
    })
}

fn is_creature(guid: Option<ObjectGuid>) -> bool {
    guid.map(|g| g.type_id() == TypeId::Unit).unwrap_or(false)
}

fn require_creature(guid: Option<ObjectGuid>) -> Result<ObjectGuid, StepError> {
    guid.filter(|g| g.type_id() == TypeId::Unit).ok_or(StepError::NotCreature)
}

fn require_unit(guid: Option<ObjectGuid>) -> Result<ObjectGuid, StepError> {
    guid.filter(|g| g.type_id().is_unit()).ok_or(StepError::NotUnit)
}

fn require_game_object(guid: Option<ObjectGuid>) -> Result<ObjectGuid, StepError> {
    guid.filter(|g| g.type_id() == TypeId::GameObject).ok_or(StepError::NotGameObject)
}

/// The target when it is a player, else the source when it is one.
fn player_target_or_source(objects: &StepTargets) -> Result<ObjectGuid, StepError> {
    objects
        .target
        .filter(ObjectGuid::is_player)
        .or(objects.source.filter(ObjectGuid::is_player))
        .ok_or(StepError::NotPlayer)
}

fn pick<T: Copy>(rng: &mut dyn RngCore, choices: &[T]) -> Option<T> {
    match choices.len() {
        0 => None,
        1 => Some(choices[0]),
        n => Some(choices[rng.gen_range(0..n)]),
    }
}

fn apply(
    ctx: &mut StepContext<'_>,
    region: &mut Region,
    command: &ScriptCommand,
    objects: StepTargets,
) -> Result<StepOutcome, StepError> {
    let StepTargets { source, target, .. } = objects;
    match &command.payload {
        CommandPayload::Talk => {
            let speaker = source.ok_or(StepError::NoSource)?;
            let listener = target.filter(|g| g.type_id().is_unit());
            let texts: Vec<i32> = command.populated_text_ids().collect();
            let text_id = pick(ctx.rng, &texts).unwrap_or(command.text_ids[0]);
            display_text(ctx.catalog, region, speaker, text_id, listener)?;
        }
        CommandPayload::Emote { emote_id } => {
            let actor = require_unit(source)?;
            let mut emotes = vec![*emote_id];
            emotes.extend(command.emote_alternatives());
            let emote = pick(ctx.rng, &emotes).unwrap_or(*emote_id);
            region.record(WorldEvent::Emote { source: actor, emote });
        }
        CommandPayload::FieldSet { field, value } => {
            let values = field_values(region, objects.source_or_item, *field)?;
            values.set(*field, *value);
        }
        CommandPayload::FlagSet { field, value } => {
            let values = field_values(region, objects.source_or_item, *field)?;
            values.set_flag(*field, *value);
        }
        CommandPayload::FlagRemove { field, value } => {
            let values = field_values(region, objects.source_or_item, *field)?;
            values.remove_flag(*field, *value);
        }
        CommandPayload::MoveTo { travel_speed } => {
            let actor = require_unit(source)?;
            move_to(region, command, actor, *travel_speed)?;
        }
        CommandPayload::TeleportTo { map_id } => {
            let player = player_target_or_source(&objects)?;
            region.teleport_player(player, *map_id, command.position);
        }
        CommandPayload::QuestExplored { quest_id, distance } => {
            let player = player_target_or_source(&objects)?;
            quest_explored(region, player, source, target, *quest_id, *distance)?;
        }
        CommandPayload::KillCredit {
            creature_entry,
            group_credit,
        } => {
            let player = player_target_or_source(&objects)?;
            let reward_source = source.filter(|g| is_creature(Some(*g))).or(target.filter(|g| is_creature(Some(*g))));
            let entry = match (*creature_entry, reward_source) {
                (0, Some(creature)) => creature.entry(),
                (0, None) => return Err(StepError::NoCreditSource),
                (entry, _) => entry,
            };
            if *group_credit {
                let searcher = reward_source.or(source).or(target);
                if searcher != reward_source {
                    debug!(
                        target: LOG_TARGET,
                        "Process table `{}` id {}, group kill credit without creature as searcher, script might need adjustment",
                        ctx.table,
                        command.id
                    );
                }
                region.reward_kill_credit(player, entry, searcher, true);
            } else {
                region.reward_kill_credit(player, entry, reward_source, false);
            }
        }
        CommandPayload::RespawnGameObject { go_guid, despawn_delay } => {
            let delay = (*despawn_delay).max(MIN_RESPAWN_DELAY_SECS);
            let guid = command_game_object(ctx.catalog, region, command, *go_guid, source)?;
            let Some(go) = region.game_object(guid) else {
                return Err(StepError::GameObjectMissing {
                    guid: *go_guid,
                    buddy: command.buddy_entry,
                });
            };
            if go.go_type.blocks_script_respawn() {
                return Err(StepError::WrongGameObjectType(go.go_type));
            }
            if !go.spawned {
                region.respawn_game_object(guid, delay);
            }
        }
        CommandPayload::TempSummonCreature {
            creature_entry,
            despawn_delay,
        } => {
            let summoner = source.ok_or(StepError::NoSource)?;
            let template = ctx
                .catalog
                .creature_template(*creature_entry)
                .ok_or(StepError::SummonFailed(*creature_entry))?;
            let despawn = if *despawn_delay != 0 {
                SummonDespawn::TimedOrDead {
                    delay_ms: *despawn_delay,
                }
            } else {
                SummonDespawn::OnDeath
            };
            region.summon_creature(template, command.position, despawn, command.is_additional(), summoner);
        }
        CommandPayload::OpenDoor { go_guid, reset_delay } | CommandPayload::CloseDoor { go_guid, reset_delay } => {
            let opening = matches!(command.payload, CommandPayload::OpenDoor { .. });
            let reset = (*reset_delay).max(MIN_DOOR_RESET_SECS);
            let door = command_game_object(ctx.catalog, region, command, *go_guid, source)?;
            let Some(go) = region.game_object(door) else {
                return Err(StepError::GameObjectMissing {
                    guid: *go_guid,
                    buddy: command.buddy_entry,
                });
            };
            if go.go_type != GameObjectType::Door {
                return Err(StepError::WrongGameObjectType(go.go_type));
            }
            let closed = go.state == GoState::Ready;
            if opening != closed {
                return Ok(StepOutcome::Applied);
            }
            region.use_door_or_button(door, reset);
            let button = target.and_then(|guid| region.game_object(guid)).filter(|go| {
                go.go_type == GameObjectType::Button
            });
            if let Some(button) = button.map(|go| go.guid) {
                region.use_door_or_button(button, reset);
            }
        }
        CommandPayload::ActivateObject => {
            let user = require_unit(source)?;
            let object = require_game_object(target)?;
            region.use_game_object(object, user);
        }
        CommandPayload::RemoveAura { spell_id } => {
            let actor = require_unit(source)?;
            let removed = region
                .unit_data_mut(actor)
                .map(|unit| unit.remove_auras_due_to_spell(*spell_id))
                .unwrap_or(false);
            if removed {
                region.record(WorldEvent::AuraRemoved {
                    guid: actor,
                    spell_id: *spell_id,
                });
            }
        }
        CommandPayload::CastSpell { spell_id } => {
            let victim = require_unit(target)?;
            match source.filter(|g| g.type_id() == TypeId::GameObject) {
                Some(object) => region.cast_spell(victim, victim, *spell_id, true, Some(object)),
                None => {
                    let caster = require_unit(source)?;
                    region.cast_spell(caster, victim, *spell_id, command.is_additional(), None);
                }
            }
        }
        CommandPayload::PlaySound { sound_id, flags } => {
            let emitter = source.ok_or(StepError::NoSource)?;
            let listener = if flags & SOUND_FLAG_TARGET_PLAYER != 0 {
                Some(player_target_or_source(&objects)?)
            } else {
                None
            };
            let scope = if flags & SOUND_FLAG_DISTANCE != 0 {
                SoundScope::Distance { target: listener }
            } else if flags & (SOUND_FLAG_MAP_WIDE | SOUND_FLAG_ZONE_WIDE) != 0 {
                match zone_of(region, emitter) {
                    zone if flags & SOUND_FLAG_ZONE_WIDE != 0 && zone != 0 => SoundScope::Zone(zone),
                    _ => SoundScope::Map,
                }
            } else {
                SoundScope::Direct { target: listener }
            };
            region.record(WorldEvent::Sound {
                source: emitter,
                sound_id: *sound_id,
                scope,
            });
        }
        CommandPayload::CreateItem { item_entry, amount } => {
            let player = player_target_or_source(&objects)?;
            if let Some(owner) = region.player_mut(player) {
                *owner.inventory.entry(*item_entry).or_insert(0) += *amount;
                region.record(WorldEvent::ItemCreated {
                    player,
                    item: *item_entry,
                    amount: *amount,
                });
            }
        }
        CommandPayload::DespawnSelf { delay } => {
            let mut victim = target;
            if target.is_some() && !is_creature(target) && is_creature(source) {
                error!(
                    target: LOG_TARGET,
                    "Process table `{}` id {}, command {} target must be creature, but (only) source is, use data_flags to fix",
                    ctx.table,
                    command.id,
                    command.kind()
                );
                victim = source;
            }
            let victim = require_creature(victim)?;
            region.forced_despawn(victim, *delay);
        }
        CommandPayload::PlayMovie { .. } => return Err(StepError::Unsupported(command.kind() as u32)),
        CommandPayload::Movement { motion, wander_distance } => {
            let guid = require_creature(source)?;
            let additional = command.is_additional();
            let creature = region.creature_mut(guid).ok_or(StepError::NotCreature)?;
            creature.unit.motion = match motion {
                DbMotion::Idle => Motion::Idle,
                DbMotion::Random if additional => Motion::Random {
                    center: creature.unit.position,
                    radius: *wander_distance as f32,
                },
                DbMotion::Random => Motion::Random {
                    center: creature.home,
                    radius: if *wander_distance != 0 {
                        *wander_distance as f32
                    } else {
                        creature.wander_distance
                    },
                },
                DbMotion::Waypoint => Motion::Waypoint(WaypointMotion::default()),
            };
        }
        CommandPayload::SetActiveObject { activate } => {
            let guid = require_creature(source)?;
            if let Some(creature) = region.creature_mut(guid) {
                creature.active = *activate;
            }
        }
        CommandPayload::SetFaction { faction_id, flags } => {
            let guid = require_creature(source)?;
            if let Some(creature) = region.creature_mut(guid) {
                creature.temporary_faction = (*faction_id != 0).then_some(TemporaryFaction {
                    faction: *faction_id,
                    flags: *flags,
                });
            }
        }
        CommandPayload::MorphToEntryOrModel { creature_or_model } => {
            let guid = require_creature(source)?;
            let display = display_for(ctx.catalog, command, *creature_or_model)?;
            if let Some(creature) = region.creature_mut(guid) {
                creature.display_id = display.unwrap_or(creature.native_display_id);
            }
        }
        CommandPayload::MountToEntryOrModel { creature_or_model } => {
            let guid = require_creature(source)?;
            let display = display_for(ctx.catalog, command, *creature_or_model)?;
            if let Some(creature) = region.creature_mut(guid) {
                creature.mount_display_id = display;
            }
        }
        CommandPayload::SetRun { run } => {
            let guid = require_creature(source)?;
            if let Some(creature) = region.creature_mut(guid) {
                creature.unit.walking = !*run;
            }
        }
        CommandPayload::AttackStart => {
            let attacker = require_creature(source)?;
            let victim = require_unit(target)?;
            attack_start(ctx.catalog, region, attacker, victim)?;
        }
        CommandPayload::GoLockState { lock_state } => {
            let guid = require_game_object(source)?;
            let values = region.values_mut(guid).ok_or(StepError::NotGameObject)?;
            if lock_state & GO_LOCK != 0 {
                values.set_flag(GAMEOBJECT_FLAGS, GO_FLAG_LOCKED);
            } else if lock_state & GO_UNLOCK != 0 {
                values.remove_flag(GAMEOBJECT_FLAGS, GO_FLAG_LOCKED);
            }
            if lock_state & GO_NON_INTERACT != 0 {
                values.set_flag(GAMEOBJECT_FLAGS, GO_FLAG_NO_INTERACT);
            } else if lock_state & GO_INTERACT != 0 {
                values.remove_flag(GAMEOBJECT_FLAGS, GO_FLAG_NO_INTERACT);
            }
        }
        CommandPayload::StandState { stand_state } => {
            let guid = require_creature(source)?;
            if let Some(creature) = region.creature_mut(guid) {
                creature.unit.stand_state = *stand_state as u8;
            }
        }
        CommandPayload::ModifyNpcFlags { flag, change } => {
            let guid = require_creature(source)?;
            let values = region.values_mut(guid).ok_or(StepError::NotCreature)?;
            match change {
                NpcFlagChange::Add => values.set_flag(UNIT_NPC_FLAGS, *flag),
                NpcFlagChange::Remove => values.remove_flag(UNIT_NPC_FLAGS, *flag),
                NpcFlagChange::Toggle if values.has_flag(UNIT_NPC_FLAGS, *flag) => {
                    values.remove_flag(UNIT_NPC_FLAGS, *flag)
                }
                NpcFlagChange::Toggle => values.set_flag(UNIT_NPC_FLAGS, *flag),
            }
        }
        CommandPayload::SendTaxiPath { path_id } => {
            let player = player_target_or_source(&objects)?;
            if let Some(traveller) = region.player_mut(player) {
                traveller.taxi_path = Some(*path_id);
                region.record(WorldEvent::TaxiStarted { player, path: *path_id });
            }
        }
        CommandPayload::TerminateScript {
            npc_entry,
            search_distance,
        } => {
            return Ok(terminate_script(ctx, region, command, source, target, *npc_entry, *search_distance));
        }
        CommandPayload::PauseWaypoints { pause } => {
            let guid = require_creature(source)?;
            if let Some(creature) = region.creature_mut(guid) {
                creature.waypoint_paused = *pause;
            }
        }
        CommandPayload::XpUser { disable } => {
            let player = player_target_or_source(&objects)?;
            let values = region.values_mut(player).ok_or(StepError::NotPlayer)?;
            if *disable {
                values.set_flag(PLAYER_FLAGS, PLAYER_FLAGS_XP_USER_DISABLED);
            } else {
                values.remove_flag(PLAYER_FLAGS, PLAYER_FLAGS_XP_USER_DISABLED);
            }
        }
        CommandPayload::TerminateCondition {
            condition_id,
            fail_quest,
        } => {
            return Ok(terminate_condition(
                ctx.catalog,
                region,
                command,
                source,
                target,
                *condition_id,
                *fail_quest,
            ));
        }
    }
    Ok(StepOutcome::Applied)
}

fn display_text(
    catalog: &dyn GameCatalog,
    region: &mut Region,
    speaker: ObjectGuid,
    text_id: i32,
    listener: Option<ObjectGuid>,
) -> Result<(), StepError> {
    let text = catalog.script_text(text_id).ok_or(StepError::TextNotDisplayed(text_id))?;
    if text.chat_type.needs_player_target() && !listener.map(|g| g.is_player()).unwrap_or(false) {
        return Err(StepError::TextNotDisplayed(text_id));
    }
    region.record(WorldEvent::Text {
        source: speaker,
        target: listener,
        text_id,
    });
    Ok(())
}

fn field_values(
    region: &mut Region,
    holder: Option<ObjectGuid>,
    field: u32,
) -> Result<&mut ObjectValues, StepError> {
    let guid = holder.ok_or(StepError::NoSource)?;
    let values = region.values_mut(guid).ok_or(StepError::NoSource)?;
    if field <= OBJECT_FIELD_ENTRY || field >= values.count() {
        return Err(StepError::InvalidField {
            field,
            count: values.count(),
            guid,
        });
    }
    Ok(values)
}

fn move_to(region: &mut Region, command: &ScriptCommand, actor: ObjectGuid, travel_speed: u32) -> Result<(), StepError> {
    let destination = command.position;
    let unit = region.unit_data_mut(actor).ok_or(StepError::NotUnit)?;
    let current = unit.position;

    if destination.is_origin() || current.distance_3d(&destination) <= MOVE_TO_TOLERANCE {
        unit.position.o = destination.o;
        region.record(WorldEvent::FacingSet {
            guid: actor,
            orientation: destination.o,
        });
        return Ok(());
    }

    if command.is_additional() {
        let orientation = if destination.o != 0.0 { destination.o } else { current.o };
        let arrival = Position::new(destination.x, destination.y, destination.z, orientation);
        unit.position = arrival;
        region.record(WorldEvent::NearTeleport {
            guid: actor,
            destination: arrival,
        });
        return Ok(());
    }

    let speed = (travel_speed != 0).then(|| travel_speed as f32 * 0.01);
    unit.motion = Motion::Point { destination, speed };
    region.record(WorldEvent::MovedTo {
        guid: actor,
        destination,
        speed,
    });
    Ok(())
}

fn quest_explored(
    region: &mut Region,
    player: ObjectGuid,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
    quest_id: u32,
    distance: u32,
) -> Result<(), StepError> {
    let anchor = source
        .filter(|g| g.type_id().is_creature_or_game_object())
        .or(target.filter(|g| g.type_id().is_creature_or_game_object()));
    if distance != 0 && anchor.is_none() {
        return Err(StepError::NoWorldObject);
    }

    let anchor_object = anchor.and_then(|guid| region.object(guid));
    let failed = match anchor_object {
        Some(ObjectRef::Creature(creature)) if !creature.unit.alive => true,
        Some(object) if distance != 0 => match region.object(player) {
            Some(explorer) => !within_distance(object, explorer, distance as f32),
            None => true,
        },
        None if distance != 0 => return Err(StepError::NoWorldObject),
        _ => false,
    };

    let Some(explorer) = region.player_mut(player) else {
        return Err(StepError::NotPlayer);
    };
    if failed {
        if explorer.fail_quest(quest_id) {
            region.record(WorldEvent::QuestFailed { player, quest: quest_id });
        }
    } else if explorer.area_explored_or_event_happens(quest_id) {
        region.record(WorldEvent::QuestExplored { player, quest: quest_id });
    }
    Ok(())
}

/// The object a respawn/door command acts on: the spawn named by `go_guid`,
/// else the resolved source.
fn command_game_object(
    catalog: &dyn GameCatalog,
    region: &Region,
    command: &ScriptCommand,
    go_guid: u32,
    source: Option<ObjectGuid>,
) -> Result<ObjectGuid, StepError> {
    if go_guid == 0 {
        return require_game_object(source);
    }
    let missing = StepError::GameObjectMissing {
        guid: go_guid,
        buddy: command.buddy_entry,
    };
    let spawn = catalog.game_object_spawn(go_guid).ok_or_else(|| missing.clone())?;
    let guid = ObjectGuid::game_object(spawn.entry, go_guid);
    region.game_object(guid).map(|go| go.guid).ok_or(missing)
}

fn zone_of(region: &Region, guid: ObjectGuid) -> u32 {
    match region.object(guid) {
        Some(ObjectRef::Player(player)) => player.zone_id,
        Some(ObjectRef::GameObject(go)) => go.zone_id,
        _ => 0,
    }
}

/// Display id for a morph/mount value; `None` restores the native look.
fn display_for(catalog: &dyn GameCatalog, command: &ScriptCommand, value: u32) -> Result<Option<u32>, StepError> {
    if value == 0 {
        return Ok(None);
    }
    if command.is_additional() {
        return Ok(Some(value));
    }
    catalog
        .creature_template(value)
        .map(|template| Some(template.choose_display_id()))
        .ok_or(StepError::UnknownTemplate(value))
}

fn attack_start(
    catalog: &dyn GameCatalog,
    region: &mut Region,
    attacker: ObjectGuid,
    victim: ObjectGuid,
) -> Result<(), StepError> {
    let attacker_faction = region
        .creature(attacker)
        .map(|c| c.effective_faction())
        .ok_or(StepError::NotCreature)?;
    let victim_faction = match region.object(victim) {
        Some(ObjectRef::Creature(creature)) => creature.effective_faction(),
        Some(ObjectRef::Player(player)) => player.unit.faction,
        _ => return Err(StepError::NotUnit),
    };
    let friendly = catalog
        .faction_template(attacker_faction)
        .map(|faction| faction.is_friendly_to(victim_faction))
        .unwrap_or(attacker_faction == victim_faction);
    if friendly {
        return Err(StepError::FriendlyTarget {
            attacker,
            target: victim,
        });
    }
    if let Some(creature) = region.creature_mut(attacker) {
        creature.victim = Some(victim);
    }
    region.record(WorldEvent::AttackStarted { attacker, victim });
    Ok(())
}

fn terminate_script(
    ctx: &StepContext<'_>,
    region: &mut Region,
    command: &ScriptCommand,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
    npc_entry: u32,
    search_distance: u32,
) -> StepOutcome {
    let terminate = if npc_entry == 0 {
        true
    } else {
        let mut searcher = source.or(target);
        if searcher.map(|g| g.is_player()).unwrap_or(false) {
            if let Some(other) = target.filter(|g| !g.is_player()) {
                searcher = Some(other);
            }
        }
        let found = searcher
            .and_then(|s| nearest_creature(region, s, npc_entry, search_distance as f32, SearchScope::Grid))
            .is_some();
        if command.is_additional() {
            found
        } else {
            !found
        }
    };
    if !terminate {
        return StepOutcome::Applied;
    }

    let pause = command.text_ids[0];
    if pause != 0 {
        match source.filter(|g| is_creature(Some(*g))).and_then(|g| region.creature_mut(g)) {
            Some(creature) => {
                if let Motion::Waypoint(waypoints) = &mut creature.unit.motion {
                    waypoints.add_pause_time(pause.max(0) as u32);
                }
            }
            None => error!(
                target: LOG_TARGET,
                "Process table `{}` id {}, command {} call for non-creature, skipping waypoint pause",
                ctx.table,
                command.id,
                command.kind()
            ),
        }
    }
    StepOutcome::Terminate
}

fn terminate_condition(
    catalog: &dyn GameCatalog,
    region: &mut Region,
    command: &ScriptCommand,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
    condition_id: u32,
    fail_quest: u32,
) -> StepOutcome {
    let (player, second) = match (target, source) {
        (Some(t), _) if t.is_player() => (Some(t), source),
        (_, Some(s)) if s.is_player() => (Some(s), target),
        _ => (None, source),
    };

    let met = is_player_meeting_condition(catalog, condition_id, player, region, second);
    let terminate = if command.is_additional() { !met } else { met };
    if !terminate {
        return StepOutcome::Applied;
    }

    if let (Some(player), true) = (player, fail_quest != 0) {
        for member in region.group_members(player) {
            let failed = region
                .player_mut(member)
                .filter(|p| p.quest_status(fail_quest) == Some(QuestStatus::Incomplete))
                .map(|p| p.fail_quest(fail_quest))
                .unwrap_or(false);
            if failed {
                region.record(WorldEvent::QuestFailed {
                    player: member,
                    quest: fail_quest,
                });
            }
        }
    }
    StepOutcome::Terminate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbscript::command::{CommandKind, ScriptFlags, ScriptRow};
    use crate::world::catalog::CatalogData;
    use crate::world::fixtures::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Harness {
        catalog: CatalogData,
        region: Region,
        rng: StdRng,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                catalog: sample_catalog(),
                region: sample_region(),
                rng: StdRng::seed_from_u64(7),
            }
        }

        fn run(
            &mut self,
            row: ScriptRow,
            source: Option<ObjectGuid>,
            target: Option<ObjectGuid>,
        ) -> Result<StepOutcome, StepError> {
            let command = ScriptCommand::from_row(&row).unwrap();
            let mut ctx = StepContext {
                catalog: &self.catalog,
                table: "dbscripts_on_event",
                rng: &mut self.rng,
            };
            execute_step(&mut ctx, &mut self.region, &command, source, target)
        }
    }

    fn row(kind: CommandKind) -> ScriptRow {
        ScriptRow::new(1, 0, kind as u32)
    }

    #[test]
    fn talk_picks_only_populated_slots() {
        let mut h = Harness::new();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..64 {
            h.run(row(CommandKind::Talk).with_texts([TEXT_SAY, 0, TEXT_YELL, 0]), Some(GUARD), None)
                .unwrap();
        }
        for event in h.region.drain_events() {
            if let WorldEvent::Text { text_id, .. } = event {
                seen.insert(text_id);
            }
        }
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![TEXT_SAY, TEXT_YELL]);
    }

    #[test]
    fn emote_alternatives_stop_at_first_empty_slot() {
        let mut h = Harness::new();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..64 {
            h.run(row(CommandKind::Emote).with_data(1, 0).with_texts([2, 0, 3, 0]), Some(GUARD), None)
                .unwrap();
        }
        for event in h.region.drain_events() {
            if let WorldEvent::Emote { emote, .. } = event {
                seen.insert(emote);
            }
        }
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn whisper_needs_player_listener() {
        let mut h = Harness::new();
        let whisper = row(CommandKind::Talk).with_texts([TEXT_WHISPER, 0, 0, 0]);
        assert_eq!(
            h.run(whisper.clone(), Some(GUARD), Some(THUG)),
            Err(StepError::TextNotDisplayed(TEXT_WHISPER))
        );
        assert_eq!(h.run(whisper, Some(GUARD), Some(ALICE)), Ok(StepOutcome::Applied));
        assert_eq!(h.run(row(CommandKind::Talk).with_texts([TEXT_SAY, 0, 0, 0]), None, None), Err(StepError::NoSource));
    }

    #[test]
    fn field_set_rejects_header_fields() {
        let mut h = Harness::new();
        assert!(matches!(
            h.run(row(CommandKind::FieldSet).with_data(OBJECT_FIELD_ENTRY, 5), Some(GUARD), None),
            Err(StepError::InvalidField { field: 3, .. })
        ));
        h.run(row(CommandKind::FlagSet).with_data(UNIT_NPC_FLAGS, 0x3), Some(GUARD), None)
            .unwrap();
        h.run(row(CommandKind::FlagRemove).with_data(UNIT_NPC_FLAGS, 0x1), Some(GUARD), None)
            .unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().npc_flags(), 0x2);
    }

    #[test]
    fn move_to_turns_teleports_or_walks() {
        let mut h = Harness::new();
        h.run(row(CommandKind::MoveTo).with_position(0.0, 0.0, 0.0, 1.5), Some(GUARD), None)
            .unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().unit.position.o, 1.5);

        h.run(
            row(CommandKind::MoveTo).with_position(20.0, 5.0, 0.0, 0.0).with_flags(ScriptFlags::COMMAND_ADDITIONAL.bits()),
            Some(GUARD),
            None,
        )
        .unwrap();
        let position = h.region.creature(GUARD).unwrap().unit.position;
        assert_eq!((position.x, position.y, position.o), (20.0, 5.0, 1.5));

        h.run(row(CommandKind::MoveTo).with_data(0, 250).with_position(30.0, 5.0, 0.0, 0.0), Some(GUARD), None)
            .unwrap();
        assert!(matches!(
            h.region.creature(GUARD).unwrap().unit.motion,
            Motion::Point { speed: Some(s), .. } if (s - 2.5).abs() < f32::EPSILON
        ));
    }

    #[test]
    fn quest_explored_fails_when_out_of_range() {
        let mut h = Harness::new();
        h.region.player_mut(ALICE).unwrap().quests.insert(QUEST_EXPLORE, QuestStatus::Incomplete);
        h.region.player_mut(BOB).unwrap().quests.insert(QUEST_EXPLORE, QuestStatus::Incomplete);

        h.run(row(CommandKind::QuestExplored).with_data(QUEST_EXPLORE, 10), Some(GUARD), Some(ALICE))
            .unwrap();
        assert_eq!(h.region.player(ALICE).unwrap().quest_status(QUEST_EXPLORE), Some(QuestStatus::Complete));

        h.run(row(CommandKind::QuestExplored).with_data(QUEST_EXPLORE, 10), Some(MARSHAL), Some(BOB))
            .unwrap();
        assert_eq!(h.region.player(BOB).unwrap().quest_status(QUEST_EXPLORE), Some(QuestStatus::Failed));

        assert_eq!(
            h.run(row(CommandKind::QuestExplored).with_data(QUEST_EXPLORE, 10), Some(ALICE), None),
            Err(StepError::NoWorldObject)
        );
    }

    #[test]
    fn kill_credit_takes_entry_from_creature_partner() {
        let mut h = Harness::new();
        h.run(row(CommandKind::KillCredit), Some(THUG), Some(ALICE)).unwrap();
        let credits = &h.region.player(ALICE).unwrap().kill_credits;
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].entry, THUG_ENTRY);
        assert_eq!(credits[0].source, Some(THUG));

        assert_eq!(h.run(row(CommandKind::KillCredit), Some(ALICE), None), Err(StepError::NoCreditSource));

        h.region.form_group(1, &[ALICE, BOB]);
        h.run(row(CommandKind::KillCredit).with_data(MARSHAL_ENTRY, 1), Some(GUARD), Some(ALICE))
            .unwrap();
        assert_eq!(h.region.player(BOB).unwrap().kill_credits.len(), 1);
        assert_eq!(h.region.player(CAROL).unwrap().kill_credits.len(), 0);
    }

    #[test]
    fn respawn_floors_delay_and_skips_spawned_objects() {
        let mut h = Harness::new();
        h.run(row(CommandKind::RespawnGameObject).with_data(CHEST.counter(), 2), None, None)
            .unwrap();
        assert!(h.region.events().contains(&WorldEvent::Respawned {
            guid: CHEST,
            despawn_after_secs: MIN_RESPAWN_DELAY_SECS
        }));

        h.region.drain_events();
        h.run(row(CommandKind::RespawnGameObject).with_data(CHEST.counter(), 60), None, None)
            .unwrap();
        assert!(h.region.events().is_empty());

        assert_eq!(
            h.run(row(CommandKind::RespawnGameObject).with_data(TRAP.counter(), 30), None, None),
            Err(StepError::WrongGameObjectType(GameObjectType::Trap))
        );
    }

    #[test]
    fn doors_toggle_once_and_take_buttons_along() {
        let mut h = Harness::new();
        h.run(row(CommandKind::CloseDoor).with_data(DOOR.counter(), 0), None, None).unwrap();
        assert!(h.region.events().is_empty());

        h.run(row(CommandKind::OpenDoor).with_data(DOOR.counter(), 0), None, Some(LEVER))
            .unwrap();
        assert_eq!(h.region.game_object(DOOR).unwrap().state, GoState::Active);
        assert_eq!(h.region.game_object(LEVER).unwrap().state, GoState::Active);

        h.run(row(CommandKind::OpenDoor).with_data(DOOR.counter(), 0), None, None).unwrap();
        h.region.advance(14_000);
        assert_eq!(h.region.game_object(DOOR).unwrap().state, GoState::Active);
        h.region.advance(1_000);
        assert_eq!(h.region.game_object(DOOR).unwrap().state, GoState::Ready);
    }

    #[test]
    fn cast_from_game_object_is_self_cast_by_target() {
        let mut h = Harness::new();
        h.run(row(CommandKind::CastSpell).with_data(SPELL_DUMMY, 0), Some(DOOR), Some(ALICE))
            .unwrap();
        assert!(h.region.events().contains(&WorldEvent::SpellCast {
            caster: ALICE,
            target: ALICE,
            spell_id: SPELL_DUMMY,
            triggered: true,
            original_caster: Some(DOOR),
        }));

        h.run(
            row(CommandKind::CastSpell).with_data(SPELL_DUMMY, 0).with_flags(ScriptFlags::COMMAND_ADDITIONAL.bits()),
            Some(GUARD),
            Some(THUG),
        )
        .unwrap();
        assert!(h.region.creature(THUG).unwrap().unit.has_aura(SPELL_DUMMY));
        assert_eq!(
            h.run(row(CommandKind::CastSpell).with_data(SPELL_DUMMY, 0), Some(GUARD), Some(DOOR)),
            Err(StepError::NotUnit)
        );
    }

    #[test]
    fn sound_scope_follows_flags() {
        let mut h = Harness::new();
        h.run(row(CommandKind::PlaySound).with_data(SOUND_BELL, SOUND_FLAG_TARGET_PLAYER), Some(GUARD), Some(ALICE))
            .unwrap();
        h.run(row(CommandKind::PlaySound).with_data(SOUND_BELL, SOUND_FLAG_MAP_WIDE), Some(GUARD), None)
            .unwrap();
        let scopes: Vec<SoundScope> = h
            .region
            .events()
            .iter()
            .filter_map(|event| match event {
                WorldEvent::Sound { scope, .. } => Some(*scope),
                _ => None,
            })
            .collect();
        assert_eq!(scopes, vec![SoundScope::Direct { target: Some(ALICE) }, SoundScope::Map]);
        assert_eq!(
            h.run(row(CommandKind::PlaySound).with_data(SOUND_BELL, SOUND_FLAG_TARGET_PLAYER), Some(GUARD), None),
            Err(StepError::NotPlayer)
        );
    }

    #[test]
    fn despawn_self_falls_back_to_creature_source() {
        let mut h = Harness::new();
        h.run(row(CommandKind::DespawnSelf), Some(THUG), Some(ALICE)).unwrap();
        assert!(h.region.creature(THUG).is_none());
    }

    #[test]
    fn creature_state_commands() {
        let mut h = Harness::new();
        h.run(row(CommandKind::SetFaction).with_data(FACTION_DEFIAS, 0), Some(GUARD), None).unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().effective_faction(), FACTION_DEFIAS);
        h.run(row(CommandKind::SetFaction), Some(GUARD), None).unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().effective_faction(), FACTION_STORMWIND);

        h.run(row(CommandKind::MorphToEntryOrModel).with_data(THUG_ENTRY, 0), Some(GUARD), None)
            .unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().display_id, 1001);
        h.run(row(CommandKind::MorphToEntryOrModel), Some(GUARD), None).unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().display_id, 1000);

        h.run(
            row(CommandKind::MountToEntryOrModel).with_data(MORPH_MODEL, 0).with_flags(ScriptFlags::COMMAND_ADDITIONAL.bits()),
            Some(GUARD),
            None,
        )
        .unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().mount_display_id, Some(MORPH_MODEL));

        h.run(row(CommandKind::SetRun).with_data(1, 0), Some(GUARD), None).unwrap();
        assert!(!h.region.creature(GUARD).unwrap().unit.walking);

        h.run(row(CommandKind::Movement).with_data(1, 7), Some(GUARD), None).unwrap();
        assert!(matches!(
            h.region.creature(GUARD).unwrap().unit.motion,
            Motion::Random { radius, .. } if radius == 7.0
        ));

        h.run(row(CommandKind::ModifyNpcFlags).with_data(0x4, 0), Some(GUARD), None).unwrap();
        h.run(row(CommandKind::ModifyNpcFlags).with_data(0x4, 0), Some(GUARD), None).unwrap();
        assert_eq!(h.region.creature(GUARD).unwrap().npc_flags(), 0);

        assert_eq!(h.run(row(CommandKind::StandState).with_data(1, 0), Some(ALICE), None), Err(StepError::NotCreature));
    }

    #[test]
    fn attack_start_refuses_friendly_targets() {
        let mut h = Harness::new();
        assert_eq!(
            h.run(row(CommandKind::AttackStart), Some(GUARD), Some(MARSHAL)),
            Err(StepError::FriendlyTarget {
                attacker: GUARD,
                target: MARSHAL
            })
        );
        h.run(row(CommandKind::AttackStart), Some(THUG), Some(GUARD)).unwrap();
        assert_eq!(h.region.creature(THUG).unwrap().victim, Some(GUARD));
    }

    #[test]
    fn lock_state_sets_and_clears_flags() {
        let mut h = Harness::new();
        h.run(row(CommandKind::GoLockState).with_data(GO_LOCK | GO_NON_INTERACT, 0), Some(DOOR), None)
            .unwrap();
        assert_eq!(h.region.game_object(DOOR).unwrap().flags(), GO_FLAG_LOCKED | GO_FLAG_NO_INTERACT);
        h.run(row(CommandKind::GoLockState).with_data(GO_UNLOCK, 0), Some(DOOR), None).unwrap();
        assert_eq!(h.region.game_object(DOOR).unwrap().flags(), GO_FLAG_NO_INTERACT);
    }

    #[test]
    fn terminate_script_inverts_with_additional_flag() {
        let mut h = Harness::new();
        let absent = row(CommandKind::TerminateScript).with_data(WOLF_ENTRY, 20);
        assert_eq!(h.run(absent.clone(), Some(GUARD), None), Ok(StepOutcome::Terminate));
        let present = row(CommandKind::TerminateScript).with_data(THUG_ENTRY, 20);
        assert_eq!(h.run(present.clone(), Some(GUARD), None), Ok(StepOutcome::Applied));
        let inverted = present.with_flags(ScriptFlags::COMMAND_ADDITIONAL.bits());
        assert_eq!(h.run(inverted, Some(GUARD), None), Ok(StepOutcome::Terminate));
        assert_eq!(h.run(row(CommandKind::TerminateScript), Some(GUARD), None), Ok(StepOutcome::Terminate));
    }

    #[test]
    fn terminate_script_extends_waypoint_pause() {
        let mut h = Harness::new();
        h.region.creature_mut(GUARD).unwrap().unit.motion = Motion::Waypoint(WaypointMotion::default());
        h.run(
            row(CommandKind::TerminateScript).with_data(WOLF_ENTRY, 20).with_texts([3000, 0, 0, 0]),
            Some(GUARD),
            None,
        )
        .unwrap();
        assert_eq!(
            h.region.creature(GUARD).unwrap().unit.motion,
            Motion::Waypoint(WaypointMotion {
                current_node: 0,
                pause_ms: 3000
            })
        );
    }

    #[test]
    fn xp_toggle_and_taxi_need_a_player() {
        let mut h = Harness::new();
        h.run(row(CommandKind::XpUser).with_data(1, 0), Some(GUARD), Some(ALICE)).unwrap();
        assert!(h.region.player(ALICE).unwrap().xp_disabled());
        h.run(row(CommandKind::SendTaxiPath).with_data(TAXI_PATH, 0), Some(BOB), None).unwrap();
        assert_eq!(h.region.player(BOB).unwrap().taxi_path, Some(TAXI_PATH));
        assert_eq!(h.run(row(CommandKind::XpUser), Some(GUARD), None), Err(StepError::NotPlayer));
    }

    #[test]
    fn movie_never_runs() {
        let mut h = Harness::new();
        assert_eq!(
            h.run(row(CommandKind::PlayMovie).with_data(1, 0), Some(ALICE), None),
            Err(StepError::Unsupported(19))
        );
    }
}
