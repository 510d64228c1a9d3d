//! Works out which live objects a single script step acts on.
//!
//! Resolution yields guids rather than borrows so the dispatcher is free to
//! take the region mutably afterwards.

use log::error;

use crate::dbscript::command::{ScriptCommand, ScriptFlags};
use crate::dbscript::errors::StepError;
use crate::world::object::{HighGuid, ObjectGuid, ObjectRef, TypeId};
use crate::world::region::Region;
use crate::world::search::{nearest_creature, nearest_game_object, SearchScope};

const LOG_TARGET: &str = "db_scripts::exec";

/// Effective objects of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTargets {
    pub source: Option<ObjectGuid>,
    pub target: Option<ObjectGuid>,
    /// The source world object, or the item that started the script when
    /// there is none.
    pub source_or_item: Option<ObjectGuid>,
}

/// Looks up the object an invocation guid names. Items are only acceptable
/// as the source; any other role rejects them.
pub fn script_command_object(
    region: &Region,
    guid: Option<ObjectGuid>,
    include_item: bool,
) -> Result<Option<ObjectRef<'_>>, StepError> {
    let Some(guid) = guid else {
        return Ok(None);
    };
    if guid.high() == HighGuid::Item {
        if !include_item {
            return Err(StepError::UnsupportedGuid(guid));
        }
        let owned = region.object(guid).filter(|object| match object {
            ObjectRef::Item(item) => region.player(item.owner).is_some(),
            _ => false,
        });
        return Ok(owned);
    }
    Ok(region.object(guid))
}

/// Resolves the invocation's source and target, then applies buddy lookup and
/// the direction flags of `command`.
pub fn resolve_step(
    region: &Region,
    command: &ScriptCommand,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
) -> Result<StepTargets, StepError> {
    let source_object = script_command_object(region, source, true)?;
    let target_object = script_command_object(region, target, false)?;

    let world_source = source_object.filter(|o| o.is_world_object()).map(|o| o.guid());
    let world_target = target_object.filter(|o| o.is_world_object()).map(|o| o.guid());

    let (final_source, final_target) = resolve_process_targets(region, command, world_source, world_target)?;
    let item = source_object
        .filter(|o| o.type_id() == TypeId::Item)
        .map(|o| o.guid());
    Ok(StepTargets {
        source: final_source,
        target: final_target,
        source_or_item: final_source.or(item),
    })
}

/// Buddy lookup plus the buddy-as-target, reverse and targets-self flags, in
/// that order.
pub fn resolve_process_targets(
    region: &Region,
    command: &ScriptCommand,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
) -> Result<(Option<ObjectGuid>, Option<ObjectGuid>), StepError> {
    let buddy = if command.buddy_entry == 0 {
        None
    } else if command.has_flag(ScriptFlags::BUDDY_BY_GUID) {
        Some(buddy_by_guid(region, command)?)
    } else {
        Some(buddy_by_entry(region, command, source, target)?)
    };

    let (mut final_source, mut final_target) = if command.has_flag(ScriptFlags::BUDDY_AS_TARGET) {
        (source, buddy)
    } else {
        (buddy.or(source), target)
    };
    if command.has_flag(ScriptFlags::REVERSE_DIRECTION) {
        std::mem::swap(&mut final_source, &mut final_target);
    }
    if command.has_flag(ScriptFlags::SOURCE_TARGETS_SELF) {
        final_target = final_source;
    }
    Ok((final_source, final_target))
}

fn buddy_by_guid(region: &Region, command: &ScriptCommand) -> Result<ObjectGuid, StepError> {
    let entry = command.buddy_entry;
    let counter = command.search_radius_or_guid;
    if command.is_creature_buddy() {
        let guid = ObjectGuid::creature(entry, counter);
        match region.creature(guid) {
            Some(creature) if !creature.unit.alive => Err(StepError::BuddyDead { entry, guid: counter }),
            Some(_) => Ok(guid),
            None => Err(StepError::BuddyNotLoaded {
                entry,
                guid: counter,
                region: region.id(),
            }),
        }
    } else {
        let guid = ObjectGuid::game_object(entry, counter);
        region
            .game_object(guid)
            .map(|go| go.guid)
            .ok_or(StepError::BuddyNotLoaded {
                entry,
                guid: counter,
                region: region.id(),
            })
    }
}

fn buddy_by_entry(
    region: &Region,
    command: &ScriptCommand,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
) -> Result<ObjectGuid, StepError> {
    let entry = command.buddy_entry;
    let radius = command.search_radius_or_guid;

    let mut searcher = source.or(target).ok_or(StepError::NoSearcher(entry))?;
    if searcher.is_player() {
        if let Some(other) = target.filter(|guid| !guid.is_player()) {
            searcher = other;
        }
    }

    if !command.is_creature_buddy() {
        return nearest_game_object(region, searcher, entry, radius as f32).ok_or(StepError::BuddyNotFound {
            entry,
            radius,
            searcher,
        });
    }

    let scope = if command.has_flag(ScriptFlags::BUDDY_IS_PET) {
        SearchScope::World
    } else {
        SearchScope::Grid
    };
    if let Some(found) = nearest_creature(region, searcher, entry, radius as f32, scope) {
        return Ok(found);
    }
    let searcher_entry = region.object(searcher).map(|object| object.entry());
    if searcher_entry == Some(entry) {
        error!(
            target: LOG_TARGET,
            "Script id {}, command {} has no OTHER buddy {} found - maybe you need to update the script?",
            command.id,
            command.kind(),
            entry
        );
        return Ok(searcher);
    }
    Err(StepError::BuddyNotFound {
        entry,
        radius,
        searcher,
    })
}
