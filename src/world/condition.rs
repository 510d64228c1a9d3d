//! Evaluation of stored player conditions.

use crate::world::catalog::{GameCatalog, LevelComparison, PlayerCondition};
use crate::world::object::{ObjectGuid, ObjectRef};
use crate::world::region::Region;
use crate::world::search::{nearest_creature, SearchScope};

const MAX_NESTING: u8 = 8;

/// Evaluates condition `id` for `player`, with `second` as the secondary object.
///
/// Unknown ids, missing players and cyclic references all evaluate to false.
pub fn is_player_meeting_condition(
    catalog: &dyn GameCatalog,
    id: u32,
    player: Option<ObjectGuid>,
    region: &Region,
    second: Option<ObjectGuid>,
) -> bool {
    evaluate(catalog, id, player, region, second, 0)
}

fn evaluate(
    catalog: &dyn GameCatalog,
    id: u32,
    player: Option<ObjectGuid>,
    region: &Region,
    second: Option<ObjectGuid>,
    depth: u8,
) -> bool {
    if depth > MAX_NESTING {
        log::warn!("condition {} nests deeper than {} levels, treating as unmet", id, MAX_NESTING);
        return false;
    }
    let Some(condition) = catalog.condition(id) else {
        return false;
    };
    let nested = |inner: u32| evaluate(catalog, inner, player, region, second, depth + 1);

    match condition {
        PlayerCondition::Always => true,
        PlayerCondition::Not { condition } => !nested(*condition),
        PlayerCondition::And { first, second: other } => nested(*first) && nested(*other),
        PlayerCondition::Or { first, second: other } => nested(*first) || nested(*other),
        PlayerCondition::SecondAlive => match second.and_then(|guid| region.object(guid)) {
            Some(ObjectRef::Creature(creature)) => creature.unit.alive,
            Some(ObjectRef::Player(p)) => p.unit.alive,
            Some(_) => true,
            None => false,
        },
        other => {
            let Some(p) = player.and_then(|guid| region.player(guid)) else {
                return false;
            };
            match other {
                PlayerCondition::HasAura { spell_id } => p.unit.has_aura(*spell_id),
                PlayerCondition::HasItem { item, count } => p.item_count(*item) >= (*count).max(1),
                PlayerCondition::QuestStatus { quest, status } => p.quest_status(*quest) == Some(*status),
                PlayerCondition::QuestNone { quest } => p.quest_status(*quest).is_none(),
                PlayerCondition::Level { level, comparison } => match comparison {
                    LevelComparison::Equal => p.level == *level,
                    LevelComparison::AtLeast => p.level >= *level,
                    LevelComparison::AtMost => p.level <= *level,
                },
                PlayerCondition::NearCreature { entry, radius } => {
                    nearest_creature(region, p.guid, *entry, *radius, SearchScope::Grid).is_some()
                }
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::catalog::CatalogData;
    use crate::world::object::{Player, Position, QuestStatus};

    #[test]
    fn composite_conditions_follow_references() {
        let catalog = CatalogData::new()
            .with_condition(1, PlayerCondition::HasAura { spell_id: 40 })
            .with_condition(
                2,
                PlayerCondition::QuestStatus {
                    quest: 7,
                    status: QuestStatus::Incomplete,
                },
            )
            .with_condition(3, PlayerCondition::And { first: 1, second: 2 })
            .with_condition(4, PlayerCondition::Not { condition: 3 });

        let mut region = Region::new(0);
        let mut player = Player::new(1, "Alice", Position::default(), 0);
        player.unit.auras.push(40);
        player.quests.insert(7, QuestStatus::Incomplete);
        let guid = region.add_player(player);

        assert!(is_player_meeting_condition(&catalog, 3, Some(guid), &region, None));
        assert!(!is_player_meeting_condition(&catalog, 4, Some(guid), &region, None));
        assert!(!is_player_meeting_condition(&catalog, 1, None, &region, None));
        assert!(!is_player_meeting_condition(&catalog, 99, Some(guid), &region, None));
    }

    #[test]
    fn self_referencing_condition_terminates() {
        let catalog = CatalogData::new().with_condition(5, PlayerCondition::Not { condition: 5 });
        let region = Region::new(0);
        // Alternates per level, bottoms out at the nesting cap.
        let _ = is_player_meeting_condition(&catalog, 5, None, &region, None);
    }
}
