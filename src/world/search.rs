//! Nearest-object queries within a radius of a searcher.

use crate::world::object::{ObjectGuid, ObjectRef, Position};
use crate::world::region::Region;

/// Which objects a creature search may visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Grid-resident creatures only; pets are not part of the grid.
    Grid,
    /// Every creature around the searcher, pets included.
    World,
}

fn searcher_origin(region: &Region, searcher: ObjectGuid) -> Option<(Position, f32)> {
    let object = region.object(searcher)?;
    Some((object.position()?, object.bounding_radius()))
}

/// Edge-to-edge distance between two objects.
fn gap(a: Position, a_radius: f32, b: Position, b_radius: f32) -> f32 {
    (a.distance_3d(&b) - a_radius - b_radius).max(0.0)
}

/// Nearest living creature with `entry` within `radius`, excluding the searcher.
pub fn nearest_creature(
    region: &Region,
    searcher: ObjectGuid,
    entry: u32,
    radius: f32,
    scope: SearchScope,
) -> Option<ObjectGuid> {
    let (origin, own_radius) = searcher_origin(region, searcher)?;
    region
        .creatures()
        .filter(|c| c.guid != searcher && c.entry() == entry && c.unit.alive)
        .filter(|c| scope == SearchScope::World || !c.is_pet())
        .map(|c| {
            (
                gap(origin, own_radius, c.unit.position, c.unit.bounding_radius),
                c.guid,
            )
        })
        .filter(|(distance, _)| *distance <= radius)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, guid)| guid)
}

/// Nearest game object with `entry` within `radius`, spawned or not.
pub fn nearest_game_object(region: &Region, searcher: ObjectGuid, entry: u32, radius: f32) -> Option<ObjectGuid> {
    let (origin, own_radius) = searcher_origin(region, searcher)?;
    region
        .game_objects()
        .filter(|go| go.guid != searcher && go.entry() == entry)
        .map(|go| (gap(origin, own_radius, go.position, 0.0), go.guid))
        .filter(|(distance, _)| *distance <= radius)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, guid)| guid)
}

/// Whether two objects are within `distance` of each other.
pub fn within_distance(a: ObjectRef<'_>, b: ObjectRef<'_>, distance: f32) -> bool {
    match (a.position(), b.position()) {
        (Some(pa), Some(pb)) => gap(pa, a.bounding_radius(), pb, b.bounding_radius()) <= distance,
        _ => false,
    }
}
