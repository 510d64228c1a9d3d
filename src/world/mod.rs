//! The game world the script engine runs against: read-only catalogs, live
//! objects grouped into regions, spatial search and condition evaluation.

pub mod catalog;
pub mod condition;
pub mod object;
pub mod region;
pub mod search;

#[cfg(test)]
pub mod fixtures;

pub use catalog::{CatalogData, GameCatalog};
pub use object::{ObjectGuid, ObjectRef, Position};
pub use region::{Region, WorldEvent};
