use thiserror::Error;

use crate::world::object::{GameObjectType, ObjectGuid};

/// Errors raised by the storage and import layers of the script engine.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Malformed JSON in a seed file or catalog dump.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

/// Why a script row was dropped at load time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadValidationError {
    #[error("unknown command {0}")]
    UnknownCommand(u32),

    #[error("buddy entry {entry} is not a known {kind} template")]
    UnknownBuddyTemplate { entry: u32, kind: &'static str },

    #[error("buddy entry {entry} has search radius 0")]
    ZeroSearchRadius { entry: u32 },

    #[error("invalid data_flags {0:#x}")]
    InvalidFlags(u32),

    #[error("data_flags {0:#x} set the additional flag, which this command does not support")]
    AdditionalNotSupported(u32),

    #[error("data_flags {0:#x} require a buddy but none is defined")]
    BuddyRequired(u32),

    #[error("buddy defined by guid {guid}, but nothing is spawned with that guid")]
    BuddyGuidNotSpawned { guid: u32 },

    #[error("buddy defined by guid {guid} has entry {found}, expected {expected}")]
    BuddyGuidEntryMismatch { guid: u32, found: u32, expected: u32 },

    #[error("invalid talk text id {0}")]
    MissingTalkText(i32),

    #[error("text id {id} in slot {slot} outside {min}..{max}")]
    TextIdOutOfRange { slot: usize, id: i32, min: i32, max: i32 },

    #[error("invalid emote id {0}")]
    UnknownEmote(i64),

    #[error("invalid map {0}")]
    UnknownMap(u32),

    #[error("invalid coordinates ({x}, {y}, {z})")]
    InvalidCoordinates { x: f32, y: f32, z: f32 },

    #[error("invalid quest {0}")]
    UnknownQuest(u32),

    #[error("exploration distance {0} too large")]
    DistanceTooLarge(u32),

    #[error("exploration distance {0} too small")]
    DistanceTooSmall(u32),

    #[error("invalid creature entry {0}")]
    UnknownCreature(u32),

    #[error("no game object guid nor buddy defined")]
    NoGameObject,

    #[error("invalid game object guid {0}")]
    UnknownGameObjectGuid(u32),

    #[error("game object entry {0} does not exist")]
    UnknownGameObjectEntry(u32),

    #[error("game object type {0:?} is not supported by this command")]
    UnsupportedGameObjectType(GameObjectType),

    #[error("nonexistent spell {0}")]
    UnknownSpell(u32),

    #[error("nonexistent sound {0}")]
    UnknownSound(u32),

    #[error("nonexistent item {0}")]
    UnknownItem(u32),

    #[error("create item amount is 0")]
    ZeroItemAmount,

    #[error("play movie is not supported")]
    MovieUnsupported,

    #[error("invalid movement type {0}")]
    InvalidMovementType(u32),

    #[error("faction template {0} does not exist")]
    UnknownFaction(u32),

    #[error("display model {0} does not exist")]
    UnknownDisplayModel(u32),

    #[error("invalid lock state {0:#x}")]
    InvalidLockState(u32),

    #[error("invalid stand state {0}")]
    InvalidStandState(u32),

    #[error("taxi path {0} does not exist")]
    UnknownTaxiPath(u32),

    #[error("taxi path {path} can already be triggered by spell {spell}")]
    AmbiguousTaxiPath { path: u32, spell: u32 },

    #[error("condition {0} does not exist")]
    UnknownCondition(u32),
}

/// Why a single scheduled step did nothing at run time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("unsupported guid {0} for this role")]
    UnsupportedGuid(ObjectGuid),

    #[error("buddy {entry} by guid {guid} is dead")]
    BuddyDead { entry: u32, guid: u32 },

    #[error("buddy {entry} by guid {guid} is not loaded in region {region}")]
    BuddyNotLoaded { entry: u32, guid: u32, region: u32 },

    #[error("buddy {0} wanted but no source for the search is available")]
    NoSearcher(u32),

    #[error("buddy {entry} not found in range {radius} of {searcher}")]
    BuddyNotFound {
        entry: u32,
        radius: u32,
        searcher: ObjectGuid,
    },

    #[error("no world object as source")]
    NoSource,

    #[error("call for non-creature")]
    NotCreature,

    #[error("call for non-unit")]
    NotUnit,

    #[error("call for non-gameobject")]
    NotGameObject,

    #[error("call for non-player")]
    NotPlayer,

    #[error("field {field} outside 4..{count} of {guid}")]
    InvalidField {
        field: u32,
        count: u32,
        guid: ObjectGuid,
    },

    #[error("could not display text {0}")]
    TextNotDisplayed(i32),

    #[error("called with a distance but without a world object")]
    NoWorldObject,

    #[error("dynamic kill credit without creature partner")]
    NoCreditSource,

    #[error("game object (guid {guid}, buddy {buddy}) not found")]
    GameObjectMissing { guid: u32, buddy: u32 },

    #[error("game object type {0:?} can not be used with this command")]
    WrongGameObjectType(GameObjectType),

    #[error("creature template {0} does not exist")]
    UnknownTemplate(u32),

    #[error("summon of creature {0} failed")]
    SummonFailed(u32),

    #[error("attacker {attacker} is friendly to target {target}")]
    FriendlyTarget {
        attacker: ObjectGuid,
        target: ObjectGuid,
    },

    #[error("unsupported command {0}")]
    Unsupported(u32),
}

/// Why a supplementary module could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleLoadError {
    #[error("script module {0} not found")]
    NotFound(String),

    #[error("script module does not provide required hooks: {}", missing.join(", "))]
    WrongApi { missing: Vec<&'static str> },

    #[error("script module built for revision {found}, core is {expected}")]
    Outdated { expected: String, found: String },
}
