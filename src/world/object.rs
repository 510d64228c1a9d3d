//! Live object identities and the object kinds a region can hold.
//!
//! Every live object is addressed by an [`ObjectGuid`] whose high part names the
//! kind of object. [`Region::object`](super::region::Region::object) resolves a guid
//! into an [`ObjectRef`], which is the only way script code looks at an object
//! without already knowing its kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of the entry field; fields at or below it are never script-writable.
pub const OBJECT_FIELD_ENTRY: u32 = 3;
pub const OBJECT_END: u32 = 6;

pub const ITEM_END: u32 = OBJECT_END + 42;
pub const GAMEOBJECT_FLAGS: u32 = OBJECT_END + 3;
pub const GAMEOBJECT_END: u32 = OBJECT_END + 18;
pub const UNIT_NPC_FLAGS: u32 = OBJECT_END + 141;
pub const UNIT_END: u32 = OBJECT_END + 182;
pub const PLAYER_FLAGS: u32 = UNIT_END + 2;
pub const PLAYER_END: u32 = UNIT_END + 1094;

pub const MAP_HALFSIZE: f32 = 17_066.666;
pub const MAX_HEIGHT: f32 = 100_000.0;

pub const GO_FLAG_LOCKED: u32 = 0x0000_0002;
pub const GO_FLAG_NO_INTERACT: u32 = 0x0000_0010;
pub const PLAYER_FLAGS_XP_USER_DISABLED: u32 = 0x0200_0000;

/// Kind tag carried in the high part of a guid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighGuid {
    Creature,
    Pet,
    Player,
    GameObject,
    Corpse,
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectGuid {
    high: HighGuid,
    entry: u32,
    counter: u32,
}

impl ObjectGuid {
    pub const fn new(high: HighGuid, entry: u32, counter: u32) -> Self {
        Self {
            high,
            entry,
            counter,
        }
    }

    pub const fn creature(entry: u32, counter: u32) -> Self {
        Self::new(HighGuid::Creature, entry, counter)
    }

    pub const fn pet(entry: u32, counter: u32) -> Self {
        Self::new(HighGuid::Pet, entry, counter)
    }

    pub const fn player(counter: u32) -> Self {
        Self::new(HighGuid::Player, 0, counter)
    }

    pub const fn game_object(entry: u32, counter: u32) -> Self {
        Self::new(HighGuid::GameObject, entry, counter)
    }

    pub const fn corpse(counter: u32) -> Self {
        Self::new(HighGuid::Corpse, 0, counter)
    }

    pub const fn item(counter: u32) -> Self {
        Self::new(HighGuid::Item, 0, counter)
    }

    pub fn high(&self) -> HighGuid {
        self.high
    }

    pub fn entry(&self) -> u32 {
        self.entry
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn type_id(&self) -> TypeId {
        match self.high {
            HighGuid::Creature | HighGuid::Pet => TypeId::Unit,
            HighGuid::Player => TypeId::Player,
            HighGuid::GameObject => TypeId::GameObject,
            HighGuid::Corpse => TypeId::Corpse,
            HighGuid::Item => TypeId::Item,
        }
    }

    pub fn is_player(&self) -> bool {
        self.high == HighGuid::Player
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.high {
            HighGuid::Player => write!(f, "Player (guid {})", self.counter),
            HighGuid::Corpse => write!(f, "Corpse (guid {})", self.counter),
            HighGuid::Item => write!(f, "Item (guid {})", self.counter),
            HighGuid::Creature => write!(f, "Creature (entry {}, guid {})", self.entry, self.counter),
            HighGuid::Pet => write!(f, "Pet (entry {}, guid {})", self.entry, self.counter),
            HighGuid::GameObject => {
                write!(f, "GameObject (entry {}, guid {})", self.entry, self.counter)
            }
        }
    }
}

/// Coarse object type used by script preconditions ("must be a unit", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    Unit,
    Player,
    GameObject,
    Corpse,
    Item,
}

impl TypeId {
    /// Creatures and players both count as units.
    pub fn is_unit(self) -> bool {
        matches!(self, TypeId::Unit | TypeId::Player)
    }

    pub fn is_creature_or_game_object(self) -> bool {
        matches!(self, TypeId::Unit | TypeId::GameObject)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub o: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32, o: f32) -> Self {
        Self { x, y, z, o }
    }

    pub fn distance_3d(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Finite and inside the playable map square.
    pub fn is_valid_map_coord(&self) -> bool {
        let planar = |c: f32| c.is_finite() && c.abs() <= MAP_HALFSIZE - 0.5;
        planar(self.x) && planar(self.y) && self.z.is_finite() && self.z.abs() <= MAX_HEIGHT && self.o.is_finite()
    }
}

/// Raw update-field storage shared by every object kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectValues {
    values: Vec<u32>,
}

impl ObjectValues {
    pub fn new(count: u32) -> Self {
        Self {
            values: vec![0; count as usize],
        }
    }

    pub fn count(&self) -> u32 {
        self.values.len() as u32
    }

    pub fn get(&self, field: u32) -> u32 {
        self.values.get(field as usize).copied().unwrap_or(0)
    }

    pub fn set(&mut self, field: u32, value: u32) {
        if let Some(slot) = self.values.get_mut(field as usize) {
            *slot = value;
        }
    }

    pub fn set_flag(&mut self, field: u32, flag: u32) {
        let value = self.get(field) | flag;
        self.set(field, value);
    }

    pub fn remove_flag(&mut self, field: u32, flag: u32) {
        let value = self.get(field) & !flag;
        self.set(field, value);
    }

    pub fn has_flag(&self, field: u32, flag: u32) -> bool {
        self.get(field) & flag != 0
    }
}

/// State shared by creatures and players.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitData {
    pub position: Position,
    pub bounding_radius: f32,
    pub alive: bool,
    pub faction: u32,
    pub auras: Vec<u32>,
    pub stand_state: u8,
    pub walking: bool,
    pub motion: Motion,
}

impl UnitData {
    pub fn new(position: Position, faction: u32) -> Self {
        Self {
            position,
            bounding_radius: 0.5,
            alive: true,
            faction,
            auras: Vec::new(),
            stand_state: 0,
            walking: true,
            motion: Motion::Idle,
        }
    }

    pub fn has_aura(&self, spell_id: u32) -> bool {
        self.auras.contains(&spell_id)
    }

    pub fn remove_auras_due_to_spell(&mut self, spell_id: u32) -> bool {
        let before = self.auras.len();
        self.auras.retain(|aura| *aura != spell_id);
        before != self.auras.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Idle,
    Random { center: Position, radius: f32 },
    Waypoint(WaypointMotion),
    Point { destination: Position, speed: Option<f32> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaypointMotion {
    pub current_node: u32,
    pub pause_ms: u32,
}

impl WaypointMotion {
    pub fn add_pause_time(&mut self, ms: u32) {
        self.pause_ms = self.pause_ms.saturating_add(ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryFaction {
    pub faction: u32,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummonDespawn {
    /// Despawns when it dies.
    OnDeath,
    /// Despawns after the delay while out of combat, or when it dies.
    TimedOrDead { delay_ms: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    pub guid: ObjectGuid,
    pub unit: UnitData,
    pub values: ObjectValues,
    pub home: Position,
    pub wander_distance: f32,
    pub native_display_id: u32,
    pub display_id: u32,
    pub mount_display_id: Option<u32>,
    pub temporary_faction: Option<TemporaryFaction>,
    pub active: bool,
    pub waypoint_paused: bool,
    pub victim: Option<ObjectGuid>,
    pub summoned: Option<SummonDespawn>,
    pub despawn_at: Option<u64>,
}

impl Creature {
    pub fn new(guid: ObjectGuid, position: Position, faction: u32, display_id: u32) -> Self {
        Self {
            guid,
            unit: UnitData::new(position, faction),
            values: ObjectValues::new(UNIT_END),
            home: position,
            wander_distance: 0.0,
            native_display_id: display_id,
            display_id,
            mount_display_id: None,
            temporary_faction: None,
            active: false,
            waypoint_paused: false,
            victim: None,
            summoned: None,
            despawn_at: None,
        }
    }

    pub fn entry(&self) -> u32 {
        self.guid.entry()
    }

    pub fn is_pet(&self) -> bool {
        self.guid.high() == HighGuid::Pet
    }

    pub fn effective_faction(&self) -> u32 {
        self.temporary_faction
            .map(|temp| temp.faction)
            .unwrap_or(self.unit.faction)
    }

    pub fn npc_flags(&self) -> u32 {
        self.values.get(UNIT_NPC_FLAGS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Incomplete,
    Complete,
    Failed,
    Rewarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillCredit {
    pub entry: u32,
    pub source: Option<ObjectGuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub guid: ObjectGuid,
    pub name: String,
    pub unit: UnitData,
    pub values: ObjectValues,
    pub level: u8,
    pub zone_id: u32,
    pub quests: BTreeMap<u32, QuestStatus>,
    pub group: Option<u32>,
    pub battleground_id: Option<u32>,
    pub inventory: BTreeMap<u32, u32>,
    pub kill_credits: Vec<KillCredit>,
    pub taxi_path: Option<u32>,
    /// Map the player was last sent to; differs from the region when teleported away.
    pub map_id: u32,
}

impl Player {
    pub fn new(counter: u32, name: &str, position: Position, map_id: u32) -> Self {
        Self {
            guid: ObjectGuid::player(counter),
            name: name.to_string(),
            unit: UnitData::new(position, 0),
            values: ObjectValues::new(PLAYER_END),
            level: 1,
            zone_id: 0,
            quests: BTreeMap::new(),
            group: None,
            battleground_id: None,
            inventory: BTreeMap::new(),
            kill_credits: Vec::new(),
            taxi_path: None,
            map_id,
        }
    }

    pub fn quest_status(&self, quest_id: u32) -> Option<QuestStatus> {
        self.quests.get(&quest_id).copied()
    }

    /// Completes an exploration/event objective of an incomplete quest.
    pub fn area_explored_or_event_happens(&mut self, quest_id: u32) -> bool {
        match self.quests.get_mut(&quest_id) {
            Some(status @ QuestStatus::Incomplete) => {
                *status = QuestStatus::Complete;
                true
            }
            _ => false,
        }
    }

    pub fn fail_quest(&mut self, quest_id: u32) -> bool {
        match self.quests.get_mut(&quest_id) {
            Some(status) if matches!(*status, QuestStatus::Incomplete | QuestStatus::Complete) => {
                *status = QuestStatus::Failed;
                true
            }
            _ => false,
        }
    }

    pub fn item_count(&self, item_entry: u32) -> u32 {
        self.inventory.get(&item_entry).copied().unwrap_or(0)
    }

    pub fn xp_disabled(&self) -> bool {
        self.values
            .has_flag(PLAYER_FLAGS, PLAYER_FLAGS_XP_USER_DISABLED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameObjectType {
    Door,
    Button,
    QuestGiver,
    Chest,
    Generic,
    Trap,
    Goober,
    Camera,
    FishingNode,
    FishingHole,
    CapturePoint,
    Other,
}

impl GameObjectType {
    /// Types that are never respawned by a script.
    pub fn blocks_script_respawn(self) -> bool {
        matches!(
            self,
            GameObjectType::FishingNode
                | GameObjectType::FishingHole
                | GameObjectType::Door
                | GameObjectType::Button
                | GameObjectType::Trap
        )
    }
}

/// Door and button state. `Ready` is the untouched state (a closed door).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoState {
    Active,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub guid: ObjectGuid,
    pub go_type: GameObjectType,
    pub position: Position,
    pub zone_id: u32,
    pub values: ObjectValues,
    pub state: GoState,
    pub spawned: bool,
    pub despawn_at: Option<u64>,
    /// Pending automatic restore of a used door or button: (due ms, state to restore).
    pub reset: Option<(u64, GoState)>,
}

impl GameObject {
    pub fn new(guid: ObjectGuid, go_type: GameObjectType, position: Position) -> Self {
        Self {
            guid,
            go_type,
            position,
            zone_id: 0,
            values: ObjectValues::new(GAMEOBJECT_END),
            state: GoState::Ready,
            spawned: true,
            despawn_at: None,
            reset: None,
        }
    }

    pub fn entry(&self) -> u32 {
        self.guid.entry()
    }

    pub fn flags(&self) -> u32 {
        self.values.get(GAMEOBJECT_FLAGS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Corpse {
    pub guid: ObjectGuid,
    pub owner: ObjectGuid,
    pub position: Position,
    pub values: ObjectValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub guid: ObjectGuid,
    pub entry: u32,
    pub owner: ObjectGuid,
    pub values: ObjectValues,
}

impl Item {
    pub fn new(counter: u32, entry: u32, owner: ObjectGuid) -> Self {
        Self {
            guid: ObjectGuid::item(counter),
            entry,
            owner,
            values: ObjectValues::new(ITEM_END),
        }
    }
}

/// Borrowed view over any live object, produced by a single guid resolution.
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    Creature(&'a Creature),
    Player(&'a Player),
    GameObject(&'a GameObject),
    Corpse(&'a Corpse),
    Item(&'a Item),
}

impl<'a> ObjectRef<'a> {
    pub fn guid(&self) -> ObjectGuid {
        match self {
            ObjectRef::Creature(c) => c.guid,
            ObjectRef::Player(p) => p.guid,
            ObjectRef::GameObject(go) => go.guid,
            ObjectRef::Corpse(c) => c.guid,
            ObjectRef::Item(i) => i.guid,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.guid().type_id()
    }

    pub fn entry(&self) -> u32 {
        match self {
            ObjectRef::Item(i) => i.entry,
            other => other.guid().entry(),
        }
    }

    /// Items live in inventories and have no world position.
    pub fn position(&self) -> Option<Position> {
        match self {
            ObjectRef::Creature(c) => Some(c.unit.position),
            ObjectRef::Player(p) => Some(p.unit.position),
            ObjectRef::GameObject(go) => Some(go.position),
            ObjectRef::Corpse(c) => Some(c.position),
            ObjectRef::Item(_) => None,
        }
    }

    pub fn bounding_radius(&self) -> f32 {
        match self {
            ObjectRef::Creature(c) => c.unit.bounding_radius,
            ObjectRef::Player(p) => p.unit.bounding_radius,
            _ => 0.0,
        }
    }

    pub fn is_world_object(&self) -> bool {
        !matches!(self, ObjectRef::Item(_))
    }

    pub fn values(&self) -> &'a ObjectValues {
        match self {
            ObjectRef::Creature(c) => &c.values,
            ObjectRef::Player(p) => &p.values,
            ObjectRef::GameObject(go) => &go.values,
            ObjectRef::Corpse(c) => &c.values,
            ObjectRef::Item(i) => &i.values,
        }
    }

    pub fn as_creature(&self) -> Option<&'a Creature> {
        match self {
            ObjectRef::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_game_object(&self) -> Option<&'a GameObject> {
        match self {
            ObjectRef::GameObject(go) => Some(go),
            _ => None,
        }
    }
}
