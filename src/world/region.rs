//! A single-threaded simulation partition and everything living in it.

use std::collections::BTreeMap;

use crate::dbscript::engine::ScriptSchedule;
use crate::world::catalog::CreatureTemplate;
use crate::world::object::{
    Corpse, Creature, GameObject, GameObjectType, GoState, HighGuid, Item, KillCredit, ObjectGuid,
    ObjectRef, ObjectValues, Player, Position, SummonDespawn, UnitData,
};

const SUMMON_COUNTER_START: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundScope {
    /// Heard by everyone around the source, or only by `target` when set.
    Direct { target: Option<ObjectGuid> },
    /// Volume falls off with distance from the source.
    Distance { target: Option<ObjectGuid> },
    Map,
    Zone(u32),
}

/// Observable effects produced inside a region, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Text {
        source: ObjectGuid,
        target: Option<ObjectGuid>,
        text_id: i32,
    },
    Emote {
        source: ObjectGuid,
        emote: u32,
    },
    FacingSet {
        guid: ObjectGuid,
        orientation: f32,
    },
    MovedTo {
        guid: ObjectGuid,
        destination: Position,
        speed: Option<f32>,
    },
    NearTeleport {
        guid: ObjectGuid,
        destination: Position,
    },
    Teleported {
        guid: ObjectGuid,
        map_id: u32,
        destination: Position,
    },
    QuestExplored {
        player: ObjectGuid,
        quest: u32,
    },
    QuestFailed {
        player: ObjectGuid,
        quest: u32,
    },
    KillCredit {
        player: ObjectGuid,
        entry: u32,
    },
    Respawned {
        guid: ObjectGuid,
        despawn_after_secs: u32,
    },
    Despawned {
        guid: ObjectGuid,
    },
    Summoned {
        guid: ObjectGuid,
        entry: u32,
        summoner: ObjectGuid,
    },
    DoorOrButtonUsed {
        guid: ObjectGuid,
        state: GoState,
    },
    GameObjectUsed {
        guid: ObjectGuid,
        user: ObjectGuid,
    },
    AuraRemoved {
        guid: ObjectGuid,
        spell_id: u32,
    },
    SpellCast {
        caster: ObjectGuid,
        target: ObjectGuid,
        spell_id: u32,
        triggered: bool,
        original_caster: Option<ObjectGuid>,
    },
    Sound {
        source: ObjectGuid,
        sound_id: u32,
        scope: SoundScope,
    },
    ItemCreated {
        player: ObjectGuid,
        item: u32,
        amount: u32,
    },
    AttackStarted {
        attacker: ObjectGuid,
        victim: ObjectGuid,
    },
    TaxiStarted {
        player: ObjectGuid,
        path: u32,
    },
}

/// The live-object set of one simulated map plus its clock and script schedule.
#[derive(Debug)]
pub struct Region {
    id: u32,
    battleground_id: Option<u32>,
    now_ms: u64,
    creatures: BTreeMap<ObjectGuid, Creature>,
    players: BTreeMap<ObjectGuid, Player>,
    game_objects: BTreeMap<ObjectGuid, GameObject>,
    corpses: BTreeMap<ObjectGuid, Corpse>,
    items: BTreeMap<ObjectGuid, Item>,
    groups: BTreeMap<u32, Vec<ObjectGuid>>,
    events: Vec<WorldEvent>,
    next_summon_counter: u32,
    schedule: ScriptSchedule,
}

impl Region {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            battleground_id: None,
            now_ms: 0,
            creatures: BTreeMap::new(),
            players: BTreeMap::new(),
            game_objects: BTreeMap::new(),
            corpses: BTreeMap::new(),
            items: BTreeMap::new(),
            groups: BTreeMap::new(),
            events: Vec::new(),
            next_summon_counter: SUMMON_COUNTER_START,
            schedule: ScriptSchedule::default(),
        }
    }

    /// Region hosting a battleground instance.
    pub fn battleground(id: u32, battleground_id: u32) -> Self {
        let mut region = Self::new(id);
        region.battleground_id = Some(battleground_id);
        region
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn battleground_id(&self) -> Option<u32> {
        self.battleground_id
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn add_creature(&mut self, creature: Creature) -> ObjectGuid {
        let guid = creature.guid;
        self.creatures.insert(guid, creature);
        guid
    }

    pub fn add_player(&mut self, player: Player) -> ObjectGuid {
        let guid = player.guid;
        self.players.insert(guid, player);
        guid
    }

    pub fn add_game_object(&mut self, game_object: GameObject) -> ObjectGuid {
        let guid = game_object.guid;
        self.game_objects.insert(guid, game_object);
        guid
    }

    pub fn add_corpse(&mut self, corpse: Corpse) -> ObjectGuid {
        let guid = corpse.guid;
        self.corpses.insert(guid, corpse);
        guid
    }

    /// Adds an item to its owner's bags. Returns `None` when the owner is not here.
    pub fn add_item(&mut self, item: Item) -> Option<ObjectGuid> {
        let owner = self.players.get_mut(&item.owner)?;
        *owner.inventory.entry(item.entry).or_insert(0) += 1;
        let guid = item.guid;
        self.items.insert(guid, item);
        Some(guid)
    }

    pub fn form_group(&mut self, group_id: u32, members: &[ObjectGuid]) {
        for guid in members {
            if let Some(player) = self.players.get_mut(guid) {
                player.group = Some(group_id);
            }
        }
        self.groups.insert(group_id, members.to_vec());
    }

    /// Members of the player's group present in this region, or just the player.
    pub fn group_members(&self, player: ObjectGuid) -> Vec<ObjectGuid> {
        let group = self.players.get(&player).and_then(|p| p.group);
        match group.and_then(|id| self.groups.get(&id)) {
            Some(members) => members
                .iter()
                .copied()
                .filter(|guid| self.players.contains_key(guid))
                .collect(),
            None if self.players.contains_key(&player) => vec![player],
            None => Vec::new(),
        }
    }

    pub fn in_group(&self, player: ObjectGuid) -> bool {
        self.players
            .get(&player)
            .and_then(|p| p.group)
            .map(|id| self.groups.contains_key(&id))
            .unwrap_or(false)
    }

    /// Resolves any guid to the live object it names, if present in this region.
    pub fn object(&self, guid: ObjectGuid) -> Option<ObjectRef<'_>> {
        match guid.high() {
            HighGuid::Creature | HighGuid::Pet => self.creatures.get(&guid).map(ObjectRef::Creature),
            HighGuid::Player => self.players.get(&guid).map(ObjectRef::Player),
            HighGuid::GameObject => self.game_objects.get(&guid).map(ObjectRef::GameObject),
            HighGuid::Corpse => self.corpses.get(&guid).map(ObjectRef::Corpse),
            HighGuid::Item => self.items.get(&guid).map(ObjectRef::Item),
        }
    }

    pub fn creature(&self, guid: ObjectGuid) -> Option<&Creature> {
        self.creatures.get(&guid)
    }

    pub fn creature_mut(&mut self, guid: ObjectGuid) -> Option<&mut Creature> {
        self.creatures.get_mut(&guid)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    pub fn player(&self, guid: ObjectGuid) -> Option<&Player> {
        self.players.get(&guid)
    }

    pub fn player_mut(&mut self, guid: ObjectGuid) -> Option<&mut Player> {
        self.players.get_mut(&guid)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn game_object(&self, guid: ObjectGuid) -> Option<&GameObject> {
        self.game_objects.get(&guid)
    }

    pub fn game_object_mut(&mut self, guid: ObjectGuid) -> Option<&mut GameObject> {
        self.game_objects.get_mut(&guid)
    }

    pub fn game_objects(&self) -> impl Iterator<Item = &GameObject> {
        self.game_objects.values()
    }

    /// Update fields of any object kind.
    pub fn values_mut(&mut self, guid: ObjectGuid) -> Option<&mut ObjectValues> {
        match guid.high() {
            HighGuid::Creature | HighGuid::Pet => self.creatures.get_mut(&guid).map(|c| &mut c.values),
            HighGuid::Player => self.players.get_mut(&guid).map(|p| &mut p.values),
            HighGuid::GameObject => self.game_objects.get_mut(&guid).map(|go| &mut go.values),
            HighGuid::Corpse => self.corpses.get_mut(&guid).map(|c| &mut c.values),
            HighGuid::Item => self.items.get_mut(&guid).map(|i| &mut i.values),
        }
    }

    pub fn unit_data_mut(&mut self, guid: ObjectGuid) -> Option<&mut UnitData> {
        match guid.high() {
            HighGuid::Creature | HighGuid::Pet => self.creatures.get_mut(&guid).map(|c| &mut c.unit),
            HighGuid::Player => self.players.get_mut(&guid).map(|p| &mut p.unit),
            _ => None,
        }
    }

    pub fn record(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn schedule(&self) -> &ScriptSchedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut ScriptSchedule {
        &mut self.schedule
    }

    pub fn summon_creature(
        &mut self,
        template: &CreatureTemplate,
        position: Position,
        despawn: SummonDespawn,
        active: bool,
        summoner: ObjectGuid,
    ) -> ObjectGuid {
        let counter = self.next_summon_counter;
        self.next_summon_counter = self.next_summon_counter.wrapping_add(1);
        let guid = ObjectGuid::creature(template.entry, counter);
        let mut creature = Creature::new(guid, position, template.faction, template.choose_display_id());
        creature.active = active;
        creature.summoned = Some(despawn);
        if let SummonDespawn::TimedOrDead { delay_ms } = despawn {
            creature.despawn_at = Some(self.now_ms + u64::from(delay_ms));
        }
        self.creatures.insert(guid, creature);
        self.record(WorldEvent::Summoned {
            guid,
            entry: template.entry,
            summoner,
        });
        guid
    }

    /// Toggles a door or button; when `reset_secs` is non-zero the previous state
    /// comes back after that many seconds.
    pub fn use_door_or_button(&mut self, guid: ObjectGuid, reset_secs: u32) -> bool {
        let now = self.now_ms;
        let Some(go) = self.game_objects.get_mut(&guid) else {
            return false;
        };
        let previous = go.state;
        go.state = match previous {
            GoState::Ready => GoState::Active,
            GoState::Active => GoState::Ready,
        };
        go.reset = (reset_secs > 0).then(|| (now + u64::from(reset_secs) * 1000, previous));
        let state = go.state;
        self.record(WorldEvent::DoorOrButtonUsed { guid, state });
        true
    }

    /// Generic object use by a unit. Doors and buttons toggle without a timer.
    pub fn use_game_object(&mut self, guid: ObjectGuid, user: ObjectGuid) -> bool {
        let Some(go_type) = self.game_objects.get(&guid).map(|go| go.go_type) else {
            return false;
        };
        if matches!(go_type, GameObjectType::Door | GameObjectType::Button) {
            self.use_door_or_button(guid, 0);
        }
        self.record(WorldEvent::GameObjectUsed { guid, user });
        true
    }

    /// Spawns a despawned object for `despawn_secs` seconds.
    pub fn respawn_game_object(&mut self, guid: ObjectGuid, despawn_secs: u32) -> bool {
        let now = self.now_ms;
        let Some(go) = self.game_objects.get_mut(&guid) else {
            return false;
        };
        go.spawned = true;
        go.despawn_at = Some(now + u64::from(despawn_secs) * 1000);
        self.record(WorldEvent::Respawned {
            guid,
            despawn_after_secs: despawn_secs,
        });
        true
    }

    /// Removes a creature now (`delay_ms == 0`) or once the delay elapses.
    pub fn forced_despawn(&mut self, guid: ObjectGuid, delay_ms: u32) -> bool {
        if delay_ms == 0 {
            if self.creatures.remove(&guid).is_some() {
                self.record(WorldEvent::Despawned { guid });
                return true;
            }
            return false;
        }
        let now = self.now_ms;
        match self.creatures.get_mut(&guid) {
            Some(creature) => {
                creature.despawn_at = Some(now + u64::from(delay_ms));
                true
            }
            None => false,
        }
    }

    pub fn cast_spell(
        &mut self,
        caster: ObjectGuid,
        target: ObjectGuid,
        spell_id: u32,
        triggered: bool,
        original_caster: Option<ObjectGuid>,
    ) {
        if let Some(unit) = self.unit_data_mut(target) {
            if !unit.has_aura(spell_id) {
                unit.auras.push(spell_id);
            }
        }
        self.record(WorldEvent::SpellCast {
            caster,
            target,
            spell_id,
            triggered,
            original_caster,
        });
    }

    pub fn teleport_player(&mut self, guid: ObjectGuid, map_id: u32, destination: Position) -> bool {
        let Some(player) = self.players.get_mut(&guid) else {
            return false;
        };
        player.map_id = map_id;
        player.unit.position = destination;
        self.record(WorldEvent::Teleported {
            guid,
            map_id,
            destination,
        });
        true
    }

    /// Credits `entry` to the player, or to every group member when `group` is set.
    pub fn reward_kill_credit(&mut self, player: ObjectGuid, entry: u32, source: Option<ObjectGuid>, group: bool) {
        let recipients = if group {
            self.group_members(player)
        } else {
            vec![player]
        };
        for guid in recipients {
            if let Some(member) = self.players.get_mut(&guid) {
                member.kill_credits.push(KillCredit { entry, source });
                self.events.push(WorldEvent::KillCredit { player: guid, entry });
            }
        }
    }

    /// Advances the clock and fires any object timers that came due.
    pub fn advance(&mut self, diff_ms: u64) {
        self.now_ms += diff_ms;
        let now = self.now_ms;

        let mut fired = Vec::new();
        for go in self.game_objects.values_mut() {
            if let Some((due, restore)) = go.reset {
                if due <= now {
                    go.state = restore;
                    go.reset = None;
                    fired.push(WorldEvent::DoorOrButtonUsed {
                        guid: go.guid,
                        state: restore,
                    });
                }
            }
            if go.despawn_at.map(|due| due <= now).unwrap_or(false) {
                go.spawned = false;
                go.despawn_at = None;
                fired.push(WorldEvent::Despawned { guid: go.guid });
            }
        }

        let expired: Vec<ObjectGuid> = self
            .creatures
            .values()
            .filter(|c| {
                c.despawn_at.map(|due| due <= now).unwrap_or(false)
                    || (c.summoned.is_some() && !c.unit.alive)
            })
            .map(|c| c.guid)
            .collect();
        for guid in expired {
            self.creatures.remove(&guid);
            fired.push(WorldEvent::Despawned { guid });
        }

        self.events.extend(fired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door_region() -> (Region, ObjectGuid) {
        let mut region = Region::new(0);
        let guid = region.add_game_object(GameObject::new(
            ObjectGuid::game_object(500, 1),
            GameObjectType::Door,
            Position::default(),
        ));
        (region, guid)
    }

    #[test]
    fn door_state_restores_after_reset_delay() {
        let (mut region, door) = door_region();
        assert!(region.use_door_or_button(door, 15));
        assert_eq!(region.game_object(door).map(|go| go.state), Some(GoState::Active));
        region.advance(14_999);
        assert_eq!(region.game_object(door).map(|go| go.state), Some(GoState::Active));
        region.advance(1);
        assert_eq!(region.game_object(door).map(|go| go.state), Some(GoState::Ready));
    }

    #[test]
    fn respawned_object_despawns_after_timer() {
        let (mut region, door) = door_region();
        if let Some(go) = region.game_object_mut(door) {
            go.spawned = false;
        }
        region.respawn_game_object(door, 5);
        region.advance(5_000);
        assert_eq!(region.game_object(door).map(|go| go.spawned), Some(false));
    }

    #[test]
    fn group_members_fall_back_to_solo_player() {
        let mut region = Region::new(0);
        let alice = region.add_player(Player::new(1, "Alice", Position::default(), 0));
        let bob = region.add_player(Player::new(2, "Bob", Position::default(), 0));
        assert_eq!(region.group_members(alice), vec![alice]);
        region.form_group(9, &[alice, bob]);
        assert_eq!(region.group_members(bob), vec![alice, bob]);
        assert!(region.in_group(alice));
    }

    #[test]
    fn forced_despawn_with_delay_waits_for_clock() {
        let mut region = Region::new(0);
        let guid = region.add_creature(Creature::new(
            ObjectGuid::creature(10, 1),
            Position::default(),
            1,
            100,
        ));
        region.forced_despawn(guid, 2_000);
        region.advance(1_000);
        assert!(region.creature(guid).is_some());
        region.advance(1_000);
        assert!(region.creature(guid).is_none());
        assert!(region
            .events()
            .contains(&WorldEvent::Despawned { guid }));
    }
}
