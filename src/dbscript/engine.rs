//! Script invocation, scheduling and the generic event entry point.
//!
//! Starting a script copies a handle to its command list into the owning
//! region's [`ScriptSchedule`]. [`ScriptEngine::update`] advances the region
//! clock and executes whatever came due, so an invocation keeps the table
//! snapshot it started with even if a reload swaps the registry meanwhile.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error, trace};

use crate::dbscript::command::ScriptCommand;
use crate::dbscript::dispatch::{execute_step, StepContext, StepOutcome};
use crate::dbscript::hooks::{PvpHandler, ScriptHooks};
use crate::dbscript::registry::RegistryHandle;
use crate::dbscript::table::ScriptTableKind;
use crate::world::catalog::GameCatalog;
use crate::world::object::{ObjectGuid, TypeId};
use crate::world::region::Region;

const LOG_TARGET: &str = "db_scripts::exec";

/// How a new invocation treats invocations of the same script that are
/// still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    /// Always start.
    #[default]
    Normal,
    UniqueBySource,
    UniqueByTarget,
    UniqueBySourceTarget,
}

#[derive(Debug, Clone)]
struct Invocation {
    kind: ScriptTableKind,
    script_id: u32,
    source: Option<ObjectGuid>,
    target: Option<ObjectGuid>,
    pending: usize,
}

impl Invocation {
    fn is_same_script(
        &self,
        kind: ScriptTableKind,
        script_id: u32,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        policy: ExecutionPolicy,
    ) -> bool {
        if self.kind != kind || self.script_id != script_id {
            return false;
        }
        match policy {
            ExecutionPolicy::Normal => false,
            ExecutionPolicy::UniqueBySource => self.source == source,
            ExecutionPolicy::UniqueByTarget => self.target == target,
            ExecutionPolicy::UniqueBySourceTarget => self.source == source && self.target == target,
        }
    }
}

/// One scheduled step of an invocation.
#[derive(Debug, Clone)]
pub struct PendingStep {
    pub invocation: u64,
    pub table: Arc<str>,
    steps: Arc<[ScriptCommand]>,
    index: usize,
    pub source: Option<ObjectGuid>,
    pub target: Option<ObjectGuid>,
}

impl PendingStep {
    pub fn command(&self) -> &ScriptCommand {
        &self.steps[self.index]
    }
}

/// Pending steps of one region, ordered by (due time, sequence).
#[derive(Debug, Default)]
pub struct ScriptSchedule {
    steps: BTreeMap<(u64, u64), PendingStep>,
    invocations: BTreeMap<u64, Invocation>,
    next_sequence: u64,
    next_invocation: u64,
}

impl ScriptSchedule {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn pending_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn pending_invocations(&self) -> usize {
        self.invocations.len()
    }

    /// Whether an invocation matching `policy` is still pending.
    pub fn is_running(
        &self,
        kind: ScriptTableKind,
        script_id: u32,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        policy: ExecutionPolicy,
    ) -> bool {
        self.invocations
            .values()
            .any(|invocation| invocation.is_same_script(kind, script_id, source, target, policy))
    }

    /// Schedules every step of `steps`, each `delay` seconds after `now_ms`.
    #[allow(clippy::too_many_arguments)]
    pub fn enqueue(
        &mut self,
        now_ms: u64,
        kind: ScriptTableKind,
        table: Arc<str>,
        script_id: u32,
        steps: Arc<[ScriptCommand]>,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
    ) -> u64 {
        let invocation = self.next_invocation;
        self.next_invocation += 1;

        for (index, step) in steps.iter().enumerate() {
            let due = now_ms + u64::from(step.delay) * 1000;
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.steps.insert(
                (due, sequence),
                PendingStep {
                    invocation,
                    table: Arc::clone(&table),
                    steps: Arc::clone(&steps),
                    index,
                    source,
                    target,
                },
            );
        }
        self.invocations.insert(
            invocation,
            Invocation {
                kind,
                script_id,
                source,
                target,
                pending: steps.len(),
            },
        );
        invocation
    }

    /// Removes and returns the earliest step due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<PendingStep> {
        let key = *self.steps.keys().next().filter(|(due, _)| *due <= now_ms)?;
        let step = self.steps.remove(&key)?;
        let finished = match self.invocations.get_mut(&step.invocation) {
            Some(invocation) => {
                invocation.pending = invocation.pending.saturating_sub(1);
                invocation.pending == 0
            }
            None => false,
        };
        if finished {
            self.invocations.remove(&step.invocation);
        }
        Some(step)
    }

    /// Drops every remaining step of `invocation`, returning how many.
    pub fn cancel(&mut self, invocation: u64) -> usize {
        let before = self.steps.len();
        self.steps.retain(|_, step| step.invocation != invocation);
        self.invocations.remove(&invocation);
        before - self.steps.len()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.invocations.clear();
    }
}

/// Runs scripts from the current registry snapshot against regions.
pub struct ScriptEngine {
    registry: RegistryHandle,
    catalog: Arc<dyn GameCatalog>,
    hooks: ScriptHooks,
    pvp: Option<Box<dyn PvpHandler>>,
}

impl ScriptEngine {
    pub fn new(registry: RegistryHandle, catalog: Arc<dyn GameCatalog>) -> Self {
        Self {
            registry,
            catalog,
            hooks: ScriptHooks::default(),
            pvp: None,
        }
    }

    pub fn with_hooks(mut self, hooks: ScriptHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_pvp(mut self, pvp: Box<dyn PvpHandler>) -> Self {
        self.pvp = Some(pvp);
        self
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    pub fn catalog(&self) -> &dyn GameCatalog {
        self.catalog.as_ref()
    }

    pub fn hooks(&self) -> &ScriptHooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut ScriptHooks {
        &mut self.hooks
    }

    /// Schedules script `id` of the `kind` table. Returns false when the table
    /// has no such script or `policy` finds a matching invocation pending.
    pub fn scripts_start(
        &self,
        region: &mut Region,
        kind: ScriptTableKind,
        id: u32,
        source: Option<ObjectGuid>,
        target: Option<ObjectGuid>,
        policy: ExecutionPolicy,
    ) -> bool {
        let snapshot = self.registry.snapshot();
        let Some(table) = snapshot.table(kind) else {
            return false;
        };
        let Some(steps) = table.get(id) else {
            return false;
        };

        if policy != ExecutionPolicy::Normal && region.schedule().is_running(kind, id, source, target, policy) {
            debug!(
                target: LOG_TARGET,
                "Table `{}` id {} already running for source {:?}, target {:?}; not started again",
                table.name(),
                id,
                source,
                target
            );
            return false;
        }

        let now = region.now_ms();
        let name: Arc<str> = Arc::from(table.name());
        region
            .schedule_mut()
            .enqueue(now, kind, name, id, steps, source, target);
        true
    }

    /// Entry point for generic events raised by game objects, spells and taxi
    /// nodes. A module that handles the event, or a PvP handler it was
    /// forwarded to, takes precedence over the event table.
    pub fn start_event(
        &self,
        region: &mut Region,
        id: u32,
        source: ObjectGuid,
        target: Option<ObjectGuid>,
        is_start: bool,
        forward_to_pvp: Option<ObjectGuid>,
    ) -> bool {
        if self.hooks.on_process_event(region, id, source, target, is_start) {
            return true;
        }

        if let Some(forward) = forward_to_pvp.filter(|_| source.type_id() == TypeId::GameObject) {
            if self.forward_to_pvp(region, id, source, forward) {
                return true;
            }
        }

        let policy = if source.type_id().is_creature_or_game_object() {
            ExecutionPolicy::UniqueBySource
        } else if target.map(|t| t.type_id().is_creature_or_game_object()).unwrap_or(false) {
            ExecutionPolicy::UniqueByTarget
        } else {
            ExecutionPolicy::UniqueBySourceTarget
        };
        self.scripts_start(region, ScriptTableKind::Event, id, Some(source), target, policy)
    }

    fn forward_to_pvp(&self, region: &Region, id: u32, object: ObjectGuid, forward: ObjectGuid) -> bool {
        let Some(pvp) = self.pvp.as_deref() else {
            return false;
        };
        if forward.is_player() {
            return match region.player(forward) {
                Some(player) => match player.battleground_id {
                    Some(battleground) => pvp.battleground_event(battleground, id, object),
                    None => pvp.outdoor_event(player.zone_id, id, object),
                },
                None => false,
            };
        }
        match region.battleground_id() {
            Some(battleground) => pvp.battleground_event(battleground, id, object),
            // Game objects don't move, so their zone is the one to ask.
            None => region
                .game_object(object)
                .map(|go| pvp.outdoor_event(go.zone_id, id, object))
                .unwrap_or(false),
        }
    }

    /// Routes an area trigger to its module script.
    pub fn area_trigger(&self, region: &mut Region, player: ObjectGuid, trigger_id: u32) -> bool {
        if self.registry.snapshot().area_trigger_script_id(trigger_id) == 0 {
            return false;
        }
        self.hooks.on_area_trigger(region, player, trigger_id)
    }

    /// Advances the region clock by `diff_ms` and runs every step that came due.
    /// Returns how many steps were taken off the schedule.
    pub fn update(&self, region: &mut Region, diff_ms: u64) -> usize {
        region.advance(diff_ms);
        self.process_due(region)
    }

    /// Runs steps due at the region's current time without moving the clock.
    pub fn process_due(&self, region: &mut Region) -> usize {
        let mut rng = rand::thread_rng();
        let mut processed = 0;
        loop {
            let now = region.now_ms();
            let Some(step) = region.schedule_mut().pop_due(now) else {
                break;
            };
            processed += 1;

            let command = step.command();
            let mut ctx = StepContext {
                catalog: self.catalog.as_ref(),
                table: &step.table,
                rng: &mut rng,
            };
            match execute_step(&mut ctx, region, command, step.source, step.target) {
                Ok(StepOutcome::Applied) => {}
                Ok(StepOutcome::Terminate) => {
                    let dropped = region.schedule_mut().cancel(step.invocation);
                    trace!(
                        target: LOG_TARGET,
                        "Table `{}` id {} terminated, {} pending steps dropped",
                        step.table,
                        command.id,
                        dropped
                    );
                }
                Err(err) => {
                    error!(
                        target: LOG_TARGET,
                        "Process table `{}` id {}, command {} skipped: {}",
                        step.table,
                        command.id,
                        command.kind(),
                        err
                    );
                }
            }
        }
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbscript::command::{CommandKind, ScriptRow};
    use crate::dbscript::table::ScriptTable;

    fn steps(delays: &[u32]) -> Arc<[ScriptCommand]> {
        let commands: Vec<ScriptCommand> = delays
            .iter()
            .enumerate()
            .map(|(index, delay)| {
                ScriptCommand::from_row(&ScriptRow::new(1, *delay, CommandKind::Emote as u32).with_data(index as u32, 0))
                    .unwrap()
            })
            .collect();
        let table = ScriptTable::from_commands(ScriptTableKind::Event, "dbscripts_on_event", commands);
        table.get(1).unwrap()
    }

    fn emote_of(step: &PendingStep) -> u32 {
        match step.command().payload {
            crate::dbscript::command::CommandPayload::Emote { emote_id } => emote_id,
            _ => unreachable!(),
        }
    }

    #[test]
    fn due_steps_come_out_in_delay_then_insertion_order() {
        let mut schedule = ScriptSchedule::default();
        schedule.enqueue(0, ScriptTableKind::Event, Arc::from("t"), 1, steps(&[5, 0, 0]), None, None);

        assert_eq!(emote_of(&schedule.pop_due(0).unwrap()), 1);
        assert_eq!(emote_of(&schedule.pop_due(0).unwrap()), 2);
        assert!(schedule.pop_due(4_999).is_none());
        assert_eq!(emote_of(&schedule.pop_due(5_000).unwrap()), 0);
        assert!(schedule.is_empty());
        assert_eq!(schedule.pending_invocations(), 0);
    }

    #[test]
    fn uniqueness_compares_only_what_the_policy_names() {
        let a = Some(ObjectGuid::creature(1, 1));
        let b = Some(ObjectGuid::player(2));
        let mut schedule = ScriptSchedule::default();
        schedule.enqueue(0, ScriptTableKind::Event, Arc::from("t"), 7, steps(&[0]), a, b);

        let kind = ScriptTableKind::Event;
        assert!(schedule.is_running(kind, 7, a, None, ExecutionPolicy::UniqueBySource));
        assert!(schedule.is_running(kind, 7, None, b, ExecutionPolicy::UniqueByTarget));
        assert!(!schedule.is_running(kind, 7, a, None, ExecutionPolicy::UniqueBySourceTarget));
        assert!(!schedule.is_running(kind, 7, a, b, ExecutionPolicy::Normal));
        assert!(!schedule.is_running(kind, 8, a, b, ExecutionPolicy::UniqueBySource));
        assert!(!schedule.is_running(ScriptTableKind::Gossip, 7, a, b, ExecutionPolicy::UniqueBySource));
    }

    #[test]
    fn cancel_drops_only_that_invocation() {
        let mut schedule = ScriptSchedule::default();
        let first = schedule.enqueue(0, ScriptTableKind::Event, Arc::from("t"), 1, steps(&[0, 1, 2]), None, None);
        schedule.enqueue(0, ScriptTableKind::Event, Arc::from("t"), 1, steps(&[3]), None, None);

        schedule.pop_due(0);
        assert_eq!(schedule.cancel(first), 2);
        assert_eq!(schedule.pending_steps(), 1);
        assert_eq!(schedule.pending_invocations(), 1);
    }
}
