//! Supplementary script modules, the optional embedded scripting host and PvP
//! event forwarding.
//!
//! A module is compiled in and registered by name as a factory. Loading one
//! negotiates its manifest once: the revision must match the core and every
//! required hook must be declared. Hooks the module does not declare are never
//! called and answer with the no-op default.

use std::collections::BTreeMap;

use bitflags::bitflags;
use log::{debug, info, warn};

use crate::dbscript::errors::ModuleLoadError;
use crate::logutil::escape_log;
use crate::world::object::{ObjectGuid, TypeId};
use crate::world::region::Region;

/// Dialog status reported when no script has an opinion.
pub const DIALOG_STATUS_UNDEFINED: u32 = 100;

bitflags! {
    /// Hooks a module declares in its manifest.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HookSet: u32 {
        const GOSSIP_HELLO = 1 << 0;
        const GO_GOSSIP_HELLO = 1 << 1;
        const GOSSIP_SELECT = 1 << 2;
        const GO_GOSSIP_SELECT = 1 << 3;
        const GOSSIP_SELECT_WITH_CODE = 1 << 4;
        const GO_GOSSIP_SELECT_WITH_CODE = 1 << 5;
        const QUEST_ACCEPT = 1 << 6;
        const GO_QUEST_ACCEPT = 1 << 7;
        const ITEM_QUEST_ACCEPT = 1 << 8;
        const QUEST_REWARDED = 1 << 9;
        const GO_QUEST_REWARDED = 1 << 10;
        const NPC_DIALOG_STATUS = 1 << 11;
        const GO_DIALOG_STATUS = 1 << 12;
        const GO_USE = 1 << 13;
        const ITEM_USE = 1 << 14;
        const AREA_TRIGGER = 1 << 15;
        const PROCESS_EVENT = 1 << 16;
        const EFFECT_DUMMY_CREATURE = 1 << 17;
        const EFFECT_DUMMY_GO = 1 << 18;
        const EFFECT_DUMMY_ITEM = 1 << 19;
        const EFFECT_SCRIPT_EFFECT_CREATURE = 1 << 20;
        const AURA_DUMMY = 1 << 21;
    }
}

impl HookSet {
    /// Hooks the engine routes through its own auxiliary maps; a module
    /// without them cannot be bound.
    pub const REQUIRED: HookSet = HookSet::AREA_TRIGGER.union(HookSet::PROCESS_EVENT);

    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// What a module declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleManifest {
    pub name: String,
    /// Core revision the module was built against.
    pub revision: String,
    pub hooks: HookSet,
}

/// Supplementary behaviour callbacks. Every hook returns "not handled" unless
/// overridden; callers fall back to their own logic in that case.
#[allow(unused_variables)]
pub trait ScriptModule: Send + Sync {
    fn manifest(&self) -> ModuleManifest;

    /// Called once after a successful negotiation.
    fn init(&mut self) {}

    /// `speaker` is a creature or a game object.
    fn on_gossip_hello(&self, region: &mut Region, player: ObjectGuid, speaker: ObjectGuid) -> bool {
        false
    }

    fn on_gossip_select(
        &self,
        region: &mut Region,
        player: ObjectGuid,
        speaker: ObjectGuid,
        sender: u32,
        action: u32,
        code: Option<&str>,
    ) -> bool {
        false
    }

    /// `giver` is a creature, game object or item.
    fn on_quest_accept(&self, region: &mut Region, player: ObjectGuid, giver: ObjectGuid, quest_id: u32) -> bool {
        false
    }

    fn on_quest_rewarded(&self, region: &mut Region, player: ObjectGuid, giver: ObjectGuid, quest_id: u32) -> bool {
        false
    }

    fn dialog_status(&self, region: &Region, player: ObjectGuid, giver: ObjectGuid) -> u32 {
        DIALOG_STATUS_UNDEFINED
    }

    fn on_go_use(&self, region: &mut Region, player: ObjectGuid, object: ObjectGuid) -> bool {
        false
    }

    fn on_item_use(&self, region: &mut Region, player: ObjectGuid, item: ObjectGuid) -> bool {
        false
    }

    fn on_area_trigger(&self, region: &mut Region, player: ObjectGuid, trigger_id: u32) -> bool {
        false
    }

    fn on_process_event(
        &self,
        region: &mut Region,
        event_id: u32,
        source: ObjectGuid,
        target: Option<ObjectGuid>,
        is_start: bool,
    ) -> bool {
        false
    }

    /// `target` is a creature, game object or item.
    fn on_effect_dummy(
        &self,
        region: &mut Region,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: usize,
        target: ObjectGuid,
        original_caster: Option<ObjectGuid>,
    ) -> bool {
        false
    }

    fn on_effect_script_effect(
        &self,
        region: &mut Region,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: usize,
        target: ObjectGuid,
        original_caster: Option<ObjectGuid>,
    ) -> bool {
        false
    }

    fn on_aura_dummy(&self, region: &mut Region, holder: ObjectGuid, spell_id: u32, apply: bool) -> bool {
        false
    }
}

/// General-purpose scripting host consulted before the module for the hooks
/// it supports.
#[allow(unused_variables)]
pub trait EmbeddedHost: Send + Sync {
    fn on_gossip_hello(&self, region: &mut Region, player: ObjectGuid, speaker: ObjectGuid) -> bool {
        false
    }

    fn on_gossip_select(
        &self,
        region: &mut Region,
        player: ObjectGuid,
        speaker: ObjectGuid,
        sender: u32,
        action: u32,
        code: Option<&str>,
    ) -> bool {
        false
    }

    fn on_quest_accept(&self, region: &mut Region, player: ObjectGuid, giver: ObjectGuid, quest_id: u32) -> bool {
        false
    }

    fn on_quest_rewarded(&self, region: &mut Region, player: ObjectGuid, giver: ObjectGuid, quest_id: u32) -> bool {
        false
    }

    /// Zero means no opinion.
    fn dialog_status(&self, region: &Region, player: ObjectGuid, giver: ObjectGuid) -> u32 {
        0
    }

    fn on_item_use(&self, region: &mut Region, player: ObjectGuid, item: ObjectGuid) -> bool {
        false
    }

    fn on_area_trigger(&self, region: &mut Region, player: ObjectGuid, trigger_id: u32) -> bool {
        false
    }

    fn on_effect_dummy(
        &self,
        region: &mut Region,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: usize,
        target: ObjectGuid,
    ) -> bool {
        false
    }
}

/// Battleground and outdoor PvP handlers an event can be forwarded to.
#[allow(unused_variables)]
pub trait PvpHandler: Send + Sync {
    fn battleground_event(&self, battleground_id: u32, event_id: u32, object: ObjectGuid) -> bool {
        false
    }

    /// Outdoor PvP script of `zone_id`, if any.
    fn outdoor_event(&self, zone_id: u32, event_id: u32, object: ObjectGuid) -> bool {
        false
    }
}

pub type ModuleFactory = fn() -> Box<dyn ScriptModule>;

/// Compiled-in modules available for loading, by name.
#[derive(Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ModuleFactory) {
        let name = name.into();
        debug!(target: "script_modules", "Registering script module factory: {}", escape_log(&name));
        self.factories.insert(name, factory);
    }

    pub fn available(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates `name` and negotiates its manifest against `revision`.
    pub fn load(&self, name: &str, revision: &str) -> Result<LoadedModule, ModuleLoadError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ModuleLoadError::NotFound(name.to_string()))?;
        let mut module = factory();
        let manifest = module.manifest();

        let missing = HookSet::REQUIRED.difference(manifest.hooks);
        if !missing.is_empty() {
            return Err(ModuleLoadError::WrongApi {
                missing: missing.names(),
            });
        }
        if manifest.revision != revision {
            return Err(ModuleLoadError::Outdated {
                expected: revision.to_string(),
                found: manifest.revision,
            });
        }

        module.init();
        Ok(LoadedModule {
            hooks: manifest.hooks,
            name: manifest.name,
            module,
        })
    }
}

/// A negotiated module and the hooks it may be called for.
pub struct LoadedModule {
    name: String,
    hooks: HookSet,
    module: Box<dyn ScriptModule>,
}

impl LoadedModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hooks(&self) -> HookSet {
        self.hooks
    }
}

/// The hook table the engine and event sources call into.
#[derive(Default)]
pub struct ScriptHooks {
    module: Option<LoadedModule>,
    host: Option<Box<dyn EmbeddedHost>>,
}

fn is_creature(guid: ObjectGuid) -> bool {
    guid.type_id() == TypeId::Unit
}

impl ScriptHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: Box<dyn EmbeddedHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Replaces the current module with `name`. On failure no module is bound
    /// and every module hook answers with its default.
    pub fn load_module(
        &mut self,
        registry: &ModuleRegistry,
        name: &str,
        revision: &str,
    ) -> Result<(), ModuleLoadError> {
        if let Some(previous) = self.module.take() {
            info!(target: "script_modules", "Unloaded script module {}", escape_log(previous.name()));
        }
        match registry.load(name, revision) {
            Ok(loaded) => {
                info!(
                    target: "script_modules",
                    "Loaded script module {} with hooks [{}]",
                    escape_log(loaded.name()),
                    loaded.hooks().names().join(", ")
                );
                self.module = Some(loaded);
                Ok(())
            }
            Err(err) => {
                warn!(target: "script_modules", "Script module {} not loaded: {}", escape_log(name), err);
                Err(err)
            }
        }
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module.as_ref().map(LoadedModule::name)
    }

    fn module_with(&self, hook: HookSet) -> Option<&dyn ScriptModule> {
        self.module
            .as_ref()
            .filter(|loaded| loaded.hooks.contains(hook))
            .map(|loaded| loaded.module.as_ref())
    }

    fn host(&self) -> Option<&dyn EmbeddedHost> {
        self.host.as_deref()
    }

    pub fn on_gossip_hello(&self, region: &mut Region, player: ObjectGuid, speaker: ObjectGuid) -> bool {
        if self.host().map(|h| h.on_gossip_hello(region, player, speaker)).unwrap_or(false) {
            return true;
        }
        let hook = if is_creature(speaker) {
            HookSet::GOSSIP_HELLO
        } else {
            HookSet::GO_GOSSIP_HELLO
        };
        self.module_with(hook)
            .map(|m| m.on_gossip_hello(region, player, speaker))
            .unwrap_or(false)
    }

    pub fn on_gossip_select(
        &self,
        region: &mut Region,
        player: ObjectGuid,
        speaker: ObjectGuid,
        sender: u32,
        action: u32,
        code: Option<&str>,
    ) -> bool {
        if self
            .host()
            .map(|h| h.on_gossip_select(region, player, speaker, sender, action, code))
            .unwrap_or(false)
        {
            return true;
        }
        let hook = match (is_creature(speaker), code.is_some()) {
            (true, false) => HookSet::GOSSIP_SELECT,
            (true, true) => HookSet::GOSSIP_SELECT_WITH_CODE,
            (false, false) => HookSet::GO_GOSSIP_SELECT,
            (false, true) => HookSet::GO_GOSSIP_SELECT_WITH_CODE,
        };
        self.module_with(hook)
            .map(|m| m.on_gossip_select(region, player, speaker, sender, action, code))
            .unwrap_or(false)
    }

    pub fn on_quest_accept(&self, region: &mut Region, player: ObjectGuid, giver: ObjectGuid, quest_id: u32) -> bool {
        if self
            .host()
            .map(|h| h.on_quest_accept(region, player, giver, quest_id))
            .unwrap_or(false)
        {
            return true;
        }
        let hook = match giver.type_id() {
            TypeId::Unit => HookSet::QUEST_ACCEPT,
            TypeId::Item => HookSet::ITEM_QUEST_ACCEPT,
            _ => HookSet::GO_QUEST_ACCEPT,
        };
        self.module_with(hook)
            .map(|m| m.on_quest_accept(region, player, giver, quest_id))
            .unwrap_or(false)
    }

    pub fn on_quest_rewarded(&self, region: &mut Region, player: ObjectGuid, giver: ObjectGuid, quest_id: u32) -> bool {
        if self
            .host()
            .map(|h| h.on_quest_rewarded(region, player, giver, quest_id))
            .unwrap_or(false)
        {
            return true;
        }
        let hook = if is_creature(giver) {
            HookSet::QUEST_REWARDED
        } else {
            HookSet::GO_QUEST_REWARDED
        };
        self.module_with(hook)
            .map(|m| m.on_quest_rewarded(region, player, giver, quest_id))
            .unwrap_or(false)
    }

    pub fn dialog_status(&self, region: &Region, player: ObjectGuid, giver: ObjectGuid) -> u32 {
        let from_host = self.host().map(|h| h.dialog_status(region, player, giver)).unwrap_or(0);
        if from_host != 0 {
            return from_host;
        }
        let hook = if is_creature(giver) {
            HookSet::NPC_DIALOG_STATUS
        } else {
            HookSet::GO_DIALOG_STATUS
        };
        self.module_with(hook)
            .map(|m| m.dialog_status(region, player, giver))
            .unwrap_or(DIALOG_STATUS_UNDEFINED)
    }

    pub fn on_go_use(&self, region: &mut Region, player: ObjectGuid, object: ObjectGuid) -> bool {
        self.module_with(HookSet::GO_USE)
            .map(|m| m.on_go_use(region, player, object))
            .unwrap_or(false)
    }

    pub fn on_item_use(&self, region: &mut Region, player: ObjectGuid, item: ObjectGuid) -> bool {
        if self.host().map(|h| h.on_item_use(region, player, item)).unwrap_or(false) {
            return true;
        }
        self.module_with(HookSet::ITEM_USE)
            .map(|m| m.on_item_use(region, player, item))
            .unwrap_or(false)
    }

    pub fn on_area_trigger(&self, region: &mut Region, player: ObjectGuid, trigger_id: u32) -> bool {
        if self
            .host()
            .map(|h| h.on_area_trigger(region, player, trigger_id))
            .unwrap_or(false)
        {
            return true;
        }
        self.module_with(HookSet::AREA_TRIGGER)
            .map(|m| m.on_area_trigger(region, player, trigger_id))
            .unwrap_or(false)
    }

    pub fn on_process_event(
        &self,
        region: &mut Region,
        event_id: u32,
        source: ObjectGuid,
        target: Option<ObjectGuid>,
        is_start: bool,
    ) -> bool {
        self.module_with(HookSet::PROCESS_EVENT)
            .map(|m| m.on_process_event(region, event_id, source, target, is_start))
            .unwrap_or(false)
    }

    pub fn on_effect_dummy(
        &self,
        region: &mut Region,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: usize,
        target: ObjectGuid,
        original_caster: Option<ObjectGuid>,
    ) -> bool {
        if self
            .host()
            .map(|h| h.on_effect_dummy(region, caster, spell_id, effect_index, target))
            .unwrap_or(false)
        {
            return true;
        }
        let hook = match target.type_id() {
            TypeId::Unit => HookSet::EFFECT_DUMMY_CREATURE,
            TypeId::Item => HookSet::EFFECT_DUMMY_ITEM,
            _ => HookSet::EFFECT_DUMMY_GO,
        };
        self.module_with(hook)
            .map(|m| m.on_effect_dummy(region, caster, spell_id, effect_index, target, original_caster))
            .unwrap_or(false)
    }

    pub fn on_effect_script_effect(
        &self,
        region: &mut Region,
        caster: ObjectGuid,
        spell_id: u32,
        effect_index: usize,
        target: ObjectGuid,
        original_caster: Option<ObjectGuid>,
    ) -> bool {
        self.module_with(HookSet::EFFECT_SCRIPT_EFFECT_CREATURE)
            .map(|m| m.on_effect_script_effect(region, caster, spell_id, effect_index, target, original_caster))
            .unwrap_or(false)
    }

    pub fn on_aura_dummy(&self, region: &mut Region, holder: ObjectGuid, spell_id: u32, apply: bool) -> bool {
        self.module_with(HookSet::AURA_DUMMY)
            .map(|m| m.on_aura_dummy(region, holder, spell_id, apply))
            .unwrap_or(false)
    }
}
