//! Script tables: id-keyed command sequences loaded from one named source.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dbscript::command::ScriptCommand;

/// The event families scripts are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptTableKind {
    QuestStart,
    QuestEnd,
    Spell,
    GameObjectUse,
    GameObjectTemplateUse,
    Event,
    Gossip,
    CreatureDeath,
    CreatureMovement,
}

impl ScriptTableKind {
    pub const ALL: [ScriptTableKind; 9] = [
        ScriptTableKind::QuestStart,
        ScriptTableKind::QuestEnd,
        ScriptTableKind::Spell,
        ScriptTableKind::GameObjectUse,
        ScriptTableKind::GameObjectTemplateUse,
        ScriptTableKind::Event,
        ScriptTableKind::Gossip,
        ScriptTableKind::CreatureDeath,
        ScriptTableKind::CreatureMovement,
    ];

    pub fn default_table_name(self) -> &'static str {
        match self {
            ScriptTableKind::QuestStart => "dbscripts_on_quest_start",
            ScriptTableKind::QuestEnd => "dbscripts_on_quest_end",
            ScriptTableKind::Spell => "dbscripts_on_spell",
            ScriptTableKind::GameObjectUse => "dbscripts_on_go_use",
            ScriptTableKind::GameObjectTemplateUse => "dbscripts_on_go_template_use",
            ScriptTableKind::Event => "dbscripts_on_event",
            ScriptTableKind::Gossip => "dbscripts_on_gossip",
            ScriptTableKind::CreatureDeath => "dbscripts_on_creature_death",
            ScriptTableKind::CreatureMovement => "dbscripts_on_creature_movement",
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.default_table_name() == name)
    }
}

impl fmt::Display for ScriptTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_table_name())
    }
}

/// Immutable once built; a reload builds a fresh table.
#[derive(Debug, Clone)]
pub struct ScriptTable {
    kind: ScriptTableKind,
    name: String,
    scripts: BTreeMap<u32, Arc<[ScriptCommand]>>,
}

impl ScriptTable {
    pub fn empty(kind: ScriptTableKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            scripts: BTreeMap::new(),
        }
    }

    /// Groups commands by id and orders each group by delay, keeping the input
    /// order among equal delays.
    pub fn from_commands<I>(kind: ScriptTableKind, name: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = ScriptCommand>,
    {
        let mut grouped: BTreeMap<u32, Vec<ScriptCommand>> = BTreeMap::new();
        for command in commands {
            grouped.entry(command.id).or_default().push(command);
        }
        let scripts = grouped
            .into_iter()
            .map(|(id, mut steps)| {
                steps.sort_by_key(|step| step.delay);
                (id, Arc::from(steps))
            })
            .collect();
        Self {
            kind,
            name: name.into(),
            scripts,
        }
    }

    pub fn kind(&self) -> ScriptTableKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, id: u32) -> Option<Arc<[ScriptCommand]>> {
        self.scripts.get(&id).cloned()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.scripts.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.scripts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[ScriptCommand])> + '_ {
        self.scripts.iter().map(|(id, steps)| (*id, steps.as_ref()))
    }

    /// Number of distinct script ids.
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn command_count(&self) -> usize {
        self.scripts.values().map(|steps| steps.len()).sum()
    }
}
