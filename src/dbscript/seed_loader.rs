//! Seed files for script content.
//!
//! A seed is one JSON document holding rows for any number of script tables
//! plus the trigger bindings and module name lists:
//!
//! ```json
//! {
//!   "tables": { "dbscripts_on_event": [ { "id": 5001, "command": 0, "dataint": 2000000001 } ] },
//!   "area_triggers": [ { "id": 700, "script_name": "at_goldshire" } ],
//!   "event_ids": [],
//!   "script_names": { "creature_template": ["npc_marshal_dughan"] }
//! }
//! ```
//!
//! Omitted row columns default to zero.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::dbscript::command::ScriptRow;
use crate::dbscript::errors::ScriptError;
use crate::dbscript::loader::{MemoryRowSource, NamedScript};
use crate::dbscript::storage::{ScriptStore, AREA_TRIGGER_BINDINGS, EVENT_ID_BINDINGS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSeed {
    pub tables: BTreeMap<String, Vec<ScriptRow>>,
    pub area_triggers: Vec<NamedScript>,
    pub event_ids: Vec<NamedScript>,
    /// Module script names keyed by the catalog that owns them.
    pub script_names: BTreeMap<String, Vec<String>>,
}

impl ScriptSeed {
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// The seed as an in-memory row source, without going through a store.
    pub fn into_row_source(self) -> MemoryRowSource {
        MemoryRowSource {
            tables: self.tables,
            area_triggers: self.area_triggers,
            event_ids: self.event_ids,
            names: self.script_names.into_values().flatten().collect(),
        }
    }
}

/// Counts of what an import wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub tables: usize,
    pub rows: usize,
    pub bindings: usize,
    pub name_lists: usize,
}

/// Load a seed document from `path`.
pub fn load_seed_from_json<P: AsRef<Path>>(path: P) -> Result<ScriptSeed, ScriptError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let seed: ScriptSeed = serde_json::from_str(&contents).map_err(|e| {
        ScriptError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to parse {}: {}", path.display(), e),
        ))
    })?;
    Ok(seed)
}

/// Write `seed` into `store`. With `replace`, every table named in the seed is
/// cleared first; otherwise its rows are appended.
pub fn import_seed(store: &ScriptStore, seed: &ScriptSeed, replace: bool) -> Result<ImportSummary, ScriptError> {
    let mut summary = ImportSummary::default();

    for (table, rows) in &seed.tables {
        summary.rows += if replace {
            store.replace_rows(table, rows)?
        } else {
            store.append_rows(table, rows)?
        };
        summary.tables += 1;
    }

    for binding in &seed.area_triggers {
        store.put_binding(AREA_TRIGGER_BINDINGS, binding.id, &binding.script_name)?;
        summary.bindings += 1;
    }
    for binding in &seed.event_ids {
        store.put_binding(EVENT_ID_BINDINGS, binding.id, &binding.script_name)?;
        summary.bindings += 1;
    }

    for (owner, names) in &seed.script_names {
        store.put_script_names(owner, names)?;
        summary.name_lists += 1;
    }

    info!(
        target: "db_scripts",
        "Imported {} rows into {} tables, {} trigger bindings, {} name lists",
        summary.rows,
        summary.tables,
        summary.bindings,
        summary.name_lists
    );
    Ok(summary)
}
