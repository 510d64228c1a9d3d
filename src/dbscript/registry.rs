//! The set of loaded script tables and auxiliary maps, plus the shared handle
//! through which the engine reads a consistent snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use log::info;

use crate::dbscript::errors::ScriptError;
use crate::dbscript::loader::{LoadReport, LoaderOptions, RowSource, ScriptLoader, TextReport};
use crate::dbscript::names::ScriptNames;
use crate::dbscript::table::{ScriptTable, ScriptTableKind};
use crate::world::catalog::GameCatalog;

/// Loader settings plus per-family table name overrides.
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    pub loader: LoaderOptions,
    pub table_names: BTreeMap<ScriptTableKind, String>,
}

impl RegistryOptions {
    pub fn table_name(&self, kind: ScriptTableKind) -> &str {
        self.table_names
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_table_name())
    }
}

/// Everything a full build found worth reporting.
#[derive(Debug, Clone, Default)]
pub struct RegistryReport {
    pub tables: Vec<LoadReport>,
    pub texts: TextReport,
}

impl RegistryReport {
    pub fn rejected_rows(&self) -> usize {
        self.tables.iter().map(|report| report.rejected.len()).sum()
    }

    pub fn loaded_rows(&self) -> usize {
        self.tables.iter().map(|report| report.loaded).sum()
    }

    /// Quest ids the owner of the catalog should flag as exploration/event quests.
    pub fn quest_corrections(&self) -> BTreeSet<u32> {
        self.tables
            .iter()
            .flat_map(|report| report.quest_corrections.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptRegistry {
    tables: BTreeMap<ScriptTableKind, ScriptTable>,
    area_trigger_scripts: BTreeMap<u32, u32>,
    event_id_scripts: BTreeMap<u32, u32>,
    names: ScriptNames,
}

impl ScriptRegistry {
    /// Loads every table family and the auxiliary maps from `source`.
    pub fn build(
        source: &dyn RowSource,
        catalog: &dyn GameCatalog,
        options: &RegistryOptions,
    ) -> Result<(Self, RegistryReport), ScriptError> {
        let loader = ScriptLoader::with_options(catalog, options.loader.clone());
        let mut registry = ScriptRegistry::default();
        let mut report = RegistryReport::default();

        for kind in ScriptTableKind::ALL {
            let (table, table_report) = loader.load_table(source, kind, options.table_name(kind))?;
            registry.tables.insert(kind, table);
            report.tables.push(table_report);
        }
        report.texts = loader.check_script_texts(registry.tables.values());

        let area_triggers = source.area_trigger_scripts()?;
        let event_ids = source.event_id_scripts()?;
        let mut all_names = catalog.owned_script_names();
        all_names.extend(source.script_names()?);
        all_names.extend(area_triggers.iter().map(|row| row.script_name.clone()));
        all_names.extend(event_ids.iter().map(|row| row.script_name.clone()));
        registry.names = ScriptNames::from_names(all_names);
        info!(
            target: "db_scripts",
            ">> Loaded {} script names",
            registry.names.script_ids_count()
        );

        registry.area_trigger_scripts = loader.load_area_trigger_scripts(source, &registry.names)?;
        registry.event_id_scripts = loader.load_event_id_scripts(source, &registry.names)?;
        Ok((registry, report))
    }

    /// Copy of this registry with one table replaced.
    pub fn with_table(&self, table: ScriptTable) -> Self {
        let mut next = self.clone();
        next.tables.insert(table.kind(), table);
        next
    }

    pub fn table(&self, kind: ScriptTableKind) -> Option<&ScriptTable> {
        self.tables.get(&kind)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ScriptTable> + '_ {
        self.tables.values()
    }

    pub fn area_trigger_script_id(&self, trigger_id: u32) -> u32 {
        self.area_trigger_scripts.get(&trigger_id).copied().unwrap_or(0)
    }

    pub fn event_id_script_id(&self, event_id: u32) -> u32 {
        self.event_id_scripts.get(&event_id).copied().unwrap_or(0)
    }

    pub fn names(&self) -> &ScriptNames {
        &self.names
    }

    pub fn script_id(&self, name: &str) -> u32 {
        self.names.script_id(name)
    }

    pub fn script_name(&self, id: u32) -> Option<&str> {
        self.names.script_name(id)
    }

    pub fn script_ids_count(&self) -> u32 {
        self.names.script_ids_count()
    }
}

/// Shared, swappable reference to the current registry.
///
/// Readers take an `Arc` snapshot and keep using it even if a reload swaps in
/// a new registry meanwhile.
#[derive(Debug, Clone, Default)]
pub struct RegistryHandle {
    current: Arc<RwLock<Arc<ScriptRegistry>>>,
}

impl RegistryHandle {
    pub fn new(registry: ScriptRegistry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    pub fn snapshot(&self) -> Arc<ScriptRegistry> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Installs `registry`, returning the one it replaced.
    pub fn swap(&self, registry: ScriptRegistry) -> Arc<ScriptRegistry> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(registry))
    }

    /// Reloads one family and swaps in a registry that differs only in that table.
    ///
    /// The missing/unused script text check is not re-run; its results reflect
    /// the last full [`ScriptRegistry::build`].
    pub fn reload_table(
        &self,
        source: &dyn RowSource,
        catalog: &dyn GameCatalog,
        options: &RegistryOptions,
        kind: ScriptTableKind,
    ) -> Result<LoadReport, ScriptError> {
        let loader = ScriptLoader::with_options(catalog, options.loader.clone());
        let (table, report) = loader.load_table(source, kind, options.table_name(kind))?;
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = guard.with_table(table);
        *guard = Arc::new(next);
        Ok(report)
    }
}
