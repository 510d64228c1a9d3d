use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sled::IVec;

use crate::dbscript::command::{ScriptRow, SCRIPT_ROW_SCHEMA_VERSION};
use crate::dbscript::errors::ScriptError;
use crate::dbscript::loader::{NamedScript, RowSource};

const TREE_ROWS: &str = "script_rows";
const TREE_BINDINGS: &str = "script_bindings";
const TREE_NAMES: &str = "script_names";

pub const BINDING_SCHEMA_VERSION: u8 = 1;
pub const NAME_LIST_SCHEMA_VERSION: u8 = 1;

pub const AREA_TRIGGER_BINDINGS: &str = "scripted_areatrigger";
pub const EVENT_ID_BINDINGS: &str = "scripted_event_id";

/// A trigger id bound to a module script, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BindingRecord {
    schema_version: u8,
    id: u32,
    script_name: String,
}

/// Script names owned by one template catalog (creatures, items, instances...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NameListRecord {
    schema_version: u8,
    owner: String,
    names: Vec<String>,
}

/// Sled-backed persistence for script rows and module bindings.
pub struct ScriptStore {
    db: sled::Db,
    rows: sled::Tree,
    bindings: sled::Tree,
    names: sled::Tree,
}

impl ScriptStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        let rows = db.open_tree(TREE_ROWS)?;
        let bindings = db.open_tree(TREE_BINDINGS)?;
        let names = db.open_tree(TREE_NAMES)?;
        Ok(Self {
            db,
            rows,
            bindings,
            names,
        })
    }

    fn table_prefix(table: &str) -> Vec<u8> {
        format!("rows:{}:", table).into_bytes()
    }

    fn binding_key(kind: &str, id: u32) -> Vec<u8> {
        format!("{}:{:010}", kind, id).into_bytes()
    }

    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, ScriptError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, ScriptError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Appends rows to `table`, keeping their order behind any rows already stored.
    pub fn append_rows(&self, table: &str, rows: &[ScriptRow]) -> Result<usize, ScriptError> {
        for row in rows {
            let mut row = row.clone();
            row.schema_version = SCRIPT_ROW_SCHEMA_VERSION;
            let sequence = self.db.generate_id()?;
            let key = format!("rows:{}:{:020}", table, sequence).into_bytes();
            self.rows.insert(key, Self::serialize(&row)?)?;
        }
        self.rows.flush()?;
        Ok(rows.len())
    }

    /// Replaces the whole content of `table`.
    pub fn replace_rows(&self, table: &str, rows: &[ScriptRow]) -> Result<usize, ScriptError> {
        self.clear_table(table)?;
        self.append_rows(table, rows)
    }

    pub fn clear_table(&self, table: &str) -> Result<usize, ScriptError> {
        let keys: Result<Vec<_>, _> = self
            .rows
            .scan_prefix(Self::table_prefix(table))
            .map(|entry| entry.map(|(key, _)| key))
            .collect();
        let keys = keys?;
        for key in &keys {
            self.rows.remove(key)?;
        }
        self.rows.flush()?;
        Ok(keys.len())
    }

    /// Rows of `table` in insertion order.
    pub fn rows(&self, table: &str) -> Result<Vec<ScriptRow>, ScriptError> {
        let mut rows = Vec::new();
        for entry in self.rows.scan_prefix(Self::table_prefix(table)) {
            let (_, bytes) = entry?;
            let row: ScriptRow = Self::deserialize(bytes)?;
            if row.schema_version != SCRIPT_ROW_SCHEMA_VERSION {
                return Err(ScriptError::SchemaMismatch {
                    entity: "script row",
                    expected: SCRIPT_ROW_SCHEMA_VERSION,
                    found: row.schema_version,
                });
            }
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.rows.scan_prefix(Self::table_prefix(table)).count()
    }

    /// Names of every table holding at least one row.
    pub fn table_names(&self) -> Result<BTreeSet<String>, ScriptError> {
        let mut tables = BTreeSet::new();
        for entry in self.rows.scan_prefix(b"rows:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some((table, _)) = text.trim_start_matches("rows:").rsplit_once(':') {
                tables.insert(table.to_string());
            }
        }
        Ok(tables)
    }

    /// Binds a trigger id to a module script in the `kind` map
    /// ([`AREA_TRIGGER_BINDINGS`] or [`EVENT_ID_BINDINGS`]).
    pub fn put_binding(&self, kind: &str, id: u32, script_name: &str) -> Result<(), ScriptError> {
        let record = BindingRecord {
            schema_version: BINDING_SCHEMA_VERSION,
            id,
            script_name: script_name.to_string(),
        };
        self.bindings.insert(Self::binding_key(kind, id), Self::serialize(&record)?)?;
        self.bindings.flush()?;
        Ok(())
    }

    pub fn bindings(&self, kind: &str) -> Result<Vec<NamedScript>, ScriptError> {
        let prefix = format!("{}:", kind);
        let mut out = Vec::new();
        for entry in self.bindings.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = entry?;
            let record: BindingRecord = Self::deserialize(bytes)?;
            if record.schema_version != BINDING_SCHEMA_VERSION {
                return Err(ScriptError::SchemaMismatch {
                    entity: "script binding",
                    expected: BINDING_SCHEMA_VERSION,
                    found: record.schema_version,
                });
            }
            out.push(NamedScript {
                id: record.id,
                script_name: record.script_name,
            });
        }
        Ok(out)
    }

    /// Stores the script names `owner` references, replacing its previous list.
    pub fn put_script_names(&self, owner: &str, names: &[String]) -> Result<(), ScriptError> {
        let record = NameListRecord {
            schema_version: NAME_LIST_SCHEMA_VERSION,
            owner: owner.to_string(),
            names: names.to_vec(),
        };
        let key = format!("names:{}", owner).into_bytes();
        self.names.insert(key, Self::serialize(&record)?)?;
        self.names.flush()?;
        Ok(())
    }

    pub fn script_names_of(&self, owner: &str) -> Result<Vec<String>, ScriptError> {
        let key = format!("names:{}", owner).into_bytes();
        let Some(bytes) = self.names.get(&key)? else {
            return Err(ScriptError::NotFound(format!("script names: {}", owner)));
        };
        let record: NameListRecord = Self::deserialize(bytes)?;
        Ok(record.names)
    }

    fn all_script_names(&self) -> Result<Vec<String>, ScriptError> {
        let mut all = Vec::new();
        for entry in self.names.scan_prefix(b"names:") {
            let (_, bytes) = entry?;
            let record: NameListRecord = Self::deserialize(bytes)?;
            if record.schema_version != NAME_LIST_SCHEMA_VERSION {
                return Err(ScriptError::SchemaMismatch {
                    entity: "script name list",
                    expected: NAME_LIST_SCHEMA_VERSION,
                    found: record.schema_version,
                });
            }
            all.extend(record.names);
        }
        Ok(all)
    }
}

impl RowSource for ScriptStore {
    fn script_rows(&self, table: &str) -> Result<Vec<ScriptRow>, ScriptError> {
        self.rows(table)
    }

    fn area_trigger_scripts(&self) -> Result<Vec<NamedScript>, ScriptError> {
        self.bindings(AREA_TRIGGER_BINDINGS)
    }

    fn event_id_scripts(&self) -> Result<Vec<NamedScript>, ScriptError> {
        self.bindings(EVENT_ID_BINDINGS)
    }

    fn script_names(&self) -> Result<Vec<String>, ScriptError> {
        self.all_script_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbscript::command::CommandKind;
    use tempfile::TempDir;

    #[test]
    fn rows_keep_insertion_order_per_table() {
        let dir = TempDir::new().unwrap();
        let store = ScriptStore::open(dir.path()).unwrap();
        let rows = vec![
            ScriptRow::new(7, 5, CommandKind::Emote as u32).with_data(1, 0),
            ScriptRow::new(7, 0, CommandKind::Emote as u32).with_data(2, 0),
        ];
        store.append_rows("dbscripts_on_event", &rows).unwrap();
        store
            .append_rows("dbscripts_on_quest_end", &[ScriptRow::new(1, 0, 0)])
            .unwrap();

        assert_eq!(store.rows("dbscripts_on_event").unwrap(), rows);
        assert_eq!(store.row_count("dbscripts_on_quest_end"), 1);
        let tables: Vec<String> = store.table_names().unwrap().into_iter().collect();
        assert_eq!(tables, vec!["dbscripts_on_event", "dbscripts_on_quest_end"]);

        store.replace_rows("dbscripts_on_event", &rows[..1]).unwrap();
        assert_eq!(store.rows("dbscripts_on_event").unwrap().len(), 1);
    }

    #[test]
    fn bindings_and_names_round_out_the_row_source() {
        let dir = TempDir::new().unwrap();
        let store = ScriptStore::open(dir.path()).unwrap();
        store.put_binding(AREA_TRIGGER_BINDINGS, 700, "at_goldshire").unwrap();
        store.put_binding(EVENT_ID_BINDINGS, 5001, "event_signal_fire").unwrap();
        store
            .put_script_names("creature_template", &["npc_marshal".to_string()])
            .unwrap();

        let source: &dyn RowSource = &store;
        assert_eq!(source.area_trigger_scripts().unwrap()[0].script_name, "at_goldshire");
        assert_eq!(source.event_id_scripts().unwrap()[0].id, 5001);
        assert_eq!(source.script_names().unwrap(), vec!["npc_marshal".to_string()]);
        assert!(matches!(store.script_names_of("item_template"), Err(ScriptError::NotFound(_))));
    }
}
