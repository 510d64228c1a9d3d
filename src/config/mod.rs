//! # Configuration
//!
//! Settings for the `dbscripts` binary, read from a TOML file:
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "dbscripts.log"
//!
//! [scripts]
//! strict_checks = true
//! min_text_id = 2000000000
//! max_text_id = 2000010000
//! catalog_path = "./data/catalog.json"
//!
//! [scripts.tables]
//! dbscripts_on_event = "custom_event_scripts"
//!
//! [modules]
//! library = "scriptdev"
//! revision = "2024-10"
//! ```
//!
//! `[scripts.tables]` maps a family's default table name to the table actually
//! read for it.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;

use crate::dbscript::loader::{LoaderOptions, MAX_DB_SCRIPT_STRING_ID, MIN_DB_SCRIPT_STRING_ID};
use crate::dbscript::registry::RegistryOptions;
use crate::dbscript::table::ScriptTableKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub modules: ModulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Sled directory; defaults to `<data_dir>/scripts.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("scripts.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Also reject taxi rows whose path a spell can already start.
    #[serde(default = "default_strict_checks")]
    pub strict_checks: bool,
    #[serde(default = "default_min_text_id")]
    pub min_text_id: i32,
    #[serde(default = "default_max_text_id")]
    pub max_text_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
}

fn default_strict_checks() -> bool {
    true
}

fn default_min_text_id() -> i32 {
    MIN_DB_SCRIPT_STRING_ID
}

fn default_max_text_id() -> i32 {
    MAX_DB_SCRIPT_STRING_ID
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            strict_checks: default_strict_checks(),
            min_text_id: default_min_text_id(),
            max_text_id: default_max_text_id(),
            catalog_path: None,
            tables: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModulesConfig {
    /// Supplementary script module to load, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    /// Core revision the module must report.
    #[serde(default)]
    pub revision: String,
}

impl ScriptsConfig {
    /// Loader settings and table overrides, rejecting overrides for unknown families.
    pub fn to_registry_options(&self) -> Result<RegistryOptions> {
        if self.min_text_id >= self.max_text_id {
            return Err(anyhow!(
                "scripts.min_text_id ({}) must be below scripts.max_text_id ({})",
                self.min_text_id,
                self.max_text_id
            ));
        }

        let mut table_names = BTreeMap::new();
        for (family, table) in &self.tables {
            let kind = ScriptTableKind::from_table_name(family)
                .ok_or_else(|| anyhow!("Unknown script table family in [scripts.tables]: {}", family))?;
            table_names.insert(kind, table.clone());
        }

        Ok(RegistryOptions {
            loader: LoaderOptions {
                strict_checks: self.strict_checks,
                text_id_range: self.min_text_id..self.max_text_id,
            },
            table_names,
        })
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                db_path: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("dbscripts.log".to_string()),
            },
            scripts: ScriptsConfig {
                catalog_path: Some("./data/catalog.json".to_string()),
                ..ScriptsConfig::default()
            },
            modules: ModulesConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_script_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            data_dir = "/var/lib/dbscripts"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert!(config.scripts.strict_checks);
        assert_eq!(config.scripts.min_text_id, 2_000_000_000);
        assert_eq!(config.scripts.max_text_id, 2_000_010_000);
        assert_eq!(
            config.storage.db_path(),
            PathBuf::from("/var/lib/dbscripts").join("scripts.db")
        );
        assert!(config.modules.library.is_none());
    }

    #[test]
    fn table_overrides_map_to_families() {
        let mut scripts = ScriptsConfig::default();
        scripts
            .tables
            .insert("dbscripts_on_event".to_string(), "custom_event_scripts".to_string());
        let options = scripts.to_registry_options().unwrap();
        assert_eq!(options.table_name(ScriptTableKind::Event), "custom_event_scripts");
        assert_eq!(
            options.table_name(ScriptTableKind::QuestEnd),
            ScriptTableKind::QuestEnd.default_table_name()
        );

        scripts.tables.insert("dbscripts_on_nothing".to_string(), "x".to_string());
        assert!(scripts.to_registry_options().is_err());
    }

    #[test]
    fn inverted_text_range_is_rejected() {
        let scripts = ScriptsConfig {
            min_text_id: 10,
            max_text_id: 5,
            ..ScriptsConfig::default()
        };
        assert!(scripts.to_registry_options().is_err());
    }

    #[tokio::test]
    async fn default_file_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dbscripts.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.scripts.catalog_path.as_deref(), Some("./data/catalog.json"));
    }
}
