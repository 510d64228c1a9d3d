//! Binary entrypoint for the dbscripts CLI.
//!
//! Commands:
//! - `init` - create a starter `dbscripts.toml` and an empty script store
//! - `import <seed.json> [--replace]` - write a JSON seed into the store
//! - `validate [--seed <path>] [--deny-rejections]` - load every table against the catalog and report findings
//! - `status` - print the tables and bindings held by the store
//!
//! See the library crate docs for module-level details: `dbscripts::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use dbscripts::config::Config;
use dbscripts::dbscript::loader::RowSource;
use dbscripts::dbscript::registry::{RegistryReport, ScriptRegistry};
use dbscripts::dbscript::seed_loader::{import_seed, load_seed_from_json};
use dbscripts::dbscript::storage::{ScriptStore, AREA_TRIGGER_BINDINGS, EVENT_ID_BINDINGS};
use dbscripts::world::CatalogData;

#[derive(Parser)]
#[command(name = "dbscripts")]
#[command(about = "Load, validate and inspect data-driven world scripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "dbscripts.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the script store
    Init,
    /// Import a JSON seed file into the script store
    Import {
        /// Seed file path
        seed: String,
        /// Clear every table named in the seed before writing its rows
        #[arg(long)]
        replace: bool,
    },
    /// Load all script tables against the game catalog and report what would be dropped
    Validate {
        /// Validate this seed file instead of the store contents
        #[arg(long)]
        seed: Option<String>,
        /// Exit with an error when any row is rejected
        #[arg(long)]
        deny_rejections: bool,
    },
    /// Show what the script store holds
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new dbscripts configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let cfg = Config::load(&cli.config).await?;
            tokio::fs::create_dir_all(&cfg.storage.data_dir).await?;
            let db_path = cfg.storage.db_path();
            ScriptStore::open(&db_path)?;
            info!("Script store ready at {}", db_path.display());
            println!("Created {} and {}", cli.config, db_path.display());
        }
        Commands::Import { seed, replace } => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let store = ScriptStore::open(config.storage.db_path())?;
            let seed_data = load_seed_from_json(&seed)?;
            let summary = import_seed(&store, &seed_data, replace)?;
            println!(
                "Imported {} rows into {} tables ({} trigger bindings, {} name lists)",
                summary.rows, summary.tables, summary.bindings, summary.name_lists
            );
        }
        Commands::Validate {
            seed,
            deny_rejections,
        } => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let options = config.scripts.to_registry_options()?;
            let catalog = match &config.scripts.catalog_path {
                Some(path) => CatalogData::load_json(path)?,
                None => {
                    warn!("No scripts.catalog_path configured; validating against an empty catalog");
                    CatalogData::new()
                }
            };

            let (registry, report) = match seed {
                Some(path) => {
                    let source = load_seed_from_json(&path)?.into_row_source();
                    ScriptRegistry::build(&source, &catalog, &options)?
                }
                None => {
                    let store = ScriptStore::open(config.storage.db_path())?;
                    ScriptRegistry::build(&store, &catalog, &options)?
                }
            };
            print_report(&registry, &report);

            if deny_rejections && report.rejected_rows() > 0 {
                return Err(anyhow!("{} script rows were rejected", report.rejected_rows()));
            }
        }
        Commands::Status => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            show_status(&config)?;
        }
    }

    Ok(())
}

fn print_report(registry: &ScriptRegistry, report: &RegistryReport) {
    println!("Script tables:");
    for table in &report.tables {
        println!(
            "  {:<40} {:>6} loaded {:>5} rejected {:>5} unknown ids",
            table.table,
            table.loaded,
            table.rejected.len(),
            table.unknown_ids.len()
        );
        for rejected in &table.rejected {
            println!("      id {} command {}: {}", rejected.id, rejected.command, rejected.reason);
        }
    }

    let corrections = report.quest_corrections();
    if !corrections.is_empty() {
        println!("Quests needing the exploration/event flag: {:?}", corrections);
    }
    for (table, id, text) in &report.texts.missing {
        println!("Missing text {} referenced by {} id {}", text, table, id);
    }
    if !report.texts.unused.is_empty() {
        println!("Unused script texts: {}", report.texts.unused.len());
    }
    println!(
        "Total: {} rows loaded, {} rejected, {} script names",
        report.loaded_rows(),
        report.rejected_rows(),
        registry.script_ids_count()
    );
}

fn show_status(config: &Config) -> Result<()> {
    let db_path = config.storage.db_path();
    let store = ScriptStore::open(&db_path)?;
    println!("dbscripts v{}", env!("CARGO_PKG_VERSION"));
    println!("Store: {}", db_path.display());

    let tables = store.table_names()?;
    if tables.is_empty() {
        println!("No script rows stored.");
    }
    for table in tables {
        println!("  {:<40} {:>6} rows", table, store.row_count(&table));
    }
    println!(
        "Bindings: {} {}, {} {}",
        store.bindings(AREA_TRIGGER_BINDINGS)?.len(),
        AREA_TRIGGER_BINDINGS,
        store.bindings(EVENT_ID_BINDINGS)?.len(),
        EVENT_ID_BINDINGS
    );
    println!("Module script names: {}", store.script_names()?.len());
    if let Some(module) = &config.modules.library {
        println!("Configured module: {} (revision {})", module, config.modules.revision);
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        let is_tty = atty::is(atty::Stream::Stdout);

        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}: {}", ts, record.level(), record.target(), record.args());

            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }

            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
