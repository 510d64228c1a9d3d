//! # dbscripts - data-driven world scripting
//!
//! Designers describe world behavior as rows in script tables: "2 seconds after
//! this quest is accepted, make the nearest guard say text 2000000123 and walk
//! to (x, y, z)". This crate loads those rows, rejects the ones that cannot
//! work, and runs them against a live region of the game world.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dbscripts::dbscript::{ExecutionPolicy, MemoryRowSource, RegistryHandle, RegistryOptions, ScriptEngine, ScriptRegistry, ScriptTableKind};
//! use dbscripts::world::{CatalogData, Region};
//!
//! fn main() -> anyhow::Result<()> {
//!     let catalog = Arc::new(CatalogData::load_json("data/catalog.json")?);
//!     let source = MemoryRowSource::new();
//!     let (registry, _report) = ScriptRegistry::build(&source, &*catalog, &RegistryOptions::default())?;
//!
//!     let engine = ScriptEngine::new(RegistryHandle::new(registry), catalog);
//!     let mut region = Region::new(0);
//!     engine.scripts_start(&mut region, ScriptTableKind::Event, 5001, None, None, ExecutionPolicy::Normal);
//!     engine.update(&mut region, 1000);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`dbscript`] - script rows, loader, registry, resolver, dispatcher and engine
//! - [`world`] - the catalog, live objects and regions scripts act on
//! - [`config`] - TOML configuration for the `dbscripts` binary
//! - [`logutil`] - one-line rendering of designer strings in logs

pub mod config;
pub mod dbscript;
pub mod logutil;
pub mod world;
