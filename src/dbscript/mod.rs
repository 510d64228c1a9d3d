//! Designer-authored script tables: loading and validation, the registry the
//! runtime reads from, target resolution, the command dispatcher and the
//! scheduling engine, plus supplementary module hooks.

pub mod command;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod hooks;
pub mod loader;
pub mod names;
pub mod registry;
pub mod resolver;
pub mod seed_loader;
pub mod storage;
pub mod table;

pub use command::{CommandKind, CommandPayload, ScriptCommand, ScriptFlags, ScriptRow};
pub use engine::{ExecutionPolicy, ScriptEngine, ScriptSchedule};
pub use errors::{LoadValidationError, ModuleLoadError, ScriptError, StepError};
pub use hooks::{ModuleRegistry, ScriptHooks, ScriptModule};
pub use loader::{LoaderOptions, MemoryRowSource, RowSource, ScriptLoader};
pub use registry::{RegistryHandle, RegistryOptions, ScriptRegistry};
pub use storage::ScriptStore;
pub use table::{ScriptTable, ScriptTableKind};
