#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const TALE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod command;
pub mod condition;
pub mod config;
pub mod data_paths;
pub mod dialogue;
pub mod error;
pub mod inventory;
pub mod loader;
pub mod scheduler;
pub mod snapshot;
pub mod store;

// Re-exports for convenience
pub use condition::{Condition, evaluate};
pub use config::{DialogueSettings, EngineConfig, load_config};
pub use dialogue::{DialogueEngine, DialogueEvent, DialogueState, DialogueTree};
pub use error::{DialogueError, DialogueResult};
pub use inventory::{Inventory, PlayerInventory};
pub use loader::load_tree;
pub use snapshot::SessionSnapshot;
pub use store::{StoreChange, StoreDefaults, VariableStore};
