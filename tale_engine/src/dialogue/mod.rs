//! Dialogue trees, the engine that walks them, and the events it publishes.

pub mod engine;
pub mod events;
pub mod tree;

pub use engine::{ActiveNode, DialogueEngine, DialogueState, visible_choices};
pub use events::{DialogueEvent, EventBus, ListenerId};
pub use tree::DialogueTree;
