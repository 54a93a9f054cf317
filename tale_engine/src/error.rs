//! Error types for the dialogue engine.

use thiserror::Error;

/// Result type for dialogue operations.
pub type DialogueResult<T> = Result<T, DialogueError>;

/// Ways a dialogue call can be refused. The engine state is never changed by
/// a call that returns one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogueError {
    /// No dialogue is running.
    #[error("no dialogue is active")]
    NotActive,

    /// The tree has no entry node.
    #[error("dialogue tree '{tree}' has no start node")]
    MissingStartNode { tree: String },

    /// A node id did not resolve within the tree.
    #[error("dialogue tree '{tree}' has no node '{node}'")]
    NodeNotFound { tree: String, node: String },

    /// Choice index outside the visible choice list.
    #[error("invalid choice {index} ({visible} visible)")]
    InvalidChoice { index: usize, visible: usize },

    /// Auto-advance requested while the player still has a decision to make.
    #[error("cannot auto-advance past {visible} visible choice(s)")]
    ChoicesPending { visible: usize },

    /// Two nodes share an id (compared case-insensitively).
    #[error("dialogue tree '{tree}' defines node '{node}' more than once")]
    DuplicateNode { tree: String, node: String },

    /// A node with a blank id.
    #[error("dialogue tree '{tree}' contains a node with a blank id")]
    BlankNodeId { tree: String },
}
