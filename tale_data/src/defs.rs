use serde::{Deserialize, Serialize};

/// Stable identifier used for node references inside a tree.
pub type NodeId = String;

fn default_typing_speed() -> f32 {
    40.0
}

/// Top-level authored dialogue asset.
///
/// A tree is never mutated at runtime. Nodes refer to each other by id, and a
/// missing (`None`) reference on an edge means "end the dialogue here".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTreeDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_node: Option<NodeId>,
    /// Characters per second used by presentation layers.
    #[serde(default = "default_typing_speed")]
    pub typing_speed: f32,
    /// Presentation hint: pick a lone visible choice without waiting for input.
    #[serde(default)]
    pub auto_advance_single_choice: bool,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

impl DialogueTreeDef {
    /// Create an empty tree with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_node: None,
            typing_speed: default_typing_speed(),
            auto_advance_single_choice: false,
            nodes: Vec::new(),
        }
    }

    /// Set the entry node.
    pub fn with_start(mut self, node_id: impl Into<NodeId>) -> Self {
        self.start_node = Some(node_id.into());
        self
    }

    /// Append a node.
    pub fn with_node(mut self, node: NodeDef) -> Self {
        self.nodes.push(node);
        self
    }
}

/// One beat of dialogue plus its outgoing edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: NodeId,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub choices: Vec<ChoiceDef>,
    /// Followed by `advance` when the node has no visible choices.
    #[serde(default)]
    pub next_node_if_auto: Option<NodeId>,
    #[serde(default)]
    pub start_commands: Vec<String>,
    #[serde(default)]
    pub end_commands: Vec<String>,
    #[serde(default)]
    pub is_end_node: bool,
    /// Seconds to hold an end node on screen before closing it.
    #[serde(default)]
    pub display_duration: Option<f32>,
}

impl NodeDef {
    /// Create a node with the given id and text and no edges.
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            speaker: None,
            text: text.into(),
            choices: Vec::new(),
            next_node_if_auto: None,
            start_commands: Vec::new(),
            end_commands: Vec::new(),
            is_end_node: false,
            display_duration: None,
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn with_choice(mut self, choice: ChoiceDef) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_auto_next(mut self, node_id: impl Into<NodeId>) -> Self {
        self.next_node_if_auto = Some(node_id.into());
        self
    }

    pub fn with_start_command(mut self, command: impl Into<String>) -> Self {
        self.start_commands.push(command.into());
        self
    }

    pub fn with_end_command(mut self, command: impl Into<String>) -> Self {
        self.end_commands.push(command.into());
        self
    }

    /// Mark as an end node, optionally overriding how long it stays up.
    pub fn ending(mut self, display_duration: Option<f32>) -> Self {
        self.is_end_node = true;
        self.display_duration = display_duration;
        self
    }
}

/// A player-selectable edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDef {
    pub text: String,
    /// `None` ends the dialogue when this choice is taken.
    #[serde(default)]
    pub next_node: Option<NodeId>,
    #[serde(default)]
    pub impacts: Vec<ImpactDef>,
    /// Show-condition; absent or blank means always visible.
    #[serde(default)]
    pub condition: Option<String>,
}

impl ChoiceDef {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_node: None,
            impacts: Vec::new(),
            condition: None,
        }
    }

    pub fn with_next(mut self, node_id: impl Into<NodeId>) -> Self {
        self.next_node = Some(node_id.into());
        self
    }

    pub fn with_impact(mut self, impact: ImpactDef) -> Self {
        self.impacts.push(impact);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A signed delta applied to an integer store variable when a choice is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactDef {
    pub key: String,
    pub delta: i32,
    /// Apply-condition; absent or blank means always applied.
    #[serde(default)]
    pub condition: Option<String>,
}

impl ImpactDef {
    pub fn new(key: impl Into<String>, delta: i32) -> Self {
        Self {
            key: key.into(),
            delta,
            condition: None,
        }
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}
