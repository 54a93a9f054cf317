//! Runtime view of an authored dialogue tree.

use std::collections::HashMap;

use tale_data::{DialogueTreeDef, NodeDef};

use crate::error::{DialogueError, DialogueResult};

/// An immutable dialogue tree with a case-insensitive node index.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueTree {
    def: DialogueTreeDef,
    index: HashMap<String, usize>,
}

impl DialogueTree {
    /// Index the nodes of `def`.
    ///
    /// # Errors
    /// - if a node id is blank
    /// - if two node ids differ only by case or surrounding whitespace
    pub fn new(def: DialogueTreeDef) -> DialogueResult<Self> {
        let mut index = HashMap::with_capacity(def.nodes.len());
        for (i, node) in def.nodes.iter().enumerate() {
            let key = node_key(&node.id);
            if key.is_empty() {
                return Err(DialogueError::BlankNodeId { tree: def.id.clone() });
            }
            if index.insert(key, i).is_some() {
                return Err(DialogueError::DuplicateNode {
                    tree: def.id.clone(),
                    node: node.id.clone(),
                });
            }
        }
        Ok(Self { def, index })
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn title(&self) -> &str {
        &self.def.title
    }

    pub fn typing_speed(&self) -> f32 {
        self.def.typing_speed
    }

    pub fn auto_advance_single_choice(&self) -> bool {
        self.def.auto_advance_single_choice
    }

    pub fn start_node_id(&self) -> Option<&str> {
        self.def.start_node.as_deref()
    }

    /// Look up a node by id, ignoring case.
    pub fn node(&self, id: &str) -> Option<&NodeDef> {
        self.index.get(&node_key(id)).map(|&i| &self.def.nodes[i])
    }

    pub fn start_node(&self) -> Option<&NodeDef> {
        self.start_node_id().and_then(|id| self.node(id))
    }

    pub fn nodes(&self) -> &[NodeDef] {
        &self.def.nodes
    }

    pub fn def(&self) -> &DialogueTreeDef {
        &self.def
    }
}

impl TryFrom<DialogueTreeDef> for DialogueTree {
    type Error = DialogueError;

    fn try_from(def: DialogueTreeDef) -> DialogueResult<Self> {
        Self::new(def)
    }
}

fn node_key(id: &str) -> String {
    id.trim().to_lowercase()
}
