//! Lifecycle events published by the dialogue engine.
//!
//! Emission order for one `show_node`: start commands (each `ItemGiven` as it
//! happens), `NodeDisplayed`, `ChoicesUpdated`. For one `select_choice`:
//! `ChoiceSelected`, one `ImpactApplied` per applied impact in authored order,
//! end-command `ItemGiven`s, then either `DialogueEnded` or the next node's
//! events.

use std::fmt;

use tale_data::{ChoiceDef, NodeDef};

use super::tree::DialogueTree;

/// Handle returned by [`EventBus::subscribe`].
pub type ListenerId = usize;

type EventListener = Box<dyn FnMut(&DialogueEvent<'_>)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialogueEvent<'a> {
    NodeDisplayed {
        tree: &'a DialogueTree,
        node: &'a NodeDef,
    },
    ChoicesUpdated {
        node: &'a NodeDef,
        visible: usize,
    },
    /// Fired before the transition; `node` is the node being left.
    ChoiceSelected {
        node: &'a NodeDef,
        choice: &'a ChoiceDef,
        index: usize,
    },
    ImpactApplied {
        key: &'a str,
        delta: i32,
    },
    ItemGiven {
        item_id: &'a str,
    },
    DialogueEnded,
}

impl fmt::Display for DialogueEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeDisplayed { node, .. } => write!(f, "node_displayed({})", node.id),
            Self::ChoicesUpdated { visible, .. } => write!(f, "choices_updated({visible})"),
            Self::ChoiceSelected { node, index, .. } => write!(f, "choice_selected({}#{index})", node.id),
            Self::ImpactApplied { key, delta } => write!(f, "impact_applied({key},{delta:+})"),
            Self::ItemGiven { item_id } => write!(f, "item_given({item_id})"),
            Self::DialogueEnded => write!(f, "dialogue_ended"),
        }
    }
}

/// Ordered list of event listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, EventListener)>,
    next_id: ListenerId,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners are called in subscription order.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DialogueEvent<'_>) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len()
    }

    pub fn emit(&mut self, event: &DialogueEvent<'_>) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}
