//! Inventory collaborator used by `item:` commands.

use log::info;
use serde::{Deserialize, Serialize};

/// Anything that can receive items granted by dialogue.
///
/// Grants are fire-and-forget: the engine does not wait for or inspect the
/// outcome.
pub trait Inventory {
    fn add_item(&mut self, item_id: &str);
}

/// Ordered list of item ids held by the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInventory {
    items: Vec<String>,
}

impl PlayerInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i.eq_ignore_ascii_case(item_id))
    }

    /// Items in the order they were granted.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        if let Some(pos) = self.items.iter().position(|i| i.eq_ignore_ascii_case(item_id)) {
            self.items.remove(pos);
            true
        } else {
            false
        }
    }
}

impl Inventory for PlayerInventory {
    fn add_item(&mut self, item_id: &str) {
        if self.contains(item_id) {
            info!("player already holds '{item_id}'");
            return;
        }
        self.items.push(item_id.to_string());
    }
}
