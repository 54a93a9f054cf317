//! Session snapshots: the variable store, the player's items and the
//! dialogue position, written to disk as RON.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::TALE_VERSION;
use crate::dialogue::{DialogueEngine, DialogueTree};
use crate::inventory::PlayerInventory;
use crate::store::StoreSnapshot;

pub const SAVE_DIR: &str = "saved_games";

/// Where the named save slot lives under [`SAVE_DIR`].
pub fn slot_path(slot: &str) -> PathBuf {
    let slug: String = slot
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '_' })
        .collect();
    PathBuf::from(SAVE_DIR).join(format!("tale-{slug}.ron"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Engine version that wrote the snapshot.
    pub version: String,
    #[serde(default)]
    pub tree_id: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub store: StoreSnapshot,
    #[serde(default)]
    pub inventory: PlayerInventory,
}

impl SessionSnapshot {
    pub fn capture(engine: &DialogueEngine<PlayerInventory>) -> Self {
        let (tree_id, node_id) = match engine.state().node_active_ref() {
            Some(active) => (Some(active.tree.id().to_string()), Some(active.node_id.clone())),
            None => (None, None),
        };
        Self {
            version: TALE_VERSION.to_string(),
            tree_id,
            node_id,
            store: engine.store().snapshot(),
            inventory: engine.inventory().clone(),
        }
    }

    /// Put `engine` back into the captured state.
    ///
    /// Any running dialogue is ended first. If the snapshot was taken mid-dialogue,
    /// `tree` must be the same tree; the saved node is shown again without
    /// re-running its start commands, so the store comes back exactly as saved.
    ///
    /// # Errors
    /// - if the snapshot names a dialogue position but `tree` is missing or has another id
    /// - if the saved node no longer exists in `tree`
    pub fn apply(self, engine: &mut DialogueEngine<PlayerInventory>, tree: Option<Arc<DialogueTree>>) -> Result<()> {
        let resume = match (&self.tree_id, &self.node_id) {
            (Some(tree_id), Some(node_id)) => {
                let Some(tree) = tree else {
                    bail!("snapshot is inside dialogue '{tree_id}' but no tree was supplied");
                };
                if !tree.id().eq_ignore_ascii_case(tree_id) {
                    bail!("snapshot is inside dialogue '{tree_id}', not '{}'", tree.id());
                }
                Some((tree, node_id.clone()))
            },
            _ => None,
        };

        engine.force_end();
        engine.store_mut().restore(self.store);
        *engine.inventory_mut() = self.inventory;
        if let Some((tree, node_id)) = resume {
            engine
                .resume_at_node_id(tree, &node_id)
                .with_context(|| format!("resuming dialogue at node '{node_id}'"))?;
        }
        Ok(())
    }
}

/// Write a snapshot to `path`, creating parent directories as needed.
///
/// # Errors
/// Returns an error if the snapshot cannot be serialized or written.
pub fn save_snapshot(path: &Path, snapshot: &SessionSnapshot) -> Result<()> {
    let text = ron::ser::to_string_pretty(snapshot, ron::ser::PrettyConfig::default())
        .context("error converting session snapshot to 'ron' format")?;
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).with_context(|| format!("creating '{}'", dir.display()))?;
    }
    fs::write(path, text).with_context(|| format!("writing snapshot to '{}'", path.display()))?;
    info!("session snapshot saved to '{}'", path.display());
    Ok(())
}

/// Read a snapshot from `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<SessionSnapshot> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: SessionSnapshot =
        ron::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))?;
    if snapshot.version != TALE_VERSION {
        warn!(
            "snapshot '{}' was written by version {} (running {TALE_VERSION})",
            path.display(),
            snapshot.version
        );
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DialogueSettings;
    use crate::inventory::Inventory;
    use crate::store::{StoreDefaults, VariableStore};
    use tale_data::{ChoiceDef, DialogueTreeDef, NodeDef};

    fn engine() -> DialogueEngine<PlayerInventory> {
        DialogueEngine::new(
            VariableStore::new(StoreDefaults::default()),
            PlayerInventory::new(),
            DialogueSettings::default(),
        )
    }

    fn tree() -> Arc<DialogueTree> {
        let def = DialogueTreeDef::new("cellar", "The Cellar")
            .with_start("door")
            .with_node(NodeDef::new("door", "A locked door.").with_choice(ChoiceDef::new("Knock").with_next("voice")))
            .with_node(
                NodeDef::new("voice", "Who's there?")
                    .with_start_command("var:visits+1")
                    .with_choice(ChoiceDef::new("Leave")),
            );
        Arc::new(DialogueTree::new(def).expect("valid tree"))
    }

    #[test]
    fn capture_and_apply_restore_position_and_values() {
        let mut source = engine();
        source.start(tree()).expect("start");
        source.select_choice(0).expect("select");
        source.store_mut().set_int("sanity", 40);
        source.inventory_mut().add_item("lamp");
        let snap = SessionSnapshot::capture(&source);
        assert_eq!(snap.node_id.as_deref(), Some("voice"));

        let mut target = engine();
        snap.apply(&mut target, Some(tree())).expect("apply");
        assert_eq!(target.current_node().map(|n| n.id.as_str()), Some("voice"));
        assert_eq!(target.store().get_int("sanity"), 40);
        assert_eq!(target.store().get_int("visits"), 1);
        assert!(target.inventory().contains("lamp"));
        assert_eq!(SessionSnapshot::capture(&target), SessionSnapshot::capture(&source));
    }

    #[test]
    fn apply_rejects_wrong_tree() {
        let mut source = engine();
        source.start(tree()).expect("start");
        let snap = SessionSnapshot::capture(&source);
        let other = Arc::new(
            DialogueTree::new(
                DialogueTreeDef::new("attic", "")
                    .with_start("a")
                    .with_node(NodeDef::new("a", "Dust.")),
            )
            .expect("valid tree"),
        );
        let mut target = engine();
        assert!(snap.clone().apply(&mut target, Some(other)).is_err());
        assert!(snap.apply(&mut target, None).is_err());
        assert!(!target.is_active());
    }

    #[test]
    fn idle_snapshot_restores_values_only() {
        let mut source = engine();
        source.store_mut().set_bool("met_ferryman", true);
        let snap = SessionSnapshot::capture(&source);
        let mut target = engine();
        target.start(tree()).expect("start");
        snap.apply(&mut target, None).expect("apply");
        assert!(!target.is_active());
        assert!(target.store().get_bool("met_ferryman"));
    }

    #[test]
    fn snapshot_files_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("saves").join("slot1.ron");
        let mut source = engine();
        source.store_mut().set_string("ending", "drowned");
        source.store_mut().set_float("fog", 0.25);
        let snap = SessionSnapshot::capture(&source);
        save_snapshot(&path, &snap).expect("save");
        assert_eq!(load_snapshot(&path).expect("load"), snap);
        assert!(load_snapshot(&dir.path().join("missing.ron")).is_err());
    }

    #[test]
    fn slot_names_are_sanitized() {
        assert_eq!(slot_path(" Before Boss "), PathBuf::from("saved_games/tale-before_boss.ron"));
        assert_eq!(slot_path("../x"), PathBuf::from("saved_games/tale-___x.ron"));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut source = engine();
        source.store_mut().set_int("courage", 12);
        let snap = SessionSnapshot::capture(&source);
        let json = serde_json::to_string(&snap).expect("to json");
        let back: SessionSnapshot = serde_json::from_str(&json).expect("from json");
        assert_eq!(back.store.ints.get("courage"), Some(&12));
        assert_eq!(back, snap);
    }
}
