//! The dialogue state machine.
//!
//! A session moves `Idle -> NodeActive -> ... -> Idle`. Only the current tree
//! and node are tracked; there is no history stack. Each call that can change
//! state runs to completion (commands executed, events emitted) before it
//! returns, and listeners only ever see a `&DialogueEvent`, so they cannot
//! re-enter the engine mid-transition.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tale_data::{ChoiceDef, NodeDef};
use variantly::Variantly;

use super::events::{DialogueEvent, EventBus, ListenerId};
use super::tree::DialogueTree;
use crate::command::{self, CommandOutcome};
use crate::condition::evaluate_opt;
use crate::config::{DialogueSettings, display_duration};
use crate::error::{DialogueError, DialogueResult};
use crate::inventory::Inventory;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::store::{VariableStore, normalize_key};

/// The node currently on screen and the tree it belongs to.
#[derive(Debug, Clone)]
pub struct ActiveNode {
    pub tree: Arc<DialogueTree>,
    pub node_id: String,
}

#[derive(Debug, Clone, Default, Variantly)]
pub enum DialogueState {
    #[default]
    Idle,
    NodeActive(ActiveNode),
}

/// Work deferred onto the engine's scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeferredTask {
    EndDialogue { node_id: String },
}

/// Walks dialogue trees against a variable store.
///
/// The store and inventory are handed in by whoever composes the game and are
/// reachable afterwards through [`store`](Self::store) /
/// [`inventory`](Self::inventory).
#[derive(Debug)]
pub struct DialogueEngine<I: Inventory> {
    store: VariableStore,
    inventory: I,
    settings: DialogueSettings,
    state: DialogueState,
    scheduler: Scheduler<DeferredTask>,
    pending_end: Option<TimerHandle>,
    events: EventBus,
}

impl<I: Inventory> DialogueEngine<I> {
    pub fn new(store: VariableStore, inventory: I, settings: DialogueSettings) -> Self {
        Self {
            store,
            inventory,
            settings,
            state: DialogueState::Idle,
            scheduler: Scheduler::new(),
            pending_end: None,
            events: EventBus::new(),
        }
    }

    /// Register a listener for dialogue events.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DialogueEvent<'_>) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut I {
        &mut self.inventory
    }

    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_node_active()
    }

    pub fn current_tree(&self) -> Option<&Arc<DialogueTree>> {
        self.state.node_active_ref().map(|active| &active.tree)
    }

    pub fn current_node(&self) -> Option<&NodeDef> {
        self.state
            .node_active_ref()
            .and_then(|active| active.tree.node(&active.node_id))
    }

    /// Whether an end node is counting down to close itself.
    pub fn pending_auto_end(&self) -> bool {
        self.pending_end.is_some_and(|h| self.scheduler.is_pending(h))
    }

    /// Time on the engine's clock, as advanced by [`update`](Self::update).
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Begin `tree` at its start node.
    ///
    /// # Errors
    /// - `MissingStartNode` if the tree names no start node
    /// - `NodeNotFound` if the start node id does not resolve
    pub fn start(&mut self, tree: Arc<DialogueTree>) -> DialogueResult<()> {
        let Some(start_id) = tree.start_node_id().map(str::to_string) else {
            return Err(refuse(DialogueError::MissingStartNode {
                tree: tree.id().to_string(),
            }));
        };
        self.start_at_node_id(tree, &start_id)
    }

    /// Begin `tree` at the node with `node_id` (case-insensitive), running its
    /// start commands as `start` would.
    ///
    /// # Errors
    /// - `NodeNotFound` if no node in the tree has that id
    pub fn start_at_node_id(&mut self, tree: Arc<DialogueTree>, node_id: &str) -> DialogueResult<()> {
        let Some(node) = tree.node(node_id) else {
            return Err(refuse(DialogueError::NodeNotFound {
                tree: tree.id().to_string(),
                node: node_id.to_string(),
            }));
        };
        let node_id = node.id.clone();
        if let Some(active) = self.state.node_active_ref() {
            info!(
                "dialogue '{}' superseded by '{}' without ending",
                active.tree.id(),
                tree.id()
            );
        }
        info!("dialogue '{}' started at node '{node_id}'", tree.id());
        self.show_node(tree, Some(&node_id));
        Ok(())
    }

    /// Put a saved session back on `node_id` without running its start
    /// commands again; their effects are already in the restored store.
    ///
    /// # Errors
    /// - `NodeNotFound` if no node in the tree has that id
    pub fn resume_at_node_id(&mut self, tree: Arc<DialogueTree>, node_id: &str) -> DialogueResult<()> {
        let Some(node) = tree.node(node_id) else {
            return Err(refuse(DialogueError::NodeNotFound {
                tree: tree.id().to_string(),
                node: node_id.to_string(),
            }));
        };
        self.cancel_pending_end();
        self.state = DialogueState::NodeActive(ActiveNode {
            tree: Arc::clone(&tree),
            node_id: node.id.clone(),
        });
        info!("dialogue '{}' resumed at node '{}'", tree.id(), node.id);
        self.present(&tree, node);
        Ok(())
    }

    /// Begin `tree` at `node`, which must belong to it.
    ///
    /// # Errors
    /// - `NodeNotFound` if the tree holds no node with that id
    pub fn start_at_node(&mut self, tree: Arc<DialogueTree>, node: &NodeDef) -> DialogueResult<()> {
        self.start_at_node_id(tree, &node.id)
    }

    /// Choices on the current node whose show-condition holds, in authored order.
    pub fn visible_choices(&self) -> Vec<&ChoiceDef> {
        self.current_node()
            .map(|node| visible_choices(node, &self.store).into_iter().map(|(_, c)| c).collect::<Vec<_>>())
            .unwrap_or_default()
    }

    /// Take the `index`th *visible* choice.
    ///
    /// # Errors
    /// - `NotActive` when no dialogue is running
    /// - `InvalidChoice` when `index` is outside the visible choice list
    pub fn select_choice(&mut self, index: usize) -> DialogueResult<()> {
        let (tree, node_id) = self.active_parts()?;
        let Some(node) = tree.node(&node_id) else {
            return Err(refuse(DialogueError::NodeNotFound {
                tree: tree.id().to_string(),
                node: node_id,
            }));
        };
        let visible = visible_choices(node, &self.store);
        let Some(&(_, choice)) = visible.get(index) else {
            return Err(refuse(DialogueError::InvalidChoice {
                index,
                visible: visible.len(),
            }));
        };

        info!("choice {index} taken at node '{}': \"{}\"", node.id, choice.text);
        self.events.emit(&DialogueEvent::ChoiceSelected { node, choice, index });

        for impact in &choice.impacts {
            if normalize_key(&impact.key).is_none() {
                warn!("content error: impact with a blank key at node '{}'", node.id);
                continue;
            }
            if !evaluate_opt(impact.condition.as_deref(), &self.store) {
                debug!("└─ impact skipped: {} {:+}", impact.key, impact.delta);
                continue;
            }
            self.store.add_int(&impact.key, impact.delta);
            debug!("└─ impact: {} {:+}", impact.key, impact.delta);
            self.events.emit(&DialogueEvent::ImpactApplied {
                key: &impact.key,
                delta: impact.delta,
            });
        }

        self.run_commands(&node.end_commands);
        self.show_node(Arc::clone(&tree), choice.next_node.as_deref());
        Ok(())
    }

    /// Follow the current node's auto-advance edge, or end the dialogue if it has none.
    ///
    /// # Errors
    /// - `NotActive` when no dialogue is running
    /// - `ChoicesPending` when the node has visible choices
    pub fn advance_to_next_node(&mut self) -> DialogueResult<()> {
        let (tree, node_id) = self.active_parts()?;
        let Some(node) = tree.node(&node_id) else {
            return Err(refuse(DialogueError::NodeNotFound {
                tree: tree.id().to_string(),
                node: node_id,
            }));
        };
        let visible = visible_choices(node, &self.store).len();
        if visible > 0 {
            return Err(refuse(DialogueError::ChoicesPending { visible }));
        }

        if let Some(next) = &node.next_node_if_auto {
            self.run_commands(&node.end_commands);
            self.show_node(Arc::clone(&tree), Some(next));
        } else {
            info!("node '{}' has no auto-advance target", node.id);
            self.end_dialogue();
        }
        Ok(())
    }

    /// End the running dialogue immediately. Returns false if none was running.
    pub fn force_end(&mut self) -> bool {
        if self.state.is_idle() {
            debug!("force_end called with no active dialogue");
            return false;
        }
        info!("dialogue force-ended");
        self.end_dialogue();
        true
    }

    /// Advance the engine clock by `elapsed` and run whatever came due.
    pub fn update(&mut self, elapsed: Duration) {
        self.scheduler.advance(elapsed);
        while let Some((handle, scheduled)) = self.scheduler.pop_due() {
            match scheduled.task {
                DeferredTask::EndDialogue { node_id } => {
                    if self.pending_end != Some(handle) {
                        continue;
                    }
                    self.pending_end = None;
                    info!("end node '{node_id}' closed after its display time");
                    self.end_dialogue();
                },
            }
        }
    }

    fn active_parts(&self) -> DialogueResult<(Arc<DialogueTree>, String)> {
        match &self.state {
            DialogueState::NodeActive(active) => Ok((Arc::clone(&active.tree), active.node_id.clone())),
            DialogueState::Idle => Err(refuse(DialogueError::NotActive)),
        }
    }

    /// Make `node_id` the current node, or end the dialogue when it is `None`
    /// or does not resolve.
    fn show_node(&mut self, tree: Arc<DialogueTree>, node_id: Option<&str>) {
        self.cancel_pending_end();
        let Some(node_id) = node_id else {
            self.end_dialogue();
            return;
        };
        let Some(node) = tree.node(node_id) else {
            warn!(
                "content error: dialogue '{}' links to missing node '{node_id}'; ending dialogue",
                tree.id()
            );
            self.end_dialogue();
            return;
        };

        self.state = DialogueState::NodeActive(ActiveNode {
            tree: Arc::clone(&tree),
            node_id: node.id.clone(),
        });
        info!("showing node '{}' of '{}'", node.id, tree.id());

        self.run_commands(&node.start_commands);
        self.present(&tree, node);
    }

    /// Announce the current node and arm its auto-end if it needs one.
    fn present(&mut self, tree: &DialogueTree, node: &NodeDef) {
        self.events.emit(&DialogueEvent::NodeDisplayed { tree, node });

        let visible = visible_choices(node, &self.store).len();
        self.events.emit(&DialogueEvent::ChoicesUpdated { node, visible });

        if visible == 0 {
            if node.is_end_node {
                self.schedule_end(node);
            } else if node.next_node_if_auto.is_none() {
                warn!(
                    "content warning: node '{}' of '{}' is a dead end; closing it like an end node",
                    node.id,
                    tree.id()
                );
                self.schedule_end(node);
            }
        }
    }

    fn schedule_end(&mut self, node: &NodeDef) {
        let delay = display_duration(node.display_duration).unwrap_or_else(|| self.settings.default_display());
        let handle = self.scheduler.schedule_in(
            delay,
            DeferredTask::EndDialogue {
                node_id: node.id.clone(),
            },
            Some(format!("auto-close node '{}'", node.id)),
        );
        self.pending_end = Some(handle);
    }

    fn cancel_pending_end(&mut self) {
        if let Some(handle) = self.pending_end.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Clear the session and announce it, once, if one was running.
    fn end_dialogue(&mut self) {
        self.cancel_pending_end();
        if let DialogueState::NodeActive(active) = std::mem::take(&mut self.state) {
            info!("dialogue '{}' ended at node '{}'", active.tree.id(), active.node_id);
            self.events.emit(&DialogueEvent::DialogueEnded);
        }
    }

    fn run_commands(&mut self, commands: &[String]) {
        for raw in commands {
            if let Some(CommandOutcome::ItemGiven(item_id)) =
                command::run_command(raw, &mut self.store, &mut self.inventory)
            {
                self.events.emit(&DialogueEvent::ItemGiven { item_id: &item_id });
            }
        }
    }
}

/// `(authored index, choice)` for every choice whose show-condition holds.
pub fn visible_choices<'n>(node: &'n NodeDef, store: &VariableStore) -> Vec<(usize, &'n ChoiceDef)> {
    node.choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| evaluate_opt(choice.condition.as_deref(), store))
        .collect()
}

fn refuse(err: DialogueError) -> DialogueError {
    warn!("dialogue call refused: {err}");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::PlayerInventory;
    use crate::store::StoreDefaults;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tale_data::{DialogueTreeDef, ImpactDef};

    type Engine = DialogueEngine<PlayerInventory>;

    fn engine() -> Engine {
        DialogueEngine::new(
            VariableStore::new(StoreDefaults::default()),
            PlayerInventory::new(),
            DialogueSettings::default(),
        )
    }

    fn record(engine: &mut Engine) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        engine.subscribe(move |event| sink.borrow_mut().push(event.to_string()));
        log
    }

    fn tree(def: DialogueTreeDef) -> Arc<DialogueTree> {
        Arc::new(DialogueTree::new(def).expect("valid tree"))
    }

    fn gatehouse() -> Arc<DialogueTree> {
        tree(
            DialogueTreeDef::new("gatehouse", "The Gatehouse")
                .with_start("greet")
                .with_node(
                    NodeDef::new("greet", "Who goes there?")
                        .with_speaker("Guard")
                        .with_start_command("flag:arrived")
                        .with_end_command("item:pass")
                        .with_choice(
                            ChoiceDef::new("A friend.")
                                .with_next("friend")
                                .with_impact(ImpactDef::new("courage", 10))
                                .with_impact(ImpactDef::new("sanity", -5)),
                        )
                        .with_choice(
                            ChoiceDef::new("Stand aside!")
                                .with_next("bluff")
                                .with_condition("courage >= 30"),
                        ),
                )
                .with_node(NodeDef::new("friend", "Then pass.").with_auto_next("farewell"))
                .with_node(NodeDef::new("bluff", "Bold words.").ending(Some(1.0)))
                .with_node(NodeDef::new("farewell", "Safe travels.").ending(Some(2.0))),
        )
    }

    #[test]
    fn gated_choice_appears_once_condition_holds() {
        let mut engine = engine();
        engine.store_mut().set_int("courage", 5);
        engine.start(gatehouse()).expect("start");
        let texts = |e: &Engine| e.visible_choices().iter().map(|c| c.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts(&engine), vec!["A friend."]);
        engine.store_mut().set_int("courage", 40);
        assert_eq!(texts(&engine), vec!["A friend.", "Stand aside!"]);
    }

    #[test]
    fn start_runs_start_commands_then_displays() {
        let mut engine = engine();
        let log = record(&mut engine);
        engine.start(gatehouse()).expect("start");
        assert!(engine.store().get_bool("arrived"));
        assert!(engine.is_active());
        assert_eq!(engine.current_node().map(|n| n.id.as_str()), Some("greet"));
        assert_eq!(*log.borrow(), vec!["node_displayed(greet)", "choices_updated(1)"]);
    }

    #[test]
    fn selecting_applies_impacts_in_order() {
        let mut engine = engine();
        engine.store_mut().set_int("sanity", 50);
        engine.start(gatehouse()).expect("start");
        let log = record(&mut engine);
        engine.select_choice(0).expect("select");
        assert_eq!(engine.store().get_int("courage"), 10);
        assert_eq!(engine.store().get_int("sanity"), 45);
        assert!(engine.inventory().contains("pass"));
        assert_eq!(
            *log.borrow(),
            vec![
                "choice_selected(greet#0)",
                "impact_applied(courage,+10)",
                "impact_applied(sanity,-5)",
                "item_given(pass)",
                "node_displayed(friend)",
                "choices_updated(0)",
            ]
        );
    }

    #[test]
    fn conditional_impact_is_skipped_when_false() {
        let def = DialogueTreeDef::new("t", "")
            .with_start("a")
            .with_node(
                NodeDef::new("a", "?").with_choice(
                    ChoiceDef::new("go")
                        .with_impact(ImpactDef::new("trust", 3).when("met_before"))
                        .with_impact(ImpactDef::new("trust", 1)),
                ),
            );
        let mut engine = engine();
        engine.start(tree(def)).expect("start");
        let log = record(&mut engine);
        engine.select_choice(0).expect("select");
        assert_eq!(engine.store().get_int("trust"), 1);
        assert!(!engine.is_active());
        assert_eq!(
            *log.borrow(),
            vec!["choice_selected(a#0)", "impact_applied(trust,+1)", "dialogue_ended"]
        );
    }

    #[test]
    fn advance_without_target_ends_dialogue() {
        let def = DialogueTreeDef::new("t", "")
            .with_start("a")
            .with_node(NodeDef::new("a", "...").with_end_command("flag:left"));
        let mut engine = engine();
        engine.start(tree(def)).expect("start");
        let log = record(&mut engine);
        engine.advance_to_next_node().expect("advance");
        assert!(engine.state().is_idle());
        assert!(!engine.store().get_bool("left"));
        assert_eq!(*log.borrow(), vec!["dialogue_ended"]);
    }

    #[test]
    fn end_node_with_visible_choice_waits_for_player() {
        let def = DialogueTreeDef::new("t", "")
            .with_start("end")
            .with_node(NodeDef::new("end", "Goodbye?").ending(Some(0.5)).with_choice(ChoiceDef::new("Bye")));
        let mut engine = engine();
        engine.start(tree(def)).expect("start");
        assert!(!engine.pending_auto_end());
        engine.update(Duration::from_secs(10));
        assert!(engine.is_active());
        engine.select_choice(0).expect("select");
        assert!(!engine.is_active());
    }

    #[test]
    fn end_node_closes_after_display_duration() {
        let mut engine = engine();
        engine.store_mut().set_int("courage", 30);
        engine.start(gatehouse()).expect("start");
        let log = record(&mut engine);
        engine.select_choice(1).expect("select");
        assert!(engine.pending_auto_end());
        engine.update(Duration::from_millis(999));
        assert!(engine.is_active());
        engine.update(Duration::from_millis(1));
        assert!(!engine.is_active());
        assert!(!engine.pending_auto_end());
        assert_eq!(log.borrow().last().map(String::as_str), Some("dialogue_ended"));
        assert_eq!(log.borrow().iter().filter(|e| *e == "dialogue_ended").count(), 1);
    }

    #[test]
    fn end_node_without_duration_uses_default() {
        let def = DialogueTreeDef::new("t", "")
            .with_start("end")
            .with_node(NodeDef::new("end", "Fin.").ending(None));
        let mut engine = engine();
        engine.start(tree(def)).expect("start");
        engine.update(Duration::from_millis(2999));
        assert!(engine.is_active());
        engine.update(Duration::from_millis(1));
        assert!(!engine.is_active());
    }

    #[test]
    fn auto_advance_runs_end_commands_and_moves_on() {
        let mut engine = engine();
        engine.start(gatehouse()).expect("start");
        engine.select_choice(0).expect("select");
        engine.advance_to_next_node().expect("advance");
        assert_eq!(engine.current_node().map(|n| n.id.as_str()), Some("farewell"));
        assert!(engine.pending_auto_end());
    }

    #[test]
    fn refused_calls_leave_state_untouched() {
        let mut engine = engine();
        assert_eq!(engine.select_choice(0), Err(DialogueError::NotActive));
        assert_eq!(engine.advance_to_next_node(), Err(DialogueError::NotActive));
        assert!(!engine.force_end());

        let log = record(&mut engine);
        engine.start(gatehouse()).expect("start");
        log.borrow_mut().clear();
        assert_eq!(
            engine.select_choice(1),
            Err(DialogueError::InvalidChoice { index: 1, visible: 1 })
        );
        assert_eq!(
            engine.advance_to_next_node(),
            Err(DialogueError::ChoicesPending { visible: 1 })
        );
        assert_eq!(engine.current_node().map(|n| n.id.as_str()), Some("greet"));
        assert_eq!(engine.store().get_int("courage"), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn start_errors_on_missing_start_node() {
        let mut engine = engine();
        let no_start = tree(DialogueTreeDef::new("empty", ""));
        assert_eq!(
            engine.start(no_start),
            Err(DialogueError::MissingStartNode { tree: "empty".into() })
        );
        let dangling = tree(DialogueTreeDef::new("t", "").with_start("nowhere"));
        assert_eq!(
            engine.start(dangling),
            Err(DialogueError::NodeNotFound {
                tree: "t".into(),
                node: "nowhere".into()
            })
        );
        assert!(engine.state().is_idle());
    }

    #[test]
    fn dangling_choice_target_ends_dialogue() {
        let def = DialogueTreeDef::new("t", "")
            .with_start("a")
            .with_node(NodeDef::new("a", "?").with_choice(ChoiceDef::new("go").with_next("missing")));
        let mut engine = engine();
        engine.start(tree(def)).expect("start");
        let log = record(&mut engine);
        engine.select_choice(0).expect("select");
        assert!(!engine.is_active());
        assert_eq!(*log.borrow(), vec!["choice_selected(a#0)", "dialogue_ended"]);
    }

    #[test]
    fn force_end_cancels_pending_auto_end() {
        let def = DialogueTreeDef::new("t", "")
            .with_start("end")
            .with_node(NodeDef::new("end", "Fin.").ending(Some(1.0)));
        let mut engine = engine();
        engine.start(tree(def)).expect("start");
        let log = record(&mut engine);
        assert!(engine.force_end());
        engine.update(Duration::from_secs(5));
        assert_eq!(*log.borrow(), vec!["dialogue_ended"]);
    }

    #[test]
    fn restart_supersedes_and_cancels_old_timer() {
        let ending = DialogueTreeDef::new("short", "")
            .with_start("end")
            .with_node(NodeDef::new("end", "Fin.").ending(Some(1.0)));
        let mut engine = engine();
        engine.start(tree(ending)).expect("start");
        let log = record(&mut engine);
        engine.start(gatehouse()).expect("restart");
        engine.update(Duration::from_secs(2));
        assert!(engine.is_active());
        assert_eq!(engine.current_tree().map(|t| t.id()), Some("gatehouse"));
        assert!(!log.borrow().iter().any(|e| e == "dialogue_ended"));
    }

    #[test]
    fn start_at_node_id_resumes_mid_tree() {
        let mut engine = engine();
        engine.start_at_node_id(gatehouse(), "FRIEND").expect("resume");
        assert_eq!(engine.current_node().map(|n| n.id.as_str()), Some("friend"));
        assert!(!engine.store().get_bool("arrived"));

        let gate = gatehouse();
        let node = gate.node("bluff").cloned().expect("node");
        engine.start_at_node(Arc::clone(&gate), &node).expect("resume");
        assert!(engine.pending_auto_end());
    }

    #[test]
    fn resume_skips_start_commands() {
        let mut engine = engine();
        let log = record(&mut engine);
        engine.resume_at_node_id(gatehouse(), "greet").expect("resume");
        assert!(!engine.store().get_bool("arrived"));
        assert_eq!(*log.borrow(), vec!["node_displayed(greet)", "choices_updated(1)"]);

        engine.resume_at_node_id(gatehouse(), "bluff").expect("resume");
        assert!(engine.pending_auto_end());
        assert_eq!(
            engine.resume_at_node_id(gatehouse(), "moat"),
            Err(DialogueError::NodeNotFound {
                tree: "gatehouse".into(),
                node: "moat".into()
            })
        );
        assert_eq!(engine.current_node().map(|n| n.id.as_str()), Some("bluff"));
    }

    #[test]
    fn dead_end_node_is_closed_like_an_end_node() {
        let def = DialogueTreeDef::new("t", "")
            .with_start("stuck")
            .with_node(NodeDef::new("stuck", "..."));
        let mut engine = engine();
        engine.start(tree(def)).expect("start");
        assert!(engine.pending_auto_end());
        engine.update(Duration::from_secs(3));
        assert!(!engine.is_active());
    }
}
