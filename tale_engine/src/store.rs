//! Typed game variables shared by conditions, impacts and commands.
//!
//! Four independent maps (int, bool, float, string) keyed case-insensitively.
//! Every write goes through a setter so that clamp rules are applied and
//! subscribers see exactly one [`StoreChange`] per call, after the value is
//! committed.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Key whose integer value is always held in `[SANITY_MIN, SANITY_MAX]`.
pub const SANITY_KEY: &str = "sanity";
pub const SANITY_MIN: i32 = 0;
pub const SANITY_MAX: i32 = 100;

/// Handle returned by [`VariableStore::subscribe`].
pub type ListenerId = usize;

type StoreListener = Box<dyn FnMut(&StoreChange)>;

/// A committed write, delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Int { key: String, value: i32 },
    Bool { key: String, value: bool },
    Float { key: String, value: f64 },
    Str { key: String, value: String },
}

impl StoreChange {
    /// The normalized (trimmed, lowercase) key that changed.
    pub fn key(&self) -> &str {
        match self {
            Self::Int { key, .. } | Self::Bool { key, .. } | Self::Float { key, .. } | Self::Str { key, .. } => key,
        }
    }
}

/// Inclusive bounds enforced on an integer key before every commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampRule {
    pub key: String,
    pub min: i32,
    pub max: i32,
}

impl ClampRule {
    pub fn new(key: impl Into<String>, min: i32, max: i32) -> Self {
        Self {
            key: key.into(),
            min,
            max,
        }
    }

    fn sanity() -> Self {
        Self::new(SANITY_KEY, SANITY_MIN, SANITY_MAX)
    }
}

/// Seed values restored by [`VariableStore::reset_all`], plus any extra clamp rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDefaults {
    pub ints: BTreeMap<String, i32>,
    pub bools: BTreeMap<String, bool>,
    pub floats: BTreeMap<String, f64>,
    pub strings: BTreeMap<String, String>,
    /// Clamp rules in addition to the built-in `sanity` rule.
    pub clamps: Vec<ClampRule>,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        let mut ints = BTreeMap::new();
        ints.insert(SANITY_KEY.to_string(), SANITY_MAX);
        Self {
            ints,
            bools: BTreeMap::new(),
            floats: BTreeMap::new(),
            strings: BTreeMap::new(),
            clamps: Vec::new(),
        }
    }
}

impl StoreDefaults {
    /// Defaults with no seeded keys at all.
    pub fn empty() -> Self {
        Self {
            ints: BTreeMap::new(),
            ..Self::default()
        }
    }
}

/// Serializable copy of every value in a store, used by save collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub ints: BTreeMap<String, i32>,
    pub bools: BTreeMap<String, bool>,
    pub floats: BTreeMap<String, f64>,
    pub strings: BTreeMap<String, String>,
}

/// Typed key/value storage with change notification.
pub struct VariableStore {
    ints: HashMap<String, i32>,
    bools: HashMap<String, bool>,
    floats: HashMap<String, f64>,
    strings: HashMap<String, String>,
    defaults: StoreDefaults,
    clamps: Vec<ClampRule>,
    listeners: Vec<(ListenerId, StoreListener)>,
    next_listener: ListenerId,
}

impl fmt::Debug for VariableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableStore")
            .field("ints", &self.ints)
            .field("bools", &self.bools)
            .field("floats", &self.floats)
            .field("strings", &self.strings)
            .field("clamps", &self.clamps)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new(StoreDefaults::default())
    }
}

/// Trim and lowercase a key; `None` if nothing is left.
pub fn normalize_key(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() { None } else { Some(key.to_lowercase()) }
}

impl VariableStore {
    /// Create a store seeded from `defaults`.
    pub fn new(defaults: StoreDefaults) -> Self {
        let mut clamps = vec![ClampRule::sanity()];
        for rule in &defaults.clamps {
            match normalize_key(&rule.key) {
                Some(key) if rule.min <= rule.max => clamps.push(ClampRule::new(key, rule.min, rule.max)),
                _ => warn!("ignoring malformed clamp rule {rule:?}"),
            }
        }
        let mut store = Self {
            ints: HashMap::new(),
            bools: HashMap::new(),
            floats: HashMap::new(),
            strings: HashMap::new(),
            defaults,
            clamps,
            listeners: Vec::new(),
            next_listener: 0,
        };
        store.seed();
        info!(
            "variable store created with {} seeded keys",
            store.ints.len() + store.bools.len() + store.floats.len() + store.strings.len()
        );
        store
    }

    /// Register a listener for every committed write.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StoreChange) + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len()
    }

    pub fn get_int(&self, key: &str) -> i32 {
        normalize_key(key).and_then(|k| self.ints.get(&k).copied()).unwrap_or(0)
    }

    pub fn set_int(&mut self, key: &str, value: i32) {
        let Some(key) = write_key(key, "int") else {
            return;
        };
        let value = self.clamp(&key, value);
        self.ints.insert(key.clone(), value);
        self.notify(&StoreChange::Int { key, value });
    }

    /// `set_int(key, get_int(key) + delta)`, saturating at the `i32` range.
    pub fn add_int(&mut self, key: &str, delta: i32) {
        let current = self.get_int(key);
        self.set_int(key, current.saturating_add(delta));
    }

    pub fn get_bool(&self, key: &str) -> bool {
        normalize_key(key).and_then(|k| self.bools.get(&k).copied()).unwrap_or(false)
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        let Some(key) = write_key(key, "bool") else {
            return;
        };
        self.bools.insert(key.clone(), value);
        self.notify(&StoreChange::Bool { key, value });
    }

    pub fn toggle_bool(&mut self, key: &str) {
        let current = self.get_bool(key);
        self.set_bool(key, !current);
    }

    pub fn get_float(&self, key: &str) -> f64 {
        normalize_key(key).and_then(|k| self.floats.get(&k).copied()).unwrap_or(0.0)
    }

    pub fn set_float(&mut self, key: &str, value: f64) {
        let Some(key) = write_key(key, "float") else {
            return;
        };
        self.floats.insert(key.clone(), value);
        self.notify(&StoreChange::Float { key, value });
    }

    pub fn get_string(&self, key: &str) -> String {
        normalize_key(key)
            .and_then(|k| self.strings.get(&k).cloned())
            .unwrap_or_default()
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        let Some(key) = write_key(key, "string") else {
            return;
        };
        let value = value.into();
        self.strings.insert(key.clone(), value.clone());
        self.notify(&StoreChange::Str { key, value });
    }

    /// Restore seeded defaults, notifying once for every key that was present
    /// before the reset or is seeded after it.
    pub fn reset_all(&mut self) {
        info!("resetting variable store to defaults");
        let seeds = StoreSnapshot {
            ints: self.defaults.ints.clone(),
            bools: self.defaults.bools.clone(),
            floats: self.defaults.floats.clone(),
            strings: self.defaults.strings.clone(),
        };
        self.replace_contents(seeds);
    }

    /// Copy every value out of the store.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            ints: self.ints.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            bools: self.bools.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            floats: self.floats.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            strings: self.strings.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// Replace the store contents with a snapshot. Clamp rules apply to the
    /// restored values and notifications fire as for [`reset_all`](Self::reset_all).
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        info!("restoring variable store from snapshot");
        self.replace_contents(snapshot);
    }

    fn seed(&mut self) {
        let defaults = self.defaults.clone();
        for (key, value) in defaults.ints {
            if let Some(key) = normalize_key(&key) {
                let value = self.clamp(&key, value);
                self.ints.insert(key, value);
            }
        }
        for (key, value) in defaults.bools {
            if let Some(key) = normalize_key(&key) {
                self.bools.insert(key, value);
            }
        }
        for (key, value) in defaults.floats {
            if let Some(key) = normalize_key(&key) {
                self.floats.insert(key, value);
            }
        }
        for (key, value) in defaults.strings {
            if let Some(key) = normalize_key(&key) {
                self.strings.insert(key, value);
            }
        }
    }

    fn replace_contents(&mut self, values: StoreSnapshot) {
        let int_keys = union_keys(self.ints.keys(), values.ints.keys());
        let bool_keys = union_keys(self.bools.keys(), values.bools.keys());
        let float_keys = union_keys(self.floats.keys(), values.floats.keys());
        let string_keys = union_keys(self.strings.keys(), values.strings.keys());

        self.ints.clear();
        self.bools.clear();
        self.floats.clear();
        self.strings.clear();

        for (key, value) in values.ints {
            if let Some(key) = normalize_key(&key) {
                let value = self.clamp(&key, value);
                self.ints.insert(key, value);
            }
        }
        for (key, value) in values.bools {
            if let Some(key) = normalize_key(&key) {
                self.bools.insert(key, value);
            }
        }
        for (key, value) in values.floats {
            if let Some(key) = normalize_key(&key) {
                self.floats.insert(key, value);
            }
        }
        for (key, value) in values.strings {
            if let Some(key) = normalize_key(&key) {
                self.strings.insert(key, value);
            }
        }

        for key in int_keys {
            let value = self.get_int(&key);
            self.notify(&StoreChange::Int { key, value });
        }
        for key in bool_keys {
            let value = self.get_bool(&key);
            self.notify(&StoreChange::Bool { key, value });
        }
        for key in float_keys {
            let value = self.get_float(&key);
            self.notify(&StoreChange::Float { key, value });
        }
        for key in string_keys {
            let value = self.get_string(&key);
            self.notify(&StoreChange::Str { key, value });
        }
    }

    fn clamp(&self, key: &str, value: i32) -> i32 {
        self.clamps
            .iter()
            .filter(|rule| rule.key == key)
            .fold(value, |v, rule| v.clamp(rule.min, rule.max))
    }

    fn notify(&mut self, change: &StoreChange) {
        debug!("store change: {change:?}");
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}

fn write_key(key: &str, kind: &str) -> Option<String> {
    let normalized = normalize_key(key);
    if normalized.is_none() {
        warn!("ignoring {kind} write with a blank key");
    }
    normalized
}

fn union_keys<'a>(
    current: impl Iterator<Item = &'a String>,
    incoming: impl Iterator<Item = &'a String>,
) -> BTreeSet<String> {
    current
        .cloned()
        .chain(incoming.filter_map(|k| normalize_key(k)))
        .collect()
}
