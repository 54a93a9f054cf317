//! Node commands: side effects attached to entering or leaving a node.
//!
//! Commands are authored as `type:param` strings and stay strings in content.
//! They are parsed through [`COMMAND_TABLE`] when executed, so adding a new
//! command type means adding a row and a variant here; the dialogue engine
//! only ever calls [`run_command`].
//!
//! | command           | effect                                  |
//! |-------------------|-----------------------------------------|
//! | `item:<id>`       | grant an item through the [`Inventory`] |
//! | `flag:<name>`     | set bool variable to `true`             |
//! | `unflag:<name>`   | set bool variable to `false`            |
//! | `var:<name>+<n>`  | add `n` to an int variable (`-<n>` too) |
//! | `ending:<label>`  | record `label` under the `ending` key   |

use std::fmt;

use log::{debug, warn};
use thiserror::Error;

use crate::inventory::Inventory;
use crate::store::VariableStore;

/// String variable written by `ending:` commands.
pub const ENDING_KEY: &str = "ending";

type CommandParser = fn(&str) -> Result<Command, CommandError>;

/// Recognized command types and their parameter parsers.
pub const COMMAND_TABLE: [(&str, CommandParser); 5] = [
    ("item", parse_item),
    ("flag", parse_flag),
    ("unflag", parse_unflag),
    ("var", parse_var),
    ("ending", parse_ending),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("expected 'type:param', found '{0}'")]
    MissingSeparator(String),
    #[error("unrecognized command type '{0}'")]
    UnknownType(String),
    #[error("'{0}' command needs a parameter")]
    MissingParam(&'static str),
    #[error("'{0}' is not a valid 'var' adjustment (expected name+N or name-N)")]
    BadAdjustment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GiveItem(String),
    SetFlag(String),
    ClearFlag(String),
    AdjustVar { key: String, delta: i32 },
    RecordEnding(String),
}

/// What a successfully executed command did, for event reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    ItemGiven(String),
}

impl Command {
    /// Parse a `type:param` string. The type is matched case-insensitively.
    ///
    /// # Errors
    /// - if there is no `:` separator
    /// - if the type is not in [`COMMAND_TABLE`]
    /// - if the parameter is empty or malformed for its type
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        let raw = raw.trim();
        let (kind, param) = raw
            .split_once(':')
            .ok_or_else(|| CommandError::MissingSeparator(raw.to_string()))?;
        let kind = kind.trim();
        let parser = COMMAND_TABLE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(kind))
            .map(|(_, parser)| *parser)
            .ok_or_else(|| CommandError::UnknownType(kind.to_string()))?;
        parser(param.trim())
    }

    /// Apply the command to the store or inventory.
    pub fn execute(&self, store: &mut VariableStore, inventory: &mut dyn Inventory) -> CommandOutcome {
        match self {
            Self::GiveItem(item_id) => {
                inventory.add_item(item_id);
                return CommandOutcome::ItemGiven(item_id.clone());
            },
            Self::SetFlag(name) => store.set_bool(name, true),
            Self::ClearFlag(name) => store.set_bool(name, false),
            Self::AdjustVar { key, delta } => store.add_int(key, *delta),
            Self::RecordEnding(label) => store.set_string(ENDING_KEY, label.clone()),
        }
        CommandOutcome::Applied
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GiveItem(id) => write!(f, "item:{id}"),
            Self::SetFlag(name) => write!(f, "flag:{name}"),
            Self::ClearFlag(name) => write!(f, "unflag:{name}"),
            Self::AdjustVar { key, delta } => write!(f, "var:{key}{delta:+}"),
            Self::RecordEnding(label) => write!(f, "ending:{label}"),
        }
    }
}

/// Parse and execute one command string. Malformed or unknown commands are
/// logged and skipped; `None` is returned for them.
pub fn run_command(raw: &str, store: &mut VariableStore, inventory: &mut dyn Inventory) -> Option<CommandOutcome> {
    match Command::parse(raw) {
        Ok(command) => {
            debug!("└─ command: {command}");
            Some(command.execute(store, inventory))
        },
        Err(e) => {
            warn!("skipping command \"{raw}\": {e}");
            None
        },
    }
}

fn required(param: &str, kind: &'static str) -> Result<String, CommandError> {
    if param.is_empty() {
        Err(CommandError::MissingParam(kind))
    } else {
        Ok(param.to_string())
    }
}

fn parse_item(param: &str) -> Result<Command, CommandError> {
    required(param, "item").map(Command::GiveItem)
}

fn parse_flag(param: &str) -> Result<Command, CommandError> {
    required(param, "flag").map(Command::SetFlag)
}

fn parse_unflag(param: &str) -> Result<Command, CommandError> {
    required(param, "unflag").map(Command::ClearFlag)
}

fn parse_ending(param: &str) -> Result<Command, CommandError> {
    required(param, "ending").map(Command::RecordEnding)
}

/// `name+N` splits at the first `+`; without one, `name-N` splits at the last `-`
/// so that hyphenated names still work.
fn parse_var(param: &str) -> Result<Command, CommandError> {
    let param = required(param, "var")?;
    let bad = || CommandError::BadAdjustment(param.clone());
    let (key, delta) = if let Some((key, amount)) = param.split_once('+') {
        (key, amount.trim().parse::<i32>().map_err(|_| bad())?)
    } else if let Some((key, amount)) = param.rsplit_once('-') {
        let amount = amount.trim().parse::<i32>().map_err(|_| bad())?;
        (key, amount.checked_neg().ok_or_else(bad)?)
    } else {
        return Err(bad());
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(bad());
    }
    Ok(Command::AdjustVar {
        key: key.to_string(),
        delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::PlayerInventory;
    use crate::store::StoreDefaults;

    #[test]
    fn parses_every_known_type() {
        assert_eq!(Command::parse("item:lantern"), Ok(Command::GiveItem("lantern".into())));
        assert_eq!(Command::parse("flag:arrived"), Ok(Command::SetFlag("arrived".into())));
        assert_eq!(Command::parse(" UNFLAG: arrived "), Ok(Command::ClearFlag("arrived".into())));
        assert_eq!(
            Command::parse("ending:drowned"),
            Ok(Command::RecordEnding("drowned".into()))
        );
    }

    #[test]
    fn var_adjustments_accept_both_signs() {
        assert_eq!(
            Command::parse("var:courage+10"),
            Ok(Command::AdjustVar {
                key: "courage".into(),
                delta: 10
            })
        );
        assert_eq!(
            Command::parse("var:courage+-4"),
            Ok(Command::AdjustVar {
                key: "courage".into(),
                delta: -4
            })
        );
        assert_eq!(
            Command::parse("var:sea-sick-3"),
            Ok(Command::AdjustVar {
                key: "sea-sick".into(),
                delta: -3
            })
        );
    }

    #[test]
    fn malformed_commands_are_rejected() {
        assert_eq!(
            Command::parse("flag"),
            Err(CommandError::MissingSeparator("flag".into()))
        );
        assert_eq!(
            Command::parse("camera:pan_left"),
            Err(CommandError::UnknownType("camera".into()))
        );
        assert_eq!(Command::parse("item:  "), Err(CommandError::MissingParam("item")));
        assert!(matches!(Command::parse("var:courage"), Err(CommandError::BadAdjustment(_))));
        assert!(matches!(Command::parse("var:+5"), Err(CommandError::BadAdjustment(_))));
        assert!(matches!(Command::parse("var:courage+lots"), Err(CommandError::BadAdjustment(_))));
    }

    #[test]
    fn display_matches_authored_form() {
        let authored = [
            "item:lantern",
            "flag:arrived",
            "unflag:arrived",
            "var:courage+10",
            "var:courage-2",
            "ending:tide",
        ];
        for raw in authored {
            assert_eq!(Command::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn execution_updates_store_and_inventory() {
        let mut store = VariableStore::new(StoreDefaults::empty());
        let mut inv = PlayerInventory::new();

        assert_eq!(
            run_command("item:lantern", &mut store, &mut inv),
            Some(CommandOutcome::ItemGiven("lantern".into()))
        );
        assert!(inv.contains("lantern"));

        run_command("flag:arrived", &mut store, &mut inv);
        assert!(store.get_bool("arrived"));
        run_command("unflag:arrived", &mut store, &mut inv);
        assert!(!store.get_bool("arrived"));

        run_command("var:courage+10", &mut store, &mut inv);
        run_command("var:courage-3", &mut store, &mut inv);
        assert_eq!(store.get_int("courage"), 7);

        run_command("ending:lighthouse", &mut store, &mut inv);
        assert_eq!(store.get_string(ENDING_KEY), "lighthouse");
    }

    #[test]
    fn unknown_commands_are_skipped_without_side_effects() {
        let mut store = VariableStore::new(StoreDefaults::empty());
        let mut inv = PlayerInventory::new();
        assert_eq!(run_command("cue:thunder", &mut store, &mut inv), None);
        assert_eq!(run_command("nonsense", &mut store, &mut inv), None);
        assert!(inv.items().is_empty());
        assert_eq!(store.snapshot(), crate::store::StoreSnapshot::default());
    }
}
