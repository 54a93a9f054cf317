//! Loader for authored dialogue trees.
//!
//! Trees are stored as RON (`DialogueTreeDef`). Structural problems such as
//! duplicate ids or links to missing nodes stop the load; conditions and
//! commands that will not parse are only reported, since the engine already
//! treats them as hidden choices and skipped commands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use tale_data::DialogueTreeDef;

use crate::command::Command;
use crate::condition::Condition;
use crate::dialogue::DialogueTree;

/// Load, validate and index a dialogue tree from a RON file.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, or failed validation.
pub fn load_tree(path: &Path) -> Result<Arc<DialogueTree>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading dialogue tree from '{}'", path.display()))?;
    let tree = parse_tree(&text).with_context(|| format!("loading dialogue tree from '{}'", path.display()))?;
    info!(
        "dialogue tree '{}' loaded from '{}' ({} nodes)",
        tree.id(),
        path.display(),
        tree.nodes().len()
    );
    Ok(Arc::new(tree))
}

/// Parse and validate a dialogue tree from RON text.
///
/// # Errors
/// Returns an error if the text is not a valid `DialogueTreeDef` or the tree fails validation.
pub fn parse_tree(text: &str) -> Result<DialogueTree> {
    let def: DialogueTreeDef = ron::from_str(text).context("parsing dialogue tree RON")?;
    validate_def(&def)?;
    for warning in lint_tree(&def) {
        warn!("content warning in '{}': {warning}", def.id);
    }
    Ok(DialogueTree::new(def)?)
}

/// Validate a tree definition and return a single aggregated error.
fn validate_def(def: &DialogueTreeDef) -> Result<()> {
    let errors = tale_data::validate_tree(def);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("dialogue tree '{}' failed validation:\n{details}", def.id);
}

/// Conditions and commands in `def` that will not parse.
pub fn lint_tree(def: &DialogueTreeDef) -> Vec<String> {
    let mut warnings = Vec::new();
    for node in &def.nodes {
        let commands = node.start_commands.iter().chain(&node.end_commands);
        for raw in commands {
            if let Err(e) = Command::parse(raw) {
                warnings.push(format!("node '{}' command \"{raw}\": {e}", node.id));
            }
        }
        for (i, choice) in node.choices.iter().enumerate() {
            let conditions = choice
                .condition
                .iter()
                .chain(choice.impacts.iter().filter_map(|impact| impact.condition.as_ref()));
            for expr in conditions {
                if let Err(e) = Condition::parse(expr) {
                    warnings.push(format!("node '{}' choice {i} condition \"{expr}\": {e}", node.id));
                }
            }
        }
    }
    warnings
}
