use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Validation error for malformed content or missing references in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { id: String },
    MissingReference { id: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { id } => {
                write!(f, "duplicate node id '{id}'")
            },
            ValidationError::MissingReference { id, context } => {
                write!(f, "missing node '{id}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate node references and basic invariants in a tree.
///
/// Node ids are compared case-insensitively, matching how the engine resolves
/// them. Condition and command strings are not parsed here; the engine lints
/// those when it loads a tree.
///
/// ```
/// use tale_data::{ChoiceDef, DialogueTreeDef, NodeDef, validate_tree};
///
/// let tree = DialogueTreeDef::new("demo", "Demo")
///     .with_start("a")
///     .with_node(NodeDef::new("a", "Hi").with_choice(ChoiceDef::new("Bye")));
/// assert!(validate_tree(&tree).is_empty());
/// ```
pub fn validate_tree(tree: &DialogueTreeDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if tree.id.trim().is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: "tree id is blank".to_string(),
        });
    }

    let mut ids = HashSet::new();
    for node in &tree.nodes {
        if node.id.trim().is_empty() {
            errors.push(ValidationError::InvalidValue {
                context: "node with blank id".to_string(),
            });
            continue;
        }
        if !ids.insert(node.id.trim().to_lowercase()) {
            errors.push(ValidationError::DuplicateId { id: node.id.clone() });
        }
    }

    match &tree.start_node {
        Some(start) => check_ref(start, &ids, "tree start node".to_string(), &mut errors),
        None => errors.push(ValidationError::InvalidValue {
            context: format!("tree '{}' has no start node", tree.id),
        }),
    }

    if !tree.typing_speed.is_finite() || tree.typing_speed <= 0.0 {
        errors.push(ValidationError::InvalidValue {
            context: format!("tree '{}' typing speed {}", tree.id, tree.typing_speed),
        });
    }

    for node in &tree.nodes {
        if let Some(next) = &node.next_node_if_auto {
            check_ref(next, &ids, format!("node '{}' auto-advance", node.id), &mut errors);
        }
        if let Some(secs) = node.display_duration
            && (!secs.is_finite() || secs < 0.0)
        {
            errors.push(ValidationError::InvalidValue {
                context: format!("node '{}' display duration {secs}", node.id),
            });
        }
        for (idx, choice) in node.choices.iter().enumerate() {
            if let Some(next) = &choice.next_node {
                check_ref(next, &ids, format!("node '{}' choice {idx}", node.id), &mut errors);
            }
            for impact in &choice.impacts {
                if impact.key.trim().is_empty() {
                    errors.push(ValidationError::InvalidValue {
                        context: format!("node '{}' choice {idx} has an impact with a blank key", node.id),
                    });
                }
            }
        }
    }

    errors
}

fn check_ref(id: &str, known: &HashSet<String>, context: String, errors: &mut Vec<ValidationError>) {
    if !known.contains(&id.trim().to_lowercase()) {
        errors.push(ValidationError::MissingReference {
            id: id.to_string(),
            context,
        });
    }
}
