//! Shared data model for Tale dialogue content.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{ValidationError, validate_tree};
