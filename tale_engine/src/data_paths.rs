//! Locates the bundled `data/` directory (dialogue trees and `engine.toml`).

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Workspace-root layout first, then running from inside `tale_engine/`.
const CANDIDATES: [&str; 2] = ["tale_engine/data", "data"];

static DATA_ROOT: LazyLock<PathBuf> = LazyLock::new(|| find_data_root(Path::new(".")));

/// Construct a data path relative to the resolved data root.
pub fn data_path(relative: impl AsRef<Path>) -> PathBuf {
    DATA_ROOT.join(relative)
}

fn find_data_root(base: &Path) -> PathBuf {
    CANDIDATES
        .iter()
        .map(|candidate| base.join(candidate))
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| PathBuf::from(CANDIDATES[0]))
}
