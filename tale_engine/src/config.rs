//! Engine configuration and loader.
//!
//! `engine.toml` holds the dialogue timing defaults and the variable store
//! seeds. Every field is optional; a missing or unreadable file falls back to
//! the built-in defaults with a warning rather than stopping the game.
//!
//! ```toml
//! [dialogue]
//! default_display_secs = 3.0
//!
//! [store.ints]
//! sanity = 100
//! courage = 0
//!
//! [[store.clamps]]
//! key = "trust"
//! min = -10
//! max = 10
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::store::{SANITY_KEY, SANITY_MAX, StoreDefaults};

/// How long an end node stays up when it does not set its own duration.
pub const DEFAULT_DISPLAY_SECS: f32 = 3.0;

/// Timing settings used by the dialogue engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    pub default_display_secs: f32,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            default_display_secs: DEFAULT_DISPLAY_SECS,
        }
    }
}

impl DialogueSettings {
    /// The default display duration, or [`DEFAULT_DISPLAY_SECS`] if the configured value is unusable.
    pub fn default_display(&self) -> Duration {
        display_duration(Some(self.default_display_secs)).unwrap_or(Duration::from_secs_f32(DEFAULT_DISPLAY_SECS))
    }
}

/// Convert authored seconds into a `Duration`, rejecting negative or non-finite values.
pub fn display_duration(secs: Option<f32>) -> Option<Duration> {
    secs.and_then(|s| Duration::try_from_secs_f32(s).ok())
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dialogue: DialogueSettings,
    pub store: StoreDefaults,
}

/// Load engine configuration, falling back to defaults on any error.
pub fn load_config(toml_path: &Path) -> EngineConfig {
    match try_load_config(toml_path) {
        Ok(config) => {
            info!(
                "engine configuration loaded from '{}' ({} seeded ints, {} clamp rules)",
                toml_path.display(),
                config.store.ints.len(),
                config.store.clamps.len()
            );
            config
        },
        Err(e) => {
            warn!(
                "Could not load engine configuration from '{}': {:#}. Using built-in defaults.",
                toml_path.display(),
                e
            );
            EngineConfig::default()
        },
    }
}

/// Attempts to load engine configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn try_load_config(toml_path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(toml_path)
        .with_context(|| format!("reading engine configuration from '{}'", toml_path.display()))?;
    parse_config(&text).with_context(|| format!("parsing engine configuration from '{}'", toml_path.display()))
}

/// Parse engine configuration from TOML text.
///
/// A `[store.ints]` table replaces the seeded ints wholesale, so `sanity` is
/// seeded back at its maximum if the table leaves it out.
///
/// # Errors
/// Returns an error if the text is not valid TOML for [`EngineConfig`].
pub fn parse_config(text: &str) -> Result<EngineConfig> {
    let mut config: EngineConfig = toml::from_str(text)?;
    config.store.ints.entry(SANITY_KEY.to_string()).or_insert(SANITY_MAX);
    Ok(config)
}
