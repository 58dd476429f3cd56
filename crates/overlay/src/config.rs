use document::DEFAULT_MAX_PAGES;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snapshot::SnapshotLocation;
use std::collections::BTreeMap;
use tracing::warn;

use crate::{DarkModePolicy, Result};

/// Key of the overlay's block inside the presentation config.
pub const CONFIG_KEY: &str = "inkdeck";

/// Shape styles that may be preset for new shapes.
pub const STYLE_KEYS: [&str; 5] = ["color", "dash", "fill", "font", "size"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    /// Initial local saving preference; a stored choice overrides it
    pub use_local_storage: bool,

    /// Published snapshot to load at startup; `null` disables it
    pub snapshot_url: Option<SnapshotLocation>,
    pub automatic_dark_mode: bool,
    pub is_dark_mode: bool,
    pub default_styles: BTreeMap<String, String>,
    pub max_pages: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            use_local_storage: true,
            snapshot_url: Some(SnapshotLocation::Auto),
            automatic_dark_mode: true,
            is_dark_mode: false,
            default_styles: BTreeMap::new(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl OverlayConfig {
    /// Reads the `inkdeck` block of a presentation config; missing means
    /// defaults.
    pub fn from_presentation_config(config: &Value) -> Result<Self> {
        match config.get(CONFIG_KEY) {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(block) => Ok(serde_json::from_value(block.clone())?),
        }
    }

    pub fn dark_mode_policy(&self) -> DarkModePolicy {
        DarkModePolicy {
            automatic: self.automatic_dark_mode,
            fallback_dark: self.is_dark_mode,
        }
    }

    /// Configured styles with a value, restricted to known style keys.
    pub fn styles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.default_styles
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(key, value)| {
                if STYLE_KEYS.contains(&key.as_str()) {
                    Some((key.as_str(), value.as_str()))
                } else {
                    warn!("Ignoring unknown default style {:?}", key);
                    None
                }
            })
    }
}
