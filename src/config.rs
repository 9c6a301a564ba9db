//! Runtime settings
//!
//! Settings live in `~/.config/inputaxis/settings.toml`. A missing file is created
//! with defaults; a missing or unreadable home directory falls back to the current
//! directory. Axis bindings are deliberately not part of this file, the host builds
//! them in code.

use crate::device::{DEFAULT_KEY_CAPACITY, DEFAULT_MOUSE_CAPACITY};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/inputaxis";
const SETTINGS_FILE: &str = "settings.toml";

/// Settings for the input layer and the frame driver
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputSettings {
    /// Whether gamepads are scanned for and consulted at all
    pub use_controller: bool,
    /// Frame period of the demo loop in milliseconds
    pub frame_interval_ms: u64,
    /// Number of key slots; higher key codes are ignored
    pub key_capacity: usize,
    /// Number of mouse button slots; higher button codes are ignored
    pub mouse_capacity: usize,
    /// Log the active axis list whenever it changes
    pub log_active_axes: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            use_controller: true,
            frame_interval_ms: 16, // ~60 frames per second
            key_capacity: DEFAULT_KEY_CAPACITY,
            mouse_capacity: DEFAULT_MOUSE_CAPACITY,
            log_active_axes: true,
        }
    }
}

impl InputSettings {
    /// Default location of the settings file
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        path
    }

    /// Loads settings from `path`, writing defaults first when the file is missing
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if settings file exists: {}", e))?
        {
            info!("No settings at {}, writing defaults", path.display());
            let settings = Self::default();
            settings.save(path).await?;
            return Ok(settings);
        }

        Self::load(path).await
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read settings file: {}", e))?;
        let settings: InputSettings = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse settings file: {}", e))?;
        settings.validate()?;

        debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write settings file: {}", e))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_interval_ms == 0 {
            return Err(eyre!("frame_interval_ms must be greater than 0"));
        }
        if self.key_capacity == 0 || self.mouse_capacity == 0 {
            return Err(eyre!("key_capacity and mouse_capacity must be greater than 0"));
        }
        Ok(())
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
