//! Runtime settings of the input store
//!
//! Settings live in `~/.inputstore/settings.toml`. A missing file is created with
//! defaults; an unreadable or malformed file is logged and defaults are used in memory.
//! Keyboard maps are not stored here.

use crate::controller::dpad::DirectionChangePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".inputstore";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Tunables of the store, the device collector and the command channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Behaviour when the active direction switches without passing through neutral
    pub direction_change_policy: DirectionChangePolicy,

    /// Stick deflection (0.0-1.0) that counts as a held direction
    pub stick_threshold: f32,

    /// Trigger travel (0.0-1.0) that counts as pressed when the device only reports a value
    pub trigger_press_threshold: f32,

    /// Initial value of the window-active gate for keyboard input
    pub window_active_on_start: bool,

    /// Capacity of the store's command channel
    pub command_buffer: usize,

    /// Sleep between two device polls of the collector, in microseconds
    pub poll_interval_us: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            direction_change_policy: DirectionChangePolicy::LastWriterWins,
            stick_threshold: 0.5,
            trigger_press_threshold: 0.5,
            window_active_on_start: true,
            command_buffer: 256,
            poll_interval_us: 100,
        }
    }
}

impl StoreSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.stick_threshold) || self.stick_threshold == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "stick_threshold must be in (0, 1], got {}",
                self.stick_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.trigger_press_threshold) {
            return Err(ConfigError::Invalid(format!(
                "trigger_press_threshold must be in [0, 1], got {}",
                self.trigger_press_threshold
            )));
        }
        if self.command_buffer == 0 {
            return Err(ConfigError::Invalid(
                "command_buffer must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `~/.inputstore/settings.toml`, or the current directory without a home
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| {
            warn!("Could not determine home directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(SETTINGS_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(path, self.to_toml_string()?)
            .await
            .map_err(io_err)
    }

    /// Loads `path`, writing defaults first if it does not exist yet
    pub async fn load_or_create(path: &Path) -> Self {
        match tokio::fs::try_exists(path).await {
            Ok(true) => match Self::load(path).await {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("{}, using defaults", e);
                    Self::default()
                }
            },
            Ok(false) => {
                let settings = Self::default();
                match settings.save(path).await {
                    Ok(()) => info!("Wrote default settings to {}", path.display()),
                    Err(e) => warn!("Could not write default settings: {}", e),
                }
                settings
            }
            Err(e) => {
                debug!("Could not check {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
