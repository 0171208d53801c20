// Configuration - User settings stored as RON in the config directory

use crate::constants::{
    DEFAULT_BPM, DEFAULT_HISTORY_DEPTH, DEFAULT_SEQUENCE_LENGTH, MUTE_RAMP_SECONDS,
};
use crate::sequencer::recorder::RecordMode;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DawConfig {
    /// Undo snapshots kept
    pub history_depth: usize,
    /// Gain ramp for mute and solo changes
    pub mute_ramp_seconds: f64,
    /// Tempo of a new project
    pub default_bpm: f64,
    /// Length of new sequences, in steps
    pub default_sequence_length: usize,
    pub record_mode: RecordMode,
    /// How long notifications stay visible
    pub notification_ms: u32,
    /// Transport block size used by offline rendering
    pub render_block_seconds: f64,
}

impl Default for DawConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            mute_ramp_seconds: MUTE_RAMP_SECONDS,
            default_bpm: DEFAULT_BPM,
            default_sequence_length: DEFAULT_SEQUENCE_LENGTH,
            record_mode: RecordMode::Replace,
            notification_ms: 3000,
            render_block_seconds: 0.025,
        }
    }
}

impl DawConfig {
    /// `<config dir>/stepdaw/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stepdaw").join("config.ron"))
    }

    /// Read a config file; a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config: DawConfig = ron::from_str(&text)?;
        Ok(config.sanitized())
    }

    /// Read the config from the default location
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Replace out-of-range values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.history_depth = self.history_depth.max(1);
        if !self.mute_ramp_seconds.is_finite() || self.mute_ramp_seconds < 0.0 {
            self.mute_ramp_seconds = defaults.mute_ramp_seconds;
        }
        if !self.default_bpm.is_finite() {
            self.default_bpm = defaults.default_bpm;
        }
        if self.default_sequence_length == 0 {
            self.default_sequence_length = defaults.default_sequence_length;
        }
        if !self.render_block_seconds.is_finite() || self.render_block_seconds <= 0.0 {
            self.render_block_seconds = defaults.render_block_seconds;
        }
        self
    }
}
