//! Engine configuration
//!
//! Every field has a default, so an empty or partial TOML file is valid.
//! Settings are read once at startup and never written back.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SoundscapeError};
use crate::sound_profile::SoundProfileId;

/// Longest session `default_minutes` may ask for (one day)
pub const MAX_DEFAULT_MINUTES: u32 = 24 * 60;

/// Tunables for graph construction and the session defaults
///
/// ```toml
/// block_size = 512
/// noise_seconds = 2.0
/// master_level = 0.5
/// default_profile = "wind"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames processed per graph pass
    pub block_size: usize,
    /// Length of the looped noise buffer in seconds
    pub noise_seconds: f32,
    /// Master gain while unmuted
    pub master_level: f32,
    /// Time constant (seconds) of the mute/unmute ramp
    pub mute_time_constant: f32,
    /// Sample rate used when no device reports one
    pub fallback_sample_rate: u32,
    /// Session length the timer starts with
    pub default_minutes: u32,
    /// Profile the timer starts with
    pub default_profile: SoundProfileId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            noise_seconds: 2.0,
            master_level: 0.5,
            mute_time_constant: 0.1,
            fallback_sample_rate: 44100,
            default_minutes: 3,
            default_profile: SoundProfileId::Rain,
        }
    }
}

impl EngineConfig {
    /// Load and validate a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(SoundscapeError::Config("block_size must be at least 1".to_string()));
        }
        if !(self.noise_seconds > 0.0) {
            return Err(SoundscapeError::Config(format!(
                "noise_seconds must be positive, got {}",
                self.noise_seconds
            )));
        }
        if !(0.0..=1.0).contains(&self.master_level) {
            return Err(SoundscapeError::Config(format!(
                "master_level must be within [0, 1], got {}",
                self.master_level
            )));
        }
        if self.mute_time_constant < 0.0 || !self.mute_time_constant.is_finite() {
            return Err(SoundscapeError::Config(format!(
                "mute_time_constant must be non-negative, got {}",
                self.mute_time_constant
            )));
        }
        if self.fallback_sample_rate == 0 {
            return Err(SoundscapeError::Config(
                "fallback_sample_rate must be positive".to_string(),
            ));
        }
        if self.default_minutes == 0 || self.default_minutes > MAX_DEFAULT_MINUTES {
            return Err(SoundscapeError::Config(format!(
                "default_minutes must be between 1 and {}",
                MAX_DEFAULT_MINUTES
            )));
        }
        Ok(())
    }

    /// Default session length in seconds
    pub fn default_duration_secs(&self) -> u32 {
        self.default_minutes.saturating_mul(60)
    }
}
