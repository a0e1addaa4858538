//! Sound profiles: the three ambient textures
//!
//! Pure data. A profile describes the low-pass filter, an optional LFO and
//! what it modulates, and the optional secondary gain stage. The only
//! user-controlled dimension is which profile is active.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SoundscapeError;
use crate::nodes::Waveform;

/// Q in dB a filter gets when the profile does not set one (the browser biquad default)
pub const DEFAULT_FILTER_Q_DB: f32 = 1.0;

/// Identifier of one of the three profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundProfileId {
    #[default]
    Rain,
    Wind,
    White,
}

impl SoundProfileId {
    /// All profiles, in display order
    pub const ALL: [SoundProfileId; 3] = [
        SoundProfileId::Rain,
        SoundProfileId::Wind,
        SoundProfileId::White,
    ];

    /// Lowercase name used on the CLI and in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundProfileId::Rain => "rain",
            SoundProfileId::Wind => "wind",
            SoundProfileId::White => "white",
        }
    }

    /// Parameters for this profile
    pub fn resolve(self) -> SoundProfile {
        match self {
            SoundProfileId::White => SoundProfile {
                id: self,
                filter_cutoff_hz: 1000.0,
                filter_q_db: DEFAULT_FILTER_Q_DB,
                modulation: None,
                secondary_gain_base: None,
            },
            SoundProfileId::Wind => SoundProfile {
                id: self,
                filter_cutoff_hz: 400.0,
                filter_q_db: 0.0,
                modulation: Some(Modulation {
                    waveform: Waveform::Sine,
                    rate_hz: 0.1,
                    depth: 300.0,
                    target: ModulationTarget::FilterCutoff,
                }),
                secondary_gain_base: None,
            },
            SoundProfileId::Rain => SoundProfile {
                id: self,
                filter_cutoff_hz: 800.0,
                filter_q_db: 0.0,
                modulation: Some(Modulation {
                    waveform: Waveform::Triangle,
                    rate_hz: 4.0,
                    depth: 0.1,
                    target: ModulationTarget::SecondaryGain,
                }),
                secondary_gain_base: Some(0.8),
            },
        }
    }
}

impl fmt::Display for SoundProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundProfileId {
    type Err = SoundscapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rain" => Ok(SoundProfileId::Rain),
            "wind" => Ok(SoundProfileId::Wind),
            "white" => Ok(SoundProfileId::White),
            other => Err(SoundscapeError::UnknownProfile(other.to_string())),
        }
    }
}

/// Parameter an LFO drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationTarget {
    /// Low-pass cutoff frequency (Hz)
    FilterCutoff,
    /// Secondary gain stage level
    SecondaryGain,
}

/// An oscillator driving a parameter: value = base + depth * lfo(t)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulation {
    pub waveform: Waveform,
    pub rate_hz: f32,
    pub depth: f32,
    pub target: ModulationTarget,
}

/// Full parameter set of a profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundProfile {
    pub id: SoundProfileId,
    pub filter_cutoff_hz: f32,
    /// Filter resonance in dB (0 dB = Q of 1.0)
    pub filter_q_db: f32,
    pub modulation: Option<Modulation>,
    /// Level of the extra gain stage between filter and master (rain only)
    pub secondary_gain_base: Option<f32>,
}

impl SoundProfile {
    /// Base value of the parameter the modulation targets
    ///
    /// None when the profile has no modulation, or targets a secondary gain
    /// stage it does not declare.
    pub fn modulation_base(&self) -> Option<f32> {
        let modulation = self.modulation?;
        match modulation.target {
            ModulationTarget::FilterCutoff => Some(self.filter_cutoff_hz),
            ModulationTarget::SecondaryGain => self.secondary_gain_base,
        }
    }

    /// Range swept by the modulated parameter, `(min, max)`
    pub fn modulation_range(&self) -> Option<(f32, f32)> {
        let base = self.modulation_base()?;
        let depth = self.modulation?.depth.abs();
        Some((base - depth, base + depth))
    }
}
