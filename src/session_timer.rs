//! Session timer: a one-second countdown driving playback
//!
//! ```text
//! Idle ──toggle──> Running ──toggle──> Idle (time left kept)
//!                     │
//!                     └─tick to 0──> Expired
//! Idle, 0 left ──toggle──> Expired
//! any ──reset──> Idle (full duration)
//! ```
//!
//! Playback runs exactly while the timer is `Running`. Ticks come from the
//! caller (once per second); the timer never reads a clock itself.

use std::fmt;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::output::AudioOutput;
use crate::playback::PlaybackSession;
use crate::sound_profile::SoundProfileId;

/// Timer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not counting; playback stopped
    Idle,
    /// Counting down; playback active
    Running,
    /// Reached zero; playback stopped
    Expired,
}

/// Session lengths offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationPreset {
    Three,
    Five,
    Ten,
}

impl DurationPreset {
    pub const ALL: [DurationPreset; 3] =
        [DurationPreset::Three, DurationPreset::Five, DurationPreset::Ten];

    pub fn minutes(self) -> u32 {
        match self {
            DurationPreset::Three => 3,
            DurationPreset::Five => 5,
            DurationPreset::Ten => 10,
        }
    }

    pub fn seconds(self) -> u32 {
        self.minutes() * 60
    }

    /// Preset for a minute count, if there is one
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.minutes() == minutes)
    }
}

impl fmt::Display for DurationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Countdown coupled to a playback session
pub struct SessionTimer<O: AudioOutput> {
    session: PlaybackSession<O>,
    state: TimerState,
    duration_secs: u32,
    time_left: u32,
}

impl<O: AudioOutput> SessionTimer<O> {
    /// Timer with the configured default duration and profile, unmuted
    pub fn new(output: O, config: &EngineConfig) -> Self {
        Self::with_session(PlaybackSession::new(output, config), config.default_duration_secs())
    }

    /// Timer around an existing session
    pub fn with_session(session: PlaybackSession<O>, duration_secs: u32) -> Self {
        Self {
            session,
            state: TimerState::Idle,
            duration_secs,
            time_left: duration_secs,
        }
    }

    /// Start or pause; does nothing once expired (reset first)
    pub fn toggle(&mut self) {
        match self.state {
            TimerState::Idle if self.time_left == 0 => {
                self.state = TimerState::Expired;
                debug!("Toggle with no time left: session expired");
            }
            TimerState::Idle => {
                self.state = TimerState::Running;
                let profile = self.session.profile();
                self.session.start(profile);
                info!("Session started: {} left", format_time(self.time_left));
            }
            TimerState::Running => {
                self.state = TimerState::Idle;
                self.session.stop();
                info!("Session paused: {} left", format_time(self.time_left));
            }
            TimerState::Expired => debug!("Toggle ignored: session expired"),
        }
    }

    /// Advance one second; only counts while running
    pub fn tick(&mut self) {
        if self.state != TimerState::Running {
            return;
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.state = TimerState::Expired;
            self.session.stop();
            info!("Session complete");
        }
    }

    /// Back to idle with the full duration
    pub fn reset(&mut self) {
        self.session.stop();
        self.state = TimerState::Idle;
        self.time_left = self.duration_secs;
    }

    /// Set a new duration; ignored while running or when zero
    ///
    /// Returns whether the change took effect.
    pub fn change_duration(&mut self, seconds: u32) -> bool {
        if self.state == TimerState::Running {
            debug!("Duration change ignored while running");
            return false;
        }
        if seconds == 0 {
            debug!("Zero duration ignored");
            return false;
        }
        self.duration_secs = seconds;
        self.time_left = seconds;
        self.state = TimerState::Idle;
        true
    }

    /// Set one of the preset durations; ignored while running
    pub fn change_preset(&mut self, preset: DurationPreset) -> bool {
        self.change_duration(preset.seconds())
    }

    /// Select a sound; switches immediately if running
    pub fn change_profile(&mut self, profile: SoundProfileId) {
        self.session.switch_profile(profile);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.session.set_muted(muted);
    }

    pub fn toggle_mute(&mut self) {
        self.session.toggle_mute();
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn profile(&self) -> SoundProfileId {
        self.session.profile()
    }

    pub fn session(&self) -> &PlaybackSession<O> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PlaybackSession<O> {
        &mut self.session
    }
}
